//! Collaborator traits for the tessera factor engine.
//!
//! The engine never touches storage or market-data vendors directly. It reads
//! and persists panels through a [`PanelSource`] and asks a [`DataProvider`]
//! for fresh data.
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tessera/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod source;
pub use source::{PanelSource, SourceError};

mod provider;
pub use provider::{AcquisitionError, DataProvider, QueryKind};
