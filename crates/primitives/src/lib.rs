//! Core value types for the tessera factor engine: entities, indicator panels
//! and factor tables.
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tessera/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod entity;
pub use entity::{EntityId, SecurityMeta, Universe};

mod error;
pub use error::PanelError;

mod factor;
pub use factor::{BasicRow, FactorName, FactorSnapshot, FactorTable};

mod panel;
pub use panel::{DatePanel, LabelPanel, Missing, Panel, Resample};

/// Re-export common date type.
pub type Date = chrono::NaiveDate;
