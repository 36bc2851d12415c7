//! Panel store for the tessera factor engine.
//!
//! [`PanelStore`] caches whole indicator panels read through a
//! [`PanelSource`](tessera_traits::PanelSource). Two sources ship with the
//! crate: [`MemorySource`] for tests and embedding, and [`CsvSource`] for a
//! directory of wide CSV files laid out by [`IndicatorRegistry`] category.
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tessera/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod csv;
pub use csv::CsvSource;

mod error;
pub use error::StoreError;

mod frame;
pub use frame::{
    dates_from_frame, dates_to_frame, labels_from_frame, labels_to_frame, panel_from_frame,
    panel_to_frame, snapshot_from_frame, snapshot_to_frame,
};

mod memory;
pub use memory::MemorySource;

mod registry;
pub use registry::{IndicatorCategory, IndicatorRegistry};

mod store;
pub use store::PanelStore;
