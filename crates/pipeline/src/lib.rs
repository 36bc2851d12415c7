//! Per-date factor assembly for the tessera engine.
//!
//! [`FactorPipeline`] resolves an anchor date against the trading calendar,
//! reads the indicator panels it needs through a
//! [`PanelStore`](tessera_panel::PanelStore), computes every factor category,
//! and returns a [`FactorSnapshot`](tessera_primitives::FactorSnapshot) of the
//! eligible securities. [`FactorPipeline::run_batch`] persists snapshots for
//! many dates, and [`refresh_calendar`] keeps the stored trading calendar
//! current.
//!
//! A category whose inputs are missing, or whose window reaches past the start
//! of the calendar, contributes missing columns instead of failing the date.
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tessera/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod config;
pub use config::{
    BarraSettings, EligibilityRules, Frequency, PipelineConfig, TechnicalSettings, WindowSettings,
};

pub mod fields;

mod targets;
pub use targets::{Category, target_columns};

mod categories;

mod basic;
pub use basic::is_eligible;

mod assemble;
pub(crate) use assemble::AnchorDates;
pub use assemble::FactorPipeline;

mod batch;
pub use batch::{BatchReport, default_dates};

mod acquisition;
pub use acquisition::{CALENDAR_START, refresh_calendar};

mod error;
pub use error::PipelineError;
