//! # tessera
//!
//! A cross-sectional equity factor engine.
//!
//! This crate re-exports the tessera components. Individual components can be
//! enabled via feature flags.
//!
//! ## Features
//!
//! - `full` (default): Enables all components
//! - `primitives`: Panels, factor tables and snapshots
//! - `math`: Regression and nan-aware statistics
//! - `calendar`: Trading calendar and date resolution
//! - `traits`: Storage and acquisition collaborator traits
//! - `panel`: Panel store and storage sources
//! - `factors`: Factor calculators
//! - `pipeline`: Per-date snapshot assembly and batch runs
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera::panel::CsvSource;
//! use tessera::pipeline::{FactorPipeline, PipelineConfig};
//!
//! let config = PipelineConfig::default();
//! let source = CsvSource::new("data", config.indicator_registry());
//! let mut pipeline = FactorPipeline::new(source, config)?;
//! let snapshot = pipeline.assemble(date)?;
//! ```

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tessera/issues/")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[cfg(feature = "primitives")]
#[doc(inline)]
pub use tessera_primitives as primitives;
#[cfg(feature = "math")]
#[doc(inline)]
pub use tessera_math as math;
#[cfg(feature = "calendar")]
#[doc(inline)]
pub use tessera_calendar as calendar;
#[cfg(feature = "traits")]
#[doc(inline)]
pub use tessera_traits as traits;
#[cfg(feature = "panel")]
#[doc(inline)]
pub use tessera_panel as panel;
#[cfg(feature = "factors")]
#[doc(inline)]
pub use tessera_factors as factors;
#[cfg(feature = "pipeline")]
#[doc(inline)]
pub use tessera_pipeline as pipeline;
