//! Numerical routines for the tessera factor engine: least-squares and robust
//! regression, exponential weights, outlier clipping and missing-aware
//! reducers.
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tessera/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod cross_section;
pub use cross_section::standardize;

mod winsorize;
pub use winsorize::winsorize_mad;

mod weights;
pub use weights::exp_weights;

mod linalg;
pub use linalg::{FitOptions, FitResult, SimpleFit, fit, fit_simple};

mod stats;
pub use stats::{compound, ewm_mean, nan_mean, nan_median, nan_std, nan_sum, reciprocal, safe_div};

mod error;
pub use error::MathError;
