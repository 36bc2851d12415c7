//! Factor calculators for the tessera engine.
//!
//! Every calculator takes the entities to report on, the anchor date and the
//! indicator panels it needs, and returns a [`FactorTable`] (or a single
//! column) aligned with the entities. Missing inputs yield missing factor
//! values rather than errors; errors are reserved for absent panels or dates
//! and for windows longer than the available history.
//!
//! [`FactorTable`]: tessera_primitives::FactorTable
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tessera/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod turnover;
pub use turnover::{DEFAULT_SENTINEL, build_turnover_mask, sentinel_guarded, sentinel_mean};

mod momentum;
pub use momentum::{IndexRegressionConfig, MomentumConfig, index_regression, momentum_volatility};

mod liquidity;
pub use liquidity::{TurnoverConfig, turnover_bias};

mod reversal;
pub use reversal::{ReversalConfig, reversal};

mod barra;
pub use barra::{
    CmraConfig, DastdConfig, LIQUIDITY_FLOOR, LiquidityConfig, RegressConfig, RstrConfig, SizeConfig, cmra,
    dastd, liquidity, regress_barra, rstr, size,
};

mod growth;
pub use growth::{GrowthConfig, fiscal_growth_rate};

mod technical;
pub use technical::{TechnicalConfig, technical};

mod error;
pub use error::FactorError;

mod table;
