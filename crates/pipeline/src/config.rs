//! Pipeline configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tessera_calendar::BoundaryPolicy;
use tessera_factors::{
    CmraConfig, DastdConfig, DEFAULT_SENTINEL, GrowthConfig, IndexRegressionConfig, LiquidityConfig,
    MomentumConfig, RegressConfig, ReversalConfig, RstrConfig, SizeConfig, TechnicalConfig,
    TurnoverConfig,
};
use tessera_panel::IndicatorRegistry;
use tessera_primitives::EntityId;

use crate::{PipelineError, fields};

/// Update frequency of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Month-end runs on monthly fundamentals.
    #[default]
    Monthly,
    /// Weekly runs on daily snapshots of the monthly fundamentals.
    Weekly,
}

impl Frequency {
    /// Placement of month-based window starts.
    #[must_use]
    pub const fn boundary_policy(self) -> BoundaryPolicy {
        match self {
            Self::Monthly => BoundaryPolicy::NextMonthStart,
            Self::Weekly => BoundaryPolicy::Raw,
        }
    }
}

/// Window lengths of the rolling-window reducers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    /// Momentum, volatility and turnover lookbacks in months.
    pub lookback_months: Vec<u32>,
    /// Turnover baseline in years.
    pub turnover_baseline_years: u32,
    /// Reversal windows in trading days.
    pub reversal_days: Vec<usize>,
    /// Monthly returns used by the index regression.
    pub index_months: usize,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            lookback_months: vec![1, 3, 6, 12],
            turnover_baseline_years: 2,
            reversal_days: vec![20, 60, 180],
            index_months: 60,
        }
    }
}

/// Technical indicator parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalSettings {
    /// Fast, slow and signal spans of MACD.
    pub macd: [usize; 3],
    /// MACD warm-up days.
    pub macd_buffer: usize,
    /// PSY window.
    pub psy: usize,
    /// RSI window.
    pub rsi: usize,
    /// BIAS window.
    pub bias: usize,
}

impl Default for TechnicalSettings {
    fn default() -> Self {
        Self { macd: [10, 30, 15], macd_buffer: 240, psy: 20, rsi: 20, bias: 20 }
    }
}

/// Barra descriptor parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarraSettings {
    /// Benchmark for the regression and relative strength.
    pub benchmark: String,
    /// Overlapping regression windows.
    pub regress_shift: usize,
    /// Regression window in trading days.
    pub regress_window: usize,
    /// Regression weight half-life.
    pub regress_half_life: usize,
    /// DASTD window.
    pub dastd_window: usize,
    /// DASTD half-life.
    pub dastd_half_life: usize,
    /// CMRA months.
    pub cmra_months: usize,
    /// Trading days per month for CMRA and liquidity.
    pub days_per_month: usize,
    /// RSTR window.
    pub rstr_window: usize,
    /// RSTR half-life.
    pub rstr_half_life: usize,
    /// RSTR overlapping windows.
    pub rstr_shift: usize,
    /// Fiscal years fitted by the growth descriptors.
    pub growth_periods: usize,
    /// MAD multiple for the mid-cap residual.
    pub midcap_winsor: f64,
}

impl Default for BarraSettings {
    fn default() -> Self {
        Self {
            benchmark: "000300.SH".to_string(),
            regress_shift: 4,
            regress_window: 504,
            regress_half_life: 252,
            dastd_window: 252,
            dastd_half_life: 42,
            cmra_months: 12,
            days_per_month: 21,
            rstr_window: 252,
            rstr_half_life: 126,
            rstr_shift: 11,
            growth_periods: 5,
            midcap_winsor: 5.0,
        }
    }
}

/// Which rows are written to a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityRules {
    /// Rows whose name contains any of these are dropped.
    pub excluded_name_markers: Vec<String>,
    /// Industry placeholder marking an unclassified security.
    pub industry_placeholder: String,
    /// Level-1 industries reported by their level-2 classification.
    pub split_industries: Vec<String>,
}

impl Default for EligibilityRules {
    fn default() -> Self {
        Self {
            excluded_name_markers: vec!["ST".to_string(), "0".to_string()],
            industry_placeholder: "0".to_string(),
            split_industries: vec!["非银行金融".to_string()],
        }
    }
}

/// Configuration of a [`FactorPipeline`](crate::FactorPipeline).
///
/// Every field falls back to its default when absent from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Update frequency.
    pub frequency: Frequency,
    /// Value the turnover mask writes for unlisted days.
    pub sentinel: f64,
    /// Market index for `HAlpha` and `beta`.
    pub market_index: String,
    /// Reducer windows.
    pub windows: WindowSettings,
    /// Technical indicator parameters.
    pub technical: TechnicalSettings,
    /// Barra descriptor parameters.
    pub barra: BarraSettings,
    /// Snapshot row filter.
    pub eligibility: EligibilityRules,
    /// Storage categories added to or overriding [`fields::registry`].
    pub registry: IndicatorRegistry,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frequency: Frequency::Monthly,
            sentinel: DEFAULT_SENTINEL,
            market_index: "000001.SH".to_string(),
            windows: WindowSettings::default(),
            technical: TechnicalSettings::default(),
            barra: BarraSettings::default(),
            eligibility: EligibilityRules::default(),
            registry: IndicatorRegistry::new(),
        }
    }
}

impl PipelineConfig {
    /// Parse a TOML document.
    ///
    /// # Errors
    /// Returns `Config` if the document is malformed.
    pub fn from_toml_str(s: &str) -> Result<Self, PipelineError> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    /// Returns `Source` if the file cannot be read and `Config` if it is
    /// malformed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path).map_err(tessera_traits::SourceError::from)?;
        Self::from_toml_str(&text)
    }

    /// Same configuration with another frequency.
    #[must_use]
    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    /// Default storage categories merged with the configured overrides.
    #[must_use]
    pub fn indicator_registry(&self) -> IndicatorRegistry {
        let mut registry = fields::registry();
        registry.extend(&self.registry);
        registry
    }

    pub(crate) fn momentum(&self) -> MomentumConfig {
        MomentumConfig {
            lookbacks: self.windows.lookback_months.clone(),
            policy: self.frequency.boundary_policy(),
            sentinel: self.sentinel,
        }
    }

    pub(crate) fn turnover(&self) -> TurnoverConfig {
        TurnoverConfig {
            lookbacks: self.windows.lookback_months.clone(),
            baseline_years: self.windows.turnover_baseline_years,
            policy: self.frequency.boundary_policy(),
            sentinel: self.sentinel,
        }
    }

    pub(crate) fn index_regression(&self) -> IndexRegressionConfig {
        IndexRegressionConfig {
            index: EntityId::new(self.market_index.as_str()),
            months: self.windows.index_months,
        }
    }

    pub(crate) fn reversal(&self) -> ReversalConfig {
        ReversalConfig { windows: self.windows.reversal_days.clone() }
    }

    pub(crate) const fn technical(&self) -> TechnicalConfig {
        let [n1, n2, m] = self.technical.macd;
        TechnicalConfig {
            macd: (n1, n2, m),
            macd_buffer: self.technical.macd_buffer,
            psy: self.technical.psy,
            rsi: self.technical.rsi,
            bias: self.technical.bias,
        }
    }

    pub(crate) fn regress(&self) -> RegressConfig {
        RegressConfig {
            shift: self.barra.regress_shift,
            window: self.barra.regress_window,
            half_life: self.barra.regress_half_life,
            intercept: true,
            benchmark: EntityId::new(self.barra.benchmark.as_str()),
        }
    }

    pub(crate) const fn dastd(&self) -> DastdConfig {
        DastdConfig { window: self.barra.dastd_window, half_life: self.barra.dastd_half_life }
    }

    pub(crate) const fn cmra(&self) -> CmraConfig {
        CmraConfig { months: self.barra.cmra_months, days_per_month: self.barra.days_per_month }
    }

    pub(crate) const fn liquidity(&self) -> LiquidityConfig {
        LiquidityConfig { days_per_month: self.barra.days_per_month, months: [1, 3, 12] }
    }

    pub(crate) fn rstr(&self) -> RstrConfig {
        RstrConfig {
            window: self.barra.rstr_window,
            half_life: self.barra.rstr_half_life,
            shift: self.barra.rstr_shift,
            benchmark: EntityId::new(self.barra.benchmark.as_str()),
        }
    }

    pub(crate) const fn size(&self) -> SizeConfig {
        SizeConfig { winsor_n: self.barra.midcap_winsor }
    }

    pub(crate) const fn growth(&self) -> GrowthConfig {
        GrowthConfig { periods: self.barra.growth_periods }
    }
}
