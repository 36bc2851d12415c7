//! Declared output columns per factor category.

use tessera_primitives::FactorName;

use crate::Frequency;

/// Factor categories in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Valuation ratios.
    Value,
    /// Single-quarter growth rates.
    Growth,
    /// Profitability and cash-flow quality.
    Finance,
    /// Balance-sheet leverage.
    Leverage,
    /// Size, momentum, volatility, turnover, index regression and reversal.
    Calculated,
    /// Technical indicators.
    Technical,
    /// Barra market descriptors.
    BarraQuote,
    /// Barra fundamental descriptors.
    BarraFinance,
}

const VALUE: &[&str] = &["EP", "EPcut", "BP", "SP", "NCFP", "OCFP", "DP", "G/PE"];

const GROWTH: &[&str] = &["Sales_G_q", "Profit_G_q", "OCF_G_q", "ROE_G_q"];

const FINANCE: &[&str] = &[
    "ROE_q",
    "ROE_ttm",
    "ROA_q",
    "ROA_ttm",
    "grossprofitmargin_q",
    "grossprofitmargin_ttm",
    "profitmargin_q",
    "profitmargin_ttm",
    "assetturnover_q",
    "assetturnover_ttm",
    "operationcashflowratio_q",
    "operationcashflowratio_ttm",
];

const LEVERAGE: &[&str] = &["financial_leverage", "debtequityratio", "cashratio", "currentratio"];

const CALCULATED: &[&str] = &[
    "ln_capital",
    "HAlpha",
    "return_1m",
    "return_3m",
    "return_6m",
    "return_12m",
    "wgt_return_1m",
    "wgt_return_3m",
    "wgt_return_6m",
    "wgt_return_12m",
    "exp_wgt_return_1m",
    "exp_wgt_return_3m",
    "exp_wgt_return_6m",
    "exp_wgt_return_12m",
    "std_1m",
    "std_3m",
    "std_6m",
    "std_12m",
    "beta",
    "turn_1m",
    "turn_3m",
    "turn_6m",
    "turn_12m",
    "bias_turn_1m",
    "bias_turn_3m",
    "bias_turn_6m",
    "bias_turn_12m",
    "holder_avgpctchange",
];

const REVERSAL: &[&str] = &["M_reverse_20", "M_reverse_60", "M_reverse_180"];

const TECHNICAL: &[&str] = &["MACD", "DEA", "DIF", "RSI", "PSY", "BIAS"];

const BARRA_QUOTE: &[&str] = &[
    "LNCAP_barra",
    "MIDCAP_barra",
    "BETA_barra",
    "HSIGMA_barra",
    "HALPHA_barra",
    "DASTD_barra",
    "CMRA_barra",
    "STOM_barra",
    "STOQ_barra",
    "STOA_barra",
    "RSTR_barra",
];

const BARRA_FINANCE: &[&str] = &[
    "MLEV_barra",
    "BLEV_barra",
    "DTOA_barra",
    "BTOP_barra",
    "ETOP_barra",
    "CETOP_barra",
    "EGRO_barra",
    "SGRO_barra",
];

impl Category {
    /// Every category, in output order.
    pub const ALL: [Self; 8] = [
        Self::Value,
        Self::Growth,
        Self::Finance,
        Self::Leverage,
        Self::Calculated,
        Self::Technical,
        Self::BarraQuote,
        Self::BarraFinance,
    ];

    /// Category name used in log events.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Growth => "growth",
            Self::Finance => "finance",
            Self::Leverage => "leverage",
            Self::Calculated => "calculated",
            Self::Technical => "technical",
            Self::BarraQuote => "barra_quote",
            Self::BarraFinance => "barra_finance",
        }
    }

    /// Whether the category runs for this frequency and anchor.
    ///
    /// Barra categories run only on month-end anchors of monthly runs.
    #[must_use]
    pub const fn applies(self, frequency: Frequency, month_end: bool) -> bool {
        match self {
            Self::BarraQuote | Self::BarraFinance => {
                matches!(frequency, Frequency::Monthly) && month_end
            }
            _ => true,
        }
    }

    /// Declared output columns of the category.
    #[must_use]
    pub fn targets(self, frequency: Frequency) -> Vec<FactorName> {
        let names: Vec<&str> = match self {
            Self::Value => VALUE.to_vec(),
            Self::Growth => GROWTH.to_vec(),
            Self::Finance => FINANCE.to_vec(),
            Self::Leverage => LEVERAGE.to_vec(),
            Self::Calculated => match frequency {
                Frequency::Monthly => CALCULATED.iter().chain(REVERSAL).copied().collect(),
                Frequency::Weekly => CALCULATED.to_vec(),
            },
            Self::Technical => TECHNICAL.to_vec(),
            Self::BarraQuote => BARRA_QUOTE.to_vec(),
            Self::BarraFinance => BARRA_FINANCE.to_vec(),
        };
        names.into_iter().map(FactorName::new).collect()
    }
}

/// Output columns of a run, in order.
#[must_use]
pub fn target_columns(frequency: Frequency, month_end: bool) -> Vec<FactorName> {
    Category::ALL
        .iter()
        .filter(|c| c.applies(frequency, month_end))
        .flat_map(|c| c.targets(frequency))
        .collect()
}
