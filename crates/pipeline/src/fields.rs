//! Names of the stored indicator panels and their storage categories.

use tessera_panel::{IndicatorCategory, IndicatorRegistry};

/// Unadjusted close.
pub const CLOSE: &str = "close";
/// Backward adjustment factor.
pub const ADJFACTOR: &str = "adjfactor";
/// Traded amount.
pub const AMT: &str = "amt";
/// Number of deals.
pub const DEALNUM: &str = "dealnum";
/// Raw turnover rate.
pub const TURN: &str = "turn";
/// Trading status, `1` when trading normally.
pub const TRADE_STATUS: &str = "trade_status";
/// Limit-lock status, `0` when not locked.
pub const MAXUPORDOWN: &str = "maxupordown";
/// Daily return.
pub const PCT_CHG: &str = "pct_chg";
/// Total market capitalisation.
pub const MKT_CAP_ARD: &str = "mkt_cap_ard";
/// Daily float market capitalisation.
pub const MKT_CAP_FLOAT_D: &str = "mkt_cap_float_d";
/// Listing status, `1` while listed.
pub const LISTED: &str = "listday_matrix";

/// Backward-adjusted close, derived as `close * adjfactor`.
pub const HFQ_CLOSE: &str = "hfq_close";
/// Amount per deal, derived as `amt / dealnum`.
pub const AMT_PER_DEAL: &str = "amt_per_deal";
/// Turnover after the quality mask, derived and never stored.
pub const TURN_MASKED: &str = "turn_masked";

/// Monthly return.
pub const PCT_CHG_M: &str = "pct_chg_M";
/// Month-end float market capitalisation.
pub const MKT_CAP_FLOAT: &str = "mkt_cap_float";
/// Change of the average holding per shareholder.
pub const HOLDER_AVGPCTCHG: &str = "holder_avgpctchg";
/// Fiscal report date applicable at each month end.
pub const APPLIED_RPT_DATE: &str = "applied_rpt_date_M";

/// Short name.
pub const SEC_NAME: &str = "sec_name1";
/// Level-1 industry.
pub const INDUSTRY: &str = "industry_citic";
/// Level-2 industry.
pub const INDUSTRY_L2: &str = "industry_citic_level2";

/// Trailing P/E.
pub const PE_TTM: &str = "pe_ttm";
/// Trailing P/E on deducted profit.
pub const PE_DEDUCTED_TTM: &str = "val_pe_deducted_ttm";
/// P/B on the latest filing.
pub const PB_LF: &str = "pb_lf";
/// Trailing P/S.
pub const PS_TTM: &str = "ps_ttm";
/// Trailing price to net cash flow.
pub const PCF_NCF_TTM: &str = "pcf_ncf_ttm";
/// Trailing price to operating cash flow.
pub const PCF_OCF_TTM: &str = "pcf_ocf_ttm";
/// Trailing dividend yield.
pub const DIVIDEND_YIELD: &str = "dividendyield2";
/// Trailing profit growth.
pub const PROFIT_TTM_G: &str = "profit_ttm_G";

/// Single-quarter sales growth.
pub const QFA_YOYSALES: &str = "qfa_yoysales_m";
/// Single-quarter profit growth.
pub const QFA_YOYPROFIT: &str = "qfa_yoyprofit_m";
/// Single-quarter operating cash flow growth.
pub const QFA_YOYOCF: &str = "qfa_yoyocf_m";
/// Single-quarter ROE growth.
pub const QFA_ROE_G: &str = "qfa_roe_G_m";

/// Single-quarter ROE.
pub const QFA_ROE: &str = "qfa_roe_m";
/// Trailing ROE.
pub const ROE_TTM: &str = "roe_ttm2_m";
/// Single-quarter ROA.
pub const QFA_ROA: &str = "qfa_roa_m";
/// Trailing ROA.
pub const ROA_TTM: &str = "roa2_ttm2_m";
/// Single-quarter gross margin.
pub const QFA_GROSS_MARGIN: &str = "qfa_grossprofitmargin_m";
/// Trailing gross margin.
pub const GROSS_MARGIN_TTM: &str = "grossprofitmargin_ttm2_m";
/// Single-quarter deducted profit.
pub const QFA_DEDUCTED_PROFIT: &str = "qfa_deductedprofit_m";
/// Single-quarter operating revenue.
pub const QFA_OPER_REV: &str = "qfa_oper_rev_m";
/// Trailing deducted profit.
pub const DEDUCTED_PROFIT_TTM: &str = "deductedprofit_ttm";
/// Trailing operating revenue.
pub const OR_TTM: &str = "or_ttm";
/// Single-quarter net margin.
pub const QFA_NET_MARGIN: &str = "qfa_netprofitmargin_m";
/// Trailing asset turnover.
pub const ASSET_TURNOVER_TTM: &str = "turnover_ttm_m";
/// Single-quarter operating cash flow.
pub const QFA_OPER_CASH_FLOW: &str = "qfa_net_cash_flows_oper_act_m";
/// Single-quarter net profit.
pub const QFA_NET_PROFIT: &str = "qfa_net_profit_is_m";
/// Trailing operating cash flow per share.
pub const OCFPS_TTM: &str = "ocfps_ttm";
/// Trailing earnings per share.
pub const EPS_TTM: &str = "eps_ttm";

/// Assets to equity.
pub const ASSETS_TO_EQUITY: &str = "assetstoequity_m";
/// Long-term debt to equity.
pub const LONG_DEBT_TO_EQUITY: &str = "longdebttoequity_m";
/// Cash to current debt.
pub const CASH_TO_CURRENT_DEBT: &str = "cashtocurrentdebt_m";
/// Current ratio.
pub const CURRENT_RATIO: &str = "current_m";

/// Long-term share of debt at the last fiscal year end.
pub const LONG_DEBT_TO_DEBT_LYR: &str = "longdebttodebt_lyr";
/// Total liabilities at the last fiscal year end.
pub const TOT_LIAB_LYR: &str = "tot_liab_lyr";
/// Preferred equity at the last fiscal year end.
pub const PREFERRED_LYR: &str = "other_equity_instruments_PRE_lyr";
/// Total equity at the last fiscal year end.
pub const TOT_EQUITY_LYR: &str = "tot_equity_lyr";
/// Total assets at the last fiscal year end.
pub const TOT_ASSETS_LYR: &str = "tot_assets_lyr";

/// Diluted earnings per share by report date.
pub const EPS_DILUTED: &str = "eps_diluted2";
/// Operating revenue per share by report date.
pub const ORPS: &str = "orps";

/// Name of the daily snapshot of a monthly panel, read by weekly runs.
#[must_use]
pub fn daily_variant(name: &str) -> String {
    format!("{name}_d")
}

/// Monthly panels that weekly runs read through their daily snapshots.
pub const DAILY_SNAPSHOT_SOURCES: [&str; 11] = [
    PE_TTM,
    PE_DEDUCTED_TTM,
    PB_LF,
    PS_TTM,
    PCF_NCF_TTM,
    PCF_OCF_TTM,
    DIVIDEND_YIELD,
    PROFIT_TTM_G,
    SEC_NAME,
    INDUSTRY,
    INDUSTRY_L2,
];

const DAILY: [&str; 13] = [
    CLOSE,
    ADJFACTOR,
    AMT,
    DEALNUM,
    TURN,
    TRADE_STATUS,
    MAXUPORDOWN,
    PCT_CHG,
    MKT_CAP_ARD,
    MKT_CAP_FLOAT_D,
    LISTED,
    HFQ_CLOSE,
    AMT_PER_DEAL,
];

const MONTHLY: [&str; 44] = [
    PCT_CHG_M,
    MKT_CAP_FLOAT,
    HOLDER_AVGPCTCHG,
    APPLIED_RPT_DATE,
    SEC_NAME,
    INDUSTRY,
    INDUSTRY_L2,
    PE_TTM,
    PE_DEDUCTED_TTM,
    PB_LF,
    PS_TTM,
    PCF_NCF_TTM,
    PCF_OCF_TTM,
    DIVIDEND_YIELD,
    PROFIT_TTM_G,
    QFA_YOYSALES,
    QFA_YOYPROFIT,
    QFA_YOYOCF,
    QFA_ROE_G,
    QFA_ROE,
    ROE_TTM,
    QFA_ROA,
    ROA_TTM,
    QFA_GROSS_MARGIN,
    GROSS_MARGIN_TTM,
    QFA_DEDUCTED_PROFIT,
    QFA_OPER_REV,
    DEDUCTED_PROFIT_TTM,
    OR_TTM,
    QFA_NET_MARGIN,
    ASSET_TURNOVER_TTM,
    QFA_OPER_CASH_FLOW,
    QFA_NET_PROFIT,
    OCFPS_TTM,
    EPS_TTM,
    ASSETS_TO_EQUITY,
    LONG_DEBT_TO_EQUITY,
    CASH_TO_CURRENT_DEBT,
    CURRENT_RATIO,
    LONG_DEBT_TO_DEBT_LYR,
    TOT_LIAB_LYR,
    PREFERRED_LYR,
    TOT_EQUITY_LYR,
    TOT_ASSETS_LYR,
];

const QUARTERLY: [&str; 2] = [EPS_DILUTED, ORPS];

/// Storage categories of every panel the pipeline reads.
#[must_use]
pub fn registry() -> IndicatorRegistry {
    let mut registry = IndicatorRegistry::new()
        .with_all(IndicatorCategory::Daily, DAILY)
        .with_all(IndicatorCategory::Monthly, MONTHLY)
        .with_all(IndicatorCategory::Quarterly, QUARTERLY);
    for name in DAILY_SNAPSHOT_SOURCES {
        registry.register(daily_variant(name), IndicatorCategory::Daily);
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_panel_has_one_category() {
        let registry = registry();
        assert_eq!(
            registry.len(),
            DAILY.len() + MONTHLY.len() + QUARTERLY.len() + DAILY_SNAPSHOT_SOURCES.len()
        );
        assert_eq!(registry.category(TURN), Some(IndicatorCategory::Daily));
        assert_eq!(registry.category(APPLIED_RPT_DATE), Some(IndicatorCategory::Monthly));
        assert_eq!(registry.category(EPS_DILUTED), Some(IndicatorCategory::Quarterly));
        assert_eq!(registry.category("pe_ttm_d"), Some(IndicatorCategory::Daily));
        assert_eq!(registry.category("industry_citic_level2_d"), Some(IndicatorCategory::Daily));
    }

    #[test]
    fn masked_turnover_is_not_stored() {
        assert_eq!(registry().category(TURN_MASKED), None);
    }
}
