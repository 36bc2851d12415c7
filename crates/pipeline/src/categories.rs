//! Factor categories computed from stored panels.
//!
//! A category is split into parts that fail independently. A part whose
//! inputs are unavailable, or whose window reaches past the calendar start,
//! contributes missing columns and a warning; the other parts still run.

use std::sync::Arc;

use tessera_calendar::TradingCalendar;
use tessera_factors as factors;
use tessera_math::{reciprocal, safe_div};
use tessera_panel::PanelStore;
use tessera_primitives::{Date, EntityId, FactorTable, Panel};
use tessera_traits::PanelSource;
use tracing::warn;

use crate::{AnchorDates, Category, Frequency, PipelineConfig, PipelineError, fields};

/// Everything a category reads while computing one anchor date.
pub(crate) struct Context<'a, S> {
    pub(crate) store: &'a mut PanelStore<S>,
    pub(crate) masked_turnover: &'a mut Option<Arc<Panel>>,
    pub(crate) calendar: &'a TradingCalendar,
    pub(crate) config: &'a PipelineConfig,
    pub(crate) dates: &'a AnchorDates,
    pub(crate) entities: &'a [EntityId],
}

impl<S: PanelSource> Context<'_, S> {
    fn panel(&mut self, name: &str) -> Result<Arc<Panel>, PipelineError> {
        Ok(self.store.get_panel(name)?)
    }

    fn section(&mut self, name: &str, date: Date) -> Result<Vec<f64>, PipelineError> {
        Ok(self.panel(name)?.cross_section_or_missing(self.entities, date)?)
    }

    /// Valuation-style panel: the monthly panel at the valuation date, or its
    /// daily snapshot at the trading date for weekly runs.
    fn value_section(&mut self, name: &str) -> Result<Vec<f64>, PipelineError> {
        match self.config.frequency {
            Frequency::Monthly => self.section(name, self.dates.value_date),
            Frequency::Weekly => self.section(&fields::daily_variant(name), self.dates.tdate),
        }
    }

    fn report_section(&mut self, name: &str) -> Result<Vec<f64>, PipelineError> {
        self.section(name, self.dates.report_month)
    }

    fn hfq_close(&mut self) -> Result<Arc<Panel>, PipelineError> {
        Ok(self.store.get_or_derive(fields::HFQ_CLOSE, |store| {
            let close = store.get_panel(fields::CLOSE)?;
            let adjfactor = store.get_panel(fields::ADJFACTOR)?.align(close.entities(), close.dates())?;
            Ok(close.zip_with(&adjfactor, |c, a| c * a)?)
        })?)
    }

    fn amt_per_deal(&mut self) -> Result<Arc<Panel>, PipelineError> {
        Ok(self.store.get_or_derive(fields::AMT_PER_DEAL, |store| {
            let amt = store.get_panel(fields::AMT)?;
            let deals = store.get_panel(fields::DEALNUM)?.align(amt.entities(), amt.dates())?;
            Ok(amt.ratio(&deals)?)
        })?)
    }

    fn masked_turnover(&mut self) -> Result<Arc<Panel>, PipelineError> {
        if let Some(masked) = self.masked_turnover.as_ref() {
            return Ok(Arc::clone(masked));
        }
        let raw = self.panel(fields::TURN)?;
        let status = self.panel(fields::TRADE_STATUS)?;
        let limit = self.panel(fields::MAXUPORDOWN)?;
        let listed = self.panel(fields::LISTED)?;
        let masked = Arc::new(factors::build_turnover_mask(
            &raw,
            &status,
            &limit,
            &listed,
            self.config.sentinel,
        )?);
        *self.masked_turnover = Some(Arc::clone(&masked));
        Ok(masked)
    }

    /// Run one part of `category`, substituting missing `columns` when it
    /// fails recoverably.
    fn part(
        &mut self,
        category: Category,
        part: &str,
        columns: Vec<String>,
        compute: impl FnOnce(&mut Self) -> Result<FactorTable, PipelineError>,
    ) -> Result<FactorTable, PipelineError> {
        match compute(self) {
            Ok(table) => Ok(table),
            Err(e) if e.is_recoverable() => {
                warn!(
                    category = category.name(),
                    part,
                    date = %self.dates.tdate,
                    error = %e,
                    "factor part unavailable, filling missing"
                );
                missing_table(self.entities, columns)
            }
            Err(e) => Err(e),
        }
    }
}

fn missing_table(entities: &[EntityId], columns: Vec<String>) -> Result<FactorTable, PipelineError> {
    let mut table = FactorTable::new(entities.to_vec())?;
    for name in columns {
        table.insert_missing(name)?;
    }
    Ok(table)
}

fn table(entities: &[EntityId], columns: Vec<(&str, Vec<f64>)>) -> Result<FactorTable, PipelineError> {
    let mut table = FactorTable::new(entities.to_vec())?;
    for (name, values) in columns {
        table.insert_column(name, values)?;
    }
    Ok(table)
}

fn names(columns: &[&str]) -> Vec<String> {
    columns.iter().map(ToString::to_string).collect()
}

fn zip(a: &[f64], b: &[f64], f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| f(*x, *y)).collect()
}

fn join(parts: Vec<FactorTable>, entities: &[EntityId]) -> Result<FactorTable, PipelineError> {
    parts
        .iter()
        .try_fold(FactorTable::new(entities.to_vec())?, |acc, part| Ok(acc.outer_join(part)?))
}

/// Compute every column of `category`.
///
/// # Errors
/// Returns only errors that are not recoverable; recoverable failures become
/// missing columns.
pub(crate) fn compute<S: PanelSource>(
    category: Category,
    ctx: &mut Context<'_, S>,
) -> Result<FactorTable, PipelineError> {
    let parts = match category {
        Category::Value => vec![ctx.part(category, "value", category_columns(category, ctx), value)?],
        Category::Growth => vec![ctx.part(category, "growth", category_columns(category, ctx), growth)?],
        Category::Finance => vec![ctx.part(category, "finance", category_columns(category, ctx), finance)?],
        Category::Leverage => {
            vec![ctx.part(category, "leverage", category_columns(category, ctx), leverage)?]
        }
        Category::Calculated => calculated(ctx)?,
        Category::Technical => {
            vec![ctx.part(category, "technical", category_columns(category, ctx), technical)?]
        }
        Category::BarraQuote => barra_quote(ctx)?,
        Category::BarraFinance => barra_finance(ctx)?,
    };
    join(parts, ctx.entities)
}

fn category_columns<S>(category: Category, ctx: &Context<'_, S>) -> Vec<String> {
    category.targets(ctx.config.frequency).into_iter().map(|n| n.0).collect()
}

fn value<S: PanelSource>(ctx: &mut Context<'_, S>) -> Result<FactorTable, PipelineError> {
    let inverse = |values: Vec<f64>| -> Vec<f64> { values.into_iter().map(reciprocal).collect() };
    let ep = inverse(ctx.value_section(fields::PE_TTM)?);
    let ep_cut = inverse(ctx.value_section(fields::PE_DEDUCTED_TTM)?);
    let bp = inverse(ctx.value_section(fields::PB_LF)?);
    let sp = inverse(ctx.value_section(fields::PS_TTM)?);
    let ncfp = inverse(ctx.value_section(fields::PCF_NCF_TTM)?);
    let ocfp = inverse(ctx.value_section(fields::PCF_OCF_TTM)?);
    let dp = ctx.value_section(fields::DIVIDEND_YIELD)?;
    let g_pe = zip(&ctx.value_section(fields::PROFIT_TTM_G)?, &ep, |g, e| g * e);

    table(
        ctx.entities,
        vec![
            ("EP", ep),
            ("EPcut", ep_cut),
            ("BP", bp),
            ("SP", sp),
            ("NCFP", ncfp),
            ("OCFP", ocfp),
            ("DP", dp),
            ("G/PE", g_pe),
        ],
    )
}

fn growth<S: PanelSource>(ctx: &mut Context<'_, S>) -> Result<FactorTable, PipelineError> {
    let columns = vec![
        ("Sales_G_q", ctx.report_section(fields::QFA_YOYSALES)?),
        ("Profit_G_q", ctx.report_section(fields::QFA_YOYPROFIT)?),
        ("OCF_G_q", ctx.report_section(fields::QFA_YOYOCF)?),
        ("ROE_G_q", ctx.report_section(fields::QFA_ROE_G)?),
    ];
    table(ctx.entities, columns)
}

fn finance<S: PanelSource>(ctx: &mut Context<'_, S>) -> Result<FactorTable, PipelineError> {
    let qfa_roa = ctx.report_section(fields::QFA_ROA)?;
    let profitmargin_q = zip(
        &ctx.report_section(fields::QFA_DEDUCTED_PROFIT)?,
        &ctx.report_section(fields::QFA_OPER_REV)?,
        safe_div,
    );
    let profitmargin_ttm = zip(
        &ctx.report_section(fields::DEDUCTED_PROFIT_TTM)?,
        &ctx.report_section(fields::OR_TTM)?,
        safe_div,
    );
    let assetturnover_q = zip(&qfa_roa, &ctx.report_section(fields::QFA_NET_MARGIN)?, safe_div);
    let cashflow_q = zip(
        &ctx.report_section(fields::QFA_OPER_CASH_FLOW)?,
        &ctx.report_section(fields::QFA_NET_PROFIT)?,
        safe_div,
    );
    let cashflow_ttm = zip(
        &ctx.report_section(fields::OCFPS_TTM)?,
        &ctx.report_section(fields::EPS_TTM)?,
        safe_div,
    );

    let columns = vec![
        ("ROE_q", ctx.report_section(fields::QFA_ROE)?),
        ("ROE_ttm", ctx.report_section(fields::ROE_TTM)?),
        ("ROA_q", qfa_roa),
        ("ROA_ttm", ctx.report_section(fields::ROA_TTM)?),
        ("grossprofitmargin_q", ctx.report_section(fields::QFA_GROSS_MARGIN)?),
        ("grossprofitmargin_ttm", ctx.report_section(fields::GROSS_MARGIN_TTM)?),
        ("profitmargin_q", profitmargin_q),
        ("profitmargin_ttm", profitmargin_ttm),
        ("assetturnover_q", assetturnover_q),
        ("assetturnover_ttm", ctx.report_section(fields::ASSET_TURNOVER_TTM)?),
        ("operationcashflowratio_q", cashflow_q),
        ("operationcashflowratio_ttm", cashflow_ttm),
    ];
    table(ctx.entities, columns)
}

fn leverage<S: PanelSource>(ctx: &mut Context<'_, S>) -> Result<FactorTable, PipelineError> {
    let columns = vec![
        ("financial_leverage", ctx.report_section(fields::ASSETS_TO_EQUITY)?),
        ("debtequityratio", ctx.report_section(fields::LONG_DEBT_TO_EQUITY)?),
        ("cashratio", ctx.report_section(fields::CASH_TO_CURRENT_DEBT)?),
        ("currentratio", ctx.report_section(fields::CURRENT_RATIO)?),
    ];
    table(ctx.entities, columns)
}

/// Float market capitalisation at the valuation date.
pub(crate) fn float_cap<S: PanelSource>(ctx: &mut Context<'_, S>) -> Result<Vec<f64>, PipelineError> {
    match ctx.config.frequency {
        Frequency::Monthly => ctx.section(fields::MKT_CAP_FLOAT, ctx.dates.value_date),
        Frequency::Weekly => ctx.section(fields::MKT_CAP_FLOAT_D, ctx.dates.tdate),
    }
}

fn capital<S: PanelSource>(ctx: &mut Context<'_, S>) -> Result<FactorTable, PipelineError> {
    let ln_capital =
        float_cap(ctx)?.into_iter().map(|c| if c > 0.0 { c.ln() } else { f64::NAN }).collect();
    let holder = ctx.report_section(fields::HOLDER_AVGPCTCHG)?;
    table(ctx.entities, vec![("ln_capital", ln_capital), ("holder_avgpctchange", holder)])
}

fn momentum<S: PanelSource>(ctx: &mut Context<'_, S>) -> Result<FactorTable, PipelineError> {
    let returns = ctx.panel(fields::PCT_CHG)?;
    let turnover = ctx.panel(fields::TURN)?;
    Ok(factors::momentum_volatility(
        ctx.calendar,
        ctx.dates.tdate,
        ctx.entities,
        &returns,
        &turnover,
        &ctx.config.momentum(),
    )?)
}

fn turnover<S: PanelSource>(ctx: &mut Context<'_, S>) -> Result<FactorTable, PipelineError> {
    let masked = ctx.masked_turnover()?;
    Ok(factors::turnover_bias(ctx.calendar, ctx.dates.tdate, ctx.entities, &masked, &ctx.config.turnover())?)
}

fn index_regression<S: PanelSource>(ctx: &mut Context<'_, S>) -> Result<FactorTable, PipelineError> {
    let monthly = ctx.panel(fields::PCT_CHG_M)?;
    Ok(factors::index_regression(
        ctx.dates.report_month,
        ctx.entities,
        &monthly,
        &ctx.config.index_regression(),
    )?)
}

fn reversal<S: PanelSource>(ctx: &mut Context<'_, S>) -> Result<FactorTable, PipelineError> {
    let amt_per_deal = ctx.amt_per_deal()?;
    let returns = ctx.panel(fields::PCT_CHG)?;
    Ok(factors::reversal(ctx.dates.tdate, ctx.entities, &amt_per_deal, &returns, &ctx.config.reversal())?)
}

fn calculated<S: PanelSource>(ctx: &mut Context<'_, S>) -> Result<Vec<FactorTable>, PipelineError> {
    let category = Category::Calculated;
    let lookbacks = ctx.config.windows.lookback_months.clone();
    let momentum_columns = lookbacks
        .iter()
        .flat_map(|m| {
            [
                format!("return_{m}m"),
                format!("wgt_return_{m}m"),
                format!("exp_wgt_return_{m}m"),
                format!("std_{m}m"),
            ]
        })
        .collect();
    let turnover_columns =
        lookbacks.iter().flat_map(|m| [format!("turn_{m}m"), format!("bias_turn_{m}m")]).collect();

    let mut parts = vec![
        ctx.part(category, "capital", names(&["ln_capital", "holder_avgpctchange"]), capital)?,
        ctx.part(category, "momentum", momentum_columns, momentum)?,
        ctx.part(category, "turnover", turnover_columns, turnover)?,
        ctx.part(category, "index_regression", names(&["HAlpha", "beta"]), index_regression)?,
    ];
    if ctx.config.frequency == Frequency::Monthly {
        let reversal_columns =
            ctx.config.windows.reversal_days.iter().map(|w| format!("M_reverse_{w}")).collect();
        parts.push(ctx.part(category, "reversal", reversal_columns, reversal)?);
    }
    Ok(parts)
}

fn technical<S: PanelSource>(ctx: &mut Context<'_, S>) -> Result<FactorTable, PipelineError> {
    let close = ctx.hfq_close()?;
    Ok(factors::technical(ctx.dates.tdate, ctx.entities, &close, ctx.config.technical())?)
}

fn barra_quote<S: PanelSource>(ctx: &mut Context<'_, S>) -> Result<Vec<FactorTable>, PipelineError> {
    let category = Category::BarraQuote;
    Ok(vec![
        ctx.part(category, "size", names(&["LNCAP_barra", "MIDCAP_barra"]), |ctx| {
            let cap = float_cap(ctx)?;
            Ok(factors::size(ctx.entities, &cap, ctx.config.size())?)
        })?,
        ctx.part(
            category,
            "regression",
            names(&["BETA_barra", "HSIGMA_barra", "HALPHA_barra"]),
            |ctx| {
                let returns = ctx.panel(fields::PCT_CHG)?;
                Ok(factors::regress_barra(
                    ctx.calendar,
                    ctx.dates.tdate,
                    ctx.entities,
                    &returns,
                    &ctx.config.regress(),
                )?)
            },
        )?,
        ctx.part(category, "dastd", names(&["DASTD_barra"]), |ctx| {
            let returns = ctx.panel(fields::PCT_CHG)?;
            Ok(factors::dastd(ctx.calendar, ctx.dates.tdate, ctx.entities, &returns, ctx.config.dastd())?)
        })?,
        ctx.part(category, "cmra", names(&["CMRA_barra"]), |ctx| {
            let returns = ctx.panel(fields::PCT_CHG)?;
            Ok(factors::cmra(ctx.calendar, ctx.dates.tdate, ctx.entities, &returns, ctx.config.cmra())?)
        })?,
        ctx.part(category, "liquidity", names(&["STOM_barra", "STOQ_barra", "STOA_barra"]), |ctx| {
            let amount = ctx.panel(fields::AMT)?;
            let cap = ctx.panel(fields::MKT_CAP_FLOAT_D)?;
            Ok(factors::liquidity(
                ctx.calendar,
                ctx.dates.tdate,
                ctx.entities,
                &amount,
                &cap,
                &ctx.config.liquidity(),
            )?)
        })?,
        ctx.part(category, "rstr", names(&["RSTR_barra"]), |ctx| {
            let returns = ctx.panel(fields::PCT_CHG)?;
            Ok(factors::rstr(ctx.calendar, ctx.dates.tdate, ctx.entities, &returns, &ctx.config.rstr())?)
        })?,
    ])
}

fn barra_leverage<S: PanelSource>(ctx: &mut Context<'_, S>) -> Result<FactorTable, PipelineError> {
    let liabilities = ctx.report_section(fields::TOT_LIAB_LYR)?;
    let long_term_debt =
        zip(&ctx.report_section(fields::LONG_DEBT_TO_DEBT_LYR)?, &liabilities, |share, l| share * l);
    let preferred: Vec<f64> = ctx
        .report_section(fields::PREFERRED_LYR)?
        .into_iter()
        .map(|p| if p.is_nan() { 0.0 } else { p })
        .collect();
    let equity = ctx.report_section(fields::TOT_EQUITY_LYR)?;
    let assets = ctx.report_section(fields::TOT_ASSETS_LYR)?;
    let previous = ctx.calendar.shift(ctx.dates.tdate, -1)?;
    let market_value = ctx.section(fields::MKT_CAP_ARD, previous)?;

    let senior = zip(&preferred, &long_term_debt, |p, d| p + d);
    let mlev = zip(&senior, &market_value, |s, me| safe_div(s, me) + 1.0);
    let book_plus_debt = zip(&equity, &long_term_debt, |e, d| e + d);
    let common = zip(&equity, &preferred, |e, p| e - p);
    let blev = zip(&book_plus_debt, &common, safe_div);
    let dtoa = zip(&liabilities, &assets, safe_div);

    table(ctx.entities, vec![("MLEV_barra", mlev), ("BLEV_barra", blev), ("DTOA_barra", dtoa)])
}

fn barra_value<S: PanelSource>(ctx: &mut Context<'_, S>) -> Result<FactorTable, PipelineError> {
    let inverse = |values: Vec<f64>| -> Vec<f64> { values.into_iter().map(reciprocal).collect() };
    let date = ctx.dates.value_date;
    let columns = vec![
        ("BTOP_barra", inverse(ctx.section(fields::PB_LF, date)?)),
        ("ETOP_barra", inverse(ctx.section(fields::PE_TTM, date)?)),
        ("CETOP_barra", inverse(ctx.section(fields::PCF_OCF_TTM, date)?)),
    ];
    table(ctx.entities, columns)
}

fn barra_growth<S: PanelSource>(ctx: &mut Context<'_, S>) -> Result<FactorTable, PipelineError> {
    let reports = ctx.store.get_dates(fields::APPLIED_RPT_DATE)?;
    let eps = ctx.panel(fields::EPS_DILUTED)?;
    let orps = ctx.panel(fields::ORPS)?;
    let month = ctx.dates.report_month;
    let config = ctx.config.growth();
    let egro = factors::fiscal_growth_rate(month, ctx.entities, &eps, &reports, config)?;
    let sgro = factors::fiscal_growth_rate(month, ctx.entities, &orps, &reports, config)?;
    table(ctx.entities, vec![("EGRO_barra", egro), ("SGRO_barra", sgro)])
}

fn barra_finance<S: PanelSource>(ctx: &mut Context<'_, S>) -> Result<Vec<FactorTable>, PipelineError> {
    let category = Category::BarraFinance;
    Ok(vec![
        ctx.part(category, "leverage", names(&["MLEV_barra", "BLEV_barra", "DTOA_barra"]), barra_leverage)?,
        ctx.part(category, "value", names(&["BTOP_barra", "ETOP_barra", "CETOP_barra"]), barra_value)?,
        ctx.part(category, "growth", names(&["EGRO_barra", "SGRO_barra"]), barra_growth)?,
    ])
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use tessera_panel::MemorySource;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn entities() -> Vec<EntityId> {
        vec![EntityId::new("A"), EntityId::new("B")]
    }

    fn monthly(values: [f64; 2]) -> Panel {
        Panel::from_rows(
            vec![d(2020, 1, 31)],
            vec![("A".into(), vec![values[0]]), ("B".into(), vec![values[1]])],
        )
        .unwrap()
    }

    fn dates() -> AnchorDates {
        AnchorDates {
            tdate: d(2020, 1, 31),
            value_date: d(2020, 1, 31),
            report_month: d(2020, 1, 31),
            month_end: true,
        }
    }

    fn run(source: MemorySource, category: Category) -> FactorTable {
        let calendar = TradingCalendar::new(vec![d(2020, 1, 30), d(2020, 1, 31)]).unwrap();
        let config = PipelineConfig::default();
        let dates = dates();
        let entities = entities();
        let mut store = PanelStore::new(source);
        let mut masked = None;
        let mut ctx = Context {
            store: &mut store,
            masked_turnover: &mut masked,
            calendar: &calendar,
            config: &config,
            dates: &dates,
            entities: &entities,
        };
        compute(category, &mut ctx).unwrap()
    }

    fn value_source() -> MemorySource {
        MemorySource::new()
            .with_panel(fields::PE_TTM, monthly([10.0, 0.0]))
            .with_panel(fields::PE_DEDUCTED_TTM, monthly([20.0, f64::NAN]))
            .with_panel(fields::PB_LF, monthly([2.0, 4.0]))
            .with_panel(fields::PS_TTM, monthly([5.0, 1.0]))
            .with_panel(fields::PCF_NCF_TTM, monthly([8.0, 8.0]))
            .with_panel(fields::PCF_OCF_TTM, monthly([4.0, -2.0]))
            .with_panel(fields::DIVIDEND_YIELD, monthly([1.5, 0.0]))
            .with_panel(fields::PROFIT_TTM_G, monthly([30.0, 10.0]))
    }

    #[test]
    fn value_ratios_invert_multiples() {
        let table = run(value_source(), Category::Value);
        assert_relative_eq!(table.column("EP").unwrap()[0], 0.1);
        assert!(table.column("EP").unwrap()[1].is_nan());
        assert!(table.column("EPcut").unwrap()[1].is_nan());
        assert_relative_eq!(table.column("BP").unwrap()[1], 0.25);
        assert_relative_eq!(table.column("OCFP").unwrap()[1], -0.5);
        assert_relative_eq!(table.column("G/PE").unwrap()[0], 3.0);
        assert_relative_eq!(table.column("DP").unwrap()[0], 1.5);
    }

    #[test]
    fn absent_panel_fills_category_with_missing() {
        let source = value_source().with_panel(fields::QFA_YOYSALES, monthly([1.0, 2.0]));
        let table = run(source, Category::Growth);
        assert_eq!(table.n_columns(), 4);
        for name in ["Sales_G_q", "Profit_G_q", "OCF_G_q", "ROE_G_q"] {
            assert!(table.column(name).unwrap().iter().all(|v| v.is_nan()));
        }
    }

    #[test]
    fn ratio_columns_guard_zero_denominators() {
        let source = MemorySource::new()
            .with_panel(fields::QFA_ROE, monthly([10.0, 12.0]))
            .with_panel(fields::ROE_TTM, monthly([9.0, 11.0]))
            .with_panel(fields::QFA_ROA, monthly([4.0, 6.0]))
            .with_panel(fields::ROA_TTM, monthly([3.0, 5.0]))
            .with_panel(fields::QFA_GROSS_MARGIN, monthly([30.0, 40.0]))
            .with_panel(fields::GROSS_MARGIN_TTM, monthly([31.0, 41.0]))
            .with_panel(fields::QFA_DEDUCTED_PROFIT, monthly([5.0, 5.0]))
            .with_panel(fields::QFA_OPER_REV, monthly([50.0, 0.0]))
            .with_panel(fields::DEDUCTED_PROFIT_TTM, monthly([20.0, 20.0]))
            .with_panel(fields::OR_TTM, monthly([100.0, 80.0]))
            .with_panel(fields::QFA_NET_MARGIN, monthly([8.0, 0.0]))
            .with_panel(fields::ASSET_TURNOVER_TTM, monthly([0.7, 0.9]))
            .with_panel(fields::QFA_OPER_CASH_FLOW, monthly([6.0, 3.0]))
            .with_panel(fields::QFA_NET_PROFIT, monthly([4.0, f64::NAN]))
            .with_panel(fields::OCFPS_TTM, monthly([1.2, 0.5]))
            .with_panel(fields::EPS_TTM, monthly([0.6, 0.25]));
        let table = run(source, Category::Finance);

        assert_relative_eq!(table.column("profitmargin_q").unwrap()[0], 0.1);
        assert!(table.column("profitmargin_q").unwrap()[1].is_nan());
        assert_relative_eq!(table.column("assetturnover_q").unwrap()[0], 0.5);
        assert!(table.column("assetturnover_q").unwrap()[1].is_nan());
        assert_relative_eq!(table.column("operationcashflowratio_q").unwrap()[0], 1.5);
        assert!(table.column("operationcashflowratio_q").unwrap()[1].is_nan());
        assert_relative_eq!(table.column("operationcashflowratio_ttm").unwrap()[1], 2.0);
    }

    #[test]
    fn leverage_treats_missing_preferred_as_zero() {
        let daily = Panel::from_rows(
            vec![d(2020, 1, 30), d(2020, 1, 31)],
            vec![("A".into(), vec![100.0, 1.0]), ("B".into(), vec![50.0, 1.0])],
        )
        .unwrap();
        let source = MemorySource::new()
            .with_panel(fields::LONG_DEBT_TO_DEBT_LYR, monthly([0.5, 0.2]))
            .with_panel(fields::TOT_LIAB_LYR, monthly([40.0, 50.0]))
            .with_panel(fields::PREFERRED_LYR, monthly([f64::NAN, 5.0]))
            .with_panel(fields::TOT_EQUITY_LYR, monthly([60.0, 25.0]))
            .with_panel(fields::TOT_ASSETS_LYR, monthly([100.0, 0.0]))
            .with_panel(fields::MKT_CAP_ARD, daily);

        let calendar = TradingCalendar::new(vec![d(2020, 1, 30), d(2020, 1, 31)]).unwrap();
        let config = PipelineConfig::default();
        let dates = dates();
        let entities = entities();
        let mut store = PanelStore::new(source);
        let mut masked = None;
        let mut ctx = Context {
            store: &mut store,
            masked_turnover: &mut masked,
            calendar: &calendar,
            config: &config,
            dates: &dates,
            entities: &entities,
        };
        let table = barra_leverage(&mut ctx).unwrap();

        // A: debt 20, no preferred, market value on the previous day 100.
        assert_relative_eq!(table.column("MLEV_barra").unwrap()[0], 1.2);
        assert_relative_eq!(table.column("BLEV_barra").unwrap()[0], 80.0 / 60.0);
        assert_relative_eq!(table.column("DTOA_barra").unwrap()[0], 0.4);
        // B: debt 10, preferred 5, market value 50.
        assert_relative_eq!(table.column("MLEV_barra").unwrap()[1], 1.3);
        assert_relative_eq!(table.column("BLEV_barra").unwrap()[1], 35.0 / 20.0);
        assert!(table.column("DTOA_barra").unwrap()[1].is_nan());
    }
}
