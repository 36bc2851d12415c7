//! Identification columns and the snapshot row filter.

use tessera_calendar::month_end;
use tessera_primitives::{BasicRow, Date};
use tessera_traits::PanelSource;
use tracing::{debug, warn};

use crate::{
    EligibilityRules, Frequency, PipelineError,
    categories::{self, Context},
    fields,
};

/// Basic rows for every entity of `ctx`, in entity order.
pub(crate) fn basic_rows<S: PanelSource>(ctx: &mut Context<'_, S>) -> Result<Vec<BasicRow>, PipelineError> {
    let n = ctx.entities.len();
    let names = label_section(ctx, fields::SEC_NAME)?;
    let industries = industries(ctx)?;
    let caps = categories::float_cap(ctx)?;

    let (is_open, forward) = match ctx.config.frequency {
        Frequency::Weekly => (open_flags(ctx, ctx.dates.tdate)?, vec![f64::NAN; n]),
        Frequency::Monthly => match ctx.calendar.next_month_first(ctx.dates.tdate) {
            Some(next) => (open_flags(ctx, next)?, forward_returns(ctx, month_end(next))?),
            None => {
                debug!(date = %ctx.dates.tdate, "no trading day in the next month yet");
                (vec![None; n], vec![f64::NAN; n])
            }
        },
    };

    Ok(ctx
        .entities
        .iter()
        .zip(names)
        .zip(industries)
        .zip(caps)
        .zip(is_open)
        .zip(forward)
        .map(|(((((code, name), industry), mkt_cap_float), is_open), pct_chg_nm)| BasicRow {
            code: code.clone(),
            name,
            industry,
            mkt_cap_float,
            is_open,
            pct_chg_nm,
        })
        .collect())
}

/// Label panel at the valuation date; weekly runs read the daily snapshot.
fn label_section<S: PanelSource>(
    ctx: &mut Context<'_, S>,
    name: &str,
) -> Result<Vec<Option<String>>, PipelineError> {
    let (name, date) = match ctx.config.frequency {
        Frequency::Monthly => (name.to_string(), ctx.dates.value_date),
        Frequency::Weekly => (fields::daily_variant(name), ctx.dates.tdate),
    };
    Ok(ctx.store.get_labels(&name)?.cross_section_or_missing(ctx.entities, date)?)
}

/// Level-1 industries, with split industries replaced by their level-2 label.
fn industries<S: PanelSource>(ctx: &mut Context<'_, S>) -> Result<Vec<Option<String>>, PipelineError> {
    let config = ctx.config;
    let split = &config.eligibility.split_industries;
    let level1 = label_section(ctx, fields::INDUSTRY)?;
    if !level1.iter().flatten().any(|l| split.contains(l)) {
        return Ok(level1);
    }
    let level2 = label_section(ctx, fields::INDUSTRY_L2)?;
    Ok(level1
        .into_iter()
        .zip(level2)
        .map(|(l1, l2)| match l1 {
            Some(l1) if split.contains(&l1) => l2,
            other => other,
        })
        .collect())
}

/// `Some(status == 1)`, or `None` where the status is missing.
fn open_flags<S: PanelSource>(ctx: &mut Context<'_, S>, date: Date) -> Result<Vec<Option<bool>>, PipelineError> {
    let status = ctx.store.get_panel(fields::TRADE_STATUS)?.cross_section_or_missing(ctx.entities, date)?;
    Ok(status.into_iter().map(|s| if s.is_nan() { None } else { Some(s == 1.0) }).collect())
}

/// Next month's return; missing when not yet available.
fn forward_returns<S: PanelSource>(ctx: &mut Context<'_, S>, caldate: Date) -> Result<Vec<f64>, PipelineError> {
    let lookup = ctx
        .store
        .get_panel(fields::PCT_CHG_M)
        .map_err(PipelineError::from)
        .and_then(|p| Ok(p.cross_section_or_missing(ctx.entities, caldate)?));
    match lookup {
        Ok(values) => Ok(values),
        Err(e) if e.is_recoverable() => {
            warn!(date = %caldate, error = %e, "next month return unavailable");
            Ok(vec![f64::NAN; ctx.entities.len()])
        }
        Err(e) => Err(e),
    }
}

/// Whether a row may be written to a snapshot.
///
/// Rows are dropped when the trading status is unknown, the name carries an
/// excluded marker, the industry is missing or the placeholder, or the float
/// market capitalisation is missing. A missing name is kept.
#[must_use]
pub fn is_eligible(row: &BasicRow, rules: &EligibilityRules) -> bool {
    let name_ok = row
        .name
        .as_deref()
        .is_none_or(|name| !rules.excluded_name_markers.iter().any(|m| name.contains(m.as_str())));
    let industry_ok = row
        .industry
        .as_deref()
        .is_some_and(|industry| !industry.contains(rules.industry_placeholder.as_str()));
    row.is_open.is_some() && name_ok && industry_ok && !row.mkt_cap_float.is_nan()
}

/// Entities of `rows` that pass [`is_eligible`].
pub(crate) fn eligible_mask(rows: &[BasicRow], rules: &EligibilityRules) -> Vec<bool> {
    rows.iter().map(|r| is_eligible(r, rules)).collect()
}
