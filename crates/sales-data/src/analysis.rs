//! Report pipeline for the two dashboard views.
//!
//! Takes an already filtered [`SalesTable`] and derives everything the
//! "Sales Overview" and "Top Markets" views display. Empty slices are reported
//! as `None` so the presentation layer can say so explicitly instead of
//! drawing an empty chart.

use sales_core::error::Result;
use sales_core::models::{Dimension, Measure, Month, Period, SalesTable};
use sales_core::settings::DEFAULT_THRESHOLD;
use tracing::debug;

use crate::aggregator::{series_by, sum_by, totals, GroupTotal, Series, Totals};
use crate::contribution::{contribution_table, top_contributors_with, ContributionRow, CutoffRule};

// ── Options ───────────────────────────────────────────────────────────────────

/// Parameters of the top-state selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportOptions {
    /// Cumulative revenue share, in percent, the selected states must cover.
    pub threshold_pct: f64,
    pub cutoff: CutoffRule,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            threshold_pct: DEFAULT_THRESHOLD,
            cutoff: CutoffRule::default(),
        }
    }
}

// ── Overview ──────────────────────────────────────────────────────────────────

/// One slice of a share chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Share {
    pub key: String,
    pub total: f64,
    pub share_pct: f64,
}

/// Revenue split by region for one period.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMix {
    pub period: Period,
    /// `None` when the period holds no rows.
    pub shares: Option<Vec<Share>>,
}

/// Everything shown on the "Sales Overview" view.
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewReport {
    pub totals: Totals,
    /// Monthly revenue per L0 category.
    pub category_trend: Vec<Series>,
    /// Fewer than two distinct months: a trend cannot be read from the data.
    pub insufficient_variation: bool,
    pub by_distribution_channel: Vec<GroupTotal>,
    pub by_sub_channel: Vec<GroupTotal>,
    pub by_customer_group: Vec<GroupTotal>,
    /// Q1, Q2 and October, in that order.
    pub region_mix: Vec<RegionMix>,
}

/// Build the overview report for `table`.
pub fn overview(table: &SalesTable) -> OverviewReport {
    let insufficient_variation = table.observed_months().len() <= 1;

    let region_mix = [Period::Q1, Period::Q2, Period::October]
        .into_iter()
        .map(|period| RegionMix {
            period,
            shares: region_shares(&table.slice(period)),
        })
        .collect();

    OverviewReport {
        totals: totals(table),
        category_trend: series_by(
            table,
            Dimension::L0Category,
            Measure::Amount,
            &observed_span(table),
        ),
        insufficient_variation,
        by_distribution_channel: sum_by(table, Dimension::DistributionChannel, Measure::Amount),
        by_sub_channel: sum_by(table, Dimension::SubChannel, Measure::Amount),
        by_customer_group: sum_by(table, Dimension::CustomerGroup, Measure::Amount),
        region_mix,
    }
}

/// Every month from the first to the last observed one, gaps included.
fn observed_span(table: &SalesTable) -> Vec<Month> {
    let observed = table.observed_months();
    match (observed.first(), observed.last()) {
        (Some(&first), Some(&last)) => Month::ALL
            .into_iter()
            .filter(|m| *m >= first && *m <= last)
            .collect(),
        _ => Vec::new(),
    }
}

fn region_shares(slice: &SalesTable) -> Option<Vec<Share>> {
    if slice.is_empty() {
        return None;
    }
    let groups = sum_by(slice, Dimension::RegionName, Measure::Amount);
    let whole: f64 = groups.iter().map(|g| g.total).sum();
    Some(
        groups
            .into_iter()
            .map(|g| Share {
                share_pct: if whole == 0.0 { 0.0 } else { g.total / whole * 100.0 },
                key: g.key,
                total: g.total,
            })
            .collect(),
    )
}

// ── Top markets ───────────────────────────────────────────────────────────────

/// Everything shown on the "Top Markets" view.
///
/// All state-level series are restricted to [`Self::reference_states`] and
/// ordered by their Q1 rank.
#[derive(Debug, Clone, PartialEq)]
pub struct TopMarketsReport {
    pub options: ReportOptions,
    /// States selected from the Q1 slice; empty when Q1 has no data.
    pub reference_states: Vec<String>,
    /// Apr..Oct monthly revenue per reference state; `None` when Q1 is empty.
    pub full_trend: Option<Vec<Series>>,
    /// `None` when the Q1 slice is empty.
    pub q1_trend: Option<Vec<Series>>,
    /// `None` when the Q2 slice is empty.
    pub q2_trend: Option<Vec<Series>>,
    /// October revenue per reference state, descending; `None` when October
    /// is empty.
    pub october: Option<Vec<GroupTotal>>,
    /// Q1 state ranking with shares.
    pub contribution: Vec<ContributionRow>,
}

/// Build the top-markets report for `table`.
///
/// The reference states are computed once from the Q1 slice and reused as a
/// state filter for every other period.
pub fn top_markets(table: &SalesTable, options: ReportOptions) -> Result<TopMarketsReport> {
    let q1 = table.slice(Period::Q1);
    let q2 = table.slice(Period::Q2);
    let october = table.slice(Period::October);

    let reference_states = top_contributors_with(&q1, options.threshold_pct, options.cutoff)?;
    debug!(
        states = reference_states.len(),
        threshold = options.threshold_pct,
        cutoff = %options.cutoff,
        "selected reference states"
    );

    let restrict = |slice: &SalesTable| {
        slice.filter(|r| {
            r.state_name
                .as_deref()
                .is_some_and(|s| reference_states.iter().any(|x| x == s))
        })
    };

    let state_series = |slice: &SalesTable, period: Period| {
        rank_like(
            series_by(
                &restrict(slice),
                Dimension::StateName,
                Measure::Amount,
                period.months(),
            ),
            &reference_states,
        )
    };

    let full_trend = (!q1.is_empty())
        .then(|| state_series(&table.slice(Period::FullRange), Period::FullRange));
    let q1_trend = (!q1.is_empty()).then(|| state_series(&q1, Period::Q1));
    let q2_trend = (!q2.is_empty()).then(|| state_series(&q2, Period::Q2));
    let october_ranking = (!october.is_empty())
        .then(|| sum_by(&restrict(&october), Dimension::StateName, Measure::Amount));

    Ok(TopMarketsReport {
        options,
        contribution: contribution_table(&q1),
        reference_states,
        full_trend,
        q1_trend,
        q2_trend,
        october: october_ranking,
    })
}

/// Order `series` to follow `ranking`; keys absent from it go last.
fn rank_like(mut series: Vec<Series>, ranking: &[String]) -> Vec<Series> {
    series.sort_by_key(|s| ranking.iter().position(|r| *r == s.key).unwrap_or(usize::MAX));
    series
}

// ── Tests ─────────────────────────────────────────────────────────────────────
