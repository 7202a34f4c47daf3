//! Top-contribution state selection.
//!
//! States are ranked by revenue (Amount excluding tax), descending with ties
//! broken by ascending name, and a running cumulative share of the grand total
//! is computed. A [`CutoffRule`] then decides which ranked states are kept.

use std::fmt;

use sales_core::error::{Result, SalesError};
use sales_core::models::{Dimension, Measure, SalesTable};

use crate::aggregator::sum_by;

/// Tolerance applied when comparing cumulative shares to the threshold.
const SHARE_EPSILON: f64 = 1e-9;

// ── CutoffRule ────────────────────────────────────────────────────────────────

/// How the ranked state list is cut against the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CutoffRule {
    /// Shortest ranked prefix whose cumulative share reaches the threshold.
    #[default]
    Reach,
    /// Every state whose cumulative share is at or below the threshold; the
    /// top state alone when none qualifies.
    WithinThreshold,
}

impl CutoffRule {
    /// Parse the CLI spelling (`reach` / `within`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "reach" => Some(CutoffRule::Reach),
            "within" => Some(CutoffRule::WithinThreshold),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CutoffRule::Reach => "reach",
            CutoffRule::WithinThreshold => "within",
        }
    }
}

impl fmt::Display for CutoffRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── ContributionRow ───────────────────────────────────────────────────────────

/// One ranked state with its revenue share.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributionRow {
    pub state: String,
    pub revenue: f64,
    /// Share of the grand total, in percent.
    pub share_pct: f64,
    /// Running share including this row, in percent.
    pub cumulative_pct: f64,
}

/// Rank states by revenue and attach their individual and cumulative shares.
///
/// Shares are `0.0` when the grand total is zero.
pub fn contribution_table(table: &SalesTable) -> Vec<ContributionRow> {
    let ranked = sum_by(table, Dimension::StateName, Measure::Amount);
    let grand: f64 = ranked.iter().map(|g| g.total).sum();

    let mut running = 0.0;
    ranked
        .into_iter()
        .map(|g| {
            running += g.total;
            let (share_pct, cumulative_pct) = if grand == 0.0 {
                (0.0, 0.0)
            } else {
                (g.total / grand * 100.0, running / grand * 100.0)
            };
            ContributionRow {
                state: g.key,
                revenue: g.total,
                share_pct,
                cumulative_pct,
            }
        })
        .collect()
}

// ── Selection ─────────────────────────────────────────────────────────────────

/// States that together make up `threshold_pct` percent of revenue, using the
/// default [`CutoffRule::Reach`].
pub fn top_contributors(table: &SalesTable, threshold_pct: f64) -> Result<Vec<String>> {
    top_contributors_with(table, threshold_pct, CutoffRule::default())
}

/// States selected from `table` by `rule` at `threshold_pct`.
///
/// Returns an empty list only for a table with no attributable revenue rows;
/// any non-empty ranking yields at least the top state. When the grand total
/// is not positive the top state alone is returned.
pub fn top_contributors_with(
    table: &SalesTable,
    threshold_pct: f64,
    rule: CutoffRule,
) -> Result<Vec<String>> {
    if !(threshold_pct > 0.0 && threshold_pct <= 100.0) {
        return Err(SalesError::InvalidThreshold(threshold_pct));
    }

    let rows = contribution_table(table);
    let Some(top) = rows.first() else {
        return Ok(Vec::new());
    };

    let grand: f64 = rows.iter().map(|r| r.revenue).sum();
    if grand <= 0.0 {
        return Ok(vec![top.state.clone()]);
    }

    let selected: Vec<String> = match rule {
        CutoffRule::Reach => {
            let cut = rows
                .iter()
                .position(|r| r.cumulative_pct + SHARE_EPSILON >= threshold_pct)
                .map_or(rows.len(), |idx| idx + 1);
            rows.iter().take(cut).map(|r| r.state.clone()).collect()
        }
        CutoffRule::WithinThreshold => rows
            .iter()
            .filter(|r| r.cumulative_pct <= threshold_pct + SHARE_EPSILON)
            .map(|r| r.state.clone())
            .collect(),
    };

    if selected.is_empty() {
        Ok(vec![top.state.clone()])
    } else {
        Ok(selected)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
