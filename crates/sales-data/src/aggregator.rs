//! Grouped sums over a [`SalesTable`].
//!
//! Every view reduces by summation. Rankings are ordered by descending total
//! (ties by ascending key); time series follow the fixed Apr..Oct order no
//! matter how the input rows are arranged. Rows whose grouping value is
//! missing are skipped.

use std::collections::{BTreeMap, BTreeSet};

use sales_core::models::{Dimension, Measure, Month, SalesTable};

// ── Result rows ───────────────────────────────────────────────────────────────

/// One entry of a ranking produced by [`sum_by`].
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal {
    pub key: String,
    pub total: f64,
}

/// One point of a month series produced by [`sum_by_month`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthTotal {
    pub month: Month,
    pub total: f64,
}

/// One cell of a (month, key) grouping produced by [`sum_by_month_and`].
#[derive(Debug, Clone, PartialEq)]
pub struct MonthGroupTotal {
    pub month: Month,
    pub key: String,
    pub total: f64,
}

/// A month-ordered line for one value of a secondary dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub key: String,
    pub points: Vec<MonthTotal>,
}

impl Series {
    /// Sum of every point.
    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.total).sum()
    }
}

// ── Totals ────────────────────────────────────────────────────────────────────

/// Headline figures for a table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Totals {
    /// Sum of Amount excluding tax.
    pub revenue: f64,
    /// Sum of Qty Sold.
    pub quantity: f64,
    /// Distinct non-missing item names.
    pub unique_items: usize,
    /// Distinct non-missing state names.
    pub active_states: usize,
    pub rows: usize,
}

/// Compute [`Totals`] for `table`.
pub fn totals(table: &SalesTable) -> Totals {
    let mut items: BTreeSet<&str> = BTreeSet::new();
    let mut states: BTreeSet<&str> = BTreeSet::new();
    let mut out = Totals::default();

    for r in table.records() {
        out.revenue += r.amount;
        out.quantity += r.qty_sold;
        out.rows += 1;
        if let Some(item) = r.dimension(Dimension::ItemName) {
            items.insert(item);
        }
        if let Some(state) = r.dimension(Dimension::StateName) {
            states.insert(state);
        }
    }

    out.unique_items = items.len();
    out.active_states = states.len();
    out
}

// ── Views ─────────────────────────────────────────────────────────────────────

/// Sum `measure` per value of `dimension`, ranked by descending total.
pub fn sum_by(table: &SalesTable, dimension: Dimension, measure: Measure) -> Vec<GroupTotal> {
    let mut groups: BTreeMap<&str, f64> = BTreeMap::new();
    for r in table.records() {
        if let Some(key) = r.dimension(dimension) {
            *groups.entry(key).or_insert(0.0) += r.measure(measure);
        }
    }

    let mut ranked: Vec<GroupTotal> = groups
        .into_iter()
        .map(|(key, total)| GroupTotal {
            key: key.to_string(),
            total,
        })
        .collect();
    // Stable sort keeps the ascending-key order among equal totals.
    ranked.sort_by(|a, b| b.total.total_cmp(&a.total));
    ranked
}

/// Sum `measure` per month, in Apr..Oct order. Only observed months appear.
pub fn sum_by_month(table: &SalesTable, measure: Measure) -> Vec<MonthTotal> {
    let mut months: BTreeMap<Month, f64> = BTreeMap::new();
    for r in table.records() {
        *months.entry(r.month).or_insert(0.0) += r.measure(measure);
    }
    months
        .into_iter()
        .map(|(month, total)| MonthTotal { month, total })
        .collect()
}

/// Sum `measure` per (month, `dimension`) pair.
///
/// Ordered by month first, then by ascending key. Only combinations that occur
/// in the data are emitted.
pub fn sum_by_month_and(
    table: &SalesTable,
    dimension: Dimension,
    measure: Measure,
) -> Vec<MonthGroupTotal> {
    let mut cells: BTreeMap<(Month, &str), f64> = BTreeMap::new();
    for r in table.records() {
        if let Some(key) = r.dimension(dimension) {
            *cells.entry((r.month, key)).or_insert(0.0) += r.measure(measure);
        }
    }
    cells
        .into_iter()
        .map(|((month, key), total)| MonthGroupTotal {
            month,
            key: key.to_string(),
            total,
        })
        .collect()
}

/// Pivot [`sum_by_month_and`] into one [`Series`] per key, keys ascending.
///
/// Every series has one point per entry of `months`, in that order, with
/// `0.0` where the key has no sales in that month. Cells outside `months` are
/// ignored, and a key with no cell inside `months` gets no series.
pub fn series_by(
    table: &SalesTable,
    dimension: Dimension,
    measure: Measure,
    months: &[Month],
) -> Vec<Series> {
    let mut by_key: BTreeMap<String, BTreeMap<Month, f64>> = BTreeMap::new();
    for cell in sum_by_month_and(table, dimension, measure) {
        if months.contains(&cell.month) {
            by_key
                .entry(cell.key)
                .or_default()
                .insert(cell.month, cell.total);
        }
    }
    by_key
        .into_iter()
        .map(|(key, cells)| Series {
            key,
            points: months
                .iter()
                .map(|&month| MonthTotal {
                    month,
                    total: cells.get(&month).copied().unwrap_or(0.0),
                })
                .collect(),
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
