use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{Result, SalesError};

// ── Month ─────────────────────────────────────────────────────────────────────

/// One of the seven reporting months, Apr through Oct, in fiscal order.
///
/// The derived `Ord` follows declaration order, so sorting by `Month` always
/// yields Apr before May before ... Oct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
}

impl Month {
    /// Every reporting month in display order.
    pub const ALL: [Month; 7] = [
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
    ];

    /// Parse an exact month label (`"Apr"` .. `"Oct"`).
    ///
    /// Matching is case-sensitive; anything else is out of range.
    pub fn from_label(label: &str) -> Option<Month> {
        Month::ALL.into_iter().find(|m| m.label() == label)
    }

    /// Lowercase key stored in the `MonthKey` column.
    pub fn key(self) -> &'static str {
        match self {
            Month::Apr => "apr",
            Month::May => "may",
            Month::Jun => "jun",
            Month::Jul => "jul",
            Month::Aug => "aug",
            Month::Sep => "sep",
            Month::Oct => "oct",
        }
    }

    /// Calendar month number stored in the `MonthNum` column (4..=10).
    pub fn num(self) -> i64 {
        match self {
            Month::Apr => 4,
            Month::May => 5,
            Month::Jun => 6,
            Month::Jul => 7,
            Month::Aug => 8,
            Month::Sep => 9,
            Month::Oct => 10,
        }
    }

    /// Display label, identical to the source `Month` value.
    pub fn label(self) -> &'static str {
        match self {
            Month::Apr => "Apr",
            Month::May => "May",
            Month::Jun => "Jun",
            Month::Jul => "Jul",
            Month::Aug => "Aug",
            Month::Sep => "Sep",
            Month::Oct => "Oct",
        }
    }

    /// Check that persisted derived columns agree with the month label.
    ///
    /// Returns the parsed month, or [`SalesError::MonthLookup`] when the label
    /// is unknown or the key/number disagree.
    pub fn verify(label: &str, key: &str, num: i64) -> Result<Month> {
        let month = Month::from_label(label)
            .ok_or_else(|| SalesError::MonthLookup(format!("unknown month label '{label}'")))?;
        if month.key() != key || month.num() != num {
            return Err(SalesError::MonthLookup(format!(
                "month '{label}' stored with key '{key}' and number {num}"
            )));
        }
        Ok(month)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Period ────────────────────────────────────────────────────────────────────

/// A named slice of the reporting months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    /// Apr..Jun; the reference period for the top-state selection.
    Q1,
    /// Jul..Sep.
    Q2,
    October,
    /// Every reporting month.
    FullRange,
}

impl Period {
    pub fn months(self) -> &'static [Month] {
        match self {
            Period::Q1 => &[Month::Apr, Month::May, Month::Jun],
            Period::Q2 => &[Month::Jul, Month::Aug, Month::Sep],
            Period::October => &[Month::Oct],
            Period::FullRange => &Month::ALL,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::Q1 => "Q1 (Apr-Jun)",
            Period::Q2 => "Q2 (Jul-Sep)",
            Period::October => "October",
            Period::FullRange => "Apr-Oct",
        }
    }
}

// ── Dimension / Measure ───────────────────────────────────────────────────────

/// A categorical column usable as a filter or grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Channel,
    DistributionChannel,
    SubChannel,
    CustomerName,
    CustomerGroup,
    StateName,
    RegionName,
    L0Category,
    L1Category,
    ItemName,
}

impl Dimension {
    /// Canonical column name in the normalized table.
    pub fn column_name(self) -> &'static str {
        match self {
            Dimension::Channel => "Channel",
            Dimension::DistributionChannel => "Distribution Channel",
            Dimension::SubChannel => "Sub-Channel",
            Dimension::CustomerName => "Customer Name",
            Dimension::CustomerGroup => "Customer Group",
            Dimension::StateName => "State Name",
            Dimension::RegionName => "Region Name",
            Dimension::L0Category => "L0 Category",
            Dimension::L1Category => "L1 Category",
            Dimension::ItemName => "Item Name",
        }
    }

    /// Short label used by the filter controls.
    pub fn display_name(self) -> &'static str {
        match self {
            Dimension::RegionName => "Region",
            Dimension::StateName => "State",
            other => other.column_name(),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// A numeric column subject to summation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Measure {
    QtySold,
    Amount,
}

impl Measure {
    /// Canonical column name in the normalized table.
    pub fn column_name(self) -> &'static str {
        match self {
            Measure::QtySold => "Qty Sold",
            Measure::Amount => "Amount excluding tax",
        }
    }
}

// ── SalesRecord ───────────────────────────────────────────────────────────────

/// One row of the canonical table.
///
/// Categorical fields are `None` when the source cell was empty. Measures
/// read as `0.0` when empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub day: Option<i64>,
    pub month: Month,
    pub year: Option<i64>,
    pub channel: Option<String>,
    pub distribution_channel: Option<String>,
    pub sub_channel: Option<String>,
    pub customer_name: Option<String>,
    pub customer_group: Option<String>,
    pub state_name: Option<String>,
    pub region_name: Option<String>,
    pub item_name: Option<String>,
    pub qty_sold: f64,
    pub amount: f64,
    pub l1_category: Option<String>,
    pub l0_category: Option<String>,
}

impl SalesRecord {
    /// Value of `dim` for this row, or `None` when missing.
    pub fn dimension(&self, dim: Dimension) -> Option<&str> {
        let value = match dim {
            Dimension::Channel => &self.channel,
            Dimension::DistributionChannel => &self.distribution_channel,
            Dimension::SubChannel => &self.sub_channel,
            Dimension::CustomerName => &self.customer_name,
            Dimension::CustomerGroup => &self.customer_group,
            Dimension::StateName => &self.state_name,
            Dimension::RegionName => &self.region_name,
            Dimension::L0Category => &self.l0_category,
            Dimension::L1Category => &self.l1_category,
            Dimension::ItemName => &self.item_name,
        };
        value.as_deref()
    }

    /// Value of `measure` for this row.
    pub fn measure(&self, measure: Measure) -> f64 {
        match measure {
            Measure::QtySold => self.qty_sold,
            Measure::Amount => self.amount,
        }
    }
}

// ── SalesTable ────────────────────────────────────────────────────────────────

/// An immutable, in-memory set of [`SalesRecord`]s.
///
/// Every transformation (filtering, period slicing) returns a new table; the
/// source is never mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesTable {
    records: Vec<SalesRecord>,
}

impl SalesTable {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Derive a new table holding only the rows for which `keep` is true.
    pub fn filter<F>(&self, keep: F) -> SalesTable
    where
        F: Fn(&SalesRecord) -> bool,
    {
        SalesTable::new(self.records.iter().filter(|r| keep(r)).cloned().collect())
    }

    /// Derive a new table holding only rows whose month is in `months`.
    pub fn months(&self, months: &[Month]) -> SalesTable {
        self.filter(|r| months.contains(&r.month))
    }

    /// Derive a new table holding only rows inside `period`.
    pub fn slice(&self, period: Period) -> SalesTable {
        self.months(period.months())
    }

    /// Distinct months present, in fiscal order.
    pub fn observed_months(&self) -> Vec<Month> {
        let set: BTreeSet<Month> = self.records.iter().map(|r| r.month).collect();
        set.into_iter().collect()
    }

    /// Sorted distinct non-missing values of `dim`.
    pub fn distinct(&self, dim: Dimension) -> Vec<String> {
        let set: BTreeSet<&str> = self.records.iter().filter_map(|r| r.dimension(dim)).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Sum of `measure` across every row.
    pub fn total(&self, measure: Measure) -> f64 {
        self.records.iter().map(|r| r.measure(measure)).sum()
    }
}

impl FromIterator<SalesRecord> for SalesTable {
    fn from_iter<I: IntoIterator<Item = SalesRecord>>(iter: I) -> Self {
        SalesTable::new(iter.into_iter().collect())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
