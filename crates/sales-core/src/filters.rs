//! Conjunctive per-dimension filtering over a [`SalesTable`].
//!
//! A [`FilterSelection`] holds one [`Selection`] for each of the seven filter
//! dimensions in [`FILTER_ORDER`]. Applying it narrows the table one dimension
//! at a time; because each step is an intersection the result does not depend
//! on the order, but the order does drive [`cascade_options`].

use std::collections::BTreeSet;

use crate::error::{Result, SalesError};
use crate::models::{Dimension, SalesRecord, SalesTable};

/// Dimensions exposed as filters, in the order they are applied and offered.
pub const FILTER_ORDER: [Dimension; 7] = [
    Dimension::Channel,
    Dimension::DistributionChannel,
    Dimension::SubChannel,
    Dimension::CustomerGroup,
    Dimension::RegionName,
    Dimension::StateName,
    Dimension::L0Category,
];

// ── Selection ─────────────────────────────────────────────────────────────────

/// The admitted values for a single dimension.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// No restriction: every row passes, including rows with a missing value.
    #[default]
    Unrestricted,
    /// Only rows whose value is in the set pass. An empty set admits nothing.
    Values(BTreeSet<String>),
}

impl Selection {
    /// Build a value selection from any iterator of strings.
    pub fn values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::Values(values.into_iter().map(Into::into).collect())
    }

    /// Build a selection admitting exactly one value.
    pub fn single(value: impl Into<String>) -> Self {
        Selection::values([value.into()])
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Selection::Unrestricted)
    }

    /// `true` when `value` passes this selection.
    pub fn admits(&self, value: Option<&str>) -> bool {
        match self {
            Selection::Unrestricted => true,
            Selection::Values(set) => value.is_some_and(|v| set.contains(v)),
        }
    }

    /// `true` when `value` is explicitly chosen (always `false` for
    /// [`Selection::Unrestricted`]).
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Selection::Unrestricted => false,
            Selection::Values(set) => set.contains(value),
        }
    }

    /// Number of explicitly chosen values, `None` when unrestricted.
    pub fn len(&self) -> Option<usize> {
        match self {
            Selection::Unrestricted => None,
            Selection::Values(set) => Some(set.len()),
        }
    }
}

// ── FilterSelection ───────────────────────────────────────────────────────────

/// One [`Selection`] per filter dimension.
///
/// Region is single-choice: [`FilterSelection::set`] rejects a region
/// selection holding more than one value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSelection {
    selections: [Selection; 7],
}

impl FilterSelection {
    /// A selection with every dimension unrestricted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current selection for `dim`.
    ///
    /// Dimensions outside [`FILTER_ORDER`] are always unrestricted.
    pub fn get(&self, dim: Dimension) -> &Selection {
        static UNRESTRICTED: Selection = Selection::Unrestricted;
        match position(dim) {
            Some(idx) => &self.selections[idx],
            None => &UNRESTRICTED,
        }
    }

    /// Replace the selection for `dim`.
    pub fn set(&mut self, dim: Dimension, selection: Selection) -> Result<()> {
        let idx = position(dim).ok_or_else(|| SalesError::InvalidSelection {
            dimension: dim.column_name().to_string(),
            reason: "not a filter dimension".to_string(),
        })?;
        if dim == Dimension::RegionName && selection.len().is_some_and(|n| n > 1) {
            return Err(SalesError::InvalidSelection {
                dimension: dim.column_name().to_string(),
                reason: "region accepts a single value or All".to_string(),
            });
        }
        self.selections[idx] = selection;
        Ok(())
    }

    /// Toggle `value` in the selection for `dim`.
    ///
    /// For the single-choice region dimension the value replaces the current
    /// choice, and toggling the chosen value returns to unrestricted. For
    /// multi-choice dimensions, removing the last value returns to
    /// unrestricted.
    pub fn toggle(&mut self, dim: Dimension, value: &str) -> Result<()> {
        let current = self.get(dim).clone();
        let next = if dim == Dimension::RegionName {
            if current.contains(value) {
                Selection::Unrestricted
            } else {
                Selection::single(value)
            }
        } else {
            let mut set = match current {
                Selection::Unrestricted => BTreeSet::new(),
                Selection::Values(set) => set,
            };
            if !set.remove(value) {
                set.insert(value.to_string());
            }
            if set.is_empty() {
                Selection::Unrestricted
            } else {
                Selection::Values(set)
            }
        };
        self.set(dim, next)
    }

    /// Drop selected values that the preceding dimensions no longer offer.
    ///
    /// Walks [`FILTER_ORDER`] the way [`cascade_options`] does. A dimension
    /// whose every chosen value was dropped returns to unrestricted; an
    /// explicitly empty selection is left as is. Returns `true` when anything
    /// changed.
    pub fn prune(&mut self, table: &SalesTable) -> bool {
        let mut narrowed = table.clone();
        let mut changed = false;

        for (idx, dim) in FILTER_ORDER.into_iter().enumerate() {
            let mut emptied = false;
            if let Selection::Values(set) = &mut self.selections[idx] {
                let offered: BTreeSet<String> = narrowed.distinct(dim).into_iter().collect();
                let before = set.len();
                set.retain(|v| offered.contains(v));
                if set.len() != before {
                    changed = true;
                    emptied = set.is_empty();
                }
            }
            if emptied {
                self.selections[idx] = Selection::Unrestricted;
            }
            let sel = &self.selections[idx];
            if !sel.is_unrestricted() {
                narrowed = narrowed.filter(|r| sel.admits(r.dimension(dim)));
            }
        }

        changed
    }

    /// Reset every dimension to unrestricted.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// `true` when no dimension is restricted.
    pub fn is_unrestricted(&self) -> bool {
        self.selections.iter().all(Selection::is_unrestricted)
    }

    /// `true` when `record` passes every dimension.
    pub fn admits(&self, record: &SalesRecord) -> bool {
        FILTER_ORDER
            .iter()
            .zip(self.selections.iter())
            .all(|(dim, sel)| sel.admits(record.dimension(*dim)))
    }

    /// Apply every dimension in [`FILTER_ORDER`], producing a new table.
    pub fn apply(&self, table: &SalesTable) -> SalesTable {
        if self.is_unrestricted() {
            return table.clone();
        }
        table.filter(|r| self.admits(r))
    }

    /// Short human-readable description of the active filters, e.g.
    /// `"Channel: Retail · Region: South"`, or `"All data"` when unrestricted.
    pub fn summary(&self) -> String {
        let parts: Vec<String> = FILTER_ORDER
            .iter()
            .zip(self.selections.iter())
            .filter_map(|(dim, sel)| match sel {
                Selection::Unrestricted => None,
                Selection::Values(set) if set.len() <= 2 => Some(format!(
                    "{}: {}",
                    dim.display_name(),
                    set.iter().cloned().collect::<Vec<_>>().join(", ")
                )),
                Selection::Values(set) => {
                    Some(format!("{}: {} selected", dim.display_name(), set.len()))
                }
            })
            .collect();
        if parts.is_empty() {
            "All data".to_string()
        } else {
            parts.join(" · ")
        }
    }
}

/// Option list offered for one filter dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    pub dimension: Dimension,
    pub values: Vec<String>,
}

/// Compute the option list for every filter dimension.
///
/// The options for the *n*-th dimension are the distinct values of `table`
/// after applying the selections of dimensions `0..n`; the first dimension is
/// offered every value in the table.
pub fn cascade_options(table: &SalesTable, selection: &FilterSelection) -> Vec<FilterOptions> {
    let mut narrowed = table.clone();
    let mut options = Vec::with_capacity(FILTER_ORDER.len());

    for dim in FILTER_ORDER {
        options.push(FilterOptions {
            dimension: dim,
            values: narrowed.distinct(dim),
        });
        let sel = selection.get(dim);
        if !sel.is_unrestricted() {
            narrowed = narrowed.filter(|r| sel.admits(r.dimension(dim)));
        }
    }

    options
}

fn position(dim: Dimension) -> Option<usize> {
    FILTER_ORDER.iter().position(|d| *d == dim)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
