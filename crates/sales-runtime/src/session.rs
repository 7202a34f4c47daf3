//! Interactive dashboard state.
//!
//! A [`DashboardSession`] owns the table cache, the current filter selection
//! and the top-state parameters. Every interaction recomputes a
//! [`DashboardSnapshot`] from scratch: filter the cached table, derive the
//! cascading option lists, and build both view reports.

use std::time::Instant;

use chrono::{DateTime, Local};
use sales_core::error::Result;
use sales_core::filters::{cascade_options, FilterOptions, FilterSelection, Selection};
use sales_core::models::{Dimension, SalesTable};
use sales_data::analysis::{overview, top_markets, OverviewReport, ReportOptions, TopMarketsReport};

use crate::data_manager::{DataManager, ParquetSource, TableSource};

/// Everything the UI needs to draw one frame.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub overview: OverviewReport,
    pub markets: TopMarketsReport,
    /// Option lists per filter dimension, narrowed by preceding filters.
    pub filter_options: Vec<FilterOptions>,
    pub filter_summary: String,
    /// Rows in the canonical table.
    pub total_rows: usize,
    /// Rows left after filtering.
    pub filtered_rows: usize,
    pub loaded_at: Option<DateTime<Local>>,
    /// Set when the last reload failed and an older table is being shown.
    pub load_warning: Option<String>,
}

/// Filter state plus cached data for one dashboard run.
pub struct DashboardSession<S: TableSource = ParquetSource> {
    data: DataManager<S>,
    filters: FilterSelection,
    options: ReportOptions,
}

impl<S: TableSource> DashboardSession<S> {
    pub fn new(data: DataManager<S>, options: ReportOptions) -> Self {
        Self {
            data,
            filters: FilterSelection::new(),
            options,
        }
    }

    pub fn filters(&self) -> &FilterSelection {
        &self.filters
    }

    pub fn options(&self) -> ReportOptions {
        self.options
    }

    /// Toggle `value` for `dim`; region replaces its single choice.
    pub fn toggle(&mut self, dim: Dimension, value: &str) -> Result<()> {
        self.filters.toggle(dim, value)?;
        tracing::debug!(dimension = %dim, value, "filter toggled");
        Ok(())
    }

    /// Reset `dim` to "All".
    pub fn reset_dimension(&mut self, dim: Dimension) -> Result<()> {
        self.filters.set(dim, Selection::Unrestricted)
    }

    /// Reset every filter to "All".
    pub fn clear_filters(&mut self) {
        self.filters.reset();
        tracing::debug!("filters cleared");
    }

    /// Recompute the snapshot at `now`, reloading the table if its TTL passed.
    ///
    /// Selected values that the preceding filters no longer offer are dropped
    /// first, so a later filter never hides rows with a value the panel
    /// cannot show.
    pub fn snapshot(&mut self, now: Instant) -> Result<DashboardSnapshot> {
        let table = self.data.get_or_reload(now)?;
        self.prune_filters(&table);
        self.build(&table)
    }

    /// Reload the table regardless of its age, then recompute.
    pub fn reload(&mut self, now: Instant) -> Result<DashboardSnapshot> {
        let table = self.data.force_reload(now)?;
        self.prune_filters(&table);
        self.build(&table)
    }

    pub fn data(&self) -> &DataManager<S> {
        &self.data
    }

    fn prune_filters(&mut self, table: &SalesTable) {
        if self.filters.prune(table) {
            tracing::debug!(summary = %self.filters.summary(), "dropped filter values no longer offered");
        }
    }

    fn build(&self, table: &SalesTable) -> Result<DashboardSnapshot> {
        let filtered = self.filters.apply(table);

        Ok(DashboardSnapshot {
            overview: overview(&filtered),
            markets: top_markets(&filtered, self.options)?,
            filter_options: cascade_options(table, &self.filters),
            filter_summary: self.filters.summary(),
            total_rows: table.len(),
            filtered_rows: filtered.len(),
            loaded_at: self.data.loaded_at_local(),
            load_warning: self.data.last_error().map(str::to_string),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
