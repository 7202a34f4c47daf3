//! TTL-cached access to the canonical sales table.
//!
//! The table is loaded once from a [`TableSource`], shared as an
//! [`Arc<SalesTable>`], and reloaded only after the cache TTL has passed.
//! Time is passed in by the caller so expiry can be exercised without sleeping.
//! When a reload fails and an older table is still held, that table is returned
//! and the error is recorded.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use sales_core::error::Result;
use sales_core::models::SalesTable;
use sales_core::settings::DEFAULT_CACHE_TTL_SECS;
use sales_data::store::read_parquet;

// ── TableSource ───────────────────────────────────────────────────────────────

/// Somewhere a canonical table can be loaded from.
pub trait TableSource {
    fn load(&self) -> Result<SalesTable>;

    /// Short description for logs and the header.
    fn describe(&self) -> String;
}

/// The canonical Parquet file on disk.
#[derive(Debug, Clone)]
pub struct ParquetSource {
    path: PathBuf,
}

impl ParquetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableSource for ParquetSource {
    fn load(&self) -> Result<SalesTable> {
        read_parquet(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ── DataManager ───────────────────────────────────────────────────────────────

/// TTL cache around a [`TableSource`].
///
/// # Example
/// ```no_run
/// use std::time::Instant;
/// use sales_runtime::data_manager::{DataManager, ParquetSource};
///
/// let mut mgr = DataManager::new(ParquetSource::new("primary_sales.parquet"), 300);
/// if let Ok(table) = mgr.get_or_reload(Instant::now()) {
///     println!("rows: {}", table.len());
/// }
/// ```
pub struct DataManager<S: TableSource = ParquetSource> {
    source: S,
    /// Maximum age of the cached table before it is reloaded.
    cache_ttl: Duration,
    /// Most recently loaded table.
    table: Option<Arc<SalesTable>>,
    /// When `table` was loaded, on the caller's clock.
    loaded_at: Option<Instant>,
    /// Wall-clock time of the last successful load, for display.
    loaded_at_local: Option<DateTime<Local>>,
    /// Description of the last load failure, cleared on success.
    last_error: Option<String>,
}

impl<S: TableSource> DataManager<S> {
    pub fn new(source: S, cache_ttl_secs: u64) -> Self {
        Self {
            source,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            table: None,
            loaded_at: None,
            loaded_at_local: None,
            last_error: None,
        }
    }

    /// A manager with the default five-minute TTL.
    pub fn with_default_ttl(source: S) -> Self {
        Self::new(source, DEFAULT_CACHE_TTL_SECS)
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the cached table while it is younger than the TTL at `now`,
    /// otherwise load it again.
    ///
    /// A failed load falls back to the previously cached table when there is
    /// one; without a previous table the error is returned.
    pub fn get_or_reload(&mut self, now: Instant) -> Result<Arc<SalesTable>> {
        if let Some(table) = self.fresh_table(now) {
            tracing::debug!("returning cached sales table");
            return Ok(table);
        }

        match self.source.load() {
            Ok(table) => {
                tracing::debug!(
                    source = %self.source.describe(),
                    rows = table.len(),
                    "sales table loaded"
                );
                let table = Arc::new(table);
                self.table = Some(Arc::clone(&table));
                self.loaded_at = Some(now);
                self.loaded_at_local = Some(Local::now());
                self.last_error = None;
                Ok(table)
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                match &self.table {
                    Some(stale) => {
                        tracing::warn!(error = %e, "reload failed; serving previous table");
                        Ok(Arc::clone(stale))
                    }
                    None => Err(e),
                }
            }
        }
    }

    /// Treat the cache as expired and load again at `now`, keeping the
    /// current table as the fallback.
    pub fn force_reload(&mut self, now: Instant) -> Result<Arc<SalesTable>> {
        self.loaded_at = None;
        self.get_or_reload(now)
    }

    /// Drop the cached table entirely.
    pub fn invalidate_cache(&mut self) {
        self.table = None;
        self.loaded_at = None;
        self.loaded_at_local = None;
        tracing::debug!("cache invalidated");
    }

    /// Age of the cached table at `now`, or `None` if nothing is cached.
    pub fn cache_age(&self, now: Instant) -> Option<Duration> {
        self.loaded_at.map(|ts| now.saturating_duration_since(ts))
    }

    /// When the cached table was last loaded successfully.
    pub fn loaded_at_local(&self) -> Option<DateTime<Local>> {
        self.loaded_at_local
    }

    /// Description of the last load failure, or `None`.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn fresh_table(&self, now: Instant) -> Option<Arc<SalesTable>> {
        match (&self.table, self.loaded_at) {
            (Some(table), Some(ts)) if now.saturating_duration_since(ts) < self.cache_ttl => {
                Some(Arc::clone(table))
            }
            _ => None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use sales_core::error::SalesError;
    use sales_core::models::{Month, SalesRecord};
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use tempfile::TempDir;

    fn record(amount: f64) -> SalesRecord {
        SalesRecord {
            day: None,
            month: Month::Apr,
            year: None,
            channel: None,
            distribution_channel: None,
            sub_channel: None,
            customer_name: None,
            customer_group: None,
            state_name: Some("Kerala".to_string()),
            region_name: None,
            item_name: None,
            qty_sold: 1.0,
            amount,
            l1_category: None,
            l0_category: None,
        }
    }

    /// Source that replays scripted outcomes and counts loads.
    struct ScriptedSource {
        outcomes: RefCell<VecDeque<std::result::Result<usize, String>>>,
        loads: Cell<usize>,
    }

    impl ScriptedSource {
        /// `Ok(n)` yields a table with `n` rows; `Err` fails the load.
        fn new(outcomes: Vec<std::result::Result<usize, String>>) -> Self {
            Self {
                outcomes: RefCell::new(outcomes.into()),
                loads: Cell::new(0),
            }
        }
    }

    impl TableSource for ScriptedSource {
        fn load(&self) -> Result<SalesTable> {
            self.loads.set(self.loads.get() + 1);
            match self.outcomes.borrow_mut().pop_front() {
                Some(Ok(rows)) => Ok((0..rows).map(|i| record(i as f64)).collect()),
                Some(Err(msg)) => Err(SalesError::Config(msg)),
                None => Err(SalesError::Config("script exhausted".to_string())),
            }
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    // ── TTL ───────────────────────────────────────────────────────────────

    #[test]
    fn test_cache_miss_on_first_call() {
        let mgr = DataManager::new(ScriptedSource::new(vec![Ok(1)]), 300);
        assert!(mgr.cache_age(Instant::now()).is_none());
        assert!(mgr.last_error().is_none());
        assert!(mgr.loaded_at_local().is_none());
    }

    #[test]
    fn test_cache_valid_within_ttl() {
        let t0 = Instant::now();
        let mut mgr = DataManager::new(ScriptedSource::new(vec![Ok(2), Ok(5)]), 300);

        let first = mgr.get_or_reload(t0).unwrap();
        let second = mgr.get_or_reload(t0 + Duration::from_secs(299)).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(mgr.source().loads.get(), 1);
    }

    #[test]
    fn test_cache_reloads_after_ttl() {
        let t0 = Instant::now();
        let mut mgr = DataManager::new(ScriptedSource::new(vec![Ok(2), Ok(5)]), 300);

        assert_eq!(mgr.get_or_reload(t0).unwrap().len(), 2);
        let reloaded = mgr.get_or_reload(t0 + Duration::from_secs(300)).unwrap();

        assert_eq!(reloaded.len(), 5);
        assert_eq!(mgr.source().loads.get(), 2);
        assert_eq!(
            mgr.cache_age(t0 + Duration::from_secs(310)),
            Some(Duration::from_secs(10))
        );
    }

    #[test]
    fn test_failed_reload_serves_stale_table() {
        let t0 = Instant::now();
        let mut mgr = DataManager::new(
            ScriptedSource::new(vec![Ok(3), Err("disk gone".to_string())]),
            60,
        );

        let first = mgr.get_or_reload(t0).unwrap();
        let stale = mgr.get_or_reload(t0 + Duration::from_secs(61)).unwrap();

        assert!(Arc::ptr_eq(&first, &stale));
        assert!(mgr.last_error().unwrap().contains("disk gone"));
    }

    #[test]
    fn test_first_load_failure_is_error() {
        let mut mgr = DataManager::new(ScriptedSource::new(vec![Err("nope".to_string())]), 60);
        assert!(mgr.get_or_reload(Instant::now()).is_err());
        assert!(mgr.last_error().is_some());
    }

    #[test]
    fn test_success_clears_last_error() {
        let t0 = Instant::now();
        let mut mgr = DataManager::new(
            ScriptedSource::new(vec![Err("transient".to_string()), Ok(1)]),
            60,
        );
        assert!(mgr.get_or_reload(t0).is_err());
        assert!(mgr.get_or_reload(t0).is_ok());
        assert!(mgr.last_error().is_none());
    }

    #[test]
    fn test_force_reload_bypasses_ttl() {
        let t0 = Instant::now();
        let mut mgr = DataManager::new(ScriptedSource::new(vec![Ok(1), Ok(4)]), 300);

        mgr.get_or_reload(t0).unwrap();
        let forced = mgr.force_reload(t0 + Duration::from_secs(1)).unwrap();

        assert_eq!(forced.len(), 4);
        assert_eq!(mgr.source().loads.get(), 2);
    }

    #[test]
    fn test_invalidate_cache() {
        let t0 = Instant::now();
        let mut mgr = DataManager::new(ScriptedSource::new(vec![Ok(1)]), 300);

        mgr.get_or_reload(t0).unwrap();
        mgr.invalidate_cache();

        assert!(mgr.cache_age(t0).is_none());
        assert!(mgr.loaded_at_local().is_none());
    }

    #[test]
    fn test_default_ttl() {
        let mgr = DataManager::with_default_ttl(ScriptedSource::new(Vec::new()));
        assert_eq!(mgr.cache_ttl(), Duration::from_secs(300));
    }

    // ── ParquetSource ─────────────────────────────────────────────────────

    #[test]
    fn test_parquet_source_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("primary_sales.parquet");
        let table: SalesTable = vec![record(10.0), record(-2.5)].into_iter().collect();
        sales_data::store::write_parquet(&table, &path).unwrap();

        let mut mgr = DataManager::new(ParquetSource::new(&path), 300);
        let loaded = mgr.get_or_reload(Instant::now()).unwrap();

        assert_eq!(*loaded, table);
        assert_eq!(mgr.source().path(), path.as_path());
    }

    #[test]
    fn test_parquet_source_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut mgr = DataManager::new(ParquetSource::new(dir.path().join("absent.parquet")), 300);
        let err = mgr.get_or_reload(Instant::now()).unwrap_err();
        assert!(matches!(err, SalesError::FileAccess { .. }));
    }
}
