use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default source sheet inside the raw workbook.
pub const DEFAULT_SHEET: &str = "V2 Master Primary Data";

/// Default canonical Parquet file shared by the converter and the dashboard.
pub const DEFAULT_DATA_FILE: &str = "primary_sales.parquet";

/// Default share of Q1 revenue the highlighted states must reach.
pub const DEFAULT_THRESHOLD: f64 = 70.0;

/// Default table cache lifetime in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Upper bound for `--cache-ttl`.
pub const MAX_CACHE_TTL_SECS: u64 = 86_400;

/// Accepted `--view` names.
pub const VIEWS: [&str; 2] = ["overview", "markets"];

/// Accepted `--cutoff` names.
pub const CUTOFFS: [&str; 2] = ["reach", "within"];

/// Accepted `--theme` names.
pub const THEMES: [&str; 4] = ["light", "dark", "classic", "auto"];

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Interactive primary sales dashboard
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sales-dashboard",
    about = "Interactive primary sales dashboard",
    version
)]
pub struct Settings {
    /// Canonical Parquet file produced by sales-convert
    #[arg(long, default_value = DEFAULT_DATA_FILE)]
    pub data_file: PathBuf,

    /// Initial view
    #[arg(long, default_value = "overview", value_parser = clap::builder::PossibleValuesParser::new(VIEWS))]
    pub view: String,

    /// Cumulative revenue share (percent) the top states must reach
    #[arg(long, default_value_t = DEFAULT_THRESHOLD, value_parser = parse_threshold)]
    pub threshold: f64,

    /// Rule used to cut the ranked state list
    #[arg(long, default_value = "reach", value_parser = clap::builder::PossibleValuesParser::new(CUTOFFS))]
    pub cutoff: String,

    /// Seconds before the loaded table is re-read from disk (1-86400)
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECS, value_parser = clap::value_parser!(u64).range(1..=86_400))]
    pub cache_ttl: u64,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = clap::builder::PossibleValuesParser::new(THEMES))]
    pub theme: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

/// Convert a raw spreadsheet export into the canonical Parquet file
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sales-convert",
    about = "Convert a raw spreadsheet export into the canonical Parquet file",
    version
)]
pub struct ConvertArgs {
    /// Source workbook (.xlsx, .xls, .xlsb or .ods)
    #[arg(long)]
    pub input: PathBuf,

    /// Sheet holding the raw records
    #[arg(long, default_value = DEFAULT_SHEET)]
    pub sheet: String,

    /// Destination Parquet file (overwritten)
    #[arg(long, default_value = DEFAULT_DATA_FILE)]
    pub output: PathBuf,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Accept a percentage in `(0, 100]`.
pub fn parse_threshold(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if value > 0.0 && value <= 100.0 {
        Ok(value)
    } else {
        Err(format!("{value} is outside (0, 100]"))
    }
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used display parameters saved to
/// `~/.sales-dashboard/last_used.json`.
///
/// Filter selections are deliberately absent: every session starts unfiltered.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cutoff: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<u64>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".sales-dashboard").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(params) => params,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable last-used params");
                Self::default()
            }
        }
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation: accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!(error = %e, "failed to clear last-used params");
            }
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values. Persisted values pass the
        // same checks as their flags; anything else keeps the default.
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = persisted_choice("view", last.view, &VIEWS) {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = persisted_choice("theme", last.theme, &THEMES) {
                settings.theme = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "data_file") {
            if let Some(v) = last.data_file {
                settings.data_file = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "threshold") {
            match last.threshold {
                Some(t) if t > 0.0 && t <= 100.0 => settings.threshold = t,
                Some(t) => tracing::warn!(value = t, "ignoring persisted threshold outside (0, 100]"),
                None => {}
            }
        }
        if !is_arg_explicitly_set(&matches, "cutoff") {
            if let Some(v) = persisted_choice("cutoff", last.cutoff, &CUTOFFS) {
                settings.cutoff = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "cache_ttl") {
            match last.cache_ttl {
                Some(t) if (1..=MAX_CACHE_TTL_SECS).contains(&t) => settings.cache_ttl = t,
                Some(t) => tracing::warn!(value = t, "ignoring persisted cache_ttl outside 1-86400"),
                None => {}
            }
        }

        settings = Self::apply_debug(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::warn!(error = %e, "failed to persist last-used params");
        }

        settings
    }

    /// `--debug` overrides the log level.
    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

impl ConvertArgs {
    /// Effective log level after applying `--debug`.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            theme: Some(s.theme.clone()),
            view: Some(s.view.clone()),
            data_file: Some(s.data_file.clone()),
            threshold: Some(s.threshold),
            cutoff: Some(s.cutoff.clone()),
            cache_ttl: Some(s.cache_ttl),
        }
    }
}

/// Keep a persisted value only when it is one of the names its flag accepts.
fn persisted_choice(field: &str, value: Option<String>, allowed: &[&str]) -> Option<String> {
    let value = value?;
    if allowed.contains(&value.as_str()) {
        Some(value)
    } else {
        tracing::warn!(field, value = %value, "ignoring unknown persisted value");
        None
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line.
///
/// clap stores the arg id using the field name (underscores), not the
/// long-flag spelling.
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            theme: Some("dark".to_string()),
            view: Some("markets".to_string()),
            data_file: Some(PathBuf::from("/data/sales.parquet")),
            threshold: Some(80.0),
            cutoff: Some("within".to_string()),
            cache_ttl: Some(60),
        };

        params.save_to(&path).expect("save");
        let loaded = LastUsedParams::load_from(&path);

        assert_eq!(loaded, params);
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);

        LastUsedParams {
            theme: Some("light".to_string()),
            ..Default::default()
        }
        .save_to(&path)
        .expect("save");
        assert!(path.exists(), "file must exist after save");

        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists(), "file must be gone after clear");
    }

    #[test]
    fn test_last_used_params_default_when_missing_or_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        assert_eq!(LastUsedParams::load_from(&path), LastUsedParams::default());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(LastUsedParams::load_from(&path), LastUsedParams::default());
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["sales-dashboard"]);

        assert_eq!(settings.data_file, PathBuf::from(DEFAULT_DATA_FILE));
        assert_eq!(settings.view, "overview");
        assert!((settings.threshold - 70.0).abs() < f64::EPSILON);
        assert_eq!(settings.cutoff, "reach");
        assert_eq!(settings.cache_ttl, 300);
        assert_eq!(settings.theme, "auto");
        assert_eq!(settings.log_level, "INFO");
        assert!(settings.log_file.is_none());
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_threshold_validation() {
        let ok = Settings::try_parse_from(["sales-dashboard", "--threshold", "85.5"]).unwrap();
        assert!((ok.threshold - 85.5).abs() < f64::EPSILON);

        assert!(Settings::try_parse_from(["sales-dashboard", "--threshold", "0"]).is_err());
        assert!(Settings::try_parse_from(["sales-dashboard", "--threshold", "101"]).is_err());
        assert!(Settings::try_parse_from(["sales-dashboard", "--threshold", "abc"]).is_err());
    }

    #[test]
    fn test_settings_rejects_unknown_view() {
        assert!(Settings::try_parse_from(["sales-dashboard", "--view", "daily"]).is_err());
    }

    #[test]
    fn test_parse_threshold_bounds() {
        assert_eq!(parse_threshold("100"), Ok(100.0));
        assert_eq!(parse_threshold(" 70 "), Ok(70.0));
        assert!(parse_threshold("-5").is_err());
    }

    #[test]
    fn test_convert_args_defaults() {
        let args = ConvertArgs::parse_from(["sales-convert", "--input", "Primarydata.xlsx"]);
        assert_eq!(args.input, PathBuf::from("Primarydata.xlsx"));
        assert_eq!(args.sheet, DEFAULT_SHEET);
        assert_eq!(args.output, PathBuf::from(DEFAULT_DATA_FILE));
        assert_eq!(args.effective_log_level(), "INFO");
    }

    #[test]
    fn test_convert_args_requires_input() {
        assert!(ConvertArgs::try_parse_from(["sales-convert"]).is_err());
    }

    #[test]
    fn test_convert_args_debug_level() {
        let args =
            ConvertArgs::parse_from(["sales-convert", "--input", "raw.xlsx", "--debug"]);
        assert_eq!(args.effective_log_level(), "DEBUG");
    }

    #[test]
    fn test_load_with_last_used_merges_persisted_values() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        LastUsedParams {
            theme: Some("dark".to_string()),
            view: Some("markets".to_string()),
            threshold: Some(60.0),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings =
            Settings::load_with_last_used_impl(vec!["sales-dashboard".into()], &config_path);
        assert_eq!(settings.theme, "dark");
        assert_eq!(settings.view, "markets");
        assert!((settings.threshold - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        LastUsedParams {
            theme: Some("dark".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec!["sales-dashboard".into(), "--theme".into(), "light".into()],
            &config_path,
        );
        assert_eq!(settings.theme, "light");
    }

    #[test]
    fn test_load_with_last_used_ignores_out_of_range_threshold() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        LastUsedParams {
            threshold: Some(250.0),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings =
            Settings::load_with_last_used_impl(vec!["sales-dashboard".into()], &config_path);
        assert!((settings.threshold - DEFAULT_THRESHOLD).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_with_last_used_ignores_unknown_names() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        LastUsedParams {
            theme: Some("neon".to_string()),
            view: Some("daily".to_string()),
            cutoff: Some("median".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings =
            Settings::load_with_last_used_impl(vec!["sales-dashboard".into()], &config_path);
        assert_eq!(settings.theme, "auto");
        assert_eq!(settings.view, "overview");
        assert_eq!(settings.cutoff, "reach");

        // The rewritten file carries the defaults, not the rejected names.
        let saved = LastUsedParams::load_from(&config_path);
        assert_eq!(saved.cutoff, Some("reach".to_string()));
        assert_eq!(saved.theme, Some("auto".to_string()));
    }

    #[test]
    fn test_load_with_last_used_ignores_out_of_range_cache_ttl() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        for bad in [0, MAX_CACHE_TTL_SECS + 1, 100_000] {
            LastUsedParams {
                cache_ttl: Some(bad),
                ..Default::default()
            }
            .save_to(&config_path)
            .expect("save");

            let settings =
                Settings::load_with_last_used_impl(vec!["sales-dashboard".into()], &config_path);
            assert_eq!(settings.cache_ttl, DEFAULT_CACHE_TTL_SECS, "cache_ttl {bad}");
        }

        LastUsedParams {
            cache_ttl: Some(MAX_CACHE_TTL_SECS),
            cutoff: Some("within".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");
        let settings =
            Settings::load_with_last_used_impl(vec!["sales-dashboard".into()], &config_path);
        assert_eq!(settings.cache_ttl, MAX_CACHE_TTL_SECS);
        assert_eq!(settings.cutoff, "within");
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        LastUsedParams {
            theme: Some("classic".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        Settings::load_with_last_used_impl(
            vec!["sales-dashboard".into(), "--clear".into()],
            &config_path,
        );

        assert!(!config_path.exists(), "file must be gone after --clear");
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        let settings = Settings::load_with_last_used_impl(
            vec!["sales-dashboard".into(), "--debug".into()],
            &config_path,
        );
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_load_with_last_used_persists_after_run() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        Settings::load_with_last_used_impl(
            vec!["sales-dashboard".into(), "--cutoff".into(), "within".into()],
            &config_path,
        );

        let loaded = LastUsedParams::load_from(&config_path);
        assert_eq!(loaded.cutoff, Some("within".to_string()));
        assert_eq!(loaded.cache_ttl, Some(DEFAULT_CACHE_TTL_SECS));
    }
}
