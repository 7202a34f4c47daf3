use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the sales dashboard crates.
#[derive(Error, Debug)]
pub enum SalesError {
    /// A file could not be opened, read, or written.
    #[error("Failed to access file {path}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source workbook could not be opened or the sheet could not be read.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// The named worksheet does not exist in the workbook.
    #[error("Sheet '{sheet}' not found in {path}")]
    SheetNotFound { sheet: String, path: PathBuf },

    /// One or more required source columns are absent.
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A column exists but holds a type that cannot be read as expected.
    #[error("Column '{column}' has unsupported type {found}")]
    ColumnType { column: String, found: String },

    /// A month label is outside the fixed Apr..Oct set, or its derived
    /// key/number disagree with it.
    #[error("Month lookup failed: {0}")]
    MonthLookup(String),

    /// A filter selection violates a dimension's cardinality rule.
    #[error("Invalid selection for {dimension}: {reason}")]
    InvalidSelection { dimension: String, reason: String },

    /// Contribution threshold outside `(0, 100]`.
    #[error("Invalid threshold {0}: must be greater than 0 and at most 100")]
    InvalidThreshold(f64),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Arrow array construction or cast failed.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet encoding or decoding failed.
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// An error originating from the terminal / TUI layer.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<calamine::Error> for SalesError {
    fn from(err: calamine::Error) -> Self {
        SalesError::Spreadsheet(err.to_string())
    }
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, SalesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_access() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = SalesError::FileAccess {
            path: PathBuf::from("/data/primary_sales.parquet"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to access file"));
        assert!(msg.contains("/data/primary_sales.parquet"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_missing_columns_lists_all() {
        let err = SalesError::MissingColumns(vec!["Month".to_string(), "Qty Sold".to_string()]);
        assert_eq!(err.to_string(), "Missing required columns: Month, Qty Sold");
    }

    #[test]
    fn test_error_display_sheet_not_found() {
        let err = SalesError::SheetNotFound {
            sheet: "V2 Master Primary Data".to_string(),
            path: PathBuf::from("Primarydata.xlsx"),
        };
        assert_eq!(
            err.to_string(),
            "Sheet 'V2 Master Primary Data' not found in Primarydata.xlsx"
        );
    }

    #[test]
    fn test_error_display_month_lookup() {
        let err = SalesError::MonthLookup("Nov".to_string());
        assert_eq!(err.to_string(), "Month lookup failed: Nov");
    }

    #[test]
    fn test_error_display_invalid_selection() {
        let err = SalesError::InvalidSelection {
            dimension: "Region Name".to_string(),
            reason: "single choice only".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid selection for Region Name: single choice only"
        );
    }

    #[test]
    fn test_error_display_invalid_threshold() {
        let err = SalesError::InvalidThreshold(120.0);
        assert!(err.to_string().contains("120"));
    }

    #[test]
    fn test_error_display_config() {
        let err = SalesError::Config("missing data file".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing data file");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: SalesError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: SalesError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }

    #[test]
    fn test_error_from_arrow() {
        let err: SalesError = arrow::error::ArrowError::InvalidArgumentError("bad".into()).into();
        assert!(err.to_string().starts_with("Arrow error"));
    }
}
