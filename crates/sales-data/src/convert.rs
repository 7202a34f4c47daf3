//! Spreadsheet → canonical Parquet conversion.

use std::path::{Path, PathBuf};

use sales_core::error::Result;
use tracing::info;

use crate::normalizer::normalize;
use crate::reader::{read_sheet, RawSheet};
use crate::store::write_parquet;

/// Outcome of one conversion run.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionSummary {
    pub output: PathBuf,
    pub rows_written: usize,
    /// Rows dropped because their month was outside Apr..Oct.
    pub dropped_rows: usize,
    /// Source columns not carried into the output.
    pub ignored_columns: Vec<String>,
}

/// Read `sheet` from the workbook at `input`, normalize it, and replace
/// `output` with the canonical Parquet file.
pub fn convert_workbook(input: &Path, sheet: &str, output: &Path) -> Result<ConversionSummary> {
    let raw = read_sheet(input, sheet)?;
    convert_sheet(&raw, output)
}

/// Normalize an already loaded sheet and write it to `output`.
pub fn convert_sheet(raw: &RawSheet, output: &Path) -> Result<ConversionSummary> {
    let normalized = normalize(raw)?;
    write_parquet(&normalized.table, output)?;

    info!(
        output = %output.display(),
        rows = normalized.table.len(),
        dropped = normalized.dropped_rows,
        "conversion complete"
    );

    Ok(ConversionSummary {
        output: output.to_path_buf(),
        rows_written: normalized.table.len(),
        dropped_rows: normalized.dropped_rows,
        ignored_columns: normalized.ignored_columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Cell;
    use crate::store::read_parquet;
    use sales_core::error::SalesError;
    use tempfile::TempDir;

    fn raw_sheet() -> RawSheet {
        let headers = [
            "Day",
            "Month",
            "Year",
            "Channels",
            "Distribution Channels",
            "Sub-Channel",
            "Customer Name",
            "Customer Group",
            "State Name",
            "Region Name",
            "Item Name",
            "Qty Sold",
            "Amount excluding tax",
            "L1 – Parent Category",
            "L0 - Parent Category",
            "Remarks",
        ];
        let row = |month: &str, state: &str, amount: f64| {
            let t = |s: &str| Cell::Text(s.to_string());
            vec![
                Cell::Number(5.0),
                t(month),
                Cell::Number(2024.0),
                t("Retail"),
                t("Distributor"),
                t("GT"),
                t("Acme"),
                t("Key"),
                t(state),
                t("South"),
                t("Chips"),
                Cell::Number(3.0),
                Cell::Number(amount),
                t("Salty"),
                t("Snacks"),
                t("ok"),
            ]
        };
        RawSheet {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: vec![
                row("Apr", "Kerala", 100.0),
                row("Mar", "Kerala", 7.0),
                row("Oct", "Goa", 55.5),
            ],
        }
    }

    #[test]
    fn test_convert_sheet_writes_canonical_file() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("primary_sales.parquet");

        let summary = convert_sheet(&raw_sheet(), &output).unwrap();
        assert_eq!(summary.rows_written, 2);
        assert_eq!(summary.dropped_rows, 1);
        assert_eq!(summary.ignored_columns, vec!["Remarks"]);

        let table = read_parquet(&output).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].channel.as_deref(), Some("Retail"));
    }

    #[test]
    fn test_convert_sheet_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.parquet");
        let second = dir.path().join("second.parquet");

        convert_sheet(&raw_sheet(), &first).unwrap();
        convert_sheet(&raw_sheet(), &second).unwrap();

        assert_eq!(std::fs::read(first).unwrap(), std::fs::read(second).unwrap());
    }

    #[test]
    fn test_convert_sheet_missing_columns_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("primary_sales.parquet");
        let mut raw = raw_sheet();
        raw.headers[12] = "Net".to_string();

        let err = convert_sheet(&raw, &output).unwrap_err();
        assert!(matches!(err, SalesError::MissingColumns(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_convert_workbook_missing_input() {
        let dir = TempDir::new().unwrap();
        let err = convert_workbook(
            &dir.path().join("Primarydata.xlsx"),
            "V2 Master Primary Data",
            &dir.path().join("out.parquet"),
        )
        .unwrap_err();
        assert!(matches!(err, SalesError::FileAccess { .. }));
    }
}
