//! Spreadsheet loading for the converter.
//!
//! Opens a workbook with [`calamine`], locates the source sheet, and flattens
//! it into a [`RawSheet`]: a header row plus rows of [`Cell`]s. No renaming or
//! validation happens here; see [`crate::normalizer`].

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use sales_core::error::{Result, SalesError};
use tracing::debug;

// ── Cell / RawSheet ───────────────────────────────────────────────────────────

/// A spreadsheet value reduced to the three shapes the normalizer cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(v) => Cell::Number(*v as f64),
            Data::Float(v) => Cell::Number(*v),
            Data::DateTime(v) => Cell::Number(v.as_f64()),
            Data::String(v) => Cell::Text(v.clone()),
            Data::DateTimeIso(v) | Data::DurationIso(v) => Cell::Text(v.clone()),
            Data::Bool(v) => Cell::Text(v.to_string()),
            // Error cells and blanks carry no usable value.
            _ => Cell::Empty,
        }
    }
}

/// Header row and data rows of one worksheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    /// Header labels exactly as they appear in the first row.
    pub headers: Vec<String>,
    /// Data rows; each row has at most `headers.len()` cells.
    pub rows: Vec<Vec<Cell>>,
}

impl RawSheet {
    /// Build a sheet from raw rows, treating the first row as headers.
    ///
    /// Fully empty rows are skipped.
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a [Data]>,
    {
        let mut iter = rows.into_iter();
        let Some(header_row) = iter.next() else {
            return Self::default();
        };

        let headers: Vec<String> = header_row
            .iter()
            .map(|d| match Cell::from(d) {
                Cell::Text(s) => s,
                Cell::Number(n) => n.to_string(),
                Cell::Empty => String::new(),
            })
            .collect();

        let rows = iter
            .map(|row| {
                row.iter()
                    .take(headers.len())
                    .map(Cell::from)
                    .collect::<Vec<_>>()
            })
            .filter(|row| !row.iter().all(Cell::is_empty))
            .collect();

        Self { headers, rows }
    }

    /// Cell at (`row`, `col`), `Empty` when the row is short.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Read `sheet` from the workbook at `path`.
///
/// The format (xlsx, xlsm, xlsb, xls, ods) is detected from the extension.
pub fn read_sheet(path: &Path, sheet: &str) -> Result<RawSheet> {
    if !path.exists() {
        return Err(SalesError::FileAccess {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "workbook not found"),
        });
    }

    let mut workbook = open_workbook_auto(path)?;

    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(SalesError::SheetNotFound {
            sheet: sheet.to_string(),
            path: path.to_path_buf(),
        });
    }

    let range = workbook.worksheet_range(sheet)?;
    let raw = RawSheet::from_rows(range.rows());

    debug!(
        path = %path.display(),
        sheet,
        columns = raw.headers.len(),
        rows = raw.rows.len(),
        "read worksheet"
    );

    Ok(raw)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
