//! Schema normalization: raw worksheet → canonical [`SalesTable`].
//!
//! Source headers are matched leniently (case, surrounding and repeated
//! whitespace, and hyphen/en-dash/em-dash variants are ignored) against the
//! fixed set of known column names. Legacy names are renamed to their
//! canonical form, rows outside the Apr..Oct reporting window are dropped, and
//! columns outside the canonical schema are not carried forward.

use std::sync::LazyLock;

use regex::Regex;
use sales_core::error::{Result, SalesError};
use sales_core::models::{Month, SalesRecord, SalesTable};
use tracing::{debug, warn};

use crate::reader::{Cell, RawSheet};

// ── Source fields ─────────────────────────────────────────────────────────────

/// A required source column, in canonical schema order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Day,
    Month,
    Year,
    Channel,
    DistributionChannel,
    SubChannel,
    CustomerName,
    CustomerGroup,
    StateName,
    RegionName,
    ItemName,
    QtySold,
    Amount,
    L1Category,
    L0Category,
}

impl Field {
    const ALL: [Field; 15] = [
        Field::Day,
        Field::Month,
        Field::Year,
        Field::Channel,
        Field::DistributionChannel,
        Field::SubChannel,
        Field::CustomerName,
        Field::CustomerGroup,
        Field::StateName,
        Field::RegionName,
        Field::ItemName,
        Field::QtySold,
        Field::Amount,
        Field::L1Category,
        Field::L0Category,
    ];

    fn canonical_name(self) -> &'static str {
        match self {
            Field::Day => "Day",
            Field::Month => "Month",
            Field::Year => "Year",
            Field::Channel => "Channel",
            Field::DistributionChannel => "Distribution Channel",
            Field::SubChannel => "Sub-Channel",
            Field::CustomerName => "Customer Name",
            Field::CustomerGroup => "Customer Group",
            Field::StateName => "State Name",
            Field::RegionName => "Region Name",
            Field::ItemName => "Item Name",
            Field::QtySold => "Qty Sold",
            Field::Amount => "Amount excluding tax",
            Field::L1Category => "L1 Category",
            Field::L0Category => "L0 Category",
        }
    }

    /// Legacy spellings found in raw exports.
    fn legacy_name(self) -> Option<&'static str> {
        match self {
            Field::Channel => Some("Channels"),
            Field::DistributionChannel => Some("Distribution Channels"),
            Field::L1Category => Some("L1 – Parent Category"),
            Field::L0Category => Some("L0 - Parent Category"),
            _ => None,
        }
    }

    /// Resolve a raw header to a field, if it names one.
    fn from_header(header: &str) -> Option<Field> {
        let key = header_key(header);
        Field::ALL.into_iter().find(|f| {
            header_key(f.canonical_name()) == key
                || f.legacy_name().is_some_and(|legacy| header_key(legacy) == key)
        })
    }
}

static DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[-\x{2010}-\x{2015}\x{2212}]\s*").expect("regex is valid"));
static SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("regex is valid"));

/// Comparison key for a header: lowercase, dashes unified, whitespace
/// collapsed.
fn header_key(header: &str) -> String {
    let dashed = DASH.replace_all(header.trim(), "-");
    SPACE.replace_all(&dashed, " ").to_lowercase()
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Result of normalizing one worksheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    /// The canonical table.
    pub table: SalesTable,
    /// Rows whose month fell outside Apr..Oct.
    pub dropped_rows: usize,
    /// Source headers that are not part of the canonical schema.
    pub ignored_columns: Vec<String>,
}

/// Map `raw` onto the canonical schema.
///
/// Fails with [`SalesError::MissingColumns`] naming every absent required
/// column, or [`SalesError::ColumnType`] when a measure cell holds text that is
/// not a number.
pub fn normalize(raw: &RawSheet) -> Result<Normalized> {
    let mut positions: [Option<usize>; 15] = [None; 15];
    let mut ignored_columns = Vec::new();

    for (idx, header) in raw.headers.iter().enumerate() {
        match Field::from_header(header) {
            Some(field) => {
                let slot = &mut positions[field as usize];
                if slot.is_some() {
                    warn!(header = %header, "duplicate source column ignored");
                } else {
                    *slot = Some(idx);
                }
            }
            None if header.trim().is_empty() => {}
            None => ignored_columns.push(header.clone()),
        }
    }

    let missing: Vec<String> = Field::ALL
        .iter()
        .zip(positions.iter())
        .filter(|(_, pos)| pos.is_none())
        .map(|(field, _)| field.canonical_name().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SalesError::MissingColumns(missing));
    }

    let col = |field: Field| positions[field as usize].unwrap_or_default();

    let mut records = Vec::with_capacity(raw.rows.len());
    let mut dropped_rows = 0usize;

    for row in 0..raw.rows.len() {
        let cell = |field: Field| raw.cell(row, col(field));

        let Some(month) = parse_month(cell(Field::Month)) else {
            dropped_rows += 1;
            continue;
        };

        records.push(SalesRecord {
            day: parse_int(cell(Field::Day)),
            month,
            year: parse_int(cell(Field::Year)),
            channel: parse_text(cell(Field::Channel)),
            distribution_channel: parse_text(cell(Field::DistributionChannel)),
            sub_channel: parse_text(cell(Field::SubChannel)),
            customer_name: parse_text(cell(Field::CustomerName)),
            customer_group: parse_text(cell(Field::CustomerGroup)),
            state_name: parse_text(cell(Field::StateName)),
            region_name: parse_text(cell(Field::RegionName)),
            item_name: parse_text(cell(Field::ItemName)),
            qty_sold: parse_measure(cell(Field::QtySold), Field::QtySold)?,
            amount: parse_measure(cell(Field::Amount), Field::Amount)?,
            l1_category: parse_text(cell(Field::L1Category)),
            l0_category: parse_text(cell(Field::L0Category)),
        });
    }

    if !ignored_columns.is_empty() {
        debug!(columns = ?ignored_columns, "dropping non-canonical columns");
    }
    debug!(
        kept = records.len(),
        dropped = dropped_rows,
        "normalized worksheet"
    );

    Ok(Normalized {
        table: SalesTable::new(records),
        dropped_rows,
        ignored_columns,
    })
}

// ── Cell parsing ──────────────────────────────────────────────────────────────

fn parse_month(cell: &Cell) -> Option<Month> {
    match cell {
        Cell::Text(s) => Month::from_label(s),
        _ => None,
    }
}

fn parse_text(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Empty => None,
        Cell::Text(s) if s.trim().is_empty() => None,
        Cell::Text(s) => Some(s.clone()),
        Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
        Cell::Number(n) => Some(n.to_string()),
    }
}

fn parse_int(cell: &Cell) -> Option<i64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(n.trunc() as i64),
        Cell::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|n| n.is_finite()).map(|n| n.trunc() as i64))
        }
        _ => None,
    }
}

fn parse_measure(cell: &Cell, field: Field) -> Result<f64> {
    match cell {
        Cell::Empty => Ok(0.0),
        Cell::Number(n) => Ok(*n),
        Cell::Text(s) if s.trim().is_empty() => Ok(0.0),
        Cell::Text(s) => s
            .trim()
            .replace(',', "")
            .parse::<f64>()
            .map_err(|_| SalesError::ColumnType {
                column: field.canonical_name().to_string(),
                found: format!("text '{s}'"),
            }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
