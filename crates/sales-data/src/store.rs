//! Canonical Parquet file I/O.
//!
//! The file carries every canonical column plus the derived `MonthKey`,
//! `MonthNum` and `MonthLabel` columns. Writes replace the file wholesale via a
//! sibling temp file and a rename; reads re-check the derived month columns
//! against `Month` and reject any disagreement.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use sales_core::error::{Result, SalesError};
use sales_core::models::{Month, SalesRecord, SalesTable};
use tracing::debug;

pub const COL_DAY: &str = "Day";
pub const COL_MONTH: &str = "Month";
pub const COL_YEAR: &str = "Year";
pub const COL_CHANNEL: &str = "Channel";
pub const COL_DISTRIBUTION_CHANNEL: &str = "Distribution Channel";
pub const COL_SUB_CHANNEL: &str = "Sub-Channel";
pub const COL_CUSTOMER_NAME: &str = "Customer Name";
pub const COL_CUSTOMER_GROUP: &str = "Customer Group";
pub const COL_STATE_NAME: &str = "State Name";
pub const COL_REGION_NAME: &str = "Region Name";
pub const COL_ITEM_NAME: &str = "Item Name";
pub const COL_QTY_SOLD: &str = "Qty Sold";
pub const COL_AMOUNT: &str = "Amount excluding tax";
pub const COL_L1_CATEGORY: &str = "L1 Category";
pub const COL_L0_CATEGORY: &str = "L0 Category";
pub const COL_MONTH_KEY: &str = "MonthKey";
pub const COL_MONTH_NUM: &str = "MonthNum";
pub const COL_MONTH_LABEL: &str = "MonthLabel";

/// Arrow schema of the canonical file, in column order.
pub fn canonical_schema() -> SchemaRef {
    let text = |name: &str| Field::new(name, DataType::Utf8, true);
    Arc::new(Schema::new(vec![
        Field::new(COL_DAY, DataType::Int64, true),
        Field::new(COL_MONTH, DataType::Utf8, false),
        Field::new(COL_YEAR, DataType::Int64, true),
        text(COL_CHANNEL),
        text(COL_DISTRIBUTION_CHANNEL),
        text(COL_SUB_CHANNEL),
        text(COL_CUSTOMER_NAME),
        text(COL_CUSTOMER_GROUP),
        text(COL_STATE_NAME),
        text(COL_REGION_NAME),
        text(COL_ITEM_NAME),
        Field::new(COL_QTY_SOLD, DataType::Float64, false),
        Field::new(COL_AMOUNT, DataType::Float64, false),
        text(COL_L1_CATEGORY),
        text(COL_L0_CATEGORY),
        Field::new(COL_MONTH_KEY, DataType::Utf8, false),
        Field::new(COL_MONTH_NUM, DataType::Int64, false),
        Field::new(COL_MONTH_LABEL, DataType::Utf8, false),
    ]))
}

// ── Write ─────────────────────────────────────────────────────────────────────

/// Convert `table` into a single record batch with the canonical schema.
pub fn to_record_batch(table: &SalesTable) -> Result<RecordBatch> {
    let rows = table.records();

    let text = |get: fn(&SalesRecord) -> &Option<String>| -> ArrayRef {
        Arc::new(StringArray::from(
            rows.iter().map(|r| get(r).as_deref()).collect::<Vec<_>>(),
        ))
    };

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(rows.iter().map(|r| r.day).collect::<Vec<_>>())),
        Arc::new(StringArray::from(
            rows.iter().map(|r| r.month.label()).collect::<Vec<_>>(),
        )),
        Arc::new(Int64Array::from(rows.iter().map(|r| r.year).collect::<Vec<_>>())),
        text(|r| &r.channel),
        text(|r| &r.distribution_channel),
        text(|r| &r.sub_channel),
        text(|r| &r.customer_name),
        text(|r| &r.customer_group),
        text(|r| &r.state_name),
        text(|r| &r.region_name),
        text(|r| &r.item_name),
        Arc::new(Float64Array::from(
            rows.iter().map(|r| r.qty_sold).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            rows.iter().map(|r| r.amount).collect::<Vec<_>>(),
        )),
        text(|r| &r.l1_category),
        text(|r| &r.l0_category),
        Arc::new(StringArray::from(
            rows.iter().map(|r| r.month.key()).collect::<Vec<_>>(),
        )),
        Arc::new(Int64Array::from(
            rows.iter().map(|r| r.month.num()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            rows.iter().map(|r| r.month.label()).collect::<Vec<_>>(),
        )),
    ];

    Ok(RecordBatch::try_new(canonical_schema(), columns)?)
}

/// Persist `table` to `path`, replacing any existing file.
///
/// Output is deterministic: identical tables produce byte-identical files.
pub fn write_parquet(table: &SalesTable, path: &Path) -> Result<()> {
    let batch = to_record_batch(table)?;
    let tmp = temp_path(path);

    let file = File::create(&tmp).map_err(|source| SalesError::FileAccess {
        path: tmp.clone(),
        source,
    })?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    std::fs::rename(&tmp, path).map_err(|source| SalesError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), rows = table.len(), "wrote canonical parquet");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "sales.parquet".into());
    name.push(".tmp");
    path.with_file_name(name)
}

// ── Read ──────────────────────────────────────────────────────────────────────

/// Load the canonical table from `path`.
///
/// Numeric columns stored as other integer/float widths and text stored as
/// large or dictionary-encoded strings are accepted.
pub fn read_parquet(path: &Path) -> Result<SalesTable> {
    let file = File::open(path).map_err(|source| SalesError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let schema = builder.schema().clone();
    let missing: Vec<String> = canonical_schema()
        .fields()
        .iter()
        .filter(|f| schema.field_with_name(f.name()).is_err())
        .map(|f| f.name().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SalesError::MissingColumns(missing));
    }

    let mut records = Vec::new();
    for batch in builder.build()? {
        decode_batch(&batch?, &mut records)?;
    }

    debug!(path = %path.display(), rows = records.len(), "loaded canonical parquet");
    Ok(SalesTable::new(records))
}

fn decode_batch(batch: &RecordBatch, out: &mut Vec<SalesRecord>) -> Result<()> {
    let day = int_column(batch, COL_DAY)?;
    let month = string_column(batch, COL_MONTH)?;
    let year = int_column(batch, COL_YEAR)?;
    let channel = string_column(batch, COL_CHANNEL)?;
    let distribution_channel = string_column(batch, COL_DISTRIBUTION_CHANNEL)?;
    let sub_channel = string_column(batch, COL_SUB_CHANNEL)?;
    let customer_name = string_column(batch, COL_CUSTOMER_NAME)?;
    let customer_group = string_column(batch, COL_CUSTOMER_GROUP)?;
    let state_name = string_column(batch, COL_STATE_NAME)?;
    let region_name = string_column(batch, COL_REGION_NAME)?;
    let item_name = string_column(batch, COL_ITEM_NAME)?;
    let qty_sold = float_column(batch, COL_QTY_SOLD)?;
    let amount = float_column(batch, COL_AMOUNT)?;
    let l1_category = string_column(batch, COL_L1_CATEGORY)?;
    let l0_category = string_column(batch, COL_L0_CATEGORY)?;
    let month_key = string_column(batch, COL_MONTH_KEY)?;
    let month_num = int_column(batch, COL_MONTH_NUM)?;
    let month_label = string_column(batch, COL_MONTH_LABEL)?;

    out.reserve(batch.num_rows());
    for i in 0..batch.num_rows() {
        let label = opt_str(&month, i).unwrap_or_default();
        let key = opt_str(&month_key, i).unwrap_or_default();
        let num = opt_int(&month_num, i).unwrap_or_default();
        let parsed = Month::verify(&label, &key, num)?;
        if opt_str(&month_label, i).as_deref() != Some(parsed.label()) {
            return Err(SalesError::MonthLookup(format!(
                "row {i}: MonthLabel disagrees with Month '{label}'"
            )));
        }

        out.push(SalesRecord {
            day: opt_int(&day, i),
            month: parsed,
            year: opt_int(&year, i),
            channel: opt_str(&channel, i),
            distribution_channel: opt_str(&distribution_channel, i),
            sub_channel: opt_str(&sub_channel, i),
            customer_name: opt_str(&customer_name, i),
            customer_group: opt_str(&customer_group, i),
            state_name: opt_str(&state_name, i),
            region_name: opt_str(&region_name, i),
            item_name: opt_str(&item_name, i),
            qty_sold: opt_float(&qty_sold, i),
            amount: opt_float(&amount, i),
            l1_category: opt_str(&l1_category, i),
            l0_category: opt_str(&l0_category, i),
        });
    }
    Ok(())
}

// ── Column helpers ────────────────────────────────────────────────────────────

fn cast_column(batch: &RecordBatch, name: &str, to: &DataType) -> Result<ArrayRef> {
    let array = batch
        .column_by_name(name)
        .ok_or_else(|| SalesError::MissingColumns(vec![name.to_string()]))?;
    cast(array, to).map_err(|_| SalesError::ColumnType {
        column: name.to_string(),
        found: array.data_type().to_string(),
    })
}

fn string_column(batch: &RecordBatch, name: &str) -> Result<StringArray> {
    let array = cast_column(batch, name, &DataType::Utf8)?;
    array
        .as_any()
        .downcast_ref::<StringArray>()
        .cloned()
        .ok_or_else(|| column_type(name, &array))
}

fn int_column(batch: &RecordBatch, name: &str) -> Result<Int64Array> {
    let array = cast_column(batch, name, &DataType::Int64)?;
    array
        .as_any()
        .downcast_ref::<Int64Array>()
        .cloned()
        .ok_or_else(|| column_type(name, &array))
}

fn float_column(batch: &RecordBatch, name: &str) -> Result<Float64Array> {
    let array = cast_column(batch, name, &DataType::Float64)?;
    array
        .as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .ok_or_else(|| column_type(name, &array))
}

fn column_type(name: &str, array: &ArrayRef) -> SalesError {
    SalesError::ColumnType {
        column: name.to_string(),
        found: array.data_type().to_string(),
    }
}

fn opt_str(array: &StringArray, i: usize) -> Option<String> {
    (!array.is_null(i)).then(|| array.value(i).to_string())
}

fn opt_int(array: &Int64Array, i: usize) -> Option<i64> {
    (!array.is_null(i)).then(|| array.value(i))
}

fn opt_float(array: &Float64Array, i: usize) -> f64 {
    if array.is_null(i) {
        0.0
    } else {
        array.value(i)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(month: Month, state: Option<&str>, amount: f64) -> SalesRecord {
        SalesRecord {
            day: Some(12),
            month,
            year: Some(2024),
            channel: Some("Retail".to_string()),
            distribution_channel: Some("Distributor".to_string()),
            sub_channel: Some("GT".to_string()),
            customer_name: Some("Acme".to_string()),
            customer_group: None,
            state_name: state.map(str::to_string),
            region_name: Some("South".to_string()),
            item_name: Some("Masala Chips".to_string()),
            qty_sold: 4.0,
            amount,
            l1_category: Some("Chips".to_string()),
            l0_category: Some("Snacks".to_string()),
        }
    }

    fn sample_table() -> SalesTable {
        SalesTable::new(vec![
            record(Month::Apr, Some("Kerala"), 1200.0),
            record(Month::Jul, None, -40.0),
            record(Month::Oct, Some("Goa"), 310.5),
        ])
    }

    /// Write a single batch with an arbitrary schema.
    fn write_batch(path: &Path, batch: &RecordBatch) {
        let file = File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn test_write_then_read_preserves_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("primary_sales.parquet");
        let table = sample_table();

        write_parquet(&table, &path).unwrap();
        let loaded = read_parquet(&path).unwrap();

        assert_eq!(loaded, table);
    }

    #[test]
    fn test_write_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("a.parquet");
        let second = dir.path().join("b.parquet");

        write_parquet(&sample_table(), &first).unwrap();
        write_parquet(&sample_table(), &second).unwrap();

        assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
    }

    #[test]
    fn test_write_replaces_existing_and_leaves_no_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("primary_sales.parquet");
        std::fs::write(&path, b"stale").unwrap();

        write_parquet(&sample_table(), &path).unwrap();

        assert_eq!(read_parquet(&path).unwrap().len(), 3);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_empty_table_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.parquet");
        write_parquet(&SalesTable::default(), &path).unwrap();
        assert!(read_parquet(&path).unwrap().is_empty());
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_parquet(&dir.path().join("absent.parquet")).unwrap_err();
        assert!(matches!(err, SalesError::FileAccess { .. }));
    }

    #[test]
    fn test_read_rejects_inconsistent_month_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.parquet");

        let batch = to_record_batch(&SalesTable::new(vec![record(Month::May, None, 1.0)])).unwrap();
        let idx = batch.schema().index_of(COL_MONTH_NUM).unwrap();
        let mut columns = batch.columns().to_vec();
        columns[idx] = Arc::new(Int64Array::from(vec![9_i64]));
        let tampered = RecordBatch::try_new(batch.schema(), columns).unwrap();
        write_batch(&path, &tampered);

        let err = read_parquet(&path).unwrap_err();
        assert!(matches!(err, SalesError::MonthLookup(_)));
    }

    #[test]
    fn test_read_reports_missing_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.parquet");
        let schema = Arc::new(Schema::new(vec![Field::new(COL_MONTH, DataType::Utf8, false)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(StringArray::from(vec!["Apr"])) as ArrayRef],
        )
        .unwrap();
        write_batch(&path, &batch);

        match read_parquet(&path) {
            Err(SalesError::MissingColumns(cols)) => {
                assert!(cols.contains(&COL_AMOUNT.to_string()));
                assert!(!cols.contains(&COL_MONTH.to_string()));
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_read_accepts_integer_measures() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ints.parquet");

        let batch = to_record_batch(&SalesTable::new(vec![record(Month::Jun, None, 250.0)])).unwrap();
        let idx = batch.schema().index_of(COL_AMOUNT).unwrap();
        let mut fields: Vec<Field> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.as_ref().clone())
            .collect();
        fields[idx] = Field::new(COL_AMOUNT, DataType::Int64, false);
        let mut columns = batch.columns().to_vec();
        columns[idx] = Arc::new(Int64Array::from(vec![250_i64]));
        let widened = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).unwrap();
        write_batch(&path, &widened);

        let loaded = read_parquet(&path).unwrap();
        assert!((loaded.records()[0].amount - 250.0).abs() < 1e-9);
    }
}
