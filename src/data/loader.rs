use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType, Date32Type, Float32Type, Float64Type, Int32Type, Int64Type, TimeUnit,
    TimestampMicrosecondType,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Column, Table, Value};

/// Cell spellings read as missing, following the Pandas `read_csv` defaults.
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null", "NaT",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// File formats understood by the loader and the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Tsv,
    Json,
    Parquet,
}

impl Format {
    /// Pick the format from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(Format::Csv),
            "tsv" => Ok(Format::Tsv),
            "json" => Ok(Format::Json),
            "parquet" | "pq" => Ok(Format::Parquet),
            other => bail!("Unsupported file extension: .{other}"),
        }
    }

    pub(crate) fn delimiter(self) -> u8 {
        match self {
            Format::Tsv => b'\t',
            _ => b',',
        }
    }
}

/// Load a transaction table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.tsv` – header row, one transaction per line (recommended)
/// * `.json`         – `[{ "user_id": ..., "created_at": ..., ... }, ...]`
/// * `.parquet`      – Arrow-typed columns
pub fn load_file(path: &Path) -> Result<Table> {
    let format = Format::from_path(path)?;
    let table = match format {
        Format::Csv | Format::Tsv => load_delimited(path, format.delimiter()),
        Format::Json => load_json(path),
        Format::Parquet => load_parquet(path),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} rows x {} columns from {}",
        table.len(),
        table.width(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV / TSV loader
// ---------------------------------------------------------------------------

/// Header row with column names, then one record per transaction.
/// Cell types are guessed independently per cell. Short records are padded
/// with nulls; records longer than the header are rejected.
fn load_delimited(path: &Path, delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .context("opening delimited file")?;
    read_delimited(&mut reader)
}

fn read_delimited<R: std::io::Read>(reader: &mut csv::Reader<R>) -> Result<Table> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("row {row_no}"))?;
        if record.len() > headers.len() {
            bail!(
                "row {row_no}: {} fields but the header has {}",
                record.len(),
                headers.len()
            );
        }
        rows.push(record.iter().map(guess_value_type).collect());
    }

    Ok(Table::from_rows(headers, rows)?)
}

/// Guess the type of a single text cell.
pub fn guess_value_type(s: &str) -> Value {
    if NA_VALUES.contains(&s) {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::from_f64(f);
    }
    match s {
        "true" | "True" | "TRUE" => return Value::Bool(true),
        "false" | "False" | "FALSE" => return Value::Bool(false),
        _ => {}
    }
    Value::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "user_id": "u1", "created_at": "2024-01-01 10:00:00", "fx_rate": 1.05 },
///   ...
/// ]
/// ```
///
/// Column order is the order in which keys are first seen; a key missing
/// from a record is a null cell.
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_value).unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    Ok(Table::from_rows(headers, rows)?)
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::from_f64(f)
            } else {
                Value::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of transactions.
///
/// Columns may be strings, 32/64-bit ints and floats, bools, timestamps of
/// any unit, or date32. Works with files written by both **Pandas**
/// (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let mut columns: Vec<Column> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| Column::new(f.name().clone(), Vec::new()))
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (column, array) in columns.iter_mut().zip(batch.columns()) {
            let values = extract_values(array)
                .with_context(|| format!("reading column '{}'", column.name))?;
            column.values.extend(values);
        }
    }

    Ok(Table::new(columns)?)
}

// -- Parquet / Arrow helpers --

/// Convert one Arrow array into cells.
fn extract_values(col: &ArrayRef) -> Result<Vec<Value>> {
    let n = col.len();
    let values = match col.data_type() {
        DataType::Utf8 => {
            let arr = col.as_string::<i32>();
            (0..n)
                .map(|i| cell(col, i, || Value::Text(arr.value(i).to_string())))
                .collect()
        }
        DataType::LargeUtf8 => {
            let arr = col.as_string::<i64>();
            (0..n)
                .map(|i| cell(col, i, || Value::Text(arr.value(i).to_string())))
                .collect()
        }
        DataType::Int32 => {
            let arr = col.as_primitive::<Int32Type>();
            (0..n)
                .map(|i| cell(col, i, || Value::Integer(arr.value(i) as i64)))
                .collect()
        }
        DataType::Int64 => {
            let arr = col.as_primitive::<Int64Type>();
            (0..n)
                .map(|i| cell(col, i, || Value::Integer(arr.value(i))))
                .collect()
        }
        DataType::Float32 => {
            let arr = col.as_primitive::<Float32Type>();
            (0..n)
                .map(|i| cell(col, i, || Value::from_f64(arr.value(i) as f64)))
                .collect()
        }
        DataType::Float64 => {
            let arr = col.as_primitive::<Float64Type>();
            (0..n)
                .map(|i| cell(col, i, || Value::from_f64(arr.value(i))))
                .collect()
        }
        DataType::Boolean => {
            let arr = col.as_boolean();
            (0..n)
                .map(|i| cell(col, i, || Value::Bool(arr.value(i))))
                .collect()
        }
        DataType::Timestamp(_, _) => {
            let micros = cast(col, &DataType::Timestamp(TimeUnit::Microsecond, None))
                .context("normalising timestamp unit")?;
            let arr = micros.as_primitive::<TimestampMicrosecondType>();
            (0..n)
                .map(|i| {
                    cell(col, i, || {
                        arr.value_as_datetime(i)
                            .map(Value::DateTime)
                            .unwrap_or(Value::Null)
                    })
                })
                .collect()
        }
        DataType::Date32 => {
            let arr = col.as_primitive::<Date32Type>();
            (0..n)
                .map(|i| {
                    cell(col, i, || {
                        arr.value_as_date(i).map(Value::Date).unwrap_or(Value::Null)
                    })
                })
                .collect()
        }
        other => bail!("unsupported Arrow type {other:?}"),
    };
    Ok(values)
}

fn cell(col: &ArrayRef, row: usize, present: impl FnOnce() -> Value) -> Value {
    if col.is_null(row) {
        Value::Null
    } else {
        present()
    }
}
