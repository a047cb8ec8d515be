use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{
    ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray,
    TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use parquet::arrow::ArrowWriter;
use serde_json::{Map, Number, Value as JsonValue};

use super::loader::Format;
use super::model::{Column, DType, EPOCH_DAYS_FROM_CE, Table, Value};

/// Write a table in the format implied by the path's extension.
///
/// No synthetic row-index column is written.
pub fn write_file(table: &Table, path: &Path) -> Result<()> {
    let format = Format::from_path(path)?;
    match format {
        Format::Csv | Format::Tsv => write_delimited(table, path, format.delimiter()),
        Format::Json => write_json(table, path),
        Format::Parquet => write_parquet(table, path),
    }
    .with_context(|| format!("writing {}", path.display()))?;

    log::info!(
        "Wrote {} rows x {} columns to {}",
        table.len(),
        table.width(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV / TSV
// ---------------------------------------------------------------------------

fn write_delimited(table: &Table, path: &Path, delimiter: u8) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .context("creating delimited file")?;
    write_records(table, &mut writer)?;
    writer.flush().context("flushing delimited file")?;
    Ok(())
}

fn write_records<W: std::io::Write>(
    table: &Table,
    writer: &mut csv::Writer<W>,
) -> Result<()> {
    writer
        .write_record(table.column_names())
        .context("writing header")?;
    for row in 0..table.len() {
        let record = table.columns().iter().map(|c| c.values[row].to_string());
        writer
            .write_record(record)
            .with_context(|| format!("writing row {row}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON (records-oriented)
// ---------------------------------------------------------------------------

fn write_json(table: &Table, path: &Path) -> Result<()> {
    let records: Vec<JsonValue> = (0..table.len())
        .map(|row| {
            let obj: Map<String, JsonValue> = table
                .columns()
                .iter()
                .map(|c| (c.name.clone(), value_to_json(&c.values[row])))
                .collect();
            JsonValue::Object(obj)
        })
        .collect();

    let file = std::fs::File::create(path).context("creating JSON file")?;
    serde_json::to_writer(std::io::BufWriter::new(file), &records).context("encoding JSON")?;
    Ok(())
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Integer(i) => JsonValue::Number((*i).into()),
        // Infinite floats have no JSON spelling.
        Value::Float(f) => Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::DateTime(_) | Value::Date(_) => JsonValue::String(value.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

fn write_parquet(table: &Table, path: &Path) -> Result<()> {
    let (fields, arrays): (Vec<Field>, Vec<ArrayRef>) =
        table.columns().iter().map(column_to_arrow).unzip();

    let schema = Arc::new(Schema::new(fields));
    let batch =
        RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

/// Choose an Arrow type for a column and convert its cells.
fn column_to_arrow(column: &Column) -> (Field, ArrayRef) {
    let values = &column.values;
    let present_all = |kind: fn(&Value) -> bool| {
        values.iter().all(|v| v.is_null() || kind(v)) && values.iter().any(|v| !v.is_null())
    };
    let all_dates = present_all(|v| matches!(v, Value::Date(_)));
    let dtype = match column.dtype() {
        // A bool column with holes infers as object; keep it boolean on disk.
        DType::Object if present_all(|v| matches!(v, Value::Bool(_))) => DType::Bool,
        dtype => dtype,
    };

    let (data_type, array): (DataType, ArrayRef) = match dtype {
        DType::Int64 => (
            DataType::Int64,
            Arc::new(Int64Array::from_iter(values.iter().map(|v| match v {
                Value::Integer(i) => Some(*i),
                _ => None,
            }))),
        ),
        DType::Float64 => (
            DataType::Float64,
            Arc::new(Float64Array::from_iter(values.iter().map(Value::as_f64))),
        ),
        DType::Bool => (
            DataType::Boolean,
            Arc::new(BooleanArray::from_iter(values.iter().map(|v| match v {
                Value::Bool(b) => Some(*b),
                _ => None,
            }))),
        ),
        DType::DateTime => (
            DataType::Timestamp(TimeUnit::Microsecond, None),
            Arc::new(TimestampMicrosecondArray::from_iter(values.iter().map(
                |v| match v {
                    Value::DateTime(t) => Some(t.and_utc().timestamp_micros()),
                    _ => None,
                },
            ))),
        ),
        DType::Object if all_dates => (
            DataType::Date32,
            Arc::new(Date32Array::from_iter(values.iter().map(|v| match v {
                Value::Date(d) => Some(days_since_epoch(*d)),
                _ => None,
            }))),
        ),
        DType::Object => (
            DataType::Utf8,
            Arc::new(StringArray::from_iter(values.iter().map(|v| {
                if v.is_null() {
                    None
                } else {
                    Some(v.to_string())
                }
            }))),
        ),
    };

    (Field::new(column.name.clone(), data_type, true), array)
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

