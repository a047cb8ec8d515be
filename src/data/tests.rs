use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use tempfile::tempdir;

use super::derive::{self, DERIVED_COLUMNS, DeriveOptions, INDEX_ARTIFACT, MarkupPolicy};
use super::loader::{guess_value_type, load_file};
use super::model::{Column, DType, Table, Value};
use super::writer::write_file;
use crate::error::{EdaError, ErrorKind};

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn raw_table(created: &[&str], first_visit: &[&str], fx: &[f64], mid: &[f64]) -> Result<Table> {
    Ok(Table::new(vec![
        Column::new("created_at", created.iter().map(|s| text(s)).collect()),
        Column::new("user_first_visit", first_visit.iter().map(|s| text(s)).collect()),
        Column::new("fx_rate", fx.iter().map(|v| Value::Float(*v)).collect()),
        Column::new("mid_market_fx_rate", mid.iter().map(|v| Value::Float(*v)).collect()),
    ])?)
}

fn ints(table: &Table, name: &str) -> Result<Vec<Option<i64>>> {
    Ok(table
        .column(name)?
        .values
        .iter()
        .map(|v| match v {
            Value::Integer(i) => Some(*i),
            _ => None,
        })
        .collect())
}

fn sample_path() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/samples/transactions.csv"))
}

#[test]
fn test_guess_value_type_follows_read_csv_defaults() {
    assert_eq!(guess_value_type(""), Value::Null);
    assert_eq!(guess_value_type("NaN"), Value::Null);
    assert_eq!(guess_value_type("N/A"), Value::Null);
    assert_eq!(guess_value_type("42"), Value::Integer(42));
    assert_eq!(guess_value_type("1.05"), Value::Float(1.05));
    assert_eq!(guess_value_type("True"), Value::Bool(true));
    assert_eq!(guess_value_type("false"), Value::Bool(false));
    assert_eq!(guess_value_type("GBP"), text("GBP"));
    assert_eq!(guess_value_type("2024-01-01 10:00:00"), text("2024-01-01 10:00:00"));
}

#[test]
fn test_dtype_inference() {
    let col = |values| Column::new("c", values);
    assert_eq!(col(vec![Value::Integer(1), Value::Integer(2)]).dtype(), DType::Int64);
    assert_eq!(col(vec![Value::Integer(1), Value::Null]).dtype(), DType::Float64);
    assert_eq!(col(vec![Value::Integer(1), Value::Float(2.5)]).dtype(), DType::Float64);
    assert_eq!(col(vec![Value::Null, Value::Null]).dtype(), DType::Float64);
    assert_eq!(col(vec![Value::Bool(true)]).dtype(), DType::Bool);
    assert_eq!(col(vec![text("a"), Value::Integer(1)]).dtype(), DType::Object);
}

#[test]
fn test_table_rejects_ragged_and_duplicate_columns() {
    let ragged = Table::new(vec![
        Column::new("a", vec![Value::Integer(1)]),
        Column::new("b", vec![Value::Integer(1), Value::Integer(2)]),
    ]);
    assert!(matches!(ragged, Err(EdaError::RaggedColumn { .. })));

    let duplicate = Table::new(vec![
        Column::new("a", vec![Value::Integer(1)]),
        Column::new("a", vec![Value::Integer(2)]),
    ]);
    assert!(matches!(duplicate, Err(EdaError::ColumnCollision { .. })));
}

#[test]
fn test_load_sample_csv() -> Result<()> {
    let table = load_file(sample_path())?;

    assert_eq!(table.len(), 10);
    assert_eq!(table.width(), 15);
    assert!(table.has_column(INDEX_ARTIFACT));
    assert_eq!(table.column("user_language")?.null_count(), 1);
    assert_eq!(table.column("payment_amount")?.dtype(), DType::Float64);
    assert_eq!(table.column("user_birthyear")?.dtype(), DType::Int64);

    Ok(())
}

#[test]
fn test_unsupported_extension_fails() {
    let result = load_file(Path::new("transactions.xlsx"));
    assert!(result.is_err());
}

#[test]
fn test_derive_first_visit_scenario() -> Result<()> {
    let raw = raw_table(
        &["2024-01-01T10:00", "2024-01-02T15:00", "2024-01-01T10:00"],
        &["2023-12-25T00:00"; 3],
        &[1.0; 3],
        &[1.0; 3],
    )?;

    let table = derive::derive(&raw, DeriveOptions::default())?;

    assert_eq!(ints(&table, "days_since_first_visit")?, vec![Some(7), Some(8), Some(7)]);
    assert_eq!(ints(&table, "weeks_since_first_visit")?, vec![Some(1), Some(1), Some(1)]);
    Ok(())
}

#[test]
fn test_derive_fx_scenario() -> Result<()> {
    let raw = raw_table(&["2024-01-01 00:00:00"], &["2024-01-01 00:00:00"], &[1.05], &[1.00])?;

    let table = derive::derive(&raw, DeriveOptions::default())?;

    let difference = table.column("fx_rate_difference")?.values[0].as_f64();
    let markup = table.column("fx_rate_markup")?.values[0].as_f64();
    assert!((difference.unwrap_or(f64::NAN) - 0.05).abs() < 1e-9);
    assert!((markup.unwrap_or(f64::NAN) - 5.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_derive_calendar_columns() -> Result<()> {
    // 2024-03-09 is a Saturday.
    let raw = raw_table(&["2024-03-09 07:05:00"], &["2024-03-01"], &[1.0], &[1.0])?;

    let table = derive::derive(&raw, DeriveOptions::default())?;

    assert_eq!(
        table.column("create_at_date")?.values[0],
        Value::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())
    );
    assert_eq!(ints(&table, "create_at_hour")?, vec![Some(7)]);
    assert_eq!(ints(&table, "month")?, vec![Some(3)]);
    assert_eq!(ints(&table, "day_of_week")?, vec![Some(5)]);
    assert_eq!(table.column("created_at")?.dtype(), DType::DateTime);
    assert_eq!(table.column("user_first_visit")?.dtype(), DType::DateTime);
    Ok(())
}

#[test]
fn test_negative_spans_use_floor_division() -> Result<()> {
    let raw = raw_table(
        &["2024-03-09 07:00:00", "2024-03-01 00:00:00"],
        &["2024-03-09 08:00:00", "2024-03-09 00:00:00"],
        &[1.0; 2],
        &[1.0; 2],
    )?;

    let table = derive::derive(&raw, DeriveOptions::default())?;

    assert_eq!(ints(&table, "days_since_first_visit")?, vec![Some(-1), Some(-8)]);
    assert_eq!(ints(&table, "weeks_since_first_visit")?, vec![Some(-1), Some(-2)]);
    Ok(())
}

#[test]
fn test_derive_keeps_rows_and_source_columns() -> Result<()> {
    let raw = load_file(sample_path())?;

    let table = derive::derive(&raw, DeriveOptions::default())?;

    assert_eq!(table.len(), raw.len());
    assert!(!table.has_column(INDEX_ARTIFACT));
    assert_eq!(table.width(), raw.width() - 1 + DERIVED_COLUMNS.len());
    assert_eq!(table.column("payment_amount")?, raw.column("payment_amount")?);
    assert_eq!(table.column("user_language")?, raw.column("user_language")?);
    // The input is not modified.
    assert!(raw.has_column(INDEX_ARTIFACT));
    assert!(!raw.has_column("month"));
    Ok(())
}

#[test]
fn test_missing_index_artifact_is_not_an_error() -> Result<()> {
    let raw = raw_table(&["2024-01-01"], &["2024-01-01"], &[1.0], &[1.0])?;
    assert!(derive::derive(&raw, DeriveOptions::default()).is_ok());
    Ok(())
}

#[test]
fn test_zero_mid_market_rate_policies() -> Result<()> {
    let raw = raw_table(&["2024-01-01"; 2], &["2024-01-01"; 2], &[1.0, 1.1], &[0.0, 1.0])?;

    let table = derive::derive(&raw, DeriveOptions::default())?;
    let markup = &table.column("fx_rate_markup")?.values;
    assert_eq!(markup[0], Value::Null);
    assert!(markup[1].as_f64().is_some());
    assert_eq!(table.column("fx_rate_difference")?.values[0], Value::Float(1.0));

    let strict = DeriveOptions {
        markup_policy: MarkupPolicy::Reject,
    };
    let err = derive::derive(&raw, strict).err();
    assert!(matches!(err, Some(EdaError::ZeroMidMarketRate { rows: 1 })));
    assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::DivisionAnomaly));
    assert_eq!(ErrorKind::DivisionAnomaly.to_string(), "division anomaly");
    Ok(())
}

#[test]
fn test_missing_required_column_is_schema_error() -> Result<()> {
    let mut raw = raw_table(&["2024-01-01"], &["2024-01-01"], &[1.0], &[1.0])?;
    raw.drop_column("mid_market_fx_rate");

    let err = derive::derive(&raw, DeriveOptions::default()).err();

    assert!(matches!(&err, Some(EdaError::MissingColumn { column }) if column == "mid_market_fx_rate"));
    assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Schema));
    Ok(())
}

#[test]
fn test_rederiving_fails_fast() -> Result<()> {
    let raw = raw_table(&["2024-01-01"], &["2024-01-01"], &[1.0], &[1.0])?;
    let derived = derive::derive(&raw, DeriveOptions::default())?;

    let err = derive::derive(&derived, DeriveOptions::default()).err();

    assert!(matches!(err, Some(EdaError::ColumnCollision { .. })));
    Ok(())
}

#[test]
fn test_bad_timestamp_is_data_error() -> Result<()> {
    let raw = raw_table(&["2024-01-01", "yesterday"], &["2024-01-01"; 2], &[1.0; 2], &[1.0; 2])?;

    let err = derive::derive(&raw, DeriveOptions::default()).err();

    assert!(matches!(&err, Some(EdaError::BadTimestamp { row: 1, .. })));
    assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Data));
    Ok(())
}

#[test]
fn test_numeric_timestamp_column_is_schema_error() -> Result<()> {
    let mut raw = raw_table(&["2024-01-01"], &["2024-01-01"], &[1.0], &[1.0])?;
    raw.column_mut("created_at")?.values = vec![Value::Integer(1_704_067_200)];

    let err = derive::derive(&raw, DeriveOptions::default()).err();

    assert!(matches!(err, Some(EdaError::ColumnType { .. })));
    Ok(())
}

#[test]
fn test_null_timestamps_propagate() -> Result<()> {
    let mut raw = raw_table(&["2024-01-01", "2024-01-02"], &["2024-01-01"; 2], &[1.0; 2], &[1.0; 2])?;
    raw.column_mut("created_at")?.values[1] = Value::Null;

    let table = derive::derive(&raw, DeriveOptions::default())?;

    for name in ["create_at_date", "month", "days_since_first_visit", "weeks_since_first_visit"] {
        assert_eq!(table.column(name)?.values[1], Value::Null, "{name}");
    }
    Ok(())
}

#[test]
fn test_parse_timestamp_layouts() {
    let expected = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(10, 0, 0));
    for text in [
        "2024-01-01 10:00:00",
        "2024-01-01T10:00:00",
        "2024-01-01 10:00",
        "2024-01-01T10:00:00+00:00",
        "2024-01-01T12:00:00+02:00",
        "2024-01-01 10:00:00.000",
    ] {
        assert_eq!(derive::parse_timestamp(text), expected, "{text}");
    }
    assert_eq!(derive::parse_timestamp("not a date"), None);
}

fn assert_round_trip(extension: &str) -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join(format!("updated_data.{extension}"));
    let derived = derive::derive(&load_file(sample_path())?, DeriveOptions::default())?;

    write_file(&derived, &path)?;
    let reloaded = load_file(&path)?;

    assert_eq!(reloaded.column_names(), derived.column_names());
    assert_eq!(reloaded.len(), derived.len());
    for name in DERIVED_COLUMNS {
        let before = &derived.column(name)?.values;
        let after = &reloaded.column(name)?.values;
        for (b, a) in before.iter().zip(after) {
            match (b.as_f64(), a.as_f64()) {
                (Some(b), Some(a)) => assert!((b - a).abs() < 1e-9, "{extension}: {name}"),
                _ => assert_eq!(b.to_string(), a.to_string(), "{extension}: {name}"),
            }
        }
    }
    Ok(())
}

#[test]
fn test_csv_round_trip() -> Result<()> {
    assert_round_trip("csv")
}

#[test]
fn test_tsv_round_trip() -> Result<()> {
    assert_round_trip("tsv")
}

#[test]
fn test_json_round_trip() -> Result<()> {
    assert_round_trip("json")
}

#[test]
fn test_parquet_round_trip() -> Result<()> {
    assert_round_trip("parquet")
}

#[test]
fn test_csv_output_has_no_index_column() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("out.csv");
    let derived = derive::derive(&load_file(sample_path())?, DeriveOptions::default())?;

    write_file(&derived, &path)?;

    let written = std::fs::read_to_string(&path)?;
    let header = written.lines().next().unwrap_or_default();
    assert!(header.starts_with("user_id,created_at,"));
    assert!(!header.contains("Unnamed"));
    assert!(written.contains("2024-01-01 10:00:00"));
    Ok(())
}

#[test]
fn test_short_csv_rows_are_padded_with_nulls() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("short.csv");
    std::fs::write(&path, "a,b,c\n1,2,3\n4,5\n")?;

    let table = load_file(&path)?;

    assert_eq!(table.len(), 2);
    assert_eq!(table.column("b")?.values, vec![Value::Integer(2), Value::Integer(5)]);
    assert_eq!(table.column("c")?.values, vec![Value::Integer(3), Value::Null]);
    Ok(())
}

#[test]
fn test_long_csv_rows_are_rejected() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("long.csv");
    std::fs::write(&path, "a,b\n1,2\n3,4,5\n")?;

    let err = load_file(&path).err().map(|e| format!("{e:#}"));

    assert!(err.is_some_and(|msg| msg.contains("3 fields but the header has 2")));
    Ok(())
}

#[test]
fn test_nullable_bool_column_survives_parquet() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("flags.parquet");
    let table = Table::new(vec![Column::new(
        "is_first_order",
        vec![Value::Bool(true), Value::Null, Value::Bool(false)],
    )])?;
    assert_eq!(table.column("is_first_order")?.dtype(), DType::Object);

    write_file(&table, &path)?;
    let reloaded = load_file(&path)?;

    assert_eq!(
        reloaded.column("is_first_order")?.values,
        vec![Value::Bool(true), Value::Null, Value::Bool(false)]
    );
    Ok(())
}

#[test]
fn test_negative_zero_is_one_key() {
    assert_eq!(Value::from_f64(-0.0).to_string(), "0.0");
    assert_eq!(guess_value_type("-0.0").to_string(), "0.0");
    assert_eq!(Value::Float(-0.0).cmp(&Value::Float(0.0)), std::cmp::Ordering::Equal);
}
