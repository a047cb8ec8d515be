use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use super::model::{Column, Table, Value};
use crate::error::EdaError;

/// Source columns the derivation reads.
pub const REQUIRED_COLUMNS: [&str; 4] =
    ["created_at", "fx_rate", "mid_market_fx_rate", "user_first_visit"];

/// Columns appended by [`derive`], in order.
pub const DERIVED_COLUMNS: [&str; 8] = [
    "create_at_date",
    "create_at_hour",
    "month",
    "day_of_week",
    "fx_rate_difference",
    "fx_rate_markup",
    "days_since_first_visit",
    "weeks_since_first_visit",
];

/// Leftover row-index column from a previous `to_csv` with the index on.
pub const INDEX_ARTIFACT: &str = "Unnamed: 0";

const MS_PER_DAY: i64 = 86_400_000;

/// Text layouts accepted for timestamp cells, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// What to do with rows whose mid-market rate is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MarkupPolicy {
    /// Leave `fx_rate_markup` missing for those rows and log a warning.
    #[default]
    Propagate,
    /// Fail the whole derivation.
    Reject,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeriveOptions {
    pub markup_policy: MarkupPolicy,
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Augment a raw transaction table with calendar, FX and first-visit columns.
///
/// The input is left untouched. `created_at` and `user_first_visit` are
/// re-typed to timestamps; `Unnamed: 0` is dropped when present. Every other
/// source column is carried over unchanged.
pub fn derive(raw: &Table, options: DeriveOptions) -> Result<Table, EdaError> {
    for name in REQUIRED_COLUMNS {
        raw.column(name)?;
    }
    if let Some(name) = DERIVED_COLUMNS.iter().find(|n| raw.has_column(n)) {
        return Err(EdaError::ColumnCollision {
            column: name.to_string(),
        });
    }

    let mut table = raw.clone();
    if table.drop_column(INDEX_ARTIFACT).is_some() {
        log::debug!("Dropped '{INDEX_ARTIFACT}' index artifact");
    }

    let created = parse_timestamps(table.column("created_at")?)?;
    let first_visit = parse_timestamps(table.column("user_first_visit")?)?;
    let fx = table.column("fx_rate")?.numeric()?;
    let mid = table.column("mid_market_fx_rate")?.numeric()?;

    table.column_mut("created_at")?.values = map_stamps(&created, |t| Value::DateTime(*t));
    table.column_mut("user_first_visit")?.values = map_stamps(&first_visit, |t| Value::DateTime(*t));

    table.push_column(Column::new(
        "create_at_date",
        map_stamps(&created, |t| Value::Date(t.date())),
    ))?;
    table.push_column(Column::new(
        "create_at_hour",
        map_stamps(&created, |t| Value::Integer(t.hour() as i64)),
    ))?;
    table.push_column(Column::new(
        "month",
        map_stamps(&created, |t| Value::Integer(t.month() as i64)),
    ))?;
    table.push_column(Column::new(
        "day_of_week",
        map_stamps(&created, |t| Value::Integer(t.weekday().num_days_from_monday() as i64)),
    ))?;

    let (difference, markup) = fx_columns(&fx, &mid, options.markup_policy)?;
    table.push_column(Column::new("fx_rate_difference", difference))?;
    table.push_column(Column::new("fx_rate_markup", markup))?;

    let days: Vec<Option<i64>> = created
        .iter()
        .zip(&first_visit)
        .map(|(c, f)| match (c, f) {
            (Some(c), Some(f)) => Some(days_between(f, c)),
            _ => None,
        })
        .collect();
    table.push_column(Column::new(
        "days_since_first_visit",
        days.iter().map(|d| d.map(Value::Integer).unwrap_or(Value::Null)).collect(),
    ))?;
    table.push_column(Column::new(
        "weeks_since_first_visit",
        days.iter()
            .map(|d| d.map(|d| Value::Integer(d.div_euclid(7))).unwrap_or(Value::Null))
            .collect(),
    ))?;

    log::info!(
        "Derived {} columns for {} rows",
        DERIVED_COLUMNS.len(),
        table.len()
    );
    Ok(table)
}

/// Whole days elapsed from `from` to `to`, floored (negative spans stay negative).
pub fn days_between(from: &NaiveDateTime, to: &NaiveDateTime) -> i64 {
    (*to - *from).num_milliseconds().div_euclid(MS_PER_DAY)
}

fn fx_columns(
    fx: &[Option<f64>],
    mid: &[Option<f64>],
    policy: MarkupPolicy,
) -> Result<(Vec<Value>, Vec<Value>), EdaError> {
    let mut zero_rows = 0;
    let mut difference = Vec::with_capacity(fx.len());
    let mut markup = Vec::with_capacity(fx.len());

    for (fx, mid) in fx.iter().zip(mid) {
        match (fx, mid) {
            (Some(fx), Some(mid)) => {
                difference.push(Value::from_f64(fx - mid));
                if *mid == 0.0 {
                    zero_rows += 1;
                    markup.push(Value::Null);
                } else {
                    markup.push(Value::from_f64((fx - mid) / mid * 100.0));
                }
            }
            _ => {
                difference.push(Value::Null);
                markup.push(Value::Null);
            }
        }
    }

    if zero_rows > 0 {
        match policy {
            MarkupPolicy::Reject => return Err(EdaError::ZeroMidMarketRate { rows: zero_rows }),
            MarkupPolicy::Propagate => log::warn!(
                "{zero_rows} row(s) have mid_market_fx_rate == 0; fx_rate_markup left missing"
            ),
        }
    }
    Ok((difference, markup))
}

// -- Timestamp helpers --

fn parse_timestamps(column: &Column) -> Result<Vec<Option<NaiveDateTime>>, EdaError> {
    column
        .values
        .iter()
        .enumerate()
        .map(|(row, value)| match value {
            Value::Null => Ok(None),
            Value::DateTime(t) => Ok(Some(*t)),
            Value::Date(d) => Ok(Some(d.and_time(NaiveTime::MIN))),
            Value::Text(s) => parse_timestamp(s).map(Some).ok_or_else(|| EdaError::BadTimestamp {
                row,
                column: column.name.clone(),
                value: s.clone(),
            }),
            other => Err(EdaError::column_type(&column.name, "timestamp", other.type_name())),
        })
        .collect()
}

/// Parse an ISO-style timestamp. Offsets are converted to UTC and dropped;
/// a bare date means midnight.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(text, format) {
            return Some(t);
        }
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Some(t.naive_utc());
    }
    if let Ok(t) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(t.naive_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

fn map_stamps(stamps: &[Option<NaiveDateTime>], f: impl Fn(&NaiveDateTime) -> Value) -> Vec<Value> {
    stamps
        .iter()
        .map(|t| t.as_ref().map(&f).unwrap_or(Value::Null))
        .collect()
}
