use std::collections::BTreeMap;

use crate::data::model::{Table, Value};
use crate::error::EdaError;
use crate::stats::distribution::{Bins, BoxStats, Histogram};
use crate::stats::{self, Describe, PERCENTILES};

use super::output::{ChartKind, ChartSpec, StatTable, ViewOutput, XAxis, date_to_x};

/// Rows kept for the per-currency payment box plot.
const TOP_PAYMENTS: usize = 1_000;
const TOP_CATEGORIES: usize = 10;
const TOP_CURRENCY_PAIRS: usize = 20;
const FIXED_BINS: Bins = Bins::Count(50);

type ViewResult = Result<ViewOutput, EdaError>;

// -- Column helpers --

fn values<'a>(table: &'a Table, name: &str) -> Result<&'a [Value], EdaError> {
    Ok(&table.column(name)?.values)
}

fn numeric(table: &Table, name: &str) -> Result<Vec<Option<f64>>, EdaError> {
    table.column(name)?.numeric()
}

fn present(table: &Table, name: &str) -> Result<Vec<f64>, EdaError> {
    table.column(name)?.present_f64()
}

fn histogram_of(table: &Table, name: &str, bins: Bins) -> Result<Histogram, EdaError> {
    Ok(Histogram::compute(&present(table, name)?, bins))
}

fn bars(counts: &[(Value, usize)]) -> Vec<(String, f64)> {
    counts
        .iter()
        .map(|(k, c)| (k.to_string(), *c as f64))
        .collect()
}

fn top(counts: Vec<(Value, usize)>, n: usize) -> Vec<(Value, usize)> {
    counts.into_iter().take(n).collect()
}

/// Numeric x coordinate of a group key.
fn key_to_x(column: &str, key: &Value) -> Result<f64, EdaError> {
    key.as_f64()
        .ok_or_else(|| EdaError::column_type(column, "numeric", key.type_name()))
}

// ---------------------------------------------------------------------------
// Basic Stats
// ---------------------------------------------------------------------------

pub fn basic_stats(table: &Table) -> ViewResult {
    let mut out = ViewOutput::default();

    let mut shape = StatTable::new("Dataframe shape", &["dimension", "size"]);
    shape.push_row(vec![Value::Text("rows".into()), Value::Integer(table.len() as i64)]);
    shape.push_row(vec![Value::Text("columns".into()), Value::Integer(table.width() as i64)]);
    out.table(shape);

    let mut info = StatTable::new("Dataframe info", &["column", "non-null count", "dtype"]);
    let mut missing = StatTable::new("Missing values", &["column", "missing"]);
    for column in table.columns() {
        let nulls = column.null_count();
        info.push_row(vec![
            Value::Text(column.name.clone()),
            Value::Integer((table.len() - nulls) as i64),
            Value::Text(column.dtype().to_string()),
        ]);
        missing.push_row(vec![Value::Text(column.name.clone()), Value::Integer(nulls as i64)]);
    }
    out.table(info).table(missing);

    let numeric_cols: Vec<_> = table
        .columns()
        .iter()
        .filter(|c| c.dtype().is_numeric())
        .collect();

    if numeric_cols.is_empty() {
        // Without numeric columns the summary falls back to categorical stats.
        let mut summary = StatTable::new("Basic statistics", &["column", "count", "unique", "top", "freq"]);
        for column in table.columns() {
            let counts = stats::value_counts(&column.values);
            let count: usize = counts.iter().map(|(_, c)| c).sum();
            let (top, freq) = counts
                .first()
                .map(|(v, c)| (v.clone(), Value::Integer(*c as i64)))
                .unwrap_or((Value::Null, Value::Null));
            summary.push_row(vec![
                Value::Text(column.name.clone()),
                Value::Integer(count as i64),
                Value::Integer(counts.len() as i64),
                top,
                freq,
            ]);
        }
        out.table(summary);
        return Ok(out);
    }

    let mut header = vec!["statistic"];
    header.extend(numeric_cols.iter().map(|c| c.name.as_str()));
    let mut summary = StatTable::new("Basic statistics", &header);
    let described = numeric_cols
        .iter()
        .map(|c| c.present_f64().map(|v| Describe::compute(&v)))
        .collect::<Result<Vec<_>, EdaError>>()?;
    for (i, label) in Describe::LABELS.iter().enumerate() {
        let mut row = vec![Value::Text(label.to_string())];
        row.extend(described.iter().map(|d| Value::from_f64(d.rows()[i].1)));
        summary.push_row(row);
    }
    out.table(summary);
    Ok(out)
}

// ---------------------------------------------------------------------------
// Order Creation
// ---------------------------------------------------------------------------

pub fn order_creation(table: &Table) -> ViewResult {
    let dates = values(table, "create_at_date")?;
    let mut points = Vec::new();
    for (key, count) in stats::counts_by_key(dates) {
        let date = key
            .as_date()
            .ok_or_else(|| EdaError::column_type("create_at_date", "date", key.type_name()))?;
        points.push([date_to_x(date), count as f64]);
    }
    // Typed and text dates order differently as keys.
    points.sort_by(|a, b| a[0].total_cmp(&b[0]));

    let hours = stats::counts_by_key(values(table, "create_at_hour")?);

    let mut out = ViewOutput::default();
    out.chart(ChartSpec::new(
        "Orders over time",
        "Date",
        "Number of orders",
        ChartKind::Line {
            points,
            x_axis: XAxis::Date,
        },
    ))
    .chart(ChartSpec::bar(
        "Orders by hour of day",
        "Hour",
        "Number of orders",
        bars(&hours),
    ));
    Ok(out)
}

// ---------------------------------------------------------------------------
// Payment Amount
// ---------------------------------------------------------------------------

pub fn payment_amount(table: &Table) -> ViewResult {
    let amounts = numeric(table, "payment_amount")?;
    let currencies = values(table, "from_currency")?;
    let present: Vec<f64> = amounts.iter().flatten().copied().collect();

    let mut pct = StatTable::new("Payment amount percentiles", &["quantile", "payment_amount"]);
    for (q, v) in stats::quantiles(&present, &PERCENTILES) {
        pct.push_row(vec![Value::Float(q), Value::from_f64(v)]);
    }

    // Group the largest payments by currency, groups in order of first appearance.
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    for idx in stats::nlargest(&amounts, TOP_PAYMENTS) {
        let currency = &currencies[idx];
        let Some(amount) = amounts[idx] else { continue };
        if currency.is_null() {
            continue;
        }
        let label = currency.to_string();
        match groups.iter_mut().find(|(g, _)| *g == label) {
            Some((_, v)) => v.push(amount),
            None => groups.push((label, vec![amount])),
        }
    }
    let groups = groups
        .into_iter()
        .filter_map(|(label, v)| BoxStats::compute(&v).map(|b| (label, b)))
        .collect();

    let mut out = ViewOutput::default();
    out.chart(ChartSpec::histogram(
        "Distribution of Payment Amounts",
        "Payment Amount",
        Histogram::compute(&present, Bins::Auto),
    ))
    .table(StatTable::describe(
        "Payment amount statistics",
        "payment_amount",
        &Describe::compute(&present),
    ))
    .table(pct)
    .chart(ChartSpec::new(
        "Payment Amount Distribution by From Currency (Top 1000)",
        "from_currency",
        "payment_amount",
        ChartKind::BoxPlot { groups },
    ));
    Ok(out)
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub fn users(table: &Table) -> ViewResult {
    let counts = stats::value_counts(values(table, "user_id")?);
    let per_user: Vec<f64> = counts.iter().map(|(_, c)| *c as f64).collect();

    let mut out = ViewOutput::default();
    out.chart(ChartSpec::new(
        "Distribution of Orders per User",
        "Number of Orders",
        "Number of Users",
        ChartKind::Histogram(Histogram::compute(&per_user, Bins::Auto)),
    ))
    .table(StatTable::counts(
        "Top 10 users by number of orders",
        "user_id",
        &top(counts, TOP_CATEGORIES),
    ));
    Ok(out)
}

// ---------------------------------------------------------------------------
// FX Rates
// ---------------------------------------------------------------------------

pub fn fx_rates(table: &Table) -> ViewResult {
    let mut out = ViewOutput::default();
    for (column, title) in [
        ("fx_rate", "Distribution of FX Rates"),
        ("mid_market_fx_rate", "Distribution of Mid-Market FX Rates"),
        ("fx_rate_difference", "Distribution of FX Rate Differences"),
        ("fx_rate_markup", "Distribution of FX Rate Markup (%)"),
    ] {
        out.chart(ChartSpec::histogram(
            title,
            column,
            histogram_of(table, column, Bins::Auto)?,
        ));
    }
    out.table(StatTable::describe(
        "FX Rate Markup Statistics",
        "fx_rate_markup",
        &Describe::compute(&present(table, "fx_rate_markup")?),
    ));
    Ok(out)
}

// ---------------------------------------------------------------------------
// Delivery Option
// ---------------------------------------------------------------------------

pub fn delivery_option(table: &Table) -> ViewResult {
    let counts = stats::value_counts(values(table, "delivery_option")?);
    let fees = histogram_of(table, "delivery_option_fee", Bins::Auto)?;

    let mut out = ViewOutput::default();
    out.chart(ChartSpec::bar(
        "Delivery Option Counts",
        "Delivery Option",
        "Count",
        bars(&counts),
    ))
    .chart(ChartSpec::histogram("Distribution of Delivery Option Fees", "Fee", fees));
    Ok(out)
}

// ---------------------------------------------------------------------------
// Countries & Currencies
// ---------------------------------------------------------------------------

pub fn countries_currencies(table: &Table) -> ViewResult {
    let mut out = ViewOutput::default();
    for column in ["from_country", "from_currency", "to_currency"] {
        let counts = stats::value_counts(values(table, column)?);
        out.table(StatTable::counts(
            format!("Top 10 {column}"),
            column,
            &top(counts, TOP_CATEGORIES),
        ));
    }

    let from = values(table, "from_currency")?;
    let to = values(table, "to_currency")?;
    let mut pairs: BTreeMap<(&Value, &Value), usize> = BTreeMap::new();
    for (f, t) in from.iter().zip(to) {
        if !f.is_null() && !t.is_null() {
            *pairs.entry((f, t)).or_default() += 1;
        }
    }
    let mut pairs: Vec<_> = pairs.into_iter().collect();
    // Stable: equal counts stay in key order.
    pairs.sort_by(|a, b| b.1.cmp(&a.1));
    let pair_bars = pairs
        .into_iter()
        .take(TOP_CURRENCY_PAIRS)
        .map(|((f, t), c)| (format!("({f}, {t})"), c as f64))
        .collect();

    out.chart(ChartSpec::bar("Top 20 Currency Pairs", "Currency Pair", "Count", pair_bars));
    Ok(out)
}

// ---------------------------------------------------------------------------
// User Demographics
// ---------------------------------------------------------------------------

pub fn user_demographics(table: &Table) -> ViewResult {
    let nationalities = top(
        stats::value_counts(values(table, "user_nationality")?),
        TOP_CATEGORIES,
    );
    let languages = top(
        stats::value_counts(values(table, "user_language")?),
        TOP_CATEGORIES,
    );
    let birth_years = histogram_of(table, "user_birthyear", FIXED_BINS)?;

    let mut out = ViewOutput::default();
    out.chart(ChartSpec::bar(
        "Top 10 User Nationalities",
        "Nationality",
        "Count",
        bars(&nationalities),
    ))
    .chart(ChartSpec::bar(
        "Top 10 User Languages",
        "Language",
        "Count",
        bars(&languages),
    ))
    .chart(ChartSpec::histogram(
        "Distribution of User Birth Years",
        "Birth Year",
        birth_years,
    ));
    Ok(out)
}

// ---------------------------------------------------------------------------
// User First Visit
// ---------------------------------------------------------------------------

pub fn user_first_visit(table: &Table) -> ViewResult {
    let days = present(table, "days_since_first_visit")?;

    let mut out = ViewOutput::default();
    out.chart(ChartSpec::histogram(
        "Distribution of Days Since First Visit",
        "Days",
        Histogram::compute(&days, FIXED_BINS),
    ))
    .table(StatTable::describe(
        "Days since first visit statistics",
        "days_since_first_visit",
        &Describe::compute(&days),
    ));
    Ok(out)
}

// ---------------------------------------------------------------------------
// User Behavior
// ---------------------------------------------------------------------------

/// Per-row `order_count` and `total_spent` of the row's user.
///
/// Computed into fresh vectors so the session table is never touched.
pub fn user_totals(table: &Table) -> Result<(Vec<Option<f64>>, Vec<Option<f64>>), EdaError> {
    let users = values(table, "user_id")?;
    let amounts = numeric(table, "payment_amount")?;
    Ok((
        stats::broadcast_count(users),
        stats::broadcast_sum(users, &amounts),
    ))
}

pub fn user_behavior(table: &Table) -> ViewResult {
    let (order_count, total_spent) = user_totals(table)?;

    let points = order_count
        .iter()
        .zip(&total_spent)
        .filter_map(|(c, s)| Some([(*c)?, (*s)?]))
        .collect();

    let r = stats::pearson(&order_count, &total_spent);
    let mut corr = StatTable::new(
        "Correlation between order count and total spent",
        &["", "order_count", "total_spent"],
    );
    corr.push_row(vec![
        Value::Text("order_count".into()),
        Value::from_f64(stats::pearson(&order_count, &order_count)),
        Value::from_f64(r),
    ]);
    corr.push_row(vec![
        Value::Text("total_spent".into()),
        Value::from_f64(r),
        Value::from_f64(stats::pearson(&total_spent, &total_spent)),
    ]);

    let mut out = ViewOutput::default();
    out.chart(ChartSpec::new(
        "User Order Count vs Total Spent",
        "Order Count",
        "Total Spent",
        ChartKind::Scatter { points },
    ))
    .table(corr);
    Ok(out)
}

// ---------------------------------------------------------------------------
// Seasonality
// ---------------------------------------------------------------------------

pub fn seasonality(table: &Table) -> ViewResult {
    let amounts = numeric(table, "payment_amount")?;
    let by_month = stats::group_mean(values(table, "month")?, &amounts);
    let by_weekday = stats::group_mean(values(table, "day_of_week")?, &amounts);

    let mean_bars = |groups: Vec<(Value, f64)>| -> Vec<(String, f64)> {
        groups.into_iter().map(|(k, m)| (k.to_string(), m)).collect()
    };

    let mut out = ViewOutput::default();
    out.chart(ChartSpec::bar(
        "Average Payment Amount by Month",
        "Month",
        "Average Payment Amount",
        mean_bars(by_month),
    ))
    .chart(ChartSpec::bar(
        "Average Payment Amount by Day of Week",
        "Day of Week (0 = Monday, 6 = Sunday)",
        "Average Payment Amount",
        mean_bars(by_weekday),
    ));
    Ok(out)
}

// ---------------------------------------------------------------------------
// User Retention
// ---------------------------------------------------------------------------

pub fn user_retention(table: &Table) -> ViewResult {
    let weeks = values(table, "weeks_since_first_visit")?;
    let active = stats::group_nunique(weeks, values(table, "user_id")?);

    let points = active
        .iter()
        .map(|(week, users)| {
            key_to_x("weeks_since_first_visit", week).map(|x| [x, *users as f64])
        })
        .collect::<Result<Vec<_>, EdaError>>()?;

    let mut out = ViewOutput::default();
    out.chart(ChartSpec::new(
        "User Retention Over Time",
        "Weeks Since First Visit",
        "Number of Active Users",
        ChartKind::Line {
            points,
            x_axis: XAxis::Numeric,
        },
    ));
    Ok(out)
}
