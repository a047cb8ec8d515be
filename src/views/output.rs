use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::data::model::{EPOCH_DAYS_FROM_CE, Value};
use crate::stats::Describe;
use crate::stats::distribution::{BoxStats, Histogram};

// ---------------------------------------------------------------------------
// View output: what a view hands to the shell for rendering
// ---------------------------------------------------------------------------

/// Statistics tables and chart specifications, in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewOutput {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Table(StatTable),
    Chart(ChartSpec),
}

impl ViewOutput {
    pub fn table(&mut self, table: StatTable) -> &mut Self {
        self.blocks.push(Block::Table(table));
        self
    }

    pub fn chart(&mut self, chart: ChartSpec) -> &mut Self {
        self.blocks.push(Block::Chart(chart));
        self
    }

    pub fn tables(&self) -> impl Iterator<Item = &StatTable> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            Block::Chart(_) => None,
        })
    }

    pub fn charts(&self) -> impl Iterator<Item = &ChartSpec> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Chart(c) => Some(c),
            Block::Table(_) => None,
        })
    }

    /// First table with the given title.
    pub fn find_table(&self, title: &str) -> Option<&StatTable> {
        self.tables().find(|t| t.title == title)
    }

    /// First chart with the given title.
    pub fn find_chart(&self, title: &str) -> Option<&ChartSpec> {
        self.charts().find(|c| c.title == title)
    }
}

// ---------------------------------------------------------------------------
// Statistics tables
// ---------------------------------------------------------------------------

/// A small titled grid of values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatTable {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl StatTable {
    pub fn new(title: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            title: title.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }

    /// A two-column `(key, count)` table, e.g. the head of a `value_counts`.
    pub fn counts(title: impl Into<String>, key: &str, counts: &[(Value, usize)]) -> Self {
        let mut table = StatTable::new(title, &[key, "count"]);
        for (k, c) in counts {
            table.push_row(vec![k.clone(), Value::Integer(*c as i64)]);
        }
        table
    }

    /// The `describe()` rows of a single series.
    pub fn describe(title: impl Into<String>, series: &str, d: &Describe) -> Self {
        let mut table = StatTable::new(title, &["statistic", series]);
        for (label, value) in d.rows() {
            table.push_row(vec![Value::Text(label.to_string()), Value::from_f64(value)]);
        }
        table
    }

    /// Cell at `(row, column name)`.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(col)
    }
}

// ---------------------------------------------------------------------------
// Chart specifications
// ---------------------------------------------------------------------------

/// Everything the shell needs to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub kind: ChartKind,
}

/// How the x coordinate of a line chart is to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum XAxis {
    Numeric,
    /// Days since 1970-01-01.
    Date,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartKind {
    Line { points: Vec<[f64; 2]>, x_axis: XAxis },
    Bar { bars: Vec<(String, f64)> },
    Histogram(Histogram),
    BoxPlot { groups: Vec<(String, BoxStats)> },
    Scatter { points: Vec<[f64; 2]> },
}

impl ChartSpec {
    pub fn new(title: &str, x_label: &str, y_label: &str, kind: ChartKind) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            kind,
        }
    }

    pub fn histogram(title: &str, x_label: &str, histogram: Histogram) -> Self {
        Self::new(title, x_label, "Count", ChartKind::Histogram(histogram))
    }

    pub fn bar(title: &str, x_label: &str, y_label: &str, bars: Vec<(String, f64)>) -> Self {
        Self::new(title, x_label, y_label, ChartKind::Bar { bars })
    }
}

/// Day number used on date axes.
pub fn date_to_x(date: NaiveDate) -> f64 {
    (date.num_days_from_ce() - EPOCH_DAYS_FROM_CE) as f64
}

/// Inverse of [`date_to_x`].
pub fn x_to_date(x: f64) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32 + EPOCH_DAYS_FROM_CE)
}

// ---------------------------------------------------------------------------
// Plain-text rendering (headless mode)
// ---------------------------------------------------------------------------

fn fmt_num(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.6}")
    }
}

fn fmt_cell(v: &Value) -> String {
    match v {
        Value::Float(f) => fmt_num(*f),
        Value::Null => "NaN".to_string(),
        other => other.to_string(),
    }
}

impl fmt::Display for StatTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| r.iter().map(fmt_cell).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                cells
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|s| s.chars().count())
                    .chain(std::iter::once(c.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |f: &mut fmt::Formatter<'_>, row: &[String]| -> fmt::Result {
            let padded: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(s, &w)| format!("{s:<w$}"))
                .collect();
            writeln!(f, "  {}", padded.join("  ").trim_end())
        };
        line(f, &self.columns)?;
        for row in &cells {
            line(f, row)?;
        }
        Ok(())
    }
}

impl fmt::Display for ChartSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[chart] {} ({} vs {})", self.title, self.y_label, self.x_label)?;
        match &self.kind {
            ChartKind::Line { points, x_axis } => {
                for [x, y] in points {
                    let x = match x_axis {
                        XAxis::Date => x_to_date(*x)
                            .map(|d| d.to_string())
                            .unwrap_or_else(|| fmt_num(*x)),
                        XAxis::Numeric => fmt_num(*x),
                    };
                    writeln!(f, "  {x}: {}", fmt_num(*y))?;
                }
            }
            ChartKind::Bar { bars } => {
                for (label, v) in bars {
                    writeln!(f, "  {label}: {}", fmt_num(*v))?;
                }
            }
            ChartKind::Histogram(h) => {
                for (i, count) in h.counts.iter().enumerate() {
                    writeln!(
                        f,
                        "  [{}, {}): {count}",
                        fmt_num(h.edges[i]),
                        fmt_num(h.edges[i + 1])
                    )?;
                }
            }
            ChartKind::BoxPlot { groups } => {
                for (label, b) in groups {
                    writeln!(
                        f,
                        "  {label}: n={} whiskers=[{}, {}] q1={} median={} q3={} outliers={}",
                        b.count,
                        fmt_num(b.lower_whisker),
                        fmt_num(b.upper_whisker),
                        fmt_num(b.q1),
                        fmt_num(b.median),
                        fmt_num(b.q3),
                        b.outliers.len()
                    )?;
                }
            }
            ChartKind::Scatter { points } => {
                writeln!(f, "  {} points", points.len())?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ViewOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match block {
                Block::Table(t) => write!(f, "{t}")?,
                Block::Chart(c) => write!(f, "{c}")?,
            }
        }
        Ok(())
    }
}
