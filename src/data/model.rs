use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};

use crate::error::EdaError;

/// Days from the start of the common era to 1970-01-01.
pub const EPOCH_DAYS_FROM_CE: i32 = 719_163;

// ---------------------------------------------------------------------------
// Value – a single cell of the transaction table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
/// Group-bys key on `Value`, so it must be `Ord` and `Hash`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Null,
}

// -- Manual Eq/Ord so Value can key BTreeMap / HashMap --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) | Float(_) => 2,
                Text(_) => 3,
                Date(_) => 4,
                DateTime(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            // `+ 0.0` folds -0.0 into 0.0 so ordering agrees with equality.
            (Float(a), Float(b)) => (a + 0.0).total_cmp(&(b + 0.0)),
            // Mixed numeric columns sort by magnitude; an integer precedes an equal float.
            (Integer(a), Float(b)) => (*a as f64).total_cmp(&(b + 0.0)).then(Ordering::Less),
            (Float(a), Integer(b)) => (a + 0.0).total_cmp(&(*b as f64)).then(Ordering::Greater),
            (Text(a), Text(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Text(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => (f + 0.0).to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::DateTime(t) => t.hash(state),
            Value::Date(d) => d.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Value::DateTime(t) => write!(f, "{}", format_timestamp(t)),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Null => Ok(()),
        }
    }
}

/// Cells serialise as plain JSON scalars; temporal values as ISO text.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::DateTime(_) | Value::Date(_) => serializer.collect_str(self),
        }
    }
}

impl Value {
    /// Wrap a float, mapping NaN to `Null` the way Pandas treats it as
    /// missing. Negative zero is stored as zero.
    pub fn from_f64(v: f64) -> Self {
        if v.is_nan() {
            Value::Null
        } else {
            Value::Float(v + 0.0)
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Interpret the value as an `f64`; `None` for nulls and non-numeric cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) if !v.is_nan() => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Calendar date of the value. Text is accepted when it is ISO formatted,
    /// which is how derived date columns come back from a CSV round trip.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::DateTime(t) => Some(t.date()),
            Value::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
            _ => None,
        }
    }

    /// Name of the value's kind, used in type-mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::DateTime(_) => "timestamp",
            Value::Date(_) => "date",
            Value::Null => "null",
        }
    }
}

/// ISO timestamp in the layout Pandas writes: seconds always, fraction only when present.
pub fn format_timestamp(t: &NaiveDateTime) -> String {
    if t.nanosecond() == 0 {
        t.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        t.format("%Y-%m-%d %H:%M:%S%.f").to_string()
    }
}

// ---------------------------------------------------------------------------
// DType – per-column storage type, named after the Pandas dtypes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    Int64,
    Float64,
    Bool,
    DateTime,
    Object,
}

impl DType {
    pub fn is_numeric(self) -> bool {
        matches!(self, DType::Int64 | DType::Float64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::Int64 => "int64",
            DType::Float64 => "float64",
            DType::Bool => "bool",
            DType::DateTime => "datetime64[ns]",
            DType::Object => "object",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Column / Table
// ---------------------------------------------------------------------------

/// One named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Infer the column dtype the way Pandas would after `read_csv`.
    ///
    /// An integer column with holes becomes `float64`; an all-null column
    /// is `float64` as well.
    pub fn dtype(&self) -> DType {
        let mut has_null = false;
        let (mut ints, mut floats, mut bools, mut stamps, mut other) = (0, 0, 0, 0, 0);
        for v in &self.values {
            match v {
                Value::Null => has_null = true,
                Value::Integer(_) => ints += 1,
                Value::Float(_) => floats += 1,
                Value::Bool(_) => bools += 1,
                Value::DateTime(_) => stamps += 1,
                Value::Text(_) | Value::Date(_) => other += 1,
            }
        }
        let present = ints + floats + bools + stamps + other;
        if present == 0 {
            return DType::Float64;
        }
        if ints + floats == present {
            return if floats == 0 && !has_null {
                DType::Int64
            } else {
                DType::Float64
            };
        }
        if bools == present && !has_null {
            return DType::Bool;
        }
        if stamps == present {
            return DType::DateTime;
        }
        DType::Object
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Numeric view of the column: `None` marks a missing cell.
    ///
    /// Fails when a present cell is not a number.
    pub fn numeric(&self) -> Result<Vec<Option<f64>>, EdaError> {
        self.values
            .iter()
            .map(|v| match v {
                Value::Null => Ok(None),
                Value::Integer(_) | Value::Float(_) => Ok(v.as_f64()),
                other => Err(EdaError::column_type(&self.name, "numeric", other.type_name())),
            })
            .collect()
    }

    /// Present numeric values only, in row order.
    pub fn present_f64(&self) -> Result<Vec<f64>, EdaError> {
        Ok(self.numeric()?.into_iter().flatten().collect())
    }
}

/// An in-memory table: equal-length columns in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Build a table, checking that every column has the same length and
    /// that column names are unique.
    pub fn new(columns: Vec<Column>) -> Result<Self, EdaError> {
        let rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        let mut table = Table {
            columns: Vec::with_capacity(columns.len()),
            rows,
        };
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Build a table from a header and row-major cells. Short rows are
    /// padded with nulls.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, EdaError> {
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|h| Column::new(h, Vec::with_capacity(rows.len())))
            .collect();
        for row in rows {
            let mut cells = row.into_iter();
            for column in &mut columns {
                column.values.push(cells.next().unwrap_or(Value::Null));
            }
        }
        Table::new(columns)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Look a column up by exact name.
    pub fn column(&self, name: &str) -> Result<&Column, EdaError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| EdaError::missing_column(name))
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut Column, EdaError> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| EdaError::missing_column(name))
    }

    /// Append a column; it must match the row count and not collide with
    /// an existing name.
    pub fn push_column(&mut self, column: Column) -> Result<(), EdaError> {
        if self.has_column(&column.name) {
            return Err(EdaError::ColumnCollision {
                column: column.name,
            });
        }
        if self.columns.is_empty() {
            self.rows = column.values.len();
        } else if column.values.len() != self.rows {
            return Err(EdaError::RaggedColumn {
                column: column.name,
                expected: self.rows,
                found: column.values.len(),
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Remove a column by name, returning it if it was present.
    pub fn drop_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }
}
