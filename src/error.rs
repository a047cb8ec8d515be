use std::fmt;

use thiserror::Error;

/// Broad classification of an [`EdaError`], used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Schema,
    Data,
    DivisionAnomaly,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Schema => "schema error",
            ErrorKind::Data => "data error",
            ErrorKind::DivisionAnomaly => "division anomaly",
        })
    }
}

/// Failures raised while deriving columns or computing a view.
#[derive(Debug, Error)]
pub enum EdaError {
    #[error("missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("column '{column}' has type {found}, expected {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
        found: String,
    },

    #[error("column '{column}' already exists; derivation must run on the raw dataset")]
    ColumnCollision { column: String },

    #[error("column '{column}' has {found} values but the table has {expected} rows")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("row {row}, column '{column}': '{value}' is not a valid timestamp")]
    BadTimestamp {
        row: usize,
        column: String,
        value: String,
    },

    #[error("{rows} row(s) have mid_market_fx_rate == 0; fx_rate_markup is undefined there")]
    ZeroMidMarketRate { rows: usize },
}

impl EdaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EdaError::MissingColumn { .. }
            | EdaError::ColumnType { .. }
            | EdaError::ColumnCollision { .. }
            | EdaError::RaggedColumn { .. } => ErrorKind::Schema,
            EdaError::BadTimestamp { .. } => ErrorKind::Data,
            EdaError::ZeroMidMarketRate { .. } => ErrorKind::DivisionAnomaly,
        }
    }

    pub fn missing_column(column: &str) -> Self {
        Self::MissingColumn {
            column: column.to_string(),
        }
    }

    pub fn column_type(column: &str, expected: &'static str, found: impl ToString) -> Self {
        Self::ColumnType {
            column: column.to_string(),
            expected,
            found: found.to_string(),
        }
    }
}
