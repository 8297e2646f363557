use std::path::PathBuf;
use thiserror::Error;

use crate::models::ColumnType;

/// All errors produced by the flight-ops pipeline stages.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The workbook path does not exist.
    #[error("Source not found: {0}")]
    SourceNotFound(PathBuf),

    /// The workbook has no sheet with the requested name.
    #[error("Sheet '{sheet}' not found in {path}")]
    SheetNotFound { path: PathBuf, sheet: String },

    /// The container could not be read, or its rows are not rectangular.
    #[error("Malformed input in '{source_name}': {detail}")]
    MalformedInput { source_name: String, detail: String },

    /// A referenced column is absent from the record set.
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// A cell could not be converted to a floating-point value.
    #[error("Cannot coerce value '{value}' in column '{column}' (row {row}) to float")]
    TypeCoercionError {
        column: String,
        row: usize,
        value: String,
    },

    /// A literal or operation does not fit the column's declared type.
    #[error("Type mismatch on column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: ColumnType,
    },

    /// Record sets being combined do not share the same columns.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A reduction was requested over a non-numeric column.
    #[error("Cannot reduce non-numeric column '{column}' ({column_type})")]
    NonNumericReduction {
        column: String,
        column_type: ColumnType,
    },

    /// An integer sum left the `i64` range.
    #[error("Integer sum overflowed on column '{column}'")]
    SumOverflow { column: String },

    /// A date-only operation was applied to a positionally indexed record set.
    #[error("Record set has no date index")]
    NotDateIndexed,

    /// Writing the output workbook failed.
    #[error("Failed to write {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the flight crates.
pub type Result<T> = std::result::Result<T, PipelineError>;
