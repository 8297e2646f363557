//! Core types for flight-ops: typed record sets, the pipeline error
//! taxonomy, time bucketing, statistics and settings.

pub mod error;
pub mod formatting;
pub mod models;
pub mod record_set;
pub mod schema;
pub mod settings;
pub mod stats;
pub mod time_utils;

pub use error::{PipelineError, Result};
pub use models::{Column, ColumnData, ColumnType, Value};
pub use record_set::{RecordSet, RecordView, RowIndex};
