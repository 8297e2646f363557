//! Ingestion pipeline for the monthly flight sheets.
//!
//! Loads every configured sheet, widens the configured columns to floating
//! point, concatenates the months and promotes the date column, returning a
//! [`FlightDataset`] that the aggregation and query layers work from.

use std::time::Instant;

use chrono::Utc;
use flight_core::settings::Settings;
use flight_core::{RecordSet, Result};
use serde::Serialize;
use tracing::info;

use crate::aggregator::{resample, Reduction, Resample};
use crate::combiner::concat;
use crate::reader::load_sheets;
use crate::writer::export_records;

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the dataset.
#[derive(Debug, Clone, Serialize)]
pub struct LoadMetadata {
    /// RFC 3339 timestamp when the dataset was built.
    pub generated_at: String,
    pub workbook: String,
    pub sheets: Vec<String>,
    /// Data rows per sheet, in sheet order.
    pub rows_per_sheet: Vec<usize>,
    pub rows_combined: usize,
    pub normalized_columns: Vec<String>,
    /// Wall-clock seconds spent reading the workbook.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent normalizing, combining and indexing.
    pub transform_time_seconds: f64,
}

/// The output of [`load_dataset`].
#[derive(Debug, Clone)]
pub struct FlightDataset {
    /// One normalized record set per sheet, positionally indexed.
    pub months: Vec<RecordSet>,
    /// All months concatenated, positionally indexed `0..n`.
    pub combined: RecordSet,
    /// `combined` keyed by the date column.
    pub indexed: RecordSet,
    pub metadata: LoadMetadata,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run load → normalize → combine → index for `settings`.
///
/// Every stage error propagates unchanged; nothing is partially returned.
pub fn load_dataset(settings: &Settings) -> Result<FlightDataset> {
    let load_start = Instant::now();
    let mut months = load_sheets(&settings.workbook, settings.sheets.as_slice())?;
    let load_time = load_start.elapsed().as_secs_f64();

    let transform_start = Instant::now();
    for month in months.iter_mut() {
        for column in &settings.float_columns {
            month.to_float(column)?;
        }
    }

    let combined = concat(&months)?;
    let indexed = combined.with_index(&settings.date_column)?;
    let transform_time = transform_start.elapsed().as_secs_f64();

    info!(
        "Loaded {} rows from {} sheets of {}",
        combined.len(),
        months.len(),
        settings.workbook.display()
    );

    let metadata = LoadMetadata {
        generated_at: Utc::now().to_rfc3339(),
        workbook: settings.workbook.display().to_string(),
        sheets: settings.sheets.clone(),
        rows_per_sheet: months.iter().map(RecordSet::len).collect(),
        rows_combined: combined.len(),
        normalized_columns: settings.float_columns.clone(),
        load_time_seconds: load_time,
        transform_time_seconds: transform_time,
    };

    Ok(FlightDataset {
        months,
        combined,
        indexed,
        metadata,
    })
}

/// Sum `dataset` per calendar day and write it to the configured export
/// workbook. Returns the exported record set.
pub fn export_daily_sum(dataset: &FlightDataset, settings: &Settings) -> Result<RecordSet> {
    let daily = resample(&dataset.indexed, &Resample::daily(Reduction::Sum))?;
    export_records(&daily, &settings.export_path, &settings.export_sheet)?;
    Ok(daily)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
