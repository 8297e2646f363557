use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::schema::{flights, sheets};

// ── Settings ───────────────────────────────────────────────────────────────────

/// Inputs and knobs for one analysis run.
///
/// Built from [`Default`]; every field can be overridden in code before the
/// run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Workbook holding the monthly sheets.
    pub workbook: PathBuf,
    /// Sheets to load, in concatenation order.
    pub sheets: Vec<String>,
    /// Column promoted to the date index.
    pub date_column: String,
    /// Columns widened from integer to floating point after loading.
    pub float_columns: Vec<String>,
    /// Weekday that closes each weekly bucket.
    pub week_anchor: Weekday,
    /// Output workbook for the daily sums.
    pub export_path: PathBuf,
    /// Sheet name inside the output workbook.
    pub export_sheet: String,
    /// Rows shown by head/tail previews.
    pub preview_rows: usize,
    /// Number of bins in the passenger frequency table.
    pub histogram_bins: usize,
    /// Logging level (`DEBUG`, `INFO`, `WARNING`, `ERROR`).
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workbook: PathBuf::from("sample.xlsx"),
            sheets: vec![
                sheets::NOVEMBER_2020.to_string(),
                sheets::DECEMBER_2020.to_string(),
            ],
            date_column: flights::DATE.to_string(),
            float_columns: vec![flights::CARGO_WEIGHT.to_string()],
            week_anchor: Weekday::Mon,
            export_path: PathBuf::from("df_daily_sum.xlsx"),
            export_sheet: "Sheet1".to_string(),
            preview_rows: 5,
            histogram_bins: 10,
            log_level: "INFO".to_string(),
        }
    }
}
