//! Descriptive statistics over numeric columns.

use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::models::{ColumnData, Value};
use crate::record_set::RecordSet;

// ── Slice helpers ─────────────────────────────────────────────────────────────

/// Compute the `p`-th percentile of a **sorted** slice using linear
/// interpolation between closest ranks.
///
/// Returns `NaN` for an empty slice.
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    if sorted_data.is_empty() {
        return f64::NAN;
    }
    let len = sorted_data.len();
    if len == 1 {
        return sorted_data[0];
    }
    let rank = (p / 100.0) * (len as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted_data[lo];
    }
    let frac = rank - lo as f64;
    sorted_data[lo] + frac * (sorted_data[hi] - sorted_data[lo])
}

/// Arithmetic mean; `NaN` when empty.
pub fn mean_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with `ddof` delta degrees of freedom (1 = sample,
/// 0 = population). `NaN` when there are not more values than `ddof`.
pub fn std_of(values: &[f64], ddof: u32) -> f64 {
    let n = values.len();
    if n <= ddof as usize {
        return f64::NAN;
    }
    let mean = mean_of(values);
    let sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (sq / (n - ddof as usize) as f64).sqrt()
}

fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values
}

// ── Column accessors ──────────────────────────────────────────────────────────

/// Values of a numeric column as `f64`, with `NaN` cells left out.
///
/// Fails with [`PipelineError::ColumnNotFound`] or, for text and date
/// columns, [`PipelineError::TypeMismatch`].
pub fn numeric_values(records: &RecordSet, column: &str) -> Result<Vec<f64>> {
    let col = records.column(column)?;
    col.data
        .to_f64_vec()
        .map(without_nan)
        .ok_or_else(|| PipelineError::TypeMismatch {
            column: column.to_string(),
            expected: "numeric column".to_string(),
            found: col.column_type(),
        })
}

fn without_nan(mut values: Vec<f64>) -> Vec<f64> {
    values.retain(|v| !v.is_nan());
    values
}

pub fn mean(records: &RecordSet, column: &str) -> Result<f64> {
    Ok(mean_of(&numeric_values(records, column)?))
}

pub fn median(records: &RecordSet, column: &str) -> Result<f64> {
    Ok(percentile(&sorted(numeric_values(records, column)?), 50.0))
}

pub fn std_dev(records: &RecordSet, column: &str, ddof: u32) -> Result<f64> {
    Ok(std_of(&numeric_values(records, column)?, ddof))
}

/// Most frequent values of `column`, ascending. Ties yield several values;
/// an empty column yields none. Works for every column type.
pub fn mode(records: &RecordSet, column: &str) -> Result<Vec<Value>> {
    let col = records.column(column)?;
    let modes = match &col.data {
        ColumnData::Int(v) => {
            let mut m = most_frequent(v.iter().copied());
            m.sort_unstable();
            m.into_iter().map(Value::Int).collect()
        }
        ColumnData::Float(v) => {
            let present = v.iter().filter(|x| !x.is_nan());
            let mut m: Vec<f64> = most_frequent(present.map(|x| x.to_bits()))
                .into_iter()
                .map(f64::from_bits)
                .collect();
            m.sort_by(f64::total_cmp);
            m.into_iter().map(Value::Float).collect()
        }
        ColumnData::Str(v) => {
            let mut m = most_frequent(v.iter().cloned());
            m.sort();
            m.into_iter().map(Value::Str).collect()
        }
        ColumnData::Date(v) => {
            let mut m = most_frequent(v.iter().copied());
            m.sort_unstable();
            m.into_iter().map(Value::Date).collect()
        }
    };
    Ok(modes)
}

fn most_frequent<T: Eq + Hash>(values: impl Iterator<Item = T>) -> Vec<T> {
    let mut counts: HashMap<T, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    let top = counts.values().copied().max().unwrap_or(0);
    counts
        .into_iter()
        .filter(|(_, c)| *c == top)
        .map(|(v, _)| v)
        .collect()
}

// ── describe ──────────────────────────────────────────────────────────────────

/// Summary statistics for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (ddof = 1).
    pub std: f64,
    pub min: f64,
    #[serde(rename = "25%")]
    pub p25: f64,
    #[serde(rename = "50%")]
    pub p50: f64,
    #[serde(rename = "75%")]
    pub p75: f64,
    pub max: f64,
}

/// Summaries for every numeric column, in column order. Text and date
/// columns are skipped; `NaN` cells are not counted.
pub fn describe(records: &RecordSet) -> Vec<ColumnSummary> {
    records
        .columns()
        .iter()
        .filter_map(|c| c.data.to_f64_vec().map(|v| (c.name.clone(), without_nan(v))))
        .map(|(column, values)| {
            let data = sorted(values);
            ColumnSummary {
                column,
                count: data.len(),
                mean: mean_of(&data),
                std: std_of(&data, 1),
                min: data.first().copied().unwrap_or(f64::NAN),
                p25: percentile(&data, 25.0),
                p50: percentile(&data, 50.0),
                p75: percentile(&data, 75.0),
                max: data.last().copied().unwrap_or(f64::NAN),
            }
        })
        .collect()
}

// ── histogram ─────────────────────────────────────────────────────────────────

/// One row of a frequency table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width frequency table over `[min, max]` of a numeric column.
///
/// Every bin is half-open except the last, which also takes `max`. `NaN`
/// cells are not counted. When all values are equal the range is widened to `value ± 0.5`; an empty column
/// uses `[0, 1]`. `bins` is clamped to at least one.
pub fn histogram(records: &RecordSet, column: &str, bins: usize) -> Result<Vec<HistogramBin>> {
    let values = numeric_values(records, column)?;
    let bins = bins.max(1);

    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if values.is_empty() {
        (lo, hi) = (0.0, 1.0);
    } else if lo == hi {
        (lo, hi) = (lo - 0.5, hi + 0.5);
    }

    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in &values {
        let slot = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[slot] += 1;
    }

    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count,
        })
        .collect())
}
