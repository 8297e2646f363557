//! Time-bucketed aggregation over date-indexed record sets.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Weekday};
use flight_core::stats::mean_of;
use flight_core::time_utils::Frequency;
use flight_core::{Column, ColumnData, PipelineError, RecordSet, Result, RowIndex};
use tracing::{debug, warn};

// ── Resample ──────────────────────────────────────────────────────────────────

/// How the rows of one bucket collapse into a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Sum,
    Mean,
}

/// What to do with text and date columns during a reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonNumeric {
    /// Leave the column out of the result, with a warning.
    #[default]
    Drop,
    /// Fail with [`PipelineError::NonNumericReduction`].
    Fail,
}

/// A bucket width paired with a reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resample {
    pub frequency: Frequency,
    pub reduction: Reduction,
    pub non_numeric: NonNumeric,
}

impl Resample {
    pub fn new(frequency: Frequency, reduction: Reduction) -> Self {
        Self {
            frequency,
            reduction,
            non_numeric: NonNumeric::default(),
        }
    }

    pub fn daily(reduction: Reduction) -> Self {
        Self::new(Frequency::Day, reduction)
    }

    /// Weeks closing on `anchor`.
    pub fn weekly(anchor: Weekday, reduction: Reduction) -> Self {
        Self::new(Frequency::Week(anchor), reduction)
    }

    pub fn monthly(reduction: Reduction) -> Self {
        Self::new(Frequency::Month, reduction)
    }

    /// Reject non-numeric columns instead of dropping them.
    pub fn strict(mut self) -> Self {
        self.non_numeric = NonNumeric::Fail;
        self
    }
}

// ── Resampling ────────────────────────────────────────────────────────────────

/// Bucket the rows of a date-indexed record set and reduce every numeric
/// column per bucket.
///
/// The result is keyed by bucket label and named after the source index.
/// Every bucket from the first date's through the last date's appears once;
/// an empty bucket sums to `0` and averages to `NaN`. `NaN` cells are skipped.
pub fn resample(records: &RecordSet, plan: &Resample) -> Result<RecordSet> {
    let RowIndex::Date { name, keys } = records.index() else {
        return Err(PipelineError::NotDateIndexed);
    };

    let mut kept = Vec::new();
    for column in records.columns() {
        let column_type = column.column_type();
        if column_type.is_numeric() {
            kept.push(column);
            continue;
        }
        match plan.non_numeric {
            NonNumeric::Drop => warn!(
                "Dropping non-numeric column '{}' ({}) from {:?} resample",
                column.name, column_type, plan.reduction
            ),
            NonNumeric::Fail => {
                return Err(PipelineError::NonNumericReduction {
                    column: column.name.clone(),
                    column_type,
                })
            }
        }
    }

    let (Some(&first), Some(&last)) = (keys.iter().min(), keys.iter().max()) else {
        let columns = kept
            .iter()
            .map(|c| reduce_column(c, &[], plan.reduction))
            .collect::<Result<_>>()?;
        return RecordSet::with_date_keys(name.clone(), Vec::new(), columns);
    };

    let labels = plan.frequency.labels_between(first, last);
    let mut buckets: BTreeMap<NaiveDate, Vec<usize>> =
        labels.iter().map(|&label| (label, Vec::new())).collect();
    for (row, &key) in keys.iter().enumerate() {
        buckets
            .entry(plan.frequency.bucket_label(key))
            .or_default()
            .push(row);
    }
    let groups: Vec<Vec<usize>> = buckets.into_values().collect();

    let columns = kept
        .iter()
        .map(|c| reduce_column(c, &groups, plan.reduction))
        .collect::<Result<_>>()?;

    debug!(
        "Resampled {} rows into {} '{}' buckets ({:?})",
        records.len(),
        labels.len(),
        plan.frequency,
        plan.reduction
    );
    RecordSet::with_date_keys(name.clone(), labels, columns)
}

/// Calendar-month grouping. The reduction has no default.
pub fn group_by_month(records: &RecordSet, reduction: Reduction) -> Result<RecordSet> {
    resample(records, &Resample::monthly(reduction))
}

/// One output value per group. Integer sums stay integral and fail with
/// [`PipelineError::SumOverflow`] rather than wrap.
fn reduce_column(column: &Column, groups: &[Vec<usize>], reduction: Reduction) -> Result<Column> {
    let data = &column.data;
    let reduced = match (data, reduction) {
        (ColumnData::Int(values), Reduction::Sum) => ColumnData::Int(
            groups
                .iter()
                .map(|rows| {
                    rows.iter()
                        .try_fold(0i64, |acc, &r| acc.checked_add(values[r]))
                        .ok_or_else(|| PipelineError::SumOverflow {
                            column: column.name.clone(),
                        })
                })
                .collect::<Result<_>>()?,
        ),
        (_, Reduction::Sum) => ColumnData::Float(
            groups
                .iter()
                .map(|rows| group_values(data, rows).iter().sum::<f64>())
                .collect(),
        ),
        (_, Reduction::Mean) => ColumnData::Float(
            groups
                .iter()
                .map(|rows| mean_of(&group_values(data, rows)))
                .collect(),
        ),
    };
    Ok(Column::new(column.name.clone(), reduced))
}

fn group_values(data: &ColumnData, rows: &[usize]) -> Vec<f64> {
    rows.iter()
        .filter_map(|&r| data.get_f64(r))
        .filter(|v| !v.is_nan())
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
