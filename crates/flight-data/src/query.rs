//! Predicate filters over record sets and views.
//!
//! A [`Predicate`] is plain data. Filtering first compiles it against the
//! source schema (resolving columns and checking literal types), then
//! evaluates the compiled form row by row. Validation therefore happens
//! before any row is touched, even when there are no rows.

use chrono::NaiveDate;
use flight_core::{ColumnData, ColumnType, PipelineError, RecordSet, RecordView, Result, Value};
use tracing::debug;

// ── Predicate ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column == value`
    Eq { column: String, value: Value },
    /// `column >= value`, numeric columns only.
    Ge { column: String, value: Value },
    /// Date index within `[start, end]`.
    DateRange { start: NaiveDate, end: NaiveDate },
    /// Every operand holds.
    And(Vec<Predicate>),
    /// At least one operand holds.
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn ge(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Ge {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn date_between(start: NaiveDate, end: NaiveDate) -> Self {
        Predicate::DateRange { start, end }
    }

    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::And(mut parts) => {
                parts.push(other);
                Predicate::And(parts)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Predicate) -> Self {
        match self {
            Predicate::Or(mut parts) => {
                parts.push(other);
                Predicate::Or(parts)
            }
            first => Predicate::Or(vec![first, other]),
        }
    }
}

// ── Compiled form ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    fn as_f64(self) -> f64 {
        match self {
            Numeric::Int(v) => v as f64,
            Numeric::Float(v) => v,
        }
    }
}

#[derive(Debug)]
enum Compiled<'a> {
    StrEq(&'a [String], String),
    DateEq(&'a [NaiveDate], NaiveDate),
    IntEq(&'a [i64], Numeric),
    FloatEq(&'a [f64], f64),
    Ge(&'a ColumnData, f64),
    DateRange(&'a [NaiveDate], NaiveDate, NaiveDate),
    And(Vec<Compiled<'a>>),
    Or(Vec<Compiled<'a>>),
}

impl Compiled<'_> {
    /// Boolean combinations evaluate every operand.
    fn matches(&self, row: usize) -> bool {
        match self {
            Compiled::StrEq(values, literal) => values[row] == *literal,
            Compiled::DateEq(values, literal) => values[row] == *literal,
            Compiled::IntEq(values, Numeric::Int(literal)) => values[row] == *literal,
            Compiled::IntEq(values, Numeric::Float(literal)) => values[row] as f64 == *literal,
            Compiled::FloatEq(values, literal) => values[row] == *literal,
            Compiled::Ge(data, threshold) => data.get_f64(row).is_some_and(|v| v >= *threshold),
            Compiled::DateRange(keys, start, end) => (*start..=*end).contains(&keys[row]),
            Compiled::And(parts) => parts.iter().fold(true, |acc, p| acc & p.matches(row)),
            Compiled::Or(parts) => parts.iter().fold(false, |acc, p| acc | p.matches(row)),
        }
    }
}

fn numeric_literal(value: &Value) -> Option<Numeric> {
    match value {
        Value::Int(v) => Some(Numeric::Int(*v)),
        Value::Float(v) => Some(Numeric::Float(*v)),
        _ => None,
    }
}

fn literal_mismatch(column: &str, literal: &Value, found: ColumnType) -> PipelineError {
    PipelineError::TypeMismatch {
        column: column.to_string(),
        expected: format!("column matching {} literal", literal.column_type()),
        found,
    }
}

fn compile<'a>(predicate: &Predicate, source: &'a RecordSet) -> Result<Compiled<'a>> {
    match predicate {
        Predicate::Eq { column, value } => {
            let data = &source.column(column)?.data;
            match (data, value) {
                (ColumnData::Str(values), Value::Str(s)) => Ok(Compiled::StrEq(values, s.clone())),
                (ColumnData::Date(values), Value::Date(d)) => Ok(Compiled::DateEq(values, *d)),
                (ColumnData::Int(values), literal) => numeric_literal(literal)
                    .map(|n| Compiled::IntEq(values, n))
                    .ok_or_else(|| literal_mismatch(column, value, ColumnType::Int)),
                (ColumnData::Float(values), literal) => numeric_literal(literal)
                    .map(|n| Compiled::FloatEq(values, n.as_f64()))
                    .ok_or_else(|| literal_mismatch(column, value, ColumnType::Float)),
                (data, _) => Err(literal_mismatch(column, value, data.column_type())),
            }
        }
        Predicate::Ge { column, value } => {
            let data = &source.column(column)?.data;
            let found = data.column_type();
            if !found.is_numeric() {
                return Err(PipelineError::TypeMismatch {
                    column: column.clone(),
                    expected: "numeric column".to_string(),
                    found,
                });
            }
            let threshold =
                numeric_literal(value).ok_or_else(|| literal_mismatch(column, value, found))?;
            Ok(Compiled::Ge(data, threshold.as_f64()))
        }
        Predicate::DateRange { start, end } => {
            Ok(Compiled::DateRange(source.date_keys()?, *start, *end))
        }
        Predicate::And(parts) => Ok(Compiled::And(
            parts.iter().map(|p| compile(p, source)).collect::<Result<_>>()?,
        )),
        Predicate::Or(parts) => Ok(Compiled::Or(
            parts.iter().map(|p| compile(p, source)).collect::<Result<_>>()?,
        )),
    }
}

fn select<'a>(
    source: &'a RecordSet,
    rows: impl Iterator<Item = usize>,
    predicate: &Predicate,
) -> Result<RecordView<'a>> {
    let compiled = compile(predicate, source)?;
    let matched: Vec<usize> = rows.filter(|&r| compiled.matches(r)).collect();
    debug!("Filter kept {} rows", matched.len());
    Ok(RecordView::from_rows(source, matched))
}

// ── Query ─────────────────────────────────────────────────────────────────────

/// Row selection over anything that borrows a record set.
pub trait Query<'a> {
    /// Rows satisfying `predicate`, in order, with their index entries.
    fn filter(self, predicate: &Predicate) -> Result<RecordView<'a>>;

    /// Rows whose date index falls within `[start, end]`.
    fn between(self, start: NaiveDate, end: NaiveDate) -> Result<RecordView<'a>>
    where
        Self: Sized,
    {
        self.filter(&Predicate::date_between(start, end))
    }
}

impl<'a> Query<'a> for &'a RecordSet {
    fn filter(self, predicate: &Predicate) -> Result<RecordView<'a>> {
        select(self, 0..self.len(), predicate)
    }
}

impl<'a> Query<'a> for &RecordView<'a> {
    fn filter(self, predicate: &Predicate) -> Result<RecordView<'a>> {
        select(self.source(), self.rows().iter().copied(), predicate)
    }
}
