//! Column-major record sets and borrowed row views.
//!
//! A [`RecordSet`] owns its columns and a [`RowIndex`]. Filters produce
//! [`RecordView`]s that reference rows of the source by position instead of
//! copying them; [`RecordView::materialize`] turns a view into an owned set.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::models::{Column, ColumnData, ColumnType, Value};

// ── RowIndex ──────────────────────────────────────────────────────────────────

/// The ordering/lookup key of a record set.
#[derive(Debug, Clone, PartialEq)]
pub enum RowIndex {
    /// Sequential row identifiers, assigned on load/combine and carried
    /// through filters.
    Positional(Vec<usize>),
    /// A date column promoted to be the key. Dates may repeat.
    Date { name: String, keys: Vec<NaiveDate> },
}

impl RowIndex {
    /// Positional identifiers `0..len`.
    pub fn sequential(len: usize) -> Self {
        RowIndex::Positional((0..len).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            RowIndex::Positional(ids) => ids.len(),
            RowIndex::Date { keys, .. } => keys.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Label of the index as shown in exports and tables.
    pub fn name(&self) -> Option<&str> {
        match self {
            RowIndex::Positional(_) => None,
            RowIndex::Date { name, .. } => Some(name),
        }
    }

    /// Display label for the key at `row`.
    pub fn label(&self, row: usize) -> String {
        match self {
            RowIndex::Positional(ids) => ids[row].to_string(),
            RowIndex::Date { keys, .. } => keys[row].format("%Y-%m-%d").to_string(),
        }
    }

    fn take(&self, rows: &[usize]) -> RowIndex {
        match self {
            RowIndex::Positional(ids) => RowIndex::Positional(rows.iter().map(|&r| ids[r]).collect()),
            RowIndex::Date { name, keys } => RowIndex::Date {
                name: name.clone(),
                keys: rows.iter().map(|&r| keys[r]).collect(),
            },
        }
    }
}

// ── RecordSet ─────────────────────────────────────────────────────────────────

/// An ordered collection of uniformly-columned rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet {
    columns: Vec<Column>,
    index: RowIndex,
}

impl RecordSet {
    /// Build a positionally indexed record set (`0..n`), taking `n` from the
    /// first column. Use [`RecordSet::with_row_index`] when there may be no
    /// columns.
    ///
    /// Fails with [`PipelineError::MalformedInput`] when column lengths differ
    /// or a name repeats.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let len = columns.first().map_or(0, Column::len);
        Self::with_row_index(columns, RowIndex::sequential(len))
    }

    /// Build a record set keyed by `keys`, labelled `name`.
    pub fn with_date_keys(
        name: impl Into<String>,
        keys: Vec<NaiveDate>,
        columns: Vec<Column>,
    ) -> Result<Self> {
        let index = RowIndex::Date {
            name: name.into(),
            keys,
        };
        Self::with_row_index(columns, index)
    }

    /// Build a record set from parts, validating that every column matches
    /// the index length and that names are unique.
    pub fn with_row_index(columns: Vec<Column>, index: RowIndex) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(PipelineError::MalformedInput {
                    source_name: "record set".to_string(),
                    detail: format!("duplicate column name '{}'", column.name),
                });
            }
            if column.len() != index.len() {
                return Err(PipelineError::MalformedInput {
                    source_name: "record set".to_string(),
                    detail: format!(
                        "column '{}' has {} rows, index has {}",
                        column.name,
                        column.len(),
                        index.len()
                    ),
                });
            }
        }
        Ok(Self { columns, index })
    }

    /// A record set with no columns and no rows.
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            index: RowIndex::Positional(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn index(&self) -> &RowIndex {
        &self.index
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Column names paired with their declared types, in column order.
    pub fn schema(&self) -> Vec<(&str, ColumnType)> {
        self.columns
            .iter()
            .map(|c| (c.name.as_str(), c.column_type()))
            .collect()
    }

    /// Position of `name` among the columns.
    pub fn position(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| PipelineError::ColumnNotFound(name.to_string()))
    }

    /// Resolve `name` to its column.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.position(name).map(|i| &self.columns[i])
    }

    /// Cell at (`row`, `column`).
    pub fn value(&self, row: usize, column: &str) -> Result<Option<Value>> {
        Ok(self.column(column)?.data.get(row))
    }

    /// The date keys, or [`PipelineError::NotDateIndexed`].
    pub fn date_keys(&self) -> Result<&[NaiveDate]> {
        match &self.index {
            RowIndex::Date { keys, .. } => Ok(keys),
            RowIndex::Positional(_) => Err(PipelineError::NotDateIndexed),
        }
    }

    /// Split into columns and index.
    pub fn into_parts(self) -> (Vec<Column>, RowIndex) {
        (self.columns, self.index)
    }

    // ── Normalizer ────────────────────────────────────────────────────────────

    /// Rewrite every value of `column` as floating point.
    ///
    /// Integers are widened exactly; text cells must parse as numbers.
    /// A column that is already `Float` is left unchanged.
    pub fn to_float(&mut self, column: &str) -> Result<()> {
        let pos = self.position(column)?;
        let target = &mut self.columns[pos];

        let widened = match std::mem::replace(&mut target.data, ColumnData::Float(Vec::new())) {
            ColumnData::Int(values) => ColumnData::Float(values.into_iter().map(|v| v as f64).collect()),
            ColumnData::Float(values) => ColumnData::Float(values),
            ColumnData::Str(values) => {
                let parsed: Vec<Option<f64>> =
                    values.iter().map(|raw| raw.trim().parse::<f64>().ok()).collect();
                if let Some(row) = parsed.iter().position(Option::is_none) {
                    let value = values[row].clone();
                    target.data = ColumnData::Str(values);
                    return Err(PipelineError::TypeCoercionError {
                        column: column.to_string(),
                        row,
                        value,
                    });
                }
                ColumnData::Float(parsed.into_iter().flatten().collect())
            }
            ColumnData::Date(values) => {
                let value = values
                    .first()
                    .map(|d| d.to_string())
                    .unwrap_or_default();
                target.data = ColumnData::Date(values);
                return Err(PipelineError::TypeCoercionError {
                    column: column.to_string(),
                    row: 0,
                    value,
                });
            }
        };

        target.data = widened;
        debug!("Normalized column '{}' to float", column);
        Ok(())
    }

    // ── Indexer ───────────────────────────────────────────────────────────────

    /// Return a copy of this record set keyed by the date column `column`.
    ///
    /// The column moves out of the row body into the index. Any previous
    /// index is discarded.
    pub fn with_index(&self, column: &str) -> Result<RecordSet> {
        let mut indexed = self.clone();
        indexed.set_index(column)?;
        Ok(indexed)
    }

    /// Promote the date column `column` to the index, in place.
    ///
    /// On error the record set is left unchanged.
    pub fn set_index(&mut self, column: &str) -> Result<()> {
        let pos = self.position(column)?;
        let found = self.columns[pos].column_type();
        if found != ColumnType::Date {
            return Err(PipelineError::TypeMismatch {
                column: column.to_string(),
                expected: "date column".to_string(),
                found,
            });
        }

        let removed = self.columns.remove(pos);
        let ColumnData::Date(keys) = removed.data else {
            unreachable!("column type checked above");
        };
        self.index = RowIndex::Date {
            name: removed.name,
            keys,
        };
        debug!("Indexed {} rows by '{}'", self.len(), column);
        Ok(())
    }

    // ── Views ─────────────────────────────────────────────────────────────────

    /// A view over every row.
    pub fn view(&self) -> RecordView<'_> {
        RecordView::from_rows(self, (0..self.len()).collect())
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> RecordView<'_> {
        RecordView::from_rows(self, (0..n.min(self.len())).collect())
    }

    /// The last `n` rows.
    pub fn tail(&self, n: usize) -> RecordView<'_> {
        let start = self.len().saturating_sub(n);
        RecordView::from_rows(self, (start..self.len()).collect())
    }

    /// Owned copy of the rows at `rows`, keeping their index entries.
    pub fn take(&self, rows: &[usize]) -> RecordSet {
        RecordSet {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.data.take(rows)))
                .collect(),
            index: self.index.take(rows),
        }
    }
}

// ── RecordView ────────────────────────────────────────────────────────────────

/// A read-only subset of a record set's rows, in source order.
#[derive(Debug, Clone)]
pub struct RecordView<'a> {
    source: &'a RecordSet,
    rows: Vec<usize>,
}

impl<'a> RecordView<'a> {
    /// Wrap row positions of `source`. Positions must be in range.
    pub fn from_rows(source: &'a RecordSet, rows: Vec<usize>) -> Self {
        debug_assert!(rows.iter().all(|&r| r < source.len()));
        Self { source, rows }
    }

    pub fn source(&self) -> &'a RecordSet {
        self.source
    }

    /// Row positions into the source.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The first `n` rows of the view.
    pub fn head(&self, n: usize) -> RecordView<'a> {
        let end = n.min(self.rows.len());
        RecordView::from_rows(self.source, self.rows[..end].to_vec())
    }

    /// The last `n` rows of the view.
    pub fn tail(&self, n: usize) -> RecordView<'a> {
        let start = self.rows.len().saturating_sub(n);
        RecordView::from_rows(self.source, self.rows[start..].to_vec())
    }

    /// Values of `column` for the rows in this view.
    pub fn values(&self, column: &str) -> Result<Vec<Value>> {
        let col = self.source.column(column)?;
        Ok(self.rows.iter().filter_map(|&r| col.data.get(r)).collect())
    }

    /// Copy the viewed rows into an owned record set.
    pub fn materialize(&self) -> RecordSet {
        self.source.take(&self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample() -> RecordSet {
        RecordSet::new(vec![
            Column::new("日付", ColumnData::Date(vec![d(2020, 11, 1), d(2020, 11, 1), d(2020, 11, 2)])),
            Column::new("旅客数", ColumnData::Int(vec![100, 50, 30])),
            Column::new("貨物重量", ColumnData::Int(vec![12000, 8000, 5000])),
            Column::new(
                "到着空港",
                ColumnData::Str(vec!["CTS".into(), "HIJ".into(), "OKA".into()]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_assigns_positional_index() {
        let rs = sample();
        assert_eq!(rs.len(), 3);
        assert_eq!(rs.index(), &RowIndex::Positional(vec![0, 1, 2]));
        assert_eq!(rs.column_names(), vec!["日付", "旅客数", "貨物重量", "到着空港"]);
    }

    #[test]
    fn test_new_rejects_ragged_columns() {
        let err = RecordSet::new(vec![
            Column::new("a", ColumnData::Int(vec![1, 2])),
            Column::new("b", ColumnData::Int(vec![1])),
        ])
        .unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { .. }));
    }

    #[test]
    fn test_new_rejects_duplicate_names() {
        let err = RecordSet::new(vec![
            Column::new("a", ColumnData::Int(vec![1])),
            Column::new("a", ColumnData::Int(vec![2])),
        ])
        .unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { .. }));
    }

    #[test]
    fn test_column_lookup_missing() {
        let rs = sample();
        let err = rs.column("便名").unwrap_err();
        assert!(matches!(err, PipelineError::ColumnNotFound(name) if name == "便名"));
    }

    // ── to_float ──────────────────────────────────────────────────────────────

    #[test]
    fn test_to_float_widens_integers_exactly() {
        let mut rs = sample();
        rs.to_float("貨物重量").unwrap();
        let col = rs.column("貨物重量").unwrap();
        assert_eq!(col.data, ColumnData::Float(vec![12000.0, 8000.0, 5000.0]));
    }

    #[test]
    fn test_to_float_is_idempotent() {
        let mut once = sample();
        once.to_float("貨物重量").unwrap();
        let mut twice = once.clone();
        twice.to_float("貨物重量").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_to_float_parses_numeric_text() {
        let mut rs = RecordSet::new(vec![Column::new(
            "w",
            ColumnData::Str(vec!["1.5".into(), " 2 ".into()]),
        )])
        .unwrap();
        rs.to_float("w").unwrap();
        assert_eq!(rs.column("w").unwrap().data, ColumnData::Float(vec![1.5, 2.0]));
    }

    #[test]
    fn test_to_float_rejects_text_and_leaves_column_intact() {
        let mut rs = sample();
        let err = rs.to_float("到着空港").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::TypeCoercionError { ref column, row: 0, ref value }
                if column == "到着空港" && value == "CTS"
        ));
        assert_eq!(rs.column("到着空港").unwrap().column_type(), ColumnType::Str);
    }

    #[test]
    fn test_to_float_missing_column() {
        let mut rs = sample();
        assert!(matches!(
            rs.to_float("重量").unwrap_err(),
            PipelineError::ColumnNotFound(_)
        ));
    }

    // ── indexing ──────────────────────────────────────────────────────────────

    #[test]
    fn test_with_index_is_pure() {
        let rs = sample();
        let indexed = rs.with_index("日付").unwrap();

        assert_eq!(rs.column_names().len(), 4);
        assert_eq!(indexed.column_names(), vec!["旅客数", "貨物重量", "到着空港"]);
        assert_eq!(indexed.index().name(), Some("日付"));
        assert_eq!(
            indexed.date_keys().unwrap(),
            &[d(2020, 11, 1), d(2020, 11, 1), d(2020, 11, 2)]
        );
    }

    #[test]
    fn test_set_index_matches_with_index() {
        let rs = sample();
        let pure = rs.with_index("日付").unwrap();
        let mut mutated = rs.clone();
        mutated.set_index("日付").unwrap();
        assert_eq!(pure, mutated);
    }

    #[test]
    fn test_set_index_twice_fails_column_not_found() {
        let mut rs = sample();
        rs.set_index("日付").unwrap();
        assert!(matches!(
            rs.set_index("日付").unwrap_err(),
            PipelineError::ColumnNotFound(_)
        ));
    }

    #[test]
    fn test_set_index_requires_date_column() {
        let mut rs = sample();
        let err = rs.set_index("旅客数").unwrap_err();
        assert!(matches!(err, PipelineError::TypeMismatch { found: ColumnType::Int, .. }));
        assert!(rs.date_keys().is_err());
    }

    // ── views ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_head_and_tail() {
        let rs = sample();
        assert_eq!(rs.head(2).rows(), &[0, 1]);
        assert_eq!(rs.tail(2).rows(), &[1, 2]);
        assert_eq!(rs.head(10).len(), 3);
        assert_eq!(rs.tail(0).len(), 0);
    }

    #[test]
    fn test_materialize_keeps_row_ids() {
        let rs = sample();
        let view = RecordView::from_rows(&rs, vec![2, 0]);
        let owned = view.materialize();
        assert_eq!(owned.index(), &RowIndex::Positional(vec![2, 0]));
        assert_eq!(owned.column("旅客数").unwrap().data, ColumnData::Int(vec![30, 100]));
    }

    #[test]
    fn test_view_values() {
        let rs = sample();
        let view = rs.tail(1);
        assert_eq!(view.values("到着空港").unwrap(), vec![Value::from("OKA")]);
    }
}
