//! Row-wise concatenation of record sets.

use std::collections::BTreeSet;

use flight_core::{Column, ColumnData, ColumnType, PipelineError, RecordSet, Result, RowIndex};
use tracing::debug;

/// Concatenate `sets` top to bottom into a positionally indexed record set.
///
/// Rows keep their input order; row identifiers are reassigned `0..n` and any
/// date index on the inputs is discarded. Column order follows the first set.
/// An `Int` and a `Float` column of the same name combine as `Float`.
///
/// Fails with [`PipelineError::SchemaMismatch`] when the sets do not share the
/// same column names, or a column's types cannot be reconciled.
pub fn concat(sets: &[RecordSet]) -> Result<RecordSet> {
    let Some(first) = sets.first() else {
        return Ok(RecordSet::empty());
    };

    let expected: BTreeSet<&str> = first.column_names().into_iter().collect();
    for (i, set) in sets.iter().enumerate().skip(1) {
        let names: BTreeSet<&str> = set.column_names().into_iter().collect();
        if names != expected {
            let missing: Vec<&str> = expected.difference(&names).copied().collect();
            let extra: Vec<&str> = names.difference(&expected).copied().collect();
            return Err(PipelineError::SchemaMismatch(format!(
                "record set {i} differs from record set 0 (missing {missing:?}, extra {extra:?})"
            )));
        }
    }

    let mut columns = Vec::with_capacity(first.columns().len());
    for column in first.columns() {
        let name = column.name.as_str();
        let parts: Vec<&ColumnData> = sets
            .iter()
            .map(|s| s.column(name).map(|c| &c.data))
            .collect::<Result<_>>()?;
        columns.push(Column::new(name, stack(name, &parts)?));
    }

    let total = sets.iter().map(RecordSet::len).sum();
    let combined = RecordSet::with_row_index(columns, RowIndex::sequential(total))?;
    debug!(
        "Concatenated {} record sets into {} rows",
        sets.len(),
        combined.len()
    );
    Ok(combined)
}

/// Stack same-named columns, widening to `Float` when integer and float
/// parts meet.
fn stack(name: &str, parts: &[&ColumnData]) -> Result<ColumnData> {
    let types: BTreeSet<ColumnType> = parts.iter().map(|p| p.column_type()).collect();
    let target = match types.len() {
        1 => parts[0].column_type(),
        _ if types.iter().all(|t| t.is_numeric()) => ColumnType::Float,
        _ => {
            return Err(PipelineError::SchemaMismatch(format!(
                "column '{name}' has incompatible types {types:?}"
            )))
        }
    };

    let mut stacked = ColumnData::empty(target);
    for part in parts {
        let piece = if target == ColumnType::Float {
            (*part).clone().widen_to_float()
        } else {
            Some((*part).clone())
        };
        let appended = piece.map(|p| stacked.append(p)).unwrap_or(false);
        if !appended {
            return Err(PipelineError::SchemaMismatch(format!(
                "column '{name}' could not be stacked as {target}"
            )));
        }
    }
    Ok(stacked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Predicate, Query};
    use chrono::NaiveDate;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, m, day).unwrap()
    }

    fn month(m: u32, airports: &[&str], cargo: ColumnData) -> RecordSet {
        let n = airports.len();
        RecordSet::new(vec![
            Column::new("日付", ColumnData::Date((1..=n as u32).map(|day| d(m, day)).collect())),
            Column::new("旅客数", ColumnData::Int((0..n as i64).map(|i| 100 + i * 10).collect())),
            Column::new("貨物重量", cargo),
            Column::new(
                "到着空港",
                ColumnData::Str(airports.iter().map(|s| s.to_string()).collect()),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_concat_preserves_order_and_reindexes() {
        let nov = month(11, &["CTS", "OKA"], ColumnData::Float(vec![1.0, 2.0]));
        let dec = month(12, &["HIJ"], ColumnData::Float(vec![3.0]));
        let combined = concat(&[nov, dec]).unwrap();

        assert_eq!(combined.len(), 3);
        assert_eq!(combined.index(), &RowIndex::Positional(vec![0, 1, 2]));
        assert_eq!(
            combined.column("到着空港").unwrap().data,
            ColumnData::Str(vec!["CTS".into(), "OKA".into(), "HIJ".into()])
        );
    }

    #[test]
    fn test_concat_widens_int_and_float() {
        let nov = month(11, &["CTS"], ColumnData::Float(vec![1.5]));
        let dec = month(12, &["HIJ"], ColumnData::Int(vec![3]));
        let combined = concat(&[nov, dec]).unwrap();
        assert_eq!(
            combined.column("貨物重量").unwrap().data,
            ColumnData::Float(vec![1.5, 3.0])
        );
    }

    #[test]
    fn test_concat_aligns_columns_by_name() {
        let a = RecordSet::new(vec![
            Column::new("x", ColumnData::Int(vec![1])),
            Column::new("y", ColumnData::Int(vec![2])),
        ])
        .unwrap();
        let b = RecordSet::new(vec![
            Column::new("y", ColumnData::Int(vec![20])),
            Column::new("x", ColumnData::Int(vec![10])),
        ])
        .unwrap();
        let combined = concat(&[a, b]).unwrap();
        assert_eq!(combined.column_names(), vec!["x", "y"]);
        assert_eq!(combined.column("x").unwrap().data, ColumnData::Int(vec![1, 10]));
    }

    #[test]
    fn test_concat_rejects_differing_columns() {
        let a = RecordSet::new(vec![Column::new("x", ColumnData::Int(vec![1]))]).unwrap();
        let b = RecordSet::new(vec![Column::new("z", ColumnData::Int(vec![1]))]).unwrap();
        assert!(matches!(
            concat(&[a, b]).unwrap_err(),
            PipelineError::SchemaMismatch(_)
        ));
    }

    #[test]
    fn test_concat_rejects_text_and_number() {
        let a = RecordSet::new(vec![Column::new("x", ColumnData::Int(vec![1]))]).unwrap();
        let b = RecordSet::new(vec![Column::new("x", ColumnData::Str(vec!["a".into()]))]).unwrap();
        assert!(matches!(
            concat(&[a, b]).unwrap_err(),
            PipelineError::SchemaMismatch(_)
        ));
    }

    #[test]
    fn test_concat_discards_date_index() {
        let nov = month(11, &["CTS"], ColumnData::Float(vec![1.0]))
            .with_index("日付")
            .unwrap();
        let combined = concat(&[nov.clone(), nov]).unwrap();
        assert_eq!(combined.index(), &RowIndex::Positional(vec![0, 1]));
        assert!(combined.column("日付").is_err());
    }

    #[test]
    fn test_concat_counts_rows_without_body_columns() {
        let only_dates = |m| {
            RecordSet::with_date_keys("日付", vec![d(m, 1), d(m, 2)], Vec::new()).unwrap()
        };
        let combined = concat(&[only_dates(11), only_dates(12)]).unwrap();
        assert_eq!(combined.len(), 4);
        assert_eq!(combined.index(), &RowIndex::Positional(vec![0, 1, 2, 3]));
    }

    #[test]
    fn test_concat_empty_list() {
        assert!(concat(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_filter_commutes_with_concat() {
        let nov = month(11, &["CTS", "OKA", "CTS"], ColumnData::Float(vec![1.0, 2.0, 3.0]));
        let dec = month(12, &["OKA", "CTS"], ColumnData::Float(vec![4.0, 5.0]));
        let p = Predicate::eq("到着空港", "CTS");

        let combined = concat(&[nov.clone(), dec.clone()]).unwrap();
        let filtered_after = combined.filter(&p).unwrap().materialize();

        let nov_cts = nov.filter(&p).unwrap().materialize();
        let dec_cts = dec.filter(&p).unwrap().materialize();
        let filtered_before = concat(&[nov_cts, dec_cts]).unwrap();

        assert_eq!(filtered_after.columns(), filtered_before.columns());
        assert_eq!(filtered_before.len(), 3);
    }
}
