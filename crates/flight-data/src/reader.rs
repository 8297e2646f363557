//! Workbook loading for flight-ops.
//!
//! Reads named sheets of an `.xlsx` workbook into [`RecordSet`]s. The first
//! row of a sheet is the header; every following non-empty row is a record.
//! Column types are inferred from the cells (see [`records_from_rows`]).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx, XlsxError};
use chrono::NaiveDate;
use flight_core::time_utils::parse_date;
use flight_core::{Column, ColumnData, PipelineError, RecordSet, Result};
use tracing::{debug, info};

/// Largest integer magnitude an `f64` represents exactly (2^53).
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

// ── Cell ──────────────────────────────────────────────────────────────────────

/// A spreadsheet cell after decoding, before column typing.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

impl Cell {
    fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Integral value, accepting floats with no fractional part.
    fn as_int(&self) -> Option<i64> {
        match self {
            Cell::Int(i) => Some(*i),
            Cell::Float(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_INT => Some(*f as i64),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::Text(s) => parse_date(s),
            _ => None,
        }
    }

    fn render(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Decode a calamine cell. Error cells and undecodable dates are rejected.
fn decode(data: &Data) -> std::result::Result<Cell, String> {
    let cell = match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.trim().to_string()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => Cell::Date(ndt.date()),
            None => return Err(format!("unreadable date serial {dt:?}")),
        },
        Data::DateTimeIso(s) => match parse_date(s) {
            Some(d) => Cell::Date(d),
            None => return Err(format!("unreadable ISO date '{s}'")),
        },
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => return Err(format!("error cell {e}")),
    };
    Ok(cell)
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load one sheet of the workbook at `path`.
///
/// Fails with [`PipelineError::SourceNotFound`] when the file is missing,
/// [`PipelineError::SheetNotFound`] when no sheet is called `sheet`, and
/// [`PipelineError::MalformedInput`] when the workbook cannot be read or
/// its rows are not rectangular.
pub fn load_sheet(path: &Path, sheet: &str) -> Result<RecordSet> {
    let mut sets = load_sheets(path, &[sheet])?;
    Ok(sets.remove(0))
}

/// Load several sheets from one workbook, opening the file once.
///
/// Record sets are returned in the order of `sheets`.
pub fn load_sheets<S: AsRef<str>>(path: &Path, sheets: &[S]) -> Result<Vec<RecordSet>> {
    if !path.exists() {
        return Err(PipelineError::SourceNotFound(path.to_path_buf()));
    }

    let mut workbook: Xlsx<BufReader<File>> =
        open_workbook(path).map_err(|e: XlsxError| PipelineError::MalformedInput {
            source_name: path.display().to_string(),
            detail: e.to_string(),
        })?;

    let available = workbook.sheet_names();
    debug!("Workbook {} has sheets {:?}", path.display(), available);

    let mut sets = Vec::with_capacity(sheets.len());
    for sheet in sheets {
        let sheet = sheet.as_ref();
        if !available.iter().any(|name| name == sheet) {
            return Err(PipelineError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: sheet.to_string(),
            });
        }

        let range = workbook
            .worksheet_range(sheet)
            .map_err(|e| PipelineError::MalformedInput {
                source_name: sheet.to_string(),
                detail: e.to_string(),
            })?;

        let mut rows: Vec<Vec<Cell>> = Vec::with_capacity(range.height());
        for (r, raw) in range.rows().enumerate() {
            let row = raw
                .iter()
                .enumerate()
                .map(|(c, data)| {
                    decode(data).map_err(|detail| PipelineError::MalformedInput {
                        source_name: sheet.to_string(),
                        detail: format!("row {}, column {}: {}", r + 1, c + 1, detail),
                    })
                })
                .collect::<Result<Vec<Cell>>>()?;
            rows.push(row);
        }

        let records = records_from_rows(sheet, &rows)?;
        info!(
            "Loaded sheet '{}': {} rows x {} columns",
            sheet,
            records.len(),
            records.columns().len()
        );
        sets.push(records);
    }

    Ok(sets)
}

/// Build a record set from decoded rows; the first row is the header.
///
/// Column typing, per column over all data rows:
/// * every cell integral → `Int` (whole-number floats count as integral);
/// * every cell numeric → `Float`;
/// * every cell a date (or date text) → `Date`;
/// * otherwise → `Str`, each cell rendered as text.
///
/// Fully empty rows are skipped. A row with a hole inside the header width,
/// or content beyond it, is [`PipelineError::MalformedInput`].
pub fn records_from_rows(source_name: &str, rows: &[Vec<Cell>]) -> Result<RecordSet> {
    let Some((header_row, data_rows)) = rows.split_first() else {
        return Ok(RecordSet::empty());
    };

    let width = populated_len(header_row);
    let names: Vec<String> = header_row[..width]
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell {
            Cell::Empty => format!("Unnamed: {i}"),
            other => other.render(),
        })
        .collect();

    let mut records: Vec<&[Cell]> = Vec::with_capacity(data_rows.len());
    for (r, row) in data_rows.iter().enumerate() {
        let line = r + 2;
        let len = populated_len(row);
        if len == 0 {
            debug!("{}: skipping empty row {}", source_name, line);
            continue;
        }
        if len > width {
            return Err(malformed(
                source_name,
                format!("row {line} has {len} cells, header has {width}"),
            ));
        }
        let filled = row[..len].iter().filter(|c| !c.is_empty()).count();
        if filled < width {
            return Err(malformed(
                source_name,
                format!("row {line} has {filled} of {width} cells"),
            ));
        }
        records.push(&row[..width]);
    }

    let columns = names
        .into_iter()
        .enumerate()
        .map(|(c, name)| {
            let cells: Vec<&Cell> = records.iter().map(|row| &row[c]).collect();
            Column::new(name, infer_column(&cells))
        })
        .collect();

    RecordSet::new(columns).map_err(|e| match e {
        PipelineError::MalformedInput { detail, .. } => malformed(source_name, detail),
        other => other,
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Length of `row` up to and including its last non-empty cell.
fn populated_len(row: &[Cell]) -> usize {
    row.iter().rposition(|c| !c.is_empty()).map_or(0, |i| i + 1)
}

fn malformed(source_name: &str, detail: String) -> PipelineError {
    PipelineError::MalformedInput {
        source_name: source_name.to_string(),
        detail,
    }
}

fn infer_column(cells: &[&Cell]) -> ColumnData {
    if cells.is_empty() {
        return ColumnData::Str(Vec::new());
    }
    if let Some(ints) = cells.iter().map(|c| c.as_int()).collect::<Option<Vec<_>>>() {
        return ColumnData::Int(ints);
    }
    if let Some(floats) = cells.iter().map(|c| c.as_float()).collect::<Option<Vec<_>>>() {
        return ColumnData::Float(floats);
    }
    if let Some(dates) = cells.iter().map(|c| c.as_date()).collect::<Option<Vec<_>>>() {
        return ColumnData::Date(dates);
    }
    ColumnData::Str(cells.iter().map(|c| c.render()).collect())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::write_rows;
    use flight_core::ColumnType;
    use tempfile::TempDir;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn header() -> Vec<Cell> {
        vec![text("日付"), text("旅客数"), text("貨物重量"), text("到着空港"), text("便名")]
    }

    fn flight(date: &str, pax: f64, cargo: f64, airport: &str, number: &str) -> Vec<Cell> {
        vec![
            text(date),
            Cell::Float(pax),
            Cell::Float(cargo),
            text(airport),
            text(number),
        ]
    }

    // ── records_from_rows ─────────────────────────────────────────────────────

    #[test]
    fn test_rows_and_header_preserved() {
        let rows = vec![
            header(),
            flight("2020-11-01", 120.0, 15000.0, "CTS", "ABC011"),
            flight("2020-11-01", 80.0, 9000.0, "OKA", "ABC012"),
        ];
        let rs = records_from_rows("2020年11月", &rows).unwrap();

        assert_eq!(rs.len(), 2);
        assert_eq!(rs.column_names(), vec!["日付", "旅客数", "貨物重量", "到着空港", "便名"]);
        assert_eq!(
            rs.schema().into_iter().map(|(_, t)| t).collect::<Vec<_>>(),
            vec![
                ColumnType::Date,
                ColumnType::Int,
                ColumnType::Int,
                ColumnType::Str,
                ColumnType::Str
            ]
        );
    }

    #[test]
    fn test_fractional_values_make_float_column() {
        let rows = vec![
            vec![text("w")],
            vec![Cell::Float(1.0)],
            vec![Cell::Float(2.5)],
        ];
        let rs = records_from_rows("s", &rows).unwrap();
        assert_eq!(rs.column("w").unwrap().data, ColumnData::Float(vec![1.0, 2.5]));
    }

    #[test]
    fn test_mixed_column_falls_back_to_text() {
        let rows = vec![vec![text("x")], vec![Cell::Int(1)], vec![text("a")]];
        let rs = records_from_rows("s", &rows).unwrap();
        assert_eq!(
            rs.column("x").unwrap().data,
            ColumnData::Str(vec!["1".into(), "a".into()])
        );
    }

    #[test]
    fn test_empty_rows_skipped() {
        let rows = vec![
            vec![text("a"), text("b")],
            vec![Cell::Int(1), Cell::Int(2)],
            vec![Cell::Empty, Cell::Empty],
            vec![Cell::Int(3), Cell::Int(4)],
        ];
        let rs = records_from_rows("s", &rows).unwrap();
        assert_eq!(rs.len(), 2);
    }

    #[test]
    fn test_short_row_is_malformed() {
        let rows = vec![vec![text("a"), text("b")], vec![Cell::Int(1), Cell::Empty]];
        let err = records_from_rows("s", &rows).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { ref detail, .. } if detail.contains("row 2")));
    }

    #[test]
    fn test_long_row_is_malformed() {
        let rows = vec![
            vec![text("a"), Cell::Empty],
            vec![Cell::Int(1), Cell::Int(2)],
        ];
        let err = records_from_rows("s", &rows).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { .. }));
    }

    #[test]
    fn test_duplicate_header_is_malformed() {
        let rows = vec![vec![text("a"), text("a")], vec![Cell::Int(1), Cell::Int(2)]];
        let err = records_from_rows("sheet", &rows).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { ref source_name, .. } if source_name == "sheet"));
    }

    #[test]
    fn test_blank_header_named_unnamed() {
        let rows = vec![vec![Cell::Empty, text("b")], vec![Cell::Int(1), Cell::Int(2)]];
        let rs = records_from_rows("s", &rows).unwrap();
        assert_eq!(rs.column_names(), vec!["Unnamed: 0", "b"]);
    }

    #[test]
    fn test_header_only_sheet() {
        let rs = records_from_rows("s", &[header()]).unwrap();
        assert!(rs.is_empty());
        assert_eq!(rs.column_names().len(), 5);
    }

    // ── load_sheet ────────────────────────────────────────────────────────────

    #[test]
    fn test_load_missing_file() {
        let err = load_sheet(Path::new("/nonexistent/sample.xlsx"), "2020年11月").unwrap_err();
        assert!(matches!(err, PipelineError::SourceNotFound(_)));
    }

    #[test]
    fn test_load_round_trip_through_workbook() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("sample.xlsx");
        let rows = vec![
            header(),
            flight("2020-11-01", 120.0, 15000.0, "CTS", "ABC011"),
            flight("2020-11-02", 80.0, 9000.0, "OKA", "ABC012"),
            flight("2020-11-02", 95.0, 11000.0, "HIJ", "ABC013"),
        ];
        write_rows(&path, "2020年11月", &rows).expect("write fixture");

        let rs = load_sheet(&path, "2020年11月").unwrap();
        assert_eq!(rs.len(), 3);
        assert_eq!(rs.column("旅客数").unwrap().data, ColumnData::Int(vec![120, 80, 95]));
        assert_eq!(rs.column("日付").unwrap().column_type(), ColumnType::Date);
        assert_eq!(
            rs.column("便名").unwrap().data,
            ColumnData::Str(vec!["ABC011".into(), "ABC012".into(), "ABC013".into()])
        );
    }

    #[test]
    fn test_load_unknown_sheet() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("sample.xlsx");
        write_rows(&path, "2020年11月", &[header()]).expect("write fixture");

        let err = load_sheet(&path, "2020年12月").unwrap_err();
        assert!(matches!(err, PipelineError::SheetNotFound { ref sheet, .. } if sheet == "2020年12月"));
    }

    #[test]
    fn test_load_non_workbook_is_malformed() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("sample.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();

        let err = load_sheet(&path, "2020年11月").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { .. }));
    }
}
