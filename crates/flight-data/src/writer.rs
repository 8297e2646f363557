//! Spreadsheet export.

use std::path::Path;

use flight_core::{PipelineError, RecordSet, Result, RowIndex, Value};
use simple_excel_writer::{Row, Workbook};
use tracing::{debug, info};

use crate::reader::Cell;

/// Write `records` to a single-sheet workbook at `path`.
///
/// The index comes first, headed by its name (blank for a positional index);
/// dates are written as `YYYY-MM-DD`, numbers as numeric cells. `NaN` cells
/// are left blank.
pub fn export_records(records: &RecordSet, path: &Path, sheet: &str) -> Result<()> {
    let rows = to_rows(records);
    write_rows(path, sheet, &rows)?;
    info!(
        "Exported {} rows to {} (sheet '{}')",
        records.len(),
        path.display(),
        sheet
    );
    Ok(())
}

/// Header plus one row per record, index first.
pub fn to_rows(records: &RecordSet) -> Vec<Vec<Cell>> {
    let index = records.index();

    let mut header = vec![match index.name() {
        Some(name) => Cell::Text(name.to_string()),
        None => Cell::Empty,
    }];
    header.extend(records.column_names().into_iter().map(|n| Cell::Text(n.to_string())));

    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(header);
    for r in 0..records.len() {
        let mut row = vec![match index {
            RowIndex::Positional(ids) => Cell::Int(ids[r] as i64),
            RowIndex::Date { keys, .. } => Cell::Date(keys[r]),
        }];
        for column in records.columns() {
            row.push(match column.data.get(r) {
                Some(Value::Int(v)) => Cell::Int(v),
                Some(Value::Float(v)) if v.is_nan() => Cell::Empty,
                Some(Value::Float(v)) => Cell::Float(v),
                Some(Value::Str(s)) => Cell::Text(s),
                Some(Value::Date(d)) => Cell::Date(d),
                None => Cell::Empty,
            });
        }
        rows.push(row);
    }
    rows
}

/// Write raw rows to a new single-sheet workbook.
pub fn write_rows(path: &Path, sheet: &str, rows: &[Vec<Cell>]) -> Result<()> {
    write_sheets(path, &[(sheet, rows)])
}

/// Write one worksheet per `(name, rows)` pair, in order. The file is created
/// (or truncated) when the workbook is closed.
pub fn write_sheets(path: &Path, sheets: &[(&str, &[Vec<Cell>])]) -> Result<()> {
    let export_err = |source: std::io::Error| PipelineError::Export {
        path: path.to_path_buf(),
        source,
    };

    let path_str = path.to_str().ok_or_else(|| {
        export_err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "output path is not valid UTF-8",
        ))
    })?;

    let mut workbook = Workbook::create(path_str);
    for (name, rows) in sheets {
        let mut worksheet = workbook.create_sheet(name);
        workbook
            .write_sheet(&mut worksheet, |writer| {
                for cells in rows.iter() {
                    let mut row = Row::new();
                    for cell in cells {
                        match cell {
                            Cell::Empty => row.add_cell(()),
                            Cell::Int(v) => row.add_cell(*v as f64),
                            Cell::Float(v) => row.add_cell(*v),
                            Cell::Text(s) => row.add_cell(s.as_str()),
                            Cell::Date(d) => row.add_cell(d.format("%Y-%m-%d").to_string()),
                        }
                    }
                    writer.append_row(row)?;
                }
                Ok(())
            })
            .map_err(export_err)?;
        debug!("Wrote sheet '{}' ({} rows)", name, rows.len());
    }

    workbook.close().map_err(export_err)?;
    Ok(())
}
