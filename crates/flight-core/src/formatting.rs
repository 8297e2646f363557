//! Plain-text rendering of record sets, summaries and frequency tables.

use unicode_width::UnicodeWidthStr;

use crate::record_set::RecordView;
use crate::stats::{ColumnSummary, HistogramBin};

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places. `NaN` renders as `"NaN"`.
///
/// # Examples
///
/// ```
/// use flight_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by half an ULP at the target precision so exact midpoints round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // "0.50" -> ".50"
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative {
        format!("-{}", result)
    } else {
        result
    }
}

/// Render the rows of `view` as an aligned text table, index first.
///
/// Display widths account for double-width (CJK) characters.
pub fn render_table(view: &RecordView<'_>) -> String {
    let source = view.source();
    let index = source.index();

    let mut header = vec![index.name().unwrap_or("").to_string()];
    header.extend(source.column_names().into_iter().map(str::to_string));

    let mut rows = vec![header];
    for &row in view.rows() {
        let mut cells = vec![index.label(row)];
        for column in source.columns() {
            cells.push(column.data.get(row).map(|v| v.to_string()).unwrap_or_default());
        }
        rows.push(cells);
    }

    align(&rows)
}

/// Render `describe()` output, one line per statistic, one column per
/// summarised column.
pub fn render_summaries(summaries: &[ColumnSummary]) -> String {
    let mut rows = vec![{
        let mut header = vec![String::new()];
        header.extend(summaries.iter().map(|s| s.column.clone()));
        header
    }];

    let stats: [(&str, fn(&ColumnSummary) -> f64); 8] = [
        ("count", |s| s.count as f64),
        ("mean", |s| s.mean),
        ("std", |s| s.std),
        ("min", |s| s.min),
        ("25%", |s| s.p25),
        ("50%", |s| s.p50),
        ("75%", |s| s.p75),
        ("max", |s| s.max),
    ];
    for (label, get) in stats {
        let mut line = vec![label.to_string()];
        line.extend(summaries.iter().map(|s| format_number(get(s), 2)));
        rows.push(line);
    }

    align(&rows)
}

/// One `lower upper : count` line per histogram bin.
pub fn render_frequency_table(bins: &[HistogramBin]) -> String {
    bins.iter()
        .map(|b| format!("{:.1} {:.1} : {}", b.lower, b.upper, b.count))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// Right-align every cell to its column's widest display width.
fn align(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|c| UnicodeWidthStr::width(c.as_str()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    rows.iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(i, cell)| {
                    let pad = widths[i].saturating_sub(UnicodeWidthStr::width(cell.as_str()));
                    format!("{}{}", " ".repeat(pad), cell)
                })
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, ColumnData};
    use crate::record_set::RecordSet;

    // ── format_number ────────────────────────────────────────────────────────

    #[test]
    fn test_format_number_zero() {
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_number(0.0, 2), "0.00");
    }

    #[test]
    fn test_format_number_with_thousands() {
        assert_eq!(format_number(1_234.5, 1), "1,234.5");
        assert_eq!(format_number(1_000.0, 0), "1,000");
    }

    #[test]
    fn test_format_number_rounds_up() {
        assert_eq!(format_number(1.005, 2), "1.01");
    }

    #[test]
    fn test_format_number_nan() {
        assert_eq!(format_number(f64::NAN, 2), "NaN");
    }

    // ── render_table ─────────────────────────────────────────────────────────

    #[test]
    fn test_render_table_aligns_wide_headers() {
        let rs = RecordSet::new(vec![
            Column::new("旅客数", ColumnData::Int(vec![5, 150])),
            Column::new("便名", ColumnData::Str(vec!["ABC011".into(), "ABC012".into()])),
        ])
        .unwrap();
        let text = render_table(&rs.view());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        // "旅客数" is six columns wide; values are right-aligned under it.
        assert_eq!(lines[0], "   旅客数    便名");
        assert_eq!(lines[1], "0       5  ABC011");
        assert_eq!(lines[2], "1     150  ABC012");
    }

    #[test]
    fn test_render_table_uses_index_name() {
        let date = chrono::NaiveDate::from_ymd_opt(2020, 11, 1).unwrap();
        let rs = RecordSet::with_date_keys(
            "日付",
            vec![date],
            vec![Column::new("旅客数", ColumnData::Int(vec![150]))],
        )
        .unwrap();
        let text = render_table(&rs.view());
        assert!(text.starts_with("      日付  旅客数"));
        assert!(text.contains("2020-11-01     150"));
    }

    // ── render_frequency_table ───────────────────────────────────────────────

    #[test]
    fn test_render_frequency_table() {
        let bins = vec![
            HistogramBin { lower: 0.0, upper: 1.5, count: 2 },
            HistogramBin { lower: 1.5, upper: 3.0, count: 0 },
        ];
        assert_eq!(render_frequency_table(&bins), "0.0 1.5 : 2\n1.5 3.0 : 0");
    }
}
