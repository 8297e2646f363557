use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Date parsing ──────────────────────────────────────────────────────────────

/// Parse a date written as text. Datetime forms keep only the date part.
///
/// Returns `None` for empty strings or unrecognised formats.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    const DATE_FMTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    const DATETIME_FMTS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y/%m/%d %H:%M:%S",
    ];
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    None
}

/// Last calendar day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

// ── Frequency ─────────────────────────────────────────────────────────────────

/// Width of a resampling bucket.
///
/// Buckets are labelled by their closing date: a day by itself, a week
/// by the anchor weekday that closes it, a month by its last day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Day,
    /// Week closing on (and including) the given weekday.
    Week(Weekday),
    Month,
}

impl Frequency {
    /// Label of the bucket `date` falls into.
    pub fn bucket_label(self, date: NaiveDate) -> NaiveDate {
        match self {
            Frequency::Day => date,
            Frequency::Week(anchor) => {
                let ahead = (7 + anchor.num_days_from_monday()
                    - date.weekday().num_days_from_monday())
                    % 7;
                date.checked_add_days(Days::new(u64::from(ahead)))
                    .unwrap_or(NaiveDate::MAX)
            }
            Frequency::Month => month_end(date),
        }
    }

    /// Label of the bucket following the one labelled `label`.
    pub fn next_label(self, label: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Day => label.succ_opt(),
            Frequency::Week(_) => label.checked_add_days(Days::new(7)),
            Frequency::Month => label.succ_opt().map(month_end),
        }
    }

    /// Every bucket label from the bucket of `first` through the bucket of
    /// `last`, inclusive, with no gaps.
    pub fn labels_between(self, first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
        let end = self.bucket_label(last);
        let mut labels = Vec::new();
        let mut current = Some(self.bucket_label(first));
        while let Some(label) = current {
            if label > end {
                break;
            }
            labels.push(label);
            current = self.next_label(label);
        }
        labels
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Day => f.write_str("D"),
            Frequency::Week(anchor) => write!(f, "W-{}", anchor.to_string().to_uppercase()),
            Frequency::Month => f.write_str("M"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2020-11-01"), Some(d(2020, 11, 1)));
        assert_eq!(parse_date("2020/12/05"), Some(d(2020, 12, 5)));
        assert_eq!(parse_date("2020-11-01T08:30:00"), Some(d(2020, 11, 1)));
        assert_eq!(parse_date("2020-11-01 00:00:00"), Some(d(2020, 11, 1)));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("CTS"), None);
    }

    #[test]
    fn test_month_end() {
        assert_eq!(month_end(d(2020, 11, 15)), d(2020, 11, 30));
        assert_eq!(month_end(d(2020, 12, 1)), d(2020, 12, 31));
        assert_eq!(month_end(d(2020, 2, 3)), d(2020, 2, 29));
    }

    #[test]
    fn test_week_label_sunday_rolls_to_next_monday() {
        // 2020-11-01 is a Sunday, 2020-11-02 a Monday.
        let week = Frequency::Week(Weekday::Mon);
        assert_eq!(week.bucket_label(d(2020, 11, 1)), d(2020, 11, 2));
    }

    #[test]
    fn test_week_label_anchor_day_is_its_own_bucket() {
        let week = Frequency::Week(Weekday::Mon);
        assert_eq!(week.bucket_label(d(2020, 11, 2)), d(2020, 11, 2));
        assert_eq!(week.bucket_label(d(2020, 11, 3)), d(2020, 11, 9));
    }

    #[test]
    fn test_labels_between_covers_gaps() {
        let labels = Frequency::Day.labels_between(d(2020, 11, 29), d(2020, 12, 2));
        assert_eq!(
            labels,
            vec![d(2020, 11, 29), d(2020, 11, 30), d(2020, 12, 1), d(2020, 12, 2)]
        );

        let months = Frequency::Month.labels_between(d(2020, 11, 1), d(2021, 1, 10));
        assert_eq!(months, vec![d(2020, 11, 30), d(2020, 12, 31), d(2021, 1, 31)]);

        let weeks = Frequency::Week(Weekday::Mon).labels_between(d(2020, 11, 1), d(2020, 11, 16));
        assert_eq!(weeks, vec![d(2020, 11, 2), d(2020, 11, 9), d(2020, 11, 16)]);
    }

    #[test]
    fn test_frequency_display() {
        assert_eq!(Frequency::Day.to_string(), "D");
        assert_eq!(Frequency::Week(Weekday::Mon).to_string(), "W-MON");
        assert_eq!(Frequency::Month.to_string(), "M");
    }
}
