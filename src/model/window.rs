use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};

/// Inclusive range of calendar dates requested from the remote source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// First through last day of the month containing `anchor`.
    pub fn month_of(anchor: NaiveDate) -> Self {
        let start = anchor.with_day(1).unwrap_or(anchor);
        let next_month = if start.month() == 12 {
            NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
        };
        let end = next_month
            .map(|d| d - Duration::days(1))
            .unwrap_or(start);
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}
