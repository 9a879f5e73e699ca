use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, ScrapeError};

/// An inclusive period of calendar days. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ScrapeError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// `20020101-20221231`, the form used in output file names.
    pub fn compact(&self) -> String {
        format!(
            "{}-{}",
            self.start.format("%Y%m%d"),
            self.end.format("%Y%m%d")
        )
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y%m%d"),
            self.end.format("%Y%m%d")
        )
    }
}

/// A sub-range that never crosses a month boundary. Only `partition` builds these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyChunk(DateRange);

impl MonthlyChunk {
    pub fn start(&self) -> NaiveDate {
        self.0.start
    }

    pub fn end(&self) -> NaiveDate {
        self.0.end
    }
}

impl fmt::Display for MonthlyChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// `None` only for the last month chrono can represent.
pub fn first_day_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// The last day of a month is the day before the first day of the next month.
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    match first_day_of_next_month(date).and_then(|next| next.pred_opt()) {
        Some(last) => last,
        // The month without a successor ends on the last representable day.
        None => NaiveDate::MAX,
    }
}

/// Splits `range` into consecutive calendar-month chunks in ascending order.
///
/// The first chunk starts at `range.start()` and the last ends at `range.end()`;
/// every chunk in between covers a whole month.
pub fn partition(range: &DateRange) -> Vec<MonthlyChunk> {
    let mut chunks = Vec::new();
    let mut cursor = range.start;

    while cursor <= range.end {
        let end = last_day_of_month(cursor).min(range.end);
        chunks.push(MonthlyChunk(DateRange { start: cursor, end }));

        match first_day_of_next_month(cursor) {
            Some(next_month) => cursor = next_month,
            None => break,
        }
    }

    chunks
}
