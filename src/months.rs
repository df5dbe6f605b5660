//! Calendar arithmetic for the ingestion window.
//!
//! A run covers an inclusive [`DateRange`]; the remote dataset is published
//! one file per calendar month, so the range is expanded into [`MonthKey`]s.

use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDate};
use std::fmt;

/// Date format used by configuration values (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// An inclusive pair of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            bail!("start date {start} is after end date {end}");
        }
        Ok(Self { start, end })
    }

    /// Parses two `YYYY-MM-DD` strings into a range.
    ///
    /// # Errors
    ///
    /// Returns an error if either string is not a valid date or if the start
    /// date falls after the end date.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start = NaiveDate::parse_from_str(start.trim(), DATE_FORMAT)
            .with_context(|| format!("invalid start date '{start}', expected YYYY-MM-DD"))?;
        let end = NaiveDate::parse_from_str(end.trim(), DATE_FORMAT)
            .with_context(|| format!("invalid end date '{end}', expected YYYY-MM-DD"))?;
        Self::new(start, end)
    }

    /// Months overlapping this range, ascending.
    pub fn months(&self) -> Vec<MonthKey> {
        enumerate_months(self.start, self.end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// One calendar month. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Returns `None` unless `month` is in `1..=12`.
    pub fn from_ym_opt(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Month of the year, `1..=12`.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The following calendar month.
    pub fn succ(self) -> Self {
        if self.month >= 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Returns one [`MonthKey`] per calendar month from the month of `start`
/// through the month of `end`, inclusive and ascending.
///
/// Day-of-month is ignored. When `start` is after `end` the result is empty
/// rather than an error; [`DateRange::new`] is where reversed ranges are
/// rejected.
pub fn enumerate_months(start: NaiveDate, end: NaiveDate) -> Vec<MonthKey> {
    let last = MonthKey::of(end);
    let mut current = MonthKey::of(start);
    let mut months = Vec::new();

    while current <= last {
        months.push(current);
        current = current.succ();
    }

    months
}
