//! Calendar month arithmetic for aggregation periods and trend windows.

use std::fmt::Display;

use serde::Serialize;
use time::{Date, Month};

use crate::Error;

/// The canonical key for a calendar month.
///
/// Used to match transactions to monthly buckets. Unlike display labels, keys
/// are unique across years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MonthKey {
    /// The calendar year.
    pub year: i32,
    /// The month number, 1-12.
    pub month: u8,
}

impl MonthKey {
    /// The key of the month that `date` falls in.
    pub fn of(date: Date) -> Self {
        Self {
            year: date.year(),
            month: u8::from(date.month()),
        }
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    /// The first date in the range.
    pub start: Date,
    /// The last date in the range.
    pub end: Date,
}

impl DateRange {
    /// Whether `date` falls within the range, including both ends.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// A calendar month, the unit of aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    first_day: Date,
    last_day: Date,
}

impl Period {
    /// Create the period for `month` (1-12) of `year`.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidMonth] if `month` is not in 1-12, or
    /// [Error::InvalidPeriod] if the year is outside the supported calendar range.
    pub fn new(year: i32, month: u8) -> Result<Self, Error> {
        let calendar_month = Month::try_from(month).map_err(|_| Error::InvalidMonth(month))?;
        let invalid_period = |_| Error::InvalidPeriod { year, month };

        let first_day = Date::from_calendar_date(year, calendar_month, 1).map_err(invalid_period)?;
        let last_day = Date::from_calendar_date(
            year,
            calendar_month,
            last_day_of_month(year, calendar_month),
        )
        .map_err(invalid_period)?;

        Ok(Self {
            first_day,
            last_day,
        })
    }

    /// The period that contains `date`.
    pub fn containing(date: Date) -> Result<Self, Error> {
        Self::new(date.year(), u8::from(date.month()))
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    /// The calendar month.
    pub fn month(&self) -> Month {
        self.first_day.month()
    }

    /// The first day of the month.
    pub fn first_day(&self) -> Date {
        self.first_day
    }

    /// The last day of the month.
    pub fn last_day(&self) -> Date {
        self.last_day
    }

    /// The whole month as an inclusive date range.
    pub fn date_range(&self) -> DateRange {
        DateRange {
            start: self.first_day,
            end: self.last_day,
        }
    }

    /// Whether `date` falls in this month.
    pub fn contains(&self, date: Date) -> bool {
        self.date_range().contains(date)
    }

    /// The canonical lookup key for this month.
    pub fn key(&self) -> MonthKey {
        MonthKey::of(self.first_day)
    }

    /// A human-readable label, e.g. "2025年1月".
    ///
    /// Labels are for display only, use [Period::key] for lookups.
    pub fn label(&self) -> String {
        format!("{}年{}月", self.year(), u8::from(self.month()))
    }

    /// The month immediately before this one, rolling over to December of the
    /// previous year.
    pub fn previous(&self) -> Result<Self, Error> {
        self.months_back(1)
    }

    /// The month `count` months before this one.
    pub fn months_back(&self, count: u32) -> Result<Self, Error> {
        let index = i64::from(self.year()) * 12 + i64::from(u8::from(self.month())) - 1
            - i64::from(count);
        let year = i32::try_from(index.div_euclid(12)).map_err(|_| Error::InvalidPeriod {
            year: self.year(),
            month: u8::from(self.month()),
        })?;
        // rem_euclid(12) is always in 0..12
        let month = index.rem_euclid(12) as u8 + 1;

        Self::new(year, month)
    }

    /// The `size` consecutive months ending at and including this month,
    /// oldest first.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidTrendWindow] if `size` is zero.
    pub fn window_ending_here(&self, size: usize) -> Result<Vec<Self>, Error> {
        if size == 0 {
            return Err(Error::InvalidTrendWindow(size));
        }

        let size = u32::try_from(size).map_err(|_| Error::InvalidTrendWindow(size))?;

        (0..size).rev().map(|back| self.months_back(back)).collect()
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// The date range covering every month in `window`.
///
/// Returns `None` for an empty window.
pub(crate) fn window_range(window: &[Period]) -> Option<DateRange> {
    let first = window.first()?;
    let last = window.last()?;

    Some(DateRange {
        start: first.first_day(),
        end: last.last_day(),
    })
}

fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
