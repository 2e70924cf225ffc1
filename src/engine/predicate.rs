//! Date predicate scoping records to a month or a month+day
//!
//! Comparisons operate on month/day components only; year is ignored except
//! where a grouping key explicitly includes it.

use crate::error::{AppError, Result};
use chrono::{Datelike, NaiveDate};

/// Month (1-12) with an optional day (1-31) filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatePredicate {
    month: u32,
    day: Option<u32>,
}

impl DatePredicate {
    /// Predicate matching a whole month
    pub fn month(month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(AppError::Validation(format!("month out of range: {}", month)));
        }
        Ok(Self { month, day: None })
    }

    /// Predicate matching a single day within a month
    pub fn month_day(month: u32, day: u32) -> Result<Self> {
        if !(1..=31).contains(&day) {
            return Err(AppError::Validation(format!("day out of range: {}", day)));
        }
        let mut predicate = Self::month(month)?;
        predicate.day = Some(day);
        Ok(predicate)
    }

    /// True when the date falls inside the predicate window
    ///
    /// `None` dates never match: a record without a parsable date is invisible
    /// to every date-scoped aggregate.
    pub fn matches(&self, date: Option<NaiveDate>) -> bool {
        match date {
            Some(d) => d.month() == self.month && self.day.map_or(true, |day| d.day() == day),
            None => false,
        }
    }

    pub fn month_number(&self) -> u32 {
        self.month
    }

    pub fn day_number(&self) -> Option<u32> {
        self.day
    }

    /// The predicate for the preceding period: previous day within the month,
    /// or the previous calendar month (January wraps to December).
    pub fn previous(&self) -> Option<Self> {
        match self.day {
            Some(1) => None,
            Some(day) => Some(Self {
                month: self.month,
                day: Some(day - 1),
            }),
            None => Some(Self {
                month: if self.month == 1 { 12 } else { self.month - 1 },
                day: None,
            }),
        }
    }
}
