use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A simple clock abstraction so "today" is injected rather than read ad hoc.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns a clock fixed at midnight UTC of the given calendar date.
    #[must_use]
    pub fn fixed_on(date: CalendarDate) -> Self {
        Self::Fixed(date.as_naive().and_time(chrono::NaiveTime::MIN).and_utc())
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Returns the current calendar date (UTC) according to the clock.
    #[must_use]
    pub fn today(&self) -> CalendarDate {
        CalendarDate::from_naive(self.now().date_naive())
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    /// Returns true if this clock is fixed.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

//
// ─── CALENDAR ──────────────────────────────────────────────────────────────────
//

/// A valid calendar day addressed the way the tracker tree stores it:
/// full year, 0-based month index (January = 0) and 1-based day of month.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Builds a date from a year, a 0-based month index and a 1-based day.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidDate` if the triple is not a real calendar day.
    pub fn new(year: i32, month_index: u32, day: u32) -> Result<Self, ModelError> {
        Self::checked(year, month_index, day).ok_or(ModelError::InvalidDate {
            year,
            month_index,
            day,
        })
    }

    /// Like [`CalendarDate::new`] but returns `None` for impossible dates.
    #[must_use]
    pub fn checked(year: i32, month_index: u32, day: u32) -> Option<Self> {
        if month_index > 11 {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month_index + 1, day).map(Self)
    }

    #[must_use]
    pub fn from_naive(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parses an ISO 8601 date (`YYYY-MM-DD`, human month number).
    ///
    /// # Errors
    ///
    /// Returns the chrono parse error for malformed input.
    pub fn parse_iso(raw: &str) -> Result<Self, chrono::ParseError> {
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map(Self)
    }

    #[must_use]
    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// 0-based month index, matching the stored tracker layout.
    #[must_use]
    pub fn month_index(&self) -> u32 {
        self.0.month0()
    }

    /// 1-based day of month.
    #[must_use]
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    #[must_use]
    pub fn month_key(&self) -> MonthKey {
        MonthKey {
            year: self.year(),
            month_index: self.month_index(),
        }
    }

    /// True when `next` is exactly one calendar day after `self`.
    #[must_use]
    pub fn is_followed_by(&self, next: CalendarDate) -> bool {
        self.0.succ_opt() == Some(next.0)
    }
}

impl fmt::Debug for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CalendarDate({})", self.0)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// A (year, 0-based month) pair. Displays as `{year}-{human month}`, e.g. `2024-3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month_index: u32,
}

impl MonthKey {
    #[must_use]
    pub fn new(year: i32, month_index: u32) -> Self {
        Self { year, month_index }
    }

    /// Human month number (January = 1).
    #[must_use]
    pub fn month_number(&self) -> u32 {
        self.month_index + 1
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.year, self.month_number())
    }
}

/// Number of days in the month, or 0 for a month index outside `0..=11`.
#[must_use]
pub fn days_in_month(year: i32, month_index: u32) -> u32 {
    let Some(first) = CalendarDate::checked(year, month_index, 1) else {
        return 0;
    };
    let next_first = if month_index == 11 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month_index + 2, 1)
    };
    next_first
        .and_then(|next| u32::try_from((next - first.as_naive()).num_days()).ok())
        .unwrap_or(0)
}

/// Weekday of the 1st of the month, counted from Sunday (Sunday = 0).
///
/// Returns `None` for a month index outside `0..=11`.
#[must_use]
pub fn first_weekday_offset(year: i32, month_index: u32) -> Option<u32> {
    CalendarDate::checked(year, month_index, 1)
        .map(|first| first.as_naive().weekday().num_days_from_sunday())
}
