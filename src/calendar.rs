//! Calendar-day bucketing
//!
//! Timestamps are bucketed into local calendar days under a fixed UTC
//! offset. Periods (week/month/year) and trailing comparison windows are
//! expressed as half-open day ranges `[start, end)`.

use chrono::{DateTime, Datelike, Days, FixedOffset, Months, NaiveDate, Offset, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::InsightError;
use crate::types::{CalendarDay, Period};

/// Largest accepted UTC offset, in minutes
pub const MAX_UTC_OFFSET_MINUTES: i32 = 18 * 60;

/// Half-open range of calendar days `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: CalendarDay,
    pub end: CalendarDay,
}

impl DateWindow {
    /// Create a window; an inverted range becomes empty
    pub fn new(start: CalendarDay, end: CalendarDay) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// The `len_days` days ending on (and including) `today`
    pub fn trailing(len_days: u32, today: CalendarDay) -> Self {
        let end = add_days(today, 1);
        Self::new(sub_days(end, len_days), end)
    }

    pub fn contains(&self, day: CalendarDay) -> bool {
        self.start <= day && day < self.end
    }

    pub fn len_days(&self) -> u32 {
        (self.end - self.start).num_days().max(0) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Every day in the window, ascending
    pub fn days(&self) -> impl Iterator<Item = CalendarDay> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d < end)
    }
}

/// Local calendar used to assign timestamps to days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
    first_weekday: Weekday,
}

impl Default for Calendar {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
            first_weekday: Weekday::Mon,
        }
    }
}

impl Calendar {
    pub fn new(offset: FixedOffset, first_weekday: Weekday) -> Self {
        Self {
            offset,
            first_weekday,
        }
    }

    /// Build a calendar from an offset in minutes east of UTC
    pub fn from_offset_minutes(minutes: i32, first_weekday: Weekday) -> Result<Self, InsightError> {
        if minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(InsightError::InvalidUtcOffset(minutes));
        }
        let offset =
            FixedOffset::east_opt(minutes * 60).ok_or(InsightError::InvalidUtcOffset(minutes))?;
        Ok(Self::new(offset, first_weekday))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn first_weekday(&self) -> Weekday {
        self.first_weekday
    }

    /// Local calendar day of a timestamp
    pub fn day_of(&self, timestamp: &DateTime<Utc>) -> CalendarDay {
        timestamp.with_timezone(&self.offset).date_naive()
    }

    /// Today's local calendar day for a reference instant
    pub fn today(&self, now: &DateTime<Utc>) -> CalendarDay {
        self.day_of(now)
    }

    /// Calendar period containing `day`
    pub fn period_window(&self, period: Period, day: CalendarDay) -> DateWindow {
        match period {
            Period::Week => {
                let back = (day.weekday().num_days_from_monday() + 7
                    - self.first_weekday.num_days_from_monday())
                    % 7;
                let start = sub_days(day, back);
                DateWindow::new(start, add_days(start, 7))
            }
            Period::Month => {
                let start = sub_days(day, day.day0());
                let end = start
                    .checked_add_months(Months::new(1))
                    .unwrap_or(NaiveDate::MAX);
                DateWindow::new(start, end)
            }
            Period::Year => {
                let start = sub_days(day, day.ordinal0());
                let end = start
                    .checked_add_months(Months::new(12))
                    .unwrap_or(NaiveDate::MAX);
                DateWindow::new(start, end)
            }
        }
    }

    /// The period immediately before the one containing `day`
    pub fn previous_period_window(&self, period: Period, day: CalendarDay) -> DateWindow {
        let current = self.period_window(period, day);
        self.period_window(period, sub_days(current.start, 1))
    }

    /// Days from the start of the period through `today`, inclusive
    pub fn days_elapsed(&self, period: Period, today: CalendarDay) -> u32 {
        let window = self.period_window(period, today);
        DateWindow::new(window.start, add_days(today, 1)).len_days()
    }
}

pub(crate) fn add_days(day: CalendarDay, n: u32) -> CalendarDay {
    day.checked_add_days(Days::new(u64::from(n)))
        .unwrap_or(NaiveDate::MAX)
}

pub(crate) fn sub_days(day: CalendarDay, n: u32) -> CalendarDay {
    day.checked_sub_days(Days::new(u64::from(n)))
        .unwrap_or(NaiveDate::MIN)
}

/// Parse a `YYYY-MM-DD` calendar day
pub fn parse_day(s: &str) -> Result<CalendarDay, InsightError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| InsightError::DateParseError(format!("{s}: {e}")))
}
