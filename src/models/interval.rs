use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::errors::AppError;

/// Half-open `[start, end)` span of wall-clock time. Ends are carried as full
/// datetimes so an appointment running past midnight never wraps around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeInterval {
    /// Interval starting at `start` on `date` and lasting `duration_minutes`.
    /// Fails when the end falls past the last representable date.
    pub fn on(
        date: NaiveDate,
        start: NaiveTime,
        duration_minutes: u32,
    ) -> Result<Self, AppError> {
        let start = date.and_time(start);
        let end = end_of(start, duration_minutes).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "{duration_minutes} minutes from {start} is out of calendar range"
            ))
        })?;
        Ok(Self { start, end })
    }

    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        overlaps(self, other)
    }
}

/// Touching intervals (`a.end == b.start`) do not overlap.
pub fn overlaps(a: &TimeInterval, b: &TimeInterval) -> bool {
    a.start < b.end && b.start < a.end
}

pub fn end_of(start: NaiveDateTime, duration_minutes: u32) -> Option<NaiveDateTime> {
    start.checked_add_signed(Duration::minutes(i64::from(duration_minutes)))
}
