use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::TimeInterval;

/// Salon operating hours and the grid appointment starts are offered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessCalendar {
    open_hour: u32,
    close_hour: u32,
    slot_granularity_minutes: u32,
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self {
            open_hour: 9,
            close_hour: 19,
            slot_granularity_minutes: 30,
        }
    }
}

impl BusinessCalendar {
    pub fn new(
        open_hour: u32,
        close_hour: u32,
        slot_granularity_minutes: u32,
    ) -> Result<Self, AppError> {
        if close_hour > 24 {
            return Err(AppError::Config(format!(
                "close hour {close_hour} is past midnight"
            )));
        }
        if open_hour >= close_hour {
            return Err(AppError::Config(format!(
                "open hour {open_hour} must be before close hour {close_hour}"
            )));
        }
        if slot_granularity_minutes == 0 {
            return Err(AppError::Config(
                "slot granularity must be positive".to_string(),
            ));
        }
        Ok(Self {
            open_hour,
            close_hour,
            slot_granularity_minutes,
        })
    }

    pub fn open_hour(&self) -> u32 {
        self.open_hour
    }

    pub fn close_hour(&self) -> u32 {
        self.close_hour
    }

    pub fn slot_granularity_minutes(&self) -> u32 {
        self.slot_granularity_minutes
    }

    pub fn opening(&self, date: NaiveDate) -> Option<NaiveDateTime> {
        date.and_time(NaiveTime::MIN)
            .checked_add_signed(Duration::hours(i64::from(self.open_hour)))
    }

    /// `close_hour == 24` resolves to midnight of the following day, which
    /// does not exist for the last representable date.
    pub fn closing(&self, date: NaiveDate) -> Option<NaiveDateTime> {
        date.and_time(NaiveTime::MIN)
            .checked_add_signed(Duration::hours(i64::from(self.close_hour)))
    }

    /// Both bounds are checked: the start must not precede opening and the end
    /// must not run past closing on the interval's own date.
    pub fn is_within_hours(&self, interval: &TimeInterval) -> bool {
        let date = interval.date();
        let after_opening = self
            .opening(date)
            .is_some_and(|opening| interval.start >= opening);
        let before_closing = self
            .closing(date)
            .map_or(true, |closing| interval.end <= closing);
        after_opening && before_closing && interval.start <= interval.end
    }

    /// Every grid start from opening up to, but excluding, closing.
    pub fn grid_starts(&self, _date: NaiveDate) -> impl Iterator<Item = NaiveTime> {
        let first = self.open_hour * 60;
        let last = self.close_hour * 60;
        (first..last)
            .step_by(self.slot_granularity_minutes as usize)
            .filter_map(|minute| NaiveTime::from_num_seconds_from_midnight_opt(minute * 60, 0))
    }
}
