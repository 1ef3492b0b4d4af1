use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::TimeInterval;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub employee_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub status: BookingStatus,
    pub deal_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    pub fn interval(&self, duration_minutes: u32) -> Result<TimeInterval, AppError> {
        TimeInterval::on(self.date, self.start_time, duration_minutes)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Cancelled bookings release their time slot.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to place a new booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub employee_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    /// `pending` when omitted; staff may enter bookings directly as `confirmed`.
    #[serde(default)]
    pub status: Option<BookingStatus>,
    #[serde(default)]
    pub deal_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Full replacement of a booking's editable fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingUpdate {
    pub employee_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub status: BookingStatus,
    #[serde(default)]
    pub deal_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A non-cancelled booking as seen by the overlap check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupiedSlot {
    pub booking_id: String,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
}

impl OccupiedSlot {
    pub fn interval(&self, date: NaiveDate) -> Result<TimeInterval, AppError> {
        TimeInterval::on(date, self.start_time, self.duration_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use BookingStatus::*;

    #[test]
    fn test_allowed_transitions() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn test_only_cancelled_releases_slot() {
        assert!(Pending.occupies_slot());
        assert!(Confirmed.occupies_slot());
        assert!(Completed.occupies_slot());
        assert!(!Cancelled.occupies_slot());
    }

    #[test]
    fn test_status_parse() {
        for status in [Pending, Confirmed, Completed, Cancelled] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("archived"), None);
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&Completed).unwrap();
        assert_eq!(json, "\"completed\"");
        let parsed: BookingStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, Cancelled);
    }
}
