use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::db::BookingStore;
use crate::errors::AppError;
use crate::models::{BusinessCalendar, TimeInterval};
use crate::services::availability::{first_overlap, resolve_service};

/// Grid start times on `date` at which `employee_id` could take `service_id`.
///
/// A start is offered when it is not before `now`, the appointment finishes by
/// closing, and it does not overlap a non-cancelled booking. Results are
/// ascending and computed fresh from the store on every call.
pub fn available_slots(
    store: &dyn BookingStore,
    calendar: &BusinessCalendar,
    employee_id: &str,
    date: NaiveDate,
    service_id: &str,
    now: NaiveDateTime,
) -> Result<Vec<NaiveTime>, AppError> {
    let service = resolve_service(store, service_id)?;
    if store.get_employee(employee_id)?.is_none() {
        return Err(AppError::NotFound(format!("employee {employee_id}")));
    }

    let occupied = store.occupied_slots(employee_id, date, None)?;

    let mut slots = Vec::new();
    for start in calendar.grid_starts(date) {
        if date.and_time(start) < now {
            continue;
        }
        // Ends past the last representable date are never offered.
        let Ok(candidate) = TimeInterval::on(date, start, service.duration_minutes) else {
            continue;
        };
        if calendar.is_within_hours(&candidate)
            && first_overlap(&occupied, date, &candidate)?.is_none()
        {
            slots.push(start);
        }
    }

    tracing::debug!(
        employee_id,
        %date,
        service_id,
        booked = occupied.len(),
        offered = slots.len(),
        "computed available slots"
    );

    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, SqliteStore};
    use crate::models::{Booking, BookingStatus, Employee, Service};

    fn setup_store() -> SqliteStore {
        let store = SqliteStore::new(db::init_db(":memory:").unwrap());
        store
            .insert_employee(&Employee {
                id: "emp-1".to_string(),
                name: "Dana".to_string(),
            })
            .unwrap();
        for (id, minutes) in [("cut", 30), ("colour", 60)] {
            store
                .insert_service(&Service {
                    id: id.to_string(),
                    name: id.to_string(),
                    duration_minutes: minutes,
                })
                .unwrap();
        }
        store
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
    }

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    /// A clock reading well before the test date.
    fn earlier() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_time(t("12:00"))
    }

    fn seed(store: &SqliteStore, id: &str, service_id: &str, start: &str, status: BookingStatus) {
        store
            .insert_booking(&Booking {
                id: id.to_string(),
                employee_id: "emp-1".to_string(),
                service_id: service_id.to_string(),
                date: date(),
                start_time: t(start),
                status,
                deal_id: None,
                notes: None,
                created_at: earlier(),
                updated_at: earlier(),
            })
            .unwrap();
    }

    #[test]
    fn test_empty_future_day_offers_full_grid() {
        let store = setup_store();
        let cal = BusinessCalendar::default();
        let slots = available_slots(&store, &cal, "emp-1", date(), "cut", earlier()).unwrap();
        assert_eq!(slots.len(), 20);
        assert_eq!(slots.first(), Some(&t("09:00")));
        assert_eq!(slots.last(), Some(&t("18:30")));
    }

    #[test]
    fn test_respects_closing_time() {
        let store = setup_store();
        let cal = BusinessCalendar::default();
        let slots = available_slots(&store, &cal, "emp-1", date(), "colour", earlier()).unwrap();
        assert_eq!(slots.last(), Some(&t("18:00")));
        assert!(!slots.contains(&t("18:30")));
    }

    #[test]
    fn test_past_starts_filtered_today() {
        let store = setup_store();
        let cal = BusinessCalendar::default();
        let now = date().and_time(t("13:10"));
        let slots = available_slots(&store, &cal, "emp-1", date(), "cut", now).unwrap();
        assert_eq!(slots.first(), Some(&t("13:30")));
        assert!(slots.iter().all(|s| *s >= t("13:10")));
    }

    #[test]
    fn test_start_equal_to_now_is_offered() {
        let store = setup_store();
        let cal = BusinessCalendar::default();
        let now = date().and_time(t("15:00"));
        let slots = available_slots(&store, &cal, "emp-1", date(), "cut", now).unwrap();
        assert_eq!(slots.first(), Some(&t("15:00")));
    }

    #[test]
    fn test_day_already_over_offers_nothing() {
        let store = setup_store();
        let cal = BusinessCalendar::default();
        let now = date().and_time(t("20:00"));
        let slots = available_slots(&store, &cal, "emp-1", date(), "cut", now).unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn test_booked_interval_removed_adjacent_kept() {
        let store = setup_store();
        let cal = BusinessCalendar::default();
        // colour occupies 10:00-11:00
        seed(&store, "b-1", "colour", "10:00", BookingStatus::Confirmed);
        let slots = available_slots(&store, &cal, "emp-1", date(), "cut", earlier()).unwrap();
        assert!(slots.contains(&t("09:30")));
        assert!(!slots.contains(&t("10:00")));
        assert!(!slots.contains(&t("10:30")));
        assert!(slots.contains(&t("11:00")));
    }

    #[test]
    fn test_longer_service_blocked_by_later_booking() {
        let store = setup_store();
        let cal = BusinessCalendar::default();
        seed(&store, "b-1", "cut", "12:00", BookingStatus::Pending);
        let slots = available_slots(&store, &cal, "emp-1", date(), "colour", earlier()).unwrap();
        // 11:30 + 60 would run into the 12:00 cut
        assert!(slots.contains(&t("11:00")));
        assert!(!slots.contains(&t("11:30")));
        assert!(!slots.contains(&t("12:00")));
        assert!(slots.contains(&t("12:30")));
    }

    #[test]
    fn test_cancelled_booking_frees_slot() {
        let store = setup_store();
        let cal = BusinessCalendar::default();
        seed(&store, "b-1", "cut", "12:00", BookingStatus::Cancelled);
        let slots = available_slots(&store, &cal, "emp-1", date(), "cut", earlier()).unwrap();
        assert!(slots.contains(&t("12:00")));
    }

    #[test]
    fn test_unknown_service_or_employee() {
        let store = setup_store();
        let cal = BusinessCalendar::default();
        let result = available_slots(&store, &cal, "emp-1", date(), "perm", earlier());
        assert!(matches!(result, Err(AppError::NotFound(_))));
        let result = available_slots(&store, &cal, "emp-9", date(), "cut", earlier());
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_last_date_skips_starts_ending_out_of_range() {
        let store = setup_store();
        let cal = BusinessCalendar::new(20, 24, 60).unwrap();
        let slots =
            available_slots(&store, &cal, "emp-1", NaiveDate::MAX, "colour", earlier()).unwrap();
        assert_eq!(slots, vec![t("20:00"), t("21:00"), t("22:00")]);
    }
}
