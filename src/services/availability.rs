use chrono::{NaiveDate, NaiveTime};

use crate::db::BookingStore;
use crate::errors::AppError;
use crate::models::{OccupiedSlot, Service, TimeInterval};

/// Looks up a service and rejects durations that cannot form an interval.
pub fn resolve_service(store: &dyn BookingStore, service_id: &str) -> Result<Service, AppError> {
    let service = store
        .get_service(service_id)?
        .ok_or_else(|| AppError::NotFound(format!("service {service_id}")))?;
    if service.duration_minutes == 0 {
        return Err(AppError::InvalidInput(format!(
            "service {service_id} has a non-positive duration"
        )));
    }
    Ok(service)
}

/// First occupied slot whose interval overlaps `candidate`.
pub fn first_overlap<'a>(
    occupied: &'a [OccupiedSlot],
    date: NaiveDate,
    candidate: &TimeInterval,
) -> Result<Option<&'a OccupiedSlot>, AppError> {
    for slot in occupied {
        if slot.interval(date)?.overlaps(candidate) {
            return Ok(Some(slot));
        }
    }
    Ok(None)
}

/// Non-cancelled booking (other than `exclude_booking_id`) colliding with `candidate`.
pub fn find_conflict(
    store: &dyn BookingStore,
    employee_id: &str,
    candidate: &TimeInterval,
    exclude_booking_id: Option<&str>,
) -> Result<Option<OccupiedSlot>, AppError> {
    let date = candidate.date();
    let occupied = store.occupied_slots(employee_id, date, exclude_booking_id)?;
    Ok(first_overlap(&occupied, date, candidate)?.cloned())
}

pub fn is_available(
    store: &dyn BookingStore,
    employee_id: &str,
    date: NaiveDate,
    start: NaiveTime,
    service_id: &str,
    exclude_booking_id: Option<&str>,
) -> Result<bool, AppError> {
    let service = resolve_service(store, service_id)?;
    let candidate = TimeInterval::on(date, start, service.duration_minutes)?;
    let conflict = find_conflict(store, employee_id, &candidate, exclude_booking_id)?;
    Ok(conflict.is_none())
}
