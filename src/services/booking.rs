use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::db::BookingStore;
use crate::errors::AppError;
use crate::models::{
    Booking, BookingStatus, BookingUpdate, BusinessCalendar, Employee, NewBooking, Service,
    TimeInterval,
};
use crate::services::availability::{self, find_conflict, resolve_service};
use crate::services::clock::Clock;
use crate::services::slots;

/// Writes to one employee's day are serialized on this key.
type SlotKey = (String, NaiveDate);

/// One row of an employee's day.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleEntry {
    #[serde(flatten)]
    pub booking: Booking,
    pub service_name: String,
    pub end_time: NaiveTime,
}

/// Owns booking creation, edits and status changes.
///
/// Every mutation holds the lock for each `(employee, date)` it touches from
/// the availability check through the storage write, so two requests racing
/// for overlapping times on the same day cannot both commit.
pub struct BookingEngine {
    store: Arc<dyn BookingStore>,
    calendar: BusinessCalendar,
    clock: Arc<dyn Clock>,
    locks: DashMap<SlotKey, Arc<Mutex<()>>>,
}

impl BookingEngine {
    pub fn new(
        store: Arc<dyn BookingStore>,
        calendar: BusinessCalendar,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            calendar,
            clock,
            locks: DashMap::new(),
        }
    }

    pub fn store(&self) -> &dyn BookingStore {
        self.store.as_ref()
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    // ── Queries ──

    pub fn is_available(
        &self,
        employee_id: &str,
        date: NaiveDate,
        start: NaiveTime,
        service_id: &str,
        exclude_booking_id: Option<&str>,
    ) -> Result<bool, AppError> {
        availability::is_available(
            self.store(),
            employee_id,
            date,
            start,
            service_id,
            exclude_booking_id,
        )
    }

    /// Unlocked read; a slot taken in the meantime is caught at create time.
    pub fn available_slots(
        &self,
        employee_id: &str,
        date: NaiveDate,
        service_id: &str,
        now: NaiveDateTime,
    ) -> Result<Vec<NaiveTime>, AppError> {
        slots::available_slots(
            self.store(),
            &self.calendar,
            employee_id,
            date,
            service_id,
            now,
        )
    }

    pub fn get_booking(&self, id: &str) -> Result<Booking, AppError> {
        self.store
            .get_booking(id)?
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))
    }

    pub fn day_schedule(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<ScheduleEntry>, AppError> {
        self.require_employee(employee_id)?;
        let bookings = self.store.bookings_for_day(employee_id, date)?;

        let mut services: HashMap<String, Service> = HashMap::new();
        let mut entries = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let service = match services.entry(booking.service_id.clone()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    entry.insert(resolve_service(self.store(), &booking.service_id)?)
                }
            };
            let end = booking.interval(service.duration_minutes)?.end;
            entries.push(ScheduleEntry {
                service_name: service.name.clone(),
                end_time: end.time(),
                booking,
            });
        }
        Ok(entries)
    }

    // ── Mutations ──

    pub async fn create_booking(&self, request: NewBooking) -> Result<Booking, AppError> {
        self.require_employee(&request.employee_id)?;
        let service = resolve_service(self.store(), &request.service_id)?;

        let status = match request.status {
            None | Some(BookingStatus::Pending) => BookingStatus::Pending,
            Some(BookingStatus::Confirmed) => BookingStatus::Confirmed,
            Some(other) => {
                return Err(AppError::InvalidInput(format!(
                    "new bookings cannot start as {other}"
                )))
            }
        };

        let start_time = whole_seconds(request.start_time)?;
        let interval = TimeInterval::on(request.date, start_time, service.duration_minutes)?;
        let now = self.clock.now();
        if interval.start < now {
            return Err(AppError::InvalidInput(format!(
                "start {} is in the past",
                interval.start
            )));
        }
        self.ensure_within_hours(&interval)?;

        let _guards = self
            .lock_keys(vec![(request.employee_id.clone(), request.date)])
            .await;

        self.ensure_free(&request.employee_id, &interval, None)?;

        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            employee_id: request.employee_id,
            service_id: request.service_id,
            date: request.date,
            start_time,
            status,
            deal_id: request.deal_id,
            notes: request.notes,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_booking(&booking)?;

        tracing::info!(
            booking_id = %booking.id,
            employee_id = %booking.employee_id,
            date = %booking.date,
            start = %booking.start_time,
            status = %booking.status,
            "booking created"
        );
        Ok(booking)
    }

    /// Replaces a booking's editable fields. The conflict check ignores the
    /// booking's own current occupancy.
    pub async fn update_booking(
        &self,
        id: &str,
        update: BookingUpdate,
    ) -> Result<Booking, AppError> {
        self.require_employee(&update.employee_id)?;
        let service = resolve_service(self.store(), &update.service_id)?;
        let start_time = whole_seconds(update.start_time)?;
        let interval = TimeInterval::on(update.date, start_time, service.duration_minutes)?;
        if update.status.occupies_slot() {
            self.ensure_within_hours(&interval)?;
        }

        let target = (update.employee_id.clone(), update.date);
        let (current, _guards) = self.lock_booking(id, Some(target)).await?;

        if update.status != current.status && !current.status.can_transition_to(update.status) {
            return Err(AppError::InvalidTransition {
                from: current.status,
                to: update.status,
            });
        }

        if update.status.occupies_slot() {
            self.ensure_free(&update.employee_id, &interval, Some(id))?;
        }

        let updated = Booking {
            id: current.id,
            employee_id: update.employee_id,
            service_id: update.service_id,
            date: update.date,
            start_time,
            status: update.status,
            deal_id: update.deal_id,
            notes: update.notes,
            created_at: current.created_at,
            updated_at: self.clock.now(),
        };
        self.store.update_booking(&updated)?;

        tracing::info!(
            booking_id = %updated.id,
            employee_id = %updated.employee_id,
            date = %updated.date,
            start = %updated.start_time,
            status = %updated.status,
            "booking updated"
        );
        Ok(updated)
    }

    /// Idempotent: cancelling a cancelled booking returns it unchanged.
    pub async fn cancel_booking(&self, id: &str) -> Result<Booking, AppError> {
        let (current, _guards) = self.lock_booking(id, None).await?;
        match current.status {
            BookingStatus::Cancelled => Ok(current),
            BookingStatus::Completed => Err(AppError::InvalidTransition {
                from: BookingStatus::Completed,
                to: BookingStatus::Cancelled,
            }),
            BookingStatus::Pending | BookingStatus::Confirmed => {
                self.write_status(current, BookingStatus::Cancelled)
            }
        }
    }

    pub async fn set_status(&self, id: &str, status: BookingStatus) -> Result<Booking, AppError> {
        if status == BookingStatus::Cancelled {
            return self.cancel_booking(id).await;
        }

        let (current, _guards) = self.lock_booking(id, None).await?;
        if !current.status.can_transition_to(status) {
            return Err(AppError::InvalidTransition {
                from: current.status,
                to: status,
            });
        }
        self.write_status(current, status)
    }

    /// Drops lock entries for days before `before` that nobody is holding.
    pub fn prune_locks(&self, before: NaiveDate) -> usize {
        let initial = self.locks.len();
        self.locks
            .retain(|(_, date), lock| *date >= before || Arc::strong_count(lock) > 1);
        initial.saturating_sub(self.locks.len())
    }

    // ── Internals ──

    fn write_status(&self, mut booking: Booking, status: BookingStatus) -> Result<Booking, AppError> {
        let now = self.clock.now();
        self.store.set_status(&booking.id, status, now)?;
        tracing::info!(
            booking_id = %booking.id,
            from = %booking.status,
            to = %status,
            "booking status changed"
        );
        booking.status = status;
        booking.updated_at = now;
        Ok(booking)
    }

    fn require_employee(&self, employee_id: &str) -> Result<Employee, AppError> {
        self.store
            .get_employee(employee_id)?
            .ok_or_else(|| AppError::NotFound(format!("employee {employee_id}")))
    }

    fn ensure_within_hours(&self, interval: &TimeInterval) -> Result<(), AppError> {
        if self.calendar.is_within_hours(interval) {
            return Ok(());
        }
        Err(AppError::InvalidInput(format!(
            "{} to {} is outside business hours ({:02}:00-{:02}:00)",
            interval.start.time(),
            interval.end.time(),
            self.calendar.open_hour(),
            self.calendar.close_hour()
        )))
    }

    fn ensure_free(
        &self,
        employee_id: &str,
        interval: &TimeInterval,
        exclude_booking_id: Option<&str>,
    ) -> Result<(), AppError> {
        match find_conflict(self.store(), employee_id, interval, exclude_booking_id)? {
            None => Ok(()),
            Some(conflict) => {
                tracing::warn!(
                    employee_id,
                    date = %interval.date(),
                    start = %interval.start.time(),
                    conflicting_booking = %conflict.booking_id,
                    "rejected overlapping booking"
                );
                Err(AppError::SlotUnavailable(format!(
                    "employee {employee_id} is booked from {} on {}",
                    conflict.start_time,
                    interval.date()
                )))
            }
        }
    }

    /// Locks are always taken in key order so overlapping multi-key callers
    /// cannot deadlock.
    async fn lock_keys(&self, mut keys: Vec<SlotKey>) -> Vec<OwnedMutexGuard<()>> {
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            let lock = Arc::clone(self.locks.entry(key).or_default().value());
            guards.push(lock.lock_owned().await);
        }
        guards
    }

    /// Loads a booking with its current day (plus `extra`) locked. Retries if an
    /// edit moved the booking to another day while the locks were pending.
    async fn lock_booking(
        &self,
        id: &str,
        extra: Option<SlotKey>,
    ) -> Result<(Booking, Vec<OwnedMutexGuard<()>>), AppError> {
        loop {
            let seen = self.get_booking(id)?;
            let mut keys = vec![(seen.employee_id.clone(), seen.date)];
            keys.extend(extra.clone());
            let guards = self.lock_keys(keys).await;

            let current = self.get_booking(id)?;
            if current.employee_id == seen.employee_id && current.date == seen.date {
                return Ok((current, guards));
            }
            tracing::debug!(booking_id = id, "booking moved while locking, retrying");
        }
    }
}

/// Stored start times carry whole seconds only.
fn whole_seconds(start: NaiveTime) -> Result<NaiveTime, AppError> {
    if start.nanosecond() != 0 {
        return Err(AppError::InvalidInput(format!(
            "start time {start} has a fractional second"
        )));
    }
    Ok(start)
}
