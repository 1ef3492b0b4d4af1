use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, Employee, OccupiedSlot, Service};

/// Storage capability the booking engine is handed at construction.
///
/// Write methods are transactional: on error nothing is left behind.
pub trait BookingStore: Send + Sync {
    fn get_service(&self, id: &str) -> Result<Option<Service>, AppError>;

    fn get_employee(&self, id: &str) -> Result<Option<Employee>, AppError>;

    fn get_booking(&self, id: &str) -> Result<Option<Booking>, AppError>;

    /// Non-cancelled bookings for `employee_id` on `date`, minus `exclude_booking_id`.
    fn occupied_slots(
        &self,
        employee_id: &str,
        date: NaiveDate,
        exclude_booking_id: Option<&str>,
    ) -> Result<Vec<OccupiedSlot>, AppError>;

    fn bookings_for_day(&self, employee_id: &str, date: NaiveDate)
        -> Result<Vec<Booking>, AppError>;

    fn insert_booking(&self, booking: &Booking) -> Result<(), AppError>;

    fn update_booking(&self, booking: &Booking) -> Result<(), AppError>;

    fn set_status(
        &self,
        id: &str,
        status: BookingStatus,
        updated_at: NaiveDateTime,
    ) -> Result<(), AppError>;
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Seeding hook for the external service catalog.
    pub fn insert_service(&self, service: &Service) -> Result<(), AppError> {
        let conn = self.conn()?;
        queries::insert_service(&conn, service)?;
        Ok(())
    }

    /// Seeding hook for the external staff directory.
    pub fn insert_employee(&self, employee: &Employee) -> Result<(), AppError> {
        let conn = self.conn()?;
        queries::insert_employee(&conn, employee)?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.conn
            .lock()
            .map_err(|_| AppError::StorageUnavailable("database connection lock poisoned".into()))
    }
}

impl BookingStore for SqliteStore {
    fn get_service(&self, id: &str) -> Result<Option<Service>, AppError> {
        let conn = self.conn()?;
        Ok(queries::get_service(&conn, id)?)
    }

    fn get_employee(&self, id: &str) -> Result<Option<Employee>, AppError> {
        let conn = self.conn()?;
        Ok(queries::get_employee(&conn, id)?)
    }

    fn get_booking(&self, id: &str) -> Result<Option<Booking>, AppError> {
        let conn = self.conn()?;
        Ok(queries::get_booking_by_id(&conn, id)?)
    }

    fn occupied_slots(
        &self,
        employee_id: &str,
        date: NaiveDate,
        exclude_booking_id: Option<&str>,
    ) -> Result<Vec<OccupiedSlot>, AppError> {
        let conn = self.conn()?;
        Ok(queries::get_occupied_slots(
            &conn,
            employee_id,
            &date,
            exclude_booking_id,
        )?)
    }

    fn bookings_for_day(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, AppError> {
        let conn = self.conn()?;
        Ok(queries::get_bookings_for_day(&conn, employee_id, &date)?)
    }

    fn insert_booking(&self, booking: &Booking) -> Result<(), AppError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        queries::insert_booking(&tx, booking)?;
        tx.commit()?;
        Ok(())
    }

    fn update_booking(&self, booking: &Booking) -> Result<(), AppError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        if !queries::update_booking(&tx, booking)? {
            return Err(AppError::NotFound(format!("booking {}", booking.id)));
        }
        tx.commit()?;
        Ok(())
    }

    fn set_status(
        &self,
        id: &str,
        status: BookingStatus,
        updated_at: NaiveDateTime,
    ) -> Result<(), AppError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        if !queries::update_booking_status(&tx, id, status, &updated_at)? {
            return Err(AppError::NotFound(format!("booking {id}")));
        }
        tx.commit()?;
        Ok(())
    }
}
