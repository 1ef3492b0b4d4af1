use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{Booking, BookingStatus, Employee, OccupiedSlot, Service};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const BOOKING_COLUMNS: &str =
    "id, employee_id, service_id, date, start_time, status, deal_id, notes, created_at, updated_at";

// ── Services ──

pub fn insert_service(conn: &Connection, service: &Service) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO services (id, name, duration_minutes) VALUES (?1, ?2, ?3)",
        params![service.id, service.name, service.duration_minutes],
    )?;
    Ok(())
}

pub fn get_service(conn: &Connection, id: &str) -> rusqlite::Result<Option<Service>> {
    conn.query_row(
        "SELECT id, name, duration_minutes FROM services WHERE id = ?1",
        params![id],
        |row| {
            Ok(Service {
                id: row.get(0)?,
                name: row.get(1)?,
                duration_minutes: row.get(2)?,
            })
        },
    )
    .optional()
}

// ── Employees ──

pub fn insert_employee(conn: &Connection, employee: &Employee) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO employees (id, name) VALUES (?1, ?2)",
        params![employee.id, employee.name],
    )?;
    Ok(())
}

pub fn get_employee(conn: &Connection, id: &str) -> rusqlite::Result<Option<Employee>> {
    conn.query_row(
        "SELECT id, name FROM employees WHERE id = ?1",
        params![id],
        |row| {
            Ok(Employee {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    )
    .optional()
}

// ── Bookings ──

pub fn insert_booking(conn: &Connection, booking: &Booking) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        ),
        params![
            booking.id,
            booking.employee_id,
            booking.service_id,
            booking.date.format(DATE_FORMAT).to_string(),
            booking.start_time.format(TIME_FORMAT).to_string(),
            booking.status.as_str(),
            booking.deal_id,
            booking.notes,
            booking.created_at.format(TIMESTAMP_FORMAT).to_string(),
            booking.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn update_booking(conn: &Connection, booking: &Booking) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET employee_id = ?1, service_id = ?2, date = ?3, start_time = ?4,
             status = ?5, deal_id = ?6, notes = ?7, updated_at = ?8
         WHERE id = ?9",
        params![
            booking.employee_id,
            booking.service_id,
            booking.date.format(DATE_FORMAT).to_string(),
            booking.start_time.format(TIME_FORMAT).to_string(),
            booking.status.as_str(),
            booking.deal_id,
            booking.notes,
            booking.updated_at.format(TIMESTAMP_FORMAT).to_string(),
            booking.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
    updated_at: &NaiveDateTime,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![
            status.as_str(),
            updated_at.format(TIMESTAMP_FORMAT).to_string(),
            id
        ],
    )?;
    Ok(count > 0)
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Booking>> {
    conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        parse_booking_row,
    )
    .optional()
}

/// Non-cancelled bookings for one employee on one date, ordered by start.
pub fn get_occupied_slots(
    conn: &Connection,
    employee_id: &str,
    date: &NaiveDate,
    exclude_booking_id: Option<&str>,
) -> rusqlite::Result<Vec<OccupiedSlot>> {
    let mut stmt = conn.prepare(
        "SELECT b.id, b.start_time, s.duration_minutes
         FROM bookings b JOIN services s ON s.id = b.service_id
         WHERE b.employee_id = ?1 AND b.date = ?2 AND b.status != 'cancelled'
           AND (?3 IS NULL OR b.id != ?3)
         ORDER BY b.start_time ASC",
    )?;

    let rows = stmt.query_map(
        params![
            employee_id,
            date.format(DATE_FORMAT).to_string(),
            exclude_booking_id
        ],
        |row| {
            let start_str: String = row.get(1)?;
            Ok(OccupiedSlot {
                booking_id: row.get(0)?,
                start_time: parse_time(&start_str, 1)?,
                duration_minutes: row.get(2)?,
            })
        },
    )?;

    rows.collect()
}

/// Every booking (any status) for one employee on one date, ordered by start.
pub fn get_bookings_for_day(
    conn: &Connection,
    employee_id: &str,
    date: &NaiveDate,
) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE employee_id = ?1 AND date = ?2
         ORDER BY start_time ASC, created_at ASC"
    ))?;

    let rows = stmt.query_map(
        params![employee_id, date.format(DATE_FORMAT).to_string()],
        parse_booking_row,
    )?;

    rows.collect()
}

fn parse_booking_row(row: &rusqlite::Row) -> rusqlite::Result<Booking> {
    let date_str: String = row.get(3)?;
    let start_str: String = row.get(4)?;
    let status_str: String = row.get(5)?;
    let created_at_str: String = row.get(8)?;
    let updated_at_str: String = row.get(9)?;

    let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    let status = BookingStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            Type::Text,
            format!("unknown booking status: {status_str}").into(),
        )
    })?;

    Ok(Booking {
        id: row.get(0)?,
        employee_id: row.get(1)?,
        service_id: row.get(2)?,
        date,
        start_time: parse_time(&start_str, 4)?,
        status,
        deal_id: row.get(6)?,
        notes: row.get(7)?,
        created_at: parse_timestamp(&created_at_str, 8)?,
        updated_at: parse_timestamp(&updated_at_str, 9)?,
    })
}

fn parse_time(s: &str, idx: usize) -> rusqlite::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_timestamp(s: &str, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
