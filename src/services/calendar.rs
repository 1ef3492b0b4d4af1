use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, Employee, Service};

/// RFC 5545 TEXT escaping for property values.
fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\r' => {
                if chars.peek() != Some(&'\n') {
                    escaped.push_str("\\n");
                }
            }
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn generate_ics(
    booking: &Booking,
    service: &Service,
    employee: &Employee,
    business_name: &str,
) -> Result<String, AppError> {
    let interval = booking.interval(service.duration_minutes)?;
    let dtstart = interval.start.format("%Y%m%dT%H%M%S").to_string();
    let dtend = interval.end.format("%Y%m%dT%H%M%S").to_string();
    let dtstamp = booking.updated_at.format("%Y%m%dT%H%M%S").to_string();
    let uid = format!("{}@salonbook", booking.id);

    let summary = escape_text(&format!(
        "{} with {} at {}",
        service.name, employee.name, business_name
    ));
    let description = escape_text(booking.notes.as_deref().unwrap_or("No additional notes"));
    let status = match booking.status {
        BookingStatus::Pending => "TENTATIVE",
        BookingStatus::Cancelled => "CANCELLED",
        _ => "CONFIRMED",
    };

    Ok(format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Salonbook//Appointments//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         STATUS:{status}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    ))
}
