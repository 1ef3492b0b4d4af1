pub mod booking;
pub mod calendar;
pub mod employee;
pub mod interval;
pub mod service;

pub use booking::{Booking, BookingStatus, BookingUpdate, NewBooking, OccupiedSlot};
pub use calendar::BusinessCalendar;
pub use employee::Employee;
pub use interval::{end_of, overlaps, TimeInterval};
pub use service::Service;
