pub mod availability;
pub mod booking;
pub mod calendar;
pub mod clock;
pub mod slots;

pub use booking::{BookingEngine, ScheduleEntry};
pub use clock::{Clock, FixedClock, SystemClock};
