use std::env;

use crate::errors::AppError;
use crate::models::BusinessCalendar;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub business_name: String,
    pub open_hour: u32,
    pub close_hour: u32,
    pub slot_granularity_minutes: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT", 3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "salonbook.db".to_string()),
            business_name: env::var("BUSINESS_NAME").unwrap_or_else(|_| "Salon".to_string()),
            open_hour: env_parse("OPEN_HOUR", 9),
            close_hour: env_parse("CLOSE_HOUR", 19),
            slot_granularity_minutes: env_parse("SLOT_GRANULARITY_MINUTES", 30),
        }
    }

    pub fn calendar(&self) -> Result<BusinessCalendar, AppError> {
        BusinessCalendar::new(
            self.open_hour,
            self.close_hour,
            self.slot_granularity_minutes,
        )
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
