use crate::config::AppConfig;
use crate::services::BookingEngine;

pub struct AppState {
    pub engine: BookingEngine,
    pub config: AppConfig,
}
