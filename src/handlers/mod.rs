pub mod availability;
pub mod bookings;
pub mod calendar;
pub mod health;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/employees/:employee_id/slots",
            get(availability::get_slots),
        )
        .route(
            "/api/employees/:employee_id/availability",
            get(availability::check_availability),
        )
        .route(
            "/api/employees/:employee_id/schedule",
            get(availability::get_schedule),
        )
        .route("/api/bookings", post(bookings::create_booking))
        .route(
            "/api/bookings/:id",
            get(bookings::get_booking).put(bookings::update_booking),
        )
        .route("/api/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/api/bookings/:id/status", post(bookings::set_status))
        .route("/api/bookings/:id/ics", get(calendar::download_ics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
