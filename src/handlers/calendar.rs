use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::errors::AppError;
use crate::services::calendar::generate_ics;
use crate::state::AppState;

// GET /api/bookings/:id/ics
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<Response, AppError> {
    let booking = state.engine.get_booking(&booking_id)?;
    let store = state.engine.store();
    let service = store
        .get_service(&booking.service_id)?
        .ok_or_else(|| AppError::NotFound(format!("service {}", booking.service_id)))?;
    let employee = store
        .get_employee(&booking.employee_id)?
        .ok_or_else(|| AppError::NotFound(format!("employee {}", booking.employee_id)))?;

    let ics = generate_ics(&booking, &service, &employee, &state.config.business_name)?;
    let filename = format!("booking-{booking_id}.ics");

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        ics,
    )
        .into_response())
}
