use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::services::ScheduleEntry;
use crate::state::AppState;

// GET /api/employees/:employee_id/slots
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
    pub service_id: String,
}

#[derive(Serialize)]
pub struct SlotsResponse {
    employee_id: String,
    service_id: String,
    date: NaiveDate,
    slots: Vec<NaiveTime>,
}

pub async fn get_slots(
    State(state): State<Arc<AppState>>,
    Path(employee_id): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, AppError> {
    let now = state.engine.now();
    let slots = state
        .engine
        .available_slots(&employee_id, query.date, &query.service_id, now)?;

    Ok(Json(SlotsResponse {
        employee_id,
        service_id: query.service_id,
        date: query.date,
        slots,
    }))
}

// GET /api/employees/:employee_id/availability
#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub service_id: String,
    pub exclude: Option<String>,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    available: bool,
}

pub async fn check_availability(
    State(state): State<Arc<AppState>>,
    Path(employee_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let available = state.engine.is_available(
        &employee_id,
        query.date,
        query.start,
        &query.service_id,
        query.exclude.as_deref(),
    )?;
    Ok(Json(AvailabilityResponse { available }))
}

// GET /api/employees/:employee_id/schedule
#[derive(Deserialize)]
pub struct ScheduleQuery {
    pub date: NaiveDate,
}

pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Path(employee_id): Path<String>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<Vec<ScheduleEntry>>, AppError> {
    let entries = state.engine.day_schedule(&employee_id, query.date)?;
    Ok(Json(entries))
}
