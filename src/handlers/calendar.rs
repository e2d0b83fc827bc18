use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::check_auth;
use crate::services::calendar::{bucket_by_day, generate_feed, generate_ics, week_range, WeekView};
use crate::state::AppState;

// GET /api/calendar/week?date=
#[derive(Deserialize)]
pub struct WeekQuery {
    pub date: Option<NaiveDate>,
}

pub async fn week_view(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<WeekQuery>,
) -> Result<Json<WeekView>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let reference = query.date.unwrap_or_else(|| Local::now().date_naive());
    let out_of_range = || AppError::Validation(format!("date {reference} is out of range"));
    let (start, end) = week_range(reference).ok_or_else(out_of_range)?;
    let appointments = state.repos.appointments.in_range(start, end).await?;
    let view = bucket_by_day(&appointments, reference).ok_or_else(out_of_range)?;
    Ok(Json(view))
}

fn calendar_response(ics: String, filename: &str) -> Response {
    let disposition = format!("attachment; filename=\"{filename}\"");
    (
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8"),
            (header::CONTENT_DISPOSITION, disposition.as_str()),
        ],
        ics,
    )
        .into_response()
}

// GET /api/calendar/feed.ics
pub async fn calendar_feed(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let appointments = state.repos.appointments.list().await?;
    let catalog = state.repos.services.list().await?;
    let ics = generate_feed(&appointments, &catalog, &state.config.business_name);
    Ok(calendar_response(ics, "appointments.ics"))
}

// GET /api/calendar/:id
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    // Strip .ics suffix if present
    let raw = raw_id.strip_suffix(".ics").unwrap_or(&raw_id);
    let id: i64 = raw
        .parse()
        .map_err(|_| AppError::NotFound(format!("appointment {raw}")))?;

    let appointment = state.repos.appointments.get(id).await?;
    let service = match state.repos.services.get(appointment.service_id).await {
        Ok(service) => Some(service),
        Err(AppError::NotFound(_)) => None,
        Err(e) => return Err(e),
    };

    let ics = generate_ics(&appointment, service.as_ref(), &state.config.business_name);
    Ok(calendar_response(ics, &format!("appointment-{id}.ics")))
}
