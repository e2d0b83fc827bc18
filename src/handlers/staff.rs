use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::check_auth;
use crate::models::time::parse_hhmm;
use crate::models::{StaffInput, StaffMember};
use crate::services::availability::{available_staff as working_at, free_staff};
use crate::state::AppState;

// GET /api/staff
#[derive(Deserialize)]
pub struct StaffQuery {
    pub role: Option<String>,
}

pub async fn list_staff(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<StaffQuery>,
) -> Result<Json<Vec<StaffMember>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let staff = match query.role.as_deref().filter(|r| !r.trim().is_empty()) {
        Some(role) => state.repos.staff.by_role(role).await?,
        None => state.repos.staff.list().await?,
    };
    Ok(Json(staff))
}

// POST /api/staff
pub async fn create_staff(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<StaffInput>,
) -> Result<(StatusCode, Json<StaffMember>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let member = state.repos.staff.create(body).await?;
    tracing::info!(staff_id = member.id, role = %member.role, "staff member created");
    Ok((StatusCode::CREATED, Json(member)))
}

// GET /api/staff/:id
pub async fn get_staff(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<StaffMember>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(state.repos.staff.get(id).await?))
}

// PUT /api/staff/:id
pub async fn update_staff(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<StaffInput>,
) -> Result<Json<StaffMember>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(state.repos.staff.update(id, body).await?))
}

// DELETE /api/staff/:id
pub async fn delete_staff(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    state.repos.staff.delete(id).await?;
    tracing::info!(staff_id = id, "staff member deleted");
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/staff/available?date=&time=
#[derive(Deserialize)]
pub struct AvailableQuery {
    pub date: NaiveDate,
    pub time: String,
    #[serde(default)]
    pub exclude_booked: bool,
}

pub async fn available_staff(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AvailableQuery>,
) -> Result<Json<Vec<StaffMember>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let time = parse_hhmm(&query.time)?;
    let roster = state.repos.staff.list().await?;

    let available = if query.exclude_booked {
        let booked = state
            .repos
            .appointments
            .in_range(query.date, query.date)
            .await?;
        free_staff(query.date, time, &roster, &booked)
    } else {
        working_at(query.date, time, &roster)
    };

    Ok(Json(available.into_iter().cloned().collect()))
}
