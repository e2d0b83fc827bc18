use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::check_auth;
use crate::services::reports::{self, Dashboard, ReportRange, ReportSummary};
use crate::state::AppState;

// GET /api/reports/summary?range=&date=
#[derive(Deserialize)]
pub struct SummaryQuery {
    #[serde(default)]
    pub range: ReportRange,
    pub date: Option<NaiveDate>,
}

pub async fn summary(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<ReportSummary>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let reference = query.date.unwrap_or_else(|| Local::now().date_naive());
    let appointments = state.repos.appointments.list().await?;
    let catalog = state.repos.services.list().await?;
    Ok(Json(reports::summary(
        &appointments,
        &catalog,
        query.range,
        reference,
    )))
}

// GET /api/reports/dashboard?date=
#[derive(Deserialize)]
pub struct DashboardQuery {
    pub date: Option<NaiveDate>,
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Dashboard>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let today = query.date.unwrap_or_else(|| Local::now().date_naive());
    let appointments = state.repos.appointments.list().await?;
    let catalog = state.repos.services.list().await?;
    let clients = state.repos.clients.count().await?;
    Ok(Json(reports::dashboard(&appointments, &catalog, clients, today)))
}
