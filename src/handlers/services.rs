use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::check_auth;
use crate::models::{Service, ServiceInput};
use crate::state::AppState;

// GET /api/services
#[derive(Deserialize)]
pub struct ServicesQuery {
    pub category: Option<String>,
}

pub async fn list_services(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ServicesQuery>,
) -> Result<Json<Vec<Service>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let services = match query.category.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(category) => state.repos.services.by_category(category).await?,
        None => state.repos.services.list().await?,
    };
    Ok(Json(services))
}

// POST /api/services
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ServiceInput>,
) -> Result<(StatusCode, Json<Service>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let service = state.repos.services.create(body).await?;
    tracing::info!(service_id = service.id, name = %service.name, "service created");
    Ok((StatusCode::CREATED, Json(service)))
}

// GET /api/services/:id
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Service>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(state.repos.services.get(id).await?))
}

// PUT /api/services/:id
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<ServiceInput>,
) -> Result<Json<Service>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(state.repos.services.update(id, body).await?))
}

// DELETE /api/services/:id
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    state.repos.services.delete(id).await?;
    tracing::info!(service_id = id, "service deleted");
    Ok(StatusCode::NO_CONTENT)
}
