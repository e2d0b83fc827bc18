use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::check_auth;
use crate::models::{Appointment, Client, ClientInput};
use crate::state::AppState;

// GET /api/clients
#[derive(Deserialize)]
pub struct ClientsQuery {
    pub search: Option<String>,
}

pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ClientsQuery>,
) -> Result<Json<Vec<Client>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let clients = state.repos.clients.list(query.search.as_deref()).await?;
    Ok(Json(clients))
}

// POST /api/clients
pub async fn create_client(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ClientInput>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let client = state.repos.clients.create(body).await?;
    tracing::info!(client_id = client.id, "client created");
    Ok((StatusCode::CREATED, Json(client)))
}

// GET /api/clients/:id
pub async fn get_client(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Client>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(state.repos.clients.get(id).await?))
}

// PUT /api/clients/:id
pub async fn update_client(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<ClientInput>,
) -> Result<Json<Client>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(state.repos.clients.update(id, body).await?))
}

// DELETE /api/clients/:id
pub async fn delete_client(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    state.repos.clients.delete(id).await?;
    tracing::info!(client_id = id, "client deleted");
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/clients/:id/appointments
pub async fn client_appointments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    state.repos.clients.get(id).await?;
    Ok(Json(state.repos.appointments.for_client(id).await?))
}
