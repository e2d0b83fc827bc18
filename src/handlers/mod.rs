pub mod appointments;
pub mod calendar;
pub mod clients;
pub mod health;
pub mod reports;
pub mod services;
pub mod staff;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Router;

use crate::errors::AppError;
use crate::state::AppState;

/// Every `/api` route requires `Authorization: Bearer <admin token>`.
pub fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/clients",
            get(clients::list_clients).post(clients::create_client),
        )
        .route(
            "/api/clients/:id",
            get(clients::get_client)
                .put(clients::update_client)
                .delete(clients::delete_client),
        )
        .route(
            "/api/clients/:id/appointments",
            get(clients::client_appointments),
        )
        .route(
            "/api/services",
            get(services::list_services).post(services::create_service),
        )
        .route(
            "/api/services/:id",
            get(services::get_service)
                .put(services::update_service)
                .delete(services::delete_service),
        )
        .route("/api/staff", get(staff::list_staff).post(staff::create_staff))
        .route("/api/staff/available", get(staff::available_staff))
        .route(
            "/api/staff/:id",
            get(staff::get_staff)
                .put(staff::update_staff)
                .delete(staff::delete_staff),
        )
        .route(
            "/api/appointments",
            get(appointments::list_appointments).post(appointments::create_appointment),
        )
        .route(
            "/api/appointments/:id",
            get(appointments::get_appointment)
                .put(appointments::update_appointment)
                .delete(appointments::delete_appointment),
        )
        .route(
            "/api/appointments/:id/status",
            post(appointments::change_status),
        )
        .route(
            "/api/appointments/:id/cancel",
            post(appointments::cancel_appointment),
        )
        .route("/api/calendar/week", get(calendar::week_view))
        .route("/api/calendar/feed.ics", get(calendar::calendar_feed))
        .route("/api/calendar/:id", get(calendar::download_ics))
        .route("/api/reports/summary", get(reports::summary))
        .route("/api/reports/dashboard", get(reports::dashboard))
        .with_state(state)
}
