use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

use salonbook::config::{AppConfig, StoreBackend};
use salonbook::db::SqliteStore;
use salonbook::errors::AppResult;
use salonbook::handlers;
use salonbook::models::{ClientInput, Schedule, ServiceInput, StaffInput};
use salonbook::state::AppState;
use salonbook::store::{EntityType, Filter, MemoryStore, Record, RecordStore};

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
        business_name: "Glow Studio".to_string(),
        store_backend: StoreBackend::Memory,
        store_timeout_ms: 1000,
        allow_double_booking: false,
        double_booking_roles: vec!["group instructor".to_string()],
        enforce_staff_schedule: true,
    }
}

fn test_state() -> Arc<AppState> {
    Arc::new(AppState::new(test_config(), Arc::new(MemoryStore::new())))
}

fn test_app(state: Arc<AppState>) -> Router {
    handlers::router(state)
}

struct Seeded {
    client_id: i64,
    trim_id: i64,
    color_id: i64,
    stylist_id: i64,
}

/// One client, two services and a stylist working Tuesdays 09:00-17:00.
async fn seed(state: &AppState) -> Seeded {
    let client = state
        .repos
        .clients
        .create(ClientInput {
            name: "Sarah Johnson".to_string(),
            phone: "(555) 123-4567".to_string(),
            email: Some("sarah@example.com".to_string()),
            preferences: None,
            notes: None,
        })
        .await
        .unwrap();
    let trim = state
        .repos
        .services
        .create(ServiceInput {
            name: "Trim".to_string(),
            category: "Hair".to_string(),
            description: None,
            price: dec!(30),
            duration_minutes: 30,
        })
        .await
        .unwrap();
    let color = state
        .repos
        .services
        .create(ServiceInput {
            name: "Color".to_string(),
            category: "Hair".to_string(),
            description: None,
            price: dec!(85.50),
            duration_minutes: 60,
        })
        .await
        .unwrap();
    let stylist = state
        .repos
        .staff
        .create(StaffInput {
            name: "Maya".to_string(),
            role: "Stylist".to_string(),
            email: None,
            phone: None,
            schedule: Schedule::from_json(r#"{"mon":"off","tue":["09:00","17:00"]}"#).unwrap(),
        })
        .await
        .unwrap();

    Seeded {
        client_id: client.id,
        trim_id: trim.id,
        color_id: color.id,
        stylist_id: stylist.id,
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", "Bearer test-token")
        .body(Body::empty())
        .unwrap()
}

fn send(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", "Bearer test-token")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(res: Response<Body>) -> Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn body_text(res: Response<Body>) -> String {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

/// Books `service_id` with the seeded stylist on Tuesday 2025-06-17.
async fn book(state: &Arc<AppState>, seeded: &Seeded, service_id: i64, start: &str) -> Response<Body> {
    test_app(state.clone())
        .oneshot(send(
            "POST",
            "/api/appointments",
            json!({
                "client_id": seeded.client_id,
                "staff_id": seeded.stylist_id,
                "service_id": service_id,
                "date": "2025-06-17",
                "start_time": start,
            }),
        ))
        .await
        .unwrap()
}

// ── Auth & Health ──

#[tokio::test]
async fn test_health() {
    let res = test_app(test_state())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "ok");
}

#[tokio::test]
async fn test_api_requires_auth() {
    let res = test_app(test_state())
        .oneshot(
            Request::builder()
                .uri("/api/clients")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_api_wrong_token() {
    let res = test_app(test_state())
        .oneshot(
            Request::builder()
                .uri("/api/appointments")
                .header("Authorization", "Bearer wrong-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["error"], "unauthorized");
}

// ── Clients, Services, Staff ──

#[tokio::test]
async fn test_client_crud_and_search() {
    let state = test_state();

    let res = test_app(state.clone())
        .oneshot(send(
            "POST",
            "/api/clients",
            json!({"name": "Michael Chen", "phone": "555-9876", "email": "mchen@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let id = body_json(res).await["id"].as_i64().unwrap();

    let res = test_app(state.clone())
        .oneshot(send(
            "PUT",
            &format!("/api/clients/{id}"),
            json!({"name": "Michael Chen", "phone": "555-9876", "preferences": "Short fades"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["preferences"], "Short fades");

    let res = test_app(state.clone())
        .oneshot(get("/api/clients?search=CHEN"))
        .await
        .unwrap();
    assert_eq!(body_json(res).await.as_array().unwrap().len(), 1);

    let res = test_app(state.clone())
        .oneshot(get("/api/clients?search=nobody"))
        .await
        .unwrap();
    assert!(body_json(res).await.as_array().unwrap().is_empty());

    let res = test_app(state.clone())
        .oneshot(send("DELETE", &format!("/api/clients/{id}"), json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = test_app(state)
        .oneshot(get(&format!("/api/clients/{id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_client_validation() {
    let res = test_app(test_state())
        .oneshot(send("POST", "/api/clients", json!({"name": "", "phone": "555"})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_services_by_category() {
    let state = test_state();
    seed(&state).await;
    let res = test_app(state.clone())
        .oneshot(send(
            "POST",
            "/api/services",
            json!({"name": "Gel Manicure", "category": "Nails", "price": 40, "duration_minutes": 45}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = test_app(state.clone())
        .oneshot(get("/api/services?category=nails"))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["name"], "Gel Manicure");

    let res = test_app(state)
        .oneshot(send(
            "POST",
            "/api/services",
            json!({"name": "Free", "price": -5, "duration_minutes": 10}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_staff_schedule_and_availability() {
    let state = test_state();
    let seeded = seed(&state).await;

    let res = test_app(state.clone())
        .oneshot(send(
            "POST",
            "/api/staff",
            json!({"name": "Lena", "role": "Esthetician", "schedule": {"tue": ["12:00", "20:00"]}}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    assert_eq!(json["schedule"]["tue"][0], "12:00");
    let lena = json["id"].as_i64().unwrap();

    // 2025-06-16 is a Monday, Maya is off and Lena has no hours
    let res = test_app(state.clone())
        .oneshot(get("/api/staff/available?date=2025-06-16&time=10:00"))
        .await
        .unwrap();
    assert!(body_json(res).await.as_array().unwrap().is_empty());

    let res = test_app(state.clone())
        .oneshot(get("/api/staff/available?date=2025-06-17&time=13:00"))
        .await
        .unwrap();
    let ids: Vec<i64> = body_json(res)
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![seeded.stylist_id, lena]);

    // booked staff drop out when asked
    assert_eq!(book(&state, &seeded, seeded.color_id, "12:30").await.status(), StatusCode::CREATED);
    let res = test_app(state.clone())
        .oneshot(get("/api/staff/available?date=2025-06-17&time=13:00&exclude_booked=true"))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["id"], lena);

    let res = test_app(state.clone())
        .oneshot(get("/api/staff?role=stylist"))
        .await
        .unwrap();
    assert_eq!(body_json(res).await.as_array().unwrap().len(), 1);

    let res = test_app(state)
        .oneshot(get("/api/staff/available?date=2025-06-17&time=25:00"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_staff_invalid_schedule_rejected() {
    let res = test_app(test_state())
        .oneshot(send(
            "POST",
            "/api/staff",
            json!({"name": "Lena", "schedule": {"tue": ["17:00", "09:00"]}}),
        ))
        .await
        .unwrap();
    assert!(res.status().is_client_error());
}

// ── Booking ──

#[tokio::test]
async fn test_booking_then_conflict() {
    let state = test_state();
    let seeded = seed(&state).await;

    let res = book(&state, &seeded, seeded.trim_id, "09:00").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    assert_eq!(json["end_time"], "09:30");
    assert_eq!(json["status"], "pending");

    let res = book(&state, &seeded, seeded.trim_id, "09:15").await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let json = body_json(res).await;
    assert!(json["error"].as_str().unwrap().contains("already booked"));

    let res = book(&state, &seeded, seeded.trim_id, "09:30").await;
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_booking_outside_hours_rejected() {
    let state = test_state();
    let seeded = seed(&state).await;

    let res = book(&state, &seeded, seeded.color_id, "16:30").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert!(json["error"].as_str().unwrap().contains("Tue: 09:00-17:00"));
}

#[tokio::test]
async fn test_booking_unknown_service() {
    let state = test_state();
    let seeded = seed(&state).await;
    let res = book(&state, &seeded, 999, "10:00").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_booking_past_midnight_rejected() {
    let state = Arc::new(AppState::new(
        AppConfig {
            enforce_staff_schedule: false,
            ..test_config()
        },
        Arc::new(MemoryStore::new()),
    ));
    let seeded = seed(&state).await;
    let res = book(&state, &seeded, seeded.color_id, "23:30").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert!(json["error"].as_str().unwrap().contains("midnight"));
}

#[tokio::test]
async fn test_status_transitions() {
    let state = test_state();
    let seeded = seed(&state).await;
    let id = body_json(book(&state, &seeded, seeded.trim_id, "10:00").await).await["id"]
        .as_i64()
        .unwrap();

    for status in ["confirmed", "completed"] {
        let res = test_app(state.clone())
            .oneshot(send(
                "POST",
                &format!("/api/appointments/{id}/status"),
                json!({ "status": status }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["status"], status);
    }

    let res = test_app(state.clone())
        .oneshot(send(
            "POST",
            &format!("/api/appointments/{id}/status"),
            json!({ "status": "pending" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = test_app(state)
        .oneshot(send(
            "POST",
            &format!("/api/appointments/{id}/status"),
            json!({ "status": "no-show" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_frees_slot_and_blocks_reschedule() {
    let state = test_state();
    let seeded = seed(&state).await;
    let id = body_json(book(&state, &seeded, seeded.trim_id, "09:00").await).await["id"]
        .as_i64()
        .unwrap();

    let res = test_app(state.clone())
        .oneshot(send("POST", &format!("/api/appointments/{id}/cancel"), json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "cancelled");

    assert_eq!(
        book(&state, &seeded, seeded.trim_id, "09:15").await.status(),
        StatusCode::CREATED
    );

    let res = test_app(state)
        .oneshot(send(
            "PUT",
            &format!("/api/appointments/{id}"),
            json!({ "start_time": "11:00" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_reschedule_recomputes_end_time() {
    let state = test_state();
    let seeded = seed(&state).await;
    let id = body_json(book(&state, &seeded, seeded.trim_id, "09:00").await).await["id"]
        .as_i64()
        .unwrap();

    let res = test_app(state.clone())
        .oneshot(send(
            "PUT",
            &format!("/api/appointments/{id}"),
            json!({ "service_id": seeded.color_id, "start_time": "13:00", "notes": "Balayage" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["start_time"], "13:00");
    assert_eq!(json["end_time"], "14:00");
    assert_eq!(json["notes"], "Balayage");
    assert!(json["updated_at"].is_string());

    let res = test_app(state)
        .oneshot(get(&format!("/api/appointments/{id}")))
        .await
        .unwrap();
    assert_eq!(body_json(res).await["service_id"], seeded.color_id);
}

#[tokio::test]
async fn test_list_appointments_filters() {
    let state = test_state();
    let seeded = seed(&state).await;
    book(&state, &seeded, seeded.trim_id, "14:00").await;
    book(&state, &seeded, seeded.trim_id, "09:00").await;

    let res = test_app(state.clone())
        .oneshot(get(&format!(
            "/api/appointments?from=2025-06-16&to=2025-06-22&staff_id={}",
            seeded.stylist_id
        )))
        .await
        .unwrap();
    let json = body_json(res).await;
    let starts: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["start_time"].as_str().unwrap())
        .collect();
    assert_eq!(starts, vec!["09:00", "14:00"]);

    let res = test_app(state.clone())
        .oneshot(get("/api/appointments?from=2025-06-18"))
        .await
        .unwrap();
    assert!(body_json(res).await.as_array().unwrap().is_empty());

    let res = test_app(state)
        .oneshot(get(&format!("/api/clients/{}/appointments", seeded.client_id)))
        .await
        .unwrap();
    assert_eq!(body_json(res).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_delete_appointment() {
    let state = test_state();
    let seeded = seed(&state).await;
    let id = body_json(book(&state, &seeded, seeded.trim_id, "09:00").await).await["id"]
        .as_i64()
        .unwrap();

    let res = test_app(state.clone())
        .oneshot(send("DELETE", &format!("/api/appointments/{id}"), json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = test_app(state)
        .oneshot(send("DELETE", &format!("/api/appointments/{id}"), json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

// ── Calendar ──

#[tokio::test]
async fn test_week_view() {
    let state = test_state();
    let seeded = seed(&state).await;
    book(&state, &seeded, seeded.trim_id, "15:00").await;
    book(&state, &seeded, seeded.trim_id, "09:00").await;

    let res = test_app(state)
        .oneshot(get("/api/calendar/week?date=2025-06-19"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["week_start"], "2025-06-16");
    let days = json["days"].as_array().unwrap();
    assert_eq!(days.len(), 7);
    assert_eq!(days[1]["weekday"], "Tuesday");
    let tuesday = days[1]["appointments"].as_array().unwrap();
    assert_eq!(tuesday.len(), 2);
    assert_eq!(tuesday[0]["start_time"], "09:00");
    assert!(days[0]["appointments"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_week_view_rejects_date_at_calendar_end() {
    let res = test_app(test_state())
        .oneshot(get("/api/calendar/week?date=%2B262142-12-31"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert!(json["error"].as_str().unwrap().contains("out of range"));
}

#[tokio::test]
async fn test_calendar_not_found() {
    let res = test_app(test_state())
        .oneshot(get("/api/calendar/424242.ics"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_calendar_download() {
    let state = test_state();
    let seeded = seed(&state).await;
    let id = body_json(book(&state, &seeded, seeded.color_id, "14:00").await).await["id"]
        .as_i64()
        .unwrap();

    let res = test_app(state)
        .oneshot(get(&format!("/api/calendar/{id}.ics")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        "text/calendar; charset=utf-8"
    );

    let text = body_text(res).await;
    assert!(text.contains("BEGIN:VCALENDAR"));
    assert!(text.contains("DTSTART:20250617T140000"));
    assert!(text.contains("DTEND:20250617T150000"));
    assert!(text.contains("SUMMARY:Color at Glow Studio"));
    assert!(text.contains("STATUS:TENTATIVE"));
}

#[tokio::test]
async fn test_calendar_feed_skips_cancelled() {
    let state = test_state();
    let seeded = seed(&state).await;
    book(&state, &seeded, seeded.trim_id, "09:00").await;
    let cancelled = body_json(book(&state, &seeded, seeded.trim_id, "11:00").await).await["id"]
        .as_i64()
        .unwrap();
    state.bookings.cancel(cancelled).await.unwrap();

    let res = test_app(state)
        .oneshot(get("/api/calendar/feed.ics"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let text = body_text(res).await;
    assert_eq!(text.matches("BEGIN:VEVENT").count(), 1);
}

// ── Reports ──

#[tokio::test]
async fn test_reports_summary_and_dashboard() {
    let state = test_state();
    let seeded = seed(&state).await;
    for (service, start) in [(seeded.trim_id, "09:00"), (seeded.color_id, "10:00"), (seeded.trim_id, "12:00")] {
        let id = body_json(book(&state, &seeded, service, start).await).await["id"]
            .as_i64()
            .unwrap();
        if start != "12:00" {
            state
                .bookings
                .change_status(id, salonbook::models::AppointmentStatus::Confirmed)
                .await
                .unwrap();
            state
                .bookings
                .change_status(id, salonbook::models::AppointmentStatus::Completed)
                .await
                .unwrap();
        }
    }

    let res = test_app(state.clone())
        .oneshot(get("/api/reports/summary?range=month&date=2025-06-20"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["revenue"].as_f64(), Some(115.5));
    assert_eq!(json["appointment_count"], 3);
    assert_eq!(json["completed_count"], 2);
    assert_eq!(json["status_counts"]["pending"], 1);
    assert_eq!(json["popular_services"][0]["name"], "Trim");
    assert_eq!(json["monthly_revenue"].as_array().unwrap().len(), 6);
    assert_eq!(json["monthly_revenue"][5]["month"], "2025-06");

    let res = test_app(state.clone())
        .oneshot(get("/api/reports/summary?range=week&date=2025-06-30"))
        .await
        .unwrap();
    assert_eq!(body_json(res).await["revenue"].as_f64(), Some(0.0));

    let res = test_app(state)
        .oneshot(get("/api/reports/dashboard?date=2025-06-17"))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json["todays_appointments"].as_array().unwrap().len(), 3);
    assert_eq!(json["pending_count"], 1);
    assert_eq!(json["active_clients"], 1);
    assert_eq!(json["total_revenue"].as_f64(), Some(115.5));
}

#[tokio::test]
async fn test_reports_reject_unknown_range() {
    let res = test_app(test_state())
        .oneshot(get("/api/reports/summary?range=decade"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// ── Storage backends ──

#[tokio::test]
async fn test_booking_with_sqlite_store() {
    let state = Arc::new(AppState::new(
        AppConfig {
            store_backend: StoreBackend::Sqlite,
            ..test_config()
        },
        Arc::new(SqliteStore::open(":memory:").unwrap()),
    ));
    let seeded = seed(&state).await;

    assert_eq!(
        book(&state, &seeded, seeded.trim_id, "09:00").await.status(),
        StatusCode::CREATED
    );
    assert_eq!(
        book(&state, &seeded, seeded.trim_id, "09:15").await.status(),
        StatusCode::CONFLICT
    );
}

struct StalledStore;

#[async_trait]
impl RecordStore for StalledStore {
    async fn fetch_all(&self, _: EntityType, _: &[&str]) -> AppResult<Vec<Record>> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(vec![])
    }
    async fn fetch_by_id(&self, _: EntityType, _: i64, _: &[&str]) -> AppResult<Option<Record>> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(None)
    }
    async fn create(&self, _: EntityType, record: Record) -> AppResult<Record> {
        Ok(record)
    }
    async fn update(&self, _: EntityType, _: i64, _: Record) -> AppResult<Option<Record>> {
        Ok(None)
    }
    async fn delete(&self, _: EntityType, ids: &[i64]) -> AppResult<Vec<bool>> {
        Ok(vec![false; ids.len()])
    }
    async fn query(&self, _: EntityType, _: &[&str], _: &[Filter]) -> AppResult<Vec<Record>> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(vec![])
    }
}

#[tokio::test]
async fn test_stalled_store_returns_gateway_timeout() {
    let state = Arc::new(AppState::new(
        AppConfig {
            store_timeout_ms: 50,
            ..test_config()
        },
        Arc::new(StalledStore),
    ));
    let res = test_app(state)
        .oneshot(get("/api/clients"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    assert!(body_json(res).await["error"]
        .as_str()
        .unwrap()
        .contains("timed out"));
}
