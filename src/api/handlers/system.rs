//! System endpoints: health check and relay smoke test.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::dto::DeliveryResponse;
use crate::app_state::AppState;
use crate::domain::RideEvent;
use crate::domain::ride_event::iso_timestamp;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    service: String,
    timestamp: String,
    uptime_secs: u64,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service status, version, uptime and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK".to_string(),
            service: env!("CARGO_PKG_NAME").to_string(),
            timestamp: iso_timestamp(),
            uptime_secs: state.started_at.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `POST /test/emit` — Emit a `test-event` to every connected client.
#[utoipa::path(
    post,
    path = "/api/v1/test/emit",
    tag = "System",
    summary = "Emit test event",
    description = "Sends `test-event` with `{\"message\": \"testing\"}` to every live WebSocket connection.",
    responses(
        (status = 200, description = "Event emitted", body = DeliveryResponse),
    )
)]
pub async fn test_emit_handler(State(state): State<AppState>) -> impl IntoResponse {
    let event = RideEvent::TestEvent {
        message: "testing".to_string(),
    };
    let delivered = state.dispatcher.emit_to_all(&event).await;
    Json(DeliveryResponse {
        success: true,
        message: "test event emitted".to_string(),
        delivered,
    })
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}

/// System routes mounted under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/test/emit", post(test_emit_handler))
}
