//! Relay endpoints for collaborators outside the WebSocket path.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{DeliveryResponse, NotifyBookingRequest};
use crate::app_state::AppState;
use crate::domain::{ActiveConnections, RideEvent};
use crate::error::{ErrorResponse, RelayError};

/// `POST /bookings/{booking_id}/notify` — Push an event to a booking's participants.
///
/// # Errors
///
/// Returns [`RelayError::InvalidRequest`] if the event name is blank.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{booking_id}/notify",
    tag = "Relay",
    summary = "Notify a booking's participants",
    description = "Broadcasts the given event to every channel in the booking's group. Delivery is best effort; channels that are closing or backed up are skipped.",
    params(
        ("booking_id" = String, Path, description = "Booking identifier"),
    ),
    request_body = NotifyBookingRequest,
    responses(
        (status = 202, description = "Event handed to the relay", body = DeliveryResponse),
        (status = 400, description = "Blank event name", body = ErrorResponse),
    )
)]
pub async fn notify_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
    Json(req): Json<NotifyBookingRequest>,
) -> Result<impl IntoResponse, RelayError> {
    let name = req.event.trim();
    if name.is_empty() {
        return Err(RelayError::InvalidRequest(
            "event name must not be empty".to_string(),
        ));
    }

    let event = RideEvent::Custom {
        name: name.to_string(),
        data: req.data,
    };
    let delivered = state.dispatcher.notify_booking(&booking_id, &event).await;
    tracing::info!(%booking_id, event = name, delivered, "booking notified");

    Ok((
        StatusCode::ACCEPTED,
        Json(DeliveryResponse {
            success: true,
            message: format!("{name} sent to booking {booking_id}"),
            delivered,
        }),
    ))
}

/// `GET /connections` — Snapshot of live drivers, riders and tracked bookings.
#[utoipa::path(
    get,
    path = "/api/v1/connections",
    tag = "Relay",
    summary = "Active connections",
    description = "Same snapshot a WebSocket client receives in reply to `getActiveConnections`.",
    responses(
        (status = 200, description = "Current relay snapshot", body = ActiveConnections),
    )
)]
pub async fn active_connections(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.dispatcher.active_connections().await)
}

/// Relay routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings/{booking_id}/notify", post(notify_booking))
        .route("/connections", get(active_connections))
}
