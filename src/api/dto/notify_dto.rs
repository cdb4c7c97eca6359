//! Booking notification and relay introspection DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /api/v1/bookings/{booking_id}/notify`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NotifyBookingRequest {
    /// Event name delivered to the booking's participants.
    pub event: String,
    /// Arbitrary JSON payload; `null` when omitted.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

/// Response body for relay fan-out endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryResponse {
    /// Always `true` once the event has been handed to the relay.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Number of channels whose queue accepted the event.
    pub delivered: usize,
}
