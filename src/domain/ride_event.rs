//! Outbound ride events and their wire payloads.
//!
//! Every event the relay emits is a [`RideEvent`]. Event names and
//! payload field names are part of the client compatibility surface, so
//! each payload struct serializes in `camelCase` exactly as listeners
//! expect. Optional fields are omitted rather than sent as `null`.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

/// Returns the current time as an ISO-8601 string with millisecond
/// precision and a `Z` suffix (`2026-10-19T08:15:30.123Z`).
#[must_use]
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A serialized event ready to be queued on a connection.
///
/// Wire shape: `{"event": "<name>", "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundFrame {
    /// Event name as seen by the client.
    pub event: String,
    /// Event payload.
    pub data: Value,
}

impl OutboundFrame {
    /// Encodes the frame as JSON text.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// `otpVerificationStatus` payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpVerificationStatus {
    /// Booking the OTP belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    /// Vehicle that performed the verification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
    /// Verification outcome.
    pub otp_verified: bool,
    /// Human-readable message.
    pub message: String,
    /// Emission time.
    pub timestamp: String,
}

/// `rideStatusChanged` payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideStatusChanged {
    /// Booking whose status changed.
    pub booking_id: String,
    /// Vehicle bound to the booking, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
    /// New ride status (`"enroute"`, `"cancelled"`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Optional human-readable message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Emission time.
    pub timestamp: String,
}

/// `driverArrivedAtPickup` payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverArrivedAtPickup {
    /// Booking being picked up.
    pub booking_id: String,
    /// Arriving vehicle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
    /// Opaque location value as sent by the driver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    /// Human-readable message.
    pub message: String,
    /// Emission time.
    pub timestamp: String,
}

/// `rideCompletedNotification` payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideCompletedNotification {
    /// Completed booking.
    pub booking_id: String,
    /// Vehicle that completed the ride.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
    /// Opaque completion details (fare, distance, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_data: Option<Value>,
    /// Human-readable message.
    pub message: String,
    /// Emission time.
    pub timestamp: String,
}

/// Payload shared by `cancelRide` and `rideCancelled`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideCancellation {
    /// Cancelled booking.
    pub booking_id: String,
    /// Rider that cancelled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Vehicle that was bound to the booking, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
    /// Human-readable message.
    pub message: String,
    /// Emission time.
    pub timestamp: String,
    /// Party that cancelled; always `"user"`.
    pub cancelled_by: &'static str,
}

/// Payload shared by `emergencyStop` and `emergencyStopTriggered`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyStopNotice {
    /// Affected booking.
    pub booking_id: String,
    /// Rider that triggered the stop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Vehicle that was bound to the booking, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
    /// Human-readable message.
    pub message: String,
    /// Emission time.
    pub timestamp: String,
}

/// `activeConnectionsInfo` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActiveConnections {
    /// Vehicle ids with a live driver channel.
    pub active_drivers: Vec<String>,
    /// Number of riders with a live channel.
    pub active_users_count: usize,
    /// Booking ids currently tracked by the session map.
    pub active_bookings: Vec<String>,
}

/// Every event the relay can emit.
#[derive(Debug, Clone)]
pub enum RideEvent {
    /// Driver location, forwarded verbatim as `sendLocation`.
    Location(Value),
    /// `otpVerificationStatus`.
    OtpVerificationStatus(OtpVerificationStatus),
    /// `rideStatusChanged`.
    RideStatusChanged(RideStatusChanged),
    /// `driverArrivedAtPickup`.
    DriverArrivedAtPickup(DriverArrivedAtPickup),
    /// `rideCompletedNotification`.
    RideCompletedNotification(RideCompletedNotification),
    /// `cancelRide`.
    CancelRide(RideCancellation),
    /// `rideCancelled`, alias of [`RideEvent::CancelRide`].
    RideCancelled(RideCancellation),
    /// `emergencyStop`.
    EmergencyStop(EmergencyStopNotice),
    /// `emergencyStopTriggered`, alias of [`RideEvent::EmergencyStop`].
    EmergencyStopTriggered(EmergencyStopNotice),
    /// `locationRequested`, sent to a single driver.
    LocationRequested {
        /// Booking whose rider asked for the location.
        booking_id: String,
    },
    /// `activeConnectionsInfo`, sent only to the requester.
    ActiveConnectionsInfo(ActiveConnections),
    /// `test-event`, emitted to every connection.
    TestEvent {
        /// Free-form message.
        message: String,
    },
    /// Arbitrary event pushed by an external collaborator.
    Custom {
        /// Event name.
        name: String,
        /// Event payload.
        data: Value,
    },
}

impl RideEvent {
    /// Returns the wire event name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Location(_) => "sendLocation",
            Self::OtpVerificationStatus(_) => "otpVerificationStatus",
            Self::RideStatusChanged(_) => "rideStatusChanged",
            Self::DriverArrivedAtPickup(_) => "driverArrivedAtPickup",
            Self::RideCompletedNotification(_) => "rideCompletedNotification",
            Self::CancelRide(_) => "cancelRide",
            Self::RideCancelled(_) => "rideCancelled",
            Self::EmergencyStop(_) => "emergencyStop",
            Self::EmergencyStopTriggered(_) => "emergencyStopTriggered",
            Self::LocationRequested { .. } => "locationRequested",
            Self::ActiveConnectionsInfo(_) => "activeConnectionsInfo",
            Self::TestEvent { .. } => "test-event",
            Self::Custom { name, .. } => name.as_str(),
        }
    }

    /// Returns the JSON payload.
    #[must_use]
    pub fn payload(&self) -> Value {
        let value = match self {
            Self::Location(data) | Self::Custom { data, .. } => Ok(data.clone()),
            Self::OtpVerificationStatus(p) => serde_json::to_value(p),
            Self::RideStatusChanged(p) => serde_json::to_value(p),
            Self::DriverArrivedAtPickup(p) => serde_json::to_value(p),
            Self::RideCompletedNotification(p) => serde_json::to_value(p),
            Self::CancelRide(p) | Self::RideCancelled(p) => serde_json::to_value(p),
            Self::EmergencyStop(p) | Self::EmergencyStopTriggered(p) => serde_json::to_value(p),
            Self::LocationRequested { booking_id } => {
                Ok(serde_json::json!({ "bookingId": booking_id }))
            }
            Self::ActiveConnectionsInfo(p) => serde_json::to_value(p),
            Self::TestEvent { message } => Ok(serde_json::json!({ "message": message })),
        };
        value.unwrap_or_default()
    }

    /// Builds the wire frame for this event.
    #[must_use]
    pub fn to_frame(&self) -> OutboundFrame {
        OutboundFrame {
            event: self.name().to_string(),
            data: self.payload(),
        }
    }
}
