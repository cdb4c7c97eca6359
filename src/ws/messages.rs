//! Inbound WebSocket frames and their payloads.
//!
//! Clients send `{"event": "<name>", "data": <payload>}`. Payload fields
//! are all optional: a frame is routed with whatever identifiers it
//! carries, and a field of the wrong shape is treated as absent.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::RelayError;

/// Raw inbound envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct WsEnvelope {
    /// Event name.
    pub event: String,
    /// Event payload; may be absent.
    #[serde(default)]
    pub data: Value,
}

/// `joinUser` payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JoinUser {
    /// Rider id.
    #[serde(deserialize_with = "lenient_id")]
    pub user_id: Option<String>,
    /// Booking the rider is following, if any.
    #[serde(deserialize_with = "lenient_id")]
    pub booking_id: Option<String>,
}

/// `joinBooking` payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JoinBooking {
    /// Driver vehicle id.
    #[serde(deserialize_with = "lenient_id")]
    pub vehicle_id: Option<String>,
    /// Booking being joined.
    #[serde(deserialize_with = "lenient_id")]
    pub booking_id: Option<String>,
}

/// `otpVerified` payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OtpVerified {
    /// Booking the OTP belongs to.
    #[serde(deserialize_with = "lenient_id")]
    pub booking_id: Option<String>,
    /// Verifying vehicle.
    #[serde(deserialize_with = "lenient_id")]
    pub vehicle_id: Option<String>,
    /// Verification outcome, read with loose truthiness.
    #[serde(deserialize_with = "truthy")]
    pub otp_verified: bool,
    /// Optional message overriding the default text.
    #[serde(deserialize_with = "lenient_text")]
    pub message: Option<String>,
}

/// `rideStatusUpdate` payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RideStatusUpdate {
    /// Booking whose status changed.
    #[serde(deserialize_with = "lenient_id")]
    pub booking_id: Option<String>,
    /// Reporting vehicle.
    #[serde(deserialize_with = "lenient_id")]
    pub vehicle_id: Option<String>,
    /// New status.
    #[serde(deserialize_with = "lenient_text")]
    pub status: Option<String>,
    /// Optional message.
    #[serde(deserialize_with = "lenient_text")]
    pub message: Option<String>,
}

/// `driverArrived` payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DriverArrived {
    /// Booking being picked up.
    #[serde(deserialize_with = "lenient_id")]
    pub booking_id: Option<String>,
    /// Arriving vehicle.
    #[serde(deserialize_with = "lenient_id")]
    pub vehicle_id: Option<String>,
    /// Opaque location value.
    pub location: Option<Value>,
}

/// `rideCompleted` payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RideCompleted {
    /// Completed booking.
    #[serde(deserialize_with = "lenient_id")]
    pub booking_id: Option<String>,
    /// Completing vehicle.
    #[serde(deserialize_with = "lenient_id")]
    pub vehicle_id: Option<String>,
    /// Opaque completion details.
    pub completion_data: Option<Value>,
}

/// Payload shared by `cancelRide` and `emergencyStop`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiderAction {
    /// Affected booking.
    #[serde(deserialize_with = "lenient_id")]
    pub booking_id: Option<String>,
    /// Acting rider.
    #[serde(deserialize_with = "lenient_id")]
    pub user_id: Option<String>,
    /// Optional message overriding the default text.
    #[serde(deserialize_with = "lenient_text")]
    pub message: Option<String>,
}

/// `requestDriverLocation` payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationRequest {
    /// Booking whose driver should report its location.
    #[serde(deserialize_with = "lenient_id")]
    pub booking_id: Option<String>,
}

/// Every inbound event the dispatcher understands.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// `joinDriver`: bare vehicle id or `{vehicleId}`.
    JoinDriver {
        /// Vehicle id, if one could be read.
        vehicle_id: Option<String>,
    },
    /// `joinUser`.
    JoinUser(JoinUser),
    /// `joinBooking`.
    JoinBooking(JoinBooking),
    /// `sendLocation`; the raw payload is forwarded verbatim.
    SendLocation(Value),
    /// `otpVerified`.
    OtpVerified(OtpVerified),
    /// `rideStatusUpdate`.
    RideStatusUpdate(RideStatusUpdate),
    /// `driverArrived`.
    DriverArrived(DriverArrived),
    /// `rideCompleted`.
    RideCompleted(RideCompleted),
    /// `requestDriverLocation`.
    RequestDriverLocation(LocationRequest),
    /// `cancelRide`.
    CancelRide(RiderAction),
    /// `emergencyStop`.
    EmergencyStop(RiderAction),
    /// `getActiveConnections`.
    GetActiveConnections,
}

impl InboundEvent {
    /// Decodes a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::MalformedFrame`] if the text is not a JSON
    /// envelope, or [`RelayError::UnknownEvent`] for an unrecognised name.
    pub fn parse(text: &str) -> Result<Self, RelayError> {
        let envelope: WsEnvelope =
            serde_json::from_str(text).map_err(|e| RelayError::MalformedFrame(e.to_string()))?;
        Self::from_envelope(envelope)
    }

    /// Interprets an already-decoded envelope.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::UnknownEvent`] for an unrecognised event name.
    pub fn from_envelope(envelope: WsEnvelope) -> Result<Self, RelayError> {
        let WsEnvelope { event, data } = envelope;
        let parsed = match event.as_str() {
            "joinDriver" => Self::JoinDriver {
                vehicle_id: id_from_value(&data)
                    .or_else(|| data.get("vehicleId").and_then(id_from_value)),
            },
            "joinUser" => Self::JoinUser(payload(data)),
            "joinBooking" => Self::JoinBooking(payload(data)),
            "sendLocation" => Self::SendLocation(data),
            "otpVerified" => Self::OtpVerified(payload(data)),
            "rideStatusUpdate" => Self::RideStatusUpdate(payload(data)),
            "driverArrived" => Self::DriverArrived(payload(data)),
            "rideCompleted" => Self::RideCompleted(payload(data)),
            "requestDriverLocation" => Self::RequestDriverLocation(payload(data)),
            "cancelRide" => Self::CancelRide(payload(data)),
            "emergencyStop" => Self::EmergencyStop(payload(data)),
            "getActiveConnections" => Self::GetActiveConnections,
            _ => return Err(RelayError::UnknownEvent(event)),
        };
        Ok(parsed)
    }

    /// Wire name of this event, for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::JoinDriver { .. } => "joinDriver",
            Self::JoinUser(_) => "joinUser",
            Self::JoinBooking(_) => "joinBooking",
            Self::SendLocation(_) => "sendLocation",
            Self::OtpVerified(_) => "otpVerified",
            Self::RideStatusUpdate(_) => "rideStatusUpdate",
            Self::DriverArrived(_) => "driverArrived",
            Self::RideCompleted(_) => "rideCompleted",
            Self::RequestDriverLocation(_) => "requestDriverLocation",
            Self::CancelRide(_) => "cancelRide",
            Self::EmergencyStop(_) => "emergencyStop",
            Self::GetActiveConnections => "getActiveConnections",
        }
    }
}

/// Decodes a payload struct, falling back to an empty one when `data`
/// is not an object.
fn payload<T: for<'de> Deserialize<'de> + Default>(data: Value) -> T {
    serde_json::from_value(data).unwrap_or_default()
}

/// Reads an opaque identifier from a JSON string or number.
fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(id_from_value(&value))
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    })
}

/// Loose truthiness as untyped clients mean it: `null`, `false`, `0`
/// and `""` are false; any other value, `"no"` included, is true.
fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn join_driver_accepts_bare_string() {
        let Ok(InboundEvent::JoinDriver { vehicle_id }) =
            InboundEvent::parse(r#"{"event":"joinDriver","data":"V1"}"#)
        else {
            panic!("expected joinDriver");
        };
        assert_eq!(vehicle_id.as_deref(), Some("V1"));
    }

    #[test]
    fn join_driver_accepts_object() {
        let Ok(InboundEvent::JoinDriver { vehicle_id }) =
            InboundEvent::parse(r#"{"event":"joinDriver","data":{"vehicleId":42}}"#)
        else {
            panic!("expected joinDriver");
        };
        assert_eq!(vehicle_id.as_deref(), Some("42"));
    }

    #[test]
    fn join_user_with_optional_booking() {
        let Ok(InboundEvent::JoinUser(join)) =
            InboundEvent::parse(r#"{"event":"joinUser","data":{"userId":"U1"}}"#)
        else {
            panic!("expected joinUser");
        };
        assert_eq!(join.user_id.as_deref(), Some("U1"));
        assert!(join.booking_id.is_none());
    }

    #[test]
    fn wrongly_typed_fields_are_treated_as_absent() {
        let Ok(InboundEvent::RideStatusUpdate(update)) = InboundEvent::parse(
            r#"{"event":"rideStatusUpdate","data":{"bookingId":"B1","vehicleId":["x"],"status":7}}"#,
        ) else {
            panic!("expected rideStatusUpdate");
        };
        assert_eq!(update.booking_id.as_deref(), Some("B1"));
        assert!(update.vehicle_id.is_none());
        assert!(update.status.is_none());
    }

    #[test]
    fn non_object_payload_falls_back_to_empty() {
        let Ok(InboundEvent::CancelRide(action)) =
            InboundEvent::parse(r#"{"event":"cancelRide","data":"oops"}"#)
        else {
            panic!("expected cancelRide");
        };
        assert!(action.booking_id.is_none());
    }

    #[test]
    fn missing_data_is_accepted() {
        assert!(matches!(
            InboundEvent::parse(r#"{"event":"getActiveConnections"}"#),
            Ok(InboundEvent::GetActiveConnections)
        ));
    }

    fn otp_flag(raw: &str) -> bool {
        let text = format!(r#"{{"event":"otpVerified","data":{{"bookingId":"B1","otpVerified":{raw}}}}}"#);
        let Ok(InboundEvent::OtpVerified(otp)) = InboundEvent::parse(&text) else {
            panic!("expected otpVerified");
        };
        otp.otp_verified
    }

    #[test]
    fn otp_flag_uses_loose_truthiness() {
        assert!(otp_flag("true"));
        assert!(otp_flag(r#""yes""#));
        assert!(otp_flag("1"));
        assert!(otp_flag("{}"));
        assert!(!otp_flag("false"));
        assert!(!otp_flag(r#""""#));
        assert!(!otp_flag("0"));
        assert!(!otp_flag("null"));
    }

    #[test]
    fn otp_flag_missing_is_false() {
        let Ok(InboundEvent::OtpVerified(otp)) =
            InboundEvent::parse(r#"{"event":"otpVerified","data":{"bookingId":"B1"}}"#)
        else {
            panic!("expected otpVerified");
        };
        assert!(!otp.otp_verified);
    }

    #[test]
    fn unknown_event_is_rejected() {
        assert!(matches!(
            InboundEvent::parse(r#"{"event":"teleport","data":{}}"#),
            Err(RelayError::UnknownEvent(name)) if name == "teleport"
        ));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            InboundEvent::parse("{not json"),
            Err(RelayError::MalformedFrame(_))
        ));
    }
}
