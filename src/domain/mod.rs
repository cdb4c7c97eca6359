//! Domain layer: channel handles, relay tables and outbound events.
//!
//! The three shared tables (connection registry, booking session map and
//! room router) are owned together by [`RelayState`]. Outbound events are
//! modelled by [`RideEvent`] and queued on connections as [`OutboundFrame`]s.

pub mod booking_sessions;
pub mod channel_id;
pub mod registry;
pub mod relay_state;
pub mod ride_event;
pub mod room_router;

pub use booking_sessions::{BookingSession, BookingSessions};
pub use channel_id::ChannelId;
pub use registry::{Connection, ConnectionRegistry};
pub use relay_state::RelayState;
pub use ride_event::{ActiveConnections, OutboundFrame, RideEvent};
pub use room_router::RoomRouter;
