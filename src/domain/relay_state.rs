//! Single owner of all shared relay tables.
//!
//! [`RelayState`] bundles the [`ConnectionRegistry`], [`BookingSessions`]
//! and [`RoomRouter`] so they are mutated through one access point. The
//! dispatcher holds it behind one lock; nothing else touches these tables.

use tokio::sync::mpsc;

use super::ChannelId;
use super::booking_sessions::BookingSessions;
use super::registry::ConnectionRegistry;
use super::ride_event::{ActiveConnections, OutboundFrame, RideEvent};
use super::room_router::RoomRouter;

/// Registry, session map and group table for one process.
#[derive(Debug, Default)]
pub struct RelayState {
    registry: ConnectionRegistry,
    sessions: BookingSessions,
    router: RoomRouter,
}

impl RelayState {
    /// Creates empty relay tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the connection registry.
    #[must_use]
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Write access to the connection registry.
    pub fn registry_mut(&mut self) -> &mut ConnectionRegistry {
        &mut self.registry
    }

    /// Read access to the booking session map.
    #[must_use]
    pub fn sessions(&self) -> &BookingSessions {
        &self.sessions
    }

    /// Write access to the booking session map.
    pub fn sessions_mut(&mut self) -> &mut BookingSessions {
        &mut self.sessions
    }

    /// Read access to the group table.
    #[must_use]
    pub fn router(&self) -> &RoomRouter {
        &self.router
    }

    /// Registers a freshly accepted channel.
    pub fn connect(&mut self, channel: ChannelId, outbox: mpsc::Sender<OutboundFrame>) {
        self.registry.connect(channel, outbox);
    }

    /// Adds `channel` to `group` and records the membership on the connection.
    pub fn join(&mut self, channel: ChannelId, group: &str) {
        self.router.join(channel, group);
        if let Some(conn) = self.registry.connection_mut(channel) {
            conn.groups.insert(group.to_string());
        }
    }

    /// Removes a closed channel from the registry and from every group it
    /// joined. Booking sessions are left untouched.
    pub fn disconnect(&mut self, channel: ChannelId) {
        let Some(conn) = self.registry.unbind(channel) else {
            return;
        };
        for group in &conn.groups {
            self.router.leave(channel, group);
        }
    }

    /// Broadcasts `event` to `group`, optionally excluding one channel.
    pub fn broadcast(&self, group: &str, event: &RideEvent, except: Option<ChannelId>) -> usize {
        self.router
            .broadcast(&self.registry, group, &event.to_frame(), except)
    }

    /// Sends `event` to every live connection.
    pub fn emit_to_all(&self, event: &RideEvent) -> usize {
        self.router.emit_to_all(&self.registry, &event.to_frame())
    }

    /// Sends `event` to a single channel.
    pub fn send_to(&self, channel: ChannelId, event: &RideEvent) -> bool {
        self.registry.send(channel, event.to_frame())
    }

    /// Snapshot reported by `activeConnectionsInfo`.
    #[must_use]
    pub fn snapshot(&self) -> ActiveConnections {
        ActiveConnections {
            active_drivers: self.registry.active_drivers(),
            active_users_count: self.registry.active_rider_count(),
            active_bookings: self.sessions.driver_bookings(),
        }
    }
}
