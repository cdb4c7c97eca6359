//! Named broadcast groups over registered channels.
//!
//! [`RoomRouter`] keeps `group name → member channels`. Delivery resolves
//! members through the [`ConnectionRegistry`] and is fire-and-forget: a
//! member whose queue is full or closed is skipped. Groups are created on
//! first join and never deleted, even when they become empty.

use std::collections::{HashMap, HashSet};

use super::ChannelId;
use super::registry::ConnectionRegistry;
use super::ride_event::OutboundFrame;

/// Group every rider channel joins.
pub const USERS_GROUP: &str = "users";

/// Per-driver group name.
#[must_use]
pub fn driver_group(vehicle_id: &str) -> String {
    format!("driver:{vehicle_id}")
}

/// Per-rider group name.
#[must_use]
pub fn user_group(rider_id: &str) -> String {
    format!("user:{rider_id}")
}

/// Per-booking group name.
#[must_use]
pub fn booking_group(booking_id: &str) -> String {
    format!("booking:{booking_id}")
}

/// Group membership table.
#[derive(Debug, Default)]
pub struct RoomRouter {
    groups: HashMap<String, HashSet<ChannelId>>,
}

impl RoomRouter {
    /// Creates a router with no groups.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `channel` to `group`, creating the group if needed.
    ///
    /// Returns `true` if the channel was not already a member.
    pub fn join(&mut self, channel: ChannelId, group: &str) -> bool {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(channel)
    }

    /// Removes `channel` from `group`. The group stays even if emptied.
    pub fn leave(&mut self, channel: ChannelId, group: &str) -> bool {
        self.groups
            .get_mut(group)
            .is_some_and(|members| members.remove(&channel))
    }

    /// Delivers `frame` to every current member of `group`, skipping
    /// `except` when given. Returns the number of channels that accepted it.
    pub fn broadcast(
        &self,
        registry: &ConnectionRegistry,
        group: &str,
        frame: &OutboundFrame,
        except: Option<ChannelId>,
    ) -> usize {
        let Some(members) = self.groups.get(group) else {
            return 0;
        };
        members
            .iter()
            .filter(|channel| Some(**channel) != except)
            .filter(|channel| registry.send(**channel, frame.clone()))
            .count()
    }

    /// Delivers `frame` to every live connection, regardless of groups.
    pub fn emit_to_all(&self, registry: &ConnectionRegistry, frame: &OutboundFrame) -> usize {
        registry
            .connections()
            .filter(|conn| conn.try_deliver(frame.clone()))
            .count()
    }

    /// Returns `true` if `channel` is in `group`.
    #[must_use]
    pub fn is_member(&self, channel: ChannelId, group: &str) -> bool {
        self.groups
            .get(group)
            .is_some_and(|members| members.contains(&channel))
    }

    /// Returns `true` if `group` has ever been joined.
    #[must_use]
    pub fn has_group(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    /// Number of members currently in `group`.
    #[must_use]
    pub fn member_count(&self, group: &str) -> usize {
        self.groups.get(group).map_or(0, HashSet::len)
    }

    /// Number of groups, empty ones included.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}
