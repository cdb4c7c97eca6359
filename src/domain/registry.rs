//! Connection registry: live channels and the identities bound to them.
//!
//! [`ConnectionRegistry`] owns one [`Connection`] record per accepted
//! socket plus two independent key maps, `vehicle id → channel` and
//! `rider id → channel`. A later bind for the same key overwrites the
//! earlier mapping; the superseded channel stays open but is no longer
//! reachable by that key.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::ChannelId;
use super::ride_event::OutboundFrame;

/// One live connection as seen by the relay.
#[derive(Debug)]
pub struct Connection {
    /// Opaque channel handle.
    pub id: ChannelId,
    /// Vehicle id this channel joined as, if it is a driver terminal.
    pub driver_id: Option<String>,
    /// Rider id this channel joined as, if it is a rider terminal.
    pub rider_id: Option<String>,
    /// Groups this channel has joined.
    pub groups: BTreeSet<String>,
    outbox: mpsc::Sender<OutboundFrame>,
}

impl Connection {
    /// Queues a frame without waiting.
    ///
    /// Returns `false` when the queue is full or the writer has gone away;
    /// the frame is dropped in both cases.
    pub fn try_deliver(&self, frame: OutboundFrame) -> bool {
        match self.outbox.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(frame)) => {
                tracing::debug!(channel = %self.id, event = %frame.event, "outbound queue full, frame dropped");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Bidirectional mapping between participant identities and channels.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ChannelId, Connection>,
    drivers: BTreeMap<String, ChannelId>,
    riders: BTreeMap<String, ChannelId>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly accepted channel and the queue feeding its writer.
    pub fn connect(&mut self, id: ChannelId, outbox: mpsc::Sender<OutboundFrame>) {
        self.connections.insert(
            id,
            Connection {
                id,
                driver_id: None,
                rider_id: None,
                groups: BTreeSet::new(),
                outbox,
            },
        );
    }

    /// Maps `vehicle_id` to `channel`, overwriting any previous mapping.
    pub fn bind_driver(&mut self, vehicle_id: &str, channel: ChannelId) {
        if let Some(conn) = self.connections.get_mut(&channel)
            && let Some(previous) = conn.driver_id.replace(vehicle_id.to_string())
            && previous != vehicle_id
        {
            remove_if_points_to(&mut self.drivers, &previous, channel);
        }
        self.drivers.insert(vehicle_id.to_string(), channel);
    }

    /// Maps `rider_id` to `channel`, overwriting any previous mapping.
    pub fn bind_rider(&mut self, rider_id: &str, channel: ChannelId) {
        if let Some(conn) = self.connections.get_mut(&channel)
            && let Some(previous) = conn.rider_id.replace(rider_id.to_string())
            && previous != rider_id
        {
            remove_if_points_to(&mut self.riders, &previous, channel);
        }
        self.riders.insert(rider_id.to_string(), channel);
    }

    /// Returns the channel currently bound to `vehicle_id`.
    #[must_use]
    pub fn lookup_driver_channel(&self, vehicle_id: &str) -> Option<ChannelId> {
        self.drivers.get(vehicle_id).copied()
    }

    /// Returns the channel currently bound to `rider_id`.
    #[must_use]
    pub fn lookup_rider_channel(&self, rider_id: &str) -> Option<ChannelId> {
        self.riders.get(rider_id).copied()
    }

    /// Forgets a closed channel.
    ///
    /// Removes every driver and rider key that currently maps to
    /// `channel` and returns the connection record so the caller can
    /// prune its group memberships.
    pub fn unbind(&mut self, channel: ChannelId) -> Option<Connection> {
        self.drivers.retain(|_, bound| *bound != channel);
        self.riders.retain(|_, bound| *bound != channel);
        self.connections.remove(&channel)
    }

    /// Returns the connection record for `channel`.
    #[must_use]
    pub fn connection(&self, channel: ChannelId) -> Option<&Connection> {
        self.connections.get(&channel)
    }

    /// Returns the mutable connection record for `channel`.
    pub fn connection_mut(&mut self, channel: ChannelId) -> Option<&mut Connection> {
        self.connections.get_mut(&channel)
    }

    /// Queues `frame` on `channel`. Unknown channels are skipped.
    pub fn send(&self, channel: ChannelId, frame: OutboundFrame) -> bool {
        self.connections
            .get(&channel)
            .is_some_and(|conn| conn.try_deliver(frame))
    }

    /// Iterates over every live connection.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Vehicle ids that currently map to a live channel, in key order.
    #[must_use]
    pub fn active_drivers(&self) -> Vec<String> {
        self.drivers.keys().cloned().collect()
    }

    /// Number of rider ids that currently map to a live channel.
    #[must_use]
    pub fn active_rider_count(&self) -> usize {
        self.riders.len()
    }

    /// Number of live connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns `true` if no connection is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

fn remove_if_points_to(map: &mut BTreeMap<String, ChannelId>, key: &str, channel: ChannelId) {
    if map.get(key) == Some(&channel) {
        map.remove(key);
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn connected(registry: &mut ConnectionRegistry) -> (ChannelId, mpsc::Receiver<OutboundFrame>) {
        let id = ChannelId::new();
        let (tx, rx) = mpsc::channel(4);
        registry.connect(id, tx);
        (id, rx)
    }

    fn frame(event: &str) -> OutboundFrame {
        OutboundFrame {
            event: event.to_string(),
            data: serde_json::Value::Null,
        }
    }

    #[test]
    fn later_driver_bind_supersedes_earlier() {
        let mut registry = ConnectionRegistry::new();
        let (c1, _rx1) = connected(&mut registry);
        let (c2, _rx2) = connected(&mut registry);

        registry.bind_driver("V1", c1);
        registry.bind_driver("V1", c2);

        assert_eq!(registry.lookup_driver_channel("V1"), Some(c2));
        // Superseded channel is still connected.
        assert!(registry.connection(c1).is_some());
    }

    #[test]
    fn lookup_of_unknown_identity_is_absent() {
        let registry = ConnectionRegistry::new();
        assert_eq!(registry.lookup_driver_channel("nope"), None);
        assert_eq!(registry.lookup_rider_channel("nope"), None);
    }

    #[test]
    fn unbind_removes_every_key_for_channel() {
        let mut registry = ConnectionRegistry::new();
        let (c1, _rx) = connected(&mut registry);
        registry.bind_rider("U1", c1);
        registry.bind_driver("V1", c1);

        let removed = registry.unbind(c1);
        assert!(removed.is_some());
        assert_eq!(registry.lookup_rider_channel("U1"), None);
        assert_eq!(registry.lookup_driver_channel("V1"), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn unbinding_superseded_channel_keeps_new_mapping() {
        let mut registry = ConnectionRegistry::new();
        let (c1, _rx1) = connected(&mut registry);
        let (c2, _rx2) = connected(&mut registry);
        registry.bind_driver("V1", c1);
        registry.bind_driver("V1", c2);

        let _ = registry.unbind(c1);
        assert_eq!(registry.lookup_driver_channel("V1"), Some(c2));
    }

    #[test]
    fn rebinding_channel_drops_its_stale_key() {
        let mut registry = ConnectionRegistry::new();
        let (c1, _rx) = connected(&mut registry);
        registry.bind_rider("U1", c1);
        registry.bind_rider("U2", c1);

        assert_eq!(registry.lookup_rider_channel("U1"), None);
        assert_eq!(registry.lookup_rider_channel("U2"), Some(c1));
        assert_eq!(registry.active_rider_count(), 1);
    }

    #[test]
    fn active_drivers_are_listed_in_key_order() {
        let mut registry = ConnectionRegistry::new();
        let (c1, _rx1) = connected(&mut registry);
        let (c2, _rx2) = connected(&mut registry);
        registry.bind_driver("V2", c2);
        registry.bind_driver("V1", c1);
        assert_eq!(registry.active_drivers(), vec!["V1", "V2"]);
    }

    #[tokio::test]
    async fn send_queues_frame_on_channel() {
        let mut registry = ConnectionRegistry::new();
        let (c1, mut rx) = connected(&mut registry);

        assert!(registry.send(c1, frame("ping")));
        let Some(received) = rx.recv().await else {
            panic!("expected a frame");
        };
        assert_eq!(received.event, "ping");
    }

    #[test]
    fn send_skips_full_and_closed_queues() {
        let mut registry = ConnectionRegistry::new();
        let id = ChannelId::new();
        let (tx, rx) = mpsc::channel(1);
        registry.connect(id, tx);

        assert!(registry.send(id, frame("first")));
        assert!(!registry.send(id, frame("second")));

        drop(rx);
        assert!(!registry.send(id, frame("third")));
        assert!(!registry.send(ChannelId::new(), frame("unknown")));
    }
}
