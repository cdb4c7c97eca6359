//! Opaque per-connection channel handle.
//!
//! [`ChannelId`] is assigned once when a WebSocket is accepted and never
//! reused. Identity bindings, group memberships and routing all refer to
//! a connection through this handle, never through the socket itself.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle identifying one live bidirectional connection.
///
/// Wraps a UUID v4 so handles from different connections cannot collide
/// and cannot be confused with driver, rider or booking identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(uuid::Uuid);

impl ChannelId {
    /// Allocates a fresh random channel handle.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for ChannelId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}
