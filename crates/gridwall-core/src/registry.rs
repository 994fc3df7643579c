//! Live connection identities.
//!
//! The registry is the only place identities are minted. An identity exists
//! from [`ConnectionRegistry::connect`] until [`ConnectionRegistry::disconnect`]
//! and is never reused; the online gauge is simply the registry's size.

use std::collections::BTreeMap;

use gridwall_types::{ConnectionId, Timestamp};

/// Metadata kept for a live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// The connection's identity.
    pub id: ConnectionId,
    /// When the connection registered, in Unix milliseconds.
    pub connected_at: Timestamp,
}

/// Set of live connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: BTreeMap<ConnectionId, ConnectionInfo>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            connections: BTreeMap::new(),
        }
    }

    /// Allocate and register a new identity.
    pub fn connect(&mut self, now: Timestamp) -> ConnectionId {
        let id = ConnectionId::new();
        self.connections.insert(
            id,
            ConnectionInfo {
                id,
                connected_at: now,
            },
        );
        id
    }

    /// Remove an identity. Returns its metadata if it was registered.
    pub fn disconnect(&mut self, id: ConnectionId) -> Option<ConnectionInfo> {
        self.connections.remove(&id)
    }

    /// Whether `id` is currently connected.
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Number of live connections.
    pub fn online(&self) -> usize {
        self.connections.len()
    }
}
