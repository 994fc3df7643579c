//! One-to-many event fan-out.
//!
//! The [`Dispatcher`] wraps a [`tokio::sync::broadcast`] channel. Every
//! connection task holds its own receiver, so a single `send` reaches all
//! of them and every receiver observes events in send order. Sends never
//! block: the coordinator publishes while holding its state lock, which is
//! what pins the broadcast order to the commit order.
//!
//! A receiver that falls more than `capacity` events behind gets
//! [`broadcast::error::RecvError::Lagged`] and must resynchronise from a
//! fresh snapshot.

use gridwall_types::{GridUpdate, HistoryEntry, OnlineCount, ServerEvent};
use tokio::sync::broadcast;

/// Broadcast sender for grid, history, and online-count events.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: broadcast::Sender<ServerEvent>,
}

impl Dispatcher {
    /// Create a dispatcher buffering up to `capacity` events per receiver.
    ///
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.tx.subscribe()
    }

    /// Publish one event to all receivers.
    ///
    /// Returns the number of receivers that got it; 0 when nobody is
    /// listening, which is not an error.
    pub fn publish(&self, event: ServerEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Publish a committed change as `grid_update` followed by
    /// `history_update`.
    pub fn publish_commit(&self, entry: &HistoryEntry) -> usize {
        let reached = self.publish(ServerEvent::GridUpdate(GridUpdate::from(entry)));
        self.publish(ServerEvent::HistoryUpdate(entry.clone()));
        reached
    }

    /// Publish the online gauge.
    pub fn publish_online(&self, online: usize) -> usize {
        self.publish(ServerEvent::OnlineCount(OnlineCount { online }))
    }
}
