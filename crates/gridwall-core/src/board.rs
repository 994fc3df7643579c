//! The mutation coordinator.
//!
//! [`BoardState`] aggregates the grid, the history log, the rate limiter,
//! and the connection registry. [`Board`] owns it behind a single
//! [`RwLock`] together with the [`Dispatcher`]:
//!
//! - **Mutations** (submit, connect, disconnect) take the write lock, run
//!   to completion, and publish their events before releasing it. Commits
//!   are therefore totally ordered and every receiver sees that order.
//! - **Queries** take the read lock and see a consistent point-in-time
//!   view, never a half-applied submission.
//!
//! Validation happens strictly before mutation, so a rejected submission
//! leaves no trace in any store.

use gridwall_types::{
    ConnectionId, Eligibility, GridSnapshot, HistoryEntry, InitPayload, RateMode, RejectCode,
    SecondBucket, ServerEvent, SubmitCellRequest, Timestamp,
};
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

use crate::config::GridwallConfig;
use crate::dispatch::Dispatcher;
use crate::grid::Grid;
use crate::history::HistoryLog;
use crate::rate_limit::{Denial, RateLimiter, RatePolicy};
use crate::registry::{ConnectionInfo, ConnectionRegistry};

/// Why a submission was rejected. The first failing check wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    /// `cellIndex` was missing, not an integer, or outside `[0, total_cells)`.
    #[error("invalid cellIndex: expected an integer in [0, {total_cells})")]
    InvalidIndex {
        /// Number of cells in the grid.
        total_cells: usize,
    },

    /// `char` was missing, not a string, or empty.
    #[error("invalid char: expected a non-empty string")]
    InvalidChar,

    /// The rate limiter refused the connection.
    #[error(transparent)]
    RateLimited(#[from] Denial),
}

impl RejectReason {
    /// Machine-readable code for the ack.
    pub const fn code(&self) -> RejectCode {
        match self {
            Self::InvalidIndex { .. } => RejectCode::InvalidIndex,
            Self::InvalidChar => RejectCode::InvalidChar,
            Self::RateLimited(_) => RejectCode::RateLimited,
        }
    }

    /// Seconds until the cooldown expires, for cooldown rejections.
    pub const fn seconds_left(&self) -> Option<u64> {
        match self {
            Self::RateLimited(Denial::Cooldown { seconds_left }) => Some(*seconds_left),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// BoardState
// ---------------------------------------------------------------------------

/// All mutable server state, accessed through one serialized path.
#[derive(Debug)]
pub struct BoardState {
    grid: Grid,
    history: HistoryLog,
    limiter: RateLimiter,
    registry: ConnectionRegistry,
}

impl BoardState {
    /// Create a blank `size * size` board enforcing `policy`.
    pub fn new(size: usize, policy: RatePolicy) -> Self {
        Self {
            grid: Grid::new(size),
            history: HistoryLog::new(),
            limiter: RateLimiter::new(policy),
            registry: ConnectionRegistry::new(),
        }
    }

    /// The grid store.
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The history log.
    pub const fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// The rate limiter.
    pub const fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// The connection registry.
    pub const fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Register a new connection and its rate-limit record.
    pub fn register(&mut self, now: Timestamp) -> ConnectionId {
        let id = self.registry.connect(now);
        self.limiter.register(id);
        id
    }

    /// Remove a connection and discard its rate-limit record.
    ///
    /// Returns `None` if the identity was not registered.
    pub fn unregister(&mut self, id: ConnectionId) -> Option<ConnectionInfo> {
        let info = self.registry.disconnect(id);
        self.limiter.forget(id);
        info
    }

    /// Full snapshot for a newly connected (or resyncing) client.
    pub fn init_payload(&self) -> InitPayload {
        InitPayload {
            grid: self.grid.snapshot(),
            size: self.grid.size(),
            history: self.history.read_all().to_vec(),
            online: self.registry.online(),
        }
    }

    /// Validate and apply one submission.
    ///
    /// Checks run in order (index, value, then identity and rate limit) and
    /// the first failure is returned. On success the grid, the log, and the limiter are all
    /// updated and the appended entry is returned.
    ///
    /// # Errors
    ///
    /// Returns the [`RejectReason`] of the first failing check; nothing is
    /// modified in that case.
    pub fn submit(
        &mut self,
        id: ConnectionId,
        request: &SubmitCellRequest,
        now: Timestamp,
    ) -> Result<HistoryEntry, RejectReason> {
        let total_cells = self.grid.total_cells();
        let cell_index = parse_cell_index(&request.cell_index, total_cells)
            .ok_or(RejectReason::InvalidIndex { total_cells })?;
        let value = parse_value(&request.value).ok_or(RejectReason::InvalidChar)?;
        if !self.registry.contains(id) {
            return Err(Denial::Unregistered.into());
        }
        self.limiter.check(id, now)?;

        self.grid.apply_write(cell_index, value.to_owned());
        let entry = HistoryEntry {
            cell_index,
            value: value.to_owned(),
            by: id,
            timestamp: now,
        };
        self.history.append(entry.clone());
        self.limiter.record(id, now);

        Ok(entry)
    }
}

/// A whole JSON number in `[0, total_cells)`. `5.0` counts as `5`.
fn parse_cell_index(raw: &Value, total_cells: usize) -> Option<usize> {
    let index = match raw.as_u64() {
        Some(index) => usize::try_from(index).ok()?,
        None => whole_index(raw.as_f64()?, total_cells)?,
    };
    (index < total_cells).then_some(index)
}

/// A float with no fractional part, below `total_cells`.
fn whole_index(raw: f64, total_cells: usize) -> Option<usize> {
    let limit = u32::try_from(total_cells).ok()?;
    let whole = raw >= 0.0 && raw < f64::from(limit) && raw.fract() == 0.0;
    if !whole {
        return None;
    }
    // In range of u32 and integral, checked above.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = raw as u32;
    usize::try_from(index).ok()
}

/// A non-empty JSON string. Multi-character strings are accepted.
fn parse_value(raw: &Value) -> Option<&str> {
    raw.as_str().filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// A registered connection: its identity, its initial snapshot, and its
/// subscription to every event committed after that snapshot.
#[derive(Debug)]
pub struct Session {
    /// The newly allocated identity.
    pub id: ConnectionId,
    /// Snapshot to send as the `init` event.
    pub init: InitPayload,
    /// Events committed after `init` was taken.
    pub events: broadcast::Receiver<ServerEvent>,
}

/// Summary numbers for status pages and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardStats {
    /// Grid side length.
    pub size: usize,
    /// Number of cells.
    pub total_cells: usize,
    /// Number of live connections.
    pub online: usize,
    /// Number of history entries.
    pub history_len: usize,
    /// Active rate-limit mode.
    pub mode: RateMode,
}

/// Shared handle to the board state and its broadcast channel.
///
/// Wrap in [`std::sync::Arc`] and hand a clone to each task.
#[derive(Debug)]
pub struct Board {
    state: RwLock<BoardState>,
    dispatcher: Dispatcher,
    mode: RateMode,
}

impl Board {
    /// Create a blank board.
    pub fn new(size: usize, policy: RatePolicy, broadcast_capacity: usize) -> Self {
        Self {
            state: RwLock::new(BoardState::new(size, policy)),
            dispatcher: Dispatcher::new(broadcast_capacity),
            mode: policy.mode(),
        }
    }

    /// Create a blank board from validated configuration.
    pub fn from_config(config: &GridwallConfig) -> Self {
        Self::new(config.grid.size, config.rate_policy(), config.broadcast.capacity)
    }

    /// The active rate-limit mode.
    pub const fn mode(&self) -> RateMode {
        self.mode
    }

    /// Subscribe to broadcast events without registering an identity.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.dispatcher.subscribe()
    }

    /// Register a new connection.
    ///
    /// The snapshot and the subscription are taken under the same lock, so
    /// the session's receiver starts exactly after the snapshot: nothing is
    /// missed and nothing is repeated. The updated online count is then
    /// broadcast to everyone, the new connection included.
    pub async fn connect(&self, now: Timestamp) -> Session {
        let mut state = self.state.write().await;
        let id = state.register(now);
        let events = self.dispatcher.subscribe();
        let init = state.init_payload();
        self.dispatcher.publish_online(init.online);
        info!(connection = %id, online = init.online, "Connection registered");
        Session { id, init, events }
    }

    /// Take a fresh snapshot and subscription for a lagged connection.
    pub async fn resync(&self) -> (InitPayload, broadcast::Receiver<ServerEvent>) {
        let state = self.state.read().await;
        let events = self.dispatcher.subscribe();
        (state.init_payload(), events)
    }

    /// Remove a connection and broadcast the new online count.
    ///
    /// Returns `false` (and broadcasts nothing) for an unknown identity.
    pub async fn disconnect(&self, id: ConnectionId) -> bool {
        let mut state = self.state.write().await;
        let Some(info) = state.unregister(id) else {
            return false;
        };
        let online = state.registry().online();
        self.dispatcher.publish_online(online);
        info!(
            connection = %id,
            online,
            connected_at = info.connected_at,
            "Connection removed"
        );
        true
    }

    /// Validate, apply, and broadcast one submission.
    ///
    /// On success `grid_update`, `history_update`, and `online_count` are
    /// published before the lock is released.
    ///
    /// # Errors
    ///
    /// Returns the [`RejectReason`] of the first failing check.
    pub async fn submit(
        &self,
        id: ConnectionId,
        request: &SubmitCellRequest,
        now: Timestamp,
    ) -> Result<HistoryEntry, RejectReason> {
        let mut state = self.state.write().await;
        match state.submit(id, request, now) {
            Ok(entry) => {
                self.dispatcher.publish_commit(&entry);
                self.dispatcher.publish_online(state.registry().online());
                debug!(
                    connection = %id,
                    cell_index = entry.cell_index,
                    seq = state.history().len(),
                    "Submission committed"
                );
                Ok(entry)
            }
            Err(reason) => {
                debug!(connection = %id, code = ?reason.code(), %reason, "Submission rejected");
                Err(reason)
            }
        }
    }

    /// Whether `id` could submit at `now`.
    pub async fn can_submit(&self, id: ConnectionId, now: Timestamp) -> Eligibility {
        self.state.read().await.limiter().eligibility(id, now)
    }

    /// Current grid values and side length.
    pub async fn grid_snapshot(&self) -> GridSnapshot {
        let state = self.state.read().await;
        GridSnapshot {
            grid: state.grid().snapshot(),
            size: state.grid().size(),
        }
    }

    /// The complete history log.
    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.state.read().await.history().read_all().to_vec()
    }

    /// History bucketed by second.
    pub async fn history_by_second(&self) -> Vec<SecondBucket> {
        self.state.read().await.history().group_by_second()
    }

    /// Number of live connections.
    pub async fn online(&self) -> usize {
        self.state.read().await.registry().online()
    }

    /// Summary numbers.
    pub async fn stats(&self) -> BoardStats {
        let state = self.state.read().await;
        BoardStats {
            size: state.grid().size(),
            total_cells: state.grid().total_cells(),
            online: state.registry().online(),
            history_len: state.history().len(),
            mode: self.mode,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use gridwall_types::{GridUpdate, OnlineCount};
    use serde_json::json;

    use super::*;

    const SECOND: Timestamp = 1000;

    fn cooldown_board() -> Board {
        Board::new(10, RatePolicy::cooldown_seconds(60), 64)
    }

    fn request(cell_index: Value, value: Value) -> SubmitCellRequest {
        SubmitCellRequest {
            request_id: None,
            cell_index,
            value,
        }
    }

    /// Drain everything currently buffered in a receiver.
    fn drain(rx: &mut broadcast::Receiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    // -- validation ---------------------------------------------------------

    #[test]
    fn index_boundaries() {
        let mut state = BoardState::new(10, RatePolicy::SingleShot);
        let id = state.register(0);
        let other = state.register(0);

        assert_eq!(
            state.submit(id, &SubmitCellRequest::new(-1, "a"), 0),
            Err(RejectReason::InvalidIndex { total_cells: 100 })
        );
        assert_eq!(
            state.submit(id, &SubmitCellRequest::new(100, "a"), 0),
            Err(RejectReason::InvalidIndex { total_cells: 100 })
        );
        assert!(state.submit(id, &SubmitCellRequest::new(99, "a"), 0).is_ok());
        assert!(state.submit(other, &SubmitCellRequest::new(0, "b"), 0).is_ok());
    }

    #[test]
    fn non_integer_indices_are_invalid() {
        let mut state = BoardState::new(10, RatePolicy::SingleShot);
        let id = state.register(0);
        for raw in [
            json!(1.5),
            json!(-1.0),
            json!(100.0),
            json!(1e300),
            json!("3"),
            json!(null),
            json!([1]),
            json!(true),
        ] {
            let result = state.submit(id, &request(raw.clone(), json!("a")), 0);
            assert_eq!(
                result.map_err(|r| r.code()),
                Err(RejectCode::InvalidIndex),
                "index {raw}"
            );
        }
    }

    #[test]
    fn whole_valued_float_index_is_accepted() {
        let mut state = BoardState::new(10, RatePolicy::SingleShot);
        let id = state.register(0);
        let entry = state.submit(id, &request(json!(5.0), json!("f")), 0).unwrap();
        assert_eq!(entry.cell_index, 5);
        assert_eq!(state.grid().get(5), Some("f"));

        let other = state.register(0);
        let entry = state.submit(other, &request(json!(99.0), json!("g")), 0).unwrap();
        assert_eq!(entry.cell_index, 99);
    }

    #[test]
    fn empty_or_missing_char_is_invalid() {
        let mut state = BoardState::new(10, RatePolicy::SingleShot);
        let id = state.register(0);
        for raw in [json!(""), json!(null), json!(7), json!({"c": "a"})] {
            let result = state.submit(id, &request(json!(1), raw.clone()), 0);
            assert_eq!(result, Err(RejectReason::InvalidChar), "char {raw}");
        }
    }

    #[test]
    fn index_is_checked_before_char_and_char_before_rate() {
        let mut state = BoardState::new(10, RatePolicy::SingleShot);
        let id = state.register(0);
        assert!(state.submit(id, &SubmitCellRequest::new(0, "a"), 0).is_ok());

        // Both index and char bad, and the single shot is spent.
        let result = state.submit(id, &request(json!(500), json!("")), 0);
        assert_eq!(result.map_err(|r| r.code()), Err(RejectCode::InvalidIndex));

        let result = state.submit(id, &request(json!(1), json!("")), 0);
        assert_eq!(result, Err(RejectReason::InvalidChar));

        let result = state.submit(id, &SubmitCellRequest::new(1, "b"), 0);
        assert_eq!(result, Err(RejectReason::RateLimited(Denial::SingleShotUsed)));
    }

    #[test]
    fn unregistered_identity_cannot_submit() {
        let mut state = BoardState::new(10, RatePolicy::cooldown_seconds(60));
        let stranger = ConnectionId::new();

        let result = state.submit(stranger, &SubmitCellRequest::new(1, "z"), 0);
        assert_eq!(result, Err(RejectReason::RateLimited(Denial::Unregistered)));
        assert_eq!(result.map_err(|r| r.code()), Err(RejectCode::RateLimited));
        assert!(state.history().is_empty());
        assert_eq!(state.grid().get(1), Some(""));
        assert_eq!(state.limiter().tracked(), 0);
    }

    #[test]
    fn multi_character_values_are_accepted() {
        let mut state = BoardState::new(10, RatePolicy::SingleShot);
        let id = state.register(0);
        let entry = state.submit(id, &SubmitCellRequest::new(3, "héllo 👋"), 0).unwrap();
        assert_eq!(entry.value, "héllo 👋");
        assert_eq!(state.grid().get(3), Some("héllo 👋"));
    }

    #[test]
    fn rejection_leaves_no_trace() {
        let mut state = BoardState::new(10, RatePolicy::cooldown_seconds(60));
        let id = state.register(0);
        state.submit(id, &SubmitCellRequest::new(5, "x"), 0).unwrap();
        let grid_before = state.grid().snapshot();
        let record_before = state.limiter().record_of(id);

        assert!(state.submit(id, &SubmitCellRequest::new(6, "y"), SECOND).is_err());
        assert!(state.submit(id, &SubmitCellRequest::new(600, "y"), 0).is_err());

        assert_eq!(state.grid().snapshot(), grid_before);
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.limiter().record_of(id), record_before);
    }

    // -- invariants ---------------------------------------------------------

    #[test]
    fn cells_match_latest_history_entry() {
        let mut state = BoardState::new(4, RatePolicy::SingleShot);
        let writes = [(0, "a"), (5, "b"), (0, "c"), (15, "d"), (5, "e")];
        for (i, (cell, value)) in writes.iter().enumerate() {
            let id = state.register(i64::try_from(i).unwrap());
            state.submit(id, &SubmitCellRequest::new(*cell, value), 0).unwrap();
            assert_eq!(state.grid().total_cells(), 16);
        }

        for index in 0..state.grid().total_cells() {
            let latest = state
                .history()
                .read_all()
                .iter()
                .rev()
                .find(|e| e.cell_index == index)
                .map_or("", |e| e.value.as_str());
            assert_eq!(state.grid().get(index), Some(latest), "cell {index}");
        }
    }

    #[tokio::test]
    async fn snapshots_are_idempotent() {
        let board = cooldown_board();
        let session = board.connect(0).await;
        board
            .submit(session.id, &SubmitCellRequest::new(1, "z"), 0)
            .await
            .unwrap();

        assert_eq!(board.grid_snapshot().await, board.grid_snapshot().await);
        assert_eq!(board.history().await, board.history().await);
        assert_eq!(board.history_by_second().await, board.history_by_second().await);
    }

    // -- rate limiting --------------------------------------------------------

    #[tokio::test]
    async fn cooldown_scenario() {
        let board = cooldown_board();
        let a = board.connect(0).await.id;

        let first = board.submit(a, &SubmitCellRequest::new(5, "x"), 0).await;
        assert!(first.is_ok());
        assert_eq!(board.grid_snapshot().await.grid[5], "x");

        let early = board.submit(a, &SubmitCellRequest::new(5, "y"), 30 * SECOND).await;
        let reason = early.unwrap_err();
        assert_eq!(reason.code(), RejectCode::RateLimited);
        assert_eq!(reason.seconds_left(), Some(30));
        assert_eq!(board.grid_snapshot().await.grid[5], "x");

        let late = board.submit(a, &SubmitCellRequest::new(5, "y"), 61 * SECOND).await;
        assert!(late.is_ok());
        assert_eq!(board.grid_snapshot().await.grid[5], "y");

        let history = board.history().await;
        let values: Vec<(&str, Timestamp)> = history
            .iter()
            .filter(|e| e.by == a)
            .map(|e| (e.value.as_str(), e.timestamp))
            .collect();
        assert_eq!(values, vec![("x", 0), ("y", 61 * SECOND)]);
    }

    #[tokio::test]
    async fn single_shot_scenario() {
        let board = Board::new(10, RatePolicy::SingleShot, 64);
        let a = board.connect(0).await.id;

        assert!(board.submit(a, &SubmitCellRequest::new(1, "x"), 0).await.is_ok());
        for later in [0, SECOND, 3_600 * SECOND] {
            let result = board.submit(a, &SubmitCellRequest::new(2, "y"), later).await;
            assert_eq!(result, Err(RejectReason::RateLimited(Denial::SingleShotUsed)));
        }

        let eligibility = board.can_submit(a, 0).await;
        assert!(!eligibility.allowed);
        assert_eq!(eligibility.mode, RateMode::SingleShot);
    }

    #[tokio::test]
    async fn can_submit_in_cooldown_mode() {
        let board = cooldown_board();
        let a = board.connect(0).await.id;
        assert!(board.can_submit(a, 0).await.allowed);

        board.submit(a, &SubmitCellRequest::new(0, "x"), 0).await.unwrap();
        let eligibility = board.can_submit(a, 20 * SECOND).await;
        assert!(!eligibility.allowed);
        assert_eq!(eligibility.mode, RateMode::Cooldown);
        assert_eq!(eligibility.seconds_left, Some(40));
    }

    /// Rate-limit state is scoped to the connection identity, so a client
    /// that reconnects gets a fresh allowance. This is current, intended
    /// behavior; changing it needs an explicit decision.
    #[tokio::test]
    async fn reconnect_resets_rate_limit() {
        let board = Board::new(10, RatePolicy::SingleShot, 64);
        let first = board.connect(0).await.id;
        board.submit(first, &SubmitCellRequest::new(0, "x"), 0).await.unwrap();
        assert!(board.disconnect(first).await);

        let second = board.connect(SECOND).await.id;
        assert_ne!(first, second);
        assert!(board.submit(second, &SubmitCellRequest::new(0, "y"), SECOND).await.is_ok());
    }

    // -- connections and broadcast ------------------------------------------

    #[tokio::test]
    async fn connect_sends_snapshot_then_broadcasts_online() {
        let board = cooldown_board();
        let mut observer = board.subscribe();

        let a = board.connect(0).await;
        board.submit(a.id, &SubmitCellRequest::new(2, "q"), 0).await.unwrap();
        let b = board.connect(SECOND).await;

        assert_eq!(a.init.online, 1);
        assert!(a.init.history.is_empty());
        assert_eq!(b.init.online, 2);
        assert_eq!(b.init.size, 10);
        assert_eq!(b.init.grid.len(), 100);
        assert_eq!(b.init.grid[2], "q");
        assert_eq!(b.init.history.len(), 1);

        let events = drain(&mut observer);
        assert_eq!(events.first(), Some(&ServerEvent::OnlineCount(OnlineCount { online: 1 })));
        assert_eq!(events.last(), Some(&ServerEvent::OnlineCount(OnlineCount { online: 2 })));
    }

    #[tokio::test]
    async fn session_receives_only_events_after_its_snapshot() {
        let board = cooldown_board();
        let a = board.connect(0).await;
        board.submit(a.id, &SubmitCellRequest::new(0, "x"), 0).await.unwrap();

        let mut b = board.connect(0).await;
        // b's snapshot already holds the commit; its stream starts with its own join.
        assert_eq!(b.init.history.len(), 1);
        assert_eq!(
            drain(&mut b.events),
            vec![ServerEvent::OnlineCount(OnlineCount { online: 2 })]
        );
    }

    #[tokio::test]
    async fn commit_broadcast_sequence() {
        let board = cooldown_board();
        let a = board.connect(0).await;
        let mut events = a.events;
        drain(&mut events);

        let entry = board.submit(a.id, &SubmitCellRequest::new(9, "k"), 5).await.unwrap();
        assert_eq!(
            drain(&mut events),
            vec![
                ServerEvent::GridUpdate(GridUpdate::from(&entry)),
                ServerEvent::HistoryUpdate(entry),
                ServerEvent::OnlineCount(OnlineCount { online: 1 }),
            ]
        );
    }

    #[tokio::test]
    async fn rejected_submission_broadcasts_nothing() {
        let board = cooldown_board();
        let a = board.connect(0).await;
        let mut events = a.events;
        drain(&mut events);

        assert!(board.submit(a.id, &SubmitCellRequest::new(-3, "k"), 0).await.is_err());
        assert!(drain(&mut events).is_empty());
    }

    #[tokio::test]
    async fn disconnect_broadcasts_online_and_forgets_identity() {
        let board = cooldown_board();
        let a = board.connect(0).await;
        let b = board.connect(0).await;
        let mut events = b.events;
        drain(&mut events);

        assert!(board.disconnect(a.id).await);
        assert_eq!(board.online().await, 1);
        assert_eq!(
            drain(&mut events),
            vec![ServerEvent::OnlineCount(OnlineCount { online: 1 })]
        );

        // Unknown identity: no-op, no broadcast.
        assert!(!board.disconnect(a.id).await);
        assert!(drain(&mut events).is_empty());
    }

    #[tokio::test]
    async fn disconnected_identity_cannot_submit() {
        let board = cooldown_board();
        let a = board.connect(0).await;
        let b = board.connect(0).await;
        let mut events = b.events;
        assert!(board.disconnect(a.id).await);
        drain(&mut events);

        let result = board.submit(a.id, &SubmitCellRequest::new(1, "z"), 0).await;
        assert_eq!(result, Err(RejectReason::RateLimited(Denial::Unregistered)));
        assert!(board.history().await.is_empty());
        assert!(drain(&mut events).is_empty());
        assert!(!board.can_submit(a.id, 0).await.allowed);

        let state = board.state.read().await;
        assert!(!state.registry().contains(a.id));
        assert_eq!(state.limiter().tracked(), 1);
        assert_eq!(state.limiter().record_of(a.id), None);
    }

    #[tokio::test]
    async fn concurrent_submissions_are_observed_in_commit_order() {
        const WRITERS: usize = 40;
        let board = Arc::new(Board::new(10, RatePolicy::SingleShot, 1024));
        let mut observer_a = board.subscribe();
        let mut observer_b = board.subscribe();

        let mut sessions = Vec::new();
        for _ in 0..WRITERS {
            sessions.push(board.connect(0).await.id);
        }
        drain(&mut observer_a);
        drain(&mut observer_b);

        let handles: Vec<_> = sessions
            .into_iter()
            .enumerate()
            .map(|(i, id)| {
                let board = Arc::clone(&board);
                tokio::spawn(async move {
                    let value = format!("{i}");
                    let cell = i64::try_from(i).unwrap();
                    board.submit(id, &SubmitCellRequest::new(cell, &value), 0).await
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        let history = board.history().await;
        assert_eq!(history.len(), WRITERS);

        for observer in [&mut observer_a, &mut observer_b] {
            let seen: Vec<HistoryEntry> = drain(observer)
                .into_iter()
                .filter_map(|event| match event {
                    ServerEvent::HistoryUpdate(entry) => Some(entry),
                    _ => None,
                })
                .collect();
            assert_eq!(seen, history);
        }
    }

    #[tokio::test]
    async fn resync_returns_current_snapshot() {
        let board = cooldown_board();
        let a = board.connect(0).await;
        board.submit(a.id, &SubmitCellRequest::new(4, "r"), 0).await.unwrap();

        let (init, mut events) = board.resync().await;
        assert_eq!(init.grid[4], "r");
        assert_eq!(init.history.len(), 1);
        assert!(drain(&mut events).is_empty());
    }

    #[tokio::test]
    async fn stats_reflect_state() {
        let board = cooldown_board();
        let a = board.connect(0).await;
        board.submit(a.id, &SubmitCellRequest::new(4, "r"), 0).await.unwrap();
        let stats = board.stats().await;
        assert_eq!(
            stats,
            BoardStats {
                size: 10,
                total_cells: 100,
                online: 1,
                history_len: 1,
                mode: RateMode::Cooldown,
            }
        );
    }
}
