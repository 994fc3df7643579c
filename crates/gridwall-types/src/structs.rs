//! Core data records: history entries, grid snapshots, and query views.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::RateMode;
use crate::ids::ConnectionId;

/// Wall-clock instant in milliseconds since the Unix epoch.
pub type Timestamp = i64;

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// One accepted cell mutation. Immutable once appended to the history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct HistoryEntry {
    /// Index of the mutated cell, in `[0, TOTAL_CELLS)`.
    pub cell_index: usize,
    /// The submitted value. Never empty; may hold more than one character.
    #[serde(rename = "char")]
    pub value: String,
    /// Connection that submitted the value.
    pub by: ConnectionId,
    /// Acceptance time in Unix milliseconds.
    #[ts(type = "number")]
    pub timestamp: Timestamp,
}

/// Single-cell change pushed to every connection after a commit.
///
/// Carries the same fields as the [`HistoryEntry`] it mirrors; it is kept
/// as a distinct type so the grid view and history view can evolve apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GridUpdate {
    /// Index of the mutated cell.
    pub cell_index: usize,
    /// The new cell value.
    #[serde(rename = "char")]
    pub value: String,
    /// Connection that submitted the value.
    pub by: ConnectionId,
    /// Acceptance time in Unix milliseconds.
    #[ts(type = "number")]
    pub timestamp: Timestamp,
}

impl From<&HistoryEntry> for GridUpdate {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            cell_index: entry.cell_index,
            value: entry.value.clone(),
            by: entry.by,
            timestamp: entry.timestamp,
        }
    }
}

/// All history entries accepted within one wall-clock second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SecondBucket {
    /// `floor(timestamp / 1000)` shared by every entry in the bucket.
    #[ts(type = "number")]
    pub second: i64,
    /// Entries in acceptance order.
    pub entries: Vec<HistoryEntry>,
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// The full state sent to a connection when it joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InitPayload {
    /// Every cell value in index order; empty string means blank.
    pub grid: Vec<String>,
    /// Side length of the square grid.
    pub size: usize,
    /// The complete history log in acceptance order.
    pub history: Vec<HistoryEntry>,
    /// Number of live connections, including the receiver.
    pub online: usize,
}

/// Read-only grid snapshot served by `GET /api/grid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GridSnapshot {
    /// Every cell value in index order.
    pub grid: Vec<String>,
    /// Side length of the square grid.
    pub size: usize,
}

/// Read-only history served by `GET /api/history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HistoryView {
    /// The complete history log in acceptance order.
    pub history: Vec<HistoryEntry>,
}

/// Aggregate online gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OnlineCount {
    /// Number of live connections.
    pub online: usize,
}

// ---------------------------------------------------------------------------
// Eligibility
// ---------------------------------------------------------------------------

/// Answer to "may this connection submit right now?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Eligibility {
    /// Whether a submission would pass the rate limiter.
    pub allowed: bool,
    /// The active rate-limit mode.
    pub mode: RateMode,
    /// Whole seconds until the cooldown expires. Cooldown mode only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub seconds_left: Option<u64>,
}
