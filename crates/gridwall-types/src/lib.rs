//! Shared type definitions for the Gridwall shared grid server.
//!
//! This crate is the single source of truth for every record that crosses
//! the wire. Types defined here flow downstream to `TypeScript` via `ts-rs`
//! for the web client.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for connection identities
//! - [`enums`] -- Rate-limit modes and rejection codes
//! - [`structs`] -- History entries, snapshots, and query views
//! - [`protocol`] -- Client requests, server events, and acknowledgments

pub mod enums;
pub mod ids;
pub mod protocol;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ParseRateModeError, RateMode, RejectCode};
pub use ids::ConnectionId;
pub use protocol::{
    CanSubmitAck, ClientRequest, HistoryAck, PlainRequest, ProtocolError, ServerEvent, SubmitAck,
    SubmitCellRequest,
};
pub use structs::{
    Eligibility, GridSnapshot, GridUpdate, HistoryEntry, HistoryView, InitPayload, OnlineCount,
    SecondBucket, Timestamp,
};
