//! Canonical shared state and the serialized mutation path for Gridwall.
//!
//! This crate owns everything between "a client asked to write a cell" and
//! "every client has been told about it":
//!
//! ```text
//! submit --> validate (index, char, rate limit) --> grid + log + limiter --> broadcast
//! ```
//!
//! # Modules
//!
//! - [`grid`] -- Fixed-size array of cell values.
//! - [`history`] -- Append-only log of accepted submissions.
//! - [`rate_limit`] -- Cooldown and single-shot eligibility per connection.
//! - [`registry`] -- Live connection identities and the online gauge.
//! - [`dispatch`] -- Broadcast fan-out of grid, history, and online events.
//! - [`board`] -- The coordinator tying the above together behind one lock.
//! - [`config`] -- Configuration loading from `gridwall-config.yaml`.
//! - [`clock`] -- Wall-clock helpers (Unix milliseconds).

pub mod board;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod grid;
pub mod history;
pub mod rate_limit;
pub mod registry;

pub use board::{Board, BoardState, BoardStats, RejectReason, Session};
pub use config::{ConfigError, GridwallConfig};
pub use rate_limit::{Denial, RatePolicy};
