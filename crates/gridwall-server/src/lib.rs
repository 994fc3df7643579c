//! HTTP and `WebSocket` server for the Gridwall shared grid.
//!
//! This crate provides an Axum server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws`) where each connection receives an
//!   `init` snapshot, then every committed change and online-count update,
//!   and may submit cells or query eligibility and history
//! - **REST endpoints** for read-only snapshots of the grid and history
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! All state lives in a [`Board`](gridwall_core::Board) shared through
//! [`AppState`]. Submissions are serialized by the board's write lock and
//! broadcast before the lock is released, so every connection observes
//! commits in the same order.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{serve_on, start_server, ServerConfig, ServerError};
pub use startup::{spawn_server, RunningServer, StartupError};
pub use state::AppState;
