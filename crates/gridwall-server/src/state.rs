//! Shared application state for the Gridwall server.
//!
//! [`AppState`] is a thin handle around the [`Board`]. The board owns the
//! canonical grid, the history log, the per-connection rate-limit records,
//! and the broadcast channel; handlers never touch those directly.

use std::sync::Arc;

use gridwall_core::{Board, GridwallConfig};

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The mutation coordinator and read-only query surface.
    pub board: Arc<Board>,
}

impl AppState {
    /// Wrap an existing board.
    pub const fn new(board: Arc<Board>) -> Self {
        Self { board }
    }

    /// Build a blank board from validated configuration.
    pub fn from_config(config: &GridwallConfig) -> Self {
        Self::new(Arc::new(Board::from_config(config)))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_config(&GridwallConfig::default())
    }
}
