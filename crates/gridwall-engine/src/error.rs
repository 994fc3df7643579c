//! Error types for the Gridwall binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and while serving.

/// Top-level error for the Gridwall binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: gridwall_core::ConfigError,
    },

    /// The HTTP + `WebSocket` server failed to start.
    #[error("startup error: {source}")]
    Startup {
        /// The underlying startup error.
        #[from]
        source: gridwall_server::StartupError,
    },

    /// The server task ended abnormally.
    #[error("server task failed: {message}")]
    Server {
        /// Description of the task failure.
        message: String,
    },
}
