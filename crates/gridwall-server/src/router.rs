//! Axum router construction for the Gridwall server.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for browser clients served elsewhere.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Gridwall server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws` -- `WebSocket` session (init, broadcasts, request/ack)
/// - `GET /api/grid` -- current grid snapshot
/// - `GET /api/history` -- full submission history
/// - `GET /api/history/grouped` -- history bucketed by second
///
/// Any other path answers with a JSON 404.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws", get(ws::ws_connect))
        // REST API
        .route("/api/grid", get(handlers::get_grid))
        .route("/api/history", get(handlers::get_history))
        .route("/api/history/grouped", get(handlers::get_history_grouped))
        .fallback(handlers::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
