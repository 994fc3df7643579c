//! Read-only REST endpoint handlers.
//!
//! All handlers query the [`Board`](gridwall_core::Board) through the shared
//! [`AppState`]. They take the board's read lock only, so they observe a
//! consistent snapshot and never delay a submission for long.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/grid` | `{grid, size}` |
//! | `GET` | `/api/history` | `{history}` |
//! | `GET` | `/api/history/grouped` | `[{second, entries}]` |

use std::sync::Arc;

use axum::extract::State;
use axum::http::Uri;
use axum::response::{Html, IntoResponse};
use axum::Json;
use gridwall_types::HistoryView;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing board status and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.board.stats().await;
    let size = stats.size;
    let total_cells = stats.total_cells;
    let online = stats.online;
    let history_len = stats.history_len;
    let mode = stats.mode;

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Gridwall</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        li::before {{ content: "GET "; color: #7ee787; font-weight: bold; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Gridwall</h1>
    <p class="subtitle">Shared character grid</p>

    <div>
        <div class="metric">
            <div class="label">Grid</div>
            <div class="value">{size}&times;{size}</div>
        </div>
        <div class="metric">
            <div class="label">Cells</div>
            <div class="value">{total_cells}</div>
        </div>
        <div class="metric">
            <div class="label">Online</div>
            <div class="value">{online}</div>
        </div>
        <div class="metric">
            <div class="label">Submissions</div>
            <div class="value">{history_len}</div>
        </div>
        <div class="metric">
            <div class="label">Rate mode</div>
            <div class="value">{mode}</div>
        </div>
    </div>

    <hr>

    <h2>API Endpoints</h2>
    <ul>
        <li><a href="/api/grid">/api/grid</a> -- Current grid snapshot</li>
        <li><a href="/api/history">/api/history</a> -- Full submission history</li>
        <li><a href="/api/history/grouped">/api/history/grouped</a> -- History grouped by second</li>
    </ul>

    <h2>WebSocket</h2>
    <ul>
        <li style="list-style:none;"><code>ws://host:port/ws</code> -- Live grid updates and submissions</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/grid
// ---------------------------------------------------------------------------

/// Return every cell value and the grid side length.
pub async fn get_grid(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.board.grid_snapshot().await;
    Ok(Json(serde_json::to_value(snapshot)?))
}

// ---------------------------------------------------------------------------
// GET /api/history
// ---------------------------------------------------------------------------

/// Return the full history log in acceptance order.
pub async fn get_history(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let history = state.board.history().await;
    Ok(Json(serde_json::to_value(HistoryView { history })?))
}

// ---------------------------------------------------------------------------
// GET /api/history/grouped
// ---------------------------------------------------------------------------

/// Return history bucketed by `floor(timestamp / 1000)`.
pub async fn get_history_grouped(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let buckets = state.board.history_by_second().await;
    Ok(Json(serde_json::to_value(buckets)?))
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// JSON 404 for unknown routes.
#[allow(clippy::unused_async)]
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {}", uri.path()))
}
