//! `WebSocket` handler: one task per connection.
//!
//! Clients connect to `GET /ws`. The lifecycle of a connection is:
//!
//! 1. Register with the board, which allocates a [`ConnectionId`], takes
//!    the snapshot, and subscribes to the broadcast stream in one step.
//! 2. Send the `init` snapshot.
//! 3. Loop: forward broadcast events, and answer client requests with acks.
//! 4. On close or any transport error, unregister (which broadcasts the new
//!    online count and discards the connection's rate-limit record).
//!
//! Acks are written directly by the connection task; broadcasts arrive via
//! the subscription. The two paths are independent, so a submitter may see
//! its ack before the matching `grid_update`.
//!
//! If a client falls behind the broadcast buffer it is resynchronised with
//! a fresh `init` snapshot rather than left with a gap.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use gridwall_core::clock::now_millis;
use gridwall_core::{Board, Session};
use gridwall_types::{
    CanSubmitAck, ClientRequest, ConnectionId, HistoryAck, ProtocolError, ServerEvent, SubmitAck,
    Timestamp,
};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_connect(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Drive one connection from registration to disconnect.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let board = Arc::clone(&state.board);
    let Session {
        id,
        init,
        mut events,
    } = board.connect(now_millis()).await;

    debug!(connection = %id, "WebSocket client connected");

    if send_event(&mut socket, &ServerEvent::Init(init)).await.is_err() {
        debug!(connection = %id, "WebSocket client disconnected before init");
        board.disconnect(id).await;
        return;
    }

    loop {
        tokio::select! {
            // A committed change or online-count update from the board.
            result = events.recv() => {
                let Some(event) = outbound_event(&board, id, &mut events, result).await else {
                    debug!(connection = %id, "Broadcast channel closed, shutting down WebSocket");
                    break;
                };
                if send_event(&mut socket, &event).await.is_err() {
                    debug!(connection = %id, "WebSocket client disconnected (send failed)");
                    break;
                }
            }
            // A request, ping, or close from the client.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_client_frame(&board, id, text.as_str(), now_millis()).await;
                        if send_event(&mut socket, &reply).await.is_err() {
                            debug!(connection = %id, "WebSocket client disconnected (ack failed)");
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(connection = %id, "WebSocket client disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(connection = %id, "WebSocket client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(connection = %id, "WebSocket error: {e}");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Binary frames and unsolicited pongs carry no requests.
                    }
                }
            }
        }
    }

    board.disconnect(id).await;
}

/// Turn one broadcast receive into the event to forward.
///
/// A lagged receiver is replaced with a fresh subscription and the client
/// gets a new `init` snapshot instead of the events it missed. Returns
/// `None` once the channel is closed.
pub async fn outbound_event(
    board: &Board,
    id: ConnectionId,
    events: &mut broadcast::Receiver<ServerEvent>,
    result: Result<ServerEvent, RecvError>,
) -> Option<ServerEvent> {
    match result {
        Ok(event) => Some(event),
        Err(RecvError::Lagged(skipped)) => {
            warn!(connection = %id, skipped, "WebSocket client lagged, resyncing");
            let (init, fresh) = board.resync().await;
            *events = fresh;
            Some(ServerEvent::Init(init))
        }
        Err(RecvError::Closed) => None,
    }
}

/// Answer one client text frame.
///
/// Every well-formed request produces exactly one ack; anything else
/// produces an `error` event and leaves the connection open.
pub async fn handle_client_frame(
    board: &Board,
    id: ConnectionId,
    frame: &str,
    now: Timestamp,
) -> ServerEvent {
    let request = match serde_json::from_str::<ClientRequest>(frame) {
        Ok(request) => request,
        Err(e) => {
            warn!(connection = %id, error = %e, "Unparseable client frame");
            return ServerEvent::Error(ProtocolError {
                reason: format!("unrecognised frame: {e}"),
            });
        }
    };

    match request {
        ClientRequest::SubmitCell(submit) => {
            let ack = match board.submit(id, &submit, now).await {
                Ok(entry) => SubmitAck::accepted(submit.request_id, entry),
                Err(reason) => SubmitAck::rejected(
                    submit.request_id,
                    reason.to_string(),
                    reason.code(),
                    reason.seconds_left(),
                ),
            };
            ServerEvent::SubmitCellAck(ack)
        }
        ClientRequest::CanSubmit(req) => {
            let eligibility = board.can_submit(id, now).await;
            ServerEvent::CanSubmitAck(CanSubmitAck::new(req.request_id, eligibility))
        }
        ClientRequest::RequestHistory(req) => ServerEvent::HistoryAck(HistoryAck {
            request_id: req.request_id,
            ok: true,
            history: board.history().await,
        }),
    }
}

/// Serialize and send one event as a text frame.
///
/// A serialization failure is logged and skipped; only transport errors
/// are returned.
async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(event) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize server event: {e}");
            return Ok(());
        }
    };
    socket.send(Message::Text(json.into())).await
}
