//! Real-time channel frames exchanged over the `WebSocket`.
//!
//! Server frames are adjacently tagged: `{"event": "grid_update", "data": {...}}`.
//! Client frames are internally tagged and flat:
//! `{"event": "submit_cell", "requestId": 7, "cellIndex": 3, "char": "a"}`.
//! Every request may carry a `requestId` which the matching ack echoes back,
//! standing in for per-call acknowledgment callbacks.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{RateMode, RejectCode};
use crate::structs::{Eligibility, GridUpdate, HistoryEntry, InitPayload, OnlineCount};

// ---------------------------------------------------------------------------
// Client -> server
// ---------------------------------------------------------------------------

/// A request sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "event", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ClientRequest {
    /// Write one cell.
    SubmitCell(SubmitCellRequest),
    /// Ask whether a submission would currently be allowed.
    CanSubmit(PlainRequest),
    /// Fetch the full history log.
    RequestHistory(PlainRequest),
}

/// Payload of a `submit_cell` request.
///
/// Both fields are kept as raw JSON so that a missing, mistyped, or
/// fractional value is reported as a validation rejection rather than a
/// frame parse error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SubmitCellRequest {
    /// Correlation id echoed in the ack.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub request_id: Option<u64>,
    /// Target cell index; must be an integer in `[0, TOTAL_CELLS)`.
    #[serde(default)]
    pub cell_index: serde_json::Value,
    /// Value to write; must be a non-empty string.
    #[serde(default, rename = "char")]
    pub value: serde_json::Value,
}

impl SubmitCellRequest {
    /// Build a well-typed request without a correlation id.
    pub fn new(cell_index: i64, value: &str) -> Self {
        Self {
            request_id: None,
            cell_index: serde_json::Value::from(cell_index),
            value: serde_json::Value::from(value),
        }
    }
}

/// A request with no payload beyond its correlation id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PlainRequest {
    /// Correlation id echoed in the ack.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub request_id: Option<u64>,
}

// ---------------------------------------------------------------------------
// Server -> client
// ---------------------------------------------------------------------------

/// A frame pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ServerEvent {
    /// Full snapshot, sent once on connect and again after a lag resync.
    Init(InitPayload),
    /// A committed single-cell change.
    GridUpdate(GridUpdate),
    /// The history entry for the same committed change.
    HistoryUpdate(HistoryEntry),
    /// The current number of live connections.
    OnlineCount(OnlineCount),
    /// Answer to `submit_cell`.
    SubmitCellAck(SubmitAck),
    /// Answer to `can_submit`.
    CanSubmitAck(CanSubmitAck),
    /// Answer to `request_history`.
    HistoryAck(HistoryAck),
    /// The client sent a frame the server could not understand.
    Error(ProtocolError),
}

/// Acknowledgment of a `submit_cell` request.
///
/// `{ok: true, entry}` on success; `{ok: false, reason, code, secondsLeft?}`
/// on rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SubmitAck {
    /// Correlation id copied from the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub request_id: Option<u64>,
    /// Whether the submission was committed.
    pub ok: bool,
    /// The committed entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<HistoryEntry>,
    /// Human-readable rejection reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Machine-readable rejection code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<RejectCode>,
    /// Whole seconds until the cooldown expires, for cooldown rejections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub seconds_left: Option<u64>,
}

impl SubmitAck {
    /// Ack for a committed submission.
    pub const fn accepted(request_id: Option<u64>, entry: HistoryEntry) -> Self {
        Self {
            request_id,
            ok: true,
            entry: Some(entry),
            reason: None,
            code: None,
            seconds_left: None,
        }
    }

    /// Ack for a rejected submission.
    pub const fn rejected(
        request_id: Option<u64>,
        reason: String,
        code: RejectCode,
        seconds_left: Option<u64>,
    ) -> Self {
        Self {
            request_id,
            ok: false,
            entry: None,
            reason: Some(reason),
            code: Some(code),
            seconds_left,
        }
    }
}

/// Acknowledgment of a `can_submit` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CanSubmitAck {
    /// Correlation id copied from the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub request_id: Option<u64>,
    /// Whether a submission would pass the rate limiter.
    pub allowed: bool,
    /// `timed` or `single_shot`.
    pub mode: RateMode,
    /// Whole seconds until the cooldown expires. Cooldown mode only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub seconds_left: Option<u64>,
}

impl CanSubmitAck {
    /// Wrap an eligibility answer with the caller's correlation id.
    pub const fn new(request_id: Option<u64>, eligibility: Eligibility) -> Self {
        Self {
            request_id,
            allowed: eligibility.allowed,
            mode: eligibility.mode,
            seconds_left: eligibility.seconds_left,
        }
    }
}

/// Acknowledgment of a `request_history` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct HistoryAck {
    /// Correlation id copied from the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub request_id: Option<u64>,
    /// Always `true`; reading history cannot fail.
    pub ok: bool,
    /// The complete history log in acceptance order.
    pub history: Vec<HistoryEntry>,
}

/// Description of an unparseable client frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ProtocolError {
    /// What was wrong with the frame.
    pub reason: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_submit_cell_frame() {
        let frame = r#"{"event":"submit_cell","requestId":7,"cellIndex":3,"char":"a"}"#;
        let request: ClientRequest = serde_json::from_str(frame).unwrap();
        assert_eq!(
            request,
            ClientRequest::SubmitCell(SubmitCellRequest {
                request_id: Some(7),
                ..SubmitCellRequest::new(3, "a")
            })
        );
    }

    #[test]
    fn missing_submit_fields_default_to_null() {
        let request: ClientRequest = serde_json::from_str(r#"{"event":"submit_cell"}"#).unwrap();
        assert_eq!(
            request,
            ClientRequest::SubmitCell(SubmitCellRequest {
                request_id: None,
                cell_index: serde_json::Value::Null,
                value: serde_json::Value::Null,
            })
        );
    }

    #[test]
    fn parses_bare_can_submit() {
        let request: ClientRequest = serde_json::from_str(r#"{"event":"can_submit"}"#).unwrap();
        assert_eq!(request, ClientRequest::CanSubmit(PlainRequest::default()));
    }

    #[test]
    fn unknown_event_is_an_error() {
        let parsed = serde_json::from_str::<ClientRequest>(r#"{"event":"paint_everything"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn server_events_are_adjacently_tagged() {
        let event = ServerEvent::OnlineCount(OnlineCount { online: 3 });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, serde_json::json!({"event": "online_count", "data": {"online": 3}}));
    }

    #[test]
    fn rejected_ack_shape() {
        let ack = SubmitAck::rejected(
            Some(1),
            "timed restriction: wait 30s".to_owned(),
            RejectCode::RateLimited,
            Some(30),
        );
        let json = serde_json::to_value(ServerEvent::SubmitCellAck(ack)).unwrap();
        assert_eq!(json["event"], "submit_cell_ack");
        assert_eq!(json["data"]["ok"], false);
        assert_eq!(json["data"]["code"], "RATE_LIMITED");
        assert_eq!(json["data"]["secondsLeft"], 30);
        assert_eq!(json["data"]["requestId"], 1);
        assert!(json["data"].get("entry").is_none());
    }
}
