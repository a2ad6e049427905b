//! Messaging-platform webhook — the asynchronous half of the bridge.
//!
//! `POST /v1/messaging/webhook` receives the platform's signed event
//! callbacks. Authenticity is verified with HMAC-SHA256 over the raw body
//! against the channel secret before anything is parsed. Button replies
//! (postback events) carry the correlation id and chosen text in their
//! opaque data and advance the session to `replied`; the `info` text
//! message is a diagnostic side channel that echoes the sender's platform
//! identifiers back in-line.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use vb_domain::error::{Error, Result};

use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-messaging-signature";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Event payload
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

/// Closed set of event kinds this bridge handles. Anything else the
/// platform may deliver is tolerated and ignored.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WebhookEvent {
    Message {
        #[serde(rename = "replyToken")]
        reply_token: String,
        source: EventSource,
        message: InboundMessage,
    },
    Postback {
        source: EventSource,
        postback: Postback,
    },
    #[serde(other)]
    Other,
}

/// Where a message came from: a direct chat, a group, or a room.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventSource {
    User {
        #[serde(rename = "userId")]
        user_id: String,
    },
    Group {
        #[serde(rename = "userId", default)]
        user_id: Option<String>,
        #[serde(rename = "groupId")]
        group_id: String,
    },
    Room {
        #[serde(rename = "userId", default)]
        user_id: Option<String>,
        #[serde(rename = "roomId")]
        room_id: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundMessage {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct Postback {
    /// Opaque data echoed back from the button action, serialized JSON:
    /// `{"id": <correlation id>, "message": <chosen label>}`.
    pub data: String,
}

/// The reply metadata recovered from postback data.
#[derive(Debug, Deserialize)]
pub struct ReplyMetadata {
    pub id: String,
    pub message: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Signature verification & metadata parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Verify the hex HMAC-SHA256 signature of `body` against the channel
/// secret. A `sha256=` prefix on the header value is accepted.
pub fn verify_signature(secret: &str, signature: &str, body: &[u8]) -> bool {
    let sig_hex = signature.strip_prefix("sha256=").unwrap_or(signature);

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    let computed = hex::encode(mac.finalize().into_bytes());

    // Constant-time comparison to prevent timing attacks.
    computed.as_bytes().ct_eq(sig_hex.as_bytes()).unwrap_u8() == 1
}

/// Parse the opaque postback data back into `{id, message}`.
pub fn parse_reply_metadata(data: &str) -> Result<ReplyMetadata> {
    serde_json::from_str(data).map_err(|e| Error::Parse(format!("postback data: {e}")))
}

/// The `info` diagnostic reply: the sender's platform identifiers, used to
/// discover the destination id for `[messaging].destination`.
fn source_info_text(source: &EventSource) -> String {
    match source {
        EventSource::User { user_id } => format!("UserId={user_id}"),
        EventSource::Group { user_id, group_id } => format!(
            "UserId={}, GroupId={group_id}",
            user_id.as_deref().unwrap_or("?")
        ),
        EventSource::Room { user_id, room_id } => format!(
            "UserId={}, RoomId={room_id}",
            user_id.as_deref().unwrap_or("?")
        ),
    }
}

fn status_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({ "status": "error", "message": message.into() })),
    )
        .into_response()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/messaging/webhook
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn messaging_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // ── 1. Authenticate before touching the body ──────────────────
    if let Some(secret) = &state.channel_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !verify_signature(secret, signature, &body) {
            tracing::warn!("webhook rejected: invalid signature");
            return status_error(StatusCode::BAD_REQUEST, "Invalid Signature");
        }
    } else {
        tracing::debug!("no channel secret configured, skipping signature check");
    }

    // ── 2. Parse the event payload ─────────────────────────────────
    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "webhook rejected: malformed payload");
            return status_error(StatusCode::BAD_REQUEST, "Malformed Payload");
        }
    };

    // ── 3. Dispatch events ─────────────────────────────────────────
    for event in payload.events {
        match event {
            WebhookEvent::Postback { postback, .. } => {
                let meta = match parse_reply_metadata(&postback.data) {
                    Ok(m) => m,
                    Err(e) => {
                        tracing::warn!(error = %e, "webhook rejected: bad postback data");
                        return status_error(StatusCode::BAD_REQUEST, "Malformed Postback Data");
                    }
                };

                match state.sessions.mark_replied(&meta.id, &meta.message) {
                    Ok(true) => {
                        tracing::info!(id = %meta.id, reply = %meta.message, "session replied");
                    }
                    // Unknown correlation id: ack anyway, the prompt may
                    // have already timed out on the assistant side.
                    Ok(false) => {
                        tracing::warn!(id = %meta.id, "postback for unknown correlation id");
                    }
                    Err(e) => {
                        tracing::error!(id = %meta.id, error = %e, "mark_replied failed");
                        return status_error(StatusCode::INTERNAL_SERVER_ERROR, "Store Failure");
                    }
                }
            }
            WebhookEvent::Message {
                reply_token,
                source,
                message,
            } => {
                if let InboundMessage::Text { text } = message {
                    if text.trim() == "info" {
                        let info = source_info_text(&source);
                        if let Err(e) = state.messaging.reply_text(&reply_token, &info).await {
                            tracing::warn!(error = %e, "info reply failed");
                        }
                    }
                }
            }
            WebhookEvent::Other => {}
        }
    }

    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" }))).into_response()
}
