//! Voice-assistant webhook — the synchronous half of the bridge.
//!
//! `POST /v1/assistant` receives the assistant's request envelope. For the
//! send-message intent the handler creates a correlation session, pushes the
//! prompt to the messaging platform, fires the keep-alive, then blocks on
//! the bounded wait until the human answers or the poll budget runs out.
//! Either way the assistant always gets a spoken response.

use std::collections::HashMap;

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use crate::runtime::wait::{wait_for_reply, TokioSleeper, WaitPolicy};
use crate::state::AppState;

const INTENT_REQUEST: &str = "IntentRequest";
const SEND_MESSAGE_INTENT: &str = "SendMessageIntent";
const MESSAGE_SLOT: &str = "Message";

/// Spoken when the request carries no usable message slot or intent.
const GUIDANCE_TEXT: &str = "送りたいメッセージを話しかけてください";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request envelope
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct AssistantEnvelope {
    #[serde(default)]
    pub version: Option<String>,
    pub session: AssistantSession,
    pub request: AssistantRequest,
    #[serde(default)]
    pub context: AssistantContext,
}

#[derive(Debug, Deserialize)]
pub struct AssistantSession {
    /// The correlation key for the whole exchange.
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    #[serde(rename = "type")]
    pub request_type: String,
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[serde(default)]
    pub intent: Option<Intent>,
}

#[derive(Debug, Deserialize)]
pub struct Intent {
    pub name: String,
    #[serde(default)]
    pub slots: HashMap<String, Slot>,
}

#[derive(Debug, Deserialize)]
pub struct Slot {
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssistantContext {
    #[serde(rename = "System", default)]
    pub system: SystemContext,
}

/// Out-of-band channel credentials for the progressive response. Absent in
/// simulator sessions.
#[derive(Debug, Default, Deserialize)]
pub struct SystemContext {
    #[serde(rename = "apiEndpoint", default)]
    pub api_endpoint: Option<String>,
    #[serde(rename = "apiAccessToken", default)]
    pub api_access_token: Option<String>,
}

/// Extract the free-text message slot from a send-message intent request.
fn message_slot(request: &AssistantRequest) -> Option<&str> {
    if request.request_type != INTENT_REQUEST {
        return None;
    }
    let intent = request.intent.as_ref()?;
    if intent.name != SEND_MESSAGE_INTENT {
        return None;
    }
    intent
        .slots
        .get(MESSAGE_SLOT)?
        .value
        .as_deref()
        .filter(|v| !v.is_empty())
}

/// Render the synchronous response envelope.
fn speech_response(text: &str) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "version": "1.0",
        "response": {
            "outputSpeech": {
                "type": "PlainText",
                "text": text,
            },
        },
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/assistant
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn assistant_webhook(
    State(state): State<AppState>,
    Json(envelope): Json<AssistantEnvelope>,
) -> impl IntoResponse {
    let session_id = &envelope.session.session_id;
    let request_id = &envelope.request.request_id;

    // ── 1. Validate the intent ────────────────────────────────────
    let Some(message) = message_slot(&envelope.request) else {
        tracing::info!(
            %session_id,
            request_type = %envelope.request.request_type,
            "no message slot, responding with guidance"
        );
        return speech_response(GUIDANCE_TEXT);
    };

    // ── 2. Create the correlation session ─────────────────────────
    // A store failure means the reply could never be correlated back,
    // so abort with a user-visible error instead of waiting for nothing.
    if let Err(e) = state.sessions.create(session_id, message) {
        tracing::error!(%session_id, error = %e, "session create failed");
        return speech_response(&state.config.bridge.store_error_text);
    }

    // ── 3. Push the prompt to the messaging platform ──────────────
    // Delivery failure is non-fatal: the wait below still runs and
    // times out cleanly if nobody ever sees the prompt.
    if let Err(e) = state.messaging.push_confirm(session_id, message).await {
        tracing::warn!(%session_id, error = %e, "prompt delivery failed");
    }

    // ── 4. Keep-alive, then block on the bounded wait ─────────────
    let system = &envelope.context.system;
    state
        .keepalive
        .send(
            system.api_endpoint.as_deref(),
            system.api_access_token.as_deref(),
            request_id,
            &state.config.bridge.keepalive_text,
        )
        .await;

    let policy = WaitPolicy::from_config(&state.config.bridge);
    let result = wait_for_reply(&state.sessions, session_id, policy, &TokioSleeper).await;

    // ── 5. Render the final speech ─────────────────────────────────
    match result {
        Some(session) => {
            let text = session
                .reply_message
                .unwrap_or_else(|| state.config.bridge.timeout_text.clone());
            speech_response(&text)
        }
        None => speech_response(&state.config.bridge.timeout_text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(json: serde_json::Value) -> AssistantEnvelope {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn full_envelope_parses() {
        let e = envelope(serde_json::json!({
            "version": "1.0",
            "session": { "sessionId": "S1" },
            "context": {
                "System": {
                    "apiEndpoint": "https://api.assistant.example",
                    "apiAccessToken": "tok",
                }
            },
            "request": {
                "type": "IntentRequest",
                "requestId": "req-1",
                "intent": {
                    "name": "SendMessageIntent",
                    "slots": { "Message": { "value": "Pick me up at 6" } }
                }
            }
        }));

        assert_eq!(e.session.session_id, "S1");
        assert_eq!(e.context.system.api_endpoint.as_deref(), Some("https://api.assistant.example"));
        assert_eq!(message_slot(&e.request), Some("Pick me up at 6"));
    }

    #[test]
    fn non_intent_requests_have_no_message_slot() {
        let e = envelope(serde_json::json!({
            "session": { "sessionId": "S1" },
            "request": { "type": "LaunchRequest", "requestId": "req-1" }
        }));
        assert_eq!(message_slot(&e.request), None);
    }

    #[test]
    fn wrong_intent_name_has_no_message_slot() {
        let e = envelope(serde_json::json!({
            "session": { "sessionId": "S1" },
            "request": {
                "type": "IntentRequest",
                "requestId": "req-1",
                "intent": { "name": "HelpIntent", "slots": {} }
            }
        }));
        assert_eq!(message_slot(&e.request), None);
    }

    #[test]
    fn empty_slot_value_is_rejected() {
        let e = envelope(serde_json::json!({
            "session": { "sessionId": "S1" },
            "request": {
                "type": "IntentRequest",
                "requestId": "req-1",
                "intent": {
                    "name": "SendMessageIntent",
                    "slots": { "Message": { "value": "" } }
                }
            }
        }));
        assert_eq!(message_slot(&e.request), None);
    }

    #[test]
    fn speech_response_has_plain_text_shape() {
        let Json(body) = speech_response("はい");
        assert_eq!(body["version"], "1.0");
        assert_eq!(body["response"]["outputSpeech"]["type"], "PlainText");
        assert_eq!(body["response"]["outputSpeech"]["text"], "はい");
    }
}
