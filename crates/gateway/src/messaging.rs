//! Outbound client for the messaging platform.
//!
//! Two operations: `push_confirm` delivers the correlation prompt as a
//! confirm template with yes/no postback buttons, and `reply_text` answers
//! an inbound event in-line using its reply token. Button payloads carry
//! `{"id": <correlation id>, "message": <chosen label>}` as opaque postback
//! data that the platform echoes back verbatim when the human taps one.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use vb_domain::config::MessagingConfig;
use vb_domain::error::{Error, Result};

pub struct MessagingClient {
    http: reqwest::Client,
    base_url: String,
    destination: String,
    yes_label: String,
    no_label: String,
    has_token: bool,
}

impl MessagingClient {
    pub fn new(config: &MessagingConfig, access_token: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let has_token = access_token.is_some();
        if let Some(token) = access_token {
            let val = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| Error::Config(format!("invalid access token header: {e}")))?;
            headers.insert(AUTHORIZATION, val);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("HTTP client build failed: {e}")))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            destination: config.destination.clone(),
            yes_label: config.yes_label.clone(),
            no_label: config.no_label.clone(),
            has_token,
        })
    }

    /// Push the correlation prompt to the configured destination.
    pub async fn push_confirm(&self, id: &str, prompt: &str) -> Result<()> {
        let body = confirm_payload(
            &self.destination,
            id,
            prompt,
            &self.yes_label,
            &self.no_label,
        )?;
        self.post("/v2/bot/message/push", &body).await
    }

    /// Reply to an inbound event with plain text (used by the `info`
    /// diagnostic message).
    pub async fn reply_text(&self, reply_token: &str, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "replyToken": reply_token,
            "messages": [{ "type": "text", "text": text }],
        });
        self.post("/v2/bot/message/reply", &body).await
    }

    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<()> {
        if !self.has_token {
            return Err(Error::Delivery("no messaging access token configured".into()));
        }

        let url = format!("{}{path}", self.base_url);
        let res = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Delivery(format!("POST {path}: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            let detail = res.text().await.unwrap_or_default();
            return Err(Error::Delivery(format!("POST {path}: {status} {detail}")));
        }
        Ok(())
    }
}

/// Build the confirm-template payload.
///
/// Kept as a free function so the wire shape — in particular the opaque
/// postback data the reply handler must parse back — is unit-testable
/// without a live endpoint.
pub fn confirm_payload(
    to: &str,
    id: &str,
    prompt: &str,
    yes_label: &str,
    no_label: &str,
) -> Result<serde_json::Value> {
    let action = |label: &str| -> Result<serde_json::Value> {
        let data = serde_json::to_string(&serde_json::json!({
            "id": id,
            "message": label,
        }))?;
        Ok(serde_json::json!({
            "type": "postback",
            "label": label,
            "text": label,
            "data": data,
        }))
    };

    Ok(serde_json::json!({
        "to": to,
        "messages": [{
            "type": "template",
            "altText": prompt,
            "template": {
                "type": "confirm",
                "text": prompt,
                "actions": [action(yes_label)?, action(no_label)?],
            },
        }],
    }))
}
