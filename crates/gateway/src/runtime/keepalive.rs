//! Keep-alive (progressive response) notifier.
//!
//! While the bounded wait is polling, the assistant platform's own transport
//! would time out on silence. A single provisional directive sent to the
//! platform's out-of-band endpoint keeps the exchange alive; the final
//! synchronous response remains the authoritative channel. Everything here
//! is best-effort: a failed send is logged and never fails the exchange.

use std::time::Duration;

use vb_domain::error::{Error, Result};

pub struct KeepAliveClient {
    http: reqwest::Client,
}

impl KeepAliveClient {
    pub fn new(timeout_ms: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("HTTP client build failed: {e}")))?;
        Ok(Self { http })
    }

    /// Send one progressive-response directive.
    ///
    /// Endpoint and token come from the inbound request context. When either
    /// is absent (simulator sessions have no live channel) the send is
    /// skipped silently. A non-200 status or a network error is logged only.
    pub async fn send(
        &self,
        endpoint: Option<&str>,
        access_token: Option<&str>,
        request_id: &str,
        text: &str,
    ) {
        let (endpoint, token) = match (endpoint, access_token) {
            (Some(e), Some(t)) if !e.is_empty() && !t.is_empty() => (e, t),
            _ => {
                tracing::warn!(request_id, "no progressive-response endpoint, skipping keep-alive");
                return;
            }
        };

        let body = serde_json::json!({
            "header": { "requestId": request_id },
            "directive": {
                "type": "VoicePlayer.Speak",
                "speech": text,
            },
        });

        let url = format!("{}/v1/directives", endpoint.trim_end_matches('/'));
        match self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
        {
            Ok(res) if res.status().as_u16() == 200 => {
                tracing::debug!(request_id, "progressive response accepted");
            }
            Ok(res) => {
                tracing::error!(
                    request_id,
                    status = res.status().as_u16(),
                    "progressive response failed"
                );
            }
            Err(e) => {
                tracing::error!(request_id, error = %e, "progressive response send error");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_endpoint_or_token_skips_silently() {
        let client = KeepAliveClient::new(1000).unwrap();
        // None of these may panic or attempt a network call.
        client.send(None, None, "req-1", "waiting").await;
        client.send(Some("https://api.example"), None, "req-1", "waiting").await;
        client.send(None, Some("token"), "req-1", "waiting").await;
        client.send(Some(""), Some("token"), "req-1", "waiting").await;
    }
}
