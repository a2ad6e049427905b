//! AppState construction extracted from `main.rs` so CLI commands can boot
//! the runtime without an HTTP listener.

use std::sync::Arc;

use anyhow::Context;

use vb_domain::config::Config;
use vb_sessions::SessionStore;

use crate::messaging::MessagingClient;
use crate::runtime::keepalive::KeepAliveClient;
use crate::state::AppState;

/// Initialize every subsystem and return a fully-wired [`AppState`].
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Session store ─────────────────────────────────────────────────
    let sessions = Arc::new(
        SessionStore::new(&config.server.state_path).context("initializing session store")?,
    );

    // ── Secrets (read once, never re-read per request) ────────────────
    let channel_secret = read_env(&config.messaging.channel_secret_env);
    if channel_secret.is_none() {
        tracing::warn!(
            env = %config.messaging.channel_secret_env,
            "channel secret not set — webhook signatures will NOT be verified (dev mode)"
        );
    }

    let access_token = read_env(&config.messaging.access_token_env);
    if access_token.is_none() {
        tracing::warn!(
            env = %config.messaging.access_token_env,
            "access token not set — outbound messaging sends will fail"
        );
    }

    // ── Outbound clients ──────────────────────────────────────────────
    let messaging = Arc::new(
        MessagingClient::new(&config.messaging, access_token)
            .context("creating messaging client")?,
    );
    let keepalive = Arc::new(
        KeepAliveClient::new(config.messaging.timeout_ms).context("creating keep-alive client")?,
    );

    Ok(AppState {
        config,
        sessions,
        messaging,
        keepalive,
        channel_secret: channel_secret.map(Arc::new),
    })
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
