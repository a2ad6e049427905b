use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub messaging: MessagingConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Server
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_3210")]
    pub port: u16,
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Directory holding persisted state (session records).
    #[serde(default = "d_state_path")]
    pub state_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3210,
            host: "127.0.0.1".into(),
            cors: CorsConfig::default(),
            state_path: d_state_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins. A single `"*"` entry allows all origins.
    #[serde(default = "d_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: d_origins(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Messaging platform
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Connection and addressing details for the messaging platform that
/// delivers prompts to a human and posts their reply back via webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Platform API base URL, e.g. `https://api.messaging.example`.
    #[serde(default)]
    pub api_base_url: String,
    /// Environment variable holding the channel secret used to verify
    /// webhook signatures. Read once at startup.
    #[serde(default = "d_secret_env")]
    pub channel_secret_env: String,
    /// Environment variable holding the bearer token for outbound sends.
    /// Read once at startup.
    #[serde(default = "d_token_env")]
    pub access_token_env: String,
    /// Fixed destination (group/room id) for outbound prompts.
    /// Discoverable by sending `info` to the bot.
    #[serde(default)]
    pub destination: String,
    /// Label on the affirmative reply button.
    #[serde(default = "d_yes")]
    pub yes_label: String,
    /// Label on the negative reply button.
    #[serde(default = "d_no")]
    pub no_label: String,
    #[serde(default = "d_8000")]
    pub timeout_ms: u64,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            channel_secret_env: d_secret_env(),
            access_token_env: d_token_env(),
            destination: String::new(),
            yes_label: d_yes(),
            no_label: d_no(),
            timeout_ms: 8000,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Bridge (bounded wait + spoken texts)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Polling budget and the texts spoken back to the voice assistant.
///
/// The defaults give a ≈30 second overall wait (6 attempts × 5 seconds),
/// which fits inside the assistant platform's extended deadline once a
/// progressive response has been sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "d_5")]
    pub poll_interval_secs: u64,
    #[serde(default = "d_6")]
    pub max_attempts: u32,
    /// Provisional progress text sent as the keep-alive while polling.
    #[serde(default = "d_keepalive_text")]
    pub keepalive_text: String,
    /// Fallback speech when no reply arrives within the budget.
    #[serde(default = "d_timeout_text")]
    pub timeout_text: String,
    /// Speech returned when the session record cannot be written.
    #[serde(default = "d_store_error_text")]
    pub store_error_text: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            max_attempts: 6,
            keepalive_text: d_keepalive_text(),
            timeout_text: d_timeout_text(),
            store_error_text: d_store_error_text(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_3210() -> u16 {
    3210
}
fn d_host() -> String {
    "127.0.0.1".into()
}
fn d_state_path() -> PathBuf {
    PathBuf::from("./data/state")
}
fn d_origins() -> Vec<String> {
    vec!["http://localhost:*".into(), "http://127.0.0.1:*".into()]
}
fn d_secret_env() -> String {
    "VB_CHANNEL_SECRET".into()
}
fn d_token_env() -> String {
    "VB_ACCESS_TOKEN".into()
}
fn d_yes() -> String {
    "はい".into()
}
fn d_no() -> String {
    "いいえ".into()
}
fn d_8000() -> u64 {
    8000
}
fn d_5() -> u64 {
    5
}
fn d_6() -> u32 {
    6
}
fn d_keepalive_text() -> String {
    "メッセージを送信しました．応答待ちです．".into()
}
fn d_timeout_text() -> String {
    "応答がありませんでした".into()
}
fn d_store_error_text() -> String {
    "メッセージを保存できませんでした".into()
}
