/// Shared error type used across all VoiceBridge crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("parse: {0}")]
    Parse(String),

    #[error("store: {0}")]
    Store(String),

    #[error("delivery: {0}")]
    Delivery(String),

    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
