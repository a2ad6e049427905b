use std::sync::Arc;

use vb_domain::config::Config;
use vb_sessions::SessionStore;

use crate::messaging::MessagingClient;
use crate::runtime::keepalive::KeepAliveClient;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    /// Correlation session store — the only channel between the assistant
    /// handler and the messaging webhook.
    pub sessions: Arc<SessionStore>,

    /// Outbound client for the messaging platform (push + reply).
    pub messaging: Arc<MessagingClient>,

    /// Progressive-response client for the assistant's out-of-band channel.
    pub keepalive: Arc<KeepAliveClient>,

    /// Channel secret for webhook signature verification (read once at
    /// startup). `None` = dev mode (signatures not enforced).
    pub channel_secret: Option<Arc<String>>,
}
