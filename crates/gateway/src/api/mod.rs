pub mod assistant;
pub mod health;
pub mod messaging;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the API router.
///
/// Both webhook endpoints are public at the routing layer: the assistant
/// platform signs nothing we can check here, and the messaging webhook
/// authenticates itself via the HMAC signature validated in the handler.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/health", get(health::health))
        .route("/v1/assistant", post(assistant::assistant_webhook))
        .route("/v1/messaging/webhook", post(messaging::messaging_webhook))
}
