//! HTTP API for the SMS server.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::logging_middleware;
pub use types::*;

use crate::config::Config;
use crate::sinks::MessageSink;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use phone_verification::VerificationStore;
use secrecy::SecretString;
use std::sync::Arc;
use telnyx_client::TelnyxClient;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Secret used to check webhook signatures
    pub signing_secret: SecretString,
    /// Number outbound messages are sent from
    pub sender_number: String,
    /// Messaging gateway client
    pub gateway: Arc<TelnyxClient>,
    /// Outstanding phone verifications
    pub verifications: VerificationStore,
    /// Receives every inbound message; failures fail the webhook
    pub persistence: Arc<dyn MessageSink>,
    /// Live notification of inbound messages; failures are only logged
    pub notifier: Arc<dyn MessageSink>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        config: &Config,
        gateway: TelnyxClient,
        verifications: VerificationStore,
        persistence: Arc<dyn MessageSink>,
        notifier: Arc<dyn MessageSink>,
    ) -> Self {
        Self {
            signing_secret: config
                .webhook
                .signing_secret
                .clone()
                .unwrap_or_else(|| SecretString::new(String::new())),
            sender_number: config.from_number().to_string(),
            gateway: Arc::new(gateway),
            verifications,
            persistence,
            notifier,
        }
    }
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Provider webhooks
        .route("/webhook/telnyx", post(handlers::receive_webhook))
        // Outbound messaging
        .route("/v1/messages", post(handlers::send_message))
        .route("/v1/messages/:id", get(handlers::get_message_status))
        // Phone verification
        .route("/v1/verifications", post(handlers::start_verification))
        .route(
            "/v1/verifications/resend",
            post(handlers::resend_verification),
        )
        .route(
            "/v1/verifications/check",
            post(handlers::check_verification),
        )
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
