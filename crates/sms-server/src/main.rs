//! SMS server - Entry point.

use anyhow::Context;
use phone_verification::VerificationStore;
use secrecy::ExposeSecret;
use sms_server::{
    api::{create_router, AppState},
    config::{Config, LogConfig},
    Broadcaster, MessageLog,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use telnyx_client::{phone, TelnyxClient};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.log);

    info!("Starting SMS server");

    // Initialize gateway client
    let api_key = config
        .telnyx
        .api_key
        .as_ref()
        .map(|key| key.expose_secret().clone())
        .unwrap_or_default();

    let mut gateway = TelnyxClient::new(api_key, &config.telnyx.base_url, config.telnyx.timeout)
        .context("Failed to create Telnyx client")?;
    if let Some(profile_id) = &config.telnyx.messaging_profile_id {
        gateway = gateway.with_messaging_profile(profile_id);
    }

    info!(
        base_url = gateway.base_url(),
        from_number = %phone::mask(config.from_number()),
        "Telnyx client ready"
    );

    let verifications = VerificationStore::new(config.verification_policy());

    let message_log = MessageLog::new(config.server.message_log_capacity);
    let broadcaster = Broadcaster::new(64);

    let state = AppState::new(
        &config,
        gateway,
        verifications,
        Arc::new(message_log),
        Arc::new(broadcaster),
    );

    let app = create_router(state);

    // Bind to address
    let ip: IpAddr = config
        .server
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address: {}", config.server.listen_addr))?;
    let addr = SocketAddr::new(ip, config.server.port);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

fn init_logging(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&log.level));

    let registry = tracing_subscriber::registry().with(filter);

    if log.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
