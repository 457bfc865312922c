//! SMS server for a chat application.
//!
//! - Receives signed inbound message webhooks and hands them to message sinks
//! - Sends outbound messages through the Telnyx gateway
//! - Verifies phone ownership with short-lived codes sent by SMS

pub mod api;
pub mod config;
pub mod error;
pub mod signature;
pub mod sinks;
pub mod webhook;

pub use config::Config;
pub use error::ServerError;
pub use sinks::{Broadcaster, MessageLog, MessageSink, SinkError};
pub use webhook::{InboundMessage, WebhookEvent};
