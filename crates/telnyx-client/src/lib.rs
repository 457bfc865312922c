//! Telnyx messaging API client.
//!
//! Also hosts the NANP phone number helpers, since every number that reaches
//! the gateway has to pass through them first.

mod client;
mod error;
pub mod phone;
mod types;

pub use client::{TelnyxClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{GatewayError, PhoneError};
pub use types::*;
