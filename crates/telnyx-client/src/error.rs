//! Telnyx client errors.

use thiserror::Error;

/// Phone number input that cannot be turned into a canonical NANP number.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    #[error("Invalid phone number format: {0}")]
    InvalidFormat(String),

    #[error("Invalid area code: {0}")]
    InvalidAreaCode(String),
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Messaging gateway not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid phone number format: {0}")]
    InvalidPhoneNumber(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}
