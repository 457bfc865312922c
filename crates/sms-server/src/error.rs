//! Error types for the SMS server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use phone_verification::{VerificationError, VerifyError};
use serde::Serialize;
use telnyx_client::{GatewayError, PhoneError};
use thiserror::Error;
use tracing::error;

/// Server error types.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Missing required headers")]
    MissingHeaders,

    #[error("Invalid signature")]
    SignatureMismatch,

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid phone number format: {0}")]
    InvalidPhoneNumber(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No verification pending for this phone number")]
    VerificationNotFound,

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error("Messaging gateway not configured: {0}")]
    NotConfigured(String),

    #[error("Messaging gateway error: {0}")]
    Gateway(String),

    #[error("Failed to process webhook: {0}")]
    HandlerFailure(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_remaining: Option<u32>,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServerError::MissingHeaders => (StatusCode::BAD_REQUEST, "MISSING_HEADERS"),
            ServerError::SignatureMismatch => (StatusCode::UNAUTHORIZED, "SIGNATURE_MISMATCH"),
            ServerError::InvalidPayload(_) => (StatusCode::BAD_REQUEST, "INVALID_PAYLOAD"),
            ServerError::InvalidPhoneNumber(_) => (StatusCode::BAD_REQUEST, "INVALID_PHONE_NUMBER"),
            ServerError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ServerError::VerificationNotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ServerError::Verify(VerifyError::AlreadyVerified) => {
                (StatusCode::CONFLICT, "ALREADY_VERIFIED")
            }
            ServerError::Verify(VerifyError::Expired) => (StatusCode::GONE, "EXPIRED"),
            ServerError::Verify(VerifyError::AttemptsExhausted) => {
                (StatusCode::TOO_MANY_REQUESTS, "ATTEMPTS_EXHAUSTED")
            }
            ServerError::Verify(VerifyError::CodeMismatch { .. }) => {
                (StatusCode::BAD_REQUEST, "CODE_MISMATCH")
            }
            ServerError::NotConfigured(_) => (StatusCode::SERVICE_UNAVAILABLE, "NOT_CONFIGURED"),
            ServerError::Gateway(_) => (StatusCode::BAD_GATEWAY, "GATEWAY_ERROR"),
            ServerError::HandlerFailure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "HANDLER_FAILURE")
            }
        };

        let attempts_remaining = match &self {
            ServerError::Verify(VerifyError::CodeMismatch { attempts_remaining }) => {
                Some(*attempts_remaining)
            }
            _ => None,
        };

        // Internal details stay in the logs
        let message = match &self {
            ServerError::HandlerFailure(detail) => {
                error!(error = %detail, "Webhook handler failed");
                "Failed to process webhook".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            attempts_remaining,
        };

        (status, Json(body)).into_response()
    }
}

impl From<PhoneError> for ServerError {
    fn from(e: PhoneError) -> Self {
        ServerError::InvalidPhoneNumber(e.to_string())
    }
}

impl From<GatewayError> for ServerError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::InvalidPhoneNumber(number) => ServerError::InvalidPhoneNumber(number),
            GatewayError::NotConfigured(msg) => ServerError::NotConfigured(msg),
            other => ServerError::Gateway(other.to_string()),
        }
    }
}

impl From<VerificationError> for ServerError {
    fn from(e: VerificationError) -> Self {
        match e {
            VerificationError::InvalidPhoneNumber(e) => e.into(),
            VerificationError::NotFound => ServerError::VerificationNotFound,
            VerificationError::Attempt(e) => ServerError::Verify(e),
            VerificationError::Gateway(e) => e.into(),
        }
    }
}
