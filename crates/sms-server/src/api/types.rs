//! API request and response types.

use chrono::{DateTime, Utc};
use phone_verification::VerificationState;
use serde::{Deserialize, Serialize};

/// Acknowledgement returned to the webhook sender.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub message: String,
}

/// Request to send an outbound message.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// Recipient, any common spelling of a NANP number
    pub to: String,

    pub text: String,

    /// Optional media attachments (MMS)
    #[serde(default)]
    pub media_urls: Vec<String>,
}

/// Response after handing a message to the gateway.
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub id: String,
    pub to: String,
    pub status: Option<String>,
}

/// Status of a previously sent message.
#[derive(Debug, Serialize)]
pub struct MessageStatusResponse {
    pub id: String,
    pub status: Option<String>,
}

/// Request to start (or resend) a phone verification.
#[derive(Debug, Deserialize)]
pub struct StartVerificationRequest {
    pub user_id: String,
    pub phone_number: String,
}

/// Response after sending a verification code.
#[derive(Debug, Serialize)]
pub struct StartVerificationResponse {
    /// Masked phone number, e.g. "+1 (555) ***-4567"
    pub phone_number: String,
    pub status: VerificationState,
    pub expires_at: DateTime<Utc>,
    pub message: String,
}

/// Request to check a verification code.
#[derive(Debug, Deserialize)]
pub struct CheckVerificationRequest {
    pub user_id: String,
    pub phone_number: String,
    pub code: String,
}

/// Response after a successful code check.
#[derive(Debug, Serialize)]
pub struct CheckVerificationResponse {
    pub phone_number: String,
    pub status: VerificationState,
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub pending_verifications: usize,
}
