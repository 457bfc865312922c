//! HTTP request handlers.

use super::types::{
    CheckVerificationRequest, CheckVerificationResponse, HealthResponse, MessageStatusResponse,
    SendMessageRequest, SendMessageResponse, StartVerificationRequest,
    StartVerificationResponse, WebhookResponse,
};
use super::AppState;
use crate::error::ServerError;
use crate::signature;
use crate::webhook::WebhookEvent;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use phone_verification::VerificationState;
use secrecy::ExposeSecret;
use telnyx_client::{phone, OutboundMessage};
use tracing::{debug, info, warn};

/// Header carrying the hex webhook signature.
pub const SIGNATURE_HEADER: &str = "telnyx-signature-ed25519";

/// Header carrying the webhook timestamp.
pub const TIMESTAMP_HEADER: &str = "telnyx-timestamp";

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn require_user_id(user_id: &str) -> Result<(), ServerError> {
    if user_id.trim().is_empty() {
        return Err(ServerError::InvalidRequest("user_id must not be empty".into()));
    }
    Ok(())
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        pending_verifications: state.verifications.pending_count().await,
    })
}

/// Receive a webhook event from Telnyx.
///
/// The signature is checked over the raw body before anything is parsed.
/// Only `data.event_type` must parse for events other than `message.received`.
/// A signed `message.received` event whose fields do not parse is answered
/// with 400 `INVALID_PAYLOAD` rather than 500, since a retry of the same body
/// cannot succeed.
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ServerError> {
    let (Some(signature), Some(timestamp)) = (
        header_value(&headers, SIGNATURE_HEADER),
        header_value(&headers, TIMESTAMP_HEADER),
    ) else {
        warn!("Webhook rejected: missing signature headers");
        return Err(ServerError::MissingHeaders);
    };

    let secret = state.signing_secret.expose_secret().as_bytes();
    if !signature::verify(secret, timestamp, &body, signature) {
        warn!(timestamp, "Webhook rejected: signature mismatch");
        return Err(ServerError::SignatureMismatch);
    }

    let event: WebhookEvent =
        serde_json::from_slice(&body).map_err(|e| ServerError::InvalidPayload(e.to_string()))?;

    let Some(message) = event
        .inbound_message()
        .map_err(|e| ServerError::InvalidPayload(e.to_string()))?
    else {
        debug!(
            event_type = %event.data.event_type,
            event_id = %event.data.id,
            "Ignoring webhook event"
        );
        return Ok(Json(WebhookResponse {
            message: "Webhook processed successfully".to_string(),
        }));
    };

    info!(
        message_id = %message.id,
        from = %phone::mask(&message.from),
        media = message.media_urls.len(),
        "Inbound message received"
    );

    state.persistence.deliver(&message).await.map_err(|e| {
        ServerError::HandlerFailure(format!("{} failed: {}", state.persistence.name(), e))
    })?;

    if let Err(e) = state.notifier.deliver(&message).await {
        warn!(
            sink = state.notifier.name(),
            message_id = %message.id,
            error = %e,
            "Failed to notify about inbound message"
        );
    }

    Ok(Json(WebhookResponse {
        message: "Webhook processed successfully".to_string(),
    }))
}

/// Send an outbound message from the configured number.
pub async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ServerError> {
    let to = phone::normalize_valid(&request.to)?;

    if request.text.trim().is_empty() && request.media_urls.is_empty() {
        return Err(ServerError::InvalidRequest(
            "Message needs text or media".into(),
        ));
    }

    let message = OutboundMessage::text(state.sender_number.as_str(), to.as_str(), request.text)
        .with_media(request.media_urls);

    let sent = state.gateway.send_message(&message).await?;
    info!(message_id = %sent.id, to = %phone::mask(&to), "Outbound message sent");

    Ok(Json(SendMessageResponse {
        status: sent.status().map(String::from),
        id: sent.id,
        to,
    }))
}

/// Look up the delivery status of a sent message.
pub async fn get_message_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageStatusResponse>, ServerError> {
    let record = state.gateway.get_message_status(&id).await?;

    Ok(Json(MessageStatusResponse {
        status: record.status().map(String::from),
        id: record.id,
    }))
}

/// Issue a verification code and text it to the user.
///
/// If sending fails the code stays issued and can be resent.
pub async fn start_verification(
    State(state): State<AppState>,
    Json(request): Json<StartVerificationRequest>,
) -> Result<Json<StartVerificationResponse>, ServerError> {
    require_user_id(&request.user_id)?;

    let verification = state
        .verifications
        .issue(&request.user_id, &request.phone_number)
        .await?;

    state
        .verifications
        .send_code(
            &verification.user_id,
            &verification.phone_number,
            &state.sender_number,
            &state.gateway,
        )
        .await?;

    Ok(Json(StartVerificationResponse {
        phone_number: phone::mask(&verification.phone_number),
        status: VerificationState::Issued,
        expires_at: verification.expires_at,
        message: "Verification code sent.".to_string(),
    }))
}

/// Resend the outstanding code.
pub async fn resend_verification(
    State(state): State<AppState>,
    Json(request): Json<StartVerificationRequest>,
) -> Result<Json<StartVerificationResponse>, ServerError> {
    require_user_id(&request.user_id)?;

    state
        .verifications
        .send_code(
            &request.user_id,
            &request.phone_number,
            &state.sender_number,
            &state.gateway,
        )
        .await?;

    let verification = state
        .verifications
        .get(&request.user_id, &request.phone_number)
        .await?
        .ok_or(ServerError::VerificationNotFound)?;

    Ok(Json(StartVerificationResponse {
        phone_number: phone::mask(&verification.phone_number),
        status: verification.state(),
        expires_at: verification.expires_at,
        message: "Verification code resent.".to_string(),
    }))
}

/// Check a verification code.
pub async fn check_verification(
    State(state): State<AppState>,
    Json(request): Json<CheckVerificationRequest>,
) -> Result<Json<CheckVerificationResponse>, ServerError> {
    require_user_id(&request.user_id)?;

    state
        .verifications
        .attempt(&request.user_id, &request.phone_number, request.code.trim())
        .await?;

    let phone_number = phone::normalize(&request.phone_number)?;

    Ok(Json(CheckVerificationResponse {
        phone_number: phone::mask(&phone_number),
        status: VerificationState::Verified,
        message: "Phone number verified.".to_string(),
    }))
}
