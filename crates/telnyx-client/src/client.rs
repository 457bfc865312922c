//! Telnyx HTTP client.

use crate::error::GatewayError;
use crate::phone::{is_valid, mask};
use crate::types::*;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use urlencoding::encode;

/// Production API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.telnyx.com/v2";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Messaging gateway client.
///
/// One value is built at startup and shared by reference; the API key is kept
/// in a `SecretString` so it never shows up in debug output.
#[derive(Clone)]
pub struct TelnyxClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
    messaging_profile_id: Option<String>,
}

impl TelnyxClient {
    /// Create a new client.
    ///
    /// Fails with [`GatewayError::NotConfigured`] when the API key is empty,
    /// so an unconfigured deployment is caught before any request is made.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GatewayError::NotConfigured("API key is empty".into()));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: SecretString::new(api_key),
            messaging_profile_id: None,
        })
    }

    /// Attach a messaging profile to every outbound message.
    pub fn with_messaging_profile(mut self, profile_id: impl Into<String>) -> Self {
        let profile_id = profile_id.into();
        self.messaging_profile_id = (!profile_id.is_empty()).then_some(profile_id);
        self
    }

    /// Get the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a message.
    ///
    /// Both numbers must already be canonical; otherwise this fails with
    /// [`GatewayError::InvalidPhoneNumber`] without touching the network.
    #[instrument(skip(self, message), fields(to = %mask(&message.to)))]
    pub async fn send_message(
        &self,
        message: &OutboundMessage,
    ) -> Result<SentMessage, GatewayError> {
        for number in [&message.from, &message.to] {
            if !is_valid(number) {
                return Err(GatewayError::InvalidPhoneNumber(number.clone()));
            }
        }

        let request = SendMessageRequest {
            from: &message.from,
            to: &message.to,
            text: &message.text,
            media_urls: message.media_urls.as_deref(),
            messaging_profile_id: self.messaging_profile_id.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await?;

        let sent: DataEnvelope<SentMessage> = self
            .handle_response(response, "Failed to send message")
            .await?;

        debug!(message_id = %sent.data.id, "Message accepted by gateway");
        Ok(sent.data)
    }

    /// Send a plain text message.
    pub async fn send(
        &self,
        from: &str,
        to: &str,
        text: &str,
    ) -> Result<SentMessage, GatewayError> {
        self.send_message(&OutboundMessage::text(from, to, text)).await
    }

    /// Look up a previously sent message.
    #[instrument(skip(self))]
    pub async fn get_message_status(
        &self,
        message_id: &str,
    ) -> Result<MessageRecord, GatewayError> {
        let response = self
            .client
            .get(format!("{}/messages/{}", self.base_url, encode(message_id)))
            .bearer_auth(self.api_key.expose_secret())
            .header("Accept", "application/json")
            .send()
            .await?;

        let record: DataEnvelope<MessageRecord> = self
            .handle_response(response, "Failed to get message status")
            .await?;

        Ok(record.data)
    }

    /// Decode a success body or turn a failure into [`GatewayError::Api`].
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: Response,
        fallback: &str,
    ) -> Result<T, GatewayError> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|e| e.first_detail().map(String::from))
                .unwrap_or_else(|| fallback.to_string());

            warn!(status = %status, message = %message, "Gateway request failed");
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl std::fmt::Debug for TelnyxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelnyxClient")
            .field("base_url", &self.base_url)
            .field("messaging_profile_id", &self.messaging_profile_id)
            .finish_non_exhaustive()
    }
}
