//! Telnyx messaging API types.

use serde::{Deserialize, Serialize};

/// A message to send through the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Sender number in canonical E.164 form.
    pub from: String,
    /// Recipient number in canonical E.164 form.
    pub to: String,
    pub text: String,
    pub media_urls: Option<Vec<String>>,
}

impl OutboundMessage {
    /// Plain text message without media.
    pub fn text(from: impl Into<String>, to: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            text: text.into(),
            media_urls: None,
        }
    }

    /// Attach media URLs (MMS).
    pub fn with_media(mut self, media_urls: Vec<String>) -> Self {
        if !media_urls.is_empty() {
            self.media_urls = Some(media_urls);
        }
        self
    }
}

/// Body of `POST /messages`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_urls: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messaging_profile_id: Option<&'a str>,
}

/// Envelope used by every successful Telnyx response.
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// A message resource as returned by the send and lookup endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub to: Vec<Recipient>,
}

impl MessageRecord {
    /// Delivery status of the first recipient, if the provider reported one.
    pub fn status(&self) -> Option<&str> {
        self.to.first().and_then(|r| r.status.as_deref())
    }
}

/// Result of a successful send.
pub type SentMessage = MessageRecord;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub phone_number: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ErrorBody {
    /// First error detail, if any.
    pub fn first_detail(&self) -> Option<&str> {
        self.errors.first().and_then(|e| e.detail.as_deref())
    }
}
