//! Inbound webhook event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event type carrying an inbound SMS/MMS.
pub const MESSAGE_RECEIVED: &str = "message.received";

/// Webhook envelope as delivered by Telnyx.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub data: EventData,
}

/// Only `event_type` is read up front. The remaining fields are left
/// unparsed until the event type is known, so ignored events with other
/// shapes never fail.
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub event_type: String,
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub occurred_at: serde_json::Value,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Payload of a `message.received` event.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagePayload {
    pub from: Endpoint,
    pub to: EndpointList,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub media_urls: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Endpoint {
    pub phone_number: String,
}

/// Telnyx sends `to` as a list of recipients; older payloads used a single
/// object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EndpointList {
    One(Endpoint),
    Many(Vec<Endpoint>),
}

impl EndpointList {
    fn first_number(&self) -> Option<&str> {
        match self {
            EndpointList::One(e) => Some(&e.phone_number),
            EndpointList::Many(list) => list.first().map(|e| e.phone_number.as_str()),
        }
    }
}

/// Normalized internal record of a received message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: String,
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media_urls: Vec<String>,
    pub occurred_at: DateTime<Utc>,
}

impl WebhookEvent {
    pub fn is_message_received(&self) -> bool {
        self.data.event_type == MESSAGE_RECEIVED
    }

    /// Build the internal message record for a `message.received` event.
    ///
    /// Returns `Ok(None)` for every other event type.
    pub fn inbound_message(&self) -> Result<Option<InboundMessage>, serde_json::Error> {
        if !self.is_message_received() {
            return Ok(None);
        }

        let id = String::deserialize(&self.data.id)?;
        let occurred_at = DateTime::<Utc>::deserialize(&self.data.occurred_at)?;
        let payload = MessagePayload::deserialize(&self.data.payload)?;
        let to = payload
            .to
            .first_number()
            .ok_or_else(|| {
                <serde_json::Error as serde::de::Error>::custom("message has no recipient")
            })?
            .to_string();

        Ok(Some(InboundMessage {
            id,
            from: payload.from.phone_number,
            to,
            text: payload.text,
            media_urls: payload.media_urls,
            occurred_at,
        }))
    }
}
