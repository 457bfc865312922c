//! Destinations for received messages.

use crate::webhook::InboundMessage;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    #[error("Sink rejected message: {0}")]
    Rejected(String),
}

/// Something that accepts normalized inbound messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    async fn deliver(&self, message: &InboundMessage) -> Result<(), SinkError>;
}

/// Bounded in-memory message log.
///
/// Holds the most recent messages only and is lost on restart.
#[derive(Clone)]
pub struct MessageLog {
    messages: Arc<RwLock<VecDeque<InboundMessage>>>,
    capacity: usize,
}

impl MessageLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: Arc::new(RwLock::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }

    /// Stored messages, oldest first.
    pub async fn messages(&self) -> Vec<InboundMessage> {
        self.messages.read().await.iter().cloned().collect()
    }

    pub async fn get(&self, id: &str) -> Option<InboundMessage> {
        self.messages
            .read()
            .await
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    pub async fn count(&self) -> usize {
        self.messages.read().await.len()
    }
}

#[async_trait]
impl MessageSink for MessageLog {
    fn name(&self) -> &'static str {
        "message_log"
    }

    async fn deliver(&self, message: &InboundMessage) -> Result<(), SinkError> {
        let mut messages = self.messages.write().await;

        // Provider retries redeliver the same event
        if messages.iter().any(|m| m.id == message.id) {
            debug!(message_id = %message.id, "Duplicate delivery ignored");
            return Ok(());
        }

        while messages.len() >= self.capacity {
            messages.pop_front();
        }
        messages.push_back(message.clone());

        debug!(message_id = %message.id, total = messages.len(), "Message stored");
        Ok(())
    }
}

/// Fans received messages out to live subscribers.
#[derive(Clone)]
pub struct Broadcaster {
    sender: broadcast::Sender<InboundMessage>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InboundMessage> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl MessageSink for Broadcaster {
    fn name(&self) -> &'static str {
        "broadcaster"
    }

    async fn deliver(&self, message: &InboundMessage) -> Result<(), SinkError> {
        match self.sender.send(message.clone()) {
            Ok(receivers) => debug!(message_id = %message.id, receivers, "Message broadcast"),
            // Nobody listening is fine
            Err(_) => debug!(message_id = %message.id, "No subscribers for message"),
        }
        Ok(())
    }
}
