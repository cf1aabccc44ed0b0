//! Outbound messaging provider abstraction.

pub mod twilio;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ProviderError;

pub use twilio::TwilioClient;

/// A single outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub from: String,
    pub to: String,
    pub body: String,
}

/// What the provider returned for an accepted message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageReceipt {
    #[serde(default)]
    pub sid: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Sends messages through a third-party provider. One call is one attempt.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Send a message.
    async fn send(&self, message: &OutboundMessage) -> Result<MessageReceipt, ProviderError>;
}
