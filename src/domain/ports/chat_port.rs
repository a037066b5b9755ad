//! Outbound chat operations port definition.

use async_trait::async_trait;

use crate::domain::entities::{ChannelId, MessageFlags, MessageId, User};
use crate::domain::errors::DeliveryError;

/// Reply posted underneath an existing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    /// Channel to post in.
    pub channel_id: ChannelId,
    /// Message being replied to.
    pub reply_to: MessageId,
    /// Reply body.
    pub content: String,
}

impl ReplyRequest {
    /// Creates reply request.
    #[must_use]
    pub fn new(channel_id: ChannelId, reply_to: MessageId, content: impl Into<String>) -> Self {
        Self {
            channel_id,
            reply_to,
            content: content.into(),
        }
    }
}

/// Port for the chat platform's REST surface.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatPort: Send + Sync {
    /// Returns the account the credentials belong to.
    async fn current_user(&self) -> Result<User, DeliveryError>;

    /// Hides link previews on a message, keeping its other flags.
    async fn suppress_embeds(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        current_flags: MessageFlags,
    ) -> Result<(), DeliveryError>;

    /// Posts a reply with every mention disabled.
    async fn send_reply(&self, request: ReplyRequest) -> Result<MessageId, DeliveryError>;
}
