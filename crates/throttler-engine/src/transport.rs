//! Outbound operations the engine performs against the chat platform.

use async_trait::async_trait;
use throttler_common::{ChannelId, MessageId, Result, UserId};

use crate::model::IncomingMessage;

/// Messaging operations used by the engine. All of them are fallible and
/// callers treat failures as non-fatal.
#[async_trait]
pub trait MessagingTransport: Send + Sync {
    /// Fetch the current state of a message.
    async fn fetch_message(&self, channel: ChannelId, message: MessageId) -> Result<IncomingMessage>;

    /// Set the suppress-embeds flag on a message.
    async fn suppress_embeds(&self, channel: ChannelId, message: MessageId) -> Result<()>;

    /// Add a unicode reaction to a message.
    async fn react(&self, channel: ChannelId, message: MessageId, emoji: &str) -> Result<()>;

    /// Open (or reuse) the direct-message channel with a user.
    async fn open_direct_channel(&self, user: UserId) -> Result<ChannelId>;

    /// Post a plain text message.
    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<()>;
}
