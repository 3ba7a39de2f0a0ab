//! [`MessagingTransport`] over the Discord REST API.

use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use throttler_commands::incoming_message;
use throttler_common::{ChannelId, MessageId, Result, ThrottlerError, UserId};
use throttler_engine::{IncomingMessage, MessagingTransport};

/// Serenity HTTP client adapter.
#[derive(Clone)]
pub struct SerenityTransport {
    http: Arc<serenity::Http>,
}

impl std::fmt::Debug for SerenityTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerenityTransport").finish_non_exhaustive()
    }
}

impl SerenityTransport {
    /// Wrap the client's HTTP handle.
    pub const fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

fn channel(id: ChannelId) -> serenity::ChannelId {
    serenity::ChannelId::new(id.get())
}

fn message(id: MessageId) -> serenity::MessageId {
    serenity::MessageId::new(id.get())
}

#[async_trait]
impl MessagingTransport for SerenityTransport {
    async fn fetch_message(&self, channel_id: ChannelId, message_id: MessageId) -> Result<IncomingMessage> {
        let fetched = channel(channel_id)
            .message(&self.http, message(message_id))
            .await
            .map_err(|e| ThrottlerError::transport_with_source(format!("failed to fetch message {message_id}"), e))?;
        Ok(incoming_message(&fetched))
    }

    async fn suppress_embeds(&self, channel_id: ChannelId, message_id: MessageId) -> Result<()> {
        channel(channel_id)
            .edit_message(
                &self.http,
                message(message_id),
                serenity::EditMessage::new().suppress_embeds(true),
            )
            .await
            .map_err(|e| ThrottlerError::transport_with_source(format!("failed to suppress embeds on {message_id}"), e))?;
        Ok(())
    }

    async fn react(&self, channel_id: ChannelId, message_id: MessageId, emoji: &str) -> Result<()> {
        channel(channel_id)
            .create_reaction(
                &self.http,
                message(message_id),
                serenity::ReactionType::Unicode(emoji.to_string()),
            )
            .await
            .map_err(|e| ThrottlerError::transport_with_source(format!("failed to react to {message_id}"), e))
    }

    async fn open_direct_channel(&self, user: UserId) -> Result<ChannelId> {
        let private = serenity::UserId::new(user.get())
            .create_dm_channel(&self.http)
            .await
            .map_err(|e| ThrottlerError::transport_with_source(format!("failed to open DM with {user}"), e))?;
        Ok(ChannelId(private.id.get()))
    }

    async fn send_message(&self, channel_id: ChannelId, content: &str) -> Result<()> {
        channel(channel_id)
            .say(&self.http, content)
            .await
            .map_err(|e| ThrottlerError::transport_with_source(format!("failed to send message to {channel_id}"), e))?;
        Ok(())
    }
}
