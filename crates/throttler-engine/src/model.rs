//! Persisted records and the message view the engine evaluates.

use chrono::{DateTime, Utc};
use throttler_common::{ChannelId, MessageId, RoleId, UserId};

/// Quota value meaning "no override, use the configured default".
pub const UNSET_QUOTA: i64 = -1;

/// Per-channel switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSettings {
    pub channel_id: ChannelId,
    pub enabled: bool,
    pub suppress_bot: bool,
}

/// Hint bookkeeping for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: UserId,
    /// How many hints have been sent so far.
    pub hinted: u32,
    pub next_hint_at: DateTime<Utc>,
}

/// Quota override for members holding a role in a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleQuota {
    pub role_id: RoleId,
    pub channel_id: ChannelId,
    pub quota: i64,
    pub priority: i64,
}

/// Message author as seen on the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Author {
    pub id: UserId,
    pub bot: bool,
}

/// The message a relay post replies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferencedMessage {
    pub id: MessageId,
    pub author: Author,
}

/// Everything the engine needs to know about a posted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author: Author,
    /// Roles of the posting member; empty when unknown.
    pub member_roles: Vec<RoleId>,
    pub content: String,
    pub embed_count: usize,
    pub embeds_suppressed: bool,
    pub created_at: DateTime<Utc>,
    pub referenced: Option<ReferencedMessage>,
}

impl IncomingMessage {
    /// Copy the embed state of a freshly fetched copy of this message.
    ///
    /// Author and member roles are kept from the gateway event since
    /// message fetches do not carry member data.
    pub fn refresh_from(&mut self, fetched: &Self) {
        self.content.clone_from(&fetched.content);
        self.embed_count = fetched.embed_count;
        self.embeds_suppressed = fetched.embeds_suppressed;
        if fetched.referenced.is_some() {
            self.referenced = fetched.referenced;
        }
    }
}

/// Usage against ceiling for one user in one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaStatus {
    pub usage: i64,
    pub ceiling: i64,
}

impl QuotaStatus {
    /// Embeds the user may still post today.
    pub fn remaining(&self) -> i64 {
        (self.ceiling - self.usage).max(0)
    }
}
