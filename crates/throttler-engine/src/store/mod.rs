//! Durable quota, channel, role and hint state.

mod sqlite;

pub use sqlite::SqliteQuotaStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use throttler_common::{ChannelId, Result, RoleId, UserId};

use crate::model::{ChannelSettings, RoleQuota, UserRecord};

/// Logical operations over the persisted state.
///
/// Every mutation is a single atomic statement per key so concurrent
/// handlers never lose updates. Missing rows are reported as `None`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Zero the usage if its last reset is before the current day boundary.
    /// Returns whether a reset happened.
    async fn try_rollover_if_due(&self, user: UserId, channel: ChannelId) -> Result<bool>;

    /// Usage after a rollover check; `None` when no row exists yet.
    async fn get_usage(&self, user: UserId, channel: ChannelId) -> Result<Option<i64>>;

    /// Create or overwrite the row with a zero count reset now.
    async fn reset_usage(&self, user: UserId, channel: ChannelId) -> Result<()>;

    /// Add `delta`, creating the row when missing. Returns the new count.
    async fn increase_usage(&self, user: UserId, channel: ChannelId, delta: u32) -> Result<i64>;

    /// Subtract `delta` unless the count would go negative.
    /// Returns the new count, or `None` when the guard rejected the change.
    async fn decrease_usage(&self, user: UserId, channel: ChannelId, delta: u32) -> Result<Option<i64>>;

    /// Stored settings for the channel.
    async fn channel_settings(&self, channel: ChannelId) -> Result<Option<ChannelSettings>>;

    /// Set the throttling switch, creating the row with defaults when missing.
    async fn set_channel_enabled(&self, channel: ChannelId, enabled: bool) -> Result<()>;

    /// Set the bot-suppression switch, creating the row with defaults when missing.
    async fn set_channel_suppress_bot(&self, channel: ChannelId, suppress_bot: bool) -> Result<()>;

    /// Hint bookkeeping for the user.
    async fn user_record(&self, user: UserId) -> Result<Option<UserRecord>>;

    /// Count one more hint and set the next eligible instant.
    async fn record_hint(&self, user: UserId, next_hint_at: DateTime<Utc>) -> Result<()>;

    /// All overrides for the channel, highest priority first.
    async fn role_quotas(&self, channel: ChannelId) -> Result<Vec<RoleQuota>>;

    /// Highest-priority override among `roles`, ties broken by lowest role ID.
    async fn top_role_quota(&self, channel: ChannelId, roles: &[RoleId]) -> Result<Option<RoleQuota>>;

    /// Insert or overwrite an override.
    async fn configure_role_quota(&self, quota: RoleQuota) -> Result<()>;
}
