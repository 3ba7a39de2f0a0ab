//! Configuration schema definitions using serde.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use throttler_common::{LoggingConfig, UserId};

/// Main configuration structure for the embed throttler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Discord connection settings.
    pub discord: DiscordConfig,
    /// Quota and suppression behaviour.
    pub quota: QuotaConfig,
    /// Deferred-embed queue tuning.
    pub deferred: DeferredConfig,
    /// Direct-message hint backoff.
    pub hint: HintConfig,
    /// Backing store settings.
    pub database: DatabaseConfig,
    /// Logging output.
    pub logging: LoggingConfig,
    /// Fallback locale for hints and unknown interaction locales.
    pub language: String,
}

/// Discord bot configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Discord bot token.
    pub token: String,
    /// Register application commands globally when the bot becomes ready.
    pub update_commands: bool,
    /// User ID of a bridge bot that relays messages on behalf of real users.
    pub relay_bot_id: Option<UserId>,
}

/// Quota configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Ceiling used when no role override applies.
    pub default_quota: i64,
    /// Whether channels without settings are throttled.
    pub default_enabled: bool,
    /// UTC offset, in hours, of the civil day used for the daily reset.
    pub reset_utc_offset_hours: i32,
    /// How long after posting a user may manually suppress their own message.
    pub recovery_window_seconds: u64,
    /// Reaction attached to messages posted after the quota ran out.
    pub exhausted_reaction: String,
    /// Number of message IDs remembered for duplicate-event suppression.
    pub dedup_capacity: u64,
}

impl QuotaConfig {
    /// Recovery window as a [`Duration`].
    pub const fn recovery_window(&self) -> Duration {
        Duration::from_secs(self.recovery_window_seconds)
    }
}

/// Deferred-embed queue configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeferredConfig {
    /// Maximum number of pending candidates before producers wait.
    pub queue_capacity: usize,
    /// Delay contributed by each link-like substring.
    pub delay_per_link_ms: u64,
    /// Cap on the number of links that contribute to the delay.
    pub max_links: usize,
}

impl DeferredConfig {
    /// Per-link delay as a [`Duration`].
    pub const fn delay_per_link(&self) -> Duration {
        Duration::from_millis(self.delay_per_link_ms)
    }
}

/// Hint direct-message backoff configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HintConfig {
    /// Cooldown after the first hint.
    pub base_hours: u32,
    /// Highest power of two applied to the base cooldown.
    pub max_exponent: u32,
}

/// Database configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file.
    pub path: PathBuf,
    /// Connection pool size.
    pub max_connections: u32,
}
