//! Default values for every configuration section.

use crate::schema::*;
use std::path::PathBuf;
use throttler_common::LoggingConfig;

/// Default quota ceiling per user, channel and day.
pub const DEFAULT_QUOTA: i64 = 3;
/// Offset of the civil day used for the daily reset (UTC+8).
pub const DEFAULT_RESET_UTC_OFFSET_HOURS: i32 = 8;
/// Default manual-recovery window.
pub const DEFAULT_RECOVERY_WINDOW_SECONDS: u64 = 60;
/// Reaction glyph for exhausted quotas.
pub const DEFAULT_EXHAUSTED_REACTION: &str = "🈚";
/// Default fallback language.
pub const DEFAULT_LANGUAGE: &str = "zh-TW";

impl Default for Config {
    fn default() -> Self {
        Self {
            discord: DiscordConfig::default(),
            quota: QuotaConfig::default(),
            deferred: DeferredConfig::default(),
            hint: HintConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            update_commands: false,
            relay_bot_id: None,
        }
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            default_quota: DEFAULT_QUOTA,
            default_enabled: false,
            reset_utc_offset_hours: DEFAULT_RESET_UTC_OFFSET_HOURS,
            recovery_window_seconds: DEFAULT_RECOVERY_WINDOW_SECONDS,
            exhausted_reaction: DEFAULT_EXHAUSTED_REACTION.to_string(),
            dedup_capacity: 256,
        }
    }
}

impl Default for DeferredConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            delay_per_link_ms: 125,
            max_links: 10,
        }
    }
}

impl Default for HintConfig {
    fn default() -> Self {
        Self {
            base_hours: 24,
            max_exponent: 5,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("bot.db"),
            max_connections: 4,
        }
    }
}
