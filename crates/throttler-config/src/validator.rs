//! Runtime validation of a loaded configuration.

use crate::loader::ConfigError;
use crate::schema::Config;

/// Largest civil-time offset in use anywhere (UTC+14 / UTC-12 fits inside).
const MAX_OFFSET_HOURS: i32 = 14;

/// Doublings allowed on top of the first hint cooldown.
const MAX_HINT_EXPONENT: u32 = 16;

/// One year.
const MAX_HINT_BASE_HOURS: u32 = 24 * 366;

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.to_string(),
        message: message.into(),
    }
}

impl Config {
    /// Check every field that has a constrained range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discord.token.trim().is_empty() {
            return Err(invalid("discord.token", "bot token is required"));
        }
        if self.quota.default_quota < 0 {
            return Err(invalid("quota.default_quota", "must not be negative"));
        }
        if self.quota.reset_utc_offset_hours.abs() > MAX_OFFSET_HOURS {
            return Err(invalid(
                "quota.reset_utc_offset_hours",
                format!("must be within ±{MAX_OFFSET_HOURS} hours"),
            ));
        }
        if self.quota.recovery_window_seconds == 0 {
            return Err(invalid("quota.recovery_window_seconds", "must be greater than zero"));
        }
        if self.quota.exhausted_reaction.is_empty() {
            return Err(invalid("quota.exhausted_reaction", "must not be empty"));
        }
        if self.quota.dedup_capacity == 0 {
            return Err(invalid("quota.dedup_capacity", "must be greater than zero"));
        }
        if self.hint.base_hours == 0 || self.hint.base_hours > MAX_HINT_BASE_HOURS {
            return Err(invalid(
                "hint.base_hours",
                format!("must be between 1 and {MAX_HINT_BASE_HOURS}"),
            ));
        }
        if self.hint.max_exponent > MAX_HINT_EXPONENT {
            return Err(invalid(
                "hint.max_exponent",
                format!("must be at most {MAX_HINT_EXPONENT}"),
            ));
        }
        if self.deferred.queue_capacity == 0 {
            return Err(invalid("deferred.queue_capacity", "must be greater than zero"));
        }
        if self.database.max_connections == 0 {
            return Err(invalid("database.max_connections", "must be greater than zero"));
        }
        if self.database.path.as_os_str().is_empty() {
            return Err(invalid("database.path", "must not be empty"));
        }
        if self.language.is_empty() {
            return Err(invalid("language", "must not be empty"));
        }
        Ok(())
    }
}
