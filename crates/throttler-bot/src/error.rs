//! Application-wide error types using thiserror.

use poise::serenity_prelude as serenity;
use throttler_common::ThrottlerError;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum BotError {
    /// Configuration, database or localization setup error.
    #[error("Startup error: {0}")]
    Startup(#[from] ThrottlerError),

    /// Discord/Serenity error.
    #[error("Discord error: {0}")]
    Discord(#[from] serenity::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<throttler_config::ConfigError> for BotError {
    fn from(error: throttler_config::ConfigError) -> Self {
        Self::Startup(error.into())
    }
}

impl From<throttler_i18n::I18nError> for BotError {
    fn from(error: throttler_i18n::I18nError) -> Self {
        Self::Startup(error.into())
    }
}

/// Result type for the bot application.
pub type BotResult<T> = Result<T, BotError>;
