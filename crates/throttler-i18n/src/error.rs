//! Error types for internationalization operations

use thiserror::Error;
use throttler_common::ThrottlerError;

/// Errors that can occur during internationalization operations
#[derive(Error, Debug)]
pub enum I18nError {
    /// Failed to parse a language identifier
    #[error("Invalid language identifier: {0}")]
    InvalidLanguageId(String),

    /// Failed to parse or register a Fluent resource
    #[error("Failed to load Fluent resource for {locale}: {errors:?}")]
    FluentParse { locale: String, errors: Vec<String> },

    /// Message not found in the bundle
    #[error("Message not found: {key}")]
    MessageNotFound { key: String },

    /// Placeholders could not be resolved while formatting
    #[error("Failed to format message '{key}': {errors:?}")]
    MessageFormat { key: String, errors: Vec<String> },
}

/// Result type for i18n operations
pub type I18nResult<T> = Result<T, I18nError>;

impl From<I18nError> for ThrottlerError {
    fn from(err: I18nError) -> Self {
        let locale = match &err {
            I18nError::InvalidLanguageId(id) => Some(id.clone()),
            I18nError::FluentParse { locale, .. } => Some(locale.clone()),
            _ => None,
        };
        Self::localization(err.to_string(), locale)
    }
}
