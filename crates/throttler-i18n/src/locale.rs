//! Locale management and utilities

use crate::error::{I18nError, I18nResult};
use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

/// Supported locales
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    /// English (United States)
    #[serde(rename = "en-US")]
    English,
    /// Traditional Chinese (Taiwan)
    #[serde(rename = "zh-TW")]
    #[default]
    TraditionalChinese,
}

impl Locale {
    /// Get the language code for this locale
    pub const fn code(self) -> &'static str {
        match self {
            Self::English => "en-US",
            Self::TraditionalChinese => "zh-TW",
        }
    }

    /// Parse a locale from a language code.
    ///
    /// Accepts the tags Discord reports for interactions (`en-GB`, `zh-CN`, ...)
    /// and maps them onto the closest supported locale.
    pub fn from_code(code: &str) -> Option<Self> {
        let primary = code.split(['-', '_']).next().unwrap_or(code);
        match primary.to_ascii_lowercase().as_str() {
            "en" => Some(Self::English),
            "zh" => Some(Self::TraditionalChinese),
            _ => None,
        }
    }

    /// Convert to Fluent `LanguageIdentifier`
    pub fn to_language_identifier(self) -> I18nResult<LanguageIdentifier> {
        self.code()
            .parse()
            .map_err(|_| I18nError::InvalidLanguageId(self.code().to_string()))
    }

    /// Get all supported locales
    pub const fn all() -> [Self; 2] {
        [Self::English, Self::TraditionalChinese]
    }

    /// Embedded Fluent source for this locale
    pub(crate) const fn resource(self) -> &'static str {
        match self {
            Self::English => include_str!("../locales/en-US/throttler.ftl"),
            Self::TraditionalChinese => include_str!("../locales/zh-TW/throttler.ftl"),
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
