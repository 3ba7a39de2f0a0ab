//! # Throttler I18n
//!
//! Localized user-facing text for the embed throttler bot, built on the
//! Fluent localization system. Resources for every supported locale are
//! embedded at compile time.
//!
//! # Example
//!
//! ```rust
//! use throttler_i18n::{FluentArgs, Locale, Messages};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let messages = Messages::new(Locale::TraditionalChinese)?;
//!
//! let mut args = FluentArgs::new();
//! args.set("remaining", 1);
//! args.set("quota", 3);
//! let text = messages.get_with_args(Locale::English, "quota-remaining", &args);
//! assert!(text.ends_with("1/3"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod locale;
pub mod messages;

pub use error::{I18nError, I18nResult};
pub use locale::Locale;
pub use messages::Messages;

// Re-export commonly used Fluent types
pub use fluent_bundle::{FluentArgs, FluentValue};
