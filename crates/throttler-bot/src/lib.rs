//! # Throttler Bot
//!
//! Discord bot that throttles link-preview embeds with a per-user, per-channel
//! daily quota.
//!
//! This is the main binary crate that orchestrates the application lifecycle:
//! it opens the quota database, connects the Poise framework to the gateway,
//! feeds new messages to the suppression engine and shuts down cleanly on
//! signals.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod bot;
pub mod error;
pub mod handler;
pub mod transport;

pub use bot::*;
pub use error::*;
pub use transport::SerenityTransport;
