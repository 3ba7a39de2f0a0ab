//! # Throttler Commands
//!
//! Discord command implementations using Poise framework for the embed
//! throttler bot.
//!
//! The message context action lets authors recover quota from their own
//! messages; the slash commands manage channel switches and role quotas.
//! Every response is ephemeral and localized from the interaction locale.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod channel;
pub mod convert;
pub mod framework;
pub mod quota;
pub mod reply;
pub mod roles;
pub mod suppress;

pub use convert::incoming_message;
pub use framework::*;
