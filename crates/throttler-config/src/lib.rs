//! # Throttler Config
//!
//! Typed configuration for the embed throttler bot.
//!
//! Configuration is read once at startup from YAML, overlaid with
//! environment variables, validated, and then shared read-only.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validator;

pub use defaults::*;
pub use loader::*;
pub use schema::*;
