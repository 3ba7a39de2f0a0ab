//! # Throttler Common
//!
//! Shared identifiers, the workspace error type, and logging bootstrap for
//! the embed throttler bot.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::{Result, ThrottlerError};
pub use logging::{init_logging, LoggingConfig};
pub use types::*;
