//! Snowflake newtype wrappers for domain modeling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds between the Unix epoch and the first second of 2015,
/// the origin of Discord snowflake timestamps.
pub const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Returns the raw snowflake value.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake!(
    /// A Discord channel ID.
    ChannelId
);

snowflake!(
    /// A Discord user ID.
    UserId
);

snowflake!(
    /// A Discord message ID.
    MessageId
);

snowflake!(
    /// A Discord role ID.
    RoleId
);

impl MessageId {
    /// Creation instant encoded in the upper 42 bits of the snowflake.
    pub fn created_at(self) -> DateTime<Utc> {
        let millis = i64::try_from(self.0 >> 22).unwrap_or(i64::MAX - DISCORD_EPOCH_MS);
        DateTime::from_timestamp_millis(DISCORD_EPOCH_MS + millis).unwrap_or_default()
    }
}
