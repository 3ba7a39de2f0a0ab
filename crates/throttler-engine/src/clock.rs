//! Time source and the daily rollover boundary.

use chrono::{DateTime, FixedOffset, Utc};
use throttler_common::{Result, ThrottlerError};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Source of the current instant.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock of the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Civil-day boundary in a fixed UTC offset.
///
/// Reset timestamps are kept as milliseconds of offset-shifted wall time
/// so the boundary test is a plain integer comparison in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolloverSchedule {
    offset: FixedOffset,
}

impl RolloverSchedule {
    /// Schedule for a whole-hour UTC offset.
    pub fn from_offset_hours(hours: i32) -> Result<Self> {
        hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
            .ok_or_else(|| {
                ThrottlerError::validation(
                    format!("{hours} is not a valid UTC offset"),
                    "quota.reset_utc_offset_hours",
                )
            })
    }

    /// The configured offset.
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Milliseconds of wall time in the schedule's zone.
    pub fn wall_millis(&self, instant: DateTime<Utc>) -> i64 {
        instant.timestamp_millis() + i64::from(self.offset.local_minus_utc()) * 1000
    }

    /// Wall-time milliseconds of the most recent local midnight.
    pub fn boundary_millis(&self, instant: DateTime<Utc>) -> i64 {
        self.wall_millis(instant).div_euclid(MILLIS_PER_DAY) * MILLIS_PER_DAY
    }
}
