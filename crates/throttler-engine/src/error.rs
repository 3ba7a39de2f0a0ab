//! Errors surfaced to users of the manual recovery command.

use thiserror::Error;
use throttler_common::ThrottlerError;

/// Why a manual recovery was refused or failed.
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// The invoker did not post the message.
    #[error("only the author of the message can recover its quota")]
    NotAuthor,

    /// The message's embeds are hidden already.
    #[error("embeds on the message are already suppressed")]
    AlreadySuppressed,

    /// The message is older than the recovery window.
    #[error("the message is older than the {window_seconds}s recovery window")]
    WindowExpired { window_seconds: u64 },

    /// Transport or store failure while recovering.
    #[error(transparent)]
    Failed(#[from] ThrottlerError),
}

impl RecoveryError {
    /// Whether the refusal is an expected precondition failure.
    pub const fn is_precondition(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}
