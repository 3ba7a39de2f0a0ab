//! # Throttler Engine
//!
//! Per-user, per-channel embed quota accounting for the embed throttler bot.
//!
//! The [`SuppressionEngine`] decides whether the embeds of a message count
//! against its author's daily quota or get suppressed. It talks to the chat
//! platform only through [`MessagingTransport`] and persists everything in a
//! [`QuotaStore`], so the whole decision path runs without a gateway.
//!
//! Messages that carry links but no previews yet are handed to a
//! [`DeferredWorker`] which re-fetches them after a short delay.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod clock;
pub mod content;
pub mod dedup;
pub mod deferred;
pub mod engine;
pub mod error;
pub mod model;
pub mod resolver;
pub mod store;
pub mod supervise;
pub mod transport;

pub use clock::{Clock, RolloverSchedule, SystemClock};
pub use dedup::DedupCache;
pub use deferred::{DeferredQueue, DeferredWorker, DelayPolicy};
pub use engine::{
    hint_cooldown, EngineSettings, Evaluation, RecoveryRequest, SuppressAction, SuppressionEngine,
};
pub use error::RecoveryError;
pub use model::{
    Author, ChannelSettings, IncomingMessage, QuotaStatus, ReferencedMessage, RoleQuota,
    UserRecord, UNSET_QUOTA,
};
pub use resolver::QuotaResolver;
pub use store::{QuotaStore, SqliteQuotaStore};
pub use supervise::{supervise, HandlerFailure};
pub use transport::MessagingTransport;
