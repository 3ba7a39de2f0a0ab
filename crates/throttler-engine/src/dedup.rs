//! Bounded memory of recently handled message IDs.
//!
//! `has` followed by `mark` is not atomic: two handlers racing on the same
//! message can both observe `false`. The cache only absorbs redundant
//! gateway deliveries and the deferred second look at a message.

use moka::future::Cache;
use moka::policy::EvictionPolicy;
use throttler_common::MessageId;
use tracing::trace;

/// Recently handled message IDs with their embed counts.
#[derive(Clone)]
pub struct DedupCache {
    cache: Cache<MessageId, usize>,
}

impl std::fmt::Debug for DedupCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl DedupCache {
    /// Cache holding at most `capacity` IDs, evicting the least recently used.
    pub fn new(capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self { cache }
    }

    /// Whether the message was handled recently.
    pub fn has(&self, id: MessageId) -> bool {
        self.cache.contains_key(&id)
    }

    /// Remember the message as handled.
    pub async fn mark(&self, id: MessageId, embed_count: usize) {
        trace!(message = %id, embed_count, "marking message as handled");
        self.cache.insert(id, embed_count).await;
    }

    /// Approximate number of remembered IDs.
    pub async fn len(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    /// Whether nothing is remembered.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
