//! Effective quota ceiling from role overrides.

use std::sync::Arc;
use throttler_common::{ChannelId, RoleId};
use tracing::warn;

use crate::store::QuotaStore;

/// Resolves a member's ceiling from the highest-priority matching override.
#[derive(Clone)]
pub struct QuotaResolver {
    store: Arc<dyn QuotaStore>,
    default_quota: i64,
}

impl std::fmt::Debug for QuotaResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaResolver")
            .field("default_quota", &self.default_quota)
            .finish_non_exhaustive()
    }
}

impl QuotaResolver {
    /// Resolver falling back to `default_quota` (clamped at zero).
    pub fn new(store: Arc<dyn QuotaStore>, default_quota: i64) -> Self {
        Self {
            store,
            default_quota: default_quota.max(0),
        }
    }

    /// The fallback ceiling.
    pub const fn default_quota(&self) -> i64 {
        self.default_quota
    }

    /// Ceiling for a member holding `roles` in `channel`. Never negative.
    ///
    /// Store failures fall back to the default.
    pub async fn resolve(&self, channel: ChannelId, roles: &[RoleId]) -> i64 {
        match self.store.top_role_quota(channel, roles).await {
            Ok(Some(row)) if row.quota >= 0 => row.quota,
            Ok(_) => self.default_quota,
            Err(e) => {
                warn!(%channel, error = %e, "role quota lookup failed, using default");
                self.default_quota
            }
        }
    }
}
