//! Suppression engine
//!
//! Decides, per message, whether its embeds count against the author's
//! daily quota or get suppressed, and carries out the resulting side
//! effects. Also serves the manual recovery path and the quota queries
//! behind the command surface.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use throttler_common::{ChannelId, MessageId, Result, RoleId, UserId};
use throttler_config::Config;
use throttler_i18n::{FluentArgs, Locale, Messages};
use tracing::{debug, info, instrument, warn};

use crate::clock::Clock;
use crate::content::{leading_user_mention, looks_like_link};
use crate::dedup::DedupCache;
use crate::deferred::{DeferredQueue, DeferredWorker, DelayPolicy};
use crate::error::RecoveryError;
use crate::model::{IncomingMessage, QuotaStatus, RoleQuota};
use crate::resolver::QuotaResolver;
use crate::store::QuotaStore;
use crate::transport::MessagingTransport;

/// Tunables of the engine, taken from [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Ceiling when no role override applies.
    pub default_quota: i64,
    /// Whether channels without stored settings are throttled.
    pub default_enabled: bool,
    /// Bot whose posts are attributed to the user they mention first.
    pub relay_bot_id: Option<UserId>,
    /// Reaction added when the quota was already used up.
    pub exhausted_reaction: String,
    /// Maximum message age for manual recovery.
    pub recovery_window: Duration,
    /// Messages remembered by the dedup cache.
    pub dedup_capacity: u64,
    /// Bound of the deferred queue.
    pub queue_capacity: usize,
    /// Preview wait for deferred messages.
    pub delay: DelayPolicy,
    /// First hint cooldown in hours.
    pub hint_base_hours: u32,
    /// Cap on cooldown doublings.
    pub hint_max_exponent: u32,
    /// Language of hint DMs.
    pub hint_locale: Locale,
}

impl EngineSettings {
    /// Extract the engine tunables.
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_quota: config.quota.default_quota,
            default_enabled: config.quota.default_enabled,
            relay_bot_id: config.discord.relay_bot_id,
            exhausted_reaction: config.quota.exhausted_reaction.clone(),
            recovery_window: config.quota.recovery_window(),
            dedup_capacity: config.quota.dedup_capacity,
            queue_capacity: config.deferred.queue_capacity,
            delay: DelayPolicy::from(&config.deferred),
            hint_base_hours: config.hint.base_hours,
            hint_max_exponent: config.hint.max_exponent,
            hint_locale: Locale::from_code(&config.language).unwrap_or_default(),
        }
    }
}

/// What happened to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// Throttling is off in the channel.
    ChannelDisabled,
    /// No embeds and nothing that could become one.
    NoLinks,
    /// Parked until the platform attaches previews.
    Deferred,
    /// Re-fetched after the delay and still without embeds.
    NoEmbedsAfterDelay,
    /// Relay post without a leading user mention.
    Unattributed,
    /// Already handled recently.
    Duplicate,
    /// The store could not be read or written; nothing was done.
    StoreUnavailable,
    /// Transport failure or handler fault; the message was dropped.
    Failed,
    /// Embeds stay visible and were added to the usage.
    Counted { usage: i64, ceiling: i64 },
    /// Embeds exceeded the quota.
    Suppressed {
        usage: i64,
        ceiling: i64,
        /// The quota was already used up before this message.
        exhausted: bool,
        action: SuppressAction,
    },
}

/// Outcome of the suppress step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressAction {
    AlreadySuppressed,
    /// Bot author in a channel that leaves bot embeds alone.
    BotExempt,
    EditFailed,
    Applied { hinted: bool },
}

/// Input of the manual recovery command.
#[derive(Debug, Clone)]
pub struct RecoveryRequest {
    /// User who ran the command.
    pub invoker: UserId,
    /// Roles of the invoker, for the reported ceiling.
    pub invoker_roles: Vec<RoleId>,
    /// Target message as delivered with the interaction.
    pub message: IncomingMessage,
}

/// The user whose quota a message is charged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Attribution {
    author: UserId,
    human: bool,
    /// ID remembered by the dedup cache.
    target: MessageId,
}

/// Longest cooldown a hint can impose, in hours (about a century).
const MAX_HINT_COOLDOWN_HOURS: i64 = 100 * 366 * 24;

/// Cooldown after the `hinted`-th hint: `base × 2^min(hinted, max_exponent)` hours,
/// saturating at roughly a century.
pub fn hint_cooldown(hinted: u32, base_hours: u32, max_exponent: u32) -> chrono::Duration {
    let exponent = hinted.min(max_exponent).min(32);
    let hours = i64::from(base_hours)
        .checked_mul(1_i64 << exponent)
        .map_or(MAX_HINT_COOLDOWN_HOURS, |hours| hours.min(MAX_HINT_COOLDOWN_HOURS));
    chrono::Duration::hours(hours)
}

/// The decision core.
pub struct SuppressionEngine {
    settings: EngineSettings,
    store: Arc<dyn QuotaStore>,
    transport: Arc<dyn MessagingTransport>,
    resolver: QuotaResolver,
    dedup: DedupCache,
    deferred: DeferredQueue,
    messages: Arc<Messages>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SuppressionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuppressionEngine")
            .field("settings", &self.settings)
            .field("dedup", &self.dedup)
            .field("deferred", &self.deferred)
            .finish_non_exhaustive()
    }
}

impl SuppressionEngine {
    /// Build the engine and the worker that drains its deferred queue.
    ///
    /// The worker must be spawned with [`DeferredWorker::run`].
    pub fn new(
        settings: EngineSettings,
        store: Arc<dyn QuotaStore>,
        transport: Arc<dyn MessagingTransport>,
        messages: Arc<Messages>,
        clock: Arc<dyn Clock>,
    ) -> (Arc<Self>, DeferredWorker) {
        let (deferred, worker) = DeferredQueue::channel(settings.queue_capacity);
        let engine = Self {
            resolver: QuotaResolver::new(Arc::clone(&store), settings.default_quota),
            dedup: DedupCache::new(settings.dedup_capacity),
            settings,
            store,
            transport,
            deferred,
            messages,
            clock,
        };
        (Arc::new(engine), worker)
    }

    /// Active tunables.
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Localized strings shared with the command surface.
    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    /// Candidates waiting in the deferred queue.
    pub fn pending_deferred(&self) -> usize {
        self.deferred.pending()
    }

    /// Entry point for every newly created guild message.
    #[instrument(skip_all, fields(message = %message.id, channel = %message.channel_id))]
    pub async fn handle_message(&self, message: IncomingMessage) -> Evaluation {
        match self.channel_enabled(message.channel_id).await {
            Ok(true) => {}
            Ok(false) => return Evaluation::ChannelDisabled,
            Err(e) => {
                warn!(error = %e, "failed to read channel settings");
                return Evaluation::StoreUnavailable;
            }
        }

        if message.embed_count == 0 {
            if !looks_like_link(&message.content) {
                return Evaluation::NoLinks;
            }
            return match self.deferred.enqueue(message).await {
                Ok(()) => Evaluation::Deferred,
                Err(e) => {
                    warn!(error = %e, "failed to defer message");
                    Evaluation::Failed
                }
            };
        }

        self.evaluate(message).await
    }

    /// Wait out the preview delay, re-fetch and evaluate a deferred candidate.
    pub async fn process_deferred(&self, mut candidate: IncomingMessage) -> Evaluation {
        let wait = self
            .settings
            .delay
            .remaining(&candidate.content, candidate.created_at, self.clock.now());
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        match self.transport.fetch_message(candidate.channel_id, candidate.id).await {
            Err(e) => {
                warn!(message = %candidate.id, channel = %candidate.channel_id, error = %e, "failed to re-fetch deferred message");
                Evaluation::Failed
            }
            Ok(fetched) if fetched.embed_count == 0 => {
                debug!(message = %candidate.id, "deferred message still has no embeds");
                Evaluation::NoEmbedsAfterDelay
            }
            Ok(fetched) => {
                candidate.refresh_from(&fetched);
                self.evaluate(candidate).await
            }
        }
    }

    /// Charge or suppress a message that carries its final embeds.
    #[instrument(skip_all, fields(message = %message.id, channel = %message.channel_id))]
    pub async fn evaluate(&self, message: IncomingMessage) -> Evaluation {
        let Some(attribution) = self.attribute(&message) else {
            debug!("relay message without a leading user mention");
            return Evaluation::Unattributed;
        };
        let channel = message.channel_id;
        let author = attribution.author;

        if let Err(e) = self.store.try_rollover_if_due(author, channel).await {
            warn!(user = %author, error = %e, "rollover check failed");
        }

        let usage = match self.store.get_usage(author, channel).await {
            Ok(Some(usage)) => usage,
            Ok(None) => {
                if let Err(e) = self.store.reset_usage(author, channel).await {
                    warn!(user = %author, error = %e, "failed to create usage row");
                }
                0
            }
            Err(e) => {
                warn!(user = %author, error = %e, "failed to read usage");
                return Evaluation::StoreUnavailable;
            }
        };

        let ceiling = self.resolver.resolve(channel, &message.member_roles).await;

        if self.dedup.has(attribution.target) {
            debug!(dedup_id = %attribution.target, "message handled recently");
            return Evaluation::Duplicate;
        }
        self.dedup.mark(attribution.target, message.embed_count).await;

        let embeds = i64::try_from(message.embed_count).unwrap_or(i64::MAX);
        if usage.saturating_add(embeds) <= ceiling {
            let delta = u32::try_from(message.embed_count).unwrap_or(u32::MAX);
            return match self.store.increase_usage(author, channel, delta).await {
                Ok(usage) => {
                    debug!(user = %author, usage, ceiling, "embeds counted");
                    Evaluation::Counted { usage, ceiling }
                }
                Err(e) => {
                    warn!(user = %author, error = %e, "failed to increase usage");
                    Evaluation::StoreUnavailable
                }
            };
        }

        let exhausted = usage >= ceiling;
        if exhausted {
            if let Err(e) = self
                .transport
                .react(channel, message.id, &self.settings.exhausted_reaction)
                .await
            {
                warn!(error = %e, "failed to react to message");
            }
        }

        let action = self.suppress(&message, attribution).await;
        Evaluation::Suppressed {
            usage,
            ceiling,
            exhausted,
            action,
        }
    }

    fn attribute(&self, message: &IncomingMessage) -> Option<Attribution> {
        let from_relay = self.settings.relay_bot_id == Some(message.author.id);
        if from_relay && message.content.starts_with("<@") {
            let author = leading_user_mention(&message.content)?;
            let target = message.referenced.map_or(message.id, |r| r.id);
            debug!(relay = %message.id, replied = %target, user = %author, "relay message attributed");
            return Some(Attribution {
                author,
                human: true,
                target,
            });
        }
        Some(Attribution {
            author: message.author.id,
            human: !message.author.bot,
            target: message.id,
        })
    }

    async fn suppress(&self, message: &IncomingMessage, attribution: Attribution) -> SuppressAction {
        if message.embeds_suppressed {
            return SuppressAction::AlreadySuppressed;
        }

        let channel = message.channel_id;
        let from_relay = self.settings.relay_bot_id == Some(message.author.id);
        if message.author.bot && !from_relay {
            match self.store.channel_settings(channel).await {
                Ok(settings) if settings.is_some_and(|s| s.suppress_bot) => {}
                Ok(_) => return SuppressAction::BotExempt,
                Err(e) => {
                    warn!(error = %e, "failed to read suppress_bot setting");
                    return SuppressAction::BotExempt;
                }
            }
        }

        if let Err(e) = self.transport.suppress_embeds(channel, message.id).await {
            warn!(message = %message.id, %channel, error = %e, "failed to suppress embeds");
            return SuppressAction::EditFailed;
        }
        info!(message = %message.id, %channel, user = %attribution.author, "suppressed embeds");

        let hinted = attribution.human && self.send_hint(attribution.author, channel).await;
        SuppressAction::Applied { hinted }
    }

    /// DM the user about the quota unless they are still cooling down.
    async fn send_hint(&self, user: UserId, channel: ChannelId) -> bool {
        let record = match self.store.user_record(user).await {
            Ok(record) => record,
            Err(e) => {
                warn!(%user, error = %e, "failed to read hint record");
                return false;
            }
        };

        let now = self.clock.now();
        if record.is_some_and(|r| now < r.next_hint_at) {
            return false;
        }

        let hinted = record.map_or(0, |r| r.hinted);
        let cooldown = hint_cooldown(hinted, self.settings.hint_base_hours, self.settings.hint_max_exponent);

        let mut args = FluentArgs::new();
        args.set("channel", channel.to_string());
        args.set("hours", cooldown.num_hours());
        let text = self
            .messages
            .get_with_args(self.settings.hint_locale, "hint-dm", &args);

        match self.transport.open_direct_channel(user).await {
            Ok(dm) => {
                if let Err(e) = self.transport.send_message(dm, &text).await {
                    warn!(%user, error = %e, "failed to send hint");
                }
            }
            Err(e) => warn!(%user, error = %e, "failed to open direct channel"),
        }

        let next_hint_at = now
            .checked_add_signed(cooldown)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        if let Err(e) = self.store.record_hint(user, next_hint_at).await {
            warn!(%user, error = %e, "failed to record hint");
        }
        debug!(%user, hours = cooldown.num_hours(), "hint sent");
        true
    }

    /// Let an author hide their own message's embeds and get the quota back.
    #[instrument(skip_all, fields(message = %request.message.id, invoker = %request.invoker))]
    pub async fn recover(&self, request: RecoveryRequest) -> std::result::Result<QuotaStatus, RecoveryError> {
        let RecoveryRequest {
            invoker,
            invoker_roles,
            message,
        } = request;
        let channel = message.channel_id;

        let relayed_for_invoker = self.settings.relay_bot_id == Some(message.author.id)
            && leading_user_mention(&message.content) == Some(invoker);
        if message.author.id != invoker && !relayed_for_invoker {
            return Err(RecoveryError::NotAuthor);
        }
        if message.embeds_suppressed {
            return Err(RecoveryError::AlreadySuppressed);
        }

        let window = self.settings.recovery_window;
        let elapsed = (self.clock.now() - message.created_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        if elapsed > window {
            return Err(RecoveryError::WindowExpired {
                window_seconds: window.as_secs(),
            });
        }

        self.transport.suppress_embeds(channel, message.id).await?;

        let target = self.attribute(&message).map_or(message.id, |a| a.target);
        self.dedup.mark(target, message.embed_count).await;

        let delta = u32::try_from(message.embed_count).unwrap_or(u32::MAX);
        match self.store.decrease_usage(invoker, channel, delta).await {
            Ok(Some(usage)) => debug!(usage, "usage recovered"),
            Ok(None) => debug!("usage below recovered amount, left unchanged"),
            Err(e) => warn!(error = %e, "failed to decrease usage"),
        }

        Ok(self.quota_status(invoker, channel, &invoker_roles).await?)
    }

    /// Usage and ceiling of a member, creating the usage row when missing.
    pub async fn quota_status(&self, user: UserId, channel: ChannelId, roles: &[RoleId]) -> Result<QuotaStatus> {
        let usage = match self.store.get_usage(user, channel).await? {
            Some(usage) => usage,
            None => {
                self.store.reset_usage(user, channel).await?;
                0
            }
        };
        let ceiling = self.resolver.resolve(channel, roles).await;
        Ok(QuotaStatus { usage, ceiling })
    }

    /// Whether throttling applies in the channel.
    pub async fn channel_enabled(&self, channel: ChannelId) -> Result<bool> {
        Ok(self
            .store
            .channel_settings(channel)
            .await?
            .map_or(self.settings.default_enabled, |s| s.enabled))
    }

    /// Flip throttling for the channel. Returns the new state.
    pub async fn toggle_channel(&self, channel: ChannelId) -> Result<bool> {
        let enabled = !self.channel_enabled(channel).await?;
        self.store.set_channel_enabled(channel, enabled).await?;
        info!(%channel, enabled, "channel throttling toggled");
        Ok(enabled)
    }

    /// Flip bot-message suppression for the channel. Returns the new state.
    pub async fn toggle_suppress_bot(&self, channel: ChannelId) -> Result<bool> {
        let current = self
            .store
            .channel_settings(channel)
            .await?
            .is_some_and(|s| s.suppress_bot);
        self.store.set_channel_suppress_bot(channel, !current).await?;
        info!(%channel, suppress_bot = !current, "bot suppression toggled");
        Ok(!current)
    }

    /// Zero a user's usage in the channel.
    pub async fn reset_quota(&self, user: UserId, channel: ChannelId) -> Result<()> {
        self.store.reset_usage(user, channel).await?;
        info!(%user, %channel, "usage reset");
        Ok(())
    }

    /// Insert or overwrite a role override.
    pub async fn set_role_quota(&self, quota: RoleQuota) -> Result<()> {
        self.store.configure_role_quota(quota).await?;
        info!(role = %quota.role_id, channel = %quota.channel_id, quota = quota.quota, priority = quota.priority, "role quota configured");
        Ok(())
    }

    /// Overrides configured for the channel, highest priority first.
    pub async fn role_quotas(&self, channel: ChannelId) -> Result<Vec<RoleQuota>> {
        self.store.role_quotas(channel).await
    }
}
