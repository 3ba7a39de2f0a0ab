//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use throttler_common::test_utils::mock_timestamp;
use throttler_common::{ChannelId, MessageId, Result, ThrottlerError, UserId};
use throttler_config::Config;
use throttler_engine::{
    Author, Clock, DeferredWorker, EngineSettings, IncomingMessage, MessagingTransport,
    RolloverSchedule, SqliteQuotaStore, SuppressionEngine,
};
use throttler_i18n::{Locale, Messages};

pub const CHANNEL: ChannelId = ChannelId(1_000);
pub const ALICE: UserId = UserId(2_001);
pub const BOB: UserId = UserId(2_002);
pub const OTHER_BOT: UserId = UserId(3_001);
pub const RELAY: UserId = UserId(1_290_664_871_993_806_932);

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Records every outbound call instead of talking to a platform.
#[derive(Debug, Default)]
pub struct FakeTransport {
    pub suppressed: Mutex<Vec<MessageId>>,
    pub reactions: Mutex<Vec<(MessageId, String)>>,
    pub sent: Mutex<Vec<(ChannelId, String)>>,
    pub fetchable: Mutex<HashMap<MessageId, IncomingMessage>>,
    pub fail_suppress: AtomicBool,
}

impl FakeTransport {
    /// Direct-message channel handed out for a user.
    pub fn dm_channel(user: UserId) -> ChannelId {
        ChannelId(900_000_000 + user.get())
    }

    pub fn suppressed(&self) -> Vec<MessageId> {
        self.suppressed.lock().clone()
    }

    pub fn reactions(&self) -> Vec<(MessageId, String)> {
        self.reactions.lock().clone()
    }

    pub fn sent(&self) -> Vec<(ChannelId, String)> {
        self.sent.lock().clone()
    }

    pub fn set_fetchable(&self, message: IncomingMessage) {
        self.fetchable.lock().insert(message.id, message);
    }

    pub fn fail_suppress(&self, fail: bool) {
        self.fail_suppress.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MessagingTransport for FakeTransport {
    async fn fetch_message(&self, _channel: ChannelId, message: MessageId) -> Result<IncomingMessage> {
        self.fetchable
            .lock()
            .get(&message)
            .cloned()
            .ok_or_else(|| ThrottlerError::transport(format!("unknown message {message}")))
    }

    async fn suppress_embeds(&self, _channel: ChannelId, message: MessageId) -> Result<()> {
        if self.fail_suppress.load(Ordering::SeqCst) {
            return Err(ThrottlerError::transport("missing permissions"));
        }
        self.suppressed.lock().push(message);
        Ok(())
    }

    async fn react(&self, _channel: ChannelId, message: MessageId, emoji: &str) -> Result<()> {
        self.reactions.lock().push((message, emoji.to_string()));
        Ok(())
    }

    async fn open_direct_channel(&self, user: UserId) -> Result<ChannelId> {
        Ok(Self::dm_channel(user))
    }

    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<()> {
        self.sent.lock().push((channel, content.to_string()));
        Ok(())
    }
}

pub struct Harness {
    pub engine: Arc<SuppressionEngine>,
    pub worker: DeferredWorker,
    pub store: Arc<SqliteQuotaStore>,
    pub transport: Arc<FakeTransport>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    /// Message from `author` posted just now in [`CHANNEL`].
    pub fn message(&self, id: u64, author: UserId, embeds: usize) -> IncomingMessage {
        IncomingMessage {
            id: MessageId(id),
            channel_id: CHANNEL,
            author: Author {
                id: author,
                bot: author == OTHER_BOT || author == RELAY,
            },
            member_roles: Vec::new(),
            content: if embeds > 0 {
                "look https://example.com".to_string()
            } else {
                "hello".to_string()
            },
            embed_count: embeds,
            embeds_suppressed: false,
            created_at: self.clock.now(),
            referenced: None,
        }
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.discord.token = "test-token".to_string();
    config.discord.relay_bot_id = Some(RELAY);
    config
}

/// Engine over an in-memory store with throttling enabled in [`CHANNEL`].
pub async fn harness() -> Harness {
    harness_with(|_| {}).await
}

pub async fn harness_with(adjust: impl FnOnce(&mut Config)) -> Harness {
    throttler_common::test_utils::init_test_logging();

    let mut config = test_config();
    adjust(&mut config);

    // 12:00 UTC is 20:00 at the default UTC+8 reset offset.
    let clock = Arc::new(ManualClock::new(mock_timestamp(2024, 3, 1, 12, 0, 0)));
    let schedule = RolloverSchedule::from_offset_hours(config.quota.reset_utc_offset_hours).unwrap();
    let store = Arc::new(
        SqliteQuotaStore::in_memory(schedule, clock.clone())
            .await
            .unwrap(),
    );
    throttler_engine::QuotaStore::set_channel_enabled(store.as_ref(), CHANNEL, true)
        .await
        .unwrap();

    let transport = Arc::new(FakeTransport::default());
    let messages = Arc::new(Messages::new(Locale::TraditionalChinese).unwrap());
    let (engine, worker) = SuppressionEngine::new(
        EngineSettings::from_config(&config),
        store.clone(),
        transport.clone(),
        messages,
        clock.clone(),
    );

    Harness {
        engine,
        worker,
        store,
        transport,
        clock,
    }
}
