//! Deferred-embed queue
//!
//! Messages that contain a link but no embeds yet are parked here. A single
//! worker drains the queue in arrival order, waits until the platform had a
//! chance to attach the preview, re-fetches the message and hands it back to
//! the engine.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use throttler_common::{Result, ThrottlerError};
use throttler_config::DeferredConfig;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::content::link_hint_count;
use crate::engine::{Evaluation, SuppressionEngine};
use crate::model::IncomingMessage;
use crate::supervise::supervise;

/// How long to wait for previews, proportional to the links in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPolicy {
    per_link: Duration,
    max_links: usize,
}

impl DelayPolicy {
    /// Policy granting `per_link` per link, counting at most `max_links`.
    pub const fn new(per_link: Duration, max_links: usize) -> Self {
        Self { per_link, max_links }
    }

    /// Total wait measured from message creation.
    pub fn delay_for(&self, content: &str) -> Duration {
        let links = link_hint_count(content).min(self.max_links);
        self.per_link
            .saturating_mul(u32::try_from(links).unwrap_or(u32::MAX))
    }

    /// Portion of the wait still ahead at `now`.
    pub fn remaining(&self, content: &str, created_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
        let total = self.delay_for(content);
        let elapsed = (now - created_at).to_std().unwrap_or(Duration::ZERO);
        total.saturating_sub(elapsed)
    }
}

impl From<&DeferredConfig> for DelayPolicy {
    fn from(config: &DeferredConfig) -> Self {
        Self::new(config.delay_per_link(), config.max_links)
    }
}

/// Producer side of the queue.
#[derive(Debug, Clone)]
pub struct DeferredQueue {
    tx: mpsc::Sender<IncomingMessage>,
    capacity: usize,
}

/// Consumer side of the queue; exactly one exists per queue.
#[derive(Debug)]
pub struct DeferredWorker {
    rx: mpsc::Receiver<IncomingMessage>,
}

impl DeferredQueue {
    /// Bounded queue holding at most `capacity` candidates.
    pub fn channel(capacity: usize) -> (Self, DeferredWorker) {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, capacity }, DeferredWorker { rx })
    }

    /// Park a candidate, waiting for space when the queue is full.
    pub async fn enqueue(&self, message: IncomingMessage) -> Result<()> {
        let id = message.id;
        self.tx
            .send(message)
            .await
            .map_err(|_| ThrottlerError::internal(format!("deferred queue closed, dropping message {id}")))?;
        debug!(message = %id, pending = self.pending(), "message deferred");
        Ok(())
    }

    /// Number of candidates waiting.
    pub fn pending(&self) -> usize {
        self.capacity - self.tx.capacity()
    }
}

impl DeferredWorker {
    /// Take the next candidate and run it through the engine.
    ///
    /// Returns `None` once every producer is gone.
    pub async fn process_next(&mut self, engine: &SuppressionEngine) -> Option<Evaluation> {
        let candidate = self.rx.recv().await?;
        let id = candidate.id;
        match supervise("deferred", engine.process_deferred(candidate)).await {
            Ok(evaluation) => Some(evaluation),
            Err(failure) => {
                warn!(message = %id, error = %failure, "deferred candidate dropped");
                Some(Evaluation::Failed)
            }
        }
    }

    /// Drain the queue until every producer is gone.
    pub async fn run(mut self, engine: Arc<SuppressionEngine>) {
        info!("Deferred embed worker started");
        while let Some(evaluation) = self.process_next(&engine).await {
            debug!(?evaluation, "deferred candidate processed");
        }
        info!("Deferred embed worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn policy() -> DelayPolicy {
        DelayPolicy::new(Duration::from_millis(125), 10)
    }

    #[test]
    fn test_delay_scales_with_links() {
        assert_eq!(policy().delay_for("no links"), Duration::ZERO);
        assert_eq!(policy().delay_for("http://a"), Duration::from_millis(125));
        assert_eq!(policy().delay_for("http://a http://b"), Duration::from_millis(250));
    }

    #[test]
    fn test_delay_is_capped() {
        let content = "http ".repeat(25);
        assert_eq!(policy().delay_for(&content), Duration::from_millis(1250));
    }

    #[test]
    fn test_remaining_subtracts_elapsed() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let now = created + chrono::Duration::milliseconds(100);
        let content = "http://a http://b";
        assert_eq!(policy().remaining(content, created, now), Duration::from_millis(150));

        let late = created + chrono::Duration::seconds(5);
        assert_eq!(policy().remaining(content, created, late), Duration::ZERO);
    }

    #[test]
    fn test_remaining_with_future_timestamp() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let created = now + chrono::Duration::seconds(1);
        assert_eq!(policy().remaining("http://a", created, now), Duration::from_millis(125));
    }

    #[tokio::test]
    async fn test_pending_tracks_queue_depth() {
        let (queue, _worker) = DeferredQueue::channel(4);
        assert_eq!(queue.pending(), 0);

        let message = IncomingMessage {
            id: throttler_common::MessageId(1),
            channel_id: throttler_common::ChannelId(2),
            author: crate::model::Author {
                id: throttler_common::UserId(3),
                bot: false,
            },
            member_roles: Vec::new(),
            content: "http://example.com".to_string(),
            embed_count: 0,
            embeds_suppressed: false,
            created_at: Utc::now(),
            referenced: None,
        };
        queue.enqueue(message.clone()).await.unwrap();
        queue.enqueue(message).await.unwrap();
        assert_eq!(queue.pending(), 2);
    }
}
