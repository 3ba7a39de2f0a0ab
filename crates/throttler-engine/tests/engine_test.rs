//! Message handling, recovery and hint behavior of the suppression engine.

mod common;

use common::{harness, harness_with, FakeTransport, ALICE, BOB, CHANNEL, OTHER_BOT, RELAY};
use throttler_common::{MessageId, RoleId};
use throttler_engine::{
    supervise, Author, Clock, Evaluation, QuotaStore, RecoveryError, RecoveryRequest, ReferencedMessage,
    RoleQuota, SuppressAction,
};

#[tokio::test]
async fn test_embeds_within_quota_are_counted() {
    let h = harness().await;

    let evaluation = h.engine.handle_message(h.message(1, ALICE, 2)).await;

    assert_eq!(evaluation, Evaluation::Counted { usage: 2, ceiling: 3 });
    assert_eq!(h.store.get_usage(ALICE, CHANNEL).await.unwrap(), Some(2));
    assert!(h.transport.suppressed().is_empty());
}

#[tokio::test]
async fn test_over_quota_is_suppressed_without_charging() {
    let h = harness().await;
    h.engine.handle_message(h.message(1, ALICE, 2)).await;

    let evaluation = h.engine.handle_message(h.message(2, ALICE, 2)).await;

    assert_eq!(
        evaluation,
        Evaluation::Suppressed {
            usage: 2,
            ceiling: 3,
            exhausted: false,
            action: SuppressAction::Applied { hinted: true },
        }
    );
    assert_eq!(h.store.get_usage(ALICE, CHANNEL).await.unwrap(), Some(2));
    assert_eq!(h.transport.suppressed(), vec![MessageId(2)]);
    // Usage was below the ceiling, so no exhausted marker.
    assert!(h.transport.reactions().is_empty());
}

#[tokio::test]
async fn test_exhausted_quota_gets_reaction() {
    let h = harness().await;
    h.engine.handle_message(h.message(1, ALICE, 3)).await;

    let evaluation = h.engine.handle_message(h.message(2, ALICE, 1)).await;

    assert!(matches!(evaluation, Evaluation::Suppressed { exhausted: true, .. }));
    assert_eq!(h.transport.reactions(), vec![(MessageId(2), "🈚".to_string())]);
    assert_eq!(h.transport.suppressed(), vec![MessageId(2)]);
}

#[tokio::test]
async fn test_exact_fill_is_counted() {
    let h = harness().await;
    h.engine.handle_message(h.message(1, ALICE, 1)).await;

    let evaluation = h.engine.handle_message(h.message(2, ALICE, 2)).await;

    assert_eq!(evaluation, Evaluation::Counted { usage: 3, ceiling: 3 });
}

#[tokio::test]
async fn test_disabled_channel_is_ignored() {
    let h = harness().await;
    h.store.set_channel_enabled(CHANNEL, false).await.unwrap();

    let evaluation = h.engine.handle_message(h.message(1, ALICE, 5)).await;

    assert_eq!(evaluation, Evaluation::ChannelDisabled);
    assert_eq!(h.store.get_usage(ALICE, CHANNEL).await.unwrap(), None);
}

#[tokio::test]
async fn test_unknown_channel_follows_default_enabled() {
    let h = harness_with(|c| c.quota.default_enabled = true).await;
    let mut message = h.message(1, ALICE, 1);
    message.channel_id = throttler_common::ChannelId(77);

    let evaluation = h.engine.handle_message(message).await;

    assert_eq!(evaluation, Evaluation::Counted { usage: 1, ceiling: 3 });
}

#[tokio::test]
async fn test_plain_text_is_ignored() {
    let h = harness().await;
    let evaluation = h.engine.handle_message(h.message(1, ALICE, 0)).await;
    assert_eq!(evaluation, Evaluation::NoLinks);
    assert_eq!(h.engine.pending_deferred(), 0);
}

#[tokio::test]
async fn test_duplicate_delivery_is_counted_once() {
    let h = harness().await;
    let message = h.message(1, ALICE, 1);

    h.engine.handle_message(message.clone()).await;
    let second = h.engine.handle_message(message).await;

    assert_eq!(second, Evaluation::Duplicate);
    assert_eq!(h.store.get_usage(ALICE, CHANNEL).await.unwrap(), Some(1));
}

#[tokio::test]
async fn test_deferred_link_is_evaluated_once_after_refetch() {
    let mut h = harness().await;
    let mut message = h.message(10, ALICE, 0);
    message.content = "http://example.com".to_string();
    // Old enough that the preview delay has already passed.
    message.created_at = h.clock.now() - chrono::Duration::seconds(5);

    assert_eq!(h.engine.handle_message(message.clone()).await, Evaluation::Deferred);
    assert_eq!(h.engine.pending_deferred(), 1);

    let mut fetched = message.clone();
    fetched.embed_count = 1;
    h.transport.set_fetchable(fetched);

    let evaluation = h.worker.process_next(&h.engine).await;
    assert_eq!(evaluation, Some(Evaluation::Counted { usage: 1, ceiling: 3 }));
    assert_eq!(h.engine.pending_deferred(), 0);

    // A late gateway update for the same message is a duplicate.
    let mut late = message;
    late.embed_count = 1;
    assert_eq!(h.engine.handle_message(late).await, Evaluation::Duplicate);
    assert_eq!(h.store.get_usage(ALICE, CHANNEL).await.unwrap(), Some(1));
}

#[tokio::test]
async fn test_deferred_without_preview_is_dropped() {
    let mut h = harness().await;
    let mut message = h.message(11, ALICE, 0);
    message.content = "http://example.com".to_string();
    message.created_at = h.clock.now() - chrono::Duration::seconds(5);
    h.transport.set_fetchable(message.clone());

    h.engine.handle_message(message).await;
    let evaluation = h.worker.process_next(&h.engine).await;

    assert_eq!(evaluation, Some(Evaluation::NoEmbedsAfterDelay));
    assert_eq!(h.store.get_usage(ALICE, CHANNEL).await.unwrap(), None);
}

#[tokio::test]
async fn test_deferred_fetch_failure_is_skipped() {
    let mut h = harness().await;
    let mut message = h.message(12, ALICE, 0);
    message.content = "http://deleted.example".to_string();
    message.created_at = h.clock.now() - chrono::Duration::seconds(5);

    h.engine.handle_message(message).await;
    let evaluation = h.worker.process_next(&h.engine).await;

    assert_eq!(evaluation, Some(Evaluation::Failed));
}

#[tokio::test]
async fn test_role_override_raises_ceiling() {
    let h = harness().await;
    let role = RoleId(500);
    h.engine
        .set_role_quota(RoleQuota {
            role_id: role,
            channel_id: CHANNEL,
            quota: 10,
            priority: 5,
        })
        .await
        .unwrap();

    let mut message = h.message(1, ALICE, 4);
    message.member_roles = vec![RoleId(499), role];

    let evaluation = h.engine.handle_message(message).await;

    assert_eq!(evaluation, Evaluation::Counted { usage: 4, ceiling: 10 });
}

#[tokio::test]
async fn test_bot_embeds_follow_channel_switch() {
    let h = harness().await;
    h.store.set_channel_suppress_bot(CHANNEL, false).await.unwrap();
    h.engine.handle_message(h.message(1, OTHER_BOT, 3)).await;

    let evaluation = h.engine.handle_message(h.message(2, OTHER_BOT, 1)).await;
    assert!(matches!(
        evaluation,
        Evaluation::Suppressed {
            action: SuppressAction::BotExempt,
            ..
        }
    ));
    assert!(h.transport.suppressed().is_empty());

    h.store.set_channel_suppress_bot(CHANNEL, true).await.unwrap();
    let evaluation = h.engine.handle_message(h.message(3, OTHER_BOT, 1)).await;
    assert!(matches!(
        evaluation,
        Evaluation::Suppressed {
            action: SuppressAction::Applied { hinted: false },
            ..
        }
    ));
    // Bots never get hints.
    assert!(h.transport.sent().is_empty());
}

#[tokio::test]
async fn test_relay_message_is_charged_to_mentioned_user() {
    let h = harness().await;
    let mut relay = h.message(21, RELAY, 2);
    relay.content = format!("<@{}> https://example.com", ALICE.get());
    relay.referenced = Some(ReferencedMessage {
        id: MessageId(20),
        author: Author { id: ALICE, bot: false },
    });

    let evaluation = h.engine.handle_message(relay).await;

    assert_eq!(evaluation, Evaluation::Counted { usage: 2, ceiling: 3 });
    assert_eq!(h.store.get_usage(ALICE, CHANNEL).await.unwrap(), Some(2));
    assert_eq!(h.store.get_usage(RELAY, CHANNEL).await.unwrap(), None);
}

#[tokio::test]
async fn test_relay_without_user_mention_is_unattributed() {
    let h = harness().await;
    let mut relay = h.message(22, RELAY, 1);
    relay.content = "<@&123> role ping https://example.com".to_string();

    assert_eq!(h.engine.handle_message(relay).await, Evaluation::Unattributed);
}

#[tokio::test]
async fn test_hint_cooldown_backs_off() {
    let h = harness().await;
    h.engine.handle_message(h.message(1, ALICE, 3)).await;

    h.engine.handle_message(h.message(2, ALICE, 1)).await;
    let sent = h.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, FakeTransport::dm_channel(ALICE));
    assert!(sent[0].1.contains("24 小時內不會再收到此提示"));
    assert!(sent[0].1.contains(&format!("<#{}>", CHANNEL.get())));

    let record = h.store.user_record(ALICE).await.unwrap().unwrap();
    assert_eq!(record.hinted, 1);
    assert_eq!(record.next_hint_at, h.clock.now() + chrono::Duration::hours(24));

    // Still cooling down: suppressed, no hint.
    h.clock.advance(chrono::Duration::hours(1));
    let evaluation = h.engine.handle_message(h.message(3, ALICE, 1)).await;
    assert!(matches!(
        evaluation,
        Evaluation::Suppressed {
            action: SuppressAction::Applied { hinted: false },
            ..
        }
    ));
    assert_eq!(h.transport.sent().len(), 1);

    // Past the cooldown the next hint doubles it.
    h.clock.advance(chrono::Duration::hours(24));
    h.engine.handle_message(h.message(4, ALICE, 5)).await;
    let sent = h.transport.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[1].1.contains("48 小時內不會再收到此提示"));
    assert_eq!(h.store.user_record(ALICE).await.unwrap().unwrap().hinted, 2);
}

#[tokio::test]
async fn test_hint_cooldown_saturates_at_large_exponent() {
    let h = harness_with(|c| c.hint.max_exponent = 30).await;
    let earlier = h.clock.now() - chrono::Duration::hours(1);
    for _ in 0..30 {
        h.store.record_hint(ALICE, earlier).await.unwrap();
    }
    h.engine.handle_message(h.message(1, ALICE, 3)).await;

    let evaluation = supervise("message", h.engine.handle_message(h.message(2, ALICE, 1)))
        .await
        .unwrap();

    assert!(matches!(
        evaluation,
        Evaluation::Suppressed {
            action: SuppressAction::Applied { hinted: true },
            ..
        }
    ));
    let record = h.store.user_record(ALICE).await.unwrap().unwrap();
    assert_eq!(record.hinted, 31);
    assert!(record.next_hint_at > h.clock.now() + chrono::Duration::days(365 * 50));

    // The cooldown was recorded, so the next suppression stays quiet.
    supervise("message", h.engine.handle_message(h.message(3, ALICE, 1)))
        .await
        .unwrap();
    assert_eq!(h.transport.sent().len(), 1);
    assert_eq!(h.transport.suppressed(), vec![MessageId(2), MessageId(3)]);
}

#[tokio::test]
async fn test_failed_suppression_sends_no_hint() {
    let h = harness().await;
    h.transport.fail_suppress(true);

    let evaluation = h.engine.handle_message(h.message(1, ALICE, 4)).await;

    assert!(matches!(
        evaluation,
        Evaluation::Suppressed {
            action: SuppressAction::EditFailed,
            ..
        }
    ));
    assert!(h.transport.sent().is_empty());
    assert_eq!(h.store.user_record(ALICE).await.unwrap(), None);
}

#[tokio::test]
async fn test_already_suppressed_message_is_left_alone() {
    let h = harness().await;
    let mut message = h.message(1, ALICE, 4);
    message.embeds_suppressed = true;

    let evaluation = h.engine.handle_message(message).await;

    assert!(matches!(
        evaluation,
        Evaluation::Suppressed {
            action: SuppressAction::AlreadySuppressed,
            ..
        }
    ));
    assert!(h.transport.suppressed().is_empty());
}

#[tokio::test]
async fn test_recovery_returns_quota() {
    let h = harness().await;
    let message = h.message(1, ALICE, 2);
    h.engine.handle_message(message.clone()).await;
    h.clock.advance(chrono::Duration::seconds(30));

    let status = h
        .engine
        .recover(RecoveryRequest {
            invoker: ALICE,
            invoker_roles: Vec::new(),
            message,
        })
        .await
        .unwrap();

    assert_eq!(status.usage, 0);
    assert_eq!(status.ceiling, 3);
    assert_eq!(status.remaining(), 3);
    assert_eq!(h.transport.suppressed(), vec![MessageId(1)]);
}

#[tokio::test]
async fn test_recovery_allowed_at_window_edge() {
    let h = harness().await;
    let message = h.message(1, ALICE, 1);
    h.engine.handle_message(message.clone()).await;
    h.clock.advance(chrono::Duration::seconds(60));

    let result = h
        .engine
        .recover(RecoveryRequest {
            invoker: ALICE,
            invoker_roles: Vec::new(),
            message,
        })
        .await;

    assert_eq!(result.unwrap().usage, 0);
}

#[tokio::test]
async fn test_recovery_rejected_after_window() {
    let h = harness().await;
    let message = h.message(1, ALICE, 2);
    h.engine.handle_message(message.clone()).await;
    h.clock.advance(chrono::Duration::seconds(61));

    let result = h
        .engine
        .recover(RecoveryRequest {
            invoker: ALICE,
            invoker_roles: Vec::new(),
            message,
        })
        .await;

    assert!(matches!(result, Err(RecoveryError::WindowExpired { window_seconds: 60 })));
    assert_eq!(h.store.get_usage(ALICE, CHANNEL).await.unwrap(), Some(2));
    assert!(h.transport.suppressed().is_empty());
}

#[tokio::test]
async fn test_recovery_rejects_other_users() {
    let h = harness().await;
    let message = h.message(1, ALICE, 1);

    let result = h
        .engine
        .recover(RecoveryRequest {
            invoker: BOB,
            invoker_roles: Vec::new(),
            message,
        })
        .await;

    assert!(matches!(result, Err(RecoveryError::NotAuthor)));
}

#[tokio::test]
async fn test_recovery_rejects_suppressed_message() {
    let h = harness().await;
    let mut message = h.message(1, ALICE, 1);
    message.embeds_suppressed = true;

    let result = h
        .engine
        .recover(RecoveryRequest {
            invoker: ALICE,
            invoker_roles: Vec::new(),
            message,
        })
        .await;

    let error = result.unwrap_err();
    assert!(matches!(error, RecoveryError::AlreadySuppressed));
    assert!(error.is_precondition());
}

#[tokio::test]
async fn test_recovery_of_relayed_message() {
    let h = harness().await;
    let mut relay = h.message(31, RELAY, 1);
    relay.content = format!("<@{}> https://example.com", ALICE.get());
    h.engine.handle_message(relay.clone()).await;

    let status = h
        .engine
        .recover(RecoveryRequest {
            invoker: ALICE,
            invoker_roles: Vec::new(),
            message: relay.clone(),
        })
        .await
        .unwrap();
    assert_eq!(status.usage, 0);

    let result = h
        .engine
        .recover(RecoveryRequest {
            invoker: BOB,
            invoker_roles: Vec::new(),
            message: relay,
        })
        .await;
    assert!(matches!(result, Err(RecoveryError::NotAuthor)));
}

#[tokio::test]
async fn test_recovery_edit_failure_keeps_usage() {
    let h = harness().await;
    let message = h.message(1, ALICE, 2);
    h.engine.handle_message(message.clone()).await;
    h.transport.fail_suppress(true);

    let result = h
        .engine
        .recover(RecoveryRequest {
            invoker: ALICE,
            invoker_roles: Vec::new(),
            message,
        })
        .await;

    let error = result.unwrap_err();
    assert!(matches!(error, RecoveryError::Failed(_)));
    assert!(!error.is_precondition());
    assert_eq!(h.store.get_usage(ALICE, CHANNEL).await.unwrap(), Some(2));
}

#[tokio::test]
async fn test_toggles_flip_channel_switches() {
    let h = harness().await;
    let other = throttler_common::ChannelId(4_242);

    assert!(h.engine.toggle_channel(other).await.unwrap());
    assert!(h.engine.channel_enabled(other).await.unwrap());
    assert!(!h.engine.toggle_channel(other).await.unwrap());

    // Rows created by the enabled switch default to suppressing bots.
    assert!(!h.engine.toggle_suppress_bot(other).await.unwrap());
    assert!(h.engine.toggle_suppress_bot(other).await.unwrap());
}

#[tokio::test]
async fn test_reset_quota_and_status() {
    let h = harness().await;
    h.engine.handle_message(h.message(1, BOB, 3)).await;

    let status = h.engine.quota_status(BOB, CHANNEL, &[]).await.unwrap();
    assert_eq!(status.remaining(), 0);

    h.engine.reset_quota(BOB, CHANNEL).await.unwrap();
    let status = h.engine.quota_status(BOB, CHANNEL, &[]).await.unwrap();
    assert_eq!(status.usage, 0);
}

#[tokio::test]
async fn test_usage_resets_at_day_boundary() {
    let h = harness().await;
    h.engine.handle_message(h.message(1, ALICE, 3)).await;

    // 16:00 UTC is midnight at UTC+8.
    h.clock.set(throttler_common::test_utils::mock_timestamp(2024, 3, 1, 16, 0, 1));
    let evaluation = h.engine.handle_message(h.message(2, ALICE, 2)).await;

    assert_eq!(evaluation, Evaluation::Counted { usage: 2, ceiling: 3 });
}
