//! Message context action: hide your own embeds and get the quota back.

use poise::serenity_prelude as serenity;
use throttler_common::UserId;
use throttler_engine::{RecoveryError, RecoveryRequest};
use throttler_i18n::FluentArgs;
use tracing::debug;

use crate::convert::{incoming_message, role_ids};
use crate::framework::{Context, Error};
use crate::reply;

/// Suppress the embeds of your own message and recover its quota.
#[poise::command(
    context_menu_command = "Suppress Embeds",
    name_localized("zh-TW", "抑制嵌入"),
    name_localized("zh-CN", "抑制嵌入"),
    name_localized("ja", "埋め込みを抑制する"),
    guild_only,
    ephemeral
)]
pub async fn suppress_embeds(ctx: Context<'_>, message: serenity::Message) -> Result<(), Error> {
    let invoker_roles = ctx
        .author_member()
        .await
        .map(|member| role_ids(&member.roles))
        .unwrap_or_default();

    let request = RecoveryRequest {
        invoker: UserId(ctx.author().id.get()),
        invoker_roles,
        message: incoming_message(&message),
    };

    let content = match ctx.data().engine.recover(request).await {
        Ok(status) => {
            let mut args = FluentArgs::new();
            args.set("remaining", status.remaining());
            args.set("quota", status.ceiling);
            reply::text_with(ctx, "quota-remaining", &args)
        }
        Err(RecoveryError::Failed(e)) => return Err(e.into()),
        Err(refusal) => {
            debug!(message = %message.id, user = %ctx.author().id, reason = %refusal, "recovery refused");
            refusal_text(ctx, &refusal)
        }
    };

    // Unlike the admin commands, an undelivered reply fails the command.
    reply::send(ctx, content).await
}

fn refusal_text(ctx: Context<'_>, refusal: &RecoveryError) -> String {
    match refusal {
        RecoveryError::NotAuthor => reply::text(ctx, "recovery-not-author"),
        RecoveryError::AlreadySuppressed => reply::text(ctx, "recovery-already-suppressed"),
        RecoveryError::WindowExpired { window_seconds } => {
            let mut args = FluentArgs::new();
            args.set("seconds", *window_seconds);
            reply::text_with(ctx, "recovery-window-expired", &args)
        }
        RecoveryError::Failed(_) => reply::text(ctx, "error-generic"),
    }
}
