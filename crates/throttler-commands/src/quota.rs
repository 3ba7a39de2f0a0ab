//! Quota inspection and reset.

use poise::serenity_prelude as serenity;
use throttler_common::UserId;
use throttler_i18n::FluentArgs;

use crate::convert::role_ids;
use crate::framework::{Context, Error};
use crate::reply;

/// Reset a member's embed usage in this channel.
#[poise::command(
    slash_command,
    guild_only,
    ephemeral,
    default_member_permissions = "MANAGE_CHANNELS",
    required_permissions = "MANAGE_CHANNELS"
)]
pub async fn reset_quota(
    ctx: Context<'_>,
    #[description = "Member whose usage is reset"] user: serenity::User,
) -> Result<(), Error> {
    ctx.data()
        .engine
        .reset_quota(UserId(user.id.get()), reply::channel(ctx))
        .await?;

    let mut args = FluentArgs::new();
    args.set("user", user.id.get().to_string());
    reply::send_best_effort(ctx, reply::text_with(ctx, "quota-reset", &args)).await;
    Ok(())
}

/// Show how many embeds you can still post in this channel today.
#[poise::command(slash_command, guild_only, ephemeral)]
pub async fn my_quota(ctx: Context<'_>) -> Result<(), Error> {
    let roles = ctx
        .author_member()
        .await
        .map(|member| role_ids(&member.roles))
        .unwrap_or_default();

    let status = ctx
        .data()
        .engine
        .quota_status(UserId(ctx.author().id.get()), reply::channel(ctx), &roles)
        .await?;

    let mut args = FluentArgs::new();
    args.set("remaining", status.remaining());
    args.set("quota", status.ceiling);
    reply::send_best_effort(ctx, reply::text_with(ctx, "quota-remaining", &args)).await;
    Ok(())
}
