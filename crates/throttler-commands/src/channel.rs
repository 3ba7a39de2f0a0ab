//! Per-channel switches.

use crate::framework::{Context, Error};
use crate::reply;

/// Turn embed throttling on or off in this channel.
#[poise::command(
    slash_command,
    guild_only,
    ephemeral,
    default_member_permissions = "MANAGE_CHANNELS",
    required_permissions = "MANAGE_CHANNELS",
    required_bot_permissions = "VIEW_CHANNEL"
)]
pub async fn toggle_channel(ctx: Context<'_>) -> Result<(), Error> {
    let enabled = ctx.data().engine.toggle_channel(reply::channel(ctx)).await?;
    let key = if enabled {
        "channel-enabled"
    } else {
        "channel-disabled"
    };
    reply::send_best_effort(ctx, reply::text(ctx, key)).await;
    Ok(())
}

/// Choose whether embeds on bot messages count in this channel.
#[poise::command(
    slash_command,
    guild_only,
    ephemeral,
    default_member_permissions = "MANAGE_CHANNELS",
    required_permissions = "MANAGE_CHANNELS"
)]
pub async fn toggle_suppress_bot(ctx: Context<'_>) -> Result<(), Error> {
    let suppress_bot = ctx
        .data()
        .engine
        .toggle_suppress_bot(reply::channel(ctx))
        .await?;
    let key = if suppress_bot {
        "suppress-bot-enabled"
    } else {
        "suppress-bot-disabled"
    };
    reply::send_best_effort(ctx, reply::text(ctx, key)).await;
    Ok(())
}
