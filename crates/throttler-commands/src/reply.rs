//! Localized ephemeral responses.

use poise::CreateReply;
use throttler_common::ChannelId;
use throttler_i18n::{FluentArgs, Locale};
use tracing::warn;

use crate::framework::{Context, Error};

/// Locale of the invoking client, falling back to the configured language.
pub fn locale(ctx: Context<'_>) -> Locale {
    ctx.data().messages().resolve_locale(ctx.locale())
}

/// Localized text without arguments.
pub fn text(ctx: Context<'_>, key: &str) -> String {
    ctx.data().messages().get(locale(ctx), key)
}

/// Localized text with arguments.
pub fn text_with(ctx: Context<'_>, key: &str, args: &FluentArgs<'_>) -> String {
    ctx.data().messages().get_with_args(locale(ctx), key, args)
}

/// Channel the command was invoked in.
pub fn channel(ctx: Context<'_>) -> ChannelId {
    ChannelId(ctx.channel_id().get())
}

/// Send an ephemeral response; failures propagate to the caller.
pub async fn send(ctx: Context<'_>, content: String) -> Result<(), Error> {
    ctx.send(CreateReply::default().content(content).ephemeral(true))
        .await?;
    Ok(())
}

/// Send an ephemeral response, logging failures.
pub async fn send_best_effort(ctx: Context<'_>, content: String) {
    if let Err(e) = send(ctx, content).await {
        warn!(command = %ctx.command().qualified_name, error = %e, "failed to send response");
    }
}
