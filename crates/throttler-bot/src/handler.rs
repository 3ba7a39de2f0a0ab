//! Gateway event handler.

use poise::serenity_prelude as serenity;
use std::sync::Arc;
use throttler_commands::{incoming_message, Data, Error};
use throttler_engine::supervise;
use tracing::{debug, info, trace};

/// Central event handler for Discord events
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!(user = %data_about_bot.user.name, guilds = data_about_bot.guilds.len(), "Bot ready");
        }
        serenity::FullEvent::Message { new_message } => {
            if new_message.author.id == ctx.cache.current_user().id {
                return Ok(());
            }
            on_message(data, new_message).await;
        }
        _ => {}
    }
    Ok(())
}

/// Feed a guild message to the engine inside a fault boundary.
async fn on_message(data: &Data, message: &serenity::Message) {
    if message.guild_id.is_none() {
        trace!(message = %message.id, "ignoring direct message");
        return;
    }

    let engine = Arc::clone(&data.engine);
    // Panics are logged by `supervise`; the message is simply dropped.
    if let Ok(evaluation) = supervise("message", engine.handle_message(incoming_message(message))).await {
        debug!(message = %message.id, ?evaluation, "message evaluated");
    }
}
