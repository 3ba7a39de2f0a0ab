//! Poise framework setup, shared data and the command error boundary.

use poise::serenity_prelude as serenity;
use std::sync::Arc;
use throttler_config::Config;
use throttler_engine::SuppressionEngine;
use throttler_i18n::Messages;
use tracing::{debug, error, info};

use crate::reply;

/// Application data accessible in all commands.
pub struct Data {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Quota engine shared with the gateway handler.
    pub engine: Arc<SuppressionEngine>,
}

impl Data {
    /// Localized strings.
    pub fn messages(&self) -> &Messages {
        self.engine.messages()
    }
}

impl std::fmt::Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Data")
            .field("config", &"<Config>")
            .field("engine", &self.engine)
            .finish()
    }
}

/// Application error type for commands.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Command context type.
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Every command the bot registers.
pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        crate::suppress::suppress_embeds(),
        crate::channel::toggle_channel(),
        crate::channel::toggle_suppress_bot(),
        crate::quota::reset_quota(),
        crate::quota::my_quota(),
        crate::roles::set_role_quota(),
        crate::roles::list_role_quotas(),
    ]
}

/// Framework options with commands, logging hooks and the error handler.
///
/// The gateway event handler is left to the caller.
pub fn framework_options() -> poise::FrameworkOptions<Data, Error> {
    poise::FrameworkOptions {
        commands: commands(),
        on_error: |error| Box::pin(on_error(error)),
        pre_command: |ctx| {
            Box::pin(async move {
                debug!(
                    command = %ctx.command().qualified_name,
                    user = %ctx.author().id,
                    channel = %ctx.channel_id(),
                    "executing command"
                );
            })
        },
        post_command: |ctx| {
            Box::pin(async move {
                info!(
                    command = %ctx.command().qualified_name,
                    user = %ctx.author().id,
                    "command completed"
                );
            })
        },
        ..Default::default()
    }
}

/// Global error handler for the framework
async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!(command = %ctx.command().qualified_name, error = %error, "command failed");
            reply::send_best_effort(ctx, reply::text(ctx, "error-generic")).await;
        }
        poise::FrameworkError::CommandPanic { payload, ctx, .. } => {
            error!(
                command = %ctx.command().qualified_name,
                payload = payload.as_deref().unwrap_or("<none>"),
                "command panicked"
            );
            reply::send_best_effort(ctx, reply::text(ctx, "error-generic")).await;
        }
        poise::FrameworkError::MissingUserPermissions { ctx, .. } => {
            debug!(command = %ctx.command().qualified_name, user = %ctx.author().id, "missing user permissions");
            reply::send_best_effort(ctx, reply::text(ctx, "error-missing-permission")).await;
        }
        poise::FrameworkError::MissingBotPermissions {
            missing_permissions,
            ctx,
            ..
        } => {
            let key = if missing_permissions.contains(serenity::Permissions::VIEW_CHANNEL) {
                "error-bot-cannot-view"
            } else {
                "error-generic"
            };
            debug!(command = %ctx.command().qualified_name, missing = ?missing_permissions, "missing bot permissions");
            reply::send_best_effort(ctx, reply::text(ctx, key)).await;
        }
        poise::FrameworkError::GuildOnly { ctx, .. } => {
            reply::send_best_effort(ctx, reply::text(ctx, "error-guild-only")).await;
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            error!(event = event.snake_case_name(), error = %error, "event handler failed");
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!(error = %e, "error while handling framework error");
            }
        }
    }
}
