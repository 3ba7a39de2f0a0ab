//! Core bot logic using the Poise framework.

use crate::error::BotResult;
use crate::handler;
use crate::transport::SerenityTransport;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use throttler_commands::{framework_options, Data};
use throttler_config::Config;
use throttler_engine::{EngineSettings, RolloverSchedule, SqliteQuotaStore, SuppressionEngine, SystemClock};
use throttler_i18n::{Locale, Messages};
use tracing::{error, info, warn};

/// Gateway intents: guild metadata, guild messages and their content.
pub fn intents() -> serenity::GatewayIntents {
    serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT
}

/// Main bot structure.
pub struct ThrottlerBot {
    config: Arc<Config>,
    store: Arc<SqliteQuotaStore>,
    messages: Arc<Messages>,
}

impl std::fmt::Debug for ThrottlerBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThrottlerBot")
            .field("store", &self.store)
            .field("messages", &self.messages)
            .finish_non_exhaustive()
    }
}

impl ThrottlerBot {
    /// Open the quota database and load localized strings.
    ///
    /// Fails when the database cannot be opened; there is nothing to run
    /// without it.
    pub async fn new(config: Config) -> BotResult<Self> {
        let fallback = Locale::from_code(&config.language).unwrap_or_else(|| {
            warn!(language = %config.language, "unsupported language, falling back to default locale");
            Locale::default()
        });
        let messages = Messages::new(fallback)?;

        let schedule = RolloverSchedule::from_offset_hours(config.quota.reset_utc_offset_hours)?;
        let store = SqliteQuotaStore::connect(&config.database, schedule, Arc::new(SystemClock)).await?;

        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
            messages: Arc::new(messages),
        })
    }

    /// Connect to the gateway and run until shutdown.
    pub async fn start(&self) -> BotResult<()> {
        let config = Arc::clone(&self.config);
        let store = Arc::clone(&self.store);
        let messages = Arc::clone(&self.messages);

        let mut options = framework_options();
        options.event_handler = |ctx, event, framework, data| {
            Box::pin(handler::event_handler(ctx, event, framework, data))
        };

        let framework = poise::Framework::builder()
            .options(options)
            .setup(move |ctx, ready, framework| {
                Box::pin(async move {
                    info!("Bot connected as: {} ({})", ready.user.name, ready.user.id);

                    if config.discord.update_commands {
                        poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                        info!("Slash commands registered globally");
                    }

                    let transport = Arc::new(SerenityTransport::new(Arc::clone(&ctx.http)));
                    let (engine, worker) = SuppressionEngine::new(
                        EngineSettings::from_config(&config),
                        store,
                        transport,
                        messages,
                        Arc::new(SystemClock),
                    );
                    tokio::spawn(worker.run(Arc::clone(&engine)));

                    Ok(Data { config, engine })
                })
            })
            .build();

        let mut client = serenity::ClientBuilder::new(&self.config.discord.token, intents())
            .framework(framework)
            .await?;

        let shard_manager = Arc::clone(&client.shard_manager);
        tokio::spawn(async move {
            shutdown_signal().await;
            info!("Received shutdown signal, starting graceful shutdown");
            shard_manager.shutdown_all().await;
        });

        info!("Embed throttler is starting up...");
        client.start().await?;

        self.store.close().await;
        info!("Embed throttler has shut down");
        Ok(())
    }
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {:?}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {:?}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
