//! Main entry point for the embed throttler bot.

use clap::Parser;
use std::path::PathBuf;
use throttler_bot::{BotResult, ThrottlerBot};
use throttler_common::{init_logging, LoggingConfig};
use throttler_config::ConfigLoader;
use tracing::{error, info};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Look for config_dev.yaml instead of config.yaml
    #[arg(long)]
    dev: bool,

    /// Register commands globally once connected
    #[arg(long)]
    update_commands: bool,

    /// Log level, overriding the configuration
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> BotResult<()> {
    let args = Args::parse();

    let mut config = match ConfigLoader::load(args.config.as_deref(), args.dev) {
        Ok(config) => config,
        Err(e) => {
            // No configured logging yet; report through a default subscriber.
            let fallback = LoggingConfig::default();
            let _guard = init_logging(&fallback)?;
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let mut logging = config.logging.clone();
    if let Some(level) = args.log_level {
        logging = logging.with_level(level);
    }
    let _guard = init_logging(&logging)?;

    info!("Starting embed throttler v{}", env!("CARGO_PKG_VERSION"));

    if args.update_commands {
        config.discord.update_commands = true;
    }

    let bot = ThrottlerBot::new(config).await.map_err(|e| {
        error!("Bot failed to initialize: {}", e);
        e
    })?;

    if let Err(e) = bot.start().await {
        error!("Bot stopped with error: {}", e);
        return Err(e);
    }

    Ok(())
}
