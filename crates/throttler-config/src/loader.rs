//! Configuration loading utilities

use crate::schema::Config;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use throttler_common::{ThrottlerError, UserId};
use tracing::{debug, info};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "THROTTLER_CONFIG_PATH";

/// Directories searched, in order, when no explicit file is given.
const SEARCH_DIRS: [&str; 2] = [".", "config"];

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParse {
        var: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A value is outside its allowed range
    #[error("Invalid configuration value for '{field}': {message}")]
    Validation { field: String, message: String },
}

impl From<ConfigError> for ThrottlerError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, message } => Self::validation(message, field),
            other => Self::config_with_source("failed to load configuration", other),
        }
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file with environment variable overrides
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content)?;

        Self::apply_env_overrides(&mut config)?;
        config.validate()?;

        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Resolve the configuration source and load it.
    ///
    /// Order: `explicit`, then `THROTTLER_CONFIG_PATH`, then the first
    /// `config.yaml` (or `config_dev.yaml` when `dev`) found in the search
    /// directories, then built-in defaults.
    pub fn load(explicit: Option<&Path>, dev: bool) -> Result<Config, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_config(path);
        }
        if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            return Self::load_config(path);
        }
        if let Some(path) = Self::discover(Path::new("."), dev) {
            return Self::load_config(path);
        }

        debug!("no configuration file found, using defaults");
        let mut config = Config::default();
        Self::apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML without overrides or validation.
    pub fn parse(content: &str) -> Result<Config, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Find the configuration file below `root`.
    pub fn discover(root: &Path, dev: bool) -> Option<PathBuf> {
        let file_name = if dev { "config_dev.yaml" } else { "config.yaml" };
        SEARCH_DIRS
            .iter()
            .map(|dir| root.join(dir).join(file_name))
            .find(|candidate| candidate.is_file())
    }

    /// Apply environment variable overrides from the process environment
    pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        Self::apply_overrides_from(config, |key| env::var(key).ok())
    }

    /// Apply overrides using an arbitrary variable lookup.
    pub fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("DISCORD_TOKEN") {
            config.discord.token = token;
        }
        if let Some(quota) = lookup("THROTTLER_DEFAULT_QUOTA") {
            config.quota.default_quota = parse_var("THROTTLER_DEFAULT_QUOTA", &quota)?;
        }
        if let Some(enabled) = lookup("THROTTLER_DEFAULT_ENABLED") {
            config.quota.default_enabled = parse_var("THROTTLER_DEFAULT_ENABLED", &enabled)?;
        }
        if let Some(path) = lookup("THROTTLER_DATABASE_PATH") {
            config.database.path = PathBuf::from(path);
        }
        if let Some(update) = lookup("THROTTLER_UPDATE_COMMANDS") {
            config.discord.update_commands = parse_var("THROTTLER_UPDATE_COMMANDS", &update)?;
        }
        if let Some(relay) = lookup("THROTTLER_RELAY_BOT_ID") {
            let id: u64 = parse_var("THROTTLER_RELAY_BOT_ID", &relay)?;
            config.discord.relay_bot_id = Some(UserId(id));
        }
        Ok(())
    }
}

fn parse_var<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::EnvParse {
        var: var.to_string(),
        source: Box::new(e),
    })
}
