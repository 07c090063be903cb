//! Load — config loading from file and environment variables.

use std::fs;
use std::path::Path;
use thiserror::Error;

use super::model::HubConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl HubConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("HUB_CONFIG_FILE").unwrap_or_else(|_| "/etc/loglens/hub.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::info!(
                "Config file not found at {}, using environment variables",
                config_path
            );
            Self::from_env()
        };

        // Environment variables override file config for critical settings
        if let Ok(host) = std::env::var("HUB_HOST") {
            config.host = host;
        }
        if let Some(port) = env_parse("HUB_PORT") {
            config.port = port;
        }
        if let Some(max) = env_parse("HUB_MAX_LOG_ENTRIES") {
            config.max_log_entries = max;
        }
        if let Ok(roots) = std::env::var("HUB_WORKSPACE_ROOTS") {
            config.workspace_roots = split_roots(&roots);
        }

        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: HubConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Self {
        let mut config = HubConfig::default();
        if let Ok(host) = std::env::var("HUB_HOST") {
            config.host = host;
        }
        if let Some(port) = env_parse("HUB_PORT") {
            config.port = port;
        }
        if let Some(max) = env_parse("HUB_MAX_LOG_ENTRIES") {
            config.max_log_entries = max;
        }
        if let Some(enabled) = env_parse("HUB_NETWORK_ENABLED") {
            config.network_enabled = enabled;
        }
        if let Some(enabled) = env_parse("HUB_CAPTURE_ERRORS") {
            config.capture_errors = enabled;
        }
        if let Ok(roots) = std::env::var("HUB_WORKSPACE_ROOTS") {
            config.workspace_roots = split_roots(&roots);
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

fn split_roots(raw: &str) -> Vec<String> {
    raw.split(':')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
