//! Application configuration.

use pricewatch_core::{Pair, DEFAULT_INTERVAL_SECS};
use pricewatch_engine::{EngineConfig, DEFAULT_RETENTION_CAP};
use pricewatch_feeds::PriceSourceKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("BOT_TOKEN is not set")]
    MissingToken,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Quote service to poll.
    pub price_source: PriceSourceKind,
    /// Tracked pair, e.g. `BTC/USDT`.
    pub pair: String,
    /// Interval installed by `/start`.
    pub default_interval_secs: u64,
    /// Notifications kept per chat before they are purged.
    pub retention_cap: usize,
    /// HTTP timeout for quote requests.
    pub request_timeout_secs: u64,
    /// Period of the background price log (0 disables it).
    pub price_log_interval_secs: u64,
    /// Logging level.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            price_source: PriceSourceKind::Binance,
            pair: "BTC/USDT".to_string(),
            default_interval_secs: DEFAULT_INTERVAL_SECS,
            retention_cap: DEFAULT_RETENTION_CAP,
            request_timeout_secs: 10,
            price_log_interval_secs: 0,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_interval_secs < 1 {
            return Err(ConfigError::Invalid(
                "default_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.retention_cap < 1 {
            return Err(ConfigError::Invalid(
                "retention_cap must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs < 1 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        self.pair()?;
        Ok(())
    }

    pub fn pair(&self) -> Result<Pair, ConfigError> {
        Pair::parse(&self.pair)
            .ok_or_else(|| ConfigError::Invalid(format!("invalid pair '{}'", self.pair)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            default_interval: Duration::from_secs(self.default_interval_secs),
            retention_cap: self.retention_cap,
        }
    }
}

/// Read the Telegram bot token from the environment.
pub fn bot_token_from_env() -> Result<String, ConfigError> {
    ["BOT_TOKEN", "TELOXIDE_TOKEN"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|token| !token.trim().is_empty())
        .ok_or(ConfigError::MissingToken)
}
