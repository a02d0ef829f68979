mod credentials;

pub use credentials::*;


use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{NotifierError, Result};

pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub poller: PollerConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Homework statuses endpoint, queried with `from_date=<unix timestamp>`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Pause between polls ("30s", "10m", "1h")
    #[serde(default = "default_interval")]
    pub interval: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_interval() -> String {
    "10m".to_string()
}

fn default_api_base() -> String {
    DEFAULT_TELEGRAM_API_BASE.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            interval: default_interval(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load settings from `path`, or from the default location when `None`.
    ///
    /// A missing file yields defaults; an unreadable or invalid one is an error.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let path = match path {
            Some(p) => PathBuf::from(shellexpand::tilde(p).to_string()),
            None => Self::config_path()?,
        };

        if !path.exists() {
            return Ok(Config::default());
        }

        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            NotifierError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            NotifierError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poller.endpoint.trim().is_empty() {
            return Err(NotifierError::Config(
                "poller.endpoint cannot be empty".to_string(),
            ));
        }

        let interval = parse_duration(&self.poller.interval).map_err(|e| {
            NotifierError::Config(format!(
                "Invalid poller.interval '{}': {}",
                self.poller.interval, e
            ))
        })?;
        if interval.is_zero() {
            return Err(NotifierError::Config(
                "poller.interval must be greater than zero".to_string(),
            ));
        }

        if self.telegram.api_base.trim().is_empty() {
            return Err(NotifierError::Config(
                "telegram.api_base cannot be empty".to_string(),
            ));
        }

        match self.logging.format.as_str() {
            "text" | "json" => {}
            other => {
                return Err(NotifierError::Config(format!(
                    "Unknown logging.format '{}'. Expected \"text\" or \"json\"",
                    other
                )))
            }
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Result<Duration> {
        parse_duration(&self.poller.interval)
            .map_err(|e| NotifierError::Config(format!("Invalid poller.interval: {}", e)))
    }

    pub fn config_path() -> Result<PathBuf> {
        let base = directories::BaseDirs::new().ok_or_else(|| {
            NotifierError::Config("Could not determine home directory".to_string())
        })?;

        Ok(base.home_dir().join(".homework-notifier").join("config.toml"))
    }
}

/// Parse "30s", "10m" or "1h" into a `Duration`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    let unit = match s.chars().last() {
        Some(c) if s.len() >= 2 => c,
        _ => return Err("Invalid duration format".to_string()),
    };
    let num_str = &s[..s.len() - unit.len_utf8()];
    let num: u64 = num_str.parse().map_err(|_| "Invalid number".to_string())?;

    match unit {
        's' => Ok(Duration::from_secs(num)),
        'm' => Ok(Duration::from_secs(num * 60)),
        'h' => Ok(Duration::from_secs(num * 3600)),
        _ => Err("Unknown unit".to_string()),
    }
}
