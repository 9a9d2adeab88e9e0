use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_resolvers")]
    pub resolvers: Vec<String>,

    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default = "default_destination_ip")]
    pub destination_ip: String,

    /// Per-endpoint DNS timeout.
    #[serde(default = "default_dial_timeout_ms")]
    pub dial_timeout_ms: u64,

    /// 0 leaves the HTTP client's own default in place.
    #[serde(default)]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Defaults
fn default_resolvers() -> Vec<String> {
    vec![
        "8.8.8.8:53".to_string(),
        "8.8.4.4:53".to_string(),
        "1.0.0.1:53".to_string(),
        "1.1.1.1:53".to_string(),
    ]
}
fn default_workers() -> usize {
    500
}
fn default_destination_ip() -> String {
    "0.0.0.0".to_string()
}
fn default_dial_timeout_ms() -> u64 {
    10_000
}
fn default_user_agent() -> String {
    concat!("hostsift/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolvers: default_resolvers(),
            workers: default_workers(),
            destination_ip: default_destination_ip(),
            dial_timeout_ms: default_dial_timeout_ms(),
            fetch_timeout_secs: 0,
            user_agent: default_user_agent(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .context("Failed to read config file")?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("Failed to parse config TOML")?;
        Ok(config)
    }
}
