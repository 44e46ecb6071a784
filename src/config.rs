use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Database URL
    pub db_url: Option<String>,

    /// Interval between two backup cycles, in milliseconds
    #[serde(default = "default_backup_interval_ms")]
    pub backup_interval_ms: u64,

    /// Maximum wait for the coordinator lock, in milliseconds
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Maximum wait for each background task to stop on shutdown, in milliseconds
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,

    /// Number of document saves allowed in flight during one backup cycle
    #[serde(default = "default_persist_concurrency")]
    pub persist_concurrency: usize,
}

/// Timings and limits of the edit pipeline, derived from [`Config`].
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub backup_interval: Duration,
    pub lock_timeout: Duration,
    pub shutdown_timeout: Duration,
    pub persist_concurrency: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Config::default().engine_settings()
    }
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        // Load from environment variables using envy
        match envy::from_env::<Config>() {
            Ok(config) => Ok(config),
            Err(e) => Err(ConfigError::EnvError(e)),
        }
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Default tracing directives: the configured level for this crate and
    /// http traces, info for everything else.
    pub fn log_filter(&self) -> String {
        format!("colabri_editor={0},tower_http={0},axum::rejection=trace,info", self.log_level)
    }

    /// Typed view of the pipeline settings.
    ///
    /// Zero intervals and a zero concurrency are raised to the smallest usable value.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            backup_interval: Duration::from_millis(self.backup_interval_ms.max(1)),
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
            shutdown_timeout: Duration::from_millis(self.shutdown_timeout_ms),
            persist_concurrency: self.persist_concurrency.max(1),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            db_url: None,
            backup_interval_ms: default_backup_interval_ms(),
            lock_timeout_ms: default_lock_timeout_ms(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            persist_concurrency: default_persist_concurrency(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    EnvError(envy::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EnvError(e) => write!(f, "Environment variable error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_backup_interval_ms() -> u64 {
    2_000
}

fn default_lock_timeout_ms() -> u64 {
    5_000
}

fn default_shutdown_timeout_ms() -> u64 {
    1_000
}

fn default_persist_concurrency() -> usize {
    8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pipeline_timings() {
        let settings = Config::default().engine_settings();
        assert_eq!(settings.backup_interval, Duration::from_secs(2));
        assert_eq!(settings.lock_timeout, Duration::from_secs(5));
        assert_eq!(settings.shutdown_timeout, Duration::from_secs(1));
        assert_eq!(settings.persist_concurrency, 8);
    }

    #[test]
    fn zero_values_are_raised() {
        let config = Config { persist_concurrency: 0, backup_interval_ms: 0, ..Config::default() };
        let settings = config.engine_settings();
        assert_eq!(settings.persist_concurrency, 1);
        assert_eq!(settings.backup_interval, Duration::from_millis(1));
    }

    #[test]
    fn server_address_joins_host_and_port() {
        let config = Config { host: "127.0.0.1".into(), port: 8080, ..Config::default() };
        assert_eq!(config.server_address(), "127.0.0.1:8080");
    }

    #[test]
    fn log_level_feeds_the_default_filter() {
        let config = Config { log_level: "debug".into(), ..Config::default() };
        assert_eq!(config.log_filter(), "colabri_editor=debug,tower_http=debug,axum::rejection=trace,info");
        assert!(Config::default().log_filter().starts_with("colabri_editor=info,"));
    }
}
