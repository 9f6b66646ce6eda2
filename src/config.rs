//! Configuration management
//!
//! Handles loading and validating link configuration from TOML files.
//! The connection core never reads files itself; this layer exists for
//! the command-line client and other embedders.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::connection::{ConnectionManager, DEFAULT_CONNECT_TIMEOUT};
use crate::util::{LinkOptions, LogFormat, DEFAULT_KEEPALIVE};

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub target: TargetConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection target configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Server hostname or IP literal
    pub host: String,
    /// Server port
    pub port: u16,
    /// Connect timeout in milliseconds (0 = wait for the OS)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Disable Nagle's algorithm
    #[serde(default = "default_true")]
    pub nodelay: bool,
    /// Keepalive idle time in seconds (0 = keepalive off)
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
}

impl TargetConfig {
    /// Target with default timeout and socket options
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout_ms: default_timeout_ms(),
            nodelay: default_true(),
            keepalive_secs: default_keepalive_secs(),
        }
    }

    /// Connect timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Socket options described by this section
    pub fn link_options(&self) -> LinkOptions {
        LinkOptions {
            nodelay: self.nodelay,
            keepalive: (self.keepalive_secs > 0).then(|| Duration::from_secs(self.keepalive_secs)),
        }
    }

    /// Build a disconnected manager configured from this section
    pub fn build_manager(&self) -> ConnectionManager {
        let manager = ConnectionManager::new(self.host.clone(), self.port);
        manager.set_timeout(self.timeout());
        manager.set_options(self.link_options());
        manager
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format: "json" or "pretty"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_millis() as u64
}

fn default_true() -> bool {
    true
}

fn default_keepalive_secs() -> u64 {
    DEFAULT_KEEPALIVE.as_secs()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::parse(&contents)
    }

    /// Configuration for `host:port` with every other value defaulted
    pub fn for_target(host: impl Into<String>, port: u16) -> Self {
        Self {
            target: TargetConfig::new(host, port),
            logging: LoggingConfig::default(),
        }
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.target.host.is_empty() {
            anyhow::bail!("target.host must not be empty");
        }
        if self.target.port == 0 {
            anyhow::bail!("target.port must be > 0");
        }
        LogFormat::parse(&self.logging.format).context("logging.format")?;
        Ok(())
    }
}
