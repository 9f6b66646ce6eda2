//! Tracing/logging initialization

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// Parse the `logging.format` value
    pub fn parse(format: &str) -> Result<Self> {
        match format {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => anyhow::bail!("unknown log format {:?} (expected \"json\" or \"pretty\")", other),
        }
    }
}

/// Filter from `RUST_LOG`, falling back to the configured level
fn build_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level {:?}", level)),
    }
}

/// Initialize the tracing subscriber based on configuration
///
/// Bad settings are reported before any subscriber is installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let format = LogFormat::parse(&config.format)?;
    let filter = build_filter(&config.level)?;

    let subscriber = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so `send` output on stdout stays clean
    match format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true);
            subscriber.with(fmt_layer).try_init()?;
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false);
            subscriber.with(fmt_layer).try_init()?;
        }
    }

    Ok(())
}
