//! tcplink - Entry Point
//!
//! Command-line client for checking and talking to a TCP endpoint.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use tcplink::{Config, ConnectionManager, VERSION};

/// tcplink - single-connection TCP client
#[derive(Parser)]
#[command(name = "tcplink")]
#[command(version = VERSION)]
#[command(about = "Connect to a TCP endpoint and exchange raw bytes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the target, report the peer and disconnect
    Probe {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Send a payload and print the reply
    Send {
        #[command(flatten)]
        target: TargetArgs,
        /// Bytes to write after connecting
        payload: String,
        /// Maximum number of reply bytes to read (0 = don't wait for a reply)
        #[arg(long, default_value_t = 0)]
        read: usize,
        /// How long to wait for reply bytes
        #[arg(long, default_value_t = 2000)]
        read_timeout_ms: u64,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Target host (overrides the config file)
    #[arg(long)]
    host: Option<String>,
    /// Target port (overrides the config file)
    #[arg(long)]
    port: Option<u16>,
    /// Connect timeout in milliseconds (overrides the config file)
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl TargetArgs {
    /// Merge the config file (if any) with command-line overrides
    fn resolve(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("Failed to load config from {:?}", path))?,
            None => {
                let host = self
                    .host
                    .clone()
                    .context("--host is required without --config")?;
                let port = self.port.context("--port is required without --config")?;
                Config::for_target(host, port)
            }
        };

        if let Some(host) = &self.host {
            config.target.host = host.clone();
        }
        if let Some(port) = self.port {
            config.target.port = port;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.target.timeout_ms = timeout_ms;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Probe { target } => probe(target.resolve()?),
        Commands::Send {
            target,
            payload,
            read,
            read_timeout_ms,
        } => send(
            target.resolve()?,
            payload.as_bytes(),
            read,
            Duration::from_millis(read_timeout_ms),
        ),
    }
}

fn probe(config: Config) -> Result<()> {
    tcplink::util::init_tracing(&config.logging)?;

    info!(version = VERSION, target = %config.target.host, port = config.target.port, "Probing target");

    let manager = config.target.build_manager();
    match manager.connect() {
        Ok(_) => {
            info!(peer_addr = ?manager.peer_addr(), "Probe successful");
            manager.disconnect()?;
            Ok(())
        }
        Err(e) => {
            error!(error = %e, cause = %e.io_error(), "Probe failed");
            Err(e.into())
        }
    }
}

fn send(config: Config, payload: &[u8], read: usize, read_timeout: Duration) -> Result<()> {
    tcplink::util::init_tracing(&config.logging)?;

    let manager = config.target.build_manager();
    manager.connect()?;

    let result = exchange(&manager, payload, read, read_timeout);
    let reply = settle(result, manager.disconnect())?;
    if !reply.is_empty() {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&reply)?;
        stdout.flush()?;
    }
    Ok(())
}

/// Combine an exchange outcome with the disconnect that followed it
///
/// The exchange error wins; a close failure only surfaces after a
/// successful exchange.
fn settle<T>(outcome: Result<T>, closed: tcplink::Result<bool>) -> Result<T> {
    let value = outcome?;
    closed?;
    Ok(value)
}

/// Write `payload` and collect up to `read` reply bytes
fn exchange(
    manager: &ConnectionManager,
    payload: &[u8],
    read: usize,
    read_timeout: Duration,
) -> Result<Vec<u8>> {
    let mut output = manager.out_stream().context("Connection closed before write")?;
    output.write_all(payload).context("Failed to send payload")?;
    output.flush()?;
    info!(bytes = payload.len(), "Payload sent");

    let mut reply = vec![0u8; read];
    if read == 0 {
        return Ok(reply);
    }

    let mut input = manager.in_stream().context("Connection closed before read")?;
    input.set_read_timeout(Some(read_timeout))?;

    let mut filled = 0;
    while filled < read {
        match input.read(&mut reply[filled..]) {
            Ok(0) => break, // EOF
            Ok(n) => filled += n,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                break
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("Failed to read reply"),
        }
    }
    reply.truncate(filled);

    info!(bytes = filled, "Reply received");
    Ok(reply)
}
