//! tcplink - single-connection TCP client lifecycle
//!
//! This library owns one TCP connection on behalf of a higher-level
//! protocol client: it guards connect/disconnect against duplicate
//! transitions, applies a connect timeout, cleans up after failures and
//! hands out raw byte-stream handles while connected.

pub mod config;
pub mod connection;
pub mod error;
pub mod metrics;
pub mod util;

pub use config::Config;
pub use connection::{ConnectionManager, Endpoint, InStream, OutStream};
pub use error::{ConnectionError, Result};
pub use util::LinkOptions;

/// Library version for display
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
