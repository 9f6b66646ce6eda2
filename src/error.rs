//! Error types for tcplink

use std::io;
use thiserror::Error;

use crate::connection::Endpoint;

/// Failure of a connection lifecycle transition
///
/// Timeouts and other I/O failures are wrapped the same way; the
/// underlying cause stays reachable through [`std::error::Error::source`].
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("could not connect to {endpoint}")]
    Connect {
        endpoint: Endpoint,
        #[source]
        source: io::Error,
    },

    #[error("error while closing connection to {endpoint}")]
    Close {
        endpoint: Endpoint,
        #[source]
        source: io::Error,
    },
}

impl ConnectionError {
    /// Endpoint the failed operation was aimed at
    pub fn endpoint(&self) -> &Endpoint {
        match self {
            Self::Connect { endpoint, .. } | Self::Close { endpoint, .. } => endpoint,
        }
    }

    /// Underlying I/O error
    pub fn io_error(&self) -> &io::Error {
        match self {
            Self::Connect { source, .. } | Self::Close { source, .. } => source,
        }
    }

    /// Kind of the underlying I/O error
    pub fn kind(&self) -> io::ErrorKind {
        self.io_error().kind()
    }
}

/// Result type alias for tcplink
pub type Result<T> = std::result::Result<T, ConnectionError>;
