//! Connection state

use socket2::Socket;
use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use super::endpoint::Endpoint;
use super::stream::{InStream, OutStream};
use crate::util::{connect_tcp, tune_tcp_socket, LinkOptions};

/// Connection lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkPhase {
    /// No transport held
    Disconnected,
    /// A connect call owns the transition; nobody else may start one
    Connecting,
    /// Transport is open and handles are attached
    Connected,
}

/// An open transport and the handles derived from it
#[derive(Debug)]
pub(crate) struct Link {
    stream: Arc<TcpStream>,
    peer_addr: SocketAddr,
    connected_at: Instant,
}

impl Link {
    /// Establish a transport to `endpoint`
    ///
    /// Resolved addresses are tried in order until one connects; all of
    /// them share one deadline. A zero `timeout` disables the deadline.
    pub(crate) fn open(
        endpoint: &Endpoint,
        timeout: Duration,
        options: &LinkOptions,
    ) -> io::Result<Self> {
        let deadline = (!timeout.is_zero()).then(|| Instant::now() + timeout);
        let mut last_err = None;

        for addr in endpoint.resolve()? {
            let budget = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(io::Error::new(io::ErrorKind::TimedOut, "connect timed out"));
                    }
                    remaining
                }
                None => Duration::ZERO,
            };

            match connect_tcp(addr, budget) {
                Ok(socket) => return Self::attach(socket, addr, options),
                Err(e) => {
                    debug!(%addr, error = %e, "Address attempt failed");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no addresses for {}", endpoint))
        }))
    }

    /// Finish setting up a socket that already completed its handshake
    fn attach(socket: Socket, peer_addr: SocketAddr, options: &LinkOptions) -> io::Result<Self> {
        if let Err(e) = tune_tcp_socket(&socket, options) {
            // Connected already, so the peer must see the close
            if let Err(close_err) = socket.shutdown(Shutdown::Both) {
                debug!(%peer_addr, error = %close_err, "Shutdown after failed setup also failed");
            }
            return Err(e);
        }

        Ok(Self {
            stream: Arc::new(socket.into()),
            peer_addr,
            connected_at: Instant::now(),
        })
    }

    /// Readable handle onto this transport
    pub(crate) fn in_stream(&self) -> InStream {
        InStream::new(Arc::clone(&self.stream))
    }

    /// Writable handle onto this transport
    pub(crate) fn out_stream(&self) -> OutStream {
        OutStream::new(Arc::clone(&self.stream))
    }

    pub(crate) fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Time since the handshake completed
    pub(crate) fn duration(&self) -> Duration {
        self.connected_at.elapsed()
    }

    /// Shut the transport down in both directions
    ///
    /// Handles still held by callers observe the shutdown; the descriptor
    /// itself is released when the last handle is dropped. A peer that
    /// already reset the connection leaves nothing to shut down, which
    /// counts as closed.
    pub(crate) fn close(&self) -> io::Result<()> {
        match self.stream.shutdown(Shutdown::Both) {
            Err(e) if e.kind() == io::ErrorKind::NotConnected => {
                debug!(peer_addr = %self.peer_addr, "Peer already reset the connection");
                Ok(())
            }
            result => result,
        }
    }
}
