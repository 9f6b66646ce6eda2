//! Connection manager
//!
//! Owns a single TCP transport and serializes its lifecycle transitions.

use parking_lot::Mutex;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::endpoint::Endpoint;
use super::state::{Link, LinkPhase};
use super::stream::{InStream, OutStream};
use crate::error::{ConnectionError, Result};
use crate::metrics::{LinkStats, StatsSnapshot};
use crate::util::LinkOptions;

/// Connect timeout used until `set_timeout` is called
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Everything a lifecycle transition reads or writes
struct Slot {
    endpoint: Endpoint,
    timeout: Duration,
    options: LinkOptions,
    phase: LinkPhase,
    /// Some exactly when `phase` is `Connected`
    link: Option<Link>,
}

/// Manages the lifecycle of one client connection
///
/// Safe to share between threads. `connect` and `disconnect` block the
/// calling thread for the duration of the I/O; no threads are spawned.
pub struct ConnectionManager {
    slot: Mutex<Slot>,
    stats: LinkStats,
}

impl ConnectionManager {
    /// Create a disconnected manager targeting `host:port`
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            slot: Mutex::new(Slot {
                endpoint: Endpoint::new(host, port),
                timeout: DEFAULT_CONNECT_TIMEOUT,
                options: LinkOptions::default(),
                phase: LinkPhase::Disconnected,
                link: None,
            }),
            stats: LinkStats::new(),
        }
    }

    /// Change the connection target
    ///
    /// Returns false without touching the target while a connection is
    /// open or being opened. An empty host targets the loopback address.
    pub fn set_endpoint(&self, host: impl Into<String>, port: u16) -> bool {
        let mut slot = self.slot.lock();
        if slot.phase != LinkPhase::Disconnected {
            debug!(endpoint = %slot.endpoint, "Refusing to change endpoint of a live connection");
            return false;
        }
        slot.endpoint = Endpoint::new(host, port);
        true
    }

    /// Current connection target
    pub fn endpoint(&self) -> Endpoint {
        self.slot.lock().endpoint.clone()
    }

    /// Whether a connection is currently established
    pub fn is_connected(&self) -> bool {
        self.slot.lock().phase == LinkPhase::Connected
    }

    /// Set the timeout for the next connect (zero disables it)
    pub fn set_timeout(&self, timeout: Duration) {
        self.slot.lock().timeout = timeout;
    }

    pub fn timeout(&self) -> Duration {
        self.slot.lock().timeout
    }

    /// Set socket options for the next connect
    pub fn set_options(&self, options: LinkOptions) {
        self.slot.lock().options = options;
    }

    pub fn options(&self) -> LinkOptions {
        self.slot.lock().options
    }

    /// Connect to the current endpoint
    ///
    /// Returns `Ok(false)` without doing any I/O when already connected or
    /// when another caller's connect is in progress. On failure the manager
    /// is left disconnected and can be connected again.
    pub fn connect(&self) -> Result<bool> {
        let (endpoint, timeout, options) = {
            let mut slot = self.slot.lock();
            if slot.phase != LinkPhase::Disconnected {
                self.stats.connect_rejected();
                debug!(endpoint = %slot.endpoint, phase = ?slot.phase, "Connect ignored");
                return Ok(false);
            }
            slot.phase = LinkPhase::Connecting;
            (slot.endpoint.clone(), slot.timeout, slot.options)
        };

        self.stats.connect_attempted();
        debug!(%endpoint, timeout_ms = timeout.as_millis() as u64, "Connecting");

        let opened = Link::open(&endpoint, timeout, &options);

        let mut slot = self.slot.lock();
        match opened {
            Ok(link) => {
                let peer_addr = link.peer_addr();
                slot.link = Some(link);
                slot.phase = LinkPhase::Connected;
                drop(slot);

                self.stats.connect_succeeded();
                info!(%endpoint, %peer_addr, "Connected");
                Ok(true)
            }
            Err(source) => {
                slot.link = None;
                slot.phase = LinkPhase::Disconnected;
                drop(slot);

                self.stats.connect_failed();
                warn!(%endpoint, error = %source, "Connect failed");
                Err(ConnectionError::Connect { endpoint, source })
            }
        }
    }

    /// Close the current connection
    ///
    /// Returns `Ok(false)` without doing any I/O when not connected. If the
    /// close itself fails the error is returned, but the manager is
    /// disconnected either way.
    pub fn disconnect(&self) -> Result<bool> {
        let mut slot = self.slot.lock();
        if slot.phase != LinkPhase::Connected {
            return Ok(false);
        }
        let Some(link) = slot.link.take() else {
            return Ok(false);
        };
        slot.phase = LinkPhase::Disconnected;
        let endpoint = slot.endpoint.clone();
        let closed = link.close();
        drop(slot);

        self.stats.disconnected();
        match closed {
            Ok(()) => {
                info!(
                    %endpoint,
                    peer_addr = %link.peer_addr(),
                    duration_secs = link.duration().as_secs_f64(),
                    "Disconnected"
                );
                Ok(true)
            }
            Err(source) => {
                self.stats.close_failed();
                warn!(%endpoint, error = %source, "Error while closing connection");
                Err(ConnectionError::Close { endpoint, source })
            }
        }
    }

    /// Readable handle of the current connection
    pub fn in_stream(&self) -> Option<InStream> {
        self.slot.lock().link.as_ref().map(Link::in_stream)
    }

    /// Writable handle of the current connection
    pub fn out_stream(&self) -> Option<OutStream> {
        self.slot.lock().link.as_ref().map(Link::out_stream)
    }

    /// Remote address of the current connection
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.slot.lock().link.as_ref().map(Link::peer_addr)
    }

    /// Lifecycle counters
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        let slot = self.slot.get_mut();
        if let Some(link) = slot.link.take() {
            slot.phase = LinkPhase::Disconnected;
            if let Err(e) = link.close() {
                debug!(endpoint = %slot.endpoint, error = %e, "Close on drop failed");
            }
        }
    }
}
