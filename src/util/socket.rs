//! Socket creation and tuning

use socket2::{Domain, Protocol, SockAddr, Socket, TcpKeepalive, Type};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

/// Default idle time before TCP keepalive probes start
pub const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(60);

/// Socket options applied once the transport is connected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkOptions {
    /// Disable Nagle's algorithm
    pub nodelay: bool,
    /// Keepalive idle time (None leaves keepalive off)
    pub keepalive: Option<Duration>,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            nodelay: true,
            keepalive: Some(DEFAULT_KEEPALIVE),
        }
    }
}

/// Open a blocking TCP socket connected to `addr`
///
/// A zero `timeout` waits for the operating system to finish or give up
/// on the handshake.
pub fn connect_tcp(addr: SocketAddr, timeout: Duration) -> io::Result<Socket> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    let target = SockAddr::from(addr);

    if timeout.is_zero() {
        socket.connect(&target)?;
    } else {
        socket.connect_timeout(&target, timeout)?;
    }

    Ok(socket)
}

/// Apply link options to a connected socket
pub fn tune_tcp_socket(socket: &Socket, options: &LinkOptions) -> io::Result<()> {
    socket.set_nodelay(options.nodelay)?;

    // TCP keepalive for connection health
    if let Some(idle) = options.keepalive {
        let keepalive = TcpKeepalive::new().with_time(idle);
        socket.set_tcp_keepalive(&keepalive)?;
    }

    Ok(())
}
