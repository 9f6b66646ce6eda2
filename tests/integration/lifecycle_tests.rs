//! Connection lifecycle integration tests

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::time::{Duration, Instant};

use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use tcplink::{ConnectionError, ConnectionManager, Endpoint, LinkOptions};

fn bind_peer() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Port that nothing listens on
fn closed_port() -> u16 {
    let (_listener, addr) = bind_peer();
    addr.port()
}

/// Test bytes flow both ways through the exposed handles
#[test]
fn test_echo_through_handles() {
    let (listener, addr) = bind_peer();
    let manager = ConnectionManager::new("127.0.0.1", addr.port());
    assert!(manager.connect().unwrap());

    let (mut peer, _) = listener.accept().unwrap();
    let mut output = manager.out_stream().unwrap();
    let mut input = manager.in_stream().unwrap();

    output.write_all(b"hello").unwrap();
    let mut buf = [0u8; 5];
    peer.read_exact(&mut buf).unwrap();
    peer.write_all(&buf).unwrap();

    let mut echoed = [0u8; 5];
    input.read_exact(&mut echoed).unwrap();
    assert_eq!(&echoed, b"hello");

    assert!(manager.disconnect().unwrap());
}

/// Test a second connect is a no-op that opens nothing
#[test]
fn test_double_connect() {
    let (listener, addr) = bind_peer();
    let manager = ConnectionManager::new("127.0.0.1", addr.port());

    assert!(manager.connect().unwrap());
    assert!(!manager.connect().unwrap());
    assert!(manager.is_connected());

    listener.set_nonblocking(true).unwrap();
    assert!(listener.accept().is_ok());
    let second = listener.accept().unwrap_err();
    assert_eq!(second.kind(), io::ErrorKind::WouldBlock);

    let stats = manager.stats();
    assert_eq!(stats.connect_attempts, 1);
    assert_eq!(stats.connects_rejected, 1);
}

/// Test disconnect while disconnected does nothing
#[test]
fn test_disconnect_when_disconnected() {
    let manager = ConnectionManager::new("127.0.0.1", closed_port());

    assert!(!manager.disconnect().unwrap());
    assert!(!manager.is_connected());
    assert_eq!(manager.stats().disconnects, 0);
}

/// Test handles vanish on disconnect and a second disconnect is a no-op
#[test]
fn test_disconnect_clears_handles() {
    let (listener, addr) = bind_peer();
    let manager = ConnectionManager::new("127.0.0.1", addr.port());
    assert!(manager.connect().unwrap());
    let (mut peer, _) = listener.accept().unwrap();
    peer.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

    let mut stale_input = manager.in_stream().unwrap();
    let mut stale_output = manager.out_stream().unwrap();

    assert!(manager.disconnect().unwrap());
    assert!(manager.in_stream().is_none());
    assert!(manager.out_stream().is_none());
    assert!(manager.peer_addr().is_none());
    assert!(!manager.disconnect().unwrap());

    // The peer sees the close and old handles are dead
    let mut buf = [0u8; 1];
    assert_eq!(peer.read(&mut buf).unwrap(), 0);
    assert_eq!(stale_input.read(&mut buf).unwrap(), 0);
    assert!(stale_output.write_all(b"late").is_err());
}

/// Test a failed connect leaves the manager clean and reusable
#[test]
fn test_failed_connect_is_not_poisoning() {
    let manager = ConnectionManager::new("127.0.0.1", closed_port());
    manager.set_timeout(Duration::from_secs(2));

    let err = manager.connect().unwrap_err();
    assert!(matches!(err, ConnectionError::Connect { .. }));
    assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
    assert!(!manager.is_connected());
    assert!(manager.in_stream().is_none());
    assert!(manager.out_stream().is_none());
    assert!(!manager.disconnect().unwrap());

    let (_listener, addr) = bind_peer();
    assert!(manager.set_endpoint("127.0.0.1", addr.port()));
    assert!(manager.connect().unwrap());
    assert!(manager.is_connected());

    let stats = manager.stats();
    assert_eq!(stats.connect_failures, 1);
    assert_eq!(stats.connects, 1);
}

/// Test an unresolvable host is reported as a connect failure
#[test]
fn test_unresolvable_host() {
    let manager = ConnectionManager::new("host.invalid", 6742);

    let err = manager.connect().unwrap_err();
    assert_eq!(err.endpoint(), &Endpoint::new("host.invalid", 6742));
    assert!(!manager.is_connected());
}

/// Test state follows alternating connect/disconnect cycles
#[test]
fn test_repeated_cycles() {
    let (listener, addr) = bind_peer();
    let manager = ConnectionManager::new("localhost", addr.port());
    manager.set_endpoint("127.0.0.1", addr.port());

    for _ in 0..5 {
        assert!(manager.connect().unwrap());
        assert!(manager.is_connected());
        let _ = listener.accept().unwrap();
        assert!(manager.disconnect().unwrap());
        assert!(!manager.is_connected());
    }

    let stats = manager.stats();
    assert_eq!(stats.connects, 5);
    assert_eq!(stats.disconnects, 5);
}

/// Test a zero timeout waits on the OS and still connects
#[test]
fn test_zero_timeout_connects() {
    let (_listener, addr) = bind_peer();
    let manager = ConnectionManager::new("127.0.0.1", addr.port());
    manager.set_timeout(Duration::ZERO);

    assert!(manager.connect().unwrap());
}

/// Test a transport that connected but failed setup is closed, not leaked
#[cfg(target_os = "linux")]
#[test]
fn test_setup_failure_after_handshake_closes_transport() {
    let (listener, addr) = bind_peer();
    let manager = ConnectionManager::new("127.0.0.1", addr.port());

    // Linux rejects a zero keepalive idle time after the handshake is done
    manager.set_options(LinkOptions {
        nodelay: true,
        keepalive: Some(Duration::ZERO),
    });

    let err = manager.connect().unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    assert!(!manager.is_connected());
    assert!(manager.in_stream().is_none());
    assert!(manager.out_stream().is_none());

    let (mut peer, _) = listener.accept().unwrap();
    peer.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let mut buf = [0u8; 1];
    assert_eq!(peer.read(&mut buf).unwrap(), 0);

    manager.set_options(LinkOptions::default());
    assert!(manager.connect().unwrap());
}

/// Test disconnect after the peer reset the connection is a clean transition
#[test]
fn test_disconnect_after_peer_reset() {
    let (listener, addr) = bind_peer();
    let manager = ConnectionManager::new("127.0.0.1", addr.port());
    assert!(manager.connect().unwrap());

    // Zero linger makes the close send RST instead of FIN
    let (peer, _) = listener.accept().unwrap();
    socket2::SockRef::from(&peer).set_linger(Some(Duration::ZERO)).unwrap();
    drop(peer);

    let mut input = manager.in_stream().unwrap();
    input.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let mut buf = [0u8; 1];
    let _ = input.read(&mut buf);

    assert!(manager.disconnect().unwrap());
    assert!(!manager.is_connected());
    assert!(manager.in_stream().is_none());
    assert_eq!(manager.stats().close_failures, 0);
    assert!(!manager.disconnect().unwrap());
}

/// Listener with a zero backlog whose accept queue is already full
///
/// Returns the listener and the queued client sockets, which must stay
/// open to keep the queue occupied.
#[cfg(target_os = "linux")]
fn saturated_listener() -> (TcpListener, SocketAddr, Vec<Socket>) {
    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP)).unwrap();
    socket.bind(&SockAddr::from("127.0.0.1:0".parse::<SocketAddr>().unwrap())).unwrap();
    socket.listen(0).unwrap();
    let listener: TcpListener = socket.into();
    let addr = listener.local_addr().unwrap();

    let fillers = (0..4)
        .filter_map(|_| {
            let client = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP)).unwrap();
            client
                .connect_timeout(&SockAddr::from(addr), Duration::from_millis(200))
                .ok()
                .map(|()| client)
        })
        .collect();

    (listener, addr, fillers)
}

/// Test the timeout bounds a connect to a peer that never answers
#[cfg(target_os = "linux")]
#[test]
fn test_timeout_bounds_connect() {
    let (listener, addr, fillers) = saturated_listener();
    assert!(!fillers.is_empty());

    let manager = ConnectionManager::new("127.0.0.1", addr.port());
    manager.set_timeout(Duration::from_millis(300));

    let started = Instant::now();
    let err = manager.connect().unwrap_err();
    let elapsed = started.elapsed();

    assert!(
        matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock),
        "unexpected error kind: {:?}",
        err.kind()
    );
    assert!(elapsed >= Duration::from_millis(250), "returned after {elapsed:?}");
    assert!(elapsed < Duration::from_secs(3), "returned after {elapsed:?}");
    assert!(!manager.is_connected());
    assert!(manager.in_stream().is_none());
    assert!(manager.out_stream().is_none());

    // Free the queue and try again with the same manager
    drop(fillers);
    listener.set_nonblocking(true).unwrap();
    while listener.accept().is_ok() {}
    listener.set_nonblocking(false).unwrap();

    manager.set_timeout(Duration::from_secs(2));
    assert!(manager.connect().unwrap());
    assert!(manager.in_stream().is_some());
}
