//! Byte-stream handles over the active connection
//!
//! Both handles share the manager's socket. Once the manager disconnects,
//! the socket is shut down and any handle still held by a caller sees EOF
//! on read and an error on write.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;

/// Readable side of the connection
#[derive(Debug, Clone)]
pub struct InStream {
    inner: Arc<TcpStream>,
}

impl InStream {
    pub(crate) fn new(inner: Arc<TcpStream>) -> Self {
        Self { inner }
    }

    /// Bound blocking reads (None blocks indefinitely)
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.inner.set_read_timeout(timeout)
    }

    /// Remote address of the connection
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.inner.peer_addr()
    }
}

impl Read for InStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&*self.inner).read(buf)
    }
}

/// Writable side of the connection
#[derive(Debug, Clone)]
pub struct OutStream {
    inner: Arc<TcpStream>,
}

impl OutStream {
    pub(crate) fn new(inner: Arc<TcpStream>) -> Self {
        Self { inner }
    }

    /// Bound blocking writes (None blocks indefinitely)
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.inner.set_write_timeout(timeout)
    }

    /// Remote address of the connection
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.inner.peer_addr()
    }
}

impl Write for OutStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self.inner).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self.inner).flush()
    }
}
