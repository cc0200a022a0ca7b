//! # Transport Layer
//!
//! Blocking TCP stream with an explicit four-state lifecycle.
//!
//! ## Design
//!
//! - One socket per [`StreamConnection`], owned by the state it is in
//! - Receives take an `Option<Duration>`: `None` blocks, `Some(ZERO)` polls
//! - End of stream or a socket error on receive closes the connection
//! - Send failures leave the connection open for the caller to decide
//!
//! ```text
//!             connect            listen
//!   Client <----------- Closed -----------> Server
//!      |                  ^                    |
//!      |     close / EOF  |        accept      v
//!      +------------------+-------------- Remote (new connection)
//! ```

mod library;

pub use library::live_connections;

use std::io::{self, Read, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{ConnError, ConnResult};
use library::LibraryGuard;

/// Connection lifecycle state.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No socket.
    #[default]
    Closed = 0,
    /// Listening for incoming connections.
    Server = 1,
    /// Connected to a server.
    Client = 2,
    /// Accepted from a listening connection.
    Remote = 3,
}

/// Transfer statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransportStats {
    /// Bytes sent.
    pub bytes_sent: u64,
    /// Bytes received.
    pub bytes_received: u64,
    /// Send errors.
    pub send_errors: u64,
    /// Receives that ran out of time.
    pub timeouts: u64,
}

#[derive(Debug)]
enum Endpoint {
    Closed,
    Server(TcpListener),
    Client(TcpStream),
    Remote(TcpStream),
}

/// One TCP connection in one of the four [`ConnectionState`]s.
#[derive(Debug)]
pub struct StreamConnection {
    endpoint: Endpoint,
    stats: TransportStats,
    _library: LibraryGuard,
}

impl StreamConnection {
    /// Creates a closed connection.
    #[must_use]
    pub fn new() -> Self {
        Self::with_endpoint(Endpoint::Closed)
    }

    fn with_endpoint(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            stats: TransportStats::default(),
            _library: LibraryGuard::acquire(),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        match self.endpoint {
            Endpoint::Closed => ConnectionState::Closed,
            Endpoint::Server(_) => ConnectionState::Server,
            Endpoint::Client(_) => ConnectionState::Client,
            Endpoint::Remote(_) => ConnectionState::Remote,
        }
    }

    /// True unless the connection is closed.
    #[inline]
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self.endpoint, Endpoint::Closed)
    }

    /// Returns statistics.
    #[must_use]
    pub const fn stats(&self) -> &TransportStats {
        &self.stats
    }

    /// Resolves a host name or dotted address, preferring IPv4.
    ///
    /// # Errors
    ///
    /// [`ConnError::Resolve`] if the host has no usable address.
    pub fn resolve_address(host: &str, port: u16) -> ConnResult<SocketAddr> {
        let resolve_error = || ConnError::Resolve {
            host: host.to_owned(),
            port,
        };
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|_| resolve_error())?
            .collect();
        addrs
            .iter()
            .find(|a| a.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(resolve_error)
    }

    /// Connects to a server. Any current socket is closed first.
    ///
    /// # Errors
    ///
    /// Resolution and refused connections are reported and leave the
    /// connection closed.
    pub fn connect(&mut self, host: &str, port: u16) -> ConnResult<()> {
        self.close();
        let addr = Self::resolve_address(host, port)?;
        let stream = TcpStream::connect(addr).map_err(ConnError::Connect)?;
        // Records are tiny and strictly request/response.
        stream.set_nodelay(true)?;
        tracing::debug!("connected to {}", addr);
        self.endpoint = Endpoint::Client(stream);
        Ok(())
    }

    /// Listens on `port` on every interface. Any current socket is closed first.
    ///
    /// `backlog` must be positive. The standard library applies its own
    /// backlog, so the value is only validated.
    ///
    /// # Errors
    ///
    /// [`ConnError::Listen`] if the port cannot be bound. This is not
    /// recoverable.
    pub fn listen(&mut self, port: u16, backlog: u32) -> ConnResult<()> {
        self.close();
        if backlog == 0 {
            return Err(ConnError::InvalidArgument("listen backlog must be positive"));
        }
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .map_err(|source| ConnError::Listen { port, source })?;
        tracing::debug!("listening on {:?}", listener.local_addr().ok());
        self.endpoint = Endpoint::Server(listener);
        Ok(())
    }

    /// Blocks until a peer connects and returns it in the
    /// [`ConnectionState::Remote`] state.
    ///
    /// # Errors
    ///
    /// [`ConnError::NotListening`] unless `self` is a server.
    pub fn accept(&self) -> ConnResult<Self> {
        let Endpoint::Server(listener) = &self.endpoint else {
            return Err(ConnError::NotListening);
        };
        let (stream, addr) = listener.accept().map_err(ConnError::Accept)?;
        stream.set_nodelay(true)?;
        tracing::debug!("accepted {}", addr);
        Ok(Self::with_endpoint(Endpoint::Remote(stream)))
    }

    /// Closes the connection. Always legal.
    pub fn close(&mut self) {
        let previous = std::mem::replace(&mut self.endpoint, Endpoint::Closed);
        match previous {
            Endpoint::Closed => {}
            Endpoint::Client(stream) | Endpoint::Remote(stream) => {
                let _ = stream.shutdown(std::net::Shutdown::Both);
                tracing::debug!("connection closed");
            }
            Endpoint::Server(_) => tracing::debug!("listener closed"),
        }
    }

    fn stream(&self) -> ConnResult<&TcpStream> {
        match &self.endpoint {
            Endpoint::Client(stream) | Endpoint::Remote(stream) => Ok(stream),
            _ => Err(ConnError::NotConnected),
        }
    }

    /// Writes all of `bytes`.
    ///
    /// # Errors
    ///
    /// [`ConnError::Send`] on a short or failed write. The connection stays open.
    pub fn send(&mut self, bytes: &[u8]) -> ConnResult<()> {
        let mut stream = self.stream()?;
        match stream.write_all(bytes) {
            Ok(()) => {
                self.stats.bytes_sent += bytes.len() as u64;
                Ok(())
            }
            Err(e) => {
                self.stats.send_errors += 1;
                Err(ConnError::Send(e))
            }
        }
    }

    /// Receives up to `buf.len()` bytes, waiting at most `timeout`.
    ///
    /// Returns the number of bytes read, which may be fewer than requested.
    ///
    /// # Errors
    ///
    /// - [`ConnError::Timeout`] if nothing arrived in time
    /// - [`ConnError::Closed`] on end of stream or socket failure; the
    ///   connection is closed afterwards
    pub fn receive(&mut self, buf: &mut [u8], timeout: Option<Duration>) -> ConnResult<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let result = {
            let mut stream = self.stream()?;
            arm_timeout(stream, timeout).and_then(|()| {
                let read = stream.read(buf);
                disarm_timeout(stream, timeout)?;
                read
            })
        };
        match result {
            Ok(0) => {
                tracing::debug!("peer closed the stream");
                self.close();
                Err(ConnError::Closed)
            }
            Ok(n) => {
                self.stats.bytes_received += n as u64;
                Ok(n)
            }
            Err(e) if is_timeout(&e) => {
                self.stats.timeouts += 1;
                Err(ConnError::Timeout)
            }
            Err(e) => {
                tracing::warn!("receive failed, closing: {}", e);
                self.close();
                Err(ConnError::Closed)
            }
        }
    }

    /// Waits until data (or end of stream) is available without consuming it.
    ///
    /// # Errors
    ///
    /// [`ConnError::Closed`] if the socket failed while waiting.
    pub fn wait_readable(&mut self, timeout: Option<Duration>) -> ConnResult<bool> {
        let mut probe = [0u8; 1];
        let result = {
            let stream = self.stream()?;
            arm_timeout(stream, timeout).and_then(|()| {
                let peeked = stream.peek(&mut probe);
                disarm_timeout(stream, timeout)?;
                peeked
            })
        };
        match result {
            Ok(_) => Ok(true),
            Err(e) if is_timeout(&e) => Ok(false),
            Err(e) => {
                tracing::warn!("poll failed, closing: {}", e);
                self.close();
                Err(ConnError::Closed)
            }
        }
    }

    /// Enables or disables Nagle's algorithm.
    ///
    /// # Errors
    ///
    /// [`ConnError::NotConnected`] without a peer.
    pub fn set_nodelay(&self, nodelay: bool) -> ConnResult<()> {
        Ok(self.stream()?.set_nodelay(nodelay)?)
    }

    /// Local socket address, if open.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.endpoint {
            Endpoint::Closed => None,
            Endpoint::Server(listener) => listener.local_addr().ok(),
            Endpoint::Client(stream) | Endpoint::Remote(stream) => stream.local_addr().ok(),
        }
    }

    /// Remote socket address, if connected.
    #[must_use]
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream().ok().and_then(|s| s.peer_addr().ok())
    }
}

impl Default for StreamConnection {
    fn default() -> Self {
        Self::new()
    }
}

fn arm_timeout(stream: &TcpStream, timeout: Option<Duration>) -> io::Result<()> {
    match timeout {
        Some(d) if d.is_zero() => stream.set_nonblocking(true),
        other => stream.set_read_timeout(other),
    }
}

fn disarm_timeout(stream: &TcpStream, timeout: Option<Duration>) -> io::Result<()> {
    match timeout {
        Some(d) if d.is_zero() => stream.set_nonblocking(false),
        _ => Ok(()),
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}
