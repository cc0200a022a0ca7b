//! # Error Types
//!
//! All errors that can occur in the match environment.
//!
//! ## Taxonomy
//!
//! - **Connection**: resolution, refused connect, bind/listen, accept
//! - **Protocol**: short record, roster mismatch, invalid id
//! - **Timeout**: a receive ran out of time, the peer may still answer
//!
//! Bind and listen failures are fatal for the enclosing operation.
//! Everything else on the connection side is reported and left to the caller.

use std::io;

use thiserror::Error;

/// Errors raised by a [`StreamConnection`](crate::transport::StreamConnection)
/// and the record codec.
#[derive(Error, Debug)]
pub enum ConnError {
    /// The host name did not resolve to an IPv4 or IPv6 address.
    #[error("cannot resolve address {host}:{port}")]
    Resolve {
        /// Host that failed to resolve.
        host: String,
        /// Requested port.
        port: u16,
    },

    /// The remote peer refused or dropped the connection attempt.
    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),

    /// Binding or listening on the local port failed.
    #[error("listen on port {port} failed: {source}")]
    Listen {
        /// Port that could not be bound.
        port: u16,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// Accepting a pending connection failed.
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// `accept` was called on a connection that is not listening.
    #[error("connection is not listening")]
    NotListening,

    /// Data transfer was attempted on a connection without a peer.
    #[error("connection is not open")]
    NotConnected,

    /// The receive deadline elapsed before enough data arrived.
    #[error("receive timed out")]
    Timeout,

    /// The peer closed the stream or the socket failed; the connection is now closed.
    #[error("connection closed by peer")]
    Closed,

    /// A record arrived incomplete.
    #[error("short read: expected {expected} bytes, got {received}")]
    ShortRead {
        /// Record size.
        expected: usize,
        /// Bytes actually read before the deadline.
        received: usize,
    },

    /// Writing to the socket failed.
    #[error("send failed: {0}")]
    Send(#[source] io::Error),

    /// Socket option or query failed.
    #[error("socket error: {0}")]
    Io(#[from] io::Error),

    /// A caller-supplied argument was out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

impl ConnError {
    /// True for errors the caller may retry or ignore: failed connects,
    /// failed accepts and timeouts. Bind/listen failures are not.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Resolve { .. }
                | Self::Connect(_)
                | Self::Accept(_)
                | Self::Timeout
                | Self::InvalidArgument(_)
        )
    }

    /// True if the error only means "nothing arrived in time".
    #[inline]
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// Result type for connection operations.
pub type ConnResult<T> = Result<T, ConnError>;

/// Errors raised by the [`WorldModel`](crate::world::WorldModel).
#[derive(Error, Debug)]
pub enum WorldError {
    /// A roster of zero robots was requested.
    #[error("robot roster must not be empty")]
    EmptyRoster,

    /// Robot id outside the roster.
    #[error("invalid robot id {0}")]
    InvalidRobotId(usize),

    /// A simulator operation was requested with no simulator attached.
    #[error("no simulator attached")]
    NotMirrored,

    /// The simulator reports a different number of robots than the roster holds.
    #[error("roster mismatch: expected {expected} robots, simulator has {received}")]
    RosterMismatch {
        /// Local roster size.
        expected: usize,
        /// Count received from the simulator.
        received: i32,
    },

    /// The simulator answered an unknown event code.
    #[error("unknown simulator event {0}")]
    UnknownEvent(i32),

    /// Transport failure while mirroring.
    #[error(transparent)]
    Transport(#[from] ConnError),
}

/// Result type for world model operations.
pub type WorldResult<T> = Result<T, WorldError>;

/// Errors raised by a [`MatchSession`](crate::client::MatchSession).
#[derive(Error, Debug)]
pub enum SessionError {
    /// The session has not completed its handshake.
    #[error("session is not ready")]
    NotReady,

    /// The connection is not a client connection.
    #[error("session connection is not a client connection")]
    NotClient,

    /// The server assigned an id outside `{0, 1}`.
    #[error("server assigned invalid robot id {0}")]
    InvalidId(i32),

    /// The server announced a roster that cannot be created.
    #[error("server announced invalid robot count {0}")]
    InvalidRoster(i32),

    /// The status robot count differs from the roster.
    #[error("roster mismatch: expected {expected} robots, server sent {received}")]
    RosterMismatch {
        /// Local roster size.
        expected: usize,
        /// Count received from the server.
        received: i32,
    },

    /// A receive kept timing out.
    #[error("gave up waiting for {what} after {retries} timeouts")]
    RetriesExhausted {
        /// What the session was waiting for.
        what: &'static str,
        /// Timeouts tolerated before giving up.
        retries: u32,
    },

    /// Transport failure.
    #[error(transparent)]
    Transport(#[from] ConnError),

    /// World model failure.
    #[error(transparent)]
    World(#[from] WorldError),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised by the [`MatchServer`](crate::server::MatchServer).
#[derive(Error, Debug)]
pub enum ServerError {
    /// Transport failure on the listening socket.
    #[error(transparent)]
    Transport(#[from] ConnError),

    /// World model failure.
    #[error(transparent)]
    World(#[from] WorldError),

    /// A player sent something the server cannot interpret.
    #[error("protocol violation from player {player}: {reason}")]
    Protocol {
        /// Player slot.
        player: usize,
        /// What went wrong.
        reason: String,
    },
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config: {0}")]
    Io(#[from] io::Error),

    /// The file is not valid TOML for [`MatchConfig`](crate::config::MatchConfig).
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config value: {0}")]
    Invalid(String),
}
