//! # Soccer Env - Robot Soccer Match Environment
//!
//! Everything a two-robot soccer match needs between the controllers and the
//! physics.
//!
//! ## Architecture
//!
//! - **Transport**: blocking TCP stream with a four-state lifecycle
//! - **Protocol**: fixed-layout little-endian records for both channels
//! - **World**: authoritative match state behind a turn barrier
//! - **Client**: a controller's session against the match server
//! - **Server**: the match server that owns the world and serves players
//!
//! ## Channels
//!
//! ```text
//! CONTROLLER                MATCH SERVER                 PHI SIMULATOR
//!  MatchSession  <--tcp-->   MatchServer                  (optional)
//!   mm, radians,             WorldModel  <--tcp:12561-->  cm, degrees,
//!   f32 records              turn barrier                 f64 records
//! ```
//!
//! Without a simulator the world model steps its own differential-drive
//! physics.
//!
//! ## Example
//!
//! ```rust,ignore
//! use soccer_env::MatchSession;
//!
//! let mut session = MatchSession::new();
//! session.connect("127.0.0.1", 4000)?;
//! while session.is_ready() {
//!     let turn = session.ball_angle().clamp(-1.0, 1.0);
//!     session.act(1.0 - turn, 1.0 + turn)?;
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod transport;
pub mod world;

// Re-exports for convenience
pub use client::{MatchSession, SessionPhase};
pub use config::{FieldConfig, MatchConfig, NetworkConfig, RulesConfig, SessionConfig};
pub use error::{
    ConfigError, ConnError, ConnResult, ServerError, ServerResult, SessionError, SessionResult,
    WorldError, WorldResult,
};
pub use protocol::{ClientCommand, RobotStatus, SimEvent, SIMULATOR_PORT};
pub use server::{MatchServer, MatchSummary};
pub use transport::{ConnectionState, StreamConnection};
pub use world::{Court, RobotState, WorldModel};

/// Default match-server port.
pub const DEFAULT_SERVER_PORT: u16 = 4000;
