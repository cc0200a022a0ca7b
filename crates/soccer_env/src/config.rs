//! # Match Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file is a valid configuration.
//!
//! ```toml
//! [field]
//! world_width = 1500.0
//! world_height = 1300.0
//!
//! [network]
//! server_port = 4000
//! simulator_host = "127.0.0.1"
//!
//! [match]
//! max_turns = 5000
//! seed = 42
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::protocol::SIMULATOR_PORT;
use crate::world::Court;

/// Court dimensions in millimetres, full sizes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Court width.
    pub world_width: f32,
    /// Court height.
    pub world_height: f32,
    /// Goal mouth length.
    pub goal_length: f32,
    /// Goal depth.
    pub goal_depth: f32,
    /// Robot radius.
    pub robot_radius: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            world_width: 1500.0,
            world_height: 1300.0,
            goal_length: 400.0,
            goal_depth: 100.0,
            robot_radius: 37.5,
        }
    }
}

impl FieldConfig {
    /// Court in half extents.
    #[must_use]
    pub fn court(&self) -> Court {
        Court::from_full(
            self.world_width,
            self.world_height,
            self.goal_length,
            self.goal_depth,
            self.robot_radius,
        )
    }
}

/// Ports, hosts and timeouts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Match server listening port.
    pub server_port: u16,
    /// Listen backlog.
    pub backlog: u32,
    /// PHI simulator host. Unset means local physics.
    pub simulator_host: Option<String>,
    /// PHI simulator port.
    pub simulator_port: u16,
    /// Wait for each simulator answer.
    pub simulator_timeout_ms: u64,
    /// Wait for the player id and the world description.
    pub handshake_timeout_ms: u64,
    /// Timeouts tolerated before a session gives up.
    pub max_timeout_retries: u32,
    /// How long the server waits on one idle player before moving on.
    pub poll_interval_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            server_port: 4000,
            backlog: 5,
            simulator_host: None,
            simulator_port: SIMULATOR_PORT,
            simulator_timeout_ms: 1000,
            handshake_timeout_ms: 15_000,
            max_timeout_retries: 3,
            poll_interval_ms: 5,
        }
    }
}

impl NetworkConfig {
    /// Simulator answer timeout.
    #[must_use]
    pub const fn simulator_timeout(&self) -> Duration {
        Duration::from_millis(self.simulator_timeout_ms)
    }

    /// Handshake timeout.
    #[must_use]
    pub const fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    /// Server poll interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Match rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Robots on the court, one per player. Players are ids 0 and 1.
    pub robot_count: usize,
    /// Stop after this many steps. Zero plays until the players leave.
    pub max_turns: u64,
    /// Seed for restart positions. Unset draws from the OS.
    pub seed: Option<u64>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            robot_count: 2,
            max_turns: 0,
            seed: None,
        }
    }
}

/// Complete match configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Court.
    pub field: FieldConfig,
    /// Network.
    pub network: NetworkConfig,
    /// Rules.
    #[serde(rename = "match")]
    pub rules: RulesConfig,
}

impl MatchConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Parse errors and out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// I/O, parse errors and out-of-range values.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.field;
        if f.world_width <= 0.0 || f.world_height <= 0.0 {
            return Err(ConfigError::Invalid("court dimensions must be positive".into()));
        }
        if f.robot_radius <= 0.0 {
            return Err(ConfigError::Invalid("robot radius must be positive".into()));
        }
        if f.goal_length < 0.0 || f.goal_length > f.world_height {
            return Err(ConfigError::Invalid("goal length must fit the court height".into()));
        }
        if !(1..=2).contains(&self.rules.robot_count) {
            return Err(ConfigError::Invalid("robot count must be 1 or 2".into()));
        }
        if self.network.backlog == 0 {
            return Err(ConfigError::Invalid("listen backlog must be positive".into()));
        }
        Ok(())
    }
}

/// Client-side timeouts for a [`MatchSession`](crate::client::MatchSession).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Wait for the id, the robot count and the first status field.
    pub handshake_timeout: Duration,
    /// Wait for every record after the first of a message. `None` blocks.
    pub record_timeout: Option<Duration>,
    /// Timeouts tolerated before giving up.
    pub max_timeout_retries: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_millis(15_000),
            record_timeout: None,
            max_timeout_retries: 3,
        }
    }
}

impl From<&NetworkConfig> for SessionConfig {
    fn from(network: &NetworkConfig) -> Self {
        Self {
            handshake_timeout: network.handshake_timeout(),
            record_timeout: None,
            max_timeout_retries: network.max_timeout_retries,
        }
    }
}
