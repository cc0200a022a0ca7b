//! # Match Client Session
//!
//! One controller's view of a match served by a
//! [`MatchServer`](crate::server::MatchServer).
//!
//! ## Handshake
//!
//! ```text
//! CLIENT                                   SERVER
//!   |--- connect ---------------------------->|
//!   |<-- id: i32 (0 or 1) --------------------|   AwaitingId
//!   |--- GetWorld --------------------------->|
//!   |<-- count i32, radius, w/2, h/2, gl/2, depth (f32)   AwaitingWorldDescription
//!   |--- GetMatchStatus --------------------->|
//!   |<-- ball, count, RobotStatus x n, score x 2  ---> Ready
//! ```
//!
//! ## Turn
//!
//! `act` sends `Act, id, left, right` and waits for the status the server
//! pushes once every player has acted.
//!
//! Any failure closes the connection. The session never exposes a
//! half-finished handshake: until `connect` succeeds every accessor reads
//! zero.

use std::time::Duration;

use soccer_geom::Point;

use crate::config::SessionConfig;
use crate::error::{ConnError, SessionError, SessionResult};
use crate::protocol::{receive_record, send_record, ClientCommand, RobotStatus, WireRecord};
use crate::transport::{ConnectionState, StreamConnection};
use crate::world::{Court, RobotState, WorldModel};

/// Session lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionPhase {
    /// Never connected.
    #[default]
    Unconnected,
    /// Connected, waiting for the player id.
    AwaitingId,
    /// Waiting for the world description and the first status.
    AwaitingWorldDescription,
    /// Handshake complete.
    Ready,
    /// Failed or disconnected.
    Closed,
}

/// A controller's connection to the match server.
#[derive(Debug)]
pub struct MatchSession {
    /// Match-server link.
    connection: StreamConnection,
    /// Mirror of the server's world.
    world: WorldModel,
    /// Assigned robot id, set when the handshake completes.
    own_id: Option<usize>,
    /// Lifecycle.
    phase: SessionPhase,
    /// Timeouts.
    config: SessionConfig,
}

impl MatchSession {
    /// Creates an unconnected session with default timeouts.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Creates an unconnected session.
    #[must_use]
    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            connection: StreamConnection::new(),
            world: WorldModel::new(),
            own_id: None,
            phase: SessionPhase::Unconnected,
            config,
        }
    }

    /// Connects and runs the whole handshake.
    ///
    /// # Errors
    ///
    /// Refused connections, an id outside `{0, 1}`, an unusable roster,
    /// repeated timeouts or a lost connection. The session is closed
    /// afterwards.
    pub fn connect(&mut self, host: &str, port: u16) -> SessionResult<()> {
        self.own_id = None;
        self.world.destroy_robots();
        self.phase = SessionPhase::Unconnected;

        tracing::info!("connecting to match server {}:{}", host, port);
        match self.handshake(host, port) {
            Ok(id) => {
                self.own_id = Some(id);
                self.phase = SessionPhase::Ready;
                tracing::info!("session ready as player {}", id);
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn handshake(&mut self, host: &str, port: u16) -> SessionResult<usize> {
        self.connection.connect(host, port)?;
        self.phase = SessionPhase::AwaitingId;

        let raw_id: i32 = self.receive_patiently("player id", true)?;
        let id = usize::try_from(raw_id)
            .ok()
            .filter(|&id| id < 2)
            .ok_or(SessionError::InvalidId(raw_id))?;

        self.phase = SessionPhase::AwaitingWorldDescription;
        tracing::debug!("player id {}, requesting world description", id);
        send_record(&mut self.connection, &ClientCommand::GetWorld.code())?;

        let raw_count: i32 = self.receive_patiently("world description", true)?;
        let robot_radius: f32 = self.receive_next()?;
        let half_width: f32 = self.receive_next()?;
        let half_height: f32 = self.receive_next()?;
        let goal_half_length: f32 = self.receive_next()?;
        let goal_depth: f32 = self.receive_next()?;

        let count = usize::try_from(raw_count)
            .ok()
            .filter(|&count| count > id)
            .ok_or(SessionError::InvalidRoster(raw_count))?;

        self.world.set_court(Court {
            half_width,
            half_height,
            goal_half_length,
            goal_depth,
            robot_radius,
        })?;
        self.world.create_robots(count)?;

        self.receive_status(true, true)?;
        Ok(id)
    }

    /// Closes the session.
    pub fn disconnect(&mut self) {
        self.connection.close();
        self.phase = SessionPhase::Closed;
    }

    /// Submits this turn's wheel forces and waits for the resulting status.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotReady`] before the handshake,
    /// [`SessionError::NotClient`] without a live connection, or any status
    /// failure (which closes the session).
    pub fn act(&mut self, left_force: f32, right_force: f32) -> SessionResult<()> {
        let id = self.ready_id()?;
        if self.connection.state() != ConnectionState::Client {
            return Err(SessionError::NotClient);
        }
        let sent = self.send_action(id, left_force, right_force);
        if let Err(e) = sent {
            return Err(self.fail(e));
        }
        self.pull_match_status(false)
    }

    fn send_action(&mut self, id: usize, left_force: f32, right_force: f32) -> SessionResult<()> {
        let conn = &mut self.connection;
        let id = i32::try_from(id).map_err(|_| SessionError::NotReady)?;
        send_record(conn, &ClientCommand::Act.code())?;
        send_record(conn, &id)?;
        send_record(conn, &left_force)?;
        send_record(conn, &right_force)?;
        Ok(())
    }

    /// Refreshes the world from the server. With `ask` the status is
    /// requested first, otherwise the server is expected to push it.
    ///
    /// Waits as long as the rival needs: timeouts before the first record
    /// are retried until the connection is lost.
    ///
    /// # Errors
    ///
    /// Any failure closes the session.
    pub fn pull_match_status(&mut self, ask: bool) -> SessionResult<()> {
        self.ready_id()?;
        if self.connection.state() != ConnectionState::Client {
            return Err(SessionError::NotClient);
        }
        match self.receive_status(ask, false) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn receive_status(&mut self, ask: bool, bounded: bool) -> SessionResult<()> {
        if ask {
            send_record(&mut self.connection, &ClientCommand::GetMatchStatus.code())?;
        }

        let ball: Point = self.receive_patiently("match status", bounded)?;
        let raw_count: i32 = self.receive_next()?;
        let expected = self.world.robot_count();
        if usize::try_from(raw_count).ok() != Some(expected) {
            return Err(SessionError::RosterMismatch {
                expected,
                received: raw_count,
            });
        }

        let mut robots = Vec::with_capacity(expected);
        for _ in 0..expected {
            robots.push(self.receive_next::<RobotStatus>()?);
        }
        let left_score: i32 = self.receive_next()?;
        let right_score: i32 = self.receive_next()?;

        self.world.apply_status(ball, &robots, [left_score, right_score]);
        Ok(())
    }

    /// Waits for the first record of a message. `bounded` caps the number of
    /// timeouts at the configured retry budget.
    fn receive_patiently<T: WireRecord>(
        &mut self,
        what: &'static str,
        bounded: bool,
    ) -> SessionResult<T> {
        let timeout = Some(self.config.handshake_timeout);
        let mut timeouts = 0;
        loop {
            match receive_record::<T>(&mut self.connection, timeout) {
                Ok(value) => return Ok(value),
                Err(ConnError::Timeout) => {
                    timeouts += 1;
                    if !bounded {
                        tracing::debug!("still waiting for {} ({} timeouts)", what, timeouts);
                        continue;
                    }
                    tracing::warn!("timeout waiting for {} ({}/{})", what, timeouts, self.config.max_timeout_retries);
                    if timeouts > self.config.max_timeout_retries {
                        return Err(SessionError::RetriesExhausted {
                            what,
                            retries: self.config.max_timeout_retries,
                        });
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn receive_next<T: WireRecord>(&mut self) -> SessionResult<T> {
        Ok(receive_record(&mut self.connection, self.config.record_timeout)?)
    }

    fn fail(&mut self, error: SessionError) -> SessionError {
        tracing::error!("session failed: {}", error);
        self.connection.close();
        self.phase = SessionPhase::Closed;
        error
    }

    fn ready_id(&self) -> SessionResult<usize> {
        match (self.phase, self.own_id) {
            (SessionPhase::Ready, Some(id)) => Ok(id),
            _ => Err(SessionError::NotReady),
        }
    }

    /// Own id if the handshake completed and the roster holds it.
    fn bound_id(&self) -> Option<usize> {
        self.own_id.filter(|&id| id < self.world.robot_count())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Assigned robot id.
    #[must_use]
    pub const fn id(&self) -> Option<usize> {
        self.own_id
    }

    /// Lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// True once the handshake completed and the connection is alive.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.phase == SessionPhase::Ready
    }

    /// Read access to the mirrored world.
    #[must_use]
    pub const fn world(&self) -> &WorldModel {
        &self.world
    }

    /// Connection timeouts.
    pub fn set_config(&mut self, config: SessionConfig) {
        self.config = config;
    }

    /// Overrides the handshake timeout.
    pub fn set_handshake_timeout(&mut self, timeout: Duration) {
        self.config.handshake_timeout = timeout;
    }

    /// Ball position.
    #[must_use]
    pub fn ball(&self) -> Point {
        self.world.ball()
    }

    /// Own robot.
    #[must_use]
    pub fn own_robot(&self) -> RobotState {
        self.bound_id()
            .and_then(|id| self.world.robot(id))
            .copied()
            .unwrap_or_default()
    }

    /// Rival robot.
    #[must_use]
    pub fn rival_robot(&self) -> RobotState {
        self.bound_id()
            .and_then(|id| self.world.robot(1 - id))
            .copied()
            .unwrap_or_default()
    }

    /// Centre of the goal this robot attacks.
    #[must_use]
    pub fn own_goal(&self) -> Point {
        self.bound_id().map_or(Point::ZERO, |id| self.world.goals()[1 - id])
    }

    /// Centre of the goal the rival attacks.
    #[must_use]
    pub fn rival_goal(&self) -> Point {
        self.bound_id().map_or(Point::ZERO, |id| self.world.goals()[id])
    }

    /// Goals scored by this robot.
    #[must_use]
    pub fn own_score(&self) -> i32 {
        self.bound_id().map_or(0, |id| self.world.scores()[1 - id])
    }

    /// Goals scored by the rival.
    #[must_use]
    pub fn rival_score(&self) -> i32 {
        self.bound_id().map_or(0, |id| self.world.scores()[id])
    }

    /// Full court width.
    #[must_use]
    pub fn world_width(&self) -> f32 {
        self.world.world_width()
    }

    /// Full court height.
    #[must_use]
    pub fn world_height(&self) -> f32 {
        self.world.world_height()
    }

    /// Full goal mouth length.
    #[must_use]
    pub fn goal_length(&self) -> f32 {
        self.world.goal_length()
    }

    /// Goal depth.
    #[must_use]
    pub fn goal_depth(&self) -> f32 {
        self.world.goal_depth()
    }

    /// Robot radius.
    #[must_use]
    pub fn robot_radius(&self) -> f32 {
        self.world.robot_radius()
    }

    /// See [`WorldModel::distance_to_ball`].
    #[must_use]
    pub fn distance(&self) -> f32 {
        self.bound_id().map_or(0.0, |id| self.world.distance_to_ball(id))
    }

    /// See [`WorldModel::ball_angle`].
    #[must_use]
    pub fn ball_angle(&self) -> f32 {
        self.bound_id().map_or(0.0, |id| self.world.ball_angle(id))
    }

    /// See [`WorldModel::target_angle`].
    #[must_use]
    pub fn target_angle(&self, target: Point) -> f32 {
        self.bound_id().map_or(0.0, |id| self.world.target_angle(id, target))
    }

    /// See [`WorldModel::collision_distance`].
    #[must_use]
    pub fn collision_distance(&self) -> f32 {
        self.bound_id().map_or(0.0, |id| self.world.collision_distance(id))
    }

    /// See [`WorldModel::obstacle_angle`].
    #[must_use]
    pub fn obstacle_angle(&self) -> f32 {
        self.bound_id().map_or(0.0, |id| self.world.obstacle_angle(id))
    }

    /// See [`WorldModel::spin`].
    #[must_use]
    pub fn spin(&self) -> f32 {
        self.bound_id().map_or(0.0, |id| self.world.spin(id))
    }
}

impl Default for MatchSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_are_neutral_before_handshake() {
        let session = MatchSession::new();
        assert_eq!(session.phase(), SessionPhase::Unconnected);
        assert_eq!(session.id(), None);
        assert_eq!(session.own_robot(), RobotState::default());
        assert_eq!(session.rival_robot(), RobotState::default());
        assert_eq!(session.own_goal(), Point::ZERO);
        assert_eq!(session.rival_goal(), Point::ZERO);
        assert_eq!(session.own_score(), 0);
        assert_eq!(session.rival_score(), 0);
        assert_eq!(session.distance(), 0.0);
        assert_eq!(session.target_angle(Point::new(1.0, 1.0)), 0.0);
        assert_eq!(session.spin(), 0.0);
    }

    #[test]
    fn test_act_requires_ready() {
        let mut session = MatchSession::new();
        assert!(matches!(session.act(1.0, 1.0), Err(SessionError::NotReady)));
        assert!(matches!(session.pull_match_status(true), Err(SessionError::NotReady)));
    }

    #[test]
    fn test_refused_connect_closes_session() {
        let port = {
            let mut probe = StreamConnection::new();
            probe.listen(0, 1).unwrap();
            probe.local_addr().unwrap().port()
        };
        let mut session = MatchSession::new();
        let err = session.connect("127.0.0.1", port).unwrap_err();
        assert!(matches!(err, SessionError::Transport(ConnError::Connect(_))));
        assert_eq!(session.phase(), SessionPhase::Closed);
        assert_eq!(session.id(), None);
    }
}
