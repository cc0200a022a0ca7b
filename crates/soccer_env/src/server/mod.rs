//! # Match Server
//!
//! Owns the authoritative [`WorldModel`] and serves it to one
//! [`MatchSession`](crate::client::MatchSession) per robot.
//!
//! ## Loop
//!
//! ```text
//! accept player 0 --> send id 0
//! accept player 1 --> send id 1
//! loop:
//!   for each unparked player:
//!     readable within poll interval? -> read command -> answer
//!     Act: world.act(id, l, r), park the player
//!   barrier complete -> push status to every parked player, unpark
//! until max_turns, a stop request or a player leaves
//! ```
//!
//! ## Design
//!
//! - Single-threaded; players are polled in id order
//! - A player that breaks the protocol or disconnects ends the match
//! - Status is only pushed after the step, so both players see the same turn

mod player;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::MatchConfig;
use crate::error::{ConnError, ServerError, ServerResult};
use crate::protocol::{receive_record, send_record, ClientCommand};
use crate::transport::StreamConnection;
use crate::world::WorldModel;
use player::PlayerSlot;

/// Final state of a finished match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatchSummary {
    /// Completed steps.
    pub turns: u64,
    /// Goals scored at the left and right goal.
    pub scores: [i32; 2],
    /// Faults reported by the simulator.
    pub fault_count: u32,
    /// Ball-out events reported by the simulator.
    pub ball_out_count: u32,
}

/// The match server.
pub struct MatchServer {
    /// Configuration.
    config: MatchConfig,
    /// Listening socket.
    listener: StreamConnection,
    /// Accepted players, indexed by robot id.
    players: Vec<PlayerSlot>,
    /// Authoritative world.
    world: WorldModel,
    /// Stop request from another thread.
    stop: Arc<AtomicBool>,
}

impl MatchServer {
    /// Builds the world from `config`, attaching the simulator if one is
    /// configured, and places the robots for kick-off.
    ///
    /// # Errors
    ///
    /// Simulator connection or mirroring failures.
    pub fn new(config: MatchConfig) -> ServerResult<Self> {
        let mut world = config.rules.seed.map_or_else(WorldModel::new, WorldModel::with_seed);
        world.set_simulator_timeout(config.network.simulator_timeout());
        world.set_court(config.field.court())?;
        world.create_robots(config.rules.robot_count)?;

        if let Some(host) = &config.network.simulator_host {
            world.connect_simulator_on(host, config.network.simulator_port)?;
        }
        world.restart()?;

        Ok(Self {
            config,
            listener: StreamConnection::new(),
            players: Vec::new(),
            world,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Starts listening and returns the bound port.
    ///
    /// # Errors
    ///
    /// [`ConnError::Listen`] if the port is taken.
    pub fn bind(&mut self) -> ServerResult<u16> {
        let network = &self.config.network;
        self.listener.listen(network.server_port, network.backlog)?;
        let port = self
            .listener
            .local_addr()
            .map_or(network.server_port, |addr| addr.port());
        tracing::info!("match server listening on port {}", port);
        Ok(port)
    }

    /// Flag that ends [`MatchServer::run`] at the next poll when set.
    #[must_use]
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Read access to the authoritative world.
    #[must_use]
    pub const fn world(&self) -> &WorldModel {
        &self.world
    }

    /// Mutable access, for hooks and manual placement before the match.
    pub fn world_mut(&mut self) -> &mut WorldModel {
        &mut self.world
    }

    /// Accepts one player per robot and sends each its id.
    ///
    /// # Errors
    ///
    /// Accept or send failures. Already accepted players are kept.
    pub fn accept_players(&mut self) -> ServerResult<()> {
        if !self.listener.is_open() {
            self.bind()?;
        }
        while self.players.len() < self.world.robot_count() {
            let id = self.players.len();
            let mut connection = self.listener.accept()?;
            let wire_id = i32::try_from(id)
                .map_err(|_| ConnError::InvalidArgument("player id out of range"))?;
            send_record(&mut connection, &wire_id)?;
            tracing::info!("player {} joined from {:?}", id, connection.peer_addr());
            self.players.push(PlayerSlot::new(id, connection));
        }
        Ok(())
    }

    /// Accepts the players if needed and plays until the turn limit, a stop
    /// request or a player leaving.
    ///
    /// # Errors
    ///
    /// Only listener failures. Player failures end the match normally.
    pub fn run(&mut self) -> ServerResult<MatchSummary> {
        self.accept_players()?;
        tracing::info!("kick-off with {} players", self.players.len());

        while !self.stop.load(Ordering::Relaxed) && !self.turn_limit_reached() {
            for slot in 0..self.players.len() {
                if let Err(e) = self.serve(slot) {
                    tracing::warn!("dropping player {}: {}", slot, e);
                    self.players[slot].connection.close();
                }
            }
            if let Some(gone) = self.players.iter().find(|p| !p.is_connected()) {
                tracing::info!("player {} left, match over", gone.id);
                break;
            }
        }

        for player in &mut self.players {
            player.connection.close();
        }
        let summary = self.summary();
        tracing::info!(
            "match finished after {} turns, scores {:?}",
            summary.turns,
            summary.scores
        );
        Ok(summary)
    }

    /// Current totals.
    #[must_use]
    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            turns: self.world.turns(),
            scores: self.world.scores(),
            fault_count: self.world.fault_count(),
            ball_out_count: self.world.ball_out_count(),
        }
    }

    fn turn_limit_reached(&self) -> bool {
        let max = self.config.rules.max_turns;
        max > 0 && self.world.turns() >= max
    }

    fn command_timeout(&self) -> Option<Duration> {
        Some(self.config.network.handshake_timeout())
    }

    /// Answers at most one command from `slot`.
    fn serve(&mut self, slot: usize) -> ServerResult<()> {
        let poll = Some(self.config.network.poll_interval());
        let timeout = self.command_timeout();
        let player = &mut self.players[slot];
        if player.parked || !player.is_connected() {
            return Ok(());
        }
        if !player.connection.wait_readable(poll)? {
            return Ok(());
        }

        let code: i32 = receive_record(&mut player.connection, timeout)?;
        let command = ClientCommand::try_from(code).map_err(|code| ServerError::Protocol {
            player: slot,
            reason: format!("unknown command {code}"),
        })?;
        tracing::trace!("player {} sent {:?}", slot, command);

        match command {
            ClientCommand::GetWorld => player.send_world_description(&self.world)?,
            ClientCommand::GetMatchStatus => player.send_match_status(&self.world)?,
            ClientCommand::GetBall => player.send_ball(&self.world)?,
            ClientCommand::GetRobot => player.send_robot(&self.world)?,
            ClientCommand::GetScore => player.send_scores(&self.world)?,
            ClientCommand::Ack => {}
            ClientCommand::Act => self.receive_action(slot)?,
        }
        Ok(())
    }

    /// Reads `id, left, right`, records the action and parks the player.
    fn receive_action(&mut self, slot: usize) -> ServerResult<()> {
        let timeout = self.command_timeout();
        let player = &mut self.players[slot];
        let id: i32 = receive_record(&mut player.connection, timeout)?;
        let left: f32 = receive_record(&mut player.connection, timeout)?;
        let right: f32 = receive_record(&mut player.connection, timeout)?;

        if usize::try_from(id).ok() != Some(slot) {
            return Err(ServerError::Protocol {
                player: slot,
                reason: format!("acted for robot {id}"),
            });
        }

        player.parked = true;
        if self.world.act(slot, left, right) {
            self.release_parked();
        }
        Ok(())
    }

    /// Pushes the new status to every parked player.
    fn release_parked(&mut self) {
        for player in &mut self.players {
            if !player.parked {
                continue;
            }
            player.parked = false;
            if let Err(e) = player.send_match_status(&self.world) {
                tracing::warn!("status push to player {} failed: {}", player.id, e);
                player.connection.close();
            }
        }
    }
}

impl std::fmt::Debug for MatchServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchServer")
            .field("listener", &self.listener.state())
            .field("players", &self.players.len())
            .field("world", &self.world)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RobotStatus;
    use soccer_geom::Point;

    fn config() -> MatchConfig {
        let mut config = MatchConfig::default();
        config.network.server_port = 0;
        config.rules.seed = Some(11);
        config
    }

    fn connect(port: u16) -> StreamConnection {
        let mut conn = StreamConnection::new();
        conn.connect("127.0.0.1", port).unwrap();
        conn
    }

    #[test]
    fn test_new_places_robots_for_kickoff() {
        let server = MatchServer::new(config()).unwrap();
        let world = server.world();
        assert_eq!(world.robot_count(), 2);
        assert_eq!(world.ball(), Point::ZERO);
        assert!(world.robot(0).unwrap().position.x < 0.0);
        assert!(world.robot(1).unwrap().position.x > 0.0);
        assert_eq!(server.summary(), MatchSummary::default());
    }

    #[test]
    fn test_single_player_answers_queries() {
        let mut config = config();
        config.rules.robot_count = 1;
        config.rules.max_turns = 1;
        let mut server = MatchServer::new(config).unwrap();
        let port = server.bind().unwrap();

        let peer = std::thread::spawn(move || {
            let mut conn = connect(port);
            let timeout = Some(Duration::from_secs(5));
            let id: i32 = receive_record(&mut conn, timeout).unwrap();

            send_record(&mut conn, &ClientCommand::GetWorld.code()).unwrap();
            let count: i32 = receive_record(&mut conn, timeout).unwrap();
            let radius: f32 = receive_record(&mut conn, timeout).unwrap();
            let half_width: f32 = receive_record(&mut conn, timeout).unwrap();
            for _ in 0..3 {
                let _: f32 = receive_record(&mut conn, timeout).unwrap();
            }

            send_record(&mut conn, &ClientCommand::GetScore.code()).unwrap();
            let left: i32 = receive_record(&mut conn, timeout).unwrap();
            let right: i32 = receive_record(&mut conn, timeout).unwrap();

            send_record(&mut conn, &ClientCommand::Act.code()).unwrap();
            send_record(&mut conn, &0_i32).unwrap();
            send_record(&mut conn, &1.0_f32).unwrap();
            send_record(&mut conn, &1.0_f32).unwrap();
            let ball: Point = receive_record(&mut conn, timeout).unwrap();
            let pushed: i32 = receive_record(&mut conn, timeout).unwrap();
            let robot: RobotStatus = receive_record(&mut conn, timeout).unwrap();
            (id, count, radius, half_width, [left, right], ball, pushed, robot)
        });

        let summary = server.run().unwrap();
        let (id, count, radius, half_width, scores, ball, pushed, robot) = peer.join().unwrap();

        assert_eq!(id, 0);
        assert_eq!(count, 1);
        assert_eq!(radius, 37.5);
        assert_eq!(half_width, 750.0);
        assert_eq!(scores, [0, 0]);
        assert_eq!(ball, Point::ZERO);
        assert_eq!(pushed, 1);
        assert!(!robot.acted);
        assert_eq!(summary.turns, 1);
    }

    #[test]
    fn test_foreign_action_ends_match() {
        let mut config = config();
        config.rules.robot_count = 1;
        let mut server = MatchServer::new(config).unwrap();
        let port = server.bind().unwrap();

        let peer = std::thread::spawn(move || {
            let mut conn = connect(port);
            let _: i32 = receive_record(&mut conn, Some(Duration::from_secs(5))).unwrap();
            send_record(&mut conn, &ClientCommand::Act.code()).unwrap();
            send_record(&mut conn, &1_i32).unwrap();
            send_record(&mut conn, &0.0_f32).unwrap();
            send_record(&mut conn, &0.0_f32).unwrap();
            conn
        });

        let summary = server.run().unwrap();
        drop(peer.join().unwrap());
        assert_eq!(summary.turns, 0);
    }

    #[test]
    fn test_stop_handle_ends_run() {
        let mut config = config();
        config.rules.robot_count = 1;
        let mut server = MatchServer::new(config).unwrap();
        let port = server.bind().unwrap();
        let stop = server.stop_handle();

        let peer = std::thread::spawn(move || {
            let mut conn = connect(port);
            let _: i32 = receive_record(&mut conn, Some(Duration::from_secs(5))).unwrap();
            stop.store(true, Ordering::Relaxed);
            conn
        });

        let summary = server.run().unwrap();
        drop(peer.join().unwrap());
        assert_eq!(summary.turns, 0);
    }
}
