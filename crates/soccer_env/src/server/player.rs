//! # Player Slots
//!
//! One accepted controller connection per robot id.
//!
//! ## Design
//!
//! - The slot index is the robot id sent during the handshake
//! - A parked slot has acted this turn and waits for the pushed status
//! - Parked slots are not polled, so a player cannot act twice per turn

use crate::error::ConnResult;
use crate::protocol::{send_record, RobotStatus};
use crate::transport::StreamConnection;
use crate::world::WorldModel;

/// A connected player.
#[derive(Debug)]
pub(crate) struct PlayerSlot {
    /// Robot id.
    pub id: usize,
    /// Link to the player's session.
    pub connection: StreamConnection,
    /// Acted this turn, waiting for the step.
    pub parked: bool,
}

impl PlayerSlot {
    pub fn new(id: usize, connection: StreamConnection) -> Self {
        Self {
            id,
            connection,
            parked: false,
        }
    }

    #[inline]
    pub const fn is_connected(&self) -> bool {
        self.connection.is_open()
    }

    /// Robot count, then the court in half extents.
    pub fn send_world_description(&mut self, world: &WorldModel) -> ConnResult<()> {
        let court = world.court();
        send_record(&mut self.connection, &wire_count(world))?;
        for value in [
            court.robot_radius,
            court.half_width,
            court.half_height,
            court.goal_half_length,
            court.goal_depth,
        ] {
            send_record(&mut self.connection, &value)?;
        }
        Ok(())
    }

    /// Ball, robot count, every robot, both scores.
    pub fn send_match_status(&mut self, world: &WorldModel) -> ConnResult<()> {
        send_record(&mut self.connection, &world.ball())?;
        send_record(&mut self.connection, &wire_count(world))?;
        for status in world.robot_statuses() {
            send_record(&mut self.connection, &status)?;
        }
        self.send_scores(world)
    }

    pub fn send_ball(&mut self, world: &WorldModel) -> ConnResult<()> {
        send_record(&mut self.connection, &world.ball())
    }

    /// The player's own robot.
    pub fn send_robot(&mut self, world: &WorldModel) -> ConnResult<()> {
        let status = world.robot(self.id).map(RobotStatus::from).unwrap_or_default();
        send_record(&mut self.connection, &status)
    }

    pub fn send_scores(&mut self, world: &WorldModel) -> ConnResult<()> {
        let [left, right] = world.scores();
        send_record(&mut self.connection, &left)?;
        send_record(&mut self.connection, &right)
    }
}

/// Roster sizes are capped by configuration, far below `i32::MAX`.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn wire_count(world: &WorldModel) -> i32 {
    world.robot_count() as i32
}
