//! Per-robot state.

use serde::Serialize;
use soccer_geom::{normalize_angle, Point};

use crate::protocol::RobotStatus;

/// One robot on the court.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct RobotState {
    /// Roster index.
    pub id: usize,
    /// Centre position in millimetres.
    pub position: Point,
    /// Heading in radians, `(-PI, PI]`.
    pub heading: f32,
    /// Position before the last step.
    pub previous_position: Point,
    /// Heading before the last step.
    pub previous_heading: f32,
    /// Nearest obstacle point found by the last search.
    pub obstacle: Point,
    /// Left wheel force.
    pub left_force: f32,
    /// Right wheel force.
    pub right_force: f32,
    /// Action pending for the current turn.
    pub acted: bool,
}

impl RobotState {
    /// Creates a robot at the origin.
    #[must_use]
    pub fn new(id: usize) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Remembers the current pose as the previous pose.
    #[inline]
    pub(crate) fn remember_pose(&mut self) {
        self.previous_position = self.position;
        self.previous_heading = self.heading;
    }

    /// One differential-drive step without a simulator.
    ///
    /// ```text
    /// speed    = right + left
    /// heading += (right - left) / 20
    /// position += speed * radius * (cos, sin)(heading) / 10
    /// ```
    pub(crate) fn step_local(&mut self, robot_radius: f32) {
        self.remember_pose();
        let speed = self.right_force + self.left_force;
        self.heading = normalize_angle(self.heading + (self.right_force - self.left_force) / 2.0 / 10.0);
        self.position += Point::from_angle(self.heading) * (speed * robot_radius / 10.0);
    }

    /// Copies a status record received from the match server.
    pub(crate) fn apply_status(&mut self, status: &RobotStatus) {
        self.position = status.position;
        self.heading = status.heading;
        self.previous_position = status.previous_position;
        self.previous_heading = status.previous_heading;
        self.obstacle = status.obstacle;
        self.left_force = status.forces[0];
        self.right_force = status.forces[1];
        self.acted = status.acted;
    }
}

impl From<&RobotState> for RobotStatus {
    fn from(robot: &RobotState) -> Self {
        Self {
            position: robot.position,
            heading: robot.heading,
            previous_position: robot.previous_position,
            previous_heading: robot.previous_heading,
            obstacle: robot.obstacle,
            forces: [robot.left_force, robot.right_force],
            acted: robot.acted,
        }
    }
}
