//! Derived sensor readings.
//!
//! Every reading returns `0.0` for an unknown robot id. Angles are
//! differences of two normalised angles, folded back once.

use soccer_geom::{normalize_angle, Point};

use super::WorldModel;

impl WorldModel {
    /// Gap between the robot's edge and the ball centre.
    #[must_use]
    pub fn distance_to_ball(&self, id: usize) -> f32 {
        self.robot(id)
            .map_or(0.0, |r| (self.ball - r.position).length() - self.court.robot_radius)
    }

    /// Angle from the robot's heading to the ball.
    #[must_use]
    pub fn ball_angle(&self, id: usize) -> f32 {
        self.robot(id).map_or(0.0, |r| {
            normalize_angle((self.ball - r.position).angle() - r.heading)
        })
    }

    /// Angle between the robot-to-ball line and the ball-to-`target` line.
    ///
    /// Zero means a push straight through the ball would travel towards
    /// `target`.
    #[must_use]
    pub fn target_angle(&self, id: usize, target: Point) -> f32 {
        self.robot(id).map_or(0.0, |r| {
            normalize_angle((target - self.ball).angle() - (self.ball - r.position).angle())
        })
    }

    /// Gap between the robot's edge and its nearest obstacle.
    #[must_use]
    pub fn collision_distance(&self, id: usize) -> f32 {
        self.robot(id)
            .map_or(0.0, |r| (r.obstacle - r.position).length() - self.court.robot_radius)
    }

    /// Angle from the robot's heading to its nearest obstacle.
    #[must_use]
    pub fn obstacle_angle(&self, id: usize) -> f32 {
        self.robot(id).map_or(0.0, |r| {
            normalize_angle((r.obstacle - r.position).angle() - r.heading)
        })
    }

    /// Heading change over the last step.
    #[must_use]
    pub fn spin(&self, id: usize) -> f32 {
        self.robot(id)
            .map_or(0.0, |r| normalize_angle(r.heading - r.previous_heading))
    }
}
