//! Court dimensions.

use serde::{Deserialize, Serialize};
use soccer_geom::{Point, Rect};

/// Static court geometry, stored as half extents.
///
/// The goal mouths open on the left and right walls, centred on `y = 0`,
/// and reach `goal_depth` behind the wall.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Court {
    /// Half of the court width (x).
    pub half_width: f32,
    /// Half of the court height (y).
    pub half_height: f32,
    /// Half of the goal mouth length.
    pub goal_half_length: f32,
    /// Goal depth behind the wall.
    pub goal_depth: f32,
    /// Robot radius.
    pub robot_radius: f32,
}

impl Court {
    /// Builds a court from full dimensions in millimetres.
    #[must_use]
    pub fn from_full(
        world_width: f32,
        world_height: f32,
        goal_length: f32,
        goal_depth: f32,
        robot_radius: f32,
    ) -> Self {
        Self {
            half_width: world_width / 2.0,
            half_height: world_height / 2.0,
            goal_half_length: goal_length / 2.0,
            goal_depth,
            robot_radius,
        }
    }

    /// Full court width.
    #[inline]
    #[must_use]
    pub fn world_width(&self) -> f32 {
        self.half_width * 2.0
    }

    /// Full court height.
    #[inline]
    #[must_use]
    pub fn world_height(&self) -> f32 {
        self.half_height * 2.0
    }

    /// Full goal mouth length.
    #[inline]
    #[must_use]
    pub fn goal_length(&self) -> f32 {
        self.goal_half_length * 2.0
    }

    /// Left and right goal mouth centres.
    #[must_use]
    pub fn goals(&self) -> [Point; 2] {
        [
            Point::new(-self.half_width, 0.0),
            Point::new(self.half_width, 0.0),
        ]
    }

    /// Playing area without the goals.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::centered(self.half_width, self.half_height)
    }

    /// True if `y` lies strictly inside the goal mouths.
    #[inline]
    #[must_use]
    pub fn in_goal_mouth(&self, y: f32) -> bool {
        y < self.goal_half_length && y > -self.goal_half_length
    }
}
