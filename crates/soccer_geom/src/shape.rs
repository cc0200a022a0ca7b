//! Segments and axis-aligned rectangles.

use serde::{Deserialize, Serialize};

use crate::point::{clamp_coord, Point};

/// Segment between two points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Start point
    pub start: Point,
    /// End point
    pub end: Point,
}

impl Line {
    /// Creates a new segment
    #[must_use]
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Segment length
    #[must_use]
    pub fn length(self) -> f32 {
        self.start.distance(self.end)
    }

    /// True if both ends lie inside `rect`.
    #[must_use]
    pub fn is_inside(self, rect: &Rect) -> bool {
        self.start.is_inside(rect) && self.end.is_inside(rect)
    }

    /// Truncates both ends into `rect`.
    #[must_use]
    pub fn clamp_to(self, rect: &Rect) -> Self {
        Self::new(self.start.clamp_to(rect), self.end.clamp_to(rect))
    }
}

impl std::ops::Add<Point> for Line {
    type Output = Self;
    fn add(self, rhs: Point) -> Self {
        Self::new(self.start + rhs, self.end + rhs)
    }
}

impl std::ops::Sub<Point> for Line {
    type Output = Self;
    fn sub(self, rhs: Point) -> Self {
        Self::new(self.start - rhs, self.end - rhs)
    }
}

/// Axis-aligned rectangle. `y` grows towards `top`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left limit
    pub left: f32,
    /// Bottom limit
    pub bottom: f32,
    /// Right limit
    pub right: f32,
    /// Top limit
    pub top: f32,
}

impl Rect {
    /// Creates a new rectangle
    #[must_use]
    pub const fn new(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    /// Rectangle centred on the origin.
    #[must_use]
    pub fn centered(half_width: f32, half_height: f32) -> Self {
        Self::new(-half_width, -half_height, half_width, half_height)
    }

    /// Width
    #[inline]
    #[must_use]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Height
    #[inline]
    #[must_use]
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// A rectangle is valid when `left <= right` and `bottom <= top`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.left <= self.right && self.bottom <= self.top
    }

    /// True if every edge of `self` lies within `outer`.
    #[must_use]
    pub fn is_inside(&self, outer: &Rect) -> bool {
        let horizontal = |v: f32| v >= outer.left && v <= outer.right;
        let vertical = |v: f32| v >= outer.bottom && v <= outer.top;
        horizontal(self.left) && horizontal(self.right) && vertical(self.bottom) && vertical(self.top)
    }

    /// Truncates each edge into `outer`.
    #[must_use]
    pub fn clamp_to(&self, outer: &Rect) -> Self {
        Self::new(
            clamp_coord(self.left, outer.left, outer.right),
            clamp_coord(self.bottom, outer.bottom, outer.top),
            clamp_coord(self.right, outer.left, outer.right),
            clamp_coord(self.top, outer.bottom, outer.top),
        )
    }

    /// Two rectangles match when they have the same width and height.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn matches_size(&self, other: &Rect) -> bool {
        self.width() == other.width() && self.height() == other.height()
    }
}

impl std::ops::Add<Point> for Rect {
    type Output = Self;
    fn add(self, rhs: Point) -> Self {
        Self::new(
            self.left + rhs.x,
            self.bottom + rhs.y,
            self.right + rhs.x,
            self.top + rhs.y,
        )
    }
}
