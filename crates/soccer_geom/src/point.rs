//! Court points and vectors.

use serde::{Deserialize, Serialize};

use crate::Rect;

/// 2D point or vector in court millimetres.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
}

impl Point {
    /// Creates a new point
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Origin
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Dot product
    #[inline]
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Euclidean length of the vector from the origin.
    #[inline]
    #[must_use]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Distance to another point
    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Polar angle of the vector, x axis is 0. The zero vector has angle 0.
    #[inline]
    #[must_use]
    pub fn angle(self) -> f32 {
        if self.x == 0.0 && self.y == 0.0 {
            return 0.0;
        }
        self.y.atan2(self.x)
    }

    /// Unit vector with the given polar angle.
    #[inline]
    #[must_use]
    pub fn from_angle(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(cos, sin)
    }

    /// True if the point lies inside `rect`, borders included.
    #[must_use]
    pub fn is_inside(self, rect: &Rect) -> bool {
        self.x >= rect.left && self.x <= rect.right && self.y >= rect.bottom && self.y <= rect.top
    }

    /// Truncates the coordinates that lie outside `rect`.
    #[must_use]
    pub fn clamp_to(self, rect: &Rect) -> Self {
        Self::new(
            clamp_coord(self.x, rect.left, rect.right),
            clamp_coord(self.y, rect.bottom, rect.top),
        )
    }

    /// Rotates the vector by an angle given as its cosine and sine.
    /// Positive angles turn left.
    #[must_use]
    pub fn rotate(self, cos: f32, sin: f32) -> Self {
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
}

/// Upper bound wins over lower bound for inverted ranges.
#[inline]
pub(crate) fn clamp_coord(value: f32, low: f32, high: f32) -> f32 {
    if value > high {
        high
    } else if value < low {
        low
    } else {
        value
    }
}

impl std::ops::Neg for Point {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl std::ops::Add for Point {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Point {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl std::ops::Div<f32> for Point {
    type Output = Self;
    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl std::ops::AddAssign for Point {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}
