//! # Soccer Geometry
//!
//! Planar value types for the robot-soccer court.
//!
//! ## Conventions
//!
//! - Units are millimetres; angles are radians with the x axis at 0
//! - The court origin is the centre spot, `+x` points at the right goal
//! - Headings live in `(-PI, PI]`, see [`normalize_angle`]
//!
//! ```text
//!            top (+half_height)
//!   +-----------------------------+
//!   |                             |
//! [ |  left goal   .   right goal | ]
//!   |                             |
//!   +-----------------------------+
//!            bottom (-half_height)
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod point;
pub mod shape;

pub use point::Point;
pub use shape::{Line, Rect};

use std::f32::consts::{PI, TAU};

/// Folds an angle that is at most one turn out of range back into `(-PI, PI]`.
///
/// Inputs are differences of two normalised angles, so a single
/// correction is always enough.
#[inline]
#[must_use]
pub fn normalize_angle(angle: f32) -> f32 {
    if angle > PI {
        angle - TAU
    } else if angle <= -PI {
        angle + TAU
    } else {
        angle
    }
}
