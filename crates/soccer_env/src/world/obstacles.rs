//! # Nearest Obstacle Search
//!
//! For each robot the closest of:
//!
//! 1. the left and right walls, pushed back by the goal depth while the robot
//!    is level with the goal mouth, plus the four goal-mouth corners;
//!    otherwise the plain left and right walls
//! 2. the top and bottom walls
//! 3. every other robot, pulled in by one radius along the connecting line
//!
//! ```text
//!        (x, H)
//!   +------+--------------+
//!   |                     |
//!   +      .pos           +  <- corner (W, +gl)
//! (-W-D,y)          (W+D,y)
//!   +                     +  <- corner (W, -gl)
//!   |                     |
//!   +------+--------------+
//!        (x, -H)
//! ```
//!
//! Walls and corners replace the current best on `<=`, so a later candidate
//! at the same distance wins. Robots replace it only on `<`.

use soccer_geom::Point;

use super::court::Court;
use super::robot::RobotState;

/// Nearest obstacle for the robot at `positions[index]`, or `None` if there
/// is no such robot.
#[must_use]
pub fn nearest_obstacle(court: &Court, index: usize, positions: &[Point]) -> Option<Point> {
    let pos = *positions.get(index)?;
    let w = court.half_width;
    let h = court.half_height;

    let mut best = w + h;
    let mut obstacle = Point::new(w, h);
    let mut offer = |distance: f32, point: Point| {
        if distance <= best {
            best = distance;
            obstacle = point;
        }
    };

    if court.in_goal_mouth(pos.y) {
        let depth = court.goal_depth;
        let gl = court.goal_half_length;
        offer(depth + w - pos.x, Point::new(w + depth, pos.y));
        offer(pos.x + w + depth, Point::new(-w - depth, pos.y));
        for corner in [
            Point::new(-w, gl),
            Point::new(-w, -gl),
            Point::new(w, gl),
            Point::new(w, -gl),
        ] {
            offer(pos.distance(corner), corner);
        }
    } else {
        offer(w - pos.x, Point::new(w, pos.y));
        offer(pos.x + w, Point::new(-w, pos.y));
    }
    offer(h - pos.y, Point::new(pos.x, h));
    offer(pos.y + h, Point::new(pos.x, -h));

    let radius = court.robot_radius;
    for (other_index, &other) in positions.iter().enumerate() {
        if other_index == index {
            continue;
        }
        let towards = other - pos;
        let length = towards.length();
        let distance = length - radius;
        if distance < best {
            best = distance;
            obstacle = if length > 0.0 {
                pos + towards - towards / length * radius
            } else {
                other
            };
        }
    }

    Some(obstacle)
}

/// Runs [`nearest_obstacle`] for every robot and stores the result.
pub fn refresh_obstacles(court: &Court, robots: &mut [RobotState]) {
    let positions: Vec<Point> = robots.iter().map(|r| r.position).collect();
    for (index, robot) in robots.iter_mut().enumerate() {
        if let Some(obstacle) = nearest_obstacle(court, index, &positions) {
            robot.obstacle = obstacle;
        }
    }
}
