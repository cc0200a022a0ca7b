//! # World Model
//!
//! Authoritative match state: court, ball, goals, scores and the robot
//! roster, plus the turn barrier that advances the match.
//!
//! ## Stepping
//!
//! ```text
//! act(0, l, r) -> false        (robot 1 still pending)
//! act(1, l, r) -> true         barrier complete:
//!     local:  differential drive per robot
//!     remote: motor records -> iterate -> getEvent -> [restart] -> pull
//!     obstacle search, clear pending flags, event hook, iterate hook
//! ```
//!
//! Without a simulator the model runs its own minimal physics. With one
//! attached (see [`WorldModel::connect_simulator`]) every step is mirrored
//! over the simulator channel in centimetres and degrees.

mod court;
mod mirror;
mod obstacles;
mod robot;
mod sensors;

pub use court::Court;
pub use obstacles::{nearest_obstacle, refresh_obstacles};
pub use robot::RobotState;

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use soccer_geom::Point;

use crate::error::{WorldError, WorldResult};
use crate::protocol::{RobotStatus, SimEvent};
use crate::transport::StreamConnection;

/// Default wait for a simulator answer.
pub const SIMULATOR_TIMEOUT: Duration = Duration::from_millis(1000);

/// Called with every non-regular simulator event.
pub type EventHook = Box<dyn FnMut(SimEvent) + Send>;

/// Called after every completed step.
pub type IterateHook = Box<dyn FnMut(&WorldModel) + Send>;

/// Match state and turn barrier.
pub struct WorldModel {
    /// Court dimensions.
    court: Court,
    /// Ball position.
    ball: Point,
    /// Left and right goal centres.
    goals: [Point; 2],
    /// Goals scored at the left and right goal.
    scores: [i32; 2],
    /// Faults reported by the simulator.
    fault_count: u32,
    /// Ball-out events reported by the simulator.
    ball_out_count: u32,
    /// Last non-regular event.
    last_event: Option<SimEvent>,
    /// Completed steps.
    turns: u64,
    /// Roster, indexed by robot id.
    robots: Vec<RobotState>,
    /// PHI simulator link. Closed means local physics.
    simulator: StreamConnection,
    /// Answer timeout on the simulator link.
    simulator_timeout: Duration,
    /// Restart positions.
    rng: StdRng,
    on_event: Option<EventHook>,
    on_iterate: Option<IterateHook>,
}

impl WorldModel {
    /// Creates an empty world with zero dimensions and no robots.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates an empty world with deterministic restart positions.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            court: Court::default(),
            ball: Point::ZERO,
            goals: [Point::ZERO; 2],
            scores: [0; 2],
            fault_count: 0,
            ball_out_count: 0,
            last_event: None,
            turns: 0,
            robots: Vec::new(),
            simulator: StreamConnection::new(),
            simulator_timeout: SIMULATOR_TIMEOUT,
            rng,
            on_event: None,
            on_iterate: None,
        }
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Sets the court from full dimensions and recomputes the goals.
    ///
    /// # Errors
    ///
    /// Only if pushing the new layout to an attached simulator fails; the
    /// local change is kept either way.
    pub fn set_environment(
        &mut self,
        world_width: f32,
        world_height: f32,
        goal_length: f32,
        goal_depth: f32,
        robot_radius: f32,
    ) -> WorldResult<()> {
        self.set_court(Court::from_full(
            world_width,
            world_height,
            goal_length,
            goal_depth,
            robot_radius,
        ))
    }

    /// Sets the court and recomputes the goals.
    ///
    /// # Errors
    ///
    /// See [`WorldModel::set_environment`].
    pub fn set_court(&mut self, court: Court) -> WorldResult<()> {
        self.court = court;
        self.goals = court.goals();
        self.push_world()
    }

    /// Replaces the roster with `count` robots at the origin.
    ///
    /// The previous roster is always discarded, even on failure.
    ///
    /// # Errors
    ///
    /// [`WorldError::EmptyRoster`] if `count` is zero.
    pub fn create_robots(&mut self, count: usize) -> WorldResult<()> {
        self.destroy_robots();
        if count == 0 {
            return Err(WorldError::EmptyRoster);
        }
        self.robots = (0..count).map(RobotState::new).collect();
        Ok(())
    }

    /// Drops the roster.
    pub fn destroy_robots(&mut self) {
        self.robots.clear();
    }

    /// Moves the ball.
    ///
    /// # Errors
    ///
    /// Only if pushing to an attached simulator fails.
    pub fn set_ball(&mut self, position: Point) -> WorldResult<()> {
        self.ball = position;
        self.push_world()
    }

    /// Places a robot and cancels its pending action.
    ///
    /// # Errors
    ///
    /// [`WorldError::InvalidRobotId`] for an unknown id, or a push failure.
    pub fn set_robot(&mut self, id: usize, position: Point, heading: f32) -> WorldResult<()> {
        let robot = self.robots.get_mut(id).ok_or(WorldError::InvalidRobotId(id))?;
        robot.position = position;
        robot.heading = heading;
        robot.previous_heading = heading;
        robot.acted = false;
        refresh_obstacles(&self.court, &mut self.robots);
        self.push_world()
    }

    /// Installs the hook fired on every non-regular event.
    pub fn set_event_hook(&mut self, hook: impl FnMut(SimEvent) + Send + 'static) {
        self.on_event = Some(Box::new(hook));
    }

    /// Installs the hook fired after every completed step.
    pub fn set_iterate_hook(&mut self, hook: impl FnMut(&WorldModel) + Send + 'static) {
        self.on_iterate = Some(Box::new(hook));
    }

    /// Removes both hooks.
    pub fn clear_hooks(&mut self) {
        self.on_event = None;
        self.on_iterate = None;
    }

    // =========================================================================
    // Turn barrier
    // =========================================================================

    /// Records an action for robot `id` and steps the match once every robot
    /// has acted.
    ///
    /// Returns `false` for an unknown id (nothing changes) and while other
    /// robots are still pending. Acting twice in one turn only replaces the
    /// forces. Returns `true` when this call completed the step.
    pub fn act(&mut self, id: usize, left_force: f32, right_force: f32) -> bool {
        let Some(robot) = self.robots.get_mut(id) else {
            return false;
        };
        robot.left_force = left_force;
        robot.right_force = right_force;
        robot.acted = true;

        if !self.robots.iter().all(|r| r.acted) {
            return false;
        }

        let event = if self.simulator.is_open() {
            self.robots.iter_mut().for_each(RobotState::remember_pose);
            match self.step_remote() {
                Ok(event) => {
                    if let Err(e) = self.settle_remote(event) {
                        tracing::error!("simulator resync after {:?} failed: {}", event, e);
                    }
                    Some(event).filter(|e| *e != SimEvent::Regular)
                }
                Err(e) => {
                    tracing::error!("simulator step failed: {}", e);
                    None
                }
            }
        } else {
            let radius = self.court.robot_radius;
            for robot in &mut self.robots {
                robot.step_local(radius);
            }
            None
        };

        refresh_obstacles(&self.court, &mut self.robots);
        for robot in &mut self.robots {
            robot.acted = false;
        }
        self.turns += 1;

        if let Some(event) = event {
            self.last_event = Some(event);
            if let Some(hook) = self.on_event.as_mut() {
                hook(event);
            }
        }
        if let Some(mut hook) = self.on_iterate.take() {
            hook(&*self);
            self.on_iterate = Some(hook);
        }
        true
    }

    /// Counts a simulator event.
    fn record_event(&mut self, event: SimEvent) {
        match event {
            SimEvent::Regular => {}
            SimEvent::GoalLeft => self.scores[1] += 1,
            SimEvent::GoalRight => self.scores[0] += 1,
            SimEvent::Fault => self.fault_count += 1,
            SimEvent::BallOut => self.ball_out_count += 1,
        }
        tracing::info!("match event {:?}, scores {:?}", event, self.scores);
    }

    /// Kick-off: scatters the robots over their halves, centres the ball and
    /// pushes the result to an attached simulator.
    ///
    /// # Errors
    ///
    /// Only if the push fails.
    pub fn restart(&mut self) -> WorldResult<()> {
        self.scatter_for_restart();
        refresh_obstacles(&self.court, &mut self.robots);
        self.push_world()
    }

    /// Scatters the robots for a restart: even ids into the left half, odd
    /// ids into the right half. The ball goes back to the centre spot.
    fn scatter_for_restart(&mut self) {
        use rand::Rng;

        let w = self.court.half_width;
        let h = self.court.half_height;
        for (index, robot) in self.robots.iter_mut().enumerate() {
            let rx: f32 = self.rng.gen();
            let ry: f32 = self.rng.gen();
            robot.position.x = if index % 2 == 1 {
                rx * w / 2.0 + w / 4.0
            } else {
                rx * -w / 2.0 - w / 4.0
            };
            robot.position.y = ry * h - h / 2.0;
        }
        self.ball = Point::ZERO;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Court dimensions.
    #[must_use]
    pub const fn court(&self) -> &Court {
        &self.court
    }

    /// Full court width.
    #[must_use]
    pub fn world_width(&self) -> f32 {
        self.court.world_width()
    }

    /// Full court height.
    #[must_use]
    pub fn world_height(&self) -> f32 {
        self.court.world_height()
    }

    /// Full goal mouth length.
    #[must_use]
    pub fn goal_length(&self) -> f32 {
        self.court.goal_length()
    }

    /// Goal depth.
    #[must_use]
    pub const fn goal_depth(&self) -> f32 {
        self.court.goal_depth
    }

    /// Robot radius.
    #[must_use]
    pub const fn robot_radius(&self) -> f32 {
        self.court.robot_radius
    }

    /// Ball position.
    #[inline]
    #[must_use]
    pub const fn ball(&self) -> Point {
        self.ball
    }

    /// Left and right goal centres.
    #[must_use]
    pub const fn goals(&self) -> [Point; 2] {
        self.goals
    }

    /// Goals scored at the left and right goal.
    #[must_use]
    pub const fn scores(&self) -> [i32; 2] {
        self.scores
    }

    /// Faults so far.
    #[must_use]
    pub const fn fault_count(&self) -> u32 {
        self.fault_count
    }

    /// Ball-out events so far.
    #[must_use]
    pub const fn ball_out_count(&self) -> u32 {
        self.ball_out_count
    }

    /// Last non-regular event, if any.
    #[must_use]
    pub const fn last_event(&self) -> Option<SimEvent> {
        self.last_event
    }

    /// Completed steps.
    #[must_use]
    pub const fn turns(&self) -> u64 {
        self.turns
    }

    /// Number of robots.
    #[inline]
    #[must_use]
    pub fn robot_count(&self) -> usize {
        self.robots.len()
    }

    /// Robot `id`, if it exists.
    #[inline]
    #[must_use]
    pub fn robot(&self, id: usize) -> Option<&RobotState> {
        self.robots.get(id)
    }

    /// The whole roster.
    #[must_use]
    pub fn robots(&self) -> &[RobotState] {
        &self.robots
    }

    /// Status records for the match-server channel, in roster order.
    #[must_use]
    pub fn robot_statuses(&self) -> Vec<RobotStatus> {
        self.robots.iter().map(RobotStatus::from).collect()
    }

    /// True if every robot has a pending action.
    #[must_use]
    pub fn turn_complete(&self) -> bool {
        !self.robots.is_empty() && self.robots.iter().all(|r| r.acted)
    }

    /// Overwrites ball, roster and scores from a match-server status.
    ///
    /// `robots` must already match the roster size.
    pub(crate) fn apply_status(&mut self, ball: Point, robots: &[RobotStatus], scores: [i32; 2]) {
        debug_assert_eq!(robots.len(), self.robots.len());
        self.ball = ball;
        for (robot, status) in self.robots.iter_mut().zip(robots) {
            robot.apply_status(status);
        }
        self.scores = scores;
    }
}

impl Default for WorldModel {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WorldModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldModel")
            .field("court", &self.court)
            .field("ball", &self.ball)
            .field("scores", &self.scores)
            .field("robots", &self.robots)
            .field("simulator", &self.simulator.state())
            .field("turns", &self.turns)
            .finish_non_exhaustive()
    }
}
