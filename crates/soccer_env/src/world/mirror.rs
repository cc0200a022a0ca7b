//! # Simulator Mirroring
//!
//! Keeps the world model in step with a PHI simulator.
//!
//! ## Units
//!
//! - Simulator: centimetres and degrees, robot ids start at 1
//! - World model: millimetres and radians, robot ids start at 0
//!
//! ```text
//! push:  setRobotCount n | (setRobotInfo RobotInfo) x n | setBallInfo BallInfo | buildScene
//! pull:  getBallInfo -> BallInfo | getRobotCount -> n | (getRobotInfo -> RobotInfo) x n
//! step:  (setMotorInfo MotorInfo) x n | iterate | getEvent -> event
//! ```

use std::f64::consts::PI;
use std::time::Duration;

use soccer_geom::Point;

use super::WorldModel;
use crate::error::{ConnError, WorldError, WorldResult};
use crate::protocol::{
    receive_record, send_record, BallInfo, MotorInfo, RobotInfo, SimCommand, SimEvent, SIMULATOR_PORT,
};

const MM_PER_CM: f64 = 10.0;

impl WorldModel {
    /// Attaches a PHI simulator on its default port, pushes the current
    /// world and pulls back what the simulator built.
    ///
    /// # Errors
    ///
    /// Connection or sync failures detach the simulator and leave the model
    /// on local physics.
    pub fn connect_simulator(&mut self, host: &str) -> WorldResult<()> {
        self.connect_simulator_on(host, SIMULATOR_PORT)
    }

    /// Same as [`WorldModel::connect_simulator`] with an explicit port.
    ///
    /// # Errors
    ///
    /// See [`WorldModel::connect_simulator`].
    pub fn connect_simulator_on(&mut self, host: &str, port: u16) -> WorldResult<()> {
        self.simulator.connect(host, port)?;
        tracing::info!("simulator attached at {}:{}", host, port);
        let synced = self.push_world().and_then(|()| self.pull_world());
        if let Err(e) = &synced {
            tracing::warn!("simulator sync failed, detaching: {}", e);
            self.simulator.close();
        }
        synced
    }

    /// Detaches the simulator. The model falls back to local physics.
    pub fn disconnect_simulator(&mut self) {
        self.simulator.close();
    }

    /// True while a simulator is attached.
    #[inline]
    #[must_use]
    pub fn is_mirrored(&self) -> bool {
        self.simulator.is_open()
    }

    /// Sets how long to wait for each simulator answer.
    pub fn set_simulator_timeout(&mut self, timeout: Duration) {
        self.simulator_timeout = timeout;
    }

    /// Asks the simulator to start recording.
    ///
    /// # Errors
    ///
    /// [`WorldError::NotMirrored`] without a simulator.
    pub fn start_log(&mut self) -> WorldResult<()> {
        self.send_simulator_command(SimCommand::StartLog)
    }

    /// Asks the simulator to stop recording.
    ///
    /// # Errors
    ///
    /// [`WorldError::NotMirrored`] without a simulator.
    pub fn stop_log(&mut self) -> WorldResult<()> {
        self.send_simulator_command(SimCommand::StopLog)
    }

    fn send_simulator_command(&mut self, command: SimCommand) -> WorldResult<()> {
        if !self.is_mirrored() {
            return Err(WorldError::NotMirrored);
        }
        send_record(&mut self.simulator, &command.code())?;
        Ok(())
    }

    /// Sends the whole world to the simulator and rebuilds its scene.
    ///
    /// The simulator only accepts robots facing 90 degrees, so every local
    /// heading is reset to `PI / 2` as well. Does nothing without a simulator.
    ///
    /// # Errors
    ///
    /// Transport failures while sending.
    pub fn push_world(&mut self) -> WorldResult<()> {
        if !self.is_mirrored() {
            return Ok(());
        }
        let count = i32::try_from(self.robots.len())
            .map_err(|_| ConnError::InvalidArgument("roster too large for the wire"))?;

        let conn = &mut self.simulator;
        send_record(conn, &SimCommand::SetRobotCount.code())?;
        send_record(conn, &count)?;

        for (index, robot) in (1_i32..).zip(self.robots.iter_mut()) {
            robot.heading = std::f32::consts::FRAC_PI_2;
            send_record(conn, &SimCommand::SetRobotInfo.code())?;
            send_record(
                conn,
                &RobotInfo {
                    id: index,
                    team: 1,
                    x: f64::from(robot.position.x) / MM_PER_CM,
                    y: f64::from(robot.position.y) / MM_PER_CM,
                    rot: f64::from(robot.heading) / PI * 180.0,
                },
            )?;
        }

        send_record(conn, &SimCommand::SetBallInfo.code())?;
        send_record(
            conn,
            &BallInfo {
                x: f64::from(self.ball.x) / MM_PER_CM,
                y: f64::from(self.ball.y) / MM_PER_CM,
            },
        )?;
        send_record(conn, &SimCommand::BuildScene.code())?;
        tracing::debug!("world pushed to simulator ({} robots)", count);
        Ok(())
    }

    /// Reads ball and robot poses back from the simulator.
    ///
    /// Nothing is applied unless the whole exchange succeeds. Does nothing
    /// without a simulator.
    ///
    /// # Errors
    ///
    /// [`WorldError::RosterMismatch`] if the simulator holds a different
    /// number of robots, or a transport failure.
    #[allow(clippy::cast_possible_truncation)]
    pub fn pull_world(&mut self) -> WorldResult<()> {
        if !self.is_mirrored() {
            return Ok(());
        }
        let timeout = Some(self.simulator_timeout);
        let conn = &mut self.simulator;

        send_record(conn, &SimCommand::GetBallInfo.code())?;
        let ball: BallInfo = receive_record(conn, timeout)?;

        send_record(conn, &SimCommand::GetRobotCount.code())?;
        let count: i32 = receive_record(conn, timeout)?;
        if usize::try_from(count).ok() != Some(self.robots.len()) {
            tracing::warn!("simulator holds {} robots, roster has {}", count, self.robots.len());
            return Err(WorldError::RosterMismatch {
                expected: self.robots.len(),
                received: count,
            });
        }

        let mut poses = Vec::with_capacity(self.robots.len());
        for _ in 0..self.robots.len() {
            send_record(conn, &SimCommand::GetRobotInfo.code())?;
            let info: RobotInfo = receive_record(conn, timeout)?;
            poses.push(info);
        }

        self.ball = Point::new((ball.x * MM_PER_CM) as f32, (ball.y * MM_PER_CM) as f32);
        for (robot, info) in self.robots.iter_mut().zip(&poses) {
            robot.position = Point::new((info.x * MM_PER_CM) as f32, (info.y * MM_PER_CM) as f32);
            robot.heading = (info.rot / 180.0 * PI) as f32;
        }
        Ok(())
    }

    /// Runs one simulator step for the pending actions and returns the event
    /// it reported.
    pub(super) fn step_remote(&mut self) -> WorldResult<SimEvent> {
        let timeout = Some(self.simulator_timeout);
        let conn = &mut self.simulator;

        for (index, robot) in (1_i32..).zip(self.robots.iter()) {
            send_record(conn, &SimCommand::SetMotorInfo.code())?;
            send_record(
                conn,
                &MotorInfo {
                    id: index,
                    left: f64::from(robot.left_force),
                    right: f64::from(robot.right_force),
                },
            )?;
        }
        send_record(conn, &SimCommand::Iterate.code())?;
        send_record(conn, &SimCommand::GetEvent.code())?;

        let event = match receive_record::<i32>(conn, timeout) {
            Ok(code) => SimEvent::try_from(code).map_err(WorldError::UnknownEvent)?,
            Err(ConnError::Timeout) => {
                tracing::warn!("simulator did not report an event, assuming regular play");
                SimEvent::Regular
            }
            Err(e) => return Err(e.into()),
        };
        Ok(event)
    }

    /// Counts `event`, restarts after anything but regular play and pulls the
    /// resulting poses. The event is counted even if the restart fails.
    pub(super) fn settle_remote(&mut self, event: SimEvent) -> WorldResult<()> {
        if event != SimEvent::Regular {
            self.record_event(event);
            self.restart()?;
        }
        self.pull_world()
    }
}
