//! # Wire Records
//!
//! Every record has a fixed size and an explicit little-endian layout.
//! Nothing relies on in-memory struct layout.
//!
//! ## Simulator channel (centimetres, degrees)
//!
//! ```text
//! BallInfo    | x: f64 | y: f64 |                                16 bytes
//! RobotInfo   | id: i32 | team: i32 | x: f64 | y: f64 | rot: f64 | 32 bytes
//! MotorInfo   | id: i32 | left: f64 | right: f64 |                20 bytes
//! command     | i32 |                                             4 bytes
//! ```
//!
//! ## Match-server channel (millimetres, radians)
//!
//! ```text
//! Point       | x: f32 | y: f32 |                                  8 bytes
//! RobotStatus | pos 2xf32 | heading f32 | prev pos 2xf32 | prev heading f32
//!             | obstacle 2xf32 | forces 2xf32 | acted u8 | pad 3 | 44 bytes
//! command     | i32 |                                              4 bytes
//! ```

use soccer_geom::Point;

use super::serialization::{RecordReader, RecordWriter};

/// Default PHI simulator port.
pub const SIMULATOR_PORT: u16 = 12561;

/// A value with a fixed-size binary layout.
pub trait WireRecord: Sized {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Appends the encoded record. Returns false if the writer is full.
    fn encode(&self, writer: &mut RecordWriter) -> bool;

    /// Decodes one record, `None` if the reader runs out of bytes.
    fn decode(reader: &mut RecordReader<'_>) -> Option<Self>;
}

impl WireRecord for i32 {
    const SIZE: usize = 4;

    fn encode(&self, writer: &mut RecordWriter) -> bool {
        writer.write_i32(*self)
    }

    fn decode(reader: &mut RecordReader<'_>) -> Option<Self> {
        reader.read_i32()
    }
}

impl WireRecord for f32 {
    const SIZE: usize = 4;

    fn encode(&self, writer: &mut RecordWriter) -> bool {
        writer.write_f32(*self)
    }

    fn decode(reader: &mut RecordReader<'_>) -> Option<Self> {
        reader.read_f32()
    }
}

impl WireRecord for Point {
    const SIZE: usize = 8;

    fn encode(&self, writer: &mut RecordWriter) -> bool {
        writer.write_f32(self.x) && writer.write_f32(self.y)
    }

    fn decode(reader: &mut RecordReader<'_>) -> Option<Self> {
        Some(Self::new(reader.read_f32()?, reader.read_f32()?))
    }
}

/// Ball position on the simulator channel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BallInfo {
    /// X in centimetres.
    pub x: f64,
    /// Y in centimetres.
    pub y: f64,
}

impl WireRecord for BallInfo {
    const SIZE: usize = 16;

    fn encode(&self, writer: &mut RecordWriter) -> bool {
        writer.write_f64(self.x) && writer.write_f64(self.y)
    }

    fn decode(reader: &mut RecordReader<'_>) -> Option<Self> {
        Some(Self {
            x: reader.read_f64()?,
            y: reader.read_f64()?,
        })
    }
}

/// Robot pose on the simulator channel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RobotInfo {
    /// Simulator robot id, 1-based.
    pub id: i32,
    /// Team number.
    pub team: i32,
    /// X in centimetres.
    pub x: f64,
    /// Y in centimetres.
    pub y: f64,
    /// Heading in degrees.
    pub rot: f64,
}

impl WireRecord for RobotInfo {
    const SIZE: usize = 32;

    fn encode(&self, writer: &mut RecordWriter) -> bool {
        writer.write_i32(self.id)
            && writer.write_i32(self.team)
            && writer.write_f64(self.x)
            && writer.write_f64(self.y)
            && writer.write_f64(self.rot)
    }

    fn decode(reader: &mut RecordReader<'_>) -> Option<Self> {
        Some(Self {
            id: reader.read_i32()?,
            team: reader.read_i32()?,
            x: reader.read_f64()?,
            y: reader.read_f64()?,
            rot: reader.read_f64()?,
        })
    }
}

/// Wheel command on the simulator channel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotorInfo {
    /// Simulator robot id, 1-based.
    pub id: i32,
    /// Left wheel force.
    pub left: f64,
    /// Right wheel force.
    pub right: f64,
}

impl WireRecord for MotorInfo {
    const SIZE: usize = 20;

    fn encode(&self, writer: &mut RecordWriter) -> bool {
        writer.write_i32(self.id) && writer.write_f64(self.left) && writer.write_f64(self.right)
    }

    fn decode(reader: &mut RecordReader<'_>) -> Option<Self> {
        Some(Self {
            id: reader.read_i32()?,
            left: reader.read_f64()?,
            right: reader.read_f64()?,
        })
    }
}

/// Full robot state on the match-server channel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RobotStatus {
    /// Position in millimetres.
    pub position: Point,
    /// Heading in radians.
    pub heading: f32,
    /// Position before the last step.
    pub previous_position: Point,
    /// Heading before the last step.
    pub previous_heading: f32,
    /// Nearest obstacle point.
    pub obstacle: Point,
    /// Left and right wheel force.
    pub forces: [f32; 2],
    /// Action pending for the current turn.
    pub acted: bool,
}

impl WireRecord for RobotStatus {
    const SIZE: usize = 44;

    fn encode(&self, writer: &mut RecordWriter) -> bool {
        self.position.encode(writer)
            && writer.write_f32(self.heading)
            && self.previous_position.encode(writer)
            && writer.write_f32(self.previous_heading)
            && self.obstacle.encode(writer)
            && writer.write_f32(self.forces[0])
            && writer.write_f32(self.forces[1])
            && writer.write_u8(u8::from(self.acted))
            && writer.write_padding(3)
    }

    fn decode(reader: &mut RecordReader<'_>) -> Option<Self> {
        let status = Self {
            position: Point::decode(reader)?,
            heading: reader.read_f32()?,
            previous_position: Point::decode(reader)?,
            previous_heading: reader.read_f32()?,
            obstacle: Point::decode(reader)?,
            forces: [reader.read_f32()?, reader.read_f32()?],
            acted: reader.read_u8()? != 0,
        };
        reader.skip(3)?;
        Some(status)
    }
}

/// Simulator command codes.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SimCommand {
    /// Rebuild the scene from the poses just sent.
    BuildScene = 0,
    /// Advance one physics step.
    Iterate = 1,
    /// Request the robot count.
    GetRobotCount = 2,
    /// Announce the robot count.
    SetRobotCount = 3,
    /// Request the ball position.
    GetBallInfo = 4,
    /// Send the ball position.
    SetBallInfo = 5,
    /// Request the next robot pose.
    GetRobotInfo = 6,
    /// Send a robot pose.
    SetRobotInfo = 7,
    /// Request a motor command.
    GetMotorInfo = 8,
    /// Send a motor command.
    SetMotorInfo = 9,
    /// Request the last step's event.
    GetEvent = 10,
    /// Start simulator-side logging.
    StartLog = 11,
    /// Stop simulator-side logging.
    StopLog = 12,
}

impl SimCommand {
    /// Numeric wire code.
    #[inline]
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Outcome of a simulator step.
#[repr(i32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SimEvent {
    /// Nothing happened.
    #[default]
    Regular = 0,
    /// Ball entered the left goal.
    GoalLeft = 1,
    /// Ball entered the right goal.
    GoalRight = 2,
    /// Ball left the court.
    BallOut = 3,
    /// Foul or stalemate.
    Fault = 4,
}

impl TryFrom<i32> for SimEvent {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, i32> {
        Ok(match code {
            0 => Self::Regular,
            1 => Self::GoalLeft,
            2 => Self::GoalRight,
            3 => Self::BallOut,
            4 => Self::Fault,
            other => return Err(other),
        })
    }
}

/// Match-server command codes. Separate numbering from [`SimCommand`].
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientCommand {
    /// Request the world description.
    GetWorld = 0,
    /// Request the ball position.
    GetBall = 1,
    /// Request the caller's robot.
    GetRobot = 2,
    /// Request the scores.
    GetScore = 3,
    /// Submit wheel forces.
    Act = 4,
    /// Keep-alive.
    Ack = 5,
    /// Request the full match status.
    GetMatchStatus = 6,
}

impl ClientCommand {
    /// Numeric wire code.
    #[inline]
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for ClientCommand {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, i32> {
        Ok(match code {
            0 => Self::GetWorld,
            1 => Self::GetBall,
            2 => Self::GetRobot,
            3 => Self::GetScore,
            4 => Self::Act,
            5 => Self::Ack,
            6 => Self::GetMatchStatus,
            other => return Err(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded<T: WireRecord>(value: &T) -> Vec<u8> {
        let mut writer = RecordWriter::new();
        assert!(value.encode(&mut writer));
        writer.as_slice().to_vec()
    }

    #[test]
    fn test_sizes_match_encoding() {
        assert_eq!(encoded(&BallInfo::default()).len(), BallInfo::SIZE);
        assert_eq!(encoded(&RobotInfo::default()).len(), RobotInfo::SIZE);
        assert_eq!(encoded(&MotorInfo::default()).len(), MotorInfo::SIZE);
        assert_eq!(encoded(&RobotStatus::default()).len(), RobotStatus::SIZE);
        assert_eq!(encoded(&Point::ZERO).len(), Point::SIZE);
    }

    #[test]
    fn test_robot_info_is_lossless() {
        let info = RobotInfo {
            id: 2,
            team: 1,
            x: -12.375,
            y: 0.1,
            rot: 179.999,
        };
        let bytes = encoded(&info);
        let back = RobotInfo::decode(&mut RecordReader::new(&bytes)).unwrap();
        assert_eq!(back.x.to_bits(), info.x.to_bits());
        assert_eq!(back.y.to_bits(), info.y.to_bits());
        assert_eq!(back.rot.to_bits(), info.rot.to_bits());
        assert_eq!((back.id, back.team), (2, 1));
    }

    #[test]
    fn test_robot_info_field_order() {
        let bytes = encoded(&RobotInfo {
            id: 7,
            team: 1,
            x: 1.0,
            y: 2.0,
            rot: 90.0,
        });
        assert_eq!(&bytes[0..4], &7_i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &1_i32.to_le_bytes());
        assert_eq!(&bytes[8..16], &1.0_f64.to_le_bytes());
        assert_eq!(&bytes[24..32], &90.0_f64.to_le_bytes());
    }

    #[test]
    fn test_truncated_robot_info_fails() {
        let bytes = encoded(&RobotInfo::default());
        assert!(RobotInfo::decode(&mut RecordReader::new(&bytes[..RobotInfo::SIZE - 1])).is_none());
    }

    #[test]
    fn test_robot_status_flag_and_padding() {
        let status = RobotStatus {
            acted: true,
            forces: [0.5, -0.5],
            ..Default::default()
        };
        let bytes = encoded(&status);
        assert_eq!(bytes[40], 1);
        assert_eq!(&bytes[41..44], &[0, 0, 0]);
        let back = RobotStatus::decode(&mut RecordReader::new(&bytes)).unwrap();
        assert_eq!(back, status);
    }

    #[test]
    fn test_codes() {
        assert_eq!(SimCommand::StopLog.code(), 12);
        assert_eq!(ClientCommand::GetMatchStatus.code(), 6);
        assert_eq!(SimEvent::try_from(4), Ok(SimEvent::Fault));
        assert_eq!(SimEvent::try_from(5), Err(5));
        assert_eq!(ClientCommand::try_from(4), Ok(ClientCommand::Act));
        assert_eq!(ClientCommand::try_from(-1), Err(-1));
    }
}
