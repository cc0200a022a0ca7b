//! # Match Protocol
//!
//! Fixed-layout binary records for the two channels:
//!
//! - **Simulator channel**: world model <-> PHI simulator (cm, degrees, f64)
//! - **Match-server channel**: match server <-> client session (mm, radians, f32)
//!
//! All exchanges are strict request/response pairs. Nothing is pipelined.

pub mod codec;
pub mod records;
pub mod serialization;

pub use codec::{receive_record, send_record};
pub use records::{
    BallInfo, ClientCommand, MotorInfo, RobotInfo, RobotStatus, SimCommand, SimEvent, WireRecord,
    SIMULATOR_PORT,
};
pub use serialization::{RecordReader, RecordWriter, MAX_RECORD_SIZE};
