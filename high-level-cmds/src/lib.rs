//! Line protocol between a host computer and the drive controller.
//!
//! The host sends one command per line:
//!
//! | Line | Reply |
//! |------|-------|
//! | `REQ` | one line with the distance in centimetres, `0..=200` |
//! | `<action>,<duration_ms>,<speed>` | optional trace lines, an error line if malformed, then `DONE` |
//!
//! `action` is one of `forward`, `backward`, `left`, `right`; anything else stops the motors.
#![cfg_attr(not(test), no_std)]

mod fmt;

pub mod chassis;
pub mod command;
pub mod interpreter;
pub mod line;
pub mod rangefinder;

pub use chassis::Chassis;
pub use command::{Action, InvalidFormat, MotionCommand, Request, REQUEST_TOKEN};
pub use interpreter::{Interpreter, InterpreterError, Reply, DONE, INVALID_FORMAT};
pub use line::{LineError, LineReader, LINE_CAPACITY};
pub use rangefinder::{DistanceReading, Rangefinder, MAX_DISTANCE_CM};
