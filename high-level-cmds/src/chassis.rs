use crate::command::{Action, MotionCommand};

/// A drive base that runs timed, open-loop maneuvers.
///
/// Every timed maneuver blocks for its whole duration and leaves the motors at rest when it
/// returns, whether or not it succeeded.
pub trait Chassis {
    type Error: core::fmt::Debug;

    fn forward(&mut self, speed: u8, duration_ms: u32) -> Result<(), Self::Error>;
    fn backward(&mut self, speed: u8, duration_ms: u32) -> Result<(), Self::Error>;
    fn turn_left(&mut self, speed: u8, duration_ms: u32) -> Result<(), Self::Error>;
    fn turn_right(&mut self, speed: u8, duration_ms: u32) -> Result<(), Self::Error>;

    /// Put both channels at rest immediately.
    fn stop(&mut self) -> Result<(), Self::Error>;

    /// Run a parsed command. Stop and unrecognised actions ignore speed and duration.
    fn execute(&mut self, command: &MotionCommand) -> Result<(), Self::Error> {
        let MotionCommand {
            action,
            duration_ms,
            speed,
        } = *command;
        match action {
            Action::Forward => self.forward(speed, duration_ms),
            Action::Backward => self.backward(speed, duration_ms),
            Action::Left => self.turn_left(speed, duration_ms),
            Action::Right => self.turn_right(speed, duration_ms),
            Action::Stop | Action::Unknown => self.stop(),
        }
    }
}
