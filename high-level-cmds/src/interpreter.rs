//! The serial command loop body: one line in, its reply out.

use embedded_io::{Read, Write};

use crate::chassis::Chassis;
use crate::command::{InvalidFormat, MotionCommand, Request};
use crate::fmt::Debug2Format;
use crate::line::{LineError, LineReader, LINE_CAPACITY};
use crate::rangefinder::{DistanceReading, Rangefinder};

/// Terminates every motor-command transaction.
pub const DONE: &str = "DONE";

/// Sent before [`DONE`] when a command line can't be parsed.
pub const INVALID_FORMAT: &str = "ERROR: Invalid command format";

const LINE_END: &[u8] = b"\r\n";

/// What was done with a line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    /// Answered a `REQ`.
    Distance(DistanceReading),
    /// Ran the command and acknowledged it.
    Done(MotionCommand),
    /// The chassis reported a fault. Still acknowledged.
    Faulted(MotionCommand),
    /// The line was malformed. Reported and acknowledged, motors untouched.
    Rejected,
}

#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterpreterError<E> {
    /// Reading from or writing to the port failed.
    Io(E),
    /// The port has no more input.
    Closed,
}

/// Owns the chassis and the rangefinder and answers one line at a time.
pub struct Interpreter<C, R, const N: usize = LINE_CAPACITY> {
    chassis: C,
    rangefinder: R,
    reader: LineReader<N>,
    trace: bool,
}

impl<C, R, const N: usize> Interpreter<C, R, N>
where
    C: Chassis,
    R: Rangefinder,
{
    /// The chassis must already be at rest.
    pub fn new(chassis: C, rangefinder: R) -> Self {
        Self {
            chassis,
            rangefinder,
            reader: LineReader::new(),
            trace: false,
        }
    }

    /// Echo each motor command and its parsed fields to the port ahead of `DONE`.
    /// Distance requests are never traced, their reply stays a single line.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn chassis(&self) -> &C {
        &self.chassis
    }

    pub fn release(self) -> (C, R) {
        (self.chassis, self.rangefinder)
    }

    /// Block until a line arrives on `port`, then handle it. A maneuver runs to completion
    /// before this returns, so nothing more is read while the motors are driven.
    pub fn poll<P>(&mut self, port: &mut P) -> Result<Reply, InterpreterError<P::Error>>
    where
        P: Read + Write,
    {
        let Self {
            chassis,
            rangefinder,
            reader,
            trace,
        } = self;

        let request = match reader.read_line(port) {
            Ok(line) => {
                debug!("received '{}'", line);
                let request = Request::parse(line);
                if *trace && request != Ok(Request::Distance) {
                    write_parts(port, &["Received: ", line.trim()]).map_err(InterpreterError::Io)?;
                }
                request
            }
            Err(LineError::Read(e)) => return Err(InterpreterError::Io(e)),
            Err(LineError::Closed) => return Err(InterpreterError::Closed),
            Err(LineError::TooLong) => {
                warn!("dropped a line longer than {} bytes", N);
                Err(InvalidFormat)
            }
            Err(LineError::NotUtf8) => {
                warn!("dropped a line that isn't UTF-8");
                Err(InvalidFormat)
            }
        };

        respond(chassis, rangefinder, *trace, request, port).map_err(InterpreterError::Io)
    }

    /// Handle a line that was read some other way and write the reply to `out`.
    ///
    /// `line` excludes the `\n`. Lines longer than `N` bytes are rejected, the same as
    /// [`Self::poll`] does.
    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Reply, W::Error> {
        if line.len() > N {
            warn!("dropped a line longer than {} bytes", N);
            return respond(
                &mut self.chassis,
                &mut self.rangefinder,
                self.trace,
                Err(InvalidFormat),
                out,
            );
        }

        let request = Request::parse(line);
        if self.trace && request != Ok(Request::Distance) {
            write_parts(out, &["Received: ", line.trim()])?;
        }
        respond(
            &mut self.chassis,
            &mut self.rangefinder,
            self.trace,
            request,
            out,
        )
    }
}

fn respond<C, R, W>(
    chassis: &mut C,
    rangefinder: &mut R,
    trace: bool,
    request: Result<Request, InvalidFormat>,
    out: &mut W,
) -> Result<Reply, W::Error>
where
    C: Chassis,
    R: Rangefinder,
    W: Write,
{
    let reply = match request {
        Ok(Request::Distance) => {
            let reading = DistanceReading::from_measurement(rangefinder.measure_cm());
            debug!("distance {} cm", reading.cm());
            let mut digits = itoa::Buffer::new();
            write_parts(out, &[digits.format(reading.cm())])?;
            Reply::Distance(reading)
        }
        Ok(Request::Motion(command)) => {
            if trace {
                let mut duration = itoa::Buffer::new();
                let mut speed = itoa::Buffer::new();
                write_parts(
                    out,
                    &[
                        "Parsed - Action: '",
                        command.action.as_str(),
                        "', Duration: ",
                        duration.format(command.duration_ms),
                        ", Speed: ",
                        speed.format(command.speed),
                    ],
                )?;
            }

            info!("executing {}", command);
            let reply = match chassis.execute(&command) {
                Ok(()) => Reply::Done(command),
                Err(e) => {
                    warn!("chassis fault during {}: {}", command.action, Debug2Format(&e));
                    Reply::Faulted(command)
                }
            };
            write_parts(out, &[DONE])?;
            reply
        }
        Err(InvalidFormat) => {
            info!("rejected malformed command");
            write_parts(out, &[INVALID_FORMAT])?;
            write_parts(out, &[DONE])?;
            Reply::Rejected
        }
    };

    out.flush()?;
    Ok(reply)
}

/// Write the pieces back to back as one terminated line.
fn write_parts<W: Write>(out: &mut W, parts: &[&str]) -> Result<(), W::Error> {
    for part in parts {
        out.write_all(part.as_bytes())?;
    }
    out.write_all(LINE_END)
}
