use core::fmt;

/// Line that asks for a distance reading instead of a maneuver.
pub const REQUEST_TOKEN: &str = "REQ";

/// Which maneuver a motion command asks for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Both channels forward.
    Forward,
    /// Both channels in reverse.
    Backward,
    /// Pivot: left channel reverse, right channel forward.
    Left,
    /// Pivot: left channel forward, right channel reverse.
    Right,
    /// The literal `stop` token.
    Stop,
    /// Any token that isn't recognised. Executed as a stop.
    Unknown,
}

impl Action {
    /// Match an action token. Case-sensitive; anything unrecognised is [`Action::Unknown`].
    pub fn from_token(token: &str) -> Self {
        match token {
            "forward" => Action::Forward,
            "backward" => Action::Backward,
            "left" => Action::Left,
            "right" => Action::Right,
            "stop" => Action::Stop,
            _ => Action::Unknown,
        }
    }

    /// Token used on the wire. [`Action::Unknown`] has none of its own and is sent as `stop`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Forward => "forward",
            Action::Backward => "backward",
            Action::Left => "left",
            Action::Right => "right",
            Action::Stop | Action::Unknown => "stop",
        }
    }
}

/// One parsed motor command: `<action>,<duration>,<speed>`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionCommand {
    pub action: Action,
    /// How long to hold the maneuver, in milliseconds.
    pub duration_ms: u32,
    /// PWM duty, 0 (off) to 255 (fully on).
    pub speed: u8,
}

/// The line has no usable `<action>,<duration>,<speed>` structure.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidFormat;

impl MotionCommand {
    pub fn new(action: Action, duration_ms: u32, speed: u8) -> Self {
        Self {
            action,
            duration_ms,
            speed,
        }
    }

    /// Parse a trimmed command line.
    ///
    /// The action is everything before the first comma, the duration everything between the
    /// first and the last comma, and the speed everything after the last comma. The line is
    /// rejected when there is no comma, when the first comma is also the last one, or when the
    /// action is empty. Numbers that fail to parse become zero.
    pub fn parse(line: &str) -> Result<Self, InvalidFormat> {
        let first = line.find(',').ok_or(InvalidFormat)?;
        let last = line.rfind(',').ok_or(InvalidFormat)?;
        if first == 0 || last <= first {
            return Err(InvalidFormat);
        }

        let duration = parse_int(&line[first + 1..last]);
        let speed = parse_int(&line[last + 1..]);

        Ok(Self {
            action: Action::from_token(&line[..first]),
            duration_ms: u32::try_from(duration).unwrap_or(0),
            speed: speed.clamp(0, u8::MAX.into()) as u8,
        })
    }
}

/// Encodes the command as the line a host sends, without the terminator.
impl fmt::Display for MotionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{}",
            self.action.as_str(),
            self.duration_ms,
            self.speed
        )
    }
}

/// What a single inbound line asks for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    /// `REQ`: report the current distance.
    Distance,
    /// Run a maneuver and acknowledge it.
    Motion(MotionCommand),
}

impl Request {
    /// Classify a line. Surrounding whitespace is ignored.
    pub fn parse(line: &str) -> Result<Self, InvalidFormat> {
        let line = line.trim();
        if line == REQUEST_TOKEN {
            Ok(Request::Distance)
        } else {
            MotionCommand::parse(line).map(Request::Motion)
        }
    }
}

/// Lenient integer parse: optional leading whitespace and sign, then the longest run of digits.
/// Anything else yields what was read so far (zero if nothing). Saturates instead of overflowing.
fn parse_int(field: &str) -> i32 {
    let field = field.trim_start();
    let (negative, digits) = match field.as_bytes().first() {
        Some(b'-') => (true, &field[1..]),
        Some(b'+') => (false, &field[1..]),
        _ => (false, field),
    };

    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i32, |acc, digit| {
            acc.saturating_mul(10).saturating_add(i32::from(digit - b'0'))
        });

    if negative {
        -magnitude
    } else {
        magnitude
    }
}
