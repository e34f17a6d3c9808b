//! HC-SR04 ultrasonic rangefinder, measured by busy-waiting on the echo pulse.

use embassy_rp::gpio::{Input, Output};
use embassy_time::{block_for, Duration, Instant};
use high_level_cmds::{Rangefinder, MAX_DISTANCE_CM};

/// Echo pulse length per centimetre of distance (sound travels there and back).
const US_PER_CM: u64 = 58;

/// Longest we wait for the echo line to rise after triggering.
const ECHO_START_TIMEOUT: Duration = Duration::from_millis(5);

/// Pulses longer than this are past the reporting range.
const ECHO_MAX: Duration = Duration::from_micros((MAX_DISTANCE_CM as u64 + 1) * US_PER_CM);

pub struct Hcsr04<'d> {
    trigger: Output<'d>,
    echo: Input<'d>,
}

impl<'d> Hcsr04<'d> {
    /// `trigger` should start low.
    pub fn new(trigger: Output<'d>, echo: Input<'d>) -> Self {
        Self { trigger, echo }
    }
}

impl Rangefinder for Hcsr04<'_> {
    fn measure_cm(&mut self) -> Option<u16> {
        self.trigger.set_low();
        block_for(Duration::from_micros(2));
        self.trigger.set_high();
        block_for(Duration::from_micros(10));
        self.trigger.set_low();

        let triggered = Instant::now();
        while self.echo.is_low() {
            if triggered.elapsed() > ECHO_START_TIMEOUT {
                defmt::debug!("no echo pulse");
                return None;
            }
        }

        let rise = Instant::now();
        while self.echo.is_high() {
            if rise.elapsed() > ECHO_MAX {
                defmt::debug!("echo out of range");
                return None;
            }
        }

        let cm = rise.elapsed().as_micros() / US_PER_CM;
        Some(u16::try_from(cm).unwrap_or(u16::MAX))
    }
}
