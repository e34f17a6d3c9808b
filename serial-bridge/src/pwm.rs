//! One RP2040 PWM output as an `embedded-hal` duty-cycle channel.

use core::convert::Infallible;

use embassy_rp::pwm::{Config, Pwm};
use embedded_hal::pwm::{ErrorType, SetDutyCycle};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Output {
    A,
    B,
}

pub struct PwmChannel<'d> {
    pwm: Pwm<'d>,
    config: Config,
    output: Output,
}

impl<'d> PwmChannel<'d> {
    /// `config` must be the one `pwm` was created with.
    pub fn new(pwm: Pwm<'d>, config: Config, output: Output) -> Self {
        Self {
            pwm,
            config,
            output,
        }
    }

    /// Slice settings for the motor enables: counting up to `top`, starting fully off.
    pub fn config(top: u16) -> Config {
        let mut config = Config::default();
        config.top = top;
        config.compare_a = 0;
        config.compare_b = 0;
        config
    }
}

impl ErrorType for PwmChannel<'_> {
    type Error = Infallible;
}

impl SetDutyCycle for PwmChannel<'_> {
    fn max_duty_cycle(&self) -> u16 {
        self.config.top
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        match self.output {
            Output::A => self.config.compare_a = duty,
            Output::B => self.config.compare_b = duty,
        }
        self.pwm.set_config(&self.config);
        Ok(())
    }
}
