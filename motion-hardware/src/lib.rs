//! L298N dual H-bridge driving a differential chassis.
//!
//! Channel A (`ENA`, `IN1`, `IN2`) drives the left side and channel B (`ENB`, `IN3`, `IN4`) the
//! right side. Each timed maneuver energises both channels, blocks for the requested time and
//! then returns both channels to rest.
#![cfg_attr(not(test), no_std)]

mod fmt;

use embedded_hal::{
    delay::DelayNs,
    digital::{OutputPin, PinState},
    pwm::SetDutyCycle,
};
use high_level_cmds::Chassis;
use typebool::Bool;

#[derive(Debug, PartialEq, Eq)]
pub enum MotorError<PinErr, PwmErr> {
    Pin(PinErr),
    Pwm(PwmErr),
}

/// Which way one channel spins.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    Forward,
    Reverse,
}

/// `IsFirstPairForward` and `IsSecondPairForward` describe the wiring: `True` when driving
/// `IN1`/`IN3` high turns that side forward, `False` when the motor leads are swapped.
pub struct L298NMotorDriver<
    EN1,
    EN2,
    OUT1,
    OUT2,
    OUT3,
    OUT4,
    D,
    IsFirstPairForward,
    IsSecondPairForward,
> where
    EN1: SetDutyCycle,
    EN2: SetDutyCycle,
    OUT1: OutputPin,
    OUT2: OutputPin,
    OUT3: OutputPin,
    OUT4: OutputPin,
    D: DelayNs,
    IsFirstPairForward: Bool,
    IsSecondPairForward: Bool,
{
    enable_1: EN1,
    enable_2: EN2,
    out_1: OUT1,
    out_2: OUT2,
    out_3: OUT3,
    out_4: OUT4,
    delay: D,
    _first_pair_forward: IsFirstPairForward,
    _second_pair_forward: IsSecondPairForward,
}

impl<EN1, EN2, OUT1, OUT2, OUT3, OUT4, D, FPF, SPF, PinErr, PwmErr>
    L298NMotorDriver<EN1, EN2, OUT1, OUT2, OUT3, OUT4, D, FPF, SPF>
where
    EN1: SetDutyCycle<Error = PwmErr>,
    EN2: SetDutyCycle<Error = PwmErr>,
    OUT1: OutputPin<Error = PinErr>,
    OUT2: OutputPin<Error = PinErr>,
    OUT3: OutputPin<Error = PinErr>,
    OUT4: OutputPin<Error = PinErr>,
    D: DelayNs,
    FPF: Bool,
    SPF: Bool,
{
    /// Takes pins that are already configured as outputs. Call [`Self::init`] before driving.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        enable_1: EN1,
        enable_2: EN2,
        out_1: OUT1,
        out_2: OUT2,
        out_3: OUT3,
        out_4: OUT4,
        delay: D,
        first_pair_forward: FPF,
        second_pair_forward: SPF,
    ) -> Self {
        Self {
            enable_1,
            enable_2,
            out_1,
            out_2,
            out_3,
            out_4,
            delay,
            _first_pair_forward: first_pair_forward,
            _second_pair_forward: second_pair_forward,
        }
    }

    /// Bring all six lines to rest. Must run once, before any maneuver.
    pub fn init(&mut self) -> Result<(), MotorError<PinErr, PwmErr>> {
        debug!("initialising L298N");
        self.stop()
    }

    pub fn move_forward(
        &mut self,
        speed: u8,
        duration_ms: u32,
    ) -> Result<(), MotorError<PinErr, PwmErr>> {
        self.maneuver(Rotation::Forward, Rotation::Forward, speed, duration_ms)
    }

    pub fn move_backward(
        &mut self,
        speed: u8,
        duration_ms: u32,
    ) -> Result<(), MotorError<PinErr, PwmErr>> {
        self.maneuver(Rotation::Reverse, Rotation::Reverse, speed, duration_ms)
    }

    /// Pivot in place: left side reverse, right side forward.
    pub fn turn_left(
        &mut self,
        speed: u8,
        duration_ms: u32,
    ) -> Result<(), MotorError<PinErr, PwmErr>> {
        self.maneuver(Rotation::Reverse, Rotation::Forward, speed, duration_ms)
    }

    /// Pivot in place: left side forward, right side reverse.
    pub fn turn_right(
        &mut self,
        speed: u8,
        duration_ms: u32,
    ) -> Result<(), MotorError<PinErr, PwmErr>> {
        self.maneuver(Rotation::Forward, Rotation::Reverse, speed, duration_ms)
    }

    /// Zero duty on both channels, then all four direction lines low.
    ///
    /// Every line is written even if an earlier write fails; the first error is returned.
    pub fn stop(&mut self) -> Result<(), MotorError<PinErr, PwmErr>> {
        [
            self.enable_1
                .set_duty_cycle_fully_off()
                .map_err(MotorError::Pwm),
            self.enable_2
                .set_duty_cycle_fully_off()
                .map_err(MotorError::Pwm),
            self.out_1.set_low().map_err(MotorError::Pin),
            self.out_2.set_low().map_err(MotorError::Pin),
            self.out_3.set_low().map_err(MotorError::Pin),
            self.out_4.set_low().map_err(MotorError::Pin),
        ]
        .into_iter()
        .collect()
    }

    /// Drive, hold, then rest. The rest step runs even if driving failed; the first error wins.
    fn maneuver(
        &mut self,
        left: Rotation,
        right: Rotation,
        speed: u8,
        duration_ms: u32,
    ) -> Result<(), MotorError<PinErr, PwmErr>> {
        debug!(
            "left {} right {} at {} for {} ms",
            left, right, speed, duration_ms
        );
        let driven = self.drive(left, right, speed);
        if driven.is_ok() {
            self.delay.delay_ms(duration_ms);
        } else {
            warn!("failed to energise, stopping");
        }
        let rested = self.stop();
        driven.and(rested)
    }

    fn drive(
        &mut self,
        left: Rotation,
        right: Rotation,
        speed: u8,
    ) -> Result<(), MotorError<PinErr, PwmErr>> {
        let first = left == Rotation::Forward;
        let second = right == Rotation::Forward;

        // IN1/IN2 and IN3/IN4 are always driven to opposite levels
        self.out_1
            .set_state(PinState::from(first == FPF::VALUE))
            .map_err(MotorError::Pin)?;
        self.out_2
            .set_state(PinState::from(first != FPF::VALUE))
            .map_err(MotorError::Pin)?;
        self.out_3
            .set_state(PinState::from(second == SPF::VALUE))
            .map_err(MotorError::Pin)?;
        self.out_4
            .set_state(PinState::from(second != SPF::VALUE))
            .map_err(MotorError::Pin)?;

        self.enable_1
            .set_duty_cycle_fraction(speed.into(), u8::MAX.into())
            .map_err(MotorError::Pwm)?;
        self.enable_2
            .set_duty_cycle_fraction(speed.into(), u8::MAX.into())
            .map_err(MotorError::Pwm)?;
        Ok(())
    }
}

impl<EN1, EN2, OUT1, OUT2, OUT3, OUT4, D, FPF, SPF, PinErr, PwmErr> Chassis
    for L298NMotorDriver<EN1, EN2, OUT1, OUT2, OUT3, OUT4, D, FPF, SPF>
where
    EN1: SetDutyCycle<Error = PwmErr>,
    EN2: SetDutyCycle<Error = PwmErr>,
    OUT1: OutputPin<Error = PinErr>,
    OUT2: OutputPin<Error = PinErr>,
    OUT3: OutputPin<Error = PinErr>,
    OUT4: OutputPin<Error = PinErr>,
    D: DelayNs,
    FPF: Bool,
    SPF: Bool,
    PinErr: core::fmt::Debug,
    PwmErr: core::fmt::Debug,
{
    type Error = MotorError<PinErr, PwmErr>;

    fn forward(&mut self, speed: u8, duration_ms: u32) -> Result<(), Self::Error> {
        self.move_forward(speed, duration_ms)
    }

    fn backward(&mut self, speed: u8, duration_ms: u32) -> Result<(), Self::Error> {
        self.move_backward(speed, duration_ms)
    }

    fn turn_left(&mut self, speed: u8, duration_ms: u32) -> Result<(), Self::Error> {
        L298NMotorDriver::turn_left(self, speed, duration_ms)
    }

    fn turn_right(&mut self, speed: u8, duration_ms: u32) -> Result<(), Self::Error> {
        L298NMotorDriver::turn_right(self, speed, duration_ms)
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        L298NMotorDriver::stop(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::{digital, pwm};
    use high_level_cmds::{Interpreter, MotionCommand, Reply};
    use std::{cell::RefCell, rc::Rc};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Pin(&'static str, bool),
        Duty(&'static str, u16),
        Hold(u32),
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    #[derive(Debug, PartialEq, Eq)]
    struct PinFault;

    impl digital::Error for PinFault {
        fn kind(&self) -> digital::ErrorKind {
            digital::ErrorKind::Other
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    struct PwmFault;

    impl pwm::Error for PwmFault {
        fn kind(&self) -> pwm::ErrorKind {
            pwm::ErrorKind::Other
        }
    }

    struct MockPin {
        name: &'static str,
        log: Log,
        broken: bool,
    }

    impl digital::ErrorType for MockPin {
        type Error = PinFault;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), PinFault> {
            self.set(false)
        }

        fn set_high(&mut self) -> Result<(), PinFault> {
            self.set(true)
        }
    }

    impl MockPin {
        fn set(&mut self, high: bool) -> Result<(), PinFault> {
            if self.broken {
                return Err(PinFault);
            }
            self.log.borrow_mut().push(Event::Pin(self.name, high));
            Ok(())
        }
    }

    /// 8-bit PWM so duties read back as the commanded speed.
    struct MockPwm {
        name: &'static str,
        log: Log,
    }

    impl pwm::ErrorType for MockPwm {
        type Error = PwmFault;
    }

    impl SetDutyCycle for MockPwm {
        fn max_duty_cycle(&self) -> u16 {
            255
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), PwmFault> {
            self.log.borrow_mut().push(Event::Duty(self.name, duty));
            Ok(())
        }
    }

    struct MockDelay {
        log: Log,
    }

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.log.borrow_mut().push(Event::Hold(ns / 1_000_000));
        }

        fn delay_ms(&mut self, ms: u32) {
            self.log.borrow_mut().push(Event::Hold(ms));
        }
    }

    type MockDriver<FPF, SPF> =
        L298NMotorDriver<MockPwm, MockPwm, MockPin, MockPin, MockPin, MockPin, MockDelay, FPF, SPF>;

    fn driver_with<FPF: Bool, SPF: Bool>(
        log: &Log,
        broken: Option<&'static str>,
        fpf: FPF,
        spf: SPF,
    ) -> MockDriver<FPF, SPF> {
        let pin = |name| MockPin {
            name,
            log: log.clone(),
            broken: broken == Some(name),
        };
        let pwm = |name| MockPwm {
            name,
            log: log.clone(),
        };
        L298NMotorDriver::new(
            pwm("ENA"),
            pwm("ENB"),
            pin("IN1"),
            pin("IN2"),
            pin("IN3"),
            pin("IN4"),
            MockDelay { log: log.clone() },
            fpf,
            spf,
        )
    }

    fn driver(log: &Log) -> MockDriver<typebool::True, typebool::True> {
        driver_with(log, None, typebool::True, typebool::True)
    }

    fn rest() -> Vec<Event> {
        vec![
            Event::Duty("ENA", 0),
            Event::Duty("ENB", 0),
            Event::Pin("IN1", false),
            Event::Pin("IN2", false),
            Event::Pin("IN3", false),
            Event::Pin("IN4", false),
        ]
    }

    fn energise(in1: bool, in2: bool, in3: bool, in4: bool, speed: u16) -> Vec<Event> {
        vec![
            Event::Pin("IN1", in1),
            Event::Pin("IN2", in2),
            Event::Pin("IN3", in3),
            Event::Pin("IN4", in4),
            Event::Duty("ENA", speed),
            Event::Duty("ENB", speed),
        ]
    }

    fn maneuver(energised: Vec<Event>, hold_ms: u32) -> Vec<Event> {
        let mut events = energised;
        events.push(Event::Hold(hold_ms));
        events.extend(rest());
        events
    }

    #[test]
    fn test_init_brings_lines_to_rest() {
        let log = Log::default();
        let mut motors = driver(&log);

        motors.init().unwrap();

        assert_eq!(*log.borrow(), rest());
    }

    #[test]
    fn test_forward_drives_holds_and_rests() {
        let log = Log::default();
        let mut motors = driver(&log);

        motors.move_forward(150, 500).unwrap();

        assert_eq!(
            *log.borrow(),
            maneuver(energise(true, false, true, false, 150), 500)
        );
    }

    #[test]
    fn test_direction_table() {
        type Op = fn(&mut MockDriver<typebool::True, typebool::True>, u8, u32)
            -> Result<(), MotorError<PinFault, PwmFault>>;
        let cases: [(Op, [bool; 4]); 4] = [
            (|m, s, d| m.move_forward(s, d), [true, false, true, false]),
            (|m, s, d| m.move_backward(s, d), [false, true, false, true]),
            (|m, s, d| m.turn_left(s, d), [false, true, true, false]),
            (|m, s, d| m.turn_right(s, d), [true, false, false, true]),
        ];

        for (op, [in1, in2, in3, in4]) in cases {
            let log = Log::default();
            let mut motors = driver(&log);

            op(&mut motors, 200, 75).unwrap();

            assert_eq!(
                *log.borrow(),
                maneuver(energise(in1, in2, in3, in4, 200), 75)
            );
        }
    }

    #[test]
    fn test_swapped_wiring_inverts_pairs() {
        let log = Log::default();
        let mut motors = driver_with(&log, None, typebool::False, typebool::True);

        motors.move_forward(10, 1).unwrap();

        assert_eq!(
            *log.borrow(),
            maneuver(energise(false, true, true, false, 10), 1)
        );
    }

    #[test]
    fn test_speed_extremes() {
        let log = Log::default();
        let mut motors = driver(&log);

        motors.move_forward(0, 0).unwrap();
        motors.move_backward(255, 0).unwrap();

        let mut expected = maneuver(energise(true, false, true, false, 0), 0);
        expected.extend(maneuver(energise(false, true, false, true, 255), 0));
        assert_eq!(*log.borrow(), expected);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let log = Log::default();
        let mut motors = driver(&log);

        motors.init().unwrap();
        motors.stop().unwrap();
        motors.stop().unwrap();

        assert_eq!(*log.borrow(), [rest(), rest(), rest()].concat());
    }

    #[test]
    fn test_failed_energise_skips_hold_but_rests() {
        let log = Log::default();
        let mut motors = driver_with(&log, Some("IN3"), typebool::True, typebool::True);

        let result = motors.move_forward(100, 1000);

        assert_eq!(result, Err(MotorError::Pin(PinFault)));
        let events = log.borrow();
        assert!(!events.iter().any(|e| matches!(e, Event::Hold(_))));
        // IN3 can't be written, everything else still reaches rest
        assert_eq!(
            events[events.len() - 5..],
            [
                Event::Duty("ENA", 0),
                Event::Duty("ENB", 0),
                Event::Pin("IN1", false),
                Event::Pin("IN2", false),
                Event::Pin("IN4", false),
            ]
        );
    }

    #[test]
    fn test_chassis_execute_uses_driver() {
        let log = Log::default();
        let mut motors = driver(&log);

        Chassis::execute(
            &mut motors,
            &MotionCommand::new(high_level_cmds::Action::Left, 300, 90),
        )
        .unwrap();
        Chassis::execute(
            &mut motors,
            &MotionCommand::new(high_level_cmds::Action::Unknown, 300, 90),
        )
        .unwrap();

        let mut expected = maneuver(energise(false, true, true, false, 90), 300);
        expected.extend(rest());
        assert_eq!(*log.borrow(), expected);
    }

    #[test]
    fn test_serial_transactions_end_to_end() {
        let log = Log::default();
        let mut motors = driver(&log);
        motors.init().unwrap();
        log.borrow_mut().clear();

        let mut interp = Interpreter::<_, _>::new(motors, || Some(0u16));
        let mut out = Vec::new();

        assert_eq!(
            interp.handle_line("forward,500,150", &mut out),
            Ok(Reply::Done(MotionCommand::new(
                high_level_cmds::Action::Forward,
                500,
                150
            )))
        );
        interp.handle_line("spin,100,50", &mut out).unwrap();
        interp.handle_line("forward", &mut out).unwrap();
        interp.handle_line("REQ", &mut out).unwrap();

        let mut expected = maneuver(energise(true, false, true, false, 150), 500);
        // unknown action: straight to rest, no 100 ms hold
        expected.extend(rest());
        assert_eq!(*log.borrow(), expected);

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "DONE\r\nDONE\r\nERROR: Invalid command format\r\nDONE\r\n200\r\n"
        );
    }
}
