//! Drive controller firmware: reads commands from the host over UART0, drives an L298N and
//! answers distance requests from an HC-SR04.
#![no_std]
#![no_main]

mod config;
mod hcsr04;
mod pwm;
mod serial;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::pwm::Pwm;
use embassy_rp::uart::{self, Uart};
use embassy_time::Delay;
use high_level_cmds::{Interpreter, InterpreterError, Reply};
use motion_hardware::L298NMotorDriver;
use {defmt_rtt as _, panic_probe as _};

use crate::hcsr04::Hcsr04;
use crate::pwm::PwmChannel;
use crate::serial::SerialPort;

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Program start");
    let p = embassy_rp::init(Default::default());

    let mut uart_config = uart::Config::default();
    uart_config.baudrate = config::BAUD_RATE;
    let uart = Uart::new_blocking(p.UART0, p.PIN_16, p.PIN_17, uart_config);
    let mut port = SerialPort::new(uart);

    let out1 = Output::new(p.PIN_0, Level::Low);
    let out2 = Output::new(p.PIN_1, Level::Low);
    let out3 = Output::new(p.PIN_2, Level::Low);
    let out4 = Output::new(p.PIN_3, Level::Low);

    let pwm_config = PwmChannel::config(config::PWM_TOP);
    let en1 = PwmChannel::new(
        Pwm::new_output_a(p.PWM_SLICE2, p.PIN_4, pwm_config.clone()),
        pwm_config.clone(),
        pwm::Output::A,
    );
    let en2 = PwmChannel::new(
        Pwm::new_output_b(p.PWM_SLICE5, p.PIN_11, pwm_config.clone()),
        pwm_config,
        pwm::Output::B,
    );

    let mut motors = L298NMotorDriver::new(
        en1,
        en2,
        out1,
        out2,
        out3,
        out4,
        Delay,
        typebool::True,
        typebool::True,
    );
    if motors.init().is_err() {
        error!("motor lines did not reach rest");
    }

    let sonar = Hcsr04::new(
        Output::new(p.PIN_14, Level::Low),
        Input::new(p.PIN_15, Pull::None),
    );

    let mut interpreter =
        Interpreter::<_, _>::new(motors, sonar).with_trace(config::SERIAL_TRACE);
    info!("ready, {} baud", config::BAUD_RATE);

    // One line at a time; a maneuver blocks here until it has finished
    loop {
        match interpreter.poll(&mut port) {
            Ok(Reply::Rejected) => warn!("malformed command"),
            Ok(Reply::Faulted(command)) => error!("motor fault during {}", command),
            Ok(reply) => debug!("{}", reply),
            Err(InterpreterError::Io(e)) => warn!("serial error: {}", e),
            Err(InterpreterError::Closed) => warn!("serial link closed"),
        }
    }
}
