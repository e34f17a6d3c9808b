//! Build-time settings for the bridge firmware.
//!
//! | Signal | GPIO | Peripheral |
//! |--------|------|------------|
//! | UART TX | 16 | UART0 |
//! | UART RX | 17 | UART0 |
//! | ENA (left duty) | 4 | PWM slice 2, output A |
//! | ENB (right duty) | 11 | PWM slice 5, output B |
//! | IN1, IN2 (left direction) | 0, 1 | SIO |
//! | IN3, IN4 (right direction) | 2, 3 | SIO |
//! | HC-SR04 trigger | 14 | SIO |
//! | HC-SR04 echo | 15 | SIO, through a 5 V to 3.3 V divider |

/// Host link rate, 8N1.
pub const BAUD_RATE: u32 = 9600;

/// PWM counter wrap. With the default divider this runs the L298N enable inputs at ~1.9 kHz.
pub const PWM_TOP: u16 = 0xFFFF;

/// Echo received lines and parsed fields back to the host before `DONE`.
pub const SERIAL_TRACE: bool = false;
