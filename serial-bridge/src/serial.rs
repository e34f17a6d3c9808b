//! `embedded-io` over the blocking RP2040 UART.

use embassy_rp::uart::{self, Blocking, Instance, Uart};
use embedded_io::{ErrorKind, ErrorType, Read, Write};

#[derive(Debug, defmt::Format)]
pub struct SerialError(pub uart::Error);

impl embedded_io::Error for SerialError {
    fn kind(&self) -> ErrorKind {
        match self.0 {
            uart::Error::Overrun => ErrorKind::Other,
            _ => ErrorKind::InvalidData,
        }
    }
}

pub struct SerialPort<'d, T: Instance> {
    uart: Uart<'d, T, Blocking>,
}

impl<'d, T: Instance> SerialPort<'d, T> {
    pub fn new(uart: Uart<'d, T, Blocking>) -> Self {
        Self { uart }
    }
}

impl<'d, T: Instance> ErrorType for SerialPort<'d, T> {
    type Error = SerialError;
}

impl<'d, T: Instance> Read for SerialPort<'d, T> {
    /// Blocks until at least one byte is available, then returns exactly one.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SerialError> {
        match buf.first_mut() {
            Some(byte) => {
                self.uart
                    .blocking_read(core::slice::from_mut(byte))
                    .map_err(SerialError)?;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

impl<'d, T: Instance> Write for SerialPort<'d, T> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, SerialError> {
        self.uart.blocking_write(buf).map_err(SerialError)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), SerialError> {
        self.uart.blocking_flush().map_err(SerialError)
    }
}
