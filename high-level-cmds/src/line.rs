//! Newline-delimited input over a byte stream.

use embedded_io::Read;
use heapless::Vec;

/// Longest line kept, not counting the terminator. Commands are far shorter than this.
pub const LINE_CAPACITY: usize = 64;

#[derive(Debug, PartialEq, Eq)]
pub enum LineError<E> {
    /// The underlying port failed.
    Read(E),
    /// The port reported end of stream.
    Closed,
    /// The line didn't fit the buffer. The rest of it was consumed and dropped.
    TooLong,
    /// The line isn't valid UTF-8.
    NotUtf8,
}

/// Collects bytes up to `\n` into a fixed buffer.
pub struct LineReader<const N: usize = LINE_CAPACITY> {
    buf: Vec<u8, N>,
}

impl<const N: usize> LineReader<N> {
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Block until a full line has arrived and return it without the `\n`.
    ///
    /// Any other whitespace, including a `\r` sent by the host, is left for the caller to trim.
    pub fn read_line<R: Read>(&mut self, port: &mut R) -> Result<&str, LineError<R::Error>> {
        self.buf.clear();
        let mut overflowed = false;

        loop {
            let mut byte = [0u8; 1];
            match port.read(&mut byte) {
                Ok(0) => return Err(LineError::Closed),
                Ok(_) => {}
                Err(e) => return Err(LineError::Read(e)),
            }

            if byte[0] == b'\n' {
                break;
            }
            // Keep draining an overlong line so the next read starts on a fresh one
            if self.buf.push(byte[0]).is_err() {
                overflowed = true;
            }
        }

        if overflowed {
            return Err(LineError::TooLong);
        }
        core::str::from_utf8(&self.buf).map_err(|_| LineError::NotUtf8)
    }
}

impl<const N: usize> Default for LineReader<N> {
    fn default() -> Self {
        Self::new()
    }
}
