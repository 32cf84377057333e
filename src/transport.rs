use core::time::Duration;

use embedded_io::{Read, ReadExactError, Write};

/// Duplex byte channel to the sensor.
///
/// Reads and writes go through the `embedded-io` traits; the extra methods
/// cover what a UART driver needs beyond a plain stream: a count of bytes
/// waiting in the receive buffer and the ability to discard either buffer.
pub trait Transport: Read + Write {
    /// Number of received bytes that can be read without blocking.
    fn bytes_available(&mut self) -> Result<usize, Self::Error>;

    /// Discards everything received but not yet read.
    fn clear_input(&mut self) -> Result<(), Self::Error>;

    /// Discards everything written but not yet transmitted.
    fn clear_output(&mut self) -> Result<(), Self::Error>;

    /// Reads a single byte. Only call this once `bytes_available` reported data.
    fn read_byte(&mut self) -> Result<u8, ReadExactError<Self::Error>> {
        let mut byte = [0u8; 1];
        self.read_exact(&mut byte)?;
        Ok(byte[0])
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn bytes_available(&mut self) -> Result<usize, Self::Error> {
        T::bytes_available(self)
    }

    fn clear_input(&mut self) -> Result<(), Self::Error> {
        T::clear_input(self)
    }

    fn clear_output(&mut self) -> Result<(), Self::Error> {
        T::clear_output(self)
    }
}

/// Monotonic time source used to evaluate deadlines.
pub trait Clock {
    /// Time elapsed since an arbitrary, fixed origin.
    fn now(&mut self) -> Duration;

    /// Blocks for at least `duration`. The default spins on [`Clock::now`].
    fn delay(&mut self, duration: Duration) {
        let until = self.now().saturating_add(duration);
        while self.now() < until {
            core::hint::spin_loop();
        }
    }
}

/// [`Clock`] backed by `std::time::Instant`.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now(&mut self) -> Duration {
        self.origin.elapsed()
    }

    fn delay(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
