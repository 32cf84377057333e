#![cfg_attr(not(test), no_std)]

//! Blocking driver for the Benewake TFMini-Plus LIDAR over UART.
//!
//! The sensor streams 9-byte measurement frames continuously
//! (`59 59 DistL DistH FluxL FluxH TempL TempH Chk`) and answers
//! configuration commands framed as `5A len payload... chk`. This crate
//! finds frames in the byte stream, validates their checksums, and encodes
//! and validates the command/reply exchanges.
//!
//! The driver is generic over a [`Transport`] (any `embedded-io` stream
//! that can also report how many bytes are waiting and discard its buffers)
//! and a [`Clock`] used to bound every operation by [`Config::timeout`].
//! With the `serial` feature, [`serial::open`] provides a transport backed
//! by the `serialport` crate.
//!
//! ```no_run
//! # #[cfg(feature = "serial")]
//! # fn main() -> Result<(), serialport::Error> {
//! use tfmini_plus::{serial, Config, StdClock, TfMiniPlus};
//!
//! let port = serial::open("/dev/ttyUSB0", 115_200)?;
//! let mut lidar = TfMiniPlus::new(port, StdClock::new(), Config::default());
//! if lidar.begin() {
//!     loop {
//!         match lidar.get_data().into_result() {
//!             Ok(m) => println!("{} cm, flux {}, {} C", m.distance, m.flux, m.temperature),
//!             Err(status) => println!("Status: {}", status),
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "serial"))]
//! # fn main() {}
//! ```

#[cfg(all(feature = "std", not(test)))]
extern crate std;

use core::time::Duration;

use log::{debug, error, warn};

pub use embedded_io;

mod constants;
pub use constants::*;

mod error;
pub use error::*;

mod config;
pub use config::*;

mod transport;
pub use transport::*;

mod frame;
pub use frame::*;

mod command;
pub use command::*;

#[cfg(feature = "serial")]
pub mod serial;

/// Coarse driver state derived from `begin` and the last status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// `begin` has not succeeded yet.
    Uninitialized,
    /// The last operation succeeded.
    Ready,
    /// The last operation failed; the next call starts over.
    Degraded,
}

/// Represents a TFMini-Plus LIDAR attached to a serial link.
///
/// Every operation blocks the calling thread, polling the transport until it
/// completes or [`Config::timeout`] elapses. Nothing is retried internally:
/// a caller polling in a loop treats any non-ready outcome as "try again".
///
/// # Type Parameters
///
/// * `T`: The serial link to the sensor, see [`Transport`].
/// * `C`: The monotonic time source used for deadlines, see [`Clock`].
pub struct TfMiniPlus<T, C> {
    transport: T,
    clock: C,
    config: Config,
    begun: bool,
    status: Status,
    frame: Frame,
    measurement: Measurement,
    reply: Reply,
    version: Option<FirmwareVersion>,
}

impl<T, C> TfMiniPlus<T, C>
where
    T: Transport,
    C: Clock,
{
    /// Creates a new driver instance.
    ///
    /// # Arguments
    ///
    /// * `transport`: The open serial link, already set to the sensor's baud rate.
    /// * `clock`: Monotonic time source for deadlines and the settle delay.
    /// * `config`: Deadlines and synchronization options.
    ///
    /// # Returns
    ///
    /// A new `TfMiniPlus` instance. Call [`TfMiniPlus::begin`] before reading.
    pub fn new(transport: T, clock: C, config: Config) -> Self {
        Self {
            transport,
            clock,
            config,
            begun: false,
            status: Status::Ready,
            frame: Frame::default(),
            measurement: Measurement::default(),
            reply: Reply::empty(),
            version: None,
        }
    }

    /// Waits for the link to settle and checks that the sensor is talking.
    ///
    /// Returns `true` when at least one byte has arrived after
    /// [`Config::settle_delay`]. Otherwise the status becomes
    /// [`Status::SerialError`] and `false` is returned.
    pub fn begin(&mut self) -> bool {
        self.clock.delay(self.config.settle_delay);
        match self.transport.bytes_available() {
            Ok(n) if n > 0 => {
                debug!("Sensor active, {} bytes waiting after settle", n);
                self.begun = true;
                self.status = Status::Ready;
                true
            }
            Ok(_) => {
                error!("No data from sensor after {:?}", self.config.settle_delay);
                self.status = Status::SerialError;
                false
            }
            Err(e) => {
                error!("Serial error while probing sensor: {:?}", e);
                self.status = Status::SerialError;
                false
            }
        }
    }

    /// Reads the next measurement frame from the stream.
    ///
    /// This involves:
    /// - Discarding buffered input beyond one frame, when
    ///   [`Config::drain_backlog`] is set.
    /// - Sliding over incoming bytes until two `0x59` header bytes line up,
    ///   or the deadline passes ([`Status::HeaderTimeout`]).
    /// - Validating the checksum ([`Status::ChecksumFailure`]). A corrupted
    ///   frame ends the call; the next call searches again.
    /// - Decoding the fields and mapping sentinel values to the signal
    ///   quality statuses.
    ///
    /// The measurement is returned whenever the frame was valid, including
    /// for weak, saturated and flooded readings.
    pub fn get_data(&mut self) -> Outcome<Measurement> {
        self.status = Status::Ready;
        self.measurement = Measurement::default();
        let deadline = self.deadline();

        if self.config.drain_backlog {
            if let Err(status) = self.drain_backlog() {
                return self.fail(status);
            }
        }

        let mut window = SyncWindow::new(FRAME_SIZE);
        let synced = self.sync(&mut window, FRAME_HEADER, FRAME_HEADER, deadline);
        self.frame = Frame::from_window(&window);
        if let Err(status) = synced {
            return self.fail(status);
        }

        let (measurement, status) = match self.frame.decode() {
            Ok(decoded) => decoded,
            Err(status) => {
                warn!("Rejected frame {} ({})", self.frame, status);
                return self.fail(status);
            }
        };
        if status.is_signal_quality() {
            warn!("{}: {:?}", status, measurement);
        } else {
            debug!("Frame {:02X?} -> {:?}", self.frame.bytes(), measurement);
        }
        self.measurement = measurement;
        self.status = status;
        Outcome {
            status,
            value: Some(measurement),
        }
    }

    /// Sends a command and, unless the command has no reply, waits for the
    /// sensor's answer.
    ///
    /// Both transport buffers are discarded before the packet is written, so
    /// stale frames cannot be mistaken for the reply.
    ///
    /// # Returns
    ///
    /// * `Ready` with the reply (empty for commands without one) on success.
    /// * `HeaderTimeout` if no `5A len` header arrived before the deadline.
    /// * `ChecksumFailure` if the reply was corrupted.
    /// * `CommandFailed` with the reply if a reset or save was rejected.
    /// * `SerialError` if the transport failed.
    pub fn send_command(&mut self, command: Command) -> Outcome<Reply> {
        let packet = command.encode();
        debug!("Executing {:?}: {}", command, packet);

        if let Err(e) = self.transmit(packet.as_bytes()) {
            error!("Failed to send {:?}: {:?}", command, e);
            return self.fail(Status::SerialError);
        }

        let reply_len = command.reply_len();
        if reply_len == 0 {
            self.reply = Reply::empty();
            self.status = Status::Ready;
            return Outcome::ready(self.reply);
        }

        let deadline = self.deadline();
        let mut window = SyncWindow::new(reply_len);
        let synced = self.sync(&mut window, PACKET_HEADER, reply_len as u8, deadline);
        self.reply = Reply::from_window(&window);
        if let Err(status) = synced {
            return self.fail(status);
        }

        let status = self.reply.validate(&command);
        self.status = status;
        match status {
            Status::Ready => {
                if command == Command::GetFirmwareVersion {
                    self.version = self.reply.firmware_version();
                    if let Some(version) = self.version {
                        debug!("Firmware version: {}", version);
                    }
                }
                debug!("Reply to {:?}: {}", command, self.reply);
                Outcome::ready(self.reply)
            }
            Status::CommandFailed => {
                error!("Sensor rejected {:?}, reply: {}", command, self.reply);
                Outcome {
                    status,
                    value: Some(self.reply),
                }
            }
            _ => {
                warn!("Bad reply checksum for {:?}: {}", command, self.reply);
                Outcome::failed(status)
            }
        }
    }

    /// Status produced by the most recent operation.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Coarse state: uninitialized until `begin` succeeds, then ready or degraded.
    pub fn state(&self) -> DriverState {
        match (self.begun, self.status) {
            (false, _) => DriverState::Uninitialized,
            (true, Status::Ready) => DriverState::Ready,
            (true, _) => DriverState::Degraded,
        }
    }

    /// Window from the last frame search: the located frame, valid or not,
    /// or the bytes seen before the search timed out.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Measurement decoded by the last `get_data`, zeroed if it failed.
    pub fn measurement(&self) -> Measurement {
        self.measurement
    }

    /// Window from the last reply search: the reply, or the bytes seen before
    /// the search timed out. Empty after a command without a reply.
    pub fn reply(&self) -> &Reply {
        &self.reply
    }

    /// Firmware version, once a [`Command::GetFirmwareVersion`] exchange succeeded.
    pub fn version(&self) -> Option<FirmwareVersion> {
        self.version
    }

    /// Configuration the driver was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable access to the underlying transport, e.g. to change port settings.
    pub fn transport(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Gives back the transport and clock. Closing the port is up to the caller.
    pub fn release(self) -> (T, C) {
        (self.transport, self.clock)
    }

    fn fail<V>(&mut self, status: Status) -> Outcome<V> {
        self.status = status;
        Outcome::failed(status)
    }

    // Drops everything but the most recent frame's worth of input.
    fn drain_backlog(&mut self) -> Result<(), Status> {
        let mut dropped = 0usize;
        while self.available()? > FRAME_SIZE {
            self.next_byte()?;
            dropped += 1;
        }
        if dropped > 0 {
            debug!("Drained {} stale bytes", dropped);
        }
        Ok(())
    }

    // Saturates so that `Duration::MAX` means "no deadline" instead of overflowing.
    fn deadline(&mut self) -> Duration {
        self.clock.now().saturating_add(self.config.timeout)
    }

    // Slides `window` over the stream until its first two bytes are `first`
    // and `second`. On timeout the window keeps the bytes seen so far.
    fn sync(
        &mut self,
        window: &mut SyncWindow,
        first: u8,
        second: u8,
        deadline: Duration,
    ) -> Result<(), Status> {
        while !window.starts_with(first, second) {
            if self.available()? > 0 {
                window.push(self.next_byte()?);
            }
            if self.clock.now() > deadline {
                warn!(
                    "No {:02X} {:02X} header within {:?}",
                    first, second, self.config.timeout
                );
                return Err(Status::HeaderTimeout);
            }
        }
        Ok(())
    }

    fn available(&mut self) -> Result<usize, Status> {
        self.transport.bytes_available().map_err(|e| {
            error!("Serial error querying input: {:?}", e);
            Status::SerialError
        })
    }

    fn next_byte(&mut self) -> Result<u8, Status> {
        self.transport.read_byte().map_err(|e| {
            error!("Serial read error: {:?}", e);
            Status::SerialError
        })
    }

    fn transmit(&mut self, bytes: &[u8]) -> Result<(), T::Error> {
        self.transport.clear_input()?;
        self.transport.clear_output()?;
        self.transport.write_all(bytes)?;
        self.transport.flush()
    }
}
