use thiserror::Error;

/// Outcome of the most recent driver operation.
///
/// Every frame read and command exchange overwrites the status held by the
/// driver. Only [`Status::Ready`] counts as success; the signal-quality
/// variants report a problem with the physical reading, not with the link.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    #[error("READY")]
    Ready = 0,
    #[error("SERIAL")]
    SerialError = 1,
    #[error("HEADER")]
    HeaderTimeout = 2,
    #[error("CHECKSUM")]
    ChecksumFailure = 3,
    #[error("TIMEOUT")]
    Timeout = 4,
    #[error("PASS")]
    Pass = 5,
    #[error("FAIL")]
    CommandFailed = 6,
    // I2C variants are never produced on the serial path.
    #[error("I2C-READ")]
    I2cRead = 7,
    #[error("I2C-WRITE")]
    I2cWrite = 8,
    #[error("I2C-LENGTH")]
    I2cLength = 9,
    #[error("Signal weak")]
    WeakSignal = 10,
    #[error("Signal saturation")]
    StrongSignal = 11,
    #[error("Ambient light saturation")]
    FloodSignal = 12,
    #[error("MEASURE")]
    Measure = 13,
}

impl Status {
    /// Numeric status code as reported by the vendor libraries.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns `true` for statuses that describe the reading rather than the link.
    pub fn is_signal_quality(self) -> bool {
        matches!(
            self,
            Status::WeakSignal | Status::StrongSignal | Status::FloodSignal
        )
    }
}

/// Result of a single driver call: the status it produced and, when there is
/// one, the value decoded along the way.
///
/// A value may be present even when the status is not [`Status::Ready`]: a
/// weak-signal frame still carries its distance for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome<T> {
    pub status: Status,
    pub value: Option<T>,
}

impl<T> Outcome<T> {
    pub(crate) fn ready(value: T) -> Self {
        Self {
            status: Status::Ready,
            value: Some(value),
        }
    }

    pub(crate) fn failed(status: Status) -> Self {
        Self {
            status,
            value: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == Status::Ready
    }

    /// Converts into a `Result`, keeping the value only when the call succeeded.
    pub fn into_result(self) -> Result<T, Status> {
        match (self.status, self.value) {
            (Status::Ready, Some(value)) => Ok(value),
            (Status::Ready, None) => Err(Status::Measure),
            (status, _) => Err(status),
        }
    }
}

/// Errors raised while building command parameters.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamError {
    #[error("unsupported baud rate: {0}")]
    UnsupportedBaudRate(u32),
}
