use core::fmt;

use crate::constants::{FRAME_HEADER, FRAME_SIZE, REPLY_MAX};
use crate::error::Status;

/// 8-bit additive checksum over `bytes`.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

const WINDOW_CAPACITY: usize = if FRAME_SIZE > REPLY_MAX {
    FRAME_SIZE
} else {
    REPLY_MAX
};

/// Fixed-width sliding window over the incoming byte stream.
///
/// Pushing a byte drops the oldest one. Indexing is relative to the oldest
/// byte, so `get(0)` and `get(1)` are where a packet header lands once the
/// window lines up with a packet boundary. A fresh window is all zeros, which
/// never matches either header.
#[derive(Debug, Clone)]
pub struct SyncWindow {
    buf: [u8; WINDOW_CAPACITY],
    width: usize,
    oldest: usize,
}

impl SyncWindow {
    /// Creates a zeroed window. `width` is clamped to `2..=9`.
    pub fn new(width: usize) -> Self {
        Self {
            buf: [0; WINDOW_CAPACITY],
            width: width.clamp(2, WINDOW_CAPACITY),
            oldest: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn push(&mut self, byte: u8) {
        self.buf[self.oldest] = byte;
        self.oldest = (self.oldest + 1) % self.width;
    }

    pub fn get(&self, index: usize) -> u8 {
        self.buf[(self.oldest + index) % self.width]
    }

    /// Whether the two oldest bytes equal `first` and `second`.
    pub fn starts_with(&self, first: u8, second: u8) -> bool {
        self.get(0) == first && self.get(1) == second
    }

    /// Copies the window, oldest byte first, into `out[..width]`.
    pub fn copy_to(&self, out: &mut [u8]) {
        for (i, slot) in out.iter_mut().take(self.width).enumerate() {
            *slot = self.get(i);
        }
    }
}

/// Raw 9-byte measurement frame as emitted by the sensor.
///
/// `59 59 DistL DistH FluxL FluxH TempL TempH Chk`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame(pub [u8; FRAME_SIZE]);

impl Frame {
    pub fn from_window(window: &SyncWindow) -> Self {
        let mut bytes = [0u8; FRAME_SIZE];
        window.copy_to(&mut bytes);
        Frame(bytes)
    }

    pub fn bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.0
    }

    pub fn has_header(&self) -> bool {
        self.0[0] == FRAME_HEADER && self.0[1] == FRAME_HEADER
    }

    pub fn is_checksum_valid(&self) -> bool {
        checksum(&self.0[..FRAME_SIZE - 1]) == self.0[FRAME_SIZE - 1]
    }

    fn field(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.0[offset], self.0[offset + 1]])
    }

    /// Extracts the measurement fields. Does not look at the checksum.
    pub fn measurement(&self) -> Measurement {
        Measurement {
            distance: self.field(2) as i16,
            flux: self.field(4) as i16,
            temperature: (self.field(6) >> 3) as i16 - 256,
        }
    }

    /// Header check, checksum check, then field decode.
    ///
    /// Frames that fail either check yield no measurement. A decoded
    /// measurement is paired with its signal-quality status.
    pub fn decode(&self) -> Result<(Measurement, Status), Status> {
        if !self.has_header() {
            return Err(Status::HeaderTimeout);
        }
        if !self.is_checksum_valid() {
            return Err(Status::ChecksumFailure);
        }
        let measurement = self.measurement();
        Ok((measurement, measurement.status()))
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

pub(crate) fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{:02X}", byte)?;
    }
    Ok(())
}

/// A single distance reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Measurement {
    /// Distance in centimetres (or millimetres in the mm output format).
    /// `-1` and `-4` are sentinel values for weak signal and ambient flood.
    pub distance: i16,
    /// Signal strength. `-1` signals saturation.
    pub flux: i16,
    /// Chip temperature in degrees Celsius.
    pub temperature: i16,
}

impl Measurement {
    /// Status implied by the sentinel values in the reading.
    pub fn status(&self) -> Status {
        if self.distance == -1 {
            Status::WeakSignal
        } else if self.flux == -1 {
            Status::StrongSignal
        } else if self.distance == -4 {
            Status::FloodSignal
        } else {
            Status::Ready
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(distance: u16, flux: u16, temp: u16) -> Frame {
        let mut bytes = [0u8; FRAME_SIZE];
        bytes[0] = FRAME_HEADER;
        bytes[1] = FRAME_HEADER;
        bytes[2..4].copy_from_slice(&distance.to_le_bytes());
        bytes[4..6].copy_from_slice(&flux.to_le_bytes());
        bytes[6..8].copy_from_slice(&temp.to_le_bytes());
        bytes[8] = checksum(&bytes[..8]);
        Frame(bytes)
    }

    #[test]
    fn checksum_wraps() {
        assert_eq!(checksum(&[0xFF, 0x02]), 0x01);
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn decodes_distance_flux_temperature() {
        let (m, status) = frame(100, 1200, 2048).decode().unwrap();
        assert_eq!(m.distance, 100);
        assert_eq!(m.flux, 1200);
        assert_eq!(m.temperature, 0);
        assert_eq!(status, Status::Ready);
    }

    #[test]
    fn temperature_uses_unsigned_shift() {
        // 0xFFF8 >> 3 = 0x1FFF
        assert_eq!(frame(1, 1, 0xFFF8).measurement().temperature, 0x1FFF - 256);
        assert_eq!(frame(1, 1, 0x0A40).measurement().temperature, 72);
    }

    #[test]
    fn sentinel_statuses_in_priority_order() {
        assert_eq!(frame(0xFFFF, 0xFFFF, 0).measurement().status(), Status::WeakSignal);
        assert_eq!(frame(12, 0xFFFF, 0).measurement().status(), Status::StrongSignal);
        assert_eq!(frame(0xFFFC, 10, 0).measurement().status(), Status::FloodSignal);
        assert_eq!(frame(0xFFFC, 0xFFFF, 0).measurement().status(), Status::StrongSignal);
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let good = frame(100, 5, 2048);
        for chk in (0..=255u8).filter(|&c| c != good.0[8]) {
            let mut bad = good;
            bad.0[8] = chk;
            assert_eq!(bad.decode(), Err(Status::ChecksumFailure), "checksum {:02X}", chk);
        }
    }

    #[test]
    fn window_tracks_oldest_byte() {
        let mut window = SyncWindow::new(FRAME_SIZE);
        assert!(!window.starts_with(0, 0x59));
        for byte in 1..=12u8 {
            window.push(byte);
        }
        let mut out = [0u8; FRAME_SIZE];
        window.copy_to(&mut out);
        assert_eq!(out, [4, 5, 6, 7, 8, 9, 10, 11, 12]);
        assert!(window.starts_with(4, 5));
    }

    #[test]
    fn window_width_is_clamped() {
        assert_eq!(SyncWindow::new(0).width(), 2);
        assert_eq!(SyncWindow::new(40).width(), WINDOW_CAPACITY);
    }

    #[test]
    fn frame_displays_as_hex() {
        let f = frame(0x64, 0, 0);
        assert_eq!(f.to_string(), "59 59 64 00 00 00 00 00 16");
    }
}
