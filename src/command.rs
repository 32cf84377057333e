use core::fmt;

use crate::constants::{COMMAND_MAX, DEFAULT_I2C_ADDRESS, PACKET_HEADER, REPLY_MAX};
use crate::error::{ParamError, Status};
use crate::frame::{checksum, write_hex, SyncWindow};

/// Static description of one command: how long the packet is, how long the
/// sensor's reply is, and the packet bytes before parameters and checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub reply_len: u8,
    pub command_len: u8,
    pub template: [u8; COMMAND_MAX],
}

const fn descriptor(reply_len: u8, command_len: u8, id: u8, arg: u8) -> Descriptor {
    Descriptor {
        reply_len,
        command_len,
        template: [PACKET_HEADER, command_len, id, arg, 0, 0, 0, 0],
    }
}

const GET_FIRMWARE_VERSION: Descriptor = descriptor(7, 4, 0x01, 0x00);
const TRIGGER_DETECTION: Descriptor = descriptor(0, 4, 0x04, 0x00);
const SOFT_RESET: Descriptor = descriptor(5, 4, 0x02, 0x00);
const HARD_RESET: Descriptor = descriptor(5, 4, 0x10, 0x00);
const SAVE_SETTINGS: Descriptor = descriptor(5, 4, 0x11, 0x00);
const SET_FRAME_RATE: Descriptor = descriptor(6, 6, 0x03, 0x00);
const SET_BAUD_RATE: Descriptor = descriptor(8, 8, 0x06, 0x00);
const STANDARD_FORMAT_CM: Descriptor = descriptor(5, 5, 0x05, 0x01);
const PIXHAWK_FORMAT: Descriptor = descriptor(5, 5, 0x05, 0x02);
const STANDARD_FORMAT_MM: Descriptor = descriptor(5, 5, 0x05, 0x06);
const ENABLE_OUTPUT: Descriptor = descriptor(5, 5, 0x07, 0x01);
const DISABLE_OUTPUT: Descriptor = descriptor(5, 5, 0x07, 0x00);
const SET_I2C_ADDRESS: Descriptor = descriptor(5, 5, 0x0B, DEFAULT_I2C_ADDRESS);
const SET_SERIAL_MODE: Descriptor = descriptor(0, 5, 0x0A, 0x00);
const SET_I2C_MODE: Descriptor = descriptor(0, 5, 0x0A, 0x01);
const I2C_FORMAT_CM: Descriptor = descriptor(0, 5, 0x00, 0x01);
const I2C_FORMAT_MM: Descriptor = descriptor(0, 5, 0x00, 0x06);

/// Output frame rate in Hz. Zero stops continuous output; use
/// [`Command::TriggerDetection`] to request single frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRate(pub u16);

impl FrameRate {
    pub const HZ_0: FrameRate = FrameRate(0);
    pub const HZ_1: FrameRate = FrameRate(1);
    pub const HZ_2: FrameRate = FrameRate(2);
    pub const HZ_5: FrameRate = FrameRate(5);
    pub const HZ_10: FrameRate = FrameRate(10);
    pub const HZ_20: FrameRate = FrameRate(20);
    pub const HZ_25: FrameRate = FrameRate(25);
    pub const HZ_50: FrameRate = FrameRate(50);
    pub const HZ_100: FrameRate = FrameRate(100);
    pub const HZ_125: FrameRate = FrameRate(125);
    pub const HZ_200: FrameRate = FrameRate(200);
    pub const HZ_250: FrameRate = FrameRate(250);
    pub const HZ_500: FrameRate = FrameRate(500);
    pub const HZ_1000: FrameRate = FrameRate(1000);
}

/// Serial baud rates the sensor accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaudRate {
    B9600,
    B14400,
    B19200,
    B56000,
    B115200,
    B460800,
    B921600,
}

impl BaudRate {
    pub fn bps(self) -> u32 {
        match self {
            BaudRate::B9600 => 9_600,
            BaudRate::B14400 => 14_400,
            BaudRate::B19200 => 19_200,
            BaudRate::B56000 => 56_000,
            BaudRate::B115200 => 115_200,
            BaudRate::B460800 => 460_800,
            BaudRate::B921600 => 921_600,
        }
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = ParamError;

    fn try_from(bps: u32) -> Result<Self, Self::Error> {
        match bps {
            9_600 => Ok(BaudRate::B9600),
            14_400 => Ok(BaudRate::B14400),
            19_200 => Ok(BaudRate::B19200),
            56_000 => Ok(BaudRate::B56000),
            115_200 => Ok(BaudRate::B115200),
            460_800 => Ok(BaudRate::B460800),
            921_600 => Ok(BaudRate::B921600),
            other => Err(ParamError::UnsupportedBaudRate(other)),
        }
    }
}

/// Commands understood by the sensor over UART.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    GetFirmwareVersion,
    /// Request one frame while the frame rate is zero.
    TriggerDetection,
    SoftReset,
    /// Restore factory defaults.
    HardReset,
    /// Persist the current settings.
    SaveSettings,
    SetFrameRate(FrameRate),
    SetBaudRate(BaudRate),
    StandardFormatCm,
    PixhawkFormat,
    StandardFormatMm,
    EnableOutput,
    DisableOutput,
    SetI2cAddress(u8),
    SetSerialMode,
    SetI2cMode,
    I2cFormatCm,
    I2cFormatMm,
}

impl Command {
    pub fn descriptor(&self) -> &'static Descriptor {
        match self {
            Command::GetFirmwareVersion => &GET_FIRMWARE_VERSION,
            Command::TriggerDetection => &TRIGGER_DETECTION,
            Command::SoftReset => &SOFT_RESET,
            Command::HardReset => &HARD_RESET,
            Command::SaveSettings => &SAVE_SETTINGS,
            Command::SetFrameRate(_) => &SET_FRAME_RATE,
            Command::SetBaudRate(_) => &SET_BAUD_RATE,
            Command::StandardFormatCm => &STANDARD_FORMAT_CM,
            Command::PixhawkFormat => &PIXHAWK_FORMAT,
            Command::StandardFormatMm => &STANDARD_FORMAT_MM,
            Command::EnableOutput => &ENABLE_OUTPUT,
            Command::DisableOutput => &DISABLE_OUTPUT,
            Command::SetI2cAddress(_) => &SET_I2C_ADDRESS,
            Command::SetSerialMode => &SET_SERIAL_MODE,
            Command::SetI2cMode => &SET_I2C_MODE,
            Command::I2cFormatCm => &I2C_FORMAT_CM,
            Command::I2cFormatMm => &I2C_FORMAT_MM,
        }
    }

    pub fn reply_len(&self) -> usize {
        self.descriptor().reply_len as usize
    }

    /// Packed opcode as used by the vendor libraries: reply length in the low
    /// byte, command length next, then the command id and its fixed argument.
    pub fn opcode(&self) -> u32 {
        let d = self.descriptor();
        u32::from_le_bytes([d.reply_len, d.command_len, d.template[2], d.template[3]])
    }

    /// Commands whose reply carries a pass/fail flag in byte 3.
    pub fn reports_failure(&self) -> bool {
        matches!(
            self,
            Command::SoftReset | Command::HardReset | Command::SaveSettings
        )
    }

    /// Builds the packet to transmit: template, parameter, checksum.
    pub fn encode(&self) -> Packet {
        let d = self.descriptor();
        let mut bytes = d.template;
        match *self {
            Command::SetFrameRate(FrameRate(hz)) => {
                bytes[3..5].copy_from_slice(&hz.to_le_bytes());
            }
            Command::SetBaudRate(baud) => {
                bytes[3..6].copy_from_slice(&baud.bps().to_le_bytes()[..3]);
            }
            Command::SetI2cAddress(address) => bytes[3] = address,
            _ => {}
        }
        let len = d.command_len as usize;
        bytes[len - 1] = checksum(&bytes[..len - 1]);
        Packet { bytes, len }
    }
}

/// Encoded command packet, ready to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    bytes: [u8; COMMAND_MAX],
    len: usize,
}

impl Packet {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, self.as_bytes())
    }
}

/// Reply packet received from the sensor: `5A len payload... chk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reply {
    bytes: [u8; REPLY_MAX],
    len: usize,
}

impl Reply {
    /// An empty reply, for commands the sensor does not answer.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_window(window: &SyncWindow) -> Self {
        let mut reply = Reply {
            bytes: [0; REPLY_MAX],
            len: window.width().min(REPLY_MAX),
        };
        window.copy_to(&mut reply.bytes);
        reply
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_checksum_valid(&self) -> bool {
        match self.as_bytes().split_last() {
            Some((&chk, body)) => checksum(body) == chk,
            None => false,
        }
    }

    /// Validates this reply as the answer to `command`.
    ///
    /// The header and length are assumed to have been matched during
    /// synchronization; this checks the checksum and, for reset and save,
    /// the device's pass/fail flag.
    pub fn validate(&self, command: &Command) -> Status {
        if !self.is_checksum_valid() {
            return Status::ChecksumFailure;
        }
        if command.reports_failure() && self.as_bytes().get(3) == Some(&1) {
            return Status::CommandFailed;
        }
        Status::Ready
    }

    /// Firmware version carried by a version query reply.
    pub fn firmware_version(&self) -> Option<FirmwareVersion> {
        let raw: [u8; 3] = self.as_bytes().get(3..6)?.try_into().ok()?;
        Some(FirmwareVersion::from_raw(raw))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, self.as_bytes())
    }
}

/// Firmware version as reported by the sensor, least significant part first on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl FirmwareVersion {
    pub fn from_raw(raw: [u8; 3]) -> Self {
        Self {
            major: raw[2],
            minor: raw[1],
            patch: raw[0],
        }
    }

    /// Bytes in wire order.
    pub fn raw(&self) -> [u8; 3] {
        [self.patch, self.minor, self.major]
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Command; 17] = [
        Command::GetFirmwareVersion,
        Command::TriggerDetection,
        Command::SoftReset,
        Command::HardReset,
        Command::SaveSettings,
        Command::SetFrameRate(FrameRate::HZ_0),
        Command::SetBaudRate(BaudRate::B9600),
        Command::StandardFormatCm,
        Command::PixhawkFormat,
        Command::StandardFormatMm,
        Command::EnableOutput,
        Command::DisableOutput,
        Command::SetI2cAddress(DEFAULT_I2C_ADDRESS),
        Command::SetSerialMode,
        Command::SetI2cMode,
        Command::I2cFormatCm,
        Command::I2cFormatMm,
    ];

    #[test]
    fn opcodes_match_vendor_values() {
        let expected: [u32; 17] = [
            0x0001_0407,
            0x0004_0400,
            0x0002_0405,
            0x0010_0405,
            0x0011_0405,
            0x0003_0606,
            0x0006_0808,
            0x0105_0505,
            0x0205_0505,
            0x0605_0505,
            0x0107_0505,
            0x0007_0505,
            0x100B_0505,
            0x000A_0500,
            0x010A_0500,
            0x0100_0500,
            0x0600_0500,
        ];
        for (command, opcode) in ALL.iter().zip(expected) {
            assert_eq!(command.opcode(), opcode, "{:?}", command);
        }
    }

    #[test]
    fn every_packet_ends_in_checksum() {
        for command in ALL {
            let packet = command.encode();
            let bytes = packet.as_bytes();
            assert_eq!(bytes[0], PACKET_HEADER);
            assert_eq!(bytes[1] as usize, bytes.len());
            let (chk, body) = bytes.split_last().unwrap();
            assert_eq!(*chk, checksum(body), "{:?}", command);
        }
    }

    #[test]
    fn firmware_query_packet() {
        assert_eq!(
            Command::GetFirmwareVersion.encode().as_bytes(),
            &[0x5A, 0x04, 0x01, 0x5F]
        );
    }

    #[test]
    fn frame_rate_is_little_endian_at_offset_three() {
        let packet = Command::SetFrameRate(FrameRate::HZ_100).encode();
        assert_eq!(packet.as_bytes(), &[0x5A, 0x06, 0x03, 0x64, 0x00, 0xC7]);
        let bytes = packet.as_bytes();
        assert_eq!(u16::from_le_bytes([bytes[3], bytes[4]]), 100);
    }

    #[test]
    fn baud_rate_is_three_bytes_little_endian() {
        let packet = Command::SetBaudRate(BaudRate::B115200).encode();
        let bytes = packet.as_bytes();
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[3..6], &[0x00, 0xC2, 0x01]);
        assert_eq!(bytes[6], 0x00);
        assert_eq!(bytes[7], checksum(&bytes[..7]));
    }

    #[test]
    fn i2c_address_is_spliced() {
        let default = Command::SetI2cAddress(DEFAULT_I2C_ADDRESS).encode();
        assert_eq!(default.as_bytes(), &[0x5A, 0x05, 0x0B, 0x10, 0x7A]);
        let custom = Command::SetI2cAddress(0x22).encode();
        assert_eq!(custom.as_bytes()[3], 0x22);
    }

    #[test]
    fn baud_rate_conversions() {
        assert_eq!(BaudRate::try_from(460_800), Ok(BaudRate::B460800));
        assert_eq!(BaudRate::B56000.bps(), 56_000);
        assert_eq!(
            BaudRate::try_from(57_600),
            Err(ParamError::UnsupportedBaudRate(57_600))
        );
    }

    fn reply(bytes: &[u8]) -> Reply {
        let mut window = SyncWindow::new(bytes.len());
        for &b in bytes {
            window.push(b);
        }
        Reply::from_window(&window)
    }

    #[test]
    fn version_reply_decodes() {
        let r = reply(&[0x5A, 0x07, 0x01, 0x09, 0x01, 0x02, 0x6E]);
        assert_eq!(r.validate(&Command::GetFirmwareVersion), Status::Ready);
        let version = r.firmware_version().unwrap();
        assert_eq!(version.to_string(), "2.1.9");
        assert_eq!(version.raw(), [0x09, 0x01, 0x02]);
    }

    #[test]
    fn reset_failure_flag() {
        let failed = reply(&[0x5A, 0x05, 0x02, 0x01, 0x62]);
        assert_eq!(failed.validate(&Command::SoftReset), Status::CommandFailed);
        let passed = reply(&[0x5A, 0x05, 0x02, 0x00, 0x61]);
        assert_eq!(passed.validate(&Command::SoftReset), Status::Ready);
        // the flag only means failure for reset/save
        assert_eq!(failed.validate(&Command::EnableOutput), Status::Ready);
    }

    #[test]
    fn corrupted_reply_is_rejected() {
        let r = reply(&[0x5A, 0x05, 0x07, 0x01, 0x00]);
        assert_eq!(r.validate(&Command::EnableOutput), Status::ChecksumFailure);
        assert!(!Reply::empty().is_checksum_valid());
    }
}
