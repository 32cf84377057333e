use core::time::Duration;

// FRAME_HEADER is the marker byte repeated twice at the start of every measurement frame.
pub const FRAME_HEADER: u8 = 0x59;

// FRAME_SIZE is the fixed length of a measurement frame, checksum included.
pub const FRAME_SIZE: usize = 9;

// PACKET_HEADER is the byte that starts every command packet sent to the sensor
// and every reply packet it sends back.
pub const PACKET_HEADER: u8 = 0x5A;

// COMMAND_MAX is the longest command packet in the command set (set baud rate).
pub const COMMAND_MAX: usize = 8;

// REPLY_MAX is the longest reply packet in the command set (set baud rate).
pub const REPLY_MAX: usize = 8;

// DEFAULT_I2C_ADDRESS is the factory I2C slave address of the sensor.
pub const DEFAULT_I2C_ADDRESS: u8 = 0x10;

// DEFAULT_TIMEOUT bounds every frame or reply search.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

// DEFAULT_SETTLE_DELAY is how long `begin` waits for the sensor to start streaming.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(200);
