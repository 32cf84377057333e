//! Native serial port transport.
//!
//! Wraps a `serialport` handle so it can be used as a [`Transport`].

use std::boxed::Box;
use std::io;
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort};

use crate::transport::Transport;

/// Serial port configured for the sensor (8N1, no flow control).
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

/// Opens `path` at `baud` for talking to the sensor.
///
/// Reads only happen after the driver has seen data waiting, so the port
/// timeout merely caps a single stalled read.
pub fn open(path: &str, baud: u32) -> Result<SerialTransport, serialport::Error> {
    let port = serialport::new(path, baud)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .timeout(Duration::from_millis(100))
        .open()?;
    log::debug!("Opened {} at {} baud", path, baud);
    Ok(SerialTransport::new(port))
}

impl SerialTransport {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }

    pub fn port(&mut self) -> &mut dyn SerialPort {
        self.port.as_mut()
    }

    pub fn into_inner(self) -> Box<dyn SerialPort> {
        self.port
    }
}

impl embedded_io::ErrorType for SerialTransport {
    type Error = io::Error;
}

impl embedded_io::Read for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        io::Read::read(&mut self.port, buf)
    }
}

impl embedded_io::Write for SerialTransport {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        io::Write::write(&mut self.port, buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        io::Write::flush(&mut self.port)
    }
}

impl Transport for SerialTransport {
    fn bytes_available(&mut self) -> Result<usize, Self::Error> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn clear_input(&mut self) -> Result<(), Self::Error> {
        Ok(self.port.clear(ClearBuffer::Input)?)
    }

    fn clear_output(&mut self) -> Result<(), Self::Error> {
        Ok(self.port.clear(ClearBuffer::Output)?)
    }
}
