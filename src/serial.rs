//! Serial port transport for desktop using serialport crate

use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use crate::transport::{DataBits, Parity, RfidTransport, SerialSettings, StopBits};

pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
    buffer: Vec<u8>,
}

impl SerialTransport {
    pub fn new(port_name: &str, baud_rate: u32) -> Result<Self, serialport::Error> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_secs(1))
            .open()?;
        port.clear(serialport::ClearBuffer::Input)?;

        Ok(Self {
            port,
            buffer: Vec::new(),
        })
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        let end = self.buffer.iter().position(|&b| b == b'\n')?;
        Some(self.buffer.drain(..=end).collect())
    }
}

impl RfidTransport for SerialTransport {
    type Error = std::io::Error;

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.port.write_all(data)
    }

    fn read_line(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, Self::Error> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(line) = self.take_line() {
                return Ok(Some(line));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            self.port
                .set_timeout(deadline - now)
                .map_err(std::io::Error::other)?;
            let mut chunk = [0u8; 64];
            match self.port.read(&mut chunk) {
                Ok(0) => return Ok(None),
                Ok(n) => self.buffer.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::TimedOut => return Ok(None),
                Err(e) => return Err(e),
            }
        }
    }

    fn configure(&mut self, settings: &SerialSettings) -> Result<(), Self::Error> {
        self.port
            .set_baud_rate(settings.baud_rate)
            .map_err(std::io::Error::other)?;
        self.port
            .set_data_bits(settings.data_bits.into())
            .map_err(std::io::Error::other)?;
        self.port
            .set_parity(settings.parity.into())
            .map_err(std::io::Error::other)?;
        self.port
            .set_stop_bits(settings.stop_bits.into())
            .map_err(std::io::Error::other)?;
        self.port
            .set_timeout(settings.timeout)
            .map_err(std::io::Error::other)?;
        Ok(())
    }
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}
