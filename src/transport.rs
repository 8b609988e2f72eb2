//! Transport abstraction for reader communication backends.

use std::time::Duration;

/// Serial link parameters applied by [`RfidTransport::configure`].
///
/// The defaults match the module's factory configuration: 115200 baud,
/// 8 data bits, no parity, 1 stop bit, 500 ms read timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub timeout: Duration,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            timeout: Duration::from_millis(500),
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

/// Trait for reader communication backends.
/// Implement this trait for different transports (serial port, UART, etc.)
pub trait RfidTransport {
    /// Error type for transport operations
    type Error: std::fmt::Debug;

    /// Write raw bytes to the transport
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Read one line from the transport, blocking for at most `timeout`.
    ///
    /// Returns `Ok(None)` when no complete line arrived within the timeout.
    /// The returned bytes may still carry their line terminators.
    fn read_line(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Apply the given serial link parameters
    fn configure(&mut self, settings: &SerialSettings) -> Result<(), Self::Error>;
}
