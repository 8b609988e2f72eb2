//! Driver for Metratec QRG2 UHF RFID reader modules using the AT command
//! protocol.
//!
//! The reader speaks a textual protocol over a serial link: commands are
//! carriage-return terminated `AT` lines, responses are echoed, line-based
//! and closed by a literal `OK` or `ERROR`. This crate frames the commands,
//! drives the response exchange and decodes the tag-bearing answers into
//! [`UhfTag`] records.
//!
//! # Features
//!
//! - `serial` - Serial port transport for desktop using serialport crate
//!
//! # Example
//!
//! ```ignore
//! use qrg2_rfid::{Qrg2, SerialTransport};
//!
//! let transport = SerialTransport::new("/dev/ttyUSB0", 115200)?;
//! let mut reader = Qrg2::new(transport)?;
//! reader.get_reader_info()?;
//!
//! for tag in reader.get_inventory(false)? {
//!     println!("Found tag: {}", tag.epc());
//! }
//! ```

mod parse;
mod protocol;
mod reader;
mod tag;
mod transport;
mod types;

#[cfg(feature = "serial")]
mod serial;

// Re-exports
pub use reader::{Qrg2, UhfReaderGen2};
pub use tag::{Tag, TagRecord, UhfTag};
pub use transport::{DataBits, Parity, RfidTransport, SerialSettings, StopBits};
pub use types::{
    InventorySettings, LockTarget, MaskSettings, MemoryBank, ReaderInfo, ReaderProfile, RfidError,
};

#[cfg(feature = "serial")]
pub use serial::SerialTransport;
