//! Shared types for the AT protocol reader operations.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors that can occur during reader operations
#[derive(Debug, Error)]
pub enum RfidError {
    /// Transport layer error (serial port, UART, etc.)
    #[error("transport error: {0}")]
    Transport(String),
    /// Failure reported by the reader itself, e.g. the bracketed detail of an
    /// `ERROR` response or an antenna error raised during inventory
    #[error("{0}")]
    Reader(String),
    /// The reader did not answer the command before the deadline
    #[error("no reader response for command {0}")]
    NoResponse(String),
    /// The reader answered, but not in the expected shape
    #[error("{0}")]
    UnexpectedResponse(String),
    /// Invalid parameter passed to an operation
    #[error("{0}")]
    InvalidParameter(String),
    /// The connected device is not the expected reader type/firmware
    #[error("{0}")]
    WrongReader(String),
    /// Tags with incompatible state share the read window, the operation
    /// cannot be applied to all of them safely
    #[error("{0}")]
    ConflictingTags(String),
}

/// Transponder memory banks addressable by mask, read and write operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryBank {
    /// Protocol control word
    Pc,
    /// EPC memory
    Epc,
    /// User memory
    Usr,
    /// Tag identifier memory
    Tid,
}

impl MemoryBank {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryBank::Pc => "PC",
            MemoryBank::Epc => "EPC",
            MemoryBank::Usr => "USR",
            MemoryBank::Tid => "TID",
        }
    }
}

impl fmt::Display for MemoryBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryBank {
    type Err = RfidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PC" => Ok(MemoryBank::Pc),
            "EPC" => Ok(MemoryBank::Epc),
            "USR" => Ok(MemoryBank::Usr),
            "TID" => Ok(MemoryBank::Tid),
            other => Err(RfidError::UnexpectedResponse(format!(
                "unknown memory bank: {other}"
            ))),
        }
    }
}

/// Transponder areas addressable by the lock commands.
///
/// Besides the memory banks, the access and kill passwords can be locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTarget {
    /// Kill password
    Kill,
    /// Access (lock) password
    Lock,
    /// EPC memory
    Epc,
    /// Tag identifier memory
    Tid,
    /// User memory
    Usr,
}

impl LockTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockTarget::Kill => "KILL",
            LockTarget::Lock => "LCK",
            LockTarget::Epc => "EPC",
            LockTarget::Tid => "TID",
            LockTarget::Usr => "USR",
        }
    }
}

impl fmt::Display for LockTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An active tag mask, as reported by the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskSettings {
    /// Memory bank the mask is matched against
    pub memory: MemoryBank,
    /// Start offset, bytes for `AT+MSK` masks, bits for `AT+BMSK` masks
    pub start: u32,
    /// Mask value, hex for byte masks, binary digits for bit masks
    pub mask: String,
}

/// Inventory response options mirrored from the reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventorySettings {
    /// Only report tags not seen in the previous round
    pub only_new_tag: bool,
    /// Append the RSSI value to each tag line
    pub with_rssi: bool,
    /// Append the TID to each tag line
    pub with_tid: bool,
}

/// Identity information reported by the reader via `ATI`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderInfo {
    pub firmware: String,
    pub firmware_version: String,
    pub hardware: String,
    pub hardware_version: String,
    pub serial_number: String,
}

/// Static description of the reader a driver expects to talk to.
///
/// Checked once by `get_reader_info`; no other operation may be trusted on a
/// reader that fails this check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReaderProfile {
    pub firmware_name: &'static str,
    pub hardware_name: &'static str,
    pub min_firmware: f32,
}
