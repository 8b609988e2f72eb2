//! Transponder record model.
//!
//! A tag record is a sparse observation: fields that were not part of a
//! response are simply absent and read back as their defaults. Only the
//! error message is coupled to a second field (`has_error`); everything
//! else follows plain absent-means-default semantics.

use std::ops::{Deref, DerefMut};

/// Placeholder identity for records without an identifier.
const UNKNOWN_ID: &str = "unknown";

/// Common behaviour shared by all transponder record variants.
pub trait TagRecord {
    /// Identifier used to correlate records, `"unknown"` when absent.
    fn id(&self) -> &str;

    /// Capture timestamp in seconds since the Unix epoch, 0 when unset.
    fn timestamp(&self) -> u64;

    /// True if an error message is attached to this record.
    fn has_error(&self) -> bool;

    /// The attached error message, empty when there is none.
    fn error_message(&self) -> &str;

    /// Attach an error message. A non-empty message marks the record as
    /// failed; an empty message clears the error state.
    fn set_error_message(&mut self, message: &str);
}

/// A generic transponder observation, identified by its TID.
#[derive(Debug, Clone, Default)]
pub struct Tag {
    tid: Option<String>,
    timestamp: Option<u64>,
    first_seen: Option<u64>,
    last_seen: Option<u64>,
    data: Option<String>,
    antenna: Option<u32>,
    seen_count: Option<u32>,
    error_message: Option<String>,
}

impl Tag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tid(&self) -> &str {
        self.tid.as_deref().unwrap_or_default()
    }

    pub fn set_tid(&mut self, tid: &str) {
        self.tid = Some(tid.to_string());
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp.unwrap_or_default()
    }

    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = Some(timestamp);
    }

    pub fn first_seen(&self) -> u64 {
        self.first_seen.unwrap_or_default()
    }

    pub fn set_first_seen(&mut self, timestamp: u64) {
        self.first_seen = Some(timestamp);
    }

    pub fn last_seen(&self) -> u64 {
        self.last_seen.unwrap_or_default()
    }

    pub fn set_last_seen(&mut self, timestamp: u64) {
        self.last_seen = Some(timestamp);
    }

    /// Hex payload from a memory read or write, empty when absent.
    pub fn data(&self) -> &str {
        self.data.as_deref().unwrap_or_default()
    }

    pub fn set_data(&mut self, data: &str) {
        self.data = Some(data.to_string());
    }

    /// Antenna the tag was seen on, 0 when unknown.
    pub fn antenna(&self) -> u32 {
        self.antenna.unwrap_or_default()
    }

    pub fn set_antenna(&mut self, antenna: u32) {
        self.antenna = Some(antenna);
    }

    /// Occurrences within one report window, 0 when unset.
    pub fn seen_count(&self) -> u32 {
        self.seen_count.unwrap_or_default()
    }

    pub fn set_seen_count(&mut self, seen_count: u32) {
        self.seen_count = Some(seen_count);
    }

    pub fn has_error(&self) -> bool {
        self.error_message.is_some()
    }

    pub fn error_message(&self) -> &str {
        self.error_message.as_deref().unwrap_or_default()
    }

    pub fn set_error_message(&mut self, message: &str) {
        if message.is_empty() {
            self.error_message = None;
        } else {
            self.error_message = Some(message.to_string());
        }
    }
}

impl TagRecord for Tag {
    fn id(&self) -> &str {
        let tid = self.tid();
        if tid.is_empty() { UNKNOWN_ID } else { tid }
    }

    fn timestamp(&self) -> u64 {
        Tag::timestamp(self)
    }

    fn has_error(&self) -> bool {
        Tag::has_error(self)
    }

    fn error_message(&self) -> &str {
        Tag::error_message(self)
    }

    fn set_error_message(&mut self, message: &str) {
        Tag::set_error_message(self, message);
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        TagRecord::id(self) == TagRecord::id(other)
    }
}

/// A UHF transponder observation, identified by its EPC.
#[derive(Debug, Clone, Default)]
pub struct UhfTag {
    base: Tag,
    epc: Option<String>,
    rssi: Option<i32>,
    old_epc: Option<String>,
}

impl UhfTag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epc(&self) -> &str {
        self.epc.as_deref().unwrap_or_default()
    }

    pub fn set_epc(&mut self, epc: &str) {
        self.epc = Some(epc.to_string());
    }

    /// Signal strength the tag answered with, 0 when absent.
    pub fn rssi(&self) -> i32 {
        self.rssi.unwrap_or_default()
    }

    pub fn set_rssi(&mut self, rssi: i32) {
        self.rssi = Some(rssi);
    }

    /// The identity the tag had before an EPC rewrite, empty when the tag
    /// was never rewritten.
    pub fn old_epc(&self) -> &str {
        self.old_epc.as_deref().unwrap_or_default()
    }

    pub fn set_old_epc(&mut self, epc: &str) {
        self.old_epc = Some(epc.to_string());
    }
}

impl Deref for UhfTag {
    type Target = Tag;

    fn deref(&self) -> &Tag {
        &self.base
    }
}

impl DerefMut for UhfTag {
    fn deref_mut(&mut self) -> &mut Tag {
        &mut self.base
    }
}

impl TagRecord for UhfTag {
    fn id(&self) -> &str {
        let epc = self.epc();
        if epc.is_empty() { UNKNOWN_ID } else { epc }
    }

    fn timestamp(&self) -> u64 {
        self.base.timestamp()
    }

    fn has_error(&self) -> bool {
        self.base.has_error()
    }

    fn error_message(&self) -> &str {
        self.base.error_message()
    }

    fn set_error_message(&mut self, message: &str) {
        self.base.set_error_message(message);
    }
}

impl PartialEq for UhfTag {
    fn eq(&self, other: &Self) -> bool {
        TagRecord::id(self) == TagRecord::id(other)
    }
}
