//! Decoders for the tag-bearing response formats.
//!
//! All functions here are pure: they consume the body lines returned by the
//! command exchange and produce tag records, without any I/O. Lines carrying
//! a status event instead of a tag are introduced by a `<` at a fixed offset
//! behind the response prefix.

use log::warn;

use crate::tag::UhfTag;
use crate::types::RfidError;

/// Event sentinel behind the response prefix.
const EVENT_MARKER: u8 = b'<';

/// Options for one inventory decode pass.
pub(crate) struct InventoryContext {
    /// Offset of the payload behind the response prefix, 6 for `+INV: `
    /// lines, 7 for `+INVR: ` lines.
    pub split_index: usize,
    /// The TID is appended to each tag line.
    pub with_tid: bool,
    /// The RSSI is appended to each tag line.
    pub with_rssi: bool,
    /// Swallow antenna error events instead of recording them.
    pub ignore_error: bool,
    /// A trailing seen count terminates each tag line.
    pub is_report: bool,
}

/// Result of one inventory decode pass.
pub(crate) struct DecodedInventory {
    pub tags: Vec<UhfTag>,
    /// Antenna number from a round-finished event, if one was seen.
    pub antenna: Option<u32>,
    /// Pending error collected from error events, if any.
    pub error: Option<String>,
}

/// Decode inventory-style response lines into tag records.
///
/// Status events are classified by the character following the marker:
/// `N` means no tags were found, `R` closes an inventory round and names the
/// antenna it ran on, anything else is an error event. The antenna of the
/// last round-finished event stamps every tag of the pass.
pub(crate) fn decode_inventory(
    lines: &[String],
    timestamp: u64,
    ctx: &InventoryContext,
) -> Result<DecodedInventory, RfidError> {
    let mut tags: Vec<UhfTag> = Vec::new();
    let mut antenna: Option<u32> = None;
    let mut error: Option<String> = None;

    for line in lines {
        let bytes = line.as_bytes();
        if bytes.first() != Some(&b'+') {
            continue;
        }
        let marker = bytes.get(ctx.split_index).ok_or_else(|| invalid_line(line))?;
        if *marker == EVENT_MARKER {
            match bytes.get(ctx.split_index + 1) {
                Some(&b'N') => {} // NO TAGS FOUND
                Some(&b'R') => {
                    // ROUND FINISHED ANT=2, the antenna digit sits in front
                    // of the closing bracket
                    match round_antenna(line) {
                        Some(ant) => antenna = Some(ant),
                        None => warn!("unparsable round finished event: {line}"),
                    }
                }
                _ if ctx.ignore_error => {}
                _ => {
                    let detail = line
                        .get(ctx.split_index + 1..line.len().saturating_sub(1))
                        .unwrap_or_default();
                    error = Some(detail.to_string());
                }
            }
            continue;
        }

        let payload = line
            .get(ctx.split_index..)
            .ok_or_else(|| invalid_line(line))?;
        let fields: Vec<&str> = payload.split(',').collect();
        let mut tag = UhfTag::new();
        tag.set_epc(fields[0]);
        tag.set_timestamp(timestamp);
        if ctx.with_tid {
            tag.set_tid(fields.get(1).ok_or_else(|| invalid_line(line))?);
        }
        if ctx.with_rssi {
            let index = if ctx.with_tid { 2 } else { 1 };
            let rssi = fields.get(index).ok_or_else(|| invalid_line(line))?;
            tag.set_rssi(rssi.parse().map_err(|_| invalid_line(line))?);
        }
        if ctx.is_report {
            let count = fields.last().ok_or_else(|| invalid_line(line))?;
            tag.set_seen_count(count.parse().map_err(|_| invalid_line(line))?);
        }
        tags.push(tag);
    }

    if let Some(antenna) = antenna {
        for tag in &mut tags {
            tag.set_antenna(antenna);
        }
    }
    Ok(DecodedInventory {
        tags,
        antenna,
        error,
    })
}

/// Decode `<prefix><EPC>,<STATUS>` lines as produced by the write, kill,
/// lock and password commands. A status other than `OK` becomes the tag's
/// error message; duplicate EPCs are kept in line order.
pub(crate) fn decode_tag_responses(
    lines: &[String],
    prefix_length: usize,
    timestamp: u64,
) -> Result<Vec<UhfTag>, RfidError> {
    let mut tags: Vec<UhfTag> = Vec::new();
    for line in lines {
        let marker = line
            .as_bytes()
            .get(prefix_length)
            .ok_or_else(|| invalid_line(line))?;
        if *marker == EVENT_MARKER {
            // inventory message (e.g. NO TAGS FOUND), no tag to report
            continue;
        }
        let payload = line
            .get(prefix_length..)
            .ok_or_else(|| invalid_line(line))?;
        let fields: Vec<&str> = payload.split(',').collect();
        let mut tag = UhfTag::new();
        tag.set_epc(fields[0]);
        tag.set_timestamp(timestamp);
        let status = fields.get(1).ok_or_else(|| invalid_line(line))?;
        if *status != "OK" {
            tag.set_error_message(status);
        }
        tags.push(tag);
    }
    Ok(tags)
}

/// Decode `<prefix><EPC>,<STATUS>,<DATA>` lines as produced by `AT+READ`.
///
/// Responses with a missing status or data field are kept without those
/// fields rather than rejected, matching the reader's occasional short
/// answers.
pub(crate) fn decode_read_responses(
    lines: &[String],
    prefix_length: usize,
    timestamp: u64,
) -> Result<Vec<UhfTag>, RfidError> {
    let mut tags: Vec<UhfTag> = Vec::new();
    for line in lines {
        let marker = line
            .as_bytes()
            .get(prefix_length)
            .ok_or_else(|| invalid_line(line))?;
        if *marker == EVENT_MARKER {
            continue;
        }
        let payload = line
            .get(prefix_length..)
            .ok_or_else(|| invalid_line(line))?;
        let fields: Vec<&str> = payload.split(',').collect();
        let mut tag = UhfTag::new();
        tag.set_epc(fields[0]);
        tag.set_timestamp(timestamp);
        match fields.get(1) {
            Some(&"OK") => {
                if let Some(data) = fields.get(2) {
                    tag.set_data(data);
                }
            }
            Some(status) => tag.set_error_message(status),
            None => {}
        }
        tags.push(tag);
    }
    Ok(tags)
}

/// Pull the antenna number out of a `ROUND FINISHED ANT=n>` event line.
fn round_antenna(line: &str) -> Option<u32> {
    let bytes = line.as_bytes();
    let digit = *bytes.get(bytes.len().checked_sub(2)?)?;
    (digit as char).to_digit(10)
}

fn invalid_line(line: &str) -> RfidError {
    RfidError::UnexpectedResponse(format!("invalid tag response - {line}"))
}
