//! Reader facade: configuration, inventory and transponder operations.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::debug;

use crate::parse::{decode_inventory, decode_read_responses, decode_tag_responses, InventoryContext};
use crate::protocol::{Connection, DEFAULT_TIMEOUT};
use crate::tag::UhfTag;
use crate::transport::{RfidTransport, SerialSettings};
use crate::types::{
    InventorySettings, LockTarget, MaskSettings, MemoryBank, ReaderInfo, ReaderProfile, RfidError,
};

/// Process-local copy of device-side settings.
///
/// Updated only as a side effect of a successful setter call or a parse
/// event, never read back from the device implicitly.
#[derive(Debug, Default)]
struct ConfigMirror {
    inventory: InventorySettings,
    antenna: Option<u32>,
    errors: HashMap<String, String>,
}

/// A UHF Gen2 reader speaking the AT command protocol.
///
/// One instance owns one transport; every operation blocks until the reader
/// answered or its deadline passed. Construction configures the serial link,
/// stops a possibly still running continuous inventory and applies the
/// initial inventory settings.
pub struct UhfReaderGen2<T: RfidTransport> {
    conn: Connection<T>,
    profile: ReaderProfile,
    config: ConfigMirror,
}

impl<T: RfidTransport> UhfReaderGen2<T> {
    /// Create a reader instance with the default serial settings.
    pub fn new(transport: T, profile: ReaderProfile) -> Result<Self, RfidError> {
        Self::with_settings(transport, profile, SerialSettings::default())
    }

    /// Create a reader instance with explicit serial settings.
    pub fn with_settings(
        transport: T,
        profile: ReaderProfile,
        settings: SerialSettings,
    ) -> Result<Self, RfidError> {
        let mut conn = Connection::new(transport);
        conn.initialise(&settings)?;
        let mut reader = Self {
            conn,
            profile,
            config: ConfigMirror::default(),
        };
        // a continuous inventory may still be running from a previous
        // session, a failure here only means there was none to stop
        if let Err(err) = reader.conn.command("AT+BINV", &[]) {
            debug!("stop continuous inventory: {err}");
        }
        if let Err(err) = reader.conn.command("AT+BINVR", &[]) {
            debug!("stop continuous inventory report: {err}");
        }
        reader.set_inventory_settings(InventorySettings {
            only_new_tag: false,
            with_rssi: true,
            with_tid: true,
        })?;
        Ok(reader)
    }

    /// Query the reader identity and verify it against the expected profile.
    ///
    /// Fails with [`RfidError::WrongReader`] on a hardware name, firmware
    /// name or firmware version mismatch. No other method should be trusted
    /// on a reader that fails this check.
    pub fn get_reader_info(&mut self) -> Result<ReaderInfo, RfidError> {
        let lines = self.conn.command("ATI", &[])?;
        let info = parse_reader_info(&lines)?;
        if info.hardware != self.profile.hardware_name {
            return Err(RfidError::WrongReader(format!(
                "Wrong reader type! {} expected, {} found",
                self.profile.hardware_name, info.hardware
            )));
        }
        if info.firmware != self.profile.firmware_name {
            return Err(RfidError::WrongReader(format!(
                "Wrong reader firmware! {} expected, {} found",
                self.profile.firmware_name, info.firmware
            )));
        }
        let version = firmware_version_number(&info.firmware_version)
            .ok_or_else(|| unexpected("ATI", &lines))?;
        if version < self.profile.min_firmware {
            return Err(RfidError::WrongReader(format!(
                "Reader firmware too low, please update! Minimum {} expected, {} found",
                self.profile.min_firmware, version
            )));
        }
        Ok(info)
    }

    /// Get the current inventory response options.
    pub fn get_inventory_settings(&mut self) -> Result<InventorySettings, RfidError> {
        let lines = self.conn.command("AT+INVS?", &[])?;
        // +INVS: 0,1,0
        let bytes = lines.first().map(|l| l.as_bytes()).unwrap_or_default();
        if bytes.len() < 12 {
            return Err(unexpected("AT+INVS?", &lines));
        }
        Ok(InventorySettings {
            only_new_tag: bytes[7] == b'1',
            with_rssi: bytes[9] == b'1',
            with_tid: bytes[11] == b'1',
        })
    }

    /// Configure the inventory response options.
    pub fn set_inventory_settings(&mut self, settings: InventorySettings) -> Result<(), RfidError> {
        self.conn.command(
            "AT+INVS",
            &[
                param(flag(settings.only_new_tag)),
                param(flag(settings.with_rssi)),
                param(flag(settings.with_tid)),
            ],
        )?;
        self.config.inventory = settings;
        Ok(())
    }

    /// Get the configured regulatory region, e.g. `ETSI`.
    pub fn get_region(&mut self) -> Result<String, RfidError> {
        let lines = self.conn.command("AT+REG?", &[])?;
        // +REG: ETSI
        let region = lines
            .first()
            .and_then(|l| l.get(6..))
            .ok_or_else(|| unexpected("AT+REG?", &lines))?;
        Ok(region.to_string())
    }

    /// Set the regulatory region.
    pub fn set_region(&mut self, region: &str) -> Result<(), RfidError> {
        self.conn.command("AT+REG", &[param(region)])?;
        Ok(())
    }

    /// Get the current antenna power in dBm.
    pub fn get_power(&mut self) -> Result<u32, RfidError> {
        let lines = self.conn.command("AT+PWR?", &[])?;
        // +PWR: 9
        lines
            .first()
            .and_then(|l| l.get(6..))
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| unexpected("AT+PWR?", &lines))
    }

    /// Set the antenna power in dBm.
    pub fn set_power(&mut self, power: u32) -> Result<(), RfidError> {
        self.conn.command("AT+PWR", &[param(power)])?;
        Ok(())
    }

    /// Get the active antenna number.
    pub fn get_antenna(&mut self) -> Result<u32, RfidError> {
        let lines = self.conn.command("AT+ANT?", &[])?;
        // +ANT: 1
        lines
            .first()
            .and_then(|l| l.get(6..))
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| unexpected("AT+ANT?", &lines))
    }

    /// Select the active antenna. Tags from later single-pass inventories
    /// are stamped with this antenna number.
    pub fn set_antenna(&mut self, antenna: u32) -> Result<(), RfidError> {
        self.conn.command("AT+ANT", &[param(antenna)])?;
        self.config.antenna = Some(antenna);
        Ok(())
    }

    /// Get the configured expected transponder population size.
    pub fn get_tag_size(&mut self) -> Result<u32, RfidError> {
        let lines = self.conn.command("AT+Q?", &[])?;
        // +Q: 4,2,15
        lines
            .first()
            .and_then(|l| l.get(4..))
            .and_then(|v| v.split(',').next())
            .and_then(|q| q.parse::<u32>().ok())
            .and_then(|q| 1u32.checked_shl(q))
            .ok_or_else(|| unexpected("AT+Q?", &lines))
    }

    /// Configure the expected number of transponders in the field, with the
    /// default population bounds (0 to 256).
    pub fn set_tag_size(&mut self, tags_size: u32) -> Result<(), RfidError> {
        self.set_tag_size_range(tags_size, Some(0), Some(256))
    }

    /// Configure the expected number of transponders with explicit bounds.
    ///
    /// Each count is converted to the smallest exponent `q` with
    /// `2^q >= count`. Bounds passed as `None` are left out of the command.
    pub fn set_tag_size_range(
        &mut self,
        tags_size: u32,
        min_tags: Option<u32>,
        max_tags: Option<u32>,
    ) -> Result<(), RfidError> {
        self.conn.command(
            "AT+Q",
            &[
                param(q_exponent(tags_size)),
                min_tags.map(|n| q_exponent(n).to_string()),
                max_tags.map(|n| q_exponent(n).to_string()),
            ],
        )?;
        Ok(())
    }

    /// Get the current inventory from the active antenna.
    ///
    /// Antenna error events abort the call with [`RfidError::Reader`] unless
    /// `ignore_error` is set.
    pub fn get_inventory(&mut self, ignore_error: bool) -> Result<Vec<UhfTag>, RfidError> {
        let lines = self.conn.command("AT+INV", &[])?;
        let mut inventory = self.run_inventory(&lines, 6, ignore_error, false)?;
        if let Some(antenna) = self.config.antenna {
            for tag in &mut inventory {
                tag.set_antenna(antenna);
            }
        }
        Ok(inventory)
    }

    /// Run an inventory report over the given duration in milliseconds
    /// (1..=1000) and return each tag with its seen count.
    ///
    /// Without a duration the reader's default report window is used. The
    /// command deadline is widened by the requested duration.
    pub fn get_inventory_report(
        &mut self,
        duration: Option<u32>,
        ignore_error: bool,
    ) -> Result<Vec<UhfTag>, RfidError> {
        let lines = match duration {
            None => self.conn.command("AT+INVR", &[])?,
            Some(ms) => self.conn.command_with_timeout(
                "AT+INVR",
                &[param(ms)],
                DEFAULT_TIMEOUT + Duration::from_millis(u64::from(ms)),
            )?,
        };
        self.run_inventory(&lines, 7, ignore_error, true)
    }

    /// Set a byte-aligned tag mask.
    ///
    /// Only tags whose `memory` bank matches `mask` (hex) at byte offset
    /// `start` answer subsequent operations.
    pub fn set_mask(
        &mut self,
        mask: &str,
        start: u32,
        memory: MemoryBank,
    ) -> Result<(), RfidError> {
        self.conn
            .command("AT+MSK", &[param(memory), param(start), param(mask)])?;
        Ok(())
    }

    /// Get the active byte-aligned mask, `None` when masking is off.
    pub fn get_mask(&mut self) -> Result<Option<MaskSettings>, RfidError> {
        let lines = self.conn.command("AT+MSK?", &[])?;
        // +MSK: EPC,0,0000
        // +MSK: OFF
        parse_mask_response(&lines, 6, "AT+MSK?")
    }

    /// Remove the byte-aligned mask.
    pub fn reset_mask(&mut self) -> Result<(), RfidError> {
        self.conn.command("AT+MSK", &[param("OFF")])?;
        Ok(())
    }

    /// Set a bit-aligned tag mask, `mask` given as binary digits and
    /// `start` as a bit offset.
    pub fn set_bit_mask(
        &mut self,
        mask: &str,
        start: u32,
        memory: MemoryBank,
    ) -> Result<(), RfidError> {
        self.conn
            .command("AT+BMSK", &[param(memory), param(start), param(mask)])?;
        Ok(())
    }

    /// Get the active bit-aligned mask, `None` when masking is off.
    pub fn get_bit_mask(&mut self) -> Result<Option<MaskSettings>, RfidError> {
        let lines = self.conn.command("AT+BMSK?", &[])?;
        // +BMSK: EPC,0,0110
        // +BMSK: OFF
        parse_mask_response(&lines, 7, "AT+BMSK?")
    }

    /// Remove the bit-aligned mask.
    pub fn reset_bit_mask(&mut self) -> Result<(), RfidError> {
        self.conn.command("AT+BMSK", &[param("OFF")])?;
        Ok(())
    }

    /// Read transponder memory.
    ///
    /// Returns one record per answering tag; a failed read is reported on
    /// the record, not as an error of the whole call.
    pub fn read_tag_data(
        &mut self,
        start: u32,
        length: u32,
        memory: MemoryBank,
        epc_mask: Option<&str>,
    ) -> Result<Vec<UhfTag>, RfidError> {
        let lines = self.conn.command(
            "AT+READ",
            &[
                param(memory),
                param(start),
                param(length),
                epc_mask.map(str::to_string),
            ],
        )?;
        // +READ: 3034257BF468D480000003EE,OK,0000
        // +READ: <NO TAGS FOUND>
        decode_read_responses(&lines, 7, unix_timestamp())
    }

    /// Read from the user memory bank.
    pub fn read_tag_usr(
        &mut self,
        start: u32,
        length: u32,
        epc_mask: Option<&str>,
    ) -> Result<Vec<UhfTag>, RfidError> {
        self.read_tag_data(start, length, MemoryBank::Usr, epc_mask)
    }

    /// Read the transponder TIDs.
    pub fn read_tag_tid(
        &mut self,
        start: u32,
        length: u32,
        epc_mask: Option<&str>,
    ) -> Result<Vec<UhfTag>, RfidError> {
        self.read_tag_data(start, length, MemoryBank::Tid, epc_mask)
    }

    /// Write `data` (hex) to transponder memory.
    ///
    /// Returns one record per answering tag; tags that rejected the write
    /// carry an error message.
    pub fn write_tag_data(
        &mut self,
        data: &str,
        start: u32,
        memory: MemoryBank,
        epc_mask: Option<&str>,
    ) -> Result<Vec<UhfTag>, RfidError> {
        let lines = self.conn.command(
            "AT+WRT",
            &[
                param(memory),
                param(start),
                param(data),
                epc_mask.map(str::to_string),
            ],
        )?;
        decode_tag_responses(&lines, 6, unix_timestamp())
    }

    /// Write `data` (hex) to the user memory bank.
    pub fn write_tag_usr(
        &mut self,
        data: &str,
        start: u32,
        epc_mask: Option<&str>,
    ) -> Result<Vec<UhfTag>, RfidError> {
        if data.is_empty() {
            return Err(RfidError::InvalidParameter("Data must be set".into()));
        }
        self.write_tag_data(data, start, MemoryBank::Usr, epc_mask)
    }

    /// Rewrite the EPC of the tags in the field, updating the length bits of
    /// the PC word to match the new EPC.
    ///
    /// When `tid` is given, a temporary TID mask restricts the operation to
    /// that tag and the previous mask configuration is restored afterwards.
    /// The returned records are keyed by the identity the tags had before
    /// the rewrite; successfully written tags carry the new EPC and their
    /// previous one as [`UhfTag::old_epc`].
    ///
    /// The rewrite needs two independent write operations (EPC memory, then
    /// PC word). If several tags with different PC word bases share the
    /// field, the call aborts with [`RfidError::ConflictingTags`] before
    /// writing anything, since the recomputed PC word would corrupt all but
    /// one of them.
    pub fn write_tag_epc(
        &mut self,
        tid: Option<&str>,
        new_epc: &str,
        start: u32,
    ) -> Result<Vec<UhfTag>, RfidError> {
        if new_epc.len() % 4 != 0 {
            return Err(RfidError::InvalidParameter(
                "The new epc length must be a multiple of 4".into(),
            ));
        }
        let epc_words = new_epc.len() / 4;
        let length_bits = epc_length_bits(epc_words);

        let tid = tid.filter(|t| !t.is_empty());
        let saved_mask = match tid {
            Some(tid) => {
                let current = self.get_mask()?;
                self.set_mask(tid, 0, MemoryBank::Tid)?;
                Some(current)
            }
            None => None,
        };

        let inventory_pc = self.read_tag_data(0, 2, MemoryBank::Pc, None)?;
        if inventory_pc.is_empty() {
            // no tags answered, nothing to rewrite
            return Ok(inventory_pc);
        }

        let mut pc_base: u16 = 0;
        for tag in &inventory_pc {
            let value = u16::from_str_radix(tag.data(), 16)
                .map_err(|_| {
                    RfidError::UnexpectedResponse(format!(
                        "invalid pc word response - {}",
                        tag.data()
                    ))
                })?
                & 0x07FF;
            if pc_base == 0 {
                pc_base = value;
            } else if value != pc_base {
                return Err(RfidError::ConflictingTags(
                    "Different tags are in the field, which would result in data loss \
                     when writing. Please edit individually."
                        .into(),
                ));
            }
        }

        // write the new epc, the tags keep answering under their old
        // identity until the field drops
        let inventory_epc = self.write_tag_data(new_epc, start, MemoryBank::Epc, None)?;
        let mut tags: Vec<(String, UhfTag)> = Vec::new();
        for mut tag in inventory_epc {
            let key = tag.epc().to_string();
            if !tag.has_error() {
                tag.set_epc(new_epc);
                tag.set_old_epc(&key);
            }
            tags.push((key, tag));
        }

        // write the recomputed pc word
        let pc_word = pc_base | length_bits;
        let inventory_pc = self.write_tag_data(&format!("{pc_word:04X}"), 0, MemoryBank::Pc, None)?;
        for tag_pc in inventory_pc {
            let key = tag_pc.epc().to_string();
            if let Some((_, tag_epc)) = tags.iter_mut().find(|(k, _)| *k == key) {
                if tag_pc.has_error() {
                    if !tag_epc.has_error() {
                        tag_epc.set_error_message("epc written, epc length not updated!");
                    } else {
                        let message = format!("epc not written - {}", tag_epc.error_message());
                        tag_epc.set_error_message(&message);
                    }
                }
            } else if !tag_pc.has_error() {
                let mut tag_pc = tag_pc;
                tag_pc.set_error_message("epc not written, but epc length updated!");
                tags.push((key, tag_pc));
            }
            // neither write answered for this tag, nothing to report
        }

        if let Some(saved) = saved_mask {
            match saved {
                Some(settings) => self.set_mask(&settings.mask, settings.start, settings.memory)?,
                None => self.reset_mask()?,
            }
        }
        Ok(tags.into_iter().map(|(_, tag)| tag).collect())
    }

    /// Kill the masked transponders.
    ///
    /// # Warning
    /// Killing a tag is irreversible. A record with an error message means
    /// the kill was not accepted for that tag.
    pub fn kill_tag(
        &mut self,
        password: &str,
        epc_mask: Option<&str>,
    ) -> Result<Vec<UhfTag>, RfidError> {
        let lines = self
            .conn
            .command("AT+KILL", &[param(password), epc_mask.map(str::to_string)])?;
        // +KILL: ABCD01237654321001234567,ACCESS ERROR
        decode_tag_responses(&lines, 7, unix_timestamp())
    }

    /// Lock a transponder area with the given access password.
    pub fn lock_tag(
        &mut self,
        membank: LockTarget,
        password: &str,
        epc_mask: Option<&str>,
    ) -> Result<Vec<UhfTag>, RfidError> {
        let lines = self.conn.command_with_timeout(
            "AT+LCK",
            &[
                param(membank),
                param(password),
                epc_mask.map(str::to_string),
            ],
            LOCK_TIMEOUT,
        )?;
        decode_tag_responses(&lines, 6, unix_timestamp())
    }

    /// Lock the user memory bank.
    pub fn lock_user_memory(
        &mut self,
        password: &str,
        epc_mask: Option<&str>,
    ) -> Result<Vec<UhfTag>, RfidError> {
        self.lock_tag(LockTarget::Usr, password, epc_mask)
    }

    /// Lock the EPC memory bank.
    pub fn lock_epc_memory(
        &mut self,
        password: &str,
        epc_mask: Option<&str>,
    ) -> Result<Vec<UhfTag>, RfidError> {
        self.lock_tag(LockTarget::Epc, password, epc_mask)
    }

    /// Unlock a transponder area with the given access password.
    pub fn unlock_tag(
        &mut self,
        membank: LockTarget,
        password: &str,
        epc_mask: Option<&str>,
    ) -> Result<Vec<UhfTag>, RfidError> {
        let lines = self.conn.command_with_timeout(
            "AT+ULCK",
            &[
                param(membank),
                param(password),
                epc_mask.map(str::to_string),
            ],
            LOCK_TIMEOUT,
        )?;
        decode_tag_responses(&lines, 7, unix_timestamp())
    }

    /// Unlock the user memory bank.
    pub fn unlock_user_memory(
        &mut self,
        password: &str,
        epc_mask: Option<&str>,
    ) -> Result<Vec<UhfTag>, RfidError> {
        self.unlock_tag(LockTarget::Usr, password, epc_mask)
    }

    /// Unlock the EPC memory bank.
    pub fn unlock_epc_memory(
        &mut self,
        password: &str,
        epc_mask: Option<&str>,
    ) -> Result<Vec<UhfTag>, RfidError> {
        self.unlock_tag(LockTarget::Epc, password, epc_mask)
    }

    /// Permanently lock a transponder area.
    ///
    /// # Warning
    /// A permanent lock cannot be undone.
    pub fn lock_tag_permanent(
        &mut self,
        membank: LockTarget,
        password: &str,
        epc_mask: Option<&str>,
    ) -> Result<Vec<UhfTag>, RfidError> {
        let lines = self.conn.command(
            "AT+PLCK",
            &[
                param(membank),
                param(password),
                epc_mask.map(str::to_string),
            ],
        )?;
        decode_tag_responses(&lines, 7, unix_timestamp())
    }

    /// Permanently lock the user memory bank.
    pub fn lock_user_memory_permanent(
        &mut self,
        password: &str,
        epc_mask: Option<&str>,
    ) -> Result<Vec<UhfTag>, RfidError> {
        self.lock_tag_permanent(LockTarget::Usr, password, epc_mask)
    }

    /// Permanently lock the EPC memory bank.
    pub fn lock_epc_memory_permanent(
        &mut self,
        password: &str,
        epc_mask: Option<&str>,
    ) -> Result<Vec<UhfTag>, RfidError> {
        self.lock_tag_permanent(LockTarget::Epc, password, epc_mask)
    }

    /// Change the access (lock) password of the masked transponders.
    pub fn set_lock_password(
        &mut self,
        password: &str,
        new_password: &str,
        epc_mask: Option<&str>,
    ) -> Result<Vec<UhfTag>, RfidError> {
        self.change_password("LCK", password, new_password, epc_mask)
    }

    /// Change the kill password of the masked transponders.
    pub fn set_kill_password(
        &mut self,
        password: &str,
        new_password: &str,
        epc_mask: Option<&str>,
    ) -> Result<Vec<UhfTag>, RfidError> {
        self.change_password("KILL", password, new_password, epc_mask)
    }

    /// Error messages collected from antenna error events, keyed
    /// `"Antenna <n>"` or `"message"` when no antenna was attributable.
    pub fn antenna_errors(&self) -> &HashMap<String, String> {
        &self.config.errors
    }

    fn change_password(
        &mut self,
        kind: &str,
        password: &str,
        new_password: &str,
        epc_mask: Option<&str>,
    ) -> Result<Vec<UhfTag>, RfidError> {
        let lines = self.conn.command(
            "AT+PWD",
            &[
                param(kind),
                param(password),
                param(new_password),
                epc_mask.map(str::to_string),
            ],
        )?;
        // +PWD: ABCD01237654321001234567,ACCESS ERROR
        decode_tag_responses(&lines, 6, unix_timestamp())
    }

    /// Decode an inventory pass and apply the mirror bookkeeping: a pending
    /// error event is recorded under its antenna and aborts the call, the
    /// accumulated tags are discarded with it.
    fn run_inventory(
        &mut self,
        lines: &[String],
        split_index: usize,
        ignore_error: bool,
        is_report: bool,
    ) -> Result<Vec<UhfTag>, RfidError> {
        let ctx = InventoryContext {
            split_index,
            with_tid: self.config.inventory.with_tid,
            with_rssi: self.config.inventory.with_rssi,
            ignore_error,
            is_report,
        };
        let decoded = decode_inventory(lines, unix_timestamp(), &ctx)?;
        if let Some(error) = decoded.error {
            let message = match decoded.antenna {
                Some(antenna) => {
                    self.config
                        .errors
                        .insert(format!("Antenna {antenna}"), error.clone());
                    format!("{error} - Antenna {antenna}")
                }
                None => {
                    self.config.errors.insert("message".to_string(), error.clone());
                    error
                }
            };
            return Err(RfidError::Reader(message));
        }
        Ok(decoded.tags)
    }
}

/// The QRG2 UHF RFID module: reader, writer and antenna integrated into a
/// single serial-attached device.
pub struct Qrg2<T: RfidTransport> {
    inner: UhfReaderGen2<T>,
}

impl<T: RfidTransport> Qrg2<T> {
    /// Identity the connected device must report.
    pub const PROFILE: ReaderProfile = ReaderProfile {
        firmware_name: "QRG2",
        hardware_name: "QRG2",
        min_firmware: 1.3,
    };

    /// Connect to a QRG2 over the given transport.
    pub fn new(transport: T) -> Result<Self, RfidError> {
        Ok(Self {
            inner: UhfReaderGen2::new(transport, Self::PROFILE)?,
        })
    }
}

impl<T: RfidTransport> Deref for Qrg2<T> {
    type Target = UhfReaderGen2<T>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T: RfidTransport> DerefMut for Qrg2<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

/// Lock operations wait on every tag in the field and can outlast the
/// default command deadline considerably.
const LOCK_TIMEOUT: Duration = Duration::from_millis(10_000);

fn param<V: ToString>(value: V) -> Option<String> {
    Some(value.to_string())
}

fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Smallest exponent `q` with `2^q >= count`.
pub(crate) fn q_exponent(count: u32) -> u32 {
    let mut q = 0;
    while q < 32 && count > (1 << q) {
        q += 1;
    }
    q
}

/// Length bits of the PC word for an EPC of `epc_words` 16-bit words: the
/// word pair count shifted into the upper nibble, plus the odd-word flag.
pub(crate) fn epc_length_bits(epc_words: usize) -> u16 {
    let mut bits = ((epc_words / 2) as u16) << 12;
    if epc_words % 2 == 1 {
        bits |= 0x0800;
    }
    bits
}

fn parse_reader_info(lines: &[String]) -> Result<ReaderInfo, RfidError> {
    // +SW: PULSAR_LR 0100
    // +HW: PULSAR_LR 0100
    // +SERIAL: 2020090817420000
    let shape_error = || {
        RfidError::UnexpectedResponse(format!(
            "Wrong reader - Not expected info response - {lines:?}"
        ))
    };
    let firmware: Vec<&str> = lines.first().ok_or_else(shape_error)?.split(' ').collect();
    let hardware: Vec<&str> = lines.get(1).ok_or_else(shape_error)?.split(' ').collect();
    let serial: Vec<&str> = lines.get(2).ok_or_else(shape_error)?.split(' ').collect();
    Ok(ReaderInfo {
        firmware: firmware.get(1).ok_or_else(shape_error)?.to_string(),
        firmware_version: firmware.get(2).ok_or_else(shape_error)?.to_string(),
        hardware: hardware.get(1).ok_or_else(shape_error)?.to_string(),
        hardware_version: hardware.get(2).ok_or_else(shape_error)?.to_string(),
        serial_number: serial.get(1).ok_or_else(shape_error)?.to_string(),
    })
}

/// Derive the comparable `MAJOR.MINOR` number from a raw version string,
/// `"0103"` becoming `1.03`.
fn firmware_version_number(raw: &str) -> Option<f32> {
    let major = raw.get(0..2)?;
    let minor = raw.get(2..4)?;
    format!("{major}.{minor}").parse().ok()
}

fn parse_mask_response(
    lines: &[String],
    offset: usize,
    command: &str,
) -> Result<Option<MaskSettings>, RfidError> {
    let payload = lines
        .first()
        .and_then(|l| l.get(offset..))
        .ok_or_else(|| unexpected(command, lines))?;
    let fields: Vec<&str> = payload.split(',').collect();
    if fields[0] == "OFF" {
        return Ok(None);
    }
    let memory: MemoryBank = fields[0].parse()?;
    let start = fields
        .get(1)
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| unexpected(command, lines))?;
    let mask = fields.get(2).ok_or_else(|| unexpected(command, lines))?;
    Ok(Some(MaskSettings {
        memory,
        start,
        mask: mask.to_string(),
    }))
}

fn unexpected(command: &str, lines: &[String]) -> RfidError {
    RfidError::UnexpectedResponse(format!(
        "Not expected response for command {command} - {lines:?}"
    ))
}
