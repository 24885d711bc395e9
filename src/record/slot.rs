//! Slot codec
//!
//! Fixed-length binary encoding of one record.
//!
//! ## Slot Format (280 bytes, little-endian)
//! ```text
//! ┌────────────┬────────┬──────────────────┬──────────────────┐
//! │ Status (2) │ Id (4) │ First name (120) │ Last name (120)  │
//! ├────────────┴──┬─────┴─────┬──────────┬─┴──────────────────┤
//! │ Year (4)      │ Month (4) │ Day (4)  │ Balance (16)       │
//! ├───────────────┼───────────┴──────────┴────────────────────┤
//! │ Code (2)      │ Flag (4, Unicode scalar value)            │
//! └───────────────┴───────────────────────────────────────────┘
//! ```
//! Names are UTF-8, zero-padded, truncated at a character boundary to fit.
//! The balance uses the 16-byte decimal representation (flags, hi, lo, mid).

use bytes::{Buf, BufMut, BytesMut};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::error::{Result, RosterError};

use super::{Record, RecordData};

// =============================================================================
// Layout Constants
// =============================================================================

/// Width of each fixed name buffer
pub const NAME_WIDTH: usize = 120;

/// Width of the encoded balance
const BALANCE_WIDTH: usize = 16;

/// Status (2) + Id (4) + names (2 * 120) + date (3 * 4) + balance (16) + code (2) + flag (4)
pub const SLOT_SIZE: usize = 2 + 4 + 2 * NAME_WIDTH + 3 * 4 + BALANCE_WIDTH + 2 + 4;

/// Liveness marker stored in the first two bytes of each slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum SlotStatus {
    Live = 0,
    Deleted = 1,
}

impl SlotStatus {
    pub fn from_u16(raw: u16) -> Result<Self> {
        match raw {
            0 => Ok(SlotStatus::Live),
            1 => Ok(SlotStatus::Deleted),
            other => Err(RosterError::Storage(format!(
                "Invalid slot status: {}",
                other
            ))),
        }
    }

    pub fn to_le_bytes(self) -> [u8; 2] {
        (self as u16).to_le_bytes()
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a record into exactly [`SLOT_SIZE`] bytes
pub fn encode_slot(record: &Record, status: SlotStatus) -> Vec<u8> {
    let data = &record.data;
    let mut buf = BytesMut::with_capacity(SLOT_SIZE);

    buf.put_u16_le(status as u16);
    buf.put_u32_le(record.id);
    put_name(&mut buf, &data.first_name);
    put_name(&mut buf, &data.last_name);
    buf.put_i32_le(data.birth_date.year());
    buf.put_i32_le(data.birth_date.month() as i32);
    buf.put_i32_le(data.birth_date.day() as i32);
    buf.put_slice(&data.balance.serialize());
    buf.put_i16_le(data.code);
    buf.put_u32_le(data.flag as u32);

    debug_assert_eq!(buf.len(), SLOT_SIZE);
    buf.to_vec()
}

/// Write a name into a zero-padded fixed buffer
fn put_name(buf: &mut BytesMut, name: &str) {
    let bytes = truncate_utf8(name, NAME_WIDTH).as_bytes();
    buf.put_slice(bytes);
    buf.put_bytes(0, NAME_WIDTH - bytes.len());
}

/// Longest prefix of `s` that fits in `width` bytes without splitting a char
fn truncate_utf8(s: &str, width: usize) -> &str {
    if s.len() <= width {
        return s;
    }
    let mut end = width;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode one slot into its status and record
pub fn decode_slot(slot: &[u8]) -> Result<(SlotStatus, Record)> {
    if slot.len() != SLOT_SIZE {
        return Err(RosterError::Storage(format!(
            "Slot must be {} bytes, got {}",
            SLOT_SIZE,
            slot.len()
        )));
    }

    let mut buf = slot;
    let status = SlotStatus::from_u16(buf.get_u16_le())?;
    let id = buf.get_u32_le();
    let first_name = get_name(&mut buf)?;
    let last_name = get_name(&mut buf)?;

    let year = buf.get_i32_le();
    let month = buf.get_i32_le();
    let day = buf.get_i32_le();
    let birth_date = u32::try_from(month)
        .ok()
        .zip(u32::try_from(day).ok())
        .and_then(|(m, d)| NaiveDate::from_ymd_opt(year, m, d))
        .ok_or_else(|| {
            RosterError::Storage(format!(
                "Invalid date in slot {}: {}-{}-{}",
                id, year, month, day
            ))
        })?;

    let mut balance = [0u8; BALANCE_WIDTH];
    buf.copy_to_slice(&mut balance);
    let balance = Decimal::deserialize(balance);

    let code = buf.get_i16_le();
    let flag = char::from_u32(buf.get_u32_le()).ok_or_else(|| {
        RosterError::Storage(format!("Invalid flag character in slot {}", id))
    })?;

    let record = Record::new(
        id,
        RecordData {
            first_name,
            last_name,
            birth_date,
            balance,
            code,
            flag,
        },
    );
    Ok((status, record))
}

fn get_name(buf: &mut &[u8]) -> Result<String> {
    let raw = &buf[..NAME_WIDTH];
    let len = raw.iter().position(|&b| b == 0).unwrap_or(NAME_WIDTH);
    let name = std::str::from_utf8(&raw[..len])
        .map_err(|e| RosterError::Storage(format!("Invalid UTF-8 name in slot: {}", e)))?
        .to_string();
    buf.advance(NAME_WIDTH);
    Ok(name)
}
