//! Byte-level encodings shared by scripts and transactions.
//!
//! - Script numbers: minimal little-endian sign-magnitude integers, as pushed
//!   for gas limit and gas price in contract outputs.
//! - Strict hex decoding for bytecode, ABI call data and contract addresses.
//! - CompactSize length prefixes used by the wire format.

use bytes::{Buf, BufMut};

use crate::error::EncodingError;

/// Widest script number this crate accepts (8 magnitude bytes + sign byte).
const MAX_SCRIPT_NUM_LEN: usize = 9;

/// Encode an integer as a minimal script number.
///
/// Zero is the empty byte string. The magnitude is written little-endian;
/// if its top byte already uses the high bit, an extra `0x00` (positive) or
/// `0x80` (negative) byte carries the sign, otherwise negative values set
/// the high bit of the last byte.
pub fn encode_script_num(n: i64) -> Vec<u8> {
    if n == 0 {
        return Vec::new();
    }

    let negative = n < 0;
    let mut magnitude = n.unsigned_abs();
    let mut out = Vec::with_capacity(MAX_SCRIPT_NUM_LEN);
    while magnitude > 0 {
        out.push((magnitude & 0xff) as u8);
        magnitude >>= 8;
    }

    let last = out.len() - 1;
    if out[last] & 0x80 != 0 {
        out.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        out[last] |= 0x80;
    }
    out
}

/// Decode a minimally-encoded script number.
///
/// Rejects encodings with a redundant trailing sign byte and anything that
/// does not fit an `i64`.
pub fn decode_script_num(bytes: &[u8]) -> Result<i64, EncodingError> {
    let Some((&last, rest)) = bytes.split_last() else {
        return Ok(0);
    };
    if bytes.len() > MAX_SCRIPT_NUM_LEN {
        return Err(EncodingError::NumberTooWide(bytes.len()));
    }
    // A last byte of 0x00/0x80 is only allowed when the byte before it needs
    // its high bit for magnitude.
    if last & 0x7f == 0 && rest.last().is_none_or(|b| b & 0x80 == 0) {
        return Err(EncodingError::NonMinimalNumber);
    }

    let negative = last & 0x80 != 0;
    let mut magnitude: u128 = 0;
    for (i, &b) in rest.iter().enumerate() {
        magnitude |= (b as u128) << (8 * i);
    }
    magnitude |= ((last & 0x7f) as u128) << (8 * rest.len());

    if negative {
        if magnitude == 1u128 << 63 {
            return Ok(i64::MIN);
        }
        let m = i64::try_from(magnitude)
            .map_err(|_| EncodingError::OutOfRange(format!("-{magnitude}")))?;
        Ok(-m)
    } else {
        i64::try_from(magnitude).map_err(|_| EncodingError::OutOfRange(magnitude.to_string()))
    }
}

/// Strictly decode a hex string into bytes.
///
/// An optional `0x` prefix is accepted. Odd lengths and non-hex characters
/// are errors; nothing is silently truncated.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, EncodingError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let offset = s.len() - digits.len();

    hex::decode(digits).map_err(|e| match e {
        hex::FromHexError::InvalidHexCharacter { c, index } => EncodingError::InvalidHexCharacter {
            c,
            index: index + offset,
        },
        hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength => {
            EncodingError::OddLength(digits.len())
        }
    })
}

/// Append a CompactSize length prefix.
pub fn put_compact_size(buf: &mut impl BufMut, n: u64) {
    match n {
        0..=0xfc => buf.put_u8(n as u8),
        0xfd..=0xffff => {
            buf.put_u8(0xfd);
            buf.put_u16_le(n as u16);
        }
        0x1_0000..=0xffff_ffff => {
            buf.put_u8(0xfe);
            buf.put_u32_le(n as u32);
        }
        _ => {
            buf.put_u8(0xff);
            buf.put_u64_le(n);
        }
    }
}

/// Read a CompactSize length prefix, rejecting non-canonical forms.
pub fn get_compact_size(buf: &mut impl Buf) -> Result<u64, EncodingError> {
    ensure_remaining(&*buf, 1, "compact size")?;
    let (n, min) = match buf.get_u8() {
        0xfd => {
            ensure_remaining(&*buf, 2, "compact size")?;
            (buf.get_u16_le() as u64, 0xfd)
        }
        0xfe => {
            ensure_remaining(&*buf, 4, "compact size")?;
            (buf.get_u32_le() as u64, 0x1_0000)
        }
        0xff => {
            ensure_remaining(&*buf, 8, "compact size")?;
            (buf.get_u64_le(), 0x1_0000_0000)
        }
        b => return Ok(b as u64),
    };
    if n < min {
        return Err(EncodingError::OutOfRange(format!("non-canonical compact size {n}")));
    }
    Ok(n)
}

pub(crate) fn ensure_remaining(buf: &impl Buf, n: usize, what: &str) -> Result<(), EncodingError> {
    if buf.remaining() < n {
        return Err(EncodingError::Truncated(what.to_string()));
    }
    Ok(())
}
