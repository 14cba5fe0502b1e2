//! Binary IR header: magic and version probe. KIR JSON is the canonical
//! encoding; the binary form is identified by a 4-byte magic and two
//! version bytes, all integers little-endian.

use crate::error::{KirError, Result};

/// `KRY\0`.
pub const KRY_MAGIC: [u8; 4] = [0x4B, 0x52, 0x59, 0x00];
pub const KRY_VERSION_MAJOR: u8 = 2;
pub const KRY_VERSION_MINOR: u8 = 0;

/// Header length: magic plus major and minor version bytes.
pub const HEADER_LEN: usize = 6;

/// Write the current header into a buffer.
pub fn write_header(out: &mut Vec<u8>) {
    out.extend_from_slice(&KRY_MAGIC);
    out.push(KRY_VERSION_MAJOR);
    out.push(KRY_VERSION_MINOR);
}

/// Validate the magic and return `(major, minor)`. Readers reject
/// mismatched magic outright.
pub fn read_header(data: &[u8]) -> Result<(u8, u8)> {
    if data.len() < HEADER_LEN {
        return Err(KirError::TruncatedHeader);
    }
    if data[..4] != KRY_MAGIC {
        return Err(KirError::BadMagic);
    }
    Ok((data[4], data[5]))
}

/// True when a buffer starts with the binary IR magic.
pub fn is_binary(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == KRY_MAGIC
}
