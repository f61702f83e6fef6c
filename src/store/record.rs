//! On-disk record layout: `name_len(4) | content_len(4) | tombstone(1) | name | content`.
//!
//! All integers are big-endian. No checksum field — checksums are out of
//! scope for this format.

use super::error::{Error, Result};

/// Fixed size of the header in front of every record.
pub const HEADER_SIZE: i32 = 9;

pub const TOMBSTONE_LIVE: u8 = 0x00;
pub const TOMBSTONE_DEAD: u8 = 0x01;

/// The fixed-size part of a record, decoded without touching `content`.
#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub name_len: i32,
    pub content_len: i32,
    pub tombstone: u8,
}

impl Header {
    pub fn decode(bytes: &[u8; HEADER_SIZE as usize]) -> Result<Self> {
        let name_len = i32::from_be_bytes(bytes[0..4].try_into().unwrap());
        let content_len = i32::from_be_bytes(bytes[4..8].try_into().unwrap());
        let tombstone = bytes[8];
        if name_len <= 0 {
            return Err(Error::InvalidArgument(format!(
                "decoded non-positive name_len {name_len}"
            )));
        }
        if content_len < 0 {
            return Err(Error::InvalidArgument(format!(
                "decoded negative content_len {content_len}"
            )));
        }
        Ok(Self {
            name_len,
            content_len,
            tombstone,
        })
    }

    pub fn encode(name_len: i32, content_len: i32, tombstone: u8) -> Result<[u8; HEADER_SIZE as usize]> {
        if name_len <= 0 {
            return Err(Error::InvalidArgument("name must be non-empty".into()));
        }
        if content_len < 0 {
            return Err(Error::InvalidArgument("content length cannot be negative".into()));
        }
        let mut out = [0u8; HEADER_SIZE as usize];
        out[0..4].copy_from_slice(&name_len.to_be_bytes());
        out[4..8].copy_from_slice(&content_len.to_be_bytes());
        out[8] = tombstone;
        Ok(out)
    }

    pub const fn is_live(&self) -> bool {
        self.tombstone == TOMBSTONE_LIVE
    }

    /// Total on-disk size of the record this header belongs to.
    pub fn total_size(&self) -> i32 {
        HEADER_SIZE + self.name_len + self.content_len
    }
}

/// Compute the total on-disk size for a record about to be written, validating
/// the lengths fit the on-disk format (`name_len > 0`, `content_len >= 0`,
/// both representable as `i32`).
pub fn on_disk_size(name: &str, content_len: usize) -> Result<i32> {
    let name_len = i32::try_from(name.len())
        .map_err(|_| Error::InvalidArgument("name too long to encode".into()))?;
    if name_len <= 0 {
        return Err(Error::InvalidArgument("name must be non-empty".into()));
    }
    let content_len = i32::try_from(content_len)
        .map_err(|_| Error::InvalidArgument("content exceeds INT32_MAX".into()))?;
    Ok(HEADER_SIZE + name_len + content_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let bytes = Header::encode(4, 10, TOMBSTONE_LIVE).unwrap();
        let header = Header::decode(&bytes).unwrap();
        assert_eq!(header.name_len, 4);
        assert_eq!(header.content_len, 10);
        assert!(header.is_live());
        assert_eq!(header.total_size(), 9 + 4 + 10);
    }

    #[test]
    fn header_rejects_empty_name() {
        assert!(Header::encode(0, 10, TOMBSTONE_LIVE).is_err());
    }

    #[test]
    fn header_rejects_negative_content_len() {
        assert!(Header::encode(4, -1, TOMBSTONE_LIVE).is_err());
    }

    #[test]
    fn decode_rejects_malformed_header() {
        let mut bytes = Header::encode(4, 10, TOMBSTONE_LIVE).unwrap();
        bytes[0..4].copy_from_slice(&(-1i32).to_be_bytes());
        assert!(Header::decode(&bytes).is_err());
    }

    #[test]
    fn on_disk_size_matches_header_plus_name_plus_content() {
        assert_eq!(on_disk_size("a", 3).unwrap(), 9 + 1 + 3);
    }
}
