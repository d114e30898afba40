//! On-disk layout of a store snapshot
//!
//! ```text
//! magic: u32 | version: u16 | payload_len: u64 | payload (bincode) | crc32: u32
//! ```
//!
//! All integers are big-endian. The checksum covers every byte before it.

use vitrine_core::{Error, Result};
use vitrine_store::StoreImage;

/// Snapshot file magic: "VTSN" (ViTrine SNapshot)
pub const MAGIC: u32 = 0x5654_534E;

/// Snapshot format version
pub const FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = 4 + 2 + 8;
const TRAILER_LEN: usize = 4;

/// Version compatibility information
pub struct FormatVersion {
    /// Current version of this format
    pub current: u16,
    /// Minimum supported version for reading
    pub min_read: u16,
}

impl FormatVersion {
    /// Check if a version can be read
    pub fn can_read(&self, version: u16) -> bool {
        version >= self.min_read && version <= self.current
    }
}

/// Snapshot format version info
pub fn snapshot_version() -> FormatVersion {
    FormatVersion {
        current: FORMAT_VERSION,
        min_read: 1,
    }
}

/// Serializes an image into a framed, checksummed buffer.
pub fn encode(image: &StoreImage) -> Result<Vec<u8>> {
    let payload = bincode::serialize(image).map_err(|e| Error::Serialization(e.to_string()))?;

    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len() + TRAILER_LEN);
    buf.extend_from_slice(&MAGIC.to_be_bytes());
    buf.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
    buf.extend_from_slice(&(payload.len() as u64).to_be_bytes());
    buf.extend_from_slice(&payload);

    let checksum = crc32fast::hash(&buf);
    buf.extend_from_slice(&checksum.to_be_bytes());
    Ok(buf)
}

/// CRC32 stored in the trailer of an encoded buffer.
pub fn stored_checksum(bytes: &[u8]) -> Result<u32> {
    if bytes.len() < HEADER_LEN + TRAILER_LEN {
        return Err(Error::Corruption(format!(
            "snapshot is truncated ({} bytes)",
            bytes.len()
        )));
    }
    Ok(read_u32(&bytes[bytes.len() - TRAILER_LEN..]))
}

/// Validates framing and checksum, then deserializes the image.
pub fn decode(bytes: &[u8]) -> Result<StoreImage> {
    let expected = stored_checksum(bytes)?;
    let body = &bytes[..bytes.len() - TRAILER_LEN];

    let actual = crc32fast::hash(body);
    if actual != expected {
        return Err(Error::Corruption(format!(
            "snapshot checksum mismatch: expected {:08x}, got {:08x}",
            expected, actual
        )));
    }

    let magic = read_u32(&body[0..4]);
    if magic != MAGIC {
        return Err(Error::Corruption(format!(
            "not a snapshot file (magic {:08x})",
            magic
        )));
    }

    let version = u16::from_be_bytes([body[4], body[5]]);
    if !snapshot_version().can_read(version) {
        return Err(Error::Corruption(format!(
            "unsupported snapshot format version {}",
            version
        )));
    }

    let mut len = [0u8; 8];
    len.copy_from_slice(&body[6..HEADER_LEN]);
    let len = u64::from_be_bytes(len);
    let payload = &body[HEADER_LEN..];
    if payload.len() as u64 != len {
        return Err(Error::Corruption(format!(
            "snapshot payload is {} bytes, header says {}",
            payload.len(),
            len
        )));
    }

    bincode::deserialize(payload).map_err(|e| Error::Serialization(e.to_string()))
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_be_bytes(buf)
}
