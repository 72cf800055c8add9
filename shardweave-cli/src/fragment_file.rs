//! On-disk fragment layout
//!
//! `marker (1) | index (u32 BE) | total (u32 BE) | payload length (u32 BE) | payload`

use bytes::Bytes;
use shardweave_core::constants::FRAGMENT_MARKER;
use shardweave_core::cursor::{ByteReader, ByteWriter};
use shardweave_core::CodingError;

/// Header and payload of one fragment file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentFile {
    /// Canonical position, 0-based
    pub index: u32,
    /// `n`
    pub total: u32,
    /// Fragment bytes
    pub payload: Bytes,
}

impl FragmentFile {
    /// Serialize to the on-disk layout
    pub fn encode(&self) -> Bytes {
        let mut w = ByteWriter::with_capacity(self.payload.len() + 13);
        w.write_u8(FRAGMENT_MARKER);
        w.write_u32(self.index);
        w.write_u32(self.total);
        w.write_array(&self.payload);
        w.into_bytes()
    }

    /// Parse the on-disk layout
    pub fn decode(data: Bytes) -> Result<Self, CodingError> {
        let mut r = ByteReader::new(data);
        let marker = r.read_u8()?;
        if marker != FRAGMENT_MARKER {
            return Err(CodingError::InvalidMessage(format!(
                "bad fragment marker {:#04x}",
                marker
            )));
        }
        let index = r.read_u32()?;
        let total = r.read_u32()?;
        let payload = r.read_array()?;
        if r.remaining() != 0 {
            return Err(CodingError::InvalidMessage(format!(
                "{} trailing bytes after fragment payload",
                r.remaining()
            )));
        }
        Ok(Self {
            index,
            total,
            payload,
        })
    }
}
