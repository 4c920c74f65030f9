//! The 60-byte archive header stored in `metadata.bin`.
//!
//! Layout is six U16 fields then six U64 fields, all little-endian:
//! version, dtype, channel_count, macro-chunk size x/y/z, then resolution
//! x/y/z (nanometers) and volume size x/y/z (voxels).

use crate::error::{Result, SisfError};
use crate::volume::Dtype;
use std::io::Write;

pub const METADATA_NAME: &str = "metadata.bin";
pub const ARCHIVE_HEADER_LEN: usize = 60;
pub const CURRENT_VERSION: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveHeader {
    pub version: u16,
    pub dtype: Dtype,
    pub channel_count: u16,
    /// Macro-chunk size per axis; each macro-chunk is one shard.
    pub mchunk: [u16; 3],
    /// Voxel resolution per axis, nanometers, persisted verbatim.
    pub res: [u64; 3],
    /// Volume size per axis, voxels.
    pub size: [u64; 3],
}

impl ArchiveHeader {
    pub fn write_to(&self, mut w: impl Write) -> std::io::Result<()> {
        w.write_all(&self.version.to_le_bytes())?;
        w.write_all(&self.dtype.code().to_le_bytes())?;
        w.write_all(&self.channel_count.to_le_bytes())?;
        for m in self.mchunk {
            w.write_all(&m.to_le_bytes())?;
        }
        for r in self.res {
            w.write_all(&r.to_le_bytes())?;
        }
        for s in self.size {
            w.write_all(&s.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn from_bytes(buf: &[u8; ARCHIVE_HEADER_LEN]) -> Result<Self> {
        let header = ArchiveHeader {
            version: le16(&buf[0..2]),
            dtype: Dtype::from_code(le16(&buf[2..4]))?,
            channel_count: le16(&buf[4..6]),
            mchunk: [le16(&buf[6..8]), le16(&buf[8..10]), le16(&buf[10..12])],
            res: [le64(&buf[12..20]), le64(&buf[20..28]), le64(&buf[28..36])],
            size: [le64(&buf[36..44]), le64(&buf[44..52]), le64(&buf[52..60])],
        };
        if header.mchunk.iter().any(|&m| m == 0) {
            return Err(SisfError::Format(
                "archive header has a zero macro-chunk size".into(),
            ));
        }
        Ok(header)
    }
}

#[inline]
fn le16(x: &[u8]) -> u16 {
    u16::from_le_bytes(x.try_into().unwrap())
}

#[inline]
fn le64(x: &[u8]) -> u64 {
    u64::from_le_bytes(x.try_into().unwrap())
}
