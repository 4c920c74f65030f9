//! The 86-byte shard header prefixing every `*.meta` file: seven U16
//! fields then nine U64 fields, little-endian.

use crate::codec::CompressionTag;
use crate::error::{Result, SisfError};
use crate::volume::Dtype;
use std::io::Write;

pub const SHARD_HEADER_LEN: usize = 86;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardHeader {
    pub version: u16,
    pub dtype: Dtype,
    /// Channels held by this shard; the format stores one per shard.
    pub channel_count: u16,
    pub compression: CompressionTag,
    /// Micro-chunk size per axis.
    pub chunk_size: [u16; 3],
    /// Stored extent of the shard, voxels.
    pub size: [u64; 3],
    /// `(x0, x1, y0, y1, z0, z1)` window exposed to readers.
    pub crop: [u64; 6],
}

impl ShardHeader {
    pub fn write_to(&self, mut w: impl Write) -> std::io::Result<()> {
        w.write_all(&self.version.to_le_bytes())?;
        w.write_all(&self.dtype.code().to_le_bytes())?;
        w.write_all(&self.channel_count.to_le_bytes())?;
        w.write_all(&self.compression.code().to_le_bytes())?;
        for c in self.chunk_size {
            w.write_all(&c.to_le_bytes())?;
        }
        for s in self.size {
            w.write_all(&s.to_le_bytes())?;
        }
        for c in self.crop {
            w.write_all(&c.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn from_bytes(buf: &[u8; SHARD_HEADER_LEN]) -> Result<Self> {
        let header = ShardHeader {
            version: le16(&buf[0..2]),
            dtype: Dtype::from_code(le16(&buf[2..4]))?,
            channel_count: le16(&buf[4..6]),
            compression: CompressionTag::from_code(le16(&buf[6..8]))?,
            chunk_size: [le16(&buf[8..10]), le16(&buf[10..12]), le16(&buf[12..14])],
            size: [le64(&buf[14..22]), le64(&buf[22..30]), le64(&buf[30..38])],
            crop: [
                le64(&buf[38..46]),
                le64(&buf[46..54]),
                le64(&buf[54..62]),
                le64(&buf[62..70]),
                le64(&buf[70..78]),
                le64(&buf[78..86]),
            ],
        };
        header.validate()?;
        Ok(header)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.chunk_size.iter().any(|&c| c == 0) {
            return Err(SisfError::Format(
                "shard header has a zero micro-chunk size".into(),
            ));
        }
        for axis in 0..3 {
            let (c0, c1) = (self.crop[axis * 2], self.crop[axis * 2 + 1]);
            if c0 > c1 || c1 > self.size[axis] {
                return Err(SisfError::Format(format!(
                    "crop {c0}..{c1} outside shard axis {axis} of {}",
                    self.size[axis]
                )));
            }
        }
        Ok(())
    }

    /// Micro-chunk count per axis.
    pub fn chunk_counts(&self) -> [u64; 3] {
        [
            self.size[0].div_ceil(self.chunk_size[0] as u64),
            self.size[1].div_ceil(self.chunk_size[1] as u64),
            self.size[2].div_ceil(self.chunk_size[2] as u64),
        ]
    }

    pub fn chunk_total(&self) -> u64 {
        self.chunk_counts().iter().product()
    }

    /// Extent visible to readers, per axis.
    pub fn crop_size(&self) -> [u64; 3] {
        [
            self.crop[1] - self.crop[0],
            self.crop[3] - self.crop[2],
            self.crop[5] - self.crop[4],
        ]
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
