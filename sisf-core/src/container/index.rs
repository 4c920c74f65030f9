//! The per-shard chunk index: one fixed-size entry per micro-chunk,
//! appended to the meta file directly after the shard header.

use std::io::Write;

pub const INDEX_ENTRY_LEN: usize = 12;

/// Where one encoded micro-chunk lives in the shard data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub offset: u64,
    pub length: u32,
}

impl IndexEntry {
    pub fn to_bytes(self) -> [u8; INDEX_ENTRY_LEN] {
        let mut buf = [0u8; INDEX_ENTRY_LEN];
        buf[0..8].copy_from_slice(&self.offset.to_le_bytes());
        buf[8..12].copy_from_slice(&self.length.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: [u8; INDEX_ENTRY_LEN]) -> Self {
        IndexEntry {
            offset: u64::from_le_bytes(buf[0..8].try_into().unwrap()),
            length: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
        }
    }
}

pub fn write_table(mut w: impl Write, entries: &[IndexEntry]) -> std::io::Result<()> {
    for e in entries {
        w.write_all(&e.to_bytes())?;
    }
    Ok(())
}
