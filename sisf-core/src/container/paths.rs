//! Shard file naming inside an archive directory.

use std::path::{Path, PathBuf};

pub const DATA_DIR: &str = "data";
pub const META_DIR: &str = "meta";

/// Resolution level; reserved, the format only defines `1X`.
pub const RESOLUTION_SCALE: u64 = 1;

/// `chunk_{i}_{j}_{k}.{c}.{scale}X`, unpadded decimal.
pub fn shard_stem(i: u64, j: u64, k: u64, channel: u64, scale: u64) -> String {
    format!("chunk_{i}_{j}_{k}.{channel}.{scale}X")
}

pub fn shard_data_path(root: &Path, i: u64, j: u64, k: u64, channel: u64, scale: u64) -> PathBuf {
    root.join(DATA_DIR)
        .join(format!("{}.data", shard_stem(i, j, k, channel, scale)))
}

pub fn shard_meta_path(root: &Path, i: u64, j: u64, k: u64, channel: u64, scale: u64) -> PathBuf {
    root.join(META_DIR)
        .join(format!("{}.meta", shard_stem(i, j, k, channel, scale)))
}
