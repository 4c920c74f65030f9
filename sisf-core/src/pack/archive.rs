//! Archive writer: split a whole volume into macro-chunks and emit one
//! shard per `(channel, i, j, k)`.

use crate::codec::CompressionTag;
use crate::container::metadata::{ArchiveHeader, CURRENT_VERSION, METADATA_NAME};
use crate::container::paths::{
    DATA_DIR, META_DIR, RESOLUTION_SCALE, shard_data_path, shard_meta_path,
};
use crate::error::{Result, SisfError};
use crate::pack::shard::{ShardOptions, create_shard};
use crate::tiling::tiles;
use crate::volume::Element;
use log::debug;
use ndarray::{ArrayView3, ArrayView4, Axis, s};
use std::fs::{self, File};
use std::path::Path;

#[derive(Clone, Debug)]
pub struct ArchiveOptions {
    /// Codec applied to every shard.
    pub compression: CompressionTag,
    /// Per-shard compression workers; `0` means one per logical CPU.
    pub threads: usize,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            compression: CompressionTag::Zstd,
            threads: 0,
        }
    }
}

/// Create a SISF archive at `dir` from a `(channel, x, y, z)` volume.
///
/// Shards are written one at a time, in `(c, i, j, k)` order with `k`
/// innermost; parallelism lives inside each shard write.
pub fn create_archive<T: Element>(
    dir: &Path,
    vol: ArrayView4<'_, T>,
    mchunk: [u16; 3],
    chunk_size: [u16; 3],
    res: [u64; 3],
    opts: Option<&ArchiveOptions>,
) -> Result<()> {
    if mchunk.iter().any(|&m| m == 0) {
        return Err(SisfError::Format("macro-chunk size must be nonzero".into()));
    }
    let shape = vol.shape();
    let channel_count = u16::try_from(shape[0])
        .map_err(|_| SisfError::Format(format!("channel count {} exceeds u16", shape[0])))?;
    let size = [shape[1] as u64, shape[2] as u64, shape[3] as u64];

    fs::create_dir_all(dir.join(DATA_DIR))?;
    fs::create_dir_all(dir.join(META_DIR))?;

    let header = ArchiveHeader {
        version: CURRENT_VERSION,
        dtype: T::DTYPE,
        channel_count,
        mchunk,
        res,
        size,
    };
    let mut meta = File::create(dir.join(METADATA_NAME))?;
    header.write_to(&mut meta)?;

    let compression = opts.map_or(CompressionTag::Zstd, |o| o.compression);
    let shard_opts = ShardOptions {
        threads: opts.map_or(0, |o| o.threads),
        crop: None,
    };

    for c in 0..channel_count as u64 {
        for (i, (istart, iend)) in tiles(size[0], mchunk[0] as u64).enumerate() {
            for (j, (jstart, jend)) in tiles(size[1], mchunk[1] as u64).enumerate() {
                for (k, (kstart, kend)) in tiles(size[2], mchunk[2] as u64).enumerate() {
                    // Contiguous copy so boundary shards hold exactly the
                    // remainder extent.
                    let block = vol
                        .slice(s![
                            c as usize,
                            istart as usize..iend as usize,
                            jstart as usize..jend as usize,
                            kstart as usize..kend as usize
                        ])
                        .to_owned();
                    let (i, j, k) = (i as u64, j as u64, k as u64);
                    debug!(
                        "archive {}: shard ({i}, {j}, {k}) channel {c}",
                        dir.display()
                    );
                    create_shard(
                        &shard_data_path(dir, i, j, k, c, RESOLUTION_SCALE),
                        &shard_meta_path(dir, i, j, k, c, RESOLUTION_SCALE),
                        block.view(),
                        chunk_size,
                        compression,
                        Some(&shard_opts),
                    )?;
                }
            }
        }
    }
    Ok(())
}

/// Single-channel convenience wrapper over [`create_archive`].
pub fn create_archive_3d<T: Element>(
    dir: &Path,
    vol: ArrayView3<'_, T>,
    mchunk: [u16; 3],
    chunk_size: [u16; 3],
    res: [u64; 3],
    opts: Option<&ArchiveOptions>,
) -> Result<()> {
    create_archive(dir, vol.insert_axis(Axis(0)), mchunk, chunk_size, res, opts)
}
