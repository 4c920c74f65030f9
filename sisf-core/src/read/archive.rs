//! Archive reader: metadata parse, macro-grid dispatch across shards,
//! block assembly into the output volume.

use crate::container::metadata::{ARCHIVE_HEADER_LEN, ArchiveHeader, METADATA_NAME};
use crate::container::paths::{RESOLUTION_SCALE, shard_data_path, shard_meta_path};
use crate::error::{Result, SisfError};
use crate::read::shard::ShardReader;
use crate::select::resolve_selection;
use crate::tiling::intersecting_tiles;
use crate::volume::{Dtype, Element};
use log::debug;
use lru::LruCache;
use ndarray::{Array4, SliceInfoElem, s};
use std::fs::File;
use std::io::Read;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

const SHARD_CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(n) => n,
    None => unreachable!(),
};

/// A read-only SISF archive rooted at a directory.
///
/// Recently opened shards are kept in an LRU cache keyed by their grid
/// coordinate, so sweeping reads do not re-parse headers.
pub struct Archive {
    root: PathBuf,
    header: ArchiveHeader,
    shards: LruCache<(u64, u64, u64, u64), ShardReader>,
}

impl Archive {
    pub fn open(dir: &Path) -> Result<Self> {
        let mut f = File::open(dir.join(METADATA_NAME))?;
        let mut buf = [0u8; ARCHIVE_HEADER_LEN];
        f.read_exact(&mut buf)?;
        let header = ArchiveHeader::from_bytes(&buf)?;
        debug!(
            "archive {}: {:?} {:?} voxels, {} channels",
            dir.display(),
            header.dtype,
            header.size,
            header.channel_count
        );
        Ok(Self {
            root: dir.to_path_buf(),
            header,
            shards: LruCache::new(SHARD_CACHE_SIZE),
        })
    }

    /// Logical shape, `(channels, x, y, z)`.
    pub fn shape(&self) -> [u64; 4] {
        [
            self.header.channel_count as u64,
            self.header.size[0],
            self.header.size[1],
            self.header.size[2],
        ]
    }

    pub fn version(&self) -> u16 {
        self.header.version
    }

    pub fn dtype(&self) -> Dtype {
        self.header.dtype
    }

    pub fn mchunk(&self) -> [u16; 3] {
        self.header.mchunk
    }

    /// Voxel resolution in nanometers, per axis.
    pub fn res(&self) -> [u64; 3] {
        self.header.res
    }

    /// Open (or fetch from cache) the shard at macro-grid coordinate
    /// `(i, j, k)` for `channel`.
    pub fn get_chunk(
        &mut self,
        i: u64,
        j: u64,
        k: u64,
        channel: u64,
        scale: u64,
    ) -> Result<&mut ShardReader> {
        let root = &self.root;
        self.shards.try_get_or_insert_mut((i, j, k, channel), || {
            ShardReader::open(
                &shard_data_path(root, i, j, k, channel, scale),
                &shard_meta_path(root, i, j, k, channel, scale),
            )
        })
    }

    /// Assemble an arbitrary sub-volume, e.g.
    /// `archive.slice(s![0..1, 1..3, .., 2..3])`.
    pub fn slice<T: Element, S: AsRef<[SliceInfoElem]>>(&mut self, sel: S) -> Result<Array4<T>> {
        if T::DTYPE != self.header.dtype {
            return Err(SisfError::DtypeMismatch {
                requested: T::DTYPE,
                stored: self.header.dtype,
            });
        }
        let shape = self.shape();
        let ranges = resolve_selection(sel.as_ref(), &shape)?;

        let mut out = Array4::<T>::default((
            (ranges[0].end - ranges[0].start) as usize,
            (ranges[1].end - ranges[1].start) as usize,
            (ranges[2].end - ranges[2].start) as usize,
            (ranges[3].end - ranges[3].start) as usize,
        ));
        let m = self.header.mchunk;

        for c in ranges[0].clone() {
            let out_c = (c - ranges[0].start) as usize;
            let mut out_x = 0usize;
            for ((cx, _), (sx0, sx1)) in
                intersecting_tiles(ranges[1].start, ranges[1].end, m[0] as u64)
            {
                let xsize = (sx1 - sx0) as usize;
                let i = cx / m[0] as u64;
                let mut out_y = 0usize;
                for ((cy, _), (sy0, sy1)) in
                    intersecting_tiles(ranges[2].start, ranges[2].end, m[1] as u64)
                {
                    let ysize = (sy1 - sy0) as usize;
                    let j = cy / m[1] as u64;
                    let mut out_z = 0usize;
                    for ((cz, _), (sz0, sz1)) in
                        intersecting_tiles(ranges[3].start, ranges[3].end, m[2] as u64)
                    {
                        let zsize = (sz1 - sz0) as usize;
                        let k = cz / m[2] as u64;

                        let shard = self.get_chunk(i, j, k, c, RESOLUTION_SCALE)?;
                        let block = shard.slice::<T, _>(s![
                            sx0 as usize..sx1 as usize,
                            sy0 as usize..sy1 as usize,
                            sz0 as usize..sz1 as usize
                        ])?;
                        out.slice_mut(s![
                            out_c,
                            out_x..out_x + xsize,
                            out_y..out_y + ysize,
                            out_z..out_z + zsize
                        ])
                        .assign(&block);
                        out_z += zsize;
                    }
                    out_y += ysize;
                }
                out_x += xsize;
            }
        }
        Ok(out)
    }

    /// One voxel at `(channel, x, y, z)`.
    pub fn read_voxel<T: Element>(&mut self, c: u64, x: u64, y: u64, z: u64) -> Result<T> {
        let shape = self.shape();
        for (axis, (&coord, &len)) in [c, x, y, z].iter().zip(&shape).enumerate() {
            if coord >= len {
                return Err(SisfError::IndexOutOfRange {
                    axis,
                    start: coord,
                    stop: coord + 1,
                    len,
                });
            }
        }
        let m = self.header.mchunk;
        let (i, j, k) = (x / m[0] as u64, y / m[1] as u64, z / m[2] as u64);
        let shard = self.get_chunk(i, j, k, c, RESOLUTION_SCALE)?;
        shard.read_voxel(x - i * m[0] as u64, y - j * m[1] as u64, z - k * m[2] as u64)
    }
}

impl std::fmt::Display for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dims: Vec<String> = (0..3)
            .map(|axis| {
                format!(
                    "{}/{}/{}nm",
                    self.header.size[axis], self.header.mchunk[axis], self.header.res[axis]
                )
            })
            .collect();
        write!(
            f,
            "<sisf archive at {} ({})>",
            self.root.display(),
            dims.join(" x ")
        )
    }
}
