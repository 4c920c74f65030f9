//! Random access over a single shard: two-level chunk lookup, partial
//! decompression, block assembly for arbitrary sub-ranges.

use crate::codec::{ChunkGeometry, codec_for};
use crate::container::index::{INDEX_ENTRY_LEN, IndexEntry};
use crate::container::metadata::CURRENT_VERSION;
use crate::container::shard::{SHARD_HEADER_LEN, ShardHeader};
use crate::error::{Result, SisfError};
use crate::select::resolve_selection;
use crate::tiling::intersecting_tiles;
use crate::volume::{Element, array_from_bytes};
use ndarray::{Array3, SliceInfoElem, s};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// One open `(data, meta)` shard pair.
///
/// The header is parsed eagerly and immutable afterwards; read methods
/// take `&mut self` because the two file handles seek. Reads are addressed
/// in the shard's cropped coordinate system.
pub struct ShardReader {
    data: File,
    meta: File,
    header: ShardHeader,
    counts: [u64; 3],
}

impl ShardReader {
    pub fn open(data_path: &Path, meta_path: &Path) -> Result<Self> {
        let mut meta = File::open(meta_path)?;
        let mut buf = [0u8; SHARD_HEADER_LEN];
        meta.read_exact(&mut buf)?;
        let header = ShardHeader::from_bytes(&buf)?;
        if header.version != CURRENT_VERSION {
            return Err(SisfError::VersionMismatch {
                found: header.version,
                expected: CURRENT_VERSION,
            });
        }
        let counts = header.chunk_counts();
        Ok(Self {
            data: File::open(data_path)?,
            meta,
            header,
            counts,
        })
    }

    pub fn header(&self) -> &ShardHeader {
        &self.header
    }

    /// Readable extent per axis (the crop window size).
    pub fn shape(&self) -> [u64; 3] {
        self.header.crop_size()
    }

    /// Chunk id owning the raw-coordinate voxel `(x, y, z)`.
    pub fn index_of(&self, x: u64, y: u64, z: u64) -> u64 {
        let m = self.header.chunk_size;
        let [_, ny, nz] = self.counts;
        (x / m[0] as u64) * ny * nz + (y / m[1] as u64) * nz + z / m[2] as u64
    }

    /// Grid coordinate of a chunk id; inverse of [`Self::index_of`].
    pub fn coords_of(&self, idx: u64) -> [u64; 3] {
        let [_, ny, nz] = self.counts;
        let dx = idx / (ny * nz);
        let dy = (idx - dx * ny * nz) / nz;
        let dz = idx - dx * ny * nz - dy * nz;
        [dx, dy, dz]
    }

    /// True extent of the chunk at a grid coordinate; boundary chunks are
    /// shorter.
    pub fn chunk_extent(&self, coords: [u64; 3]) -> [u64; 3] {
        let m = self.header.chunk_size;
        let mut extent = [0u64; 3];
        for axis in 0..3 {
            let step = m[axis] as u64;
            extent[axis] =
                ((coords[axis] + 1) * step).min(self.header.size[axis]) - coords[axis] * step;
        }
        extent
    }

    /// Read the index entry for one chunk from the meta file.
    pub fn locate(&mut self, idx: u64) -> Result<IndexEntry> {
        self.meta.seek(SeekFrom::Start(
            SHARD_HEADER_LEN as u64 + idx * INDEX_ENTRY_LEN as u64,
        ))?;
        let mut buf = [0u8; INDEX_ENTRY_LEN];
        self.meta.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                SisfError::CorruptIndex { chunk: idx }
            } else {
                SisfError::Io(e)
            }
        })?;
        Ok(IndexEntry::from_bytes(buf))
    }

    /// The still-encoded bytes of one chunk.
    pub fn fetch_raw(&mut self, idx: u64) -> Result<Vec<u8>> {
        let entry = self.locate(idx)?;
        self.data.seek(SeekFrom::Start(entry.offset))?;
        let mut blob = vec![0u8; entry.length as usize];
        self.data.read_exact(&mut blob)?;
        Ok(blob)
    }

    /// Decode one chunk to its voxel grid.
    pub fn fetch_chunk<T: Element>(&mut self, idx: u64) -> Result<Array3<T>> {
        self.check_dtype::<T>()?;
        let extent = self.chunk_extent(self.coords_of(idx));
        let extent = [extent[0] as usize, extent[1] as usize, extent[2] as usize];
        let geom = ChunkGeometry {
            extent,
            dtype: self.header.dtype,
        };
        let blob = self.fetch_raw(idx)?;
        let raw = codec_for(self.header.compression).decode(&blob, &geom)?;
        array_from_bytes(&raw, extent)
    }

    /// One voxel, in cropped coordinates.
    pub fn read_voxel<T: Element>(&mut self, x: u64, y: u64, z: u64) -> Result<T> {
        let shape = self.shape();
        for (axis, (&coord, &len)) in [x, y, z].iter().zip(&shape).enumerate() {
            if coord >= len {
                return Err(SisfError::IndexOutOfRange {
                    axis,
                    start: coord,
                    stop: coord + 1,
                    len,
                });
            }
        }
        let crop = self.header.crop;
        let (x, y, z) = (x + crop[0], y + crop[2], z + crop[4]);
        let m = self.header.chunk_size;
        let chunk = self.fetch_chunk::<T>(self.index_of(x, y, z))?;
        Ok(chunk[[
            (x % m[0] as u64) as usize,
            (y % m[1] as u64) as usize,
            (z % m[2] as u64) as usize,
        ]])
    }

    /// Assemble an arbitrary sub-range, e.g. `shard.slice(s![0..4, .., 2..3])`.
    pub fn slice<T: Element, S: AsRef<[SliceInfoElem]>>(&mut self, sel: S) -> Result<Array3<T>> {
        self.check_dtype::<T>()?;
        let shape = self.shape();
        let ranges = resolve_selection(sel.as_ref(), &shape)?;

        let mut out = Array3::<T>::default((
            (ranges[0].end - ranges[0].start) as usize,
            (ranges[1].end - ranges[1].start) as usize,
            (ranges[2].end - ranges[2].start) as usize,
        ));

        // Shift the request into raw shard coordinates.
        let crop = self.header.crop;
        let (x0, x1) = (ranges[0].start + crop[0], ranges[0].end + crop[0]);
        let (y0, y1) = (ranges[1].start + crop[2], ranges[1].end + crop[2]);
        let (z0, z1) = (ranges[2].start + crop[4], ranges[2].end + crop[4]);
        let m = self.header.chunk_size;

        let mut out_x = 0usize;
        for ((cx, _), (sx0, sx1)) in intersecting_tiles(x0, x1, m[0] as u64) {
            let xsize = (sx1 - sx0) as usize;
            let mut out_y = 0usize;
            for ((cy, _), (sy0, sy1)) in intersecting_tiles(y0, y1, m[1] as u64) {
                let ysize = (sy1 - sy0) as usize;
                let mut out_z = 0usize;
                for ((cz, _), (sz0, sz1)) in intersecting_tiles(z0, z1, m[2] as u64) {
                    let zsize = (sz1 - sz0) as usize;
                    let chunk = self.fetch_chunk::<T>(self.index_of(cx, cy, cz))?;
                    out.slice_mut(s![
                        out_x..out_x + xsize,
                        out_y..out_y + ysize,
                        out_z..out_z + zsize
                    ])
                    .assign(&chunk.slice(s![
                        sx0 as usize..sx1 as usize,
                        sy0 as usize..sy1 as usize,
                        sz0 as usize..sz1 as usize
                    ]));
                    out_z += zsize;
                }
                out_y += ysize;
            }
            out_x += xsize;
        }
        Ok(out)
    }

    fn check_dtype<T: Element>(&self) -> Result<()> {
        if T::DTYPE != self.header.dtype {
            return Err(SisfError::DtypeMismatch {
                requested: T::DTYPE,
                stored: self.header.dtype,
            });
        }
        Ok(())
    }
}
