use crate::error::{Result, SisfError};
use crate::volume::Dtype;

pub mod raw;
pub mod video;
pub mod zstdc;

/// Numeric compression tag recorded in every shard header.
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompressionTag {
    Raw = 0,
    Zstd = 1,
    H264 = 2,
    Av1 = 3,
}

impl CompressionTag {
    pub fn from_code(code: u16) -> Result<Self> {
        match code {
            0 => Ok(CompressionTag::Raw),
            1 => Ok(CompressionTag::Zstd),
            2 => Ok(CompressionTag::H264),
            3 => Ok(CompressionTag::Av1),
            other => Err(SisfError::UnknownCodec(other)),
        }
    }

    pub fn code(self) -> u16 {
        self as u16
    }
}

/// Extent and element type of one micro-chunk, as the codecs need it.
#[derive(Clone, Copy, Debug)]
pub struct ChunkGeometry {
    /// Voxels per axis, `(x, y, z)`.
    pub extent: [usize; 3],
    pub dtype: Dtype,
}

impl ChunkGeometry {
    pub fn voxels(&self) -> usize {
        self.extent[0] * self.extent[1] * self.extent[2]
    }

    pub fn byte_len(&self) -> usize {
        self.voxels() * self.dtype.byte_len()
    }
}

/// One compression scheme. `raw` is always the row-major little-endian
/// voxel payload; `decode` must return exactly `geom.byte_len()` bytes.
pub trait Codec: Send + Sync {
    fn tag(&self) -> CompressionTag;
    fn encode(&self, raw: &[u8], geom: &ChunkGeometry) -> Result<Vec<u8>>;
    fn decode(&self, blob: &[u8], geom: &ChunkGeometry) -> Result<Vec<u8>>;
}

pub fn codec_for(tag: CompressionTag) -> &'static dyn Codec {
    match tag {
        CompressionTag::Raw => &raw::RawCodec,
        CompressionTag::Zstd => &zstdc::ZstdCodec,
        CompressionTag::H264 => &video::H264,
        CompressionTag::Av1 => &video::AV1_SVT,
    }
}
