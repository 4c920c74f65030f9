use super::{ChunkGeometry, Codec, CompressionTag};
use crate::error::Result;

/// Frame-level compression setting; single worker thread.
const LEVEL: i32 = 9;

pub struct ZstdCodec;

impl Codec for ZstdCodec {
    fn tag(&self) -> CompressionTag {
        CompressionTag::Zstd
    }

    fn encode(&self, raw: &[u8], _geom: &ChunkGeometry) -> Result<Vec<u8>> {
        Ok(zstd::stream::encode_all(raw, LEVEL)?)
    }

    fn decode(&self, blob: &[u8], _geom: &ChunkGeometry) -> Result<Vec<u8>> {
        Ok(zstd::stream::decode_all(blob)?)
    }
}
