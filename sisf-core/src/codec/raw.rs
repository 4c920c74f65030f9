use super::{ChunkGeometry, Codec, CompressionTag};
use crate::error::Result;

pub struct RawCodec;

impl Codec for RawCodec {
    fn tag(&self) -> CompressionTag {
        CompressionTag::Raw
    }

    fn encode(&self, raw: &[u8], _geom: &ChunkGeometry) -> Result<Vec<u8>> {
        Ok(raw.to_vec())
    }

    fn decode(&self, blob: &[u8], _geom: &ChunkGeometry) -> Result<Vec<u8>> {
        Ok(blob.to_vec())
    }
}
