//! H.264 / AV1 micro-chunk compression through an external `ffmpeg` child.
//!
//! A micro-chunk of extent `(sx, sy, sz)` is streamed as `sx` grayscale
//! frames of `sz x sy` pixels. These tags are lossy: `U16` voxels are
//! rescaled to 8 bits against the per-chunk maximum before encoding, and
//! decoded samples are widened back value-preserving.

use super::{ChunkGeometry, Codec, CompressionTag};
use crate::error::{Result, SisfError};
use crate::volume::{Dtype, Element};
use std::io::{Read, Write};
use std::process::{Command, Stdio};

const FFMPEG_EXE: &str = "ffmpeg";
const FPS: &str = "24/1";

#[derive(Copy, Clone, Debug)]
enum Encoder {
    X264,
    Av1Svt,
}

impl Encoder {
    fn lib(self) -> &'static str {
        match self {
            Encoder::X264 => "libx264",
            Encoder::Av1Svt => "libsvtav1",
        }
    }
}

pub struct VideoCodec {
    encoder: Encoder,
    tag: CompressionTag,
}

pub static H264: VideoCodec = VideoCodec {
    encoder: Encoder::X264,
    tag: CompressionTag::H264,
};

pub static AV1_SVT: VideoCodec = VideoCodec {
    encoder: Encoder::Av1Svt,
    tag: CompressionTag::Av1,
};

impl Codec for VideoCodec {
    fn tag(&self) -> CompressionTag {
        self.tag
    }

    fn encode(&self, raw: &[u8], geom: &ChunkGeometry) -> Result<Vec<u8>> {
        let frames = match geom.dtype {
            Dtype::U8 => raw.to_vec(),
            Dtype::U16 => rescale_to_u8(raw)?,
        };

        let [_, sy, sz] = geom.extent;
        let frame_size = format!("{sz}x{sy}");
        let args = [
            // incoming raw grayscale frame stream
            "-f", "rawvideo", "-vcodec", "rawvideo", "-pix_fmt", "gray", "-s", frame_size.as_str(),
            "-r", FPS, "-i", "-",
            // encoded bitstream out
            "-an", "-f", "rawvideo", "-r", FPS, "-pix_fmt", "gray",
            "-vcodec", self.encoder.lib(), "-preset", "slow", "-crf", "17", "pipe:",
        ];
        let blob = run_ffmpeg(&args, frames)?;
        if blob.is_empty() {
            return Err(SisfError::EncoderEmptyOutput);
        }
        Ok(blob)
    }

    fn decode(&self, blob: &[u8], geom: &ChunkGeometry) -> Result<Vec<u8>> {
        let args = [
            "-r", FPS, "-i", "pipe:",
            "-an", "-f", "rawvideo", "-r", FPS, "-pix_fmt", "gray", "-vcodec", "rawvideo",
            "pipe:",
        ];
        let pixels = run_ffmpeg(&args, blob.to_vec())?;
        if pixels.len() != geom.voxels() {
            return Err(SisfError::Format(format!(
                "video decoder returned {} pixels for a chunk of {}",
                pixels.len(),
                geom.voxels()
            )));
        }
        Ok(match geom.dtype {
            Dtype::U8 => pixels,
            Dtype::U16 => {
                let mut wide = Vec::with_capacity(pixels.len() * 2);
                for &p in &pixels {
                    u16::extend_bytes(&mut wide, &[p as u16]);
                }
                wide
            }
        })
    }
}

/// Scale a little-endian `u16` payload into single bytes against the
/// chunk maximum; an all-zero chunk stays all zero.
fn rescale_to_u8(raw: &[u8]) -> Result<Vec<u8>> {
    let values = u16::from_bytes(raw)
        .ok_or_else(|| SisfError::Format("u16 payload has odd byte length".into()))?;
    let max = values.iter().copied().max().unwrap_or(0);
    if max == 0 {
        return Ok(vec![0u8; values.len()]);
    }
    Ok(values
        .iter()
        .map(|&v| (f64::from(v) / f64::from(max) * 256.0) as u8)
        .collect())
}

/// Feed `input` to an ffmpeg child over stdin and collect stdout. Stdin is
/// closed once the stream is written and the child is always waited on.
fn run_ffmpeg(args: &[&str], input: Vec<u8>) -> Result<Vec<u8>> {
    let mut child = Command::new(FFMPEG_EXE)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| SisfError::Format("ffmpeg stdin unavailable".into()))?;
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| SisfError::Format("ffmpeg stdout unavailable".into()))?;

    // The child writes its output while we feed it; drain stdout from this
    // thread and push stdin from a helper to keep both pipes moving.
    let feeder = std::thread::spawn(move || -> std::io::Result<()> {
        stdin.write_all(&input)
        // stdin drops here, signalling end of stream
    });

    let mut out = Vec::new();
    stdout.read_to_end(&mut out)?;

    let fed = feeder
        .join()
        .map_err(|_| SisfError::Format("ffmpeg feeder thread panicked".into()))?;
    child.wait()?;
    // A broken pipe just means ffmpeg stopped reading early; surface any
    // other stdin failure.
    if let Err(e) = fed {
        if e.kind() != std::io::ErrorKind::BrokenPipe {
            return Err(e.into());
        }
    }
    Ok(out)
}
