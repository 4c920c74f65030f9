use crate::volume::Dtype;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SisfError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown dtype code {0}")]
    UnknownDtype(u16),

    #[error("unknown compression tag {0}")]
    UnknownCodec(u16),

    #[error("video encoder produced no output; is the chunk large enough for a frame?")]
    EncoderEmptyOutput,

    #[error("selection names {got} axes, expected {expected}")]
    InvalidDimensions { expected: usize, got: usize },

    #[error("axis {axis}: stepped selection (step {step}) is not supported")]
    UnsupportedStride { axis: usize, step: isize },

    #[error("axis {axis}: negative indexing is not supported")]
    NegativeIndex { axis: usize },

    #[error("axis {axis}: selection {start}..{stop} out of range 0..{len}")]
    IndexOutOfRange {
        axis: usize,
        start: u64,
        stop: u64,
        len: u64,
    },

    #[error("axis {axis}: selection stop {stop} precedes start {start}")]
    IncorrectRangeOrder { axis: usize, start: u64, stop: u64 },

    #[error("chunk index truncated at entry {chunk}")]
    CorruptIndex { chunk: u64 },

    #[error("unsupported format version {found}, expected {expected}")]
    VersionMismatch { found: u16, expected: u16 },

    #[error("requested {requested:?} elements from a {stored:?} volume")]
    DtypeMismatch { requested: Dtype, stored: Dtype },

    #[error("format error: {0}")]
    Format(String),
}

pub type Result<T> = std::result::Result<T, SisfError>;
