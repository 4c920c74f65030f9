//! Selection validation shared by the shard and archive readers.

use crate::error::{Result, SisfError};
use ndarray::SliceInfoElem;
use std::ops::Range;

/// Resolve an `s![]`-style selection against the axis lengths in `dims`.
///
/// Integer selectors mean `i..i+1`; open slice ends default to the full
/// axis. Only unit steps and non-negative bounds are accepted, and the
/// resulting half-open ranges must satisfy `start <= stop <= len`.
pub fn resolve_selection(sel: &[SliceInfoElem], dims: &[u64]) -> Result<Vec<Range<u64>>> {
    if sel.len() != dims.len() {
        return Err(SisfError::InvalidDimensions {
            expected: dims.len(),
            got: sel.len(),
        });
    }

    let mut ranges = Vec::with_capacity(dims.len());
    for (axis, (elem, &len)) in sel.iter().zip(dims).enumerate() {
        let (start, stop) = match *elem {
            SliceInfoElem::Index(i) => {
                if i < 0 {
                    return Err(SisfError::NegativeIndex { axis });
                }
                (i as u64, i as u64 + 1)
            }
            SliceInfoElem::Slice { start, end, step } => {
                if step != 1 {
                    return Err(SisfError::UnsupportedStride { axis, step });
                }
                if start < 0 || end.is_some_and(|e| e < 0) {
                    return Err(SisfError::NegativeIndex { axis });
                }
                (start as u64, end.map_or(len, |e| e as u64))
            }
            SliceInfoElem::NewAxis => {
                return Err(SisfError::Format(
                    "NewAxis selectors are not supported".into(),
                ));
            }
        };

        if stop < start {
            return Err(SisfError::IncorrectRangeOrder { axis, start, stop });
        }
        if stop > len {
            return Err(SisfError::IndexOutOfRange {
                axis,
                start,
                stop,
                len,
            });
        }
        ranges.push(start..stop);
    }
    Ok(ranges)
}
