//! Element types stored by the format and their on-disk byte conversion.
//!
//! Axis order is `(channel, x, y, z)` throughout; voxel payloads are
//! row-major with `z` fastest, little-endian.

use crate::error::{Result, SisfError};
use ndarray::{Array3, ArrayView3};

/// On-disk element type codes.
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Dtype {
    U16 = 1,
    U8 = 2,
}

impl Dtype {
    pub fn from_code(code: u16) -> Result<Self> {
        match code {
            1 => Ok(Dtype::U16),
            2 => Ok(Dtype::U8),
            other => Err(SisfError::UnknownDtype(other)),
        }
    }

    pub fn code(self) -> u16 {
        self as u16
    }

    /// Bytes per voxel.
    pub fn byte_len(self) -> usize {
        match self {
            Dtype::U16 => 2,
            Dtype::U8 => 1,
        }
    }
}

/// A scalar voxel type the format can store.
///
/// Implemented for `u8` and `u16` only; the header dtype is checked against
/// `Self::DTYPE` wherever a typed array crosses the API boundary.
pub trait Element: Copy + Default + Send + Sync + 'static {
    const DTYPE: Dtype;

    /// Append `src` to `dst` in little-endian order.
    fn extend_bytes(dst: &mut Vec<u8>, src: &[Self]);

    /// Reinterpret a little-endian byte run; `None` when the length is not
    /// a whole number of elements.
    fn from_bytes(raw: &[u8]) -> Option<Vec<Self>>;
}

impl Element for u8 {
    const DTYPE: Dtype = Dtype::U8;

    fn extend_bytes(dst: &mut Vec<u8>, src: &[Self]) {
        dst.extend_from_slice(src);
    }

    fn from_bytes(raw: &[u8]) -> Option<Vec<Self>> {
        Some(raw.to_vec())
    }
}

impl Element for u16 {
    const DTYPE: Dtype = Dtype::U16;

    fn extend_bytes(dst: &mut Vec<u8>, src: &[Self]) {
        for &v in src {
            dst.extend_from_slice(&v.to_le_bytes());
        }
    }

    fn from_bytes(raw: &[u8]) -> Option<Vec<Self>> {
        if raw.len() % 2 != 0 {
            return None;
        }
        Some(
            raw.chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect(),
        )
    }
}

/// Serialize a 3-D view to its row-major little-endian payload.
pub fn view_to_bytes<T: Element>(view: ArrayView3<'_, T>) -> Vec<u8> {
    let mut out = Vec::with_capacity(view.len() * T::DTYPE.byte_len());
    if let Some(contiguous) = view.as_slice() {
        T::extend_bytes(&mut out, contiguous);
    } else {
        for &v in view.iter() {
            T::extend_bytes(&mut out, &[v]);
        }
    }
    out
}

/// Rebuild a 3-D array of the given extent from a row-major payload.
pub fn array_from_bytes<T: Element>(raw: &[u8], extent: [usize; 3]) -> Result<Array3<T>> {
    let values = T::from_bytes(raw).ok_or_else(|| {
        SisfError::Format(format!(
            "payload of {} bytes is not a whole number of {:?} elements",
            raw.len(),
            T::DTYPE
        ))
    })?;
    Array3::from_shape_vec((extent[0], extent[1], extent[2]), values).map_err(|_| {
        SisfError::Format(format!(
            "decoded payload does not fill a {}x{}x{} chunk",
            extent[0], extent[1], extent[2]
        ))
    })
}
