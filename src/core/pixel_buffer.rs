//! # Pixel Buffer
//!
//! The exchange format between the image layer and the filter layer: a packed
//! ARGB grid, 8 bits per channel, rows stored top-down, with an explicit
//! bytes-per-row that may include trailing padding.
//!
//! ## Value Semantics
//!
//! Pixel storage sits behind an `Arc<Vec<u8>>` and is never written after
//! construction. Cloning a buffer is a reference-count bump, and handing one
//! buffer to every filter of a sweep is safe without copies: nothing can
//! mutate it underneath them.

use std::sync::Arc;

use gram_scale::plan::Size;

use crate::error::{GramError, GramResult};

/// Bytes per pixel (A, R, G, B).
pub const BYTES_PER_PIXEL: usize = 4;

/// Row alignment used for freshly allocated buffers.
pub const ROW_ALIGNMENT: usize = 64;

/// Immutable packed-ARGB pixel grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Arc<Vec<u8>>,
    width: u32,
    height: u32,
    bytes_per_row: usize,
}

impl PixelBuffer {
    /// Wrap existing ARGB bytes.
    ///
    /// `data` must hold `bytes_per_row * height` bytes and `bytes_per_row` must
    /// be at least `width * 4`.
    pub fn from_argb(width: u32, height: u32, bytes_per_row: usize, data: Vec<u8>) -> GramResult<Self> {
        if width == 0 || height == 0 {
            return Err(GramError::buffer_allocation(width, height, "zero-sized buffer"));
        }
        let row_bytes = width as usize * BYTES_PER_PIXEL;
        if bytes_per_row < row_bytes {
            return Err(GramError::decode(format!(
                "bytes_per_row {} narrower than {} px row",
                bytes_per_row, width
            )));
        }
        let expected = bytes_per_row
            .checked_mul(height as usize)
            .ok_or_else(|| GramError::buffer_allocation(width, height, "size overflows usize"))?;
        if data.len() < expected {
            return Err(GramError::decode(format!(
                "pixel data is {} bytes, {}x{} needs {}",
                data.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self {
            data: Arc::new(data),
            width,
            height,
            bytes_per_row,
        })
    }

    /// Build a tightly packed buffer from a per-pixel `[a, r, g, b]` function.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> GramResult<Self> {
        let (mut data, bytes_per_row) = allocate_zeroed(width, height, BYTES_PER_PIXEL)?;
        for y in 0..height {
            let row = &mut data[y as usize * bytes_per_row..][..width as usize * BYTES_PER_PIXEL];
            for (x, px) in row.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
                px.copy_from_slice(&f(x as u32, y));
            }
        }
        Self::from_argb(width, height, bytes_per_row, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    /// Whether rows carry no padding.
    pub fn is_tightly_packed(&self) -> bool {
        self.bytes_per_row == self.width as usize * BYTES_PER_PIXEL
    }

    /// Raw storage including row padding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Visible pixels of row `y` (padding excluded).
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.bytes_per_row;
        &self.data[start..start + self.width as usize * BYTES_PER_PIXEL]
    }

    /// `[a, r, g, b]` at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = x as usize * BYTES_PER_PIXEL;
        let row = self.row(y);
        [row[i], row[i + 1], row[i + 2], row[i + 3]]
    }

    /// Visible pixels as one tightly packed ARGB vector.
    pub fn to_packed_argb(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size().byte_len());
        for y in 0..self.height {
            out.extend_from_slice(self.row(y));
        }
        out
    }

    /// True when both buffers share the same storage (no copy was made).
    pub fn shares_storage_with(&self, other: &PixelBuffer) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

/// Allocate a zeroed pixel block with rows padded to `alignment` bytes.
///
/// Returns the storage and the chosen bytes-per-row. Fails instead of aborting
/// when the allocator refuses the request.
pub(crate) fn allocate_zeroed(width: u32, height: u32, alignment: usize) -> GramResult<(Vec<u8>, usize)> {
    if width == 0 || height == 0 {
        return Err(GramError::buffer_allocation(width, height, "zero-sized buffer"));
    }
    let row_bytes = (width as usize)
        .checked_mul(BYTES_PER_PIXEL)
        .ok_or_else(|| GramError::buffer_allocation(width, height, "row size overflows usize"))?;
    let bytes_per_row = row_bytes
        .checked_next_multiple_of(alignment.max(1))
        .ok_or_else(|| GramError::buffer_allocation(width, height, "row size overflows usize"))?;
    let len = bytes_per_row
        .checked_mul(height as usize)
        .ok_or_else(|| GramError::buffer_allocation(width, height, "size overflows usize"))?;

    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|e| GramError::buffer_allocation(width, height, e.to_string()))?;
    data.resize(len, 0);
    Ok((data, bytes_per_row))
}
