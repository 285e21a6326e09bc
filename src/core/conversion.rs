//! # Bitmap / Pixel Buffer Conversion
//!
//! Moves pixels between the display world ([`BitmapImage`], RGBA, orientation
//! tag) and the filter world ([`PixelBuffer`], ARGB, rows top-down, no
//! metadata).
//!
//! ## Row Order
//!
//! Both representations store row 0 at the top, so conversion copies rows in
//! order and swaps channels; there is no vertical flip to get wrong. The
//! `marker_survives_round_trip` test pins this with an asymmetric image.
//!
//! ## Failure Reporting
//!
//! `PixelBuffer::from_bitmap` and `BitmapImage::from_pixel_buffer` return the
//! reason a conversion failed. [`to_pixel_buffer`] and [`to_image`] are the
//! optional forms for callers that only need "skip this".

use image::RgbaImage;

use super::pixel_buffer::{allocate_zeroed, BYTES_PER_PIXEL, ROW_ALIGNMENT};
use super::{BitmapImage, PixelBuffer};
use crate::error::{GramError, GramResult};

impl PixelBuffer {
    /// Draw the upright `image` into a freshly allocated ARGB buffer.
    pub fn from_bitmap(image: &BitmapImage) -> GramResult<PixelBuffer> {
        let upright = image.upright();
        let src = upright.as_rgba();
        let (width, height) = src.dimensions();

        let (mut data, bytes_per_row) = allocate_zeroed(width, height, ROW_ALIGNMENT)?;
        let src_row_bytes = width as usize * BYTES_PER_PIXEL;
        for (y, src_row) in src.as_raw().chunks_exact(src_row_bytes).enumerate() {
            let dst_row = &mut data[y * bytes_per_row..][..src_row_bytes];
            for (dst, rgba) in dst_row
                .chunks_exact_mut(BYTES_PER_PIXEL)
                .zip(src_row.chunks_exact(BYTES_PER_PIXEL))
            {
                dst.copy_from_slice(&[rgba[3], rgba[0], rgba[1], rgba[2]]);
            }
        }

        PixelBuffer::from_argb(width, height, bytes_per_row, data)
    }
}

impl BitmapImage {
    /// Build an upright displayable image from ARGB pixels.
    pub fn from_pixel_buffer(buffer: &PixelBuffer) -> GramResult<BitmapImage> {
        let size = buffer.size();
        let len = size
            .checked_byte_len()
            .ok_or_else(|| GramError::buffer_allocation(size.w, size.h, "size overflows usize"))?;
        let mut rgba = Vec::new();
        rgba.try_reserve_exact(len)
            .map_err(|e| GramError::buffer_allocation(size.w, size.h, e.to_string()))?;

        for y in 0..buffer.height() {
            for argb in buffer.row(y).chunks_exact(BYTES_PER_PIXEL) {
                rgba.extend_from_slice(&[argb[1], argb[2], argb[3], argb[0]]);
            }
        }

        let pixels = RgbaImage::from_raw(size.w, size.h, rgba)
            .ok_or_else(|| GramError::decode("converted pixel data has wrong length"))?;
        Ok(BitmapImage::new(pixels))
    }
}

/// Convert a bitmap to a pixel buffer, `None` when allocation fails.
pub fn to_pixel_buffer(image: &BitmapImage) -> Option<PixelBuffer> {
    PixelBuffer::from_bitmap(image)
        .inspect_err(|e| log::warn!("bitmap -> pixel buffer failed: {}", e))
        .ok()
}

/// Convert a pixel buffer to a displayable bitmap, `None` when it cannot be decoded.
pub fn to_image(buffer: &PixelBuffer) -> Option<BitmapImage> {
    BitmapImage::from_pixel_buffer(buffer)
        .inspect_err(|e| log::warn!("pixel buffer -> bitmap failed: {}", e))
        .ok()
}
