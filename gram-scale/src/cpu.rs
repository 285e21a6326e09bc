// SPDX-License-Identifier: MIT
// CPU kernels for packed 4-channel 8-bit pixels.
// Resize goes through fast_image_resize (SIMD); crop is an exact row copy.

use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::U8x4;
use fir::{ResizeAlg, ResizeOptions, Resizer};

use crate::plan::{PixelRect, Size};

#[derive(Debug)]
pub enum ScaleError {
    BufferTooSmall,
    StrideTooNarrow,
    StrideMismatchAndNoStaging,
    EmptyImage,
    Fir(fir::ResizeError),
    ImageBuf(fir::ImageBufferError),
}

impl From<fir::ResizeError> for ScaleError { fn from(e: fir::ResizeError) -> Self { Self::Fir(e) } }
impl From<fir::ImageBufferError> for ScaleError { fn from(e: fir::ImageBufferError) -> Self { Self::ImageBuf(e) } }

impl std::fmt::Display for ScaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleError::BufferTooSmall => write!(f, "Pixel buffer too small for its dimensions"),
            ScaleError::StrideTooNarrow => write!(f, "Row stride narrower than width * 4"),
            ScaleError::StrideMismatchAndNoStaging => write!(f, "Stride mismatch but no staging buffer provided"),
            ScaleError::EmptyImage => write!(f, "Image has zero width or height"),
            ScaleError::Fir(e) => write!(f, "Fast image resize error: {}", e),
            ScaleError::ImageBuf(e) => write!(f, "Image buffer error: {}", e),
        }
    }
}

impl std::error::Error for ScaleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScaleError::Fir(e) => Some(e),
            ScaleError::ImageBuf(e) => Some(e),
            _ => None,
        }
    }
}

/// Resampling kernel used when stretching an image to the target size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResizeFilter {
    Nearest,
    Bilinear,
    CatmullRom,
    #[default]
    Lanczos3,
}

impl ResizeFilter {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "nearest" => Some(Self::Nearest),
            "bilinear" | "triangle" => Some(Self::Bilinear),
            "catmullrom" | "catmull-rom" => Some(Self::CatmullRom),
            "lanczos3" | "lanczos" => Some(Self::Lanczos3),
            _ => None,
        }
    }

    fn to_alg(self) -> ResizeAlg {
        match self {
            ResizeFilter::Nearest => ResizeAlg::Nearest,
            ResizeFilter::Bilinear => ResizeAlg::Convolution(fir::FilterType::Bilinear),
            ResizeFilter::CatmullRom => ResizeAlg::Convolution(fir::FilterType::CatmullRom),
            ResizeFilter::Lanczos3 => ResizeAlg::Convolution(fir::FilterType::Lanczos3),
        }
    }
}

/// Pre-allocated scratch to compact strided input to tightly packed rows (only if needed).
pub struct Staging {
    pub(crate) buf: Vec<u8>,
}
impl Staging {
    pub fn with_capacity(cap: usize) -> Self { Self { buf: Vec::with_capacity(cap) } }
    pub fn ensure_len(&mut self, len: usize) { if self.buf.len() < len { self.buf.resize(len, 0); } }
    pub fn as_slice(&self) -> &[u8] { &self.buf }
}

/// Stretch `src` to exactly `dst_size` (aspect ratio is not preserved).
///
/// `src_stride_bytes`: bytes per source row; when it differs from `w * 4` the
/// rows are compacted into `staging` first. `dst` receives tightly packed rows
/// and must hold at least `dst_size.byte_len()` bytes.
#[allow(clippy::too_many_arguments)]
pub fn resize_rgba_cpu(
    resizer: &mut Resizer,
    src: &[u8],
    src_size: Size,
    src_stride_bytes: Option<usize>,
    dst_size: Size,
    filter: ResizeFilter,
    dst: &mut [u8],
    staging: Option<&mut Staging>,
) -> Result<(), ScaleError> {
    if src_size.is_empty() || dst_size.is_empty() {
        return Err(ScaleError::EmptyImage);
    }
    let dst_len = dst_size.byte_len();
    if dst.len() < dst_len {
        return Err(ScaleError::BufferTooSmall);
    }

    let tight_row_bytes = (src_size.w as usize) * 4;
    let pitch = src_stride_bytes.unwrap_or(tight_row_bytes);
    check_layout(src, src_size, pitch)?;

    // Same size: a plain copy is exact, resampling is not guaranteed to be.
    if src_size == dst_size {
        copy_rows(src, pitch, &mut dst[..dst_len], tight_row_bytes, tight_row_bytes, src_size.h as usize);
        return Ok(());
    }

    let src_view = if pitch == tight_row_bytes {
        TypedImageRef::<U8x4>::from_buffer(src_size.w, src_size.h, &src[..tight_row_bytes * src_size.h as usize])?
    } else {
        let st = staging.ok_or(ScaleError::StrideMismatchAndNoStaging)?;
        st.ensure_len(tight_row_bytes * (src_size.h as usize));
        copy_rows(src, pitch, st.buf.as_mut_slice(), tight_row_bytes, tight_row_bytes, src_size.h as usize);
        TypedImageRef::<U8x4>::from_buffer(src_size.w, src_size.h, &st.buf[..tight_row_bytes * src_size.h as usize])?
    };

    let mut dst_image = TypedImage::<U8x4>::from_buffer(dst_size.w, dst_size.h, &mut dst[..dst_len])?;
    let opts = ResizeOptions::new().resize_alg(filter.to_alg()).use_alpha(false);
    resizer.resize_typed::<U8x4>(&src_view, &mut dst_image, &opts)?;

    Ok(())
}

/// Copy the `window` of `src` into tightly packed `dst`.
pub fn crop_rgba_cpu(
    src: &[u8],
    src_size: Size,
    src_stride_bytes: Option<usize>,
    window: PixelRect,
    dst: &mut [u8],
) -> Result<(), ScaleError> {
    if window.w == 0 || window.h == 0 {
        return Err(ScaleError::EmptyImage);
    }
    if window.x + window.w > src_size.w || window.y + window.h > src_size.h {
        return Err(ScaleError::BufferTooSmall);
    }
    let pitch = src_stride_bytes.unwrap_or(src_size.w as usize * 4);
    check_layout(src, src_size, pitch)?;

    let row_bytes = window.w as usize * 4;
    if dst.len() < row_bytes * window.h as usize {
        return Err(ScaleError::BufferTooSmall);
    }
    let start = window.y as usize * pitch + window.x as usize * 4;
    copy_rows(&src[start..], pitch, dst, row_bytes, row_bytes, window.h as usize);
    Ok(())
}

/// Copy `rows` rows of `row_bytes` between buffers with independent strides.
#[inline]
pub fn copy_rows(src: &[u8], src_pitch: usize, dst: &mut [u8], dst_pitch: usize, row_bytes: usize, rows: usize) {
    for r in 0..rows {
        let s = &src[r * src_pitch..r * src_pitch + row_bytes];
        let d = &mut dst[r * dst_pitch..r * dst_pitch + row_bytes];
        d.copy_from_slice(s);
    }
}

fn check_layout(src: &[u8], size: Size, pitch: usize) -> Result<(), ScaleError> {
    let row_bytes = size.w as usize * 4;
    if pitch < row_bytes {
        return Err(ScaleError::StrideTooNarrow);
    }
    // Last row only needs its own pixels, not the trailing padding.
    let needed = pitch * (size.h as usize - 1) + row_bytes;
    if src.len() < needed {
        return Err(ScaleError::BufferTooSmall);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(size: Size) -> Vec<u8> {
        let mut data = vec![0u8; size.byte_len()];
        for y in 0..size.h {
            for x in 0..size.w {
                let i = ((y * size.w + x) * 4) as usize;
                data[i..i + 4].copy_from_slice(&[255, x as u8, y as u8, 7]);
            }
        }
        data
    }

    #[test]
    fn test_resize_to_exact_target() {
        let src_size = Size::new(64, 32);
        let src = vec![200u8; src_size.byte_len()];
        let dst_size = Size::new(20, 50);
        let mut dst = vec![0u8; dst_size.byte_len()];
        let mut resizer = Resizer::new();
        resize_rgba_cpu(&mut resizer, &src, src_size, None, dst_size, ResizeFilter::Bilinear, &mut dst, None).unwrap();
        // Uniform input stays uniform (up to fixed-point rounding).
        assert!(dst.iter().all(|&b| (199..=201).contains(&b)));
    }

    #[test]
    fn test_resize_same_size_is_exact_copy() {
        let size = Size::new(9, 7);
        let src = gradient(size);
        let mut dst = vec![0u8; size.byte_len()];
        let mut resizer = Resizer::new();
        resize_rgba_cpu(&mut resizer, &src, size, None, size, ResizeFilter::Lanczos3, &mut dst, None).unwrap();
        assert_eq!(src, dst);
    }

    #[test]
    fn test_resize_strided_needs_staging() {
        let size = Size::new(4, 4);
        let pitch = 4 * 4 + 8;
        let src = vec![1u8; pitch * 4];
        let dst_size = Size::new(2, 2);
        let mut dst = vec![0u8; dst_size.byte_len()];
        let mut resizer = Resizer::new();
        let err = resize_rgba_cpu(&mut resizer, &src, size, Some(pitch), dst_size, ResizeFilter::Nearest, &mut dst, None);
        assert!(matches!(err, Err(ScaleError::StrideMismatchAndNoStaging)));

        let mut staging = Staging::with_capacity(size.byte_len());
        resize_rgba_cpu(&mut resizer, &src, size, Some(pitch), dst_size, ResizeFilter::Nearest, &mut dst, Some(&mut staging)).unwrap();
        assert!(dst.iter().all(|&b| b == 1));
    }

    #[test]
    fn test_crop_copies_window() {
        let size = Size::new(6, 5);
        let src = gradient(size);
        let window = PixelRect { x: 2, y: 1, w: 3, h: 2 };
        let mut dst = vec![0u8; window.size().byte_len()];
        crop_rgba_cpu(&src, size, None, window, &mut dst).unwrap();
        assert_eq!(&dst[0..4], &[255, 2, 1, 7]);
        assert_eq!(&dst[dst.len() - 4..], &[255, 4, 2, 7]);
    }

    #[test]
    fn test_crop_rejects_out_of_bounds_window() {
        let size = Size::new(4, 4);
        let src = gradient(size);
        let mut dst = vec![0u8; 64];
        let window = PixelRect { x: 3, y: 0, w: 2, h: 2 };
        assert!(matches!(crop_rgba_cpu(&src, size, None, window, &mut dst), Err(ScaleError::BufferTooSmall)));
    }

    #[test]
    fn test_short_buffer_rejected() {
        let size = Size::new(4, 4);
        let src = vec![0u8; 10];
        let mut dst = vec![0u8; 16];
        let mut resizer = Resizer::new();
        let err = resize_rgba_cpu(&mut resizer, &src, size, None, Size::new(2, 2), ResizeFilter::Nearest, &mut dst, None);
        assert!(matches!(err, Err(ScaleError::BufferTooSmall)));
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!(ResizeFilter::parse("Lanczos3"), Some(ResizeFilter::Lanczos3));
        assert_eq!(ResizeFilter::parse("triangle"), Some(ResizeFilter::Bilinear));
        assert_eq!(ResizeFilter::parse("box"), None);
    }
}
