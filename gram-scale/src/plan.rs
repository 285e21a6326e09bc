// SPDX-License-Identifier: MIT
//! # Geometry Planning
//!
//! Floating-point geometry for crop planning, and its conversion to the integral
//! pixel bounds the kernels in [`crate::cpu`] operate on.
//!
//! ## Design Philosophy
//!
//! Planning is split in two steps:
//! 1. **Rect**: where the caller wants to cut, in `f64` source coordinates
//! 2. **PixelRect**: the integral window actually copied, clipped to the source
//!
//! Integralization floors the origin and rounds the extent, so a centred square
//! whose offset lands on a half pixel keeps its side length instead of growing
//! by one column.

/// 2D size in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub const fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub const fn square(side: u32) -> Self {
        Self { w: side, h: side }
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    pub fn is_square(&self) -> bool {
        self.w == self.h
    }

    /// Width and height swapped (quarter-turn orientations).
    pub fn transposed(&self) -> Self {
        Self { w: self.h, h: self.w }
    }

    pub fn pixel_count(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    /// Bytes needed for a tightly packed 4-channel image of this size.
    pub fn byte_len(&self) -> usize {
        (self.w as usize) * (self.h as usize) * 4
    }

    /// Same as [`Size::byte_len`] but `None` on overflow.
    pub fn checked_byte_len(&self) -> Option<usize> {
        (self.w as usize)
            .checked_mul(self.h as usize)
            .and_then(|pixels| pixels.checked_mul(4))
    }
}

/// Axis-aligned rectangle in floating-point source coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle covering a whole image of `size`.
    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.w as f64, size.h as f64)
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.w
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.h
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.w.is_finite() && self.h.is_finite()
    }

    /// Overlap of two rectangles, `None` when they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        if !self.is_finite() || !other.is_finite() {
            return None;
        }
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.max_x().min(other.max_x());
        let y1 = self.max_y().min(other.max_y());
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
    }
}

/// Integral pixel window inside a source image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    pub fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }

    /// True when the window is the whole of a `src`-sized image.
    pub fn covers(&self, src: Size) -> bool {
        self.x == 0 && self.y == 0 && self.w == src.w && self.h == src.h
    }
}

/// Largest square centred inside `size`.
///
/// Side is `min(w, h)`; the offset on the longer axis is `|w - h| / 2` and may
/// be fractional.
pub fn center_square(size: Size) -> Rect {
    let w = size.w as f64;
    let h = size.h as f64;
    let side = w.min(h);
    Rect::new((w - side) / 2.0, (h - side) / 2.0, side, side)
}

/// Clip `rect` to a `src`-sized image and convert it to integral bounds.
///
/// Returns `None` when nothing of `rect` lies inside the image.
pub fn crop_bounds(src: Size, rect: Rect) -> Option<PixelRect> {
    if src.is_empty() {
        return None;
    }
    let clipped = rect.intersect(&Rect::from_size(src))?;

    let x = clipped.x.floor().max(0.0) as u32;
    let y = clipped.y.floor().max(0.0) as u32;
    let x = x.min(src.w - 1);
    let y = y.min(src.h - 1);

    let w = (clipped.w.round() as u32).clamp(1, src.w - x);
    let h = (clipped.h.round() as u32).clamp(1, src.h - y);

    Some(PixelRect { x, y, w, h })
}
