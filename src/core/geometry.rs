//! # Image Geometry Ops
//!
//! Resize, crop and smart crop on [`BitmapImage`], backed by the CPU kernels in
//! `gram-scale`. All three return new images; the input is never touched.
//!
//! - `resize` bakes orientation in and stretches to the exact target size
//! - `crop` cuts in stored-pixel coordinates and keeps the orientation tag
//! - `smart_crop` is `crop` with the largest centred square

use fast_image_resize::Resizer;
use gram_scale::cpu::{crop_rgba_cpu, resize_rgba_cpu, ResizeFilter};
use gram_scale::plan::{center_square, crop_bounds, Rect, Size};
use image::RgbaImage;

use super::BitmapImage;
use crate::error::{GramError, GramResult};

impl BitmapImage {
    /// Stretch to exactly `width` x `height` (non-uniform scaling allowed).
    ///
    /// The result is upright: orientation is applied before resampling, so the
    /// target size refers to displayed width and height.
    pub fn resize(&self, width: u32, height: u32, filter: ResizeFilter) -> GramResult<BitmapImage> {
        let upright = self.upright();
        let src = upright.as_rgba();
        let src_size = upright.pixel_size();
        let dst_size = Size::new(width, height);
        if dst_size.is_empty() {
            return Err(GramError::config(
                "resize target",
                format!("{}x{}", width, height),
                "dimensions must be positive",
            ));
        }
        if src_size == dst_size {
            return Ok(upright);
        }

        let len = dst_size
            .checked_byte_len()
            .ok_or_else(|| GramError::buffer_allocation(width, height, "size overflows usize"))?;
        let mut dst = Vec::new();
        dst.try_reserve_exact(len)
            .map_err(|e| GramError::buffer_allocation(width, height, e.to_string()))?;
        dst.resize(len, 0);

        let mut resizer = Resizer::new();
        resize_rgba_cpu(&mut resizer, src.as_raw(), src_size, None, dst_size, filter, &mut dst, None)
            .map_err(|e| GramError::geometry("resize", e))?;

        log::debug!(
            "resized {}x{} -> {}x{} ({:?})",
            src_size.w,
            src_size.h,
            width,
            height,
            filter
        );
        Ok(BitmapImage::new(into_rgba(dst_size, dst)?))
    }

    /// Cut `rect` (stored-pixel coordinates) out of the image.
    ///
    /// The rect is clipped to the image. When nothing of it lies inside the
    /// image there is no pixel data to crop and the original image is returned.
    pub fn crop(&self, rect: Rect) -> BitmapImage {
        let src_size = self.pixel_size();
        let Some(window) = crop_bounds(src_size, rect) else {
            log::debug!("crop {:?} outside {}x{}, keeping original", rect, src_size.w, src_size.h);
            return self.clone();
        };
        if window.covers(src_size) {
            return self.clone();
        }

        let mut dst = vec![0u8; window.size().byte_len()];
        let cropped = crop_rgba_cpu(self.as_rgba().as_raw(), src_size, None, window, &mut dst)
            .map_err(|e| GramError::geometry("crop", e))
            .and_then(|()| into_rgba(window.size(), dst));
        match cropped {
            Ok(pixels) => BitmapImage::new(pixels).with_orientation(self.orientation()),
            Err(err) => {
                log::warn!("crop failed, keeping original: {}", err);
                self.clone()
            }
        }
    }

    /// Crop to the largest square centred in the image.
    ///
    /// Side is `min(w, h)`, offset `|w - h| / 2` along the longer axis. Already
    /// square images come back unchanged, so the operation is idempotent.
    pub fn smart_crop(&self) -> BitmapImage {
        self.crop(center_square(self.pixel_size()))
    }
}

fn into_rgba(size: Size, data: Vec<u8>) -> GramResult<RgbaImage> {
    RgbaImage::from_raw(size.w, size.h, data)
        .ok_or_else(|| GramError::decode(format!("{}x{} pixel data has wrong length", size.w, size.h)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Orientation;
    use image::Rgba;
    use proptest::prelude::*;

    fn coordinate_image(w: u32, h: u32) -> BitmapImage {
        BitmapImage::new(RgbaImage::from_fn(w, h, |x, y| Rgba([x as u8, y as u8, 77, 255])))
    }

    #[test]
    fn test_resize_exact_dimensions() {
        let image = coordinate_image(40, 30);
        let resized = image.resize(720, 720, ResizeFilter::Bilinear).unwrap();
        assert_eq!(resized.size(), Size::square(720));
    }

    #[test]
    fn test_resize_applies_orientation() {
        let image = coordinate_image(40, 30).with_orientation(Orientation::Left);
        let resized = image.resize(30, 40, ResizeFilter::Nearest).unwrap();
        assert_eq!(resized.orientation(), Orientation::Up);
        // Displayed size already was 30x40, so this is just the baked rotation.
        assert_eq!(resized, image.upright());
    }

    #[test]
    fn test_resize_rejects_zero() {
        assert!(coordinate_image(4, 4).resize(0, 4, ResizeFilter::Nearest).is_err());
    }

    #[test]
    fn test_crop_extracts_window_and_keeps_orientation() {
        let image = coordinate_image(10, 8).with_orientation(Orientation::Down);
        let cropped = image.crop(Rect::new(2.0, 3.0, 4.0, 2.0));
        assert_eq!(cropped.pixel_size(), Size::new(4, 2));
        assert_eq!(cropped.orientation(), Orientation::Down);
        assert_eq!(cropped.as_rgba().get_pixel(0, 0), &Rgba([2, 3, 77, 255]));
    }

    #[test]
    fn test_crop_outside_returns_original() {
        let image = coordinate_image(10, 8);
        let cropped = image.crop(Rect::new(50.0, 50.0, 4.0, 4.0));
        assert_eq!(cropped, image);
    }

    #[test]
    fn test_smart_crop_landscape_centered() {
        let image = coordinate_image(12, 6);
        let cropped = image.smart_crop();
        assert_eq!(cropped.pixel_size(), Size::square(6));
        // Offset (12 - 6) / 2 = 3 on the x axis.
        assert_eq!(cropped.as_rgba().get_pixel(0, 0), &Rgba([3, 0, 77, 255]));
    }

    #[test]
    fn test_smart_crop_portrait_centered() {
        let image = coordinate_image(5, 11);
        let cropped = image.smart_crop();
        assert_eq!(cropped.pixel_size(), Size::square(5));
        assert_eq!(cropped.as_rgba().get_pixel(0, 0), &Rgba([0, 3, 77, 255]));
    }

    proptest! {
        #[test]
        fn prop_smart_crop_idempotent(w in 1u32..64, h in 1u32..64) {
            let image = coordinate_image(w, h);
            let once = image.smart_crop();
            let twice = once.smart_crop();
            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(once.pixel_size(), Size::square(w.min(h)));
        }
    }
}
