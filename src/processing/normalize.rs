//! Input normalization: any photo in, one square [`PixelBuffer`] out.
//!
//! Two entry paths exist. The placeholder shown at startup is only resized;
//! a picked photo is cropped to its centre square first (when enabled) so the
//! resize does not distort it.

use gram_scale::cpu::ResizeFilter;
use gram_scale::plan::Size;

use crate::config::DEFAULT_TARGET_SIZE;
use crate::core::{BitmapImage, PixelBuffer};
use crate::error::GramResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    target: Size,
    filter: ResizeFilter,
    smart_crop: bool,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_SIZE)
    }
}

impl Normalizer {
    pub fn new(target_side: u32) -> Self {
        Self {
            target: Size::square(target_side),
            filter: ResizeFilter::default(),
            smart_crop: true,
        }
    }

    pub fn with_filter(mut self, filter: ResizeFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_smart_crop(mut self, enabled: bool) -> Self {
        self.smart_crop = enabled;
        self
    }

    pub fn target_side(&self) -> u32 {
        self.target.w
    }

    pub fn target(&self) -> Size {
        self.target
    }

    pub fn smart_crop(&self) -> bool {
        self.smart_crop
    }

    /// Picker path: optional smart crop, then resize to the target square.
    pub fn normalize(&self, image: &BitmapImage) -> GramResult<BitmapImage> {
        let cropped = if self.smart_crop {
            image.smart_crop()
        } else {
            image.clone()
        };
        cropped.resize(self.target.w, self.target.h, self.filter)
    }

    /// Picker path, converted to the buffer handed to the filters.
    pub fn prepare(&self, image: &BitmapImage) -> GramResult<PixelBuffer> {
        let normalized = self.normalize(image)?;
        PixelBuffer::from_bitmap(&normalized)
    }

    /// Placeholder path: resize only, never cropped.
    pub fn prepare_placeholder(&self, image: &BitmapImage) -> GramResult<PixelBuffer> {
        let resized = image.resize(self.target.w, self.target.h, self.filter)?;
        PixelBuffer::from_bitmap(&resized)
    }
}
