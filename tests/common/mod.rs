//! Common test utilities and helpers for the gram library tests
//!
//! Test photos, model doubles and assertions shared by the integration tests.
#![allow(dead_code)]

/// Test photo and buffer builders
pub mod test_frames {
    use gram::{BitmapImage, PixelBuffer};
    use image::{Rgba, RgbaImage};

    /// Gradient photo: red follows x, green follows y, constant blue.
    pub fn gradient_photo(w: u32, h: u32) -> BitmapImage {
        BitmapImage::new(RgbaImage::from_fn(w, h, |x, y| {
            Rgba([
                ((x * 255) / w.max(1)) as u8,
                ((y * 255) / h.max(1)) as u8,
                128,
                255,
            ])
        }))
    }

    /// Photo with a red marker in the top-left corner and a green one in the
    /// bottom-right corner on a translucent blue background.
    pub fn marker_photo(w: u32, h: u32) -> BitmapImage {
        let mut img = RgbaImage::from_pixel(w, h, Rgba([0, 0, 255, 200]));
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(w - 1, h - 1, Rgba([0, 255, 0, 255]));
        BitmapImage::new(img)
    }

    /// Solid ARGB buffer.
    pub fn solid_buffer(side: u32, argb: [u8; 4]) -> PixelBuffer {
        PixelBuffer::from_fn(side, side, |_, _| argb).expect("solid buffer")
    }

    /// Buffer whose every pixel encodes its coordinates.
    pub fn coordinate_buffer(side: u32) -> PixelBuffer {
        PixelBuffer::from_fn(side, side, |x, y| [255, x as u8, y as u8, (x ^ y) as u8]).expect("coordinate buffer")
    }
}

/// Model doubles
pub mod mock_models {
    use gram::processing::STANDARD_STYLES;
    use gram::{FnModel, GramError, PixelBuffer, RegistryLoader};

    /// Model that tints every pixel with a per-model constant so outputs of
    /// different models are distinguishable.
    pub fn tint_model(model: &str, tint: u8) -> FnModel<impl Fn(&PixelBuffer) -> gram::GramResult<PixelBuffer> + Send + Sync + use<>> {
        FnModel::new(model, move |input: &PixelBuffer| {
            PixelBuffer::from_fn(input.width(), input.height(), |x, y| {
                let [a, r, g, _] = input.pixel(x, y);
                [a, r, g, tint]
            })
        })
    }

    /// Model that always fails with an inference error.
    pub fn failing_model(model: &str) -> FnModel<impl Fn(&PixelBuffer) -> gram::GramResult<PixelBuffer> + Send + Sync + use<>> {
        let name = model.to_string();
        FnModel::new(model, move |_: &PixelBuffer| Err(GramError::inference(&name, "deterministic failure")))
    }

    /// Model that panics mid-inference.
    pub fn panicking_model(model: &str) -> FnModel<impl Fn(&PixelBuffer) -> gram::GramResult<PixelBuffer> + Send + Sync + use<>> {
        FnModel::new(model, |_: &PixelBuffer| panic!("model runtime fault"))
    }

    /// Loader where every standard style succeeds; tint is the style's index + 1.
    pub fn all_styles_loader() -> RegistryLoader {
        let mut loader = RegistryLoader::new();
        for (i, (_, model)) in STANDARD_STYLES.iter().enumerate() {
            loader = loader.with_model(*model, tint_model(model, i as u8 + 1));
        }
        loader
    }

    /// Like [`all_styles_loader`] but `failing` deterministically errors.
    pub fn loader_with_failure(failing: &str) -> RegistryLoader {
        all_styles_loader().with_model(failing, failing_model(failing))
    }
}

/// Custom assertions for testing
pub mod assertions {
    use gram::{PixelBuffer, RenderCache, Size};

    /// Assert that two buffers hold the same pixels, padding ignored.
    pub fn assert_same_pixels(left: &PixelBuffer, right: &PixelBuffer) {
        assert_eq!(
            left.size(),
            right.size(),
            "Buffer sizes don't match: {}x{} vs {}x{}",
            left.width(),
            left.height(),
            right.width(),
            right.height()
        );
        assert_eq!(left.to_packed_argb(), right.to_packed_argb(), "Buffer pixel data doesn't match");
    }

    pub fn assert_buffer_size(buffer: &PixelBuffer, expected: Size) {
        assert_eq!(
            buffer.size(),
            expected,
            "Buffer size mismatch: expected {}x{}, got {}x{}",
            expected.w,
            expected.h,
            buffer.width(),
            buffer.height()
        );
    }

    /// Assert that every cache key is one of `allowed`.
    pub fn assert_keys_subset(cache: &RenderCache, allowed: &[&str]) {
        for name in cache.names() {
            assert!(allowed.contains(&name), "unexpected cache entry '{}'", name);
        }
    }

    /// Assert the exact key set of `cache`, order ignored.
    pub fn assert_keys(cache: &RenderCache, expected: &[&str]) {
        let mut actual: Vec<&str> = cache.names().collect();
        let mut expected = expected.to_vec();
        actual.sort_unstable();
        expected.sort_unstable();
        assert_eq!(actual, expected);
    }
}
