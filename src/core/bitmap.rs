//! # Bitmap Image
//!
//! Decoded, display-ready image: RGBA pixels plus orientation metadata. Pixels
//! are shared behind an `Arc`, so clones are cheap and the type stays immutable;
//! every transformation (see [`crate::core::geometry`]) returns a new instance.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use gram_scale::plan::Size;
use image::{DynamicImage, ImageDecoder, ImageReader, RgbaImage};

use crate::error::{GramError, GramResult};

/// How stored pixels must be transformed to appear upright.
///
/// Variants follow the EXIF orientation tag (1 to 8).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    #[default]
    Up,
    UpMirrored,
    Down,
    DownMirrored,
    LeftMirrored,
    Right,
    RightMirrored,
    Left,
}

impl Orientation {
    pub fn from_exif(tag: u16) -> Option<Self> {
        Some(match tag {
            1 => Self::Up,
            2 => Self::UpMirrored,
            3 => Self::Down,
            4 => Self::DownMirrored,
            5 => Self::LeftMirrored,
            6 => Self::Right,
            7 => Self::RightMirrored,
            8 => Self::Left,
            _ => return None,
        })
    }

    pub fn exif(self) -> u16 {
        match self {
            Self::Up => 1,
            Self::UpMirrored => 2,
            Self::Down => 3,
            Self::DownMirrored => 4,
            Self::LeftMirrored => 5,
            Self::Right => 6,
            Self::RightMirrored => 7,
            Self::Left => 8,
        }
    }

    /// Quarter-turn orientations swap displayed width and height.
    pub fn swaps_axes(self) -> bool {
        matches!(
            self,
            Self::Left | Self::Right | Self::LeftMirrored | Self::RightMirrored
        )
    }

    fn from_decoder(orientation: image::metadata::Orientation) -> Self {
        use image::metadata::Orientation as O;
        match orientation {
            O::NoTransforms => Self::Up,
            O::FlipHorizontal => Self::UpMirrored,
            O::Rotate180 => Self::Down,
            O::FlipVertical => Self::DownMirrored,
            O::Rotate90FlipH => Self::LeftMirrored,
            O::Rotate90 => Self::Right,
            O::Rotate270FlipH => Self::RightMirrored,
            O::Rotate270 => Self::Left,
        }
    }

    /// Produce upright pixels from stored pixels.
    pub(crate) fn apply(self, pixels: &RgbaImage) -> RgbaImage {
        use image::imageops::{flip_horizontal, flip_vertical, rotate180, rotate270, rotate90};
        match self {
            Self::Up => pixels.clone(),
            Self::UpMirrored => flip_horizontal(pixels),
            Self::Down => rotate180(pixels),
            Self::DownMirrored => flip_vertical(pixels),
            Self::LeftMirrored => flip_horizontal(&rotate90(pixels)),
            Self::Right => rotate90(pixels),
            Self::RightMirrored => flip_horizontal(&rotate270(pixels)),
            Self::Left => rotate270(pixels),
        }
    }
}

/// Decoded photo with orientation metadata.
#[derive(Clone, Debug)]
pub struct BitmapImage {
    pixels: Arc<RgbaImage>,
    orientation: Orientation,
}

impl BitmapImage {
    /// Wrap upright RGBA pixels.
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
            orientation: Orientation::Up,
        }
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self::new(image.into_rgba8())
    }

    /// Same pixels, different orientation tag.
    pub fn with_orientation(&self, orientation: Orientation) -> Self {
        Self {
            pixels: Arc::clone(&self.pixels),
            orientation,
        }
    }

    /// Decode a photo from disk, keeping its EXIF orientation.
    pub fn open(path: impl AsRef<Path>) -> GramResult<Self> {
        let path = path.as_ref();
        let reader = ImageReader::open(path)
            .map_err(|e| GramError::io("open photo", e).with_path(path.display().to_string()))?
            .with_guessed_format()
            .map_err(|e| GramError::io("sniff photo format", e).with_path(path.display().to_string()))?;
        Self::decode_reader(reader).map_err(|e| e.with_context(path.display().to_string()))
    }

    /// Decode a photo held in memory.
    pub fn decode(bytes: &[u8]) -> GramResult<Self> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| GramError::io("sniff photo format", e))?;
        Self::decode_reader(reader)
    }

    fn decode_reader<R: std::io::BufRead + std::io::Seek>(reader: ImageReader<R>) -> GramResult<Self> {
        let mut decoder = reader.into_decoder()?;
        let orientation = decoder
            .orientation()
            .map(Orientation::from_decoder)
            .unwrap_or_default();
        let image = DynamicImage::from_decoder(decoder)?;
        Ok(Self::from_dynamic(image).with_orientation(orientation))
    }

    /// Stored pixel dimensions, orientation ignored.
    pub fn pixel_size(&self) -> Size {
        Size::new(self.pixels.width(), self.pixels.height())
    }

    /// Displayed dimensions, orientation applied.
    pub fn size(&self) -> Size {
        let stored = self.pixel_size();
        if self.orientation.swaps_axes() {
            stored.transposed()
        } else {
            stored
        }
    }

    pub fn width(&self) -> u32 {
        self.size().w
    }

    pub fn height(&self) -> u32 {
        self.size().h
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Stored pixels, orientation not applied.
    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Upright copy with orientation baked into the pixels.
    pub fn upright(&self) -> BitmapImage {
        if self.orientation == Orientation::Up {
            return self.clone();
        }
        BitmapImage::new(self.orientation.apply(&self.pixels))
    }

    /// Encode the upright image to `path`; format follows the extension.
    pub fn save(&self, path: impl AsRef<Path>) -> GramResult<()> {
        let path = path.as_ref();
        self.upright().pixels.save(path).map_err(|e| {
            GramError::from(e)
                .with_operation("save image")
                .with_context(path.display().to_string())
        })
    }
}

impl PartialEq for BitmapImage {
    fn eq(&self, other: &Self) -> bool {
        self.orientation == other.orientation && *self.pixels == *other.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn marker_image() -> RgbaImage {
        // 3x2 with a red marker at the top-left corner.
        let mut img = RgbaImage::from_pixel(3, 2, Rgba([0, 0, 255, 255]));
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img
    }

    #[test]
    fn test_exif_round_trip() {
        for tag in 1..=8 {
            assert_eq!(Orientation::from_exif(tag).unwrap().exif(), tag);
        }
        assert!(Orientation::from_exif(0).is_none());
        assert!(Orientation::from_exif(9).is_none());
    }

    #[test]
    fn test_size_follows_orientation() {
        let image = BitmapImage::new(marker_image()).with_orientation(Orientation::Right);
        assert_eq!(image.pixel_size(), Size::new(3, 2));
        assert_eq!(image.size(), Size::new(2, 3));
    }

    #[test]
    fn test_upright_right_rotates_clockwise() {
        let image = BitmapImage::new(marker_image()).with_orientation(Orientation::Right);
        let upright = image.upright();
        assert_eq!(upright.orientation(), Orientation::Up);
        assert_eq!(upright.size(), Size::new(2, 3));
        // Top-left marker lands top-right after a clockwise quarter turn.
        assert_eq!(upright.as_rgba().get_pixel(1, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_upright_transpose_keeps_marker_on_diagonal() {
        let image = BitmapImage::new(marker_image()).with_orientation(Orientation::LeftMirrored);
        let upright = image.upright();
        assert_eq!(upright.as_rgba().get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_decode_png_bytes() {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(marker_image())
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let decoded = BitmapImage::decode(&bytes).unwrap();
        assert_eq!(decoded.as_rgba(), &marker_image());
        assert_eq!(decoded.orientation(), Orientation::Up);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(BitmapImage::decode(b"definitely not an image").is_err());
    }
}
