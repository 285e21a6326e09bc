//! # Core Image Types
//!
//! The two pixel representations of the pipeline and the operations that move
//! between them: decoded [`BitmapImage`]s on the display side, packed-ARGB
//! [`PixelBuffer`]s on the filter side, geometry ops on bitmaps, and the
//! conversion in both directions.

pub mod bitmap;
pub mod conversion;
pub mod geometry;
pub mod pixel_buffer;

pub use bitmap::{BitmapImage, Orientation};
pub use conversion::{to_image, to_pixel_buffer};
pub use pixel_buffer::PixelBuffer;
