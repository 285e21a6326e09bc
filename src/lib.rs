//! # Gram Filter Pipeline
//!
//! Image preparation and filter rendering for a photo-filter app: normalize an
//! arbitrary photo to a fixed square buffer, run it through an ordered catalog
//! of interchangeable filters, and keep the successful outputs in a
//! name-keyed cache for selection and display.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `core`: `BitmapImage`, `PixelBuffer`, geometry ops and conversion between them
//! - `inference`: model traits and back-ends used by style-transfer filters
//! - `processing`: filters, the catalog, render sweeps, selection and normalization
//! - `config`: configuration management and validation
//! - `source`: where input photos come from
//! - `session`: background render worker with stale-sweep cancellation
//!
//! Pure geometry math and the CPU pixel kernels live in the `gram-scale` crate.
//!
//! ## Failure Model
//!
//! A filter that cannot produce output is simply missing from the cache. No
//! single filter failure, panic included, stops the sweep.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use gram::{render_all, FilterCatalog, Normalizer, RegistryLoader};
//! use gram::core::BitmapImage;
//! use image::{Rgba, RgbaImage};
//!
//! # fn main() -> gram::GramResult<()> {
//! let photo = BitmapImage::new(RgbaImage::from_pixel(1200, 800, Rgba([90, 120, 200, 255])));
//! let buffer = Normalizer::new(64).prepare(&photo)?;
//!
//! let catalog = FilterCatalog::standard(Arc::new(RegistryLoader::new()));
//! let cache = render_all(&buffer, &catalog);
//!
//! // No models registered: only the identity filter rendered.
//! assert_eq!(cache.select("Normal"), Some(&buffer));
//! assert!(cache.select("Candy").is_none());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod inference;
pub mod processing;
pub mod session;
pub mod source;

/// Re-export error types for convenience
pub use error::{ErrorContext, ErrorSeverity, GramError, GramResult, HasSeverity, Retryable};

pub use config::GramConfig;
pub use core::{to_image, to_pixel_buffer, BitmapImage, Orientation, PixelBuffer};
pub use inference::{FnModel, ModelLoader, RegistryLoader, StyleModel};
pub use processing::{
    render_all, select, Filter, FilterCatalog, FilterOutcome, Gallery, IdentityFilter, Normalizer, RenderCache,
    StyleTransferFilter, SweepReport,
};
pub use session::{RenderHandle, RenderOutput, RenderSession, RenderSessionBuilder};
pub use source::{FileSource, MemorySource, Photo, PhotoSource};

/// Re-export commonly used types from dependencies
pub use gram_scale::cpu::ResizeFilter;
pub use gram_scale::plan::{Rect, Size};
