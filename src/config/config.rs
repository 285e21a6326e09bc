//! # Configuration Module
//!
//! Configuration for the image-preparation and filter-rendering pipeline. It is
//! the common interface between the CLI, embedding applications and the core
//! library.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Range | Description |
//! |-----------|------|-------|-------------|
//! | `target_size` | `u32` | 1-8192 | Side of the square buffer handed to filters |
//! | `resize_filter` | `ResizeFilter` | nearest, bilinear, catmull-rom, lanczos3 | Resampling kernel |
//! | `smart_crop` | `bool` | true/false | Centre-square crop before resizing |
//! | `models_dir` | `Option<PathBuf>` | Existing directory | Where `<model>.onnx` files live |
//! | `filter_timeout_ms` | `Option<u64>` | > 0 | Per-filter time limit in a session |
//!
//! ## Examples
//!
//! ```rust
//! use gram::config::config::GramConfig;
//!
//! // Use defaults
//! let config = GramConfig::default();
//! assert_eq!(config.target_size, 720);
//!
//! // Smaller working resolution, no crop
//! let mut config = GramConfig::default();
//! config.target_size = 256;
//! config.smart_crop = false;
//! assert!(config.validate().is_ok());
//!
//! let normalizer = config.to_normalizer();
//! ```

use std::path::PathBuf;
use std::time::Duration;

use gram_scale::cpu::ResizeFilter;

use crate::error::{GramError, GramResult};
use crate::processing::Normalizer;

/// Default side of the normalized square buffer.
pub const DEFAULT_TARGET_SIZE: u32 = 720;

/// Largest accepted `target_size`.
pub const MAX_TARGET_SIZE: u32 = 8192;

/// Pipeline configuration.
///
/// # Field Descriptions
///
/// - `target_size`: every input is normalized to `target_size` x `target_size`
/// - `resize_filter`: kernel used by the resize step
/// - `smart_crop`: crop the picked photo to its centre square first
/// - `models_dir`: directory of model files for the ONNX back-end
/// - `filter_timeout_ms`: optional per-filter limit enforced by the session
///
/// # Examples
///
/// ```rust
/// use gram::config::config::GramConfig;
/// use gram_scale::cpu::ResizeFilter;
///
/// let config = GramConfig {
///     target_size: 512,
///     resize_filter: ResizeFilter::Bilinear,
///     smart_crop: true,
///     models_dir: Some("models".into()),
///     filter_timeout_ms: Some(5_000),
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GramConfig {
    /// Side of the square buffer the filters receive.
    ///
    /// Style-transfer models are trained at a fixed resolution, so this has
    /// to match the models in use. Must be between 1 and 8192.
    pub target_size: u32,

    /// Resampling kernel for the resize step.
    pub resize_filter: ResizeFilter,

    /// Whether the picked photo is cropped to its centred square before the
    /// resize. When `false` the photo is stretched to the square.
    pub smart_crop: bool,

    /// Directory holding `<model>.onnx` files.
    ///
    /// Without it (or without the `onnx` feature) only the identity filter
    /// renders.
    pub models_dir: Option<PathBuf>,

    /// Per-filter time limit in milliseconds.
    ///
    /// A filter that exceeds it is recorded as absent for that sweep. Must be
    /// greater than 0 when set.
    pub filter_timeout_ms: Option<u64>,
}

impl Default for GramConfig {
    /// Default values:
    /// - `target_size`: 720
    /// - `resize_filter`: Lanczos3
    /// - `smart_crop`: true
    /// - `models_dir`: None
    /// - `filter_timeout_ms`: None
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            resize_filter: ResizeFilter::default(),
            smart_crop: true,
            models_dir: None,
            filter_timeout_ms: None,
        }
    }
}

impl GramConfig {
    pub fn new(
        target_size: u32,
        resize_filter: ResizeFilter,
        smart_crop: bool,
        models_dir: Option<PathBuf>,
        filter_timeout_ms: Option<u64>,
    ) -> Self {
        Self {
            target_size,
            resize_filter,
            smart_crop,
            models_dir,
            filter_timeout_ms,
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> GramResult<()> {
        if !(1..=MAX_TARGET_SIZE).contains(&self.target_size) {
            return Err(GramError::config(
                "target_size",
                self.target_size.to_string(),
                format!("must be between 1 and {}", MAX_TARGET_SIZE),
            ));
        }
        if self.filter_timeout_ms == Some(0) {
            return Err(GramError::config(
                "filter_timeout_ms",
                "0",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    pub fn filter_timeout(&self) -> Option<Duration> {
        self.filter_timeout_ms.map(Duration::from_millis)
    }

    /// Normalizer implementing the picker path of this configuration.
    pub fn to_normalizer(&self) -> Normalizer {
        Normalizer::new(self.target_size)
            .with_filter(self.resize_filter)
            .with_smart_crop(self.smart_crop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GramConfig::default();
        assert_eq!(config.target_size, 720);
        assert_eq!(config.resize_filter, ResizeFilter::Lanczos3);
        assert!(config.smart_crop);
        assert!(config.models_dir.is_none());
        assert!(config.filter_timeout().is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = GramConfig::default();

        assert!(config.validate().is_ok());

        config.target_size = 0;
        assert!(config.validate().is_err());
        config.target_size = MAX_TARGET_SIZE + 1;
        assert!(config.validate().is_err());
        config.target_size = 720;

        config.filter_timeout_ms = Some(0);
        assert!(config.validate().is_err());
        config.filter_timeout_ms = Some(250);
        assert!(config.validate().is_ok());
        assert_eq!(config.filter_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_to_normalizer() {
        let config = GramConfig::new(64, ResizeFilter::Nearest, false, None, None);
        let normalizer = config.to_normalizer();
        assert_eq!(normalizer.target_side(), 64);
        assert!(!normalizer.smart_crop());
    }
}
