//! # Filters and the Filter Catalog
//!
//! A filter is a named, pure `PixelBuffer -> Option<PixelBuffer>` function.
//! [`FilterCatalog`] is the ordered registry the render sweep iterates; its
//! order is also the gallery order shown to the user.
//!
//! ## Implementations
//!
//! - [`IdentityFilter`] ("Normal"): returns its input untouched
//! - [`StyleTransferFilter`]: runs a pretrained model obtained from a
//!   [`ModelLoader`]; any load or inference failure becomes `None`
//!
//! New filters only need to implement [`Filter`] and be registered.

use std::sync::{Arc, OnceLock};

use crate::core::PixelBuffer;
use crate::error::{GramError, GramResult};
use crate::inference::{ModelLoader, StyleModel};

/// Name of the passthrough filter, always first in the standard catalog.
pub const IDENTITY_FILTER_NAME: &str = "Normal";

/// Style filters of the standard catalog as `(label, model id)`, in gallery order.
pub const STANDARD_STYLES: [(&str, &str); 5] = [
    ("Mosaic", "mosaic"),
    ("La Muse", "la_muse"),
    ("Candy", "candy"),
    ("Udnie", "udnie"),
    ("The Scream", "the_scream"),
];

/// A named transformation of one pixel buffer into another.
///
/// Implementations must be stateless from the caller's point of view: the
/// result for a given input may not depend on other filters or on call order.
pub trait Filter: Send + Sync {
    /// Stable, catalog-unique name; cache key and UI label.
    fn name(&self) -> &str;

    /// Transform `input`, or `None` when this filter cannot produce an output.
    fn render(&self, input: &PixelBuffer) -> Option<PixelBuffer>;
}

/// Passthrough filter.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityFilter;

impl Filter for IdentityFilter {
    fn name(&self) -> &str {
        IDENTITY_FILTER_NAME
    }

    fn render(&self, input: &PixelBuffer) -> Option<PixelBuffer> {
        Some(input.clone())
    }
}

/// Filter backed by a pretrained style-transfer model.
///
/// The model is resolved on first use and kept; a failed load is retried on
/// the next render.
pub struct StyleTransferFilter {
    name: String,
    model_id: String,
    loader: Arc<dyn ModelLoader>,
    model: OnceLock<Arc<dyn StyleModel>>,
}

impl StyleTransferFilter {
    pub fn new(name: impl Into<String>, model_id: impl Into<String>, loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            name: name.into(),
            model_id: model_id.into(),
            loader,
            model: OnceLock::new(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    fn model(&self) -> GramResult<Arc<dyn StyleModel>> {
        if let Some(model) = self.model.get() {
            return Ok(Arc::clone(model));
        }
        let loaded = self.loader.load(&self.model_id)?;
        Ok(Arc::clone(self.model.get_or_init(|| loaded)))
    }

    /// Same as [`Filter::render`] but keeps the failure reason.
    pub fn try_render(&self, input: &PixelBuffer) -> GramResult<PixelBuffer> {
        let model = self.model()?;
        if let Some(expected) = model.input_size() {
            if expected != input.size() {
                return Err(GramError::inference(
                    &self.model_id,
                    format!(
                        "expects {}x{} input, got {}x{}",
                        expected.w,
                        expected.h,
                        input.width(),
                        input.height()
                    ),
                ));
            }
        }
        model.predict(input)
    }
}

impl Filter for StyleTransferFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, input: &PixelBuffer) -> Option<PixelBuffer> {
        self.try_render(input)
            .inspect_err(|e| log::warn!("filter '{}' produced no output: {}", self.name, e))
            .ok()
    }
}

/// Ordered registry of filters with unique names.
#[derive(Clone, Default)]
pub struct FilterCatalog {
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The six-entry application catalog: "Normal" followed by the
    /// [`STANDARD_STYLES`] resolved through `loader`.
    pub fn standard(loader: Arc<dyn ModelLoader>) -> Self {
        let mut filters: Vec<Arc<dyn Filter>> = Vec::with_capacity(STANDARD_STYLES.len() + 1);
        filters.push(Arc::new(IdentityFilter));
        for (label, model_id) in STANDARD_STYLES {
            filters.push(Arc::new(StyleTransferFilter::new(label, model_id, Arc::clone(&loader))));
        }
        Self { filters }
    }

    /// Append `filter`; names must stay unique.
    pub fn register(&mut self, filter: Arc<dyn Filter>) -> GramResult<&mut Self> {
        if self.position(filter.name()).is_some() {
            return Err(GramError::config(
                "filter",
                filter.name(),
                "a filter with this name is already registered",
            ));
        }
        self.filters.push(filter);
        Ok(self)
    }

    /// Builder form of [`FilterCatalog::register`].
    pub fn with(mut self, filter: impl Filter + 'static) -> GramResult<Self> {
        self.register(Arc::new(filter))?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<dyn Filter>> {
        self.filters.get(index)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.filters.iter().position(|f| f.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Filter>> {
        self.filters.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }
}

impl std::fmt::Debug for FilterCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
