//! # Model Back-ends
//!
//! Style-transfer filters do not know how a model runs. They ask a
//! [`ModelLoader`] for a [`StyleModel`] by name and call `predict`. Back-ends:
//!
//! - [`RegistryLoader`]: in-process models registered by name
//! - [`FnModel`]: wraps a closure as a model (embedding and test doubles)
//! - `OnnxModelLoader` (feature `onnx`): `<dir>/<model>.onnx` run with ONNX Runtime

use std::collections::HashMap;
use std::sync::Arc;

use gram_scale::plan::Size;

use crate::core::PixelBuffer;
use crate::error::{GramError, GramResult};

#[cfg(feature = "onnx")]
pub mod onnx;

#[cfg(feature = "onnx")]
pub use onnx::OnnxModelLoader;

/// A pretrained image-to-image model.
pub trait StyleModel: Send + Sync {
    /// Identifier used in logs and errors.
    fn name(&self) -> &str;

    /// Input resolution the model requires, `None` when any size is accepted.
    fn input_size(&self) -> Option<Size> {
        None
    }

    /// Run inference on one buffer.
    fn predict(&self, input: &PixelBuffer) -> GramResult<PixelBuffer>;
}

/// Resolves model names to loaded models.
pub trait ModelLoader: Send + Sync {
    fn load(&self, model: &str) -> GramResult<Arc<dyn StyleModel>>;
}

/// Closure-backed model.
pub struct FnModel<F> {
    name: String,
    input_size: Option<Size>,
    f: F,
}

impl<F> FnModel<F>
where
    F: Fn(&PixelBuffer) -> GramResult<PixelBuffer> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            input_size: None,
            f,
        }
    }

    pub fn with_input_size(mut self, size: Size) -> Self {
        self.input_size = Some(size);
        self
    }
}

impl<F> StyleModel for FnModel<F>
where
    F: Fn(&PixelBuffer) -> GramResult<PixelBuffer> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn input_size(&self) -> Option<Size> {
        self.input_size
    }

    fn predict(&self, input: &PixelBuffer) -> GramResult<PixelBuffer> {
        (self.f)(input)
    }
}

/// Loader over a fixed set of in-process models.
#[derive(Default, Clone)]
pub struct RegistryLoader {
    models: HashMap<String, Arc<dyn StyleModel>>,
}

impl RegistryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `model` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, model: Arc<dyn StyleModel>) -> &mut Self {
        self.models.insert(name.into(), model);
        self
    }

    pub fn with_model(mut self, name: impl Into<String>, model: impl StyleModel + 'static) -> Self {
        self.register(name, Arc::new(model));
        self
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl ModelLoader for RegistryLoader {
    fn load(&self, model: &str) -> GramResult<Arc<dyn StyleModel>> {
        self.models
            .get(model)
            .cloned()
            .ok_or_else(|| GramError::inference(model, "model not registered").with_operation("load"))
    }
}
