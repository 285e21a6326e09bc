//! ONNX style-transfer models run with ONNX Runtime.
//!
//! Models follow the fast-neural-style convention: one `1x3xHxW` float input
//! with channel values in `0..=255`, one output of the same layout. Files are
//! looked up as `<dir>/<model>.onnx` and memory-mapped while the session is
//! built.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use gram_scale::plan::Size;
use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;

use super::{ModelLoader, StyleModel};
use crate::core::PixelBuffer;
use crate::error::{GramError, GramResult};

/// Loads `<dir>/<model>.onnx` for a fixed square input.
pub struct OnnxModelLoader {
    dir: PathBuf,
    input_size: Size,
    intra_threads: usize,
}

impl OnnxModelLoader {
    pub fn new(dir: impl Into<PathBuf>, input_size: Size) -> Self {
        Self {
            dir: dir.into(),
            input_size,
            intra_threads: 2,
        }
    }

    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = threads.max(1);
        self
    }

    fn model_path(&self, model: &str) -> PathBuf {
        self.dir.join(format!("{model}.onnx"))
    }
}

impl ModelLoader for OnnxModelLoader {
    fn load(&self, model: &str) -> GramResult<Arc<dyn StyleModel>> {
        let path = self.model_path(model);
        let session = load_session(&path, self.intra_threads)
            .map_err(|reason| GramError::inference(model, reason).with_context(path.display().to_string()))?;
        log::info!("loaded model '{}' from {}", model, path.display());
        Ok(Arc::new(OnnxStyleModel {
            name: model.to_string(),
            input_size: self.input_size,
            session: Mutex::new(session),
        }))
    }
}

fn load_session(path: &Path, intra_threads: usize) -> Result<Session, String> {
    let file = File::open(path).map_err(|e| format!("open model: {}", e))?;
    // SAFETY: the mapping is read-only and dropped once the session has copied the model.
    let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| format!("map model: {}", e))?;
    Session::builder()
        .and_then(|b| b.with_intra_threads(intra_threads))
        .and_then(|b| b.commit_from_memory(&mmap))
        .map_err(|e| format!("ONNX session load error: {}", e))
}

struct OnnxStyleModel {
    name: String,
    input_size: Size,
    session: Mutex<Session>,
}

impl StyleModel for OnnxStyleModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_size(&self) -> Option<Size> {
        Some(self.input_size)
    }

    fn predict(&self, input: &PixelBuffer) -> GramResult<PixelBuffer> {
        let (w, h) = (input.width() as usize, input.height() as usize);
        let nchw = Array4::<f32>::from_shape_fn((1, 3, h, w), |(_, c, y, x)| {
            // ARGB: channel c lives at byte c + 1.
            input.pixel(x as u32, y as u32)[c + 1] as f32
        });
        let tensor = Tensor::from_array(nchw)
            .map_err(|e| GramError::inference(&self.name, format!("input tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| GramError::inference(&self.name, "session lock poisoned"))?;
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| GramError::inference(&self.name, e.to_string()).with_operation("run"))?;
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| GramError::inference(&self.name, format!("extract output: {}", e)))?;

        let dims: Vec<i64> = shape.iter().copied().collect();
        if dims.len() != 4 || dims[0] != 1 || dims[1] != 3 || dims[2] <= 0 || dims[3] <= 0 {
            return Err(GramError::inference(
                &self.name,
                format!("unexpected output shape {:?}", dims),
            ));
        }
        let (out_h, out_w) = (dims[2] as usize, dims[3] as usize);
        let plane = out_h * out_w;
        if data.len() < 3 * plane {
            return Err(GramError::inference(&self.name, "output tensor shorter than its shape"));
        }

        let to_u8 = |v: f32| v.round().clamp(0.0, 255.0) as u8;
        PixelBuffer::from_fn(out_w as u32, out_h as u32, |x, y| {
            let i = y as usize * out_w + x as usize;
            [255, to_u8(data[i]), to_u8(data[plane + i]), to_u8(data[2 * plane + i])]
        })
    }
}
