//! # Photo Sources
//!
//! Where input photos come from. The pipeline itself only needs a
//! [`BitmapImage`]; a [`PhotoSource`] hands them out one at a time.
//!
//! - [`FileSource`]: decodes files from disk on the blocking pool
//! - [`MemorySource`]: already-decoded images, used for the startup
//!   placeholder and in tests

use std::collections::VecDeque;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::core::BitmapImage;
use crate::error::{GramError, GramResult};

/// A decoded photo and a label to report it under.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub label: String,
    pub image: BitmapImage,
}

impl Photo {
    pub fn new(label: impl Into<String>, image: BitmapImage) -> Self {
        Self {
            label: label.into(),
            image,
        }
    }
}

/// Abstract interface for photo sources.
#[async_trait]
pub trait PhotoSource: Send {
    /// Next photo, `Ok(None)` when the source is exhausted.
    async fn next_photo(&mut self) -> GramResult<Option<Photo>>;

    /// Number of photos not yet handed out.
    fn remaining(&self) -> usize;
}

/// Decodes image files in order.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    paths: VecDeque<PathBuf>,
}

impl FileSource {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl PhotoSource for FileSource {
    async fn next_photo(&mut self) -> GramResult<Option<Photo>> {
        let Some(path) = self.paths.pop_front() else {
            return Ok(None);
        };
        let label = path.display().to_string();
        let image = tokio::task::spawn_blocking(move || BitmapImage::open(&path))
            .await
            .map_err(|e| GramError::session(format!("decode task failed: {}", e)))??;
        log::debug!("decoded {} ({}x{})", label, image.width(), image.height());
        Ok(Some(Photo::new(label, image)))
    }

    fn remaining(&self) -> usize {
        self.paths.len()
    }
}

/// Hands out pre-decoded photos.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    photos: VecDeque<Photo>,
}

impl MemorySource {
    pub fn new(photos: impl IntoIterator<Item = Photo>) -> Self {
        Self {
            photos: photos.into_iter().collect(),
        }
    }

    pub fn push(&mut self, photo: Photo) {
        self.photos.push_back(photo);
    }
}

#[async_trait]
impl PhotoSource for MemorySource {
    async fn next_photo(&mut self) -> GramResult<Option<Photo>> {
        Ok(self.photos.pop_front())
    }

    fn remaining(&self) -> usize {
        self.photos.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn tiny() -> BitmapImage {
        BitmapImage::new(RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255])))
    }

    #[tokio::test]
    async fn test_memory_source_in_order() {
        let mut source = MemorySource::new([Photo::new("a", tiny()), Photo::new("b", tiny())]);
        assert_eq!(source.remaining(), 2);
        assert_eq!(source.next_photo().await.unwrap().unwrap().label, "a");
        assert_eq!(source.next_photo().await.unwrap().unwrap().label, "b");
        assert!(source.next_photo().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_source_decodes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        tiny().save(&path).unwrap();

        let mut source = FileSource::new([&path]);
        let photo = source.next_photo().await.unwrap().unwrap();
        assert_eq!(photo.image, tiny());
        assert_eq!(source.remaining(), 0);
    }

    #[tokio::test]
    async fn test_file_source_missing_file_errors() {
        let mut source = FileSource::new(["/definitely/not/here.png"]);
        assert!(source.next_photo().await.is_err());
    }
}
