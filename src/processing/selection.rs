//! Gallery selection state.
//!
//! Tracks which catalog entry is selected and which buffer is on screen.
//! Selecting a filter that did not render keeps the current buffer visible.

use super::filter::FilterCatalog;
use super::render::RenderCache;
use crate::core::{to_image, BitmapImage, PixelBuffer};
use crate::error::{GramError, GramResult};

#[derive(Debug, Clone, Default)]
pub struct Gallery {
    selected: usize,
    displayed: Option<PixelBuffer>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_name<'a>(&self, catalog: &'a FilterCatalog) -> Option<&'a str> {
        catalog.get(self.selected).map(|f| f.name())
    }

    /// Buffer currently on screen.
    pub fn displayed(&self) -> Option<&PixelBuffer> {
        self.displayed.as_ref()
    }

    pub fn displayed_image(&self) -> Option<BitmapImage> {
        self.displayed.as_ref().and_then(to_image)
    }

    /// Back to the first catalog entry after a rebuild.
    pub fn reset(&mut self, catalog: &FilterCatalog, cache: &RenderCache) -> Option<&PixelBuffer> {
        self.selected = 0;
        self.show(catalog, cache);
        self.displayed.as_ref()
    }

    /// Select the catalog entry at `index`.
    ///
    /// Out-of-range indices are rejected and leave the state untouched.
    pub fn select_index(
        &mut self,
        index: usize,
        catalog: &FilterCatalog,
        cache: &RenderCache,
    ) -> GramResult<Option<&PixelBuffer>> {
        if index >= catalog.len() {
            return Err(GramError::config(
                "selection",
                index.to_string(),
                format!("catalog has {} filters", catalog.len()),
            ));
        }
        self.selected = index;
        self.show(catalog, cache);
        Ok(self.displayed.as_ref())
    }

    pub fn select_name(
        &mut self,
        name: &str,
        catalog: &FilterCatalog,
        cache: &RenderCache,
    ) -> GramResult<Option<&PixelBuffer>> {
        let index = catalog
            .position(name)
            .ok_or_else(|| GramError::config("selection", name, "no filter with this name"))?;
        self.select_index(index, catalog, cache)
    }

    fn show(&mut self, catalog: &FilterCatalog, cache: &RenderCache) {
        let rendered = catalog
            .get(self.selected)
            .and_then(|filter| cache.select(filter.name()));
        match rendered {
            Some(buffer) => self.displayed = Some(buffer.clone()),
            None => log::debug!("selection {} has no rendered output, keeping display", self.selected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{FnModel, RegistryLoader};
    use crate::processing::render::render_all;
    use std::sync::Arc;

    fn input() -> PixelBuffer {
        PixelBuffer::from_fn(2, 2, |x, y| [255, x as u8, y as u8, 0]).unwrap()
    }

    fn setup() -> (FilterCatalog, RenderCache) {
        // Only "Candy" has a model.
        let loader = RegistryLoader::new().with_model(
            "candy",
            FnModel::new("candy", |b: &PixelBuffer| {
                PixelBuffer::from_fn(b.width(), b.height(), |_, _| [255, 1, 2, 3])
            }),
        );
        let catalog = FilterCatalog::standard(Arc::new(loader));
        let cache = render_all(&input(), &catalog);
        (catalog, cache)
    }

    #[test]
    fn test_reset_shows_identity() {
        let (catalog, cache) = setup();
        let mut gallery = Gallery::new();
        assert_eq!(gallery.reset(&catalog, &cache), Some(&input()));
        assert_eq!(gallery.selected_name(&catalog), Some("Normal"));
    }

    #[test]
    fn test_absent_selection_keeps_display() {
        let (catalog, cache) = setup();
        let mut gallery = Gallery::new();
        gallery.reset(&catalog, &cache);

        let shown = gallery.select_name("Candy", &catalog, &cache).unwrap().cloned();
        assert_eq!(shown.unwrap().pixel(0, 0), [255, 1, 2, 3]);

        // "Udnie" has no model: selection moves, display does not.
        let shown = gallery.select_name("Udnie", &catalog, &cache).unwrap().cloned();
        assert_eq!(shown.unwrap().pixel(0, 0), [255, 1, 2, 3]);
        assert_eq!(gallery.selected_name(&catalog), Some("Udnie"));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let (catalog, cache) = setup();
        let mut gallery = Gallery::new();
        gallery.select_index(3, &catalog, &cache).unwrap();

        assert!(gallery.select_index(6, &catalog, &cache).is_err());
        assert!(gallery.select_name("Sepia", &catalog, &cache).is_err());
        assert_eq!(gallery.selected_index(), 3);
    }

    #[test]
    fn test_displayed_image_round_trips() {
        let (catalog, cache) = setup();
        let mut gallery = Gallery::new();
        assert!(gallery.displayed_image().is_none());
        gallery.reset(&catalog, &cache);
        assert_eq!(gallery.displayed_image().unwrap().width(), 2);
    }
}
