//! # Render Cache
//!
//! One sweep runs every catalog filter once over the same read-only input and
//! records the successes under the filter's name. A sweep always starts from
//! an empty cache; [`RenderCache::rebuild`] replaces the whole mapping.
//!
//! Every filter call is isolated with `catch_unwind`, so a panicking model is
//! recorded as absent and the remaining filters still run.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use super::filter::{Filter, FilterCatalog};
use super::report::{FilterOutcome, SweepReport};
use crate::core::PixelBuffer;

/// Name-keyed rendered outputs for one input buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderCache {
    entries: HashMap<String, PixelBuffer>,
    generation: u64,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sweep counter of the input this cache was rendered from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, buffer: PixelBuffer) {
        self.entries.insert(name.into(), buffer);
    }

    /// Rendered buffer for `name`, `None` if that filter produced nothing.
    pub fn select(&self, name: &str) -> Option<&PixelBuffer> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PixelBuffer)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Discard every entry and render `input` through `catalog` from scratch.
    pub fn rebuild(&mut self, input: &PixelBuffer, catalog: &FilterCatalog) -> SweepReport {
        let generation = self.generation.wrapping_add(1);
        let (mut cache, report) = render_sweep(input, catalog, generation);
        cache.set_generation(generation);
        *self = cache;
        report
    }
}

/// Run every filter in `catalog` over `input` and collect the successes.
pub fn render_all(input: &PixelBuffer, catalog: &FilterCatalog) -> RenderCache {
    render_sweep(input, catalog, 0).0
}

/// Pure lookup; absence means the filter failed for the current input.
pub fn select<'a>(cache: &'a RenderCache, name: &str) -> Option<&'a PixelBuffer> {
    cache.select(name)
}

/// [`render_all`] plus a per-filter report tagged with `generation`.
pub fn render_sweep(input: &PixelBuffer, catalog: &FilterCatalog, generation: u64) -> (RenderCache, SweepReport) {
    let started = Instant::now();
    let mut cache = RenderCache {
        entries: HashMap::with_capacity(catalog.len()),
        generation,
    };
    let mut report = SweepReport::new(generation, input.width(), input.height());

    for filter in catalog.iter() {
        let filter_start = Instant::now();
        let (outcome, output) = render_isolated(filter.as_ref(), input);
        let elapsed_ms = filter_start.elapsed().as_secs_f64() * 1000.0;
        log::debug!("filter '{}': {:?} in {:.1}ms", filter.name(), outcome, elapsed_ms);

        if let Some(buffer) = output {
            cache.insert(filter.name(), buffer);
        }
        report.push(filter.name(), outcome, elapsed_ms);
    }

    report.total_ms = started.elapsed().as_secs_f64() * 1000.0;
    log::info!(
        "sweep {} rendered {}/{} filters for {}x{} in {:.1}ms",
        generation,
        report.rendered_count(),
        catalog.len(),
        input.width(),
        input.height(),
        report.total_ms
    );
    (cache, report)
}

/// Call `filter.render` with panics turned into absence.
pub(crate) fn render_isolated(filter: &dyn Filter, input: &PixelBuffer) -> (FilterOutcome, Option<PixelBuffer>) {
    // The input is shared read-only; nothing a panicking filter did can be observed afterwards.
    match panic::catch_unwind(AssertUnwindSafe(|| filter.render(input))) {
        Ok(Some(buffer)) => (FilterOutcome::Rendered, Some(buffer)),
        Ok(None) => (FilterOutcome::Absent, None),
        Err(_) => {
            log::error!("filter '{}' panicked, recording as absent", filter.name());
            (FilterOutcome::Panicked, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::filter::IdentityFilter;

    struct Panicking;

    impl Filter for Panicking {
        fn name(&self) -> &str {
            "Panicking"
        }

        fn render(&self, _input: &PixelBuffer) -> Option<PixelBuffer> {
            panic!("model crashed")
        }
    }

    struct Never;

    impl Filter for Never {
        fn name(&self) -> &str {
            "Never"
        }

        fn render(&self, _input: &PixelBuffer) -> Option<PixelBuffer> {
            None
        }
    }

    fn solid(value: u8) -> PixelBuffer {
        PixelBuffer::from_fn(3, 3, |_, _| [255, value, value, value]).unwrap()
    }

    fn catalog() -> FilterCatalog {
        FilterCatalog::new()
            .with(IdentityFilter)
            .and_then(|c| c.with(Panicking))
            .and_then(|c| c.with(Never))
            .unwrap()
    }

    #[test]
    fn test_panicking_filter_is_isolated() {
        let input = solid(9);
        let (cache, report) = render_sweep(&input, &catalog(), 1);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.select("Normal"), Some(&input));
        assert_eq!(report.outcome("Panicking"), Some(FilterOutcome::Panicked));
        assert_eq!(report.outcome("Never"), Some(FilterOutcome::Absent));
        assert_eq!(report.filters.len(), 3);
    }

    #[test]
    fn test_select_missing_is_none() {
        let cache = render_all(&solid(1), &catalog());
        assert!(select(&cache, "Never").is_none());
        assert!(select(&cache, "does not exist").is_none());
    }

    #[test]
    fn test_rebuild_replaces_entries() {
        let catalog = catalog();
        let mut cache = RenderCache::new();
        cache.insert("Stale", solid(0));

        cache.rebuild(&solid(1), &catalog);
        assert!(!cache.contains("Stale"));
        assert_eq!(cache.generation(), 1);

        cache.rebuild(&solid(2), &catalog);
        assert_eq!(cache.select("Normal"), Some(&solid(2)));
        assert_eq!(cache.generation(), 2);
    }

    #[test]
    fn test_empty_catalog_gives_empty_cache() {
        let cache = render_all(&solid(5), &FilterCatalog::new());
        assert!(cache.is_empty());
    }
}
