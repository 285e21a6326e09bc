//! # Render Session Management
//!
//! Runs render sweeps off the caller's thread. A [`RenderSession`] owns the
//! filter catalog and the normalizer; [`RenderSession::spawn`] moves it into a
//! worker task and returns a [`RenderHandle`] for submitting photos and
//! reading results.
//!
//! ## Worker Model
//!
//! - One worker task per session owns the [`RenderCache`]; nothing else writes it
//! - Requests go through a single slot. A new submission replaces a pending one
//! - Every submission gets a generation number. A sweep that is overtaken by a
//!   newer submission is abandoned between filters and never published
//! - Each filter runs on the blocking pool, optionally under a time limit.
//!   A timed-out or panicking filter is recorded as absent
//!
//! ## Example
//!
//! ```rust,no_run
//! use gram::{BitmapImage, RenderSession};
//!
//! # async fn example() -> gram::GramResult<()> {
//! let handle = RenderSession::builder().build()?.spawn();
//! let photo = BitmapImage::open("photo.jpg")?;
//! let generation = handle.submit_image(&photo)?;
//! let output = handle.wait_for(generation).await?;
//! println!("rendered: {:?}", output.report.rendered().collect::<Vec<_>>());
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::GramConfig;
use crate::core::{BitmapImage, PixelBuffer};
use crate::error::{GramError, GramResult};
use crate::inference::{ModelLoader, RegistryLoader};
use crate::processing::render::render_isolated;
use crate::processing::{Filter, FilterCatalog, FilterOutcome, Normalizer, RenderCache, SweepReport};

/// Result of the latest completed sweep.
#[derive(Debug, Clone, Default)]
pub struct RenderOutput {
    /// Generation of the submission this output belongs to; 0 before the first sweep.
    pub generation: u64,
    /// The buffer the filters received.
    pub input: Option<PixelBuffer>,
    pub cache: RenderCache,
    pub report: SweepReport,
}

#[derive(Debug, Clone)]
struct RenderRequest {
    generation: u64,
    buffer: PixelBuffer,
}

/// Filter catalog plus input preparation, ready to be spawned.
pub struct RenderSession {
    catalog: FilterCatalog,
    normalizer: Normalizer,
    filter_timeout: Option<Duration>,
}

impl RenderSession {
    pub fn builder() -> RenderSessionBuilder {
        RenderSessionBuilder::new()
    }

    pub fn catalog(&self) -> &FilterCatalog {
        &self.catalog
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Start the worker task. Must be called from within a Tokio runtime.
    pub fn spawn(self) -> RenderHandle {
        let generation = Arc::new(AtomicU64::new(0));
        let (request_tx, request_rx) = watch::channel(None);
        let (result_tx, result_rx) = watch::channel(Arc::new(RenderOutput::default()));

        let worker = Worker {
            catalog: self.catalog.clone(),
            filter_timeout: self.filter_timeout,
            current: Arc::clone(&generation),
        };
        let task = tokio::spawn(worker.run(request_rx, result_tx));

        RenderHandle {
            requests: request_tx,
            results: result_rx,
            generation,
            catalog: self.catalog,
            normalizer: self.normalizer,
            worker: task,
        }
    }
}

/// Fluent configuration for [`RenderSession`].
pub struct RenderSessionBuilder {
    config: GramConfig,
    catalog: Option<FilterCatalog>,
    loader: Option<Arc<dyn ModelLoader>>,
}

impl Default for RenderSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSessionBuilder {
    pub fn new() -> Self {
        Self {
            config: GramConfig::default(),
            catalog: None,
            loader: None,
        }
    }

    pub fn with_config(mut self, config: GramConfig) -> Self {
        self.config = config;
        self
    }

    /// Use the standard catalog with models from `loader`.
    pub fn with_loader(mut self, loader: Arc<dyn ModelLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Use a custom catalog instead of the standard one.
    pub fn with_catalog(mut self, catalog: FilterCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_filter_timeout(mut self, timeout: Duration) -> Self {
        self.config.filter_timeout_ms = Some(timeout.as_millis().max(1) as u64);
        self
    }

    pub fn build(self) -> GramResult<RenderSession> {
        self.config.validate()?;
        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => {
                let loader = match self.loader {
                    Some(loader) => loader,
                    None => default_loader(&self.config),
                };
                FilterCatalog::standard(loader)
            }
        };
        if catalog.is_empty() {
            return Err(GramError::config("catalog", "[]", "at least one filter is required"));
        }
        log::info!(
            "render session: {} filters {:?}, target {}x{}",
            catalog.len(),
            catalog.names(),
            self.config.target_size,
            self.config.target_size
        );
        Ok(RenderSession {
            catalog,
            normalizer: self.config.to_normalizer(),
            filter_timeout: self.config.filter_timeout(),
        })
    }
}

/// Loader implied by the configuration when none was given.
pub fn default_loader(config: &GramConfig) -> Arc<dyn ModelLoader> {
    #[cfg(feature = "onnx")]
    {
        if let Some(dir) = &config.models_dir {
            return Arc::new(crate::inference::OnnxModelLoader::new(
                dir.clone(),
                gram_scale::plan::Size::square(config.target_size),
            ));
        }
    }
    if config.models_dir.is_some() {
        log::warn!("models_dir is set but the onnx feature is disabled; style filters will be absent");
    } else {
        log::warn!("no models configured; only the identity filter will render");
    }
    Arc::new(RegistryLoader::new())
}

/// Client side of a running session.
pub struct RenderHandle {
    requests: watch::Sender<Option<RenderRequest>>,
    results: watch::Receiver<Arc<RenderOutput>>,
    generation: Arc<AtomicU64>,
    catalog: FilterCatalog,
    normalizer: Normalizer,
    worker: JoinHandle<()>,
}

impl RenderHandle {
    pub fn catalog(&self) -> &FilterCatalog {
        &self.catalog
    }

    /// Queue `buffer` for rendering, superseding anything not yet published.
    pub fn submit_buffer(&self, buffer: PixelBuffer) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("submitting generation {} ({}x{})", generation, buffer.width(), buffer.height());
        self.requests.send_replace(Some(RenderRequest { generation, buffer }));
        generation
    }

    /// Picker path: normalize `image` and queue it.
    pub fn submit_image(&self, image: &BitmapImage) -> GramResult<u64> {
        let buffer = self.normalizer.prepare(image)?;
        Ok(self.submit_buffer(buffer))
    }

    /// Placeholder path: resize only, then queue.
    pub fn submit_placeholder(&self, image: &BitmapImage) -> GramResult<u64> {
        let buffer = self.normalizer.prepare_placeholder(image)?;
        Ok(self.submit_buffer(buffer))
    }

    /// Most recently published output.
    pub fn latest(&self) -> Arc<RenderOutput> {
        Arc::clone(&self.results.borrow())
    }

    /// Wait until a sweep at or after `generation` is published.
    pub async fn wait_for(&self, generation: u64) -> GramResult<Arc<RenderOutput>> {
        let mut results = self.results.clone();
        let output = results
            .wait_for(|output| output.generation >= generation)
            .await
            .map_err(|_| GramError::session("render worker stopped"))?;
        Ok(Arc::clone(&output))
    }

    /// Receiver notified on every published sweep.
    pub fn subscribe(&self) -> watch::Receiver<Arc<RenderOutput>> {
        self.results.clone()
    }

    /// Stop the worker after any in-flight sweep finishes.
    pub async fn shutdown(self) -> GramResult<()> {
        let RenderHandle { requests, worker, .. } = self;
        drop(requests);
        worker
            .await
            .map_err(|e| GramError::session(format!("render worker failed: {}", e)))
    }
}

struct Worker {
    catalog: FilterCatalog,
    filter_timeout: Option<Duration>,
    current: Arc<AtomicU64>,
}

impl Worker {
    async fn run(
        self,
        mut requests: watch::Receiver<Option<RenderRequest>>,
        results: watch::Sender<Arc<RenderOutput>>,
    ) {
        while requests.changed().await.is_ok() {
            let Some(request) = requests.borrow_and_update().clone() else {
                continue;
            };
            if let Some(output) = self.sweep(request).await {
                results.send_replace(Arc::new(output));
            }
        }
        log::debug!("render worker exiting");
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.current.load(Ordering::SeqCst) != generation
    }

    async fn sweep(&self, request: RenderRequest) -> Option<RenderOutput> {
        let RenderRequest { generation, buffer } = request;
        let started = Instant::now();
        let mut cache = RenderCache::new();
        cache.set_generation(generation);
        let mut report = SweepReport::new(generation, buffer.width(), buffer.height());

        for filter in self.catalog.iter() {
            if self.is_stale(generation) {
                log::debug!("sweep {} superseded, discarding", generation);
                return None;
            }
            let filter_start = Instant::now();
            let (outcome, output) = run_filter(Arc::clone(filter), buffer.clone(), self.filter_timeout).await;
            let elapsed_ms = filter_start.elapsed().as_secs_f64() * 1000.0;
            log::debug!("filter '{}': {:?} in {:.1}ms", filter.name(), outcome, elapsed_ms);

            if let Some(rendered) = output {
                cache.insert(filter.name(), rendered);
            }
            report.push(filter.name(), outcome, elapsed_ms);
        }

        if self.is_stale(generation) {
            log::debug!("sweep {} superseded, discarding", generation);
            return None;
        }
        report.total_ms = started.elapsed().as_secs_f64() * 1000.0;
        log::info!(
            "sweep {} rendered {}/{} filters in {:.1}ms",
            generation,
            report.rendered_count(),
            self.catalog.len(),
            report.total_ms
        );
        Some(RenderOutput {
            generation,
            input: Some(buffer),
            cache,
            report,
        })
    }
}

async fn run_filter(
    filter: Arc<dyn Filter>,
    input: PixelBuffer,
    limit: Option<Duration>,
) -> (FilterOutcome, Option<PixelBuffer>) {
    let name = filter.name().to_string();
    let task = tokio::task::spawn_blocking(move || render_isolated(filter.as_ref(), &input));
    let joined = match limit {
        Some(limit) => match tokio::time::timeout(limit, task).await {
            Ok(joined) => joined,
            Err(_) => {
                let err = GramError::timeout(format!("filter '{}'", name), limit.as_millis() as u64);
                log::warn!("{}, recording as absent", err);
                return (FilterOutcome::TimedOut, None);
            }
        },
        None => task.await,
    };
    joined.unwrap_or_else(|e| {
        log::error!("filter '{}' task failed: {}", name, e);
        (FilterOutcome::Panicked, None)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::IdentityFilter;

    struct Sleepy(Duration);

    impl Filter for Sleepy {
        fn name(&self) -> &str {
            "Sleepy"
        }

        fn render(&self, input: &PixelBuffer) -> Option<PixelBuffer> {
            std::thread::sleep(self.0);
            Some(input.clone())
        }
    }

    fn solid(value: u8) -> PixelBuffer {
        PixelBuffer::from_fn(2, 2, |_, _| [255, value, value, value]).unwrap()
    }

    #[tokio::test]
    async fn test_sweep_publishes_generation() {
        let handle = RenderSession::builder().build().unwrap().spawn();
        assert_eq!(handle.latest().generation, 0);

        let generation = handle.submit_buffer(solid(7));
        let output = handle.wait_for(generation).await.unwrap();
        assert_eq!(output.generation, generation);
        assert_eq!(output.cache.select("Normal"), Some(&solid(7)));
        assert_eq!(output.report.filters.len(), 6);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_timeout_records_absent() {
        let catalog = FilterCatalog::new()
            .with(IdentityFilter)
            .and_then(|c| c.with(Sleepy(Duration::from_millis(300))))
            .unwrap();
        let handle = RenderSession::builder()
            .with_catalog(catalog)
            .with_filter_timeout(Duration::from_millis(20))
            .build()
            .unwrap()
            .spawn();

        let generation = handle.submit_buffer(solid(1));
        let output = handle.wait_for(generation).await.unwrap();
        assert!(output.cache.contains("Normal"));
        assert!(!output.cache.contains("Sleepy"));
        assert_eq!(output.report.outcome("Sleepy"), Some(FilterOutcome::TimedOut));
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let config = GramConfig {
            target_size: 0,
            ..GramConfig::default()
        };
        assert!(RenderSession::builder().with_config(config).build().is_err());
        assert!(RenderSession::builder().with_catalog(FilterCatalog::new()).build().is_err());
    }
}
