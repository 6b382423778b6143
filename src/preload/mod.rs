//! Sequential page preloading with a ready threshold
//!
//! Loads page sources one at a time, in order, filling the page cache and
//! announcing progress through [`PreloadEvents`]. A consumer can start
//! drawing at `preload:ready` without waiting for the whole book.

mod cache;
mod events;

use std::cell::Cell;
use std::rc::Rc;

use log::{debug, info, warn};

use crate::loader::{LoadError, PageImage, PageLoader, PageSource};

pub use cache::PageCache;
pub use events::{EventKind, ListenerId, PreloadEvent, PreloadEvents};

/// Pages that must be loaded before the first draw
pub const DEFAULT_BUFFER_SIZE: usize = 4;

/// Extra attempts for a page that failed to load
pub const DEFAULT_RETRIES: u32 = 0;

/// Pipeline lifecycle; never returns to `Idle`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PreloadState {
    #[default]
    Idle,
    /// Loads in flight, ready threshold not met yet
    Loading,
    /// Ready threshold met, loads may still be in flight
    Ready,
    /// Every source settled
    Complete,
}

/// Snapshot of pipeline progress
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PreloadStatus {
    pub state: PreloadState,
    /// Pages loaded successfully
    pub loaded: usize,
    /// Pages skipped after failing
    pub failed: usize,
    pub total: usize,
}

/// Outcome of a finished run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PreloadSummary {
    pub loaded: usize,
    pub failed: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum PreloadError {
    #[error("no page sources to preload")]
    NoSources,

    #[error("preload already started")]
    AlreadyStarted,
}

/// The preload pipeline for one book.
///
/// Cloning is cheap and every clone shares the same cache, event bus and
/// status, so the future returned by [`Preloader::run`] can run alongside
/// a book that draws from the same cache.
#[derive(Clone, Debug)]
pub struct Preloader {
    sources: Rc<[PageSource]>,
    cache: PageCache,
    events: PreloadEvents,
    status: Rc<Cell<PreloadStatus>>,
    buffer_size: usize,
    retries: u32,
}

impl Preloader {
    pub fn new(sources: impl Into<Rc<[PageSource]>>) -> Result<Self, PreloadError> {
        let sources = sources.into();
        if sources.is_empty() {
            return Err(PreloadError::NoSources);
        }

        let total = sources.len();
        Ok(Self {
            sources,
            cache: PageCache::new(total),
            events: PreloadEvents::new(),
            status: Rc::new(Cell::new(PreloadStatus {
                total,
                ..PreloadStatus::default()
            })),
            buffer_size: DEFAULT_BUFFER_SIZE,
            retries: DEFAULT_RETRIES,
        })
    }

    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    #[must_use]
    pub fn sources(&self) -> &[PageSource] {
        &self.sources
    }

    #[must_use]
    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    #[must_use]
    pub fn events(&self) -> &PreloadEvents {
        &self.events
    }

    #[must_use]
    pub fn status(&self) -> PreloadStatus {
        self.status.get()
    }

    /// Loaded pages needed before `preload:ready`, clamped to the page count
    #[must_use]
    pub fn ready_threshold(&self) -> usize {
        self.buffer_size.min(self.sources.len())
    }

    /// Load every source in order.
    ///
    /// Each load is awaited before the next is issued. Failed sources are
    /// retried up to the configured count, then reported through
    /// `preload:error` and skipped; they never fail the run.
    pub async fn run<L: PageLoader>(&self, loader: &L) -> Result<PreloadSummary, PreloadError> {
        if self.status.get().state != PreloadState::Idle {
            return Err(PreloadError::AlreadyStarted);
        }

        let total = self.sources.len();
        let threshold = self.ready_threshold();
        info!("Preloading {total} pages (ready after {threshold})");

        self.update(|s| s.state = PreloadState::Loading);
        self.events.emit(&PreloadEvent::Start { total });

        for (index, source) in self.sources.iter().enumerate() {
            match self.load_with_retries(loader, index, source).await {
                Ok(image) => {
                    let page = Rc::new(image);
                    let inserted = self.cache.insert(index, Rc::clone(&page));
                    debug_assert!(inserted, "page {index} was already cached");
                    if !inserted {
                        continue;
                    }
                    self.update(|s| s.loaded += 1);
                    debug!("Loaded page {index}: {source}");
                    self.events.emit(&PreloadEvent::Image { index, page });
                }
                Err(error) => {
                    self.update(|s| s.failed += 1);
                    warn!("Skipping page {index} ({source}): {error}");
                    self.events.emit(&PreloadEvent::Error {
                        index,
                        source: source.clone(),
                        error: Rc::new(error),
                    });
                }
            }

            self.maybe_signal_ready(threshold);
        }

        let PreloadStatus { loaded, failed, .. } = self.status.get();
        self.update(|s| s.state = PreloadState::Complete);
        info!("Preload finished: {loaded} loaded, {failed} failed");
        self.events.emit(&PreloadEvent::Finish { loaded, failed });

        Ok(PreloadSummary { loaded, failed })
    }

    async fn load_with_retries<L: PageLoader>(
        &self,
        loader: &L,
        index: usize,
        source: &PageSource,
    ) -> Result<PageImage, LoadError> {
        let mut attempt = 0;
        loop {
            match loader.load(source).await {
                Ok(image) => return Ok(image),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    debug!("Retrying page {index} ({attempt}/{}): {e}", self.retries);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fire `preload:ready` once the loaded count meets the threshold.
    ///
    /// Skipped pages lower the reachable threshold so a book with failures
    /// still becomes ready once every page that can load has loaded.
    fn maybe_signal_ready(&self, threshold: usize) {
        let status = self.status.get();
        if status.state != PreloadState::Loading {
            return;
        }

        let reachable = threshold.min(status.total - status.failed);
        if status.loaded > 0 && status.loaded >= reachable {
            self.update(|s| s.state = PreloadState::Ready);
            info!("Ready to render with {} pages loaded", status.loaded);
            self.events.emit(&PreloadEvent::Ready {
                loaded: status.loaded,
            });
        }
    }

    fn update(&self, f: impl FnOnce(&mut PreloadStatus)) {
        let mut status = self.status.get();
        f(&mut status);
        self.status.set(status);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::test_utils::{EventLog, ScriptedLoader};

    fn sources(n: usize) -> Vec<PageSource> {
        (0..n).map(|i| PageSource::new(format!("page-{i}"))).collect()
    }

    #[test]
    fn empty_source_list_is_rejected() {
        assert!(matches!(
            Preloader::new(Vec::<PageSource>::new()),
            Err(PreloadError::NoSources)
        ));
    }

    #[test]
    fn ready_fires_after_buffer_fills() {
        let preloader = Preloader::new(sources(5)).unwrap();
        let log = EventLog::attach(preloader.events());

        let summary = smol::block_on(preloader.run(&ScriptedLoader::new())).unwrap();

        assert_eq!(summary, PreloadSummary { loaded: 5, failed: 0 });
        assert_eq!(
            log.entries(),
            [
                "start", "image:0", "image:1", "image:2", "image:3", "ready", "image:4",
                "finish"
            ]
        );
        assert_eq!(preloader.status().state, PreloadState::Complete);
        assert_eq!(preloader.cache().loaded(), 5);
    }

    #[test]
    fn buffer_is_clamped_to_page_count() {
        let preloader = Preloader::new(sources(2)).unwrap();
        let log = EventLog::attach(preloader.events());
        assert_eq!(preloader.ready_threshold(), 2);

        smol::block_on(preloader.run(&ScriptedLoader::new())).unwrap();

        assert_eq!(
            log.entries(),
            ["start", "image:0", "image:1", "ready", "finish"]
        );
    }

    #[test]
    fn failed_page_is_skipped_and_reported() {
        let preloader = Preloader::new(sources(3)).unwrap();
        let log = EventLog::attach(preloader.events());
        let loader = ScriptedLoader::new().failing("page-1");

        let summary = smol::block_on(preloader.run(&loader)).unwrap();

        assert_eq!(summary, PreloadSummary { loaded: 2, failed: 1 });
        // Threshold of 3 drops to the 2 pages that can load
        assert_eq!(
            log.entries(),
            ["start", "image:0", "error:1", "image:2", "ready", "finish"]
        );
        assert!(!preloader.cache().contains(1));
    }

    #[test]
    fn all_failures_never_become_ready() {
        let preloader = Preloader::new(sources(2)).unwrap();
        let log = EventLog::attach(preloader.events());
        let loader = ScriptedLoader::new().failing("page-0").failing("page-1");

        let summary = smol::block_on(preloader.run(&loader)).unwrap();

        assert_eq!(summary, PreloadSummary { loaded: 0, failed: 2 });
        assert_eq!(log.entries(), ["start", "error:0", "error:1", "finish"]);
        assert_eq!(preloader.status().state, PreloadState::Complete);
    }

    #[test]
    fn retries_recover_flaky_page() {
        let preloader = Preloader::new(sources(2)).unwrap().with_retries(2);
        let loader = ScriptedLoader::new().flaky("page-0", 2);

        let summary = smol::block_on(preloader.run(&loader)).unwrap();

        assert_eq!(summary, PreloadSummary { loaded: 2, failed: 0 });
        assert_eq!(loader.attempts("page-0"), 3);
    }

    #[test]
    fn without_retries_flaky_page_fails_once() {
        let preloader = Preloader::new(sources(1)).unwrap();
        let loader = ScriptedLoader::new().flaky("page-0", 1);

        let summary = smol::block_on(preloader.run(&loader)).unwrap();

        assert_eq!(summary, PreloadSummary { loaded: 0, failed: 1 });
        assert_eq!(loader.attempts("page-0"), 1);
    }

    #[test]
    fn second_run_is_refused() {
        let preloader = Preloader::new(sources(1)).unwrap();
        let loader = ScriptedLoader::new();

        smol::block_on(preloader.run(&loader)).unwrap();
        let again = smol::block_on(preloader.run(&loader));

        assert!(matches!(again, Err(PreloadError::AlreadyStarted)));
    }

    #[test]
    fn loads_are_issued_one_at_a_time() {
        let preloader = Preloader::new(sources(4)).unwrap();
        let loader = ScriptedLoader::new();

        smol::block_on(preloader.run(&loader)).unwrap();

        assert_eq!(loader.max_in_flight(), 1);
        assert_eq!(
            loader.requested(),
            ["page-0", "page-1", "page-2", "page-3"]
        );
    }

    #[test]
    fn status_tracks_progress_while_loading() {
        let preloader = Preloader::new(sources(3)).unwrap().with_buffer_size(1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = seen.clone();
            let watcher = preloader.clone();
            preloader.events().on(EventKind::Image, move |_| {
                seen.borrow_mut().push(watcher.status().state);
            });
        }

        smol::block_on(preloader.run(&ScriptedLoader::new())).unwrap();

        // Ready is signalled after the image notification that met the threshold
        assert_eq!(
            *seen.borrow(),
            [
                PreloadState::Loading,
                PreloadState::Ready,
                PreloadState::Ready
            ]
        );
    }

    #[test]
    fn loaded_count_matches_cache() {
        let preloader = Preloader::new(sources(4)).unwrap();
        let loader = ScriptedLoader::new().failing("page-2");

        let summary = smol::block_on(preloader.run(&loader)).unwrap();

        assert_eq!(summary.loaded, preloader.cache().loaded());
        assert_eq!(preloader.status().loaded, preloader.cache().loaded());
        assert!(!preloader.cache().contains(2));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "page 0 was already cached")]
    fn refilling_a_cached_slot_is_caught() {
        let preloader = Preloader::new(sources(2)).unwrap();
        let stale = PageImage::new(PageSource::from("stale"), image::RgbaImage::new(1, 1));
        assert!(preloader.cache().insert(0, Rc::new(stale)));

        let _ = smol::block_on(preloader.run(&ScriptedLoader::new()));
    }
}
