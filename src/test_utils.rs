//! Test doubles shared by unit and integration tests

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use image::{Rgba, RgbaImage};

use crate::geometry::{Rect, Size};
use crate::loader::{LoadError, PageImage, PageLoader, PageSource};
use crate::preload::{EventKind, PreloadEvent, PreloadEvents};
use crate::surface::{Surface, SurfaceError};

/// One-pixel GIFs in five shades of grey, lightest last
pub const PLACEHOLDER_PAGES: [&str; 5] = [
    "data:image/gif;base64,R0lGODlhAQABAPAAAKqqqv///yH5BAAAAAAALAAAAAABAAEAAAICRAEAOw==",
    "data:image/gif;base64,R0lGODlhAQABAPAAALu7u////yH5BAAAAAAALAAAAAABAAEAAAICRAEAOw==",
    "data:image/gif;base64,R0lGODlhAQABAPAAAMzMzP///yH5BAAAAAAALAAAAAABAAEAAAICRAEAOw==",
    "data:image/gif;base64,R0lGODlhAQABAPAAAN3d3f///yH5BAAAAAAALAAAAAABAAEAAAICRAEAOw==",
    "data:image/gif;base64,R0lGODlhAQABAPAAAO7u7v///yH5BAAAAAAALAAAAAABAAEAAAICRAEAOw==",
];

/// Grey level of each entry in [`PLACEHOLDER_PAGES`]
pub const PLACEHOLDER_SHADES: [u8; 5] = [0xaa, 0xbb, 0xcc, 0xdd, 0xee];

pub fn placeholder_sources() -> Vec<PageSource> {
    PLACEHOLDER_PAGES.iter().map(|s| PageSource::from(*s)).collect()
}

/// Loader that fabricates solid pages and fails on cue.
///
/// Every load yields once to the executor before settling, so a caller that
/// issued loads concurrently would show up in [`ScriptedLoader::max_in_flight`].
#[derive(Debug)]
pub struct ScriptedLoader {
    page_size: (u32, u32),
    color: Rgba<u8>,
    failing: HashSet<String>,
    flaky: HashMap<String, usize>,
    empty: HashSet<String>,
    attempts: RefCell<HashMap<String, usize>>,
    requested: RefCell<Vec<String>>,
    in_flight: Cell<usize>,
    max_in_flight: Cell<usize>,
}

impl Default for ScriptedLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedLoader {
    pub fn new() -> Self {
        Self {
            page_size: (40, 60),
            color: Rgba([0x80, 0x80, 0x80, 0xff]),
            failing: HashSet::new(),
            flaky: HashMap::new(),
            empty: HashSet::new(),
            attempts: RefCell::new(HashMap::new()),
            requested: RefCell::new(Vec::new()),
            in_flight: Cell::new(0),
            max_in_flight: Cell::new(0),
        }
    }

    pub fn with_page_size(mut self, width: u32, height: u32) -> Self {
        self.page_size = (width, height);
        self
    }

    pub fn with_color(mut self, color: Rgba<u8>) -> Self {
        self.color = color;
        self
    }

    /// Every load of `source` fails
    pub fn failing(mut self, source: &str) -> Self {
        self.failing.insert(source.to_string());
        self
    }

    /// The first `failures` loads of `source` fail
    pub fn flaky(mut self, source: &str, failures: usize) -> Self {
        self.flaky.insert(source.to_string(), failures);
        self
    }

    /// `source` loads as a zero-sized image
    pub fn empty(mut self, source: &str) -> Self {
        self.empty.insert(source.to_string());
        self
    }

    pub fn attempts(&self, source: &str) -> usize {
        self.attempts.borrow().get(source).copied().unwrap_or(0)
    }

    /// Every load request in the order it was issued, retries included
    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.get()
    }
}

impl PageLoader for ScriptedLoader {
    async fn load(&self, source: &PageSource) -> Result<PageImage, LoadError> {
        let name = source.as_str().to_string();
        self.requested.borrow_mut().push(name.clone());
        let attempt = {
            let mut attempts = self.attempts.borrow_mut();
            let count = attempts.entry(name.clone()).or_default();
            *count += 1;
            *count
        };

        self.in_flight.set(self.in_flight.get() + 1);
        self.max_in_flight
            .set(self.max_in_flight.get().max(self.in_flight.get()));
        smol::future::yield_now().await;
        self.in_flight.set(self.in_flight.get() - 1);

        let flaky = self.flaky.get(&name).is_some_and(|&n| attempt <= n);
        if self.failing.contains(&name) || flaky {
            return Err(LoadError::Io {
                path: PathBuf::from(&name),
                source: io::Error::other(format!("scripted failure #{attempt}")),
            });
        }

        let (width, height) = if self.empty.contains(&name) {
            (0, 0)
        } else {
            self.page_size
        };
        Ok(PageImage::new(
            source.clone(),
            RgbaImage::from_pixel(width, height, self.color),
        ))
    }
}

/// A draw call seen by [`RecordingSurface`]
#[derive(Clone, Debug, PartialEq)]
pub struct DrawRecord {
    pub source: String,
    pub rect: Rect,
}

/// Surface that records draw calls instead of rasterising.
///
/// Like a real surface, a resize wipes what was drawn, so [`draws`] holds
/// only what is currently on the surface.
///
/// [`draws`]: RecordingSurface::draws
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    viewport: Size,
    size: Size,
    draws: Vec<DrawRecord>,
    resizes: Vec<Size>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        let viewport = Size::new(width, height);
        Self {
            viewport,
            size: viewport,
            ..Self::default()
        }
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn resizes(&self) -> &[Size] {
        &self.resizes
    }

    pub fn clear(&mut self) {
        self.draws.clear();
        self.resizes.clear();
    }
}

impl Surface for RecordingSurface {
    fn viewport(&self) -> Size {
        self.viewport
    }

    fn size(&self) -> Size {
        self.size
    }

    fn resize(&mut self, size: Size) -> Result<(), SurfaceError> {
        self.size = size;
        self.resizes.push(size);
        self.draws.clear();
        Ok(())
    }

    fn draw_image(&mut self, page: &PageImage, rect: Rect) -> Result<(), SurfaceError> {
        self.draws.push(DrawRecord {
            source: page.source().as_str().to_string(),
            rect,
        });
        Ok(())
    }
}

/// Records every preload notification as a short string.
///
/// Entries look like `start`, `image:0`, `ready`, `error:2`, `finish`.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    entries: Rc<RefCell<Vec<String>>>,
    image_sources: Rc<RefCell<Vec<String>>>,
}

impl EventLog {
    /// Subscribe to every channel of `events`
    pub fn attach(events: &PreloadEvents) -> Self {
        let log = Self::default();
        for kind in EventKind::ALL {
            let log = log.clone();
            events.on(kind, move |event| log.record(event));
        }
        log
    }

    fn record(&self, event: &PreloadEvent) {
        let entry = match event {
            PreloadEvent::Image { index, page } => {
                self.image_sources
                    .borrow_mut()
                    .push(page.source().as_str().to_string());
                format!("image:{index}")
            }
            PreloadEvent::Error { index, .. } => format!("error:{index}"),
            other => other
                .kind()
                .name()
                .trim_start_matches("preload:")
                .to_string(),
        };
        self.entries.borrow_mut().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    /// Sources of the pages announced by `preload:image`, in order
    pub fn image_sources(&self) -> Vec<String> {
        self.image_sources.borrow().clone()
    }
}
