//! Layout and draw engine
//!
//! [`ComicBook`] ties a [`Preloader`] to a [`Surface`]: the pipeline fills
//! the shared page cache while the book lays out and draws the spread at the
//! current pointer. View changes go through [`ViewState::apply`] and the
//! resulting effects are executed here.

mod error;
pub mod layout;
pub mod navigation;
mod state;
mod zoom;

use std::rc::Rc;

use log::debug;

use crate::geometry::{Point, Rect};
use crate::loader::PageSource;
use crate::preload::{
    EventKind, ListenerId, PageCache, PreloadError, PreloadEvent, PreloadStatus, Preloader,
};
use crate::settings::Options;
use crate::surface::Surface;

pub use error::DrawError;
pub use layout::{Layout, LayoutRequest};
pub use navigation::Side;
pub use state::{Command, Effect, ViewState};
pub use zoom::{DisplayMode, MAX_SCALE, MIN_SCALE, ZoomMode, fit_width_scale, is_valid_scale};

/// A book of pages drawn onto a surface
pub struct ComicBook<S: Surface> {
    preloader: Preloader,
    view: ViewState,
    options: Options,
    surface: S,
}

impl<S: Surface> ComicBook<S> {
    /// Create a book over `sources`; nothing is loaded until the preloader runs
    pub fn new(
        sources: impl Into<Rc<[PageSource]>>,
        options: Options,
        surface: S,
    ) -> Result<Self, PreloadError> {
        let preloader = Preloader::new(sources)?
            .with_buffer_size(options.buffer_size)
            .with_retries(options.retries);
        let view = ViewState::new(preloader.sources().len(), &options);

        Ok(Self {
            preloader,
            view,
            options,
            surface,
        })
    }

    /// Subscribe to a preload notification channel
    pub fn on(&self, kind: EventKind, listener: impl Fn(&PreloadEvent) + 'static) -> ListenerId {
        self.preloader.events().on(kind, listener)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.preloader.events().off(id)
    }

    /// A handle to the pipeline feeding this book's cache.
    ///
    /// Run it with any executor; the returned future does not borrow the book.
    #[must_use]
    pub fn preloader(&self) -> Preloader {
        self.preloader.clone()
    }

    #[must_use]
    pub fn status(&self) -> PreloadStatus {
        self.preloader.status()
    }

    #[must_use]
    pub fn cache(&self) -> &PageCache {
        self.preloader.cache()
    }

    #[must_use]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.view.page_count
    }

    #[must_use]
    pub fn current_page(&self) -> usize {
        self.view.pointer
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Lay out and draw the spread at the pointer.
    ///
    /// Fails with [`DrawError::PageNotLoaded`] if the leading page is not in
    /// the cache. In double mode the following page is drawn only if loaded.
    pub fn draw(&mut self) -> Result<Layout, DrawError> {
        let index = self.view.pointer;
        let cache = self.preloader.cache();
        let page = cache.get(index).ok_or(DrawError::PageNotLoaded { index })?;
        let next = self
            .view
            .trailing_index()
            .and_then(|i| cache.get(i).map(|p| (i, p)));

        if page.width() == 0 || page.height() == 0 {
            return Err(DrawError::EmptyPage { index });
        }
        if let Some((i, p)) = &next {
            if p.width() == 0 || p.height() == 0 {
                return Err(DrawError::EmptyPage { index: *i });
            }
        }

        let layout = layout::compute(&LayoutRequest {
            page: page.size(),
            next: next.as_ref().map(|(_, p)| p.size()),
            display_mode: self.view.display_mode,
            zoom_mode: &self.view.zoom_mode,
            scale: self.view.scale,
            viewport: self.surface.viewport(),
        })?;

        self.surface.resize(layout.surface)?;
        self.surface.draw_image(&page, layout.leading)?;
        if let (Some((_, next_page)), Some(rect)) = (&next, layout.trailing) {
            self.surface.draw_image(next_page, rect)?;
        }

        debug!(
            "Drew page {index}{} at zoom {:.3} on {}x{} surface",
            next.as_ref()
                .map(|(i, _)| format!("+{i}"))
                .unwrap_or_default(),
            layout.zoom_scale,
            layout.surface.width,
            layout.surface.height
        );
        Ok(layout)
    }

    /// Switch to manual zoom at `scale`.
    ///
    /// Redraws only if the current page is already loaded; returns whether
    /// a draw happened.
    pub fn zoom(&mut self, scale: f32) -> Result<bool, DrawError> {
        if !is_valid_scale(scale) {
            return Err(DrawError::InvalidScale(scale));
        }
        self.apply_command(Command::SetScale(scale))
    }

    /// Move one page forward; returns false at the last page
    pub fn advance(&mut self) -> Result<bool, DrawError> {
        self.apply_command(Command::Advance)
    }

    /// Move one page back; returns false at the first page
    pub fn retreat(&mut self) -> Result<bool, DrawError> {
        self.apply_command(Command::Retreat)
    }

    /// Jump to `index`, clamped to the last page
    pub fn go_to_page(&mut self, index: usize) -> Result<bool, DrawError> {
        self.apply_command(Command::GoToPage(index))
    }

    /// Turn the page according to which half of `bounds` was clicked
    pub fn navigate(&mut self, click: Point, bounds: Rect) -> Result<Side, DrawError> {
        let side = navigation::side_of(click.x, bounds);
        match side {
            Side::Left => self.retreat()?,
            Side::Right => self.advance()?,
        };
        Ok(side)
    }

    /// Redraw after the surface's viewport changed
    pub fn redraw_on_resize(&mut self) -> Result<bool, DrawError> {
        self.apply_command(Command::Resize)
    }

    /// Apply a view command and run its effects; returns whether a draw happened
    pub fn apply_command(&mut self, cmd: Command) -> Result<bool, DrawError> {
        let effects = self.view.apply(cmd);
        self.execute_effects(effects)
    }

    fn execute_effects(&mut self, effects: Vec<Effect>) -> Result<bool, DrawError> {
        let mut drawn = false;
        for effect in effects {
            match effect {
                Effect::Redraw => {
                    self.draw()?;
                    drawn = true;
                }

                Effect::RedrawIfLoaded => {
                    if self.cache().contains(self.view.pointer) {
                        self.draw()?;
                        drawn = true;
                    } else {
                        debug!(
                            "Page {} not loaded yet, deferring redraw",
                            self.view.pointer
                        );
                    }
                }
            }
        }
        Ok(drawn)
    }
}

impl<S: Surface> std::fmt::Debug for ComicBook<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComicBook")
            .field("view", &self.view)
            .field("status", &self.preloader.status())
            .finish_non_exhaustive()
    }
}
