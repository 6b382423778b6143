// Export modules for use in tests and the binary
pub mod book;
pub mod geometry;
pub mod loader;
pub mod pages;
pub mod panic_handler;
pub mod preload;
pub mod settings;
pub mod surface;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export the reader facade
pub use book::{ComicBook, DisplayMode, DrawError, Layout, Side, ZoomMode};
pub use geometry::{Point, Rect, Size};
pub use loader::{ImageLoader, LoadError, PageImage, PageLoader, PageSource};
pub use preload::{EventKind, PreloadEvent, PreloadState, PreloadStatus, Preloader};
pub use settings::{Options, PartialOptions};
pub use surface::{Canvas, Surface, SurfaceError};
