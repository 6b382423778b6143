//! Page sources, decoded page images and the image-loading primitive

mod source;
mod worker;

use std::future::Future;
use std::path::PathBuf;
use std::rc::Rc;

use image::RgbaImage;

use crate::geometry::Size;

pub use source::{PageSource, SourceKind};
pub use worker::{ImageLoader, decode_page};

/// Shared handle to a loaded page, held by the cache and handed to listeners
pub type PageHandle = Rc<PageImage>;

/// A decoded page ready to be drawn
#[derive(Clone)]
pub struct PageImage {
    source: PageSource,
    pixels: RgbaImage,
}

impl PageImage {
    #[must_use]
    pub fn new(source: PageSource, pixels: RgbaImage) -> Self {
        Self { source, pixels }
    }

    /// The identifier this page was loaded from
    #[must_use]
    pub fn source(&self) -> &PageSource {
        &self.source
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Native page size in pixels
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width() as f32, self.height() as f32)
    }

    #[must_use]
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

impl std::fmt::Debug for PageImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageImage")
            .field("source", &self.source.display_name())
            .field("width", &self.width())
            .field("height", &self.height())
            .finish_non_exhaustive()
    }
}

/// Why a single page could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("unsupported source scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("malformed data URI: {0}")]
    InvalidDataUri(String),

    #[error("image decode worker is not running")]
    WorkerUnavailable,
}

/// Asynchronous image-loading primitive.
///
/// Each call resolves to either a decoded page or a failure for that one
/// source. The preload pipeline never issues a second call before the
/// previous one resolved.
pub trait PageLoader {
    fn load(&self, source: &PageSource) -> impl Future<Output = Result<PageImage, LoadError>>;
}
