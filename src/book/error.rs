//! Errors surfaced synchronously by draw, zoom and navigation

use crate::surface::SurfaceError;

#[derive(Debug, thiserror::Error)]
pub enum DrawError {
    #[error("invalid zoom mode '{0}', expected 'manual' or 'fitWidth'")]
    InvalidZoomMode(String),

    /// The page is not in the cache yet; wait for its `preload:image`
    #[error("page {index} has not finished loading")]
    PageNotLoaded { index: usize },

    #[error(
        "invalid zoom scale {0}, expected a value from {min} to {max}",
        min = super::zoom::MIN_SCALE,
        max = super::zoom::MAX_SCALE
    )]
    InvalidScale(f32),

    #[error("invalid viewport {width}x{height}")]
    InvalidViewport { width: f32, height: f32 },

    #[error("page {index} has no pixels")]
    EmptyPage { index: usize },

    #[error("surface: {0}")]
    Surface(#[from] SurfaceError),
}
