//! Drawable surfaces the book renders onto

mod canvas;

use crate::geometry::{Rect, Size};
use crate::loader::PageImage;

pub use canvas::Canvas;

/// Errors from scaling or compositing a page
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("failed to scale page to {width}x{height}: {detail}")]
    Scale {
        width: u32,
        height: u32,
        detail: String,
    },

    #[error("{width}x{height} frame exceeds the {limit} pixel budget")]
    TooLarge { width: u32, height: u32, limit: u64 },

    #[error("failed to save frame: {0}")]
    Save(#[from] image::ImageError),
}

/// A surface the layout engine can size and draw pages onto.
///
/// The viewport is the visible area of the hosting window; the surface
/// itself may be resized beyond it when zoomed content is larger.
pub trait Surface {
    /// Visible area of the hosting window
    fn viewport(&self) -> Size;

    /// Current drawing surface size
    fn size(&self) -> Size;

    /// Resize the drawing surface, clearing it to the background.
    ///
    /// A surface that cannot hold `size` refuses it and keeps its frame.
    fn resize(&mut self, size: Size) -> Result<(), SurfaceError>;

    /// Draw a page scaled into `rect`
    fn draw_image(&mut self, page: &PageImage, rect: Rect) -> Result<(), SurfaceError>;

    /// Bounds of the drawing surface, used to resolve clicks
    fn bounds(&self) -> Rect {
        Rect::from_size(self.size())
    }
}
