//! Raster surface backed by an RGBA frame

use std::num::NonZeroU32;
use std::path::Path;

use fast_image_resize as fr;
use image::{ImageFormat, Rgba, RgbaImage, imageops};
use log::{debug, warn};

use super::{Surface, SurfaceError};
use crate::geometry::{Rect, Size};
use crate::loader::PageImage;

/// In-memory drawing surface.
///
/// Pages are scaled with a Lanczos3 filter and composited onto a frame
/// that is cleared to the background colour on every resize. Frames larger
/// than the pixel budget are refused.
pub struct Canvas {
    viewport: Size,
    size: Size,
    frame: RgbaImage,
    background: Rgba<u8>,
    max_pixels: u64,
}

impl Canvas {
    pub const DEFAULT_BACKGROUND: Rgba<u8> = Rgba([0x1b, 0x1b, 0x1b, 0xff]);
    /// Default pixel budget for the frame, 8192x8192
    pub const MAX_PIXELS: u64 = 1 << 26;

    #[must_use]
    pub fn new(viewport: Size) -> Self {
        let (width, height) = viewport.to_pixels();
        Self {
            viewport,
            size: viewport,
            frame: RgbaImage::from_pixel(width, height, Self::DEFAULT_BACKGROUND),
            background: Self::DEFAULT_BACKGROUND,
            max_pixels: Self::MAX_PIXELS,
        }
    }

    #[must_use]
    pub fn with_background(mut self, background: Rgba<u8>) -> Self {
        self.background = background;
        self.frame = RgbaImage::from_pixel(self.frame.width(), self.frame.height(), background);
        self
    }

    #[must_use]
    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    /// The hosting window changed size; takes effect on the next draw
    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    #[must_use]
    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    #[must_use]
    pub fn background(&self) -> Rgba<u8> {
        self.background
    }

    /// Write the current frame as PNG
    pub fn save(&self, path: &Path) -> Result<(), SurfaceError> {
        self.frame.save_with_format(path, ImageFormat::Png)?;
        debug!(
            "Saved {}x{} frame to {path:?}",
            self.frame.width(),
            self.frame.height()
        );
        Ok(())
    }

    fn check_budget(&self, width: u32, height: u32) -> Result<(), SurfaceError> {
        if u64::from(width) * u64::from(height) > self.max_pixels {
            warn!(
                "Refusing {width}x{height} frame, budget is {} pixels",
                self.max_pixels
            );
            return Err(SurfaceError::TooLarge {
                width,
                height,
                limit: self.max_pixels,
            });
        }
        Ok(())
    }
}

impl Surface for Canvas {
    fn viewport(&self) -> Size {
        self.viewport
    }

    fn size(&self) -> Size {
        self.size
    }

    fn resize(&mut self, size: Size) -> Result<(), SurfaceError> {
        let (width, height) = size.to_pixels();
        self.check_budget(width, height)?;
        self.size = size;
        self.frame = RgbaImage::from_pixel(width, height, self.background);
        Ok(())
    }

    fn draw_image(&mut self, page: &PageImage, rect: Rect) -> Result<(), SurfaceError> {
        let width = (rect.width.round() as u32).max(1);
        let height = (rect.height.round() as u32).max(1);
        self.check_budget(width, height)?;
        let x = rect.x.round() as i64;
        let y = rect.y.round() as i64;

        if (width, height) == (page.width(), page.height()) {
            imageops::overlay(&mut self.frame, page.pixels(), x, y);
        } else {
            let scaled = scale_page(page.pixels(), width, height)?;
            imageops::overlay(&mut self.frame, &scaled, x, y);
        }
        Ok(())
    }
}

/// Resize page pixels with fast_image_resize
fn scale_page(src: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage, SurfaceError> {
    let fail = |detail: String| SurfaceError::Scale {
        width,
        height,
        detail,
    };

    let src_view = fr::Image::from_vec_u8(
        NonZeroU32::new(src.width()).ok_or_else(|| fail("source has no width".to_string()))?,
        NonZeroU32::new(src.height()).ok_or_else(|| fail("source has no height".to_string()))?,
        src.as_raw().clone(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| fail(e.to_string()))?;

    let dst_width = NonZeroU32::new(width).ok_or_else(|| fail("zero target width".to_string()))?;
    let dst_height =
        NonZeroU32::new(height).ok_or_else(|| fail("zero target height".to_string()))?;
    let mut dst_image = fr::Image::new(dst_width, dst_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new(fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3));
    resizer
        .resize(&src_view.view(), &mut dst_image.view_mut())
        .map_err(|e| fail(e.to_string()))?;

    RgbaImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| fail("scaled buffer has the wrong length".to_string()))
}
