//! Scale and placement of the visible page(s)
//!
//! Pure computation: given the native size of the leading page (and the
//! following page in double mode), the zoom policy and the viewport, work
//! out the surface size and where each page goes.

use crate::geometry::{Rect, Size};

use super::error::DrawError;
use super::zoom::{DisplayMode, ZoomMode, fit_width_scale};

/// Inputs for one layout pass
#[derive(Debug, Clone, Copy)]
pub struct LayoutRequest<'a> {
    /// Native size of the page at the pointer
    pub page: Size,
    /// Native size of the following page, when loaded
    pub next: Option<Size>,
    pub display_mode: DisplayMode,
    pub zoom_mode: &'a ZoomMode,
    /// Reader-set zoom factor, only used in manual mode
    pub scale: f32,
    pub viewport: Size,
}

/// Result of a layout pass
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Effective zoom factor for the spread
    pub zoom_scale: f32,
    /// Drawing surface size, never smaller than the viewport
    pub surface: Size,
    /// Where the page at the pointer is drawn
    pub leading: Rect,
    /// Where the following page is drawn in double mode
    pub trailing: Option<Rect>,
}

/// Width the zoom computation works against.
///
/// A double spread without a following page still counts two page widths so
/// the last odd page is not blown up to the full spread width.
pub fn content_width(display_mode: DisplayMode, page_width: f32, next_width: Option<f32>) -> f32 {
    match (display_mode, next_width) {
        (DisplayMode::Single, _) => page_width,
        (DisplayMode::Double, Some(next)) => page_width + next,
        (DisplayMode::Double, None) => page_width * 2.0,
    }
}

pub fn compute(request: &LayoutRequest<'_>) -> Result<Layout, DrawError> {
    let LayoutRequest {
        page,
        next,
        display_mode,
        zoom_mode,
        scale,
        viewport,
    } = *request;

    if !(viewport.width.is_finite() && viewport.width > 0.0)
        || !(viewport.height.is_finite() && viewport.height >= 0.0)
    {
        return Err(DrawError::InvalidViewport {
            width: viewport.width,
            height: viewport.height,
        });
    }

    let double = display_mode.is_double();
    let content = content_width(display_mode, page.width, next.map(|n| n.width));

    let zoom_scale = match zoom_mode {
        ZoomMode::Manual if double => scale * 2.0,
        ZoomMode::Manual => scale,
        ZoomMode::FitWidth => fit_width_scale(viewport.width, content),
        ZoomMode::Unknown(name) => return Err(DrawError::InvalidZoomMode(name.clone())),
    };
    let manual = matches!(zoom_mode, ZoomMode::Manual);

    let scaled = Size::new(page.width * zoom_scale, page.height * zoom_scale);
    let page_size = if manual {
        Size::new(page.width * scale, page.height * scale)
    } else {
        scaled
    };
    let content_size = Size::new(scaled.width, page_size.height);
    let surface = content_size.max(viewport);

    let mut x = 0.0;
    let mut y = 0.0;

    // Centre only what the reader sized explicitly; fit-width already fills the width
    if manual && content_size.width < viewport.width {
        x = (viewport.width - page_size.width) / 2.0;
        if double {
            x -= page_size.width / 2.0;
        }
    }
    if manual && content_size.height < viewport.height {
        y = (viewport.height - page_size.height) / 2.0;
    }

    let leading = Rect::new(x, y, page_size.width, page_size.height);
    let trailing = match (double, next) {
        (true, Some(_)) => Some(Rect::new(
            leading.right(),
            y,
            page_size.width,
            page_size.height,
        )),
        _ => None,
    };

    Ok(Layout {
        zoom_scale,
        surface,
        leading,
        trailing,
    })
}
