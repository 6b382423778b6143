//! Click-to-direction mapping

use crate::geometry::Rect;

/// Which half of the surface a click landed in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// Left half, including the exact middle; goes back a page
    Left,
    /// Right half; goes forward a page
    Right,
}

/// Map a horizontal click position onto a side of `bounds`.
///
/// `click_x` and `bounds` share one coordinate space; the click is first made
/// relative to the surface's left edge.
pub fn side_of(click_x: f32, bounds: Rect) -> Side {
    let x = click_x - bounds.x;
    if x <= bounds.width / 2.0 {
        Side::Left
    } else {
        Side::Right
    }
}
