//! View state management

use super::zoom::{DisplayMode, ZoomMode};
use crate::settings::Options;

/// Per-book view state: which page leads the spread and how it is zoomed
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    /// Current page (0-indexed), always below `page_count`
    pub pointer: usize,

    /// Total page count
    pub page_count: usize,

    /// Reader-set zoom factor (1.0 = 100%)
    pub scale: f32,

    pub display_mode: DisplayMode,

    pub zoom_mode: ZoomMode,
}

impl ViewState {
    #[must_use]
    pub fn new(page_count: usize, options: &Options) -> Self {
        Self {
            pointer: 0,
            page_count,
            scale: 1.0,
            display_mode: options.display_mode,
            zoom_mode: options.zoom_mode.clone(),
        }
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::Advance => {
                if self.pointer + 1 < self.page_count {
                    self.pointer += 1;
                    vec![Effect::Redraw]
                } else {
                    vec![]
                }
            }

            Command::Retreat => {
                if self.pointer > 0 {
                    self.pointer -= 1;
                    vec![Effect::Redraw]
                } else {
                    vec![]
                }
            }

            Command::GoToPage(page) => {
                let clamped = page.min(self.page_count.saturating_sub(1));
                if self.pointer != clamped {
                    self.pointer = clamped;
                    vec![Effect::Redraw]
                } else {
                    vec![]
                }
            }

            Command::SetScale(scale) => {
                self.zoom_mode = ZoomMode::Manual;
                self.scale = scale;
                vec![Effect::RedrawIfLoaded]
            }

            Command::Resize => vec![Effect::Redraw],
        }
    }

    /// Index of the page drawn right of the pointer, if the spread has one
    #[must_use]
    pub fn trailing_index(&self) -> Option<usize> {
        let next = self.pointer + 1;
        (self.display_mode.is_double() && next < self.page_count).then_some(next)
    }
}

/// Commands that modify view state
#[derive(Clone, Debug)]
pub enum Command {
    /// Move one page forward
    Advance,
    /// Move one page back
    Retreat,
    /// Jump to a specific page
    GoToPage(usize),
    /// Switch to manual zoom at this factor
    SetScale(f32),
    /// The viewport changed size
    Resize,
}

/// Effects produced by state changes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Draw the current spread; failing if its page is missing
    Redraw,
    /// Draw the current spread only if its page is already loaded
    RedrawIfLoaded,
}
