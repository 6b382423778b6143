//! Display and zoom modes for page spreads

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How many pages make up one view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// One page at a time
    Single,
    /// Two consecutive pages side by side
    #[default]
    Double,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Single => "single",
            DisplayMode::Double => "double",
        }
    }

    pub fn is_double(&self) -> bool {
        matches!(self, DisplayMode::Double)
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(DisplayMode::Single),
            "double" => Ok(DisplayMode::Double),
            other => Err(format!(
                "unknown display mode '{other}', expected 'single' or 'double'"
            )),
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zoom policy.
///
/// Configuration is accepted as free text; a value that names no policy is
/// kept as `Unknown` and rejected when a draw is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum ZoomMode {
    /// Scale set explicitly by the reader
    Manual,
    /// Scale derived from the viewport width
    #[default]
    FitWidth,
    Unknown(String),
}

impl ZoomMode {
    pub fn as_str(&self) -> &str {
        match self {
            ZoomMode::Manual => "manual",
            ZoomMode::FitWidth => "fitWidth",
            ZoomMode::Unknown(name) => name,
        }
    }
}

impl From<&str> for ZoomMode {
    fn from(name: &str) -> Self {
        match name.trim() {
            "manual" => ZoomMode::Manual,
            "fitWidth" | "fit-width" | "fit_width" => ZoomMode::FitWidth,
            other => ZoomMode::Unknown(other.to_string()),
        }
    }
}

impl From<String> for ZoomMode {
    fn from(name: String) -> Self {
        ZoomMode::from(name.as_str())
    }
}

impl From<ZoomMode> for String {
    fn from(mode: ZoomMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for ZoomMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scale that relates `content_width` to `viewport_width`.
///
/// Wider viewport: `1 + (W - C) / W`, which grows the content but never past
/// the viewport. Narrower or equal viewport: `W / C`, shrinking to fit.
pub fn fit_width_scale(viewport_width: f32, content_width: f32) -> f32 {
    if viewport_width > content_width {
        1.0 + (viewport_width - content_width) / viewport_width
    } else {
        viewport_width / content_width
    }
}

/// Smallest manual zoom factor
pub const MIN_SCALE: f32 = 0.1;
/// Largest manual zoom factor
pub const MAX_SCALE: f32 = 10.0;

/// Manual zoom factors must be finite and within `MIN_SCALE..=MAX_SCALE`
pub fn is_valid_scale(scale: f32) -> bool {
    (MIN_SCALE..=MAX_SCALE).contains(&scale)
}
