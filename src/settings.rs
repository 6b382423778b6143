use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::book::{DisplayMode, ZoomMode};
use crate::preload::{DEFAULT_BUFFER_SIZE, DEFAULT_RETRIES};

const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "comicbook";

/// Environment variable naming a config file, checked before the default location
pub const CONFIG_ENV_VAR: &str = "COMICBOOK_CONFIG";

/// Reader options for one book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    pub display_mode: DisplayMode,

    pub zoom_mode: ZoomMode,

    /// Pages loaded before the book is ready to draw
    pub buffer_size: usize,

    /// Extra attempts for a page that failed to load
    pub retries: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            display_mode: DisplayMode::default(),
            zoom_mode: ZoomMode::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            retries: DEFAULT_RETRIES,
        }
    }
}

impl Options {
    /// Shallow merge: every key present in `overrides` replaces ours
    #[must_use]
    pub fn merged(mut self, overrides: &PartialOptions) -> Self {
        if let Some(display_mode) = overrides.display_mode {
            self.display_mode = display_mode;
        }
        if let Some(zoom_mode) = &overrides.zoom_mode {
            self.zoom_mode = zoom_mode.clone();
        }
        if let Some(buffer_size) = overrides.buffer_size {
            self.buffer_size = buffer_size;
        }
        if let Some(retries) = overrides.retries {
            self.retries = retries;
        }
        self
    }
}

/// Options where every key is optional; unknown keys are ignored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_mode: Option<DisplayMode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom_mode: Option<ZoomMode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
}

impl PartialOptions {
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Invalid options YAML")
    }
}

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Where options are read from, and whether the file must exist.
///
/// An explicit path wins, then [`CONFIG_ENV_VAR`], then the platform config
/// directory. Only the last one may be missing.
pub fn config_path(explicit: Option<&Path>) -> Option<(PathBuf, bool)> {
    if let Some(path) = explicit {
        return Some((path.to_path_buf(), true));
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
        return Some((PathBuf::from(path), true));
    }
    preferred_config_path().map(|path| (path, false))
}

pub fn load_partial(path: &Path) -> Result<PartialOptions> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read config {path:?}"))?;
    let partial = PartialOptions::from_yaml(&content)
        .with_context(|| format!("Failed to parse config {path:?}"))?;
    debug!("Loaded options from {path:?}: {partial:?}");
    Ok(partial)
}

/// Defaults merged with the config file, if there is one
pub fn load_options(explicit: Option<&Path>) -> Result<Options> {
    let Some((path, required)) = config_path(explicit) else {
        info!("Could not determine config directory, using default options");
        return Ok(Options::default());
    };

    if !required && !path.exists() {
        debug!("No config at {path:?}, using default options");
        return Ok(Options::default());
    }

    Ok(Options::default().merged(&load_partial(&path)?))
}
