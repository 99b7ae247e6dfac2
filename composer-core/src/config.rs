//! Editor and canvas configuration.

use serde::{Deserialize, Serialize};

use crate::error::ComposerResult;
use crate::geometry::Rect;
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::snapping::SnapConfig;
use crate::TextStyle;

/// Default canvas edge length in pixels.
pub const DEFAULT_CANVAS_SIZE: u32 = 1024;

/// Canvas background fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "color", rename_all = "lowercase")]
pub enum Background {
    /// Solid CSS color.
    Solid(String),
    /// No fill; the canvas is unbounded while editing and exports keep alpha.
    Transparent,
}

impl Default for Background {
    fn default() -> Self {
        Self::Solid("#ffffff".to_string())
    }
}

/// Export size and background of the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSettings {
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Background fill.
    #[serde(default)]
    pub background: Background,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_SIZE,
            height: DEFAULT_CANVAS_SIZE,
            background: Background::default(),
        }
    }
}

impl CanvasSettings {
    /// Canvas settings of the given size with the default background.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            background: Background::default(),
        }
    }

    /// The canvas area in canvas coordinates.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f32, self.height as f32)
    }
}

/// Tunables for an editor session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Move snapping.
    pub snap: SnapConfig,
    /// Maximum number of undo snapshots.
    pub history_limit: usize,
    /// Canvas a fresh session starts with.
    pub canvas: CanvasSettings,
    /// Style of newly added text layers.
    pub text_style: TextStyle,
    /// Offset applied to keyboard duplicates.
    pub duplicate_offset: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap: SnapConfig::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            canvas: CanvasSettings::default(),
            text_style: TextStyle::default(),
            duplicate_offset: 20.0,
        }
    }
}

impl EditorConfig {
    /// Parse a config from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> ComposerResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the config to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> ComposerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
