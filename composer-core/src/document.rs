//! Versioned JSON form of a session: canvas settings plus the layer stack.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::{CanvasSettings, EditorConfig};
use crate::error::{ComposerError, ComposerResult};
use crate::session::EditorSession;
use crate::{Layer, LayerStack};

/// Newest document version this build reads and writes.
pub const DOCUMENT_VERSION: u32 = 1;

/// Saved session: everything needed to reopen and flatten a composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDocument {
    /// Format version.
    #[serde(default = "SessionDocument::default_version")]
    pub version: u32,
    /// Canvas size and background.
    #[serde(default)]
    pub canvas: CanvasSettings,
    /// Whether the canvas size was set on purpose or by a first layer.
    ///
    /// A pristine canvas takes the size of the first imported image.
    #[serde(default)]
    pub initialized: bool,
    /// Layers, topmost first.
    #[serde(default)]
    pub layers: Vec<Layer>,
}

impl SessionDocument {
    const fn default_version() -> u32 {
        DOCUMENT_VERSION
    }

    /// Snapshot a session.
    #[must_use]
    pub fn from_session(session: &EditorSession) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            canvas: session.canvas().clone(),
            initialized: session.is_canvas_initialized(),
            layers: session.layers().to_vec(),
        }
    }

    /// Parse a document from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> ComposerResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the document to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> ComposerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate and normalize the layers into a stack.
    ///
    /// Sizes and opacities are clamped into range.
    ///
    /// # Errors
    ///
    /// Returns an error for an unsupported version or duplicate layer ids.
    pub fn into_stack(self) -> ComposerResult<(CanvasSettings, LayerStack)> {
        if self.version > DOCUMENT_VERSION {
            return Err(ComposerError::InvalidDocument(format!(
                "unsupported version {} (newest is {DOCUMENT_VERSION})",
                self.version
            )));
        }

        let mut seen = HashSet::with_capacity(self.layers.len());
        let mut layers = Vec::with_capacity(self.layers.len());
        for mut layer in self.layers {
            if !seen.insert(layer.id) {
                return Err(ComposerError::InvalidDocument(format!(
                    "duplicate layer id {}",
                    layer.id
                )));
            }
            let (width, height, opacity) =
                (layer.transform.width, layer.transform.height, layer.opacity);
            layer.set_size(width, height);
            layer.set_opacity(opacity);
            layers.push(layer);
        }

        let mut canvas = self.canvas;
        canvas.width = canvas.width.max(1);
        canvas.height = canvas.height.max(1);
        Ok((canvas, LayerStack::from_layers(layers)))
    }

    /// Open the document as a fresh session with its own history.
    ///
    /// # Errors
    ///
    /// See [`SessionDocument::into_stack`].
    pub fn into_session(self, config: EditorConfig) -> ComposerResult<EditorSession> {
        let initialized = self.initialized;
        let (canvas, stack) = self.into_stack()?;
        tracing::debug!("Opened session document with {} layers", stack.len());
        let mut session = EditorSession::from_parts(config, canvas, stack);
        if initialized {
            session.mark_canvas_initialized();
        }
        Ok(session)
    }
}

impl From<&EditorSession> for SessionDocument {
    fn from(session: &EditorSession) -> Self {
        Self::from_session(session)
    }
}
