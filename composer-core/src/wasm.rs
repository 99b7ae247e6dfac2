//! WebAssembly bindings for composer-core.
//!
//! This module provides JavaScript-callable functions when compiled to WASM.

use wasm_bindgen::prelude::*;

use crate::{
    EditorConfig, EditorEvent, EditorSession, KeyModifiers, PointerEvent, PointerPhase,
    SessionDocument, Tool,
};

/// Initialize the composer WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();
}

/// Editor session instance for WASM.
#[wasm_bindgen]
pub struct WasmComposer {
    session: EditorSession,
}

#[wasm_bindgen]
impl WasmComposer {
    /// Create a session with a canvas of the given size.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            session: EditorSession::with_canvas(width, height),
        }
    }

    /// Feed a pointer event. `phase` is `down`, `move`, `up` or `cancel`.
    #[wasm_bindgen(js_name = pointer)]
    pub fn pointer(&mut self, phase: &str, x: f32, y: f32, shift: bool, alt: bool) {
        let phase = match phase {
            "down" => PointerPhase::Down,
            "move" => PointerPhase::Move,
            "up" => PointerPhase::Up,
            _ => PointerPhase::Cancel,
        };
        let modifiers = KeyModifiers {
            shift,
            alt,
            ..KeyModifiers::default()
        };
        self.session
            .dispatch(PointerEvent::new(phase, x, y).with_modifiers(modifiers).into());
    }

    /// Dispatch any editor event serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if JSON parsing fails.
    #[wasm_bindgen(js_name = dispatchJson)]
    pub fn dispatch_json(&mut self, json: &str) -> Result<(), String> {
        let event: EditorEvent = serde_json::from_str(json).map_err(|e| e.to_string())?;
        self.session.dispatch(event);
        Ok(())
    }

    /// Switch between the `select` and `pen` tools.
    #[wasm_bindgen(js_name = setTool)]
    pub fn set_tool(&mut self, tool: &str) {
        let tool = if tool == "pen" { Tool::Pen } else { Tool::Select };
        self.session.set_tool(tool);
    }

    /// Add the default text layer and return its id.
    #[wasm_bindgen(js_name = addTextLayer)]
    pub fn add_text_layer(&mut self) -> String {
        self.session.add_text_layer().to_string()
    }

    /// Undo the last edit.
    pub fn undo(&mut self) -> bool {
        self.session.undo()
    }

    /// Redo the last undone edit.
    pub fn redo(&mut self) -> bool {
        self.session.redo()
    }

    /// Layers as JSON, topmost first.
    #[wasm_bindgen(js_name = getLayersJson)]
    #[must_use]
    pub fn get_layers_json(&self) -> String {
        serde_json::to_string(self.session.layers()).unwrap_or_default()
    }

    /// Selected layer ids as JSON.
    #[wasm_bindgen(js_name = getSelectionJson)]
    #[must_use]
    pub fn get_selection_json(&self) -> String {
        serde_json::to_string(self.session.selection().ids()).unwrap_or_default()
    }

    /// Current snap guides as JSON.
    #[wasm_bindgen(js_name = getSnapLinesJson)]
    #[must_use]
    pub fn get_snap_lines_json(&self) -> String {
        serde_json::to_string(self.session.snap_lines()).unwrap_or_default()
    }

    /// Save the session as a document.
    #[wasm_bindgen(js_name = getSessionDocument)]
    #[must_use]
    pub fn get_session_document(&self) -> String {
        SessionDocument::from_session(&self.session)
            .to_json()
            .unwrap_or_default()
    }

    /// Replace the session with a saved document.
    ///
    /// # Errors
    ///
    /// Returns an error string if parsing or validation fails.
    #[wasm_bindgen(js_name = loadSessionDocument)]
    pub fn load_session_document(&mut self, json: &str) -> Result<(), String> {
        let document = SessionDocument::from_json(json).map_err(|e| e.to_string())?;
        let config = EditorConfig::clone(self.session.config());
        self.session = document.into_session(config).map_err(|e| e.to_string())?;
        Ok(())
    }
}

impl Default for WasmComposer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CANVAS_SIZE, crate::config::DEFAULT_CANVAS_SIZE)
    }
}
