//! Shareable generation presets: `{ "appId": ..., "options": {...} }`.
//!
//! A preset names the creator app that produced it and carries that app's
//! options verbatim. Loading a preset and submitting it produces the same
//! generation request as the one it was exported from.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ComposerError, ComposerResult};

/// Option key holding the prompt text.
pub const PROMPT_KEY: &str = "prompt";

/// Serialized preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    /// Identifier of the app the preset belongs to.
    pub app_id: String,
    /// App-specific options.
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl Preset {
    /// Create a preset with no options.
    #[must_use]
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            options: Map::new(),
        }
    }

    /// Set one option.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Set the prompt option.
    #[must_use]
    pub fn with_prompt(self, prompt: impl Into<String>) -> Self {
        self.with_option(PROMPT_KEY, prompt.into())
    }

    /// Look up an option.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// The prompt option, if it is a string.
    #[must_use]
    pub fn prompt(&self) -> Option<&str> {
        self.option(PROMPT_KEY).and_then(Value::as_str)
    }

    /// Options other than the prompt, as forwarded to the generator.
    #[must_use]
    pub fn generation_options(&self) -> Map<String, Value> {
        self.options
            .iter()
            .filter(|(key, _)| key.as_str() != PROMPT_KEY)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Parse and validate a preset.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or `appId` is blank.
    pub fn from_json(json: &str) -> ComposerResult<Self> {
        let preset: Self = serde_json::from_str(json)?;
        if preset.app_id.trim().is_empty() {
            return Err(ComposerError::InvalidDocument(
                "preset appId must not be empty".into(),
            ));
        }
        Ok(preset)
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> ComposerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
