//! Generation requests and their round-trip through presets.

use composer_core::preset::PROMPT_KEY;
use composer_core::Preset;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// "Submit these images with this prompt": the body sent to the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Input images as data URLs. Empty for text-to-image.
    #[serde(default)]
    pub images: Vec<String>,
    /// Prompt text.
    pub prompt: String,
    /// Service options (aspect ratio, style, seed, ...).
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl GenerationRequest {
    /// Request with a prompt and no images or options.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Attach an input image.
    #[must_use]
    pub fn with_image(mut self, data_url: impl Into<String>) -> Self {
        self.images.push(data_url.into());
        self
    }

    /// Set one option.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Build the request a preset describes, over the given input images.
    #[must_use]
    pub fn from_preset(preset: &Preset, images: Vec<String>) -> Self {
        Self {
            images,
            prompt: preset.prompt().unwrap_or_default().to_string(),
            options: preset.generation_options(),
        }
    }

    /// Export this request's prompt and options as a preset for `app_id`.
    #[must_use]
    pub fn to_preset(&self, app_id: impl Into<String>) -> Preset {
        let mut preset = Preset::new(app_id);
        preset.options = self.options.clone();
        preset.options.insert(PROMPT_KEY.to_string(), Value::String(self.prompt.clone()));
        preset
    }
}
