//! # Layer Composer CLI
//!
//! Command-line host for Layer Composer session documents.
//!
//! ## Usage
//!
//! ```bash
//! layer-composer import poster.json photo.png logo.png
//! layer-composer flatten poster.json poster.png --scale 2
//! layer-composer capture poster.json layer.png <layer-id>
//! layer-composer extract poster.json <layer-id> 10,10 200,10 200,150
//! COMPOSER_AI_URL=https://gen.example.com/v1 layer-composer generate poster.json --prompt "watercolor"
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `CliConfig` - Resolved settings for fonts, the generation service and logging
//! - `commands` - One function per subcommand over an `EditorSession`

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Command-line arguments for layer-composer.
#[derive(Debug, Clone, Parser)]
#[command(name = "layer-composer")]
#[command(about = "Compose, flatten and generate layered images")]
#[command(version)]
pub struct CliArgs {
    /// Editor configuration JSON (snapping, history limit, defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Font file used for every text layer
    #[arg(long, global = true, env = "COMPOSER_FONT")]
    pub font: Option<PathBuf>,

    /// Generation service endpoint (e.g., <https://gen.example.com/v1/generate>)
    #[arg(long, global = true, env = "COMPOSER_AI_URL")]
    pub ai_url: Option<String>,

    /// Bearer token for the generation service
    #[arg(long, global = true, env = "COMPOSER_AI_TOKEN", hide_env_values = true)]
    pub ai_token: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create an empty session document
    New {
        /// Session document to write
        session: PathBuf,
        /// Canvas width in pixels
        #[arg(long)]
        width: Option<u32>,
        /// Canvas height in pixels
        #[arg(long)]
        height: Option<u32>,
        /// Background color, or "transparent"
        #[arg(long)]
        background: Option<String>,
    },

    /// Print the layer stack as JSON, topmost first
    Layers {
        /// Session document
        session: PathBuf,
    },

    /// Add image files as layers (one undo step)
    Import {
        /// Session document; created if missing
        session: PathBuf,
        /// Image files to add
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Flatten the canvas to PNG or JPEG
    Flatten {
        /// Session document
        session: PathBuf,
        /// Output file; the extension picks the format
        output: PathBuf,
        /// Output scale factor
        #[arg(long, default_value = "1.0")]
        scale: f32,
        /// JPEG quality 1-100
        #[arg(long, default_value = "85")]
        quality: u8,
    },

    /// Capture one layer at natural resolution, or several as a group
    Capture {
        /// Session document
        session: PathBuf,
        /// Output PNG file
        output: PathBuf,
        /// Layer ids, topmost first
        #[arg(required = true)]
        layers: Vec<String>,
    },

    /// Cut a polygon out of an image layer into a new layer
    Extract {
        /// Session document
        session: PathBuf,
        /// Image layer id
        layer: String,
        /// Polygon vertices in canvas space, as `x,y`
        #[arg(required = true, num_args = 3..)]
        points: Vec<String>,
    },

    /// Send the flattened canvas to the generation service
    Generate {
        /// Session document
        session: PathBuf,
        /// Prompt text (overrides the preset's prompt)
        #[arg(long)]
        prompt: Option<String>,
        /// Preset JSON with appId and options
        #[arg(long)]
        preset: Option<PathBuf>,
        /// Write the request as a preset JSON file
        #[arg(long)]
        save_preset: Option<PathBuf>,
        /// Send the canvas as text-to-image (no input image)
        #[arg(long)]
        no_input: bool,
    },
}

/// Resolved CLI settings.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Editor configuration file.
    pub config_path: Option<PathBuf>,
    /// Font file for text layers.
    pub font: Option<PathBuf>,
    /// Generation service endpoint.
    pub ai_url: Option<String>,
    /// Generation service token.
    pub ai_token: Option<String>,
    /// Log output format.
    pub log_format: LogFormat,
}

impl From<CliArgs> for CliConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            config_path: args.config,
            font: args.font,
            ai_url: args.ai_url,
            ai_token: args.ai_token,
            log_format: args.log_format,
        }
    }
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        Self::from(args.clone())
    }
}
