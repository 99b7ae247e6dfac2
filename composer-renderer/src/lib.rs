//! # Layer Composer Renderer
//!
//! Software compositor for layer stacks, built on tiny-skia.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               Compositor                    │
//! ├──────────────┬──────────────┬───────────────┤
//! │ Image layers │ Text layers  │ Shape layers  │
//! │ ImageCache   │ FontBook     │ PathBuilder   │
//! ├──────────────┴──────────────┴───────────────┤
//! │ rotate · opacity · blend  ──▶  Pixmap       │
//! └─────────────────────────────────────────────┘
//!        │                 │               │
//!     export           capture          region
//!   (PNG/JPEG)      (layer/group)    (pen selection)
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod color;
pub mod compositor;
pub mod error;
pub mod export;
pub mod image;
pub mod import;
pub mod region;
pub mod text;

pub use cache::{CacheStats, ImageCache, ImageCacheConfig};
pub use color::parse_color;
pub use compositor::Compositor;
pub use error::{RenderError, RenderResult};
pub use export::{encode_jpeg, encode_png, png_data_url, ExportConfig, ExportFormat, SessionExporter};
pub use self::image::{decode_image, decode_source, DecodedImage, ImageFormat};
pub use import::{asset_from_bytes, asset_from_data_url, import_files};
pub use region::{extract_region, extract_selection_to_layer, ExtractedRegion};
pub use text::{wrap_lines, FixedAdvance, FontBook, FontMeasure, TextMeasure};
