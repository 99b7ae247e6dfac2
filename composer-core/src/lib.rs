//! # Layer Composer Core
//!
//! Layer-editing engine for the layer composer.
//! Pure data and geometry; compiles to WASM for the browser editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              composer-core                  │
//! ├─────────────────────────────────────────────┤
//! │  Layer Model     │  Interaction Reducer     │
//! │  - Layers/stack  │  - Move / duplicate      │
//! │  - Geometry      │  - Resize / rotate       │
//! │  - Selection     │  - Marquee / pen path    │
//! ├─────────────────────────────────────────────┤
//! │  History         │  Snapping                │
//! │  - Snapshots     │  - Edge/center guides    │
//! │  - Drag commits  │  - Zoom-aware threshold  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Rasterizing a stack lives in `composer-renderer`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod document;
pub mod error;
pub mod event;
pub mod geometry;
pub mod history;
pub mod interaction;
pub mod layer;
pub mod pen;
pub mod preset;
pub mod selection;
pub mod session;
pub mod snapping;
pub mod stack;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::{Background, CanvasSettings, EditorConfig};
pub use document::{SessionDocument, DOCUMENT_VERSION};
pub use error::{ComposerError, ComposerResult};
pub use event::{EditorEvent, KeyModifiers, PointerEvent, PointerPhase, Tool};
pub use geometry::{
    bounding_box_of, canvas_point_to_layer_local, layer_local_to_canvas, Point, Rect,
};
pub use history::History;
pub use interaction::{Handle, Interaction};
pub use layer::{
    BlendMode, FontStyle, Layer, LayerId, LayerKind, ShapeKind, TextAlign, TextStyle,
    TextTransform, Transform, DEFAULT_TEXT, MIN_LAYER_SIZE,
};
pub use pen::{PenNode, PenPath, SelectionPath, BEZIER_STEPS};
pub use preset::Preset;
pub use selection::Selection;
pub use session::{reduce, EditorSession, ImageAsset};
pub use snapping::{SnapAxis, SnapConfig, SnapLine};
pub use stack::{LayerStack, ReorderDirection};

/// Composer core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
