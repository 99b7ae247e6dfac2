//! # Layer Composer AI
//!
//! The generative-image collaborator as seen from the editor: submit images
//! plus a prompt, receive images or an error.
//!
//! ```text
//! Preset ──▶ GenerationRequest ──▶ ImageGenerator ──▶ Vec<data URL>
//!                                        ▲
//!                         JobSlots (one job per slot, cancellable)
//! ```
//!
//! Results are applied to an `EditorSession` by the host as ordinary edits,
//! so a failed or cancelled job never touches the layer stack.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod error;
pub mod jobs;
pub mod request;

pub use client::{HttpGeneratorConfig, HttpImageGenerator, ImageGenerator};
pub use error::{GenerationError, GenerationResult};
pub use jobs::{GenerationOutcome, JobSlots};
pub use request::GenerationRequest;
