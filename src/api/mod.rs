//! Phrase Editor WASM API
//!
//! The JavaScript-facing surface. Everything here is a thin wrapper over the
//! native modules: argument conversion, Promise plumbing and console logging.
//!
//! # Module Structure
//!
//! - `helpers`: console logging macros and serde conversions
//! - `types`: read-only views returned to JavaScript
//! - `editor`: `PhraseEditorHandle`, the page-side editor
//! - `worker`: entry points for the dedicated worker
//! - `registry`: stateless operation catalogue and analyzer

pub mod helpers;
pub mod types;

#[cfg(target_arch = "wasm32")]
pub mod editor;
pub mod registry;
#[cfg(target_arch = "wasm32")]
pub mod worker;

#[cfg(target_arch = "wasm32")]
pub use editor::PhraseEditorHandle;
pub use registry::{analyze_text, apply_transform, list_operations};
#[cfg(target_arch = "wasm32")]
pub use worker::{handle_worker_message, install_worker};
