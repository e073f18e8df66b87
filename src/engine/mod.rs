//! Execution engine
//!
//! Operations run behind a message boundary so large inputs never block the
//! interactive thread:
//!
//! - [`protocol`]: `{id, type, payload}` request/response messages
//! - [`worker`]: processes one request, with batched progress
//! - [`client`]: single-flight caller with correlation ids
//! - `thread`: native worker on a background thread
//!
//! In the browser the worker side runs inside a web worker (see
//! `api::worker`) and the transport is a `web_sys::Worker`.

pub mod client;
pub mod protocol;
#[cfg(not(target_arch = "wasm32"))]
pub mod thread;
pub mod worker;

pub use client::{ExecutionClient, ExecutionEvent, Transport};
pub use protocol::{Request, RequestEnvelope, RequestType, WorkerRequest, WorkerResponse};
#[cfg(not(target_arch = "wasm32"))]
pub use thread::ThreadWorker;
pub use worker::{handle_envelope, handle_request, run_request};

/// Lines per batch when no configuration says otherwise
pub const DEFAULT_BATCH_SIZE: usize = 1000;
