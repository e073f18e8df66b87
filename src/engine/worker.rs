//! Worker-side request processing
//!
//! Runs one request to completion on whatever thread it is called from and
//! reports through a `post` callback, the same way a web worker answers with
//! `postMessage`. Per-line operations are processed in batches; when there is
//! more than one batch a `PROGRESS` message follows each batch. Exactly one
//! `SUCCESS` or `ERROR` ends every request.

use crate::analysis::analyze;
use crate::errors::{EditorError, EngineError};
use crate::models::OperationId;
use crate::transforms::{self, search_replace, sort, split_lines};

use super::protocol::{Request, RequestEnvelope, WorkerRequest, WorkerResponse};

/// Outcome of a completed request
struct Completed {
    result: String,
    processed: usize,
}

/// Process a loosely typed request. Malformed requests are answered with
/// `ERROR` under the id they carried.
pub fn handle_envelope(envelope: RequestEnvelope, batch_size: usize, mut post: impl FnMut(WorkerResponse)) {
    let id = envelope.id.clone();
    match WorkerRequest::try_from(envelope) {
        Ok(request) => handle_request(request, batch_size, post),
        Err(e) => {
            log::warn!("Rejected worker request {}: {}", id, e);
            post(WorkerResponse::error(id, e.to_string()));
        }
    }
}

/// Process a request, posting progress and a final result
pub fn handle_request(request: WorkerRequest, batch_size: usize, mut post: impl FnMut(WorkerResponse)) {
    let WorkerRequest { id, request } = request;
    let kind = request.kind();

    let outcome = execute(&request, batch_size, &mut |progress, processed| {
        post(WorkerResponse::progress(id.clone(), progress, processed));
    });

    match outcome {
        Ok(done) => post(WorkerResponse::success(id, done.result, done.processed)),
        Err(e) => {
            log::warn!("{} request {} failed: {}", kind.as_str(), id, e);
            post(WorkerResponse::error(id, e.to_string()));
        }
    }
}

/// Process a request and return only its final outcome
pub fn run_request(request: &Request, batch_size: usize) -> Result<String, EditorError> {
    execute(request, batch_size, &mut |_, _| {}).map(|done| done.result)
}

fn execute(
    request: &Request,
    batch_size: usize,
    on_progress: &mut dyn FnMut(u8, usize),
) -> Result<Completed, EditorError> {
    match request {
        Request::ApplyOperation(payload) => {
            let id: OperationId = payload.operation.parse()?;
            let descriptor = transforms::descriptor(id);
            let lines = split_lines(&payload.text);

            let result = if descriptor.applies_per_line() {
                apply_in_batches(&lines, batch_size, |line| descriptor.apply_line(line), on_progress)
            } else {
                descriptor.apply(&payload.text)
            };

            Ok(Completed {
                result,
                processed: lines.len(),
            })
        }
        Request::SearchReplace(payload) => Ok(Completed {
            result: search_replace(&payload.text, &payload.options)?,
            processed: split_lines(&payload.text).len(),
        }),
        Request::Sort(payload) => Ok(Completed {
            result: sort::sort_lines(&payload.text, payload.options()),
            processed: split_lines(&payload.text).len(),
        }),
        Request::RemoveDuplicates(payload) => Ok(Completed {
            result: sort::remove_duplicates(&payload.text),
            processed: split_lines(&payload.text).len(),
        }),
        Request::AnalyzeText(payload) => {
            let metrics = analyze(&payload.text);
            let result = serde_json::to_string(&metrics)
                .map_err(|e| EngineError::Protocol(e.to_string()))?;
            Ok(Completed {
                result,
                processed: metrics.total_lines,
            })
        }
    }
}

fn apply_in_batches(
    lines: &[&str],
    batch_size: usize,
    f: impl Fn(&str) -> Option<String>,
    on_progress: &mut dyn FnMut(u8, usize),
) -> String {
    let batch_size = batch_size.max(1);
    let batches = lines.len().div_ceil(batch_size);
    let mut processed_lines: Vec<String> = Vec::with_capacity(lines.len());

    for (batch_index, batch) in lines.chunks(batch_size).enumerate() {
        processed_lines.extend(
            batch
                .iter()
                .map(|line| f(*line).unwrap_or_else(|| line.to_string())),
        );

        if batches > 1 {
            let progress = ((batch_index + 1) as f64 / batches as f64 * 100.0).round() as u8;
            on_progress(progress, processed_lines.len());
        }
    }

    processed_lines.join("\n")
}
