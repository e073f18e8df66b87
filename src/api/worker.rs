//! Worker-side entry points
//!
//! Load the module inside a dedicated worker and either call
//! `installWorker()` once, or forward each message to
//! `handleWorkerMessage(event.data)` yourself.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{DedicatedWorkerGlobalScope, MessageEvent};

use crate::api::helpers::{describe_js_error, deserialize, serialize};
use crate::engine::{handle_envelope, RequestEnvelope, WorkerResponse, DEFAULT_BATCH_SIZE};
use crate::{wasm_error, wasm_info};

fn post_response(scope: &DedicatedWorkerGlobalScope, response: WorkerResponse) {
    let posted = serialize(&response, "Failed to serialize worker response")
        .and_then(|message| scope.post_message(&message));
    if let Err(e) = posted {
        wasm_error!("Failed to post {} response: {}", response.id(), describe_js_error(&e));
    }
}

/// Handle one request message and post every response back to the page
#[wasm_bindgen(js_name = handleWorkerMessage)]
pub fn handle_worker_message(data: JsValue, batch_size: Option<usize>) -> Result<(), JsValue> {
    let scope: DedicatedWorkerGlobalScope = js_sys::global().dyn_into()?;
    let envelope: RequestEnvelope = deserialize(data, "Invalid worker request")?;
    let batch_size = batch_size.filter(|&n| n > 0).unwrap_or(DEFAULT_BATCH_SIZE);

    handle_envelope(envelope, batch_size, |response| post_response(&scope, response));
    Ok(())
}

/// Route the worker's `onmessage` to [`handle_worker_message`]
#[wasm_bindgen(js_name = installWorker)]
pub fn install_worker(batch_size: Option<usize>) -> Result<(), JsValue> {
    let scope: DedicatedWorkerGlobalScope = js_sys::global().dyn_into()?;
    let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
        if let Err(e) = handle_worker_message(event.data(), batch_size) {
            wasm_error!("Worker request dropped: {}", describe_js_error(&e));
        }
    });
    scope.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
    // The scope lives as long as the worker
    on_message.forget();

    wasm_info!("Worker ready (batch size {})", batch_size.unwrap_or(DEFAULT_BATCH_SIZE));
    Ok(())
}
