//! JavaScript handle for the editor
//!
//! `PhraseEditorHandle` owns a [`PhraseEditor`] whose transport is a module
//! Web Worker running [`handle_worker_message`](super::worker). Operations
//! return a Promise that settles when the worker answers; progress is
//! reported through an optional callback.
//!
//! JS callbacks are always invoked after the editor borrow is released, so
//! they may call back into the handle.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{ErrorEvent, MessageEvent, Worker, WorkerOptions, WorkerType};

use crate::api::helpers::{describe_js_error, deserialize, deserialize_or_default, js_error, serialize};
use crate::api::types::{EditorView, ProgressView};
use crate::config::EditorConfig;
use crate::editor::{Dispatch, EditorUpdate, PhraseEditor};
use crate::engine::{Transport, WorkerRequest, WorkerResponse};
use crate::errors::{EditorError, EngineError};
use crate::io::{ExportFormat, FileInfo};
use crate::models::OperationId;
use crate::storage::LocalStorage;
use crate::transforms::SearchReplaceOptions;
use crate::{wasm_error, wasm_info, wasm_warn};

// ============================================================================
// Worker transport
// ============================================================================

pub struct WebWorkerTransport {
    worker: Worker,
}

impl WebWorkerTransport {
    fn spawn(url: &str) -> Result<Self, EngineError> {
        let options = WorkerOptions::new();
        options.set_type(WorkerType::Module);
        let worker = Worker::new_with_options(url, &options)
            .map_err(|e| EngineError::WorkerUnavailable(describe_js_error(&e)))?;
        Ok(Self { worker })
    }
}

impl Transport for WebWorkerTransport {
    fn post(&mut self, request: &WorkerRequest) -> Result<(), EngineError> {
        let message = serialize(request, "Failed to serialize worker request")
            .map_err(|e| EngineError::Protocol(describe_js_error(&e)))?;
        self.worker
            .post_message(&message)
            .map_err(|e| EngineError::WorkerUnavailable(describe_js_error(&e)))
    }
}

impl Drop for WebWorkerTransport {
    fn drop(&mut self) {
        self.worker.set_onmessage(None);
        self.worker.set_onerror(None);
        self.worker.terminate();
    }
}

type WebEditor = PhraseEditor<WebWorkerTransport>;

// ============================================================================
// Pending promise
// ============================================================================

#[derive(Clone)]
struct PendingCall {
    resolve: Function,
    reject: Function,
    on_progress: Option<Function>,
}

impl PendingCall {
    fn settle(&self, update: EditorUpdate) {
        let outcome = match update {
            EditorUpdate::Progress { progress, processed } => match &self.on_progress {
                Some(callback) => callback.call2(
                    &JsValue::NULL,
                    &JsValue::from(progress),
                    &JsValue::from(processed as f64),
                ),
                None => Ok(JsValue::UNDEFINED),
            },
            EditorUpdate::Completed(metrics) => serialize(&metrics, "Failed to serialize metrics")
                .and_then(|value| self.resolve.call1(&JsValue::NULL, &value)),
            EditorUpdate::Failed(e) => self
                .reject
                .call1(&JsValue::NULL, &JsValue::from_str(&e.to_string())),
        };
        if let Err(e) = outcome {
            wasm_error!("Operation callback threw: {}", describe_js_error(&e));
        }
    }
}

struct Inner {
    editor: WebEditor,
    pending: Option<PendingCall>,
}

/// Run `f` against the editor and settle the pending promise with its update
fn deliver(inner: &Rc<RefCell<Inner>>, f: impl FnOnce(&mut WebEditor) -> Option<EditorUpdate>) {
    let (update, call) = {
        let mut guard = inner.borrow_mut();
        let Some(update) = f(&mut guard.editor) else {
            return;
        };
        let call = if matches!(update, EditorUpdate::Progress { .. }) {
            guard.pending.clone()
        } else {
            guard.pending.take()
        };
        (update, call)
    };
    if let Some(call) = call {
        call.settle(update);
    }
}

// ============================================================================
// Handle
// ============================================================================

#[wasm_bindgen]
pub struct PhraseEditorHandle {
    inner: Rc<RefCell<Inner>>,
    _on_message: Option<Closure<dyn FnMut(MessageEvent)>>,
    _on_error: Option<Closure<dyn FnMut(ErrorEvent)>>,
}

#[wasm_bindgen]
impl PhraseEditorHandle {
    /// Create an editor backed by the worker script at `worker_url`.
    ///
    /// `config` may be `undefined` for defaults. A worker that fails to start
    /// leaves the editor usable; operations then reject.
    #[wasm_bindgen(constructor)]
    pub fn new(worker_url: &str, config: JsValue) -> Result<PhraseEditorHandle, JsValue> {
        let config: EditorConfig = deserialize_or_default(config, "Invalid editor config")?;
        config.validate().map_err(js_error)?;

        let (editor, worker) = match WebWorkerTransport::spawn(worker_url) {
            Ok(transport) => {
                let worker = transport.worker.clone();
                (WebEditor::new(config, transport), Some(worker))
            }
            Err(e) => {
                wasm_warn!("Worker failed to start: {}", e);
                (WebEditor::without_worker(config, e.to_string()), None)
            }
        };

        let editor = match LocalStorage::open() {
            Ok(storage) => editor.with_storage(Box::new(storage)),
            Err(e) => {
                wasm_warn!("Persistence disabled: {}", e);
                editor
            }
        };

        let inner = Rc::new(RefCell::new(Inner { editor, pending: None }));
        if inner.borrow_mut().editor.load_saved() {
            wasm_info!("Restored previous session");
        }

        let (on_message, on_error) = match worker {
            Some(worker) => {
                let (on_message, on_error) = worker_listeners(Rc::downgrade(&inner));
                worker.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
                worker.set_onerror(Some(on_error.as_ref().unchecked_ref()));
                (Some(on_message), Some(on_error))
            }
            None => (None, None),
        };

        Ok(PhraseEditorHandle {
            inner,
            _on_message: on_message,
            _on_error: on_error,
        })
    }

    // Operations

    /// Apply a registry operation to the working text.
    ///
    /// Resolves with the operation metrics, or `null` when there was nothing
    /// to do.
    #[wasm_bindgen(js_name = applyOperation)]
    pub fn apply_operation(&self, operation: &str, on_progress: Option<Function>) -> Promise {
        match OperationId::from_str(operation) {
            Ok(id) => self.dispatch(on_progress, |editor| editor.begin_operation(id)),
            Err(e) => Promise::reject(&js_error(e)),
        }
    }

    /// `options`: `{ search, replace, useRegex, caseSensitive }`
    #[wasm_bindgen(js_name = searchReplace)]
    pub fn search_replace(&self, options: JsValue, on_progress: Option<Function>) -> Promise {
        match deserialize::<SearchReplaceOptions>(options, "Invalid search options") {
            Ok(options) => self.dispatch(on_progress, |editor| editor.begin_search_replace(options)),
            Err(e) => Promise::reject(&e),
        }
    }

    #[wasm_bindgen(js_name = isBusy)]
    pub fn is_busy(&self) -> bool {
        self.inner.borrow().editor.is_busy()
    }

    pub fn progress(&self) -> Result<JsValue, JsValue> {
        let guard = self.inner.borrow();
        let view = match guard.editor.client() {
            Some(client) => ProgressView {
                is_busy: client.is_busy(),
                progress: client.progress(),
                processed_items: client.processed_items(),
                operation_type: client.operation_type().map(|kind| kind.as_str()),
            },
            None => ProgressView::default(),
        };
        serialize(&view, "Failed to serialize progress")
    }

    // Editing

    pub fn state(&self) -> Result<JsValue, JsValue> {
        let guard = self.inner.borrow();
        serialize(&EditorView::from(guard.editor.store()), "Failed to serialize editor state")
    }

    #[wasm_bindgen(js_name = workingText)]
    pub fn working_text(&self) -> String {
        self.inner.borrow().editor.store().working_text().to_string()
    }

    #[wasm_bindgen(js_name = setText)]
    pub fn set_text(&self, text: &str) -> Result<(), JsValue> {
        self.inner.borrow_mut().editor.edit_text(text).map_err(js_error)
    }

    #[wasm_bindgen(js_name = loadFile)]
    pub fn load_file(&self, name: &str, mime_type: &str, bytes: &[u8]) -> Result<(), JsValue> {
        let file = FileInfo::new(name, mime_type, bytes.len());
        self.inner
            .borrow_mut()
            .editor
            .load_file(&file, bytes)
            .map_err(js_error)
    }

    pub fn undo(&self) -> bool {
        self.inner.borrow_mut().editor.undo()
    }

    pub fn redo(&self) -> bool {
        self.inner.borrow_mut().editor.redo()
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.inner.borrow().editor.store().can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.inner.borrow().editor.store().can_redo()
    }

    #[wasm_bindgen(js_name = clearAll)]
    pub fn clear_all(&self) {
        self.inner.borrow_mut().editor.clear_all();
    }

    #[wasm_bindgen(js_name = textMetrics)]
    pub fn text_metrics(&self) -> Result<JsValue, JsValue> {
        let metrics = self.inner.borrow().editor.store().text_metrics();
        serialize(&metrics, "Failed to serialize text metrics")
    }

    #[wasm_bindgen(js_name = operationMetrics)]
    pub fn operation_metrics(&self) -> Result<JsValue, JsValue> {
        let guard = self.inner.borrow();
        serialize(&guard.editor.store().operation_metrics(), "Failed to serialize metrics")
    }

    // Output

    /// `{ fileName, mimeType, content }`, or `null` when there is no text
    pub fn export(&self, format: &str) -> Result<JsValue, JsValue> {
        let format = ExportFormat::from_str(format).map_err(js_error)?;
        let document = self.inner.borrow().editor.export(format);
        serialize(&document, "Failed to serialize export")
    }

    /// Copy the working text; resolves to whether the write succeeded
    #[wasm_bindgen(js_name = copyToClipboard)]
    pub fn copy_to_clipboard(&self) -> Promise {
        let text = self.working_text();
        future_to_promise(async move {
            if text.is_empty() {
                return Ok(JsValue::FALSE);
            }
            Ok(JsValue::from_bool(write_clipboard(&text).await))
        })
    }

    // Cache

    #[wasm_bindgen(js_name = cacheStats)]
    pub fn cache_stats(&self) -> Result<JsValue, JsValue> {
        let stats = self.inner.borrow().editor.cache_stats().unwrap_or_default();
        serialize(&stats, "Failed to serialize cache stats")
    }

    #[wasm_bindgen(js_name = clearCache)]
    pub fn clear_cache(&self) {
        self.inner.borrow_mut().editor.clear_cache();
    }

    // Persistence

    #[wasm_bindgen(js_name = saveNow)]
    pub fn save_now(&self) -> Result<(), JsValue> {
        self.inner
            .borrow_mut()
            .editor
            .save_now()
            .map(|_| ())
            .map_err(js_error)
    }

    /// Write an autosave the throttle held back; call on page hide
    #[wasm_bindgen(js_name = flushAutosave)]
    pub fn flush_autosave(&self) -> bool {
        self.inner.borrow_mut().editor.flush_autosave()
    }

    #[wasm_bindgen(js_name = storageInfo)]
    pub fn storage_info(&self) -> Result<JsValue, JsValue> {
        let info = self.inner.borrow().editor.storage_info();
        serialize(&info, "Failed to serialize storage info")
    }

    #[wasm_bindgen(js_name = recordCrash)]
    pub fn record_crash(&self, message: &str) {
        let user_agent = web_sys::window().and_then(|w| w.navigator().user_agent().ok());
        self.inner.borrow_mut().editor.record_crash(message, user_agent);
    }

    #[wasm_bindgen(js_name = resetData)]
    pub fn reset_data(&self) -> Result<(), JsValue> {
        self.inner.borrow_mut().editor.reset_data().map_err(js_error)
    }
}

impl PhraseEditorHandle {
    fn dispatch(
        &self,
        on_progress: Option<Function>,
        begin: impl FnOnce(&mut WebEditor) -> Result<Dispatch, EditorError>,
    ) -> Promise {
        let mut guard = self.inner.borrow_mut();
        match begin(&mut guard.editor) {
            Ok(Dispatch::Sent(_)) => {
                let mut call = None;
                let promise = Promise::new(&mut |resolve, reject| {
                    call = Some(PendingCall {
                        resolve,
                        reject,
                        on_progress: on_progress.clone(),
                    });
                });
                guard.pending = call;
                promise
            }
            Ok(Dispatch::Cached(metrics)) => match serialize(&metrics, "Failed to serialize metrics") {
                Ok(value) => Promise::resolve(&value),
                Err(e) => Promise::reject(&e),
            },
            Ok(Dispatch::Skipped) => Promise::resolve(&JsValue::NULL),
            Err(e) => Promise::reject(&js_error(e)),
        }
    }
}

fn worker_listeners(
    inner: Weak<RefCell<Inner>>,
) -> (Closure<dyn FnMut(MessageEvent)>, Closure<dyn FnMut(ErrorEvent)>) {
    let weak = inner.clone();
    let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let response: WorkerResponse = match serde_wasm_bindgen::from_value(event.data()) {
            Ok(response) => response,
            Err(e) => {
                wasm_warn!("Ignoring malformed worker message: {}", e);
                return;
            }
        };
        deliver(&inner, |editor| editor.handle_response(response));
    });

    let on_error = Closure::<dyn FnMut(ErrorEvent)>::new(move |event: ErrorEvent| {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        let message = event.message();
        wasm_error!("Worker error: {}", message);
        deliver(&inner, |editor| editor.abandon_operation(&message));
    });

    (on_message, on_error)
}

async fn write_clipboard(text: &str) -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    let navigator = window.navigator();
    let promise = Reflect::get(&navigator, &JsValue::from_str("clipboard"))
        .and_then(|clipboard| {
            let write = Reflect::get(&clipboard, &JsValue::from_str("writeText"))?
                .dyn_into::<Function>()?;
            write.call1(&clipboard, &JsValue::from_str(text))
        })
        .and_then(|result| result.dyn_into::<Promise>());

    match promise {
        Ok(promise) => match JsFuture::from(promise).await {
            Ok(_) => true,
            Err(e) => {
                wasm_warn!("Clipboard write rejected: {}", describe_js_error(&e));
                false
            }
        },
        Err(e) => {
            wasm_warn!("Clipboard unavailable: {}", describe_js_error(&e));
            false
        }
    }
}
