//! Editor controller
//!
//! `PhraseEditor` ties the state container to the execution engine, the
//! result cache and persistence. An operation runs in two halves:
//!
//! 1. [`begin_operation`](PhraseEditor::begin_operation) checks the busy
//!    guard and the cache, then dispatches a request to the worker.
//! 2. [`handle_response`](PhraseEditor::handle_response) is fed every worker
//!    message; on success it records metrics, pushes the result onto the
//!    history and fills the cache. A failure leaves text and history as they
//!    were.

use serde_json::Value;

use crate::analysis::text_difference;
use crate::cache::{CacheStats, OperationCache};
use crate::config::EditorConfig;
use crate::engine::{ExecutionClient, ExecutionEvent, Request, Transport, WorkerResponse};
use crate::errors::{EditorError, EngineError, Result, StorageError};
use crate::io::{export_text, import_file, validate_text, ExportDocument, ExportFormat, FileInfo};
use crate::models::{EditorStore, OperationId, OperationIdentifier, OperationMetrics};
use crate::storage::{PersistedState, SaveOutcome, StateStore, StorageBackend, StorageInfo};
use crate::transforms::{split_lines, SearchReplaceOptions};
use crate::utils::{Clock, PerformanceMonitor, Stopwatch, SystemClock, Throttle};

/// What `begin_*` did with the request
#[derive(Clone, Debug, PartialEq)]
pub enum Dispatch {
    /// Sent to the worker under this correlation id
    Sent(String),
    /// Answered from the cache; the operation is already complete
    Cached(OperationMetrics),
    /// Nothing to do (blank text or empty search)
    Skipped,
}

/// Result of feeding a worker message to the editor
#[derive(Clone, Debug, PartialEq)]
pub enum EditorUpdate {
    Progress { progress: u8, processed: usize },
    Completed(OperationMetrics),
    Failed(EngineError),
}

struct PendingOperation {
    request_id: String,
    operation: OperationIdentifier,
    input: String,
    cache_options: Value,
    stopwatch: Stopwatch,
}

type Storage<C> = StateStore<Box<dyn StorageBackend>, C>;

pub struct PhraseEditor<T: Transport, C: Clock + Clone = SystemClock> {
    config: EditorConfig,
    store: EditorStore,
    client: Option<ExecutionClient<T>>,
    worker_error: Option<String>,
    cache: Option<OperationCache<C>>,
    storage: Option<Storage<C>>,
    autosave: Throttle<C>,
    performance: PerformanceMonitor,
    pending: Option<PendingOperation>,
    clock: C,
}

impl<T: Transport> PhraseEditor<T, SystemClock> {
    pub fn new(config: EditorConfig, transport: T) -> Self {
        Self::with_clock(config, Ok(transport), SystemClock)
    }

    /// An editor whose worker failed to start. Editing, history and export
    /// keep working; operations fail with `WorkerUnavailable`.
    pub fn without_worker(config: EditorConfig, reason: impl Into<String>) -> Self {
        Self::with_clock(config, Err(EngineError::WorkerUnavailable(reason.into())), SystemClock)
    }
}

impl<T: Transport, C: Clock + Clone> PhraseEditor<T, C> {
    pub fn with_clock(config: EditorConfig, transport: std::result::Result<T, EngineError>, clock: C) -> Self {
        let (client, worker_error) = match transport {
            Ok(transport) => (Some(ExecutionClient::new(transport)), None),
            Err(e) => {
                log::error!("{}", e);
                let reason = match e {
                    EngineError::WorkerUnavailable(reason) => reason,
                    other => other.to_string(),
                };
                (None, Some(reason))
            }
        };

        let cache = config.cache_enabled.then(|| {
            OperationCache::with_clock(config.cache_max_bytes, config.cache_max_age_ms, clock.clone())
        });

        Self {
            store: EditorStore::new(config.history_limit),
            client,
            worker_error,
            cache,
            storage: None,
            autosave: Throttle::new(clock.clone(), config.autosave_interval_ms),
            performance: PerformanceMonitor::new(),
            pending: None,
            clock,
            config,
        }
    }

    /// Attach a storage backend for autosave and restore
    pub fn with_storage(mut self, backend: Box<dyn StorageBackend>) -> Self {
        self.storage = Some(StateStore::with_clock(backend, &self.config, self.clock.clone()));
        self
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &EditorStore {
        &self.store
    }

    /// Mutable access for subscriptions
    pub fn store_mut(&mut self) -> &mut EditorStore {
        &mut self.store
    }

    pub fn client(&self) -> Option<&ExecutionClient<T>> {
        self.client.as_ref()
    }

    pub fn client_mut(&mut self) -> Option<&mut ExecutionClient<T>> {
        self.client.as_mut()
    }

    pub fn is_busy(&self) -> bool {
        self.store.is_processing() || self.client.as_ref().is_some_and(|c| c.is_busy())
    }

    pub fn performance(&self) -> &PerformanceMonitor {
        &self.performance
    }

    // Operations

    pub fn begin_operation(&mut self, id: OperationId) -> Result<Dispatch> {
        self.begin(id.into(), Value::Null, |text| Request::for_operation(id, text))
    }

    pub fn begin_search_replace(&mut self, options: SearchReplaceOptions) -> Result<Dispatch> {
        if options.search.is_empty() {
            return Ok(Dispatch::Skipped);
        }
        let cache_options = serde_json::to_value(&options).unwrap_or(Value::Null);
        self.begin(OperationIdentifier::SearchReplace, cache_options, |text| {
            Request::search_replace(text, options)
        })
    }

    fn begin(
        &mut self,
        operation: OperationIdentifier,
        cache_options: Value,
        build: impl FnOnce(String) -> Request,
    ) -> Result<Dispatch> {
        if self.is_busy() {
            return Err(EngineError::Busy.into());
        }

        let input = self.store.working_text().to_string();
        if input.trim().is_empty() {
            return Ok(Dispatch::Skipped);
        }

        let stopwatch = Stopwatch::start();
        let cached = self
            .cache
            .as_mut()
            .and_then(|cache| cache.get(&input, operation.as_str(), &cache_options));
        if let Some(result) = cached {
            let pending = PendingOperation {
                request_id: String::new(),
                operation,
                input,
                cache_options,
                stopwatch,
            };
            let metrics = self.complete(pending, result, false);
            return Ok(Dispatch::Cached(metrics));
        }

        let client = self.client.as_mut().ok_or_else(|| {
            EngineError::WorkerUnavailable(
                self.worker_error
                    .clone()
                    .unwrap_or_else(|| "worker not initialized".to_string()),
            )
        })?;
        let request_id = client.submit(build(input.clone()))?;

        self.store.set_processing(true);
        self.pending = Some(PendingOperation {
            request_id: request_id.clone(),
            operation,
            input,
            cache_options,
            stopwatch,
        });
        Ok(Dispatch::Sent(request_id))
    }

    /// Feed one worker message in. Messages for other requests are ignored.
    pub fn handle_response(&mut self, response: WorkerResponse) -> Option<EditorUpdate> {
        let event = self.client.as_mut()?.receive(response)?;
        self.handle_event(event)
    }

    /// Fail the in-flight operation after the worker died
    pub fn abandon_operation(&mut self, reason: &str) -> Option<EditorUpdate> {
        let event = self.client.as_mut()?.abandon(reason)?;
        self.handle_event(event)
    }

    fn handle_event(&mut self, event: ExecutionEvent) -> Option<EditorUpdate> {
        match event {
            ExecutionEvent::Progress { progress, processed } => {
                log::debug!("Progress: {}%, rows processed: {}", progress, processed);
                Some(EditorUpdate::Progress { progress, processed })
            }
            ExecutionEvent::Completed { result, .. } => {
                let pending = self.pending.take()?;
                Some(EditorUpdate::Completed(self.complete(pending, result, true)))
            }
            ExecutionEvent::Failed(e) => {
                if let Some(pending) = self.pending.take() {
                    log::error!("Operation {} failed: {}", pending.operation, e);
                }
                self.store.set_processing(false);
                Some(EditorUpdate::Failed(e))
            }
        }
    }

    fn complete(&mut self, pending: PendingOperation, result: String, fill_cache: bool) -> OperationMetrics {
        let execution_time_ms = pending.stopwatch.elapsed_ms();
        let input_lines = split_lines(&pending.input);
        let result_lines = split_lines(&result);
        let metrics = OperationMetrics {
            operation: pending.operation,
            execution_time_ms,
            lines_processed: input_lines.len(),
            lines_changed: text_difference(&input_lines, &result_lines).changed,
        };

        if fill_cache {
            if let Some(cache) = self.cache.as_mut() {
                cache.set(&pending.input, pending.operation.as_str(), &pending.cache_options, result.clone());
            }
        }

        log::info!(
            "Operation {} finished in {:.1}ms ({} lines, {} changed)",
            pending.operation,
            execution_time_ms,
            metrics.lines_processed,
            metrics.lines_changed
        );
        if !pending.request_id.is_empty() {
            log::debug!("Request {} complete", pending.request_id);
        }
        self.performance
            .record_measurement(pending.operation.as_str(), execution_time_ms);

        self.store.set_processed_text(result.clone());
        self.store.set_operation_metrics(Some(metrics.clone()));
        self.store.add_to_history(result);
        self.store.set_last_operation_timestamp(self.clock.now_ms());
        self.store.set_processing(false);
        self.autosave();

        metrics
    }

    // Editing

    /// Replace the input text as typed or pasted
    pub fn edit_text(&mut self, text: &str) -> Result<()> {
        validate_text(text, &self.config)?;
        self.store.edit_raw_text(text);
        self.autosave();
        Ok(())
    }

    /// Validate and load a file; history restarts from its content
    pub fn load_file(&mut self, file: &FileInfo, bytes: &[u8]) -> Result<()> {
        let content = import_file(file, bytes, &self.config)?;
        log::info!("Loaded '{}' ({} bytes)", file.name, bytes.len());

        self.store.set_raw_text(content.clone());
        self.store.set_processed_text("");
        self.store.set_operation_metrics(None);
        self.store.reset_history(content);
        self.autosave();
        Ok(())
    }

    pub fn undo(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }
        let changed = self.store.undo();
        if changed {
            self.autosave();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }
        let changed = self.store.redo();
        if changed {
            self.autosave();
        }
        changed
    }

    pub fn clear_all(&mut self) {
        self.store.clear_all();
        self.autosave();
    }

    /// Render the current text for download; `None` when there is nothing
    /// to export
    pub fn export(&self, format: ExportFormat) -> Option<ExportDocument> {
        let text = self.store.working_text();
        (!text.is_empty()).then(|| export_text(text, format))
    }

    // Cache

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(OperationCache::stats)
    }

    pub fn clear_cache(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }
    }

    // Persistence

    pub fn snapshot(&self) -> PersistedState {
        PersistedState::new(
            self.store.raw_text(),
            self.store.processed_text(),
            self.store.history(),
        )
    }

    pub fn restore(&mut self, state: &PersistedState) {
        self.store.set_raw_text(state.raw_text.clone());
        self.store.set_processed_text(state.processed_text.clone());
        self.store
            .replace_history(state.history_stack(self.config.history_limit));
    }

    /// Restore from storage, if anything was saved
    pub fn load_saved(&mut self) -> bool {
        let Some(state) = self.storage.as_ref().and_then(StateStore::load) else {
            return false;
        };
        self.restore(&state);
        log::info!("Restored saved state from {}", state.timestamp);
        true
    }

    pub fn save_now(&mut self) -> std::result::Result<SaveOutcome, StorageError> {
        let state = self.snapshot();
        let storage = self.storage.as_mut().ok_or(StorageError::Unavailable)?;
        storage.save(&state)
    }

    /// Throttled save; failures are logged and otherwise ignored
    pub fn autosave(&mut self) {
        if self.storage.is_none() {
            return;
        }
        let state = self.snapshot();
        let storage = &mut self.storage;
        self.autosave.call(|| save_logged(storage, &state));
    }

    /// Run an autosave that the throttle held back
    pub fn flush_autosave(&mut self) -> bool {
        if !self.autosave.is_pending() {
            return false;
        }
        let state = self.snapshot();
        let storage = &mut self.storage;
        self.autosave.flush(|| save_logged(storage, &state))
    }

    pub fn storage_info(&self) -> StorageInfo {
        self.storage
            .as_ref()
            .map(StateStore::info)
            .unwrap_or_default()
    }

    pub fn record_crash(&mut self, message: &str, user_agent: Option<String>) {
        let Some(storage) = self.storage.as_mut() else {
            return;
        };
        if let Err(e) = storage.record_crash(message, user_agent) {
            log::error!("Failed to record crash: {}", e);
        }
    }

    /// Wipe saved data and start over with an empty editor
    pub fn reset_data(&mut self) -> Result<()> {
        if let Some(storage) = self.storage.as_mut() {
            storage.reset_data().map_err(EditorError::from)?;
        }
        self.store.clear_all();
        self.clear_cache();
        Ok(())
    }
}

fn save_logged<C: Clock>(storage: &mut Option<Storage<C>>, state: &PersistedState) {
    let Some(storage) = storage.as_mut() else {
        return;
    };
    match storage.save(state) {
        Ok(SaveOutcome::Saved) => {}
        Ok(SaveOutcome::Truncated) => log::warn!("Saved a truncated state"),
        Err(e) => log::error!("Failed to save state: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{handle_request, WorkerRequest};
    use crate::errors::ImportError;
    use crate::storage::MemoryStorage;
    use crate::utils::ManualClock;

    /// Runs requests inline and queues the responses
    #[derive(Default)]
    struct InlineWorker {
        outbox: Vec<WorkerResponse>,
    }

    impl Transport for InlineWorker {
        fn post(&mut self, request: &WorkerRequest) -> std::result::Result<(), EngineError> {
            let outbox = &mut self.outbox;
            handle_request(request.clone(), 1000, |response| outbox.push(response));
            Ok(())
        }
    }

    type TestEditor = PhraseEditor<InlineWorker, ManualClock>;

    fn editor() -> TestEditor {
        PhraseEditor::with_clock(EditorConfig::default(), Ok(InlineWorker::default()), ManualClock::at(0))
    }

    fn pump(editor: &mut TestEditor) -> Vec<EditorUpdate> {
        let responses: Vec<WorkerResponse> = editor
            .client_mut()
            .map(|c| std::mem::take(&mut c.transport_mut().outbox))
            .unwrap_or_default();
        responses
            .into_iter()
            .filter_map(|r| editor.handle_response(r))
            .collect()
    }

    fn run(editor: &mut TestEditor, id: OperationId) -> Option<EditorUpdate> {
        editor.begin_operation(id).unwrap();
        pump(editor).pop()
    }

    #[test]
    fn test_operation_updates_text_history_and_metrics() {
        let mut editor = editor();
        editor.edit_text("b\na\nc\n\n").unwrap();

        match run(&mut editor, OperationId::RemoveEmptyLines) {
            Some(EditorUpdate::Completed(metrics)) => {
                assert_eq!(metrics.operation, OperationIdentifier::Transform(OperationId::RemoveEmptyLines));
                assert_eq!(metrics.lines_processed, 3);
            }
            other => panic!("unexpected update {:?}", other),
        }
        assert_eq!(editor.store().processed_text(), "b\na\nc");
        assert!(!editor.is_busy());

        run(&mut editor, OperationId::SortAsc);
        assert_eq!(editor.store().processed_text(), "a\nb\nc");
        assert_eq!(editor.store().history().len(), 3);
    }

    #[test]
    fn test_second_operation_while_busy_is_rejected() {
        let mut editor = editor();
        editor.edit_text("abc").unwrap();
        editor.begin_operation(OperationId::Uppercase).unwrap();

        assert_eq!(
            editor.begin_operation(OperationId::Lowercase),
            Err(EditorError::Engine(EngineError::Busy))
        );
        assert!(!editor.undo());

        pump(&mut editor);
        assert_eq!(editor.store().processed_text(), "ABC");
    }

    #[test]
    fn test_failed_search_replace_keeps_text_and_history() {
        let mut editor = editor();
        editor.edit_text("abc").unwrap();
        let history_before = editor.store().history().len();

        editor
            .begin_search_replace(SearchReplaceOptions::regex("(", "x"))
            .unwrap();
        let updates = pump(&mut editor);

        assert!(matches!(updates.last(), Some(EditorUpdate::Failed(_))));
        assert_eq!(editor.store().processed_text(), "abc");
        assert_eq!(editor.store().history().len(), history_before);
        assert!(!editor.is_busy());
    }

    #[test]
    fn test_blank_text_is_skipped() {
        let mut editor = editor();
        editor.edit_text("  \n ").unwrap();
        assert_eq!(editor.begin_operation(OperationId::Uppercase), Ok(Dispatch::Skipped));
    }

    #[test]
    fn test_repeat_operation_is_served_from_cache() {
        let mut editor = editor();
        editor.edit_text("b\na").unwrap();
        run(&mut editor, OperationId::SortAsc);

        editor.undo();
        let dispatch = editor.begin_operation(OperationId::SortAsc).unwrap();

        assert!(matches!(dispatch, Dispatch::Cached(_)));
        assert_eq!(editor.store().processed_text(), "a\nb");
        assert_eq!(editor.cache_stats().map(|s| s.hits), Some(1));
    }

    #[test]
    fn test_missing_worker_fails_only_the_operation() {
        let mut editor: TestEditor = PhraseEditor::with_clock(
            EditorConfig::default(),
            Err(EngineError::WorkerUnavailable("no worker".into())),
            ManualClock::at(0),
        );
        editor.edit_text("abc").unwrap();

        assert!(matches!(
            editor.begin_operation(OperationId::Uppercase),
            Err(EditorError::Engine(EngineError::WorkerUnavailable(_)))
        ));
        assert!(!editor.is_busy());
        assert!(editor.export(ExportFormat::Txt).is_some());
    }

    #[test]
    fn test_load_file_resets_history() {
        let mut editor = editor();
        editor.edit_text("old").unwrap();
        run(&mut editor, OperationId::Uppercase);

        editor
            .load_file(&FileInfo::new("list.txt", "text/plain", 3), b"new")
            .unwrap();

        assert_eq!(editor.store().raw_text(), "new");
        assert_eq!(editor.store().processed_text(), "");
        assert_eq!(editor.store().history().len(), 1);
        assert!(editor.store().operation_metrics().is_none());

        assert!(matches!(
            editor.load_file(&FileInfo::new("a.png", "image/png", 3), b"png"),
            Err(EditorError::Import(ImportError::FileTypeRejected(_)))
        ));
        assert_eq!(editor.store().raw_text(), "new");
    }

    #[test]
    fn test_autosave_is_throttled_and_restorable() {
        let clock = ManualClock::at(0);
        let mut editor: TestEditor =
            PhraseEditor::with_clock(EditorConfig::default(), Ok(InlineWorker::default()), clock.clone())
                .with_storage(Box::new(MemoryStorage::new()));

        editor.edit_text("first").unwrap();
        editor.edit_text("second").unwrap();
        assert_eq!(editor.storage_info().timestamp, Some(0));

        clock.advance(1_000);
        assert!(editor.flush_autosave());
        assert!(!editor.flush_autosave());

        let saved = editor.storage.as_ref().and_then(StateStore::load).unwrap();
        assert_eq!(saved.raw_text, "second");
        assert_eq!(saved.timestamp, 1_000);

        let mut restored: TestEditor =
            PhraseEditor::with_clock(EditorConfig::default(), Ok(InlineWorker::default()), clock.clone());
        restored.restore(&saved);
        assert_eq!(restored.store().raw_text(), "second");
        assert_eq!(restored.store().processed_text(), "second");
    }
}
