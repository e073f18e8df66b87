//! Editor state container
//!
//! `EditorStore` is the single owner of the editor's texts, history and
//! status flags. Every mutator emits a [`StoreEvent`] to the registered
//! subscribers after the state has changed, so views re-read what they need.

use std::fmt;

use crate::analysis::{analyze, normalize_text};
use crate::models::{OperationMetrics, TextMetrics};
use crate::undo::HistoryStack;

/// Change notification sent to subscribers
#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
    RawTextChanged,
    ProcessedTextChanged,
    HistoryChanged { can_undo: bool, can_redo: bool },
    OperationMetricsChanged,
    ProcessingChanged(bool),
    Cleared,
}

pub type SubscriberId = usize;

type Subscriber = Box<dyn FnMut(&StoreEvent)>;

pub struct EditorStore {
    raw_text: String,
    processed_text: String,
    text_metrics: TextMetrics,
    history: HistoryStack,
    operation_metrics: Option<OperationMetrics>,
    is_processing: bool,
    last_operation_timestamp: i64,
    subscribers: Vec<(SubscriberId, Subscriber)>,
    next_subscriber: SubscriberId,
}

impl fmt::Debug for EditorStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorStore")
            .field("raw_text_len", &self.raw_text.len())
            .field("processed_text_len", &self.processed_text.len())
            .field("history_len", &self.history.len())
            .field("history_index", &self.history.current_index())
            .field("is_processing", &self.is_processing)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Default for EditorStore {
    fn default() -> Self {
        Self::new(crate::undo::DEFAULT_MAX_ENTRIES)
    }
}

impl EditorStore {
    pub fn new(history_limit: usize) -> Self {
        Self {
            raw_text: String::new(),
            processed_text: String::new(),
            text_metrics: analyze(""),
            history: HistoryStack::new(history_limit),
            operation_metrics: None,
            is_processing: false,
            last_operation_timestamp: 0,
            subscribers: Vec::new(),
            next_subscriber: 0,
        }
    }

    // Getters

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn processed_text(&self) -> &str {
        &self.processed_text
    }

    /// The text operations act on: processed text when there is any,
    /// otherwise the raw input
    pub fn working_text(&self) -> &str {
        if self.processed_text.is_empty() {
            &self.raw_text
        } else {
            &self.processed_text
        }
    }

    /// Metrics of the raw text
    pub fn text_metrics(&self) -> TextMetrics {
        self.text_metrics
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn operation_metrics(&self) -> Option<&OperationMetrics> {
        self.operation_metrics.as_ref()
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    pub fn last_operation_timestamp(&self) -> i64 {
        self.last_operation_timestamp
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // Subscriptions

    pub fn subscribe(&mut self, subscriber: impl FnMut(&StoreEvent) + 'static) -> SubscriberId {
        let id = self.next_subscriber;
        self.next_subscriber += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    fn emit(&mut self, event: StoreEvent) {
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&event);
        }
    }

    fn emit_history(&mut self) {
        let event = StoreEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        };
        self.emit(event);
    }

    // Mutators

    /// Replace the raw text and recompute its metrics
    pub fn set_raw_text(&mut self, text: impl Into<String>) {
        self.raw_text = text.into();
        self.text_metrics = analyze(&self.raw_text);
        self.emit(StoreEvent::RawTextChanged);
    }

    /// A user edit of the input: the processed text restarts from the
    /// normalized input
    pub fn edit_raw_text(&mut self, text: impl Into<String>) {
        self.set_raw_text(text);
        let normalized = normalize_text(&self.raw_text);
        self.set_processed_text(normalized);
    }

    pub fn set_processed_text(&mut self, text: impl Into<String>) {
        self.processed_text = text.into();
        self.emit(StoreEvent::ProcessedTextChanged);
    }

    pub fn set_operation_metrics(&mut self, metrics: Option<OperationMetrics>) {
        self.operation_metrics = metrics;
        self.emit(StoreEvent::OperationMetricsChanged);
    }

    pub fn set_processing(&mut self, processing: bool) {
        if self.is_processing != processing {
            self.is_processing = processing;
            self.emit(StoreEvent::ProcessingChanged(processing));
        }
    }

    pub fn set_last_operation_timestamp(&mut self, timestamp: i64) {
        self.last_operation_timestamp = timestamp;
    }

    pub fn add_to_history(&mut self, text: impl Into<String>) {
        self.history.push(text);
        self.emit_history();
    }

    pub fn reset_history(&mut self, text: impl Into<String>) {
        self.history.reset(text);
        self.emit_history();
    }

    /// Swap in a history restored from storage
    pub fn replace_history(&mut self, history: HistoryStack) {
        self.history = history;
        self.emit_history();
    }

    /// Step back; the processed text becomes the previous snapshot
    pub fn undo(&mut self) -> bool {
        let Some(text) = self.history.undo().map(str::to_string) else {
            return false;
        };
        self.set_processed_text(text);
        self.emit_history();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(text) = self.history.redo().map(str::to_string) else {
            return false;
        };
        self.set_processed_text(text);
        self.emit_history();
        true
    }

    /// Empty both texts, drop metrics and collapse history to the baseline
    pub fn clear_all(&mut self) {
        self.raw_text.clear();
        self.processed_text.clear();
        self.text_metrics = analyze("");
        self.operation_metrics = None;
        self.history.reset("");
        self.emit(StoreEvent::Cleared);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording_store() -> (EditorStore, Rc<RefCell<Vec<StoreEvent>>>) {
        let mut store = EditorStore::default();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        store.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        (store, events)
    }

    #[test]
    fn test_raw_text_recomputes_metrics() {
        let (mut store, events) = recording_store();
        store.set_raw_text("a b\n\nc");

        assert_eq!(store.text_metrics().total_lines, 3);
        assert_eq!(store.text_metrics().word_count, 3);
        assert_eq!(events.borrow().as_slice(), &[StoreEvent::RawTextChanged]);
    }

    #[test]
    fn test_edit_seeds_processed_text_with_normalized_input() {
        let mut store = EditorStore::default();
        store.edit_raw_text("a\tb  \n\n");

        assert_eq!(store.raw_text(), "a\tb  \n\n");
        assert_eq!(store.processed_text(), "a  b");
        assert_eq!(store.working_text(), "a  b");
    }

    #[test]
    fn test_undo_restores_previous_snapshot() {
        let (mut store, events) = recording_store();
        store.reset_history("x");
        store.add_to_history("y");
        events.borrow_mut().clear();

        assert!(store.undo());
        assert_eq!(store.processed_text(), "x");
        assert_eq!(
            events.borrow().as_slice(),
            &[
                StoreEvent::ProcessedTextChanged,
                StoreEvent::HistoryChanged { can_undo: false, can_redo: true },
            ]
        );
        assert!(!store.undo());
        assert!(store.redo());
        assert_eq!(store.processed_text(), "y");
    }

    #[test]
    fn test_processing_flag_only_emits_on_change() {
        let (mut store, events) = recording_store();
        store.set_processing(true);
        store.set_processing(true);
        store.set_processing(false);

        assert_eq!(
            events.borrow().as_slice(),
            &[StoreEvent::ProcessingChanged(true), StoreEvent::ProcessingChanged(false)]
        );
    }

    #[test]
    fn test_unsubscribe_stops_events() {
        let mut store = EditorStore::default();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let id = store.subscribe(move |_| *sink.borrow_mut() += 1);

        store.set_raw_text("a");
        assert!(store.unsubscribe(id));
        store.set_raw_text("b");

        assert_eq!(*count.borrow(), 1);
        assert!(!store.unsubscribe(id));
    }

    #[test]
    fn test_clear_all() {
        let mut store = EditorStore::default();
        store.edit_raw_text("a");
        store.add_to_history("A");
        store.clear_all();

        assert_eq!(store.raw_text(), "");
        assert_eq!(store.processed_text(), "");
        assert_eq!(store.history().len(), 1);
        assert!(store.operation_metrics().is_none());
    }
}
