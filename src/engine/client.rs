//! Caller side of the execution boundary
//!
//! [`ExecutionClient`] owns the single in-flight slot. It hands requests to a
//! [`Transport`], matches responses back by correlation id and turns them
//! into [`ExecutionEvent`]s. The client never blocks; whoever owns the
//! transport feeds responses in as they arrive.

use uuid::Uuid;

use crate::errors::EngineError;

use super::protocol::{Request, RequestType, WorkerRequest, WorkerResponse};

/// Carries requests to a worker
pub trait Transport {
    fn post(&mut self, request: &WorkerRequest) -> Result<(), EngineError>;
}

/// What a response meant for the in-flight request
#[derive(Clone, Debug, PartialEq)]
pub enum ExecutionEvent {
    Progress { progress: u8, processed: usize },
    Completed { result: String, processed: usize },
    Failed(EngineError),
}

#[derive(Clone, Debug)]
struct InFlight {
    id: String,
    kind: RequestType,
}

/// Single-flight request/response client
pub struct ExecutionClient<T: Transport> {
    transport: T,
    in_flight: Option<InFlight>,
    progress: u8,
    processed_items: usize,
    last_kind: Option<RequestType>,
}

impl<T: Transport> ExecutionClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            in_flight: None,
            progress: 0,
            processed_items: 0,
            last_kind: None,
        }
    }

    /// Send `request` to the worker and return its correlation id.
    ///
    /// Fails with [`EngineError::Busy`] while another request is in flight.
    /// A transport failure leaves the client idle.
    pub fn submit(&mut self, request: Request) -> Result<String, EngineError> {
        if self.in_flight.is_some() {
            return Err(EngineError::Busy);
        }

        let kind = request.kind();
        let message = WorkerRequest::new(Uuid::new_v4().to_string(), request);

        self.progress = 0;
        self.processed_items = 0;
        self.last_kind = Some(kind);
        self.transport.post(&message)?;

        log::debug!("Dispatched {} request {}", kind.as_str(), message.id);
        self.in_flight = Some(InFlight {
            id: message.id.clone(),
            kind,
        });
        Ok(message.id)
    }

    /// Feed a worker response in.
    ///
    /// Returns `None` for responses that do not belong to the in-flight
    /// request. `SUCCESS` and `ERROR` both release the busy slot.
    pub fn receive(&mut self, response: WorkerResponse) -> Option<ExecutionEvent> {
        let in_flight = self.in_flight.as_ref()?;
        if response.id() != in_flight.id {
            log::debug!("Ignoring response for {}", response.id());
            return None;
        }

        let event = match response {
            WorkerResponse::Progress { payload, .. } => {
                self.progress = payload.progress;
                self.processed_items = payload.processed;
                return Some(ExecutionEvent::Progress {
                    progress: payload.progress,
                    processed: payload.processed,
                });
            }
            WorkerResponse::Success { payload, .. } => {
                self.progress = 100;
                self.processed_items = payload.processed;
                ExecutionEvent::Completed {
                    result: payload.result,
                    processed: payload.processed,
                }
            }
            WorkerResponse::Error { payload, .. } => ExecutionEvent::Failed(EngineError::Failed(payload.error)),
        };

        self.in_flight = None;
        Some(event)
    }

    /// Release the busy slot after the worker has gone away
    pub fn abandon(&mut self, reason: impl Into<String>) -> Option<ExecutionEvent> {
        self.in_flight
            .take()
            .map(|_| ExecutionEvent::Failed(EngineError::WorkerUnavailable(reason.into())))
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight_id(&self) -> Option<&str> {
        self.in_flight.as_ref().map(|f| f.id.as_str())
    }

    pub fn in_flight_kind(&self) -> Option<RequestType> {
        self.in_flight.as_ref().map(|f| f.kind)
    }

    /// Percent complete of the current (or last) request
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn processed_items(&self) -> usize {
        self.processed_items
    }

    /// Type of the current or most recent request
    pub fn operation_type(&self) -> Option<RequestType> {
        self.last_kind
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OperationId;

    #[derive(Default)]
    struct Recorder {
        sent: Vec<WorkerRequest>,
        fail: bool,
    }

    impl Transport for Recorder {
        fn post(&mut self, request: &WorkerRequest) -> Result<(), EngineError> {
            if self.fail {
                return Err(EngineError::WorkerUnavailable("closed".into()));
            }
            self.sent.push(request.clone());
            Ok(())
        }
    }

    fn uppercase(text: &str) -> Request {
        Request::for_operation(OperationId::Uppercase, text)
    }

    #[test]
    fn test_second_submit_while_busy_is_rejected() {
        let mut client = ExecutionClient::new(Recorder::default());
        client.submit(uppercase("a")).unwrap();

        assert!(client.is_busy());
        assert_eq!(client.submit(uppercase("b")), Err(EngineError::Busy));
        assert_eq!(client.transport().sent.len(), 1);
    }

    #[test]
    fn test_success_releases_busy_slot() {
        let mut client = ExecutionClient::new(Recorder::default());
        let id = client.submit(uppercase("a")).unwrap();

        let event = client.receive(WorkerResponse::success(id, "A".into(), 1));
        assert_eq!(
            event,
            Some(ExecutionEvent::Completed { result: "A".into(), processed: 1 })
        );
        assert!(!client.is_busy());
        assert_eq!(client.progress(), 100);
    }

    #[test]
    fn test_error_releases_busy_slot() {
        let mut client = ExecutionClient::new(Recorder::default());
        let id = client.submit(uppercase("a")).unwrap();

        let event = client.receive(WorkerResponse::error(id, "boom"));
        assert_eq!(event, Some(ExecutionEvent::Failed(EngineError::Failed("boom".into()))));
        assert!(!client.is_busy());
        assert!(client.submit(uppercase("b")).is_ok());
    }

    #[test]
    fn test_progress_keeps_request_in_flight() {
        let mut client = ExecutionClient::new(Recorder::default());
        let id = client.submit(uppercase("a")).unwrap();

        let event = client.receive(WorkerResponse::progress(id, 50, 1000));
        assert_eq!(event, Some(ExecutionEvent::Progress { progress: 50, processed: 1000 }));
        assert!(client.is_busy());
        assert_eq!(client.processed_items(), 1000);
    }

    #[test]
    fn test_foreign_ids_are_ignored() {
        let mut client = ExecutionClient::new(Recorder::default());
        client.submit(uppercase("a")).unwrap();

        assert_eq!(client.receive(WorkerResponse::success("other", "x".into(), 1)), None);
        assert!(client.is_busy());
    }

    #[test]
    fn test_transport_failure_leaves_client_idle() {
        let mut client = ExecutionClient::new(Recorder { fail: true, ..Default::default() });

        assert!(matches!(
            client.submit(uppercase("a")),
            Err(EngineError::WorkerUnavailable(_))
        ));
        assert!(!client.is_busy());
    }

    #[test]
    fn test_abandon_fails_in_flight_request() {
        let mut client = ExecutionClient::new(Recorder::default());
        client.submit(uppercase("a")).unwrap();

        assert!(matches!(
            client.abandon("terminated"),
            Some(ExecutionEvent::Failed(EngineError::WorkerUnavailable(_)))
        ));
        assert!(!client.is_busy());
        assert_eq!(client.abandon("again"), None);
    }
}
