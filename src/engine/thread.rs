//! Background-thread worker for native targets
//!
//! One OS thread drains a request channel and answers on a response
//! channel, speaking the same protocol as the browser worker.

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::errors::EngineError;

use super::client::Transport;
use super::protocol::{WorkerRequest, WorkerResponse};
use super::worker::handle_request;

pub struct ThreadWorker {
    request_tx: Option<Sender<WorkerRequest>>,
    response_rx: Receiver<WorkerResponse>,
    worker_thread: Option<JoinHandle<()>>,
}

impl ThreadWorker {
    pub fn spawn(batch_size: usize) -> Result<Self, EngineError> {
        let (request_tx, request_rx) = channel::<WorkerRequest>();
        let (response_tx, response_rx) = channel();

        let worker_thread = thread::Builder::new()
            .name("phrase-editor-worker".into())
            .spawn(move || {
                while let Ok(request) = request_rx.recv() {
                    handle_request(request, batch_size, |response| {
                        let _ = response_tx.send(response);
                    });
                }
                log::debug!("Worker thread shutting down");
            })
            .map_err(|e| EngineError::WorkerUnavailable(e.to_string()))?;

        Ok(Self {
            request_tx: Some(request_tx),
            response_rx,
            worker_thread: Some(worker_thread),
        })
    }

    pub fn try_recv(&self) -> Option<WorkerResponse> {
        match self.response_rx.try_recv() {
            Ok(response) => Some(response),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Wait up to `timeout` for the next response
    pub fn recv_timeout(&self, timeout: Duration) -> Result<WorkerResponse, EngineError> {
        self.response_rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => EngineError::Protocol("timed out waiting for worker".into()),
            RecvTimeoutError::Disconnected => {
                EngineError::WorkerUnavailable("worker thread has exited".into())
            }
        })
    }

    /// Close the request channel and wait for the thread to finish
    pub fn shutdown(&mut self) {
        self.request_tx.take();
        if let Some(handle) = self.worker_thread.take() {
            if handle.join().is_err() {
                log::error!("Worker thread panicked");
            }
        }
    }
}

impl Transport for ThreadWorker {
    fn post(&mut self, request: &WorkerRequest) -> Result<(), EngineError> {
        let tx = self
            .request_tx
            .as_ref()
            .ok_or_else(|| EngineError::WorkerUnavailable("worker has been shut down".into()))?;
        tx.send(request.clone())
            .map_err(|_| EngineError::WorkerUnavailable("worker thread has exited".into()))
    }
}

impl Drop for ThreadWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::client::{ExecutionClient, ExecutionEvent};
    use crate::engine::protocol::Request;
    use crate::models::OperationId;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_round_trip_through_thread() {
        let mut client = ExecutionClient::new(ThreadWorker::spawn(1000).unwrap());
        client
            .submit(Request::for_operation(OperationId::SortAsc, "c\nb\na"))
            .unwrap();

        let response = client.transport().recv_timeout(WAIT).unwrap();
        assert_eq!(
            client.receive(response),
            Some(ExecutionEvent::Completed { result: "a\nb\nc".into(), processed: 3 })
        );
    }

    #[test]
    fn test_progress_arrives_before_success() {
        let mut client = ExecutionClient::new(ThreadWorker::spawn(2).unwrap());
        client
            .submit(Request::for_operation(OperationId::Uppercase, "a\nb\nc\nd"))
            .unwrap();

        let mut events = Vec::new();
        while client.is_busy() {
            let response = client.transport().recv_timeout(WAIT).unwrap();
            events.extend(client.receive(response));
        }

        assert_eq!(
            events,
            vec![
                ExecutionEvent::Progress { progress: 50, processed: 2 },
                ExecutionEvent::Progress { progress: 100, processed: 4 },
                ExecutionEvent::Completed { result: "A\nB\nC\nD".into(), processed: 4 },
            ]
        );
    }

    #[test]
    fn test_post_after_shutdown_fails() {
        let mut worker = ThreadWorker::spawn(1000).unwrap();
        worker.shutdown();

        let request = WorkerRequest::new("x", Request::analyze("a"));
        assert!(matches!(
            worker.post(&request),
            Err(EngineError::WorkerUnavailable(_))
        ));
    }
}
