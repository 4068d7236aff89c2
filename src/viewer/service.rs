//! Viewer service - manages the worker pool

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use flume::{Receiver, RecvTimeoutError, Sender};
use log::debug;

use super::DEFAULT_WORKERS;
use super::backend::{DocumentHandle, DocumentResolver, RendererFactory};
use super::request::{DocumentRef, LoadId, WorkerRequest, WorkerResponse};
use super::sequence::PageRequest;
use super::worker::{CancelledLoads, viewer_worker};

/// Runs document resolution and page rendering off the UI thread
pub struct ViewerService {
    request_tx: Sender<WorkerRequest>,
    response_rx: Receiver<WorkerResponse>,
    /// Requests sent but not yet answered, per load
    outstanding: HashMap<LoadId, usize>,
    cancelled: CancelledLoads,
    num_workers: usize,
}

impl ViewerService {
    /// Create a new service with default worker count
    #[must_use]
    pub fn new(resolver: Arc<dyn DocumentResolver>, renderers: RendererFactory) -> Self {
        Self::with_workers(resolver, renderers, DEFAULT_WORKERS)
    }

    /// Create a new service with a custom worker count
    #[must_use]
    pub fn with_workers(
        resolver: Arc<dyn DocumentResolver>,
        renderers: RendererFactory,
        num_workers: usize,
    ) -> Self {
        // MPMC: every worker pulls from the same request queue.
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();
        let cancelled: CancelledLoads = Arc::new(Mutex::new(HashSet::new()));

        for _ in 0..num_workers.max(1) {
            let resolver = Arc::clone(&resolver);
            let renderers = Arc::clone(&renderers);
            let rx = request_rx.clone();
            let tx = response_tx.clone();
            let cancelled = Arc::clone(&cancelled);

            std::thread::spawn(move || {
                viewer_worker(resolver, renderers(), rx, tx, cancelled);
            });
        }

        Self {
            request_tx,
            response_rx,
            outstanding: HashMap::new(),
            cancelled,
            num_workers: num_workers.max(1),
        }
    }

    fn send(&mut self, id: LoadId, request: WorkerRequest) {
        if self.request_tx.send(request).is_ok() {
            *self.outstanding.entry(id).or_default() += 1;
        }
    }

    /// Queue a resolution tagged with `id`
    pub fn resolve(&mut self, id: LoadId, reference: DocumentRef) {
        self.send(id, WorkerRequest::Resolve { id, reference });
    }

    /// Queue a page render tagged with `id`
    pub fn render(&mut self, id: LoadId, document: DocumentHandle, request: PageRequest) {
        self.send(
            id,
            WorkerRequest::Render {
                id,
                document,
                request,
            },
        );
    }

    /// Drop interest in everything queued under `id`. Workers skip what they
    /// have not started; answers already underway are ignored upstream.
    pub fn cancel(&mut self, id: LoadId) {
        if self.outstanding.contains_key(&id) {
            debug!("Cancelling load {id}");
            self.cancelled
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .insert(id);
        }
    }

    /// Poll for worker answers without blocking
    pub fn poll_responses(&mut self) -> Vec<WorkerResponse> {
        let mut responses = vec![];

        while let Ok(response) = self.response_rx.try_recv() {
            self.settle(&response);
            responses.push(response);
        }

        responses
    }

    /// Block until one response arrives or `timeout` elapses
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<WorkerResponse> {
        match self.response_rx.recv_timeout(timeout) {
            Ok(response) => {
                self.settle(&response);
                Some(response)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    fn settle(&mut self, response: &WorkerResponse) {
        let id = response.id();
        let Some(count) = self.outstanding.get_mut(&id) else {
            return;
        };
        *count -= 1;
        if *count == 0 {
            self.outstanding.remove(&id);
            // Nothing of this load is queued any more; forget the marker.
            self.cancelled
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .remove(&id);
        }
    }

    /// Shutdown all workers
    pub fn shutdown(&self) {
        for _ in 0..self.num_workers {
            let _ = self.request_tx.send(WorkerRequest::Shutdown);
        }
    }
}

impl Drop for ViewerService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
