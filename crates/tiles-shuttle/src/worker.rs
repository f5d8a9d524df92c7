//! The reference Worker.
//!
//! Sits next to the tile code and turns its resource fetches into
//! `worker-request` messages. Responses are matched back to the waiting
//! fetch through a table of pending requests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tiles_protocol::{Envelope, InstanceId, Message, PathResponse, RequestId, WorkerResponse};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::config::WorkerConfig;
use crate::error::{ShuttleError, ShuttleResult};

type Pending = Arc<Mutex<HashMap<RequestId, oneshot::Sender<PathResponse>>>>;

/// The Worker task for one embedding.
pub(crate) struct Worker {
    id: InstanceId,
    to_shuttle: mpsc::UnboundedSender<Envelope>,
    from_shuttle: mpsc::UnboundedReceiver<Envelope>,
    pending: Pending,
    ready: bool,
}

impl Worker {
    /// Start a Worker. It answers `worker-load` once it arrives.
    pub(crate) fn spawn(
        id: InstanceId,
        to_shuttle: mpsc::UnboundedSender<Envelope>,
        from_shuttle: mpsc::UnboundedReceiver<Envelope>,
        config: WorkerConfig,
    ) -> (WorkerClient, JoinHandle<()>) {
        let pending: Pending = Arc::default();
        let client = WorkerClient {
            id: id.clone(),
            to_shuttle: to_shuttle.clone(),
            pending: Arc::clone(&pending),
            timeout: config.request_timeout,
        };
        let worker = Self {
            id,
            to_shuttle,
            from_shuttle,
            pending,
            ready: false,
        };
        (client, tokio::spawn(worker.run()))
    }

    async fn run(mut self) {
        while let Some(envelope) = self.from_shuttle.recv().await {
            self.handle(envelope);
        }

        let abandoned = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            let count = pending.len();
            pending.clear();
            count
        };
        debug!(instance = self.id.short(), abandoned, "Worker stopped");
    }

    fn handle(&mut self, envelope: Envelope) {
        if !self.id.matches(&envelope.id) {
            trace!(action = %envelope.action(), "Worker dropped message for another instance");
            return;
        }
        match envelope.message {
            Message::WorkerLoad { id } => {
                if self.ready || !self.id.matches(&id) {
                    debug!(instance = self.id.short(), "Ignored repeated or foreign worker-load");
                    return;
                }
                self.ready = true;
                let ready = Envelope::new(self.id.clone(), Message::WorkerReady { id });
                if self.to_shuttle.send(ready).is_err() {
                    debug!(instance = self.id.short(), "Shuttle gone before worker-ready");
                }
            },
            Message::WorkerResponse(response) => self.deliver(response),
            other => {
                debug!(action = %other.action(), "Worker dropped message it does not handle");
            },
        }
    }

    fn deliver(&self, response: WorkerResponse) {
        let waiter = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&response.request_id);
        match waiter {
            Some(waiter) => {
                trace!(request_id = %response.request_id, status = response.response.status, "Delivering response");
                let _ = waiter.send(response.response);
            },
            None => {
                debug!(request_id = %response.request_id, "Dropped response for unknown request");
            },
        }
    }
}

/// Handle the tile code uses to fetch its own resources through the Worker.
#[derive(Clone)]
pub struct WorkerClient {
    id: InstanceId,
    to_shuttle: mpsc::UnboundedSender<Envelope>,
    pending: Pending,
    timeout: Duration,
}

impl WorkerClient {
    /// Instance this Worker belongs to.
    #[must_use]
    pub fn instance_id(&self) -> &InstanceId {
        &self.id
    }

    /// Number of requests waiting for a response.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Fetch a tile path through the Frame.
    ///
    /// # Errors
    ///
    /// Returns [`ShuttleError::Timeout`] if no response arrives within the
    /// configured timeout, or [`ShuttleError::WorkerClosed`] if the
    /// embedding goes away first.
    pub async fn fetch(&self, path: &str) -> ShuttleResult<PathResponse> {
        let request_id = RequestId::generate();
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(request_id.clone(), tx);

        let request = Envelope::new(
            self.id.clone(),
            Message::resolve_path(path, request_id.clone()),
        );
        if self.to_shuttle.send(request).is_err() {
            self.forget(&request_id);
            return Err(ShuttleError::WorkerClosed);
        }
        trace!(%request_id, path, "Fetching through frame");

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(ShuttleError::WorkerClosed),
            Err(_) => {
                self.forget(&request_id);
                Err(ShuttleError::Timeout {
                    request_id,
                    timeout: self.timeout,
                })
            },
        }
    }

    fn forget(&self, request_id: &RequestId) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(request_id);
    }
}

impl std::fmt::Debug for WorkerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerClient")
            .field("instance", &self.id)
            .field("pending", &self.pending_count())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rig {
        id: InstanceId,
        client: WorkerClient,
        to_worker: mpsc::UnboundedSender<Envelope>,
        from_worker: mpsc::UnboundedReceiver<Envelope>,
        task: JoinHandle<()>,
    }

    fn rig(timeout: Duration) -> Rig {
        let id = InstanceId::generate();
        let (to_shuttle, from_worker) = mpsc::unbounded_channel();
        let (to_worker, from_shuttle) = mpsc::unbounded_channel();
        let (client, task) = Worker::spawn(
            id.clone(),
            to_shuttle,
            from_shuttle,
            WorkerConfig::default().with_request_timeout(timeout),
        );
        Rig {
            id,
            client,
            to_worker,
            from_worker,
            task,
        }
    }

    #[tokio::test]
    async fn test_worker_load_is_answered_once() {
        let mut rig = rig(Duration::from_secs(5));
        let load = Envelope::new(rig.id.clone(), Message::WorkerLoad { id: rig.id.clone() });

        rig.to_worker.send(load.clone()).unwrap();
        rig.to_worker.send(load).unwrap();

        let ready = rig.from_worker.recv().await.unwrap();
        assert_eq!(ready.message, Message::WorkerReady { id: rig.id.clone() });

        drop(rig.to_worker);
        rig.task.await.unwrap();
        assert!(rig.from_worker.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_fetch_resolves_on_matching_response() {
        let mut rig = rig(Duration::from_secs(5));
        let client = rig.client.clone();
        let fetch = tokio::spawn(async move { client.fetch("/index.html").await });

        let request = rig.from_worker.recv().await.unwrap();
        let Message::WorkerRequest(request) = request.message else {
            panic!("expected worker-request");
        };
        let unrelated = WorkerResponse {
            request_id: RequestId::new("someone-else"),
            response: PathResponse::new(500),
        };
        let answer = WorkerResponse {
            request_id: request.request_id().clone(),
            response: PathResponse::ok(b"<h1>hi</h1>".to_vec()),
        };
        rig.to_worker
            .send(Envelope::new(rig.id.clone(), Message::WorkerResponse(unrelated)))
            .unwrap();
        rig.to_worker
            .send(Envelope::new(rig.id.clone(), Message::WorkerResponse(answer)))
            .unwrap();

        let response = fetch.await.unwrap().unwrap();
        assert_eq!(response.body, b"<h1>hi</h1>");
        assert_eq!(rig.client.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_times_out_and_forgets_request() {
        let rig = rig(Duration::from_millis(20));

        let err = rig.client.fetch("/slow").await.unwrap_err();

        assert!(matches!(err, ShuttleError::Timeout { .. }));
        assert_eq!(rig.client.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_fails_when_worker_stops() {
        let mut rig = rig(Duration::from_secs(5));
        let client = rig.client.clone();
        let fetch = tokio::spawn(async move { client.fetch("/a").await });
        rig.from_worker.recv().await.unwrap();

        drop(rig.to_worker);

        let err = fetch.await.unwrap().unwrap_err();
        assert!(matches!(err, ShuttleError::WorkerClosed));
    }
}
