//! The reference Shuttle relay.
//!
//! Runs inside one embedding created by a
//! [`ChannelEmbedder`](tiles_frame::ChannelEmbedder). It boots on
//! `shuttle-load`, starts the Worker on `worker-load`, and relays messages
//! between the Worker and the Frame until `shuttle-unload`.

use tiles_frame::{Embedding, Inbound, MessageHub};
use tiles_protocol::{Direction, Envelope, InstanceId, Message};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::config::WorkerConfig;
use crate::error::{ShuttleError, ShuttleResult};
use crate::worker::{Worker, WorkerClient};

/// What the Shuttle has been told so far.
#[derive(Debug, Clone, Default)]
pub struct ShuttleView {
    /// Whether `shuttle-load` has been answered.
    pub booted: bool,
    /// Last applied title.
    pub title: Option<String>,
    /// Last applied icon path.
    pub icon: Option<String>,
    /// The Worker, once it has reported ready.
    pub worker: Option<WorkerClient>,
    /// Whether the embedding has been torn down.
    pub unloaded: bool,
}

struct WorkerLink {
    to_worker: mpsc::UnboundedSender<Envelope>,
    from_worker: mpsc::UnboundedReceiver<Envelope>,
    client: WorkerClient,
}

enum Flow {
    Continue,
    Stop,
}

/// Reference Shuttle for one embedding.
pub struct Shuttle {
    id: InstanceId,
    downlink: mpsc::UnboundedReceiver<Envelope>,
    hub: MessageHub,
    config: WorkerConfig,
    view: watch::Sender<ShuttleView>,
    worker: Option<WorkerLink>,
}

impl Shuttle {
    /// Run a Shuttle for `embedding`, posting upward into `hub`.
    #[must_use]
    pub fn spawn(embedding: Embedding, hub: MessageHub, config: WorkerConfig) -> ShuttleHandle {
        let (view, view_rx) = watch::channel(ShuttleView::default());
        let id = embedding.instance;
        debug!(instance = id.short(), origin = %embedding.origin, source = %embedding.source, "Starting shuttle");
        let shuttle = Self {
            id: id.clone(),
            downlink: embedding.downlink,
            hub,
            config,
            view,
            worker: None,
        };
        ShuttleHandle {
            id,
            view: view_rx,
            task: tokio::spawn(shuttle.run()),
        }
    }

    async fn run(mut self) {
        self.hub.post(Inbound::ContentLoaded {
            id: self.id.clone(),
        });

        loop {
            tokio::select! {
                down = self.downlink.recv() => match down {
                    Some(envelope) => {
                        if let Flow::Stop = self.on_down(envelope) {
                            break;
                        }
                    },
                    None => {
                        debug!(instance = self.id.short(), "Downlink closed");
                        break;
                    },
                },
                Some(up) = recv_worker(self.worker.as_mut()) => self.on_worker(up),
            }
        }

        self.shutdown();
    }

    fn on_down(&mut self, envelope: Envelope) -> Flow {
        if !self.id.matches(&envelope.id) {
            trace!(action = %envelope.action(), "Shuttle dropped message for another instance");
            return Flow::Continue;
        }

        match envelope.message {
            Message::ShuttleLoad { id } => {
                if self.id.matches(&id) {
                    self.post_up(Message::ShuttleReady { id });
                    self.view.send_modify(|view| view.booted = true);
                }
            },
            Message::ShuttleSetTitle { title } => {
                info!(instance = self.id.short(), %title, "Tile title set");
                self.view.send_modify(|view| view.title = Some(title));
            },
            Message::ShuttleSetIcon { path } => {
                info!(instance = self.id.short(), %path, "Tile icon set");
                self.view.send_modify(|view| view.icon = Some(path));
            },
            Message::ShuttleUnload { .. } => {
                debug!(instance = self.id.short(), "Unload requested");
                return Flow::Stop;
            },
            message @ Message::WorkerLoad { .. } => {
                if self.worker.is_none() {
                    self.start_worker();
                }
                self.forward_to_worker(message);
            },
            message @ Message::WorkerResponse(_) => self.forward_to_worker(message),
            message @ (Message::ShuttleReady { .. }
            | Message::WorkerReady { .. }
            | Message::WorkerRequest(_)
            | Message::Warn(_)
            | Message::Error(_)) => {
                debug!(action = %message.action(), "Shuttle dropped upward message received from outside");
            },
        }
        Flow::Continue
    }

    fn on_worker(&mut self, envelope: Envelope) {
        let action = envelope.action();
        if !self.id.matches(&envelope.id) || action.direction() != Direction::Up {
            warn!(%action, "Shuttle refused message from worker");
            return;
        }

        let ready = matches!(envelope.message, Message::WorkerReady { .. });
        self.post_up(envelope.message);
        if ready && let Some(link) = &self.worker {
            let client = link.client.clone();
            self.view.send_modify(|view| view.worker = Some(client));
        }
    }

    fn start_worker(&mut self) {
        let (to_shuttle, from_worker) = mpsc::unbounded_channel();
        let (to_worker, from_shuttle) = mpsc::unbounded_channel();
        let (client, _task) =
            Worker::spawn(self.id.clone(), to_shuttle, from_shuttle, self.config);
        debug!(instance = self.id.short(), "Worker started");
        self.worker = Some(WorkerLink {
            to_worker,
            from_worker,
            client,
        });
    }

    fn forward_to_worker(&self, message: Message) {
        let Some(link) = &self.worker else {
            debug!(action = %message.action(), "No worker, dropping message");
            return;
        };
        if link
            .to_worker
            .send(Envelope::new(self.id.clone(), message))
            .is_err()
        {
            debug!(instance = self.id.short(), "Worker gone, dropping message");
        }
    }

    /// Messages cross the boundary encoded, the same way an untrusted
    /// context would post them.
    fn post_up(&self, message: Message) {
        let envelope = Envelope::new(self.id.clone(), message);
        match envelope.encode() {
            Ok(wire) => {
                self.hub.post(Inbound::Wire(wire));
            },
            Err(e) => warn!(action = %envelope.action(), error = %e, "Failed to encode message"),
        }
    }

    fn shutdown(&mut self) {
        // Closing the worker's inbox stops it and fails its pending fetches.
        if self.worker.take().is_some() {
            debug!(instance = self.id.short(), "Worker released");
        }
        self.view.send_modify(|view| {
            view.worker = None;
            view.unloaded = true;
        });
        info!(instance = self.id.short(), "Shuttle stopped");
    }
}

async fn recv_worker(link: Option<&mut WorkerLink>) -> Option<Envelope> {
    match link {
        Some(link) => link.from_worker.recv().await,
        None => std::future::pending().await,
    }
}

/// Host-side handle on a running [`Shuttle`].
#[derive(Debug)]
pub struct ShuttleHandle {
    id: InstanceId,
    view: watch::Receiver<ShuttleView>,
    task: JoinHandle<()>,
}

impl ShuttleHandle {
    /// Instance the Shuttle runs for.
    #[must_use]
    pub fn instance_id(&self) -> &InstanceId {
        &self.id
    }

    /// Current state of the Shuttle.
    #[must_use]
    pub fn view(&self) -> ShuttleView {
        self.view.borrow().clone()
    }

    /// Wait until the Worker is ready and return its client.
    ///
    /// # Errors
    ///
    /// Returns [`ShuttleError::Unloaded`] if the embedding is torn down
    /// first.
    pub async fn worker(&mut self) -> ShuttleResult<WorkerClient> {
        let view = self
            .view
            .wait_for(|view| view.worker.is_some() || view.unloaded)
            .await
            .map_err(|_| ShuttleError::Unloaded)?;
        view.worker.clone().ok_or(ShuttleError::Unloaded)
    }

    /// Wait until the embedding is torn down.
    pub async fn unloaded(&mut self) {
        let _ = self.view.wait_for(|view| view.unloaded).await;
    }

    /// Stop the Shuttle without waiting for `shuttle-unload`.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Wait for the Shuttle to stop and return its final view.
    ///
    /// # Errors
    ///
    /// Returns [`ShuttleError::Task`] if the Shuttle task panicked or was
    /// aborted.
    pub async fn join(self) -> ShuttleResult<ShuttleView> {
        self.task
            .await
            .map_err(|e| ShuttleError::Task(e.to_string()))?;
        Ok(self.view.borrow().clone())
    }
}
