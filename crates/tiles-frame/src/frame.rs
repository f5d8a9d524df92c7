//! The outward-facing frame and its lifecycle.

use std::sync::Arc;

use tiles_loader::{LoaderRegistry, Manifest, PathLoader, TileData};
use tiles_protocol::{Envelope, InstanceId, Message, PathResponse, WorkerRequest};
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace, warn};

use crate::config::FrameConfig;
use crate::embed::{EmbedRequest, Embedder, ShuttlePort};
use crate::error::FrameResult;
use crate::event::{FrameEvent, FrameEventReceiver, FrameEvents};
use crate::hub::{HubReceiver, Inbound, MessageHub};
use crate::proxy;
use crate::state::FrameState;

/// One live embedding.
struct Session {
    id: InstanceId,
    tile: Option<TileData>,
    port: Arc<dyn ShuttlePort>,
    requests: JoinSet<()>,
}

impl Session {
    fn path_loader(&self) -> Option<Arc<dyn PathLoader>> {
        self.tile.as_ref().map(|tile| Arc::clone(&tile.path_loader))
    }

    fn post(&self, message: Message) {
        let action = message.action();
        debug!(instance = self.id.short(), %action, "Sending message");
        if let Err(e) = self.port.post(Envelope::new(self.id.clone(), message)) {
            debug!(instance = self.id.short(), %action, error = %e, "Dropped outgoing message");
        }
    }
}

/// Embeds a tile and drives the Shuttle and Worker handshake.
///
/// A frame is driven by one owner: the host sets its source, then feeds it
/// everything arriving on the [`MessageHub`], either by calling
/// [`Frame::dispatch`] or by letting [`Frame::run`] pump the subscription.
/// Every inbound message is matched against the identifier of the current
/// embedding; anything else is ignored.
pub struct Frame {
    config: FrameConfig,
    registry: Arc<LoaderRegistry>,
    embedder: Arc<dyn Embedder>,
    events: FrameEvents,
    src: Option<String>,
    state: FrameState,
    inbound: Option<HubReceiver>,
    session: Option<Session>,
}

impl Frame {
    /// Create a detached frame with the default configuration.
    #[must_use]
    pub fn new(registry: Arc<LoaderRegistry>, embedder: Arc<dyn Embedder>) -> Self {
        Self::with_config(FrameConfig::default(), registry, embedder)
    }

    /// Create a detached frame.
    #[must_use]
    pub fn with_config(
        config: FrameConfig,
        registry: Arc<LoaderRegistry>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        let events = FrameEvents::with_capacity(config.event_capacity);
        Self {
            config,
            registry,
            embedder,
            events,
            src: None,
            state: FrameState::Idle,
            inbound: None,
            session: None,
        }
    }

    /// The frame's configuration.
    #[must_use]
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// The tile source, as last set.
    #[must_use]
    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    /// Whether the frame is subscribed to a hub.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inbound.is_some()
    }

    /// Identifier of the current embedding.
    #[must_use]
    pub fn instance_id(&self) -> Option<&InstanceId> {
        self.session.as_ref().map(|session| &session.id)
    }

    /// Manifest of the embedded tile, if a loader produced one.
    #[must_use]
    pub fn manifest(&self) -> Option<&Manifest> {
        self.session
            .as_ref()
            .and_then(|session| session.tile.as_ref())
            .map(|tile| &tile.manifest)
    }

    /// Subscribe to host-facing events.
    #[must_use]
    pub fn subscribe(&self) -> FrameEventReceiver {
        self.events.subscribe()
    }

    /// Attach to a hub and load the current source, if any.
    ///
    /// Connecting again replaces the previous subscription and restarts the
    /// lifecycle.
    ///
    /// # Errors
    ///
    /// Returns the loader error if the source fails to load, or the
    /// embedding error if the host cannot embed it. The frame stays
    /// connected and idle.
    pub async fn connect(&mut self, hub: &MessageHub) -> FrameResult<()> {
        self.inbound = Some(hub.subscribe());
        debug!("Frame connected");
        self.load().await
    }

    /// Set the tile source.
    ///
    /// While connected this tears down the current embedding and starts a
    /// new one; while detached the source is only stored.
    ///
    /// # Errors
    ///
    /// See [`Frame::connect`].
    pub async fn set_src(&mut self, src: impl Into<String>) -> FrameResult<()> {
        self.src = Some(src.into());
        if self.is_connected() {
            self.load().await
        } else {
            Ok(())
        }
    }

    /// Clear the source and tear down the current embedding.
    pub fn remove_src(&mut self) {
        self.src = None;
        self.teardown("source removed");
    }

    /// Tear down the current embedding and drop the hub subscription.
    pub fn disconnect(&mut self) {
        self.teardown("disconnected");
        if self.inbound.take().is_some() {
            debug!("Frame disconnected");
        }
    }

    /// Resolve a tile path through the embedded tile's path loader.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::TileNotLoaded`](crate::FrameError::TileNotLoaded)
    /// when no path loader is available, an invalid path error, or the path
    /// loader's own error.
    pub async fn resolve_path(&self, path: &str) -> FrameResult<PathResponse> {
        let loader = self.session.as_ref().and_then(Session::path_loader);
        proxy::resolve(loader, path).await
    }

    /// Receive and dispatch hub messages until the hub closes.
    ///
    /// Returns immediately when the frame is not connected.
    pub async fn run(&mut self) {
        while let Some(inbound) = self.next_inbound().await {
            self.dispatch(&inbound);
        }
    }

    /// Wait for the next hub message.
    pub async fn next_inbound(&mut self) -> Option<Arc<Inbound>> {
        self.inbound.as_mut()?.recv().await
    }

    /// Dispatch every hub message already posted, without waiting.
    ///
    /// Returns how many were dispatched.
    pub fn pump(&mut self) -> usize {
        let mut dispatched: usize = 0;
        while let Some(inbound) = self.inbound.as_mut().and_then(HubReceiver::try_recv) {
            self.dispatch(&inbound);
            dispatched = dispatched.saturating_add(1);
        }
        dispatched
    }

    /// React to one inbound message.
    pub fn dispatch(&mut self, inbound: &Inbound) {
        match inbound {
            Inbound::ContentLoaded { id } => self.on_content_loaded(id),
            Inbound::Message(envelope) => self.handle_message(envelope),
            Inbound::Wire(wire) => match Envelope::decode(wire) {
                Ok(envelope) => self.handle_message(&envelope),
                Err(e) => trace!(error = %e, "Dropped undecodable message"),
            },
        }
    }

    /// React to one decoded protocol message.
    pub fn handle_message(&mut self, envelope: &Envelope) {
        let Some(session) = self.session.as_mut() else {
            trace!(action = %envelope.action(), "Dropped message, nothing embedded");
            return;
        };
        if !session.id.matches(&envelope.id) {
            trace!(action = %envelope.action(), "Dropped message for another instance");
            return;
        }
        while session.requests.try_join_next().is_some() {}

        match &envelope.message {
            Message::ShuttleReady { id } => self.on_shuttle_ready(id),
            Message::WorkerReady { id } => self.on_worker_ready(id),
            Message::WorkerRequest(request) => self.on_worker_request(request),
            Message::Warn(args) => {
                warn!(instance = envelope.id.short(), args = %render(args), "Tile warning");
            },
            Message::Error(args) => {
                error!(instance = envelope.id.short(), args = %render(args), "Tile error");
            },
            Message::ShuttleLoad { .. }
            | Message::ShuttleSetTitle { .. }
            | Message::ShuttleSetIcon { .. }
            | Message::ShuttleUnload { .. }
            | Message::WorkerLoad { .. }
            | Message::WorkerResponse(_) => {
                debug!(action = %envelope.action(), "Dropped downward message received from inside");
            },
        }
    }

    async fn load(&mut self) -> FrameResult<()> {
        self.teardown("source changed");
        let Some(src) = self.src.clone() else {
            return Ok(());
        };

        self.transition(FrameState::AwaitingManifest);
        let tile = match self.registry.resolve(&src).await {
            Ok(tile) => tile,
            Err(e) => {
                warn!(%src, error = %e, "Failed to load tile");
                self.transition(FrameState::Idle);
                return Err(e.into());
            },
        };
        if tile.is_none() {
            warn!(%src, "No loader matched tile source");
        }

        let id = InstanceId::generate();
        let port = match self.embedder.embed(EmbedRequest {
            instance: &id,
            source: &src,
            origin: &self.config.load_origin,
        }) {
            Ok(port) => port,
            Err(e) => {
                warn!(%src, error = %e, "Failed to embed tile");
                self.transition(FrameState::Idle);
                return Err(e);
            },
        };

        info!(instance = id.short(), %src, "Embedded tile");
        self.session = Some(Session {
            id,
            tile,
            port,
            requests: JoinSet::new(),
        });
        self.transition(FrameState::Embedded);
        Ok(())
    }

    fn on_content_loaded(&mut self, id: &InstanceId) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if !session.id.matches(id) {
            trace!("Dropped content-loaded for another instance");
            return;
        }
        if self.state != FrameState::Embedded {
            debug!(state = %self.state, "Dropped content-loaded out of order");
            return;
        }
        session.post(Message::ShuttleLoad { id: id.clone() });
        self.transition(FrameState::AwaitingShuttleReady);
    }

    fn on_shuttle_ready(&mut self, id: &InstanceId) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if !session.id.matches(id) {
            trace!("Dropped shuttle-ready carrying another instance");
            return;
        }
        if self.state != FrameState::AwaitingShuttleReady {
            debug!(state = %self.state, "Dropped shuttle-ready out of order");
            return;
        }
        session.post(Message::WorkerLoad { id: id.clone() });
        self.transition(FrameState::AwaitingWorkerReady);
    }

    fn on_worker_ready(&mut self, id: &InstanceId) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if !session.id.matches(id) {
            trace!("Dropped worker-ready carrying another instance");
            return;
        }
        if self.state != FrameState::AwaitingWorkerReady {
            debug!(state = %self.state, "Dropped worker-ready out of order");
            return;
        }

        if let Some(manifest) = session.tile.as_ref().map(|tile| &tile.manifest) {
            if let Some(title) = manifest.title() {
                session.post(Message::ShuttleSetTitle {
                    title: title.to_string(),
                });
                self.events.publish(FrameEvent::TitleChanged(title.to_string()));
            }
            if let Some(icon) = manifest.primary_icon() {
                session.post(Message::ShuttleSetIcon {
                    path: icon.src.clone(),
                });
            }
        }

        self.transition(FrameState::Ready);
        self.events.publish(FrameEvent::Loaded);
    }

    fn on_worker_request(&mut self, request: &WorkerRequest) {
        if !self.state.is_ready() {
            debug!(state = %self.state, request_id = %request.request_id(), "Dropped worker request before ready");
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match request {
            WorkerRequest::ResolvePath(request) => {
                trace!(instance = session.id.short(), request_id = %request.request_id, path = %request.path, "Worker request");
                session.requests.spawn(proxy::answer(
                    session.id.clone(),
                    request.clone(),
                    session.path_loader(),
                    Arc::clone(&session.port),
                    self.events.clone(),
                ));
            },
        }
    }

    fn teardown(&mut self, reason: &str) {
        if let Some(mut session) = self.session.take() {
            session.requests.abort_all();
            session.post(Message::ShuttleUnload {
                id: session.id.clone(),
            });
            session.port.close();
            info!(instance = session.id.short(), reason, "Tore down embedding");
        }
        self.transition(FrameState::Idle);
    }

    fn transition(&mut self, to: FrameState) {
        if self.state != to {
            info!(from = %self.state, %to, "Frame state changed");
            self.state = to;
        }
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        self.teardown("frame dropped");
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("src", &self.src)
            .field("state", &self.state)
            .field("instance", &self.instance_id())
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

/// Join diagnostic arguments the way a console would print them.
fn render(args: &[serde_json::Value]) -> String {
    args.iter()
        .map(|arg| match arg {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_render_diagnostics() {
        assert_eq!(render(&[json!("missing"), json!(3), json!({"a": 1})]), "missing 3 {\"a\":1}");
        assert_eq!(render(&[]), "");
    }
}
