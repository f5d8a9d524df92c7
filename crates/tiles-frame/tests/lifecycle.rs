//! Frame lifecycle tests driven through a message hub and channel embedder.

use std::sync::Arc;
use std::time::Duration;

use tiles_frame::{
    ChannelEmbedder, Embedding, Frame, FrameError, FrameEvent, FrameEventReceiver, FrameState,
    Inbound, MessageHub,
};
use tiles_loader::{LoaderRegistry, Manifest, PathLoader};
use tiles_protocol::{Envelope, InstanceId, Message, PathResponse, RequestId, WorkerResponse};
use tiles_test::{
    MockLoader, MockPathLoader, TEST_ICONS, TEST_TITLE, test_manifest, test_manifest_bare,
};
use tokio::sync::mpsc;

struct Harness {
    hub: MessageHub,
    frame: Frame,
    embeddings: mpsc::UnboundedReceiver<Embedding>,
    events: FrameEventReceiver,
}

impl Harness {
    fn new(registry: Arc<LoaderRegistry>) -> Self {
        let hub = MessageHub::with_capacity(64);
        let (embedder, embeddings) = ChannelEmbedder::new();
        let frame = Frame::new(registry, Arc::new(embedder));
        let events = frame.subscribe();
        Self {
            hub,
            frame,
            embeddings,
            events,
        }
    }

    fn with_loader(loader: MockLoader) -> Self {
        let registry = Arc::new(LoaderRegistry::new());
        registry.register(Arc::new(loader));
        Self::new(registry)
    }

    fn with_path_loader(path_loader: MockPathLoader) -> Self {
        let path_loader: Arc<dyn PathLoader> = Arc::new(path_loader);
        Self::with_loader(MockLoader::new("mock").with_tile(test_manifest(), path_loader))
    }

    async fn embed(&mut self, src: &str) -> Embedding {
        self.frame.connect(&self.hub).await.unwrap();
        self.frame.set_src(src).await.unwrap();
        assert_eq!(self.frame.state(), FrameState::Embedded);
        self.embeddings.try_recv().unwrap()
    }

    fn post(&mut self, inbound: impl Into<Inbound>) {
        self.hub.post(inbound);
        self.frame.pump();
    }

    fn post_message(&mut self, id: &InstanceId, message: Message) {
        self.post(Envelope::new(id.clone(), message));
    }

    /// Walk an embedding through the full handshake.
    fn handshake(&mut self, embedding: &mut Embedding) {
        let id = embedding.instance.clone();

        self.post(Inbound::ContentLoaded { id: id.clone() });
        assert_eq!(
            next(embedding).message,
            Message::ShuttleLoad { id: id.clone() }
        );
        assert_eq!(self.frame.state(), FrameState::AwaitingShuttleReady);

        self.post_message(&id, Message::ShuttleReady { id: id.clone() });
        assert_eq!(next(embedding).message, Message::WorkerLoad { id: id.clone() });
        assert_eq!(self.frame.state(), FrameState::AwaitingWorkerReady);

        self.post_message(&id, Message::WorkerReady { id: id.clone() });
        assert_eq!(self.frame.state(), FrameState::Ready);
    }

    async fn ready(&mut self, src: &str) -> Embedding {
        let mut embedding = self.embed(src).await;
        self.handshake(&mut embedding);
        drain(&mut embedding);
        while self.events.try_recv().is_some() {}
        embedding
    }
}

fn next(embedding: &mut Embedding) -> Envelope {
    embedding.downlink.try_recv().unwrap()
}

/// Post once on a hub two frames share and let both dispatch it.
fn post_both(a: &mut Harness, b: &mut Harness, inbound: Inbound) {
    a.hub.post(inbound);
    a.frame.pump();
    b.frame.pump();
}

fn drain(embedding: &mut Embedding) -> Vec<Envelope> {
    let mut messages = Vec::new();
    while let Ok(envelope) = embedding.downlink.try_recv() {
        messages.push(envelope);
    }
    messages
}

async fn next_response(embedding: &mut Embedding) -> WorkerResponse {
    let envelope = tokio::time::timeout(Duration::from_secs(5), embedding.downlink.recv())
        .await
        .unwrap()
        .unwrap();
    match envelope.message {
        Message::WorkerResponse(response) => response,
        other => panic!("expected worker-response, got {other:?}"),
    }
}

#[tokio::test]
async fn test_handshake_applies_metadata_then_loads() {
    let mut h = Harness::with_loader(MockLoader::new("mock").with_manifest(test_manifest()));
    let mut embedding = h.embed("tile").await;

    h.handshake(&mut embedding);

    let sent: Vec<Message> = drain(&mut embedding)
        .into_iter()
        .map(|e| e.message)
        .collect();
    assert_eq!(
        sent,
        vec![
            Message::ShuttleSetTitle {
                title: TEST_TITLE.into()
            },
            Message::ShuttleSetIcon {
                path: TEST_ICONS[0].into()
            },
        ]
    );
    assert_eq!(
        h.events.try_recv(),
        Some(FrameEvent::TitleChanged(TEST_TITLE.into()))
    );
    assert_eq!(h.events.try_recv(), Some(FrameEvent::Loaded));
    assert_eq!(h.events.try_recv(), None);
}

#[tokio::test]
async fn test_bare_manifest_sends_no_metadata() {
    let mut h = Harness::with_loader(MockLoader::new("mock").with_manifest(test_manifest_bare()));
    let mut embedding = h.embed("tile").await;

    h.handshake(&mut embedding);

    assert!(drain(&mut embedding).is_empty());
    assert_eq!(h.events.try_recv(), Some(FrameEvent::Loaded));
}

#[tokio::test]
async fn test_mismatched_identifiers_have_no_effect() {
    let mut h = Harness::with_loader(MockLoader::new("mock").with_manifest(test_manifest()));
    let mut embedding = h.embed("tile").await;
    let id = embedding.instance.clone();
    let stranger = InstanceId::generate();

    h.post(Inbound::ContentLoaded {
        id: stranger.clone(),
    });
    assert_eq!(h.frame.state(), FrameState::Embedded);

    h.post(Inbound::ContentLoaded { id: id.clone() });
    next(&mut embedding);

    h.post_message(&stranger, Message::ShuttleReady { id: stranger.clone() });
    h.post_message(&stranger, Message::ShuttleReady { id: id.clone() });
    h.post_message(&id, Message::ShuttleReady { id: stranger.clone() });

    assert_eq!(h.frame.state(), FrameState::AwaitingShuttleReady);
    assert!(drain(&mut embedding).is_empty());
    assert_eq!(h.events.try_recv(), None);
}

#[tokio::test]
async fn test_out_of_order_ready_signals_are_dropped() {
    let mut h = Harness::with_loader(MockLoader::new("mock").with_manifest(test_manifest()));
    let mut embedding = h.embed("tile").await;
    let id = embedding.instance.clone();

    h.post_message(&id, Message::WorkerReady { id: id.clone() });
    h.post_message(&id, Message::ShuttleReady { id: id.clone() });

    assert_eq!(h.frame.state(), FrameState::Embedded);
    assert!(drain(&mut embedding).is_empty());

    h.post(Inbound::ContentLoaded { id: id.clone() });
    h.post_message(&id, Message::WorkerReady { id: id.clone() });

    assert_eq!(h.frame.state(), FrameState::AwaitingShuttleReady);
    assert_eq!(drain(&mut embedding).len(), 1);
}

#[tokio::test]
async fn test_resolve_path_before_embedding_is_tile_not_loaded() {
    let h = Harness::new(Arc::new(LoaderRegistry::new()));

    let err = h.frame.resolve_path("/index.html").await.unwrap_err();

    assert!(matches!(err, FrameError::TileNotLoaded));
}

#[tokio::test]
async fn test_unmatched_source_embeds_without_tile_data() {
    let mut h = Harness::with_loader(MockLoader::new("picky").only_for("known"));
    let mut embedding = h.embed("unknown").await;

    assert!(h.frame.manifest().is_none());
    assert!(matches!(
        h.frame.resolve_path("/").await,
        Err(FrameError::TileNotLoaded)
    ));

    h.handshake(&mut embedding);
    assert!(drain(&mut embedding).is_empty());
    assert_eq!(h.events.try_recv(), Some(FrameEvent::Loaded));
}

#[tokio::test]
async fn test_loader_failure_leaves_frame_idle() {
    let mut h = Harness::with_loader(MockLoader::new("broken").failing("disk on fire"));
    h.frame.connect(&h.hub).await.unwrap();

    let err = h.frame.set_src("tile").await.unwrap_err();

    assert!(matches!(err, FrameError::Loader(_)));
    assert_eq!(h.frame.state(), FrameState::Idle);
    assert!(h.frame.instance_id().is_none());
    assert!(h.embeddings.try_recv().is_err());
}

#[tokio::test]
async fn test_set_src_while_detached_only_stores() {
    let loader = MockLoader::new("mock").with_manifest(test_manifest());
    let mut h = Harness::with_loader(loader.clone());

    h.frame.set_src("tile").await.unwrap();

    assert_eq!(h.frame.src(), Some("tile"));
    assert_eq!(h.frame.state(), FrameState::Idle);
    assert_eq!(loader.calls(), 0);

    h.frame.connect(&h.hub).await.unwrap();
    assert_eq!(h.frame.state(), FrameState::Embedded);
    assert_eq!(loader.sources(), vec!["tile".to_string()]);
}

#[tokio::test]
async fn test_resolve_path_canonicalizes_before_delegating() {
    let path_loader = MockPathLoader::new().with_text("/icons/primary.png", "png");
    let recorder = path_loader.clone();
    let mut h = Harness::with_path_loader(path_loader);
    h.embed("tile").await;

    let response = h
        .frame
        .resolve_path("docs/../icons/./primary.png?v=2")
        .await
        .unwrap();

    assert_eq!(response.body, b"png");
    assert_eq!(recorder.requests(), vec!["/icons/primary.png".to_string()]);
}

#[tokio::test]
async fn test_each_worker_request_gets_one_correlated_response() {
    let mut h = Harness::with_path_loader(
        MockPathLoader::new()
            .with_text("/slow.js", "slow")
            .with_text("/fast.js", "fast")
            .with_delay("/slow.js", Duration::from_millis(50)),
    );
    let mut embedding = h.ready("tile").await;
    let id = embedding.instance.clone();

    h.post_message(&id, Message::resolve_path("/slow.js", RequestId::new("r-slow")));
    h.post_message(&id, Message::resolve_path("/fast.js", RequestId::new("r-fast")));

    let first = next_response(&mut embedding).await;
    let second = next_response(&mut embedding).await;

    assert_eq!(first.request_id.as_str(), "r-fast");
    assert_eq!(first.response.body, b"fast");
    assert_eq!(second.request_id.as_str(), "r-slow");
    assert_eq!(second.response.body, b"slow");

    let extra =
        tokio::time::timeout(Duration::from_millis(100), embedding.downlink.recv()).await;
    assert!(extra.is_err());
}

#[tokio::test]
async fn test_missing_resource_is_a_plain_404() {
    let mut h = Harness::with_path_loader(MockPathLoader::new());
    let mut embedding = h.ready("tile").await;
    let id = embedding.instance.clone();

    h.post_message(&id, Message::resolve_path("/nope", RequestId::new("r1")));

    let response = next_response(&mut embedding).await;
    assert_eq!(response.response, PathResponse::not_found());
    assert_eq!(h.events.try_recv(), None);
}

#[tokio::test]
async fn test_failed_request_answers_500_and_reports() {
    let mut h = Harness::with_path_loader(MockPathLoader::new().failing_on("/broken"));
    let mut embedding = h.ready("tile").await;
    let id = embedding.instance.clone();

    h.post_message(&id, Message::resolve_path("/broken", RequestId::new("r1")));

    let response = next_response(&mut embedding).await;
    assert_eq!(response.request_id.as_str(), "r1");
    assert_eq!(response.response.status, 500);
    assert!(response.response.body.is_empty());

    match h.events.recv().await {
        Some(FrameEvent::RequestFailed {
            request_id,
            message,
        }) => {
            assert_eq!(request_id.as_str(), "r1");
            assert!(message.contains("configured to fail"));
        },
        other => panic!("expected request-failed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_worker_request_before_ready_is_dropped() {
    let path_loader = MockPathLoader::new().with_text("/a", "a");
    let recorder = path_loader.clone();
    let mut h = Harness::with_path_loader(path_loader);
    let mut embedding = h.embed("tile").await;
    let id = embedding.instance.clone();

    h.post_message(&id, Message::resolve_path("/a", RequestId::new("r1")));
    tokio::task::yield_now().await;

    assert!(drain(&mut embedding).is_empty());
    assert!(recorder.requests().is_empty());
}

#[tokio::test]
async fn test_source_change_tears_down_previous_instance() {
    let mut h = Harness::with_path_loader(MockPathLoader::new().with_text("/a", "a"));
    let mut old = h.ready("first").await;
    let old_id = old.instance.clone();

    h.frame.set_src("second").await.unwrap();

    assert_eq!(next(&mut old).message, Message::ShuttleUnload { id: old_id.clone() });
    assert!(old.downlink.recv().await.is_none());

    let mut new = h.embeddings.try_recv().unwrap();
    assert!(!new.instance.matches(&old_id));
    assert_eq!(new.source, "second");
    assert_eq!(h.frame.state(), FrameState::Embedded);

    h.post_message(&old_id, Message::resolve_path("/a", RequestId::new("stale")));
    h.post(Inbound::ContentLoaded { id: old_id });
    assert!(drain(&mut new).is_empty());
    assert_eq!(h.frame.state(), FrameState::Embedded);
}

#[tokio::test]
async fn test_frames_sharing_a_hub_are_isolated() {
    let registry = Arc::new(LoaderRegistry::new());
    registry.register(Arc::new(
        MockLoader::new("mock").with_manifest(test_manifest()),
    ));
    let mut a = Harness::new(Arc::clone(&registry));
    let mut b = Harness::new(registry);
    b.hub = a.hub.clone();

    let mut embedding_a = a.embed("a").await;
    let mut embedding_b = b.embed("b").await;
    let id_a = embedding_a.instance.clone();

    a.hub.post(Inbound::ContentLoaded { id: id_a.clone() });
    a.frame.pump();
    b.frame.pump();

    assert_eq!(a.frame.state(), FrameState::AwaitingShuttleReady);
    assert_eq!(b.frame.state(), FrameState::Embedded);
    assert_eq!(drain(&mut embedding_a).len(), 1);
    assert!(drain(&mut embedding_b).is_empty());
}

#[tokio::test]
async fn test_worker_ready_for_one_frame_does_not_load_another() {
    let registry = Arc::new(LoaderRegistry::new());
    registry.register(Arc::new(
        MockLoader::new("mock").with_manifest(test_manifest()),
    ));
    let mut a = Harness::new(Arc::clone(&registry));
    let mut b = Harness::new(registry);
    b.hub = a.hub.clone();

    let mut embedding_a = a.embed("a").await;
    let mut embedding_b = b.embed("b").await;
    let id_a = embedding_a.instance.clone();
    let id_b = embedding_b.instance.clone();

    for id in [&id_a, &id_b] {
        post_both(&mut a, &mut b, Inbound::ContentLoaded { id: id.clone() });
        post_both(
            &mut a,
            &mut b,
            Envelope::new(id.clone(), Message::ShuttleReady { id: id.clone() }).into(),
        );
    }
    assert_eq!(a.frame.state(), FrameState::AwaitingWorkerReady);
    assert_eq!(b.frame.state(), FrameState::AwaitingWorkerReady);
    drain(&mut embedding_a);
    drain(&mut embedding_b);

    post_both(
        &mut a,
        &mut b,
        Envelope::new(id_a.clone(), Message::WorkerReady { id: id_a.clone() }).into(),
    );

    assert_eq!(a.frame.state(), FrameState::Ready);
    assert_eq!(b.frame.state(), FrameState::AwaitingWorkerReady);
    assert!(!drain(&mut embedding_a).is_empty());
    assert!(drain(&mut embedding_b).is_empty());
    assert!(
        std::iter::from_fn(|| a.events.try_recv()).any(|event| event == FrameEvent::Loaded)
    );
    assert_eq!(b.events.try_recv(), None);
}

#[tokio::test]
async fn test_whitespace_name_is_still_sent_as_title() {
    let mut h = Harness::with_loader(
        MockLoader::new("mock").with_manifest(Manifest::new().with_name("   ")),
    );
    let mut embedding = h.embed("tile").await;

    h.handshake(&mut embedding);

    let sent: Vec<Message> = drain(&mut embedding)
        .into_iter()
        .map(|e| e.message)
        .collect();
    assert_eq!(
        sent,
        vec![Message::ShuttleSetTitle {
            title: "   ".into()
        }]
    );
    assert_eq!(
        h.events.try_recv(),
        Some(FrameEvent::TitleChanged("   ".into()))
    );
    assert_eq!(h.events.try_recv(), Some(FrameEvent::Loaded));
}

#[tokio::test]
async fn test_wire_messages_are_decoded() {
    let mut h = Harness::with_loader(MockLoader::new("mock").with_manifest(test_manifest()));
    let mut embedding = h.embed("tile").await;
    let id = embedding.instance.clone();
    h.post(Inbound::ContentLoaded { id: id.clone() });
    next(&mut embedding);

    h.post(Inbound::Wire("{not an envelope".into()));
    h.post(Inbound::Wire(format!(
        r#"{{"id":"{id}","action":"teleport","payload":{{}}}}"#
    )));
    assert_eq!(h.frame.state(), FrameState::AwaitingShuttleReady);

    let wire = Envelope::new(id.clone(), Message::ShuttleReady { id: id.clone() })
        .encode()
        .unwrap();
    h.post(Inbound::Wire(wire));

    assert_eq!(h.frame.state(), FrameState::AwaitingWorkerReady);
}

#[tokio::test]
async fn test_diagnostics_and_downward_tags_do_not_transition() {
    let mut h = Harness::with_loader(MockLoader::new("mock").with_manifest(test_manifest()));
    let mut embedding = h.embed("tile").await;
    let id = embedding.instance.clone();

    h.post_message(&id, Message::Warn(vec![serde_json::json!("careful")]));
    h.post_message(&id, Message::Error(vec![serde_json::json!("broken"), serde_json::json!(1)]));
    h.post_message(&id, Message::ShuttleLoad { id: id.clone() });
    h.post_message(&id, Message::WorkerLoad { id: id.clone() });
    h.post_message(
        &id,
        Message::ShuttleSetTitle {
            title: "spoof".into(),
        },
    );

    assert_eq!(h.frame.state(), FrameState::Embedded);
    assert!(drain(&mut embedding).is_empty());
    assert_eq!(h.events.try_recv(), None);
}

#[tokio::test]
async fn test_disconnect_unloads_and_unsubscribes() {
    let mut h = Harness::with_loader(MockLoader::new("mock").with_manifest(test_manifest()));
    let mut embedding = h.ready("tile").await;
    let id = embedding.instance.clone();
    assert_eq!(h.hub.subscriber_count(), 1);

    h.frame.disconnect();

    assert_eq!(next(&mut embedding).message, Message::ShuttleUnload { id });
    assert_eq!(h.frame.state(), FrameState::Idle);
    assert!(!h.frame.is_connected());
    assert_eq!(h.hub.subscriber_count(), 0);
    assert_eq!(h.frame.src(), Some("tile"));
}

#[tokio::test]
async fn test_remove_src_returns_to_idle() {
    let mut h = Harness::with_loader(MockLoader::new("mock").with_manifest(test_manifest()));
    let mut embedding = h.ready("tile").await;

    h.frame.remove_src();

    assert!(matches!(
        next(&mut embedding).message,
        Message::ShuttleUnload { .. }
    ));
    assert_eq!(h.frame.state(), FrameState::Idle);
    assert!(h.frame.src().is_none());
    assert!(h.frame.is_connected());
}
