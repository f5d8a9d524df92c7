//! Creating inner embeddings and talking down to them.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tiles_protocol::{Envelope, InstanceId};
use tokio::sync::mpsc;
use tracing::debug;
use url::Url;

use crate::error::{FrameError, FrameResult};

/// What a frame asks its host for when it embeds a tile.
#[derive(Debug, Clone, Copy)]
pub struct EmbedRequest<'a> {
    /// Identifier minted for this embedding.
    pub instance: &'a InstanceId,
    /// The tile source being embedded.
    pub source: &'a str,
    /// Origin the Shuttle document is loaded from.
    pub origin: &'a Url,
}

/// Downward half of one embedding.
pub trait ShuttlePort: Send + Sync {
    /// Post a message to the Shuttle. Delivery is not acknowledged.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::PortClosed`] if the embedding is gone.
    fn post(&self, envelope: Envelope) -> FrameResult<()>;

    /// Release the embedding. Later posts fail.
    fn close(&self) {}
}

/// Host capability that creates inner embeddings.
pub trait Embedder: Send + Sync {
    /// Create the embedding and return its downward port.
    ///
    /// Once the Shuttle document has loaded, the host posts
    /// [`Inbound::ContentLoaded`](crate::Inbound::ContentLoaded) for the
    /// instance into the frame's hub.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Embed`] if the embedding cannot be created.
    fn embed(&self, request: EmbedRequest<'_>) -> FrameResult<Arc<dyn ShuttlePort>>;
}

impl fmt::Debug for dyn Embedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Embedder")
    }
}

/// An embedding handed to whatever runs the inner context.
#[derive(Debug)]
pub struct Embedding {
    /// Identifier minted for the embedding.
    pub instance: InstanceId,
    /// Tile source being embedded.
    pub source: String,
    /// Origin the Shuttle is nominally loaded from.
    pub origin: Url,
    /// Messages posted down by the frame. Ends when the frame closes the
    /// embedding.
    pub downlink: mpsc::UnboundedReceiver<Envelope>,
}

/// Embedder creating an in-process channel per embedding.
///
/// Every new [`Embedding`] is sent to the receiver returned by
/// [`ChannelEmbedder::new`].
#[derive(Debug, Clone)]
pub struct ChannelEmbedder {
    embeddings: mpsc::UnboundedSender<Embedding>,
}

impl ChannelEmbedder {
    /// Create the embedder and the stream of embeddings it produces.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Embedding>) {
        let (embeddings, rx) = mpsc::unbounded_channel();
        (Self { embeddings }, rx)
    }
}

impl Embedder for ChannelEmbedder {
    fn embed(&self, request: EmbedRequest<'_>) -> FrameResult<Arc<dyn ShuttlePort>> {
        let (tx, downlink) = mpsc::unbounded_channel();
        self.embeddings
            .send(Embedding {
                instance: request.instance.clone(),
                source: request.source.to_string(),
                origin: request.origin.clone(),
                downlink,
            })
            .map_err(|_| FrameError::Embed("no host is accepting embeddings".into()))?;
        debug!(instance = request.instance.short(), origin = %request.origin, "Created channel embedding");
        Ok(Arc::new(ChannelPort {
            tx: Mutex::new(Some(tx)),
        }))
    }
}

struct ChannelPort {
    tx: Mutex<Option<mpsc::UnboundedSender<Envelope>>>,
}

impl ShuttlePort for ChannelPort {
    fn post(&self, envelope: Envelope) -> FrameResult<()> {
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        match tx.as_ref() {
            Some(tx) => tx.send(envelope).map_err(|_| FrameError::PortClosed),
            None => Err(FrameError::PortClosed),
        }
    }

    fn close(&self) {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}
