//! Resolving tile paths on behalf of the Worker.

use std::sync::Arc;

use tiles_loader::{PathLoader, canonical_path};
use tiles_protocol::{
    Envelope, InstanceId, Message, PathResponse, ResolvePathRequest, WorkerResponse,
};
use tracing::{debug, warn};

use crate::embed::ShuttlePort;
use crate::error::{FrameError, FrameResult};
use crate::event::{FrameEvent, FrameEvents};

/// Status sent to the Worker when resolution fails.
const FAILURE_STATUS: u16 = 500;

/// Canonicalize `path` and hand it to the path loader.
pub(crate) async fn resolve(
    loader: Option<Arc<dyn PathLoader>>,
    path: &str,
) -> FrameResult<PathResponse> {
    let loader = loader.ok_or(FrameError::TileNotLoaded)?;
    let canonical = canonical_path(path)?;
    debug!(path, %canonical, "Resolving tile path");
    Ok(loader.resolve_path(&canonical).await?)
}

/// Answer one `resolve-path` worker request.
///
/// Exactly one `worker-response` goes down per request. Failures are
/// reported to the host and answered with a bodiless `500`.
pub(crate) async fn answer(
    id: InstanceId,
    request: ResolvePathRequest,
    loader: Option<Arc<dyn PathLoader>>,
    port: Arc<dyn ShuttlePort>,
    events: FrameEvents,
) {
    let response = match resolve(loader, &request.path).await {
        Ok(response) => response,
        Err(e) => {
            warn!(
                instance = id.short(),
                request_id = %request.request_id,
                path = %request.path,
                error = %e,
                "Worker request failed"
            );
            events.publish(FrameEvent::RequestFailed {
                request_id: request.request_id.clone(),
                message: e.to_string(),
            });
            PathResponse::new(FAILURE_STATUS)
        },
    };

    debug!(
        instance = id.short(),
        request_id = %request.request_id,
        status = response.status,
        "Sending worker response"
    );
    let envelope = Envelope::new(
        id,
        Message::WorkerResponse(WorkerResponse {
            request_id: request.request_id,
            response,
        }),
    );
    if let Err(e) = port.post(envelope) {
        debug!(error = %e, "Dropped worker response");
    }
}
