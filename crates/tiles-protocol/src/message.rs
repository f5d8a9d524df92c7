//! Message variants and their payloads.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::Action;
use crate::error::{ProtocolError, ProtocolResult};
use crate::id::{InstanceId, RequestId};
use crate::response::PathResponse;

/// One variant per action tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Start the Shuttle boot for this instance.
    ShuttleLoad {
        /// Instance the Shuttle is booting for.
        id: InstanceId,
    },
    /// The Shuttle can accept load instructions.
    ShuttleReady {
        /// Instance the Shuttle booted for.
        id: InstanceId,
    },
    /// Apply a tile title.
    ShuttleSetTitle {
        /// The title to apply.
        title: String,
    },
    /// Apply a tile icon.
    ShuttleSetIcon {
        /// Tile-relative path of the icon.
        path: String,
    },
    /// The embedding is being torn down; release inner resources.
    ShuttleUnload {
        /// Instance being torn down.
        id: InstanceId,
    },
    /// Start the Worker boot for this instance.
    WorkerLoad {
        /// Instance the Worker is booting for.
        id: InstanceId,
    },
    /// The Worker is installed and intercepting requests.
    WorkerReady {
        /// Instance the Worker booted for.
        id: InstanceId,
    },
    /// A resource request from the Worker.
    WorkerRequest(WorkerRequest),
    /// The answer to a [`Message::WorkerRequest`].
    WorkerResponse(WorkerResponse),
    /// A warning reported by an inner context.
    Warn(Vec<Value>),
    /// An error reported by an inner context.
    Error(Vec<Value>),
}

/// The kinds of request a Worker may forward upward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum WorkerRequest {
    /// Resolve a tile-relative path through the active path loader.
    ResolvePath(ResolvePathRequest),
}

impl WorkerRequest {
    /// The identifier the response must carry.
    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        match self {
            Self::ResolvePath(req) => &req.request_id,
        }
    }
}

/// Payload of a `resolve-path` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvePathRequest {
    /// Path as seen by the tile.
    pub path: String,
    /// Correlation identifier chosen by the Worker.
    #[serde(rename = "requestId")]
    pub request_id: RequestId,
}

/// Payload of a `worker-response`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerResponse {
    /// Identifier of the request being answered.
    #[serde(rename = "requestId")]
    pub request_id: RequestId,
    /// The resolved resource.
    pub response: PathResponse,
}

#[derive(Serialize, Deserialize)]
struct IdPayload {
    id: InstanceId,
}

#[derive(Serialize, Deserialize)]
struct TitlePayload {
    title: String,
}

#[derive(Serialize, Deserialize)]
struct IconPayload {
    path: String,
}

impl Message {
    /// The action tag of this message.
    #[must_use]
    pub fn action(&self) -> Action {
        match self {
            Self::ShuttleLoad { .. } => Action::ShuttleLoad,
            Self::ShuttleReady { .. } => Action::ShuttleReady,
            Self::ShuttleSetTitle { .. } => Action::ShuttleSetTitle,
            Self::ShuttleSetIcon { .. } => Action::ShuttleSetIcon,
            Self::ShuttleUnload { .. } => Action::ShuttleUnload,
            Self::WorkerLoad { .. } => Action::WorkerLoad,
            Self::WorkerReady { .. } => Action::WorkerReady,
            Self::WorkerRequest(_) => Action::WorkerRequest,
            Self::WorkerResponse(_) => Action::WorkerResponse,
            Self::Warn(_) => Action::Warn,
            Self::Error(_) => Action::Error,
        }
    }

    /// Shorthand for a `resolve-path` worker request.
    #[must_use]
    pub fn resolve_path(path: impl Into<String>, request_id: RequestId) -> Self {
        Self::WorkerRequest(WorkerRequest::ResolvePath(ResolvePathRequest {
            path: path.into(),
            request_id,
        }))
    }

    /// Encode the tag-specific payload.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Malformed`] if the payload cannot be
    /// represented as JSON.
    pub fn payload(&self) -> ProtocolResult<Value> {
        let value = match self {
            Self::ShuttleLoad { id }
            | Self::ShuttleReady { id }
            | Self::ShuttleUnload { id }
            | Self::WorkerLoad { id }
            | Self::WorkerReady { id } => serde_json::to_value(IdPayload { id: id.clone() })?,
            Self::ShuttleSetTitle { title } => serde_json::to_value(TitlePayload {
                title: title.clone(),
            })?,
            Self::ShuttleSetIcon { path } => {
                serde_json::to_value(IconPayload { path: path.clone() })?
            },
            Self::WorkerRequest(req) => serde_json::to_value(req)?,
            Self::WorkerResponse(resp) => serde_json::to_value(resp)?,
            Self::Warn(args) | Self::Error(args) => Value::Array(args.clone()),
        };
        Ok(value)
    }

    /// Rebuild a message from its tag and payload.
    ///
    /// Diagnostic payloads accept anything: an array is taken as the
    /// argument list, `null` as no arguments, any other value as a single
    /// argument.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidPayload`] if the payload does not
    /// have the shape the tag requires.
    pub fn from_parts(action: Action, payload: Value) -> ProtocolResult<Self> {
        let message = match action {
            Action::ShuttleLoad => Self::ShuttleLoad {
                id: decode::<IdPayload>(action, payload)?.id,
            },
            Action::ShuttleReady => Self::ShuttleReady {
                id: decode::<IdPayload>(action, payload)?.id,
            },
            Action::ShuttleSetTitle => Self::ShuttleSetTitle {
                title: decode::<TitlePayload>(action, payload)?.title,
            },
            Action::ShuttleSetIcon => Self::ShuttleSetIcon {
                path: decode::<IconPayload>(action, payload)?.path,
            },
            Action::ShuttleUnload => Self::ShuttleUnload {
                id: decode::<IdPayload>(action, payload)?.id,
            },
            Action::WorkerLoad => Self::WorkerLoad {
                id: decode::<IdPayload>(action, payload)?.id,
            },
            Action::WorkerReady => Self::WorkerReady {
                id: decode::<IdPayload>(action, payload)?.id,
            },
            Action::WorkerRequest => Self::WorkerRequest(decode(action, payload)?),
            Action::WorkerResponse => Self::WorkerResponse(decode(action, payload)?),
            Action::Warn => Self::Warn(diagnostic_args(payload)),
            Action::Error => Self::Error(diagnostic_args(payload)),
        };
        Ok(message)
    }
}

fn decode<T: DeserializeOwned>(action: Action, payload: Value) -> ProtocolResult<T> {
    serde_json::from_value(payload).map_err(|e| ProtocolError::InvalidPayload {
        action: action.as_str(),
        message: e.to_string(),
    })
}

fn diagnostic_args(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(args) => args,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}
