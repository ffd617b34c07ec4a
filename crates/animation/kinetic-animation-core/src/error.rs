//! Recoverable errors raised by the animation core.

use kinetic_resource::NodeId;
use thiserror::Error;

/// Failure while decoding or validating a clip source. Raised before any
/// handle is published, so nothing downstream sees a half-loaded clip.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("clip json parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("clip '{clip}' has no channels")]
    NoChannels { clip: String },
    #[error("channel '{channel}' of clip '{clip}' has no components")]
    NoComponents { clip: String, channel: String },
    #[error("component {component} of channel '{channel}' has no samples")]
    EmptyComponent { channel: String, component: usize },
    #[error("non-finite sample in channel '{channel}' at sample {sample}")]
    NonFinite { channel: String, sample: usize },
    #[error("sample times must strictly increase in channel '{channel}' (sample {sample})")]
    UnorderedSamples { channel: String, sample: usize },
    #[error("channel '{channel}' ends at {found}s but the clip lasts {expected}s")]
    InconsistentDuration {
        channel: String,
        expected: f32,
        found: f32,
    },
    #[error("declared clip duration must be finite and non-negative, got {0}")]
    InvalidDuration(f32),
}

/// Failure while walking or folding a blend tree.
#[derive(Debug, Error, PartialEq)]
pub enum BlendTreeError {
    #[error("blend node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("blend node {node} needs the result of {input}, which was not evaluated")]
    MissingInput { node: NodeId, input: NodeId },
    #[error("blend tree rooted at {0} contains a cycle")]
    Cycle(NodeId),
    #[error("value node {node} references a clip that is not loaded")]
    MissingClip { node: NodeId },
}
