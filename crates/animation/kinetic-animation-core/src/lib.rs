//! Kinetic animation core
//!
//! Clip storage and sampling, blend trees, animator playback state and the
//! per-frame evaluation job. Evaluation follows a two-phase protocol: every
//! value node's clip is sampled and reformatted into the animator's channel
//! layout first, then the tree is folded bottom-up into one blended result.
//!
//! Jobs only read [`ClipStore`] and [`BlendTree`]; all writes to those
//! happen in a separate structural sync phase owned by the scheduler.

pub mod animator;
pub mod blend;
pub mod clip;
pub mod clock;
pub mod config;
pub mod data;
pub mod error;
pub mod job;
pub mod layout;
pub mod mapping;
pub mod outputs;
pub mod phase;
pub mod sampling;
pub mod scratch;
mod topo;
pub mod tree;
pub mod value;

pub use animator::{AnimatorState, PlaybackState};
pub use blend::{BlendNode, BranchPolicy, ValueNode};
pub use clip::{AnimationClip, ClipHandle, ClipResults, ClipStore};
pub use clock::{Clock, ClockHandle, ClockManager};
pub use config::AnimationConfig;
pub use data::{parse_clip_json, ChannelSource, ClipSource, ComponentSource};
pub use error::{BlendTreeError, LoadError};
pub use job::{AnimatorJob, JobInputs};
pub use layout::{ChannelLayout, ChannelSpec, ClipFormat};
pub use mapping::{AnimationCallback, CallbackDelivery, ChannelMapping, MappingEntry};
pub use outputs::{AnimationRecord, JobOutput, PendingCallback, TargetChange};
pub use phase::{evaluate_phase, EvaluationState, LoopMode, PhaseInput, INFINITE_LOOPS};
pub use scratch::{NodeResults, Scratch};
pub use tree::BlendTree;
pub use value::{PropertyKind, PropertyValue};

pub use kinetic_resource::NodeId;
