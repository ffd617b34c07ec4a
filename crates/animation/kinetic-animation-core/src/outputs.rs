//! Output contracts of an animator evaluation job.
//!
//! A job never touches the frontend. It returns an [`AnimationRecord`] for
//! property sync and a list of [`PendingCallback`]s; the caller decides where
//! and when each is applied.

use kinetic_resource::NodeId;
use serde::{Deserialize, Serialize};

use crate::mapping::{AnimationCallback, CallbackDelivery};
use crate::value::PropertyValue;

/// One mapped property's new value this tick.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TargetChange {
    pub target: NodeId,
    pub property: String,
    pub value: PropertyValue,
}

/// Per-animator change record, consumed once by frontend sync.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnimationRecord {
    pub animator: NodeId,
    pub normalized_time: f32,
    pub local_time: f64,
    pub current_loop: i32,
    pub final_frame: bool,
    /// Running flag after this tick; false once the final frame is reached.
    pub running: bool,
    #[serde(default)]
    pub changes: Vec<TargetChange>,
}

impl AnimationRecord {
    pub fn change(&self, target: NodeId, property: &str) -> Option<&PropertyValue> {
        self.changes
            .iter()
            .find(|c| c.target == target && c.property == property)
            .map(|c| &c.value)
    }
}

/// A user callback bound to its argument, waiting to be run.
#[derive(Clone, Debug)]
pub struct PendingCallback {
    pub animator: NodeId,
    pub target: NodeId,
    pub property: String,
    pub value: PropertyValue,
    pub delivery: CallbackDelivery,
    pub callback: AnimationCallback,
}

impl PendingCallback {
    #[inline]
    pub fn invoke(&self) {
        self.callback.invoke(&self.value);
    }
}

/// Everything one job produced.
#[derive(Clone, Debug)]
pub struct JobOutput {
    pub animator: NodeId,
    /// `None` when the animator was idle and nothing was evaluated.
    pub record: Option<AnimationRecord>,
    pub callbacks: Vec<PendingCallback>,
    pub clips_evaluated: usize,
}

impl JobOutput {
    pub fn idle(animator: NodeId) -> Self {
        Self {
            animator,
            record: None,
            callbacks: Vec::new(),
            clips_evaluated: 0,
        }
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.record.is_none()
    }
}
