//! Core configuration for kinetic-animation-core.

use serde::{Deserialize, Serialize};

use crate::blend::BranchPolicy;
use crate::phase::LoopMode;

/// Sizing hints and evaluation defaults. Keep this minimal; expand as needed
/// without breaking the serialized form (every field has a default).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnimationConfig {
    /// Initial capacity of the per-worker `(node, animator)` result map.
    pub scratch_results: usize,
    /// Initial capacity of the raw clip evaluation buffer.
    pub scratch_components: usize,
    /// Branch policy given to animators that do not pick one.
    pub branch_policy: BranchPolicy,
    /// Loop mode given to new animators.
    pub loop_mode: LoopMode,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            scratch_results: 64,
            scratch_components: 256,
            branch_policy: BranchPolicy::VisitAll,
            loop_mode: LoopMode::Repeat,
        }
    }
}

impl AnimationConfig {
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
