//! Playback clocks shared between animators.

use kinetic_resource::{Handle, NodeManager};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Clock {
    /// Multiplier applied on top of each animator's own rate. Negative plays backwards.
    pub playback_rate: f64,
}

impl Default for Clock {
    fn default() -> Self {
        Self { playback_rate: 1.0 }
    }
}

pub type ClockHandle = Handle<Clock>;
pub type ClockManager = NodeManager<Clock>;
