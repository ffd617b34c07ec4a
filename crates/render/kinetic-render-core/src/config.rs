//! Render-side configuration.

use serde::{Deserialize, Serialize};

/// Score a slot gets when it is (re)activated. Scores decay by one per frame.
pub const DEFAULT_MAX_SCORE: u32 = 200;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Number of hardware texture units the context arbitrates.
    pub max_texture_units: usize,
    pub max_score: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_texture_units: 16,
            max_score: DEFAULT_MAX_SCORE,
        }
    }
}

impl RenderConfig {
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
