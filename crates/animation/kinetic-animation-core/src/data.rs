//! Clip source format (decoded by the clip loader, consumed by the clip store).
//!
//! A clip is a list of named channels; each channel has one or more components
//! (`x`, `y`, `z`, ...) and every component is its own sampled curve of
//! `[time_seconds, value]` pairs.
//!
//! ```json
//! {
//!   "name": "walk",
//!   "duration": 1.0,
//!   "channels": [
//!     { "name": "Location", "components": [
//!         { "name": "x", "samples": [[0.0, 0.0], [1.0, 2.0]] }
//!     ] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ComponentSource {
    #[serde(default)]
    pub name: Option<String>,
    pub samples: Vec<[f32; 2]>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChannelSource {
    pub name: String,
    pub components: Vec<ComponentSource>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClipSource {
    pub name: String,
    /// Authoritative clip length in seconds. When absent the channels define it.
    #[serde(default)]
    pub duration: Option<f32>,
    pub channels: Vec<ChannelSource>,
}

impl ClipSource {
    /// Convenience for tests and tools: one single-component channel per entry.
    pub fn scalar(name: &str, channels: &[(&str, &[(f32, f32)])]) -> Self {
        ClipSource {
            name: name.to_string(),
            duration: None,
            channels: channels
                .iter()
                .map(|(channel, samples)| ChannelSource {
                    name: channel.to_string(),
                    components: vec![ComponentSource {
                        name: None,
                        samples: samples.iter().map(|(t, v)| [*t, *v]).collect(),
                    }],
                })
                .collect(),
        }
    }
}

/// Parse a clip source from JSON text. Validation happens in
/// [`ClipStore::load`](crate::clip::ClipStore::load).
pub fn parse_clip_json(text: &str) -> Result<ClipSource, LoadError> {
    Ok(serde_json::from_str(text)?)
}
