//! Unified channel layout and per-clip result formatting.
//!
//! Different clips may define channels in different orders or only a subset
//! of them. An animator declares the channel layout it cares about; for every
//! value node a [`ClipFormat`] maps the clip's raw component order into that
//! layout, and fills holes from the layout's default values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::clip::{AnimationClip, ClipResults};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChannelSpec {
    pub name: String,
    /// Value used for each component when a clip lacks the channel.
    pub defaults: Vec<f32>,
}

impl ChannelSpec {
    pub fn new(name: impl Into<String>, defaults: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            defaults,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.defaults.len()
    }
}

/// Ordered set of channels; offsets are assigned in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChannelLayout {
    channels: IndexMap<String, (usize, ChannelSpec)>,
    width: usize,
}

impl ChannelLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_specs(specs: impl IntoIterator<Item = ChannelSpec>) -> Self {
        let mut layout = Self::new();
        for spec in specs {
            layout.push(spec);
        }
        layout
    }

    /// Append a channel. Re-declaring a name replaces nothing and is ignored.
    pub fn push(&mut self, spec: ChannelSpec) {
        if self.channels.contains_key(&spec.name) {
            log::warn!("channel '{}' declared twice in layout; keeping first", spec.name);
            return;
        }
        let offset = self.width;
        self.width += spec.width();
        self.channels.insert(spec.name.clone(), (offset, spec));
    }

    /// Total number of components.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn offset_of(&self, channel: &str) -> Option<usize> {
        self.channels.get(channel).map(|(o, _)| *o)
    }

    pub fn spec(&self, channel: &str) -> Option<&ChannelSpec> {
        self.channels.get(channel).map(|(_, s)| s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &ChannelSpec)> {
        self.channels.values().map(|(o, s)| (*o, s))
    }

    /// Full default result vector.
    pub fn default_results(&self) -> ClipResults {
        let mut out = Vec::with_capacity(self.width);
        for (_, spec) in self.iter() {
            out.extend_from_slice(&spec.defaults);
        }
        out
    }
}

/// Where a formatted component comes from.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Source {
    Raw(usize),
    Default(f32),
}

/// Mapping from one clip's raw results into an animator's layout.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipFormat {
    sources: Vec<Source>,
}

impl ClipFormat {
    pub fn build(layout: &ChannelLayout, clip: &AnimationClip) -> Self {
        let mut sources = Vec::with_capacity(layout.width());
        for (_, spec) in layout.iter() {
            match clip.channel_offset(&spec.name) {
                Some((raw_offset, channel)) => {
                    for (i, default) in spec.defaults.iter().enumerate() {
                        if i < channel.component_count() {
                            sources.push(Source::Raw(raw_offset + i));
                        } else {
                            sources.push(Source::Default(*default));
                        }
                    }
                }
                None => sources.extend(spec.defaults.iter().map(|d| Source::Default(*d))),
            }
        }
        Self { sources }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.sources.len()
    }

    /// Number of layout components the clip actually provides.
    pub fn mapped_components(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| matches!(s, Source::Raw(_)))
            .count()
    }

    /// Reformat raw clip results into the layout order.
    pub fn format(&self, raw: &[f32]) -> ClipResults {
        self.sources
            .iter()
            .map(|s| match *s {
                Source::Raw(i) => raw.get(i).copied().unwrap_or(0.0),
                Source::Default(d) => d,
            })
            .collect()
    }
}
