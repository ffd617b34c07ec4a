//! Channel mapping: which blended channel drives which frontend property.
//!
//! An animator's [`ChannelLayout`] is derived from its mapping, so every
//! mapped channel has a slot in the blended result and a default value for
//! clips that do not animate it.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use kinetic_resource::NodeId;
use serde::{Deserialize, Serialize};

use crate::layout::{ChannelLayout, ChannelSpec};
use crate::value::{PropertyKind, PropertyValue};

/// Where a per-channel callback runs once the job producing it has returned.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CallbackDelivery {
    /// On the worker that ran the job, right after it returns.
    OnJobThread,
    /// Queued for the thread that owns the frontend.
    #[default]
    OnMainThread,
}

type CallbackFn = dyn Fn(&PropertyValue) + Send + Sync;

/// User callback invoked with a mapped property's new value.
#[derive(Clone)]
pub struct AnimationCallback(Arc<CallbackFn>);

impl AnimationCallback {
    pub fn new(f: impl Fn(&PropertyValue) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn invoke(&self, value: &PropertyValue) {
        (self.0)(value)
    }
}

impl fmt::Debug for AnimationCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnimationCallback({:p})", Arc::as_ptr(&self.0))
    }
}

#[derive(Clone, Debug)]
pub struct MappedCallback {
    pub callback: AnimationCallback,
    pub delivery: CallbackDelivery,
}

#[derive(Clone, Debug)]
pub struct MappingEntry {
    pub target: NodeId,
    pub property: String,
    pub channel: String,
    pub kind: PropertyKind,
    /// Also fixes the component count of the channel.
    pub default: PropertyValue,
    pub callback: Option<MappedCallback>,
}

impl MappingEntry {
    pub fn new(
        target: NodeId,
        property: impl Into<String>,
        channel: impl Into<String>,
        default: PropertyValue,
    ) -> Self {
        Self {
            target,
            property: property.into(),
            channel: channel.into(),
            kind: default.kind(),
            default,
            callback: None,
        }
    }

    pub fn with_callback(mut self, callback: AnimationCallback, delivery: CallbackDelivery) -> Self {
        self.callback = Some(MappedCallback { callback, delivery });
        self
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.default.components().len()
    }
}

#[derive(Clone, Debug, Default)]
pub struct ChannelMapping {
    entries: Vec<MappingEntry>,
}

impl ChannelMapping {
    pub fn new(entries: Vec<MappingEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, entry: MappingEntry) {
        self.entries.push(entry);
    }

    #[inline]
    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unified layout: one channel per distinct channel name, in first-use
    /// order. Several properties may share a channel; the slot is as wide as
    /// the widest of them and takes its defaults from the first entry of
    /// that width.
    pub fn layout(&self) -> ChannelLayout {
        let mut widest: IndexMap<&str, &MappingEntry> = IndexMap::new();
        for e in &self.entries {
            let slot = widest.entry(e.channel.as_str()).or_insert(e);
            if e.width() > slot.width() {
                *slot = e;
            }
        }
        ChannelLayout::from_specs(
            widest
                .into_iter()
                .map(|(name, e)| ChannelSpec::new(name, e.default.components())),
        )
    }
}
