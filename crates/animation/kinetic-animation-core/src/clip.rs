//! Loaded animation clips and the store that owns them.
//!
//! Clips are immutable once loaded. Evaluation only reads, so any number of
//! jobs may evaluate the same clip concurrently.

use kinetic_resource::{Handle, NodeId, NodeManager};

use crate::data::{parse_clip_json, ClipSource};
use crate::error::LoadError;
use crate::sampling::Curve;

/// Tolerance used when checking component end times against the clip duration.
const DURATION_EPS: f32 = 1e-4;

/// Flat per-component results. The layout is either the clip's own channel
/// order (raw) or an animator's unified layout (formatted).
pub type ClipResults = Vec<f32>;

pub type ClipHandle = Handle<AnimationClip>;

#[derive(Clone, Debug, PartialEq)]
pub struct ClipChannel {
    pub name: String,
    pub component_names: Vec<Option<String>>,
    curves: Vec<Curve>,
}

impl ClipChannel {
    #[inline]
    pub fn component_count(&self) -> usize {
        self.curves.len()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    name: String,
    duration: f32,
    channels: Vec<ClipChannel>,
    component_count: usize,
}

impl AnimationClip {
    /// Validate `source` and build the sampled clip.
    pub fn from_source(source: &ClipSource) -> Result<Self, LoadError> {
        if source.channels.is_empty() {
            return Err(LoadError::NoChannels {
                clip: source.name.clone(),
            });
        }
        if let Some(d) = source.duration {
            if !d.is_finite() || d < 0.0 {
                return Err(LoadError::InvalidDuration(d));
            }
        }

        let mut channels = Vec::with_capacity(source.channels.len());
        let mut longest = 0.0f32;
        for ch in &source.channels {
            if ch.components.is_empty() {
                return Err(LoadError::NoComponents {
                    clip: source.name.clone(),
                    channel: ch.name.clone(),
                });
            }
            let mut curves = Vec::with_capacity(ch.components.len());
            for (ci, comp) in ch.components.iter().enumerate() {
                validate_samples(&ch.name, ci, &comp.samples)?;
                let curve = Curve::from_samples(&comp.samples);
                longest = longest.max(curve.end_time());
                curves.push(curve);
            }
            channels.push(ClipChannel {
                name: ch.name.clone(),
                component_names: ch.components.iter().map(|c| c.name.clone()).collect(),
                curves,
            });
        }

        let duration = source.duration.unwrap_or(longest);
        for ch in &channels {
            for curve in &ch.curves {
                // Single samples are constants and carry no timing.
                if curve.len() > 1 && (curve.end_time() - duration).abs() > DURATION_EPS {
                    return Err(LoadError::InconsistentDuration {
                        channel: ch.name.clone(),
                        expected: duration,
                        found: curve.end_time(),
                    });
                }
            }
        }

        let component_count = channels.iter().map(|c| c.component_count()).sum();
        Ok(Self {
            name: source.name.clone(),
            duration,
            channels,
            component_count,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Duration in seconds.
    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    pub fn channels(&self) -> &[ClipChannel] {
        &self.channels
    }

    /// Total number of components across all channels (raw result width).
    #[inline]
    pub fn component_count(&self) -> usize {
        self.component_count
    }

    /// Index of the first raw component of `channel`, if the clip has it.
    pub fn channel_offset(&self, channel: &str) -> Option<(usize, &ClipChannel)> {
        let mut offset = 0;
        for ch in &self.channels {
            if ch.name == channel {
                return Some((offset, ch));
            }
            offset += ch.component_count();
        }
        None
    }

    /// Evaluate every component at normalized `phase` (clamped to `[0, 1]`).
    pub fn evaluate(&self, phase: f32) -> ClipResults {
        let mut out = Vec::with_capacity(self.component_count);
        self.evaluate_into(phase, &mut out);
        out
    }

    /// Same as [`evaluate`](Self::evaluate) but reuses `out`.
    pub fn evaluate_into(&self, phase: f32, out: &mut ClipResults) {
        out.clear();
        let phase = if phase.is_nan() { 0.0 } else { phase.clamp(0.0, 1.0) };
        let t = phase * self.duration;
        for ch in &self.channels {
            out.extend(ch.curves.iter().map(|c| c.sample(t)));
        }
    }
}

fn validate_samples(channel: &str, component: usize, samples: &[[f32; 2]]) -> Result<(), LoadError> {
    if samples.is_empty() {
        return Err(LoadError::EmptyComponent {
            channel: channel.to_string(),
            component,
        });
    }
    let mut last = f32::NEG_INFINITY;
    for (i, [t, v]) in samples.iter().enumerate() {
        if !t.is_finite() || !v.is_finite() {
            return Err(LoadError::NonFinite {
                channel: channel.to_string(),
                sample: i,
            });
        }
        if *t <= last {
            return Err(LoadError::UnorderedSamples {
                channel: channel.to_string(),
                sample: i,
            });
        }
        last = *t;
    }
    Ok(())
}

/// Owner of every loaded clip. Mutated only during structural sync.
#[derive(Debug, Default)]
pub struct ClipStore {
    clips: NodeManager<AnimationClip>,
}

impl ClipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a clip under a freshly generated id.
    pub fn load(&mut self, source: &ClipSource) -> Result<ClipHandle, LoadError> {
        self.load_with_id(NodeId::generate(), source)
    }

    /// Load (or reload) the clip the frontend knows as `id`. On error the
    /// previous clip for `id`, if any, stays in place.
    pub fn load_with_id(&mut self, id: NodeId, source: &ClipSource) -> Result<ClipHandle, LoadError> {
        let clip = AnimationClip::from_source(source)?;
        log::debug!(
            "loaded clip '{}' as {id}: {} channels, {}s",
            clip.name,
            clip.channels.len(),
            clip.duration
        );
        Ok(self.clips.insert(id, clip))
    }

    pub fn load_json(&mut self, text: &str) -> Result<ClipHandle, LoadError> {
        let source = parse_clip_json(text)?;
        self.load(&source)
    }

    pub fn release(&mut self, id: NodeId) -> Option<AnimationClip> {
        self.clips.release_resource(id)
    }

    #[inline]
    pub fn clip(&self, handle: ClipHandle) -> Option<&AnimationClip> {
        self.clips.data(handle)
    }

    #[inline]
    pub fn lookup_handle(&self, id: NodeId) -> Option<ClipHandle> {
        self.clips.lookup_handle(id)
    }

    #[inline]
    pub fn lookup_clip(&self, id: NodeId) -> Option<&AnimationClip> {
        self.clips.lookup_resource(id)
    }

    /// Evaluate the clip behind `handle`; `None` for stale handles.
    pub fn evaluate(&self, handle: ClipHandle, phase: f32) -> Option<ClipResults> {
        self.clip(handle).map(|c| c.evaluate(phase))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}
