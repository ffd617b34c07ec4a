//! Blend node kinds and their combine functions.
//!
//! The node set is closed: evaluation is a `match` over [`BlendNode`], so
//! adding an operator means adding a variant and handling it everywhere the
//! compiler points at.

use hashbrown::HashMap;
use kinetic_resource::NodeId;
use serde::{Deserialize, Serialize};

use crate::clip::{ClipHandle, ClipResults};
use crate::layout::ClipFormat;

/// Which children of an operator node take part in an evaluation.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BranchPolicy {
    /// Every child is evaluated regardless of blend factors.
    #[default]
    VisitAll,
    /// Children whose weight is exactly zero are skipped: a Lerp at factor 0
    /// only needs its left child, at factor 1 only its right; an Additive at
    /// factor 0 only needs its base.
    SkipAtExtremes,
}

/// Leaf wrapping one clip. Formats are per-animator because each animator
/// brings its own channel layout.
#[derive(Clone, Debug)]
pub struct ValueNode {
    pub clip: ClipHandle,
    formats: HashMap<NodeId, ClipFormat>,
}

impl ValueNode {
    pub fn new(clip: ClipHandle) -> Self {
        Self {
            clip,
            formats: HashMap::new(),
        }
    }

    #[inline]
    pub fn format_for(&self, animator: NodeId) -> Option<&ClipFormat> {
        self.formats.get(&animator)
    }

    pub(crate) fn set_format(&mut self, animator: NodeId, format: ClipFormat) {
        self.formats.insert(animator, format);
    }

    pub(crate) fn clear_format(&mut self, animator: NodeId) {
        self.formats.remove(&animator);
    }
}

#[derive(Clone, Debug)]
pub enum BlendNode {
    Value(ValueNode),
    /// `left * (1 - factor) + right * factor`, component-wise.
    Lerp {
        left: NodeId,
        right: NodeId,
        factor: f32,
    },
    /// `base + additive * factor`, component-wise.
    Additive {
        base: NodeId,
        additive: NodeId,
        factor: f32,
    },
}

impl BlendNode {
    pub fn value(clip: ClipHandle) -> Self {
        BlendNode::Value(ValueNode::new(clip))
    }

    pub fn lerp(left: NodeId, right: NodeId, factor: f32) -> Self {
        BlendNode::Lerp {
            left,
            right,
            factor: sanitize_factor(factor),
        }
    }

    pub fn additive(base: NodeId, additive: NodeId, factor: f32) -> Self {
        BlendNode::Additive {
            base,
            additive,
            factor: sanitize_factor(factor),
        }
    }

    #[inline]
    pub fn is_value(&self) -> bool {
        matches!(self, BlendNode::Value(_))
    }

    pub fn factor(&self) -> Option<f32> {
        match self {
            BlendNode::Value(_) => None,
            BlendNode::Lerp { factor, .. } | BlendNode::Additive { factor, .. } => Some(*factor),
        }
    }

    /// Update the blend factor. Returns false for value nodes.
    pub fn set_factor(&mut self, value: f32) -> bool {
        match self {
            BlendNode::Value(_) => false,
            BlendNode::Lerp { factor, .. } | BlendNode::Additive { factor, .. } => {
                *factor = sanitize_factor(value);
                true
            }
        }
    }

    /// Children that must be evaluated under `policy`.
    pub fn dependencies(&self, policy: BranchPolicy) -> [Option<NodeId>; 2] {
        let skip = policy == BranchPolicy::SkipAtExtremes;
        match *self {
            BlendNode::Value(_) => [None, None],
            BlendNode::Lerp {
                left,
                right,
                factor,
            } => {
                if skip && factor == 0.0 {
                    [Some(left), None]
                } else if skip && factor == 1.0 {
                    [None, Some(right)]
                } else {
                    [Some(left), Some(right)]
                }
            }
            BlendNode::Additive {
                base,
                additive,
                factor,
            } => {
                if skip && factor == 0.0 {
                    [Some(base), None]
                } else {
                    [Some(base), Some(additive)]
                }
            }
        }
    }
}

/// Clamp into `[0, 1]`, mapping NaN to 0.
fn sanitize_factor(f: f32) -> f32 {
    if f.is_nan() {
        0.0
    } else {
        f.clamp(0.0, 1.0)
    }
}

pub fn lerp_results(a: &[f32], b: &[f32], factor: f32) -> ClipResults {
    let inv = 1.0 - factor;
    a.iter().zip(b).map(|(x, y)| x * inv + y * factor).collect()
}

pub fn additive_results(base: &[f32], additive: &[f32], factor: f32) -> ClipResults {
    base.iter()
        .zip(additive)
        .map(|(x, y)| x + y * factor)
        .collect()
}

pub fn lerp_duration(a: f64, b: f64, factor: f32) -> f64 {
    let f = f64::from(factor);
    a * (1.0 - f) + b * f
}
