//! Transient per-evaluation buffers.
//!
//! Value-node results live here, keyed by `(node, animator)`, between the
//! leaf-evaluation step and the tree fold of a single job. Each worker owns
//! its own `Scratch`; nothing in here outlives a frame. A job overwrites
//! every entry its fold reads, so results are only cleared once per frame.

use hashbrown::HashMap;
use kinetic_resource::NodeId;

use crate::clip::ClipResults;
use crate::config::AnimationConfig;

/// Read access to evaluated value-node results during a tree fold.
pub trait NodeResults {
    fn result(&self, node: NodeId) -> Option<&[f32]>;
}

impl NodeResults for HashMap<NodeId, ClipResults> {
    fn result(&self, node: NodeId) -> Option<&[f32]> {
        self.get(&node).map(Vec::as_slice)
    }
}

impl NodeResults for std::collections::HashMap<NodeId, ClipResults> {
    fn result(&self, node: NodeId) -> Option<&[f32]> {
        self.get(&node).map(Vec::as_slice)
    }
}

#[derive(Debug, Default)]
pub struct Scratch {
    formatted: HashMap<(NodeId, NodeId), ClipResults>,
    /// Reused buffer for raw clip evaluation.
    pub(crate) raw: ClipResults,
}

impl Scratch {
    pub fn new(cfg: &AnimationConfig) -> Self {
        Self {
            formatted: HashMap::with_capacity(cfg.scratch_results),
            raw: Vec::with_capacity(cfg.scratch_components),
        }
    }

    /// Drop every stored result, keeping allocations.
    #[inline]
    pub fn begin_frame(&mut self) {
        self.formatted.clear();
    }

    pub fn store(&mut self, node: NodeId, animator: NodeId, results: ClipResults) {
        self.formatted.insert((node, animator), results);
    }

    pub fn get(&self, node: NodeId, animator: NodeId) -> Option<&ClipResults> {
        self.formatted.get(&(node, animator))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.formatted.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.formatted.is_empty()
    }

    /// View restricted to one animator's results.
    pub fn for_animator(&self, animator: NodeId) -> AnimatorResults<'_> {
        AnimatorResults {
            scratch: self,
            animator,
        }
    }
}

pub struct AnimatorResults<'a> {
    scratch: &'a Scratch,
    animator: NodeId,
}

impl NodeResults for AnimatorResults<'_> {
    fn result(&self, node: NodeId) -> Option<&[f32]> {
        self.scratch.get(node, self.animator).map(Vec::as_slice)
    }
}
