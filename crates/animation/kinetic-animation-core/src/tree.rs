//! Blend tree manager: node storage, value-node gathering, durations and the
//! bottom-up fold.
//!
//! Topology and factors change only during structural sync. During the job
//! phase the tree is shared read-only by every animator job; per-animator
//! results live in each job's [`Scratch`](crate::scratch::Scratch), never in
//! the nodes.

use hashbrown::HashMap;
use indexmap::IndexSet;
use kinetic_resource::{NodeId, NodeManager};

use crate::blend::{
    additive_results, lerp_duration, lerp_results, BlendNode, BranchPolicy, ValueNode,
};
use crate::clip::{ClipResults, ClipStore};
use crate::error::BlendTreeError;
use crate::layout::{ChannelLayout, ClipFormat};
use crate::scratch::NodeResults;
use crate::topo::evaluation_order;

#[derive(Debug, Default)]
pub struct BlendTree {
    nodes: NodeManager<BlendNode>,
}

impl BlendTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: NodeId, node: BlendNode) {
        self.nodes.insert(id, node);
    }

    pub fn remove(&mut self, id: NodeId) -> Option<BlendNode> {
        self.nodes.release_resource(id)
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&BlendNode> {
        self.nodes.lookup_resource(id)
    }

    pub fn value_node(&self, id: NodeId) -> Option<&ValueNode> {
        match self.nodes.lookup_resource(id) {
            Some(BlendNode::Value(v)) => Some(v),
            _ => None,
        }
    }

    pub fn set_factor(&mut self, id: NodeId, factor: f32) -> Result<(), BlendTreeError> {
        let node = self
            .nodes
            .lookup_resource_mut(id)
            .ok_or(BlendTreeError::UnknownNode(id))?;
        if !node.set_factor(factor) {
            log::warn!("ignoring blend factor for value node {id}");
        }
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes reachable from `root` under `policy`, children first.
    pub fn evaluation_order(
        &self,
        root: NodeId,
        policy: BranchPolicy,
    ) -> Result<Vec<NodeId>, BlendTreeError> {
        evaluation_order(&self.nodes, root, policy)
    }

    /// Value nodes that influence the output of `root` under `policy`.
    pub fn gather_value_nodes(
        &self,
        root: NodeId,
        policy: BranchPolicy,
    ) -> Result<IndexSet<NodeId>, BlendTreeError> {
        let order = self.evaluation_order(root, policy)?;
        Ok(order
            .into_iter()
            .filter(|id| self.node(*id).is_some_and(BlendNode::is_value))
            .collect())
    }

    /// Duration of the subtree at `root` in seconds. Lerp nodes interpolate
    /// child durations with their factor; Additive nodes take the base's.
    pub fn duration(
        &self,
        root: NodeId,
        clips: &ClipStore,
        policy: BranchPolicy,
    ) -> Result<f64, BlendTreeError> {
        let order = self.evaluation_order(root, policy)?;
        let mut durations: HashMap<NodeId, f64> = HashMap::with_capacity(order.len());
        for id in order {
            let node = self.node(id).ok_or(BlendTreeError::UnknownNode(id))?;
            let d = match node {
                BlendNode::Value(v) => clips
                    .clip(v.clip)
                    .map(|c| f64::from(c.duration()))
                    .ok_or(BlendTreeError::MissingClip { node: id })?,
                BlendNode::Lerp {
                    left,
                    right,
                    factor,
                } => {
                    let [l, r] = node.dependencies(policy);
                    match (l, r) {
                        (Some(_), Some(_)) => lerp_duration(
                            lookup(&durations, id, *left)?,
                            lookup(&durations, id, *right)?,
                            *factor,
                        ),
                        (Some(_), None) => lookup(&durations, id, *left)?,
                        _ => lookup(&durations, id, *right)?,
                    }
                }
                BlendNode::Additive { base, .. } => lookup(&durations, id, *base)?,
            };
            durations.insert(id, d);
        }
        lookup(&durations, root, root)
    }

    /// Fold the tree at `root` over already-evaluated value-node results.
    ///
    /// Every value node returned by [`gather_value_nodes`](Self::gather_value_nodes)
    /// for the same policy must be present in `results`.
    pub fn evaluate(
        &self,
        root: NodeId,
        results: &dyn NodeResults,
        policy: BranchPolicy,
    ) -> Result<ClipResults, BlendTreeError> {
        let order = self.evaluation_order(root, policy)?;
        let mut folded: HashMap<NodeId, ClipResults> = HashMap::new();

        for id in order {
            let node = self.node(id).ok_or(BlendTreeError::UnknownNode(id))?;
            let out = match node {
                BlendNode::Value(_) => continue,
                BlendNode::Lerp {
                    left,
                    right,
                    factor,
                } => match node.dependencies(policy) {
                    [Some(_), Some(_)] => {
                        let a = input(results, &folded, id, *left)?;
                        let b = input(results, &folded, id, *right)?;
                        lerp_results(a, b, *factor)
                    }
                    [Some(_), None] => input(results, &folded, id, *left)?.to_vec(),
                    _ => input(results, &folded, id, *right)?.to_vec(),
                },
                BlendNode::Additive {
                    base,
                    additive,
                    factor,
                } => match node.dependencies(policy) {
                    [Some(_), Some(_)] => {
                        let a = input(results, &folded, id, *base)?;
                        let b = input(results, &folded, id, *additive)?;
                        additive_results(a, b, *factor)
                    }
                    _ => input(results, &folded, id, *base)?.to_vec(),
                },
            };
            folded.insert(id, out);
        }

        if let Some(out) = folded.remove(&root) {
            return Ok(out);
        }
        results
            .result(root)
            .map(<[f32]>::to_vec)
            .ok_or(BlendTreeError::MissingInput {
                node: root,
                input: root,
            })
    }

    /// Build the clip formats `animator` needs for every value node under
    /// `root`, whatever the current blend factors. Runs during structural sync.
    pub fn build_formats(
        &mut self,
        animator: NodeId,
        root: NodeId,
        layout: &ChannelLayout,
        clips: &ClipStore,
    ) -> Result<usize, BlendTreeError> {
        let value_nodes = self.gather_value_nodes(root, BranchPolicy::VisitAll)?;
        for id in &value_nodes {
            if let Some(BlendNode::Value(v)) = self.nodes.lookup_resource_mut(*id) {
                let clip = clips
                    .clip(v.clip)
                    .ok_or(BlendTreeError::MissingClip { node: *id })?;
                v.set_format(animator, ClipFormat::build(layout, clip));
            }
        }
        log::debug!(
            "built {} clip formats for animator {animator} under root {root}",
            value_nodes.len()
        );
        Ok(value_nodes.len())
    }

    /// Forget everything stored for `animator`.
    pub fn clear_formats(&mut self, animator: NodeId) {
        for (_, node) in self.nodes.iter_mut() {
            if let BlendNode::Value(v) = node {
                v.clear_format(animator);
            }
        }
    }
}

fn lookup(durations: &HashMap<NodeId, f64>, node: NodeId, input: NodeId) -> Result<f64, BlendTreeError> {
    durations
        .get(&input)
        .copied()
        .ok_or(BlendTreeError::MissingInput { node, input })
}

fn input<'a>(
    results: &'a dyn NodeResults,
    folded: &'a HashMap<NodeId, ClipResults>,
    node: NodeId,
    child: NodeId,
) -> Result<&'a [f32], BlendTreeError> {
    folded
        .get(&child)
        .map(Vec::as_slice)
        .or_else(|| results.result(child))
        .ok_or(BlendTreeError::MissingInput { node, input: child })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ClipSource;

    fn constant_clip(clips: &mut ClipStore, value: f32, duration: f32) -> crate::clip::ClipHandle {
        clips
            .load(&ClipSource::scalar("k", &[("x", &[(0.0, value), (duration, value)])]))
            .expect("clip")
    }

    #[test]
    fn duration_interpolates_with_factor() {
        let mut clips = ClipStore::new();
        let mut tree = BlendTree::new();
        tree.insert(NodeId(1), BlendNode::value(constant_clip(&mut clips, 0.0, 1.0)));
        tree.insert(NodeId(2), BlendNode::value(constant_clip(&mut clips, 0.0, 3.0)));
        tree.insert(NodeId(3), BlendNode::lerp(NodeId(1), NodeId(2), 0.5));
        let d = tree.duration(NodeId(3), &clips, BranchPolicy::VisitAll).expect("duration");
        assert!((d - 2.0).abs() < 1e-9);
    }

    #[test]
    fn missing_leaf_result_is_an_error() {
        let mut clips = ClipStore::new();
        let mut tree = BlendTree::new();
        tree.insert(NodeId(1), BlendNode::value(constant_clip(&mut clips, 1.0, 1.0)));
        tree.insert(NodeId(2), BlendNode::value(constant_clip(&mut clips, 2.0, 1.0)));
        tree.insert(NodeId(3), BlendNode::lerp(NodeId(1), NodeId(2), 0.5));

        let mut results: HashMap<NodeId, ClipResults> = HashMap::new();
        results.insert(NodeId(1), vec![1.0]);
        let err = tree
            .evaluate(NodeId(3), &results, BranchPolicy::VisitAll)
            .unwrap_err();
        assert_eq!(
            err,
            BlendTreeError::MissingInput {
                node: NodeId(3),
                input: NodeId(2)
            }
        );
    }

    #[test]
    fn value_root_returns_its_own_result() {
        let mut clips = ClipStore::new();
        let mut tree = BlendTree::new();
        tree.insert(NodeId(1), BlendNode::value(constant_clip(&mut clips, 1.0, 1.0)));
        let mut results: HashMap<NodeId, ClipResults> = HashMap::new();
        results.insert(NodeId(1), vec![4.0, 5.0]);
        let out = tree
            .evaluate(NodeId(1), &results, BranchPolicy::VisitAll)
            .expect("fold");
        assert_eq!(out, vec![4.0, 5.0]);
    }

    #[test]
    fn set_factor_on_unknown_node_fails() {
        let mut tree = BlendTree::new();
        assert_eq!(
            tree.set_factor(NodeId(5), 0.5),
            Err(BlendTreeError::UnknownNode(NodeId(5)))
        );
    }
}
