//! Bottom-up ordering of the blend-tree subgraph reachable from a root.

use std::collections::VecDeque;

use indexmap::{IndexMap, IndexSet};
use kinetic_resource::{NodeId, NodeManager};

use crate::blend::{BlendNode, BranchPolicy};
use crate::error::BlendTreeError;

/// Children before parents, root last. Discovery order breaks ties so the
/// result is deterministic for a given topology.
pub(crate) fn evaluation_order(
    nodes: &NodeManager<BlendNode>,
    root: NodeId,
    policy: BranchPolicy,
) -> Result<Vec<NodeId>, BlendTreeError> {
    // Reachable set with each node's distinct dependencies.
    let mut deps: IndexMap<NodeId, IndexSet<NodeId>> = IndexMap::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if deps.contains_key(&id) {
            continue;
        }
        let node = nodes
            .lookup_resource(id)
            .ok_or(BlendTreeError::UnknownNode(id))?;
        let children: IndexSet<NodeId> = node.dependencies(policy).into_iter().flatten().collect();
        for child in children.iter().rev() {
            stack.push(*child);
        }
        deps.insert(id, children);
    }

    let mut indeg: IndexMap<NodeId, usize> = IndexMap::with_capacity(deps.len());
    let mut parents: IndexMap<NodeId, Vec<NodeId>> = IndexMap::new();
    for (id, children) in &deps {
        indeg.insert(*id, children.len());
        for child in children {
            parents.entry(*child).or_default().push(*id);
        }
    }

    let mut queue: VecDeque<NodeId> = indeg
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(id, _)| *id)
        .collect();

    let mut order = Vec::with_capacity(deps.len());
    while let Some(id) = queue.pop_front() {
        order.push(id);
        if let Some(ps) = parents.get(&id) {
            for p in ps {
                if let Some(d) = indeg.get_mut(p) {
                    *d -= 1;
                    if *d == 0 {
                        queue.push_back(*p);
                    }
                }
            }
        }
    }

    if order.len() != deps.len() {
        return Err(BlendTreeError::Cycle(root));
    }
    Ok(order)
}
