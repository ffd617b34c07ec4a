//! Structural sync: the serialized phase that applies frontend changes to
//! the backend before any job runs.
//!
//! Everything jobs read (clips, blend tree topology and factors, clocks) and
//! every animator setting is written here and only here. After the commands
//! of a frame are applied, clip formats are rebuilt for every animator whose
//! tree, mapping or clips changed, so jobs never have to.

use hashbrown::HashMap;
use kinetic_animation::{
    AnimationConfig, AnimatorState, BlendNode, BlendTree, BlendTreeError, BranchPolicy,
    ChannelMapping, ClipSource, ClipStore, Clock, ClockManager, JobInputs, LoopMode, NodeId,
};
use kinetic_resource::NodeManager;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Frontend description of a blend node. Value nodes name their clip by id.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlendNodeSpec {
    Value {
        clip: NodeId,
    },
    Lerp {
        left: NodeId,
        right: NodeId,
        factor: f32,
    },
    Additive {
        base: NodeId,
        additive: NodeId,
        factor: f32,
    },
}

#[derive(Clone, Debug)]
pub enum SyncCommand {
    LoadClip { id: NodeId, source: ClipSource },
    ReleaseClip(NodeId),
    AddClock { id: NodeId, clock: Clock },
    SetClockRate { id: NodeId, playback_rate: f64 },
    RemoveClock(NodeId),
    InsertBlendNode { id: NodeId, spec: BlendNodeSpec },
    RemoveBlendNode(NodeId),
    SetBlendFactor { node: NodeId, factor: f32 },
    AddAnimator(NodeId),
    RemoveAnimator(NodeId),
    Start(NodeId),
    Stop(NodeId),
    Seek { animator: NodeId, normalized_time: f32 },
    SetLoops { animator: NodeId, loop_count: i32 },
    SetLoopMode { animator: NodeId, mode: LoopMode },
    SetPlaybackRate { animator: NodeId, rate: f32 },
    SetClock { animator: NodeId, clock: Option<NodeId> },
    SetBlendTree { animator: NodeId, root: Option<NodeId> },
    SetBranchPolicy { animator: NodeId, policy: BranchPolicy },
    SetMapping { animator: NodeId, mapping: ChannelMapping },
}

/// Backend-side world: every manager a frame's jobs read, plus the animators
/// they write.
#[derive(Debug)]
pub struct Backend {
    clips: ClipStore,
    tree: BlendTree,
    clocks: ClockManager,
    animators: NodeManager<AnimatorState>,
    specs: HashMap<NodeId, BlendNodeSpec>,
    cfg: AnimationConfig,
}

impl Backend {
    pub fn new(cfg: AnimationConfig) -> Self {
        Self {
            clips: ClipStore::new(),
            tree: BlendTree::new(),
            clocks: ClockManager::new(),
            animators: NodeManager::new(),
            specs: HashMap::new(),
            cfg,
        }
    }

    #[inline]
    pub fn clips(&self) -> &ClipStore {
        &self.clips
    }

    #[inline]
    pub fn tree(&self) -> &BlendTree {
        &self.tree
    }

    #[inline]
    pub fn clocks(&self) -> &ClockManager {
        &self.clocks
    }

    #[inline]
    pub fn animator(&self, id: NodeId) -> Option<&AnimatorState> {
        self.animators.lookup_resource(id)
    }

    pub fn animator_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.animators.ids()
    }

    pub fn apply(&mut self, command: SyncCommand) -> Result<(), SyncError> {
        match command {
            SyncCommand::LoadClip { id, source } => {
                self.clips
                    .load_with_id(id, &source)
                    .map_err(|source| SyncError::Load { id, source })?;
                self.relink_clip(id)?;
            }
            SyncCommand::ReleaseClip(id) => {
                if self.clips.release(id).is_none() {
                    return Err(SyncError::UnknownClip(id));
                }
            }
            SyncCommand::AddClock { id, clock } => match self.clocks.lookup_resource_mut(id) {
                // Keep the handle animators already hold.
                Some(existing) => *existing = clock,
                None => {
                    self.clocks.insert(id, clock);
                }
            },
            SyncCommand::SetClockRate { id, playback_rate } => {
                self.clocks
                    .lookup_resource_mut(id)
                    .ok_or(SyncError::UnknownClock(id))?
                    .playback_rate = playback_rate;
            }
            SyncCommand::RemoveClock(id) => {
                if self.clocks.release_resource(id).is_none() {
                    return Err(SyncError::UnknownClock(id));
                }
            }
            SyncCommand::InsertBlendNode { id, spec } => {
                let node = self.resolve(&spec)?;
                self.tree.insert(id, node);
                self.specs.insert(id, spec);
                self.invalidate_all();
            }
            SyncCommand::RemoveBlendNode(id) => {
                if self.tree.remove(id).is_none() {
                    return Err(BlendTreeError::UnknownNode(id).into());
                }
                self.specs.remove(&id);
                self.invalidate_all();
            }
            SyncCommand::SetBlendFactor { node, factor } => {
                self.tree.set_factor(node, factor)?;
                if let Some(
                    BlendNodeSpec::Lerp { factor: f, .. } | BlendNodeSpec::Additive { factor: f, .. },
                ) = self.specs.get_mut(&node)
                {
                    *f = factor;
                }
            }
            SyncCommand::AddAnimator(id) => {
                if self.animators.contains(id) {
                    return Err(SyncError::DuplicateAnimator(id));
                }
                self.animators.insert(id, AnimatorState::new(&self.cfg));
            }
            SyncCommand::RemoveAnimator(id) => {
                self.animators
                    .release_resource(id)
                    .ok_or(SyncError::UnknownAnimator(id))?;
                self.tree.clear_formats(id);
            }
            SyncCommand::Start(id) => {
                self.animator_mut(id)?.start();
                log::debug!("animator {id} started");
            }
            SyncCommand::Stop(id) => {
                self.animator_mut(id)?.stop();
                log::debug!("animator {id} stopped");
            }
            SyncCommand::Seek {
                animator,
                normalized_time,
            } => self.animator_mut(animator)?.seek(normalized_time),
            SyncCommand::SetLoops {
                animator,
                loop_count,
            } => self.animator_mut(animator)?.loop_count = loop_count,
            SyncCommand::SetLoopMode { animator, mode } => {
                self.animator_mut(animator)?.loop_mode = mode
            }
            SyncCommand::SetPlaybackRate { animator, rate } => {
                self.animator_mut(animator)?.playback_rate = rate
            }
            SyncCommand::SetClock { animator, clock } => {
                let handle = match clock {
                    Some(id) => Some(
                        self.clocks
                            .lookup_handle(id)
                            .ok_or(SyncError::UnknownClock(id))?,
                    ),
                    None => None,
                };
                self.animator_mut(animator)?.clock = handle;
            }
            SyncCommand::SetBlendTree { animator, root } => {
                self.animator_mut(animator)?.set_blend_tree_root(root)
            }
            SyncCommand::SetBranchPolicy { animator, policy } => {
                self.animator_mut(animator)?.branch_policy = policy
            }
            SyncCommand::SetMapping { animator, mapping } => {
                self.animator_mut(animator)?.set_mapping(mapping)
            }
        }
        Ok(())
    }

    /// Rebuild the clip formats of every animator marked dirty. Returns how
    /// many animators were rebuilt.
    pub fn rebuild_formats(&mut self) -> usize {
        let mut rebuilt = 0;
        for (id, state) in self.animators.iter_mut() {
            if !state.formats_dirty() {
                continue;
            }
            self.tree.clear_formats(id);
            if let Some(root) = state.blend_tree_root {
                if let Err(e) = self.tree.build_formats(id, root, state.layout(), &self.clips) {
                    log::warn!("animator {id}: clip formats not built: {e}");
                }
            }
            state.mark_formats_built();
            rebuilt += 1;
        }
        rebuilt
    }

    /// Shared job inputs alongside exclusive access to the animators.
    pub(crate) fn split_for_jobs(&mut self) -> (JobInputs<'_>, &mut NodeManager<AnimatorState>) {
        let inputs = JobInputs {
            clips: &self.clips,
            tree: &self.tree,
            clocks: &self.clocks,
        };
        (inputs, &mut self.animators)
    }

    fn animator_mut(&mut self, id: NodeId) -> Result<&mut AnimatorState, SyncError> {
        self.animators
            .lookup_resource_mut(id)
            .ok_or(SyncError::UnknownAnimator(id))
    }

    fn resolve(&self, spec: &BlendNodeSpec) -> Result<BlendNode, SyncError> {
        Ok(match *spec {
            BlendNodeSpec::Value { clip } => BlendNode::value(
                self.clips
                    .lookup_handle(clip)
                    .ok_or(SyncError::UnknownClip(clip))?,
            ),
            BlendNodeSpec::Lerp {
                left,
                right,
                factor,
            } => BlendNode::lerp(left, right, factor),
            BlendNodeSpec::Additive {
                base,
                additive,
                factor,
            } => BlendNode::additive(base, additive, factor),
        })
    }

    /// A reloaded clip gets a new handle; point its value nodes at it.
    fn relink_clip(&mut self, clip: NodeId) -> Result<(), SyncError> {
        let nodes: Vec<NodeId> = self
            .specs
            .iter()
            .filter(|(_, spec)| matches!(spec, BlendNodeSpec::Value { clip: c } if *c == clip))
            .map(|(id, _)| *id)
            .collect();
        for id in &nodes {
            let node = self.resolve(&BlendNodeSpec::Value { clip })?;
            self.tree.insert(*id, node);
        }
        if !nodes.is_empty() {
            self.invalidate_all();
        }
        Ok(())
    }

    fn invalidate_all(&mut self) {
        for (_, state) in self.animators.iter_mut() {
            state.invalidate_formats();
        }
    }
}
