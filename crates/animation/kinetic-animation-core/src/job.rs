//! The per-animator, per-frame evaluation job.
//!
//! A job reads shared clip and tree data, owns its animator's state
//! exclusively, and returns everything else as a [`JobOutput`]. It never
//! invokes callbacks itself.

use kinetic_resource::NodeId;

use crate::animator::AnimatorState;
use crate::clip::ClipStore;
use crate::clock::ClockManager;
use crate::layout::ClipFormat;
use crate::outputs::{AnimationRecord, JobOutput, PendingCallback, TargetChange};
use crate::phase::{evaluate_phase, PhaseInput};
use crate::scratch::Scratch;
use crate::tree::BlendTree;
use crate::value::PropertyValue;

/// Read-only data shared by every job of a frame.
#[derive(Clone, Copy)]
pub struct JobInputs<'a> {
    pub clips: &'a ClipStore,
    pub tree: &'a BlendTree,
    pub clocks: &'a ClockManager,
}

pub struct AnimatorJob<'a> {
    animator: NodeId,
    state: &'a mut AnimatorState,
    inputs: JobInputs<'a>,
    global_time_ns: i64,
}

impl<'a> AnimatorJob<'a> {
    pub fn new(
        animator: NodeId,
        state: &'a mut AnimatorState,
        inputs: JobInputs<'a>,
        global_time_ns: i64,
    ) -> Self {
        Self {
            animator,
            state,
            inputs,
            global_time_ns,
        }
    }

    /// Run the job to completion.
    ///
    /// # Panics
    /// If a running animator has no blend tree root, references a clock or
    /// clip that is not loaded, or its tree is malformed. Structural sync
    /// guarantees these before any job is scheduled.
    pub fn run(self, scratch: &mut Scratch) -> JobOutput {
        let AnimatorJob {
            animator,
            state,
            inputs,
            global_time_ns,
        } = self;

        if !state.running && !state.seeking {
            state.running = false;
            return JobOutput::idle(animator);
        }

        let root = state
            .blend_tree_root
            .unwrap_or_else(|| panic!("animator {animator} has no blend tree root"));
        let clock_rate = match state.clock {
            Some(handle) => {
                inputs
                    .clocks
                    .data(handle)
                    .unwrap_or_else(|| panic!("animator {animator} references a released clock"))
                    .playback_rate
            }
            None => 1.0,
        };
        let policy = state.branch_policy;
        let duration = inputs
            .tree
            .duration(root, inputs.clips, policy)
            .unwrap_or_else(|e| panic!("animator {animator}: {e}"));

        let phase_input = PhaseInput {
            elapsed: state.elapsed_seconds(global_time_ns),
            playback_rate: f64::from(state.playback_rate) * clock_rate,
            current_loop: state.current_loop,
            position: state.position,
            loop_count: state.loop_count,
            loop_mode: state.loop_mode,
            seek: state.seeking.then_some(state.seek_normalized_time),
        };
        let eval = evaluate_phase(&phase_input, duration);

        let value_nodes = inputs
            .tree
            .gather_value_nodes(root, policy)
            .unwrap_or_else(|e| panic!("animator {animator}: {e}"));
        for &node_id in &value_nodes {
            let node = inputs
                .tree
                .value_node(node_id)
                .unwrap_or_else(|| panic!("value node {node_id} vanished from the blend tree"));
            let clip = inputs
                .clips
                .clip(node.clip)
                .unwrap_or_else(|| panic!("value node {node_id} references an unloaded clip"));
            clip.evaluate_into(eval.normalized_time, &mut scratch.raw);
            let formatted = match node.format_for(animator) {
                Some(format) => format.format(&scratch.raw),
                None => {
                    log::debug!("building clip format for animator {animator} on node {node_id} during job");
                    ClipFormat::build(state.layout(), clip).format(&scratch.raw)
                }
            };
            scratch.store(node_id, animator, formatted);
        }

        let blended = inputs
            .tree
            .evaluate(root, &scratch.for_animator(animator), policy)
            .unwrap_or_else(|e| panic!("animator {animator}: {e}"));

        state.commit(global_time_ns, &eval);
        if eval.final_frame {
            log::debug!("animator {animator} reached its final frame on loop {}", eval.current_loop);
        }

        let mut changes = Vec::with_capacity(state.mapping().entries().len());
        let mut callbacks = Vec::new();
        for entry in state.mapping().entries() {
            let layout = state.layout();
            let (Some(offset), Some(slot)) =
                (layout.offset_of(&entry.channel), layout.spec(&entry.channel))
            else {
                continue;
            };
            let width = entry.width().min(slot.width());
            let Some(components) = blended.get(offset..offset + width) else {
                log::warn!(
                    "animator {animator}: blended result too short for channel '{}'",
                    entry.channel
                );
                continue;
            };
            let value = PropertyValue::from_components(entry.kind, components);
            if let Some(cb) = &entry.callback {
                callbacks.push(PendingCallback {
                    animator,
                    target: entry.target,
                    property: entry.property.clone(),
                    value: value.clone(),
                    delivery: cb.delivery,
                    callback: cb.callback.clone(),
                });
            }
            changes.push(TargetChange {
                target: entry.target,
                property: entry.property.clone(),
                value,
            });
        }

        JobOutput {
            animator,
            record: Some(AnimationRecord {
                animator,
                normalized_time: eval.normalized_time,
                local_time: eval.local_time,
                current_loop: eval.current_loop,
                final_frame: eval.final_frame,
                running: state.running,
                changes,
            }),
            callbacks,
            clips_evaluated: value_nodes.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blend::BlendNode;
    use crate::config::AnimationConfig;
    use crate::data::ClipSource;
    use crate::mapping::{ChannelMapping, MappingEntry};

    fn setup() -> (ClipStore, BlendTree, ClockManager, AnimatorState, NodeId) {
        let mut clips = ClipStore::new();
        let clip = clips
            .load(&ClipSource::scalar("ramp", &[("X", &[(0.0, 0.0), (1.0, 10.0)])]))
            .expect("clip loads");
        let mut tree = BlendTree::new();
        let root = NodeId(100);
        tree.insert(root, BlendNode::value(clip));
        let mut state = AnimatorState::default();
        state.set_blend_tree_root(Some(root));
        state.set_mapping(ChannelMapping::new(vec![MappingEntry::new(
            NodeId(7),
            "x",
            "X",
            PropertyValue::Float(0.0),
        )]));
        (clips, tree, ClockManager::new(), state, NodeId(1))
    }

    #[test]
    fn stopped_animator_is_idle() {
        let (clips, tree, clocks, mut state, id) = setup();
        let mut scratch = Scratch::new(&AnimationConfig::default());
        let inputs = JobInputs {
            clips: &clips,
            tree: &tree,
            clocks: &clocks,
        };
        let out = AnimatorJob::new(id, &mut state, inputs, 0).run(&mut scratch);
        assert!(out.is_idle());
        assert_eq!(out.clips_evaluated, 0);
        assert!(!state.running);
        assert!(scratch.is_empty());
    }

    #[test]
    fn seek_while_stopped_evaluates_once() {
        let (clips, tree, clocks, mut state, id) = setup();
        let mut scratch = Scratch::new(&AnimationConfig::default());
        let inputs = JobInputs {
            clips: &clips,
            tree: &tree,
            clocks: &clocks,
        };
        state.seek(0.25);
        let out = AnimatorJob::new(id, &mut state, inputs, 0).run(&mut scratch);
        let record = out.record.expect("seek evaluates");
        assert_eq!(record.change(NodeId(7), "x"), Some(&PropertyValue::Float(2.5)));
        assert!(!state.seeking && !state.running);

        let out = AnimatorJob::new(id, &mut state, inputs, 1).run(&mut scratch);
        assert!(out.is_idle());
    }

    #[test]
    fn clock_rate_scales_playback() {
        let (clips, tree, mut clocks, mut state, id) = setup();
        let clock = clocks.insert(NodeId(50), crate::clock::Clock { playback_rate: 0.5 });
        state.clock = Some(clock);
        state.loop_count = crate::phase::INFINITE_LOOPS;
        state.start();
        let mut scratch = Scratch::new(&AnimationConfig::default());
        let inputs = JobInputs {
            clips: &clips,
            tree: &tree,
            clocks: &clocks,
        };
        AnimatorJob::new(id, &mut state, inputs, 0).run(&mut scratch);
        let out = AnimatorJob::new(id, &mut state, inputs, 500_000_000).run(&mut scratch);
        let record = out.record.expect("running");
        assert!((record.normalized_time - 0.25).abs() < 1e-6);
    }

    #[test]
    fn entries_sharing_a_channel_read_their_own_width() {
        let mut clips = ClipStore::new();
        let clip = clips
            .load(&ClipSource::scalar(
                "c",
                &[
                    ("Loc", &[(0.0, 1.0), (1.0, 1.0)]),
                    ("Alpha", &[(0.0, 0.5), (1.0, 0.5)]),
                ],
            ))
            .expect("clip loads");
        let mut tree = BlendTree::new();
        tree.insert(NodeId(100), BlendNode::value(clip));
        let mut state = AnimatorState::default();
        state.set_blend_tree_root(Some(NodeId(100)));
        state.set_mapping(ChannelMapping::new(vec![
            MappingEntry::new(NodeId(7), "scale", "Loc", PropertyValue::Float(0.0)),
            MappingEntry::new(NodeId(7), "position", "Loc", PropertyValue::Vec3([0.0; 3])),
            MappingEntry::new(NodeId(7), "opacity", "Alpha", PropertyValue::Float(0.0)),
        ]));
        state.seek(0.5);
        let clocks = ClockManager::new();
        let inputs = JobInputs {
            clips: &clips,
            tree: &tree,
            clocks: &clocks,
        };
        let mut scratch = Scratch::new(&AnimationConfig::default());
        let record = AnimatorJob::new(NodeId(1), &mut state, inputs, 0)
            .run(&mut scratch)
            .record
            .expect("seek evaluates");
        assert_eq!(record.change(NodeId(7), "scale"), Some(&PropertyValue::Float(1.0)));
        assert_eq!(
            record.change(NodeId(7), "position"),
            Some(&PropertyValue::Vec3([1.0, 0.0, 0.0]))
        );
        assert_eq!(record.change(NodeId(7), "opacity"), Some(&PropertyValue::Float(0.5)));
    }

    #[test]
    #[should_panic(expected = "no blend tree root")]
    fn running_without_root_panics() {
        let (clips, tree, clocks, mut state, id) = setup();
        state.set_blend_tree_root(None);
        state.start();
        let mut scratch = Scratch::new(&AnimationConfig::default());
        let inputs = JobInputs {
            clips: &clips,
            tree: &tree,
            clocks: &clocks,
        };
        AnimatorJob::new(id, &mut state, inputs, 0).run(&mut scratch);
    }
}
