use kinetic_animation::{
    AnimationConfig, AnimatorJob, AnimatorState, BlendNode, BlendTree, BranchPolicy,
    ChannelMapping, ClipSource, ClipStore, ClockManager, JobInputs, MappingEntry, NodeId,
    PropertyValue, Scratch,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn constant(name: &str, channel: &str, v: f32) -> ClipSource {
    ClipSource::scalar(name, &[(channel, &[(0.0, v), (1.0, v)])])
}

fn float_mapping(channels: &[(&str, f32)]) -> ChannelMapping {
    ChannelMapping::new(
        channels
            .iter()
            .map(|(c, d)| MappingEntry::new(NodeId(900), *c, *c, PropertyValue::Float(*d)))
            .collect(),
    )
}

struct Rig {
    clips: ClipStore,
    tree: BlendTree,
    clocks: ClockManager,
    scratch: Scratch,
}

impl Rig {
    fn new() -> Self {
        Self {
            clips: ClipStore::new(),
            tree: BlendTree::new(),
            clocks: ClockManager::new(),
            scratch: Scratch::new(&AnimationConfig::default()),
        }
    }

    fn seek(&mut self, state: &mut AnimatorState, phase: f32) -> kinetic_animation::JobOutput {
        state.seek(phase);
        let inputs = JobInputs {
            clips: &self.clips,
            tree: &self.tree,
            clocks: &self.clocks,
        };
        AnimatorJob::new(NodeId(1), state, inputs, 0).run(&mut self.scratch)
    }
}

fn value_of(out: &kinetic_animation::JobOutput, property: &str) -> f32 {
    let record = out.record.as_ref().expect("record");
    match record.change(NodeId(900), property) {
        Some(PropertyValue::Float(v)) => *v,
        other => panic!("unexpected value {other:?}"),
    }
}

#[test]
fn two_clip_lerp_blends_constants() {
    let mut rig = Rig::new();
    let a = rig.clips.load(&constant("A", "X", 1.0)).unwrap();
    let b = rig.clips.load(&constant("B", "X", 3.0)).unwrap();
    rig.tree.insert(NodeId(10), BlendNode::value(a));
    rig.tree.insert(NodeId(11), BlendNode::value(b));
    rig.tree
        .insert(NodeId(12), BlendNode::lerp(NodeId(10), NodeId(11), 0.25));

    let mut state = AnimatorState::default();
    state.set_blend_tree_root(Some(NodeId(12)));
    state.set_mapping(float_mapping(&[("X", 0.0)]));

    let out = rig.seek(&mut state, 0.5);
    assert_eq!(out.clips_evaluated, 2);
    approx(value_of(&out, "X"), 1.5, 1e-6);
}

#[test]
fn lerp_extremes_are_exact() {
    let mut rig = Rig::new();
    let a = rig
        .clips
        .load(&ClipSource::scalar("A", &[("X", &[(0.0, 0.1), (1.0, 0.7)])]))
        .unwrap();
    let b = rig
        .clips
        .load(&ClipSource::scalar("B", &[("X", &[(0.0, 0.3), (1.0, 0.9)])]))
        .unwrap();
    rig.tree.insert(NodeId(10), BlendNode::value(a));
    rig.tree.insert(NodeId(11), BlendNode::value(b));
    rig.tree
        .insert(NodeId(12), BlendNode::lerp(NodeId(10), NodeId(11), 0.0));

    let mut state = AnimatorState::default();
    state.set_blend_tree_root(Some(NodeId(12)));
    state.set_mapping(float_mapping(&[("X", 0.0)]));

    for phase in [0.0, 0.3, 0.77, 1.0] {
        let left = rig.clips.evaluate(a, phase).unwrap()[0];
        let right = rig.clips.evaluate(b, phase).unwrap()[0];

        rig.tree.set_factor(NodeId(12), 0.0).unwrap();
        assert_eq!(value_of(&rig.seek(&mut state, phase), "X"), left);

        rig.tree.set_factor(NodeId(12), 1.0).unwrap();
        assert_eq!(value_of(&rig.seek(&mut state, phase), "X"), right);
    }
}

#[test]
fn clips_with_different_channel_sets_use_defaults() {
    let mut rig = Rig::new();
    // A animates X then Y; B animates only Y.
    let a = rig
        .clips
        .load(&ClipSource::scalar(
            "A",
            &[("X", &[(0.0, 2.0), (1.0, 2.0)]), ("Y", &[(0.0, 4.0), (1.0, 4.0)])],
        ))
        .unwrap();
    let b = rig.clips.load(&constant("B", "Y", 8.0)).unwrap();
    rig.tree.insert(NodeId(10), BlendNode::value(a));
    rig.tree.insert(NodeId(11), BlendNode::value(b));
    rig.tree
        .insert(NodeId(12), BlendNode::lerp(NodeId(10), NodeId(11), 0.5));

    let mut state = AnimatorState::default();
    state.set_blend_tree_root(Some(NodeId(12)));
    // Layout order differs from both clips; X defaults to 10 where missing.
    state.set_mapping(float_mapping(&[("Y", 0.0), ("X", 10.0)]));

    let out = rig.seek(&mut state, 0.5);
    approx(value_of(&out, "Y"), 6.0, 1e-6);
    approx(value_of(&out, "X"), 6.0, 1e-6);
}

#[test]
fn prebuilt_formats_match_on_the_fly_formats() {
    let mut rig = Rig::new();
    let a = rig
        .clips
        .load(&ClipSource::scalar("A", &[("X", &[(0.0, 0.0), (2.0, 4.0)])]))
        .unwrap();
    rig.tree.insert(NodeId(10), BlendNode::value(a));
    let mut state = AnimatorState::default();
    state.set_blend_tree_root(Some(NodeId(10)));
    state.set_mapping(float_mapping(&[("X", 0.0)]));

    let lazy = value_of(&rig.seek(&mut state, 0.25), "X");
    let built = rig
        .tree
        .build_formats(NodeId(1), NodeId(10), state.layout(), &rig.clips)
        .unwrap();
    assert_eq!(built, 1);
    let eager = value_of(&rig.seek(&mut state, 0.25), "X");
    assert_eq!(lazy, eager);
    approx(eager, 1.0, 1e-6);
}

#[test]
fn additive_node_adds_weighted_layer() {
    let mut rig = Rig::new();
    let base = rig.clips.load(&constant("base", "X", 1.0)).unwrap();
    let layer = rig.clips.load(&constant("layer", "X", 2.0)).unwrap();
    rig.tree.insert(NodeId(10), BlendNode::value(base));
    rig.tree.insert(NodeId(11), BlendNode::value(layer));
    rig.tree
        .insert(NodeId(12), BlendNode::additive(NodeId(10), NodeId(11), 0.5));

    let mut state = AnimatorState::default();
    state.set_blend_tree_root(Some(NodeId(12)));
    state.set_mapping(float_mapping(&[("X", 0.0)]));
    approx(value_of(&rig.seek(&mut state, 0.0), "X"), 2.0, 1e-6);
}

#[test]
fn skip_at_extremes_evaluates_fewer_clips() {
    let mut rig = Rig::new();
    let a = rig.clips.load(&constant("A", "X", 1.0)).unwrap();
    let b = rig.clips.load(&constant("B", "X", 3.0)).unwrap();
    rig.tree.insert(NodeId(10), BlendNode::value(a));
    rig.tree.insert(NodeId(11), BlendNode::value(b));
    rig.tree
        .insert(NodeId(12), BlendNode::lerp(NodeId(10), NodeId(11), 1.0));

    let mut state = AnimatorState::default();
    state.set_blend_tree_root(Some(NodeId(12)));
    state.set_mapping(float_mapping(&[("X", 0.0)]));

    let all = rig.seek(&mut state, 0.5);
    assert_eq!(all.clips_evaluated, 2);

    state.branch_policy = BranchPolicy::SkipAtExtremes;
    let skipped = rig.seek(&mut state, 0.5);
    assert_eq!(skipped.clips_evaluated, 1);
    assert_eq!(value_of(&all, "X"), value_of(&skipped, "X"));
}
