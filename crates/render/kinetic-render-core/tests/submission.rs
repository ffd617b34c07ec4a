use kinetic_render::{
    DrawCall, RenderConfig, SlotActivation, SubmissionContext, SubmissionReport, TextureBackend,
    TextureHandle, TextureResource, TextureScope,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Bind(usize, String),
    Unbind(usize),
    Lock(TextureHandle),
    Unlock(TextureHandle),
    Draw(u64, Vec<usize>),
}

#[derive(Debug, Default)]
struct Recording {
    calls: Vec<Call>,
}

impl Recording {
    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl TextureBackend for Recording {
    fn bind(&mut self, unit: usize, _: TextureHandle, resource: &TextureResource) {
        self.calls.push(Call::Bind(unit, resource.label.clone()));
    }
    fn unbind(&mut self, unit: usize, _: TextureHandle) {
        self.calls.push(Call::Unbind(unit));
    }
    fn lock_external(&mut self, texture: TextureHandle) {
        self.calls.push(Call::Lock(texture));
    }
    fn unlock_external(&mut self, texture: TextureHandle) {
        self.calls.push(Call::Unlock(texture));
    }
    fn draw(&mut self, draw: &DrawCall, units: &[usize]) {
        self.calls.push(Call::Draw(draw.id, units.to_vec()));
    }
}

fn context(units: usize) -> SubmissionContext<Recording> {
    let cfg = RenderConfig {
        max_texture_units: units,
        ..RenderConfig::default()
    };
    SubmissionContext::new(&cfg, Recording::default())
}

#[test]
fn activations_beyond_capacity_report_unavailable() {
    let mut ctx = context(3);
    let textures: Vec<_> = (0..5)
        .map(|i| ctx.register(TextureResource::new(format!("t{i}"))))
        .collect();
    let results: Vec<_> = textures
        .iter()
        .map(|t| ctx.activate(TextureScope::Material, *t))
        .collect();
    assert_eq!(
        results,
        vec![
            SlotActivation::Active(0),
            SlotActivation::Active(1),
            SlotActivation::Active(2),
            SlotActivation::Unavailable,
            SlotActivation::Unavailable,
        ]
    );
    // The pinned textures are still where they were.
    for (unit, t) in textures.iter().take(3).enumerate() {
        assert_eq!(ctx.unit_of(*t), Some(unit));
    }
}

#[test]
fn unpinned_texture_is_reused_after_end_frame() {
    let mut ctx = context(2);
    let a = ctx.register(TextureResource::new("a"));
    let b = ctx.register(TextureResource::new("b"));
    let c = ctx.register(TextureResource::new("c"));

    let _ = ctx.activate(TextureScope::Material, a);
    let _ = ctx.activate(TextureScope::Material, b);
    ctx.end_frame();

    // Keep `a` warm for another frame; `b` ages.
    let _ = ctx.activate(TextureScope::Material, a);
    ctx.end_frame();

    assert_eq!(ctx.activate(TextureScope::Material, a), SlotActivation::Active(0));
    assert_eq!(ctx.activate(TextureScope::Material, c), SlotActivation::Active(1));
    let binds = ctx.backend().count(|c| matches!(c, Call::Bind(..)));
    assert_eq!(binds, 3);
}

#[test]
fn submit_draws_skips_what_cannot_be_bound() {
    let mut ctx = context(2);
    let a = ctx.register(TextureResource::new("a"));
    let b = ctx.register(TextureResource::new("b"));
    let c = ctx.register(TextureResource::new("c"));

    let draws = vec![
        DrawCall::new(1, vec![a, b]),
        DrawCall::new(2, vec![a, b, c]),
        DrawCall::new(3, vec![c]),
    ];
    let report = ctx.submit_draws(&draws);
    assert_eq!(
        report,
        SubmissionReport {
            submitted: 2,
            skipped: 1
        }
    );
    let drawn: Vec<_> = ctx
        .backend()
        .calls
        .iter()
        .filter_map(|c| match c {
            Call::Draw(id, units) => Some((*id, units.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(drawn, vec![(1, vec![0, 1]), (3, vec![0])]);
    assert!(ctx.slots().iter().all(|s| !s.pinned));
}

#[test]
fn external_texture_locked_for_pin_lifetime() {
    let mut ctx = context(2);
    let video = ctx.register(TextureResource::external("video"));
    let draws = vec![DrawCall::new(1, vec![video]), DrawCall::new(2, vec![video])];
    let _ = ctx.submit_draws(&draws);

    let locks = ctx.backend().count(|c| matches!(c, Call::Lock(_)));
    let unlocks = ctx.backend().count(|c| matches!(c, Call::Unlock(_)));
    assert_eq!(locks, 2);
    assert_eq!(unlocks, 2);
    assert_eq!(ctx.slots()[0].lock_refs, 0);
}

#[test]
fn deactivate_scope_leaves_texture_bound() {
    let mut ctx = context(1);
    let a = ctx.register(TextureResource::new("a"));
    let _ = ctx.activate(TextureScope::RenderTarget, a);
    ctx.deactivate_scope(TextureScope::Material);
    assert!(ctx.slots()[0].pinned);
    ctx.deactivate_scope(TextureScope::RenderTarget);
    assert!(!ctx.slots()[0].pinned);
    assert_eq!(ctx.unit_of(a), Some(0));
    assert_eq!(ctx.backend().count(|c| matches!(c, Call::Unbind(_))), 0);
}
