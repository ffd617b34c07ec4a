//! Texture-unit arbitration.
//!
//! A fixed number of slots is shared by every texture a frame binds. A
//! texture that already sits in a slot is reused as is; otherwise the
//! least recently used unpinned slot is evicted. Pins keep a slot's texture
//! alive for the scope that activated it and never survive `end_frame`.
//!
//! Not thread-safe: every call happens on the submission thread.

use crate::backend::TextureBackend;
use crate::config::RenderConfig;
use crate::texture::{
    SlotActivation, TextureHandle, TextureResource, TextureScope, TextureSlot, TextureStore,
};

#[derive(Debug)]
pub struct SubmissionContext<B: TextureBackend> {
    slots: Vec<TextureSlot>,
    textures: TextureStore,
    max_score: u32,
    backend: B,
}

impl<B: TextureBackend> SubmissionContext<B> {
    pub fn new(cfg: &RenderConfig, backend: B) -> Self {
        Self {
            slots: vec![TextureSlot::default(); cfg.max_texture_units],
            textures: TextureStore::new(),
            max_score: cfg.max_score,
            backend,
        }
    }

    pub fn register(&mut self, texture: TextureResource) -> TextureHandle {
        self.textures.insert(texture)
    }

    /// Drop a texture, unbinding it first if it still occupies a slot.
    pub fn release(&mut self, texture: TextureHandle) -> Option<TextureResource> {
        if let Some(unit) = self.unit_of(texture) {
            self.release_lock(unit);
            self.backend.unbind(unit, texture);
            self.slots[unit] = TextureSlot::default();
        }
        self.textures.release(texture)
    }

    #[inline]
    pub fn texture(&self, texture: TextureHandle) -> Option<&TextureResource> {
        self.textures.data(texture)
    }

    #[inline]
    pub fn slots(&self) -> &[TextureSlot] {
        &self.slots
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Unit currently holding `texture`, pinned or not.
    pub fn unit_of(&self, texture: TextureHandle) -> Option<usize> {
        self.slots.iter().position(|s| s.texture == Some(texture))
    }

    /// Bind `texture` to a unit for `scope` and pin it.
    ///
    /// Returns [`SlotActivation::Unavailable`] when every slot is pinned by
    /// other textures or the handle is stale; nothing is overwritten then.
    pub fn activate(&mut self, scope: TextureScope, texture: TextureHandle) -> SlotActivation {
        let Some(external) = self.textures.data(texture).map(|t| t.external) else {
            log::warn!("activate on stale texture handle {texture:?}");
            return SlotActivation::Unavailable;
        };

        let unit = match self.unit_of(texture) {
            Some(unit) => unit,
            None => {
                let Some(unit) = self.eviction_candidate() else {
                    log::warn!(
                        "no free texture unit for {texture:?}: all {} slots pinned",
                        self.slots.len()
                    );
                    return SlotActivation::Unavailable;
                };
                if let Some(previous) = self.slots[unit].texture {
                    log::debug!("evicting {previous:?} from texture unit {unit}");
                    self.release_lock(unit);
                    self.backend.unbind(unit, previous);
                }
                if let Some(resource) = self.textures.data(texture) {
                    self.backend.bind(unit, texture, resource);
                }
                self.slots[unit].texture = Some(texture);
                unit
            }
        };

        let slot = &mut self.slots[unit];
        slot.score = self.max_score;
        slot.pinned = true;
        slot.scope = Some(scope);
        if external {
            if slot.lock_refs == 0 {
                self.backend.lock_external(texture);
            }
            slot.lock_refs += 1;
        }
        SlotActivation::Active(unit)
    }

    /// Unpin every slot activated under `scope`. Textures stay bound so a
    /// later activation can reuse them without rebinding.
    pub fn deactivate_scope(&mut self, scope: TextureScope) {
        for unit in 0..self.slots.len() {
            if self.slots[unit].scope == Some(scope) {
                self.unpin(unit);
            }
        }
    }

    /// Unpin the slot holding `texture`. Returns false (with a warning) when
    /// the texture is not currently active.
    pub fn deactivate(&mut self, texture: TextureHandle) -> bool {
        match self.unit_of(texture) {
            Some(unit) if self.slots[unit].pinned => {
                self.unpin(unit);
                true
            }
            _ => {
                log::warn!("deactivating texture {texture:?} which is not active");
                false
            }
        }
    }

    /// Age every slot by one and drop every pin and external lock left over
    /// from this frame.
    pub fn end_frame(&mut self) {
        for unit in 0..self.slots.len() {
            let slot = &mut self.slots[unit];
            slot.score = slot.score.saturating_sub(1);
            if slot.pinned || slot.lock_refs > 0 {
                self.unpin(unit);
            }
        }
    }

    /// Lowest-score unpinned slot, lowest index on ties.
    fn eviction_candidate(&self) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.pinned)
            .min_by_key(|(unit, s)| (s.score, *unit))
            .map(|(unit, _)| unit)
    }

    fn unpin(&mut self, unit: usize) {
        self.release_lock(unit);
        let slot = &mut self.slots[unit];
        slot.pinned = false;
        slot.scope = None;
    }

    fn release_lock(&mut self, unit: usize) {
        let slot = &mut self.slots[unit];
        if slot.lock_refs > 0 {
            slot.lock_refs = 0;
            if let Some(texture) = slot.texture {
                self.backend.unlock_external(texture);
            }
        }
    }
}
