//! Texture resources, binding scopes and slot bookkeeping.

use kinetic_resource::{Handle, ResourceManager};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextureResource {
    pub label: String,
    /// Also written by another rendering context; bound only while holding
    /// that context's lock.
    pub external: bool,
}

impl TextureResource {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            external: false,
        }
    }

    pub fn external(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            external: true,
        }
    }
}

pub type TextureHandle = Handle<TextureResource>;
pub type TextureStore = ResourceManager<TextureResource>;

/// Logical owner of a group of activations, released together.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureScope {
    Material,
    RenderTarget,
    /// Textures of one draw call.
    Draw(u64),
}

/// Outcome of [`SubmissionContext::activate`](crate::SubmissionContext::activate).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[must_use]
pub enum SlotActivation {
    Active(usize),
    /// Every slot is pinned; the caller has to degrade.
    Unavailable,
}

impl SlotActivation {
    #[inline]
    pub fn unit(self) -> Option<usize> {
        match self {
            SlotActivation::Active(unit) => Some(unit),
            SlotActivation::Unavailable => None,
        }
    }

    #[inline]
    pub fn is_available(self) -> bool {
        matches!(self, SlotActivation::Active(_))
    }
}

/// One hardware texture unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextureSlot {
    pub texture: Option<TextureHandle>,
    /// Higher means more recently used.
    pub score: u32,
    pub pinned: bool,
    pub scope: Option<TextureScope>,
    /// Activations of the bound external texture during the current pin.
    /// The external lock is held while this is non-zero.
    pub lock_refs: u32,
}

impl TextureSlot {
    #[inline]
    pub fn is_free(&self) -> bool {
        self.texture.is_none()
    }
}
