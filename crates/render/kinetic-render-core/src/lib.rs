//! Kinetic render core
//!
//! Arbitrates a fixed set of hardware texture units between the textures a
//! frame's draw calls need, and drives a [`TextureBackend`] with the
//! resulting bind/unbind/lock calls. Exhaustion is not an error: a draw whose
//! textures cannot all be bound is skipped and reported.

pub mod backend;
pub mod config;
pub mod context;
pub mod draw;
pub mod texture;

pub use backend::TextureBackend;
pub use config::{RenderConfig, DEFAULT_MAX_SCORE};
pub use context::SubmissionContext;
pub use draw::{DrawCall, SubmissionReport};
pub use texture::{
    SlotActivation, TextureHandle, TextureResource, TextureScope, TextureSlot, TextureStore,
};
