use crate::draw::DrawCall;
use crate::texture::{TextureHandle, TextureResource};

/// Graphics API seam driven by the [`SubmissionContext`](crate::SubmissionContext).
///
/// All calls happen on the submission thread, in the order the context
/// decides; implementations do not need to be thread-safe.
pub trait TextureBackend {
    /// Make `texture` current on `unit`.
    fn bind(&mut self, unit: usize, texture: TextureHandle, resource: &TextureResource);

    /// `texture` is being evicted from `unit`.
    fn unbind(&mut self, unit: usize, texture: TextureHandle);

    /// Take the cross-context lock of an external texture.
    fn lock_external(&mut self, texture: TextureHandle) {
        let _ = texture;
    }

    fn unlock_external(&mut self, texture: TextureHandle) {
        let _ = texture;
    }

    /// Issue one draw with its textures resolved to units, in `draw.textures` order.
    fn draw(&mut self, draw: &DrawCall, units: &[usize]);
}
