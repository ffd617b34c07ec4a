//! Per-frame draw submission on top of the texture context.

use serde::{Deserialize, Serialize};

use crate::backend::TextureBackend;
use crate::context::SubmissionContext;
use crate::texture::{TextureHandle, TextureScope};

#[derive(Clone, Debug)]
pub struct DrawCall {
    pub id: u64,
    pub textures: Vec<TextureHandle>,
}

impl DrawCall {
    pub fn new(id: u64, textures: Vec<TextureHandle>) -> Self {
        Self { id, textures }
    }

    #[inline]
    pub fn scope(&self) -> TextureScope {
        TextureScope::Draw(self.id)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionReport {
    pub submitted: usize,
    /// Draws dropped because a texture could not get a unit.
    pub skipped: usize,
}

impl<B: TextureBackend> SubmissionContext<B> {
    /// Submit one frame's draws in order, then end the frame.
    ///
    /// Each draw activates its textures under its own scope. If any of them
    /// is unavailable the draw is skipped; either way the scope is released
    /// before the next draw.
    pub fn submit_draws(&mut self, draws: &[DrawCall]) -> SubmissionReport {
        let mut report = SubmissionReport::default();
        let mut units = Vec::new();
        for draw in draws {
            let scope = draw.scope();
            units.clear();
            let mut complete = true;
            for &texture in &draw.textures {
                match self.activate(scope, texture).unit() {
                    Some(unit) => units.push(unit),
                    None => {
                        complete = false;
                        break;
                    }
                }
            }
            if complete {
                self.backend_mut().draw(draw, &units);
                report.submitted += 1;
            } else {
                log::warn!("skipping draw {}: texture unit unavailable", draw.id);
                report.skipped += 1;
            }
            self.deactivate_scope(scope);
        }
        self.end_frame();
        log::trace!(
            "submitted {} draws, skipped {}",
            report.submitted,
            report.skipped
        );
        report
    }
}
