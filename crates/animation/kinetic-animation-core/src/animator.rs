//! Per-animator playback state.
//!
//! An [`AnimatorState`] is written by the structural sync phase (commands)
//! and by exactly one evaluation job per frame. The two never overlap.

use kinetic_resource::NodeId;

use crate::blend::BranchPolicy;
use crate::clock::ClockHandle;
use crate::config::AnimationConfig;
use crate::layout::ChannelLayout;
use crate::mapping::ChannelMapping;
use crate::phase::{EvaluationState, LoopMode};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Running,
    /// An explicit time was set; the next tick evaluates it regardless of
    /// `running`.
    Seeking,
}

#[derive(Clone, Debug)]
pub struct AnimatorState {
    pub running: bool,
    pub seeking: bool,
    /// Global time of the last evaluated tick; `None` until the first tick
    /// after a start.
    pub last_global_time_ns: Option<i64>,
    pub last_local_time: f64,
    pub last_normalized_time: f32,
    /// Accumulated position in loop units; the source of truth for the
    /// next tick's advance.
    pub position: f64,
    pub current_loop: i32,
    pub loop_count: i32,
    pub loop_mode: LoopMode,
    pub playback_rate: f32,
    pub clock: Option<ClockHandle>,
    pub blend_tree_root: Option<NodeId>,
    pub branch_policy: BranchPolicy,
    /// Normalized time requested by the pending seek.
    pub seek_normalized_time: f32,
    /// The last run ended on its final frame; the next start rewinds.
    pub finished: bool,
    mapping: ChannelMapping,
    layout: ChannelLayout,
    formats_dirty: bool,
}

impl Default for AnimatorState {
    fn default() -> Self {
        Self::new(&AnimationConfig::default())
    }
}

impl AnimatorState {
    pub fn new(cfg: &AnimationConfig) -> Self {
        Self {
            running: false,
            seeking: false,
            last_global_time_ns: None,
            last_local_time: 0.0,
            last_normalized_time: 0.0,
            position: 0.0,
            current_loop: 0,
            loop_count: 1,
            loop_mode: cfg.loop_mode,
            playback_rate: 1.0,
            clock: None,
            blend_tree_root: None,
            branch_policy: cfg.branch_policy,
            seek_normalized_time: 0.0,
            finished: false,
            mapping: ChannelMapping::default(),
            layout: ChannelLayout::new(),
            formats_dirty: false,
        }
    }

    pub fn playback_state(&self) -> PlaybackState {
        if self.seeking {
            PlaybackState::Seeking
        } else if self.running {
            PlaybackState::Running
        } else {
            PlaybackState::Stopped
        }
    }

    /// Stopped -> Running. A finished animator starts over from loop 0.
    /// Starting an animator that is already running changes nothing.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        if self.finished {
            self.current_loop = 0;
            self.last_normalized_time = 0.0;
            self.last_local_time = 0.0;
            self.position = 0.0;
            self.finished = false;
        }
        self.running = true;
        self.last_global_time_ns = None;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.last_global_time_ns = None;
    }

    /// Request an explicit phase for the next tick. Does not start playback.
    pub fn seek(&mut self, normalized_time: f32) {
        self.seeking = true;
        self.seek_normalized_time = normalized_time;
        self.finished = false;
    }

    pub fn set_blend_tree_root(&mut self, root: Option<NodeId>) {
        if self.blend_tree_root != root {
            self.blend_tree_root = root;
            self.formats_dirty = true;
        }
    }

    pub fn set_mapping(&mut self, mapping: ChannelMapping) {
        self.layout = mapping.layout();
        self.mapping = mapping;
        self.formats_dirty = true;
    }

    #[inline]
    pub fn mapping(&self) -> &ChannelMapping {
        &self.mapping
    }

    /// Unified channel layout derived from the mapping.
    #[inline]
    pub fn layout(&self) -> &ChannelLayout {
        &self.layout
    }

    /// Mark the clip formats for rebuilding at the next structural sync.
    #[inline]
    pub fn invalidate_formats(&mut self) {
        self.formats_dirty = true;
    }

    #[inline]
    pub fn formats_dirty(&self) -> bool {
        self.formats_dirty
    }

    #[inline]
    pub fn mark_formats_built(&mut self) {
        self.formats_dirty = false;
    }

    /// Seconds of global time since the previous tick; zero on the first.
    pub fn elapsed_seconds(&self, global_time_ns: i64) -> f64 {
        match self.last_global_time_ns {
            Some(last) => global_time_ns.saturating_sub(last).max(0) as f64 / 1e9,
            None => 0.0,
        }
    }

    /// The single write-back of a tick.
    pub(crate) fn commit(&mut self, global_time_ns: i64, eval: &EvaluationState) {
        self.last_global_time_ns = Some(global_time_ns);
        self.last_local_time = eval.local_time;
        self.last_normalized_time = eval.normalized_time;
        self.position = eval.position;
        self.current_loop = eval.current_loop;
        self.seeking = false;
        if eval.final_frame {
            self.running = false;
            self.finished = true;
            self.last_global_time_ns = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_machine_transitions() {
        let mut a = AnimatorState::default();
        assert_eq!(a.playback_state(), PlaybackState::Stopped);
        a.start();
        assert_eq!(a.playback_state(), PlaybackState::Running);
        a.seek(0.5);
        assert_eq!(a.playback_state(), PlaybackState::Seeking);
        a.commit(
            10,
            &EvaluationState {
                local_time: 0.5,
                normalized_time: 0.5,
                current_loop: 0,
                position: 0.5,
                final_frame: false,
            },
        );
        assert_eq!(a.playback_state(), PlaybackState::Running);
        a.stop();
        assert_eq!(a.playback_state(), PlaybackState::Stopped);
    }

    #[test]
    fn restart_after_finish_rewinds() {
        let mut a = AnimatorState::default();
        a.start();
        a.commit(
            1_000,
            &EvaluationState {
                local_time: 1.0,
                normalized_time: 1.0,
                current_loop: 0,
                position: 1.0,
                final_frame: true,
            },
        );
        assert!(!a.running && a.finished);
        a.start();
        assert_eq!(a.current_loop, 0);
        assert_eq!(a.last_normalized_time, 0.0);
        assert_eq!(a.position, 0.0);
        assert_eq!(a.elapsed_seconds(5_000), 0.0);
    }

    #[test]
    fn redundant_start_keeps_time_base() {
        let mut a = AnimatorState::default();
        a.start();
        a.commit(
            1_000,
            &EvaluationState {
                local_time: 0.25,
                normalized_time: 0.25,
                current_loop: 0,
                position: 0.25,
                final_frame: false,
            },
        );
        a.start();
        assert_eq!(a.last_global_time_ns, Some(1_000));
        assert!((a.elapsed_seconds(2_000) - 1e-6).abs() < 1e-15);
    }

    #[test]
    fn elapsed_is_measured_from_last_tick() {
        let mut a = AnimatorState::default();
        a.last_global_time_ns = Some(500_000_000);
        assert!((a.elapsed_seconds(2_000_000_000) - 1.5).abs() < 1e-12);
        assert_eq!(a.elapsed_seconds(0), 0.0);
    }
}
