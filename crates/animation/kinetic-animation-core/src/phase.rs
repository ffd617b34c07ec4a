//! Playback time math: elapsed time and loop policy to phase.
//!
//! Position is tracked in loop units: `u = loop_index + in_loop_fraction`,
//! kept in `f64` across ticks. Each tick advances `u` by
//! `rate * elapsed / duration`, then applies the loop policy. Working in
//! loop units keeps the phase continuous when the blend tree's duration
//! changes between frames. The `f32` normalized time is derived for output
//! only and never fed back.

use serde::{Deserialize, Serialize};

/// `loop_count` value meaning "repeat forever".
pub const INFINITE_LOOPS: i32 = -1;

#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    /// Every loop runs start to end.
    #[default]
    Repeat,
    /// Odd loops run end to start.
    PingPong,
}

/// Everything the phase computation reads for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseInput {
    /// Seconds of global time since the previous tick.
    pub elapsed: f64,
    /// Effective rate (animator rate times clock rate).
    pub playback_rate: f64,
    pub current_loop: i32,
    /// Position after the previous tick, in loop units, before ping-pong
    /// reflection.
    pub position: f64,
    /// Negative for infinite; zero is treated as one.
    pub loop_count: i32,
    pub loop_mode: LoopMode,
    /// Explicit normalized time requested by a seek; replaces elapsed-time advance.
    pub seek: Option<f32>,
}

/// Result of one tick's phase computation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvaluationState {
    /// Seconds into the current loop, after the loop policy.
    pub local_time: f64,
    /// Phase in `[0, 1]`; the value every clip is evaluated at.
    pub normalized_time: f32,
    pub current_loop: i32,
    /// Loop-unit position to carry into the next tick.
    pub position: f64,
    /// This tick reaches the last sample under a finite loop count.
    pub final_frame: bool,
}

fn is_odd(n: i32) -> bool {
    n.rem_euclid(2) == 1
}

/// Compute the phase for a tree of length `duration` seconds.
pub fn evaluate_phase(input: &PhaseInput, duration: f64) -> EvaluationState {
    let finite = input.loop_count >= 0;
    let loops = input.loop_count.max(1);

    if !duration.is_finite() || duration <= 0.0 {
        return EvaluationState {
            local_time: 0.0,
            normalized_time: 0.0,
            current_loop: input.current_loop,
            position: input.position,
            final_frame: finite,
        };
    }

    let ping_pong = input.loop_mode == LoopMode::PingPong;
    let reflect = |loop_idx: i32, r: f64| {
        if ping_pong && is_odd(loop_idx) {
            1.0 - r
        } else {
            r
        }
    };

    let u = match input.seek {
        Some(n) => {
            let n = if n.is_nan() { 0.0 } else { f64::from(n.clamp(0.0, 1.0)) };
            f64::from(input.current_loop) + reflect(input.current_loop, n)
        }
        None => {
            let prev = if input.position.is_finite() {
                input.position
            } else {
                f64::from(input.current_loop)
            };
            prev + input.playback_rate * input.elapsed / duration
        }
    };

    let mut final_frame = false;
    let (loop_idx, r) = if finite && u >= f64::from(loops) {
        final_frame = input.seek.is_some() || input.playback_rate >= 0.0;
        (loops - 1, 1.0)
    } else if finite && u <= 0.0 {
        final_frame = input.seek.is_none() && input.playback_rate < 0.0;
        (0, 0.0)
    } else {
        let l = u.floor();
        (l as i32, u - l)
    };

    let out = reflect(loop_idx, r).clamp(0.0, 1.0);
    EvaluationState {
        local_time: out * duration,
        normalized_time: out as f32,
        current_loop: loop_idx,
        position: f64::from(loop_idx) + r,
        final_frame,
    }
}
