//! Kinetic scheduler
//!
//! Runs a frame in three strictly separated phases:
//!
//! 1. structural sync: frontend [`SyncCommand`]s are applied to the
//!    [`Backend`] on the calling thread, and clip formats are rebuilt;
//! 2. jobs: one [`AnimatorJob`](kinetic_animation::AnimatorJob) per active
//!    animator on a rayon pool, sharing clips and the blend tree read-only;
//! 3. delivery: job-thread callbacks run as each job returns, main-thread
//!    callbacks are queued, and the [`FrameOutput`] goes to a
//!    [`FrontendSync`].

pub mod config;
pub mod error;
pub mod frontend;
pub mod scheduler;
pub mod sync;

pub use crate::config::SchedulerConfig;
pub use crate::error::{SchedulerError, SyncError};
pub use crate::frontend::{AnimatorStatus, FrontendSync, PropertyConflict, PropertyEntry, PropertyStore};
pub use crate::scheduler::{FrameOutput, FrameScheduler};
pub use crate::sync::{Backend, BlendNodeSpec, SyncCommand};
