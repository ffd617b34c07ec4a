use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use kinetic_animation::{
    AnimationConfig, AnimationRecord, AnimatorJob, AnimatorState, CallbackDelivery, JobOutput,
    NodeId, PendingCallback, Scratch,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::sync::{Backend, SyncCommand};

/// Everything one frame produced, for frontend sync and diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameOutput {
    pub frame: u64,
    pub global_time_ns: i64,
    /// One record per evaluated animator, in animator order.
    pub records: Vec<AnimationRecord>,
    pub jobs_run: usize,
    pub clip_evaluations: usize,
    /// Callbacks run on the job's worker.
    pub callbacks_invoked: usize,
    /// Callbacks queued for [`FrameScheduler::dispatch_main_thread_callbacks`].
    pub callbacks_posted: usize,
}

/// Drives a frame: structural sync, then one job per active animator on
/// the worker pool, then callback delivery.
#[derive(Debug)]
pub struct FrameScheduler {
    backend: Backend,
    pool: Option<rayon::ThreadPool>,
    /// Used when jobs run on the calling thread.
    scratch: Scratch,
    animation: AnimationConfig,
    frame: u64,
    main_tx: Sender<PendingCallback>,
    main_rx: Receiver<PendingCallback>,
}

impl FrameScheduler {
    pub fn new(cfg: SchedulerConfig) -> Result<Self, SchedulerError> {
        let pool = if cfg.parallel {
            Some(build_pool(cfg.worker_threads)?)
        } else {
            None
        };
        let (main_tx, main_rx) = unbounded();
        Ok(Self {
            backend: Backend::new(cfg.animation.clone()),
            pool,
            scratch: Scratch::new(&cfg.animation),
            animation: cfg.animation,
            frame: 0,
            main_tx,
            main_rx,
        })
    }

    #[inline]
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    #[inline]
    pub fn animator(&self, id: NodeId) -> Option<&AnimatorState> {
        self.backend.animator(id)
    }

    /// Index of the last frame stepped; 0 before the first.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Apply `commands` without running any job.
    pub fn sync(&mut self, commands: impl IntoIterator<Item = SyncCommand>) -> Result<()> {
        for command in commands {
            self.backend
                .apply(command)
                .with_context(|| format!("structural sync before frame {}", self.frame + 1))?;
        }
        let rebuilt = self.backend.rebuild_formats();
        if rebuilt > 0 {
            log::debug!("rebuilt clip formats for {rebuilt} animators");
        }
        Ok(())
    }

    /// Advance to `global_time_ns`.
    ///
    /// Commands are applied first, in order; if one fails the frame is not
    /// run and the error says which frame it belonged to. Stopped animators
    /// are not scheduled.
    pub fn step(
        &mut self,
        global_time_ns: i64,
        commands: impl IntoIterator<Item = SyncCommand>,
    ) -> Result<FrameOutput> {
        self.sync(commands)?;
        self.frame = self.frame.wrapping_add(1);
        let frame = self.frame;

        let (inputs, animators) = self.backend.split_for_jobs();
        let jobs: Vec<(NodeId, &mut AnimatorState)> = animators
            .iter_mut()
            .filter(|(_, state)| state.running || state.seeking)
            .collect();
        let jobs_run = jobs.len();
        let main_tx = &self.main_tx;

        let outputs: Vec<Delivered> = match &self.pool {
            Some(pool) => {
                let cfg = &self.animation;
                pool.install(|| {
                    jobs.into_par_iter()
                        .map_init(
                            || Scratch::new(cfg),
                            |scratch, (id, state)| {
                                let out = AnimatorJob::new(id, state, inputs, global_time_ns)
                                    .run(scratch);
                                deliver_callbacks(out, main_tx)
                            },
                        )
                        .collect()
                })
            }
            None => {
                let scratch = &mut self.scratch;
                scratch.begin_frame();
                jobs.into_iter()
                    .map(|(id, state)| {
                        let out =
                            AnimatorJob::new(id, state, inputs, global_time_ns).run(scratch);
                        deliver_callbacks(out, main_tx)
                    })
                    .collect()
            }
        };

        let mut output = FrameOutput {
            frame,
            global_time_ns,
            records: Vec::with_capacity(outputs.len()),
            jobs_run,
            clip_evaluations: 0,
            callbacks_invoked: 0,
            callbacks_posted: 0,
        };
        for delivered in outputs {
            output.clip_evaluations += delivered.output.clips_evaluated;
            output.callbacks_invoked += delivered.invoked;
            output.callbacks_posted += delivered.posted;
            if let Some(record) = delivered.output.record {
                output.records.push(record);
            }
        }
        log::trace!(
            "frame {frame}: {jobs_run} jobs, {} clip evaluations, {} callbacks queued",
            output.clip_evaluations,
            output.callbacks_posted
        );
        Ok(output)
    }

    /// Run every callback queued for the main thread. Call from the thread
    /// that owns the frontend.
    pub fn dispatch_main_thread_callbacks(&self) -> usize {
        let mut n = 0;
        for callback in self.main_rx.try_iter() {
            callback.invoke();
            n += 1;
        }
        n
    }

    #[inline]
    pub fn pending_main_thread_callbacks(&self) -> usize {
        self.main_rx.len()
    }
}

struct Delivered {
    output: JobOutput,
    invoked: usize,
    posted: usize,
}

/// Run job-thread callbacks now and queue the rest for the main thread.
fn deliver_callbacks(mut output: JobOutput, main_tx: &Sender<PendingCallback>) -> Delivered {
    let mut invoked = 0;
    let mut posted = 0;
    for callback in output.callbacks.drain(..) {
        match callback.delivery {
            CallbackDelivery::OnJobThread => {
                callback.invoke();
                invoked += 1;
            }
            CallbackDelivery::OnMainThread => {
                // The receiver lives as long as the scheduler, so this cannot fail.
                let _ = main_tx.send(callback);
                posted += 1;
            }
        }
    }
    Delivered {
        output,
        invoked,
        posted,
    }
}

fn build_pool(threads: Option<usize>) -> Result<rayon::ThreadPool, SchedulerError> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    Ok(builder.build()?)
}
