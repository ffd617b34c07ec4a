use kinetic_animation::{BlendTreeError, LoadError, NodeId};
use thiserror::Error;

/// A structural sync command referenced something the backend does not have.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("unknown animator {0}")]
    UnknownAnimator(NodeId),
    #[error("unknown clock {0}")]
    UnknownClock(NodeId),
    #[error("unknown clip {0}")]
    UnknownClip(NodeId),
    #[error("animator {0} already exists")]
    DuplicateAnimator(NodeId),
    #[error(transparent)]
    BlendTree(#[from] BlendTreeError),
    #[error("failed to load clip {id}: {source}")]
    Load {
        id: NodeId,
        #[source]
        source: LoadError,
    },
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("failed to build job thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
