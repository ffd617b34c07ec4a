//! Kinetic resource core
//!
//! Dense, generation-checked storage shared by every backend manager: clips,
//! blend nodes, clocks, animators and textures all live behind a [`Handle`]
//! handed out by a [`ResourceManager`]. Resources that the frontend addresses
//! by its own [`NodeId`] go through a [`NodeManager`], which layers the
//! external-id lookup on top of the arena.

pub mod handle;
pub mod ids;
pub mod manager;
pub mod node_manager;

pub use handle::Handle;
pub use ids::{IdAllocator, NodeId};
pub use manager::ResourceManager;
pub use node_manager::NodeManager;
