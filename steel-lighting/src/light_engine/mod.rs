//! Incremental light propagation using a bucketed two-phase flood fill.

mod base;
pub mod boundary_flags;
mod chunk_window;
pub mod direction;
mod guard;
pub mod light_queue;
pub mod packed_pos;
mod relight;

// Re-export main types for convenience
pub use base::LightEngine;
pub use boundary_flags::{BoundaryFacing, BoundaryFlags};
pub use chunk_window::ChunkWindow;
pub use direction::{Direction, DirectionSign};
pub use guard::ConcurrencyGuard;
pub use light_queue::{SegmentPool, SegmentedQueue};
pub use packed_pos::PackedPos;
