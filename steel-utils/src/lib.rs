//! Shared value types for the lighting workspace.

pub mod math;
mod types;

pub use types::{BlockPos, ChunkPos, SECTION_COUNT, SECTION_SIZE, WORLD_HEIGHT};
