//! Incremental block and sky light engine for chunked voxel worlds.
//!
//! The engine keeps per-block light levels consistent after world edits by
//! running a bucketed flood fill: darkening first so stale light is removed,
//! then brightening from every position whose light survived. Chunks are
//! borrowed from the host through the traits in [`access`]; the engine owns
//! only its queues.

pub mod access;
pub mod chunk_lighting;
pub mod config;
pub mod error;
pub mod height_map;
pub mod light_engine;
pub mod light_storage;
pub mod light_type;
pub mod memory_world;
pub mod persistence;

pub use access::{ChunkDirectory, ChunkLightStore, Side, WorldRoot};
pub use chunk_lighting::ChunkLighting;
pub use config::LightingConfig;
pub use error::LightingError;
pub use height_map::SkyLightHeightMap;
pub use light_engine::LightEngine;
pub use light_type::{LightType, MAX_LIGHT};
pub use memory_world::{BlockProps, MemoryChunk, MemoryWorld};
pub use persistence::{read_chunk_lighting, try_read_chunk_lighting, write_chunk_lighting};
