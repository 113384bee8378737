//! Lighting bookkeeping that travels with a chunk.

use crate::{height_map::SkyLightHeightMap, light_engine::BoundaryFlags};

/// Per-chunk state owned by the chunk store and maintained by the engine.
///
/// Everything except the random check cursor is persisted with the chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkLighting {
    /// Sky light heights of the columns.
    pub height_map: SkyLightHeightMap,
    /// Deferred border checks.
    pub boundary_flags: BoundaryFlags,
    /// Whether the chunk went through full lighting initialization.
    pub initialized: bool,
    /// Next slot `do_random_relight_checks` visits.
    pub random_check_cursor: u16,
}

impl ChunkLighting {
    /// Fresh bookkeeping for a chunk that has never been lit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
