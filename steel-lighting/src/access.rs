//! Capabilities the engine borrows from its host.
//!
//! The engine never owns chunk data. Every entry point takes the world as
//! `&mut W` for the duration of the call and reaches chunks through these
//! traits.

use steel_utils::{BlockPos, ChunkPos, SECTION_COUNT};

use crate::{chunk_lighting::ChunkLighting, light_type::LightType};

/// Which side of the game the engine runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The authoritative server.
    Server,
    /// A client; `updating` is set while it applies a burst of world changes.
    Client {
        /// The client is in the middle of applying world updates.
        updating: bool,
    },
}

/// Light storage and block properties of one chunk column.
///
/// Positions are world coordinates inside this chunk; implementations mask
/// them to local coordinates.
pub trait ChunkLightStore {
    /// Position of this chunk.
    fn chunk_pos(&self) -> ChunkPos;

    /// Stored light of the given type.
    fn light(&self, light_type: LightType, pos: BlockPos) -> u8;

    /// Stores light of the given type. Writing into a section that is not
    /// prepared prepares it.
    fn set_light(&mut self, light_type: LightType, pos: BlockPos, value: u8);

    /// Light attenuation of the block, 0 to 15.
    fn opacity(&self, pos: BlockPos) -> u8;

    /// Light emitted by the block, 0 to 15.
    fn brightness(&self, pos: BlockPos) -> u8;

    /// Whether the section with the given index holds storage.
    fn is_section_prepared(&self, section_y: i32) -> bool;

    /// Lighting bookkeeping of the chunk.
    fn lighting(&self) -> &ChunkLighting;

    /// Mutable lighting bookkeeping of the chunk.
    fn lighting_mut(&mut self) -> &mut ChunkLighting;

    /// Flags the chunk as needing to be saved.
    fn mark_dirty(&mut self) {}

    /// Whether the block sees the open sky according to the height map.
    fn can_see_sky(&self, pos: BlockPos) -> bool {
        self.lighting()
            .height_map
            .can_see_sky(pos.local_x(), pos.y(), pos.local_z())
    }

    /// Index of the highest prepared section.
    fn top_prepared_section(&self) -> Option<i32> {
        (0..SECTION_COUNT)
            .rev()
            .find(|&section_y| self.is_section_prepared(section_y))
    }
}

/// Lookup of loaded chunks by position.
pub trait ChunkDirectory {
    /// The chunk type handed out.
    type Chunk: ChunkLightStore;

    /// The chunk at `pos`, if loaded.
    fn chunk(&self, pos: ChunkPos) -> Option<&Self::Chunk>;

    /// The chunk at `pos` for writing, if loaded.
    fn chunk_mut(&mut self, pos: ChunkPos) -> Option<&mut Self::Chunk>;
}

/// The world an engine lights.
pub trait WorldRoot: ChunkDirectory {
    /// Whether the world has a sky; without one sky light is always 0.
    fn has_sky(&self) -> bool;

    /// The side the world lives on.
    fn side(&self) -> Side {
        Side::Server
    }

    /// Called for every block whose light changed.
    fn mark_block_for_render_update(&mut self, pos: BlockPos);

    /// Whether the chunk at `pos` is loaded.
    fn chunk_exists(&self, pos: ChunkPos) -> bool {
        self.chunk(pos).is_some()
    }

    /// Whether every chunk touched by the inclusive block box is loaded.
    fn chunks_exist_in_range(&self, min: BlockPos, max: BlockPos) -> bool {
        let (min_chunk, max_chunk) = (min.chunk_pos(), max.chunk_pos());
        (min_chunk.x()..=max_chunk.x()).all(|x| {
            (min_chunk.z()..=max_chunk.z()).all(|z| self.chunk_exists(ChunkPos::new(x, z)))
        })
    }
}
