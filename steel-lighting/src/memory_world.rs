//! In-memory world for tests, benches and tools.
//!
//! Chunks live in a hash map and are "loaded" while present in it. Nothing is
//! persisted; hosts with real chunk storage implement the access traits on
//! their own types instead.

use rustc_hash::{FxHashMap, FxHashSet};
use steel_utils::{BlockPos, ChunkPos, SECTION_COUNT};

use crate::{
    access::{ChunkDirectory, ChunkLightStore, Side, WorldRoot},
    chunk_lighting::ChunkLighting,
    light_storage::LightStorage,
    light_type::LightType,
};

const SECTION_VOLUME: usize = 4096;

/// Light relevant properties of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockProps {
    /// Attenuation, 0 to 15.
    pub opacity: u8,
    /// Emission, 0 to 15.
    pub brightness: u8,
}

impl BlockProps {
    /// Fully transparent, non-emitting.
    pub const AIR: Self = Self::new(0, 0);
    /// Fully opaque, non-emitting.
    pub const SOLID: Self = Self::new(15, 0);

    /// Creates block properties.
    #[must_use]
    pub const fn new(opacity: u8, brightness: u8) -> Self {
        Self {
            opacity,
            brightness,
        }
    }
}

struct MemorySection {
    blocks: Box<[BlockProps; SECTION_VOLUME]>,
    block_light: LightStorage,
    sky_light: LightStorage,
}

impl MemorySection {
    fn new() -> Box<Self> {
        Box::new(Self {
            blocks: Box::new([BlockProps::AIR; SECTION_VOLUME]),
            block_light: LightStorage::default(),
            sky_light: LightStorage::default(),
        })
    }

    #[inline]
    fn block_index(pos: BlockPos) -> usize {
        (pos.local_y() << 8) | (pos.local_z() << 4) | pos.local_x()
    }

    fn storage(&self, light_type: LightType) -> &LightStorage {
        match light_type {
            LightType::Block => &self.block_light,
            LightType::Sky => &self.sky_light,
        }
    }

    fn storage_mut(&mut self, light_type: LightType) -> &mut LightStorage {
        match light_type {
            LightType::Block => &mut self.block_light,
            LightType::Sky => &mut self.sky_light,
        }
    }
}

/// One chunk column held in memory.
pub struct MemoryChunk {
    pos: ChunkPos,
    sections: [Option<Box<MemorySection>>; SECTION_COUNT as usize],
    lighting: ChunkLighting,
    dirty: bool,
}

impl MemoryChunk {
    /// An empty chunk with no prepared sections.
    #[must_use]
    pub fn new(pos: ChunkPos) -> Self {
        Self {
            pos,
            sections: std::array::from_fn(|_| None),
            lighting: ChunkLighting::new(),
            dirty: false,
        }
    }

    fn section(&self, section_y: i32) -> Option<&MemorySection> {
        let index = usize::try_from(section_y).ok()?;
        self.sections.get(index)?.as_deref()
    }

    fn section_mut(&mut self, section_y: i32) -> Option<&mut MemorySection> {
        let index = usize::try_from(section_y).ok()?;
        let slot = self.sections.get_mut(index)?;
        Some(slot.get_or_insert_with(MemorySection::new))
    }

    /// Allocates storage for a section; returns whether it was newly prepared.
    pub fn prepare_section(&mut self, section_y: i32) -> bool {
        let newly = !self.is_section_prepared(section_y);
        self.section_mut(section_y);
        newly
    }

    /// Places a block, preparing its section.
    pub fn set_block(&mut self, pos: BlockPos, props: BlockProps) {
        if let Some(section) = self.section_mut(pos.section_y()) {
            section.blocks[MemorySection::block_index(pos)] = props;
            self.dirty = true;
        }
    }

    /// The block at `pos`; air in unprepared sections.
    #[must_use]
    pub fn block(&self, pos: BlockPos) -> BlockProps {
        self.section(pos.section_y())
            .map_or(BlockProps::AIR, |section| {
                section.blocks[MemorySection::block_index(pos)]
            })
    }

    /// Whether anything changed since the last [`MemoryChunk::take_dirty`].
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns and clears the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

impl ChunkLightStore for MemoryChunk {
    fn chunk_pos(&self) -> ChunkPos {
        self.pos
    }

    fn light(&self, light_type: LightType, pos: BlockPos) -> u8 {
        match self.section(pos.section_y()) {
            Some(section) => {
                section
                    .storage(light_type)
                    .get(pos.local_x(), pos.local_y(), pos.local_z())
            }
            None if light_type == LightType::Sky && self.can_see_sky(pos) => {
                light_type.default_value()
            }
            None => 0,
        }
    }

    fn set_light(&mut self, light_type: LightType, pos: BlockPos, value: u8) {
        if let Some(section) = self.section_mut(pos.section_y()) {
            section
                .storage_mut(light_type)
                .set(pos.local_x(), pos.local_y(), pos.local_z(), value);
        }
    }

    fn opacity(&self, pos: BlockPos) -> u8 {
        self.block(pos).opacity
    }

    fn brightness(&self, pos: BlockPos) -> u8 {
        self.block(pos).brightness
    }

    fn is_section_prepared(&self, section_y: i32) -> bool {
        self.section(section_y).is_some()
    }

    fn lighting(&self) -> &ChunkLighting {
        &self.lighting
    }

    fn lighting_mut(&mut self) -> &mut ChunkLighting {
        &mut self.lighting
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

/// A world whose loaded chunks are the ones inserted into it.
pub struct MemoryWorld {
    chunks: FxHashMap<ChunkPos, MemoryChunk>,
    has_sky: bool,
    side: Side,
    render_updates: FxHashSet<BlockPos>,
}

impl MemoryWorld {
    /// Creates an empty server side world.
    #[must_use]
    pub fn new(has_sky: bool) -> Self {
        Self {
            chunks: FxHashMap::default(),
            has_sky,
            side: Side::Server,
            render_updates: FxHashSet::default(),
        }
    }

    /// Changes the side reported to the engine.
    #[must_use]
    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    /// Loads a chunk, replacing any chunk at the same position.
    pub fn insert_chunk(&mut self, chunk: MemoryChunk) -> Option<MemoryChunk> {
        self.chunks.insert(chunk.chunk_pos(), chunk)
    }

    /// Loads an empty chunk with the given sections prepared.
    pub fn insert_empty_chunk(
        &mut self,
        pos: ChunkPos,
        prepared: impl IntoIterator<Item = i32>,
    ) -> &mut MemoryChunk {
        let mut chunk = MemoryChunk::new(pos);
        for section_y in prepared {
            chunk.prepare_section(section_y);
        }
        self.chunks.entry(pos).insert_entry(chunk).into_mut()
    }

    /// Unloads a chunk.
    pub fn remove_chunk(&mut self, pos: ChunkPos) -> Option<MemoryChunk> {
        self.chunks.remove(&pos)
    }

    /// Places a block; returns false when its chunk is not loaded.
    pub fn set_block(&mut self, pos: BlockPos, props: BlockProps) -> bool {
        match self.chunks.get_mut(&pos.chunk_pos()) {
            Some(chunk) if pos.is_in_height() => {
                chunk.set_block(pos, props);
                true
            }
            _ => false,
        }
    }

    /// Places the same block in every position of the inclusive box.
    pub fn fill(&mut self, min: BlockPos, max: BlockPos, props: BlockProps) {
        for y in min.y()..=max.y() {
            for z in min.z()..=max.z() {
                for x in min.x()..=max.x() {
                    self.set_block(BlockPos::new(x, y, z), props);
                }
            }
        }
    }

    /// The block at `pos`, if its chunk is loaded.
    #[must_use]
    pub fn block(&self, pos: BlockPos) -> Option<BlockProps> {
        self.chunks.get(&pos.chunk_pos()).map(|chunk| chunk.block(pos))
    }

    /// The stored light at `pos` without draining any pending update.
    #[must_use]
    pub fn stored_light(&self, light_type: LightType, pos: BlockPos) -> Option<u8> {
        if light_type == LightType::Sky && !self.has_sky {
            return Some(0);
        }
        self.chunks
            .get(&pos.chunk_pos())
            .map(|chunk| chunk.light(light_type, pos))
    }

    /// Positions reported through `mark_block_for_render_update` so far.
    #[must_use]
    pub fn render_updates(&self) -> &FxHashSet<BlockPos> {
        &self.render_updates
    }

    /// Returns and clears the reported render updates.
    pub fn take_render_updates(&mut self) -> FxHashSet<BlockPos> {
        std::mem::take(&mut self.render_updates)
    }
}

impl ChunkDirectory for MemoryWorld {
    type Chunk = MemoryChunk;

    fn chunk(&self, pos: ChunkPos) -> Option<&MemoryChunk> {
        self.chunks.get(&pos)
    }

    fn chunk_mut(&mut self, pos: ChunkPos) -> Option<&mut MemoryChunk> {
        self.chunks.get_mut(&pos)
    }
}

impl WorldRoot for MemoryWorld {
    fn has_sky(&self) -> bool {
        self.has_sky
    }

    fn side(&self) -> Side {
        self.side
    }

    fn mark_block_for_render_update(&mut self, pos: BlockPos) {
        self.render_updates.insert(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unprepared_section_reads() {
        let mut chunk = MemoryChunk::new(ChunkPos::new(0, 0));
        chunk.lighting_mut().height_map.set(2, 3, 40);
        assert_eq!(chunk.light(LightType::Sky, BlockPos::new(2, 60, 3)), 15);
        assert_eq!(chunk.light(LightType::Sky, BlockPos::new(2, 20, 3)), 0);
        assert_eq!(chunk.light(LightType::Block, BlockPos::new(2, 60, 3)), 0);
        assert!(!chunk.is_section_prepared(3));
    }

    #[test]
    fn test_set_light_prepares_section() {
        let mut chunk = MemoryChunk::new(ChunkPos::new(-1, 2));
        let pos = BlockPos::new(-5, 70, 40);
        chunk.set_light(LightType::Block, pos, 9);
        assert!(chunk.is_section_prepared(4));
        assert_eq!(chunk.light(LightType::Block, pos), 9);
        assert_eq!(chunk.top_prepared_section(), Some(4));
    }

    #[test]
    fn test_world_block_access() {
        let mut world = MemoryWorld::new(true);
        assert!(!world.set_block(BlockPos::new(0, 0, 0), BlockProps::SOLID));

        world.insert_empty_chunk(ChunkPos::new(0, 0), 0..4);
        assert!(world.set_block(BlockPos::new(1, 2, 3), BlockProps::new(3, 7)));
        assert!(!world.set_block(BlockPos::new(1, 300, 3), BlockProps::SOLID));
        assert_eq!(world.block(BlockPos::new(1, 2, 3)), Some(BlockProps::new(3, 7)));
        assert!(world.chunk_exists(ChunkPos::new(0, 0)));
        assert!(!world.chunks_exist_in_range(BlockPos::new(0, 0, 0), BlockPos::new(16, 0, 0)));
    }

    #[test]
    fn test_no_sky_reads_zero() {
        let mut world = MemoryWorld::new(false);
        world.insert_empty_chunk(ChunkPos::new(0, 0), 0..1);
        assert_eq!(world.stored_light(LightType::Sky, BlockPos::new(0, 0, 0)), Some(0));
    }
}
