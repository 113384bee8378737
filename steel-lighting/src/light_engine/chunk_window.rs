//! 5x5 chunk read window for reconciling sky heights around a chunk.

use steel_utils::ChunkPos;

use crate::access::ChunkDirectory;

const DIAMETER: i32 = 5;
const RADIUS: i32 = DIAMETER / 2;
const SLOTS: usize = (DIAMETER * DIAMETER) as usize;

/// Lazily memoized view of the chunks within two chunks of a center chunk.
///
/// Each slot is looked up in the directory at most once; later calls reuse
/// the answer, present or absent. Positions outside the window read as
/// unloaded.
pub struct ChunkWindow<'w, D: ChunkDirectory + ?Sized> {
    directory: &'w D,
    min_chunk_x: i32,
    min_chunk_z: i32,
    slots: [Option<Option<&'w D::Chunk>>; SLOTS],
}

impl<'w, D: ChunkDirectory + ?Sized> ChunkWindow<'w, D> {
    /// Creates a window centered on `center`.
    pub fn new(directory: &'w D, center: ChunkPos) -> Self {
        Self {
            directory,
            min_chunk_x: center.x() - RADIUS,
            min_chunk_z: center.z() - RADIUS,
            slots: [None; SLOTS],
        }
    }

    /// The chunk containing block column `(x, z)`.
    pub fn chunk_from_world_coords(&mut self, x: i32, z: i32) -> Option<&'w D::Chunk> {
        self.chunk((x >> 4) - self.min_chunk_x, (z >> 4) - self.min_chunk_z)
    }

    /// Whether every chunk touched by the square of block columns within
    /// `radius` of `(x, z)` is loaded.
    pub fn is_loaded(&mut self, x: i32, z: i32, radius: i32) -> bool {
        self.is_area_loaded(x - radius, z - radius, x + radius, z + radius)
    }

    /// Whether every chunk touched by the inclusive block column box is loaded.
    pub fn is_area_loaded(&mut self, min_x: i32, min_z: i32, max_x: i32, max_z: i32) -> bool {
        let (start_x, start_z) = ((min_x >> 4) - self.min_chunk_x, (min_z >> 4) - self.min_chunk_z);
        let (end_x, end_z) = ((max_x >> 4) - self.min_chunk_x, (max_z >> 4) - self.min_chunk_z);

        for i in start_x..=end_x {
            for j in start_z..=end_z {
                if self.chunk(i, j).is_none() {
                    return false;
                }
            }
        }
        true
    }

    fn chunk(&mut self, i: i32, j: i32) -> Option<&'w D::Chunk> {
        if !(0..DIAMETER).contains(&i) || !(0..DIAMETER).contains(&j) {
            return None;
        }
        let index = (i * DIAMETER + j) as usize;
        let directory = self.directory;
        let (chunk_x, chunk_z) = (self.min_chunk_x + i, self.min_chunk_z + j);
        *self.slots[index]
            .get_or_insert_with(|| directory.chunk(ChunkPos::new(chunk_x, chunk_z)))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::memory_world::{MemoryChunk, MemoryWorld};

    /// Counts directory lookups to check memoization.
    struct CountingDirectory {
        world: MemoryWorld,
        lookups: Cell<usize>,
    }

    impl ChunkDirectory for CountingDirectory {
        type Chunk = MemoryChunk;

        fn chunk(&self, pos: ChunkPos) -> Option<&MemoryChunk> {
            self.lookups.set(self.lookups.get() + 1);
            self.world.chunk(pos)
        }

        fn chunk_mut(&mut self, pos: ChunkPos) -> Option<&mut MemoryChunk> {
            self.world.chunk_mut(pos)
        }
    }

    fn square(radius: i32) -> MemoryWorld {
        let mut world = MemoryWorld::new(true);
        for x in -radius..=radius {
            for z in -radius..=radius {
                world.insert_empty_chunk(ChunkPos::new(x, z), 0..1);
            }
        }
        world
    }

    #[test]
    fn test_lookups_are_memoized() {
        let directory = CountingDirectory {
            world: square(1),
            lookups: Cell::new(0),
        };
        let mut window = ChunkWindow::new(&directory, ChunkPos::new(0, 0));

        assert!(window.chunk_from_world_coords(3, 3).is_some());
        assert!(window.chunk_from_world_coords(15, 0).is_some());
        assert!(window.chunk_from_world_coords(40, 0).is_none());
        assert!(window.chunk_from_world_coords(41, 0).is_none());
        assert_eq!(directory.lookups.get(), 2);
    }

    #[test]
    fn test_is_loaded_bounding_box() {
        let world = square(1);
        let mut window = ChunkWindow::new(&world, ChunkPos::new(0, 0));

        assert!(window.is_loaded(8, 8, 16));
        assert!(window.is_loaded(-8, 8, 8));
        assert!(!window.is_loaded(8, 8, 24));
        assert!(!window.is_loaded(20, 8, 16));
    }

    #[test]
    fn test_outside_window_is_unloaded() {
        let world = square(3);
        let mut window = ChunkWindow::new(&world, ChunkPos::new(0, 0));

        assert!(world.chunk(ChunkPos::new(3, 0)).is_some());
        assert!(window.chunk_from_world_coords(3 * 16, 0).is_none());
        assert!(window.chunk_from_world_coords(2 * 16, -2 * 16).is_some());
    }
}
