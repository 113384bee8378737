// Wrapper types making it harder to accidentaly use the wrong underlying type.

use std::fmt::{self, Display};

use crate::math::{vector2::Vector2, vector3::Vector3};

/// Width of a chunk section along every axis.
pub const SECTION_SIZE: i32 = 16;
/// Number of vertical sections in a chunk column.
pub const SECTION_COUNT: i32 = 16;
/// Height of the world in blocks, y is always in `0..WORLD_HEIGHT`.
pub const WORLD_HEIGHT: i32 = SECTION_SIZE * SECTION_COUNT;

/// A chunk position. `y` of the inner vector is the chunk z coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChunkPos(pub Vector2<i32>);

impl ChunkPos {
    /// Creates a chunk position from chunk coordinates.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self(Vector2::new(x, z))
    }

    /// The chunk x coordinate.
    #[must_use]
    pub const fn x(self) -> i32 {
        self.0.x
    }

    /// The chunk z coordinate.
    #[must_use]
    pub const fn z(self) -> i32 {
        self.0.y
    }

    /// Returns the chunk containing the given block coordinates.
    #[must_use]
    pub const fn from_block_coords(x: i32, z: i32) -> Self {
        Self::new(x >> 4, z >> 4)
    }

    /// Returns the chunk offset by the given amount of chunks.
    #[must_use]
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.0.x + dx, self.0.y + dz)
    }

    /// Block x coordinate of the chunk's western edge.
    #[must_use]
    pub const fn min_block_x(self) -> i32 {
        self.0.x << 4
    }

    /// Block z coordinate of the chunk's northern edge.
    #[must_use]
    pub const fn min_block_z(self) -> i32 {
        self.0.y << 4
    }
}

impl Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.0.x, self.0.y)
    }
}

/// A block position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockPos(pub Vector3<i32>);

impl BlockPos {
    /// Creates a block position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// The x coordinate.
    #[must_use]
    pub const fn x(self) -> i32 {
        self.0.x
    }

    /// The y coordinate.
    #[must_use]
    pub const fn y(self) -> i32 {
        self.0.y
    }

    /// The z coordinate.
    #[must_use]
    pub const fn z(self) -> i32 {
        self.0.z
    }

    /// Returns this position moved by the given offsets.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.0.x + dx, self.0.y + dy, self.0.z + dz)
    }

    /// The chunk containing this position.
    #[must_use]
    pub const fn chunk_pos(self) -> ChunkPos {
        ChunkPos::from_block_coords(self.0.x, self.0.z)
    }

    /// Index of the vertical section containing this position.
    #[must_use]
    pub const fn section_y(self) -> i32 {
        self.0.y >> 4
    }

    /// X coordinate inside the chunk (0-15).
    #[must_use]
    pub const fn local_x(self) -> usize {
        (self.0.x & 15) as usize
    }

    /// Y coordinate inside the section (0-15).
    #[must_use]
    pub const fn local_y(self) -> usize {
        (self.0.y & 15) as usize
    }

    /// Z coordinate inside the chunk (0-15).
    #[must_use]
    pub const fn local_z(self) -> usize {
        (self.0.z & 15) as usize
    }

    /// Whether y lies inside the world height.
    #[must_use]
    pub const fn is_in_height(self) -> bool {
        self.0.y >= 0 && self.0.y < WORLD_HEIGHT
    }
}

impl Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.0.x, self.0.y, self.0.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_of_negative_block() {
        let pos = BlockPos::new(-1, 64, -17);
        assert_eq!(pos.chunk_pos(), ChunkPos::new(-1, -2));
        assert_eq!(pos.local_x(), 15);
        assert_eq!(pos.local_z(), 15);
    }

    #[test]
    fn test_section_index() {
        assert_eq!(BlockPos::new(0, 0, 0).section_y(), 0);
        assert_eq!(BlockPos::new(0, 255, 0).section_y(), 15);
        assert_eq!(BlockPos::new(0, 37, 0).local_y(), 5);
    }

    #[test]
    fn test_height_bounds() {
        assert!(BlockPos::new(0, 0, 0).is_in_height());
        assert!(BlockPos::new(0, 255, 0).is_in_height());
        assert!(!BlockPos::new(0, 256, 0).is_in_height());
        assert!(!BlockPos::new(0, -1, 0).is_in_height());
    }

    #[test]
    fn test_chunk_edges() {
        let chunk = ChunkPos::new(-2, 3);
        assert_eq!(chunk.min_block_x(), -32);
        assert_eq!(chunk.min_block_z(), 48);
        assert_eq!(chunk.offset(1, -1), ChunkPos::new(-1, 2));
    }
}
