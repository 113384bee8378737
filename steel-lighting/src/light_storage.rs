//! Nibble arrays holding one light field of a 16x16x16 section.

/// Bytes needed for one section: 4096 blocks at 4 bits each.
pub const LIGHT_ARRAY_SIZE: usize = 2048;

/// One light field of a section.
///
/// Sections that never saw a light change stay a single value; the first
/// differing write expands the storage into packed nibbles (low nibble is the
/// even block index).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LightStorage {
    /// Every block has this level.
    Uniform(u8),
    /// Two levels per byte, indexed `y * 256 + z * 16 + x`.
    Packed(Box<[u8; LIGHT_ARRAY_SIZE]>),
}

#[inline]
const fn block_index(x: usize, y: usize, z: usize) -> usize {
    debug_assert!(x < 16 && y < 16 && z < 16, "Coordinates must be 0-15");
    (y << 8) | (z << 4) | x
}

impl LightStorage {
    /// Storage with every block at `level`.
    #[must_use]
    pub fn filled(level: u8) -> Self {
        debug_assert!(level <= 15, "Light level must be 0-15");
        Self::Uniform(level)
    }

    /// Reads the level at local coordinates.
    #[must_use]
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        match self {
            Self::Uniform(level) => *level,
            Self::Packed(data) => {
                let index = block_index(x, y, z);
                (data[index >> 1] >> ((index & 1) << 2)) & 0x0F
            }
        }
    }

    /// Writes the level at local coordinates.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, level: u8) {
        debug_assert!(level <= 15, "Light level must be 0-15");
        if let Self::Uniform(current) = *self {
            if current == level {
                return;
            }
            *self = Self::Packed(Box::new([current | (current << 4); LIGHT_ARRAY_SIZE]));
        }

        if let Self::Packed(data) = self {
            let index = block_index(x, y, z);
            let shift = (index & 1) << 2;
            let byte = &mut data[index >> 1];
            *byte = (*byte & !(0x0F << shift)) | ((level & 0x0F) << shift);
        }
    }

    /// Sets every block to `level`.
    pub fn fill(&mut self, level: u8) {
        debug_assert!(level <= 15, "Light level must be 0-15");
        *self = Self::Uniform(level);
    }

    /// The packed nibble form, expanding uniform storage.
    #[must_use]
    pub fn to_packed(&self) -> Vec<u8> {
        match self {
            Self::Uniform(level) => vec![*level | (*level << 4); LIGHT_ARRAY_SIZE],
            Self::Packed(data) => data.to_vec(),
        }
    }
}

impl Default for LightStorage {
    fn default() -> Self {
        Self::Uniform(0)
    }
}
