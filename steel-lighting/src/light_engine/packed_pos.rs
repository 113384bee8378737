//! Bit-packed block positions for the propagation queues.
//!
//! Queue entries are plain `u64`s so segments stay dense; a position and an
//! optional light level share one word.

use steel_utils::BlockPos;

/// A block position packed into a `u64`, optionally tagged with a light level.
///
/// Bit layout:
/// ```text
/// Bit Position:  63..60  59.....52  51...............26  25................0
///                | L L | Y (8 bits) | X (26 bits, biased) | Z (26 bits, biased) |
///                   |
///                   +-> Light level tag (4 bits), only used by brightening candidates
/// ```
///
/// X and Z are stored with a bias of 2^25 so negative coordinates fit the
/// unsigned fields. Valid inputs are x, z in `[-2^25, 2^25)` and y in `[0, 255]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PackedPos(u64);

impl PackedPos {
    const Z_SHIFT: u32 = 0;
    const X_SHIFT: u32 = 26;
    const Y_SHIFT: u32 = 52;
    const LIGHT_SHIFT: u32 = 60;

    const XZ_BITS: u64 = (1 << 26) - 1;
    const Y_BITS: u64 = (1 << 8) - 1;
    const LIGHT_BITS: u64 = (1 << 4) - 1;

    const POS_MASK: u64 = !(Self::LIGHT_BITS << Self::LIGHT_SHIFT);

    const XZ_BIAS: i64 = 1 << 25;

    /// Packs block coordinates.
    #[must_use]
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        debug_assert!(y >= 0 && y < 256, "Y must be 0-255");
        let x = (x as i64 + Self::XZ_BIAS) as u64 & Self::XZ_BITS;
        let z = (z as i64 + Self::XZ_BIAS) as u64 & Self::XZ_BITS;
        let y = y as u64 & Self::Y_BITS;
        Self((y << Self::Y_SHIFT) | (x << Self::X_SHIFT) | (z << Self::Z_SHIFT))
    }

    /// Packs a block position.
    #[must_use]
    #[inline]
    pub const fn from_block(pos: BlockPos) -> Self {
        Self::new(pos.x(), pos.y(), pos.z())
    }

    /// Reinterprets a raw queue word.
    #[must_use]
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw queue word.
    #[must_use]
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Unpacked x coordinate.
    #[must_use]
    #[inline]
    pub const fn x(self) -> i32 {
        (((self.0 >> Self::X_SHIFT) & Self::XZ_BITS) as i64 - Self::XZ_BIAS) as i32
    }

    /// Unpacked y coordinate.
    #[must_use]
    #[inline]
    pub const fn y(self) -> i32 {
        ((self.0 >> Self::Y_SHIFT) & Self::Y_BITS) as i32
    }

    /// Unpacked z coordinate.
    #[must_use]
    #[inline]
    pub const fn z(self) -> i32 {
        (((self.0 >> Self::Z_SHIFT) & Self::XZ_BITS) as i64 - Self::XZ_BIAS) as i32
    }

    /// Unpacks into a block position.
    #[must_use]
    #[inline]
    pub const fn block_pos(self) -> BlockPos {
        BlockPos::new(self.x(), self.y(), self.z())
    }

    /// The light level tag.
    #[must_use]
    #[inline]
    pub const fn light(self) -> u8 {
        ((self.0 >> Self::LIGHT_SHIFT) & Self::LIGHT_BITS) as u8
    }

    /// Returns the same position tagged with a light level.
    #[must_use]
    #[inline]
    pub const fn with_light(self, light: u8) -> Self {
        debug_assert!(light <= 15, "Light level must be 0-15");
        Self((self.0 & Self::POS_MASK) | ((light as u64 & Self::LIGHT_BITS) << Self::LIGHT_SHIFT))
    }

    /// Returns the position with the light tag cleared.
    #[must_use]
    #[inline]
    pub const fn without_light(self) -> Self {
        Self(self.0 & Self::POS_MASK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: i32 = 1 << 25;

    #[test]
    fn test_extremes_round_trip() {
        for x in [-LIMIT, -LIMIT + 1, -1, 0, 1, LIMIT - 1] {
            for z in [-LIMIT, -7, 0, 15, LIMIT - 1] {
                for y in [0, 1, 127, 255] {
                    let packed = PackedPos::new(x, y, z);
                    assert_eq!(packed.block_pos(), BlockPos::new(x, y, z));
                }
            }
        }
    }

    #[test]
    fn test_light_tag() {
        let packed = PackedPos::new(-300, 70, 42).with_light(13);
        assert_eq!(packed.light(), 13);
        assert_eq!(packed.block_pos(), BlockPos::new(-300, 70, 42));
        assert_eq!(packed.without_light(), PackedPos::new(-300, 70, 42));
        assert_eq!(packed.with_light(2).light(), 2);
    }

    #[test]
    fn test_untagged_light_is_zero() {
        assert_eq!(PackedPos::new(LIMIT - 1, 255, -LIMIT).light(), 0);
    }

    #[test]
    fn test_distinct_positions_pack_differently() {
        let a = PackedPos::new(1, 2, 3);
        let b = PackedPos::new(3, 2, 1);
        let c = PackedPos::new(1, 3, 2);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }
}
