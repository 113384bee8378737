//! Sky light height tracking for chunk columns.

use steel_utils::WORLD_HEIGHT;

/// Height value of a column that has not been computed yet.
pub const UNKNOWN_HEIGHT: i32 = i32::MAX;

/// Number of columns in a chunk.
pub const COLUMN_COUNT: usize = 256;

/// Tracks, per column, the lowest Y at which the sky is still visible.
///
/// Every block at or above the stored height sees the open sky, the block
/// directly below it is the first one with a non-zero sky opacity. A chunk
/// wide minimum is cached so the gap recheck can bound its work, and an
/// "outdated" bit per column marks columns whose neighbours have not been
/// reconciled against the current height yet.
///
/// Columns are indexed `z * 16 + x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkyLightHeightMap {
    heights: Box<[i32; COLUMN_COUNT]>,
    min_height: i32,
    outdated: [u64; 4],
}

impl SkyLightHeightMap {
    /// Creates a height map with every column unknown.
    #[must_use]
    pub fn new() -> Self {
        Self {
            heights: Box::new([UNKNOWN_HEIGHT; COLUMN_COUNT]),
            min_height: UNKNOWN_HEIGHT,
            outdated: [u64::MAX; 4],
        }
    }

    /// Rebuilds a height map from persisted column heights.
    #[must_use]
    pub fn from_heights(heights: [i32; COLUMN_COUNT]) -> Self {
        let mut map = Self {
            heights: Box::new(heights),
            min_height: UNKNOWN_HEIGHT,
            outdated: [u64::MAX; 4],
        };
        map.recompute_min_height();
        map
    }

    #[inline]
    const fn index(x: usize, z: usize) -> usize {
        debug_assert!(x < 16 && z < 16, "Column coordinates must be 0-15");
        z * 16 + x
    }

    /// Gets the stored height of a column.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, z: usize) -> i32 {
        self.heights[Self::index(x, z)]
    }

    /// Sets the height of a column. Does not touch the cached minimum.
    #[inline]
    pub fn set(&mut self, x: usize, z: usize, height: i32) {
        debug_assert!(
            height == UNKNOWN_HEIGHT || (0..=WORLD_HEIGHT).contains(&height),
            "Height must be within world bounds or unknown"
        );
        self.heights[Self::index(x, z)] = height;
    }

    /// All column heights in index order.
    #[must_use]
    pub fn heights(&self) -> &[i32; COLUMN_COUNT] {
        &self.heights
    }

    /// Whether a block at local `(x, z)` and height `y` sees the open sky.
    #[inline]
    #[must_use]
    pub fn can_see_sky(&self, x: usize, y: i32, z: usize) -> bool {
        y >= self.get(x, z)
    }

    /// The cached lowest height of any column.
    #[must_use]
    pub fn min_height(&self) -> i32 {
        self.min_height
    }

    /// Overrides the cached minimum.
    pub fn set_min_height(&mut self, min_height: i32) {
        self.min_height = min_height;
    }

    /// Recomputes the cached minimum from the column heights.
    pub fn recompute_min_height(&mut self) {
        self.min_height = self.heights.iter().copied().min().unwrap_or(UNKNOWN_HEIGHT);
    }

    /// Whether the column still needs a gap recheck.
    #[must_use]
    pub fn is_outdated(&self, x: usize, z: usize) -> bool {
        let index = Self::index(x, z);
        self.outdated[index / 64] & (1 << (index % 64)) != 0
    }

    /// Sets or clears the outdated bit of a column.
    pub fn set_outdated(&mut self, x: usize, z: usize, outdated: bool) {
        let index = Self::index(x, z);
        if outdated {
            self.outdated[index / 64] |= 1 << (index % 64);
        } else {
            self.outdated[index / 64] &= !(1 << (index % 64));
        }
    }

    /// Marks every column outdated.
    pub fn reset_outdated(&mut self) {
        self.outdated = [u64::MAX; 4];
    }

    /// Whether any column is still outdated.
    #[must_use]
    pub fn any_outdated(&self) -> bool {
        self.outdated.iter().any(|&bits| bits != 0)
    }
}

impl Default for SkyLightHeightMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_unknown() {
        let map = SkyLightHeightMap::new();
        assert_eq!(map.get(0, 0), UNKNOWN_HEIGHT);
        assert_eq!(map.min_height(), UNKNOWN_HEIGHT);
        assert!(!map.can_see_sky(3, 255, 3));
        assert!(map.is_outdated(15, 15));
    }

    #[test]
    fn test_can_see_sky() {
        let mut map = SkyLightHeightMap::new();
        map.set(4, 9, 64);
        assert!(map.can_see_sky(4, 64, 9));
        assert!(map.can_see_sky(4, 200, 9));
        assert!(!map.can_see_sky(4, 63, 9));
    }

    #[test]
    fn test_min_height() {
        let mut heights = [70; COLUMN_COUNT];
        heights[17] = 12;
        let map = SkyLightHeightMap::from_heights(heights);
        assert_eq!(map.min_height(), 12);
        assert_eq!(map.get(1, 1), 12);
    }

    #[test]
    fn test_outdated_bits() {
        let mut map = SkyLightHeightMap::new();
        map.set_outdated(7, 3, false);
        assert!(!map.is_outdated(7, 3));
        assert!(map.is_outdated(8, 3));
        assert!(map.any_outdated());

        for z in 0..16 {
            for x in 0..16 {
                map.set_outdated(x, z, false);
            }
        }
        assert!(!map.any_outdated());

        map.reset_outdated();
        assert!(map.is_outdated(7, 3));
    }
}
