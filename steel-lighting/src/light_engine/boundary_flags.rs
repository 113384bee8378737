//! Deferred cross-chunk relight markers.
//!
//! When relight work would spill into a chunk that is not loaded, the chunk
//! that owns the work records it here instead. Each flag is a 16 bit mask of
//! the sections whose border still has to be rechecked.

use crate::light_type::LightType;

use super::direction::{Direction, DirectionSign};

/// Number of flag slots per chunk: 2 light types x 4 directions x 2 halves x in/out.
pub const FLAG_COUNT: usize = 32;

/// Whether a flag describes work owed to a neighbour or work received from one.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryFacing {
    /// Work this chunk has to do on its own border.
    In = 0,
    /// Work a neighbour has to do on its border once it loads.
    Out = 1,
}

/// The flag slots of one chunk.
///
/// Index layout:
/// ```text
/// bit  4      3..2          1        0
///      | type | direction | sign | facing |
/// ```
/// with direction being the position in [`Direction::HORIZONTAL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundaryFlags([u16; FLAG_COUNT]);

impl BoundaryFlags {
    /// No pending checks.
    #[must_use]
    pub const fn new() -> Self {
        Self([0; FLAG_COUNT])
    }

    /// Wraps persisted flag words.
    #[must_use]
    pub const fn from_raw(raw: [u16; FLAG_COUNT]) -> Self {
        Self(raw)
    }

    /// The flag words in index order.
    #[must_use]
    pub const fn raw(&self) -> &[u16; FLAG_COUNT] {
        &self.0
    }

    /// Computes the slot for a flag.
    ///
    /// # Panics
    /// Panics in debug builds when `direction` is not horizontal.
    #[must_use]
    pub fn index(
        light_type: LightType,
        direction: Direction,
        sign: DirectionSign,
        facing: BoundaryFacing,
    ) -> usize {
        debug_assert!(
            direction.horizontal_index().is_some(),
            "Boundary flags only exist for horizontal directions"
        );
        let direction = direction.horizontal_index().unwrap_or(0);
        ((light_type as usize) << 4) | (direction << 2) | ((sign as usize) << 1) | facing as usize
    }

    /// Reads a section mask.
    #[must_use]
    pub fn get(
        &self,
        light_type: LightType,
        direction: Direction,
        sign: DirectionSign,
        facing: BoundaryFacing,
    ) -> u16 {
        self.0[Self::index(light_type, direction, sign, facing)]
    }

    /// ORs sections into a mask.
    pub fn set(
        &mut self,
        light_type: LightType,
        direction: Direction,
        sign: DirectionSign,
        facing: BoundaryFacing,
        sections: u16,
    ) {
        self.0[Self::index(light_type, direction, sign, facing)] |= sections;
    }

    /// Clears a mask, returning the sections it held.
    pub fn clear(
        &mut self,
        light_type: LightType,
        direction: Direction,
        sign: DirectionSign,
        facing: BoundaryFacing,
    ) -> u16 {
        std::mem::take(&mut self.0[Self::index(light_type, direction, sign, facing)])
    }

    /// Whether any check is pending.
    #[must_use]
    pub fn any(&self) -> bool {
        self.0.iter().any(|&flag| flag != 0)
    }
}
