//! Axis directions used for neighbour walks and boundary bookkeeping.

use steel_utils::BlockPos;

/// Six axis directions around a block.
///
/// The discriminants double as indices into the engine's neighbour cache.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Downward (-Y direction)
    Down = 0,
    /// Upward (+Y direction)
    Up = 1,
    /// North (-Z direction)
    North = 2,
    /// South (+Z direction)
    South = 3,
    /// West (-X direction)
    West = 4,
    /// East (+X direction)
    East = 5,
}

impl Direction {
    /// All six directions in array form for iteration.
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// The four directions that cross into neighbouring chunks.
    pub const HORIZONTAL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Returns the opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Down => Self::Up,
            Self::Up => Self::Down,
            Self::North => Self::South,
            Self::South => Self::North,
            Self::West => Self::East,
            Self::East => Self::West,
        }
    }

    /// Gets the offset in the given direction.
    ///
    /// Returns (dx, dy, dz) for this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32, i32) {
        match self {
            Self::Down => (0, -1, 0),
            Self::Up => (0, 1, 0),
            Self::North => (0, 0, -1),
            Self::South => (0, 0, 1),
            Self::West => (-1, 0, 0),
            Self::East => (1, 0, 0),
        }
    }

    /// Returns a new `BlockPos` relative to the given position in this direction.
    #[must_use]
    pub const fn relative(self, pos: BlockPos) -> BlockPos {
        let (dx, dy, dz) = self.offset();
        pos.offset(dx, dy, dz)
    }

    /// Finds the horizontal direction with the given x/z offset.
    #[must_use]
    pub const fn from_horizontal_offset(dx: i32, dz: i32) -> Option<Self> {
        match (dx, dz) {
            (0, -1) => Some(Self::North),
            (0, 1) => Some(Self::South),
            (-1, 0) => Some(Self::West),
            (1, 0) => Some(Self::East),
            _ => None,
        }
    }

    /// Index of a horizontal direction in [`Direction::HORIZONTAL`], `None` for up and down.
    #[must_use]
    pub const fn horizontal_index(self) -> Option<usize> {
        match self {
            Self::North => Some(0),
            Self::South => Some(1),
            Self::West => Some(2),
            Self::East => Some(3),
            Self::Down | Self::Up => None,
        }
    }
}

/// Which half of an axis something lies on.
///
/// Chunk borders are split in two halves along the axis perpendicular to the
/// border; the sign picks the half.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectionSign {
    /// Towards negative coordinates.
    Negative = 0,
    /// Towards positive coordinates.
    Positive = 1,
}

impl DirectionSign {
    /// Both signs.
    pub const ALL: [DirectionSign; 2] = [DirectionSign::Negative, DirectionSign::Positive];

    /// -1 or +1.
    #[must_use]
    pub const fn sign(self) -> i32 {
        match self {
            Self::Negative => -1,
            Self::Positive => 1,
        }
    }

    /// The sign a direction points along its own axis.
    #[must_use]
    pub const fn of(direction: Direction) -> Self {
        match direction {
            Direction::Up | Direction::South | Direction::East => Self::Positive,
            Direction::Down | Direction::North | Direction::West => Self::Negative,
        }
    }

    /// The border half that local column `(x, z)` lies on when looking across `direction`.
    #[must_use]
    pub const fn of_column(direction: Direction, x: usize, z: usize) -> Self {
        let perpendicular = match direction {
            Direction::North | Direction::South => x,
            _ => z,
        };
        if perpendicular < 8 {
            Self::Negative
        } else {
            Self::Positive
        }
    }
}
