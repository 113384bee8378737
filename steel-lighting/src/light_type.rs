//! The two independent light fields.

use std::fmt::{self, Display};

/// Maximum light level of either field.
pub const MAX_LIGHT: u8 = 15;

/// Selects one of the two light fields.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightType {
    /// Light emitted by blocks.
    Block = 0,
    /// Light coming down from the open sky.
    Sky = 1,
}

impl LightType {
    /// Both light types, in processing order.
    pub const ALL: [LightType; 2] = [LightType::Block, LightType::Sky];

    /// Index used for per-type arrays.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Value assumed for positions whose chunk is not loaded.
    #[must_use]
    #[inline]
    pub const fn default_value(self) -> u8 {
        match self {
            Self::Block => 0,
            Self::Sky => MAX_LIGHT,
        }
    }
}

impl Display for LightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block => f.write_str("block"),
            Self::Sky => f.write_str("sky"),
        }
    }
}
