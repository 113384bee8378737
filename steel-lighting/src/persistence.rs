//! Saving and loading the per-chunk lighting bookkeeping as NBT.
//!
//! Three fields travel with a chunk:
//! - `neighbor_light_checks`: the 32 boundary flag words as a list of shorts,
//!   only written when a flag is set
//! - `sky_light_height_map`: 256 column heights as an int array
//! - `lighting_initialized`: byte boolean
//!
//! Light values themselves are stored by the chunk format.

use simdnbt::{
    ToNbtTag,
    owned::{NbtCompound, NbtList, NbtTag},
};
use steel_utils::{ChunkPos, WORLD_HEIGHT};

use crate::{
    chunk_lighting::ChunkLighting,
    error::LightingError,
    height_map::{COLUMN_COUNT, SkyLightHeightMap, UNKNOWN_HEIGHT},
    light_engine::{BoundaryFlags, boundary_flags::FLAG_COUNT},
};

/// Field holding the boundary flags.
pub const NEIGHBOR_LIGHT_CHECKS: &str = "neighbor_light_checks";
/// Field holding the column heights.
pub const SKY_LIGHT_HEIGHT_MAP: &str = "sky_light_height_map";
/// Field holding the initialized flag.
pub const LIGHTING_INITIALIZED: &str = "lighting_initialized";

/// Writes the lighting bookkeeping of a chunk into its NBT.
///
/// Any lighting fields already present are replaced, and a stale
/// `neighbor_light_checks` is dropped when no flag is set.
pub fn write_chunk_lighting(lighting: &ChunkLighting, nbt: &mut NbtCompound) {
    if lighting.boundary_flags.any() {
        let flags = lighting
            .boundary_flags
            .raw()
            .iter()
            .map(|&flag| flag as i16)
            .collect();
        replace_field(nbt, NEIGHBOR_LIGHT_CHECKS, NbtList::Short(flags));
    } else {
        remove_field(nbt, NEIGHBOR_LIGHT_CHECKS);
    }
    replace_field(
        nbt,
        SKY_LIGHT_HEIGHT_MAP,
        NbtTag::IntArray(lighting.height_map.heights().to_vec()),
    );
    replace_field(nbt, LIGHTING_INITIALIZED, NbtTag::Byte(i8::from(lighting.initialized)));
}

/// Inserts `tag` under `name`, dropping every earlier entry with that name.
///
/// `NbtCompound::insert` appends and `get` returns the first match, so a plain
/// insert would be shadowed by an older value.
fn replace_field(nbt: &mut NbtCompound, name: &'static str, tag: impl ToNbtTag) {
    remove_field(nbt, name);
    nbt.insert(name, tag);
}

fn remove_field(nbt: &mut NbtCompound, name: &str) {
    while nbt.remove(name).is_some() {}
}

/// Reads the lighting bookkeeping of a chunk, tolerating damaged data.
///
/// Unusable boundary flags are dropped with a warning; the border checks
/// they described are recovered by the next relight of the chunk. An unusable
/// or missing height map or initialized flag returns the chunk uninitialized
/// so it is lit again from scratch.
#[must_use]
pub fn read_chunk_lighting(nbt: &NbtCompound, chunk: ChunkPos) -> ChunkLighting {
    let boundary_flags = read_flags(nbt, chunk).unwrap_or_else(|err| {
        log::warn!("Ignoring {NEIGHBOR_LIGHT_CHECKS}: {err}");
        BoundaryFlags::new()
    });

    let (height_map, initialized) = match (read_height_map(nbt, chunk), read_initialized(nbt, chunk)) {
        (Ok(height_map), Ok(initialized)) => (height_map, initialized),
        (height_map, initialized) => {
            for err in [height_map.as_ref().err(), initialized.as_ref().err()].into_iter().flatten() {
                log::warn!("Chunk lighting will be recomputed: {err}");
            }
            (height_map.unwrap_or_default(), false)
        }
    };

    ChunkLighting {
        height_map,
        boundary_flags,
        initialized,
        random_check_cursor: 0,
    }
}

/// Reads the lighting bookkeeping of a chunk, failing on any damaged field.
///
/// A missing `neighbor_light_checks` field is not an error since it is only
/// written when a flag is set.
pub fn try_read_chunk_lighting(nbt: &NbtCompound, chunk: ChunkPos) -> Result<ChunkLighting, LightingError> {
    Ok(ChunkLighting {
        boundary_flags: read_flags(nbt, chunk)?,
        height_map: read_height_map(nbt, chunk)?,
        initialized: read_initialized(nbt, chunk)?,
        random_check_cursor: 0,
    })
}

fn read_flags(nbt: &NbtCompound, chunk: ChunkPos) -> Result<BoundaryFlags, LightingError> {
    let flags = match nbt.get(NEIGHBOR_LIGHT_CHECKS) {
        None => return Ok(BoundaryFlags::new()),
        Some(NbtTag::List(NbtList::Short(flags))) => flags,
        Some(_) => {
            return Err(LightingError::UnexpectedTag {
                chunk,
                field: NEIGHBOR_LIGHT_CHECKS,
            });
        }
    };

    let raw: Vec<u16> = flags.iter().map(|&flag| flag as u16).collect();
    let raw = <[u16; FLAG_COUNT]>::try_from(raw).map_err(|raw| LightingError::BadLength {
        chunk,
        field: NEIGHBOR_LIGHT_CHECKS,
        found: raw.len(),
        expected: FLAG_COUNT,
    })?;
    Ok(BoundaryFlags::from_raw(raw))
}

fn read_height_map(nbt: &NbtCompound, chunk: ChunkPos) -> Result<SkyLightHeightMap, LightingError> {
    let heights = match nbt.get(SKY_LIGHT_HEIGHT_MAP) {
        Some(NbtTag::IntArray(heights)) => heights,
        Some(_) => {
            return Err(LightingError::UnexpectedTag {
                chunk,
                field: SKY_LIGHT_HEIGHT_MAP,
            });
        }
        None => {
            return Err(LightingError::MissingField {
                chunk,
                field: SKY_LIGHT_HEIGHT_MAP,
            });
        }
    };

    let heights = <[i32; COLUMN_COUNT]>::try_from(heights.as_slice()).map_err(|_| {
        LightingError::BadLength {
            chunk,
            field: SKY_LIGHT_HEIGHT_MAP,
            found: heights.len(),
            expected: COLUMN_COUNT,
        }
    })?;
    if let Some(&height) = heights
        .iter()
        .find(|&&height| height != UNKNOWN_HEIGHT && !(0..=WORLD_HEIGHT).contains(&height))
    {
        return Err(LightingError::OutOfRange {
            chunk,
            field: SKY_LIGHT_HEIGHT_MAP,
            value: i64::from(height),
        });
    }
    Ok(SkyLightHeightMap::from_heights(heights))
}

fn read_initialized(nbt: &NbtCompound, chunk: ChunkPos) -> Result<bool, LightingError> {
    match nbt.get(LIGHTING_INITIALIZED) {
        Some(NbtTag::Byte(value)) => Ok(*value != 0),
        Some(_) => Err(LightingError::UnexpectedTag {
            chunk,
            field: LIGHTING_INITIALIZED,
        }),
        None => Err(LightingError::MissingField {
            chunk,
            field: LIGHTING_INITIALIZED,
        }),
    }
}
