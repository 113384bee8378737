//! Chunk lifecycle hooks of the engine.
//!
//! These keep sky heights current, seed light for freshly generated chunks
//! and replay border work that was deferred while a neighbour was missing.

use std::{cmp::Ordering, ops::Range};

use smallvec::SmallVec;
use steel_utils::{BlockPos, ChunkPos, SECTION_COUNT, SECTION_SIZE, WORLD_HEIGHT};

use crate::{
    access::{ChunkDirectory, ChunkLightStore, WorldRoot},
    height_map::UNKNOWN_HEIGHT,
    light_type::{LightType, MAX_LIGHT},
};

use super::{
    base::LightEngine,
    boundary_flags::BoundaryFacing,
    chunk_window::ChunkWindow,
    direction::{Direction, DirectionSign},
};

/// Slots walked by the random relight cursor: 16 sections x 16 x 16 columns.
const RANDOM_CHECK_SLOTS: u16 = 4096;

/// A column range the gap recheck wants rechecked.
type ColumnRange = (i32, i32, Range<i32>);

impl LightEngine {
    /// First lighting of a freshly generated chunk.
    ///
    /// Rebuilds the sky height map and, with a sky, fills every column
    /// top-down. Borders towards loaded neighbours are scheduled for a sky
    /// recheck right away; borders towards missing ones are recorded as
    /// boundary flags and replayed by [`LightEngine::handle_chunk_load`] once
    /// the neighbour arrives.
    pub fn handle_chunk_init<W: WorldRoot>(&self, world: &mut W, chunk_pos: ChunkPos) {
        let _guard = self.lock();
        let has_sky = world.has_sky();
        let Some(chunk) = world.chunk_mut(chunk_pos) else {
            return;
        };

        rebuild_height_map(chunk);
        let lit = if has_sky { fill_sky_columns(chunk) } else { Vec::new() };
        chunk.lighting_mut().initialized = false;
        chunk.mark_dirty();
        let top = chunk.top_prepared_section();

        for pos in lit {
            world.mark_block_for_render_update(pos);
        }

        let Some(top) = top.filter(|_| has_sky) else {
            return;
        };
        self.reconcile_sky_borders(world, chunk_pos, top);
    }

    /// Client side chunk initialization: only the height map is rebuilt,
    /// light arrives from the server.
    pub fn handle_client_chunk_init<W: WorldRoot>(&self, world: &mut W, chunk_pos: ChunkPos) {
        let Some(chunk) = world.chunk_mut(chunk_pos) else {
            return;
        };
        rebuild_height_map(chunk);
        chunk.lighting_mut().initialized = true;
    }

    /// A section became prepared: columns open to the sky at its top get full
    /// sky light through the whole section.
    pub fn handle_section_init<W: WorldRoot>(&self, world: &mut W, chunk_pos: ChunkPos, section_y: i32) {
        if !world.has_sky() || !(0..SECTION_COUNT).contains(&section_y) {
            return;
        }
        let _guard = self.lock();
        let Some(chunk) = world.chunk_mut(chunk_pos) else {
            return;
        };

        let base_y = section_y * SECTION_SIZE;
        let top_y = base_y + SECTION_SIZE - 1;
        for (x, z) in columns(chunk_pos) {
            if !chunk.can_see_sky(BlockPos::new(x, top_y, z)) {
                continue;
            }
            for y in base_y..=top_y {
                chunk.set_light(LightType::Sky, BlockPos::new(x, y, z), MAX_LIGHT);
            }
        }
        chunk.mark_dirty();
    }

    /// Merges boundary flags with the loaded horizontal neighbours and replays
    /// every deferred border check that can run now.
    ///
    /// Returns whether any sky work was scheduled.
    pub fn handle_chunk_load<W: WorldRoot>(&self, world: &mut W, chunk_pos: ChunkPos) -> bool {
        let _guard = self.lock();
        if !world.chunk_exists(chunk_pos) {
            return false;
        }

        let mut scheduled_sky = false;
        for direction in Direction::HORIZONTAL {
            let (dx, _, dz) = direction.offset();
            let neighbor_pos = chunk_pos.offset(dx, dz);
            if !world.chunk_exists(neighbor_pos) {
                continue;
            }

            for light_type in LightType::ALL {
                for sign in DirectionSign::ALL {
                    merge_flags(world, light_type, chunk_pos, neighbor_pos, direction, sign);
                    merge_flags(world, light_type, neighbor_pos, chunk_pos, direction.opposite(), sign);

                    let s = sign.sign();
                    let diagonal = Direction::from_horizontal_offset(
                        if dz != 0 { s } else { 0 },
                        if dx != 0 { s } else { 0 },
                    );

                    let mut scheduled = self.replay_boundary(world, light_type, chunk_pos, direction, sign);
                    scheduled |=
                        self.replay_boundary(world, light_type, neighbor_pos, direction.opposite(), sign);
                    if let Some(diagonal) = diagonal {
                        scheduled |= self.replay_boundary(
                            world,
                            light_type,
                            neighbor_pos,
                            diagonal,
                            DirectionSign::of(direction.opposite()),
                        );
                    }
                    scheduled_sky |= scheduled && light_type == LightType::Sky;
                }
            }
        }
        scheduled_sky
    }

    /// Whether the chunk and its eight neighbours are fully lit, initializing
    /// the chunk's lighting first when that has not happened yet.
    pub fn is_chunk_fully_lit<W: WorldRoot>(&self, world: &mut W, chunk_pos: ChunkPos) -> bool {
        let Some(chunk) = world.chunk(chunk_pos) else {
            return false;
        };
        if !chunk.lighting().initialized && !self.init_chunk_lighting(world, chunk_pos) {
            return false;
        }

        (-1..=1).all(|dz| {
            (-1..=1).all(|dx| {
                (dx == 0 && dz == 0)
                    || world
                        .chunk(chunk_pos.offset(dx, dz))
                        .is_some_and(|neighbor| neighbor.lighting().initialized)
            })
        })
    }

    /// Full lighting pass of a chunk whose 3x3 neighbourhood is loaded.
    ///
    /// Schedules and drains block light for every emitting block, then with a
    /// sky rechecks the sky gaps of every column against its neighbours.
    /// Returns false, changing nothing, when a neighbour is missing.
    pub fn init_chunk_lighting<W: WorldRoot>(&self, world: &mut W, chunk_pos: ChunkPos) -> bool {
        let _guard = self.lock();
        let (center_x, center_z) = (chunk_pos.min_block_x() + 8, chunk_pos.min_block_z() + 8);
        if !world.chunks_exist_in_range(
            BlockPos::new(center_x - 16, 0, center_z - 16),
            BlockPos::new(center_x + 16, 0, center_z + 16),
        ) {
            return false;
        }
        let Some(chunk) = world.chunk(chunk_pos) else {
            return false;
        };

        let emitters = emitting_blocks(chunk, chunk_pos);
        for &pos in &emitters {
            self.schedule_lighting_update(world, LightType::Block, pos);
        }
        if !emitters.is_empty() {
            self.process_lighting_updates_for_type(world, LightType::Block);
        }

        if world.has_sky() {
            if let Some(chunk) = world.chunk_mut(chunk_pos) {
                chunk.lighting_mut().height_map.reset_outdated();
            }
            self.recheck_gaps(world, chunk_pos);
        }

        if let Some(chunk) = world.chunk_mut(chunk_pos) {
            chunk.lighting_mut().initialized = true;
            chunk.mark_dirty();
        }
        true
    }

    /// Block change hook.
    ///
    /// Recomputes the sky height of the block's column, relights the part of
    /// the column between the old and the new height, and schedules the
    /// block itself for both light types.
    pub fn update_lighting_for_block<W: WorldRoot>(&self, world: &mut W, pos: BlockPos) {
        if !pos.is_in_height() {
            return;
        }
        let _guard = self.lock();
        let chunk_pos = pos.chunk_pos();
        let (local_x, local_z) = (pos.local_x(), pos.local_z());
        let Some(chunk) = world.chunk_mut(chunk_pos) else {
            return;
        };

        let old_height = chunk.lighting().height_map.get(local_x, local_z).min(WORLD_HEIGHT);
        let mut new_height = (pos.y() + 1).max(old_height);
        while new_height > 0 && chunk.opacity(BlockPos::new(pos.x(), new_height - 1, pos.z())) == 0 {
            new_height -= 1;
        }

        if new_height != old_height {
            let height_map = &mut chunk.lighting_mut().height_map;
            height_map.set(local_x, local_z, new_height);
            if new_height < height_map.min_height() {
                height_map.set_min_height(new_height);
            }
            chunk.mark_dirty();

            if world.has_sky() {
                self.relight_sky_column(world, chunk_pos, local_x, local_z, old_height, new_height);
            }
        }

        self.schedule_lighting_update_all_types(world, pos);
    }

    /// Schedules the sky column between two heights, plus the neighbouring
    /// columns next to sections that are not prepared yet.
    ///
    /// Neighbour columns in a chunk that is not loaded are recorded as an
    /// outgoing boundary flag instead.
    pub fn relight_sky_column<W: WorldRoot>(
        &self,
        world: &mut W,
        chunk_pos: ChunkPos,
        local_x: usize,
        local_z: usize,
        from_height: i32,
        to_height: i32,
    ) {
        let (min_y, max_y) = (
            from_height.min(to_height).clamp(0, WORLD_HEIGHT),
            from_height.max(to_height).clamp(0, WORLD_HEIGHT),
        );
        if min_y >= max_y {
            return;
        }
        let _guard = self.lock();
        let x = chunk_pos.min_block_x() + local_x as i32;
        let z = chunk_pos.min_block_z() + local_z as i32;

        self.schedule_lighting_update_for_column(world, LightType::Sky, x, z, min_y..max_y);

        let Some(chunk) = world.chunk(chunk_pos) else {
            return;
        };
        let (bottom_section, top_section) = (min_y >> 4, (max_y - 1) >> 4);
        let schedule_below = !chunk.is_section_prepared(bottom_section) && min_y > 0;
        let unprepared = (bottom_section..=top_section)
            .filter(|&section_y| !chunk.is_section_prepared(section_y))
            .fold(0u16, |mask, section_y| mask | (1 << section_y));

        if schedule_below {
            self.schedule_lighting_update(world, LightType::Sky, BlockPos::new(x, min_y - 1, z));
        }
        if unprepared == 0 {
            return;
        }

        for direction in Direction::HORIZONTAL {
            let (dx, _, dz) = direction.offset();
            let at_border = ((local_x as i32 + dx) | (local_z as i32 + dz)) & 16 != 0;
            if at_border && !world.chunk_exists(chunk_pos.offset(dx, dz)) {
                if let Some(chunk) = world.chunk_mut(chunk_pos) {
                    chunk.lighting_mut().boundary_flags.set(
                        LightType::Sky,
                        direction,
                        DirectionSign::of_column(direction, local_x, local_z),
                        BoundaryFacing::Out,
                        unprepared,
                    );
                    chunk.mark_dirty();
                }
                continue;
            }

            for section_y in sections(unprepared) {
                let base_y = section_y * SECTION_SIZE;
                self.schedule_lighting_update_for_column(
                    world,
                    LightType::Sky,
                    x + dx,
                    z + dz,
                    base_y..base_y + SECTION_SIZE,
                );
            }
        }
    }

    /// Amortized recheck of a chunk, a few columns per call.
    ///
    /// Walks a cursor over every column of every section. For each visited
    /// prepared section column, corner blocks are scheduled and the first
    /// block that is not a lightless opaque block is scheduled; stale block
    /// light on lightless opaque blocks is extinguished on the way.
    pub fn do_random_relight_checks<W: WorldRoot>(&self, world: &mut W, chunk_pos: ChunkPos) {
        if !self.config().do_random_light_updates {
            return;
        }
        let _guard = self.lock();
        let iterations = self.config().random_checks(world.side());
        let Some(chunk) = world.chunk(chunk_pos) else {
            return;
        };

        let mut cursor = chunk.lighting().random_check_cursor % RANDOM_CHECK_SLOTS;
        let mut scheduled: SmallVec<[BlockPos; 64]> = SmallVec::new();
        let mut extinguished: SmallVec<[BlockPos; 16]> = SmallVec::new();

        for _ in 0..iterations {
            let slot = cursor;
            cursor = (cursor + 1) % RANDOM_CHECK_SLOTS;

            let section_y = i32::from(slot % 16);
            let local_x = i32::from((slot / 16) % 16);
            let local_z = i32::from(slot / 256);
            if !chunk.is_section_prepared(section_y) {
                continue;
            }

            let x = chunk_pos.min_block_x() + local_x;
            let z = chunk_pos.min_block_z() + local_z;
            for local_y in 0..SECTION_SIZE {
                let pos = BlockPos::new(x, section_y * SECTION_SIZE + local_y, z);
                let is_edge = |v: i32| v == 0 || v == SECTION_SIZE - 1;
                if is_edge(local_x) && is_edge(local_y) && is_edge(local_z) {
                    scheduled.push(pos);
                    continue;
                }

                if chunk.opacity(pos) >= MAX_LIGHT && chunk.brightness(pos) == 0 {
                    if chunk.light(LightType::Block, pos) == 0 {
                        continue;
                    }
                    extinguished.push(pos);
                }
                scheduled.push(pos);
                break;
            }
        }

        if let Some(chunk) = world.chunk_mut(chunk_pos) {
            chunk.lighting_mut().random_check_cursor = cursor;
            for &pos in &extinguished {
                chunk.set_light(LightType::Block, pos, 0);
            }
            if !extinguished.is_empty() {
                chunk.mark_dirty();
            }
        }
        for pos in extinguished {
            world.mark_block_for_render_update(pos);
        }
        for pos in scheduled {
            self.schedule_lighting_update_all_types(world, pos);
        }
    }

    /// Schedules border work with loaded neighbours and flags it for missing ones.
    fn reconcile_sky_borders<W: WorldRoot>(&self, world: &mut W, chunk_pos: ChunkPos, top_section: i32) {
        let prepared = match world.chunk(chunk_pos) {
            Some(chunk) => (0..=top_section)
                .filter(|&section_y| chunk.is_section_prepared(section_y))
                .fold(0u16, |mask, section_y| mask | (1 << section_y)),
            None => return,
        };
        let height = (top_section + 1) * SECTION_SIZE;

        for direction in Direction::HORIZONTAL {
            let (dx, _, dz) = direction.offset();
            if !world.chunk_exists(chunk_pos.offset(dx, dz)) {
                if let Some(chunk) = world.chunk_mut(chunk_pos) {
                    for sign in DirectionSign::ALL {
                        chunk.lighting_mut().boundary_flags.set(
                            LightType::Sky,
                            direction,
                            sign,
                            BoundaryFacing::Out,
                            prepared,
                        );
                    }
                    chunk.mark_dirty();
                }
                continue;
            }

            for (x, z) in border_columns(chunk_pos, direction) {
                self.schedule_lighting_update_for_column(world, LightType::Sky, x, z, 0..height);
                self.schedule_lighting_update_for_column(world, LightType::Sky, x + dx, z + dz, 0..height);
            }
        }
    }

    /// Schedules one deferred border check if its chunks are loaded now.
    ///
    /// The check belongs to `chunk_pos` and covers the half of its border
    /// towards `direction` selected by `sign`. It also needs the chunk beside
    /// that half; while either is missing the flag stays set.
    fn replay_boundary<W: WorldRoot>(
        &self,
        world: &mut W,
        light_type: LightType,
        chunk_pos: ChunkPos,
        direction: Direction,
        sign: DirectionSign,
    ) -> bool {
        let flag = match world.chunk(chunk_pos) {
            Some(chunk) => {
                chunk
                    .lighting()
                    .boundary_flags
                    .get(light_type, direction, sign, BoundaryFacing::In)
            }
            None => return false,
        };
        if flag == 0 {
            return false;
        }

        let (dx, _, dz) = direction.offset();
        let s = sign.sign();
        let neighbor_pos = chunk_pos.offset(dx, dz);
        let side_pos = chunk_pos.offset(if dz != 0 { s } else { 0 }, if dx != 0 { s } else { 0 });
        if !world.chunk_exists(neighbor_pos) || !world.chunk_exists(side_pos) {
            return false;
        }

        if let Some(chunk) = world.chunk_mut(chunk_pos) {
            chunk
                .lighting_mut()
                .boundary_flags
                .clear(light_type, direction, sign, BoundaryFacing::In);
            chunk.mark_dirty();
        }
        if let Some(neighbor) = world.chunk_mut(neighbor_pos) {
            neighbor.lighting_mut().boundary_flags.clear(
                light_type,
                direction.opposite(),
                sign,
                BoundaryFacing::Out,
            );
            neighbor.mark_dirty();
        }

        // Start in the corner, move to the far edge for positive directions,
        // then to the requested half along the border.
        let (mut min_x, mut min_z) = (chunk_pos.min_block_x(), chunk_pos.min_block_z());
        if dx > 0 || dz > 0 {
            min_x += dx * 15;
            min_z += dz * 15;
        }
        if sign == DirectionSign::Positive {
            min_x += dz.abs() * 8;
            min_z += dx.abs() * 8;
        }
        let max_x = min_x + 7 * dz.abs();
        let max_z = min_z + 7 * dx.abs();

        for section_y in sections(flag) {
            let min_y = section_y * SECTION_SIZE;
            self.schedule_lighting_update_for_range(
                world,
                light_type,
                BlockPos::new(min_x, min_y, min_z),
                BlockPos::new(max_x, min_y + SECTION_SIZE - 1, max_z),
            );
        }
        true
    }

    /// Schedules sky rechecks for every outdated column whose height differs
    /// from its neighbours', then clears the outdated bits.
    fn recheck_gaps<W: WorldRoot>(&self, world: &mut W, chunk_pos: ChunkPos) {
        let ranges = {
            let mut window = ChunkWindow::new(&*world, chunk_pos);
            let Some(chunk) = window.chunk_from_world_coords(chunk_pos.min_block_x(), chunk_pos.min_block_z())
            else {
                return;
            };
            let mut ranges = Vec::new();
            for (x, z) in columns(chunk_pos) {
                let (local_x, local_z) = ((x & 15) as usize, (z & 15) as usize);
                if !chunk.lighting().height_map.is_outdated(local_x, local_z) {
                    continue;
                }
                ranges.extend(column_gap_ranges(&mut window, chunk, x, z));
            }
            ranges
        };

        for (x, z, y_range) in &ranges {
            self.schedule_lighting_update_for_column(world, LightType::Sky, *x, *z, y_range.clone());
        }

        if let Some(chunk) = world.chunk_mut(chunk_pos) {
            for (x, z) in columns(chunk_pos) {
                let (local_x, local_z) = ((x & 15) as usize, (z & 15) as usize);
                chunk
                    .lighting_mut()
                    .height_map
                    .set_outdated(local_x, local_z, false);
            }
            if !ranges.is_empty() {
                chunk.mark_dirty();
            }
        }
    }
}

/// Gap ranges of one column: against the lowest neighbouring chunk, and each
/// neighbouring column against this column's height.
fn column_gap_ranges<'w, D: ChunkDirectory + ?Sized>(
    window: &mut ChunkWindow<'w, D>,
    chunk: &'w D::Chunk,
    x: i32,
    z: i32,
) -> SmallVec<[ColumnRange; 5]> {
    let mut ranges = SmallVec::new();

    let lowest_neighbor = Direction::HORIZONTAL
        .iter()
        .filter_map(|direction| {
            let (dx, _, dz) = direction.offset();
            window.chunk_from_world_coords(x + dx, z + dz)
        })
        .map(|neighbor| neighbor.lighting().height_map.min_height().min(WORLD_HEIGHT))
        .min()
        .unwrap_or(WORLD_HEIGHT);
    let height = column_height(chunk, x, z);

    ranges.extend(gap_range(window, x, z, lowest_neighbor));
    for direction in Direction::HORIZONTAL {
        let (dx, _, dz) = direction.offset();
        ranges.extend(gap_range(window, x + dx, z + dz, height));
    }
    ranges
}

/// The y range between column `(x, z)` and `reference`, if the column's
/// surroundings are loaded.
fn gap_range<D: ChunkDirectory + ?Sized>(
    window: &mut ChunkWindow<'_, D>,
    x: i32,
    z: i32,
    reference: i32,
) -> Option<ColumnRange> {
    let height = column_height(window.chunk_from_world_coords(x, z)?, x, z);
    let y_range = match height.cmp(&reference) {
        Ordering::Greater => reference..height + 1,
        Ordering::Less => height..reference + 1,
        Ordering::Equal => return None,
    };
    window.is_loaded(x, z, 16).then_some((x, z, y_range))
}

fn column_height<C: ChunkLightStore>(chunk: &C, x: i32, z: i32) -> i32 {
    chunk
        .lighting()
        .height_map
        .get((x & 15) as usize, (z & 15) as usize)
        .min(WORLD_HEIGHT)
}

fn merge_flags<W: WorldRoot>(
    world: &mut W,
    light_type: LightType,
    destination: ChunkPos,
    source: ChunkPos,
    direction: Direction,
    sign: DirectionSign,
) {
    let incoming = match world.chunk(source) {
        Some(chunk) => chunk.lighting().boundary_flags.get(
            light_type,
            direction.opposite(),
            sign,
            BoundaryFacing::Out,
        ),
        None => return,
    };
    if incoming == 0 {
        return;
    }
    if let Some(chunk) = world.chunk_mut(destination) {
        chunk
            .lighting_mut()
            .boundary_flags
            .set(light_type, direction, sign, BoundaryFacing::In, incoming);
    }
}

/// Scans each column down from one block above the top prepared section
/// while the block below is fully transparent.
fn rebuild_height_map<C: ChunkLightStore>(chunk: &mut C) {
    let chunk_pos = chunk.chunk_pos();
    let start = chunk
        .top_prepared_section()
        .map_or(0, |section_y| (section_y + 1) * SECTION_SIZE);

    let mut min_height = UNKNOWN_HEIGHT;
    for (x, z) in columns(chunk_pos) {
        let mut height = start;
        while height > 0 && chunk.opacity(BlockPos::new(x, height - 1, z)) == 0 {
            height -= 1;
        }
        chunk
            .lighting_mut()
            .height_map
            .set((x & 15) as usize, (z & 15) as usize, height);
        min_height = min_height.min(height);
    }
    chunk.lighting_mut().height_map.set_min_height(min_height);
}

/// Fills sky light top-down through every column: full light through open
/// air, then attenuated by at least one per block. Returns the lit blocks.
fn fill_sky_columns<C: ChunkLightStore>(chunk: &mut C) -> Vec<BlockPos> {
    let Some(top_section) = chunk.top_prepared_section() else {
        return Vec::new();
    };
    let mut lit = Vec::new();
    for (x, z) in columns(chunk.chunk_pos()) {
        let mut light = i32::from(MAX_LIGHT);
        let mut y = top_section * SECTION_SIZE + SECTION_SIZE - 1;
        while y >= 0 && light > 0 {
            let pos = BlockPos::new(x, y, z);
            let mut opacity = i32::from(chunk.opacity(pos));
            if opacity == 0 && light != i32::from(MAX_LIGHT) {
                opacity = 1;
            }
            light -= opacity;
            if light > 0 && chunk.is_section_prepared(pos.section_y()) {
                chunk.set_light(LightType::Sky, pos, light as u8);
                lit.push(pos);
            }
            y -= 1;
        }
    }
    lit
}

fn emitting_blocks<C: ChunkLightStore>(chunk: &C, chunk_pos: ChunkPos) -> Vec<BlockPos> {
    let mut emitters = Vec::new();
    for section_y in (0..SECTION_COUNT).filter(|&section_y| chunk.is_section_prepared(section_y)) {
        let base_y = section_y * SECTION_SIZE;
        for y in base_y..base_y + SECTION_SIZE {
            for (x, z) in columns(chunk_pos) {
                let pos = BlockPos::new(x, y, z);
                if chunk.brightness(pos) > 0 {
                    emitters.push(pos);
                }
            }
        }
    }
    emitters
}

/// World x/z of every column of a chunk.
fn columns(chunk_pos: ChunkPos) -> impl Iterator<Item = (i32, i32)> {
    let (base_x, base_z) = (chunk_pos.min_block_x(), chunk_pos.min_block_z());
    (0..SECTION_SIZE).flat_map(move |z| (0..SECTION_SIZE).map(move |x| (base_x + x, base_z + z)))
}

/// World x/z of the 16 columns of a chunk along one horizontal border.
fn border_columns(chunk_pos: ChunkPos, direction: Direction) -> impl Iterator<Item = (i32, i32)> {
    let (base_x, base_z) = (chunk_pos.min_block_x(), chunk_pos.min_block_z());
    let far = SECTION_SIZE - 1;
    (0..SECTION_SIZE).map(move |i| match direction {
        Direction::North => (base_x + i, base_z),
        Direction::South => (base_x + i, base_z + far),
        Direction::West => (base_x, base_z + i),
        Direction::East | Direction::Up | Direction::Down => (base_x + far, base_z + i),
    })
}

/// Section indices set in a mask, lowest first.
fn sections(mask: u16) -> impl Iterator<Item = i32> {
    (0..SECTION_COUNT).filter(move |&section_y| mask & (1 << section_y) != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::LightingConfig,
        memory_world::{BlockProps, MemoryWorld},
    };

    #[test]
    fn test_border_columns() {
        let pos = ChunkPos::new(1, -1);
        let east: Vec<_> = border_columns(pos, Direction::East).collect();
        assert_eq!(east.len(), 16);
        assert!(east.iter().all(|&(x, _)| x == 31));
        assert_eq!(east[0].1, -16);
        let north: Vec<_> = border_columns(pos, Direction::North).collect();
        assert!(north.iter().all(|&(_, z)| z == -16));
    }

    #[test]
    fn test_sections_of_mask() {
        assert_eq!(sections(0b1010_0000_0000_0001).collect::<Vec<_>>(), vec![0, 13, 15]);
        assert_eq!(sections(0).count(), 0);
    }

    #[test]
    fn test_height_map_rebuild() {
        let mut world = MemoryWorld::new(true);
        let chunk = world.insert_empty_chunk(ChunkPos::new(0, 0), 0..3);
        chunk.set_block(BlockPos::new(4, 20, 5), BlockProps::new(1, 0));
        chunk.set_block(BlockPos::new(0, 0, 0), BlockProps::SOLID);

        rebuild_height_map(chunk);
        let height_map = &chunk.lighting().height_map;
        assert_eq!(height_map.get(4, 5), 21);
        assert_eq!(height_map.get(0, 0), 1);
        assert_eq!(height_map.get(9, 9), 0);
        assert_eq!(height_map.min_height(), 0);
    }

    #[test]
    fn test_chunk_init_fills_sky() {
        let mut world = MemoryWorld::new(true);
        let chunk = world.insert_empty_chunk(ChunkPos::new(0, 0), 0..2);
        chunk.set_block(BlockPos::new(3, 10, 3), BlockProps::new(4, 0));
        let engine = LightEngine::new(LightingConfig::default());

        engine.handle_chunk_init(&mut world, ChunkPos::new(0, 0));
        assert_eq!(world.stored_light(LightType::Sky, BlockPos::new(3, 11, 3)), Some(15));
        assert_eq!(world.stored_light(LightType::Sky, BlockPos::new(3, 10, 3)), Some(11));
        assert_eq!(world.stored_light(LightType::Sky, BlockPos::new(3, 9, 3)), Some(10));
        assert_eq!(world.stored_light(LightType::Sky, BlockPos::new(8, 0, 8)), Some(15));
        assert!(world.render_updates().contains(&BlockPos::new(3, 9, 3)));
    }

    #[test]
    fn test_relight_column_flags_missing_neighbor() {
        let mut world = MemoryWorld::new(true);
        world.insert_empty_chunk(ChunkPos::new(0, 0), 0..1);
        let engine = LightEngine::new(LightingConfig::default());

        engine.relight_sky_column(&mut world, ChunkPos::new(0, 0), 15, 3, 40, 10);
        let flags = world
            .chunk(ChunkPos::new(0, 0))
            .map(|chunk| chunk.lighting().boundary_flags)
            .unwrap_or_default();
        assert_eq!(
            flags.get(LightType::Sky, Direction::East, DirectionSign::Negative, BoundaryFacing::Out),
            0b0110
        );
        assert_eq!(
            flags.get(LightType::Sky, Direction::East, DirectionSign::Positive, BoundaryFacing::Out),
            0
        );
        // The 30 column blocks plus two sections of each in-chunk neighbour column.
        assert_eq!(engine.pending_updates(LightType::Sky), 30 + 3 * 32);
    }
}
