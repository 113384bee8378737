//! The light engine: scheduling, draining and the bucketed flood fill.

use std::{
    cell::{Cell, RefCell},
    ops::Range,
    thread::{self, ThreadId},
};

use parking_lot::ReentrantMutexGuard;

use steel_utils::{BlockPos, WORLD_HEIGHT};

use crate::{
    access::{ChunkLightStore, Side, WorldRoot},
    config::LightingConfig,
    light_type::{LightType, MAX_LIGHT},
};

use super::{
    direction::Direction,
    guard::ConcurrencyGuard,
    light_queue::{SegmentPool, SegmentedQueue},
    packed_pos::PackedPos,
};

const BUCKETS: usize = MAX_LIGHT as usize + 1;

/// Incremental light engine for one world.
///
/// Positions are scheduled per light type and processed in batches. A drain
/// first compares each scheduled position's stored value against the value
/// its surroundings imply, then sweeps light levels from 15 down to 0,
/// extinguishing light that lost its source and spreading light that gained
/// one. Every position is visited at most once per level, so a drain always
/// terminates.
///
/// The engine is owned by the thread that created it. Calls from other
/// threads are serialized and reported (see [`ConcurrencyGuard`]).
pub struct LightEngine {
    config: LightingConfig,
    state: ConcurrencyGuard<EngineState>,
}

pub(super) struct EngineState {
    scheduled: [RefCell<SegmentedQueue>; 2],
    propagator: RefCell<Propagator>,
    updating: Cell<bool>,
}

/// Resets the re-entrancy flag when a drain ends, even by unwinding.
struct UpdatingScope<'a>(&'a Cell<bool>);

impl<'a> UpdatingScope<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for UpdatingScope<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl LightEngine {
    /// Creates an engine owned by the calling thread.
    #[must_use]
    pub fn new(config: LightingConfig) -> Self {
        let pool = SegmentPool::new();
        let state = EngineState {
            scheduled: [RefCell::new(pool.queue()), RefCell::new(pool.queue())],
            propagator: RefCell::new(Propagator::new(&pool)),
            updating: Cell::new(false),
        };
        let report = config.enable_illegal_thread_access_warnings;
        Self {
            config,
            state: ConcurrencyGuard::new(state, report),
        }
    }

    /// The configuration the engine was built with.
    #[must_use]
    pub fn config(&self) -> &LightingConfig {
        &self.config
    }

    /// The thread that owns the engine.
    #[must_use]
    pub fn owner(&self) -> ThreadId {
        self.state.owner()
    }

    /// Whether a call from a foreign thread has been reported.
    #[must_use]
    pub fn illegal_access_reported(&self) -> bool {
        self.state.violation_reported()
    }

    /// Number of positions waiting for the next drain of `light_type`.
    #[must_use]
    pub fn pending_updates(&self, light_type: LightType) -> usize {
        let state = self.state.lock();
        state.scheduled[light_type.index()].borrow().len()
    }

    /// Schedules one position for a recheck.
    pub fn schedule_lighting_update<W: WorldRoot>(
        &self,
        world: &mut W,
        light_type: LightType,
        pos: BlockPos,
    ) {
        if !Self::is_active(world, light_type) || !pos.is_in_height() {
            return;
        }
        let state = self.state.lock();
        self.schedule_locked(&state, world, light_type, PackedPos::from_block(pos));
    }

    /// Schedules one position for a recheck of both light types.
    pub fn schedule_lighting_update_all_types<W: WorldRoot>(&self, world: &mut W, pos: BlockPos) {
        for light_type in LightType::ALL {
            self.schedule_lighting_update(world, light_type, pos);
        }
    }

    /// Schedules every position of the inclusive box `min..=max`.
    pub fn schedule_lighting_update_for_range<W: WorldRoot>(
        &self,
        world: &mut W,
        light_type: LightType,
        min: BlockPos,
        max: BlockPos,
    ) {
        if !Self::is_active(world, light_type) {
            return;
        }
        let (min_y, max_y) = (min.y().max(0), max.y().min(WORLD_HEIGHT - 1));
        let state = self.state.lock();
        for y in min_y..=max_y {
            for z in min.z()..=max.z() {
                for x in min.x()..=max.x() {
                    self.schedule_locked(&state, world, light_type, PackedPos::new(x, y, z));
                }
            }
        }
    }

    /// Schedules the positions of column `(x, z)` whose y lies in `y_range`.
    pub fn schedule_lighting_update_for_column<W: WorldRoot>(
        &self,
        world: &mut W,
        light_type: LightType,
        x: i32,
        z: i32,
        y_range: Range<i32>,
    ) {
        if !Self::is_active(world, light_type) {
            return;
        }
        let state = self.state.lock();
        for y in y_range.start.max(0)..y_range.end.min(WORLD_HEIGHT) {
            self.schedule_locked(&state, world, light_type, PackedPos::new(x, y, z));
        }
    }

    /// Drains every scheduled update of `light_type`.
    ///
    /// On a client only the owning thread drains; calls from other threads
    /// leave the queue for the next tick.
    pub fn process_lighting_updates_for_type<W: WorldRoot>(
        &self,
        world: &mut W,
        light_type: LightType,
    ) {
        if !self.may_drain(world) {
            return;
        }
        let state = self.state.lock();
        self.process_locked(&state, world, light_type);
    }

    /// Drains every scheduled update of both light types.
    pub fn process_lighting_updates_for_all_types<W: WorldRoot>(&self, world: &mut W) {
        if !self.may_drain(world) {
            return;
        }
        let state = self.state.lock();
        for light_type in LightType::ALL {
            self.process_locked(&state, world, light_type);
        }
    }

    /// Reads a light value after draining every pending update of its type.
    pub fn get_current_light_value<W: WorldRoot>(
        &self,
        world: &mut W,
        light_type: LightType,
        pos: BlockPos,
    ) -> u8 {
        if light_type == LightType::Sky && !world.has_sky() {
            return 0;
        }
        if self.may_drain(world) {
            let state = self.state.lock();
            self.process_locked(&state, world, light_type);
        }
        if pos.y() >= WORLD_HEIGHT {
            return light_type.default_value();
        }
        if pos.y() < 0 {
            return 0;
        }
        world
            .chunk(pos.chunk_pos())
            .map_or(light_type.default_value(), |chunk| chunk.light(light_type, pos))
    }

    /// Holds the engine lock across a multi-step operation.
    pub(super) fn lock(&self) -> ReentrantMutexGuard<'_, EngineState> {
        self.state.lock()
    }

    fn may_drain<W: WorldRoot>(&self, world: &W) -> bool {
        matches!(world.side(), Side::Server) || thread::current().id() == self.owner()
    }

    fn is_active<W: WorldRoot>(world: &W, light_type: LightType) -> bool {
        light_type == LightType::Block || world.has_sky()
    }

    fn schedule_locked<W: WorldRoot>(
        &self,
        state: &EngineState,
        world: &mut W,
        light_type: LightType,
        pos: PackedPos,
    ) {
        let max = self.config.max_scheduled_updates(world.side());
        let full = state.scheduled[light_type.index()].borrow().len() >= max;
        if full {
            log::debug!("{light_type} light queue reached {max} entries, draining early");
            self.process_locked(state, world, light_type);
        }
        state.scheduled[light_type.index()]
            .borrow_mut()
            .add(pos.raw());
    }

    fn process_locked<W: WorldRoot>(&self, state: &EngineState, world: &mut W, light_type: LightType) {
        // Light writes can call back into the engine through render hooks.
        if state.updating.get() {
            return;
        }
        let scheduled = state.scheduled[light_type.index()].borrow_mut().take();
        if scheduled.is_empty() {
            return;
        }

        let _updating = UpdatingScope::enter(&state.updating);
        let _span = tracing::trace_span!("light_drain", light_type = %light_type).entered();
        log::trace!("Draining {} scheduled {light_type} light updates", scheduled.len());
        state
            .propagator
            .borrow_mut()
            .run(world, light_type, scheduled);
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Neighbor {
    pos: BlockPos,
    loaded: bool,
    light: u8,
}

#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    pos: BlockPos,
    packed: PackedPos,
    loaded: bool,
}

/// Queues and scratch state of the flood fill, reused across drains.
struct Propagator {
    initial_brightening: SegmentedQueue,
    initial_darkening: SegmentedQueue,
    brightening: [SegmentedQueue; BUCKETS],
    darkening: [SegmentedQueue; BUCKETS],
    cursor: Cursor,
    neighbors: [Neighbor; 6],
    neighbors_loaded: bool,
}

impl Propagator {
    fn new(pool: &SegmentPool) -> Self {
        Self {
            initial_brightening: pool.queue(),
            initial_darkening: pool.queue(),
            brightening: std::array::from_fn(|_| pool.queue()),
            darkening: std::array::from_fn(|_| pool.queue()),
            cursor: Cursor::default(),
            neighbors: [Neighbor::default(); 6],
            neighbors_loaded: false,
        }
    }

    fn run<W: WorldRoot>(&mut self, world: &mut W, light_type: LightType, scheduled: SegmentedQueue) {
        for raw in scheduled {
            self.move_cursor(world, raw);
            if !self.cursor.loaded {
                continue;
            }
            let current = self.cursor_light(world, light_type);
            let updated = self.cursor_updated_light(world, light_type);
            if updated > current {
                self.initial_brightening
                    .add(self.cursor.packed.with_light(updated).raw());
            } else if updated < current {
                self.initial_darkening.add(self.cursor.packed.raw());
            }
        }

        for raw in self.initial_brightening.take() {
            self.move_cursor(world, raw);
            let target = PackedPos::from_raw(raw).light();
            if self.cursor.loaded && target > self.cursor_light(world, light_type) {
                self.brighten(world, light_type, self.cursor.pos, target);
            }
        }

        for raw in self.initial_darkening.take() {
            self.move_cursor(world, raw);
            if !self.cursor.loaded {
                continue;
            }
            let current = self.cursor_light(world, light_type);
            if current != 0 {
                self.darken(world, light_type, self.cursor.pos, current);
            }
        }

        for level in (0..=MAX_LIGHT).rev() {
            self.sweep_darkening(world, light_type, level);
            self.sweep_brightening(world, light_type, level);
        }
    }

    fn sweep_darkening<W: WorldRoot>(&mut self, world: &mut W, light_type: LightType, level: u8) {
        for raw in self.darkening[usize::from(level)].take() {
            self.move_cursor(world, raw);
            if self.cursor_light(world, light_type) >= level {
                continue;
            }

            let (emitted, opacity) = self.cursor_emission_and_opacity(world, light_type);
            if self.updated_light(world, light_type, emitted, opacity) >= level {
                // Something else still sustains this level.
                self.brighten(world, light_type, self.cursor.pos, level);
                continue;
            }

            let mut floor = emitted;
            self.load_neighbors(world, light_type);
            for neighbor in self.neighbors {
                if !neighbor.loaded || neighbor.light == 0 {
                    continue;
                }
                let neighbor_opacity = block_opacity(world, neighbor.pos);
                if level.saturating_sub(neighbor_opacity) >= neighbor.light {
                    self.darken(world, light_type, neighbor.pos, neighbor.light);
                } else {
                    floor = floor.max(neighbor.light.saturating_sub(opacity));
                }
            }

            self.brighten(world, light_type, self.cursor.pos, floor);
        }
    }

    fn sweep_brightening<W: WorldRoot>(&mut self, world: &mut W, light_type: LightType, level: u8) {
        for raw in self.brightening[usize::from(level)].take() {
            self.move_cursor(world, raw);
            if self.cursor_light(world, light_type) != level {
                continue;
            }

            world.mark_block_for_render_update(self.cursor.pos);

            if level > 1 {
                self.spread_from_cursor(world, light_type, level);
            }
        }
    }

    fn spread_from_cursor<W: WorldRoot>(&mut self, world: &mut W, light_type: LightType, level: u8) {
        self.load_neighbors(world, light_type);
        for neighbor in self.neighbors {
            if !neighbor.loaded {
                continue;
            }
            let candidate = level.saturating_sub(block_opacity(world, neighbor.pos));
            if candidate > neighbor.light {
                self.brighten(world, light_type, neighbor.pos, candidate);
            }
        }
    }

    fn move_cursor<W: WorldRoot>(&mut self, world: &W, raw: u64) {
        let packed = PackedPos::from_raw(raw).without_light();
        let pos = packed.block_pos();
        self.cursor = Cursor {
            pos,
            packed,
            loaded: world.chunk_exists(pos.chunk_pos()),
        };
        self.neighbors_loaded = false;
    }

    fn load_neighbors<W: WorldRoot>(&mut self, world: &W, light_type: LightType) {
        if self.neighbors_loaded {
            return;
        }
        for (slot, direction) in self.neighbors.iter_mut().zip(Direction::ALL) {
            let pos = direction.relative(self.cursor.pos);
            let light = stored_light(world, light_type, pos);
            *slot = Neighbor {
                pos,
                loaded: light.is_some(),
                light: light.unwrap_or(0),
            };
        }
        self.neighbors_loaded = true;
    }

    fn cursor_light<W: WorldRoot>(&self, world: &W, light_type: LightType) -> u8 {
        if self.cursor.loaded {
            stored_light(world, light_type, self.cursor.pos).unwrap_or(0)
        } else {
            light_type.default_value()
        }
    }

    fn cursor_emission_and_opacity<W: WorldRoot>(&self, world: &W, light_type: LightType) -> (u8, u8) {
        let emitted = emitted_light(world, light_type, self.cursor.pos);
        let opacity = if emitted >= MAX_LIGHT - 1 {
            1
        } else {
            block_opacity(world, self.cursor.pos)
        };
        (emitted, opacity)
    }

    fn cursor_updated_light<W: WorldRoot>(&mut self, world: &W, light_type: LightType) -> u8 {
        let (emitted, opacity) = self.cursor_emission_and_opacity(world, light_type);
        self.updated_light(world, light_type, emitted, opacity)
    }

    /// The level the cursor should have: its own emission or the best neighbour minus its opacity.
    fn updated_light<W: WorldRoot>(
        &mut self,
        world: &W,
        light_type: LightType,
        emitted: u8,
        opacity: u8,
    ) -> u8 {
        if emitted >= MAX_LIGHT - opacity {
            return emitted;
        }
        self.load_neighbors(world, light_type);
        self.neighbors
            .iter()
            .filter(|neighbor| neighbor.loaded)
            .map(|neighbor| neighbor.light.saturating_sub(opacity))
            .fold(emitted, u8::max)
    }

    fn brighten<W: WorldRoot>(&mut self, world: &mut W, light_type: LightType, pos: BlockPos, level: u8) {
        self.brightening[usize::from(level)].add(PackedPos::from_block(pos).raw());
        write_light(world, light_type, pos, level);
    }

    fn darken<W: WorldRoot>(&mut self, world: &mut W, light_type: LightType, pos: BlockPos, old: u8) {
        self.darkening[usize::from(old)].add(PackedPos::from_block(pos).raw());
        write_light(world, light_type, pos, 0);
    }
}

/// Stored light at `pos`, `None` when outside the world or in an unloaded chunk.
pub(crate) fn stored_light<W: WorldRoot>(world: &W, light_type: LightType, pos: BlockPos) -> Option<u8> {
    if !pos.is_in_height() {
        return None;
    }
    world
        .chunk(pos.chunk_pos())
        .map(|chunk| chunk.light(light_type, pos))
}

fn write_light<W: WorldRoot>(world: &mut W, light_type: LightType, pos: BlockPos, level: u8) {
    if let Some(chunk) = world.chunk_mut(pos.chunk_pos()) {
        chunk.set_light(light_type, pos, level);
        chunk.mark_dirty();
    }
}

/// Opacity used while propagating, clamped to 1..=15.
fn block_opacity<W: WorldRoot>(world: &W, pos: BlockPos) -> u8 {
    world
        .chunk(pos.chunk_pos())
        .map_or(MAX_LIGHT, |chunk| chunk.opacity(pos))
        .clamp(1, MAX_LIGHT)
}

fn emitted_light<W: WorldRoot>(world: &W, light_type: LightType, pos: BlockPos) -> u8 {
    let Some(chunk) = world.chunk(pos.chunk_pos()) else {
        return 0;
    };
    match light_type {
        LightType::Block => chunk.brightness(pos).min(MAX_LIGHT),
        LightType::Sky if chunk.can_see_sky(pos) => MAX_LIGHT,
        LightType::Sky => 0,
    }
}

#[cfg(test)]
mod tests {
    use steel_utils::ChunkPos;

    use super::*;
    use crate::memory_world::{BlockProps, MemoryWorld};

    fn dark_world() -> MemoryWorld {
        let mut world = MemoryWorld::new(false);
        world.insert_empty_chunk(ChunkPos::new(0, 0), 0..2);
        world
    }

    #[test]
    fn test_single_emitter_spreads_in_air() {
        let mut world = dark_world();
        let engine = LightEngine::new(LightingConfig::default());
        let lamp = BlockPos::new(8, 10, 8);
        world.set_block(lamp, BlockProps::new(0, 15));

        engine.schedule_lighting_update(&mut world, LightType::Block, lamp);
        assert_eq!(engine.pending_updates(LightType::Block), 1);

        assert_eq!(engine.get_current_light_value(&mut world, LightType::Block, lamp), 15);
        assert_eq!(engine.pending_updates(LightType::Block), 0);
        assert_eq!(
            world.stored_light(LightType::Block, BlockPos::new(8, 10, 11)),
            Some(12)
        );
        assert_eq!(
            world.stored_light(LightType::Block, BlockPos::new(10, 12, 8)),
            Some(11)
        );
        assert!(world.render_updates().contains(&lamp));
    }

    #[test]
    fn test_sky_is_ignored_without_sky() {
        let mut world = dark_world();
        let engine = LightEngine::new(LightingConfig::default());
        engine.schedule_lighting_update(&mut world, LightType::Sky, BlockPos::new(1, 1, 1));
        assert_eq!(engine.pending_updates(LightType::Sky), 0);
        assert_eq!(
            engine.get_current_light_value(&mut world, LightType::Sky, BlockPos::new(1, 1, 1)),
            0
        );
    }

    #[test]
    fn test_out_of_height_positions_are_not_scheduled() {
        let mut world = dark_world();
        let engine = LightEngine::new(LightingConfig::default());
        engine.schedule_lighting_update(&mut world, LightType::Block, BlockPos::new(0, -1, 0));
        engine.schedule_lighting_update(&mut world, LightType::Block, BlockPos::new(0, 256, 0));
        engine.schedule_lighting_update_for_column(&mut world, LightType::Block, 0, 0, -5..3);
        assert_eq!(engine.pending_updates(LightType::Block), 3);
    }

    #[test]
    fn test_unloaded_positions_are_skipped() {
        let mut world = dark_world();
        let engine = LightEngine::new(LightingConfig::default());
        engine.schedule_lighting_update(&mut world, LightType::Block, BlockPos::new(100, 5, 100));
        engine.process_lighting_updates_for_all_types(&mut world);
        assert!(world.render_updates().is_empty());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_foreign_thread_access_is_reported() {
        let engine = LightEngine::new(LightingConfig::default());
        let held = engine.lock();

        thread::scope(|scope| {
            let worker = scope.spawn(|| engine.pending_updates(LightType::Block));
            while !engine.illegal_access_reported() {
                thread::yield_now();
            }
            drop(held);
            assert_eq!(worker.join().unwrap(), 0);
        });
        assert!(engine.illegal_access_reported());
    }

    #[test]
    fn test_light_stops_at_unloaded_chunk() {
        let mut world = dark_world();
        let engine = LightEngine::new(LightingConfig::default());
        let lamp = BlockPos::new(15, 4, 4);
        world.set_block(lamp, BlockProps::new(0, 15));
        engine.schedule_lighting_update(&mut world, LightType::Block, lamp);
        engine.process_lighting_updates_for_type(&mut world, LightType::Block);
        assert_eq!(world.stored_light(LightType::Block, lamp), Some(15));
        assert_eq!(world.stored_light(LightType::Block, BlockPos::new(16, 4, 4)), None);
        assert_eq!(world.stored_light(LightType::Block, BlockPos::new(14, 4, 4)), Some(14));
    }
}
