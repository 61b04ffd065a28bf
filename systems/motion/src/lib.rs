#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Actor roster and collision-aware motion.
//!
//! Every actor is a single record tagged with an [`ActorKind`]. Motion is
//! resolved one axis at a time, horizontal first: the footprint moves, is
//! clamped to a bounded world, and the step is reverted when the shrunken
//! footprint overlaps impassable terrain or a stationary obstacle visible in
//! the viewport. Screen placement is derived from the offset most recently
//! published by the viewport through [`Actors::view_listener`].

use std::{cell::Cell, rc::Rc};

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tile_explorer_core::{
    ActorId, ActorKind, Direction, MobSpawn, PixelPoint, PixelRect, TileCoord, TileSize,
    ViewOffset,
};
use tile_explorer_world::{CellSource, GridError, TileSpan, Viewport, WorldGrid};
use tracing::debug;

/// Tunables for actor motion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Pixels travelled per update for each held movement key.
    pub player_speed: i32,
    /// Collision shrink ratio applied while the player moves.
    pub player_ratio: f32,
    /// Collision shrink ratio applied while mobs move.
    pub mob_ratio: f32,
    /// Collision shrink ratio recorded on stationary obstacles.
    pub obstacle_ratio: f32,
}

impl MotionConfig {
    /// Shrink ratio associated with an actor kind.
    #[must_use]
    pub const fn ratio_for(&self, kind: ActorKind) -> f32 {
        match kind {
            ActorKind::Player => self.player_ratio,
            ActorKind::WanderingMob => self.mob_ratio,
            ActorKind::StationaryObstacle => self.obstacle_ratio,
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            player_speed: 5,
            player_ratio: 0.8,
            mob_ratio: 0.6,
            obstacle_ratio: 0.8,
        }
    }
}

/// Single participant of the simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct Actor {
    id: ActorId,
    kind: ActorKind,
    location: PixelPoint,
    width: i32,
    height: i32,
    held: [bool; 4],
    heading: Option<Direction>,
    speed: i32,
    collision_ratio: f32,
}

impl Actor {
    /// Identifier assigned at spawn.
    #[must_use]
    pub const fn id(&self) -> ActorId {
        self.id
    }

    /// Behaviour variant of the actor.
    #[must_use]
    pub const fn kind(&self) -> ActorKind {
        self.kind
    }

    /// Upper-left corner of the footprint in world pixels.
    #[must_use]
    pub const fn location(&self) -> PixelPoint {
        self.location
    }

    /// Full footprint in world pixels.
    #[must_use]
    pub const fn footprint(&self) -> PixelRect {
        PixelRect::at(self.location, self.width, self.height)
    }

    /// Current wander direction of a mob.
    #[must_use]
    pub const fn heading(&self) -> Option<Direction> {
        self.heading
    }

    /// Pixels travelled per update along each active axis.
    #[must_use]
    pub const fn speed(&self) -> i32 {
        self.speed
    }

    /// Ratio applied to footprints when this actor tests for collisions.
    #[must_use]
    pub const fn collision_ratio(&self) -> f32 {
        self.collision_ratio
    }

    /// Velocity the actor will attempt on the next update.
    #[must_use]
    pub fn velocity(&self) -> (i32, i32) {
        match self.kind {
            ActorKind::Player => Direction::ALL
                .into_iter()
                .filter(|direction| self.held[key_slot(*direction)])
                .fold((0, 0), |(vx, vy), direction| {
                    let (dx, dy) = direction.delta();
                    (vx + dx * self.speed, vy + dy * self.speed)
                }),
            ActorKind::WanderingMob => self.heading.map_or((0, 0), |direction| {
                let (dx, dy) = direction.delta();
                (dx * self.speed, dy * self.speed)
            }),
            ActorKind::StationaryObstacle => (0, 0),
        }
    }
}

const fn key_slot(direction: Direction) -> usize {
    match direction {
        Direction::North => 0,
        Direction::East => 1,
        Direction::South => 2,
        Direction::West => 3,
    }
}

/// Summary of a single motion update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MotionReport {
    /// Whether the player attempted to move during the update.
    pub player_moving: bool,
    /// Number of axis steps reverted because of a collision.
    pub blocked_steps: usize,
}

/// Result of a directional probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Impassable terrain was pushed one tile away and the player followed.
    Pushed {
        /// Tile the terrain was pushed from.
        from: TileCoord,
        /// Tile the terrain now occupies.
        to: TileCoord,
    },
    /// Nothing moved: the terrain behind the probed wall is impassable, or
    /// the player would land on rock or on the pushed wall.
    Jammed {
        /// Probed wall.
        wall: TileCoord,
    },
    /// Nothing impassable was probed, so an obstacle was dropped instead.
    ObstacleSpawned(ActorId),
    /// There is no player to probe from.
    NoPlayer,
}

/// Owns every actor and resolves their motion.
#[derive(Debug)]
pub struct Actors {
    roster: Vec<Actor>,
    next_id: u32,
    player: Option<ActorId>,
    rng: ChaCha8Rng,
    config: MotionConfig,
    offset: Rc<Cell<ViewOffset>>,
}

impl Actors {
    /// Creates an empty roster whose wander choices derive from `seed`.
    #[must_use]
    pub fn new(config: MotionConfig, seed: u64) -> Self {
        Self {
            roster: Vec::new(),
            next_id: 0,
            player: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
            offset: Rc::new(Cell::new(ViewOffset::default())),
        }
    }

    /// Motion tunables in effect.
    #[must_use]
    pub const fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Creates a viewport listener that keeps screen footprints current.
    pub fn view_listener(&self) -> impl FnMut(ViewOffset) + 'static {
        let shared = Rc::clone(&self.offset);
        move |offset| shared.set(offset)
    }

    /// Offset most recently published by the viewport.
    #[must_use]
    pub fn view_offset(&self) -> ViewOffset {
        self.offset.get()
    }

    /// Spawns the player at `origin`, replacing any previous player.
    pub fn spawn_player(&mut self, origin: PixelPoint, viewport: &Viewport) -> ActorId {
        if let Some(previous) = self.player.take() {
            let _ = self.remove(previous);
        }
        self.offset.set(viewport.offset());
        let id = self.insert(ActorKind::Player, origin, 0, None, viewport);
        self.player = Some(id);
        id
    }

    /// Spawns a wandering mob unless its footprint would start inside
    /// impassable terrain.
    pub fn spawn_mob<S: CellSource>(
        &mut self,
        spawn: MobSpawn,
        grid: &mut WorldGrid<S>,
        viewport: &Viewport,
    ) -> Option<ActorId> {
        let tile_size = viewport.tile_size();
        let footprint = clamp_to_world(
            PixelRect::at(
                spawn.location,
                tile_size.width() as i32,
                tile_size.height() as i32,
            ),
            viewport.world_rect(),
        );
        let clear = covered_tiles(footprint, tile_size)
            .iter()
            .all(|coord| matches!(grid.cell(coord), Ok(cell) if cell.is_passable()));
        if !clear {
            return None;
        }

        let heading = Direction::ALL.choose(&mut self.rng).copied();
        let id = self.insert(
            ActorKind::WanderingMob,
            footprint.origin(),
            spawn.speed,
            heading,
            viewport,
        );
        debug!(id = id.get(), x = footprint.x, y = footprint.y, "mob spawned");
        Some(id)
    }

    /// Spawns a stationary obstacle at `origin`.
    pub fn spawn_obstacle(&mut self, origin: PixelPoint, viewport: &Viewport) -> ActorId {
        let id = self.insert(ActorKind::StationaryObstacle, origin, 0, None, viewport);
        debug!(id = id.get(), x = origin.x, y = origin.y, "obstacle spawned");
        id
    }

    /// Removes an actor from the roster.
    pub fn remove(&mut self, id: ActorId) -> Option<Actor> {
        let index = self.roster.iter().position(|actor| actor.id == id)?;
        if self.player == Some(id) {
            self.player = None;
        }
        Some(self.roster.remove(index))
    }

    /// Looks up an actor by identifier.
    #[must_use]
    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.roster.iter().find(|actor| actor.id == id)
    }

    /// The player, if one is alive.
    #[must_use]
    pub fn player(&self) -> Option<&Actor> {
        self.player.and_then(|id| self.get(id))
    }

    /// Iterates actors in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.roster.iter()
    }

    /// Number of live actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roster.len()
    }

    /// Reports whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    /// Number of live actors of the given kind.
    #[must_use]
    pub fn count(&self, kind: ActorKind) -> usize {
        self.roster.iter().filter(|actor| actor.kind == kind).count()
    }

    /// Footprint of an actor in screen space, `location - offset`.
    #[must_use]
    pub fn screen_footprint(&self, id: ActorId) -> Option<PixelRect> {
        let offset = self.offset.get();
        self.get(id)
            .map(|actor| actor.footprint().translate(-offset.x, -offset.y))
    }

    /// Removes the oldest mobs until at most `cap` remain.
    pub fn enforce_mob_cap(&mut self, cap: usize) -> usize {
        let mobs = self.count(ActorKind::WanderingMob);
        if mobs <= cap {
            return 0;
        }

        let mut excess = mobs - cap;
        self.roster.retain(|actor| {
            if excess > 0 && actor.kind == ActorKind::WanderingMob {
                excess -= 1;
                false
            } else {
                true
            }
        });
        debug!(evicted = mobs - cap, "mob cap exceeded");
        mobs - cap
    }

    /// Clears every obstacle once more than `cap` exist.
    pub fn enforce_obstacle_cap(&mut self, cap: usize) -> usize {
        let obstacles = self.count(ActorKind::StationaryObstacle);
        if obstacles <= cap {
            return 0;
        }
        self.roster
            .retain(|actor| actor.kind != ActorKind::StationaryObstacle);
        debug!(cleared = obstacles, "obstacle cap exceeded");
        obstacles
    }

    /// Records that a movement key was pressed.
    pub fn press(&mut self, direction: Direction) {
        self.set_held(direction, true);
    }

    /// Records that a movement key was released.
    pub fn release(&mut self, direction: Direction) {
        self.set_held(direction, false);
    }

    /// Advances every actor by one logical update.
    pub fn update(&mut self, viewport: &Viewport) -> MotionReport {
        let blockers = self.blockers(viewport);
        let mut report = MotionReport::default();

        for index in 0..self.roster.len() {
            let (vx, vy) = self.roster[index].velocity();
            if vx == 0 && vy == 0 {
                continue;
            }
            if Some(self.roster[index].id) == self.player {
                report.player_moving = true;
            }

            let mut blocked = false;
            if vx != 0 && !self.try_step(index, vx, 0, viewport, &blockers) {
                blocked = true;
                report.blocked_steps += 1;
            }
            if vy != 0 && !self.try_step(index, 0, vy, viewport, &blockers) {
                blocked = true;
                report.blocked_steps += 1;
            }
            if blocked && self.roster[index].kind == ActorKind::WanderingMob {
                self.redirect(index);
            }
        }

        report
    }

    /// Probes half a tile ahead of the player.
    ///
    /// Impassable terrain under the probe is swapped with the tile one step
    /// further in `direction` and the player advances exactly one tile. The
    /// push is refused when the advanced footprint would overlap impassable
    /// terrain. When nothing is found, a stationary obstacle is dropped one
    /// tile ahead.
    pub fn probe<S: CellSource>(
        &mut self,
        direction: Direction,
        grid: &mut WorldGrid<S>,
        viewport: &mut Viewport,
    ) -> Result<ProbeOutcome, GridError> {
        let Some(index) = self.player_index() else {
            return Ok(ProbeOutcome::NoPlayer);
        };

        let player = &self.roster[index];
        let footprint = player.footprint();
        let ratio = player.collision_ratio;
        let (dx, dy) = direction.delta();
        let probe = footprint
            .translate(dx * footprint.width / 2, dy * footprint.height / 2)
            .scaled(ratio);
        let wall = viewport
            .visible_tiles()
            .iter()
            .find(|tile| !tile.meta.is_passable() && tile.world_rect.scaled(ratio).intersects(&probe))
            .map(|tile| tile.coord);

        let tile_size = viewport.tile_size();
        let step_x = dx * tile_size.width() as i32;
        let step_y = dy * tile_size.height() as i32;

        let Some(wall) = wall else {
            let origin = footprint.translate(step_x, step_y).origin();
            return Ok(ProbeOutcome::ObstacleSpawned(
                self.spawn_obstacle(origin, viewport),
            ));
        };

        let target = wall.step(direction);
        if !grid.cell(target)?.is_passable() {
            return Ok(ProbeOutcome::Jammed { wall });
        }

        let moved = clamp_to_world(footprint.translate(step_x, step_y), viewport.world_rect());
        let landing = moved.scaled(ratio);
        let landing_blocked = tile_size.tile_rect(target).scaled(ratio).intersects(&landing)
            || viewport.visible_tiles().iter().any(|tile| {
                tile.coord != wall
                    && !tile.meta.is_passable()
                    && tile.world_rect.scaled(ratio).intersects(&landing)
            });
        if landing_blocked {
            return Ok(ProbeOutcome::Jammed { wall });
        }

        grid.swap(wall, target)?;
        let _ = viewport.refresh(grid);
        self.roster[index].location = moved.origin();
        debug!(from = %wall, to = %target, "terrain pushed");
        Ok(ProbeOutcome::Pushed { from: wall, to: target })
    }

    fn insert(
        &mut self,
        kind: ActorKind,
        origin: PixelPoint,
        speed: i32,
        heading: Option<Direction>,
        viewport: &Viewport,
    ) -> ActorId {
        let tile_size = viewport.tile_size();
        let footprint = clamp_to_world(
            PixelRect::at(origin, tile_size.width() as i32, tile_size.height() as i32),
            viewport.world_rect(),
        );
        let id = ActorId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.roster.push(Actor {
            id,
            kind,
            location: footprint.origin(),
            width: footprint.width,
            height: footprint.height,
            held: [false; 4],
            heading,
            speed: if kind == ActorKind::Player {
                self.config.player_speed
            } else {
                speed
            },
            collision_ratio: self.config.ratio_for(kind),
        });
        id
    }

    fn player_index(&self) -> Option<usize> {
        let id = self.player?;
        self.roster.iter().position(|actor| actor.id == id)
    }

    fn set_held(&mut self, direction: Direction, held: bool) {
        if let Some(index) = self.player_index() {
            self.roster[index].held[key_slot(direction)] = held;
        }
    }

    fn blockers(&self, viewport: &Viewport) -> Vec<(ActorId, PixelRect)> {
        let view = viewport.view_rect();
        self.roster
            .iter()
            .filter(|actor| actor.kind.blocks_movement())
            .map(|actor| (actor.id, actor.footprint()))
            .filter(|(_, footprint)| footprint.intersects(&view))
            .collect()
    }

    fn try_step(
        &mut self,
        index: usize,
        dx: i32,
        dy: i32,
        viewport: &Viewport,
        blockers: &[(ActorId, PixelRect)],
    ) -> bool {
        let actor = &self.roster[index];
        let start = actor.footprint();
        let tentative = clamp_to_world(start.translate(dx, dy), viewport.world_rect());
        if tentative == start || collides(actor, start, tentative, viewport, blockers) {
            return false;
        }
        self.roster[index].location = tentative.origin();
        true
    }

    fn redirect(&mut self, index: usize) {
        let current = self.roster[index].heading;
        let options: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|direction| Some(*direction) != current)
            .collect();
        if let Some(heading) = options.choose(&mut self.rng) {
            self.roster[index].heading = Some(*heading);
        }
    }
}

/// Picks the passable visible tile closest to the centre of the view.
///
/// Falls back to the centre itself when every visible tile is impassable.
#[must_use]
pub fn start_location(viewport: &Viewport) -> PixelPoint {
    let view = viewport.view_rect();
    let tile_size = viewport.tile_size();
    let centre_x = view.x + view.width / 2;
    let centre_y = view.y + view.height / 2;

    viewport
        .visible_tiles()
        .iter()
        .filter(|tile| tile.meta.is_passable())
        .min_by_key(|tile| {
            let dx = i64::from(tile.world_rect.x + tile.world_rect.width / 2 - centre_x);
            let dy = i64::from(tile.world_rect.y + tile.world_rect.height / 2 - centre_y);
            (dx * dx + dy * dy, tile.coord)
        })
        .map_or_else(
            || {
                PixelPoint::new(
                    centre_x - tile_size.width() as i32 / 2,
                    centre_y - tile_size.height() as i32 / 2,
                )
            },
            |tile| tile.world_rect.origin(),
        )
}

fn collides(
    actor: &Actor,
    start: PixelRect,
    tentative: PixelRect,
    viewport: &Viewport,
    blockers: &[(ActorId, PixelRect)],
) -> bool {
    let ratio = actor.collision_ratio;
    let shrunk = tentative.scaled(ratio);

    let terrain = viewport
        .visible_tiles()
        .iter()
        .any(|tile| !tile.meta.is_passable() && tile.world_rect.scaled(ratio).intersects(&shrunk));
    if terrain {
        return true;
    }

    // An actor already inside an obstacle may walk out of it.
    let origin = start.scaled(ratio);
    blockers.iter().any(|(id, footprint)| {
        let other = footprint.scaled(ratio);
        *id != actor.id && other.intersects(&shrunk) && !other.intersects(&origin)
    })
}

fn clamp_to_world(footprint: PixelRect, world: Option<PixelRect>) -> PixelRect {
    world.map_or(footprint, |world| footprint.clamped_within(&world))
}

fn covered_tiles(rect: PixelRect, tile_size: TileSize) -> TileSpan {
    let width = tile_size.width() as i32;
    let height = tile_size.height() as i32;
    TileSpan::new(
        TileCoord::new(rect.x.div_euclid(width), rect.y.div_euclid(height)),
        TileCoord::new(
            (rect.right() - 1).div_euclid(width),
            (rect.bottom() - 1).div_euclid(height),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covered_tiles_excludes_touching_neighbours() {
        let span = covered_tiles(PixelRect::new(32, 64, 32, 32), TileSize::square(32));
        assert_eq!(span.first(), TileCoord::new(1, 2));
        assert_eq!(span.last(), TileCoord::new(1, 2));

        let straddling = covered_tiles(PixelRect::new(-5, 10, 32, 32), TileSize::square(32));
        assert_eq!(straddling.first(), TileCoord::new(-1, 0));
        assert_eq!(straddling.last(), TileCoord::new(0, 1));
    }

    #[test]
    fn ratios_follow_actor_kind() {
        let config = MotionConfig::default();
        assert_eq!(config.ratio_for(ActorKind::Player), 0.8);
        assert_eq!(config.ratio_for(ActorKind::WanderingMob), 0.6);
        assert_eq!(config.ratio_for(ActorKind::StationaryObstacle), 0.8);
    }
}
