#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tile Explorer engine.
//!
//! This crate defines the vocabulary that connects adapters, the world and
//! the pure systems. Adapters translate device input into [`Intent`] values,
//! the simulation feeds those intents to the actor systems once per logical
//! update, and the world exposes terrain as [`CellMeta`] records keyed by
//! [`TileCoord`]. Pixel-space geometry lives here as well so that every crate
//! agrees on rectangle overlap and clamping rules.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Tile Explorer.";

/// Location of a single tile expressed in whole-tile coordinates.
///
/// Coordinates are signed because the unbounded world extends in every
/// direction from the origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    x: i32,
    y: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the tile.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the tile.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the coordinate displaced by the provided tile deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.wrapping_add(dx), self.y.wrapping_add(dy))
    }

    /// Returns the neighbouring coordinate one tile away in `direction`.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.offset(dx, dy)
    }

    /// Packs both components into a single 64-bit key.
    #[must_use]
    pub const fn packed(self) -> u64 {
        ((self.x as u32 as u64) << 32) | (self.y as u32 as u64)
    }

    /// Restores a coordinate from a key produced by [`TileCoord::packed`].
    #[must_use]
    pub const fn from_packed(key: u64) -> Self {
        Self::new((key >> 32) as u32 as i32, key as u32 as i32)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Position expressed in world pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPoint {
    /// Horizontal pixel position.
    pub x: i32,
    /// Vertical pixel position.
    pub y: i32,
}

impl PixelPoint {
    /// Creates a new pixel point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Scroll offset of the viewport measured in world pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewOffset {
    /// Horizontal offset of the view's left edge.
    pub x: i32,
    /// Vertical offset of the view's top edge.
    pub y: i32,
}

impl ViewOffset {
    /// Creates a new view offset.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Pixel dimensions of a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileSize {
    width: u32,
    height: u32,
}

impl TileSize {
    /// Creates a new tile size descriptor.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Creates a square tile size.
    #[must_use]
    pub const fn square(length: u32) -> Self {
        Self::new(length, length)
    }

    /// Width of a tile in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of a tile in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// World-space rectangle covered by the provided tile.
    #[must_use]
    pub const fn tile_rect(&self, coord: TileCoord) -> PixelRect {
        let width = self.width as i32;
        let height = self.height as i32;
        PixelRect::new(coord.x() * width, coord.y() * height, width, height)
    }
}

/// Axis-aligned rectangle in pixel space.
///
/// Overlap follows half-open semantics: rectangles that merely share an edge
/// do not intersect, and empty rectangles never intersect anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Horizontal extent.
    pub width: i32,
    /// Vertical extent.
    pub height: i32,
}

impl PixelRect {
    /// Creates a new rectangle.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle anchored at the provided upper-left point.
    #[must_use]
    pub const fn at(origin: PixelPoint, width: i32, height: i32) -> Self {
        Self::new(origin.x, origin.y, width, height)
    }

    /// Upper-left corner of the rectangle.
    #[must_use]
    pub const fn origin(&self) -> PixelPoint {
        PixelPoint::new(self.x, self.y)
    }

    /// Exclusive right edge.
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Returns the rectangle moved by the provided deltas.
    #[must_use]
    pub const fn translate(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Reports whether both rectangles share interior area.
    #[must_use]
    pub const fn intersects(&self, other: &PixelRect) -> bool {
        self.width > 0
            && self.height > 0
            && other.width > 0
            && other.height > 0
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Scales the rectangle about its centre by `ratio`.
    ///
    /// Size deltas are truncated toward zero and split evenly between both
    /// sides, so a 32 px edge scaled by 0.8 becomes 26 px inset by 3 px.
    #[must_use]
    pub fn scaled(self, ratio: f32) -> Self {
        let dw = (self.width as f32 * ratio - self.width as f32) as i32;
        let dh = (self.height as f32 * ratio - self.height as f32) as i32;
        Self::new(
            self.x - dw / 2,
            self.y - dh / 2,
            self.width + dw,
            self.height + dh,
        )
    }

    /// Moves the rectangle so that it lies inside `bounds`.
    ///
    /// A rectangle larger than the bounds along an axis is centred on that
    /// axis instead.
    #[must_use]
    pub const fn clamped_within(self, bounds: &PixelRect) -> Self {
        let x = clamp_axis(self.x, self.width, bounds.x, bounds.width);
        let y = clamp_axis(self.y, self.height, bounds.y, bounds.height);
        Self::new(x, y, self.width, self.height)
    }
}

const fn clamp_axis(start: i32, length: i32, bound_start: i32, bound_length: i32) -> i32 {
    if length >= bound_length {
        bound_start + bound_length / 2 - length / 2
    } else if start < bound_start {
        bound_start
    } else if start + length > bound_start + bound_length {
        bound_start + bound_length - length
    } else {
        start
    }
}

/// Terrain category assigned to a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainKind {
    /// Open ground that actors may cross.
    Normal,
    /// Solid terrain that blocks every actor.
    Impassable,
    /// Passable terrain that is costly to cross.
    Hazard,
}

impl TerrainKind {
    /// Reports whether actors may overlap terrain of this kind.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        !matches!(self, Self::Impassable)
    }
}

/// Key used to look up drawable images in the asset cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisualTag {
    /// Plain ground tile.
    Normal,
    /// Solid rock tile.
    Impassable,
    /// Hazardous ground tile.
    Hazard,
    /// The player-controlled actor.
    Player,
    /// A wandering creature.
    Mob,
    /// A stationary obstacle dropped by the player.
    Obstacle,
}

impl VisualTag {
    /// Every tag known to the engine.
    pub const ALL: [VisualTag; 6] = [
        Self::Normal,
        Self::Impassable,
        Self::Hazard,
        Self::Player,
        Self::Mob,
        Self::Obstacle,
    ];

    /// Stable name used by sprite manifests.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Impassable => "impassable",
            Self::Hazard => "hazard",
            Self::Player => "player",
            Self::Mob => "mob",
            Self::Obstacle => "obstacle",
        }
    }

    /// Resolves a manifest name back into a tag.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.name() == name)
    }
}

/// Metadata carried by a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellMeta {
    /// Terrain category of the cell.
    pub terrain: TerrainKind,
    /// Image key used when drawing the cell.
    pub visual: VisualTag,
    /// Traversal cost consulted by path planners; `None` when impassable.
    pub cost: Option<u32>,
}

impl CellMeta {
    /// Cost of crossing open ground.
    pub const NORMAL_COST: u32 = 10;

    /// Cost of crossing hazardous ground.
    pub const HAZARD_COST: u32 = 30;

    /// Open ground.
    #[must_use]
    pub const fn normal() -> Self {
        Self {
            terrain: TerrainKind::Normal,
            visual: VisualTag::Normal,
            cost: Some(Self::NORMAL_COST),
        }
    }

    /// Solid rock.
    #[must_use]
    pub const fn impassable() -> Self {
        Self {
            terrain: TerrainKind::Impassable,
            visual: VisualTag::Impassable,
            cost: None,
        }
    }

    /// Hazardous ground.
    #[must_use]
    pub const fn hazard() -> Self {
        Self {
            terrain: TerrainKind::Hazard,
            visual: VisualTag::Hazard,
            cost: Some(Self::HAZARD_COST),
        }
    }

    /// Reports whether actors may overlap the cell.
    #[must_use]
    pub const fn is_passable(&self) -> bool {
        self.terrain.is_passable()
    }
}

/// Cardinal directions used for movement and probing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing y.
    North,
    /// Toward increasing x.
    East,
    /// Toward increasing y.
    South,
    /// Toward decreasing x.
    West,
}

impl Direction {
    /// All four directions in clockwise order starting from north.
    pub const ALL: [Direction; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Unit delta of the direction in tile or pixel axes.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// Direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }
}

/// Neighbourhood used by adjacency queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdjacencyMode {
    /// Up, down, left and right.
    FourWay,
    /// The four-way neighbours plus diagonals.
    EightWay,
}

/// Unique identifier assigned to an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(u32);

impl ActorId {
    /// Creates a new actor identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Behaviour variant of an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    /// Moved by player intents.
    Player,
    /// Walks in a straight line and turns when blocked.
    WanderingMob,
    /// Never moves and blocks other actors.
    StationaryObstacle,
}

impl ActorKind {
    /// Reports whether other actors are blocked by this kind.
    #[must_use]
    pub const fn blocks_movement(self) -> bool {
        matches!(self, Self::StationaryObstacle)
    }

    /// Image key used when drawing actors of this kind.
    #[must_use]
    pub const fn visual(self) -> VisualTag {
        match self {
            Self::Player => VisualTag::Player,
            Self::WanderingMob => VisualTag::Mob,
            Self::StationaryObstacle => VisualTag::Obstacle,
        }
    }
}

/// Discrete player intents delivered by the input collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    /// A movement key was pressed.
    MoveStarted {
        /// Direction associated with the key.
        direction: Direction,
    },
    /// A movement key was released.
    MoveStopped {
        /// Direction associated with the key.
        direction: Direction,
    },
    /// Probes the tile ahead of the player to push terrain or drop an obstacle.
    Probe {
        /// Direction of the probe.
        direction: Direction,
    },
    /// Toggles the diagnostic overlay.
    ToggleDiagnostics,
    /// Requests immediate termination.
    Quit,
}

/// Request to create a wandering mob.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MobSpawn {
    /// Upper-left corner of the mob's footprint in world pixels.
    pub location: PixelPoint,
    /// Pixels travelled per logical update.
    pub speed: i32,
}
