//! Lazily materialised logical grid.

use std::collections::{hash_map::Entry, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tile_explorer_core::{AdjacencyMode, CellMeta, PixelRect, TileCoord, TileSize};
use tracing::debug;

use crate::terrain::TerrainClassifier;

/// Produces the initial metadata of cells the first time they are requested.
pub trait CellSource {
    /// Derives the metadata for the cell at `coord`.
    fn initial_meta(&self, coord: TileCoord) -> CellMeta;
}

impl CellSource for TerrainClassifier {
    fn initial_meta(&self, coord: TileCoord) -> CellMeta {
        self.classify(coord)
    }
}

impl<F> CellSource for F
where
    F: Fn(TileCoord) -> CellMeta,
{
    fn initial_meta(&self, coord: TileCoord) -> CellMeta {
        self(coord)
    }
}

/// Errors reported by grid queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// The coordinate lies outside a bounded grid.
    #[error("tile {coord} lies outside the {columns}x{rows} grid")]
    OutOfBounds {
        /// Offending coordinate.
        coord: TileCoord,
        /// Number of columns in the grid.
        columns: u32,
        /// Number of rows in the grid.
        rows: u32,
    },
}

/// Finite extent of a bounded grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridBounds {
    columns: u32,
    rows: u32,
}

impl GridBounds {
    /// Creates bounds covering `[0, columns) x [0, rows)`.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the coordinate lies inside the bounds.
    #[must_use]
    pub const fn contains(&self, coord: TileCoord) -> bool {
        coord.x() >= 0
            && coord.y() >= 0
            && (coord.x() as u32) < self.columns
            && (coord.y() as u32) < self.rows
    }

    /// World rectangle covered by the bounds in pixels.
    ///
    /// Extents beyond `i32::MAX` saturate; see [`GridBounds::fits_pixels`].
    #[must_use]
    pub const fn pixel_rect(&self, tile_size: TileSize) -> PixelRect {
        PixelRect::new(
            0,
            0,
            pixel_extent(self.columns, tile_size.width()),
            pixel_extent(self.rows, tile_size.height()),
        )
    }

    /// Reports whether the pixel extent is representable without saturating.
    #[must_use]
    pub const fn fits_pixels(&self, tile_size: TileSize) -> bool {
        (self.columns as u64) * (tile_size.width() as u64) <= i32::MAX as u64
            && (self.rows as u64) * (tile_size.height() as u64) <= i32::MAX as u64
    }
}

const fn pixel_extent(tiles: u32, tile: u32) -> i32 {
    let extent = (tiles as u64) * (tile as u64);
    if extent > i32::MAX as u64 {
        i32::MAX
    } else {
        extent as i32
    }
}

/// Inclusive rectangular range of tile coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileSpan {
    first: TileCoord,
    last: TileCoord,
}

impl TileSpan {
    /// Creates a span from its inclusive corners.
    #[must_use]
    pub const fn new(first: TileCoord, last: TileCoord) -> Self {
        Self { first, last }
    }

    /// Span of tiles touched by `rect`, extended by one trailing tile on each
    /// axis so partially scrolled views never show a seam.
    #[must_use]
    pub const fn covering(rect: PixelRect, tile_size: TileSize) -> Self {
        let width = tile_size.width() as i32;
        let height = tile_size.height() as i32;
        Self {
            first: TileCoord::new(rect.x.div_euclid(width), rect.y.div_euclid(height)),
            last: TileCoord::new(
                ceil_div(rect.right(), width),
                ceil_div(rect.bottom(), height),
            ),
        }
    }

    /// Upper-left tile of the span.
    #[must_use]
    pub const fn first(&self) -> TileCoord {
        self.first
    }

    /// Lower-right tile of the span.
    #[must_use]
    pub const fn last(&self) -> TileCoord {
        self.last
    }

    /// Reports whether the coordinate lies inside the span.
    #[must_use]
    pub const fn contains(&self, coord: TileCoord) -> bool {
        coord.x() >= self.first.x()
            && coord.x() <= self.last.x()
            && coord.y() >= self.first.y()
            && coord.y() <= self.last.y()
    }

    /// Number of tiles in the span.
    #[must_use]
    pub fn len(&self) -> usize {
        let columns = i64::from(self.last.x()) - i64::from(self.first.x()) + 1;
        let rows = i64::from(self.last.y()) - i64::from(self.first.y()) + 1;
        usize::try_from(columns.max(0) * rows.max(0)).unwrap_or(usize::MAX)
    }

    /// Reports whether the span contains no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates the span column by column.
    pub fn iter(&self) -> impl Iterator<Item = TileCoord> {
        let (first, last) = (self.first, self.last);
        (first.x()..=last.x())
            .flat_map(move |x| (first.y()..=last.y()).map(move |y| TileCoord::new(x, y)))
    }
}

const fn ceil_div(value: i32, divisor: i32) -> i32 {
    -((-value).div_euclid(divisor))
}

/// Single addressable point of the world.
///
/// Equality and hashing consider only the coordinate.
#[derive(Clone, Copy, Debug)]
pub struct GridCell {
    coord: TileCoord,
    meta: CellMeta,
    swapped: bool,
}

impl GridCell {
    fn new(coord: TileCoord, meta: CellMeta) -> Self {
        Self {
            coord,
            meta,
            swapped: false,
        }
    }

    /// Coordinate identifying the cell.
    #[must_use]
    pub const fn coord(&self) -> TileCoord {
        self.coord
    }

    /// Current metadata of the cell.
    #[must_use]
    pub const fn meta(&self) -> CellMeta {
        self.meta
    }

    /// Reports whether actors may overlap the cell.
    #[must_use]
    pub const fn is_passable(&self) -> bool {
        self.meta.is_passable()
    }

    /// Reports whether swaps left the cell holding metadata other than the
    /// metadata its source derives.
    #[must_use]
    pub const fn was_swapped(&self) -> bool {
        self.swapped
    }
}

impl PartialEq for GridCell {
    fn eq(&self, other: &Self) -> bool {
        self.coord == other.coord
    }
}

impl Eq for GridCell {}

impl std::hash::Hash for GridCell {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.coord.hash(state);
    }
}

/// Logical 2D grid that creates and caches cells on demand.
///
/// Cells live in a flat arena indexed by packed coordinates. Each cell is
/// classified exactly once, on first request, and only [`WorldGrid::swap`]
/// changes its metadata afterwards.
#[derive(Debug)]
pub struct WorldGrid<S = TerrainClassifier> {
    source: S,
    bounds: Option<GridBounds>,
    cells: Vec<GridCell>,
    index: HashMap<u64, usize>,
    cell_capacity: Option<usize>,
}

impl<S: CellSource> WorldGrid<S> {
    /// Creates a grid where every coordinate is valid.
    #[must_use]
    pub fn unbounded(source: S) -> Self {
        Self {
            source,
            bounds: None,
            cells: Vec::new(),
            index: HashMap::new(),
            cell_capacity: None,
        }
    }

    /// Creates a grid limited to `bounds`.
    #[must_use]
    pub fn bounded(source: S, bounds: GridBounds) -> Self {
        Self {
            bounds: Some(bounds),
            ..Self::unbounded(source)
        }
    }

    /// Caps the number of live cells retained after viewport rebuilds.
    #[must_use]
    pub fn with_cell_capacity(mut self, capacity: Option<usize>) -> Self {
        self.cell_capacity = capacity;
        self
    }

    /// Finite extent of the grid, if any.
    #[must_use]
    pub const fn bounds(&self) -> Option<GridBounds> {
        self.bounds
    }

    /// Callback used to initialise new cells.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Number of cells currently materialised.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether no cell has been materialised yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reports whether the coordinate is valid for this grid.
    #[must_use]
    pub fn contains(&self, coord: TileCoord) -> bool {
        self.bounds.map_or(true, |bounds| bounds.contains(coord))
    }

    /// Returns the cell at `coord`, creating and classifying it if absent.
    pub fn cell(&mut self, coord: TileCoord) -> Result<&GridCell, GridError> {
        self.check(coord)?;
        let slot = self.slot(coord);
        Ok(&self.cells[slot])
    }

    /// Returns the cell at `coord` only if it has already been materialised.
    #[must_use]
    pub fn peek(&self, coord: TileCoord) -> Option<&GridCell> {
        self.index
            .get(&coord.packed())
            .and_then(|slot| self.cells.get(*slot))
    }

    /// Returns the in-bounds neighbours of `coord`.
    ///
    /// Four-way neighbours are listed west, east, north, south; eight-way
    /// neighbours are listed column by column.
    pub fn adjacent(
        &mut self,
        coord: TileCoord,
        mode: AdjacencyMode,
    ) -> Result<Vec<GridCell>, GridError> {
        self.check(coord)?;

        let offsets: &[(i32, i32)] = match mode {
            AdjacencyMode::FourWay => &[(-1, 0), (1, 0), (0, -1), (0, 1)],
            AdjacencyMode::EightWay => &[
                (-1, -1),
                (-1, 0),
                (-1, 1),
                (0, -1),
                (0, 1),
                (1, -1),
                (1, 0),
                (1, 1),
            ],
        };

        let mut neighbours = Vec::with_capacity(offsets.len());
        for (dx, dy) in offsets {
            let neighbour = coord.offset(*dx, *dy);
            if !self.contains(neighbour) {
                continue;
            }
            let slot = self.slot(neighbour);
            neighbours.push(self.cells[slot]);
        }
        Ok(neighbours)
    }

    /// Exchanges the metadata of two cells while their coordinates stay put.
    ///
    /// Adjacency is not enforced here; that is a caller policy.
    pub fn swap(&mut self, first: TileCoord, second: TileCoord) -> Result<(), GridError> {
        self.check(first)?;
        self.check(second)?;
        if first == second {
            return Ok(());
        }

        let first_slot = self.slot(first);
        let second_slot = self.slot(second);
        let first_meta = self.cells[first_slot].meta;
        self.cells[first_slot].meta = self.cells[second_slot].meta;
        self.cells[second_slot].meta = first_meta;
        for slot in [first_slot, second_slot] {
            let cell = &mut self.cells[slot];
            cell.swapped = cell.meta != self.source.initial_meta(cell.coord);
        }
        Ok(())
    }

    /// Drops cells outside `keep` when the live count exceeds the configured
    /// capacity. Cells whose metadata differs from the source are always
    /// retained. Returns the number of evicted cells.
    pub fn evict_outside(&mut self, keep: TileSpan) -> usize {
        let Some(capacity) = self.cell_capacity else {
            return 0;
        };
        if self.cells.len() <= capacity {
            return 0;
        }

        let before = self.cells.len();
        self.cells
            .retain(|cell| cell.swapped || keep.contains(cell.coord));
        self.index.clear();
        for (slot, cell) in self.cells.iter().enumerate() {
            let _ = self.index.insert(cell.coord.packed(), slot);
        }
        let evicted = before - self.cells.len();
        debug!(evicted, live = self.cells.len(), "evicted grid cells");
        evicted
    }

    fn check(&self, coord: TileCoord) -> Result<(), GridError> {
        match self.bounds {
            Some(bounds) if !bounds.contains(coord) => Err(GridError::OutOfBounds {
                coord,
                columns: bounds.columns(),
                rows: bounds.rows(),
            }),
            _ => Ok(()),
        }
    }

    fn slot(&mut self, coord: TileCoord) -> usize {
        match self.index.entry(coord.packed()) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let slot = self.cells.len();
                self.cells
                    .push(GridCell::new(coord, self.source.initial_meta(coord)));
                *entry.insert(slot)
            }
        }
    }
}
