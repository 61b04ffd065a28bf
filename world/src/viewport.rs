//! Scrolling pixel window over the world grid.

use std::fmt;

use thiserror::Error;
use tile_explorer_core::{CellMeta, PixelPoint, PixelRect, TileCoord, TileSize, ViewOffset};
use tracing::trace;

use crate::grid::{CellSource, TileSpan, WorldGrid};

/// Errors raised when configuring a viewport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ViewportError {
    /// Tiles must cover at least one pixel along each axis.
    #[error("tile size must be positive (received {width}x{height})")]
    InvalidTileSize {
        /// Requested tile width.
        width: u32,
        /// Requested tile height.
        height: u32,
    },
    /// The view must cover at least one pixel along each axis.
    #[error("view size must be positive (received {width}x{height})")]
    InvalidViewSize {
        /// Requested view width.
        width: i32,
        /// Requested view height.
        height: i32,
    },
}

/// A tile materialised for the current view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibleTile {
    /// Grid coordinate of the tile.
    pub coord: TileCoord,
    /// Metadata copied from the grid when the view was rebuilt.
    pub meta: CellMeta,
    /// Rectangle covered by the tile in world pixels.
    pub world_rect: PixelRect,
    /// Upper-left corner of the tile on screen, `coord * tile_size - offset`.
    pub screen: PixelPoint,
}

type ChangeListener = Box<dyn FnMut(ViewOffset)>;

/// Pixel-space window over a [`WorldGrid`].
///
/// Every offset change rebuilds the visible tile set from scratch and then
/// notifies listeners, in registration order, with the resulting offset.
pub struct Viewport {
    view: PixelRect,
    tile_size: TileSize,
    world: Option<PixelRect>,
    span: TileSpan,
    visible: Vec<VisibleTile>,
    listeners: Vec<ChangeListener>,
}

impl fmt::Debug for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewport")
            .field("view", &self.view)
            .field("tile_size", &self.tile_size)
            .field("world", &self.world)
            .field("span", &self.span)
            .field("visible", &self.visible.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Viewport {
    /// Creates a viewport over `grid` and materialises its first tile set.
    ///
    /// The initial offset is clamped like any later motion. No listener is
    /// registered yet, so nobody is notified.
    pub fn new<S: CellSource>(
        grid: &mut WorldGrid<S>,
        view: PixelRect,
        tile_size: TileSize,
    ) -> Result<Self, ViewportError> {
        if tile_size.width() == 0 || tile_size.height() == 0 {
            return Err(ViewportError::InvalidTileSize {
                width: tile_size.width(),
                height: tile_size.height(),
            });
        }
        validate_view(view)?;

        let world = grid.bounds().map(|bounds| bounds.pixel_rect(tile_size));
        let mut viewport = Self {
            view,
            tile_size,
            world,
            span: TileSpan::covering(view, tile_size),
            visible: Vec::new(),
            listeners: Vec::new(),
        };
        viewport.view = viewport.clamp(view);
        viewport.rebuild(grid);
        Ok(viewport)
    }

    /// Current scroll offset.
    #[must_use]
    pub const fn offset(&self) -> ViewOffset {
        ViewOffset::new(self.view.x, self.view.y)
    }

    /// Current view rectangle in world pixels.
    #[must_use]
    pub const fn view_rect(&self) -> PixelRect {
        self.view
    }

    /// Pixel dimensions of a tile.
    #[must_use]
    pub const fn tile_size(&self) -> TileSize {
        self.tile_size
    }

    /// Pixel extent of a bounded world.
    #[must_use]
    pub const fn world_rect(&self) -> Option<PixelRect> {
        self.world
    }

    /// Range of tiles materialised for the current view.
    #[must_use]
    pub const fn span(&self) -> TileSpan {
        self.span
    }

    /// Tiles materialised for the current view.
    #[must_use]
    pub fn visible_tiles(&self) -> &[VisibleTile] {
        &self.visible
    }

    /// Converts a world position into screen space.
    #[must_use]
    pub const fn to_screen(&self, point: PixelPoint) -> PixelPoint {
        PixelPoint::new(point.x - self.view.x, point.y - self.view.y)
    }

    /// Appends a listener invoked with the new offset after every change.
    pub fn add_change_listener<F>(&mut self, listener: F)
    where
        F: FnMut(ViewOffset) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Replaces the view rectangle.
    pub fn set_view<S: CellSource>(
        &mut self,
        grid: &mut WorldGrid<S>,
        view: PixelRect,
    ) -> Result<ViewOffset, ViewportError> {
        validate_view(view)?;
        Ok(self.apply(grid, view))
    }

    /// Scrolls the view by the provided pixel deltas, clamped to the world.
    pub fn move_by<S: CellSource>(
        &mut self,
        grid: &mut WorldGrid<S>,
        dx: i32,
        dy: i32,
    ) -> ViewOffset {
        self.apply(grid, self.view.translate(dx, dy))
    }

    /// Rebuilds the tile set and renotifies listeners without moving.
    pub fn refresh<S: CellSource>(&mut self, grid: &mut WorldGrid<S>) -> ViewOffset {
        self.apply(grid, self.view)
    }

    fn apply<S: CellSource>(&mut self, grid: &mut WorldGrid<S>, view: PixelRect) -> ViewOffset {
        self.view = self.clamp(view);
        self.rebuild(grid);

        let offset = self.offset();
        for listener in &mut self.listeners {
            listener(offset);
        }
        offset
    }

    fn clamp(&self, view: PixelRect) -> PixelRect {
        let Some(world) = self.world else {
            return view;
        };
        let max_x = (world.right() - view.width).max(world.x);
        let max_y = (world.bottom() - view.height).max(world.y);
        PixelRect::new(
            view.x.clamp(world.x, max_x),
            view.y.clamp(world.y, max_y),
            view.width,
            view.height,
        )
    }

    fn rebuild<S: CellSource>(&mut self, grid: &mut WorldGrid<S>) {
        let span = TileSpan::covering(self.view, self.tile_size);
        let mut visible = Vec::with_capacity(span.len());
        for coord in span.iter() {
            let Ok(cell) = grid.cell(coord) else {
                continue;
            };
            let world_rect = self.tile_size.tile_rect(coord);
            visible.push(VisibleTile {
                coord,
                meta: cell.meta(),
                world_rect,
                screen: self.to_screen(world_rect.origin()),
            });
        }

        self.span = span;
        self.visible = visible;
        let evicted = grid.evict_outside(span);
        trace!(
            offset_x = self.view.x,
            offset_y = self.view.y,
            tiles = self.visible.len(),
            evicted,
            "viewport rebuilt"
        );
    }
}

fn validate_view(view: PixelRect) -> Result<(), ViewportError> {
    if view.width <= 0 || view.height <= 0 {
        return Err(ViewportError::InvalidViewSize {
            width: view.width,
            height: view.height,
        });
    }
    Ok(())
}
