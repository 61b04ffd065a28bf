#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Terrain generation, the lazily materialised world grid and the viewport
//! that observes it.
//!
//! The world is an effectively unbounded 2D grid. Cells are classified from a
//! seeded noise field the first time they are requested and cached afterwards,
//! so the same seed always regenerates the same terrain. A [`Viewport`]
//! materialises only the tiles under its pixel rectangle and tells its
//! listeners whenever it scrolls.

mod grid;
mod noise;
mod terrain;
mod viewport;

pub use grid::{CellSource, GridBounds, GridCell, GridError, TileSpan, WorldGrid};
pub use noise::NoiseGenerator;
pub use terrain::{ClassifierConfig, TerrainClassifier};
pub use viewport::{Viewport, ViewportError, VisibleTile};
