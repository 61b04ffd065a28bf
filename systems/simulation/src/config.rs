//! Serde-backed tunables for a simulation run.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tile_explorer_core::{PixelRect, TileSize};
use tile_explorer_system_motion::MotionConfig;
use tile_explorer_world::{ClassifierConfig, GridBounds, ViewportError};

/// Extent of the explored world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorldShape {
    /// Every coordinate is valid.
    Unbounded,
    /// Only `[0, columns) x [0, rows)` exists.
    Bounded {
        /// Number of tile columns.
        columns: u32,
        /// Number of tile rows.
        rows: u32,
    },
}

/// Errors raised while assembling a simulation.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum SimulationError {
    /// Ticks per second must be positive.
    #[error("tick rate must be positive")]
    InvalidTickRate,
    /// Max frame skip must allow at least one update per frame.
    #[error("max frame skip must be positive")]
    InvalidFrameSkip,
    /// Bounded worlds need at least one tile along each axis.
    #[error("bounded world must be at least 1x1 tiles (received {columns}x{rows})")]
    EmptyWorld {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
    /// Bounded worlds must fit in `i32` pixel coordinates.
    #[error("bounded world of {columns}x{rows} tiles exceeds the pixel coordinate range")]
    WorldTooLarge {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
    /// The viewport rejected the configured geometry.
    #[error(transparent)]
    Viewport(#[from] ViewportError),
}

/// Complete configuration of a simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed shared by terrain, wandering and spawning.
    pub seed: u32,
    /// Tile width in pixels.
    pub tile_width: u32,
    /// Tile height in pixels.
    pub tile_height: u32,
    /// View width in pixels.
    pub view_width: i32,
    /// View height in pixels.
    pub view_height: i32,
    /// Extent of the world.
    pub world: WorldShape,
    /// Logical updates per second.
    pub ticks_per_second: u32,
    /// Maximum logical updates executed before a render.
    pub max_frame_skip: u32,
    /// Ticks between render throughput samples.
    pub diagnostics_interval: u32,
    /// Actor motion tunables.
    pub motion: MotionConfig,
    /// Mobs sprinkled over the world at start-up.
    pub initial_mobs: usize,
    /// Fastest possible mob speed in pixels per update.
    pub mob_max_speed: i32,
    /// Ticks between periodic mob spawns; zero disables them.
    pub mob_spawn_interval: u32,
    /// Largest mob population; the oldest mobs are evicted beyond it.
    pub mob_cap: usize,
    /// Largest obstacle population; every obstacle is cleared beyond it.
    pub obstacle_cap: usize,
    /// Live grid cells retained after a viewport rebuild.
    pub cell_capacity: Option<usize>,
    /// Distance from a view edge that triggers auto-scroll.
    pub scroll_margin: i32,
    /// Tiles scrolled horizontally per auto-scroll.
    pub scroll_columns: i32,
    /// Tiles scrolled vertically per auto-scroll.
    pub scroll_rows: i32,
    /// Terrain thresholds.
    pub terrain: ClassifierConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: 0,
            tile_width: 32,
            tile_height: 32,
            view_width: 800,
            view_height: 600,
            world: WorldShape::Bounded {
                columns: 50,
                rows: 50,
            },
            ticks_per_second: 30,
            max_frame_skip: 5,
            diagnostics_interval: 10,
            motion: MotionConfig::default(),
            initial_mobs: 10,
            mob_max_speed: 4,
            mob_spawn_interval: 150,
            mob_cap: 20,
            obstacle_cap: 16,
            cell_capacity: Some(8192),
            scroll_margin: 100,
            scroll_columns: 6,
            scroll_rows: 4,
            terrain: ClassifierConfig::default(),
        }
    }
}

impl Config {
    /// Pixel dimensions of a tile.
    #[must_use]
    pub const fn tile_size(&self) -> TileSize {
        TileSize::new(self.tile_width, self.tile_height)
    }

    /// Initial view rectangle.
    #[must_use]
    pub const fn view_rect(&self) -> PixelRect {
        PixelRect::new(0, 0, self.view_width, self.view_height)
    }

    /// Checks the values that cannot be clamped into something sensible.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.ticks_per_second == 0 {
            return Err(SimulationError::InvalidTickRate);
        }
        if self.max_frame_skip == 0 {
            return Err(SimulationError::InvalidFrameSkip);
        }
        if let WorldShape::Bounded { columns, rows } = self.world {
            if columns == 0 || rows == 0 {
                return Err(SimulationError::EmptyWorld { columns, rows });
            }
        }
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(ViewportError::InvalidTileSize {
                width: self.tile_width,
                height: self.tile_height,
            }
            .into());
        }
        if let WorldShape::Bounded { columns, rows } = self.world {
            if !GridBounds::new(columns, rows).fits_pixels(self.tile_size()) {
                return Err(SimulationError::WorldTooLarge { columns, rows });
            }
        }
        if self.view_width <= 0 || self.view_height <= 0 {
            return Err(ViewportError::InvalidViewSize {
                width: self.view_width,
                height: self.view_height,
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_tick_rate() {
        let config = Config {
            ticks_per_second: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(SimulationError::InvalidTickRate));
    }

    #[test]
    fn rejects_empty_bounded_world() {
        let config = Config {
            world: WorldShape::Bounded {
                columns: 0,
                rows: 3,
            },
            ..Config::default()
        };
        assert_eq!(
            config.validate(),
            Err(SimulationError::EmptyWorld {
                columns: 0,
                rows: 3
            })
        );
    }

    #[test]
    fn rejects_bounded_world_wider_than_pixel_range() {
        let config = Config {
            world: WorldShape::Bounded {
                columns: 200_000_000,
                rows: 3,
            },
            ..Config::default()
        };
        assert_eq!(
            config.validate(),
            Err(SimulationError::WorldTooLarge {
                columns: 200_000_000,
                rows: 3
            })
        );

        let tall = Config {
            world: WorldShape::Bounded {
                columns: 3,
                rows: u32::MAX,
            },
            ..Config::default()
        };
        assert!(matches!(
            tall.validate(),
            Err(SimulationError::WorldTooLarge { .. })
        ));
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config: Config = toml::from_str(
            r#"
            seed = 7
            world = "unbounded"

            [motion]
            player_speed = 8
            "#,
        )
        .expect("valid config");

        assert_eq!(config.seed, 7);
        assert_eq!(config.world, WorldShape::Unbounded);
        assert_eq!(config.motion.player_speed, 8);
        assert_eq!(config.motion.player_ratio, 0.8);
        assert_eq!(config.ticks_per_second, 30);
    }

    #[test]
    fn bounded_world_reads_from_a_table() {
        let config: Config = toml::from_str(
            r#"
            [world.bounded]
            columns = 12
            rows = 9
            "#,
        )
        .expect("valid config");

        assert_eq!(
            config.world,
            WorldShape::Bounded {
                columns: 12,
                rows: 9
            }
        );
    }
}
