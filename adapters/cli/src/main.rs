#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Tile Explorer experience.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;
use tile_explorer_core::{PixelRect, WELCOME_BANNER};
use tile_explorer_rendering::{
    ActorSprite, Color, FrameControl, Presentation, RenderingBackend, Scene, TileSprite,
};
use tile_explorer_rendering_macroquad::MacroquadBackend;
use tile_explorer_system_simulation::{
    Config, ManualClock, Simulation, SimulationLoop, SystemClock, WorldShape,
};
use tile_explorer_world::CellSource;
use tracing::info;
use tracing_subscriber::EnvFilter;

const WINDOW_TITLE: &str = "Tile Explorer";

#[derive(Parser, Debug)]
#[command(author, version, about = "Explore a procedurally generated tile world")]
struct Args {
    /// TOML file overriding the default configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed shared by terrain, mob wandering and spawning
    #[arg(long)]
    seed: Option<u32>,
    /// Logical updates per second
    #[arg(long)]
    ticks_per_second: Option<u32>,
    /// Maximum logical updates performed before each render
    #[arg(long)]
    max_frame_skip: Option<u32>,
    /// Let the world extend forever in every direction
    #[arg(long, conflicts_with_all = ["columns", "rows"])]
    unbounded: bool,
    /// Width of a bounded world in tiles
    #[arg(long, requires = "rows")]
    columns: Option<u32>,
    /// Height of a bounded world in tiles
    #[arg(long, requires = "columns")]
    rows: Option<u32>,
    /// Mobs sprinkled over the world at start-up
    #[arg(long)]
    mobs: Option<usize>,
    /// Sprite manifest; flat colors are drawn without one
    #[arg(long)]
    sprites: Option<PathBuf>,
    /// Run this many frames without a window and exit
    #[arg(long, value_name = "FRAMES")]
    headless: Option<u32>,
}

/// Entry point for the Tile Explorer command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    info!("{WELCOME_BANNER}");

    let config = load_config(&args)?;
    match args.headless {
        Some(frames) => run_headless(config, frames).map(|_| ()),
        None => run_windowed(config, args.sprites),
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read config at {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("failed to parse config at {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(ticks_per_second) = args.ticks_per_second {
        config.ticks_per_second = ticks_per_second;
    }
    if let Some(max_frame_skip) = args.max_frame_skip {
        config.max_frame_skip = max_frame_skip;
    }
    if let Some(mobs) = args.mobs {
        config.initial_mobs = mobs;
    }
    if args.unbounded {
        config.world = WorldShape::Unbounded;
    } else if let (Some(columns), Some(rows)) = (args.columns, args.rows) {
        config.world = WorldShape::Bounded { columns, rows };
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn run_windowed(config: Config, sprites: Option<PathBuf>) -> Result<()> {
    let presentation = Presentation::new(
        WINDOW_TITLE,
        config.view_width,
        config.view_height,
        Color::from_rgb_u8(0, 0, 0),
        Scene::default(),
    )?;
    let mut simulation = Simulation::new(config).context("failed to build simulation")?;
    let mut driver = SimulationLoop::from_config(SystemClock::new(), simulation.config());

    let backend = MacroquadBackend::new()
        .with_vsync(true)
        .with_sprite_manifest(sprites);
    backend.run(presentation, move |_dt, input, scene| {
        simulation.extend_intents(input.intents);
        let report = driver.frame(&mut simulation, |simulation, rate| {
            populate_scene(simulation, rate, scene);
        });
        if report.quit {
            info!(ticks = simulation.ticks(), "quit requested");
            FrameControl::Exit
        } else {
            FrameControl::Continue
        }
    })
}

/// Drives the simulation with a manual clock advanced one tick per frame.
///
/// Returns the number of logical updates performed.
fn run_headless(config: Config, frames: u32) -> Result<u64> {
    let mut simulation = Simulation::new(config).context("failed to build simulation")?;
    let clock = ManualClock::new();
    let mut driver = SimulationLoop::from_config(clock.clone(), simulation.config());
    let tick = driver.step().tick();

    let mut scene = Scene::default();
    for _ in 0..frames {
        clock.advance(tick);
        let report = driver.frame(&mut simulation, |simulation, rate| {
            populate_scene(simulation, rate, &mut scene);
        });
        if report.quit {
            break;
        }
    }

    let offset = simulation.viewport().offset();
    info!(
        frames,
        ticks = simulation.ticks(),
        actors = simulation.actors().len(),
        live_cells = simulation.grid().len(),
        offset_x = offset.x,
        offset_y = offset.y,
        "headless run finished"
    );
    Ok(simulation.ticks())
}

/// Rebuilds `scene` from the visible tiles and on-screen actors.
fn populate_scene<S: CellSource>(simulation: &Simulation<S>, rate: Option<f64>, scene: &mut Scene) {
    scene.clear();

    let viewport = simulation.viewport();
    let tile_size = viewport.tile_size();
    let tile_extent = Vec2::new(tile_size.width() as f32, tile_size.height() as f32);
    scene
        .tiles
        .extend(viewport.visible_tiles().iter().map(|tile| TileSprite {
            coord: tile.coord,
            position: Vec2::new(tile.screen.x as f32, tile.screen.y as f32),
            size: tile_extent,
            visual: tile.meta.visual,
        }));

    let view = viewport.view_rect();
    let screen = PixelRect::new(0, 0, view.width, view.height);
    let actors = simulation.actors();
    scene.actors.extend(actors.iter().filter_map(|actor| {
        let footprint = actors.screen_footprint(actor.id())?;
        footprint.intersects(&screen).then(|| ActorSprite {
            id: actor.id(),
            position: Vec2::new(footprint.x as f32, footprint.y as f32),
            size: Vec2::new(footprint.width as f32, footprint.height as f32),
            visual: actor.kind().visual(),
        })
    }));

    if simulation.diagnostics_enabled() {
        let fps = rate.map_or_else(|| "--".to_owned(), |rate| format!("{rate:.1}"));
        scene.diagnostics = Some(format!(
            "FPS: {fps}  ticks: {}  actors: {}  cells: {}",
            simulation.ticks(),
            actors.len(),
            simulation.grid().len()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_explorer_core::{CellMeta, Intent, TileCoord, VisualTag};

    fn quiet_config() -> Config {
        Config {
            initial_mobs: 0,
            mob_spawn_interval: 0,
            ..Config::default()
        }
    }

    fn open_ground(_: TileCoord) -> CellMeta {
        CellMeta::normal()
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "tile-explorer",
            "--seed",
            "9",
            "--columns",
            "12",
            "--rows",
            "8",
            "--mobs",
            "3",
        ]);
        let config = load_config(&args).expect("valid overrides");

        assert_eq!(config.seed, 9);
        assert_eq!(
            config.world,
            WorldShape::Bounded {
                columns: 12,
                rows: 8
            }
        );
        assert_eq!(config.initial_mobs, 3);
        assert_eq!(config.ticks_per_second, 30);
    }

    #[test]
    fn unbounded_conflicts_with_explicit_dimensions() {
        let result =
            Args::try_parse_from(["tile-explorer", "--unbounded", "--columns", "4", "--rows", "4"]);
        assert!(result.is_err());
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let args = Args::parse_from(["tile-explorer", "--ticks-per-second", "0"]);
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn missing_config_file_is_reported() {
        let args = Args::parse_from(["tile-explorer", "--config", "/nonexistent/tile-explorer.toml"]);
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn scene_mirrors_visible_tiles_and_player() {
        let simulation =
            Simulation::with_source(quiet_config(), open_ground).expect("valid config");
        let mut scene = Scene::default();

        populate_scene(&simulation, None, &mut scene);

        assert_eq!(scene.tiles.len(), simulation.viewport().visible_tiles().len());
        assert!(scene.tiles.iter().all(|tile| tile.visual == VisualTag::Normal));
        assert_eq!(scene.actors.len(), 1);
        assert_eq!(scene.actors[0].visual, VisualTag::Player);
        assert_eq!(scene.actors[0].position, Vec2::new(384.0, 288.0));
        assert_eq!(scene.diagnostics, None);
    }

    #[test]
    fn diagnostics_overlay_reports_render_rate() {
        let mut simulation =
            Simulation::with_source(quiet_config(), open_ground).expect("valid config");
        simulation.push_intent(Intent::ToggleDiagnostics);
        simulation.update();
        let mut scene = Scene::default();

        populate_scene(&simulation, Some(59.94), &mut scene);

        let overlay = scene.diagnostics.expect("overlay is enabled");
        assert!(overlay.starts_with("FPS: 59.9"), "{overlay}");
    }

    #[test]
    fn headless_run_performs_one_update_per_frame() {
        let ticks = run_headless(quiet_config(), 12).expect("headless run succeeds");
        assert_eq!(ticks, 12);
    }
}
