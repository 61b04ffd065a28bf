#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Owning simulation context and the fixed-timestep loop that drives it.
//!
//! [`Simulation`] holds every piece of mutable state: the grid, the viewport,
//! the actor roster, the spawner and the queue of pending intents. Adapters
//! push intents into the queue and hand the simulation to a
//! [`SimulationLoop`], which runs as many logical updates as the clock allows
//! (never more than the configured frame skip) before rendering once.

mod config;
mod timing;

use std::{collections::VecDeque, time::Duration};

use tile_explorer_core::{Intent, MobSpawn, PixelRect};
use tile_explorer_system_motion::{start_location, Actors, ProbeOutcome};
use tile_explorer_system_spawning::{Config as SpawnConfig, Spawning};
use tile_explorer_world::{CellSource, GridBounds, TerrainClassifier, Viewport, WorldGrid};
use tracing::{debug, info, warn};

pub use config::{Config, SimulationError, WorldShape};
pub use timing::{Clock, FixedStep, ManualClock, SystemClock, ThroughputSampler};

const SPAWN_SEED_SALT: u64 = 0x6d6f_6273_7061_776e;
const CLIP_WARNING_INTERVAL: Duration = Duration::from_secs(1);

/// Single owner of all mutable simulation state.
#[derive(Debug)]
pub struct Simulation<S = TerrainClassifier> {
    config: Config,
    grid: WorldGrid<S>,
    viewport: Viewport,
    actors: Actors,
    spawning: Spawning,
    tick: Duration,
    pending: VecDeque<Intent>,
    spawn_buffer: Vec<MobSpawn>,
    diagnostics: bool,
    quit: bool,
    ticks: u64,
}

impl Simulation {
    /// Creates a simulation over noise-generated terrain.
    pub fn new(config: Config) -> Result<Self, SimulationError> {
        let classifier = TerrainClassifier::new(config.seed, config.terrain);
        Self::with_source(config, classifier)
    }
}

impl<S: CellSource> Simulation<S> {
    /// Creates a simulation whose cells are initialised by `source`.
    ///
    /// The player starts on the open tile nearest the centre of the initial
    /// view and the configured number of mobs is sprinkled over the world.
    pub fn with_source(config: Config, source: S) -> Result<Self, SimulationError> {
        config.validate()?;

        let grid = match config.world {
            WorldShape::Unbounded => WorldGrid::unbounded(source),
            WorldShape::Bounded { columns, rows } => {
                WorldGrid::bounded(source, GridBounds::new(columns, rows))
            }
        };
        let mut grid = grid.with_cell_capacity(config.cell_capacity);
        let mut viewport = Viewport::new(&mut grid, config.view_rect(), config.tile_size())?;

        let seed = u64::from(config.seed);
        let mut actors = Actors::new(config.motion, seed);
        viewport.add_change_listener(actors.view_listener());
        let _ = actors.spawn_player(start_location(&viewport), &viewport);

        let tick = FixedStep::new(config.ticks_per_second, config.max_frame_skip, Duration::ZERO)
            .tick();
        let spawning = Spawning::new(SpawnConfig::new(
            tick * config.mob_spawn_interval,
            config.mob_max_speed,
            seed ^ SPAWN_SEED_SALT,
        ));

        let mut simulation = Self {
            config,
            grid,
            viewport,
            actors,
            spawning,
            tick,
            pending: VecDeque::new(),
            spawn_buffer: Vec::new(),
            diagnostics: false,
            quit: false,
            ticks: 0,
        };
        simulation.sprinkle_mobs();
        info!(
            seed = simulation.config.seed,
            mobs = simulation.actors.len() - 1,
            "simulation ready"
        );
        Ok(simulation)
    }

    /// Configuration the simulation was built from.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The world grid.
    #[must_use]
    pub const fn grid(&self) -> &WorldGrid<S> {
        &self.grid
    }

    /// The viewport and its visible tiles.
    #[must_use]
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// The actor roster.
    #[must_use]
    pub const fn actors(&self) -> &Actors {
        &self.actors
    }

    /// Whether the diagnostic overlay is on.
    #[must_use]
    pub const fn diagnostics_enabled(&self) -> bool {
        self.diagnostics
    }

    /// Whether a quit intent has been processed.
    #[must_use]
    pub const fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Logical updates performed so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Number of intents waiting for the next update.
    #[must_use]
    pub fn pending_intents(&self) -> usize {
        self.pending.len()
    }

    /// Queues an intent for the next logical update.
    pub fn push_intent(&mut self, intent: Intent) {
        self.pending.push_back(intent);
    }

    /// Queues intents for the next logical update, preserving their order.
    pub fn extend_intents<I>(&mut self, intents: I)
    where
        I: IntoIterator<Item = Intent>,
    {
        self.pending.extend(intents);
    }

    /// Runs one logical update.
    ///
    /// Pending intents are drained and applied in order, then every actor
    /// moves, the view follows the player and the population is topped up
    /// and capped.
    pub fn update(&mut self) {
        self.ticks += 1;

        while let Some(intent) = self.pending.pop_front() {
            self.apply(intent);
            if self.quit {
                self.pending.clear();
                return;
            }
        }

        let report = self.actors.update(&self.viewport);
        if report.player_moving {
            self.follow_player();
        }

        self.spawn_periodic();
        let _ = self.actors.enforce_mob_cap(self.config.mob_cap);
        let _ = self.actors.enforce_obstacle_cap(self.config.obstacle_cap);
    }

    fn apply(&mut self, intent: Intent) {
        match intent {
            Intent::MoveStarted { direction } => self.actors.press(direction),
            Intent::MoveStopped { direction } => self.actors.release(direction),
            Intent::Probe { direction } => {
                match self
                    .actors
                    .probe(direction, &mut self.grid, &mut self.viewport)
                {
                    Ok(ProbeOutcome::NoPlayer) => {}
                    Ok(outcome) => debug!(?outcome, "probe resolved"),
                    Err(error) => warn!(%error, "probe rejected"),
                }
            }
            Intent::ToggleDiagnostics => self.diagnostics = !self.diagnostics,
            Intent::Quit => self.quit = true,
        }
    }

    fn follow_player(&mut self) {
        let Some(screen) = self
            .actors
            .player()
            .and_then(|player| self.actors.screen_footprint(player.id()))
        else {
            return;
        };

        let view = self.viewport.view_rect();
        let world = self.viewport.world_rect();
        let tile_size = self.viewport.tile_size();
        let margin = self.config.scroll_margin;
        let step_x = tile_size.width() as i32 * self.config.scroll_columns;
        let step_y = tile_size.height() as i32 * self.config.scroll_rows;

        let mut dx = 0;
        let mut dy = 0;
        if screen.right() > view.width - margin && world.map_or(true, |w| view.right() < w.right())
        {
            dx += step_x;
        }
        if screen.bottom() > view.height - margin
            && world.map_or(true, |w| view.bottom() < w.bottom())
        {
            dy += step_y;
        }
        if screen.x < margin && world.map_or(true, |w| view.x > w.x) {
            dx -= step_x;
        }
        if screen.y < margin && world.map_or(true, |w| view.y > w.y) {
            dy -= step_y;
        }

        if dx != 0 || dy != 0 {
            let offset = self.viewport.move_by(&mut self.grid, dx, dy);
            debug!(x = offset.x, y = offset.y, "view follows player");
        }
    }

    fn sprinkle_mobs(&mut self) {
        let area = self.spawn_area();
        self.spawning
            .sprinkle(self.config.initial_mobs, area, &mut self.spawn_buffer);
        self.drain_spawns();
    }

    fn spawn_periodic(&mut self) {
        if self.config.mob_spawn_interval == 0 {
            return;
        }
        let area = self.spawn_area();
        self.spawning.handle(self.tick, area, &mut self.spawn_buffer);
        self.drain_spawns();
    }

    fn drain_spawns(&mut self) {
        for spawn in self.spawn_buffer.drain(..) {
            let _ = self.actors.spawn_mob(spawn, &mut self.grid, &self.viewport);
        }
    }

    /// Rectangle of valid upper-left corners for new mobs.
    fn spawn_area(&self) -> PixelRect {
        let region = self
            .viewport
            .world_rect()
            .unwrap_or_else(|| self.viewport.view_rect());
        let tile_size = self.viewport.tile_size();
        PixelRect::new(
            region.x,
            region.y,
            region.width - tile_size.width() as i32 + 1,
            region.height - tile_size.height() as i32 + 1,
        )
    }
}

/// Outcome of a single render-loop iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Logical updates performed before rendering.
    pub updates: u32,
    /// Whether the render callback ran.
    pub rendered: bool,
    /// Whether the simulation asked to stop.
    pub quit: bool,
}

/// Fixed-timestep driver pairing a clock with a [`FixedStep`] scheduler.
#[derive(Debug)]
pub struct SimulationLoop<C> {
    clock: C,
    step: FixedStep,
    sampler: ThroughputSampler,
    last_clip_warning: Option<Duration>,
    suppressed_clips: u32,
}

impl<C: Clock> SimulationLoop<C> {
    /// Creates a loop whose first tick is due immediately after the clock's
    /// current time.
    #[must_use]
    pub fn new(clock: C, ticks_per_second: u32, max_frame_skip: u32, sample_every: u32) -> Self {
        let start = clock.now();
        Self {
            step: FixedStep::new(ticks_per_second, max_frame_skip, start),
            sampler: ThroughputSampler::new(sample_every, start),
            clock,
            last_clip_warning: None,
            suppressed_clips: 0,
        }
    }

    /// Creates a loop using the cadence stored in `config`.
    #[must_use]
    pub fn from_config(clock: C, config: &Config) -> Self {
        Self::new(
            clock,
            config.ticks_per_second,
            config.max_frame_skip,
            config.diagnostics_interval,
        )
    }

    /// The scheduler.
    #[must_use]
    pub const fn step(&self) -> &FixedStep {
        &self.step
    }

    /// The clock driving the loop.
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Most recent render throughput sample, in frames per second.
    #[must_use]
    pub const fn render_rate(&self) -> Option<f64> {
        self.sampler.rate()
    }

    /// Clipped frames not yet reported because a warning went out less than
    /// a second earlier.
    #[must_use]
    pub const fn suppressed_clips(&self) -> u32 {
        self.suppressed_clips
    }

    /// Runs every due update, capped by the frame skip, then renders once.
    ///
    /// `render` receives the settled simulation and the latest throughput
    /// sample. It is skipped when an update processed a quit intent.
    pub fn frame<S, R>(&mut self, simulation: &mut Simulation<S>, render: R) -> FrameReport
    where
        S: CellSource,
        R: FnOnce(&Simulation<S>, Option<f64>),
    {
        let mut updates = 0;
        while self.step.is_due(self.clock.now(), updates) {
            simulation.update();
            self.step.advance();
            updates += 1;
            let _ = self.sampler.record_tick(self.clock.now());

            if simulation.quit_requested() {
                return FrameReport {
                    updates,
                    rendered: false,
                    quit: true,
                };
            }
        }

        let now = self.clock.now();
        if updates == self.step.max_catch_up() && now > self.step.next_tick() {
            self.report_clip(now);
        }

        render(simulation, self.sampler.rate());
        self.sampler.record_render();
        FrameReport {
            updates,
            rendered: true,
            quit: false,
        }
    }

    /// Warns about a clipped frame at most once per [`CLIP_WARNING_INTERVAL`].
    fn report_clip(&mut self, now: Duration) {
        let due = self
            .last_clip_warning
            .map_or(true, |last| now.saturating_sub(last) >= CLIP_WARNING_INTERVAL);
        if !due {
            self.suppressed_clips = self.suppressed_clips.saturating_add(1);
            return;
        }

        warn!(
            lag_ms = self.step.lag(now).as_millis() as u64,
            suppressed = self.suppressed_clips,
            "frame skip limit reached; logical time is falling behind"
        );
        self.last_clip_warning = Some(now);
        self.suppressed_clips = 0;
    }
}
