#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for emitting mob spawn requests.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tile_explorer_core::{MobSpawn, PixelPoint, PixelRect};

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_interval: Duration,
    max_speed: i32,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided spawn cadence, speed
    /// ceiling and seed.
    #[must_use]
    pub const fn new(spawn_interval: Duration, max_speed: i32, rng_seed: u64) -> Self {
        Self {
            spawn_interval,
            max_speed,
            rng_seed,
        }
    }
}

/// Pure system that deterministically emits mob spawn requests.
#[derive(Debug)]
pub struct Spawning {
    spawn_interval: Duration,
    max_speed: i32,
    accumulator: Duration,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            spawn_interval: config.spawn_interval,
            max_speed: config.max_speed,
            accumulator: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Accumulates elapsed time and emits one request per completed interval.
    ///
    /// `area` bounds the upper-left corner of every spawned footprint.
    pub fn handle(&mut self, dt: Duration, area: PixelRect, out: &mut Vec<MobSpawn>) {
        if self.spawn_interval.is_zero() || dt.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        let spawn_attempts = self.resolve_spawn_attempts();
        if area.width <= 0 || area.height <= 0 {
            return;
        }

        for _ in 0..spawn_attempts {
            out.push(self.roll(area));
        }
    }

    /// Emits `count` requests at once, used to populate a fresh world.
    pub fn sprinkle(&mut self, count: usize, area: PixelRect, out: &mut Vec<MobSpawn>) {
        if area.width <= 0 || area.height <= 0 {
            return;
        }
        out.extend((0..count).map(|_| self.roll(area)));
    }

    fn resolve_spawn_attempts(&mut self) -> usize {
        if self.spawn_interval.is_zero() {
            return 0;
        }

        let mut attempts = 0;
        while self.accumulator >= self.spawn_interval {
            self.accumulator -= self.spawn_interval;
            attempts += 1;
        }
        attempts
    }

    fn roll(&mut self, area: PixelRect) -> MobSpawn {
        let location = PixelPoint::new(
            self.rng.gen_range(area.x..area.right()),
            self.rng.gen_range(area.y..area.bottom()),
        );
        let speed = if self.max_speed > 1 {
            self.rng.gen_range(self.max_speed / 2..self.max_speed)
        } else {
            self.max_speed.max(0)
        };
        MobSpawn { location, speed }
    }
}
