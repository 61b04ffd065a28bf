//! Clocks, the fixed-step scheduler and the render throughput sampler.

use std::{
    cell::Cell,
    rc::Rc,
    time::{Duration, Instant},
};

/// Monotonic time source measured from an arbitrary origin.
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Wall-clock time measured from construction.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Starts a clock at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock advanced explicitly by its holders.
///
/// Clones share the same time, so a test can keep a handle while the loop
/// owns another.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    /// Creates a clock stopped at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get().saturating_add(by));
    }

    /// Jumps to an absolute time.
    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Fixed-timestep scheduler with a bounded catch-up.
///
/// The scheduled-tick marker only ever moves by one tick per performed
/// update, so logical time falls behind wall-clock time when the catch-up
/// bound is hit rather than skipping ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedStep {
    tick: Duration,
    max_catch_up: u32,
    next_tick: Duration,
}

impl FixedStep {
    /// Creates a scheduler whose first tick is due right after `start`.
    #[must_use]
    pub fn new(ticks_per_second: u32, max_catch_up: u32, start: Duration) -> Self {
        let tick = Duration::from_nanos(1_000_000_000 / u64::from(ticks_per_second.max(1)));
        Self {
            tick,
            max_catch_up: max_catch_up.max(1),
            next_tick: start,
        }
    }

    /// Duration of a single tick.
    #[must_use]
    pub const fn tick(&self) -> Duration {
        self.tick
    }

    /// Most updates performed per render.
    #[must_use]
    pub const fn max_catch_up(&self) -> u32 {
        self.max_catch_up
    }

    /// Time at which the next update is scheduled.
    #[must_use]
    pub const fn next_tick(&self) -> Duration {
        self.next_tick
    }

    /// Reports whether another update is due at `now` after `performed`
    /// updates in the current frame.
    #[must_use]
    pub fn is_due(&self, now: Duration, performed: u32) -> bool {
        performed < self.max_catch_up && now > self.next_tick
    }

    /// Number of updates the next frame would perform at `now`.
    #[must_use]
    pub fn due(&self, now: Duration) -> u32 {
        let mut marker = self.next_tick;
        let mut count = 0;
        while count < self.max_catch_up && now > marker {
            marker += self.tick;
            count += 1;
        }
        count
    }

    /// Records one performed update.
    pub fn advance(&mut self) {
        self.next_tick += self.tick;
    }

    /// How far logical time trails `now`.
    #[must_use]
    pub fn lag(&self, now: Duration) -> Duration {
        now.saturating_sub(self.next_tick)
    }
}

/// Periodically samples how many frames were rendered per second.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThroughputSampler {
    interval: u32,
    ticks: u64,
    renders: u32,
    window_start: Duration,
    rate: Option<f64>,
}

impl ThroughputSampler {
    /// Creates a sampler that reports every `interval` ticks.
    #[must_use]
    pub const fn new(interval: u32, start: Duration) -> Self {
        Self {
            interval,
            ticks: 0,
            renders: 0,
            window_start: start,
            rate: None,
        }
    }

    /// Counts a rendered frame.
    pub fn record_render(&mut self) {
        self.renders = self.renders.saturating_add(1);
    }

    /// Counts a tick and returns a fresh sample on every interval boundary.
    pub fn record_tick(&mut self, now: Duration) -> Option<f64> {
        self.ticks += 1;
        if self.interval == 0 || self.ticks % u64::from(self.interval) != 0 {
            return None;
        }

        let elapsed = now.saturating_sub(self.window_start).as_secs_f64();
        if elapsed > 0.0 {
            self.rate = Some(f64::from(self.renders) / elapsed);
        }
        self.renders = 0;
        self.window_start = now;
        self.rate
    }

    /// Most recent sample.
    #[must_use]
    pub const fn rate(&self) -> Option<f64> {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_counts_whole_elapsed_ticks() {
        let step = FixedStep::new(10, 5, Duration::ZERO);
        assert_eq!(step.due(Duration::ZERO), 0);
        assert_eq!(step.due(Duration::from_millis(1)), 1);
        assert_eq!(step.due(Duration::from_millis(150)), 2);
        assert_eq!(step.due(Duration::from_secs(10)), 5);
    }

    #[test]
    fn advance_moves_by_exactly_one_tick() {
        let mut step = FixedStep::new(30, 5, Duration::from_secs(1));
        step.advance();
        step.advance();
        assert_eq!(step.next_tick(), Duration::from_secs(1) + step.tick() * 2);
        assert_eq!(step.tick(), Duration::from_nanos(33_333_333));
    }

    #[test]
    fn sampler_reports_on_interval_boundaries() {
        let mut sampler = ThroughputSampler::new(10, Duration::ZERO);
        for tick in 1..=9 {
            sampler.record_render();
            assert_eq!(sampler.record_tick(Duration::from_millis(tick * 50)), None);
        }
        sampler.record_render();
        let rate = sampler
            .record_tick(Duration::from_millis(500))
            .expect("tenth tick samples");
        assert!((rate - 20.0).abs() < 1e-9);
        assert_eq!(sampler.rate(), Some(rate));
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance(Duration::from_millis(40));
        assert_eq!(clock.now(), Duration::from_millis(40));
        handle.set(Duration::from_secs(2));
        assert_eq!(clock.now(), Duration::from_secs(2));
    }
}
