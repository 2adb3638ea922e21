//! # Host Tick Loop
//!
//! Fixed-timestep driver running at the host tick rate (20Hz).
//!
//! ## Design
//!
//! The tick loop must:
//! - Run exactly `tick_rate` times per second on average
//! - Catch up after a slow tick, but never more than
//!   [`MAX_CATCH_UP_TICKS`] at once
//! - Record timing statistics for the operator

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use sidebar_shared::TICK_RATE;
use tracing::{debug, warn};

use crate::error::SchedulerResult;

/// Most ticks executed back-to-back before the backlog is dropped.
pub const MAX_CATCH_UP_TICKS: u32 = 10;

/// Fixed-timestep tick loop controller.
///
/// Ensures consistent tick rate regardless of processing time.
pub struct TickLoop {
    /// Target tick duration.
    tick_duration: Duration,
    /// Time of last tick.
    last_tick: Instant,
    /// Accumulated time since last tick.
    accumulator: Duration,
    /// Total ticks executed.
    tick_count: u64,
    /// Frame time statistics.
    stats: TickStats,
}

/// Tick timing statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct TickStats {
    /// Minimum tick duration observed.
    pub min_tick_us: u64,
    /// Maximum tick duration observed.
    pub max_tick_us: u64,
    /// Average tick duration (rolling).
    pub avg_tick_us: u64,
    /// Number of late ticks (took longer than budget).
    pub late_ticks: u64,
    /// Total ticks measured.
    pub total_ticks: u64,
}

impl TickStats {
    fn fresh() -> Self {
        Self {
            min_tick_us: u64::MAX,
            max_tick_us: 0,
            avg_tick_us: 0,
            late_ticks: 0,
            total_ticks: 0,
        }
    }
}

impl TickLoop {
    /// Creates a new tick loop with the specified rate.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        let tick_duration = Duration::from_micros(1_000_000 / u64::from(tick_rate.max(1)));

        Self {
            tick_duration,
            last_tick: Instant::now(),
            accumulator: Duration::ZERO,
            tick_count: 0,
            stats: TickStats::fresh(),
        }
    }

    /// Creates a tick loop at the host rate (20Hz).
    #[must_use]
    pub fn host() -> Self {
        Self::new(TICK_RATE)
    }

    /// Returns true if it's time to execute a tick.
    ///
    /// Call this in a loop until it returns false.
    #[must_use]
    pub fn should_tick(&mut self) -> bool {
        let now = Instant::now();
        self.accumulator += now.duration_since(self.last_tick);
        self.last_tick = now;

        self.accumulator >= self.tick_duration
    }

    /// Marks the start of a tick.
    ///
    /// Returns the tick start time for duration measurement.
    #[must_use]
    pub fn begin_tick(&mut self) -> Instant {
        self.accumulator = self.accumulator.saturating_sub(self.tick_duration);
        self.tick_count += 1;
        Instant::now()
    }

    /// Marks the end of a tick.
    ///
    /// Records statistics about tick duration.
    pub fn end_tick(&mut self, start: Instant) {
        let duration = start.elapsed();
        let duration_us = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        self.stats.total_ticks += 1;
        self.stats.min_tick_us = self.stats.min_tick_us.min(duration_us);
        self.stats.max_tick_us = self.stats.max_tick_us.max(duration_us);

        // Rolling average
        self.stats.avg_tick_us = (self.stats.avg_tick_us * 15 + duration_us) / 16;

        if duration > self.tick_duration {
            self.stats.late_ticks += 1;
        }
    }

    /// Drops accumulated time that could not be caught up.
    pub fn discard_backlog(&mut self) -> Duration {
        std::mem::replace(&mut self.accumulator, Duration::ZERO)
    }

    /// Sleeps until the next tick is due.
    pub fn wait_for_next_tick(&self) {
        let elapsed = self.last_tick.elapsed() + self.accumulator;
        if elapsed < self.tick_duration {
            thread::sleep(self.tick_duration - elapsed);
        }
    }

    /// Returns the current tick count.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Returns tick statistics.
    #[must_use]
    pub const fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Returns the target tick duration.
    #[must_use]
    pub const fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Resets statistics.
    pub fn reset_stats(&mut self) {
        self.stats = TickStats::fresh();
    }
}

impl Default for TickLoop {
    fn default() -> Self {
        Self::host()
    }
}

/// Background thread driving a callback at a fixed tick rate.
///
/// Stopping (explicitly or on drop) joins the thread.
pub struct Ticker {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<TickStats>>,
}

impl Ticker {
    /// Spawns a driver thread calling `on_tick` `tick_rate` times per second.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn<F>(name: &str, tick_rate: u32, on_tick: F) -> SchedulerResult<Self>
    where
        F: Fn() + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let thread = thread::Builder::new().name(name.to_owned()).spawn(move || {
            let mut tick_loop = TickLoop::new(tick_rate);

            while !stop_flag.load(Ordering::Acquire) {
                let mut caught_up = 0;
                while tick_loop.should_tick() {
                    let start = tick_loop.begin_tick();
                    on_tick();
                    tick_loop.end_tick(start);

                    caught_up += 1;
                    if caught_up >= MAX_CATCH_UP_TICKS {
                        let dropped = tick_loop.discard_backlog();
                        warn!(?dropped, "tick loop fell behind, dropping backlog");
                        break;
                    }
                }
                tick_loop.wait_for_next_tick();
            }

            *tick_loop.stats()
        })?;

        debug!(name, tick_rate, "ticker started");
        Ok(Self {
            stop,
            thread: Some(thread),
        })
    }

    /// Stops the driver and returns its timing statistics.
    #[must_use]
    pub fn stop(mut self) -> Option<TickStats> {
        self.halt()
    }

    fn halt(&mut self) -> Option<TickStats> {
        self.stop.store(true, Ordering::Release);
        let thread = self.thread.take()?;
        match thread.join() {
            Ok(stats) => Some(stats),
            Err(_) => {
                warn!("ticker thread panicked");
                None
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        let _ = self.halt();
    }
}
