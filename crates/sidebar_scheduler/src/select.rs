//! # Backend Selection
//!
//! Exactly one backend is chosen at process start by probing for the
//! regionized runtime. The choice lives in the [`Scheduler`] variant and
//! cannot change afterwards.

use std::env;
use std::sync::Arc;

use tracing::info;

use crate::error::SchedulerResult;
use crate::handle::{RepeatingTask, Task, TaskHandle};
use crate::port::{SchedulerKind, SchedulerPort};
use crate::regionized::RegionizedScheduler;
use crate::single_loop::SingleLoopScheduler;
use crate::tick::Ticker;

/// Environment variable announcing the regionized runtime.
///
/// Its presence selects the regionized backend; a positive integer value
/// sets the number of region threads.
pub const REGIONIZED_RUNTIME_ENV: &str = "SIDEBAR_REGIONIZED_RUNTIME";

/// Region threads started when the probe does not specify a count.
pub const DEFAULT_REGION_THREADS: usize = 4;

/// Result of probing the host runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuntimeProbe {
    kind: SchedulerKind,
    region_threads: usize,
}

impl RuntimeProbe {
    /// Probes the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_value(env::var(REGIONIZED_RUNTIME_ENV).ok().as_deref())
    }

    /// Interprets a raw probe value (`None` = runtime absent).
    #[must_use]
    pub fn from_value(value: Option<&str>) -> Self {
        match value {
            None => Self::single_loop(),
            Some(raw) => Self::regionized(
                raw.trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .unwrap_or(DEFAULT_REGION_THREADS),
            ),
        }
    }

    /// A probe that found no regionized runtime.
    #[must_use]
    pub const fn single_loop() -> Self {
        Self {
            kind: SchedulerKind::SingleLoop,
            region_threads: 0,
        }
    }

    /// A probe that found the regionized runtime.
    #[must_use]
    pub const fn regionized(region_threads: usize) -> Self {
        Self {
            kind: SchedulerKind::Regionized,
            region_threads,
        }
    }

    /// Backend this probe selects.
    #[must_use]
    pub const fn kind(&self) -> SchedulerKind {
        self.kind
    }

    /// Region threads to start (zero for single-loop).
    #[must_use]
    pub const fn region_threads(&self) -> usize {
        self.region_threads
    }
}

/// The scheduler backend chosen for this process.
pub enum Scheduler {
    /// One global tick loop.
    SingleLoop(SingleLoopScheduler),
    /// Concurrent region threads behind a global coordinator.
    Regionized(RegionizedScheduler),
}

impl Scheduler {
    /// Builds the backend the probe selects.
    ///
    /// # Errors
    ///
    /// Returns an error if region threads cannot be spawned.
    pub fn select(probe: &RuntimeProbe) -> SchedulerResult<Self> {
        let scheduler = match probe.kind() {
            SchedulerKind::SingleLoop => Self::SingleLoop(SingleLoopScheduler::new()),
            SchedulerKind::Regionized => {
                Self::Regionized(RegionizedScheduler::new(probe.region_threads())?)
            }
        };
        info!(scheduler = %scheduler.kind(), "scheduler selected");
        Ok(scheduler)
    }

    /// Advances one tick. See the backend `tick` methods.
    pub fn tick(&self) -> usize {
        match self {
            Self::SingleLoop(s) => s.tick(),
            Self::Regionized(s) => s.tick(),
        }
    }

    /// Number of completed ticks.
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        match self {
            Self::SingleLoop(s) => s.current_tick(),
            Self::Regionized(s) => s.current_tick(),
        }
    }

    /// Stops accepting work.
    pub fn shutdown(&self) {
        match self {
            Self::SingleLoop(s) => s.shutdown(),
            Self::Regionized(s) => s.shutdown(),
        }
    }

    /// Drives this scheduler from a background thread at `tick_rate`.
    ///
    /// The ticker holds a weak reference and idles once the scheduler is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver thread cannot be spawned.
    pub fn start_ticker(self: &Arc<Self>, tick_rate: u32) -> SchedulerResult<Ticker> {
        let weak = Arc::downgrade(self);
        Ticker::spawn("sidebar-ticker", tick_rate, move || {
            if let Some(scheduler) = weak.upgrade() {
                scheduler.tick();
            }
        })
    }
}

impl SchedulerPort for Scheduler {
    fn kind(&self) -> SchedulerKind {
        match self {
            Self::SingleLoop(_) => SchedulerKind::SingleLoop,
            Self::Regionized(_) => SchedulerKind::Regionized,
        }
    }

    fn try_run_now(&self, task: Task) -> SchedulerResult<()> {
        match self {
            Self::SingleLoop(s) => s.try_run_now(task),
            Self::Regionized(s) => s.try_run_now(task),
        }
    }

    fn try_run_after_delay(&self, task: Task, delay_ticks: u64) -> SchedulerResult<()> {
        match self {
            Self::SingleLoop(s) => s.try_run_after_delay(task, delay_ticks),
            Self::Regionized(s) => s.try_run_after_delay(task, delay_ticks),
        }
    }

    fn try_run_repeating(
        &self,
        task: RepeatingTask,
        initial_delay_ticks: u64,
        period_ticks: u64,
    ) -> SchedulerResult<TaskHandle> {
        match self {
            Self::SingleLoop(s) => s.try_run_repeating(task, initial_delay_ticks, period_ticks),
            Self::Regionized(s) => s.try_run_repeating(task, initial_delay_ticks, period_ticks),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_probe_absent_selects_single_loop() {
        let probe = RuntimeProbe::from_value(None);
        assert_eq!(probe.kind(), SchedulerKind::SingleLoop);
        assert_eq!(probe.region_threads(), 0);
    }

    #[test]
    fn test_probe_value_sets_region_threads() {
        assert_eq!(RuntimeProbe::from_value(Some("8")).region_threads(), 8);
        assert_eq!(RuntimeProbe::from_value(Some("")).region_threads(), DEFAULT_REGION_THREADS);
        assert_eq!(RuntimeProbe::from_value(Some("0")).region_threads(), DEFAULT_REGION_THREADS);
        assert_eq!(RuntimeProbe::from_value(Some("yes")).kind(), SchedulerKind::Regionized);
    }

    #[test]
    fn test_select_builds_matching_variant() {
        let single = Scheduler::select(&RuntimeProbe::single_loop()).unwrap();
        assert!(matches!(single, Scheduler::SingleLoop(_)));
        assert_eq!(single.kind(), SchedulerKind::SingleLoop);

        let regionized = Scheduler::select(&RuntimeProbe::regionized(2)).unwrap();
        assert!(matches!(regionized, Scheduler::Regionized(_)));
        assert_eq!(regionized.kind(), SchedulerKind::Regionized);
        regionized.shutdown();
    }

    #[test]
    fn test_port_is_object_safe() {
        let scheduler: Arc<dyn SchedulerPort> =
            Arc::new(Scheduler::select(&RuntimeProbe::single_loop()).unwrap());
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);

        scheduler.run_after_delay(Box::new(move || flag.store(true, Ordering::SeqCst)), 1);
        assert_eq!(scheduler.kind(), SchedulerKind::SingleLoop);
        assert!(!ran.load(Ordering::SeqCst));
    }
}
