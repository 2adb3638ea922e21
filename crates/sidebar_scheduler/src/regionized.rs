//! # Regionized Scheduler
//!
//! There is no global thread. A global coordinator (the timer queue, ticked
//! by the host or a [`Ticker`]) hands due work to a pool of region threads
//! through a channel. Work runs concurrently, with no ordering guarantee
//! between tasks, and must not assume exclusive access to any shared state.
//!
//! ```text
//!   run_now ─────────────────────────────┐
//!                                        ▼
//!   run_after_delay ─┐             ┌───────────┐    ┌──────────┐
//!   run_repeating ───┼─► Timer ──► │  channel  │ ─► │ region 0 │
//!                    │   Queue     │ (unbounded│    ├──────────┤
//!           tick() ──┘             │  fan-out) │ ─► │ region 1 │
//!                                  └───────────┘    ├──────────┤
//!                                                   │   ...    │
//!                                                   └──────────┘
//! ```
//!
//! [`Ticker`]: crate::tick::Ticker

use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Sender};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error};

use crate::error::{SchedulerError, SchedulerResult};
use crate::handle::{run_isolated, RepeatingTask, Task, TaskHandle};
use crate::port::{SchedulerKind, SchedulerPort};
use crate::queue::TimerQueue;

/// Scheduler for hosts that run independent regions concurrently.
pub struct RegionizedScheduler {
    /// Global coordinator for delayed and repeating work.
    timers: TimerQueue,
    /// Fan-out channel to region threads. `None` once shut down.
    dispatch: RwLock<Option<Sender<Task>>>,
    /// Region worker threads.
    regions: Mutex<Vec<JoinHandle<()>>>,
    /// Number of region threads started.
    region_count: usize,
}

impl RegionizedScheduler {
    /// Starts `region_count` region threads (at least one).
    ///
    /// A task that panics is logged; its region thread keeps running.
    ///
    /// # Errors
    ///
    /// Returns an error if a region thread cannot be spawned. Threads
    /// already started exit once the channel is dropped.
    pub fn new(region_count: usize) -> SchedulerResult<Self> {
        let region_count = region_count.max(1);
        let (tx, rx) = unbounded::<Task>();

        let mut regions = Vec::with_capacity(region_count);
        for index in 0..region_count {
            let rx = rx.clone();
            let handle = thread::Builder::new()
                .name(format!("sidebar-region-{index}"))
                .spawn(move || {
                    for task in &rx {
                        run_isolated(task);
                    }
                })?;
            regions.push(handle);
        }
        debug!(region_count, "region threads started");

        Ok(Self {
            timers: TimerQueue::new(),
            dispatch: RwLock::new(Some(tx)),
            regions: Mutex::new(regions),
            region_count,
        })
    }

    /// Advances the coordinator one tick and fans due tasks out to regions.
    ///
    /// Returns the number of tasks dispatched.
    pub fn tick(&self) -> usize {
        let mut dispatched = 0;
        for task in self.timers.advance() {
            match self.dispatch(task) {
                Ok(()) => dispatched += 1,
                Err(e) => error!(error = %e, "failed to dispatch due task to region"),
            }
        }
        dispatched
    }

    /// Number of completed coordinator ticks.
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.timers.now()
    }

    /// Number of region threads.
    #[must_use]
    pub const fn region_count(&self) -> usize {
        self.region_count
    }

    /// Closes the fan-out channel, drops queued work and joins the regions.
    ///
    /// Tasks already handed to a region finish first. Idempotent.
    pub fn shutdown(&self) {
        drop(self.dispatch.write().take());
        self.timers.clear();

        let current = thread::current().id();
        let regions = std::mem::take(&mut *self.regions.lock());
        for region in regions {
            if region.thread().id() == current {
                continue;
            }
            if region.join().is_err() {
                error!("region thread panicked");
            }
        }
    }

    fn dispatch(&self, task: Task) -> SchedulerResult<()> {
        let guard = self.dispatch.read();
        let tx = guard.as_ref().ok_or(SchedulerError::ShutDown)?;
        tx.send(task).map_err(|_| SchedulerError::ShutDown)
    }

    fn ensure_open(&self) -> SchedulerResult<()> {
        if self.dispatch.read().is_none() {
            return Err(SchedulerError::ShutDown);
        }
        Ok(())
    }
}

impl Drop for RegionizedScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl SchedulerPort for RegionizedScheduler {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Regionized
    }

    fn try_run_now(&self, task: Task) -> SchedulerResult<()> {
        self.dispatch(task)
    }

    fn try_run_after_delay(&self, task: Task, delay_ticks: u64) -> SchedulerResult<()> {
        self.ensure_open()?;
        self.timers.schedule_once(task, delay_ticks);
        Ok(())
    }

    fn try_run_repeating(
        &self,
        task: RepeatingTask,
        initial_delay_ticks: u64,
        period_ticks: u64,
    ) -> SchedulerResult<TaskHandle> {
        self.ensure_open()?;
        Ok(self.timers.schedule_repeating(task, initial_delay_ticks, period_ticks))
    }
}
