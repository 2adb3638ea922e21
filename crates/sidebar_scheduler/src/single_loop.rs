//! # Single-Loop Scheduler
//!
//! Every task runs on one logical thread, in tick order: whoever calls
//! [`SingleLoopScheduler::tick`] (the host's main loop, or a [`Ticker`])
//! runs the due tasks inline.
//!
//! `run_now` is not synchronous: like the host's main-thread scheduler it
//! runs the task on the next tick.
//!
//! [`Ticker`]: crate::tick::Ticker

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{SchedulerError, SchedulerResult};
use crate::handle::{run_isolated, RepeatingTask, Task, TaskHandle};
use crate::port::{SchedulerKind, SchedulerPort};
use crate::queue::TimerQueue;

/// Scheduler for hosts with one global tick loop.
pub struct SingleLoopScheduler {
    timers: TimerQueue,
    closed: AtomicBool,
}

impl SingleLoopScheduler {
    /// Creates an idle scheduler at tick zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timers: TimerQueue::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Advances one tick and runs every due task on the calling thread.
    ///
    /// A panicking task is logged and does not stop the rest of the tick.
    /// Returns the number of tasks run.
    pub fn tick(&self) -> usize {
        let ready = self.timers.advance();
        let count = ready.len();
        for task in ready {
            run_isolated(task);
        }
        count
    }

    /// Number of completed ticks.
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.timers.now()
    }

    /// Number of queued registrations.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.timers.pending()
    }

    /// Stops accepting work and drops everything queued.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        self.timers.clear();
    }

    fn ensure_open(&self) -> SchedulerResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SchedulerError::ShutDown);
        }
        Ok(())
    }
}

impl Default for SingleLoopScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerPort for SingleLoopScheduler {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::SingleLoop
    }

    fn try_run_now(&self, task: Task) -> SchedulerResult<()> {
        self.try_run_after_delay(task, 0)
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

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::thread::{self, ThreadId};

    #[test]
    fn test_run_now_runs_on_next_tick() {
        let scheduler = SingleLoopScheduler::new();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);

        scheduler.run_now(Box::new(move || flag.store(true, Ordering::SeqCst)));
        assert!(!ran.load(Ordering::SeqCst));

        assert_eq!(scheduler.tick(), 1);
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_tasks_run_on_ticking_thread() {
        let scheduler = SingleLoopScheduler::new();
        let seen: Arc<Mutex<Vec<ThreadId>>> = Arc::new(Mutex::new(Vec::new()));

        for _ in 0..3 {
            let seen = Arc::clone(&seen);
            scheduler.run_after_delay(Box::new(move || seen.lock().push(thread::current().id())), 2);
        }
        scheduler.tick();
        scheduler.tick();

        let me = thread::current().id();
        assert_eq!(seen.lock().len(), 3);
        assert!(seen.lock().iter().all(|id| *id == me));
    }

    #[test]
    fn test_repeating_and_cancel() {
        let scheduler = SingleLoopScheduler::new();
        let hits = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&hits);

        let handle = scheduler
            .run_repeating(Arc::new(move || *counter.lock() += 1), 1, 1)
            .unwrap();
        for _ in 0..4 {
            scheduler.tick();
        }
        assert_eq!(*hits.lock(), 4);

        scheduler.cancel(&handle);
        scheduler.cancel(&handle);
        for _ in 0..4 {
            scheduler.tick();
        }
        assert_eq!(*hits.lock(), 4);
    }

    #[test]
    fn test_panicking_task_does_not_stop_the_tick() {
        let scheduler = SingleLoopScheduler::new();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);

        scheduler.run_now(Box::new(|| panic!("renderer exploded")));
        scheduler.run_now(Box::new(move || flag.store(true, Ordering::SeqCst)));

        assert_eq!(scheduler.tick(), 2);
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_shutdown_rejects_and_swallows() {
        let scheduler = SingleLoopScheduler::new();
        scheduler.shutdown();

        assert!(matches!(
            scheduler.try_run_now(Box::new(|| {})),
            Err(SchedulerError::ShutDown)
        ));
        // The logging variants never fail.
        scheduler.run_now(Box::new(|| {}));
        assert!(scheduler.run_repeating(Arc::new(|| {}), 1, 1).is_none());
        assert_eq!(scheduler.pending(), 0);
    }
}
