//! # Refresh Scheduler
//!
//! Owns the one repeating registration that drives every board refresh.
//! Starting again always cancels first, under the same lock, so no call
//! sequence can leave two registrations alive.

use std::sync::Arc;

use parking_lot::Mutex;
use sidebar_scheduler::{RepeatingTask, SchedulerPort, TaskHandle};
use tracing::{debug, info};

/// The single repeating refresh registration.
pub struct RefreshScheduler {
    scheduler: Arc<dyn SchedulerPort>,
    initial_delay_ticks: u64,
    handle: Mutex<Option<TaskHandle>>,
}

impl RefreshScheduler {
    /// Refresh scheduler that waits `initial_delay_ticks` before the first run.
    #[must_use]
    pub fn new(scheduler: Arc<dyn SchedulerPort>, initial_delay_ticks: u64) -> Self {
        Self {
            scheduler,
            initial_delay_ticks,
            handle: Mutex::new(None),
        }
    }

    /// Registers `task` every `period_ticks`, cancelling any previous
    /// registration first.
    ///
    /// Returns false if the scheduler refused the registration (logged).
    pub fn start(&self, task: RepeatingTask, period_ticks: u64) -> bool {
        let mut slot = self.handle.lock();
        if let Some(previous) = slot.take() {
            self.scheduler.cancel(&previous);
            debug!(task = previous.id(), "cancelled previous refresh task");
        }
        *slot = self
            .scheduler
            .run_repeating(task, self.initial_delay_ticks, period_ticks);
        if let Some(handle) = slot.as_ref() {
            info!(task = handle.id(), period_ticks, "refresh task started");
        }
        slot.is_some()
    }

    /// Re-registers with a possibly changed period.
    pub fn reload(&self, task: RepeatingTask, period_ticks: u64) -> bool {
        debug!(period_ticks, "reloading refresh task");
        self.start(task, period_ticks)
    }

    /// Cancels the registration, returning the cancelled handle.
    pub fn stop(&self) -> Option<TaskHandle> {
        let handle = self.handle.lock().take()?;
        self.scheduler.cancel(&handle);
        Some(handle)
    }

    /// Whether a registration is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// The active registration.
    #[must_use]
    pub fn handle(&self) -> Option<TaskHandle> {
        self.handle.lock().clone()
    }
}
