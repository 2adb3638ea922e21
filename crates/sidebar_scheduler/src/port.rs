//! # Scheduler Port
//!
//! The capability interface every backend implements.
//!
//! ## Contract
//!
//! - `run_now`: execute as soon as the backend permits, never blocking the
//!   caller
//! - `run_after_delay`: one-shot execution after a tick delay
//! - `run_repeating`: recurring execution, returns a cancellation handle
//! - `cancel`: idempotent, unknown or cancelled handles are a no-op
//!
//! Backends implement the fallible `try_*` methods. The plain methods are
//! provided here: they log a failure at error level and swallow it, because
//! board refresh is best-effort.

use std::fmt;

use tracing::error;

use crate::error::SchedulerResult;
use crate::handle::{RepeatingTask, Task, TaskHandle};

/// Which threading model a scheduler implements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchedulerKind {
    /// Every task runs on one logical thread in tick order.
    SingleLoop,
    /// Tasks fan out to independent region threads with no ordering
    /// guarantee between them.
    Regionized,
}

impl SchedulerKind {
    /// Returns true for the regionized model.
    #[inline]
    #[must_use]
    pub const fn is_regionized(self) -> bool {
        matches!(self, Self::Regionized)
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleLoop => f.write_str("single-loop"),
            Self::Regionized => f.write_str("regionized"),
        }
    }
}

/// Run-now / run-later / run-repeating / cancel over host ticks.
pub trait SchedulerPort: Send + Sync {
    /// The threading model behind this port.
    fn kind(&self) -> SchedulerKind;

    /// Submits `task` for execution as soon as possible.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend no longer accepts work.
    fn try_run_now(&self, task: Task) -> SchedulerResult<()>;

    /// Submits `task` for one-shot execution after `delay_ticks`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend no longer accepts work.
    fn try_run_after_delay(&self, task: Task, delay_ticks: u64) -> SchedulerResult<()>;

    /// Registers `task` to run every `period_ticks` after `initial_delay_ticks`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend no longer accepts work.
    fn try_run_repeating(
        &self,
        task: RepeatingTask,
        initial_delay_ticks: u64,
        period_ticks: u64,
    ) -> SchedulerResult<TaskHandle>;

    /// Cancels a registration. Never fails.
    fn cancel(&self, handle: &TaskHandle) {
        handle.cancel();
    }

    /// Like [`try_run_now`](Self::try_run_now), logging failures.
    fn run_now(&self, task: Task) {
        if let Err(e) = self.try_run_now(task) {
            error!(scheduler = %self.kind(), error = %e, "failed to execute task");
        }
    }

    /// Like [`try_run_after_delay`](Self::try_run_after_delay), logging failures.
    fn run_after_delay(&self, task: Task, delay_ticks: u64) {
        if let Err(e) = self.try_run_after_delay(task, delay_ticks) {
            error!(scheduler = %self.kind(), delay_ticks, error = %e, "failed to execute delayed task");
        }
    }

    /// Like [`try_run_repeating`](Self::try_run_repeating), logging failures.
    ///
    /// Returns `None` when the registration failed.
    fn run_repeating(
        &self,
        task: RepeatingTask,
        initial_delay_ticks: u64,
        period_ticks: u64,
    ) -> Option<TaskHandle> {
        match self.try_run_repeating(task, initial_delay_ticks, period_ticks) {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!(
                    scheduler = %self.kind(),
                    period_ticks,
                    error = %e,
                    "failed to execute repeating task"
                );
                None
            }
        }
    }
}
