//! # Task Handles

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tracing::error;

/// One-shot unit of work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Unit of work run on every period of a repeating registration.
pub type RepeatingTask = Arc<dyn Fn() + Send + Sync + 'static>;

/// Runs `task`, containing a panic so the calling thread keeps serving work.
///
/// Returns false if the task panicked.
pub(crate) fn run_isolated(task: Task) -> bool {
    match catch_unwind(AssertUnwindSafe(task)) {
        Ok(()) => true,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_owned());
            error!(%reason, "scheduled task panicked");
            false
        }
    }
}

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque cancellation handle for a scheduled task.
///
/// Clones share the same cancellation flag. Cancelling is idempotent.
#[derive(Clone, Debug)]
pub struct TaskHandle {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl TaskHandle {
    pub(crate) fn new() -> Self {
        Self {
            id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Unique id of this registration.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Cancels the task.
    ///
    /// Returns `true` if this call performed the cancellation, `false` if
    /// the handle was already cancelled.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::AcqRel)
    }

    /// Returns whether the task has been cancelled.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub(crate) fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }
}

impl PartialEq for TaskHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TaskHandle {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_idempotent() {
        let handle = TaskHandle::new();
        assert!(!handle.is_cancelled());

        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_clones_share_flag() {
        let handle = TaskHandle::new();
        let clone = handle.clone();

        clone.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(handle, clone);
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(TaskHandle::new().id(), TaskHandle::new().id());
    }
}
