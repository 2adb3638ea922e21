//! # Timer Queue
//!
//! Tick-ordered min-heap shared by both backends. The single-loop backend
//! runs what [`TimerQueue::advance`] returns inline; the regionized backend
//! hands it to region threads.
//!
//! Entries due on the same tick pop in submission order.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::handle::{RepeatingTask, Task, TaskHandle};

enum Job {
    Once(Task),
    Repeating { task: RepeatingTask, period: u64 },
}

struct Entry {
    due: u64,
    seq: u64,
    cancelled: Arc<AtomicBool>,
    job: Job,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed: BinaryHeap is a max-heap, we want the earliest entry on top.
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other.due.cmp(&self.due).then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Pending one-shot and repeating work keyed by due tick.
pub(crate) struct TimerQueue {
    heap: Mutex<BinaryHeap<Entry>>,
    now: AtomicU64,
    next_seq: AtomicU64,
}

impl TimerQueue {
    pub(crate) fn new() -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
            now: AtomicU64::new(0),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Current tick (number of completed `advance` calls).
    pub(crate) fn now(&self) -> u64 {
        self.now.load(Ordering::Acquire)
    }

    /// Number of entries still queued, cancelled ones included.
    pub(crate) fn pending(&self) -> usize {
        self.heap.lock().len()
    }

    /// Queues a one-shot task. A delay of zero means "next tick".
    pub(crate) fn schedule_once(&self, task: Task, delay_ticks: u64) -> TaskHandle {
        let handle = TaskHandle::new();
        self.push(delay_ticks, handle.flag(), Job::Once(task));
        handle
    }

    /// Queues a repeating task. Both delays are clamped to one tick.
    pub(crate) fn schedule_repeating(
        &self,
        task: RepeatingTask,
        initial_delay_ticks: u64,
        period_ticks: u64,
    ) -> TaskHandle {
        let handle = TaskHandle::new();
        let period = period_ticks.max(1);
        self.push(initial_delay_ticks, handle.flag(), Job::Repeating { task, period });
        handle
    }

    /// Advances time by one tick and returns every task now due.
    ///
    /// Repeating entries are re-queued for their next period before being
    /// returned. Cancelled entries are dropped. Returned tasks re-check
    /// cancellation right before they run.
    pub(crate) fn advance(&self) -> Vec<Task> {
        let tick = self.now.fetch_add(1, Ordering::AcqRel) + 1;
        let mut ready: Vec<Task> = Vec::new();
        let mut heap = self.heap.lock();

        while heap.peek().is_some_and(|entry| entry.due <= tick) {
            let Some(Entry { cancelled, job, .. }) = heap.pop() else {
                break;
            };
            if cancelled.load(Ordering::Acquire) {
                continue;
            }

            match job {
                Job::Once(task) => {
                    ready.push(guarded(cancelled, task));
                }
                Job::Repeating { task, period } => {
                    let run = Arc::clone(&task);
                    let flag = Arc::clone(&cancelled);
                    ready.push(Box::new(move || {
                        if !flag.load(Ordering::Acquire) {
                            run();
                        }
                    }));
                    heap.push(Entry {
                        due: tick + period,
                        seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                        cancelled,
                        job: Job::Repeating { task, period },
                    });
                }
            }
        }

        ready
    }

    /// Drops every queued entry.
    pub(crate) fn clear(&self) {
        self.heap.lock().clear();
    }

    fn push(&self, delay_ticks: u64, cancelled: Arc<AtomicBool>, job: Job) {
        let due = self.now() + delay_ticks.max(1);
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.heap.lock().push(Entry { due, seq, cancelled, job });
    }
}

fn guarded(cancelled: Arc<AtomicBool>, task: Task) -> Task {
    Box::new(move || {
        if !cancelled.load(Ordering::Acquire) {
            task();
        }
    })
}
