//! # Sidebar Scheduler
//!
//! Lets identical business logic run under two incompatible host threading
//! models.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!                 │        SchedulerPort         │
//!                 │ run_now / run_after_delay /  │
//!                 │ run_repeating / cancel       │
//!                 └──────────────┬───────────────┘
//!                                │ (chosen once by RuntimeProbe)
//!              ┌─────────────────┴─────────────────┐
//!              ▼                                   ▼
//!   ┌─────────────────────┐            ┌───────────────────────┐
//!   │ SingleLoopScheduler │            │  RegionizedScheduler  │
//!   │  TimerQueue         │            │  TimerQueue (global)  │
//!   │  runs due tasks     │            │  fans due tasks out   │
//!   │  inline on tick()   │            │  to region threads    │
//!   └─────────────────────┘            └───────────────────────┘
//! ```
//!
//! ## Failure Model
//!
//! Scheduling is best-effort. The `try_*` methods return
//! [`SchedulerResult`]; the plain methods log failures with `tracing` and
//! swallow them.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod handle;
pub mod port;
mod queue;
pub mod regionized;
pub mod select;
pub mod single_loop;
pub mod tick;

pub use error::{SchedulerError, SchedulerResult};
pub use handle::{RepeatingTask, Task, TaskHandle};
pub use port::{SchedulerKind, SchedulerPort};
pub use regionized::RegionizedScheduler;
pub use select::{RuntimeProbe, Scheduler, DEFAULT_REGION_THREADS, REGIONIZED_RUNTIME_ENV};
pub use single_loop::SingleLoopScheduler;
pub use tick::{TickLoop, TickStats, Ticker};
