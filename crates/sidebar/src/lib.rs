//! # Sidebar
//!
//! Per-entity sidebar boards, refreshed from a priority-resolved
//! configuration, on either host threading model.
//!
//! ## Architecture
//!
//! ```text
//!   host events ──► BoardLifecycle ──┐
//!   host commands ► BoardCommand ────┼──► EntityBoardRegistry ──► Renderer
//!                   ConfigReloader ──┘        │        ▲
//!                                             │        └── PlaceholderResolver
//!                                             ▼
//!                                       ConfigResolver
//!
//!   RefreshScheduler ── run_repeating ──► registry.update_all()
//! ```
//!
//! ## Failure Model
//!
//! Board operations never fail from the caller's point of view. Renderer
//! and placeholder errors are logged for the entity concerned; the next
//! refresh cycle is the retry. Only [`Sidebar::start`] and
//! [`ConfigReloader::reload`] return errors.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod app;
pub mod command;
pub mod directory;
pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod placeholder;
pub mod refresh;
pub mod registry;
pub mod reload;
pub mod render;

pub use app::{Sidebar, SidebarSetup};
pub use command::{BoardCommand, CommandOutcome, CommandSender, ConsoleSender, EntitySender};
pub use directory::{EntityDirectory, OnlineEntities};
pub use error::{PlaceholderError, RenderError, SidebarError, SidebarResult};
pub use lifecycle::BoardLifecycle;
pub use memory::{MemoryRenderer, SurfaceSnapshot};
pub use placeholder::{BuiltinPlaceholders, PlaceholderResolver};
pub use refresh::RefreshScheduler;
pub use registry::{BoardCollaborators, EntityBoardRegistry};
pub use reload::{ConfigReloader, ReloadSummary};
pub use render::{
    Capabilities, DisplaySurface, LineLengthPolicy, Renderer, SurfaceOptions, LEGACY_LINE_LIMIT,
    LEGACY_TITLE_LIMIT, MAX_LINES,
};
