//! # Sidebar Error Types
//!
//! Collaborator failures ([`RenderError`], [`PlaceholderError`]) are logged
//! at the point of use and never leave the registry. [`SidebarError`] is
//! only returned from bootstrap and explicit reload.

use sidebar_config::ConfigError;
use sidebar_scheduler::SchedulerError;
use thiserror::Error;

/// Failures reported by a renderer or one of its surfaces.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The text cannot be displayed as given (length, format).
    #[error("malformed text: {0}")]
    MalformedText(String),

    /// The surface was already destroyed.
    #[error("display surface is gone")]
    SurfaceGone,

    /// Any other backend failure.
    #[error("renderer failure: {0}")]
    Backend(String),
}

impl RenderError {
    /// True for failures caused by configured text.
    #[inline]
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(self, Self::MalformedText(_))
    }
}

/// Failure of the placeholder resolver on one line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderError {
    /// Substitution failed; the line is shown unsubstituted.
    #[error("placeholder substitution failed for {text:?}: {reason}")]
    Failed {
        /// Line that was being substituted.
        text: String,
        /// Resolver-provided reason.
        reason: String,
    },
}

/// Errors surfaced by bootstrap and reload.
#[derive(Error, Debug)]
pub enum SidebarError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Scheduler could not be started.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Result type for bootstrap and reload.
pub type SidebarResult<T> = Result<T, SidebarError>;
