//! # Rendering Collaborator
//!
//! The engine never draws anything itself. A [`Renderer`] creates one
//! [`DisplaySurface`] per entity; the surface accepts a title and an
//! ordered list of lines, each pushed as a whole unit.
//!
//! ## Line Length
//!
//! Legacy clients cap title and line length. Whether the cap applies is
//! decided once per surface, at creation, from the host [`Capabilities`]:
//!
//! ```text
//! legacy protocol bridge present  -> Unconstrained
//! else RGB-capable host           -> Unconstrained
//! else                            -> Constrained
//! ```

use sidebar_shared::EntityId;

use crate::error::RenderError;

/// Longest title a constrained surface accepts, in characters.
pub const LEGACY_TITLE_LIMIT: usize = 32;

/// Longest line a constrained surface accepts, in characters.
pub const LEGACY_LINE_LIMIT: usize = 30;

/// Most lines a sidebar can show.
pub const MAX_LINES: usize = 15;

/// Whether a surface enforces legacy length limits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LineLengthPolicy {
    /// Legacy limits apply.
    Constrained,
    /// No per-line limit.
    #[default]
    Unconstrained,
}

impl LineLengthPolicy {
    /// True when legacy limits apply.
    #[inline]
    #[must_use]
    pub const fn is_constrained(self) -> bool {
        matches!(self, Self::Constrained)
    }
}

/// Optional host features detected at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// A placeholder resolver is installed.
    pub placeholders: bool,
    /// A protocol bridge for legacy clients is installed.
    pub legacy_bridge: bool,
    /// The host supports RGB colors.
    pub rgb: bool,
}

impl Capabilities {
    /// Line-length policy for surfaces created under these capabilities.
    #[must_use]
    pub const fn line_policy(self) -> LineLengthPolicy {
        if self.legacy_bridge || self.rgb {
            LineLengthPolicy::Unconstrained
        } else {
            LineLengthPolicy::Constrained
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            placeholders: false,
            legacy_bridge: false,
            rgb: true,
        }
    }
}

/// Options fixed when a surface is created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SurfaceOptions {
    /// Length policy for title and lines.
    pub line_length: LineLengthPolicy,
}

impl From<Capabilities> for SurfaceOptions {
    fn from(caps: Capabilities) -> Self {
        Self {
            line_length: caps.line_policy(),
        }
    }
}

impl SurfaceOptions {
    /// Checks a title against this surface's limits.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::MalformedText`] if the title is too long.
    pub fn check_title(&self, title: &str) -> Result<(), RenderError> {
        let len = title.chars().count();
        if self.line_length.is_constrained() && len > LEGACY_TITLE_LIMIT {
            return Err(RenderError::MalformedText(format!(
                "title is {len} characters, legacy clients allow {LEGACY_TITLE_LIMIT}"
            )));
        }
        Ok(())
    }

    /// Checks a full set of lines against this surface's limits.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::MalformedText`] if there are too many lines or
    /// a line is too long.
    pub fn check_lines(&self, lines: &[String]) -> Result<(), RenderError> {
        if lines.len() > MAX_LINES {
            return Err(RenderError::MalformedText(format!(
                "{} lines given, a sidebar shows at most {MAX_LINES}",
                lines.len()
            )));
        }
        if self.line_length.is_constrained() {
            if let Some((index, line)) = lines
                .iter()
                .enumerate()
                .find(|(_, line)| line.chars().count() > LEGACY_LINE_LIMIT)
            {
                return Err(RenderError::MalformedText(format!(
                    "line {} ({line:?}) is longer than {LEGACY_LINE_LIMIT} characters",
                    index + 1
                )));
            }
        }
        Ok(())
    }
}

/// One entity's on-screen board.
pub trait DisplaySurface: Send + Sync {
    /// Replaces the title.
    ///
    /// # Errors
    ///
    /// Returns an error if the title cannot be shown; the previous title
    /// stays.
    fn set_title(&mut self, title: &str) -> Result<(), RenderError>;

    /// Replaces all lines at once.
    ///
    /// # Errors
    ///
    /// Returns an error if the lines cannot be shown; the previous lines
    /// stay.
    fn set_lines(&mut self, lines: &[String]) -> Result<(), RenderError>;

    /// Removes the board from the client. Idempotent.
    fn destroy(&mut self);
}

/// Creates display surfaces.
pub trait Renderer: Send + Sync {
    /// Creates a surface for `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot create a surface.
    fn create(&self, id: EntityId, options: SurfaceOptions)
        -> Result<Box<dyn DisplaySurface>, RenderError>;
}
