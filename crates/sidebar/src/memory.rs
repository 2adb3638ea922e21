//! # In-Memory Renderer
//!
//! A [`Renderer`] that records every surface in a shared map instead of
//! sending packets. Headless hosts use it to inspect what each entity
//! would see; the integration tests use it as their recording backend.
//!
//! Limits are enforced exactly as a client would: a constrained surface
//! rejects over-long text with [`RenderError::MalformedText`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use sidebar_shared::EntityId;

use crate::error::RenderError;
use crate::render::{DisplaySurface, Renderer, SurfaceOptions};

/// What one entity's surface currently shows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SurfaceSnapshot {
    /// Creation sequence number, unique per surface.
    pub generation: u64,
    /// Options the surface was created with.
    pub options: SurfaceOptions,
    /// Last accepted title.
    pub title: Option<String>,
    /// Last accepted lines.
    pub lines: Vec<String>,
    /// Number of accepted `set_lines` calls.
    pub line_pushes: u64,
    /// Whether the surface was destroyed.
    pub destroyed: bool,
}

/// Records surfaces in memory. Cloning shares the record.
#[derive(Clone, Debug, Default)]
pub struct MemoryRenderer {
    surfaces: Arc<DashMap<EntityId, SurfaceSnapshot>>,
    created: Arc<AtomicU64>,
}

impl MemoryRenderer {
    /// Empty renderer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest surface for `id`, destroyed or not.
    #[must_use]
    pub fn snapshot(&self, id: EntityId) -> Option<SurfaceSnapshot> {
        self.surfaces.get(&id).map(|s| s.clone())
    }

    /// Latest surface for `id` if it is still live.
    #[must_use]
    pub fn live(&self, id: EntityId) -> Option<SurfaceSnapshot> {
        self.snapshot(id).filter(|s| !s.destroyed)
    }

    /// Number of live surfaces.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.surfaces.iter().filter(|s| !s.destroyed).count()
    }

    /// Total surfaces ever created.
    #[must_use]
    pub fn created_count(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }
}

impl Renderer for MemoryRenderer {
    fn create(
        &self,
        id: EntityId,
        options: SurfaceOptions,
    ) -> Result<Box<dyn DisplaySurface>, RenderError> {
        let generation = self.created.fetch_add(1, Ordering::Relaxed) + 1;
        self.surfaces.insert(
            id,
            SurfaceSnapshot {
                generation,
                options,
                ..SurfaceSnapshot::default()
            },
        );
        Ok(Box::new(MemorySurface {
            id,
            generation,
            options,
            surfaces: Arc::clone(&self.surfaces),
        }))
    }
}

struct MemorySurface {
    id: EntityId,
    generation: u64,
    options: SurfaceOptions,
    surfaces: Arc<DashMap<EntityId, SurfaceSnapshot>>,
}

impl MemorySurface {
    fn with_live<R>(&self, f: impl FnOnce(&mut SurfaceSnapshot) -> R) -> Result<R, RenderError> {
        match self.surfaces.get_mut(&self.id) {
            Some(mut s) if s.generation == self.generation && !s.destroyed => Ok(f(&mut s)),
            _ => Err(RenderError::SurfaceGone),
        }
    }
}

impl DisplaySurface for MemorySurface {
    fn set_title(&mut self, title: &str) -> Result<(), RenderError> {
        self.options.check_title(title)?;
        self.with_live(|s| s.title = Some(title.to_owned()))
    }

    fn set_lines(&mut self, lines: &[String]) -> Result<(), RenderError> {
        self.options.check_lines(lines)?;
        self.with_live(|s| {
            s.lines = lines.to_vec();
            s.line_pushes += 1;
        })
    }

    fn destroy(&mut self) {
        // Stale surfaces must not mark a newer one destroyed.
        let _ = self.with_live(|s| s.destroyed = true);
    }
}
