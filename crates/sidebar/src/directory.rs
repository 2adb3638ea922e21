//! # Entity Directory
//!
//! The host's view of who is connected right now. The refresh cycle and
//! reload walk it; nothing else does.

use std::sync::Arc;

use dashmap::DashMap;
use sidebar_shared::{EntityId, SharedContext};

/// Lists currently connected entities.
pub trait EntityDirectory: Send + Sync {
    /// Every connected entity.
    fn online(&self) -> Vec<SharedContext>;
}

/// Directory the host fills on connect and empties on disconnect.
#[derive(Default)]
pub struct OnlineEntities {
    entities: DashMap<EntityId, SharedContext>,
}

impl OnlineEntities {
    /// Empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a connection, returning the context it replaced.
    pub fn connect(&self, ctx: SharedContext) -> Option<SharedContext> {
        self.entities.insert(ctx.id(), ctx)
    }

    /// Forgets a connection.
    pub fn disconnect(&self, id: EntityId) -> Option<SharedContext> {
        self.entities.remove(&id).map(|(_, ctx)| ctx)
    }

    /// Context of a connected entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<SharedContext> {
        self.entities.get(&id).map(|ctx| Arc::clone(ctx.value()))
    }

    /// Number of connected entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True when nobody is connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl EntityDirectory for OnlineEntities {
    /// Sorted by id so walks are reproducible.
    fn online(&self) -> Vec<SharedContext> {
        let mut online: Vec<SharedContext> =
            self.entities.iter().map(|e| Arc::clone(e.value())).collect();
        online.sort_by_key(|ctx| ctx.id());
        online
    }
}
