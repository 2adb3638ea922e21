//! # Entities
//!
//! A connected entity (a player) as seen by the board engine: a stable
//! identity plus the two capabilities resolution needs, the current world
//! name and a permission check.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

/// Unique identifier of a connected entity.
///
/// Stable for the lifetime of one connection. Key of every per-entity map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Builds an identifier from a raw 128-bit value (tests, fixtures).
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What the board engine may ask about an entity.
///
/// Implemented by the host. Contexts are shared with region threads, so
/// implementations must be thread-safe.
pub trait EntityContext: Send + Sync {
    /// Identity of the entity.
    fn id(&self) -> EntityId;

    /// Name of the world the entity is currently in.
    fn world_name(&self) -> String;

    /// Whether the entity currently holds `node`.
    fn has_permission(&self, node: &str) -> bool;

    /// Whether the entity is still connected.
    fn is_online(&self) -> bool {
        true
    }
}

/// Reference-counted context handed across threads.
pub type SharedContext = Arc<dyn EntityContext>;

/// Plain in-memory entity context.
///
/// Used by hosts that mirror player state into the engine, by the demo
/// server and by tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerContext {
    /// Entity identity.
    pub id: EntityId,
    /// Current world name.
    pub world: String,
    /// Granted permission nodes.
    pub permissions: BTreeSet<String>,
    /// Connection flag.
    pub online: bool,
}

impl PlayerContext {
    /// Creates an online player in `world` with no permissions.
    #[must_use]
    pub fn new(id: EntityId, world: impl Into<String>) -> Self {
        Self {
            id,
            world: world.into(),
            permissions: BTreeSet::new(),
            online: true,
        }
    }

    /// Grants a permission node.
    #[must_use]
    pub fn with_permission(mut self, node: impl Into<String>) -> Self {
        self.permissions.insert(node.into());
        self
    }

    /// Wraps the context for sharing.
    #[must_use]
    pub fn shared(self) -> SharedContext {
        Arc::new(self)
    }
}

impl EntityContext for PlayerContext {
    fn id(&self) -> EntityId {
        self.id
    }

    fn world_name(&self) -> String {
        self.world.clone()
    }

    fn has_permission(&self, node: &str) -> bool {
        self.permissions.contains(node)
    }

    fn is_online(&self) -> bool {
        self.online
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_from_u128_is_stable() {
        assert_eq!(EntityId::from_u128(7), EntityId::from_u128(7));
        assert_ne!(EntityId::from_u128(7), EntityId::from_u128(8));
    }

    #[test]
    fn test_player_context_permissions() {
        let ctx = PlayerContext::new(EntityId::from_u128(1), "world").with_permission("rank.vip");

        assert!(ctx.has_permission("rank.vip"));
        assert!(!ctx.has_permission("rank.admin"));
        assert_eq!(ctx.world_name(), "world");
        assert!(ctx.is_online());
    }

    #[test]
    fn test_shared_context_is_object_safe() {
        let shared: SharedContext = PlayerContext::new(EntityId::from_u128(2), "nether").shared();
        assert_eq!(shared.id(), EntityId::from_u128(2));
    }
}
