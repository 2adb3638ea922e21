//! # Priority Resolution
//!
//! Picks exactly one board per entity per refresh.
//!
//! ## Design
//!
//! Candidates are gathered in a fixed order:
//!
//! 1. the default board
//! 2. the world board for the entity's current world
//! 3. every permission rule the entity satisfies, by rule name
//!
//! The first candidate with the strictly greatest priority wins, so ties
//! go to whichever came first in that order. Rule names live in a
//! `BTreeMap`, which makes the order (and the winner) identical on every
//! call.
//!
//! The resolver holds the tree behind a lock and hands out `Arc` clones.
//! A reload swaps the whole tree; a resolution in flight keeps using the
//! snapshot it started with.

use std::sync::Arc;

use parking_lot::RwLock;
use sidebar_shared::EntityContext;

use crate::tree::{ConfigTree, DisplayConfig};

/// Where a candidate came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CandidateSource {
    /// The default board.
    Default,
    /// The board for this world.
    World(String),
    /// The permission rule with this name.
    Rule(String),
}

/// A board that applies to an entity, with the priority it competes at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// The board.
    pub config: Arc<DisplayConfig>,
    /// Priority it competes at.
    pub priority: i32,
    /// Where it came from.
    pub source: CandidateSource,
}

impl ConfigTree {
    /// Every board that applies to `ctx`, in tie-break order.
    ///
    /// The default board is always first, so the result is never empty.
    #[must_use]
    pub fn candidates(&self, ctx: &dyn EntityContext) -> Vec<Candidate> {
        let priorities = self.priorities();
        let mut out = Vec::with_capacity(2 + self.by_rule().len());

        out.push(self.default_candidate());

        if self.features().world_specific_enabled {
            let world = ctx.world_name();
            if let Some(board) = self.by_world().get(&world) {
                out.push(Candidate {
                    config: Arc::clone(&board.display),
                    priority: priorities.world_specific,
                    source: CandidateSource::World(world),
                });
            }
        }

        if self.features().permission_based_enabled {
            for rule in self.by_rule().values() {
                if ctx.has_permission(&rule.required_permission) {
                    out.push(Candidate {
                        config: Arc::clone(&rule.display),
                        priority: rule.priority,
                        source: CandidateSource::Rule(rule.name.clone()),
                    });
                }
            }
        }

        out
    }

    /// The winning candidate for `ctx`.
    #[must_use]
    pub fn resolve_candidate(&self, ctx: &dyn EntityContext) -> Candidate {
        self.candidates(ctx)
            .into_iter()
            .reduce(|best, next| if next.priority > best.priority { next } else { best })
            .unwrap_or_else(|| self.default_candidate())
    }

    fn default_candidate(&self) -> Candidate {
        Candidate {
            config: Arc::clone(self.default_display()),
            priority: self.priorities().default,
            source: CandidateSource::Default,
        }
    }

    /// The board `ctx` should see.
    #[inline]
    #[must_use]
    pub fn resolve(&self, ctx: &dyn EntityContext) -> Arc<DisplayConfig> {
        self.resolve_candidate(ctx).config
    }
}

/// Shared, reloadable resolver.
#[derive(Debug)]
pub struct ConfigResolver {
    tree: RwLock<Arc<ConfigTree>>,
}

impl ConfigResolver {
    /// Creates a resolver over `tree`.
    #[must_use]
    pub fn new(tree: ConfigTree) -> Self {
        Self {
            tree: RwLock::new(Arc::new(tree)),
        }
    }

    /// Current tree.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ConfigTree> {
        Arc::clone(&self.tree.read())
    }

    /// Installs `tree` and returns the one it replaced.
    pub fn replace(&self, tree: ConfigTree) -> Arc<ConfigTree> {
        std::mem::replace(&mut *self.tree.write(), Arc::new(tree))
    }

    /// The board `ctx` should see under the current tree.
    #[must_use]
    pub fn resolve(&self, ctx: &dyn EntityContext) -> Arc<DisplayConfig> {
        self.snapshot().resolve(ctx)
    }

    /// The winning candidate under the current tree.
    #[must_use]
    pub fn resolve_candidate(&self, ctx: &dyn EntityContext) -> Candidate {
        self.snapshot().resolve_candidate(ctx)
    }
}
