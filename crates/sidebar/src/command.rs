//! # Command Surface
//!
//! ```text
//! /sidebar               -> help
//! /sidebar reload        -> needs sidebar.command
//! /sidebar toggle        -> entity only, needs sidebar.toggle
//! /sb                    -> entity only, no permission
//! ```
//!
//! Commands return a [`CommandOutcome`]; turning it into a localized chat
//! message is the host's job (see [`CommandOutcome::message_key`]).

use std::sync::Arc;

use sidebar_shared::{SharedContext, PERMISSION_RELOAD, PERMISSION_TOGGLE};

use crate::registry::EntityBoardRegistry;
use crate::reload::ConfigReloader;

const SUBCOMMANDS: [&str; 2] = ["reload", "toggle"];

/// Whoever issued a command.
pub trait CommandSender {
    /// Whether the sender holds `node`.
    fn has_permission(&self, node: &str) -> bool;

    /// The entity behind the sender, if it is one.
    fn entity(&self) -> Option<SharedContext>;
}

/// The server console: every permission, no entity.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSender;

impl CommandSender for ConsoleSender {
    fn has_permission(&self, _node: &str) -> bool {
        true
    }

    fn entity(&self) -> Option<SharedContext> {
        None
    }
}

/// A connected entity issuing a command.
#[derive(Clone)]
pub struct EntitySender(pub SharedContext);

impl CommandSender for EntitySender {
    fn has_permission(&self, node: &str) -> bool {
        self.0.has_permission(node)
    }

    fn entity(&self) -> Option<SharedContext> {
        Some(Arc::clone(&self.0))
    }
}

/// Result of a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Usage lines, markup already normalized.
    Help(Vec<String>),
    /// The sender lacks the required permission.
    NoPermission,
    /// Only an entity can run this.
    PlayersOnly,
    /// The sender's board is now hidden.
    BoardHidden,
    /// The sender's board is now shown.
    BoardShown,
    /// Configuration reloaded; this many boards were rebuilt.
    Reloaded(usize),
    /// Configuration could not be reloaded; the old one stays.
    ReloadFailed(String),
}

impl CommandOutcome {
    /// Key of the message to show for this outcome.
    #[must_use]
    pub const fn message_key(&self) -> &'static str {
        match self {
            Self::Help(_) => "help",
            Self::NoPermission => "no-permission",
            Self::PlayersOnly => "player-only-command",
            Self::BoardHidden => "board-disabled",
            Self::BoardShown => "board-enabled",
            Self::Reloaded(_) => "config-reloaded",
            Self::ReloadFailed(_) => "config-reload-failed",
        }
    }
}

/// Handles `/sidebar` and `/sb`.
pub struct BoardCommand {
    registry: Arc<EntityBoardRegistry>,
    reloader: Arc<ConfigReloader>,
}

impl BoardCommand {
    /// Command surface over `registry`, reloading through `reloader`.
    #[must_use]
    pub fn new(registry: Arc<EntityBoardRegistry>, reloader: Arc<ConfigReloader>) -> Self {
        Self { registry, reloader }
    }

    /// Runs `/sidebar <args>`.
    pub fn execute(&self, sender: &dyn CommandSender, args: &[&str]) -> CommandOutcome {
        let Some(sub) = args.first() else {
            return self.help();
        };
        match sub.to_lowercase().as_str() {
            "reload" => self.reload(sender),
            "toggle" => {
                let Some(entity) = sender.entity() else {
                    return CommandOutcome::PlayersOnly;
                };
                if !sender.has_permission(PERMISSION_TOGGLE) {
                    return CommandOutcome::NoPermission;
                }
                self.flip(&entity)
            }
            _ => self.help(),
        }
    }

    /// Runs `/sb`: toggles without a permission check.
    pub fn quick_toggle(&self, sender: &dyn CommandSender) -> CommandOutcome {
        match sender.entity() {
            Some(entity) => self.flip(&entity),
            None => CommandOutcome::PlayersOnly,
        }
    }

    /// Completions for the argument being typed.
    #[must_use]
    pub fn tab_complete(&self, args: &[&str]) -> Vec<&'static str> {
        match args {
            [partial] => {
                let partial = partial.to_lowercase();
                SUBCOMMANDS
                    .into_iter()
                    .filter(|s| s.starts_with(partial.as_str()))
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    fn reload(&self, sender: &dyn CommandSender) -> CommandOutcome {
        if !sender.has_permission(PERMISSION_RELOAD) {
            return CommandOutcome::NoPermission;
        }
        match self.reloader.reload() {
            Ok(summary) => CommandOutcome::Reloaded(summary.recreated),
            Err(e) => CommandOutcome::ReloadFailed(e.to_string()),
        }
    }

    fn flip(&self, entity: &SharedContext) -> CommandOutcome {
        if self.registry.toggle(entity.as_ref()) {
            CommandOutcome::BoardHidden
        } else {
            CommandOutcome::BoardShown
        }
    }

    fn help(&self) -> CommandOutcome {
        let markup = self.registry.markup();
        let lines = [
            format!("&b&lSidebar &8- &7v{}", env!("CARGO_PKG_VERSION")),
            String::new(),
            "&7 - &f/sidebar reload &7Reload the configuration.".to_owned(),
            "&7 - &f/sidebar toggle &7Show or hide your board.".to_owned(),
            String::new(),
        ];
        CommandOutcome::Help(lines.iter().map(|l| markup.normalize(l)).collect())
    }
}
