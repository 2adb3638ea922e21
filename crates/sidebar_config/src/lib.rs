//! # Sidebar Config
//!
//! Holds the parsed configuration and decides, per entity and per refresh,
//! which board configuration applies.
//!
//! ## Resolution
//!
//! ```text
//! candidates = [(default, default_priority)]
//!            + [(world board, world_priority)]        if enabled and present
//!            + [(rule board, rule.priority) ...]      if enabled and permitted
//! winner     = first candidate with the strictly greatest priority
//! ```
//!
//! Permission rules carry their own priority; the global
//! `permission-based` priority is kept in the tree but not used to rank
//! rules.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sidebar_config::{ConfigDocument, ConfigResolver, ConfigTree, LegacyAmpersand};
//!
//! let doc = ConfigDocument::from_toml_str(&std::fs::read_to_string("sidebar.toml")?)?;
//! let resolver = ConfigResolver::new(ConfigTree::build(&doc, &LegacyAmpersand));
//! let board = resolver.resolve(&player);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod document;
pub mod error;
pub mod markup;
pub mod resolver;
pub mod source;
pub mod tree;

pub use document::{BoardSection, ConfigDocument, PriorityOrder, SettingsSection};
pub use error::{ConfigError, ConfigResult};
pub use markup::{LegacyAmpersand, MarkupNormalizer, Passthrough};
pub use resolver::{Candidate, CandidateSource, ConfigResolver};
pub use source::{ConfigSource, StaticSource, TomlFileSource};
pub use tree::{
    ConfigTree, DisplayConfig, FeatureFlags, PermissionDisplayConfig, Priorities, Settings,
    WorldDisplayConfig, DEFAULT_TITLE,
};
