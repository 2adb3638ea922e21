//! # Placeholder Collaborator
//!
//! Dynamic values in board lines (`%player_world%`, server stats, ...) are
//! filled in by an external [`PlaceholderResolver`], once per line per
//! refresh. A failure affects only that line, which is then shown as
//! written.

use std::collections::BTreeMap;

use sidebar_shared::EntityContext;

use crate::error::PlaceholderError;

/// Substitutes dynamic values into one line for one entity.
pub trait PlaceholderResolver: Send + Sync {
    /// Returns `text` with placeholders replaced.
    ///
    /// # Errors
    ///
    /// Returns [`PlaceholderError`] if substitution fails.
    fn substitute(&self, ctx: &dyn EntityContext, text: &str) -> Result<String, PlaceholderError>;
}

impl<F> PlaceholderResolver for F
where
    F: Fn(&dyn EntityContext, &str) -> Result<String, PlaceholderError> + Send + Sync,
{
    fn substitute(&self, ctx: &dyn EntityContext, text: &str) -> Result<String, PlaceholderError> {
        self(ctx, text)
    }
}

/// Resolver for the values the engine knows about, plus fixed values.
///
/// | Token              | Value                     |
/// |--------------------|---------------------------|
/// | `%player_world%`   | current world name        |
/// | `%player_uuid%`    | entity id                 |
/// | `%<key>%`          | value set with `with_value` |
#[derive(Clone, Debug, Default)]
pub struct BuiltinPlaceholders {
    values: BTreeMap<String, String>,
}

impl BuiltinPlaceholders {
    /// Resolver with only the entity tokens.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fixed `%key%` value.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    fn lookup(&self, ctx: &dyn EntityContext, key: &str) -> Option<String> {
        match key {
            "player_world" => Some(ctx.world_name()),
            "player_uuid" => Some(ctx.id().to_string()),
            _ => self.values.get(key).cloned(),
        }
    }
}

impl PlaceholderResolver for BuiltinPlaceholders {
    fn substitute(&self, ctx: &dyn EntityContext, text: &str) -> Result<String, PlaceholderError> {
        // Single pass: substituted values are never scanned again.
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find('%') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let Some(len) = after.find('%') else {
                out.push('%');
                rest = after;
                break;
            };
            match self.lookup(ctx, &after[..len]) {
                Some(value) => {
                    out.push_str(&value);
                    rest = &after[len + 1..];
                }
                // Unknown: keep the '%', the closing one may open a token.
                None => {
                    out.push('%');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        Ok(out)
    }
}
