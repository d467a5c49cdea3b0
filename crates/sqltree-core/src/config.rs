//! Options controlling rendering and resolution.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintMode {
    /// Everything on one line.
    #[default]
    Default,
    /// Multi-line output with clause keywords aligned on a river.
    Pretty,
}

/// Rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintOptions {
    /// Output layout.
    pub mode: PrintMode,
    /// Indentation width for nested blocks such as CASE branches.
    pub indent: usize,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            mode: PrintMode::Default,
            indent: 2,
        }
    }
}

impl PrintOptions {
    /// Single-line output.
    #[must_use]
    pub fn default_mode() -> Self {
        Self::default()
    }

    /// Multi-line output.
    #[must_use]
    pub fn pretty() -> Self {
        Self {
            mode: PrintMode::Pretty,
            ..Self::default()
        }
    }

    /// Sets the layout.
    #[must_use]
    pub const fn with_mode(mut self, mode: PrintMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the indentation width.
    #[must_use]
    pub const fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Returns true in [`PrintMode::Pretty`].
    #[must_use]
    pub fn is_pretty(&self) -> bool {
        self.mode == PrintMode::Pretty
    }

    /// Loads options from JSON; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] on malformed input.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Schema resolution options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Resolve tables missing from every lookup source to an empty schema
    /// instead of failing with `UnknownRelation`.
    pub allow_unknown_relations: bool,
}

impl ResolveOptions {
    /// Sets [`ResolveOptions::allow_unknown_relations`].
    #[must_use]
    pub const fn with_allow_unknown_relations(mut self, allow: bool) -> Self {
        self.allow_unknown_relations = allow;
        self
    }

    /// Loads options from JSON; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] on malformed input.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
