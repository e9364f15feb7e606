//! Error types for plugin declaration, lookup and construction.

use thiserror::Error;

/// Errors that can occur while working with the plugin registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// One or more required arguments could not be resolved to a valid value.
    ///
    /// `names` is in declaration order and never empty.
    #[error("missing keywords: {}", names.join(", "))]
    MissingArguments { plugin: String, names: Vec<String> },

    /// Grouped iteration over a group nobody joined.
    #[error("plugin group '{group}' not found")]
    GroupNotFound { group: String },

    /// Lookup by name failed.
    #[error("plugin '{name}' not found")]
    TypeNotFound { name: String },
}

impl PluginError {
    /// Names of the missing arguments, empty for other variants.
    pub fn missing_arguments(&self) -> &[String] {
        match self {
            PluginError::MissingArguments { names, .. } => names,
            _ => &[],
        }
    }
}

/// Signal raised by a per-argument hook when it treats its argument as missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingArgument;
