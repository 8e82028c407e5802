//! Small shared value types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an effective configuration value came from.
///
/// Precedence, highest first: `Cli`, `Config`, `Default`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Value provided via CLI argument.
    Cli,
    /// Value loaded from a configuration file.
    Config,
    /// Built-in default value.
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::Config => write!(f, "config"),
            Self::Default => write!(f, "default"),
        }
    }
}
