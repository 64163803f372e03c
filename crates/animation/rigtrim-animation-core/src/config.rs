//! Analyzer configuration.

use serde::{Deserialize, Serialize};

/// Switches for the conservative rules of the analyzer. The defaults are the
/// sound choices; turning one off trades safety for more constants.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Downgrade a constant when a write-defaults state does not touch it.
    pub honor_write_defaults: bool,
    /// Treat every property touched by an additive layer as `Variable`.
    pub additive_layers_variable: bool,
    /// Add `Variable` transform entries for bone chains and constraints.
    pub include_motion_sources: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            honor_write_defaults: true,
            additive_layers_variable: true,
            include_motion_sources: true,
        }
    }
}
