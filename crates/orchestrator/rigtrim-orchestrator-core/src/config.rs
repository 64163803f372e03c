use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use rigtrim_animation_core::AnalyzerConfig;

use crate::diagnostics::DiagnosticsCfg;
use crate::scheduler::Schedule;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub schedule: Schedule,
    /// Delete what no active entrypoint reaches.
    pub remove_unused: bool,
    /// Fold empty intermediate nodes into their parent.
    pub flatten_empty_nodes: bool,
    /// Drive heavy instances from the node that switches their users.
    pub toggle_unused: bool,
    pub analyzer: AnalyzerConfig,
    pub diagnostics: DiagnosticsCfg,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            schedule: Schedule::Full,
            remove_unused: true,
            flatten_empty_nodes: true,
            toggle_unused: true,
            analyzer: AnalyzerConfig::default(),
            diagnostics: DiagnosticsCfg::default(),
        }
    }
}

impl OptimizerConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parse optimizer config")
    }
}
