use serde::{Deserialize, Serialize};

use rigtrim_api_core::{Diagnostic, Diagnostics, Severity};

/// What the report keeps of the diagnostics gathered during a run.
/// Log mirroring happens regardless.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsCfg {
    pub enabled: bool,
    pub min_severity: Severity,
}

impl Default for DiagnosticsCfg {
    fn default() -> Self {
        DiagnosticsCfg {
            enabled: true,
            min_severity: Severity::Info,
        }
    }
}

impl DiagnosticsCfg {
    pub(crate) fn collect(&self, mut diagnostics: Diagnostics) -> Vec<Diagnostic> {
        if !self.enabled {
            return Vec::new();
        }
        diagnostics.retain_at_least(self.min_severity);
        diagnostics.into_vec()
    }
}
