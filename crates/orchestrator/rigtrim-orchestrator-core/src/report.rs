use hashbrown::HashMap;
use serde::Serialize;

use rigtrim_animation_core::ModificationSummary;
use rigtrim_api_core::{Diagnostic, NodePath};
use rigtrim_graph_core::ToggleRewrite;
use rigtrim_scene_core::BehaviorType;
use rigtrim_shadow_core::MappingTable;

/// A behavior instance that no longer exists, named by where it lived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedBehavior {
    pub path: NodePath,
    #[serde(rename = "type")]
    pub kind: BehaviorType,
}

/// Everything one optimization run produced.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationReport {
    pub summary: ModificationSummary,
    /// Topmost removed nodes; their subtrees went with them.
    pub removed_nodes: Vec<NodePath>,
    pub removed_behaviors: Vec<RemovedBehavior>,
    pub merged_behaviors: Vec<RemovedBehavior>,
    /// Paths as they were when the node was folded away.
    pub flattened_nodes: Vec<NodePath>,
    pub toggles: Vec<ToggleRewrite>,
    pub mapping: MappingTable,
    pub diagnostics: Vec<Diagnostic>,
    pub timings_ms: HashMap<String, f32>,
}

impl OptimizationReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
