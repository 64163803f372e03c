//! The sub-passes of one optimization run. Each one rebuilds the dependency
//! graph it needs from the scene as it is at that point, and issues every
//! shadow command before the matching real edit.

pub(crate) mod flatten;
pub(crate) mod merge;
pub(crate) mod sweep;
pub(crate) mod toggle;

use hashbrown::HashMap;

use rigtrim_animation_core::ModificationSummary;
use rigtrim_api_core::{Diagnostics, NodePath};
use rigtrim_graph_core::{
    ActivenessMap, DependencyGraph, DependencyGraphBuilder, LivenessSet, ParserRegistry,
    Reachability, ToggleRewrite,
};
use rigtrim_scene_core::SceneGraph;
use rigtrim_shadow_core::ShadowGraph;

use crate::diagnostics::DiagnosticsCfg;
use crate::report::{OptimizationReport, RemovedBehavior};

pub(crate) struct PassContext<'a> {
    pub(crate) scene: &'a mut SceneGraph,
    pub(crate) registry: &'a ParserRegistry,
    pub(crate) summary: ModificationSummary,
    pub(crate) shadow: ShadowGraph,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) removed_nodes: Vec<NodePath>,
    pub(crate) removed_behaviors: Vec<RemovedBehavior>,
    pub(crate) merged_behaviors: Vec<RemovedBehavior>,
    pub(crate) flattened_nodes: Vec<NodePath>,
    pub(crate) toggles: Vec<ToggleRewrite>,
    pub(crate) timings: HashMap<String, f32>,
    graph_built: bool,
}

impl<'a> PassContext<'a> {
    pub(crate) fn new(
        scene: &'a mut SceneGraph,
        registry: &'a ParserRegistry,
        summary: ModificationSummary,
        diagnostics: Diagnostics,
    ) -> Self {
        let shadow = ShadowGraph::new(scene);
        Self {
            scene,
            registry,
            summary,
            shadow,
            diagnostics,
            removed_nodes: Vec::new(),
            removed_behaviors: Vec::new(),
            merged_behaviors: Vec::new(),
            flattened_nodes: Vec::new(),
            toggles: Vec::new(),
            timings: HashMap::new(),
            graph_built: false,
        }
    }

    /// Dependency graph, activeness and liveness of the current scene.
    pub(crate) fn analysis(&mut self) -> (DependencyGraph, ActivenessMap, LivenessSet) {
        let scene: &SceneGraph = &*self.scene;
        // Builder diagnostics are reported from the first build only.
        let mut repeat = Diagnostics::new();
        let sink = if self.graph_built {
            &mut repeat
        } else {
            &mut self.diagnostics
        };
        let graph = DependencyGraphBuilder::new(scene, self.registry).build(sink);
        self.graph_built = true;
        let activeness = ActivenessMap::compute(scene, &self.summary);
        let live = Reachability::mark(&graph, &activeness);
        log::debug!(
            "{} of {} node(s) and {} behavior(s) live",
            live.len(),
            scene.node_count(),
            scene.behavior_count()
        );
        (graph, activeness, live)
    }

    pub(crate) fn finish(self, cfg: &DiagnosticsCfg) -> OptimizationReport {
        OptimizationReport {
            mapping: self.shadow.compile(),
            summary: self.summary,
            removed_nodes: self.removed_nodes,
            removed_behaviors: self.removed_behaviors,
            merged_behaviors: self.merged_behaviors,
            flattened_nodes: self.flattened_nodes,
            toggles: self.toggles,
            timings_ms: self.timings,
            diagnostics: cfg.collect(self.diagnostics),
        }
    }
}
