//! Dependency Graph Builder.

use hashbrown::HashSet;

use rigtrim_api_core::diagnostics::codes;
use rigtrim_api_core::{Diagnostics, Entity, Subject};
use rigtrim_scene_core::{BehaviorType, SceneGraph};

use crate::builtin;
use crate::registry::{ParseContext, ParserRegistry};
use crate::types::{DependencyEdge, DependencyGraph, DependencyKind};

pub struct DependencyGraphBuilder<'a> {
    scene: &'a SceneGraph,
    registry: &'a ParserRegistry,
}

impl<'a> DependencyGraphBuilder<'a> {
    pub fn new(scene: &'a SceneGraph, registry: &'a ParserRegistry) -> Self {
        Self { scene, registry }
    }

    /// Build the whole graph. The result describes the scene as it is now; it
    /// must be rebuilt after structural edits.
    pub fn build(&self, diagnostics: &mut Diagnostics) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        let mut unknown: HashSet<BehaviorType> = HashSet::new();
        let mut cycles: HashSet<BehaviorType> = HashSet::new();

        for behavior in self.scene.behaviors() {
            let id = Entity::Behavior(behavior.id);
            let node = Entity::Node(behavior.node);
            graph.add_edge(DependencyEdge {
                from: id,
                to: node,
                kind: DependencyKind::Structural,
                conditional: false,
            });
            if behavior.kind == BehaviorType::Transform {
                // The node-defining instance lives and dies with its node.
                graph.add_edge(DependencyEdge {
                    from: node,
                    to: id,
                    kind: DependencyKind::Structural,
                    conditional: false,
                });
            }

            let chain = self
                .registry
                .chain(&behavior.kind, behavior.id, &mut cycles, diagnostics);
            let mut cx = ParseContext::new(self.scene, behavior, &mut graph);
            match chain {
                Some(parsers) => {
                    for parser in parsers {
                        parser(&mut cx);
                    }
                }
                None => {
                    if unknown.insert(behavior.kind.clone()) {
                        diagnostics.warning(
                            codes::UNKNOWN_BEHAVIOR_TYPE,
                            format!(
                                "no dependency parser for '{}'; keeping its references conservatively",
                                behavior.kind
                            ),
                            vec![Subject::Behavior(behavior.id)],
                        );
                    }
                    builtin::fallback(&mut cx);
                }
            }
        }
        log::debug!(
            "dependency graph: {} edge(s), {} entrypoint(s)",
            graph.edge_count(),
            graph.entrypoints().len()
        );
        graph
    }
}
