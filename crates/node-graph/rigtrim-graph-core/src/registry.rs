//! Per-type dependency parsers.
//!
//! A parser inspects one behavior instance and declares what it needs through
//! a [`ParseContext`]. Types are looked up exactly; [`ParserRegistry::extend`]
//! lets a subtype run its parent's parser first and then add its own edges.

use hashbrown::{HashMap, HashSet};

use rigtrim_api_core::diagnostics::codes;
use rigtrim_api_core::{Diagnostics, Entity, Subject};
use rigtrim_scene_core::{BehaviorId, BehaviorInstance, BehaviorType, NodeId, SceneGraph};

use crate::builtin;
use crate::types::{DependencyEdge, DependencyGraph, DependencyKind};

pub type Parser = Box<dyn Fn(&mut ParseContext<'_>)>;

/// What a parser sees: the scene, the instance being parsed, and the graph
/// under construction.
pub struct ParseContext<'a> {
    scene: &'a SceneGraph,
    behavior: &'a BehaviorInstance,
    graph: &'a mut DependencyGraph,
}

impl<'a> ParseContext<'a> {
    pub(crate) fn new(
        scene: &'a SceneGraph,
        behavior: &'a BehaviorInstance,
        graph: &'a mut DependencyGraph,
    ) -> Self {
        Self {
            scene,
            behavior,
            graph,
        }
    }

    pub fn scene(&self) -> &'a SceneGraph {
        self.scene
    }

    pub fn behavior(&self) -> &'a BehaviorInstance {
        self.behavior
    }

    pub fn id(&self) -> BehaviorId {
        self.behavior.id
    }

    /// Node owning the parsed instance.
    pub fn node(&self) -> NodeId {
        self.behavior.node
    }

    /// The instance needs `to` whatever its own state.
    pub fn depends_on(&mut self, to: impl Into<Entity>, kind: DependencyKind) {
        let from = Entity::Behavior(self.behavior.id);
        self.add_edge_from(from, to, kind, false);
    }

    /// The instance needs `to` only while it can be active.
    pub fn depends_on_while_active(&mut self, to: impl Into<Entity>, kind: DependencyKind) {
        let from = Entity::Behavior(self.behavior.id);
        self.add_edge_from(from, to, kind, true);
    }

    /// Declare a dependency on behalf of another entity.
    pub fn add_edge_from(
        &mut self,
        from: impl Into<Entity>,
        to: impl Into<Entity>,
        kind: DependencyKind,
        conditional: bool,
    ) {
        self.graph.add_edge(DependencyEdge {
            from: from.into(),
            to: to.into(),
            kind,
            conditional,
        });
    }

    pub fn mark_entrypoint(&mut self) {
        self.graph.mark_entrypoint(Entity::Behavior(self.behavior.id));
    }

    /// Node references held by property `name`, through lists.
    pub fn node_refs(&self, name: &str) -> Vec<NodeId> {
        self.behavior
            .property(name)
            .map(|p| p.node_refs())
            .unwrap_or_default()
    }

    pub fn behavior_refs(&self, name: &str) -> Vec<BehaviorId> {
        self.behavior
            .property(name)
            .map(|p| p.behavior_refs())
            .unwrap_or_default()
    }
}

enum ParserEntry {
    Own(Parser),
    Extends { parent: BehaviorType, parser: Parser },
}

impl ParserEntry {
    fn parser(&self) -> &Parser {
        match self {
            ParserEntry::Own(parser) | ParserEntry::Extends { parser, .. } => parser,
        }
    }
}

#[derive(Default)]
pub struct ParserRegistry {
    parsers: HashMap<BehaviorType, ParserEntry>,
}

impl ParserRegistry {
    /// An empty registry; every type goes to the fallback parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with parsers for every built-in behavior type.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        builtin::register_all(&mut registry);
        registry
    }

    pub fn register<F>(&mut self, kind: BehaviorType, parser: F)
    where
        F: Fn(&mut ParseContext<'_>) + 'static,
    {
        self.parsers.insert(kind, ParserEntry::Own(Box::new(parser)));
    }

    /// Register `kind` as a subtype of `parent`: the parent's parser chain
    /// runs first, then `parser`.
    pub fn extend<F>(&mut self, kind: BehaviorType, parent: BehaviorType, parser: F)
    where
        F: Fn(&mut ParseContext<'_>) + 'static,
    {
        self.parsers.insert(
            kind,
            ParserEntry::Extends {
                parent,
                parser: Box::new(parser),
            },
        );
    }

    pub fn contains(&self, kind: &BehaviorType) -> bool {
        self.parsers.contains_key(kind)
    }

    /// Parsers to run for `kind`, root ancestor first. `None` when the type is
    /// unregistered. A cycle in the inheritance chain is cut where it closes
    /// and reported once per type through `diagnostics`.
    pub(crate) fn chain(
        &self,
        kind: &BehaviorType,
        subject: BehaviorId,
        reported: &mut HashSet<BehaviorType>,
        diagnostics: &mut Diagnostics,
    ) -> Option<Vec<&Parser>> {
        let mut entry = self.parsers.get(kind)?;
        let mut seen: HashSet<&BehaviorType> = HashSet::new();
        seen.insert(kind);
        let mut chain = vec![entry.parser()];
        while let ParserEntry::Extends { parent, .. } = entry {
            if !seen.insert(parent) {
                if reported.insert(kind.clone()) {
                    diagnostics.warning(
                        codes::PARSER_INHERITANCE_CYCLE,
                        format!("parser for '{kind}' inherits from itself through '{parent}'"),
                        vec![Subject::Behavior(subject)],
                    );
                }
                break;
            }
            match self.parsers.get(parent) {
                Some(next) => {
                    chain.push(next.parser());
                    entry = next;
                }
                None => {
                    log::debug!("parser for '{kind}' extends unregistered '{parent}'");
                    break;
                }
            }
        }
        chain.reverse();
        Some(chain)
    }
}
