use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use rigtrim_api_core::Entity;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// Plain data dependency.
    Normal,
    /// Node on its parent node.
    Parent,
    /// Behavior on a node it points at (bones, anchors, sources).
    NodeLink,
    /// Instance on its owning node and back.
    Structural,
}

/// `from` needs `to` to have any effect.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    pub from: Entity,
    pub to: Entity,
    pub kind: DependencyKind,
    /// Only matters while `from` can be active.
    pub conditional: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: Vec<DependencyEdge>,
    outgoing: HashMap<Entity, Vec<usize>>,
    incoming: HashMap<Entity, Vec<usize>>,
    entrypoints: Vec<Entity>,
    entrypoint_set: HashSet<Entity>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, edge: DependencyEdge) {
        if edge.from == edge.to {
            return;
        }
        let idx = self.edges.len();
        self.edges.push(edge);
        self.outgoing.entry(edge.from).or_default().push(idx);
        self.incoming.entry(edge.to).or_default().push(idx);
    }

    pub fn mark_entrypoint(&mut self, entity: Entity) {
        if self.entrypoint_set.insert(entity) {
            self.entrypoints.push(entity);
        }
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn outgoing(&self, entity: Entity) -> impl Iterator<Item = &DependencyEdge> {
        self.outgoing
            .get(&entity)
            .into_iter()
            .flatten()
            .map(|i| &self.edges[*i])
    }

    pub fn incoming(&self, entity: Entity) -> impl Iterator<Item = &DependencyEdge> {
        self.incoming
            .get(&entity)
            .into_iter()
            .flatten()
            .map(|i| &self.edges[*i])
    }

    pub fn entrypoints(&self) -> &[Entity] {
        &self.entrypoints
    }

    pub fn is_entrypoint(&self, entity: Entity) -> bool {
        self.entrypoint_set.contains(&entity)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigtrim_api_core::{BehaviorId, NodeId};

    #[test]
    fn adjacency_is_indexed_both_ways() {
        let a = Entity::Behavior(BehaviorId(0));
        let b = Entity::Node(NodeId(1));
        let mut g = DependencyGraph::new();
        g.add_edge(DependencyEdge {
            from: a,
            to: b,
            kind: DependencyKind::Structural,
            conditional: false,
        });
        g.add_edge(DependencyEdge {
            from: a,
            to: a,
            kind: DependencyKind::Normal,
            conditional: false,
        });
        g.mark_entrypoint(a);
        g.mark_entrypoint(a);
        assert_eq!(g.outgoing(a).count(), 1);
        assert_eq!(g.incoming(b).next().map(|e| e.from), Some(a));
        assert_eq!(g.entrypoints(), &[a]);
        assert_eq!(g.edge_count(), 1);
    }
}
