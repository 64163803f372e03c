//! Reachability Engine: mark from entrypoints, then plan the sweep.

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};

use rigtrim_animation_core::{
    behavior_self_activeness, node_self_activeness, Activeness, ModificationSummary,
};
use rigtrim_api_core::Entity;
use rigtrim_scene_core::{BehaviorId, BehaviorType, NodeId, SceneGraph};

use crate::types::{DependencyEdge, DependencyGraph};

/// Activeness of every node and behavior, folded once per pass.
#[derive(Debug, Clone, Default)]
pub struct ActivenessMap {
    entities: HashMap<Entity, Activeness>,
    node_self: HashMap<NodeId, Activeness>,
}

impl ActivenessMap {
    pub fn compute(scene: &SceneGraph, summary: &ModificationSummary) -> Self {
        let mut map = Self::default();
        // Pre-order, so a parent is always folded before its children.
        for node in scene.subtree(scene.root()) {
            let own = node_self_activeness(scene, summary, node);
            let inherited = scene
                .parent(node)
                .and_then(|p| map.entities.get(&Entity::Node(p)).copied())
                .unwrap_or(Activeness::AlwaysTrue);
            map.node_self.insert(node, own);
            map.entities.insert(Entity::Node(node), own.and(inherited));
        }
        for behavior in scene.behaviors() {
            let node = map.of(Entity::Node(behavior.node));
            let own = behavior_self_activeness(scene, summary, behavior.id);
            map.entities
                .insert(Entity::Behavior(behavior.id), own.and(node));
        }
        map
    }

    /// Folded activeness; entities the scene no longer holds are inactive.
    pub fn of(&self, entity: Entity) -> Activeness {
        self.entities
            .get(&entity)
            .copied()
            .unwrap_or(Activeness::AlwaysFalse)
    }

    /// The node's own `active` flag, ignoring ancestors.
    pub fn node_self(&self, node: NodeId) -> Activeness {
        self.node_self
            .get(&node)
            .copied()
            .unwrap_or(Activeness::AlwaysFalse)
    }

    pub fn set(&mut self, entity: Entity, activeness: Activeness) {
        self.entities.insert(entity, activeness);
    }
}

/// Entities reached from a live entrypoint.
#[derive(Debug, Clone, Default)]
pub struct LivenessSet {
    live: HashSet<Entity>,
}

impl LivenessSet {
    pub fn is_live(&self, entity: impl Into<Entity>) -> bool {
        self.live.contains(&entity.into())
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.live.iter().copied()
    }
}

pub struct Reachability;

impl Reachability {
    /// Closure over every edge kind.
    pub fn mark(graph: &DependencyGraph, activeness: &ActivenessMap) -> LivenessSet {
        Self::mark_filtered(graph, activeness, |_| true)
    }

    /// Closure from the entrypoints that can be active, following only edges
    /// accepted by `follow`. A conditional edge is followed only while its
    /// source can be active.
    pub fn mark_filtered<F>(
        graph: &DependencyGraph,
        activeness: &ActivenessMap,
        follow: F,
    ) -> LivenessSet
    where
        F: Fn(&DependencyEdge) -> bool,
    {
        let mut live: HashSet<Entity> = HashSet::new();
        let mut queue: VecDeque<Entity> = VecDeque::new();
        for &entry in graph.entrypoints() {
            if activeness.of(entry).is_always_false() {
                log::trace!("entrypoint {entry} never active");
                continue;
            }
            if live.insert(entry) {
                queue.push_back(entry);
            }
        }

        while let Some(entity) = queue.pop_front() {
            let source_inactive = activeness.of(entity).is_always_false();
            for edge in graph.outgoing(entity) {
                if !follow(edge) || (edge.conditional && source_inactive) {
                    continue;
                }
                if live.insert(edge.to) {
                    log::trace!("{} -> {} ({:?})", edge.from, edge.to, edge.kind);
                    queue.push_back(edge.to);
                }
            }
        }
        LivenessSet { live }
    }
}

/// What the sweep deletes. Node entries are the topmost dead nodes; their
/// subtrees and instances go with them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepPlan {
    pub nodes: Vec<NodeId>,
    pub behaviors: Vec<BehaviorId>,
}

impl SweepPlan {
    pub fn from_liveness(scene: &SceneGraph, liveness: &LivenessSet) -> Self {
        let mut plan = SweepPlan::default();
        let mut doomed: HashSet<NodeId> = HashSet::new();
        let root = scene.root();
        plan.collect_nodes(scene, liveness, root, root, &mut doomed);

        for behavior in scene.behaviors() {
            if behavior.kind == BehaviorType::Transform
                || doomed.contains(&behavior.node)
                || liveness.is_live(behavior.id)
            {
                continue;
            }
            plan.behaviors.push(behavior.id);
        }
        plan
    }

    fn collect_nodes(
        &mut self,
        scene: &SceneGraph,
        liveness: &LivenessSet,
        root: NodeId,
        node: NodeId,
        doomed: &mut HashSet<NodeId>,
    ) {
        if node != root && !liveness.is_live(node) {
            let subtree = scene.subtree(node);
            if subtree.iter().all(|n| !liveness.is_live(*n)) {
                self.nodes.push(node);
                doomed.extend(subtree);
                return;
            }
            log::debug!("keeping unreached {node}: a descendant is live");
        }
        let Some(n) = scene.node(node) else {
            return;
        };
        for child in n.children.iter().copied() {
            self.collect_nodes(scene, liveness, root, child, doomed);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.behaviors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DependencyKind;

    fn edge(from: Entity, to: Entity, conditional: bool) -> DependencyEdge {
        DependencyEdge {
            from,
            to,
            kind: DependencyKind::Normal,
            conditional,
        }
    }

    #[test]
    fn conditional_edges_need_an_active_source() {
        let a = Entity::Behavior(BehaviorId(0));
        let b = Entity::Behavior(BehaviorId(1));
        let c = Entity::Behavior(BehaviorId(2));
        let mut graph = DependencyGraph::new();
        graph.add_edge(edge(a, b, false));
        graph.add_edge(edge(b, c, true));
        graph.mark_entrypoint(a);

        let mut activeness = ActivenessMap::default();
        activeness.set(a, Activeness::Maybe);
        activeness.set(b, Activeness::AlwaysFalse);
        let live = Reachability::mark(&graph, &activeness);
        assert!(live.is_live(a) && live.is_live(b));
        assert!(!live.is_live(c));

        activeness.set(b, Activeness::Maybe);
        assert!(Reachability::mark(&graph, &activeness).is_live(c));
    }

    #[test]
    fn inactive_entrypoints_are_not_roots() {
        let a = Entity::Behavior(BehaviorId(0));
        let b = Entity::Node(NodeId(3));
        let mut graph = DependencyGraph::new();
        graph.add_edge(edge(a, b, false));
        graph.mark_entrypoint(a);
        let mut activeness = ActivenessMap::default();
        activeness.set(a, Activeness::AlwaysFalse);
        assert!(Reachability::mark(&graph, &activeness).is_empty());
    }

    #[test]
    fn filtered_mark_skips_rejected_kinds() {
        let a = Entity::Behavior(BehaviorId(0));
        let b = Entity::Node(NodeId(1));
        let mut graph = DependencyGraph::new();
        graph.add_edge(DependencyEdge {
            from: a,
            to: b,
            kind: DependencyKind::NodeLink,
            conditional: false,
        });
        graph.mark_entrypoint(a);
        let mut activeness = ActivenessMap::default();
        activeness.set(a, Activeness::AlwaysTrue);
        let live = Reachability::mark_filtered(&graph, &activeness, |e| {
            e.kind != DependencyKind::NodeLink
        });
        assert!(live.is_live(a));
        assert!(!live.is_live(b));
    }

    #[test]
    fn sweep_keeps_dead_parents_of_live_nodes() {
        let mut scene = SceneGraph::new("root");
        let root = scene.root();
        let group = scene.add_node(root, "Group").unwrap();
        let kept = scene.add_node(group, "Kept").unwrap();
        let gone = scene.add_node(root, "Gone").unwrap();
        scene.add_node(gone, "Child").unwrap();

        let mut live = LivenessSet::default();
        live.live.insert(Entity::Node(kept));
        let plan = SweepPlan::from_liveness(&scene, &live);
        assert_eq!(plan.nodes, vec![gone]);
        assert!(plan.behaviors.is_empty());
    }
}
