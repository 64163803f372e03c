//! Toggle-unused planning.
//!
//! A heavy instance that stays live only because some entrypoints reach it can
//! be switched off together with them: when every such entrypoint sits under
//! one node whose own `active` flag is animated, that node's activeness can
//! drive the instance's `enabled` flag.

use std::collections::VecDeque;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use rigtrim_animation_core::Activeness;
use rigtrim_api_core::Entity;
use rigtrim_scene_core::{BehaviorId, BehaviorType, NodeId, SceneGraph};

use crate::reachability::{ActivenessMap, LivenessSet};
use crate::types::DependencyGraph;

/// Drive `behavior`'s `enabled` from `driver`'s activeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleRewrite {
    pub behavior: BehaviorId,
    pub driver: NodeId,
}

pub struct TogglePlanner<'a> {
    scene: &'a SceneGraph,
    graph: &'a DependencyGraph,
    liveness: &'a LivenessSet,
    activeness: &'a ActivenessMap,
}

fn is_heavy(kind: &BehaviorType) -> bool {
    matches!(
        kind,
        BehaviorType::BoneChain
            | BehaviorType::ParticleSystem
            | BehaviorType::Light
            | BehaviorType::AudioSource
    )
}

impl<'a> TogglePlanner<'a> {
    pub fn new(
        scene: &'a SceneGraph,
        graph: &'a DependencyGraph,
        liveness: &'a LivenessSet,
        activeness: &'a ActivenessMap,
    ) -> Self {
        Self {
            scene,
            graph,
            liveness,
            activeness,
        }
    }

    pub fn plan(&self) -> Vec<ToggleRewrite> {
        self.scene
            .behaviors()
            .filter(|b| is_heavy(&b.kind) && self.liveness.is_live(b.id))
            .filter_map(|b| self.plan_one(b.id, b.node))
            .collect()
    }

    fn plan_one(&self, behavior: BehaviorId, node: NodeId) -> Option<ToggleRewrite> {
        let target = Entity::Behavior(behavior);
        if self.graph.is_entrypoint(target) {
            return None;
        }
        let owners = self.reaching_entrypoint_nodes(target);
        let common = self.common_ancestor(&owners)?;
        let driver = std::iter::once(common)
            .chain(self.scene.ancestors(common))
            .find(|n| self.activeness.node_self(*n) == Activeness::Maybe)?;
        if self.scene.is_ancestor_or_self(driver, node) {
            log::debug!("{behavior} already follows {driver} through the hierarchy");
            return None;
        }
        Some(ToggleRewrite { behavior, driver })
    }

    /// Owner nodes of the live entrypoints that reach `target`.
    fn reaching_entrypoint_nodes(&self, target: Entity) -> Vec<NodeId> {
        let mut seen: HashSet<Entity> = HashSet::new();
        let mut queue = VecDeque::from([target]);
        seen.insert(target);
        let mut owners = Vec::new();
        while let Some(entity) = queue.pop_front() {
            for edge in self.graph.incoming(entity) {
                let from = edge.from;
                if !self.liveness.is_live(from) || !seen.insert(from) {
                    continue;
                }
                if self.graph.is_entrypoint(from) {
                    if let Entity::Behavior(b) = from {
                        if let Some(instance) = self.scene.behavior(b) {
                            owners.push(instance.node);
                        }
                    }
                }
                queue.push_back(from);
            }
        }
        owners
    }

    fn common_ancestor(&self, nodes: &[NodeId]) -> Option<NodeId> {
        let (first, rest) = nodes.split_first()?;
        let mut chain: Vec<NodeId> = std::iter::once(*first)
            .chain(self.scene.ancestors(*first))
            .collect();
        for node in rest {
            chain.retain(|candidate| self.scene.is_ancestor_or_self(*candidate, *node));
        }
        chain.first().copied()
    }
}
