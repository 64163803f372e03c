//! Behaviors that move transforms without animation clips.

use rigtrim_api_core::Entity;
use rigtrim_scene_core::{props, BehaviorId, BehaviorInstance, BehaviorType, NodeId, SceneGraph};

/// Transform properties a behavior can drive at runtime.
pub(crate) struct MotionSource {
    pub(crate) behavior: BehaviorId,
    pub(crate) targets: Vec<(Entity, &'static str)>,
}

fn moved_properties(kind: &BehaviorType) -> &'static [&'static str] {
    match kind {
        BehaviorType::PositionConstraint => &[props::LOCAL_POSITION],
        BehaviorType::RotationConstraint | BehaviorType::AimConstraint => &[props::LOCAL_ROTATION],
        BehaviorType::ScaleConstraint => &[props::LOCAL_SCALE],
        BehaviorType::ParentConstraint | BehaviorType::BoneChain => {
            &[props::LOCAL_POSITION, props::LOCAL_ROTATION]
        }
        _ => &[],
    }
}

/// Nodes a bone chain or constraint moves.
pub fn moved_nodes(scene: &SceneGraph, behavior: &BehaviorInstance) -> Vec<NodeId> {
    match behavior.kind {
        BehaviorType::BoneChain => {
            let root = behavior
                .property("root")
                .and_then(|p| p.as_node())
                .unwrap_or(behavior.node);
            let ignores = behavior
                .property("ignores")
                .map(|p| p.node_refs())
                .unwrap_or_default();
            scene
                .subtree(root)
                .into_iter()
                .filter(|n| !ignores.iter().any(|i| scene.is_ancestor_or_self(*i, *n)))
                .collect()
        }
        ref kind if kind.is_constraint() => {
            let target = behavior
                .property("target")
                .and_then(|p| p.as_node())
                .unwrap_or(behavior.node);
            vec![target]
        }
        _ => Vec::new(),
    }
}

pub(crate) fn motion_sources(scene: &SceneGraph) -> Vec<MotionSource> {
    scene
        .behaviors()
        .filter_map(|b| {
            let moved = moved_properties(&b.kind);
            if moved.is_empty() {
                return None;
            }
            let targets = moved_nodes(scene, b)
                .into_iter()
                .filter_map(|n| scene.node_defining_behavior(n))
                .flat_map(|t| moved.iter().map(move |p| (Entity::Behavior(t), *p)))
                .collect();
            Some(MotionSource {
                behavior: b.id,
                targets,
            })
        })
        .collect()
}
