use anyhow::{Context, Result};

use rigtrim_animation_core::Activeness;
use rigtrim_api_core::diagnostics::codes;
use rigtrim_api_core::{Entity, Subject, Value};
use rigtrim_graph_core::{ActivenessMap, DependencyGraph, DependencyKind, LivenessSet};
use rigtrim_scene_core::{props, BehaviorType, NodeId, SceneGraph};

use super::PassContext;

/// Fold empty, static, identity-transform nodes into their parent.
pub(crate) fn run(cx: &mut PassContext<'_>) -> Result<()> {
    let (graph, activeness, live) = cx.analysis();
    let root = cx.scene.root();
    let candidates: Vec<NodeId> = cx
        .scene
        .subtree(root)
        .into_iter()
        .filter(|n| *n != root)
        .collect();

    for node in candidates {
        if !is_flattenable(cx, &graph, &activeness, &live, node) {
            continue;
        }
        let (Some(parent), Some(path)) = (cx.scene.parent(node), cx.scene.path_of(node)) else {
            continue;
        };
        let children = cx
            .scene
            .node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        for child in children {
            cx.shadow.record_move_node(cx.scene, child, parent);
            cx.scene
                .reparent(child, parent)
                .with_context(|| format!("lift children of '{path}'"))?;
        }
        cx.shadow.record_merge_node(cx.scene, node, parent);
        cx.scene
            .delete_node(node)
            .with_context(|| format!("flatten '{path}'"))?;
        cx.diagnostics.info(
            codes::NODE_FLATTENED,
            format!("flattened empty node '{path}' into its parent"),
            vec![Subject::Node(node), Subject::Node(parent)],
        );
        cx.flattened_nodes.push(path);
    }
    Ok(())
}

fn is_flattenable(
    cx: &PassContext<'_>,
    graph: &DependencyGraph,
    activeness: &ActivenessMap,
    live: &LivenessSet,
    node: NodeId,
) -> bool {
    let scene: &SceneGraph = &*cx.scene;
    let Some(n) = scene.node(node) else {
        return false;
    };
    let Some(parent) = n.parent else {
        return false;
    };
    // Only the node-defining Transform may be attached.
    let [transform] = n.behaviors.as_slice() else {
        return false;
    };
    let transform = *transform;
    if activeness.node_self(node) != Activeness::AlwaysTrue {
        return false;
    }
    // Nothing animates the node or its Transform.
    if cx
        .summary
        .iter()
        .any(|(e, _, _)| e == Entity::Node(node) || e == Entity::Behavior(transform))
    {
        return false;
    }
    let Some(instance) = scene.behavior(transform) else {
        return false;
    };
    if instance.kind != BehaviorType::Transform
        || !is_identity(
            instance.value(props::LOCAL_POSITION),
            instance.value(props::LOCAL_ROTATION),
            instance.value(props::LOCAL_SCALE),
        )
    {
        return false;
    }
    // Something other than the hierarchy itself depends on this exact node.
    let pinned = [Entity::Node(node), Entity::Behavior(transform)]
        .into_iter()
        .flat_map(|target| graph.incoming(target))
        .any(|edge| {
            live.is_live(edge.from)
                && !matches!(edge.kind, DependencyKind::Parent | DependencyKind::Structural)
        });
    if pinned || scene.behaviors().any(|b| b.node_refs().contains(&node)) {
        return false;
    }
    // Lifted children must not collide with the parent's other children.
    let Some(p) = scene.node(parent) else {
        return false;
    };
    let siblings: Vec<&str> = p
        .children
        .iter()
        .filter(|c| **c != node)
        .filter_map(|c| scene.node(*c))
        .map(|c| c.name.as_str())
        .collect();
    !n.children
        .iter()
        .filter_map(|c| scene.node(*c))
        .any(|c| siblings.contains(&c.name.as_str()))
}

fn is_identity(position: Option<&Value>, rotation: Option<&Value>, scale: Option<&Value>) -> bool {
    let position_ok = match position {
        None => true,
        Some(Value::Vec3(v)) => v.iter().all(|c| *c == 0.0),
        Some(_) => false,
    };
    let rotation_ok = match rotation {
        None => true,
        Some(Value::Quat([x, y, z, w])) => *x == 0.0 && *y == 0.0 && *z == 0.0 && *w == 1.0,
        Some(_) => false,
    };
    let scale_ok = match scale {
        None => true,
        Some(Value::Vec3(v)) => v.iter().all(|c| *c == 1.0),
        Some(_) => false,
    };
    position_ok && rotation_ok && scale_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_accepts_absent_components() {
        assert!(is_identity(None, None, None));
        assert!(is_identity(
            Some(&Value::vec3(0.0, 0.0, 0.0)),
            Some(&Value::identity_quat()),
            Some(&Value::vec3(1.0, 1.0, 1.0))
        ));
        assert!(!is_identity(Some(&Value::vec3(0.0, 0.1, 0.0)), None, None));
        assert!(!is_identity(None, Some(&Value::quat(0.0, 0.7, 0.0, 0.7)), None));
        assert!(!is_identity(None, None, Some(&Value::f(1.0))));
    }
}
