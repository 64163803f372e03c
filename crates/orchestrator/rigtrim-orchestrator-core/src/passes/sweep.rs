use anyhow::{Context, Result};

use rigtrim_api_core::diagnostics::codes;
use rigtrim_api_core::Subject;
use rigtrim_graph_core::SweepPlan;

use super::PassContext;
use crate::report::RemovedBehavior;

/// Delete everything no active entrypoint reaches.
pub(crate) fn run(cx: &mut PassContext<'_>) -> Result<()> {
    let (_, _, live) = cx.analysis();
    let plan = SweepPlan::from_liveness(cx.scene, &live);
    if plan.is_empty() {
        log::debug!("sweep: nothing to remove");
        return Ok(());
    }

    // Behaviors first: none of them sits inside a doomed subtree.
    for behavior in plan.behaviors {
        let Some(instance) = cx.scene.behavior(behavior) else {
            continue;
        };
        let kind = instance.kind.clone();
        let node = instance.node;
        let path = cx.scene.path_of(node).unwrap_or_default();

        cx.shadow.record_remove_behavior(cx.scene, behavior);
        cx.scene
            .delete_behavior(behavior)
            .with_context(|| format!("remove {kind} on '{path}'"))?;
        cx.diagnostics.info(
            codes::BEHAVIOR_REMOVED,
            format!("removed unused {kind} on '{path}'"),
            vec![Subject::Behavior(behavior), Subject::Node(node)],
        );
        cx.removed_behaviors.push(RemovedBehavior { path, kind });
    }

    for node in plan.nodes {
        let Some(path) = cx.scene.path_of(node) else {
            continue;
        };
        cx.shadow.record_remove_node(cx.scene, node);
        let gone = cx
            .scene
            .delete_node(node)
            .with_context(|| format!("remove node '{path}'"))?;
        cx.diagnostics.info(
            codes::NODE_REMOVED,
            format!("removed unused node '{path}' ({} in subtree)", gone.len()),
            vec![Subject::Node(node)],
        );
        cx.removed_nodes.push(path);
    }
    Ok(())
}
