use anyhow::{Context, Result};

use rigtrim_api_core::diagnostics::codes;
use rigtrim_api_core::Subject;
use rigtrim_shadow_core::MergeGroups;

use super::PassContext;
use crate::report::RemovedBehavior;

/// Fold every merge group into its target, innermost groups first.
pub(crate) fn run(cx: &mut PassContext<'_>, groups: &mut MergeGroups) -> Result<()> {
    let order = groups
        .apply(&mut cx.shadow, cx.scene)
        .context("order merge groups")?;

    for name in &order {
        let Some(target) = groups.target(name) else {
            continue;
        };
        for &member in groups.members(name) {
            if member == target {
                continue;
            }
            let Some(instance) = cx.scene.behavior(member) else {
                log::debug!("merge group '{name}': member {member} already gone");
                continue;
            };
            let kind = instance.kind.clone();
            let node = instance.node;
            let path = cx.scene.path_of(node).unwrap_or_default();
            cx.scene
                .delete_behavior(member)
                .with_context(|| format!("merge {kind} on '{path}' into group '{name}'"))?;
            cx.diagnostics.info(
                codes::BEHAVIOR_REMOVED,
                format!("merged {kind} on '{path}' into group '{name}'"),
                vec![Subject::Behavior(member), Subject::Behavior(target)],
            );
            cx.merged_behaviors.push(RemovedBehavior { path, kind });
        }
    }
    Ok(())
}
