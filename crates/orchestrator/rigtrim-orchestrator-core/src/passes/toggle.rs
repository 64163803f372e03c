use anyhow::{Context, Result};

use rigtrim_api_core::diagnostics::codes;
use rigtrim_api_core::Subject;
use rigtrim_graph_core::TogglePlanner;
use rigtrim_scene_core::{props, PropertyValue};

use super::PassContext;

/// Tie heavy instances to the node that switches everything using them.
pub(crate) fn run(cx: &mut PassContext<'_>) -> Result<()> {
    let (graph, activeness, live) = cx.analysis();
    let rewrites = TogglePlanner::new(cx.scene, &graph, &live, &activeness).plan();

    for rewrite in rewrites {
        let driver_path = cx.scene.path_of(rewrite.driver).unwrap_or_default();
        let kind = cx
            .scene
            .behavior(rewrite.behavior)
            .map(|b| b.kind.to_string())
            .unwrap_or_default();
        cx.scene
            .set_property(
                rewrite.behavior,
                props::ENABLED_DRIVER,
                PropertyValue::Node(rewrite.driver),
            )
            .with_context(|| format!("drive {kind} from '{driver_path}'"))?;
        cx.diagnostics.info(
            codes::BEHAVIOR_TOGGLED,
            format!("{kind} now follows the activeness of '{driver_path}'"),
            vec![
                Subject::Behavior(rewrite.behavior),
                Subject::Node(rewrite.driver),
            ],
        );
        cx.toggles.push(rewrite);
    }
    Ok(())
}
