use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use rigtrim_shadow_core::MergeGroups;

use crate::config::OptimizerConfig;
use crate::passes::{flatten, merge, sweep, toggle, PassContext};

/// Which sub-passes a run goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    /// Sweep -> flatten -> toggle -> merge groups
    #[default]
    Full,
    /// Sweep and nothing else.
    SweepOnly,
}

fn timed(
    cx: &mut PassContext<'_>,
    name: &str,
    pass: impl FnOnce(&mut PassContext<'_>) -> Result<()>,
) -> Result<()> {
    let start = Instant::now();
    pass(cx)?;
    let ms = start.elapsed().as_secs_f32() * 1000.0;
    log::debug!("{name} pass took {ms:.3} ms");
    cx.timings.insert(format!("{name}_ms"), ms);
    Ok(())
}

/// Run the sweep alone.
pub(crate) fn run_sweep_only(cx: &mut PassContext<'_>, config: &OptimizerConfig) -> Result<()> {
    if config.remove_unused {
        timed(cx, "sweep", sweep::run)?;
    }
    Ok(())
}

/// Run every enabled sub-pass. Each one re-derives the dependency graph from
/// what the previous one left behind.
pub(crate) fn run_full(
    cx: &mut PassContext<'_>,
    config: &OptimizerConfig,
    groups: &mut MergeGroups,
) -> Result<()> {
    run_sweep_only(cx, config)?;
    if config.flatten_empty_nodes {
        timed(cx, "flatten", flatten::run)?;
    }
    if config.toggle_unused {
        timed(cx, "toggle", toggle::run)?;
    }
    if !groups.is_empty() {
        timed(cx, "merge", |cx| merge::run(cx, groups))?;
    }
    Ok(())
}
