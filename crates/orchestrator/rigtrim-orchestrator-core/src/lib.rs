//! rigtrim orchestrator
//!
//! One optimization run over a scene: analyze what the motion library can do,
//! mark what an active entrypoint still needs, sweep the rest, fold empty
//! nodes, drive heavy instances from their switches and hand back a
//! [`MappingTable`] so animations written against the old hierarchy can be
//! rebound.
//!
//! ```no_run
//! use rigtrim_orchestrator::{Optimizer, OptimizerConfig};
//! # fn demo(scene: &mut rigtrim_scene_core::SceneGraph, library: &rigtrim_animation_core::MotionLibrary) -> anyhow::Result<()> {
//! let report = Optimizer::new(OptimizerConfig::default()).run(scene, library)?;
//! println!("{}", report.to_json()?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod diagnostics;
pub mod report;
pub mod scheduler;

mod passes;

use anyhow::Result;

use rigtrim_animation_core::{Analyzer, MotionLibrary};
use rigtrim_api_core::Diagnostics;
use rigtrim_graph_core::ParserRegistry;
use rigtrim_scene_core::SceneGraph;
use rigtrim_shadow_core::MergeGroups;

pub use crate::config::OptimizerConfig;
pub use crate::diagnostics::DiagnosticsCfg;
pub use crate::report::{OptimizationReport, RemovedBehavior};
pub use crate::scheduler::Schedule;
pub use rigtrim_shadow_core::{BindingMapping, MappingTable};

pub struct Optimizer {
    config: OptimizerConfig,
    registry: ParserRegistry,
    merge_groups: MergeGroups,
}

impl Optimizer {
    /// Optimizer with the built-in behavior parsers.
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            config,
            registry: ParserRegistry::with_builtin(),
            merge_groups: MergeGroups::new(),
        }
    }

    /// Replace the parser registry, e.g. one extended with host behavior types.
    pub fn with_registry(mut self, registry: ParserRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Merge groups folded after the toggle pass. Only honored by [`Schedule::Full`].
    pub fn with_merge_groups(mut self, groups: MergeGroups) -> Self {
        self.merge_groups = groups;
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Optimize `scene` in place.
    pub fn run(&self, scene: &mut SceneGraph, library: &MotionLibrary) -> Result<OptimizationReport> {
        let mut diagnostics = Diagnostics::new();
        let summary =
            Analyzer::new(scene, library, self.config.analyzer.clone()).analyze(&mut diagnostics);
        log::info!(
            "analyzed {} animated properties, complete: {}",
            summary.len(),
            summary.is_complete()
        );

        let mut cx = passes::PassContext::new(scene, &self.registry, summary, diagnostics);
        match self.config.schedule {
            Schedule::Full => {
                // Sort caches live for one run only.
                let mut groups = self.merge_groups.clone();
                scheduler::run_full(&mut cx, &self.config, &mut groups)?;
            }
            Schedule::SweepOnly => scheduler::run_sweep_only(&mut cx, &self.config)?,
        }
        let report = cx.finish(&self.config.diagnostics);
        log::info!(
            "removed {} node(s) and {} behavior(s), flattened {}, toggled {}",
            report.removed_nodes.len(),
            report.removed_behaviors.len(),
            report.flattened_nodes.len(),
            report.toggles.len()
        );
        Ok(report)
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}
