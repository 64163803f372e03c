//! Animation Modification Analyzer.
//!
//! Walks every animator's motion graph (or its special-slot stack), composes
//! layers, state machines and blend trees with the merge algebra, then folds
//! each animator's own activeness into its contribution. Motion sources that
//! move transforms outside of animation (bone chains, constraints) are added
//! last as `Variable`.

mod layers;
mod motion;
mod sources;

use hashbrown::HashSet;
use thiserror::Error;

use rigtrim_api_core::diagnostics::codes;
use rigtrim_api_core::{Diagnostics, Subject};
use rigtrim_scene_core::{BehaviorId, BehaviorInstance, BehaviorType, NodeId, SceneGraph};

use crate::binding::SceneResolver;
use crate::config::AnalyzerConfig;
use crate::data::{MotionLibrary, OverrideTable, SlotKind};
use crate::modification::{LayerApplication, ModificationSet};
use crate::summary::{behavior_activeness, Activeness, ModificationSummary};

pub use motion::{curve_modification, float_keys_constant};
pub use sources::moved_nodes;

/// Malformed authoring data. Aborts the motion graph it was found in.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("motion slot '{slot}' uses controller '{controller}' which has no layers")]
    EmptyMotionSlot {
        slot: &'static str,
        controller: String,
    },
    #[error("blend tree in '{controller}' has out-of-range blend type {raw}")]
    InvalidBlendType { controller: String, raw: i32 },
    #[error("layer {layer} of '{controller}' syncs to missing layer {source_layer}")]
    InvalidSyncedLayer {
        controller: String,
        layer: usize,
        source_layer: usize,
    },
}

impl AnalysisError {
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::EmptyMotionSlot { .. } => codes::EMPTY_MOTION_SLOT,
            AnalysisError::InvalidBlendType { .. } => codes::INVALID_BLEND_TYPE,
            AnalysisError::InvalidSyncedLayer { .. } => codes::INVALID_SYNCED_LAYER,
        }
    }

    pub fn asset(&self) -> &str {
        match self {
            AnalysisError::EmptyMotionSlot { controller, .. }
            | AnalysisError::InvalidBlendType { controller, .. }
            | AnalysisError::InvalidSyncedLayer { controller, .. } => controller,
        }
    }
}

/// Diagnostics sink shared by every walker of one run. Repeated reports of the
/// same construct on the same subject are collapsed.
pub(crate) struct AnalysisState<'d> {
    diagnostics: &'d mut Diagnostics,
    reported: HashSet<(&'static str, String, BehaviorId)>,
    complete: bool,
}

impl<'d> AnalysisState<'d> {
    fn new(diagnostics: &'d mut Diagnostics) -> Self {
        Self {
            diagnostics,
            reported: HashSet::new(),
            complete: true,
        }
    }

    /// Something could not be analyzed; untouched properties are no longer
    /// provably static.
    pub(crate) fn mark_incomplete(&mut self) {
        self.complete = false;
    }

    pub(crate) fn warn_once(
        &mut self,
        code: &'static str,
        asset: &str,
        animator: BehaviorId,
        message: String,
    ) {
        if self.reported.insert((code, asset.to_string(), animator)) {
            self.diagnostics.warning(
                code,
                message,
                vec![Subject::Behavior(animator), Subject::Asset(asset.to_string())],
            );
        }
    }

    fn error(&mut self, err: &AnalysisError, animator: BehaviorId) {
        self.diagnostics.error(
            err.code(),
            err.to_string(),
            vec![Subject::Behavior(animator), Subject::Asset(err.asset().to_string())],
        );
    }
}

/// Everything a walker needs to evaluate one animator's motion graph.
pub(crate) struct MotionWalker<'a, 's, 'd> {
    pub(crate) library: &'a MotionLibrary,
    pub(crate) resolver: &'a SceneResolver<'a>,
    pub(crate) config: &'a AnalyzerConfig,
    pub(crate) animator: BehaviorId,
    pub(crate) node: NodeId,
    pub(crate) overrides: Option<&'a OverrideTable>,
    /// Controller currently being walked, for error attribution.
    pub(crate) controller: String,
    pub(crate) state: &'s mut AnalysisState<'d>,
}

pub struct Analyzer<'a> {
    scene: &'a SceneGraph,
    library: &'a MotionLibrary,
    config: AnalyzerConfig,
}

impl<'a> Analyzer<'a> {
    pub fn new(scene: &'a SceneGraph, library: &'a MotionLibrary, config: AnalyzerConfig) -> Self {
        Self {
            scene,
            library,
            config,
        }
    }

    /// Produce the summary for the whole scene. Non-fatal problems are
    /// reported to `diagnostics`; the scene is never modified.
    pub fn analyze(&self, diagnostics: &mut Diagnostics) -> ModificationSummary {
        let mut state = AnalysisState::new(diagnostics);
        let resolver = SceneResolver::new(self.scene);

        let mut contributions: Vec<(BehaviorId, ModificationSet)> = Vec::new();
        for animator in self
            .scene
            .behaviors()
            .filter(|b| b.kind == BehaviorType::Animator)
        {
            match self.analyze_animator(animator, &resolver, &mut state) {
                Ok(set) => {
                    log::debug!(
                        "animator {} touches {} propert(ies)",
                        animator.id,
                        set.len()
                    );
                    contributions.push((animator.id, set));
                }
                Err(err) => {
                    state.error(&err, animator.id);
                    state.mark_incomplete();
                }
            }
        }

        let sources = if self.config.include_motion_sources {
            sources::motion_sources(self.scene)
        } else {
            Vec::new()
        };

        // Animator enablement can itself be animated, so fold it against a
        // preliminary summary built from every contribution.
        let preliminary = ModificationSummary::new(
            self.combine(&contributions, &sources),
            state.complete,
        );
        for (animator, set) in contributions.iter_mut() {
            match behavior_activeness(self.scene, &preliminary, *animator) {
                Activeness::AlwaysFalse => {
                    log::debug!("animator {animator} is never active; dropping its contribution");
                    *set = ModificationSet::new();
                }
                Activeness::Maybe => set.downgrade_all(),
                Activeness::AlwaysTrue => {}
            }
        }
        let live_sources: Vec<_> = sources
            .into_iter()
            .filter(|s| !behavior_activeness(self.scene, &preliminary, s.behavior).is_always_false())
            .collect();

        ModificationSummary::new(self.combine(&contributions, &live_sources), state.complete)
    }

    fn combine(
        &self,
        contributions: &[(BehaviorId, ModificationSet)],
        sources: &[sources::MotionSource],
    ) -> ModificationSet {
        let mut merged = ModificationSet::new();
        for (_, set) in contributions {
            merged.merge_side_by_side(set);
        }
        for source in sources {
            for (entity, root) in &source.targets {
                merged.mark_variable(*entity, root);
            }
        }
        merged
    }

    fn analyze_animator(
        &self,
        animator: &BehaviorInstance,
        resolver: &SceneResolver<'_>,
        state: &mut AnalysisState<'_>,
    ) -> Result<ModificationSet, AnalysisError> {
        let overrides = animator
            .text("overrides")
            .and_then(|name| self.library.overrides.get(name));
        let mut walker = MotionWalker {
            library: self.library,
            resolver,
            config: &self.config,
            animator: animator.id,
            node: animator.node,
            overrides,
            controller: String::new(),
            state,
        };

        if let Some(slots) = self
            .scene
            .first_behavior_of(animator.node, &BehaviorType::MotionSlots)
            .and_then(|id| self.scene.behavior(id))
        {
            return walker.slot_stack(slots);
        }

        let controller = animator
            .text("controller")
            .or_else(|| overrides.map(|o| o.base.as_str()));
        let Some(name) = controller else {
            return Ok(ModificationSet::new());
        };
        let mut acc = ModificationSet::new();
        walker.controller_into(name, &mut acc, Some(LayerApplication::Always), false)?;
        Ok(acc)
    }
}

impl MotionWalker<'_, '_, '_> {
    /// Composite the special slots in order, each slot's controller stacked
    /// over the slots before it.
    fn slot_stack(&mut self, slots: &BehaviorInstance) -> Result<ModificationSet, AnalysisError> {
        let library = self.library;
        let mut acc = ModificationSet::new();
        for slot in SlotKind::ORDER {
            let name = slots
                .text(slot.property_name())
                .or_else(|| library.default_slots.get(&slot).map(String::as_str));
            let Some(name) = name else {
                continue;
            };
            if library
                .controllers
                .get(name)
                .is_some_and(|c| c.layers.is_empty())
            {
                return Err(AnalysisError::EmptyMotionSlot {
                    slot: slot.property_name(),
                    controller: name.to_string(),
                });
            }
            // Only the base slot is composited unconditionally; the others
            // follow their layers' weights.
            let first_layer = (slot == SlotKind::Base).then_some(LayerApplication::Always);
            self.controller_into(name, &mut acc, first_layer, slot == SlotKind::Additive)?;
        }
        Ok(acc)
    }
}
