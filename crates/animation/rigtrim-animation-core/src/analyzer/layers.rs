//! Layer stacks and state machines.

use indexmap::IndexMap;

use rigtrim_api_core::diagnostics::codes;

use crate::data::{Controller, Layer, LayerBlending, Motion, StateMachine};
use crate::modification::{LayerApplication, ModificationSet};

use super::{AnalysisError, MotionWalker};

/// How a layer composites at runtime; `None` when it never does.
pub(crate) fn layer_application(
    index: usize,
    layer: &Layer,
    controlled: &[usize],
    first_layer: Option<LayerApplication>,
) -> Option<LayerApplication> {
    if index == 0 {
        if let Some(application) = first_layer {
            return Some(application);
        }
    }
    if controlled.contains(&index) {
        return Some(LayerApplication::Conditional);
    }
    if layer.weight >= 1.0 {
        Some(LayerApplication::Always)
    } else if layer.weight <= 0.0 {
        None
    } else {
        Some(LayerApplication::Conditional)
    }
}

impl MotionWalker<'_, '_, '_> {
    /// Stack every layer of controller `name` over `acc`.
    pub(crate) fn controller_into(
        &mut self,
        name: &str,
        acc: &mut ModificationSet,
        first_layer: Option<LayerApplication>,
        force_additive: bool,
    ) -> Result<(), AnalysisError> {
        let library = self.library;
        let Some(controller) = library.controllers.get(name) else {
            self.state.warn_once(
                codes::MISSING_CONTROLLER,
                name,
                self.animator,
                format!("controller '{name}' is not in the motion library"),
            );
            self.state.mark_incomplete();
            return Ok(());
        };
        let previous = std::mem::replace(&mut self.controller, controller.name.clone());
        let result = self.stack_layers(controller, acc, first_layer, force_additive);
        self.controller = previous;
        result
    }

    fn stack_layers(
        &mut self,
        controller: &Controller,
        acc: &mut ModificationSet,
        first_layer: Option<LayerApplication>,
        force_additive: bool,
    ) -> Result<(), AnalysisError> {
        let controlled = controller.controlled_layers();
        for (index, layer) in controller.layers.iter().enumerate() {
            let Some(application) = layer_application(index, layer, &controlled, first_layer) else {
                log::trace!("layer {index} of '{}' has zero weight; skipped", controller.name);
                continue;
            };
            let mut set = match layer.synced_layer {
                Some(source) => {
                    let source_layer = controller.layers.get(source).ok_or_else(|| {
                        AnalysisError::InvalidSyncedLayer {
                            controller: controller.name.clone(),
                            layer: index,
                            source_layer: source,
                        }
                    })?;
                    self.state_machine_set(&source_layer.state_machine, Some(&layer.synced_motions))?
                }
                None => self.state_machine_set(&layer.state_machine, None)?,
            };
            let additive = force_additive || layer.blending == LayerBlending::Additive;
            if additive && self.config.additive_layers_variable {
                set.force_variable();
            }
            acc.stack(&set, application);
        }
        Ok(())
    }

    /// Exactly one state plays at a time, so states merge side by side.
    fn state_machine_set(
        &mut self,
        machine: &StateMachine,
        synced_motions: Option<&IndexMap<String, Motion>>,
    ) -> Result<ModificationSet, AnalysisError> {
        let states = machine.all_states();
        let mut per_state = Vec::with_capacity(states.len());
        for state in &states {
            let motion = synced_motions
                .and_then(|m| m.get(&state.name))
                .or(state.motion.as_ref());
            let set = match motion {
                Some(motion) => self.motion_set(motion)?,
                None => ModificationSet::new(),
            };
            per_state.push((state.write_defaults, set));
        }

        let mut merged = ModificationSet::new();
        for (_, set) in &per_state {
            merged.merge_side_by_side(set);
        }

        // A write-defaults state resets what it does not animate, so those
        // properties can also hold their default value.
        if self.config.honor_write_defaults {
            let touched: Vec<_> = merged
                .iter()
                .map(|(entity, property, _)| (entity, property.to_string()))
                .collect();
            for (entity, property) in touched {
                let reset = per_state
                    .iter()
                    .any(|(write_defaults, set)| *write_defaults && !set.contains(entity, &property));
                if reset {
                    merged.downgrade(entity, &property);
                }
            }
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(weight: f32) -> Layer {
        Layer {
            name: "l".into(),
            weight,
            blending: LayerBlending::Override,
            state_machine: StateMachine::default(),
            synced_layer: None,
            synced_motions: IndexMap::new(),
        }
    }

    #[test]
    fn first_layer_is_always_applied() {
        assert_eq!(
            layer_application(0, &layer(0.0), &[], Some(LayerApplication::Always)),
            Some(LayerApplication::Always)
        );
    }

    #[test]
    fn weights_and_controls_decide_application() {
        assert_eq!(
            layer_application(1, &layer(1.0), &[], None),
            Some(LayerApplication::Always)
        );
        assert_eq!(
            layer_application(1, &layer(1.0), &[1], None),
            Some(LayerApplication::Conditional)
        );
        assert_eq!(layer_application(1, &layer(0.0), &[], None), None);
        assert_eq!(
            layer_application(1, &layer(0.0), &[1], None),
            Some(LayerApplication::Conditional)
        );
        assert_eq!(
            layer_application(2, &layer(0.4), &[], None),
            Some(LayerApplication::Conditional)
        );
    }
}
