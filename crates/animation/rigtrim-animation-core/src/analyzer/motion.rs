//! Clips, curves and blend trees.

use rigtrim_api_core::diagnostics::codes;
use rigtrim_api_core::Value;

use crate::binding::TargetResolver;
use crate::data::{BlendKind, Clip, Curve, Keyframe, Motion};
use crate::modification::{ModificationSet, PropertyModification};

use super::{AnalysisError, MotionWalker};

/// A run of float keys holds a single value: one key, or equal values with
/// flat tangents.
pub fn float_keys_constant(keys: &[Keyframe]) -> Option<f32> {
    let first = keys.first()?;
    if keys.len() == 1 {
        return Some(first.value);
    }
    let flat = keys
        .iter()
        .all(|k| k.value == first.value && k.in_tangent == 0.0 && k.out_tangent == 0.0);
    flat.then_some(first.value)
}

/// Verdict for one curve. Empty curves contribute nothing.
pub fn curve_modification(curve: &Curve) -> Option<PropertyModification> {
    match curve {
        Curve::Float { keys } => {
            if keys.is_empty() {
                return None;
            }
            Some(match float_keys_constant(keys) {
                Some(v) => PropertyModification::ConstantAlways(Value::Float(v)),
                None => PropertyModification::Variable,
            })
        }
        Curve::Object { keys } => {
            let first = keys.first()?;
            Some(if keys.iter().all(|k| k.value == first.value) {
                PropertyModification::ConstantAlways(Value::Asset(first.value.clone()))
            } else {
                PropertyModification::Variable
            })
        }
    }
}

impl MotionWalker<'_, '_, '_> {
    pub(crate) fn motion_set(&mut self, motion: &Motion) -> Result<ModificationSet, AnalysisError> {
        match motion {
            Motion::Clip { clip } => Ok(self.clip_set(clip)),
            Motion::BlendTree {
                blend_type,
                children,
            } => {
                let kind =
                    BlendKind::from_raw(*blend_type).ok_or_else(|| AnalysisError::InvalidBlendType {
                        controller: self.controller.clone(),
                        raw: *blend_type,
                    })?;
                let mut merged = ModificationSet::new();
                for child in children {
                    let set = self.motion_set(child)?;
                    merged.merge_side_by_side(&set);
                }
                if !kind.is_partition() {
                    merged.force_variable();
                }
                Ok(merged)
            }
            Motion::Opaque { type_name } => {
                self.state.warn_once(
                    codes::UNKNOWN_MOTION_NODE,
                    type_name,
                    self.animator,
                    format!(
                        "motion node '{type_name}' in '{}' is not understood; ignoring it",
                        self.controller
                    ),
                );
                self.state.mark_incomplete();
                Ok(ModificationSet::new())
            }
        }
    }

    fn clip_set(&mut self, name: &str) -> ModificationSet {
        let name = self.overrides.map_or(name, |o| o.substitute(name));
        let Some(clip) = self.library.clips.get(name) else {
            self.state.warn_once(
                codes::MISSING_CLIP,
                name,
                self.animator,
                format!("clip '{name}' referenced by '{}' is missing", self.controller),
            );
            self.state.mark_incomplete();
            return ModificationSet::new();
        };
        self.bind_clip(clip)
    }

    fn bind_clip(&self, clip: &Clip) -> ModificationSet {
        let mut set = ModificationSet::new();
        for binding in &clip.curves {
            let Some(modification) = curve_modification(&binding.curve) else {
                continue;
            };
            match self.resolver.resolve(self.node, binding) {
                Some(entity) => set.record(entity, &binding.property, modification),
                None => log::debug!(
                    "clip '{}': binding {}:{}.{} does not resolve; skipped",
                    clip.name,
                    binding.path,
                    binding.target,
                    binding.property
                ),
            }
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ObjectKeyframe;

    #[test]
    fn flat_run_is_constant() {
        let keys = vec![Keyframe::flat(0.0, 0.3), Keyframe::flat(1.0, 0.3)];
        assert_eq!(float_keys_constant(&keys), Some(0.3));
    }

    #[test]
    fn sloped_tangent_is_variable() {
        let mut keys = vec![Keyframe::flat(0.0, 0.3), Keyframe::flat(1.0, 0.3)];
        keys[0].out_tangent = 1.0;
        assert_eq!(float_keys_constant(&keys), None);
        assert_eq!(
            curve_modification(&Curve::Float { keys }),
            Some(PropertyModification::Variable)
        );
    }

    #[test]
    fn single_key_ignores_tangents() {
        let mut key = Keyframe::flat(0.0, 2.0);
        key.in_tangent = 5.0;
        assert_eq!(float_keys_constant(&[key]), Some(2.0));
    }

    #[test]
    fn object_curves_compare_assets() {
        let same = Curve::Object {
            keys: vec![
                ObjectKeyframe { time: 0.0, value: "Skin".into() },
                ObjectKeyframe { time: 1.0, value: "Skin".into() },
            ],
        };
        assert_eq!(
            curve_modification(&same),
            Some(PropertyModification::ConstantAlways(Value::Asset("Skin".into())))
        );
        let swap = Curve::Object {
            keys: vec![
                ObjectKeyframe { time: 0.0, value: "Skin".into() },
                ObjectKeyframe { time: 1.0, value: "Metal".into() },
            ],
        };
        assert_eq!(curve_modification(&swap), Some(PropertyModification::Variable));
        assert_eq!(curve_modification(&Curve::Object { keys: vec![] }), None);
    }
}
