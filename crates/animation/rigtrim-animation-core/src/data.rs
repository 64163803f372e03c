//! Motion-graph data model: controllers, layers, state machines, blend trees,
//! clips and their keyframe curves.

use std::fmt;

use indexmap::IndexMap;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use rigtrim_api_core::NodePath;
use rigtrim_scene_core::BehaviorType;

fn default_one() -> f32 {
    1.0
}

/// A single float keyframe with Hermite tangents.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
    #[serde(default)]
    pub in_weight: f32,
    #[serde(default)]
    pub out_weight: f32,
}

impl Keyframe {
    pub fn flat(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            ..Default::default()
        }
    }
}

/// Keyframe of an object-reference curve (material swaps and similar).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ObjectKeyframe {
    pub time: f32,
    pub value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Curve {
    Float { keys: Vec<Keyframe> },
    Object { keys: Vec<ObjectKeyframe> },
}

/// What a curve binds to on the node at `path`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BindingTarget {
    /// Node-level property such as `active`.
    Node,
    /// First behavior of this type on the node.
    Behavior(BehaviorType),
}

impl fmt::Display for BindingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingTarget::Node => f.write_str("Node"),
            BindingTarget::Behavior(kind) => kind.fmt(f),
        }
    }
}

impl Serialize for BindingTarget {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for BindingTarget {
    fn deserialize<D>(deserializer: D) -> Result<BindingTarget, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "" => Err(de::Error::custom("empty binding target")),
            "Node" => Ok(BindingTarget::Node),
            other => Ok(BindingTarget::Behavior(
                other.parse().map_err(de::Error::custom)?,
            )),
        }
    }
}

/// One animated property inside a clip.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CurveBinding {
    /// Node path relative to the animator's node.
    pub path: NodePath,
    #[serde(rename = "type")]
    pub target: BindingTarget,
    pub property: String,
    pub curve: Curve,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Clip {
    pub name: String,
    #[serde(default)]
    pub curves: Vec<CurveBinding>,
}

/// Blend-tree modes. The first four partition a total weight of 1 across
/// their children; `Direct` weights each child independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendKind {
    Simple1D,
    SimpleDirectional2D,
    FreeformDirectional2D,
    FreeformCartesian2D,
    Direct,
}

impl BlendKind {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(BlendKind::Simple1D),
            1 => Some(BlendKind::SimpleDirectional2D),
            2 => Some(BlendKind::FreeformDirectional2D),
            3 => Some(BlendKind::FreeformCartesian2D),
            4 => Some(BlendKind::Direct),
            _ => None,
        }
    }

    /// Children's weights always sum to one.
    pub fn is_partition(self) -> bool {
        !matches!(self, BlendKind::Direct)
    }
}

/// A node of the motion graph played by a state.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Motion {
    /// Leaf clip referenced by name (subject to override tables).
    Clip { clip: String },
    /// Blend node; `blend_type` is the raw authored mode, see [`BlendKind::from_raw`].
    #[serde(rename = "blendtree")]
    BlendTree {
        blend_type: i32,
        #[serde(default)]
        children: Vec<Motion>,
    },
    /// A host motion node the analyzer has no model for.
    Opaque { type_name: String },
}

impl Motion {
    pub fn clip(name: &str) -> Self {
        Motion::Clip {
            clip: name.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateBehavior {
    /// Drives another layer's weight towards `goal_weight` at runtime.
    LayerControl { layer: usize, goal_weight: f32 },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct State {
    pub name: String,
    #[serde(default)]
    pub motion: Option<Motion>,
    #[serde(default)]
    pub write_defaults: bool,
    #[serde(default)]
    pub behaviors: Vec<StateBehavior>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct StateMachine {
    #[serde(default)]
    pub states: Vec<State>,
    #[serde(default)]
    pub sub_machines: Vec<StateMachine>,
}

impl StateMachine {
    /// Every state, including those of nested machines, depth first.
    pub fn all_states(&self) -> Vec<&State> {
        let mut out: Vec<&State> = self.states.iter().collect();
        for sub in &self.sub_machines {
            out.extend(sub.all_states());
        }
        out
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LayerBlending {
    #[default]
    Override,
    Additive,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Layer {
    pub name: String,
    #[serde(default = "default_one")]
    pub weight: f32,
    #[serde(default)]
    pub blending: LayerBlending,
    #[serde(default)]
    pub state_machine: StateMachine,
    /// Reuse another layer's state machine (by index in the same controller).
    #[serde(default)]
    pub synced_layer: Option<usize>,
    /// Per-state motion replacements for a synced layer.
    #[serde(default)]
    pub synced_motions: IndexMap<String, Motion>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Controller {
    pub name: String,
    #[serde(default)]
    pub layers: Vec<Layer>,
}

impl Controller {
    /// Layer indices whose weight some state drives at runtime.
    pub fn controlled_layers(&self) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .layers
            .iter()
            .flat_map(|l| l.state_machine.all_states())
            .flat_map(|s| s.behaviors.iter())
            .map(|b| match b {
                StateBehavior::LayerControl { layer, .. } => *layer,
            })
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

/// Clip substitution table applied on top of a base controller.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct OverrideTable {
    pub name: String,
    pub base: String,
    #[serde(default)]
    pub clips: IndexMap<String, String>,
}

impl OverrideTable {
    pub fn substitute<'a>(&'a self, clip: &'a str) -> &'a str {
        self.clips.get(clip).map(String::as_str).unwrap_or(clip)
    }
}

/// Special top-level layer slots, composited in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Base,
    Additive,
    Gesture,
    Action,
    Fx,
}

impl SlotKind {
    pub const ORDER: [SlotKind; 5] = [
        SlotKind::Base,
        SlotKind::Additive,
        SlotKind::Gesture,
        SlotKind::Action,
        SlotKind::Fx,
    ];

    /// Property on a `MotionSlots` behavior naming the slot's controller.
    pub fn property_name(self) -> &'static str {
        match self {
            SlotKind::Base => "base",
            SlotKind::Additive => "additive",
            SlotKind::Gesture => "gesture",
            SlotKind::Action => "action",
            SlotKind::Fx => "fx",
        }
    }
}

/// Every motion asset the host supplies for one scene.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MotionLibrary {
    #[serde(default)]
    pub controllers: IndexMap<String, Controller>,
    #[serde(default)]
    pub clips: IndexMap<String, Clip>,
    #[serde(default)]
    pub overrides: IndexMap<String, OverrideTable>,
    /// Controller used by a slot the scene leaves unauthored.
    #[serde(default)]
    pub default_slots: IndexMap<SlotKind, String>,
}

impl MotionLibrary {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn add_controller(&mut self, controller: Controller) {
        self.controllers.insert(controller.name.clone(), controller);
    }

    pub fn add_clip(&mut self, clip: Clip) {
        self.clips.insert(clip.name.clone(), clip);
    }

    pub fn add_override(&mut self, table: OverrideTable) {
        self.overrides.insert(table.name.clone(), table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_json_layout() {
        let m: Motion = serde_json::from_str(
            r#"{ "type": "blendtree", "blend_type": 0, "children": [ { "type": "clip", "clip": "Idle" } ] }"#,
        )
        .unwrap();
        assert_eq!(
            m,
            Motion::BlendTree {
                blend_type: 0,
                children: vec![Motion::clip("Idle")]
            }
        );
    }

    #[test]
    fn binding_target_parses_types() {
        let t: BindingTarget = serde_json::from_str("\"Node\"").unwrap();
        assert_eq!(t, BindingTarget::Node);
        let t: BindingTarget = serde_json::from_str("\"SkinnedRenderer\"").unwrap();
        assert_eq!(t, BindingTarget::Behavior(BehaviorType::SkinnedRenderer));
    }

    #[test]
    fn controlled_layers_collects_nested_states() {
        let controller = Controller {
            name: "c".into(),
            layers: vec![Layer {
                name: "base".into(),
                weight: 1.0,
                blending: LayerBlending::Override,
                state_machine: StateMachine {
                    states: vec![],
                    sub_machines: vec![StateMachine {
                        states: vec![State {
                            name: "s".into(),
                            motion: None,
                            write_defaults: false,
                            behaviors: vec![StateBehavior::LayerControl {
                                layer: 2,
                                goal_weight: 0.0,
                            }],
                        }],
                        sub_machines: vec![],
                    }],
                },
                synced_layer: None,
                synced_motions: IndexMap::new(),
            }],
        };
        assert_eq!(controller.controlled_layers(), vec![2]);
    }
}
