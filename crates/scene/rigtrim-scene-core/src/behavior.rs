//! Behavior instances and their type tags.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use rigtrim_api_core::{BehaviorId, NodeId, Value};

/// Well-known property names.
pub mod props {
    /// Node activeness flag.
    pub const ACTIVE: &str = "active";
    /// Behavior enabled flag.
    pub const ENABLED: &str = "enabled";
    pub const LOCAL_POSITION: &str = "localPosition";
    pub const LOCAL_ROTATION: &str = "localRotation";
    pub const LOCAL_SCALE: &str = "localScale";
    /// Written by the toggle pass: node whose activeness drives `enabled`.
    pub const ENABLED_DRIVER: &str = "enabledDriver";
}

/// Type tag of a behavior instance. The set is closed but `Custom` carries any
/// host type the registry may learn about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BehaviorType {
    Transform,
    Animator,
    MotionSlots,
    SkinnedRenderer,
    MeshRenderer,
    MeshFilter,
    ParticleSystem,
    Light,
    AudioSource,
    BoneChain,
    BoneChainCollider,
    PositionConstraint,
    RotationConstraint,
    ScaleConstraint,
    ParentConstraint,
    AimConstraint,
    Custom(String),
}

impl BehaviorType {
    const NAMED: [(&'static str, BehaviorType); 16] = [
        ("Transform", BehaviorType::Transform),
        ("Animator", BehaviorType::Animator),
        ("MotionSlots", BehaviorType::MotionSlots),
        ("SkinnedRenderer", BehaviorType::SkinnedRenderer),
        ("MeshRenderer", BehaviorType::MeshRenderer),
        ("MeshFilter", BehaviorType::MeshFilter),
        ("ParticleSystem", BehaviorType::ParticleSystem),
        ("Light", BehaviorType::Light),
        ("AudioSource", BehaviorType::AudioSource),
        ("BoneChain", BehaviorType::BoneChain),
        ("BoneChainCollider", BehaviorType::BoneChainCollider),
        ("PositionConstraint", BehaviorType::PositionConstraint),
        ("RotationConstraint", BehaviorType::RotationConstraint),
        ("ScaleConstraint", BehaviorType::ScaleConstraint),
        ("ParentConstraint", BehaviorType::ParentConstraint),
        ("AimConstraint", BehaviorType::AimConstraint),
    ];

    pub fn name(&self) -> &str {
        match self {
            BehaviorType::Custom(name) => name,
            known => Self::NAMED
                .iter()
                .find(|(_, kind)| kind == known)
                .map(|(name, _)| *name)
                .unwrap_or("Unknown"),
        }
    }

    pub fn is_constraint(&self) -> bool {
        matches!(
            self,
            BehaviorType::PositionConstraint
                | BehaviorType::RotationConstraint
                | BehaviorType::ScaleConstraint
                | BehaviorType::ParentConstraint
                | BehaviorType::AimConstraint
        )
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, BehaviorType::Custom(_))
    }
}

impl fmt::Display for BehaviorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BehaviorType {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::NAMED
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, kind)| kind.clone())
            .unwrap_or_else(|| BehaviorType::Custom(s.to_string())))
    }
}

impl Serialize for BehaviorType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for BehaviorType {
    fn deserialize<D>(deserializer: D) -> Result<BehaviorType, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Err(de::Error::custom("empty behavior type"));
        }
        s.parse().map_err(de::Error::custom)
    }
}

/// Declared field value of a behavior instance.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Value(Value),
    Node(NodeId),
    Behavior(BehaviorId),
    List(Vec<PropertyValue>),
    Null,
}

impl PropertyValue {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            PropertyValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            PropertyValue::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_behavior(&self) -> Option<BehaviorId> {
        match self {
            PropertyValue::Behavior(id) => Some(*id),
            _ => None,
        }
    }

    /// Node references held directly or inside a list.
    pub fn node_refs(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.visit_refs(&mut |r| {
            if let PropertyValue::Node(id) = r {
                out.push(*id);
            }
        });
        out
    }

    /// Behavior references held directly or inside a list.
    pub fn behavior_refs(&self) -> Vec<BehaviorId> {
        let mut out = Vec::new();
        self.visit_refs(&mut |r| {
            if let PropertyValue::Behavior(id) = r {
                out.push(*id);
            }
        });
        out
    }

    fn visit_refs(&self, f: &mut dyn FnMut(&PropertyValue)) {
        match self {
            PropertyValue::List(items) => items.iter().for_each(|item| item.visit_refs(f)),
            other => f(other),
        }
    }

    /// Replace references matching `pred` with `Null`, returning how many changed.
    pub(crate) fn scrub(&mut self, pred: &dyn Fn(&PropertyValue) -> bool) -> usize {
        match self {
            PropertyValue::List(items) => items.iter_mut().map(|item| item.scrub(pred)).sum(),
            other => {
                if pred(other) {
                    *other = PropertyValue::Null;
                    1
                } else {
                    0
                }
            }
        }
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        PropertyValue::Value(value)
    }
}

impl From<NodeId> for PropertyValue {
    fn from(value: NodeId) -> Self {
        PropertyValue::Node(value)
    }
}

impl From<BehaviorId> for PropertyValue {
    fn from(value: BehaviorId) -> Self {
        PropertyValue::Behavior(value)
    }
}

/// A typed unit of data attached to exactly one node.
#[derive(Debug, Clone)]
pub struct BehaviorInstance {
    pub id: BehaviorId,
    pub node: NodeId,
    pub kind: BehaviorType,
    /// Distinguishes instances of the same type on one node.
    pub instance_id: u32,
    pub enabled: bool,
    pub properties: IndexMap<String, PropertyValue>,
}

impl BehaviorInstance {
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.property(name).and_then(PropertyValue::as_value)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(Value::as_text)
    }

    /// Every node reference across all fields, in declaration order.
    pub fn node_refs(&self) -> Vec<NodeId> {
        self.properties.values().flat_map(PropertyValue::node_refs).collect()
    }

    /// Every behavior reference across all fields, in declaration order.
    pub fn behavior_refs(&self) -> Vec<BehaviorId> {
        self.properties
            .values()
            .flat_map(PropertyValue::behavior_refs)
            .collect()
    }

    /// The authored value of a property, including the `enabled` flag.
    pub fn static_value(&self, name: &str) -> Option<Value> {
        if name == props::ENABLED {
            return Some(Value::Bool(self.enabled));
        }
        self.value(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_round_trip() {
        let known: BehaviorType = "SkinnedRenderer".parse().unwrap();
        assert_eq!(known, BehaviorType::SkinnedRenderer);
        let custom: BehaviorType = "VendorThing".parse().unwrap();
        assert_eq!(custom, BehaviorType::Custom("VendorThing".into()));
        assert_eq!(custom.to_string(), "VendorThing");
    }

    #[test]
    fn refs_are_collected_through_lists() {
        let value = PropertyValue::List(vec![
            PropertyValue::Node(NodeId(1)),
            PropertyValue::Null,
            PropertyValue::List(vec![PropertyValue::Behavior(BehaviorId(4))]),
        ]);
        assert_eq!(value.node_refs(), vec![NodeId(1)]);
        assert_eq!(value.behavior_refs(), vec![BehaviorId(4)]);
    }
}
