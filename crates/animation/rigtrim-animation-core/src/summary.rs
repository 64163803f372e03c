//! The immutable result of analysis and the activeness folding built on it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use rigtrim_api_core::{Entity, PropertyPath, Value};
use rigtrim_scene_core::{props, BehaviorId, BehaviorType, NodeId, SceneGraph};

use crate::modification::{ModificationSet, PropertyModification};

/// Per `(entity, property)` verdicts for the whole scene.
///
/// `get` is raw: `None` means no analyzed layer touches the property.
/// `resolve` is the query boundary every caller that needs an answer should
/// use: an untouched property keeps its static value when the analysis was
/// complete, and is treated as `Variable` when some construct could not be
/// analyzed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "SummaryDocument", from = "SummaryDocument")]
pub struct ModificationSummary {
    entries: IndexMap<Entity, IndexMap<String, PropertyModification>>,
    complete: bool,
}

/// Flat row form; entity keys cannot be JSON object keys.
#[derive(Serialize, Deserialize)]
struct SummaryDocument {
    complete: bool,
    entries: Vec<SummaryRow>,
}

#[derive(Serialize, Deserialize)]
struct SummaryRow {
    entity: Entity,
    property: String,
    modification: PropertyModification,
}

impl From<ModificationSummary> for SummaryDocument {
    fn from(summary: ModificationSummary) -> Self {
        let entries = summary
            .entries
            .into_iter()
            .flat_map(|(entity, props)| {
                props.into_iter().map(move |(property, modification)| SummaryRow {
                    entity,
                    property,
                    modification,
                })
            })
            .collect();
        Self {
            complete: summary.complete,
            entries,
        }
    }
}

impl From<SummaryDocument> for ModificationSummary {
    fn from(doc: SummaryDocument) -> Self {
        let mut entries: IndexMap<Entity, IndexMap<String, PropertyModification>> =
            IndexMap::new();
        for row in doc.entries {
            entries
                .entry(row.entity)
                .or_default()
                .insert(row.property, row.modification);
        }
        Self {
            entries,
            complete: doc.complete,
        }
    }
}

impl Default for ModificationSummary {
    fn default() -> Self {
        Self::empty()
    }
}

impl ModificationSummary {
    pub fn new(set: ModificationSet, complete: bool) -> Self {
        Self {
            entries: set.into_entries(),
            complete,
        }
    }

    /// A complete summary with nothing animated.
    pub fn empty() -> Self {
        Self {
            entries: IndexMap::new(),
            complete: true,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw lookup. Falls back to the property's root segment, so a verdict for
    /// `localPosition` answers `localPosition.x`. The fallback only walks
    /// toward the root: a `localPosition.x` entry does not answer
    /// `localPosition`. Use [`ModificationSummary::touches`] for that.
    pub fn get(&self, entity: Entity, property: &str) -> Option<&PropertyModification> {
        let props = self.entries.get(&entity)?;
        if let Some(m) = props.get(property) {
            return Some(m);
        }
        let root = PropertyPath::parse(property).ok()?;
        props.get(root.root())
    }

    pub fn resolve(
        &self,
        entity: Entity,
        property: &str,
        static_value: Option<Value>,
    ) -> PropertyModification {
        match self.get(entity, property) {
            Some(m) => m.clone(),
            None => match static_value {
                Some(v) if self.complete => PropertyModification::ConstantAlways(v),
                _ => PropertyModification::Variable,
            },
        }
    }

    /// Whether any recorded property of `entity` starts with `root`.
    pub fn touches(&self, entity: Entity, root: &str) -> bool {
        self.entries.get(&entity).is_some_and(|props| {
            props.keys().any(|name| {
                PropertyPath::parse(name).is_ok_and(|p| p.root() == root)
            })
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &str, &PropertyModification)> {
        self.entries.iter().flat_map(|(entity, props)| {
            props
                .iter()
                .map(move |(name, m)| (*entity, name.as_str(), m))
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Three-valued answer to "can this be active at runtime".
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activeness {
    AlwaysFalse,
    Maybe,
    AlwaysTrue,
}

impl Activeness {
    pub fn from_bool(flag: bool) -> Self {
        if flag {
            Activeness::AlwaysTrue
        } else {
            Activeness::AlwaysFalse
        }
    }

    /// Fold a flag's static value with what animation can do to it.
    pub fn fold(static_value: bool, modification: &PropertyModification) -> Self {
        match modification {
            PropertyModification::ConstantAlways(v) => {
                v.as_bool().map_or(Activeness::Maybe, Activeness::from_bool)
            }
            PropertyModification::ConstantPartially(v) => match v.as_bool() {
                Some(flag) if flag == static_value => Activeness::from_bool(static_value),
                _ => Activeness::Maybe,
            },
            PropertyModification::Variable => Activeness::Maybe,
        }
    }

    pub fn and(self, other: Activeness) -> Activeness {
        use Activeness::*;
        match (self, other) {
            (AlwaysFalse, _) | (_, AlwaysFalse) => AlwaysFalse,
            (AlwaysTrue, AlwaysTrue) => AlwaysTrue,
            _ => Maybe,
        }
    }

    pub fn is_always_false(self) -> bool {
        self == Activeness::AlwaysFalse
    }

    pub fn is_always_true(self) -> bool {
        self == Activeness::AlwaysTrue
    }
}

/// Activeness of a node's own flag, ignoring ancestors.
pub fn node_self_activeness(
    scene: &SceneGraph,
    summary: &ModificationSummary,
    node: NodeId,
) -> Activeness {
    let Some(n) = scene.node(node) else {
        return Activeness::AlwaysFalse;
    };
    let m = summary.resolve(Entity::Node(node), props::ACTIVE, Some(Value::Bool(n.active)));
    Activeness::fold(n.active, &m)
}

/// Activeness of a node through the hierarchy.
pub fn node_activeness(scene: &SceneGraph, summary: &ModificationSummary, node: NodeId) -> Activeness {
    scene
        .ancestors(node)
        .into_iter()
        .fold(node_self_activeness(scene, summary, node), |acc, a| {
            acc.and(node_self_activeness(scene, summary, a))
        })
}

/// Activeness of a behavior's own `enabled` flag. Transforms cannot be
/// disabled.
pub fn behavior_self_activeness(
    scene: &SceneGraph,
    summary: &ModificationSummary,
    behavior: BehaviorId,
) -> Activeness {
    let Some(b) = scene.behavior(behavior) else {
        return Activeness::AlwaysFalse;
    };
    if b.kind == BehaviorType::Transform {
        return Activeness::AlwaysTrue;
    }
    let m = summary.resolve(
        Entity::Behavior(behavior),
        props::ENABLED,
        Some(Value::Bool(b.enabled)),
    );
    Activeness::fold(b.enabled, &m)
}

/// `enabled` and the owning node's hierarchy activeness.
pub fn behavior_activeness(
    scene: &SceneGraph,
    summary: &ModificationSummary,
    behavior: BehaviorId,
) -> Activeness {
    let Some(b) = scene.behavior(behavior) else {
        return Activeness::AlwaysFalse;
    };
    behavior_self_activeness(scene, summary, behavior).and(node_activeness(scene, summary, b.node))
}
