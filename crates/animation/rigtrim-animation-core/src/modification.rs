//! Property modification model and its merge algebra.
//!
//! A [`PropertyModification`] says what animation can do to one property:
//! hold it at a single value whenever it plays (`ConstantAlways`), hold it at
//! a value only some of the time (`ConstantPartially`), or drive it freely
//! (`Variable`). [`ModificationSet`] is the same verdict for every touched
//! `(entity, property)` pair of one motion graph fragment.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use rigtrim_api_core::{Entity, Value};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum PropertyModification {
    ConstantAlways(Value),
    ConstantPartially(Value),
    Variable,
}

/// Whether a layer is known to be composited every frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerApplication {
    Always,
    Conditional,
}

impl PropertyModification {
    pub fn value(&self) -> Option<&Value> {
        match self {
            PropertyModification::ConstantAlways(v) | PropertyModification::ConstantPartially(v) => {
                Some(v)
            }
            PropertyModification::Variable => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, PropertyModification::Variable)
    }

    pub fn is_constant_always(&self) -> bool {
        matches!(self, PropertyModification::ConstantAlways(_))
    }

    /// Same value, but only known to hold some of the time.
    pub fn downgrade(self) -> Self {
        match self {
            PropertyModification::ConstantAlways(v) => PropertyModification::ConstantPartially(v),
            other => other,
        }
    }

    /// Merge two mutually exclusive branches that both touch the property.
    pub fn merge_side_by_side(&self, other: &Self) -> Self {
        use PropertyModification::*;
        match (self, other) {
            (ConstantAlways(a), ConstantAlways(b)) if a == b => ConstantAlways(a.clone()),
            (ConstantAlways(a) | ConstantPartially(a), ConstantAlways(b) | ConstantPartially(b))
                if a == b =>
            {
                ConstantPartially(a.clone())
            }
            _ => Variable,
        }
    }

    /// Stack `top` over the already merged `base` (which may not touch the
    /// property at all). A conditional layer never yields `ConstantAlways`.
    pub fn stack(base: Option<&Self>, top: &Self, application: LayerApplication) -> Self {
        use PropertyModification::*;
        let top = match application {
            LayerApplication::Always => top.clone(),
            LayerApplication::Conditional => top.clone().downgrade(),
        };
        match (base, top) {
            (_, Variable) => Variable,
            (_, ConstantAlways(v)) => ConstantAlways(v),
            (None, ConstantPartially(v)) => ConstantPartially(v),
            (Some(Variable), ConstantPartially(_)) => Variable,
            (Some(base), ConstantPartially(v)) => match (base, application) {
                (ConstantAlways(b), LayerApplication::Always) if *b == v => ConstantAlways(v),
                (ConstantAlways(b) | ConstantPartially(b), _) if *b == v => ConstantPartially(v),
                _ => Variable,
            },
        }
    }
}

/// Per-entity, per-property verdicts for one fragment of a motion graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModificationSet {
    entries: IndexMap<Entity, IndexMap<String, PropertyModification>>,
}

impl ModificationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(IndexMap::is_empty)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(IndexMap::len).sum()
    }

    pub fn get(&self, entity: Entity, property: &str) -> Option<&PropertyModification> {
        self.entries.get(&entity)?.get(property)
    }

    pub fn contains(&self, entity: Entity, property: &str) -> bool {
        self.get(entity, property).is_some()
    }

    /// Record a verdict from a single source. A second recording for the same
    /// property inside one clip is treated as another branch.
    pub fn record(&mut self, entity: Entity, property: &str, modification: PropertyModification) {
        let slot = self.entries.entry(entity).or_default();
        match slot.get_mut(property) {
            Some(existing) => *existing = existing.merge_side_by_side(&modification),
            None => {
                slot.insert(property.to_string(), modification);
            }
        }
    }

    pub fn set(&mut self, entity: Entity, property: &str, modification: PropertyModification) {
        self.entries
            .entry(entity)
            .or_default()
            .insert(property.to_string(), modification);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &str, &PropertyModification)> {
        self.entries.iter().flat_map(|(entity, props)| {
            props
                .iter()
                .map(move |(name, m)| (*entity, name.as_str(), m))
        })
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entries.keys().copied()
    }

    /// Side-by-side merge; keys touched by only one branch keep that branch's
    /// verdict.
    pub fn merge_side_by_side(&mut self, other: &ModificationSet) {
        for (entity, property, m) in other.iter() {
            self.record(entity, property, m.clone());
        }
    }

    /// New-layer merge of `top` over `self`.
    pub fn stack(&mut self, top: &ModificationSet, application: LayerApplication) {
        for (entity, property, m) in top.iter() {
            let merged = PropertyModification::stack(self.get(entity, property), m, application);
            self.set(entity, property, merged);
        }
    }

    pub fn force_variable(&mut self) {
        for props in self.entries.values_mut() {
            for m in props.values_mut() {
                *m = PropertyModification::Variable;
            }
        }
    }

    pub fn downgrade_all(&mut self) {
        for props in self.entries.values_mut() {
            for m in props.values_mut() {
                *m = std::mem::replace(m, PropertyModification::Variable).downgrade();
            }
        }
    }

    /// Downgrade one property if present.
    pub fn downgrade(&mut self, entity: Entity, property: &str) {
        if let Some(m) = self
            .entries
            .get_mut(&entity)
            .and_then(|props| props.get_mut(property))
        {
            *m = std::mem::replace(m, PropertyModification::Variable).downgrade();
        }
    }

    /// Force `root` and every recorded sub-property of it (`root.x`,
    /// `root[0]`) to `Variable`.
    pub fn mark_variable(&mut self, entity: Entity, root: &str) {
        let props = self.entries.entry(entity).or_default();
        for (name, m) in props.iter_mut() {
            let nested = name
                .strip_prefix(root)
                .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('['));
            if nested {
                *m = PropertyModification::Variable;
            }
        }
        props.insert(root.to_string(), PropertyModification::Variable);
    }

    pub(crate) fn into_entries(self) -> IndexMap<Entity, IndexMap<String, PropertyModification>> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigtrim_api_core::NodeId;
    use PropertyModification::*;

    fn always(v: f32) -> PropertyModification {
        ConstantAlways(Value::Float(v))
    }

    fn partially(v: f32) -> PropertyModification {
        ConstantPartially(Value::Float(v))
    }

    #[test]
    fn side_by_side_requires_equal_values() {
        assert_eq!(always(1.0).merge_side_by_side(&always(1.0)), always(1.0));
        assert_eq!(always(1.0).merge_side_by_side(&partially(1.0)), partially(1.0));
        assert_eq!(always(1.0).merge_side_by_side(&always(0.5)), Variable);
        assert_eq!(Variable.merge_side_by_side(&always(1.0)), Variable);
    }

    #[test]
    fn side_by_side_is_idempotent() {
        for m in [always(2.0), partially(2.0), Variable] {
            assert_eq!(m.merge_side_by_side(&m), m);
        }
    }

    #[test]
    fn always_layer_overwrites() {
        let base = always(1.0);
        assert_eq!(
            PropertyModification::stack(Some(&base), &always(3.0), LayerApplication::Always),
            always(3.0)
        );
        assert_eq!(
            PropertyModification::stack(Some(&Variable), &always(3.0), LayerApplication::Always),
            always(3.0)
        );
    }

    #[test]
    fn conditional_layer_is_at_most_partial() {
        let bases = [None, Some(always(1.0)), Some(partially(1.0)), Some(Variable)];
        for base in &bases {
            for top in [always(1.0), partially(1.0), Variable] {
                let merged =
                    PropertyModification::stack(base.as_ref(), &top, LayerApplication::Conditional);
                assert!(!merged.is_constant_always(), "{base:?} + {top:?} -> {merged:?}");
            }
        }
        assert_eq!(
            PropertyModification::stack(Some(&always(1.0)), &always(2.0), LayerApplication::Conditional),
            Variable
        );
        assert_eq!(
            PropertyModification::stack(None, &always(2.0), LayerApplication::Conditional),
            partially(2.0)
        );
    }

    #[test]
    fn set_stack_is_order_sensitive() {
        let e = Entity::Node(NodeId(1));
        let mut a = ModificationSet::new();
        a.set(e, "x", always(0.0));
        let mut b = ModificationSet::new();
        b.set(e, "x", always(1.0));
        let mut c = ModificationSet::new();
        c.set(e, "x", always(2.0));

        let mut abc = a.clone();
        abc.stack(&b, LayerApplication::Always);
        abc.stack(&c, LayerApplication::Always);
        let mut acb = a.clone();
        acb.stack(&c, LayerApplication::Always);
        acb.stack(&b, LayerApplication::Always);
        assert_eq!(abc.get(e, "x"), Some(&always(2.0)));
        assert_eq!(acb.get(e, "x"), Some(&always(1.0)));
    }

    #[test]
    fn branches_that_do_not_touch_keep_other_verdicts() {
        let e = Entity::Node(NodeId(1));
        let mut a = ModificationSet::new();
        a.set(e, "x", always(1.0));
        let mut b = ModificationSet::new();
        b.set(e, "y", always(2.0));
        a.merge_side_by_side(&b);
        assert_eq!(a.get(e, "x"), Some(&always(1.0)));
        assert_eq!(a.get(e, "y"), Some(&always(2.0)));
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn mark_variable_covers_components() {
        let e = Entity::Node(NodeId(3));
        let mut set = ModificationSet::new();
        set.set(e, "localPosition.x", always(0.0));
        set.set(e, "localPositionOffset", always(0.0));
        set.mark_variable(e, "localPosition");
        assert_eq!(set.get(e, "localPosition.x"), Some(&Variable));
        assert_eq!(set.get(e, "localPosition"), Some(&Variable));
        assert_eq!(set.get(e, "localPositionOffset"), Some(&always(0.0)));
    }
}
