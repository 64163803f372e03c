//! Compiling the shadow graph into an old -> new lookup table.

use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use rigtrim_animation_core::BindingTarget;
use rigtrim_api_core::NodePath;
use rigtrim_scene_core::BehaviorType;

use crate::graph::{PropertyRenames, ShadowBehaviorId, ShadowGraph, ShadowNode, ShadowNodeId};

/// Where a curve binding should point after the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BindingMapping {
    Mapped { path: NodePath, property: String },
    Dropped,
}

/// Fate of the first behavior of `kind` originally on `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentMapping {
    pub path: NodePath,
    #[serde(rename = "type")]
    pub kind: BehaviorType,
    pub target: Option<NodePath>,
    /// Renames applied in order: the behavior's own, then those of each
    /// behavior it was merged into.
    #[serde(default)]
    pub properties: Vec<PropertyRenames>,
}

impl ComponentMapping {
    fn map_property(&self, property: &str) -> Option<String> {
        let mut name = property.to_string();
        for step in &self.properties {
            match rename(step, &name) {
                Some(Some(next)) => name = next,
                Some(None) => return None,
                None => {}
            }
        }
        Some(name)
    }
}

/// Look `name` up in `renames`, also matching it as a sub-path of a renamed
/// property (`blendShape.smile` under `blendShape`).
fn rename(renames: &PropertyRenames, name: &str) -> Option<Option<String>> {
    if let Some(next) = renames.get(name) {
        return Some(next.clone());
    }
    renames.iter().find_map(|(original, next)| {
        let rest = name.strip_prefix(original.as_str())?;
        if !(rest.starts_with('.') || rest.starts_with('[')) {
            return None;
        }
        Some(next.as_ref().map(|n| format!("{n}{rest}")))
    })
}

#[derive(Serialize, Deserialize)]
struct MappingDocument {
    nodes: IndexMap<NodePath, Option<NodePath>>,
    components: Vec<ComponentMapping>,
}

/// Immutable result of [`ShadowGraph::compile`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "MappingDocument", into = "MappingDocument")]
pub struct MappingTable {
    nodes: IndexMap<NodePath, Option<NodePath>>,
    components: Vec<ComponentMapping>,
    component_index: HashMap<(NodePath, BehaviorType), usize>,
}

impl From<MappingDocument> for MappingTable {
    fn from(doc: MappingDocument) -> Self {
        let mut table = MappingTable {
            nodes: doc.nodes,
            ..Default::default()
        };
        for component in doc.components {
            table.push_component(component);
        }
        table
    }
}

impl From<MappingTable> for MappingDocument {
    fn from(table: MappingTable) -> Self {
        MappingDocument {
            nodes: table.nodes,
            components: table.components,
        }
    }
}

impl MappingTable {
    fn push_component(&mut self, component: ComponentMapping) {
        let key = (component.path.clone(), component.kind.clone());
        if self.component_index.contains_key(&key) {
            return;
        }
        self.component_index.insert(key, self.components.len());
        self.components.push(component);
    }

    /// Exact mapping of a tracked node: `Some(None)` when it was removed,
    /// `None` when the pass never touched it.
    pub fn node_mapping(&self, old: &NodePath) -> Option<Option<NodePath>> {
        self.nodes.get(old).cloned()
    }

    /// New path of the node at `old`, following the longest tracked ancestor
    /// for nodes the pass never touched.
    pub fn map_node(&self, old: &NodePath) -> Option<NodePath> {
        if let Some(mapped) = self.nodes.get(old) {
            return mapped.clone();
        }
        for ancestor in old.ancestors() {
            if let Some(mapped) = self.nodes.get(&ancestor) {
                let rest = old.strip_prefix(&ancestor)?;
                return mapped.as_ref().map(|p| p.concat(&rest));
            }
        }
        Some(old.clone())
    }

    pub fn component(&self, old: &NodePath, kind: &BehaviorType) -> Option<&ComponentMapping> {
        self.component_index
            .get(&(old.clone(), kind.clone()))
            .map(|i| &self.components[*i])
    }

    pub fn map_binding(
        &self,
        old_path: &NodePath,
        target: &BindingTarget,
        property: &str,
    ) -> BindingMapping {
        let mapped = match target {
            BindingTarget::Behavior(kind) => match self.component(old_path, kind) {
                Some(component) => component
                    .target
                    .clone()
                    .zip(component.map_property(property)),
                None => self.map_node(old_path).map(|p| (p, property.to_string())),
            },
            BindingTarget::Node => self.map_node(old_path).map(|p| (p, property.to_string())),
        };
        match mapped {
            Some((path, property)) => BindingMapping::Mapped { path, property },
            None => {
                log::debug!("binding {old_path}:{target}.{property} dropped");
                BindingMapping::Dropped
            }
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&NodePath, Option<&NodePath>)> {
        self.nodes.iter().map(|(old, new)| (old, new.as_ref()))
    }

    pub fn components(&self) -> &[ComponentMapping] {
        &self.components
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl ShadowGraph {
    /// Join original and current positions by identity.
    pub fn compile(&self) -> MappingTable {
        let old_paths = self.paths(|n| &n.original_children, false);
        let new_paths = self.paths(|n| &n.current_children, true);

        let mut table = MappingTable::default();
        // A duplicated path belongs to the first sibling carrying it.
        for (id, old) in &old_paths {
            table
                .nodes
                .entry(old.clone())
                .or_insert_with(|| self.resolve_node(*id, &new_paths));
        }
        for (id, old) in &old_paths {
            for b in &self.nodes[id.index()].behaviors {
                let (target, properties) = self.resolve_behavior(*b, &new_paths);
                table.push_component(ComponentMapping {
                    path: old.clone(),
                    kind: self.behaviors[b.index()].kind.clone(),
                    target,
                    properties,
                });
            }
        }
        log::debug!(
            "compiled mapping: {} node(s), {} component(s)",
            table.nodes.len(),
            table.components.len()
        );
        table
    }

    /// Paths from the root along `children`, in pre-order.
    fn paths<F>(&self, children: F, skip_removed: bool) -> IndexMap<ShadowNodeId, NodePath>
    where
        F: Fn(&ShadowNode) -> &Vec<ShadowNodeId>,
    {
        let mut out = IndexMap::new();
        let mut stack = vec![(self.root, NodePath::root())];
        while let Some((id, path)) = stack.pop() {
            let node = &self.nodes[id.index()];
            for child in children(node).iter().rev() {
                let slot = &self.nodes[child.index()];
                if skip_removed && slot.removed {
                    continue;
                }
                stack.push((*child, path.join(&slot.name)));
            }
            out.insert(id, path);
        }
        out
    }

    fn resolve_node(
        &self,
        id: ShadowNodeId,
        new_paths: &IndexMap<ShadowNodeId, NodePath>,
    ) -> Option<NodePath> {
        let mut seen = HashSet::new();
        let mut cursor = id;
        loop {
            if let Some(path) = new_paths.get(&cursor) {
                return Some(path.clone());
            }
            if !seen.insert(cursor) {
                return None;
            }
            cursor = self.nodes[cursor.index()].merged_into?;
        }
    }

    fn resolve_behavior(
        &self,
        id: ShadowBehaviorId,
        new_paths: &IndexMap<ShadowNodeId, NodePath>,
    ) -> (Option<NodePath>, Vec<PropertyRenames>) {
        let mut seen = HashSet::new();
        let mut steps = Vec::new();
        let mut cursor = id;
        loop {
            let slot = &self.behaviors[cursor.index()];
            if !slot.properties.is_empty() {
                steps.push(slot.properties.clone());
            }
            match slot.merged_into {
                Some(next) if seen.insert(cursor) => cursor = next,
                Some(_) => return (None, steps),
                None if slot.removed => return (None, steps),
                None => return (self.resolve_node(slot.current_node, new_paths), steps),
            }
        }
    }
}
