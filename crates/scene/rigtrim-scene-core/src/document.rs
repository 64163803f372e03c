//! JSON scene documents.
//!
//! A document is a nested node tree. Property values use the shorthand value
//! JSON from `rigtrim_api_core::json`, plus two reference forms resolved
//! against the finished tree:
//!
//! ```json
//! { "node": "Armature/Hips" }
//! { "behavior": { "path": "Body", "type": "MeshRenderer", "index": 0 } }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use rigtrim_api_core::{json::parse_value, BehaviorId, NodeId, NodePath};

use crate::behavior::{BehaviorType, PropertyValue};
use crate::scene::{SceneError, SceneGraph};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDocument {
    pub root: NodeDocument,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDocument {
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Properties applied to the node-defining Transform.
    #[serde(default)]
    pub transform: IndexMap<String, JsonValue>,
    #[serde(default)]
    pub behaviors: Vec<BehaviorDocument>,
    #[serde(default)]
    pub children: Vec<NodeDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorDocument {
    #[serde(rename = "type")]
    pub kind: BehaviorType,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub properties: IndexMap<String, JsonValue>,
}

#[derive(Debug, Deserialize)]
struct BehaviorRefDocument {
    path: NodePath,
    #[serde(rename = "type")]
    kind: BehaviorType,
    #[serde(default)]
    index: usize,
}

struct PendingProperty {
    behavior: BehaviorId,
    name: String,
    raw: JsonValue,
}

impl SceneDocument {
    pub fn from_json(text: &str) -> Result<Self, SceneError> {
        serde_json::from_str(text).map_err(|e| SceneError::Document(e.to_string()))
    }

    /// Build a [`SceneGraph`], resolving references once every node exists.
    pub fn build(&self) -> Result<SceneGraph, SceneError> {
        let mut graph = SceneGraph::new(&self.root.name);
        let mut pending = Vec::new();
        let root = graph.root();
        populate(&mut graph, root, &self.root, &mut pending)?;
        for item in pending {
            let value = resolve(&graph, &item.name, item.raw)?;
            graph.set_property(item.behavior, &item.name, value)?;
        }
        Ok(graph)
    }
}

impl SceneGraph {
    /// Parse and build a scene from document JSON.
    pub fn from_json(text: &str) -> Result<Self, SceneError> {
        SceneDocument::from_json(text)?.build()
    }
}

fn populate(
    graph: &mut SceneGraph,
    node: NodeId,
    doc: &NodeDocument,
    pending: &mut Vec<PendingProperty>,
) -> Result<(), SceneError> {
    graph.set_active(node, doc.active)?;
    let transform = graph
        .node_defining_behavior(node)
        .ok_or(SceneError::UnknownNode(node))?;
    for (name, raw) in &doc.transform {
        pending.push(PendingProperty {
            behavior: transform,
            name: name.clone(),
            raw: raw.clone(),
        });
    }
    for b in &doc.behaviors {
        let id = graph.add_behavior(node, b.kind.clone())?;
        graph.set_enabled(id, b.enabled)?;
        for (name, raw) in &b.properties {
            pending.push(PendingProperty {
                behavior: id,
                name: name.clone(),
                raw: raw.clone(),
            });
        }
    }
    for child in &doc.children {
        let id = graph.add_node(node, &child.name)?;
        populate(graph, id, child, pending)?;
    }
    Ok(())
}

fn resolve(graph: &SceneGraph, property: &str, raw: JsonValue) -> Result<PropertyValue, SceneError> {
    let unresolved = |raw: &JsonValue| SceneError::UnresolvedReference {
        property: property.to_string(),
        reference: raw.to_string(),
    };
    match raw {
        JsonValue::Null => Ok(PropertyValue::Null),
        JsonValue::Object(ref obj) if obj.len() == 1 && obj.contains_key("node") => {
            let path = obj
                .get("node")
                .and_then(JsonValue::as_str)
                .and_then(|s| NodePath::parse(s).ok())
                .ok_or_else(|| unresolved(&raw))?;
            graph
                .find_by_path(graph.root(), &path)
                .map(PropertyValue::Node)
                .ok_or_else(|| unresolved(&raw))
        }
        JsonValue::Object(ref obj) if obj.len() == 1 && obj.contains_key("behavior") => {
            let reference: BehaviorRefDocument = obj
                .get("behavior")
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok())
                .ok_or_else(|| unresolved(&raw))?;
            let node = graph
                .find_by_path(graph.root(), &reference.path)
                .ok_or_else(|| unresolved(&raw))?;
            graph
                .behaviors_of(node)
                .filter(|b| b.kind == reference.kind)
                .nth(reference.index)
                .map(|b| PropertyValue::Behavior(b.id))
                .ok_or_else(|| unresolved(&raw))
        }
        JsonValue::Array(items)
            if !(matches!(items.len(), 3 | 4) && items.iter().all(JsonValue::is_number)) =>
        {
            items
                .into_iter()
                .map(|item| resolve(graph, property, item))
                .collect::<Result<Vec<_>, _>>()
                .map(PropertyValue::List)
        }
        other => parse_value(other)
            .map(PropertyValue::Value)
            .map_err(|e| SceneError::Document(format!("property '{property}': {e}"))),
    }
}
