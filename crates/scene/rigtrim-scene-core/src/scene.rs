//! SceneGraph: arena-backed node tree with attached behavior instances.

use indexmap::IndexMap;
use thiserror::Error;

use rigtrim_api_core::{BehaviorId, IdAllocator, NodeId, NodePath, Value};

use crate::behavior::{props, BehaviorInstance, BehaviorType, PropertyValue};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("unknown behavior {0}")]
    UnknownBehavior(BehaviorId),
    #[error("the root node cannot be {0}")]
    RootEdit(&'static str),
    #[error("cannot move {node} under its own descendant {parent}")]
    CyclicParent { node: NodeId, parent: NodeId },
    #[error("node-defining Transform of {0} cannot be added or removed on its own")]
    TransformEdit(NodeId),
    #[error("unresolved reference '{reference}' in property '{property}'")]
    UnresolvedReference { property: String, reference: String },
    #[error("invalid document: {0}")]
    Document(String),
}

/// A point in the hierarchy.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub id: NodeId,
    pub name: String,
    pub active: bool,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Attached instances; the first is always the node-defining Transform.
    pub behaviors: Vec<BehaviorId>,
}

#[derive(Debug, Clone)]
pub struct SceneGraph {
    ids: IdAllocator,
    nodes: Vec<Option<SceneNode>>,
    behaviors: Vec<Option<BehaviorInstance>>,
    root: NodeId,
}

impl SceneGraph {
    /// Create a graph holding only a root node.
    pub fn new(root_name: &str) -> Self {
        let mut graph = Self {
            ids: IdAllocator::new(),
            nodes: Vec::new(),
            behaviors: Vec::new(),
            root: NodeId(0),
        };
        graph.root = graph.insert_node(None, root_name);
        graph
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub fn behavior(&self, id: BehaviorId) -> Option<&BehaviorInstance> {
        self.behaviors.get(id.index()).and_then(Option::as_ref)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn contains_behavior(&self, id: BehaviorId) -> bool {
        self.behavior(id).is_some()
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode, SceneError> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(SceneError::UnknownNode(id))
    }

    fn behavior_mut(&mut self, id: BehaviorId) -> Result<&mut BehaviorInstance, SceneError> {
        self.behaviors
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(SceneError::UnknownBehavior(id))
    }

    /// Live nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.iter().flatten()
    }

    /// Live behaviors in id order.
    pub fn behaviors(&self) -> impl Iterator<Item = &BehaviorInstance> {
        self.behaviors.iter().flatten()
    }

    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    pub fn behavior_count(&self) -> usize {
        self.behaviors().count()
    }

    fn insert_node(&mut self, parent: Option<NodeId>, name: &str) -> NodeId {
        let id = self.ids.alloc_node();
        let transform = self.ids.alloc_behavior();
        let mut properties = IndexMap::new();
        properties.insert(
            props::LOCAL_POSITION.to_string(),
            PropertyValue::Value(Value::vec3(0.0, 0.0, 0.0)),
        );
        properties.insert(
            props::LOCAL_ROTATION.to_string(),
            PropertyValue::Value(Value::identity_quat()),
        );
        properties.insert(
            props::LOCAL_SCALE.to_string(),
            PropertyValue::Value(Value::vec3(1.0, 1.0, 1.0)),
        );
        self.put_behavior(BehaviorInstance {
            id: transform,
            node: id,
            kind: BehaviorType::Transform,
            instance_id: 0,
            enabled: true,
            properties,
        });
        let slot = id.index();
        if self.nodes.len() <= slot {
            self.nodes.resize_with(slot + 1, || None);
        }
        self.nodes[slot] = Some(SceneNode {
            id,
            name: name.to_string(),
            active: true,
            parent,
            children: Vec::new(),
            behaviors: vec![transform],
        });
        id
    }

    fn put_behavior(&mut self, behavior: BehaviorInstance) {
        let slot = behavior.id.index();
        if self.behaviors.len() <= slot {
            self.behaviors.resize_with(slot + 1, || None);
        }
        self.behaviors[slot] = Some(behavior);
    }

    /// Append a new child node (with its Transform) under `parent`.
    pub fn add_node(&mut self, parent: NodeId, name: &str) -> Result<NodeId, SceneError> {
        if !self.contains_node(parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        let id = self.insert_node(Some(parent), name);
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Attach a new behavior of `kind` to `node`; its instance id is the next
    /// free one for that type on the node.
    pub fn add_behavior(
        &mut self,
        node: NodeId,
        kind: BehaviorType,
    ) -> Result<BehaviorId, SceneError> {
        if kind == BehaviorType::Transform {
            return Err(SceneError::TransformEdit(node));
        }
        let instance_id = {
            let n = self.node(node).ok_or(SceneError::UnknownNode(node))?;
            n.behaviors
                .iter()
                .filter_map(|b| self.behavior(*b))
                .filter(|b| b.kind == kind)
                .map(|b| b.instance_id + 1)
                .max()
                .unwrap_or(0)
        };
        let id = self.ids.alloc_behavior();
        self.put_behavior(BehaviorInstance {
            id,
            node,
            kind,
            instance_id,
            enabled: true,
            properties: IndexMap::new(),
        });
        self.node_mut(node)?.behaviors.push(id);
        Ok(id)
    }

    pub fn set_property(
        &mut self,
        behavior: BehaviorId,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<(), SceneError> {
        let value = value.into();
        let b = self.behavior_mut(behavior)?;
        if name == props::ENABLED {
            if let Some(flag) = value.as_value().and_then(Value::as_bool) {
                b.enabled = flag;
                return Ok(());
            }
        }
        b.properties.insert(name.to_string(), value);
        Ok(())
    }

    pub fn remove_property(
        &mut self,
        behavior: BehaviorId,
        name: &str,
    ) -> Result<Option<PropertyValue>, SceneError> {
        Ok(self.behavior_mut(behavior)?.properties.shift_remove(name))
    }

    pub fn set_enabled(&mut self, behavior: BehaviorId, enabled: bool) -> Result<(), SceneError> {
        self.behavior_mut(behavior)?.enabled = enabled;
        Ok(())
    }

    pub fn set_active(&mut self, node: NodeId, active: bool) -> Result<(), SceneError> {
        self.node_mut(node)?.active = active;
        Ok(())
    }

    /// The Transform instance that defines `node`.
    pub fn node_defining_behavior(&self, node: NodeId) -> Option<BehaviorId> {
        self.node(node)?.behaviors.first().copied()
    }

    pub fn behaviors_of(&self, node: NodeId) -> impl Iterator<Item = &BehaviorInstance> {
        self.node(node)
            .into_iter()
            .flat_map(|n| n.behaviors.iter())
            .filter_map(|b| self.behavior(*b))
    }

    /// First behavior of `kind` on `node`, the way bindings resolve.
    pub fn first_behavior_of(&self, node: NodeId, kind: &BehaviorType) -> Option<BehaviorId> {
        self.behaviors_of(node).find(|b| &b.kind == kind).map(|b| b.id)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.parent)
    }

    /// Proper ancestors from the parent up to the root.
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent(node);
        while let Some(id) = cursor {
            out.push(id);
            cursor = self.parent(id);
        }
        out
    }

    /// True if `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).contains(&ancestor)
    }

    /// `node` and all its descendants, pre-order.
    pub fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(n) = self.node(id) {
                out.push(id);
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }

    pub fn path_of(&self, node: NodeId) -> Option<NodePath> {
        self.node(node)?;
        let mut names: Vec<&str> = Vec::new();
        let mut cursor = node;
        while let Some(n) = self.node(cursor) {
            match n.parent {
                Some(parent) => {
                    names.push(&n.name);
                    cursor = parent;
                }
                None => break,
            }
        }
        names.reverse();
        Some(NodePath::from_segments(names))
    }

    /// Resolve `path` below `from` by child names (first match wins).
    pub fn find_by_path(&self, from: NodeId, path: &NodePath) -> Option<NodeId> {
        let mut cursor = from;
        for segment in path.segments() {
            let node = self.node(cursor)?;
            cursor = node
                .children
                .iter()
                .copied()
                .find(|c| self.node(*c).is_some_and(|child| child.name == segment))?;
        }
        Some(cursor)
    }

    pub fn find(&self, path: &str) -> Option<NodeId> {
        let path = NodePath::parse(path).ok()?;
        self.find_by_path(self.root, &path)
    }

    /// Static activeness through the hierarchy.
    pub fn active_in_hierarchy(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(|n| n.active)
            && self
                .ancestors(node)
                .iter()
                .all(|a| self.node(*a).is_some_and(|n| n.active))
    }

    /// Move `node` to the end of `new_parent`'s children.
    pub fn reparent(&mut self, node: NodeId, new_parent: NodeId) -> Result<(), SceneError> {
        if node == self.root {
            return Err(SceneError::RootEdit("reparented"));
        }
        if !self.contains_node(new_parent) {
            return Err(SceneError::UnknownNode(new_parent));
        }
        if self.is_ancestor_or_self(node, new_parent) {
            return Err(SceneError::CyclicParent {
                node,
                parent: new_parent,
            });
        }
        let old_parent = self.node(node).ok_or(SceneError::UnknownNode(node))?.parent;
        if let Some(old) = old_parent {
            self.node_mut(old)?.children.retain(|c| *c != node);
        }
        self.node_mut(new_parent)?.children.push(node);
        self.node_mut(node)?.parent = Some(new_parent);
        Ok(())
    }

    /// Delete `node`, its subtree and every attached instance. References to
    /// deleted entities held by surviving behaviors become `Null`.
    pub fn delete_node(&mut self, node: NodeId) -> Result<Vec<NodeId>, SceneError> {
        if node == self.root {
            return Err(SceneError::RootEdit("deleted"));
        }
        if !self.contains_node(node) {
            return Err(SceneError::UnknownNode(node));
        }
        let removed = self.subtree(node);
        if let Some(parent) = self.parent(node) {
            self.node_mut(parent)?.children.retain(|c| *c != node);
        }
        let mut removed_behaviors = Vec::new();
        for id in &removed {
            if let Some(n) = self.nodes[id.index()].take() {
                removed_behaviors.extend(n.behaviors);
            }
        }
        for b in &removed_behaviors {
            self.behaviors[b.index()] = None;
        }
        self.scrub_references(&|r| match r {
            PropertyValue::Node(id) => removed.contains(id),
            PropertyValue::Behavior(id) => removed_behaviors.contains(id),
            _ => false,
        });
        log::debug!("deleted {} node(s) under {node}", removed.len());
        Ok(removed)
    }

    /// Delete one behavior instance. The node-defining Transform is refused;
    /// delete the node instead.
    pub fn delete_behavior(&mut self, behavior: BehaviorId) -> Result<(), SceneError> {
        let b = self
            .behavior(behavior)
            .ok_or(SceneError::UnknownBehavior(behavior))?;
        if b.kind == BehaviorType::Transform {
            return Err(SceneError::TransformEdit(b.node));
        }
        let node = b.node;
        self.node_mut(node)?.behaviors.retain(|id| *id != behavior);
        self.behaviors[behavior.index()] = None;
        self.scrub_references(&|r| matches!(r, PropertyValue::Behavior(id) if *id == behavior));
        Ok(())
    }

    /// Move a behavior to another node, appending it to that node's list.
    pub fn move_behavior(&mut self, behavior: BehaviorId, to: NodeId) -> Result<(), SceneError> {
        let (from, kind) = {
            let b = self
                .behavior(behavior)
                .ok_or(SceneError::UnknownBehavior(behavior))?;
            (b.node, b.kind.clone())
        };
        if kind == BehaviorType::Transform {
            return Err(SceneError::TransformEdit(from));
        }
        if !self.contains_node(to) {
            return Err(SceneError::UnknownNode(to));
        }
        let instance_id = self
            .behaviors_of(to)
            .filter(|b| b.kind == kind)
            .map(|b| b.instance_id + 1)
            .max()
            .unwrap_or(0);
        self.node_mut(from)?.behaviors.retain(|id| *id != behavior);
        self.node_mut(to)?.behaviors.push(behavior);
        let b = self.behavior_mut(behavior)?;
        b.node = to;
        b.instance_id = instance_id;
        Ok(())
    }

    fn scrub_references(&mut self, pred: &dyn Fn(&PropertyValue) -> bool) {
        for behavior in self.behaviors.iter_mut().flatten() {
            let scrubbed: usize = behavior
                .properties
                .values_mut()
                .map(|value| value.scrub(pred))
                .sum();
            if scrubbed > 0 {
                log::debug!("cleared {scrubbed} dangling reference(s) on {}", behavior.id);
            }
        }
    }
}
