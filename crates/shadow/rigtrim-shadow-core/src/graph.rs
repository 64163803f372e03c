//! The shadow graph: a parallel tree remembering where every touched node,
//! behavior and property started out.
//!
//! Each slot keeps two sets of links. The original links are fixed when the
//! entity is first tracked; the current links follow the edit commands. Slots
//! are never freed, so an entity removed from the real scene still answers
//! "where was I".

use hashbrown::HashMap;
use indexmap::IndexMap;

use rigtrim_api_core::NodePath;
use rigtrim_scene_core::{BehaviorId, BehaviorType, NodeId, SceneGraph};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShadowNodeId(u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShadowBehaviorId(u32);

impl ShadowNodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl ShadowBehaviorId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Original name -> current name, `None` once removed.
pub type PropertyRenames = IndexMap<String, Option<String>>;

#[derive(Debug, Clone)]
pub(crate) struct ShadowNode {
    pub(crate) name: String,
    /// Created by a pass; has no original position.
    pub(crate) created: bool,
    pub(crate) original_parent: Option<ShadowNodeId>,
    pub(crate) original_children: Vec<ShadowNodeId>,
    pub(crate) current_parent: Option<ShadowNodeId>,
    pub(crate) current_children: Vec<ShadowNodeId>,
    /// Behaviors originally attached here, in attachment order.
    pub(crate) behaviors: Vec<ShadowBehaviorId>,
    pub(crate) removed: bool,
    pub(crate) merged_into: Option<ShadowNodeId>,
}

#[derive(Debug, Clone)]
pub(crate) struct ShadowBehavior {
    pub(crate) kind: BehaviorType,
    pub(crate) instance_id: u32,
    pub(crate) original_node: Option<ShadowNodeId>,
    pub(crate) current_node: ShadowNodeId,
    pub(crate) removed: bool,
    pub(crate) merged_into: Option<ShadowBehaviorId>,
    pub(crate) properties: PropertyRenames,
}

#[derive(Debug, Clone)]
pub struct ShadowGraph {
    pub(crate) nodes: Vec<ShadowNode>,
    pub(crate) behaviors: Vec<ShadowBehavior>,
    node_index: HashMap<NodeId, ShadowNodeId>,
    behavior_index: HashMap<BehaviorId, ShadowBehaviorId>,
    pub(crate) root: ShadowNodeId,
}

impl ShadowGraph {
    pub fn new(scene: &SceneGraph) -> Self {
        let mut shadow = Self {
            nodes: Vec::new(),
            behaviors: Vec::new(),
            node_index: HashMap::new(),
            behavior_index: HashMap::new(),
            root: ShadowNodeId(0),
        };
        let root = scene.root();
        let name = scene.node(root).map(|n| n.name.clone()).unwrap_or_default();
        shadow.root = shadow.insert_node(scene, root, name, None, false);
        shadow
    }

    pub fn tracked_nodes(&self) -> usize {
        self.node_index.len()
    }

    pub fn is_tracked(&self, node: NodeId) -> bool {
        self.node_index.contains_key(&node)
    }

    fn insert_node(
        &mut self,
        scene: &SceneGraph,
        real: NodeId,
        name: String,
        parent: Option<ShadowNodeId>,
        created: bool,
    ) -> ShadowNodeId {
        let id = ShadowNodeId(self.nodes.len() as u32);
        self.nodes.push(ShadowNode {
            name,
            created,
            original_parent: if created { None } else { parent },
            original_children: Vec::new(),
            current_parent: parent,
            current_children: Vec::new(),
            behaviors: Vec::new(),
            removed: false,
            merged_into: None,
        });
        if let Some(p) = parent {
            if !created {
                self.nodes[p.index()].original_children.push(id);
            }
            self.nodes[p.index()].current_children.push(id);
        }
        self.node_index.insert(real, id);

        for behavior in scene.behaviors_of(real) {
            if self.behavior_index.contains_key(&behavior.id) {
                continue;
            }
            let b = ShadowBehaviorId(self.behaviors.len() as u32);
            self.behaviors.push(ShadowBehavior {
                kind: behavior.kind.clone(),
                instance_id: behavior.instance_id,
                original_node: if created { None } else { Some(id) },
                current_node: id,
                removed: false,
                merged_into: None,
                properties: PropertyRenames::new(),
            });
            if !created {
                self.nodes[id.index()].behaviors.push(b);
            }
            self.behavior_index.insert(behavior.id, b);
        }
        id
    }

    /// Shadow slot for `node`, tracking it and its ancestors on first touch.
    /// An untracked node still sits where it started, so its current position
    /// is also its original one.
    fn track_node(&mut self, scene: &SceneGraph, node: NodeId) -> Option<ShadowNodeId> {
        if let Some(id) = self.node_index.get(&node) {
            return Some(*id);
        }
        let real = scene.node(node)?;
        let name = real.name.clone();
        let parent = match real.parent {
            Some(p) => Some(self.track_node(scene, p)?),
            None => None,
        };
        // Same-named siblings enter `original_children` in scene order, so the
        // first of them is the one a path lookup finds.
        if let Some(p) = real.parent {
            let earlier: Vec<NodeId> = scene
                .node(p)
                .map(|pn| {
                    pn.children
                        .iter()
                        .copied()
                        .take_while(|c| *c != node)
                        .filter(|c| scene.node(*c).is_some_and(|s| s.name == name))
                        .collect()
                })
                .unwrap_or_default();
            for sibling in earlier {
                self.track_node(scene, sibling);
            }
        }
        Some(self.insert_node(scene, node, name, parent, false))
    }

    fn track_behavior(
        &mut self,
        scene: &SceneGraph,
        behavior: BehaviorId,
    ) -> Option<ShadowBehaviorId> {
        if let Some(id) = self.behavior_index.get(&behavior) {
            return Some(*id);
        }
        let node = scene.behavior(behavior)?.node;
        self.track_node(scene, node)?;
        self.behavior_index.get(&behavior).copied()
    }

    /// A live slot for `node`, or `None` (logged) when the command is moot.
    fn live_node(&mut self, scene: &SceneGraph, node: NodeId, command: &str) -> Option<ShadowNodeId> {
        match self.track_node(scene, node) {
            Some(id) if !self.nodes[id.index()].removed => Some(id),
            _ => {
                log::debug!("{command}: {node} is already gone; ignoring");
                None
            }
        }
    }

    fn live_behavior(
        &mut self,
        scene: &SceneGraph,
        behavior: BehaviorId,
        command: &str,
    ) -> Option<ShadowBehaviorId> {
        match self.track_behavior(scene, behavior) {
            Some(id) if !self.behaviors[id.index()].removed => Some(id),
            _ => {
                log::debug!("{command}: {behavior} is already gone; ignoring");
                None
            }
        }
    }

    fn detach(&mut self, id: ShadowNodeId) {
        if let Some(parent) = self.nodes[id.index()].current_parent.take() {
            self.nodes[parent.index()]
                .current_children
                .retain(|c| *c != id);
        }
    }

    /// Register a node a pass just created under `parent`.
    ///
    /// Call this before any other command names the node. Any other command
    /// tracks an unknown node as original, giving it an original path it
    /// never had.
    pub fn record_create_node(&mut self, scene: &SceneGraph, node: NodeId) {
        if self.node_index.contains_key(&node) {
            return;
        }
        let Some(real) = scene.node(node) else {
            log::debug!("create: {node} is not in the scene; ignoring");
            return;
        };
        let name = real.name.clone();
        let Some(parent) = real.parent.and_then(|p| self.track_node(scene, p)) else {
            log::debug!("create: {node} has no trackable parent; ignoring");
            return;
        };
        self.insert_node(scene, node, name, Some(parent), true);
    }

    pub fn record_move_node(&mut self, scene: &SceneGraph, node: NodeId, new_parent: NodeId) {
        let Some(id) = self.live_node(scene, node, "move") else {
            return;
        };
        let Some(parent) = self.live_node(scene, new_parent, "move") else {
            return;
        };
        self.detach(id);
        self.nodes[id.index()].current_parent = Some(parent);
        self.nodes[parent.index()].current_children.push(id);
    }

    /// Mark `node` and its current subtree removed.
    pub fn record_remove_node(&mut self, scene: &SceneGraph, node: NodeId) {
        let Some(id) = self.live_node(scene, node, "remove") else {
            return;
        };
        if id == self.root {
            log::debug!("remove: the root stays");
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let slot = &mut self.nodes[n.index()];
            slot.removed = true;
            stack.extend(slot.current_children.iter().copied());
        }
    }

    /// `from` disappears; anything bound to it follows `into` instead.
    pub fn record_merge_node(&mut self, scene: &SceneGraph, from: NodeId, into: NodeId) {
        let Some(id) = self.live_node(scene, from, "merge") else {
            return;
        };
        let Some(target) = self.live_node(scene, into, "merge") else {
            return;
        };
        if id == target || id == self.root {
            return;
        }
        self.detach(id);
        let slot = &mut self.nodes[id.index()];
        slot.removed = true;
        slot.merged_into = Some(target);
    }

    pub fn record_move_behavior(&mut self, scene: &SceneGraph, behavior: BehaviorId, to: NodeId) {
        let Some(id) = self.live_behavior(scene, behavior, "move") else {
            return;
        };
        let Some(node) = self.live_node(scene, to, "move") else {
            return;
        };
        self.behaviors[id.index()].current_node = node;
    }

    pub fn record_remove_behavior(&mut self, scene: &SceneGraph, behavior: BehaviorId) {
        if let Some(id) = self.live_behavior(scene, behavior, "remove") {
            self.behaviors[id.index()].removed = true;
        }
    }

    /// `from` disappears; its properties continue on `into`.
    pub fn record_merge_behavior(&mut self, scene: &SceneGraph, from: BehaviorId, into: BehaviorId) {
        let Some(id) = self.live_behavior(scene, from, "merge") else {
            return;
        };
        let Some(target) = self.live_behavior(scene, into, "merge") else {
            return;
        };
        if id == target {
            return;
        }
        let slot = &mut self.behaviors[id.index()];
        slot.removed = true;
        slot.merged_into = Some(target);
    }

    pub fn record_rename_property(
        &mut self,
        scene: &SceneGraph,
        behavior: BehaviorId,
        from: &str,
        to: &str,
    ) {
        if let Some(id) = self.live_behavior(scene, behavior, "rename") {
            set_current_name(&mut self.behaviors[id.index()].properties, from, Some(to));
        }
    }

    pub fn record_remove_property(&mut self, scene: &SceneGraph, behavior: BehaviorId, name: &str) {
        if let Some(id) = self.live_behavior(scene, behavior, "remove property") {
            set_current_name(&mut self.behaviors[id.index()].properties, name, None);
        }
    }

    /// Original position of a behavior as `(node path, type, instance id)`;
    /// `None` for behaviors that did not exist at the start.
    pub fn original_key(
        &self,
        scene: &SceneGraph,
        behavior: BehaviorId,
    ) -> Option<(NodePath, BehaviorType, u32)> {
        match self.behavior_index.get(&behavior) {
            Some(id) => {
                let slot = &self.behaviors[id.index()];
                let path = self.original_path(slot.original_node?)?;
                Some((path, slot.kind.clone(), slot.instance_id))
            }
            None => {
                let b = scene.behavior(behavior)?;
                Some((scene.path_of(b.node)?, b.kind.clone(), b.instance_id))
            }
        }
    }

    pub(crate) fn original_path(&self, id: ShadowNodeId) -> Option<NodePath> {
        let mut names = Vec::new();
        let mut cursor = id;
        loop {
            let slot = &self.nodes[cursor.index()];
            if slot.created {
                return None;
            }
            match slot.original_parent {
                Some(parent) => {
                    names.push(slot.name.as_str());
                    cursor = parent;
                }
                None => break,
            }
        }
        names.reverse();
        Some(NodePath::from_segments(names))
    }
}

/// Point the property currently named `current` at `next`.
fn set_current_name(renames: &mut PropertyRenames, current: &str, next: Option<&str>) {
    let next = next.map(str::to_string);
    let existing = renames
        .iter()
        .find(|(_, now)| now.as_deref() == Some(current))
        .map(|(original, _)| original.clone());
    match existing {
        Some(original) => {
            renames.insert(original, next);
        }
        None if renames.contains_key(current) => {
            log::debug!("property '{current}' was renamed away or removed; ignoring");
        }
        None => {
            renames.insert(current.to_string(), next);
        }
    }
}
