//! Identifiers and a monotonic allocator for scene entities.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BehaviorId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl BehaviorId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

impl fmt::Display for BehaviorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "behavior#{}", self.0)
    }
}

/// Either kind of scene entity; the unit the analyzer, dependency graph and
/// reachability engine reason about.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Entity {
    Node(NodeId),
    Behavior(BehaviorId),
}

impl From<NodeId> for Entity {
    fn from(id: NodeId) -> Self {
        Entity::Node(id)
    }
}

impl From<BehaviorId> for Entity {
    fn from(id: BehaviorId) -> Self {
        Entity::Behavior(id)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Node(id) => id.fmt(f),
            Entity::Behavior(id) => id.fmt(f),
        }
    }
}

/// Monotonic allocator for NodeId and BehaviorId.
/// Ids are dense indices into the scene arena and are never reused, so an id
/// taken from a deleted entity stays invalid.
#[derive(Default, Debug, Clone)]
pub struct IdAllocator {
    next_node: u32,
    next_behavior: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_node(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    #[inline]
    pub fn alloc_behavior(&mut self) -> BehaviorId {
        let id = BehaviorId(self.next_behavior);
        self.next_behavior += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc_node(), NodeId(0));
        assert_eq!(alloc.alloc_node(), NodeId(1));
        assert_eq!(alloc.alloc_behavior(), BehaviorId(0));
        assert_eq!(alloc.alloc_behavior(), BehaviorId(1));
    }
}
