//! Merge groups: sets of behaviors folded into one target behavior.

use std::collections::VecDeque;

use hashbrown::HashMap;
use indexmap::IndexMap;

use rigtrim_scene_core::{BehaviorId, SceneGraph};

use crate::error::ShadowError;
use crate::graph::ShadowGraph;

#[derive(Debug, Clone)]
struct MergeGroup {
    target: BehaviorId,
    members: Vec<BehaviorId>,
    /// Members in original order; dropped whenever `members` changes.
    sorted: Option<Vec<BehaviorId>>,
}

#[derive(Debug, Clone, Default)]
pub struct MergeGroups {
    groups: IndexMap<String, MergeGroup>,
}

impl MergeGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace the group `name` merging into `target`.
    pub fn add_group(&mut self, name: impl Into<String>, target: BehaviorId) {
        self.groups.insert(
            name.into(),
            MergeGroup {
                target,
                members: Vec::new(),
                sorted: None,
            },
        );
    }

    fn group_mut(&mut self, name: &str) -> Result<&mut MergeGroup, ShadowError> {
        self.groups
            .get_mut(name)
            .ok_or_else(|| ShadowError::UnknownGroup(name.to_string()))
    }

    pub fn add_member(&mut self, name: &str, behavior: BehaviorId) -> Result<(), ShadowError> {
        let group = self.group_mut(name)?;
        if !group.members.contains(&behavior) {
            group.members.push(behavior);
            group.sorted = None;
        }
        Ok(())
    }

    pub fn remove_member(&mut self, name: &str, behavior: BehaviorId) -> Result<bool, ShadowError> {
        let group = self.group_mut(name)?;
        let before = group.members.len();
        group.members.retain(|m| *m != behavior);
        let removed = group.members.len() != before;
        if removed {
            group.sorted = None;
        }
        Ok(removed)
    }

    pub fn target(&self, name: &str) -> Option<BehaviorId> {
        self.groups.get(name).map(|g| g.target)
    }

    /// Members in insertion order.
    pub fn members(&self, name: &str) -> &[BehaviorId] {
        self.groups.get(name).map_or(&[], |g| g.members.as_slice())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Members ordered by original node path, then type, then instance id.
    /// Members with no original position come last in insertion order.
    pub fn sorted_members(
        &mut self,
        name: &str,
        shadow: &ShadowGraph,
        scene: &SceneGraph,
    ) -> Result<&[BehaviorId], ShadowError> {
        let group = self.group_mut(name)?;
        if group.sorted.is_none() {
            let mut keyed: Vec<_> = group
                .members
                .iter()
                .enumerate()
                .map(|(i, m)| (shadow.original_key(scene, *m), i, *m))
                .collect();
            keyed.sort_by(|(a, ai, _), (b, bi, _)| match (a, b) {
                (Some(a), Some(b)) => a.cmp(b).then(ai.cmp(bi)),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => ai.cmp(bi),
            });
            group.sorted = Some(keyed.into_iter().map(|(_, _, m)| m).collect());
        }
        Ok(group.sorted.as_deref().unwrap_or_default())
    }

    /// Group names in processing order: a group whose target is a member of
    /// another group goes first, so the merged result is what moves on.
    pub fn processing_order(&self) -> Result<Vec<String>, ShadowError> {
        let mut indeg: IndexMap<&str, usize> = self.groups.keys().map(|k| (k.as_str(), 0)).collect();
        let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();

        for (name, group) in &self.groups {
            for (other, candidate) in &self.groups {
                if name != other && candidate.members.contains(&group.target) {
                    adj.entry(name.as_str()).or_default().push(other.as_str());
                    *indeg.entry(other.as_str()).or_default() += 1;
                }
            }
        }

        let mut q: VecDeque<&str> = indeg
            .iter()
            .filter(|(_, &d)| d == 0)
            .map(|(k, _)| *k)
            .collect();
        let mut order = Vec::new();
        while let Some(u) = q.pop_front() {
            order.push(u.to_string());
            if let Some(vs) = adj.get(u) {
                for v in vs {
                    if let Some(d) = indeg.get_mut(v) {
                        *d -= 1;
                        if *d == 0 {
                            q.push_back(*v);
                        }
                    }
                }
            }
        }

        if order.len() != indeg.len() {
            let groups = indeg
                .iter()
                .filter(|(_, &d)| d > 0)
                .map(|(k, _)| k.to_string())
                .collect();
            return Err(ShadowError::CircularDependency { groups });
        }
        Ok(order)
    }

    /// Record every merge in processing order. Returns the order used.
    pub fn apply(
        &mut self,
        shadow: &mut ShadowGraph,
        scene: &SceneGraph,
    ) -> Result<Vec<String>, ShadowError> {
        let order = self.processing_order()?;
        for name in &order {
            let members = self.sorted_members(name, shadow, scene)?.to_vec();
            let Some(target) = self.target(name) else {
                continue;
            };
            for member in members.into_iter().filter(|m| *m != target) {
                shadow.record_merge_behavior(scene, member, target);
            }
        }
        Ok(order)
    }
}
