//! Resolving clip curve bindings to scene entities.

use rigtrim_api_core::Entity;
use rigtrim_scene_core::{NodeId, SceneGraph};

use crate::data::{BindingTarget, CurveBinding};

/// Maps a curve binding, relative to the node that plays it, onto the entity
/// whose property it animates.
pub trait TargetResolver {
    fn resolve(&self, from: NodeId, binding: &CurveBinding) -> Option<Entity>;
}

/// Resolver over a live scene: the path is walked from the animator's node,
/// and typed targets bind the first behavior of that type on the node.
pub struct SceneResolver<'a> {
    scene: &'a SceneGraph,
}

impl<'a> SceneResolver<'a> {
    pub fn new(scene: &'a SceneGraph) -> Self {
        Self { scene }
    }
}

impl TargetResolver for SceneResolver<'_> {
    fn resolve(&self, from: NodeId, binding: &CurveBinding) -> Option<Entity> {
        let node = self.scene.find_by_path(from, &binding.path)?;
        match &binding.target {
            BindingTarget::Node => Some(Entity::Node(node)),
            BindingTarget::Behavior(kind) => self
                .scene
                .first_behavior_of(node, kind)
                .map(Entity::Behavior),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Curve, Keyframe};
    use rigtrim_api_core::NodePath;
    use rigtrim_scene_core::BehaviorType;

    fn binding(path: &str, target: BindingTarget) -> CurveBinding {
        CurveBinding {
            path: NodePath::parse(path).unwrap(),
            target,
            property: "x".into(),
            curve: Curve::Float {
                keys: vec![Keyframe::flat(0.0, 1.0)],
            },
        }
    }

    #[test]
    fn resolves_relative_to_animator_node() {
        let mut scene = SceneGraph::new("root");
        let body = scene.add_node(scene.root(), "Body").unwrap();
        let head = scene.add_node(body, "Head").unwrap();
        let mesh = scene
            .add_behavior(head, BehaviorType::SkinnedRenderer)
            .unwrap();
        let resolver = SceneResolver::new(&scene);

        assert_eq!(
            resolver.resolve(body, &binding("Head", BindingTarget::Node)),
            Some(Entity::Node(head))
        );
        assert_eq!(
            resolver.resolve(
                body,
                &binding("Head", BindingTarget::Behavior(BehaviorType::SkinnedRenderer))
            ),
            Some(Entity::Behavior(mesh))
        );
        assert_eq!(
            resolver.resolve(body, &binding("Head", BindingTarget::Behavior(BehaviorType::Light))),
            None
        );
        assert_eq!(resolver.resolve(body, &binding("Missing", BindingTarget::Node)), None);
    }
}
