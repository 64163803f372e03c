//! Parsers for the built-in behavior types, plus the conservative fallback.

use rigtrim_animation_core::analyzer::moved_nodes;
use rigtrim_api_core::Entity;
use rigtrim_scene_core::{BehaviorType, NodeId};

use crate::registry::{ParseContext, ParserRegistry};
use crate::types::DependencyKind::{NodeLink, Normal, Parent};

pub(crate) fn register_all(registry: &mut ParserRegistry) {
    registry.register(BehaviorType::Transform, transform);
    registry.register(BehaviorType::Animator, animator);
    registry.register(BehaviorType::MotionSlots, motion_slots);
    registry.register(BehaviorType::SkinnedRenderer, skinned_renderer);
    registry.register(BehaviorType::MeshRenderer, mesh_renderer);
    registry.register(BehaviorType::MeshFilter, |_| {});
    registry.register(BehaviorType::ParticleSystem, entrypoint);
    registry.register(BehaviorType::Light, entrypoint);
    registry.register(BehaviorType::AudioSource, entrypoint);
    registry.register(BehaviorType::BoneChain, bone_chain);
    registry.register(BehaviorType::BoneChainCollider, bone_chain_collider);
    for kind in [
        BehaviorType::PositionConstraint,
        BehaviorType::RotationConstraint,
        BehaviorType::ScaleConstraint,
        BehaviorType::ParentConstraint,
        BehaviorType::AimConstraint,
    ] {
        registry.register(kind, constraint);
    }
}

fn transform(cx: &mut ParseContext<'_>) {
    let node = cx.node();
    if let Some(parent) = cx.scene().parent(node) {
        cx.add_edge_from(node, parent, Parent, false);
    }
}

fn entrypoint(cx: &mut ParseContext<'_>) {
    cx.mark_entrypoint();
}

fn animator(cx: &mut ParseContext<'_>) {
    cx.mark_entrypoint();
    for bone in cx.node_refs("bones") {
        cx.depends_on_while_active(bone, NodeLink);
    }
}

fn motion_slots(cx: &mut ParseContext<'_>) {
    cx.mark_entrypoint();
    let behavior = cx.behavior();
    for node in behavior.node_refs() {
        cx.depends_on(node, NodeLink);
    }
    for other in behavior.behavior_refs() {
        cx.depends_on(other, Normal);
    }
}

fn skinned_renderer(cx: &mut ParseContext<'_>) {
    cx.mark_entrypoint();
    for root in cx.node_refs("rootBone") {
        cx.depends_on(root, NodeLink);
    }
    for bone in cx.node_refs("bones") {
        cx.depends_on_while_active(bone, NodeLink);
    }
    for anchor in cx.node_refs("probeAnchor") {
        cx.depends_on_while_active(anchor, NodeLink);
    }
    for filter in cx.behavior_refs("meshFilter") {
        cx.depends_on(filter, Normal);
    }
}

fn mesh_renderer(cx: &mut ParseContext<'_>) {
    cx.mark_entrypoint();
    let node = cx.node();
    if let Some(filter) = cx
        .scene()
        .first_behavior_of(node, &BehaviorType::MeshFilter)
    {
        cx.depends_on(filter, Normal);
    }
    for anchor in cx.node_refs("probeAnchor") {
        cx.depends_on_while_active(anchor, NodeLink);
    }
}

/// A moved node needs whatever moves it.
fn moved_need_mover(cx: &mut ParseContext<'_>) {
    let id = cx.id();
    let moved: Vec<NodeId> = moved_nodes(cx.scene(), cx.behavior());
    for node in moved {
        cx.add_edge_from(node, Entity::Behavior(id), Normal, false);
    }
}

fn bone_chain(cx: &mut ParseContext<'_>) {
    moved_need_mover(cx);
    for collider in cx.behavior_refs("colliders") {
        cx.depends_on_while_active(collider, Normal);
    }
}

fn bone_chain_collider(cx: &mut ParseContext<'_>) {
    for root in cx.node_refs("root") {
        cx.depends_on(root, NodeLink);
    }
}

fn constraint(cx: &mut ParseContext<'_>) {
    moved_need_mover(cx);
    for source in cx.node_refs("sources") {
        cx.depends_on_while_active(source, NodeLink);
    }
}

/// Every reference is an unconditional need, and the owning node keeps the
/// instance alive.
pub(crate) fn fallback(cx: &mut ParseContext<'_>) {
    let behavior = cx.behavior();
    for node in behavior.node_refs() {
        cx.depends_on(node, Normal);
    }
    for other in behavior.behavior_refs() {
        cx.depends_on(other, Normal);
    }
    let node = cx.node();
    cx.add_edge_from(node, Entity::Behavior(behavior.id), Normal, false);
}
