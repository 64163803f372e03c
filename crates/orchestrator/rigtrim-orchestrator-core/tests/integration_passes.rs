use rigtrim_animation_core::{BindingTarget, MotionLibrary, PropertyModification};
use rigtrim_api_core::diagnostics::codes;
use rigtrim_api_core::{Entity, NodePath, Severity, Value};
use rigtrim_graph_core::{DependencyKind, ParserRegistry};
use rigtrim_orchestrator::{
    BindingMapping, OptimizationReport, Optimizer, OptimizerConfig, Schedule,
};
use rigtrim_scene_core::{props, BehaviorType, PropertyValue, SceneGraph};
use rigtrim_shadow_core::{MergeGroups, ShadowError};

fn load(name: &str) -> (SceneGraph, MotionLibrary) {
    let (scene, motions) = rigtrim_test_fixtures::scenarios::json(name).expect("scenario");
    let scene = SceneGraph::from_json(&scene).expect("scene");
    let library = match motions {
        Some(text) => MotionLibrary::from_json(&text).expect("motions"),
        None => MotionLibrary::default(),
    };
    (scene, library)
}

fn path(s: &str) -> NodePath {
    NodePath::parse(s).unwrap()
}

fn paths(list: &[&str]) -> Vec<NodePath> {
    list.iter().map(|s| path(s)).collect()
}

fn mapped(p: &str, property: &str) -> BindingMapping {
    BindingMapping::Mapped {
        path: path(p),
        property: property.to_string(),
    }
}

fn count(report: &OptimizationReport, code: &str) -> usize {
    report.diagnostics.iter().filter(|d| d.code == code).count()
}

#[test]
fn unused_prop_is_removed_and_its_bindings_dropped() {
    let (mut scene, library) = load("unused-prop");
    let prop = scene.find("Prop").unwrap();
    let filter = scene
        .first_behavior_of(prop, &BehaviorType::MeshFilter)
        .unwrap();

    let report = Optimizer::default()
        .run(&mut scene, &library)
        .expect("run ok");

    // The clip still animates the filter, but nothing renders it
    assert_eq!(
        report.summary.get(Entity::Behavior(filter), "weight"),
        Some(&PropertyModification::ConstantAlways(Value::Float(0.3)))
    );
    assert_eq!(report.removed_nodes, paths(&["Prop"]));
    assert!(scene.find("Prop").is_none());
    assert!(scene.find("Body").is_some());
    assert!(report.flattened_nodes.is_empty());
    assert!(report.toggles.is_empty());

    assert_eq!(report.mapping.node_mapping(&path("Prop")), Some(None));
    assert_eq!(
        report.mapping.map_binding(
            &path("Prop"),
            &BindingTarget::Behavior(BehaviorType::MeshFilter),
            "weight"
        ),
        BindingMapping::Dropped
    );
    assert_eq!(
        report.mapping.map_binding(
            &path("Body"),
            &BindingTarget::Behavior(BehaviorType::SkinnedRenderer),
            "enabled"
        ),
        mapped("Body", "enabled")
    );
}

#[test]
fn agreeing_siblings_stay_constant_and_nothing_is_removed() {
    let (mut scene, library) = load("switch-siblings");
    let face = scene.find("Face").unwrap();
    let renderer = scene
        .first_behavior_of(face, &BehaviorType::SkinnedRenderer)
        .unwrap();

    let report = Optimizer::default()
        .run(&mut scene, &library)
        .expect("run ok");

    assert_eq!(
        report.summary.get(Entity::Behavior(renderer), "blendShape.smile"),
        Some(&PropertyModification::ConstantAlways(Value::Float(1.0)))
    );
    assert!(report.removed_nodes.is_empty());
    assert!(report.removed_behaviors.is_empty());
    assert!(scene.contains_behavior(renderer));
}

#[test]
fn switched_off_renderer_and_its_anchor_are_swept() {
    let (mut scene, library) = load("conditional-chain");

    let report = Optimizer::default()
        .run(&mut scene, &library)
        .expect("run ok");

    assert_eq!(report.removed_nodes, paths(&["Lamp", "Anchor"]));
    assert_eq!(count(&report, codes::NODE_REMOVED), 2);
    assert_eq!(scene.node_count(), 1);
    assert_eq!(
        report.mapping.map_binding(
            &path("Lamp"),
            &BindingTarget::Behavior(BehaviorType::MeshRenderer),
            "enabled"
        ),
        BindingMapping::Dropped
    );
}

#[test]
fn avatar_full_pipeline() {
    let (mut scene, library) = load("avatar");
    let props_node = scene.find("Props").unwrap();
    let sheath = scene.find("Armature/Hips/Spine/Sheath").unwrap();
    let chain = scene
        .first_behavior_of(sheath, &BehaviorType::BoneChain)
        .unwrap();

    let report = Optimizer::default()
        .run(&mut scene, &library)
        .expect("run ok");

    // Sweep
    assert_eq!(report.removed_nodes, paths(&["Effects", "Unused"]));
    assert!(report.removed_behaviors.is_empty());

    // Flatten: the empty Armature group folds into the root
    assert_eq!(report.flattened_nodes, paths(&["Armature"]));
    assert!(scene.find("Armature").is_none());
    assert_eq!(scene.find("Hips/Spine/Sheath"), Some(sheath));
    assert_eq!(count(&report, codes::NODE_FLATTENED), 1);

    // Toggle: the sheath chain only matters while the props are shown
    assert_eq!(report.toggles.len(), 1);
    assert_eq!(report.toggles[0].behavior, chain);
    assert_eq!(report.toggles[0].driver, props_node);
    assert_eq!(
        scene.behavior(chain).unwrap().property(props::ENABLED_DRIVER),
        Some(&PropertyValue::Node(props_node))
    );
    assert_eq!(count(&report, codes::BEHAVIOR_TOGGLED), 1);

    // Mapping
    let transform = BindingTarget::Behavior(BehaviorType::Transform);
    assert_eq!(
        report
            .mapping
            .map_binding(&path("Armature/Hips"), &transform, "localPosition.y"),
        mapped("Hips", "localPosition.y")
    );
    assert_eq!(
        report.mapping.map_binding(
            &path("Armature/Hips/Spine/Head/Hair/Strand"),
            &transform,
            "localRotation.x"
        ),
        mapped("Hips/Spine/Head/Hair/Strand", "localRotation.x")
    );
    assert_eq!(
        report
            .mapping
            .map_binding(&path("Props"), &BindingTarget::Node, "active"),
        mapped("Props", "active")
    );
    assert_eq!(
        report.mapping.map_binding(
            &path("Effects"),
            &BindingTarget::Behavior(BehaviorType::ParticleSystem),
            "rate"
        ),
        BindingMapping::Dropped
    );
    assert_eq!(
        report.mapping.node_mapping(&path("Armature")),
        Some(Some(NodePath::root()))
    );
}

#[test]
fn sweep_only_keeps_the_hierarchy() {
    let (mut scene, library) = load("avatar");
    let config = OptimizerConfig {
        schedule: Schedule::SweepOnly,
        ..OptimizerConfig::default()
    };

    let report = Optimizer::new(config)
        .run(&mut scene, &library)
        .expect("run ok");

    assert_eq!(report.removed_nodes, paths(&["Effects", "Unused"]));
    assert!(report.flattened_nodes.is_empty());
    assert!(report.toggles.is_empty());
    assert!(scene.find("Armature/Hips/Spine/Sheath").is_some());
    assert_eq!(
        report.mapping.map_binding(
            &path("Armature/Hips"),
            &BindingTarget::Behavior(BehaviorType::Transform),
            "localPosition.y"
        ),
        mapped("Armature/Hips", "localPosition.y")
    );
}

#[test]
fn disabled_passes_are_skipped() {
    let (mut scene, library) = load("avatar");
    let config = OptimizerConfig::from_json(
        r#"{ "remove_unused": false, "flatten_empty_nodes": false }"#,
    )
    .expect("config");

    let report = Optimizer::new(config)
        .run(&mut scene, &library)
        .expect("run ok");

    assert!(report.removed_nodes.is_empty());
    assert!(report.flattened_nodes.is_empty());
    assert_eq!(report.toggles.len(), 1);
    assert!(scene.find("Effects").is_some());
    assert!(scene.find("Armature").is_some());
}

#[test]
fn diagnostics_follow_config() {
    let (mut scene, library) = load("unknown-types");
    let report = Optimizer::default()
        .run(&mut scene, &library)
        .expect("run ok");
    // Nothing is an entrypoint, and the unknown type is reported once per run
    assert_eq!(report.removed_nodes, paths(&["Tail", "Anchor"]));
    assert_eq!(count(&report, codes::UNKNOWN_BEHAVIOR_TYPE), 1);
    assert_eq!(count(&report, codes::NODE_REMOVED), 2);

    let (mut scene, library) = load("unknown-types");
    let config = OptimizerConfig::from_json(r#"{ "diagnostics": { "min_severity": "warning" } }"#)
        .expect("config");
    let report = Optimizer::new(config)
        .run(&mut scene, &library)
        .expect("run ok");
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].severity, Severity::Warning);

    let (mut scene, library) = load("unknown-types");
    let config =
        OptimizerConfig::from_json(r#"{ "diagnostics": { "enabled": false } }"#).expect("config");
    let report = Optimizer::new(config)
        .run(&mut scene, &library)
        .expect("run ok");
    assert!(report.diagnostics.is_empty());
    assert_eq!(report.removed_nodes.len(), 2);
}

#[test]
fn host_parsers_keep_their_targets() {
    let (mut scene, library) = load("unknown-types");
    let mut registry = ParserRegistry::with_builtin();
    registry.register(BehaviorType::Custom("VendorWiggle".into()), |cx| {
        cx.mark_entrypoint();
        for node in cx.node_refs("anchor") {
            cx.depends_on(node, DependencyKind::NodeLink);
        }
    });

    let report = Optimizer::default()
        .with_registry(registry)
        .run(&mut scene, &library)
        .expect("run ok");

    assert!(report.removed_nodes.is_empty());
    assert!(report.flattened_nodes.is_empty());
    assert_eq!(count(&report, codes::UNKNOWN_BEHAVIOR_TYPE), 0);
    assert!(scene.find("Anchor").is_some());
}

#[test]
fn merge_groups_fold_into_their_target() {
    let (mut scene, library) = load("avatar");
    let body = scene.find("Body").unwrap();
    let sword = scene.find("Props/Sword").unwrap();
    let body_renderer = scene
        .first_behavior_of(body, &BehaviorType::SkinnedRenderer)
        .unwrap();
    let sword_renderer = scene
        .first_behavior_of(sword, &BehaviorType::SkinnedRenderer)
        .unwrap();

    let mut groups = MergeGroups::new();
    groups.add_group("skins", body_renderer);
    groups.add_member("skins", sword_renderer).unwrap();

    let report = Optimizer::default()
        .with_merge_groups(groups)
        .run(&mut scene, &library)
        .expect("run ok");

    assert!(!scene.contains_behavior(sword_renderer));
    assert!(scene.contains_behavior(body_renderer));
    assert_eq!(report.merged_behaviors.len(), 1);
    assert_eq!(report.merged_behaviors[0].path, path("Props/Sword"));
    assert_eq!(
        report.mapping.map_binding(
            &path("Props/Sword"),
            &BindingTarget::Behavior(BehaviorType::SkinnedRenderer),
            "weight"
        ),
        mapped("Body", "weight")
    );
}

#[test]
fn cyclic_merge_groups_abort_the_run() {
    let (mut scene, library) = load("avatar");
    let body = scene.find("Body").unwrap();
    let sword = scene.find("Props/Sword").unwrap();
    let a = scene
        .first_behavior_of(body, &BehaviorType::SkinnedRenderer)
        .unwrap();
    let b = scene
        .first_behavior_of(sword, &BehaviorType::SkinnedRenderer)
        .unwrap();

    let mut groups = MergeGroups::new();
    groups.add_group("first", a);
    groups.add_group("second", b);
    groups.add_member("first", b).unwrap();
    groups.add_member("second", a).unwrap();

    let err = match Optimizer::default()
        .with_merge_groups(groups)
        .run(&mut scene, &library)
    {
        Ok(_) => panic!("cyclic merge groups must fail"),
        Err(err) => err,
    };
    assert!(matches!(
        err.downcast_ref::<ShadowError>(),
        Some(ShadowError::CircularDependency { .. })
    ));
}

#[test]
fn report_serializes() {
    let (mut scene, library) = load("avatar");
    let report = Optimizer::default()
        .run(&mut scene, &library)
        .expect("run ok");
    let json: serde_json::Value =
        serde_json::from_str(&report.to_json().expect("json")).expect("parse");
    assert_eq!(json["removed_nodes"], serde_json::json!(["Effects", "Unused"]));
    assert_eq!(json["flattened_nodes"], serde_json::json!(["Armature"]));
    assert!(json["mapping"].is_object());
    assert!(json["timings_ms"]["sweep_ms"].is_number());
}
