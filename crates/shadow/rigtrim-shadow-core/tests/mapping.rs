use rigtrim_animation_core::BindingTarget;
use rigtrim_api_core::NodePath;
use rigtrim_scene_core::{BehaviorType, SceneGraph};
use rigtrim_shadow_core::{BindingMapping, MappingTable, MergeGroups, ShadowError, ShadowGraph};

fn path(s: &str) -> NodePath {
    NodePath::parse(s).unwrap()
}

fn mapped(p: &str, property: &str) -> BindingMapping {
    BindingMapping::Mapped {
        path: path(p),
        property: property.to_string(),
    }
}

fn avatar() -> SceneGraph {
    let text = rigtrim_test_fixtures::scenes::json("avatar").expect("avatar scene");
    SceneGraph::from_json(&text).expect("scene")
}

#[test]
fn move_and_move_back_is_identity() {
    let mut scene = avatar();
    let spine = scene.find("Armature/Hips/Spine").unwrap();
    let hips = scene.find("Armature/Hips").unwrap();
    let props = scene.find("Props").unwrap();
    let mut shadow = ShadowGraph::new(&scene);

    shadow.record_move_node(&scene, spine, props);
    scene.reparent(spine, props).unwrap();
    shadow.record_move_node(&scene, spine, hips);
    scene.reparent(spine, hips).unwrap();

    let table = shadow.compile();
    for (old, new) in table.nodes() {
        assert_eq!(Some(old), new, "{old} moved");
    }
    for p in ["Armature/Hips/Spine/Head/Hair/Strand", "Body", "Props/Sword"] {
        assert_eq!(table.map_node(&path(p)), Some(path(p)));
    }
}

#[test]
fn untouched_descendants_follow_moved_ancestor() {
    let mut scene = avatar();
    let head = scene.find("Armature/Hips/Spine/Head").unwrap();
    let root = scene.root();
    let mut shadow = ShadowGraph::new(&scene);
    shadow.record_move_node(&scene, head, root);
    scene.reparent(head, root).unwrap();

    let table = shadow.compile();
    assert_eq!(
        table.node_mapping(&path("Armature/Hips/Spine/Head")),
        Some(Some(path("Head")))
    );
    assert_eq!(table.node_mapping(&path("Armature/Hips/Spine/Head/Hair")), None);
    assert_eq!(
        table.map_binding(
            &path("Armature/Hips/Spine/Head/Hair/Strand"),
            &BindingTarget::Behavior(BehaviorType::Transform),
            "localRotation.x"
        ),
        mapped("Head/Hair/Strand", "localRotation.x")
    );
}

#[test]
fn removed_nodes_and_properties_drop_bindings() {
    let mut scene = avatar();
    let unused = scene.find("Unused").unwrap();
    let body = scene.find("Body").unwrap();
    let renderer = scene
        .first_behavior_of(body, &BehaviorType::SkinnedRenderer)
        .unwrap();
    let mut shadow = ShadowGraph::new(&scene);

    shadow.record_remove_node(&scene, unused);
    scene.delete_node(unused).unwrap();
    shadow.record_rename_property(&scene, renderer, "blendShape", "shapes");
    shadow.record_remove_property(&scene, renderer, "materials");

    let table = shadow.compile();
    assert_eq!(table.node_mapping(&path("Unused")), Some(None));
    assert_eq!(
        table.map_binding(
            &path("Unused"),
            &BindingTarget::Behavior(BehaviorType::MeshFilter),
            "mesh"
        ),
        BindingMapping::Dropped
    );
    let skinned = BindingTarget::Behavior(BehaviorType::SkinnedRenderer);
    assert_eq!(
        table.map_binding(&path("Body"), &skinned, "materials[0]"),
        BindingMapping::Dropped
    );
    assert_eq!(
        table.map_binding(&path("Body"), &skinned, "blendShape.smile"),
        mapped("Body", "shapes.smile")
    );
    assert_eq!(
        table.map_binding(&path("Body"), &skinned, "enabled"),
        mapped("Body", "enabled")
    );
}

#[test]
fn merged_node_bindings_follow_the_target() {
    let mut scene = avatar();
    let armature = scene.find("Armature").unwrap();
    let hips = scene.find("Armature/Hips").unwrap();
    let root = scene.root();
    let mut shadow = ShadowGraph::new(&scene);

    shadow.record_move_node(&scene, hips, root);
    scene.reparent(hips, root).unwrap();
    shadow.record_merge_node(&scene, armature, root);
    scene.delete_node(armature).unwrap();

    let table = shadow.compile();
    assert_eq!(table.node_mapping(&path("Armature")), Some(Some(path(""))));
    assert_eq!(
        table.map_binding(&path("Armature"), &BindingTarget::Node, "active"),
        mapped("", "active")
    );
    assert_eq!(
        table.map_binding(
            &path("Armature/Hips/Spine"),
            &BindingTarget::Behavior(BehaviorType::Transform),
            "localPosition.y"
        ),
        mapped("Hips/Spine", "localPosition.y")
    );
}

#[test]
fn moved_and_merged_behaviors_keep_their_bindings() {
    let mut scene = avatar();
    let sword = scene.find("Props/Sword").unwrap();
    let body = scene.find("Body").unwrap();
    let root = scene.root();
    let sword_renderer = scene
        .first_behavior_of(sword, &BehaviorType::SkinnedRenderer)
        .unwrap();
    let body_renderer = scene
        .first_behavior_of(body, &BehaviorType::SkinnedRenderer)
        .unwrap();
    let light = scene.add_behavior(sword, BehaviorType::Light).unwrap();
    let mut shadow = ShadowGraph::new(&scene);

    shadow.record_move_behavior(&scene, light, root);
    scene.move_behavior(light, root).unwrap();
    shadow.record_rename_property(&scene, body_renderer, "weight", "bodyWeight");

    let mut groups = MergeGroups::new();
    groups.add_group("skins", body_renderer);
    groups.add_member("skins", sword_renderer).unwrap();
    groups.add_member("skins", body_renderer).unwrap();
    assert_eq!(groups.apply(&mut shadow, &scene).unwrap(), vec!["skins"]);

    let table = shadow.compile();
    assert_eq!(
        table.map_binding(
            &path("Props/Sword"),
            &BindingTarget::Behavior(BehaviorType::Light),
            "intensity"
        ),
        mapped("", "intensity")
    );
    assert_eq!(
        table.map_binding(
            &path("Props/Sword"),
            &BindingTarget::Behavior(BehaviorType::SkinnedRenderer),
            "weight"
        ),
        mapped("Body", "bodyWeight")
    );
}

#[test]
fn cyclic_merge_groups_abort() {
    let scene = avatar();
    let body = scene.find("Body").unwrap();
    let sword = scene.find("Props/Sword").unwrap();
    let a = scene
        .first_behavior_of(body, &BehaviorType::SkinnedRenderer)
        .unwrap();
    let b = scene
        .first_behavior_of(sword, &BehaviorType::SkinnedRenderer)
        .unwrap();
    let mut shadow = ShadowGraph::new(&scene);
    let mut groups = MergeGroups::new();
    groups.add_group("first", a);
    groups.add_group("second", b);
    groups.add_member("first", b).unwrap();
    groups.add_member("second", a).unwrap();
    assert!(matches!(
        groups.apply(&mut shadow, &scene),
        Err(ShadowError::CircularDependency { .. })
    ));
}

#[test]
fn table_survives_json() {
    let mut scene = avatar();
    let effects = scene.find("Effects").unwrap();
    let mut shadow = ShadowGraph::new(&scene);
    shadow.record_remove_node(&scene, effects);
    scene.delete_node(effects).unwrap();
    let table = shadow.compile();

    let text = table.to_json().unwrap();
    let back: MappingTable = serde_json::from_str(&text).unwrap();
    assert_eq!(back.node_mapping(&path("Effects")), Some(None));
    assert_eq!(
        back.map_binding(
            &path("Effects"),
            &BindingTarget::Behavior(BehaviorType::ParticleSystem),
            "rate"
        ),
        BindingMapping::Dropped
    );
    assert_eq!(back.components().len(), table.components().len());
}

fn duplicate_siblings() -> SceneGraph {
    let mut scene = SceneGraph::new("Root");
    let root = scene.root();
    let first = scene.add_node(root, "Dup").unwrap();
    scene.add_node(first, "Child").unwrap();
    scene.add_node(root, "Dup").unwrap();
    scene
}

#[test]
fn duplicate_sibling_path_maps_to_the_first_sibling() {
    let mut scene = duplicate_siblings();
    let root = scene.root();
    let children = scene.node(root).unwrap().children.clone();
    let (first, second) = (children[0], children[1]);
    assert_eq!(scene.find("Dup"), Some(first));

    let mut shadow = ShadowGraph::new(&scene);
    shadow.record_remove_node(&scene, second);
    scene.delete_node(second).unwrap();
    assert!(shadow.is_tracked(first));

    let table = shadow.compile();
    assert_eq!(table.node_mapping(&path("Dup")), Some(Some(path("Dup"))));
    assert_eq!(
        table.map_binding(&path("Dup/Child"), &BindingTarget::Node, "active"),
        mapped("Dup/Child", "active")
    );
}

#[test]
fn removing_the_first_duplicate_drops_its_path() {
    let mut scene = duplicate_siblings();
    let first = scene.find("Dup").unwrap();
    let mut shadow = ShadowGraph::new(&scene);
    shadow.record_remove_node(&scene, first);
    scene.delete_node(first).unwrap();

    let table = shadow.compile();
    assert_eq!(table.node_mapping(&path("Dup")), Some(None));
    assert_eq!(
        table.map_binding(&path("Dup/Child"), &BindingTarget::Node, "active"),
        BindingMapping::Dropped
    );
}

#[test]
fn created_node_has_no_original_path() {
    let mut scene = avatar();
    let props = scene.find("Props").unwrap();
    let sword = scene.find("Props/Sword").unwrap();
    let mut shadow = ShadowGraph::new(&scene);

    let holster = scene.add_node(props, "Holster").unwrap();
    shadow.record_create_node(&scene, holster);
    shadow.record_move_node(&scene, sword, holster);
    scene.reparent(sword, holster).unwrap();

    let table = shadow.compile();
    assert_eq!(table.node_mapping(&path("Props/Holster")), None);
    assert_eq!(
        table.node_mapping(&path("Props/Sword")),
        Some(Some(path("Props/Holster/Sword")))
    );
}
