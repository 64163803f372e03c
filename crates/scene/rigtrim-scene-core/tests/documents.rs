use rigtrim_scene_core::{BehaviorType, PropertyValue, SceneDocument, SceneError, SceneGraph};

fn fixture_scene(name: &str) -> SceneGraph {
    let json = rigtrim_test_fixtures::scenes::json(name).expect("fixture json");
    SceneGraph::from_json(&json).expect("fixture scene")
}

#[test]
fn every_fixture_scene_builds() {
    for key in rigtrim_test_fixtures::scenes::keys() {
        let doc: SceneDocument = rigtrim_test_fixtures::scenes::load(&key).expect("document");
        let scene = doc.build().unwrap_or_else(|e| panic!("{key}: {e}"));
        assert!(scene.node_count() >= 1, "{key}");
    }
}

#[test]
fn avatar_node_references_resolve_against_the_tree() {
    let scene = fixture_scene("avatar");
    let body = scene.find("Body").unwrap();
    let hips = scene.find("Armature/Hips").unwrap();
    let strand = scene.find("Armature/Hips/Spine/Head/Hair/Strand").unwrap();

    let renderer = scene
        .first_behavior_of(body, &BehaviorType::SkinnedRenderer)
        .unwrap();
    let r = scene.behavior(renderer).unwrap();
    assert_eq!(r.property("rootBone"), Some(&PropertyValue::Node(hips)));
    let Some(PropertyValue::List(bones)) = r.property("bones") else {
        panic!("bones should be a list");
    };
    assert_eq!(bones.len(), 5);
    assert_eq!(bones.first(), Some(&PropertyValue::Node(hips)));
    assert_eq!(bones.last(), Some(&PropertyValue::Node(strand)));
}

#[test]
fn behavior_reference_picks_the_nth_instance_of_its_type() {
    let doc = r#"{ "root": { "name": "Rig",
        "behaviors": [
            { "type": "PositionConstraint", "properties": { "source": { "behavior": { "path": "Arm", "type": "Light", "index": 1 } } } }
        ],
        "children": [
            { "name": "Arm", "behaviors": [ { "type": "Light" }, { "type": "Light", "enabled": false } ] }
        ] } }"#;
    let scene = SceneGraph::from_json(doc).unwrap();
    let arm = scene.find("Arm").unwrap();
    let second = scene
        .behaviors_of(arm)
        .filter(|b| b.kind == BehaviorType::Light)
        .nth(1)
        .unwrap()
        .id;
    let constraint = scene
        .first_behavior_of(scene.root(), &BehaviorType::PositionConstraint)
        .unwrap();
    assert_eq!(
        scene.behavior(constraint).unwrap().property("source"),
        Some(&PropertyValue::Behavior(second))
    );
    assert!(!scene.behavior(second).unwrap().enabled);
}

#[test]
fn missing_node_reference_fails_to_load() {
    let doc = r#"{ "root": { "name": "A", "behaviors": [
        { "type": "MeshRenderer", "properties": { "probeAnchor": { "node": "Missing" } } } ] } }"#;
    match SceneGraph::from_json(doc) {
        Err(SceneError::UnresolvedReference { property, reference }) => {
            assert_eq!(property, "probeAnchor");
            assert!(reference.contains("Missing"), "{reference}");
        }
        other => panic!("expected an unresolved reference, got {other:?}"),
    }
}

#[test]
fn missing_reference_inside_a_list_fails_to_load() {
    let doc = r#"{ "root": { "name": "A",
        "behaviors": [ { "type": "SkinnedRenderer", "properties": {
            "bones": [ { "node": "Bone" }, { "node": "Gone" } ] } } ],
        "children": [ { "name": "Bone" } ] } }"#;
    assert!(matches!(
        SceneGraph::from_json(doc),
        Err(SceneError::UnresolvedReference { .. })
    ));
}

#[test]
fn behavior_reference_past_the_last_instance_fails_to_load() {
    let doc = r#"{ "root": { "name": "A",
        "behaviors": [ { "type": "PositionConstraint", "properties": {
            "source": { "behavior": { "path": "B", "type": "Light", "index": 2 } } } } ],
        "children": [ { "name": "B", "behaviors": [ { "type": "Light" } ] } ] } }"#;
    assert!(matches!(
        SceneGraph::from_json(doc),
        Err(SceneError::UnresolvedReference { .. })
    ));
}
