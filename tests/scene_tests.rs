//! Scene Integration Tests
//!
//! Tests for:
//! - Scene: add/remove nodes, attach hierarchy, subtree removal
//! - World matrix propagation through parents
//! - Model instantiation
//! - SceneGraphBuilder: presets, rigs, ground plane, camera setup

use std::f32::consts::FRAC_PI_2;

use glam::{Vec3, Vec4};
use showroom::assets::{ModelAsset, ModelNode};
use showroom::renderer::ShadowMapType;
use showroom::resources::primitives::{PlaneOptions, create_plane};
use showroom::resources::{Material, Mesh, StandardMaterial};
use showroom::scene::builder::CAMERA_FOV;
use showroom::scene::light::LightKind;
use showroom::scene::{LightingRig, Node, Scene, SceneConfig, SceneGraphBuilder, Transform};

fn plane_mesh() -> Mesh {
    Mesh::new(
        create_plane(PlaneOptions::default()),
        Material::standard(StandardMaterial::default()),
    )
}

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn add_and_add_child_build_the_tree() {
    let mut scene = Scene::new();
    let parent = scene.add(Node::new("parent"));
    let child = scene.add_child(parent, Node::new("child"));

    assert_eq!(scene.len(), 2);
    assert_eq!(scene.roots(), &[parent]);
    assert_eq!(scene.get(parent).unwrap().children(), &[child]);
    assert_eq!(scene.get(child).unwrap().parent(), Some(parent));
    assert_eq!(scene.find_by_name("child"), Some(child));
}

#[test]
fn attach_reparents_and_rejects_cycles() {
    let mut scene = Scene::new();
    let a = scene.add(Node::new("a"));
    let b = scene.add(Node::new("b"));
    let c = scene.add_child(b, Node::new("c"));

    scene.attach(b, a);
    assert_eq!(scene.roots(), &[a]);
    assert_eq!(scene.get(b).unwrap().parent(), Some(a));

    // c is below a; making a a child of c would close a loop
    scene.attach(a, c);
    assert_eq!(scene.get(a).unwrap().parent(), None);
    assert_eq!(scene.get(c).unwrap().parent(), Some(b));
}

#[test]
fn remove_takes_the_whole_subtree() {
    let mut scene = Scene::new();
    let keep = scene.add(Node::new("keep"));
    let root = scene.add(Node::new("root"));
    let mid = scene.add_child(root, Node::new("mid"));
    let leaf = scene.add_child(mid, Node::new("leaf"));

    assert_eq!(scene.remove(root), 3);
    assert!(!scene.contains(mid));
    assert!(!scene.contains(leaf));
    assert_eq!(scene.roots(), &[keep]);
    assert_eq!(scene.remove(root), 0);
}

#[test]
fn hidden_parent_hides_descendants() {
    let mut scene = Scene::new();
    let parent = scene.add(Node::new("parent"));
    let child = scene.add_child(parent, Node::with_mesh("child", plane_mesh()));

    assert!(scene.is_visible(child));
    scene.get_mut(parent).unwrap().visible = false;
    assert!(!scene.is_visible(child));
}

// ============================================================================
// World matrices
// ============================================================================

#[test]
fn world_matrices_compose_parent_transforms() {
    let mut scene = Scene::new();
    let mut parent = Node::new("parent").at(Vec3::new(10.0, 0.0, 0.0));
    parent.transform.scale = Vec3::splat(2.0);
    let parent = scene.add(parent);
    let child = scene.add_child(parent, Node::new("child").at(Vec3::new(1.0, 2.0, 3.0)));

    scene.update_world_matrices();
    let world = scene.get(child).unwrap().transform.world_position();
    assert!(world.distance(Vec3::new(12.0, 4.0, 6.0)) < 1e-5);
}

#[test]
fn traverse_visits_parents_before_children() {
    let mut scene = Scene::new();
    let root = scene.add(Node::new("root"));
    let a = scene.add_child(root, Node::new("a"));
    scene.add_child(a, Node::new("a1"));
    scene.add_child(root, Node::new("b"));

    let mut order = Vec::new();
    scene.traverse_mut(root, |_, node| order.push(node.name.to_string()));
    assert_eq!(order, vec!["root", "a", "a1", "b"]);
}

#[test]
fn instantiate_moves_a_model_under_one_root() {
    let mut model = ModelAsset::new("robot");
    model.root.scale = Vec3::splat(2.0);
    model.nodes.push(ModelNode {
        name: "body".into(),
        transform: Transform::new(),
        mesh: Some(plane_mesh()),
        children: vec![1],
    });
    model.nodes.push(ModelNode {
        name: "arm".into(),
        transform: Transform::from_position(Vec3::X),
        mesh: Some(plane_mesh()),
        children: Vec::new(),
    });
    model.roots.push(0);

    let mut scene = Scene::new();
    let root = scene.instantiate(model);

    assert_eq!(scene.len(), 3);
    assert_eq!(scene.meshes().count(), 2);
    let body = scene.find_by_name("body").unwrap();
    let arm = scene.find_by_name("arm").unwrap();
    assert_eq!(scene.get(body).unwrap().parent(), Some(root));
    assert_eq!(scene.get(arm).unwrap().parent(), Some(body));

    scene.update_world_matrices();
    let arm_world = scene.get(arm).unwrap().transform.world_position();
    assert!(arm_world.distance(Vec3::new(2.0, 0.0, 0.0)) < 1e-5);
}

// ============================================================================
// Builder
// ============================================================================

#[test]
fn basic_preset_builds_area_trio_with_ground() {
    let (bundle, _log) = SceneGraphBuilder::new(SceneConfig::basic()).build_headless().unwrap();

    assert_eq!(bundle.lights.len(), 4);
    let kinds: Vec<_> = bundle
        .lights
        .iter()
        .map(|k| bundle.scene.get(*k).unwrap().light.as_ref().unwrap().kind)
        .collect();
    assert_eq!(kinds.iter().filter(|k| matches!(k, LightKind::Area { .. })).count(), 3);
    assert!(matches!(kinds[3], LightKind::Directional));

    let ground = bundle.scene.get(bundle.ground.unwrap()).unwrap();
    let mesh = ground.mesh.as_ref().unwrap();
    assert!(!mesh.cast_shadows);
    assert!(mesh.receive_shadows);
    // the plane faces +Y after the -90 degree tilt
    assert!((ground.transform.rotation * Vec3::Z).distance(Vec3::Y) < 1e-5);
    assert!((ground.transform.rotation_euler().x + FRAC_PI_2).abs() < 1e-5);
}

#[test]
fn builder_sets_up_camera_and_renderer() {
    let config = SceneConfig::basic().with_viewport(1600, 900);
    let (bundle, log) = SceneGraphBuilder::new(config).build_headless().unwrap();

    assert_eq!(bundle.renderer.size(), (1600, 900));
    assert!((bundle.camera.aspect() - 16.0 / 9.0).abs() < 1e-6);
    assert!((bundle.camera.fov_degrees() - CAMERA_FOV).abs() < 1e-4);
    assert_eq!(bundle.camera.position(), Vec3::new(0.0, 8.0, -10.0));
    assert!(bundle.renderer.settings().shadows_enabled);
    assert_eq!(log.resizes().last(), Some(&(1600, 900)));
}

#[test]
fn loader_preset_uses_soft_shadowed_spot() {
    let (bundle, _log) = SceneGraphBuilder::new(SceneConfig::loader()).build_headless().unwrap();
    assert_eq!(bundle.renderer.settings().shadow_type, ShadowMapType::PcfSoft);

    let [spot] = bundle.lights.as_slice() else {
        panic!("one light expected");
    };
    let node = bundle.scene.get(*spot).unwrap();
    let light = node.light.as_ref().unwrap();
    let LightKind::Spot(params) = light.kind else {
        panic!("spot light expected");
    };
    assert!((params.penumbra - 1.0).abs() < f32::EPSILON);
    assert!(light.cast_shadows);
    assert_eq!(light.shadow.map_size, 2048);
    assert_eq!(node.transform.position, Vec3::new(-3.0, 10.0, 4.0));
}

#[test]
fn shaders_preset_has_no_ground_and_custom_clear_color() {
    let (bundle, _log) = SceneGraphBuilder::new(SceneConfig::shaders()).build_headless().unwrap();
    assert!(bundle.ground.is_none());
    assert_eq!(bundle.scene.meshes().count(), 0);
    assert_eq!(bundle.lights.len(), 2);
    assert!((bundle.camera.far - 100.0).abs() < f32::EPSILON);

    let clear = bundle.renderer.settings().clear_color;
    let expected = Vec4::new(32.0 / 255.0, 17.0 / 255.0, 20.0 / 255.0, 1.0);
    assert!((clear - expected).abs().max_element() < 1e-6);
}

#[test]
fn custom_rig_and_config_from_json() {
    let config = SceneConfig::from_json(r#"{ "rig": "None", "ground": null, "viewport": [320, 240] }"#)
        .unwrap()
        .with_shadow_type(ShadowMapType::Basic);
    let (bundle, _log) = SceneGraphBuilder::new(config).build_headless().unwrap();

    assert!(bundle.lights.is_empty());
    assert!(bundle.scene.is_empty());
    assert_eq!(bundle.renderer.size(), (320, 240));

    let (bundle, _log) = SceneGraphBuilder::new(SceneConfig::basic().with_rig(LightingRig::KeyAndFill))
        .build_headless()
        .unwrap();
    assert_eq!(bundle.lights.len(), 2);
}

#[test]
fn invalid_json_config_is_an_error() {
    assert!(SceneConfig::from_json("{ not json").is_err());
}
