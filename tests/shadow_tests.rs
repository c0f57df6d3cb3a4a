//! Lighting and Shadow Tests
//!
//! Tests for:
//! - Shadow pass: present for a shadow-casting key light, absent otherwise
//! - Light packing limits
//! - Area light support: idempotent process-wide initialization
//! - Spot cone parameters

use std::f32::consts::FRAC_PI_3;

use glam::Vec3;
use showroom::renderer::{
    MAX_LIGHTS, Renderer, RendererSettings, ShadowMapType, area_light_support_initialized,
    ensure_area_light_support,
};
use showroom::scene::{Camera, Light, LightingRig, Node, Scene, SceneConfig, SceneGraphBuilder, SpotLight};

fn camera() -> Camera {
    let mut camera = Camera::new_perspective(75.0, 1.0, 0.1, 100.0);
    camera.look_at_from(Vec3::new(0.0, 5.0, -10.0), Vec3::ZERO);
    camera
}

// ============================================================================
// Shadow pass
// ============================================================================

#[test]
fn every_preset_with_a_caster_renders_a_shadow_pass() {
    for (config, expected) in [
        (SceneConfig::basic(), true),
        (SceneConfig::loader(), true),
        (SceneConfig::shaders(), false),
    ] {
        let (mut bundle, log) = SceneGraphBuilder::new(config.clone()).build_headless().unwrap();
        bundle.renderer.render(&mut bundle.scene, &mut bundle.camera).unwrap();

        let frame = log.last().unwrap();
        assert_eq!(frame.has_shadow_pass, expected, "{:?}", config.rig);
        assert_eq!(frame.light_count, config.rig.light_count(), "{:?}", config.rig);
    }
}

#[test]
fn disabled_shadows_skip_the_pass() {
    let settings = RendererSettings {
        shadows_enabled: false,
        ..RendererSettings::default()
    };
    let (mut renderer, log) = Renderer::headless(settings).unwrap();
    let mut scene = Scene::new();
    LightingRig::SpotStudio.install(&mut scene);

    renderer.render(&mut scene, &mut camera()).unwrap();
    assert!(!log.last().unwrap().has_shadow_pass);
}

#[test]
fn ambient_and_area_lights_never_cast() {
    let (mut renderer, log) = Renderer::headless(RendererSettings::default()).unwrap();
    ensure_area_light_support();

    let mut scene = Scene::new();
    scene.add(Node::with_light("ambient", Light::new_ambient(Vec3::ONE, 1.0).with_shadows(512)));
    scene.add(Node::with_light("panel", Light::new_area(Vec3::ONE, 3.0, 5.0, 8.0).with_shadows(512)));

    renderer.render(&mut scene, &mut camera()).unwrap();
    let frame = log.last().unwrap();
    assert_eq!(frame.light_count, 2);
    assert!(!frame.has_shadow_pass);
}

#[test]
fn both_shadow_filters_compile_the_standard_program() {
    let (mut soft, _) = SceneGraphBuilder::new(SceneConfig::basic().with_shadow_type(ShadowMapType::PcfSoft))
        .build_headless()
        .unwrap();
    let (mut basic, _) = SceneGraphBuilder::new(SceneConfig::basic().with_shadow_type(ShadowMapType::Basic))
        .build_headless()
        .unwrap();

    let stats_soft = soft.renderer.render(&mut soft.scene, &mut soft.camera).unwrap();
    let stats_basic = basic.renderer.render(&mut basic.scene, &mut basic.camera).unwrap();
    assert_eq!(stats_soft.fallback_draws, 0);
    assert_eq!(stats_basic.fallback_draws, 0);
}

// ============================================================================
// Light packing
// ============================================================================

#[test]
fn lights_beyond_the_limit_are_ignored() {
    let (mut renderer, log) = Renderer::headless(RendererSettings::default()).unwrap();
    let mut scene = Scene::new();
    for i in 0..MAX_LIGHTS + 3 {
        scene.add(Node::with_light("fill", Light::new_directional(Vec3::ONE, 0.1)).at(Vec3::new(i as f32, 5.0, 0.0)));
    }

    let stats = renderer.render(&mut scene, &mut camera()).unwrap();
    assert_eq!(stats.lights, MAX_LIGHTS);
    assert_eq!(log.last().unwrap().light_count, MAX_LIGHTS);
}

#[test]
fn hidden_lights_are_not_packed() {
    let (mut renderer, _log) = Renderer::headless(RendererSettings::default()).unwrap();
    let mut scene = Scene::new();
    let group = scene.add(Node::new("group"));
    scene.add_child(group, Node::with_light("key", Light::new_directional(Vec3::ONE, 1.0)));
    scene.get_mut(group).unwrap().visible = false;

    let stats = renderer.render(&mut scene, &mut camera()).unwrap();
    assert_eq!(stats.lights, 0);
}

// ============================================================================
// Area light support
// ============================================================================

#[test]
fn area_light_support_is_initialized_once() {
    let first = ensure_area_light_support();
    let second = ensure_area_light_support();
    assert!(std::ptr::eq(first, second));
    assert!(area_light_support_initialized());

    let rect = first.effective_area(5.0, 8.0);
    assert!(rect > 0.0);
    assert!((first.effective_area(8.0, 5.0) - rect).abs() < 1e-6);
}

#[test]
fn area_support_is_safe_to_initialize_from_many_threads() {
    let handles: Vec<_> = (0..8)
        .map(|_| std::thread::spawn(|| std::ptr::from_ref(ensure_area_light_support()) as usize))
        .collect();
    let addresses: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(addresses.windows(2).all(|w| w[0] == w[1]));
}

// ============================================================================
// Spot cone
// ============================================================================

#[test]
fn spot_cone_inner_is_inside_outer() {
    for penumbra in [0.0, 0.25, 1.0] {
        let spot = SpotLight {
            penumbra,
            ..SpotLight::default()
        };
        let (inner, outer) = spot.cone_cosines();
        assert!((outer - FRAC_PI_3.cos()).abs() < 1e-6);
        assert!(inner > outer);
    }
}
