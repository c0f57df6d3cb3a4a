//! Render Loop Integration Tests
//!
//! Tests for:
//! - Lifecycle: Uninitialized -> Ready -> Running -> Stopped
//! - Resize: renderer size and camera aspect move together; pixel ratio changes
//! - Tick ordering: behaviors, orbit update, one render per tick
//! - Showcase wiring of the basic and shaders scenes

use glam::Vec3;
use showroom::app::{Behavior, LoopState, RenderLoopController};
use showroom::errors::{Error, LoopError};
use showroom::renderer::FrameLog;
use showroom::scene::showcase::{KNOT_SPIN, Showcase};
use showroom::scene::{SceneConfig, SceneGraphBuilder};
use showroom::utils::OrbitControls;

const DT: f32 = 1.0 / 60.0;

fn attached(config: SceneConfig) -> (RenderLoopController, FrameLog) {
    let (bundle, log) = SceneGraphBuilder::new(config.clone()).build_headless().unwrap();
    let controls = OrbitControls::from_camera(&bundle.camera, config.camera_target);
    let mut controller = RenderLoopController::new();
    controller.attach(bundle, controls).unwrap();
    (controller, log)
}

fn assert_in_sync(controller: &RenderLoopController, w: u32, h: u32) {
    let bundle = controller.bundle().unwrap();
    assert_eq!(bundle.renderer.size(), (w, h));
    assert!((bundle.camera.aspect() - w as f32 / h as f32).abs() < 1e-6);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn attach_moves_to_ready_and_start_to_running() {
    let (mut controller, _log) = attached(SceneConfig::basic());
    assert_eq!(controller.state(), LoopState::Ready);

    controller.start().unwrap();
    assert_eq!(controller.state(), LoopState::Running);

    // idempotent
    controller.start().unwrap();
    assert_eq!(controller.state(), LoopState::Running);
}

#[test]
fn ready_loop_does_not_tick() {
    let (mut controller, log) = attached(SceneConfig::basic());
    assert!(matches!(controller.tick(DT), Err(Error::Loop(LoopError::NotRunning))));
    assert_eq!(log.total_frames(), 0);
}

#[test]
fn second_attach_is_rejected() {
    let (mut controller, _log) = attached(SceneConfig::basic());
    let (bundle, _) = SceneGraphBuilder::new(SceneConfig::basic()).build_headless().unwrap();
    let result = controller.attach(bundle, OrbitControls::default());
    assert!(matches!(result, Err(Error::Loop(LoopError::AlreadyAttached))));
    assert_eq!(controller.state(), LoopState::Ready);
}

#[test]
fn shutdown_returns_the_bundle_and_stops_for_good() {
    let (mut controller, log) = attached(SceneConfig::basic());
    controller.start().unwrap();
    controller.tick(DT).unwrap();

    let bundle = controller.shutdown().expect("bundle handed back");
    assert_eq!(bundle.lights.len(), 4);
    assert_eq!(controller.state(), LoopState::Stopped);

    assert!(matches!(controller.start(), Err(Error::Loop(LoopError::Stopped))));
    assert!(matches!(controller.tick(DT), Err(Error::Loop(LoopError::Stopped))));
    assert_eq!(log.total_frames(), 1);
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn resize_updates_size_and_aspect_together() {
    let (mut controller, log) = attached(SceneConfig::basic().with_viewport(800, 600));
    controller.start().unwrap();

    for (w, h) in [(1, 1), (1920, 1080), (333, 777), (4096, 17), (640, 480)] {
        assert!(controller.resize(w, h));
        assert_in_sync(&controller, w, h);

        let report = controller.tick(DT).unwrap();
        assert_eq!(report.stats.draw_calls, 1);
        assert_eq!(log.last().unwrap().size, (w, h));
    }
}

#[test]
fn zero_sized_resize_is_ignored() {
    let (mut controller, _log) = attached(SceneConfig::basic().with_viewport(800, 600));
    assert!(!controller.resize(0, 600));
    assert!(!controller.resize(800, 0));
    assert!(!controller.resize(0, 0));
    assert_in_sync(&controller, 800, 600);
}

#[test]
fn repeated_resize_is_a_no_op() {
    let (mut controller, log) = attached(SceneConfig::basic().with_viewport(800, 600));
    assert!(controller.resize(1024, 768));
    assert!(!controller.resize(1024, 768));
    assert_eq!(log.resizes(), vec![(800, 600), (1024, 768)]);
}

#[test]
fn stale_camera_aspect_is_corrected_before_rendering() {
    let (mut controller, _log) = attached(SceneConfig::basic().with_viewport(800, 400));
    controller.start().unwrap();

    controller.bundle_mut().unwrap().camera.set_aspect(0.25);
    controller.tick(DT).unwrap();
    assert_in_sync(&controller, 800, 400);
}

#[test]
fn pixel_ratio_scales_the_backend_size_only() {
    let (controller, log) = attached(SceneConfig::basic().with_viewport(400, 300).with_pixel_ratio(2.0));
    assert_eq!(controller.bundle().unwrap().renderer.size(), (400, 300));
    assert_eq!(log.resizes(), vec![(800, 600)]);
}

#[test]
fn pixel_ratio_change_resizes_the_backend_at_the_same_logical_size() {
    let (mut controller, log) = attached(SceneConfig::basic().with_viewport(800, 600));
    controller.start().unwrap();

    // the window moved to a 2x monitor; its logical size is unchanged
    assert!(controller.set_pixel_ratio(2.0));
    assert!(!controller.resize(800, 600));
    assert_eq!(log.resizes(), vec![(800, 600), (1600, 1200)]);

    let renderer = &controller.bundle().unwrap().renderer;
    assert_eq!(renderer.size(), (800, 600));
    assert_eq!(renderer.physical_size(), (1600, 1200));
    assert_in_sync(&controller, 800, 600);

    controller.tick(DT).unwrap();
    assert_eq!(log.last().unwrap().size, (1600, 1200));
}

#[test]
fn invalid_or_unchanged_pixel_ratio_is_ignored() {
    let (mut controller, log) = attached(SceneConfig::basic().with_viewport(800, 600));
    for ratio in [1.0, 0.0, -2.0, f32::NAN, f32::INFINITY] {
        assert!(!controller.set_pixel_ratio(ratio), "{ratio}");
    }
    assert_eq!(log.resizes(), vec![(800, 600)]);
}

// ============================================================================
// Tick
// ============================================================================

#[test]
fn each_tick_renders_exactly_once() {
    let (mut controller, log) = attached(SceneConfig::basic());
    controller.start().unwrap();

    for i in 1..=10 {
        let report = controller.tick(DT).unwrap();
        assert_eq!(report.frame, i);
    }
    assert_eq!(log.total_frames(), 10);
}

#[test]
fn spin_behavior_follows_dt() {
    let config = SceneConfig::basic();
    let (bundle, _log) = SceneGraphBuilder::new(config.clone()).build_headless().unwrap();
    let mut controller = RenderLoopController::new();
    Showcase::Basic.attach(&mut controller, bundle, &config).unwrap();
    assert_eq!(controller.state(), LoopState::Running);

    let knot = controller.behaviors()[0].node();
    for _ in 0..60 {
        controller.tick(DT).unwrap();
    }
    let rotation = controller.bundle().unwrap().scene.get(knot).unwrap().transform.rotation;
    let (axis, angle) = rotation.to_axis_angle();
    assert!((angle - 60.0 * KNOT_SPIN).abs() < 1e-3, "angle {angle}");
    assert!(axis.abs().distance(Vec3::Y) < 1e-3);
}

#[test]
fn frame_locked_spin_ignores_dt() {
    let (mut controller, _log) = attached(SceneConfig::basic());
    let knot = showroom::scene::showcase::add_torus_knot(&mut controller.bundle_mut().unwrap().scene);
    controller.add_behavior(Behavior::spin_y(knot, 0.01).per_tick());
    controller.start().unwrap();

    for _ in 0..10 {
        controller.tick(1.0).unwrap();
    }
    let rotation = controller.bundle().unwrap().scene.get(knot).unwrap().transform.rotation;
    assert!((rotation.to_axis_angle().1 - 0.1).abs() < 1e-3);
}

#[test]
fn auto_rotating_orbit_moves_the_camera_around_its_target() {
    let config = SceneConfig::basic();
    let (bundle, _log) = SceneGraphBuilder::new(config.clone()).build_headless().unwrap();
    let mut controller = RenderLoopController::new();
    Showcase::Basic.attach(&mut controller, bundle, &config).unwrap();

    let start = controller.bundle().unwrap().camera.position();
    for _ in 0..120 {
        controller.tick(DT).unwrap();
    }
    let camera = &controller.bundle().unwrap().camera;
    let target = config.camera_target;
    assert!((camera.position().distance(target) - start.distance(target)).abs() < 1e-3);
    assert!(camera.position().distance(start) > 0.05);
}

#[test]
fn shaders_scene_clock_advances_after_first_compile() {
    let config = SceneConfig::shaders();
    let (bundle, log) = SceneGraphBuilder::new(config.clone()).build_headless().unwrap();
    let mut controller = RenderLoopController::new();
    Showcase::Shaders.attach(&mut controller, bundle, &config).unwrap();

    let ico = controller.behaviors()[0].node();
    for _ in 0..60 {
        controller.tick(DT).unwrap();
    }

    let frame = log.last().unwrap();
    let draw = frame.draw_for(ico).unwrap();
    assert!(!draw.fallback);
    let Some(showroom::resources::UniformValue::Float(t)) = draw.uniforms.get("uTime") else {
        panic!("uTime missing from the ico draw");
    };
    // the first tick compiles; the clock only moves on the 59 ticks after it
    assert!((t - 59.0 * 0.002).abs() < 1e-4, "uTime {t}");
    assert!((frame.clear_color.x - 0x20 as f32 / 255.0).abs() < 1e-6);
}
