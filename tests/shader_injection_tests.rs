//! Shader Injection Integration Tests
//!
//! Tests for:
//! - Patch hook: runs once per material, before its first build only
//! - Uniform control surface: no-op before compile, visible to draws after
//! - Per-material uniform isolation
//! - Patched programs pass WGSL validation
//! - Failing patches: fallback draw plus a reported compile error

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use glam::Vec3;
use showroom::errors::{Error, PatchError};
use showroom::renderer::injection::{Anchor, AnchorPatch, PatchedShader, ShaderPatch, ShaderSource, insert_after};
use showroom::renderer::program::validate_wgsl;
use showroom::renderer::shader_gen::{self, ProgramDefines};
use showroom::renderer::{FrameLog, Renderer, RendererSettings};
use showroom::resources::primitives::{IcosahedronOptions, create_icosahedron};
use showroom::resources::{Material, Mesh, StandardMaterial, UniformSet, UniformValue};
use showroom::scene::showcase::displacement_patch;
use showroom::scene::{Camera, Node, NodeKey, Scene};

fn stage() -> (Renderer, FrameLog, Scene, Camera) {
    let (renderer, log) = Renderer::headless(RendererSettings::default()).unwrap();
    let mut camera = Camera::new_perspective(75.0, 1.0, 0.1, 100.0);
    camera.look_at_from(Vec3::new(0.0, 0.0, -4.0), Vec3::ZERO);
    (renderer, log, Scene::new(), camera)
}

fn ico(scene: &mut Scene, name: &'static str, material: Material) -> NodeKey {
    let geometry = create_icosahedron(IcosahedronOptions { radius: 1.0, detail: 2 });
    scene.add(Node::with_mesh(name, Mesh::new(geometry, material)))
}

fn material_mut(scene: &mut Scene, key: NodeKey) -> &mut Material {
    &mut scene.get_mut(key).unwrap().mesh.as_mut().unwrap().material
}

fn time_of(log: &FrameLog, key: NodeKey) -> Option<f32> {
    log.last()?.draw_for(key)?.uniforms.get("uTime")?.as_float()
}

/// Counts invocations and adds a `uTime` uniform without touching the code.
fn counting_patch(calls: Arc<AtomicUsize>) -> impl ShaderPatch {
    move |source: ShaderSource| -> Result<PatchedShader, PatchError> {
        calls.fetch_add(1, Ordering::SeqCst);
        let mut uniforms = UniformSet::new();
        uniforms.declare("uTime", 0.0_f32)?;
        Ok(PatchedShader {
            vertex: source.vertex,
            fragment: source.fragment,
            uniforms,
        })
    }
}

// ============================================================================
// Hook invocation
// ============================================================================

#[test]
fn patch_runs_once_across_many_frames() {
    let (mut renderer, _log, mut scene, mut camera) = stage();
    let calls = Arc::new(AtomicUsize::new(0));
    ico(
        &mut scene,
        "ico",
        Material::standard(StandardMaterial::default()).with_patch(counting_patch(calls.clone())),
    );

    for _ in 0..1000 {
        renderer.render(&mut scene, &mut camera).unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn patch_runs_once_when_prewarmed_before_first_frame() {
    let (mut renderer, _log, mut scene, mut camera) = stage();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut material = Material::standard(StandardMaterial::default()).with_patch(counting_patch(calls.clone()));

    assert!(renderer.prewarm([&mut material]).is_empty());
    assert!(material.is_compiled());
    ico(&mut scene, "ico", material);

    for _ in 0..10 {
        renderer.render(&mut scene, &mut camera).unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn patch_cannot_be_replaced_after_build() {
    let (mut renderer, _log, _scene, _camera) = stage();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    let mut material = Material::standard(StandardMaterial::default()).with_patch(counting_patch(first.clone()));
    renderer.compile(&mut material).unwrap();

    assert!(!material.set_patch(Arc::new(counting_patch(second.clone()))));
    renderer.compile(&mut material).unwrap();
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 0);
}

#[test]
fn duplicated_material_builds_its_own_program() {
    let (mut renderer, _log, _scene, _camera) = stage();
    let calls = Arc::new(AtomicUsize::new(0));

    let mut original = Material::standard(StandardMaterial::default()).with_patch(counting_patch(calls.clone()));
    renderer.compile(&mut original).unwrap();
    let mut copy = original.duplicate();
    assert!(!copy.is_compiled());
    assert_ne!(copy.id(), original.id());

    renderer.compile(&mut copy).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Uniform control surface
// ============================================================================

#[test]
fn uniform_writes_before_compile_are_no_ops() {
    let (mut renderer, log, mut scene, mut camera) = stage();
    let key = ico(
        &mut scene,
        "ico",
        Material::standard(StandardMaterial::default()).with_patch(displacement_patch()),
    );

    let material = material_mut(&mut scene, key);
    assert!(!material.set_uniform("uTime", 5.0_f32));
    assert!(!material.update_uniform("uTime", |v| *v = UniformValue::Float(5.0)));
    assert!(material.uniform("uTime").is_none());
    assert!(material.uniform_names().is_empty());

    renderer.render(&mut scene, &mut camera).unwrap();
    assert_eq!(time_of(&log, key), Some(0.0));

    let material = material_mut(&mut scene, key);
    assert!(material.set_uniform("uTime", 1.25_f32));
    assert_eq!(material.uniform("uTime"), Some(UniformValue::Float(1.25)));
    renderer.render(&mut scene, &mut camera).unwrap();
    assert_eq!(time_of(&log, key), Some(1.25));
}

#[test]
fn unknown_or_mistyped_uniform_writes_are_rejected() {
    let (mut renderer, _log, _scene, _camera) = stage();
    let mut material = Material::standard(StandardMaterial::default()).with_patch(displacement_patch());
    renderer.compile(&mut material).unwrap();

    assert!(!material.set_uniform("uMissing", 1.0_f32));
    assert!(!material.set_uniform("uTime", Vec3::ONE));
    assert!(!material.update_uniform("uTime", |v| *v = UniformValue::Vec3(Vec3::ONE)));
    assert_eq!(material.uniform("uTime"), Some(UniformValue::Float(0.0)));

    let mut names = material.uniform_names();
    names.sort_unstable();
    assert_eq!(names, vec!["uStrength", "uTime"]);
}

#[test]
fn materials_with_the_same_uniform_name_do_not_alias() {
    let (mut renderer, log, mut scene, mut camera) = stage();
    let a = ico(
        &mut scene,
        "a",
        Material::standard(StandardMaterial::default()).with_patch(displacement_patch()),
    );
    let b = ico(
        &mut scene,
        "b",
        Material::standard(StandardMaterial::default()).with_patch(displacement_patch()),
    );
    renderer.render(&mut scene, &mut camera).unwrap();

    assert!(material_mut(&mut scene, a).set_uniform("uTime", 3.0_f32));
    renderer.render(&mut scene, &mut camera).unwrap();

    assert_eq!(time_of(&log, a), Some(3.0));
    assert_eq!(time_of(&log, b), Some(0.0));
    assert_eq!(material_mut(&mut scene, b).uniform("uTime"), Some(UniformValue::Float(0.0)));
}

// ============================================================================
// Generated source
// ============================================================================

#[test]
fn displacement_program_is_valid_wgsl() {
    for defines in [ProgramDefines::default(), ProgramDefines { shadow_soft: true }] {
        let sections = shader_gen::standard_sections(defines).unwrap();
        let patched = displacement_patch().patch(sections).unwrap();
        let source = shader_gen::assemble_standard(&patched).unwrap();

        assert!(source.contains("uTime"));
        validate_wgsl(&source).unwrap();
    }
}

#[test]
fn standard_program_exposes_every_anchor_once() {
    let sections = shader_gen::standard_sections(ProgramDefines::default()).unwrap();
    for anchor in Anchor::ALL {
        let text = sections.stage(anchor.stage());
        assert_eq!(text.matches(&anchor.marker()).count(), 1, "{}", anchor.name());
    }
}

#[test]
fn insertions_at_one_anchor_keep_declaration_order() {
    let sections = shader_gen::standard_sections(ProgramDefines::default()).unwrap();
    let patched = AnchorPatch::new("order")
        .after(Anchor::DisplacementVertex, "    // first")
        .after(Anchor::DisplacementVertex, "    // second")
        .patch(sections)
        .unwrap();

    let first = patched.vertex.find("// first").unwrap();
    let second = patched.vertex.find("// second").unwrap();
    assert!(first < second);
}

#[test]
fn missing_anchor_is_reported_by_name() {
    let err = insert_after("fn main() {}", Anchor::NormalFragmentMaps, "x").unwrap_err();
    assert!(err.to_string().contains("normal_fragment_maps"));
}

// ============================================================================
// Failure handling
// ============================================================================

#[test]
fn broken_patch_falls_back_and_reports_once() {
    let (mut renderer, log, mut scene, mut camera) = stage();
    let broken = AnchorPatch::new("broken")
        .uniform("uTime", 0.0_f32)
        .after(Anchor::DisplacementVertex, "    transformed = this_is_not_wgsl(;");
    let good = ico(&mut scene, "good", Material::standard(StandardMaterial::default()));
    let bad = ico(&mut scene, "bad", Material::standard(StandardMaterial::default()).with_patch(broken));

    let first = renderer.render(&mut scene, &mut camera).unwrap();
    assert_eq!(first.draw_calls, 2);
    assert_eq!(first.fallback_draws, 1);
    assert_eq!(first.compile_errors.len(), 1);
    assert!(matches!(first.compile_errors[0], Error::ShaderCompile { .. }));

    let frame = log.last().unwrap();
    assert!(frame.draw_for(bad).unwrap().fallback);
    assert!(!frame.draw_for(good).unwrap().fallback);
    assert!(material_mut(&mut scene, bad).compile_error().is_some());

    let second = renderer.render(&mut scene, &mut camera).unwrap();
    assert_eq!(second.fallback_draws, 1);
    assert!(second.compile_errors.is_empty());
}

#[test]
fn patch_returning_an_error_marks_the_material_failed() {
    let (mut renderer, _log, _scene, _camera) = stage();
    let patch = |_: ShaderSource| -> Result<PatchedShader, PatchError> {
        Err(PatchError::DuplicateUniform("uTime".into()))
    };
    let mut material = Material::standard(StandardMaterial::default()).with_patch(patch);

    assert!(renderer.compile(&mut material).is_err());
    assert!(material.compile_error().unwrap().contains("uTime"));
    assert!(!material.set_uniform("uTime", 1.0_f32));
}
