//! Showcase scenes
//!
//! Content and wiring of the three reference scenes on top of the stages
//! produced by [`SceneConfig::basic`], [`SceneConfig::loader`] and
//! [`SceneConfig::shaders`].

use std::f32::consts::PI;

use glam::Vec3;

use super::builder::{SceneBundle, SceneConfig};
use super::node::Node;
use super::{NodeKey, Scene};
use crate::app::behavior::Behavior;
use crate::app::render_loop::RenderLoopController;
use crate::assets::pipeline::{EnvironmentRequest, MeshRequest};
use crate::errors::Result;
use crate::renderer::injection::{Anchor, AnchorPatch};
use crate::resources::material::{Material, StandardMaterial};
use crate::resources::mesh::Mesh;
use crate::resources::primitives::{IcosahedronOptions, TorusKnotOptions, create_icosahedron, create_torus_knot};
use crate::utils::orbit_control::OrbitControls;

/// Knot spin, radians per reference tick.
pub const KNOT_SPIN: f32 = 0.01;
/// Shader clock step per reference tick.
pub const SHADER_CLOCK_STEP: f32 = 0.002;
/// Auto-rotate speed of the orbiting scenes.
pub const AUTO_ROTATE_SPEED: f32 = 0.5;

pub const MODEL_PATH: &str = "models/test.glb";
pub const ENVIRONMENT_PATH: &str = "env/studio_small_08_2k.jpg";

const DISPLACEMENT_PARS: &str = r"
fn wobble(p: vec3<f32>, t: f32) -> f32 {
    let q = p * 2.0 + vec3<f32>(t * 3.0, t * 2.0, t);
    return sin(q.x) * sin(q.y) * sin(q.z) * custom.uStrength;
}

fn displaced_position(p: vec3<f32>, n: vec3<f32>, t: f32) -> vec3<f32> {
    return p + n * wobble(p, t);
}
";

const DISPLACEMENT_MAIN: &str = r"
    {
        let t = custom.uTime;
        var tangent = cross(object_normal, vec3<f32>(0.0, 1.0, 0.0));
        if length(tangent) < 0.001 {
            tangent = cross(object_normal, vec3<f32>(1.0, 0.0, 0.0));
        }
        tangent = normalize(tangent);
        let bitangent = normalize(cross(object_normal, tangent));

        let eps = 0.01;
        let p0 = displaced_position(transformed, object_normal, t);
        let p1 = displaced_position(transformed + tangent * eps, object_normal, t);
        let p2 = displaced_position(transformed + bitangent * eps, object_normal, t);
        transformed = p0;
        object_normal = normalize(cross(p1 - p0, p2 - p0));
    }
";

const RIPPLE_PARS: &str = r"
fn ripple(p: vec3<f32>, t: f32) -> f32 {
    return sin(p.y * 8.0 + t * 20.0);
}
";

const RIPPLE_MAIN: &str = r"
    normal = normal + vec3<f32>(0.0, 0.15 * ripple(world_position, custom.uTime), 0.0);
";

/// Noise displacement injected into the standard program, animated by `uTime`.
#[must_use]
pub fn displacement_patch() -> AnchorPatch {
    AnchorPatch::new("ico-displacement")
        .uniform("uTime", 0.0_f32)
        .uniform("uStrength", 0.2_f32)
        .after(Anchor::DisplacementParsVertex, DISPLACEMENT_PARS)
        .after(Anchor::DisplacementVertex, DISPLACEMENT_MAIN)
        .after(Anchor::BumpParsFragment, RIPPLE_PARS)
        .after(Anchor::NormalFragmentMaps, RIPPLE_MAIN)
}

/// Glossy green torus knot hovering above the floor.
pub fn add_torus_knot(scene: &mut Scene) -> NodeKey {
    let geometry = create_torus_knot(TorusKnotOptions {
        radius: 1.5,
        tube: 0.75,
        tubular_segments: 90,
        radial_segments: 32,
        ..TorusKnotOptions::default()
    });
    let material = Material::standard(StandardMaterial::from_hex(0x99ffaa).with_roughness(0.02)).with_name("knot");
    scene.add(Node::with_mesh("knot", Mesh::new(geometry, material).with_shadows(true, true)).at(Vec3::new(0.0, 3.0, 0.0)))
}

/// Finely subdivided icosahedron with the displacement patch.
pub fn add_displaced_icosahedron(scene: &mut Scene) -> NodeKey {
    let geometry = create_icosahedron(IcosahedronOptions {
        radius: 1.0,
        detail: 200,
    });
    let material = Material::standard(StandardMaterial::from_hex(0x2210fe))
        .with_name("ico")
        .with_patch(displacement_patch());

    let mut node = Node::with_mesh("ico", Mesh::new(geometry, material));
    node.transform.set_rotation_euler(0.0, -PI, 0.0);
    scene.add(node)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Showcase {
    Basic,
    Loader,
    Shaders,
}

impl Showcase {
    #[must_use]
    pub fn config(self) -> SceneConfig {
        match self {
            Self::Basic => SceneConfig::basic(),
            Self::Loader => SceneConfig::loader(),
            Self::Shaders => SceneConfig::shaders(),
        }
    }

    /// Orbit controller for the scene's camera.
    #[must_use]
    pub fn controls(self, bundle: &SceneBundle, config: &SceneConfig) -> OrbitControls {
        let controls = OrbitControls::from_camera(&bundle.camera, config.camera_target);
        match self {
            Self::Basic | Self::Loader => controls.with_auto_rotate(AUTO_ROTATE_SPEED),
            Self::Shaders => controls,
        }
    }

    /// Adds the scene content and returns the behaviors that animate it.
    pub fn populate(self, scene: &mut Scene) -> Vec<Behavior> {
        match self {
            Self::Basic => {
                let knot = add_torus_knot(scene);
                vec![Behavior::spin_y(knot, KNOT_SPIN)]
            }
            Self::Loader => Vec::new(),
            Self::Shaders => {
                let ico = add_displaced_icosahedron(scene);
                vec![Behavior::uniform_clock(ico, "uTime", SHADER_CLOCK_STEP)]
            }
        }
    }

    /// The streamed assets of the loader scene.
    #[must_use]
    pub fn asset_requests(self) -> Option<(MeshRequest, EnvironmentRequest)> {
        match self {
            Self::Loader => Some((MeshRequest::new(MODEL_PATH), EnvironmentRequest::new(ENVIRONMENT_PATH))),
            Self::Basic | Self::Shaders => None,
        }
    }

    /// Populates `bundle`, attaches it to `controller` and starts the loop.
    /// The loader scene is left Ready: its loop starts when the model lands.
    pub fn attach(self, controller: &mut RenderLoopController, mut bundle: SceneBundle, config: &SceneConfig) -> Result<()> {
        let behaviors = self.populate(&mut bundle.scene);
        let controls = self.controls(&bundle, config);

        controller.attach(bundle, controls)?;
        for behavior in behaviors {
            controller.add_behavior(behavior);
        }

        if self.asset_requests().is_none() {
            controller.start()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::injection::{ShaderPatch, ShaderSource};
    use crate::renderer::shader_gen::{self, ProgramDefines};

    #[test]
    fn displacement_patch_applies_to_the_standard_program() {
        let source: ShaderSource = shader_gen::standard_sections(ProgramDefines::default()).unwrap();
        let patched = displacement_patch().patch(source).unwrap();
        assert!(patched.vertex.contains("displaced_position(transformed"));
        assert!(patched.fragment.contains("ripple(world_position"));
        assert_eq!(patched.uniforms.len(), 2);
    }
}
