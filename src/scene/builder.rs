//! Scene Graph Builder
//!
//! Turns a [`SceneConfig`] into a fully wired [`SceneBundle`]: a scene with
//! the rig's lights and the ground plane, a perspective camera, and a
//! renderer with shadow mapping enabled.
//!
//! ```rust,ignore
//! let (bundle, _log) = SceneGraphBuilder::new(SceneConfig::basic().with_viewport(1280, 720))
//!     .build_headless()?;
//! assert_eq!(bundle.lights.len(), 4);
//! ```

use std::f32::consts::FRAC_PI_2;

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use super::camera::Camera;
use super::node::Node;
use super::rig::LightingRig;
use super::{NodeKey, Scene};
use crate::errors::Result;
use crate::renderer::backend::RenderBackend;
use crate::renderer::headless::FrameLog;
use crate::renderer::settings::{RendererSettings, ShadowMapType};
use crate::renderer::Renderer;
use crate::resources::material::{Material, StandardMaterial, hex_color};
use crate::resources::mesh::Mesh;
use crate::resources::primitives::{PlaneOptions, create_plane};

/// Vertical field of view of every showcase camera, in degrees.
pub const CAMERA_FOV: f32 = 75.0;

/// Square floor under the scene. Receives shadows, never casts them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundPlane {
    pub size: f32,
    pub color: u32,
    pub roughness: f32,
    pub metalness: f32,
}

impl Default for GroundPlane {
    fn default() -> Self {
        Self {
            size: 30.0,
            color: 0xbcbcbc,
            roughness: 0.6,
            metalness: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Logical viewport size.
    pub viewport: (u32, u32),
    pub pixel_ratio: f32,
    pub rig: LightingRig,
    pub ground: Option<GroundPlane>,
    pub camera_position: Vec3,
    /// Point the camera initially looks at; also the orbit target.
    pub camera_target: Vec3,
    pub camera_fov: f32,
    pub near: f32,
    pub far: f32,
    pub shadow_type: ShadowMapType,
    pub clear_color: Vec4,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            viewport: (1280, 720),
            pixel_ratio: 1.0,
            rig: LightingRig::AreaTrio,
            ground: Some(GroundPlane::default()),
            camera_position: Vec3::new(0.0, 8.0, -10.0),
            camera_target: Vec3::new(0.0, 4.0, 0.0),
            camera_fov: CAMERA_FOV,
            near: 0.1,
            far: 1000.0,
            shadow_type: ShadowMapType::Basic,
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
        }
    }
}

impl SceneConfig {
    /// Area-lit torus knot stage.
    #[must_use]
    pub fn basic() -> Self {
        Self::default()
    }

    /// Spot-lit stage for a streamed model, with soft shadows.
    #[must_use]
    pub fn loader() -> Self {
        Self {
            rig: LightingRig::SpotStudio,
            shadow_type: ShadowMapType::PcfSoft,
            ..Self::default()
        }
    }

    /// Floorless stage for the displaced icosahedron.
    #[must_use]
    pub fn shaders() -> Self {
        let clear = hex_color(0x20_11_14);
        Self {
            rig: LightingRig::KeyAndFill,
            ground: None,
            camera_position: Vec3::new(0.0, 0.0, -4.0),
            camera_target: Vec3::ZERO,
            far: 100.0,
            clear_color: clear.extend(1.0),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = (width, height);
        self
    }

    #[must_use]
    pub fn with_pixel_ratio(mut self, pixel_ratio: f32) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    #[must_use]
    pub fn with_rig(mut self, rig: LightingRig) -> Self {
        self.rig = rig;
        self
    }

    #[must_use]
    pub fn with_shadow_type(mut self, shadow_type: ShadowMapType) -> Self {
        self.shadow_type = shadow_type;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Renderer settings implied by this scene: shadows always on.
    #[must_use]
    pub fn renderer_settings(&self) -> RendererSettings {
        RendererSettings {
            shadows_enabled: true,
            shadow_type: self.shadow_type,
            clear_color: self.clear_color,
            pixel_ratio: self.pixel_ratio,
            ..RendererSettings::default()
        }
    }

    fn aspect(&self) -> f32 {
        let (w, h) = self.viewport;
        if w == 0 || h == 0 { 1.0 } else { w as f32 / h as f32 }
    }
}

/// Everything a render loop needs, as named fields.
pub struct SceneBundle {
    pub scene: Scene,
    pub camera: Camera,
    pub renderer: Renderer,
    /// Light nodes added by the rig, in rig order.
    pub lights: Vec<NodeKey>,
    pub ground: Option<NodeKey>,
}

pub struct SceneGraphBuilder {
    config: SceneConfig,
}

impl SceneGraphBuilder {
    #[must_use]
    pub fn new(config: SceneConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Builds the bundle around the given backend.
    pub fn build(self, backend: Box<dyn RenderBackend>) -> Result<SceneBundle> {
        let config = self.config;

        let mut renderer = Renderer::new(config.renderer_settings(), backend)?;
        renderer.set_size(config.viewport.0, config.viewport.1);

        let mut camera = Camera::new_perspective(config.camera_fov, config.aspect(), config.near, config.far);
        camera.look_at_from(config.camera_position, config.camera_target);

        let mut scene = Scene::new();
        let lights = config.rig.install(&mut scene);
        let ground = config.ground.map(|ground| add_ground(&mut scene, ground));

        log::info!(
            "Built scene: {:?} rig, {} light(s), ground {}, {:?} shadows",
            config.rig,
            lights.len(),
            if ground.is_some() { "on" } else { "off" },
            config.shadow_type,
        );

        Ok(SceneBundle {
            scene,
            camera,
            renderer,
            lights,
            ground,
        })
    }

    /// Builds the bundle on the headless backend and returns its frame log.
    pub fn build_headless(self) -> Result<(SceneBundle, FrameLog)> {
        let (backend, log) = crate::renderer::headless::HeadlessBackend::new();
        Ok((self.build(Box::new(backend))?, log))
    }
}

fn add_ground(scene: &mut Scene, ground: GroundPlane) -> NodeKey {
    let geometry = create_plane(PlaneOptions {
        width: ground.size,
        height: ground.size,
        ..PlaneOptions::default()
    });
    let material = Material::standard(
        StandardMaterial::from_hex(ground.color)
            .with_roughness(ground.roughness)
            .with_metalness(ground.metalness),
    )
    .with_name("ground");

    let mut node = Node::with_mesh("ground", Mesh::new(geometry, material).with_shadows(false, true));
    node.transform.set_rotation_euler(-FRAC_PI_2, 0.0, 0.0);
    scene.add(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shaders_preset_has_no_ground_and_a_dark_clear_color() {
        let config = SceneConfig::shaders();
        assert!(config.ground.is_none());
        assert_eq!(config.far, 100.0);
        assert!(config.clear_color.x > config.clear_color.z);
    }

    #[test]
    fn config_loads_from_partial_json() {
        let config = SceneConfig::from_json(r#"{ "rig": "SpotStudio", "viewport": [640, 480] }"#).unwrap();
        assert_eq!(config.rig, LightingRig::SpotStudio);
        assert_eq!(config.viewport, (640, 480));
        assert_eq!(config.camera_fov, CAMERA_FOV);
    }
}
