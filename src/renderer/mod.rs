//! Rendering
//!
//! [`Renderer`] turns a [`Scene`] + [`Camera`] into a [`FramePacket`] and
//! submits it to a [`RenderBackend`]. Scene-side responsibilities:
//!
//! - Lazy program builds: a material is compiled the first time it is drawn
//!   (or pre-warmed). Its [`ShaderPatch`] runs exactly once, during that build.
//! - Light packing (up to [`MAX_LIGHTS`]) and the single shadow caster.
//! - Failed materials are drawn with the unlit fallback program.
//!
//! [`ShaderPatch`]: injection::ShaderPatch

pub mod area_light;
pub mod backend;
pub mod gpu;
pub mod headless;
pub mod injection;
pub mod program;
pub mod settings;
pub mod shader_gen;
pub mod shader_manager;

use glam::{Mat4, Quat, Vec3, Vec4};

pub use area_light::{area_light_support_initialized, ensure_area_light_support};
pub use backend::{DrawItem, FramePacket, GlobalUniforms, LightUniform, ModelUniforms, RenderBackend};
pub use headless::{FrameLog, FrameRecord, HeadlessBackend};
pub use injection::{Anchor, AnchorPatch, PatchedShader, ShaderPatch, ShaderSource, ShaderStage};
pub use program::{ProgramDesc, ProgramId, ProgramRegistry};
pub use settings::{RendererSettings, ShadowMapType};
pub use shader_gen::MAX_LIGHTS;

use self::backend::{BackgroundPass, ShadowPass};
use self::shader_gen::ProgramDefines;
use crate::errors::{Error, Result};
use crate::resources::material::{CompiledShader, Material, MaterialKind, ProgramState};
use crate::resources::uniforms::UniformSet;
use crate::scene::light::{Light, LightKind};
use crate::scene::{Background, Camera, NodeKey, Scene};

/// Half extent of the orthographic shadow frustum of directional lights.
const DIRECTIONAL_SHADOW_EXTENT: f32 = 12.0;

/// Per-frame summary returned by [`Renderer::render`].
#[derive(Debug, Default)]
pub struct FrameStats {
    pub frame_index: u64,
    pub draw_calls: usize,
    pub fallback_draws: usize,
    pub lights: usize,
    /// Materials whose first build failed during this frame.
    pub compile_errors: Vec<Error>,
}

pub struct Renderer {
    settings: RendererSettings,
    backend: Box<dyn RenderBackend>,
    programs: ProgramRegistry,
    fallback: ProgramId,

    /// Logical size; the backend works in `size * pixel_ratio`.
    size: (u32, u32),
    frame_index: u64,
    area_light_warned: bool,
}

impl Renderer {
    /// Creates a renderer over `backend` and builds the fallback program.
    pub fn new(settings: RendererSettings, mut backend: Box<dyn RenderBackend>) -> Result<Self> {
        let mut programs = ProgramRegistry::new();

        let source = shader_gen::fallback_source()?;
        program::validate_wgsl(&source).map_err(Error::Gpu)?;
        let fallback = programs.register(
            backend.as_mut(),
            ProgramDesc {
                label: "fallback".into(),
                source,
                uses_custom_uniforms: false,
            },
        )?;

        log::info!("Renderer created on '{}' backend", backend.name());

        Ok(Self {
            settings,
            backend,
            programs,
            fallback,
            size: (0, 0),
            frame_index: 0,
            area_light_warned: false,
        })
    }

    /// A renderer over the [`HeadlessBackend`], plus the log of what it
    /// receives.
    pub fn headless(settings: RendererSettings) -> Result<(Self, FrameLog)> {
        let (backend, log) = HeadlessBackend::new();
        Ok((Self::new(settings, Box::new(backend))?, log))
    }

    #[must_use]
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    #[must_use]
    pub fn programs(&self) -> &ProgramRegistry {
        &self.programs
    }

    #[must_use]
    pub fn fallback_program(&self) -> ProgramId {
        self.fallback
    }

    // ========================================================================
    // Size
    // ========================================================================

    /// Logical output size.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Output size in device pixels.
    #[must_use]
    pub fn physical_size(&self) -> (u32, u32) {
        let ratio = self.settings.effective_pixel_ratio();
        let scale = |v: u32| ((v as f32 * ratio).round() as u32).max(1);
        (scale(self.size.0), scale(self.size.1))
    }

    /// Width over height of the logical size, `None` before the first resize.
    #[must_use]
    pub fn aspect(&self) -> Option<f32> {
        let (w, h) = self.size;
        (w > 0 && h > 0).then(|| w as f32 / h as f32)
    }

    /// Ignored when either dimension is zero or the size is unchanged.
    pub fn set_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || self.size == (width, height) {
            return;
        }
        self.size = (width, height);
        let (pw, ph) = self.physical_size();
        self.backend.resize(pw, ph);
        log::debug!("Renderer resized to {width}x{height} ({pw}x{ph} device pixels)");
    }

    #[must_use]
    pub fn pixel_ratio(&self) -> f32 {
        self.settings.effective_pixel_ratio()
    }

    /// Changes the device pixels per logical pixel, e.g. after the window
    /// moved to a monitor with another scale factor. The backend follows when
    /// the device-pixel size changes. Invalid or unchanged ratios are ignored.
    pub fn set_pixel_ratio(&mut self, ratio: f32) -> bool {
        if !ratio.is_finite() || ratio <= 0.0 || (self.pixel_ratio() - ratio).abs() < f32::EPSILON {
            return false;
        }
        let before = self.physical_size();
        self.settings.pixel_ratio = ratio;

        if self.size.0 > 0 && self.size.1 > 0 {
            let (pw, ph) = self.physical_size();
            if (pw, ph) != before {
                self.backend.resize(pw, ph);
            }
            log::debug!("Pixel ratio now {ratio} ({pw}x{ph} device pixels)");
        }
        true
    }

    // ========================================================================
    // Program builds
    // ========================================================================

    fn defines(&self) -> ProgramDefines {
        ProgramDefines {
            shadow_soft: self.settings.shadow_type.is_soft(),
        }
    }

    /// Builds the material's program if it has not been attempted yet.
    ///
    /// The outcome is stored on the material: later calls return the stored
    /// program or the stored failure without building again.
    pub fn compile(&mut self, material: &mut Material) -> Result<ProgramId> {
        match material.state() {
            ProgramState::Ready(compiled) => return Ok(compiled.program()),
            ProgramState::Failed(cause) => {
                return Err(Error::ShaderCompile {
                    material_id: material.id(),
                    cause: cause.clone(),
                });
            }
            ProgramState::Pending => {}
        }

        match self.build_program(material) {
            Ok(compiled) => {
                let program = compiled.program;
                log::debug!(
                    "{} compiled ({} custom uniform(s))",
                    material.id(),
                    compiled.uniforms.len()
                );
                material.set_state(ProgramState::Ready(compiled));
                Ok(program)
            }
            Err(cause) => {
                log::error!("{} failed to compile: {cause}", material.id());
                material.set_state(ProgramState::Failed(cause.clone()));
                Err(Error::ShaderCompile {
                    material_id: material.id(),
                    cause,
                })
            }
        }
    }

    fn build_program(&mut self, material: &Material) -> std::result::Result<CompiledShader, String> {
        let (label, source, uniforms) = match &material.kind {
            MaterialKind::Standard(_) => {
                let sections = shader_gen::standard_sections(self.defines()).map_err(|e| e.to_string())?;
                let patched = match material.patch() {
                    Some(patch) => patch.patch(sections).map_err(|e| e.to_string())?,
                    None => PatchedShader::unpatched(sections),
                };
                let source = shader_gen::assemble_standard(&patched).map_err(|e| e.to_string())?;
                let label = if material.patch().is_some() {
                    format!("standard+patch ({})", material.id())
                } else {
                    "standard".to_string()
                };
                (label, source, patched.uniforms)
            }
            MaterialKind::Custom(custom) => {
                let source = shader_gen::assemble_custom(custom).map_err(|e| e.to_string())?;
                (format!("custom ({})", material.id()), source, custom.uniforms.clone())
            }
        };

        program::validate_wgsl(&source)?;

        let program = self
            .programs
            .register(
                self.backend.as_mut(),
                ProgramDesc {
                    label,
                    source,
                    uses_custom_uniforms: !uniforms.is_empty(),
                },
            )
            .map_err(|e| e.to_string())?;

        Ok(CompiledShader { program, uniforms })
    }

    /// Builds every pending material up front. Returns the failures.
    pub fn prewarm<'a>(&mut self, materials: impl IntoIterator<Item = &'a mut Material>) -> Vec<Error> {
        materials
            .into_iter()
            .filter(|m| matches!(m.state(), ProgramState::Pending))
            .filter_map(|m| self.compile(m).err())
            .collect()
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Renders one frame of `scene` seen from `camera`.
    pub fn render(&mut self, scene: &mut Scene, camera: &mut Camera) -> Result<FrameStats> {
        scene.update_world_matrices();
        camera.update_view_matrix();

        let mut stats = FrameStats {
            frame_index: self.frame_index,
            ..FrameStats::default()
        };

        let draws = self.collect_draws(scene, &mut stats);
        let (globals, shadow) = self.collect_lights(scene, camera);
        stats.lights = globals.light_count();
        stats.draw_calls = draws.len();
        stats.fallback_draws = draws.iter().filter(|d| d.fallback).count();

        let (clear_color, background) = match &scene.background {
            Some(Background::Color(color)) => (*color, None),
            Some(Background::Texture(map)) => (
                self.settings.clear_color,
                Some(BackgroundPass {
                    map: map.clone(),
                    inv_view_proj: globals.inv_view_proj,
                    intensity: 1.0,
                }),
            ),
            None => (self.settings.clear_color, None),
        };

        let packet = FramePacket {
            frame_index: self.frame_index,
            size: self.physical_size(),
            clear_color,
            globals: &globals,
            shadow,
            background,
            draws: &draws,
        };
        self.backend.render(&packet)?;

        self.frame_index += 1;
        Ok(stats)
    }

    fn collect_draws(&mut self, scene: &mut Scene, stats: &mut FrameStats) -> Vec<DrawItem> {
        let keys: Vec<NodeKey> = scene
            .meshes()
            .filter(|(_, mesh, _)| mesh.visible)
            .map(|(key, _, _)| key)
            .filter(|key| scene.is_visible(*key))
            .collect();

        let mut draws = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(node) = scene.get_mut(key) else {
                continue;
            };
            let world = node.transform.world_matrix_as_mat4();
            let Some(mesh) = node.mesh.as_mut() else {
                continue;
            };

            let was_pending = matches!(mesh.material.state(), ProgramState::Pending);
            let (program, fallback) = match self.compile(&mut mesh.material) {
                Ok(program) => (program, false),
                Err(e) => {
                    if was_pending {
                        stats.compile_errors.push(e);
                    }
                    (self.fallback, true)
                }
            };

            let (roughness, metalness) = match &mesh.material.kind {
                MaterialKind::Standard(m) => (m.roughness, m.metalness),
                MaterialKind::Custom(_) => (1.0, 0.0),
            };
            let uniforms = if fallback {
                UniformSet::new()
            } else {
                mesh.material.uniforms().cloned().unwrap_or_default()
            };

            draws.push(DrawItem {
                node: key,
                material: mesh.material.id(),
                program,
                fallback,
                geometry: mesh.geometry.clone(),
                model: ModelUniforms {
                    model: world,
                    normal_matrix: world.inverse().transpose(),
                    base_color: mesh.material.base_color().extend(1.0),
                    material: Vec4::new(
                        roughness,
                        metalness,
                        if mesh.receive_shadows { 1.0 } else { 0.0 },
                        0.0,
                    ),
                },
                uniforms,
                cast_shadows: mesh.cast_shadows,
                receive_shadows: mesh.receive_shadows,
            });
        }
        draws
    }

    fn collect_lights(&mut self, scene: &Scene, camera: &Camera) -> (GlobalUniforms, Option<ShadowPass>) {
        let view_proj = camera.view_projection_matrix();
        let mut globals = GlobalUniforms {
            view_proj,
            inv_view_proj: view_proj.inverse(),
            camera_position: camera.position().extend(1.0),
            environment: scene.environment.ambient_radiance().extend(1.0),
            ..GlobalUniforms::default()
        };

        let area_support = area_light::area_light_support();
        let mut shadow = None;
        let mut count = 0;

        for (key, light, transform) in scene.lights() {
            if count == MAX_LIGHTS {
                log::warn!("More than {MAX_LIGHTS} lights in the scene, the rest are ignored");
                break;
            }
            if !scene.is_visible(key) {
                continue;
            }

            let (_, rotation, position) = transform.world_matrix().to_scale_rotation_translation();
            let direction = light_direction(light, position, rotation);

            let mut uniform = LightUniform {
                color: (light.color * light.intensity).extend(0.0),
                position: position.extend(light_kind_code(&light.kind)),
                direction: direction.extend(0.0),
                params: Vec4::ZERO,
            };

            match light.kind {
                LightKind::Area { width, height } => {
                    let Some(support) = area_support else {
                        if !self.area_light_warned {
                            log::warn!("Area lights need ensure_area_light_support(), skipping them");
                            self.area_light_warned = true;
                        }
                        continue;
                    };
                    uniform.params.w = support.effective_area(width, height);
                }
                LightKind::Spot(spot) => {
                    let (inner, outer) = spot.cone_cosines();
                    uniform.direction.w = outer;
                    uniform.params = Vec4::new(inner, spot.distance, spot.decay, 0.0);
                }
                LightKind::Directional | LightKind::Ambient => {}
            }

            if shadow.is_none() && self.settings.shadows_enabled && light.cast_shadows && light.supports_shadows() {
                let light_view_proj = shadow_view_projection(light, position, direction);
                globals.shadow_view_proj = light_view_proj;
                globals.counts.y = 1.0;
                globals.counts.z = light.shadow.bias;
                globals.counts.w = light.shadow.map_size as f32;
                uniform.color.w = 1.0;
                shadow = Some(ShadowPass {
                    light_view_proj,
                    map_size: light.shadow.map_size.max(1),
                });
            }

            globals.lights[count] = uniform;
            count += 1;
        }

        globals.counts.x = count as f32;
        (globals, shadow)
    }
}

fn light_kind_code(kind: &LightKind) -> f32 {
    match kind {
        LightKind::Directional => 0.0,
        LightKind::Ambient => 1.0,
        LightKind::Area { .. } => 2.0,
        LightKind::Spot(_) => 3.0,
    }
}

/// Direction the light travels. Area lights emit along their local -Z.
fn light_direction(light: &Light, position: Vec3, rotation: Quat) -> Vec3 {
    let forward = rotation * Vec3::NEG_Z;
    match light.kind {
        LightKind::Area { .. } => forward,
        _ => (light.target - position).try_normalize().unwrap_or(forward),
    }
}

fn shadow_view_projection(light: &Light, position: Vec3, direction: Vec3) -> Mat4 {
    let up = if direction.dot(Vec3::Y).abs() > 0.99 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let view = Mat4::look_at_rh(position, position + direction, up);

    let projection = match light.kind {
        LightKind::Spot(spot) => {
            let fov = (spot.angle * 2.0).clamp(0.1, std::f32::consts::PI - 0.1);
            let far = if spot.distance > 0.0 { spot.distance } else { 100.0 };
            Mat4::perspective_rh(fov, 1.0, 0.5, far)
        }
        _ => {
            let far = position.distance(light.target) + DIRECTIONAL_SHADOW_EXTENT * 2.0;
            let e = DIRECTIONAL_SHADOW_EXTENT;
            Mat4::orthographic_rh(-e, e, -e, e, 0.1, far)
        }
    };
    projection * view
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadow_projection_handles_vertical_lights() {
        let light = Light::new_directional(Vec3::ONE, 1.0).with_target(Vec3::ZERO);
        let m = shadow_view_projection(&light, Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y);
        assert!(m.is_finite());
    }
}
