//! Render Backend Abstraction
//!
//! The [`Renderer`](super::Renderer) does all scene-side work (lazy program
//! compilation, light and shadow setup, draw list extraction) and hands a
//! finished [`FramePacket`] to a [`RenderBackend`]. Two backends exist:
//!
//! - [`WgpuBackend`](super::gpu::WgpuBackend): draws to a window surface.
//! - [`HeadlessBackend`](super::headless::HeadlessBackend): records frames
//!   in memory, used by tests and tools without a GPU.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use super::program::{ProgramDesc, ProgramId};
use super::shader_gen::MAX_LIGHTS;
use crate::errors::Result;
use crate::resources::geometry::Geometry;
use crate::resources::material::MaterialId;
use crate::resources::texture::EnvironmentMap;
use crate::resources::uniforms::UniformSet;
use crate::scene::NodeKey;

// ============================================================================
// GPU-layout uniform blocks (mirrors chunks/globals.wgsl and chunks/model.wgsl)
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
pub struct LightUniform {
    pub color: Vec4,
    pub position: Vec4,
    pub direction: Vec4,
    pub params: Vec4,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GlobalUniforms {
    pub view_proj: Mat4,
    pub inv_view_proj: Mat4,
    pub shadow_view_proj: Mat4,
    pub camera_position: Vec4,
    pub environment: Vec4,
    pub counts: Vec4,
    pub lights: [LightUniform; MAX_LIGHTS],
}

impl Default for GlobalUniforms {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl GlobalUniforms {
    #[inline]
    #[must_use]
    pub fn light_count(&self) -> usize {
        self.counts.x as usize
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
pub struct ModelUniforms {
    pub model: Mat4,
    pub normal_matrix: Mat4,
    pub base_color: Vec4,
    /// x: roughness, y: metalness, z: receives shadows
    pub material: Vec4,
}

// ============================================================================
// Frame packet
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct ShadowPass {
    pub light_view_proj: Mat4,
    pub map_size: u32,
}

#[derive(Debug, Clone)]
pub struct BackgroundPass {
    pub map: Arc<EnvironmentMap>,
    pub inv_view_proj: Mat4,
    pub intensity: f32,
}

/// One mesh to draw this frame.
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub node: NodeKey,
    pub material: MaterialId,
    pub program: ProgramId,
    /// Drawn with the fallback program because the material failed to compile.
    pub fallback: bool,
    pub geometry: Arc<Geometry>,
    pub model: ModelUniforms,
    /// Snapshot of the material's own uniform values.
    pub uniforms: UniformSet,
    pub cast_shadows: bool,
    pub receive_shadows: bool,
}

#[derive(Debug)]
pub struct FramePacket<'a> {
    pub frame_index: u64,
    /// Output size in device pixels.
    pub size: (u32, u32),
    pub clear_color: Vec4,
    pub globals: &'a GlobalUniforms,
    pub shadow: Option<ShadowPass>,
    pub background: Option<BackgroundPass>,
    pub draws: &'a [DrawItem],
}

pub trait RenderBackend {
    fn name(&self) -> &'static str;

    /// Output size in device pixels.
    fn resize(&mut self, width: u32, height: u32);

    /// Builds whatever the backend needs for a validated program.
    fn create_program(&mut self, id: ProgramId, desc: &ProgramDesc) -> Result<()>;

    fn render(&mut self, frame: &FramePacket<'_>) -> Result<()>;
}
