//! Materials
//!
//! A [`Material`] describes how a mesh is shaded. Two kinds exist:
//!
//! - [`StandardMaterial`]: the built-in lit model (color, roughness,
//!   metalness), optionally rewritten by a [`ShaderPatch`] before its first
//!   compile.
//! - [`ShaderMaterial`]: fully custom vertex/fragment WGSL plus its uniforms.
//!
//! # Program lifecycle
//!
//! Programs are built lazily by the renderer the first time a material is
//! drawn (or pre-warmed). The [`ProgramState`] slot moves from `Pending` to
//! `Ready` or `Failed` exactly once; the patch never runs again afterwards.
//! Uniforms become writable only once the program is `Ready`.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::uniforms::{UniformSet, UniformValue};
use crate::renderer::injection::ShaderPatch;
use crate::renderer::program::ProgramId;

static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a material instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(u64);

impl MaterialId {
    fn next() -> Self {
        Self(NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "material#{}", self.0)
    }
}

/// Converts a `0xRRGGBB` color into linear-ish float RGB.
#[must_use]
pub fn hex_color(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardMaterial {
    pub color: Vec3,
    pub roughness: f32,
    pub metalness: f32,
    pub side: Side,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            roughness: 1.0,
            metalness: 0.0,
            side: Side::Front,
        }
    }
}

impl StandardMaterial {
    #[must_use]
    pub fn from_hex(hex: u32) -> Self {
        Self {
            color: hex_color(hex),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    #[must_use]
    pub fn with_metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness;
        self
    }

    #[must_use]
    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }
}

/// Custom WGSL material.
///
/// `vertex` must define `vs_main(in: VertexInput)` and `fragment` must define
/// `fs_main`; both are appended after the shared prelude (`globals`, `model`,
/// `VertexInput`) and, when `uniforms` is non-empty, a `custom` uniform block.
#[derive(Debug, Clone, Default)]
pub struct ShaderMaterial {
    pub vertex: String,
    pub fragment: String,
    pub uniforms: UniformSet,
    pub base_color: Vec3,
}

impl ShaderMaterial {
    #[must_use]
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
            uniforms: UniformSet::new(),
            base_color: Vec3::ONE,
        }
    }

    #[must_use]
    pub fn with_uniforms(mut self, uniforms: UniformSet) -> Self {
        self.uniforms = uniforms;
        self
    }
}

#[derive(Debug, Clone)]
pub enum MaterialKind {
    Standard(StandardMaterial),
    Custom(ShaderMaterial),
}

/// Output of a successful program build, stored on the material.
#[derive(Debug, Clone)]
pub struct CompiledShader {
    pub(crate) program: ProgramId,
    pub(crate) uniforms: UniformSet,
}

impl CompiledShader {
    #[must_use]
    pub fn program(&self) -> ProgramId {
        self.program
    }

    #[must_use]
    pub fn uniforms(&self) -> &UniformSet {
        &self.uniforms
    }
}

#[derive(Debug, Clone, Default)]
pub enum ProgramState {
    #[default]
    Pending,
    Ready(CompiledShader),
    Failed(String),
}

pub struct Material {
    id: MaterialId,
    pub name: Option<String>,
    pub kind: MaterialKind,
    patch: Option<Arc<dyn ShaderPatch>>,
    state: ProgramState,
}

impl fmt::Debug for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Material")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("patched", &self.patch.is_some())
            .field("state", &self.state)
            .finish()
    }
}

impl Material {
    #[must_use]
    pub fn standard(material: StandardMaterial) -> Self {
        Self::from_kind(MaterialKind::Standard(material))
    }

    #[must_use]
    pub fn custom(material: ShaderMaterial) -> Self {
        Self::from_kind(MaterialKind::Custom(material))
    }

    fn from_kind(kind: MaterialKind) -> Self {
        Self {
            id: MaterialId::next(),
            name: None,
            kind,
            patch: None,
            state: ProgramState::Pending,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches a patch that rewrites the standard program before its first
    /// compile.
    #[must_use]
    pub fn with_patch(mut self, patch: impl ShaderPatch + 'static) -> Self {
        self.patch = Some(Arc::new(patch));
        self
    }

    /// Replaces the patch. Ignored (returns `false`) once the program has
    /// been built.
    pub fn set_patch(&mut self, patch: Arc<dyn ShaderPatch>) -> bool {
        if !matches!(self.state, ProgramState::Pending) {
            log::warn!("{}: program already built, patch ignored", self.id);
            return false;
        }
        self.patch = Some(patch);
        true
    }

    /// A copy with a fresh identity and no compiled program.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            id: MaterialId::next(),
            name: self.name.clone(),
            kind: self.kind.clone(),
            patch: self.patch.clone(),
            state: ProgramState::Pending,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> MaterialId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> &ProgramState {
        &self.state
    }

    #[must_use]
    pub fn is_compiled(&self) -> bool {
        matches!(self.state, ProgramState::Ready(_))
    }

    #[must_use]
    pub fn compile_error(&self) -> Option<&str> {
        match &self.state {
            ProgramState::Failed(cause) => Some(cause),
            _ => None,
        }
    }

    #[must_use]
    pub fn program(&self) -> Option<ProgramId> {
        match &self.state {
            ProgramState::Ready(compiled) => Some(compiled.program),
            _ => None,
        }
    }

    #[must_use]
    pub fn base_color(&self) -> Vec3 {
        match &self.kind {
            MaterialKind::Standard(m) => m.color,
            MaterialKind::Custom(m) => m.base_color,
        }
    }

    // ========================================================================
    // Uniform control surface
    // ========================================================================

    /// Current value of a registered uniform. `None` before compile.
    #[must_use]
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        match &self.state {
            ProgramState::Ready(compiled) => compiled.uniforms.get(name),
            _ => None,
        }
    }

    /// Writes a uniform. A no-op returning `false` when the program is not
    /// built yet, the name is unknown, or the type differs.
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) -> bool {
        match &mut self.state {
            ProgramState::Ready(compiled) => compiled.uniforms.set(name, value.into()),
            _ => false,
        }
    }

    /// Mutates a uniform in place. Same no-op rules as [`set_uniform`](Self::set_uniform).
    pub fn update_uniform(&mut self, name: &str, f: impl FnOnce(&mut UniformValue)) -> bool {
        let ProgramState::Ready(compiled) = &mut self.state else {
            return false;
        };
        let Some(slot) = compiled.uniforms.get_mut(name) else {
            return false;
        };
        let before = *slot;
        f(slot);
        if !slot.same_type(&before) {
            *slot = before;
            return false;
        }
        true
    }

    /// Names of the registered uniforms, empty before compile.
    #[must_use]
    pub fn uniform_names(&self) -> Vec<&str> {
        match &self.state {
            ProgramState::Ready(compiled) => compiled.uniforms.names().collect(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn patch(&self) -> Option<&Arc<dyn ShaderPatch>> {
        self.patch.as_ref()
    }

    pub(crate) fn set_state(&mut self, state: ProgramState) {
        self.state = state;
    }

    pub(crate) fn uniforms(&self) -> Option<&UniformSet> {
        match &self.state {
            ProgramState::Ready(compiled) => Some(&compiled.uniforms),
            _ => None,
        }
    }
}
