//! Core resource definitions
//!
//! CPU-side data the renderer consumes, independent of any GPU backend:
//! - Geometry: immutable interleaved vertex/index data
//! - Material: shading description, program state and uniforms
//! - Mesh: geometry + material drawable component
//! - Texture: decoded environment maps
//! - Input: platform-agnostic pointer/keyboard state

pub mod geometry;
pub mod input;
pub mod material;
pub mod mesh;
pub mod primitives;
pub mod texture;
pub mod uniforms;

pub use geometry::{Geometry, Vertex};
pub use input::{ButtonState, Input, Key, MouseButton};
pub use material::{
    CompiledShader, Material, MaterialId, MaterialKind, ProgramState, ShaderMaterial, Side,
    StandardMaterial, hex_color,
};
pub use mesh::Mesh;
pub use texture::{EnvironmentMap, TextureMapping};
pub use uniforms::{UniformSet, UniformValue};
