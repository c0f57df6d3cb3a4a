//! Shader Code Generator
//!
//! Produces the final WGSL for every program kind from the embedded
//! templates.
//!
//! The standard program is generated in two steps so a [`ShaderPatch`]
//! can rewrite it in between:
//!
//! 1. [`standard_sections`] renders the vertex and fragment sections, both
//!    still carrying their `//#include <...>` anchors.
//! 2. [`assemble_standard`] prepends the shared prelude (bindings, vertex
//!    input, varyings and the custom uniform block) to the patched sections.
//!
//! Patched code is concatenated, never fed back through the template engine.
//!
//! [`ShaderPatch`]: super::injection::ShaderPatch

use minijinja::context;
use serde::Serialize;

use super::injection::{PatchedShader, ShaderSource};
use super::shader_manager::render_template;
use crate::errors::Result;
use crate::resources::material::ShaderMaterial;
use crate::resources::uniforms::UniformSet;

/// Upper bound of lights uploaded per frame.
pub const MAX_LIGHTS: usize = 8;

/// Name of the generated custom uniform struct.
pub const CUSTOM_STRUCT: &str = "CustomUniforms";

/// Scene-level switches baked into a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct ProgramDefines {
    pub shadow_soft: bool,
}

/// Custom uniform declarations for `@group(1) @binding(1)`; empty when the
/// set is empty.
#[must_use]
pub fn custom_uniform_block(uniforms: &UniformSet) -> String {
    if uniforms.is_empty() {
        return String::new();
    }
    let mut out = uniforms.wgsl_struct(CUSTOM_STRUCT);
    out.push_str("\n@group(1) @binding(1) var<uniform> custom: ");
    out.push_str(CUSTOM_STRUCT);
    out.push_str(";\n");
    out
}

/// Unpatched vertex and fragment sections of the standard program.
pub fn standard_sections(defines: ProgramDefines) -> Result<ShaderSource> {
    let vertex = render_template("standard_vertex", context! {})?;
    let fragment = render_template(
        "standard_fragment",
        context! {
            shadow_soft => defines.shadow_soft,
            max_lights => MAX_LIGHTS,
        },
    )?;
    Ok(ShaderSource { vertex, fragment })
}

/// Complete standard program: prelude + (possibly patched) sections.
pub fn assemble_standard(patched: &PatchedShader) -> Result<String> {
    let prelude = render_template(
        "standard_common",
        context! {
            max_lights => MAX_LIGHTS,
            custom_uniform_block => custom_uniform_block(&patched.uniforms),
        },
    )?;
    Ok(format!(
        "// === standard program ===\n{prelude}\n{}\n{}\n",
        patched.vertex, patched.fragment
    ))
}

/// Complete program for a [`ShaderMaterial`].
pub fn assemble_custom(material: &ShaderMaterial) -> Result<String> {
    Ok(render_template(
        "custom",
        context! {
            max_lights => MAX_LIGHTS,
            custom_uniform_block => custom_uniform_block(&material.uniforms),
            vertex_source => material.vertex.as_str(),
            fragment_source => material.fragment.as_str(),
        },
    )?)
}

/// Unlit program used when a material fails to compile.
pub fn fallback_source() -> Result<String> {
    Ok(render_template("fallback", context! { max_lights => MAX_LIGHTS })?)
}

pub fn shadow_source() -> Result<String> {
    Ok(render_template("shadow_depth", context! {})?)
}

pub fn background_source() -> Result<String> {
    Ok(render_template("background", context! {})?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::injection::Anchor;
    use crate::renderer::program::validate_wgsl;

    #[test]
    fn standard_sections_carry_every_anchor() {
        let sections = standard_sections(ProgramDefines::default()).unwrap();
        for anchor in Anchor::ALL {
            assert!(
                sections.stage(anchor.stage()).contains(&anchor.marker()),
                "missing {}",
                anchor.name()
            );
        }
    }

    #[test]
    fn generated_programs_validate() {
        for soft in [false, true] {
            let sections = standard_sections(ProgramDefines { shadow_soft: soft }).unwrap();
            let source = assemble_standard(&PatchedShader::unpatched(sections)).unwrap();
            validate_wgsl(&source).unwrap();
        }
        validate_wgsl(&fallback_source().unwrap()).unwrap();
        validate_wgsl(&shadow_source().unwrap()).unwrap();
        validate_wgsl(&background_source().unwrap()).unwrap();
    }

    #[test]
    fn soft_shadows_switch_the_kernel() {
        let basic = standard_sections(ProgramDefines { shadow_soft: false }).unwrap();
        let soft = standard_sections(ProgramDefines { shadow_soft: true }).unwrap();
        assert!(!basic.fragment.contains("sum / 9.0"));
        assert!(soft.fragment.contains("sum / 9.0"));
    }

    #[test]
    fn empty_uniform_set_emits_no_block() {
        assert!(custom_uniform_block(&UniformSet::new()).is_empty());
    }
}
