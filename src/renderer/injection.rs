//! Shader Injection
//!
//! Rewrites the standard program's source before it is compiled.
//!
//! The standard vertex and fragment sections contain marker lines of the
//! form `//#include <name>` at well-known points of the lighting model. A
//! [`ShaderPatch`] receives both sections and returns the rewritten source
//! together with the custom uniforms the injected code reads. Injected code
//! accesses those uniforms through the `custom` binding, e.g. `custom.uTime`.
//!
//! ```rust,ignore
//! let patch = AnchorPatch::new("wobble")
//!     .uniform("uTime", 0.0_f32)
//!     .after(Anchor::DisplacementVertex, "transformed += object_normal * sin(custom.uTime);");
//! let material = Material::standard(StandardMaterial::from_hex(0x2210fe)).with_patch(patch);
//! ```

use std::fmt;

use crate::errors::PatchError;
use crate::resources::uniforms::{UniformSet, UniformValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Named insertion points of the standard program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Vertex module scope, before `vs_main`. Declare helper functions here.
    DisplacementParsVertex,
    /// Inside `vs_main`; `transformed`, `object_normal` and `uv` are mutable.
    DisplacementVertex,
    /// Fragment module scope, before `fs_main`.
    BumpParsFragment,
    /// Inside `fs_main` after the geometric normal is known; `normal` is mutable.
    NormalFragmentMaps,
}

impl Anchor {
    pub const ALL: [Anchor; 4] = [
        Anchor::DisplacementParsVertex,
        Anchor::DisplacementVertex,
        Anchor::BumpParsFragment,
        Anchor::NormalFragmentMaps,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::DisplacementParsVertex => "displacementmap_pars_vertex",
            Self::DisplacementVertex => "displacementmap_vertex",
            Self::BumpParsFragment => "bumpmap_pars_fragment",
            Self::NormalFragmentMaps => "normal_fragment_maps",
        }
    }

    #[must_use]
    pub fn stage(self) -> ShaderStage {
        match self {
            Self::DisplacementParsVertex | Self::DisplacementVertex => ShaderStage::Vertex,
            Self::BumpParsFragment | Self::NormalFragmentMaps => ShaderStage::Fragment,
        }
    }

    /// The literal marker line in the template.
    #[must_use]
    pub fn marker(self) -> String {
        format!("//#include <{}>", self.name())
    }
}

/// The two patchable sections of a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSource {
    #[must_use]
    pub fn stage(&self, stage: ShaderStage) -> &str {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }

    fn stage_mut(&mut self, stage: ShaderStage) -> &mut String {
        match stage {
            ShaderStage::Vertex => &mut self.vertex,
            ShaderStage::Fragment => &mut self.fragment,
        }
    }
}

/// Result of a patch: rewritten sections plus the uniforms they read.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchedShader {
    pub vertex: String,
    pub fragment: String,
    pub uniforms: UniformSet,
}

impl PatchedShader {
    /// The untouched source with no custom uniforms.
    #[must_use]
    pub fn unpatched(source: ShaderSource) -> Self {
        Self {
            vertex: source.vertex,
            fragment: source.fragment,
            uniforms: UniformSet::new(),
        }
    }
}

/// A source rewrite applied once, right before a material's first compile.
pub trait ShaderPatch: Send + Sync {
    fn patch(&self, source: ShaderSource) -> Result<PatchedShader, PatchError>;
}

impl<F> ShaderPatch for F
where
    F: Fn(ShaderSource) -> Result<PatchedShader, PatchError> + Send + Sync,
{
    fn patch(&self, source: ShaderSource) -> Result<PatchedShader, PatchError> {
        self(source)
    }
}

/// Inserts `code` on the line after the first occurrence of `anchor`.
pub fn insert_after(source: &str, anchor: Anchor, code: &str) -> Result<String, PatchError> {
    let marker = anchor.marker();
    let Some(pos) = source.find(&marker) else {
        return Err(PatchError::AnchorNotFound {
            anchor: anchor.name(),
            stage: anchor.stage(),
        });
    };

    let split = pos + marker.len();
    let mut out = String::with_capacity(source.len() + code.len() + 1);
    out.push_str(&source[..split]);
    out.push('\n');
    out.push_str(code);
    out.push_str(&source[split..]);
    Ok(out)
}

/// Declarative patch: a list of anchor insertions plus uniform declarations.
#[derive(Debug, Clone, Default)]
pub struct AnchorPatch {
    label: String,
    insertions: Vec<(Anchor, String)>,
    uniforms: Vec<(String, UniformValue)>,
}

impl AnchorPatch {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Declares a uniform the injected code reads as `custom.<name>`.
    #[must_use]
    pub fn uniform(mut self, name: impl Into<String>, value: impl Into<UniformValue>) -> Self {
        self.uniforms.push((name.into(), value.into()));
        self
    }

    /// Inserts `code` after `anchor`. Insertions at the same anchor end up
    /// in declaration order.
    #[must_use]
    pub fn after(mut self, anchor: Anchor, code: impl Into<String>) -> Self {
        self.insertions.push((anchor, code.into()));
        self
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl ShaderPatch for AnchorPatch {
    fn patch(&self, mut source: ShaderSource) -> Result<PatchedShader, PatchError> {
        let mut uniforms = UniformSet::new();
        for (name, value) in &self.uniforms {
            uniforms.declare(name.clone(), *value)?;
        }

        // Reverse order so that repeated insertions at one anchor keep declaration order
        for (anchor, code) in self.insertions.iter().rev() {
            let stage = source.stage_mut(anchor.stage());
            *stage = insert_after(stage, *anchor, code)?;
        }

        log::debug!(
            "patch '{}': {} insertion(s), {} uniform(s)",
            self.label,
            self.insertions.len(),
            uniforms.len()
        );

        Ok(PatchedShader {
            vertex: source.vertex,
            fragment: source.fragment,
            uniforms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> ShaderSource {
        ShaderSource {
            vertex: "a\n//#include <displacementmap_pars_vertex>\nb\n//#include <displacementmap_vertex>\nc".into(),
            fragment: "//#include <bumpmap_pars_fragment>\nx\n//#include <normal_fragment_maps>\ny".into(),
        }
    }

    #[test]
    fn inserts_after_marker_and_keeps_marker() {
        let out = insert_after("head\n//#include <displacementmap_vertex>\ntail", Anchor::DisplacementVertex, "MID")
            .unwrap();
        assert_eq!(out, "head\n//#include <displacementmap_vertex>\nMID\ntail");
    }

    #[test]
    fn missing_anchor_is_reported_with_stage() {
        let err = insert_after("nothing here", Anchor::NormalFragmentMaps, "x").unwrap_err();
        assert_eq!(
            err,
            PatchError::AnchorNotFound {
                anchor: "normal_fragment_maps",
                stage: ShaderStage::Fragment
            }
        );
    }

    #[test]
    fn anchor_patch_routes_code_to_the_right_stage() {
        let patch = AnchorPatch::new("t")
            .uniform("uTime", 0.0_f32)
            .after(Anchor::DisplacementVertex, "V1")
            .after(Anchor::NormalFragmentMaps, "F1");

        let out = patch.patch(source()).unwrap();
        assert!(out.vertex.contains("//#include <displacementmap_vertex>\nV1"));
        assert!(out.fragment.contains("//#include <normal_fragment_maps>\nF1"));
        assert!(!out.vertex.contains("F1"));
        assert_eq!(out.uniforms.get("uTime"), Some(UniformValue::Float(0.0)));
    }

    #[test]
    fn repeated_anchor_keeps_declaration_order() {
        let patch = AnchorPatch::new("t")
            .after(Anchor::DisplacementVertex, "FIRST")
            .after(Anchor::DisplacementVertex, "SECOND");

        let out = patch.patch(source()).unwrap();
        let first = out.vertex.find("FIRST").unwrap();
        let second = out.vertex.find("SECOND").unwrap();
        assert!(first < second);
    }

    #[test]
    fn closures_are_patches() {
        let patch = |src: ShaderSource| Ok::<_, PatchError>(PatchedShader::unpatched(src));
        let out = ShaderPatch::patch(&patch, source()).unwrap();
        assert_eq!(out.vertex, source().vertex);
    }
}
