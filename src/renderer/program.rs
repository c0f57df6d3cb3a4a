//! Program Registry
//!
//! Owns the final WGSL of every program the renderer has built and hands
//! out [`ProgramId`]s. Identical sources share one id, so two unpatched
//! standard materials reuse the same backend pipeline while their uniform
//! values stay on the materials themselves.

use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHasher};
use slotmap::{SlotMap, new_key_type};

use super::backend::RenderBackend;
use crate::errors::Result;

new_key_type! {
    pub struct ProgramId;
}

/// What a backend needs to build a pipeline.
#[derive(Debug, Clone)]
pub struct ProgramDesc {
    pub label: String,
    pub source: String,
    /// The program declares `@group(1) @binding(1)`.
    pub uses_custom_uniforms: bool,
}

/// Parses and validates WGSL with naga. Errors are rendered with source
/// context.
pub fn validate_wgsl(source: &str) -> std::result::Result<(), String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| e.emit_to_string(source))?;
    Ok(())
}

fn source_hash(source: &str) -> u64 {
    let mut hasher = FxHasher::default();
    source.hash(&mut hasher);
    hasher.finish()
}

#[derive(Default)]
pub struct ProgramRegistry {
    programs: SlotMap<ProgramId, ProgramDesc>,
    by_source: FxHashMap<u64, Vec<ProgramId>>,
}

impl ProgramRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of an already registered identical source, or builds
    /// the program on `backend` and registers it.
    pub fn register(&mut self, backend: &mut dyn RenderBackend, desc: ProgramDesc) -> Result<ProgramId> {
        let hash = source_hash(&desc.source);
        if let Some(existing) = self.find(hash, &desc.source) {
            log::debug!("program '{}' reuses {existing:?}", desc.label);
            return Ok(existing);
        }

        let id = self.programs.insert(desc);
        let built = match self.programs.get(id) {
            Some(desc) => backend.create_program(id, desc),
            None => Ok(()),
        };
        if let Err(e) = built {
            self.programs.remove(id);
            return Err(e);
        }

        self.by_source.entry(hash).or_default().push(id);
        Ok(id)
    }

    fn find(&self, hash: u64, source: &str) -> Option<ProgramId> {
        self.by_source
            .get(&hash)?
            .iter()
            .copied()
            .find(|id| self.programs.get(*id).is_some_and(|p| p.source == source))
    }

    #[must_use]
    pub fn get(&self, id: ProgramId) -> Option<&ProgramDesc> {
        self.programs.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_reports_parse_errors() {
        let err = validate_wgsl("fn broken( {").unwrap_err();
        assert!(!err.is_empty());
        validate_wgsl("@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }").unwrap();
    }
}
