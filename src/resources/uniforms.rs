//! Named Uniforms
//!
//! Per-material uniform values addressed by a stable name.
//!
//! # Layout
//!
//! Every uniform occupies one 16-byte slot in declaration order, so the WGSL
//! struct generated by [`UniformSet::wgsl_struct`] and the floats produced by
//! [`UniformSet::pack`] always agree without any padding bookkeeping.

use std::fmt::Write as _;

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::errors::PatchError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
}

impl UniformValue {
    #[must_use]
    pub fn wgsl_type(&self) -> &'static str {
        match self {
            Self::Float(_) => "f32",
            Self::Vec2(_) => "vec2<f32>",
            Self::Vec3(_) => "vec3<f32>",
            Self::Vec4(_) => "vec4<f32>",
        }
    }

    #[must_use]
    pub fn same_type(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    fn slot(&self) -> [f32; 4] {
        match *self {
            Self::Float(v) => [v, 0.0, 0.0, 0.0],
            Self::Vec2(v) => [v.x, v.y, 0.0, 0.0],
            Self::Vec3(v) => [v.x, v.y, v.z, 0.0],
            Self::Vec4(v) => v.to_array(),
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        Self::Vec4(v)
    }
}

/// Returns whether `name` can be used as a WGSL struct member.
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name != "_" && !name.starts_with("__") && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Ordered set of named uniforms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UniformSet {
    entries: Vec<(String, UniformValue)>,
}

impl UniformSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a new uniform. Names must be unique WGSL identifiers.
    pub fn declare(&mut self, name: impl Into<String>, value: impl Into<UniformValue>) -> Result<(), PatchError> {
        let name = name.into();
        if !is_valid_identifier(&name) {
            return Err(PatchError::InvalidUniformName(name));
        }
        if self.get(&name).is_some() {
            return Err(PatchError::DuplicateUniform(name));
        }
        self.entries.push((name, value.into()));
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut UniformValue> {
        self.entries.iter_mut().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Overwrites an existing uniform. Fails (returns `false`) for unknown
    /// names and for values of a different type.
    pub fn set(&mut self, name: &str, value: UniformValue) -> bool {
        match self.get_mut(name) {
            Some(slot) if slot.same_type(&value) => {
                *slot = value;
                true
            }
            _ => false,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, UniformValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends all uniforms of `other`, rejecting name clashes.
    pub fn merge(&mut self, other: &UniformSet) -> Result<(), PatchError> {
        for (name, value) in other.iter() {
            self.declare(name, value)?;
        }
        Ok(())
    }

    /// WGSL struct declaration matching [`pack`](Self::pack).
    #[must_use]
    pub fn wgsl_struct(&self, struct_name: &str) -> String {
        let mut out = format!("struct {struct_name} {{\n");
        for (name, value) in &self.entries {
            let _ = writeln!(out, "    @align(16) {name}: {},", value.wgsl_type());
        }
        out.push_str("}\n");
        out
    }

    /// Packs the values into 16-byte slots.
    #[must_use]
    pub fn pack(&self) -> Vec<f32> {
        self.entries.iter().flat_map(|(_, v)| v.slot()).collect()
    }

    /// Size of the packed data in bytes.
    #[must_use]
    pub fn byte_size(&self) -> u64 {
        self.entries.len() as u64 * 16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_rejects_type_change_and_unknown_name() {
        let mut set = UniformSet::new();
        set.declare("uTime", 0.0_f32).unwrap();

        assert!(set.set("uTime", UniformValue::Float(1.5)));
        assert!(!set.set("uTime", UniformValue::Vec2(Vec2::ONE)));
        assert!(!set.set("uMissing", UniformValue::Float(1.0)));
        assert_eq!(set.get("uTime"), Some(UniformValue::Float(1.5)));
    }

    #[test]
    fn declare_rejects_duplicates_and_bad_identifiers() {
        let mut set = UniformSet::new();
        set.declare("uColor", Vec3::ONE).unwrap();
        assert_eq!(
            set.declare("uColor", 1.0_f32),
            Err(PatchError::DuplicateUniform("uColor".into()))
        );
        assert!(matches!(set.declare("9lives", 1.0_f32), Err(PatchError::InvalidUniformName(_))));
        assert!(matches!(set.declare("has space", 1.0_f32), Err(PatchError::InvalidUniformName(_))));
    }

    #[test]
    fn pack_uses_one_slot_per_uniform() {
        let mut set = UniformSet::new();
        set.declare("a", 2.0_f32).unwrap();
        set.declare("b", Vec3::new(1.0, 2.0, 3.0)).unwrap();

        assert_eq!(set.pack(), vec![2.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 0.0]);
        assert_eq!(set.byte_size(), 32);
        assert!(set.wgsl_struct("Custom").contains("@align(16) b: vec3<f32>,"));
    }
}
