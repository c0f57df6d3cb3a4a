//! Background Mode
//!
//! Describes what is drawn behind the scene. A scene without a background
//! is cleared with the renderer's clear color.

use std::sync::Arc;

use glam::Vec4;

use crate::resources::texture::EnvironmentMap;

#[derive(Debug, Clone)]
pub enum Background {
    /// Solid color clear (hardware clear, no draw call).
    Color(Vec4),
    /// Equirectangular texture drawn as a full-screen pass.
    Texture(Arc<EnvironmentMap>),
}

impl Background {
    #[must_use]
    pub fn texture(&self) -> Option<&Arc<EnvironmentMap>> {
        match self {
            Self::Texture(map) => Some(map),
            Self::Color(_) => None,
        }
    }
}
