//! Environment
//!
//! Image-based ambient lighting configuration of a scene.

use std::sync::Arc;

use glam::Vec3;

use crate::resources::texture::EnvironmentMap;

/// Environment lighting: an optional equirectangular map and its strength.
#[derive(Clone, Debug)]
pub struct Environment {
    pub map: Option<Arc<EnvironmentMap>>,
    pub intensity: f32,
}

impl Environment {
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: None,
            intensity: 1.0,
        }
    }

    pub fn set_map(&mut self, map: Arc<EnvironmentMap>, intensity: f32) {
        self.map = Some(map);
        self.intensity = intensity;
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.map.is_some()
    }

    /// Average radiance scaled by intensity, zero when no map is set.
    #[must_use]
    pub fn ambient_radiance(&self) -> Vec3 {
        self.map
            .as_ref()
            .map_or(Vec3::ZERO, |map| map.average * self.intensity)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
