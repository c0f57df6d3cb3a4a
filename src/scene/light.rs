use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowConfig {
    pub bias: f32,
    pub normal_bias: f32,
    pub map_size: u32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            bias: 0.0005,
            normal_bias: 0.02,
            map_size: 1024,
        }
    }
}

/// Cone description of a spot light. Angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    /// Half-angle of the outer cone.
    pub angle: f32,
    /// Fraction of the cone that fades out, 0..=1.
    pub penumbra: f32,
    /// Cut-off distance. 0 means unbounded.
    pub distance: f32,
    pub decay: f32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            angle: std::f32::consts::FRAC_PI_3,
            penumbra: 0.0,
            distance: 0.0,
            decay: 2.0,
        }
    }
}

impl SpotLight {
    /// Cosines of the inner and outer cone, inner strictly above outer.
    #[must_use]
    pub fn cone_cosines(&self) -> (f32, f32) {
        let outer = self.angle.cos();
        let inner = (self.angle * (1.0 - self.penumbra.clamp(0.0, 1.0))).cos();
        (inner.max(outer + 1e-4), outer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LightKind {
    /// Parallel rays from the light position towards `Light::target`.
    Directional,
    /// Uniform light from every direction.
    Ambient,
    /// Rectangular emitter facing the node's -Z axis.
    Area { width: f32, height: f32 },
    Spot(SpotLight),
}

#[derive(Debug, Clone)]
pub struct Light {
    pub uuid: Uuid,
    pub color: Vec3,
    pub intensity: f32,
    pub kind: LightKind,
    /// World-space point directional and spot lights aim at.
    pub target: Vec3,

    pub cast_shadows: bool,
    pub shadow: ShadowConfig,
}

impl Light {
    fn with_kind(kind: LightKind, color: Vec3, intensity: f32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            color,
            intensity,
            kind,
            target: Vec3::ZERO,
            cast_shadows: false,
            shadow: ShadowConfig::default(),
        }
    }

    #[must_use]
    pub fn new_directional(color: Vec3, intensity: f32) -> Self {
        Self::with_kind(LightKind::Directional, color, intensity)
    }

    #[must_use]
    pub fn new_ambient(color: Vec3, intensity: f32) -> Self {
        Self::with_kind(LightKind::Ambient, color, intensity)
    }

    #[must_use]
    pub fn new_area(color: Vec3, intensity: f32, width: f32, height: f32) -> Self {
        Self::with_kind(LightKind::Area { width, height }, color, intensity)
    }

    #[must_use]
    pub fn new_spot(color: Vec3, intensity: f32, spot: SpotLight) -> Self {
        Self::with_kind(LightKind::Spot(spot), color, intensity)
    }

    /// Enables shadow casting with the given map resolution.
    #[must_use]
    pub fn with_shadows(mut self, map_size: u32) -> Self {
        self.cast_shadows = true;
        self.shadow.map_size = map_size;
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub fn is_area(&self) -> bool {
        matches!(self.kind, LightKind::Area { .. })
    }

    /// Whether this kind of light can own a shadow map.
    #[must_use]
    pub fn supports_shadows(&self) -> bool {
        matches!(self.kind, LightKind::Directional | LightKind::Spot(_))
    }
}
