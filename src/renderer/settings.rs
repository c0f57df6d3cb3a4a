//! Renderer Settings
//!
//! Configuration consumed once when a [`Renderer`](super::Renderer) is
//! created. All fields have defaults so hosts can load partial JSON:
//!
//! ```rust,ignore
//! let settings = RendererSettings::from_json(r#"{ "shadow_type": "PcfSoft", "pixel_ratio": 2.0 }"#)?;
//! ```

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

// ---------------------------------------------------------------------------
// ShadowMapType
// ---------------------------------------------------------------------------

/// Shadow map filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShadowMapType {
    /// Single hardware comparison tap (2x2 bilinear PCF).
    #[default]
    Basic,
    /// 3x3 tap kernel on top of the hardware comparison.
    PcfSoft,
}

impl ShadowMapType {
    #[inline]
    #[must_use]
    pub fn is_soft(self) -> bool {
        matches!(self, Self::PcfSoft)
    }
}

// ---------------------------------------------------------------------------
// RendererSettings
// ---------------------------------------------------------------------------

/// | Field              | Description                              | Default        |
/// |--------------------|------------------------------------------|----------------|
/// | `shadows_enabled`  | Render the shadow depth pass             | `true`         |
/// | `shadow_type`      | Shadow filtering                         | `Basic`        |
/// | `clear_color`      | Clear color when the scene has no background | black      |
/// | `pixel_ratio`      | Device pixels per logical pixel          | `1.0`          |
/// | `vsync`            | Present with `AutoVsync`                 | `true`         |
/// | `high_performance` | Prefer a discrete adapter                | `true`         |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    pub shadows_enabled: bool,
    pub shadow_type: ShadowMapType,
    pub clear_color: Vec4,
    pub pixel_ratio: f32,
    pub vsync: bool,
    pub high_performance: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            shadows_enabled: true,
            shadow_type: ShadowMapType::Basic,
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            pixel_ratio: 1.0,
            vsync: true,
            high_performance: true,
        }
    }
}

impl RendererSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pixel ratio clamped to a usable value.
    #[must_use]
    pub fn effective_pixel_ratio(&self) -> f32 {
        if self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0 {
            self.pixel_ratio
        } else {
            1.0
        }
    }

    #[must_use]
    pub fn present_mode(&self) -> wgpu::PresentMode {
        if self.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        }
    }

    #[must_use]
    pub fn power_preference(&self) -> wgpu::PowerPreference {
        if self.high_performance {
            wgpu::PowerPreference::HighPerformance
        } else {
            wgpu::PowerPreference::LowPower
        }
    }
}
