use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec3;
use half::f16;

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// How the texels of an [`EnvironmentMap`] are laid out on the sphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureMapping {
    Equirectangular,
}

/// A decoded environment texture: RGBA16F texels plus the average radiance
/// used for diffuse ambient lighting.
#[derive(Debug)]
pub struct EnvironmentMap {
    id: u64,
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub mapping: TextureMapping,
    texels: Vec<f16>,
    pub average: Vec3,
}

impl EnvironmentMap {
    /// Builds a map from linear RGB float pixels (row-major, 3 floats each).
    ///
    /// Returns `None` when the pixel count does not match the dimensions.
    #[must_use]
    pub fn from_rgb_f32(label: impl Into<String>, width: u32, height: u32, rgb: &[f32]) -> Option<Self> {
        let pixel_count = (width as usize) * (height as usize);
        if pixel_count == 0 || rgb.len() != pixel_count * 3 {
            return None;
        }

        let mut texels = Vec::with_capacity(pixel_count * 4);
        let mut sum = Vec3::ZERO;
        for px in rgb.chunks_exact(3) {
            let color = Vec3::new(px[0], px[1], px[2]).max(Vec3::ZERO);
            sum += color;
            texels.extend_from_slice(&[
                f16::from_f32(color.x),
                f16::from_f32(color.y),
                f16::from_f32(color.z),
                f16::ONE,
            ]);
        }

        Some(Self {
            id: NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed),
            label: label.into(),
            width,
            height,
            mapping: TextureMapping::Equirectangular,
            texels,
            average: sum / pixel_count as f32,
        })
    }

    /// A 1x1 map of a single color.
    #[must_use]
    pub fn solid(label: impl Into<String>, color: Vec3) -> Self {
        let color = color.max(Vec3::ZERO);
        Self {
            id: NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed),
            label: label.into(),
            width: 1,
            height: 1,
            mapping: TextureMapping::Equirectangular,
            texels: vec![
                f16::from_f32(color.x),
                f16::from_f32(color.y),
                f16::from_f32(color.z),
                f16::ONE,
            ],
            average: color,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn texels(&self) -> &[f16] {
        &self.texels
    }

    /// Raw bytes ready for an `Rgba16Float` upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }
}
