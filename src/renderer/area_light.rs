//! Area Light Support
//!
//! Rectangular area lights need a lookup table before the renderer can shade
//! them. The table is process-wide and built once by
//! [`ensure_area_light_support`]; scene setups that use area lights call it
//! explicitly. Until then the renderer skips area lights.

use std::sync::OnceLock;

const LUT_SIZE: usize = 64;
const MAX_ASPECT: f32 = 16.0;

static SUPPORT: OnceLock<AreaLightSupport> = OnceLock::new();

/// Solid-angle correction for rectangles of unit area, indexed by aspect
/// ratio in `[1, MAX_ASPECT]`.
#[derive(Debug)]
pub struct AreaLightSupport {
    lut: [f32; LUT_SIZE],
}

impl AreaLightSupport {
    fn build() -> Self {
        let mut lut = [0.0; LUT_SIZE];
        for (i, slot) in lut.iter_mut().enumerate() {
            let aspect = 1.0 + (MAX_ASPECT - 1.0) * i as f32 / (LUT_SIZE - 1) as f32;
            let w = aspect.sqrt();
            let h = 1.0 / w;
            // Solid angle of a w x h rectangle seen head-on from unit distance
            let solid_angle = 4.0 * (w * h / ((w * w + 4.0) * (h * h + 4.0)).sqrt()).asin();
            *slot = solid_angle / (w * h);
        }
        Self { lut }
    }

    /// Effective emitting area of a `width` x `height` rectangle.
    #[must_use]
    pub fn effective_area(&self, width: f32, height: f32) -> f32 {
        let (w, h) = (width.abs(), height.abs());
        if w <= f32::EPSILON || h <= f32::EPSILON {
            return 0.0;
        }
        let aspect = (w.max(h) / w.min(h)).min(MAX_ASPECT);
        let t = (aspect - 1.0) / (MAX_ASPECT - 1.0) * (LUT_SIZE - 1) as f32;
        let i = (t.floor() as usize).min(LUT_SIZE - 2);
        let frac = t - i as f32;
        let factor = self.lut[i] + (self.lut[i + 1] - self.lut[i]) * frac;
        w * h * factor
    }
}

/// Builds the area light tables if needed. Safe to call any number of times
/// from any thread.
pub fn ensure_area_light_support() -> &'static AreaLightSupport {
    SUPPORT.get_or_init(|| {
        log::info!("Initializing area light support");
        AreaLightSupport::build()
    })
}

#[must_use]
pub fn area_light_support_initialized() -> bool {
    SUPPORT.get().is_some()
}

pub(crate) fn area_light_support() -> Option<&'static AreaLightSupport> {
    SUPPORT.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_area_is_monotonic_in_size() {
        let support = AreaLightSupport::build();
        let small = support.effective_area(1.0, 1.0);
        let large = support.effective_area(5.0, 8.0);
        assert!(small > 0.0);
        assert!(large > small);
        assert_eq!(support.effective_area(0.0, 3.0), 0.0);
    }
}
