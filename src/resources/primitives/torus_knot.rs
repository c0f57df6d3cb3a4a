use std::f32::consts::TAU;

use glam::Vec3;

use crate::resources::geometry::{Geometry, Vertex};

/// A (p, q) torus knot with a circular tube.
#[derive(Debug, Clone, Copy)]
pub struct TorusKnotOptions {
    pub radius: f32,
    pub tube: f32,
    pub tubular_segments: u32,
    pub radial_segments: u32,
    pub p: u32,
    pub q: u32,
}

impl Default for TorusKnotOptions {
    fn default() -> Self {
        Self {
            radius: 1.0,
            tube: 0.4,
            tubular_segments: 64,
            radial_segments: 8,
            p: 2,
            q: 3,
        }
    }
}

fn curve_point(u: f32, p: f32, q: f32, radius: f32) -> Vec3 {
    let (su, cu) = u.sin_cos();
    let qu_over_p = q / p * u;
    let cs = qu_over_p.cos();

    Vec3::new(
        radius * (2.0 + cs) * 0.5 * cu,
        radius * (2.0 + cs) * su * 0.5,
        radius * qu_over_p.sin() * 0.5,
    )
}

#[must_use]
pub fn create_torus_knot(options: TorusKnotOptions) -> Geometry {
    let tubular = options.tubular_segments.max(3);
    let radial = options.radial_segments.max(3);
    let p = options.p.max(1) as f32;
    let q = options.q as f32;

    let mut vertices = Vec::with_capacity(((tubular + 1) * (radial + 1)) as usize);
    let mut indices = Vec::with_capacity((tubular * radial * 6) as usize);

    for i in 0..=tubular {
        let u = i as f32 / tubular as f32 * p * TAU;

        // Frenet-like frame from two samples along the curve
        let p1 = curve_point(u, p, q, options.radius);
        let p2 = curve_point(u + 0.01, p, q, options.radius);
        let t = p2 - p1;
        let n = p2 + p1;
        let b = t.cross(n).normalize_or_zero();
        let n = b.cross(t).normalize_or_zero();

        for j in 0..=radial {
            let v = j as f32 / radial as f32 * TAU;
            let cx = -options.tube * v.cos();
            let cy = options.tube * v.sin();

            let position = p1 + n * cx + b * cy;
            let normal = (position - p1).normalize_or(Vec3::Y);

            vertices.push(Vertex::new(
                position.to_array(),
                normal.to_array(),
                [i as f32 / tubular as f32, j as f32 / radial as f32],
            ));
        }
    }

    for j in 1..=tubular {
        for i in 1..=radial {
            let a = (radial + 1) * (j - 1) + (i - 1);
            let b = (radial + 1) * j + (i - 1);
            let c = (radial + 1) * j + i;
            let d = (radial + 1) * (j - 1) + i;

            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    Geometry::new("TorusKnot", vertices, indices)
}
