use std::f32::consts::PI;

use glam::Vec3;

use crate::resources::geometry::{Geometry, Vertex};

/// A subdivided icosahedron projected onto a sphere.
///
/// Each of the 20 faces is split into `(detail + 1)^2` triangles.
#[derive(Debug, Clone, Copy)]
pub struct IcosahedronOptions {
    pub radius: f32,
    pub detail: u32,
}

impl Default for IcosahedronOptions {
    fn default() -> Self {
        Self {
            radius: 1.0,
            detail: 0,
        }
    }
}

const T: f32 = 1.618_034;

const BASE_VERTICES: [[f32; 3]; 12] = [
    [-1.0, T, 0.0],
    [1.0, T, 0.0],
    [-1.0, -T, 0.0],
    [1.0, -T, 0.0],
    [0.0, -1.0, T],
    [0.0, 1.0, T],
    [0.0, -1.0, -T],
    [0.0, 1.0, -T],
    [T, 0.0, -1.0],
    [T, 0.0, 1.0],
    [-T, 0.0, -1.0],
    [-T, 0.0, 1.0],
];

const BASE_FACES: [[usize; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

fn subdivide_face(a: Vec3, b: Vec3, c: Vec3, detail: u32, out: &mut Vec<Vec3>) {
    let cols = (detail + 1) as usize;

    // rows[i][j]: lattice points between edge a-b and vertex c
    let mut rows: Vec<Vec<Vec3>> = Vec::with_capacity(cols + 1);
    for i in 0..=cols {
        let f = i as f32 / cols as f32;
        let aj = a.lerp(c, f);
        let bj = b.lerp(c, f);
        let count = cols - i;

        let row = (0..=count)
            .map(|j| {
                if j == 0 && i == cols {
                    aj
                } else {
                    aj.lerp(bj, j as f32 / count as f32)
                }
            })
            .collect();
        rows.push(row);
    }

    for i in 0..cols {
        for j in 0..(2 * (cols - i) - 1) {
            let k = j / 2;
            if j % 2 == 0 {
                out.extend_from_slice(&[rows[i][k + 1], rows[i + 1][k], rows[i][k]]);
            } else {
                out.extend_from_slice(&[rows[i][k + 1], rows[i + 1][k + 1], rows[i + 1][k]]);
            }
        }
    }
}

#[must_use]
pub fn create_icosahedron(options: IcosahedronOptions) -> Geometry {
    let per_face = ((options.detail + 1) * (options.detail + 1) * 3) as usize;
    let mut points = Vec::with_capacity(per_face * BASE_FACES.len());

    for [ia, ib, ic] in BASE_FACES {
        subdivide_face(
            Vec3::from(BASE_VERTICES[ia]),
            Vec3::from(BASE_VERTICES[ib]),
            Vec3::from(BASE_VERTICES[ic]),
            options.detail,
            &mut points,
        );
    }

    let vertices = points
        .into_iter()
        .map(|p| {
            let normal = p.normalize();
            let position = normal * options.radius;
            let azimuth = normal.z.atan2(-normal.x);
            let inclination = (-normal.y).atan2(normal.x.hypot(normal.z));
            Vertex::new(
                position.to_array(),
                normal.to_array(),
                [azimuth / (2.0 * PI) + 0.5, inclination / PI + 0.5],
            )
        })
        .collect();

    Geometry::non_indexed("Icosahedron", vertices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_controls_triangle_count() {
        let base = create_icosahedron(IcosahedronOptions::default());
        assert_eq!(base.triangle_count(), 20);

        let fine = create_icosahedron(IcosahedronOptions { radius: 1.0, detail: 3 });
        assert_eq!(fine.triangle_count(), 20 * 16);
    }

    #[test]
    fn vertices_lie_on_the_sphere() {
        let geo = create_icosahedron(IcosahedronOptions { radius: 2.5, detail: 2 });
        for v in geo.vertices() {
            assert!((Vec3::from(v.position).length() - 2.5).abs() < 1e-4);
        }
    }
}
