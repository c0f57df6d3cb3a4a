use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

/// Interleaved vertex layout shared by every program: position, normal, uv.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    #[must_use]
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Immutable triangle-list geometry. Shared between meshes through `Arc`.
#[derive(Debug)]
pub struct Geometry {
    id: u64,
    pub label: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    bounding_radius: f32,
}

impl Geometry {
    /// Builds indexed geometry. Out-of-range indices are dropped together
    /// with the rest of their triangle.
    #[must_use]
    pub fn new(label: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let count = vertices.len() as u32;
        let indices = indices
            .chunks_exact(3)
            .filter(|tri| tri.iter().all(|&i| i < count))
            .flatten()
            .copied()
            .collect();

        let bounding_radius = vertices
            .iter()
            .map(|v| Vec3::from(v.position).length())
            .fold(0.0_f32, f32::max);

        Self {
            id: NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed),
            label: label.into(),
            vertices,
            indices,
            bounding_radius,
        }
    }

    /// Builds geometry from an unindexed triangle soup.
    #[must_use]
    pub fn non_indexed(label: impl Into<String>, vertices: Vec<Vertex>) -> Self {
        let usable = vertices.len() - vertices.len() % 3;
        let indices = (0..usable as u32).collect();
        Self::new(label, vertices, indices)
    }

    /// Replaces every normal with the area-weighted average of the faces
    /// that share the vertex.
    pub fn compute_vertex_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let pa = Vec3::from(self.vertices[a].position);
            let pb = Vec3::from(self.vertices[b].position);
            let pc = Vec3::from(self.vertices[c].position);
            let face = (pb - pa).cross(pc - pa);
            accum[a] += face;
            accum[b] += face;
            accum[c] += face;
        }
        for (vertex, n) in self.vertices.iter_mut().zip(accum) {
            vertex.normal = n.normalize_or(Vec3::Y).to_array();
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Radius of the origin-centered sphere enclosing all vertices.
    #[must_use]
    pub fn bounding_radius(&self) -> f32 {
        self.bounding_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_triangles_with_out_of_range_indices() {
        let verts = vec![Vertex::new([0.0; 3], [0.0, 1.0, 0.0], [0.0; 2]); 3];
        let geo = Geometry::new("t", verts, vec![0, 1, 2, 0, 1, 9]);
        assert_eq!(geo.triangle_count(), 1);
    }

    #[test]
    fn computed_normals_face_out_of_ccw_triangle() {
        let verts = vec![
            Vertex::new([0.0, 0.0, 0.0], [0.0; 3], [0.0; 2]),
            Vertex::new([1.0, 0.0, 0.0], [0.0; 3], [0.0; 2]),
            Vertex::new([0.0, 1.0, 0.0], [0.0; 3], [0.0; 2]),
        ];
        let mut geo = Geometry::non_indexed("tri", verts);
        geo.compute_vertex_normals();
        assert_eq!(geo.vertices()[0].normal, [0.0, 0.0, 1.0]);
    }
}
