//! Geometry and Primitive Tests
//!
//! Tests for:
//! - Geometry construction: index validation, non-indexed soups, bounds
//! - Vertex normal computation (area-weighted)
//! - Primitive geometry: plane, torus knot, icosahedron

use glam::Vec3;
use showroom::resources::primitives::{
    IcosahedronOptions, PlaneOptions, TorusKnotOptions, create_icosahedron, create_plane, create_torus_knot,
};
use showroom::resources::{Geometry, Vertex};

const EPSILON: f32 = 1e-4;

fn vertex(p: [f32; 3]) -> Vertex {
    Vertex::new(p, [0.0, 0.0, 0.0], [0.0, 0.0])
}

// ============================================================================
// Geometry
// ============================================================================

#[test]
fn out_of_range_triangles_are_dropped() {
    let vertices = vec![vertex([0.0, 0.0, 0.0]), vertex([1.0, 0.0, 0.0]), vertex([0.0, 1.0, 0.0])];
    let geometry = Geometry::new("tri", vertices, vec![0, 1, 2, 0, 1, 9]);
    assert_eq!(geometry.triangle_count(), 1);
    assert_eq!(geometry.indices(), &[0, 1, 2]);
}

#[test]
fn non_indexed_ignores_trailing_vertices() {
    let vertices = (0..7).map(|i| vertex([i as f32, 0.0, 0.0])).collect();
    let geometry = Geometry::non_indexed("soup", vertices);
    assert_eq!(geometry.vertex_count(), 7);
    assert_eq!(geometry.triangle_count(), 2);
}

#[test]
fn geometry_ids_are_unique() {
    let a = create_plane(PlaneOptions::default());
    let b = create_plane(PlaneOptions::default());
    assert_ne!(a.id(), b.id());
}

#[test]
fn computed_normals_follow_winding() {
    let vertices = vec![vertex([0.0, 0.0, 0.0]), vertex([1.0, 0.0, 0.0]), vertex([0.0, 1.0, 0.0])];
    let mut geometry = Geometry::new("tri", vertices, vec![0, 1, 2]);
    geometry.compute_vertex_normals();
    for v in geometry.vertices() {
        assert!(Vec3::from(v.normal).distance(Vec3::Z) < EPSILON);
    }
}

#[test]
fn degenerate_faces_fall_back_to_up_normal() {
    let vertices = vec![vertex([0.0, 0.0, 0.0]), vertex([1.0, 0.0, 0.0]), vertex([2.0, 0.0, 0.0])];
    let mut geometry = Geometry::new("line", vertices, vec![0, 1, 2]);
    geometry.compute_vertex_normals();
    assert_eq!(geometry.vertices()[0].normal, [0.0, 1.0, 0.0]);
}

// ============================================================================
// Primitives
// ============================================================================

#[test]
fn ground_plane_dimensions() {
    let plane = create_plane(PlaneOptions {
        width: 30.0,
        height: 30.0,
        ..PlaneOptions::default()
    });
    assert_eq!(plane.vertex_count(), 4);
    assert_eq!(plane.triangle_count(), 2);
    assert!((plane.bounding_radius() - 15.0 * 2f32.sqrt()).abs() < EPSILON);
    for v in plane.vertices() {
        assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        assert_eq!(v.position[2], 0.0);
    }
}

#[test]
fn subdivided_plane_counts() {
    let plane = create_plane(PlaneOptions {
        width: 2.0,
        height: 1.0,
        width_segments: 4,
        height_segments: 3,
    });
    assert_eq!(plane.vertex_count(), 5 * 4);
    assert_eq!(plane.triangle_count(), 4 * 3 * 2);
}

#[test]
fn torus_knot_counts_match_segments() {
    let knot = create_torus_knot(TorusKnotOptions {
        radius: 1.5,
        tube: 0.75,
        tubular_segments: 90,
        radial_segments: 32,
        ..TorusKnotOptions::default()
    });
    assert_eq!(knot.vertex_count(), 91 * 33);
    assert_eq!(knot.triangle_count(), 90 * 32 * 2);
    // every vertex sits within radius + tube of the origin
    assert!(knot.bounding_radius() <= 1.5 * 2.0 + 0.75 + EPSILON);
}

#[test]
fn torus_knot_normals_are_unit_length() {
    let knot = create_torus_knot(TorusKnotOptions::default());
    for v in knot.vertices() {
        assert!((Vec3::from(v.normal).length() - 1.0).abs() < EPSILON);
    }
}

#[test]
fn icosahedron_normals_point_outward() {
    let ico = create_icosahedron(IcosahedronOptions { radius: 1.0, detail: 4 });
    assert_eq!(ico.triangle_count(), 20 * 25);
    for v in ico.vertices() {
        let p = Vec3::from(v.position);
        assert!(Vec3::from(v.normal).distance(p.normalize()) < EPSILON);
        assert!((0.0..=1.0).contains(&v.uv[0]));
        assert!((0.0..=1.0).contains(&v.uv[1]));
    }
}
