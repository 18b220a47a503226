//! Test Geometry for Isolated Physics Testing
//!
//! Simple input data for exercising the solver and collision code:
//! - TestFloor: Thick horizontal slab (a box shape) for drop/rest tests
//! - box_mesh: Closed, outward-facing cuboid mesh for SDF and mesh-shape tests
//! - grid_mesh: Flat sheet in the XZ plane for cloth tests
//!
//! The floor has thickness (not an infinitely thin plane) so particles that
//! overshoot in one step are still pushed back out through the top face.

use crate::geometry::Mesh;
use crate::math::Transform;
use crate::shapes::{BoxShape, Shape};
use glam::Vec3;

/// Test floor - thick horizontal slab
/// The floor surface is at `y`, solid extends down to `y - thickness`
#[derive(Debug, Clone)]
pub struct TestFloor {
    pub y: f32,          // Top surface Y coordinate
    pub thickness: f32,  // How thick the floor is (extends downward)
    pub half_width: f32, // Half extent in X and Z
}

impl TestFloor {
    pub fn new(y: f32) -> Self {
        Self {
            y,
            thickness: 0.5,
            half_width: 50.0,
        }
    }

    pub fn with_thickness(y: f32, thickness: f32) -> Self {
        Self {
            thickness,
            ..Self::new(y)
        }
    }

    /// Box shape occupying the slab.
    pub fn shape(&self) -> Shape {
        let half_thickness = 0.5 * self.thickness;
        Shape::Box(BoxShape {
            extents: Vec3::new(self.half_width, half_thickness, self.half_width),
            transform: Transform::from_translation(Vec3::new(0.0, self.y - half_thickness, 0.0)),
            radius: 0.0,
        })
    }
}

/// Closed cuboid centred at the origin, 8 vertices and 12 counter-clockwise
/// (outward) triangles.
pub fn box_mesh(half_extents: Vec3) -> Mesh {
    let h = half_extents;
    let vertices = vec![
        Vec3::new(-h.x, -h.y, -h.z),
        Vec3::new(h.x, -h.y, -h.z),
        Vec3::new(h.x, h.y, -h.z),
        Vec3::new(-h.x, h.y, -h.z),
        Vec3::new(-h.x, -h.y, h.z),
        Vec3::new(h.x, -h.y, h.z),
        Vec3::new(h.x, h.y, h.z),
        Vec3::new(-h.x, h.y, h.z),
    ];
    let triangles = [
        // -z
        [0, 3, 2],
        [0, 2, 1],
        // +z
        [4, 5, 6],
        [4, 6, 7],
        // -x
        [0, 4, 7],
        [0, 7, 3],
        // +x
        [1, 2, 6],
        [1, 6, 5],
        // -y
        [0, 1, 5],
        [0, 5, 4],
        // +y
        [3, 7, 6],
        [3, 6, 2],
    ];
    Mesh::new(vertices, &triangles)
}

/// Flat `columns x rows` cell sheet at y = 0, starting at the origin and
/// growing along +X and +Z, with +Y facing triangles.
///
/// Returns vertices in row-major order and triangle index triples.
pub fn grid_mesh(columns: usize, rows: usize, spacing: f32) -> (Vec<Vec3>, Vec<[u32; 3]>) {
    assert!(columns > 0 && rows > 0, "grid needs at least one cell");
    let stride = columns + 1;
    let mut vertices = Vec::with_capacity(stride * (rows + 1));
    for r in 0..=rows {
        for c in 0..=columns {
            vertices.push(Vec3::new(c as f32 * spacing, 0.0, r as f32 * spacing));
        }
    }

    let mut triangles = Vec::with_capacity(2 * columns * rows);
    for r in 0..rows {
        for c in 0..columns {
            let v1 = (r * stride + c) as u32;
            let v2 = v1 + 1;
            let v3 = v1 + stride as u32;
            let v4 = v3 + 1;
            triangles.push([v1, v3, v4]);
            triangles.push([v1, v4, v2]);
        }
    }
    (vertices, triangles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Sphere;

    #[test]
    fn test_box_mesh_faces_point_outward() {
        let mesh = box_mesh(Vec3::new(1.0, 2.0, 3.0));
        for i in 0..mesh.triangle_count() {
            let [a, b, c] = mesh.triangle_vertices(i);
            let n = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(n.dot(centroid) > 0.0, "triangle {} faces inward", i);
        }
    }

    #[test]
    fn test_grid_mesh_faces_up() {
        let (vertices, triangles) = grid_mesh(3, 2, 0.5);
        assert_eq!(vertices.len(), 12);
        assert_eq!(triangles.len(), 12);
        for t in &triangles {
            let [a, b, c] = t.map(|i| vertices[i as usize]);
            assert!((b - a).cross(c - a).y > 0.0);
        }
    }

    #[test]
    fn test_floor_top_face_is_at_y() {
        let floor = TestFloor::new(1.0);
        let m = floor
            .shape()
            .collide(&Sphere::new(Vec3::new(0.0, 1.05, 0.0), 0.1))
            .unwrap();
        assert!((m.point.y - 1.0).abs() < 1e-5);
        assert!((m.normal - Vec3::Y).length() < 1e-5);
    }
}
