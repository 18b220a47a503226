//! Indexed triangle mesh with edge adjacency and a static triangle tree.

use super::{Aabb, StaticTree};
use crate::constants::LINEAR_SLOP;
use crate::math::Transform;
use glam::Vec3;

/// Triangle `v[0], v[1], v[2]` with, per edge `v[i] -> v[i + 1]`, the
/// non-shared vertex of the neighbouring triangle across that edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshTriangle {
    pub v: [u32; 3],
    pub wings: [Option<u32>; 3],
}

impl MeshTriangle {
    pub fn new(v1: u32, v2: u32, v3: u32) -> Self {
        Self {
            v: [v1, v2, v3],
            wings: [None; 3],
        }
    }
}

#[derive(Clone, Debug)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<MeshTriangle>,
    tree: StaticTree,
}

impl Mesh {
    /// Build a mesh from counter-clockwise (outward) triangles. Computes the
    /// wing adjacency and the triangle tree.
    pub fn new(vertices: Vec<Vec3>, triangles: &[[u32; 3]]) -> Self {
        for t in triangles {
            for &i in t {
                assert!((i as usize) < vertices.len(), "vertex index {} out of range", i);
            }
        }
        let mut mesh = Self {
            vertices,
            triangles: triangles
                .iter()
                .map(|t| MeshTriangle::new(t[0], t[1], t[2]))
                .collect(),
            tree: StaticTree::default(),
        };
        mesh.build_adjacency();
        mesh.build_tree();
        mesh
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn tree(&self) -> &StaticTree {
        &self.tree
    }

    /// The three corners of triangle `index`.
    pub fn triangle_vertices(&self, index: usize) -> [Vec3; 3] {
        let t = &self.triangles[index];
        [
            self.vertices[t.v[0] as usize],
            self.vertices[t.v[1] as usize],
            self.vertices[t.v[2] as usize],
        ]
    }

    /// Triangle box grown by the linear slop.
    pub fn triangle_aabb(&self, index: usize) -> Aabb {
        Aabb::from_points(&self.triangle_vertices(index)).extended(LINEAR_SLOP)
    }

    pub fn compute_aabb(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }

    /// Box of the mesh after scaling and then transforming each vertex.
    pub fn compute_transformed_aabb(&self, xf: &Transform, scale: Vec3) -> Aabb {
        let points: Vec<Vec3> = self
            .vertices
            .iter()
            .map(|v| xf.transform_point(scale * *v))
            .collect();
        Aabb::from_points(&points)
    }

    /// For every edge, find the first triangle that owns the reversed edge
    /// and record its third vertex.
    pub fn build_adjacency(&mut self) {
        let count = self.triangles.len();
        for i1 in 0..count {
            for j1 in 0..3 {
                let k1 = (j1 + 1) % 3;
                let t1v1 = self.triangles[i1].v[j1];
                let t1v2 = self.triangles[i1].v[k1];

                let mut wing = None;
                'search: for i2 in 0..count {
                    if i1 == i2 {
                        continue;
                    }
                    let t2 = &self.triangles[i2];
                    for j2 in 0..3 {
                        let k2 = (j2 + 1) % 3;
                        if t1v1 == t2.v[k2] && t1v2 == t2.v[j2] {
                            wing = Some(t2.v[(k2 + 1) % 3]);
                            break 'search;
                        }
                    }
                }
                self.triangles[i1].wings[j1] = wing;
            }
        }
    }

    fn build_tree(&mut self) {
        let aabbs: Vec<Aabb> = (0..self.triangles.len())
            .map(|i| self.triangle_aabb(i))
            .collect();
        self.tree = StaticTree::build(&aabbs);
    }

    /// Bake scale, then rotation, then translation into the vertices.
    pub fn transform(&mut self, xf: &Transform, scale: Vec3) {
        for v in &mut self.vertices {
            *v = xf.transform_point(scale * *v);
        }
        self.build_tree();
    }

    pub fn scale(&mut self, scale: Vec3) {
        self.transform(&Transform::IDENTITY, scale);
    }

    pub fn translate(&mut self, translation: Vec3) {
        self.transform(&Transform::from_translation(translation), Vec3::ONE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_geometry::box_mesh;

    #[test]
    fn test_two_triangles_share_a_wing() {
        // Quad split along 0-2.
        let vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, -1.0),
        ];
        let mesh = Mesh::new(vertices, &[[0, 1, 2], [0, 2, 3]]);
        // Edge 2 -> 0 of the first triangle is reversed 0 -> 2 of the second.
        assert_eq!(mesh.triangles[0].wings, [None, None, Some(3)]);
        assert_eq!(mesh.triangles[1].wings, [Some(1), None, None]);
    }

    #[test]
    fn test_closed_box_has_no_open_edges() {
        let mesh = box_mesh(Vec3::splat(0.5));
        assert_eq!(mesh.triangle_count(), 12);
        for t in &mesh.triangles {
            assert!(t.wings.iter().all(|w| w.is_some()));
        }
    }

    #[test]
    fn test_transform_scales_before_translating() {
        let mut mesh = box_mesh(Vec3::splat(0.5));
        mesh.transform(&Transform::from_translation(Vec3::Y * 2.0), Vec3::new(2.0, 1.0, 1.0));
        let aabb = mesh.compute_aabb();
        assert!((aabb.lower - Vec3::new(-1.0, 1.5, -0.5)).length() < 1e-6);
        assert!((aabb.upper - Vec3::new(1.0, 2.5, 0.5)).length() < 1e-6);
        let root = mesh.tree().aabb().unwrap();
        assert!(root.contains(&aabb));
    }
}
