use super::TriangleShape;
use crate::geometry::{Aabb, Mesh, Sphere, SphereManifold};
use crate::math::Transform;
use glam::Vec3;
use std::sync::Arc;

/// Triangle mesh placed in the world by a per-axis `scale` followed by
/// `transform`. The mesh data is shared, never copied.
#[derive(Clone, Debug)]
pub struct MeshShape {
    pub mesh: Arc<Mesh>,
    pub transform: Transform,
    pub scale: Vec3,
    pub radius: f32,
}

impl MeshShape {
    pub fn new(mesh: Arc<Mesh>, transform: Transform) -> Self {
        Self {
            mesh,
            transform,
            scale: Vec3::ONE,
            radius: 0.0,
        }
    }

    #[inline]
    fn to_world(&self, v: Vec3) -> Vec3 {
        self.transform.transform_point(self.scale * v)
    }

    pub fn compute_aabb(&self) -> Aabb {
        self.mesh
            .compute_transformed_aabb(&self.transform, self.scale)
            .extended(self.radius)
    }

    /// Triangle `index` in world space, wings included.
    pub fn child_triangle(&self, index: usize) -> TriangleShape {
        let t = &self.mesh.triangles[index];
        let [v1, v2, v3] = t.v.map(|i| self.to_world(self.mesh.vertices[i as usize]));
        TriangleShape {
            vertex1: v1,
            vertex2: v2,
            vertex3: v3,
            radius: self.radius,
            wings: t
                .wings
                .map(|w| w.map(|i| self.to_world(self.mesh.vertices[i as usize]))),
        }
    }

    /// Closest contact over the triangles near the sphere.
    pub fn collide(&self, sphere: &Sphere) -> Option<SphereManifold> {
        assert!(self.scale.cmpne(Vec3::ZERO).all(), "mesh scale must be non-zero");
        let inv_scale = self.scale.recip();

        // Sphere box in the unscaled mesh frame.
        let center = inv_scale * self.transform.inverse_transform_point(sphere.center);
        let radius = sphere.radius + self.radius;
        let query = Aabb::from_center_half_extents(center, radius * inv_scale.abs());

        let mut best: Option<(f32, SphereManifold)> = None;
        self.mesh.tree().query(&query, |index| {
            if let Some(manifold) = self.child_triangle(index).collide(sphere) {
                let dd = sphere.center.distance_squared(manifold.point);
                if best.map_or(true, |(dd0, _)| dd < dd0) {
                    best = Some((dd, manifold));
                }
            }
            true
        });
        best.map(|(_, manifold)| manifold)
    }
}
