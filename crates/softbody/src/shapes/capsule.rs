use crate::constants::EPSILON;
use crate::geometry::{closest_point_on_segment, Aabb, Sphere, SphereManifold};
use crate::math::perp;
use glam::Vec3;

/// Segment `vertex1 -> vertex2` swept by `radius`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapsuleShape {
    pub vertex1: Vec3,
    pub vertex2: Vec3,
    pub radius: f32,
}

impl CapsuleShape {
    pub fn new(vertex1: Vec3, vertex2: Vec3, radius: f32) -> Self {
        Self {
            vertex1,
            vertex2,
            radius,
        }
    }

    pub fn compute_aabb(&self) -> Aabb {
        Aabb::new(
            self.vertex1.min(self.vertex2),
            self.vertex1.max(self.vertex2),
        )
        .extended(self.radius)
    }

    pub fn collide(&self, sphere: &Sphere) -> Option<SphereManifold> {
        let radius = self.radius + sphere.radius;
        let point = closest_point_on_segment(self.vertex1, self.vertex2, sphere.center);
        let d = sphere.center - point;
        let dd = d.length_squared();
        if dd > radius * radius {
            return None;
        }

        let len = dd.sqrt();
        let normal = if len > EPSILON {
            d / len
        } else {
            // Centre on the axis: any direction orthogonal to it.
            let axis = self.vertex2 - self.vertex1;
            if axis.length_squared() > EPSILON * EPSILON {
                perp(axis.normalize())
            } else {
                Vec3::Y
            }
        };
        Some(SphereManifold { point, normal })
    }
}
