use crate::geometry::{Aabb, Sdf, Sphere, SphereManifold};
use crate::math::Transform;
use std::sync::Arc;

/// Signed distance field placed by a rigid transform.
///
/// With `invert` set the inside of the source mesh is free space and the
/// outside is solid, e.g. for a container.
#[derive(Clone, Debug)]
pub struct SdfShape {
    pub sdf: Arc<Sdf>,
    pub transform: Transform,
    pub radius: f32,
    pub invert: bool,
}

impl SdfShape {
    pub fn new(sdf: Arc<Sdf>, transform: Transform) -> Self {
        Self {
            sdf,
            transform,
            radius: 0.0,
            invert: false,
        }
    }

    pub fn compute_aabb(&self) -> Aabb {
        self.sdf
            .aabb()
            .transformed(&self.transform)
            .extended(self.radius)
    }

    pub fn collide(&self, sphere: &Sphere) -> Option<SphereManifold> {
        let point = self.transform.inverse_transform_point(sphere.center);
        let radius = sphere.radius + self.radius;

        if !self.sdf.contains(point) {
            return None;
        }

        let sign = if self.invert { -1.0 } else { 1.0 };
        let distance = sign * self.sdf.distance(point);
        if distance > radius {
            return None;
        }

        let normal = self.transform.transform_vector(sign * self.sdf.normal(point));
        Some(SphereManifold {
            point: sphere.center - distance * normal,
            normal,
        })
    }
}
