use crate::constants::EPSILON;
use crate::geometry::{Aabb, Sphere, SphereManifold};
use crate::math::Transform;
use glam::{Mat3, Vec3};

/// Oriented box: half `extents` in the frame given by `transform`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxShape {
    pub extents: Vec3,
    pub transform: Transform,
    pub radius: f32,
}

impl BoxShape {
    pub fn new(extents: Vec3, transform: Transform) -> Self {
        Self {
            extents,
            transform,
            radius: 0.0,
        }
    }

    pub fn compute_aabb(&self) -> Aabb {
        // Extent on each world axis is the sum of absolute projections.
        let r = Mat3::from_quat(self.transform.rotation);
        let abs = Mat3::from_cols(r.x_axis.abs(), r.y_axis.abs(), r.z_axis.abs());
        let half = abs * self.extents;
        Aabb::from_center_half_extents(self.transform.translation, half).extended(self.radius)
    }

    pub fn collide(&self, sphere: &Sphere) -> Option<SphereManifold> {
        let radius = self.radius + sphere.radius;
        let e = self.extents;
        let q = self.transform.inverse_transform_point(sphere.center);
        let clamped = q.clamp(-e, e);

        let d = q - clamped;
        let dd = d.length_squared();
        let (point, normal) = if dd > EPSILON * EPSILON {
            // Outside: the clamped point is the closest.
            if dd > radius * radius {
                return None;
            }
            (clamped, d / dd.sqrt())
        } else {
            // Inside or on the surface: leave through the nearest face.
            let depth = e - q.abs();
            let axis = if depth.x <= depth.y && depth.x <= depth.z {
                0
            } else if depth.y <= depth.z {
                1
            } else {
                2
            };
            let sign = if q[axis] < 0.0 { -1.0 } else { 1.0 };
            let mut point = q;
            point[axis] = sign * e[axis];
            let mut normal = Vec3::ZERO;
            normal[axis] = sign;
            (point, normal)
        };

        Some(SphereManifold {
            point: self.transform.transform_point(point),
            normal: self.transform.transform_vector(normal),
        })
    }
}
