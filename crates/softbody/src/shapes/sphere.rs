use crate::constants::EPSILON;
use crate::geometry::{Aabb, Sphere, SphereManifold};
use glam::Vec3;

/// Solid sphere. The whole sphere is skin: its core is the centre point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereShape {
    pub center: Vec3,
    pub radius: f32,
}

impl SphereShape {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn compute_aabb(&self) -> Aabb {
        Aabb::from_center(self.center, self.radius)
    }

    pub fn collide(&self, sphere: &Sphere) -> Option<SphereManifold> {
        let radius = self.radius + sphere.radius;
        let d = sphere.center - self.center;
        let dd = d.length_squared();
        if dd > radius * radius {
            return None;
        }

        let len = dd.sqrt();
        let normal = if len > EPSILON { d / len } else { Vec3::Y };
        Some(SphereManifold {
            point: self.center,
            normal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_reports_centre_and_direction() {
        let s = SphereShape::new(Vec3::ZERO, 1.0);
        let m = s.collide(&Sphere::new(Vec3::new(0.0, 0.0, 1.05), 0.1)).unwrap();
        assert_eq!(m.point, Vec3::ZERO);
        assert!((m.normal - Vec3::Z).length() < 1e-6);
        assert!(s.collide(&Sphere::new(Vec3::new(0.0, 0.0, 1.2), 0.1)).is_none());
    }

    #[test]
    fn test_concentric_falls_back_to_up() {
        let s = SphereShape::new(Vec3::ONE, 1.0);
        let m = s.collide(&Sphere::new(Vec3::ONE, 0.1)).unwrap();
        assert_eq!(m.normal, Vec3::Y);
    }
}
