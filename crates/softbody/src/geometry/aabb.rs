//! Axis-aligned bounding box.

use crate::math::Transform;
use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    #[serde(with = "crate::serde_utils::vec3")]
    pub lower: Vec3,
    #[serde(with = "crate::serde_utils::vec3")]
    pub upper: Vec3,
}

impl Aabb {
    pub fn new(lower: Vec3, upper: Vec3) -> Self {
        Self { lower, upper }
    }

    /// Cube of half-size `radius` around `center`.
    pub fn from_center(center: Vec3, radius: f32) -> Self {
        let r = Vec3::splat(radius);
        Self {
            lower: center - r,
            upper: center + r,
        }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            lower: center - half_extents,
            upper: center + half_extents,
        }
    }

    /// Tight box around the given points. Panics on an empty slice.
    pub fn from_points(points: &[Vec3]) -> Self {
        assert!(!points.is_empty(), "no points to bound");
        let mut aabb = Self::new(points[0], points[0]);
        for p in &points[1..] {
            aabb.lower = aabb.lower.min(*p);
            aabb.upper = aabb.upper.max(*p);
        }
        aabb
    }

    pub fn center(&self) -> Vec3 {
        0.5 * (self.lower + self.upper)
    }

    pub fn dimensions(&self) -> Vec3 {
        self.upper - self.lower
    }

    pub fn volume(&self) -> f32 {
        let d = self.dimensions();
        d.x * d.y * d.z
    }

    pub fn surface_area(&self) -> f32 {
        let d = self.dimensions();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    pub fn longest_axis(&self) -> usize {
        let d = self.dimensions();
        if d.x >= d.y && d.x >= d.z {
            0
        } else if d.y >= d.z {
            1
        } else {
            2
        }
    }

    /// Grow every face outward by `r`.
    pub fn extend(&mut self, r: f32) {
        let r = Vec3::splat(r);
        self.lower -= r;
        self.upper += r;
    }

    pub fn extended(mut self, r: f32) -> Self {
        self.extend(r);
        self
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            lower: self.lower.min(other.lower),
            upper: self.upper.max(other.upper),
        }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.lower.x <= other.upper.x
            && self.lower.y <= other.upper.y
            && self.lower.z <= other.upper.z
            && other.lower.x <= self.upper.x
            && other.lower.y <= self.upper.y
            && other.lower.z <= self.upper.z
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.lower).all() && p.cmple(self.upper).all()
    }

    pub fn contains(&self, other: &Aabb) -> bool {
        other.lower.cmpge(self.lower).all() && other.upper.cmple(self.upper).all()
    }

    /// Position of `p` in box units: lower bound maps to 0, upper bound to 1.
    pub fn relative_position(&self, p: Vec3) -> Vec3 {
        (p - self.lower) / self.dimensions()
    }

    /// Bounding box of this box after a rigid transform.
    pub fn transformed(&self, xf: &Transform) -> Aabb {
        let mut corners = [Vec3::ZERO; 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            let local = Vec3::new(
                if i & 1 == 0 { self.lower.x } else { self.upper.x },
                if i & 2 == 0 { self.lower.y } else { self.upper.y },
                if i & 4 == 0 { self.lower.z } else { self.upper.z },
            );
            *corner = xf.transform_point(local);
        }
        Aabb::from_points(&corners)
    }

    /// Slab test of the segment `p1 + t (p2 - p1)`, `t` in `[0, max_fraction]`.
    pub fn overlaps_segment(&self, p1: Vec3, p2: Vec3, max_fraction: f32) -> bool {
        let d = p2 - p1;
        let mut t_min = 0.0_f32;
        let mut t_max = max_fraction;
        for axis in 0..3 {
            let origin = p1[axis];
            let dir = d[axis];
            let lo = self.lower[axis];
            let hi = self.upper[axis];
            if dir.abs() < f32::EPSILON {
                if origin < lo || origin > hi {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / dir;
            let mut t1 = (lo - origin) * inv;
            let mut t2 = (hi - origin) * inv;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_min > t_max {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_overlap_is_inclusive() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::ONE, Vec3::splat(2.0));
        let c = Aabb::new(Vec3::splat(1.01), Vec3::splat(2.0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_transformed_box_bounds_rotated_corners() {
        let a = Aabb::new(Vec3::splat(-1.0), Vec3::ONE);
        let xf = Transform::new(Vec3::new(5.0, 0.0, 0.0), Quat::from_rotation_y(std::f32::consts::FRAC_PI_4));
        let b = a.transformed(&xf);
        let s = 2.0_f32.sqrt();
        assert!((b.lower - Vec3::new(5.0 - s, -1.0, -s)).length() < 1e-5);
        assert!((b.upper - Vec3::new(5.0 + s, 1.0, s)).length() < 1e-5);
    }

    #[test]
    fn test_segment_overlap() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(a.overlaps_segment(Vec3::new(-1.0, 0.5, 0.5), Vec3::new(2.0, 0.5, 0.5), 1.0));
        assert!(!a.overlaps_segment(Vec3::new(-1.0, 0.5, 0.5), Vec3::new(2.0, 0.5, 0.5), 0.2));
        assert!(!a.overlaps_segment(Vec3::new(-1.0, 2.0, 0.5), Vec3::new(2.0, 2.0, 0.5), 1.0));
    }
}
