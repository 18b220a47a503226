use crate::constants::EPSILON;
use crate::geometry::{
    barycentric_triangle, closest_point_on_triangle, ray_cast_triangle, Aabb, RayCastInput,
    RayCastOutput, Sphere, SphereManifold, TriangleRegion,
};
use glam::Vec3;

/// Triangle `vertex1, vertex2, vertex3` with optional wing vertices.
///
/// `wings[i]` is the far vertex of the neighbour sharing edge `i`
/// (`1 -> 2`, `2 -> 3`, `3 -> 1`). A sphere whose centre projects into the
/// neighbour's face gets no edge contact from this triangle; the neighbour
/// reports a face contact instead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriangleShape {
    pub vertex1: Vec3,
    pub vertex2: Vec3,
    pub vertex3: Vec3,
    pub radius: f32,
    pub wings: [Option<Vec3>; 3],
}

impl TriangleShape {
    pub fn new(vertex1: Vec3, vertex2: Vec3, vertex3: Vec3) -> Self {
        Self {
            vertex1,
            vertex2,
            vertex3,
            radius: 0.0,
            wings: [None; 3],
        }
    }

    pub fn compute_aabb(&self) -> Aabb {
        Aabb::from_points(&[self.vertex1, self.vertex2, self.vertex3]).extended(self.radius)
    }

    /// Unit normal, or +Y for a sliver.
    pub fn normal(&self) -> Vec3 {
        let n = (self.vertex2 - self.vertex1).cross(self.vertex3 - self.vertex1);
        let len = n.length();
        if len > EPSILON {
            n / len
        } else {
            Vec3::Y
        }
    }

    /// Whether `q` projects strictly inside the wing triangle across edge
    /// `a -> b`. The wing triangle is wound `(wing, b, a)`.
    fn in_wing_face(&self, edge: usize, a: Vec3, b: Vec3, q: Vec3) -> bool {
        match self.wings[edge] {
            Some(wing) => {
                let w = barycentric_triangle(wing, b, a, q);
                w[0] > 0.0 && w[1] > 0.0 && w[2] > 0.0
            }
            None => false,
        }
    }

    pub fn collide(&self, sphere: &Sphere) -> Option<SphereManifold> {
        let q = sphere.center;
        let (a, b, c) = (self.vertex1, self.vertex2, self.vertex3);
        let radius = self.radius + sphere.radius;

        let (point, region) = closest_point_on_triangle(a, b, c, q);
        let d = q - point;
        let dd = d.length_squared();
        if dd > radius * radius {
            return None;
        }

        let rejected = match region {
            TriangleRegion::AB => self.in_wing_face(0, a, b, q),
            TriangleRegion::BC => self.in_wing_face(1, b, c, q),
            TriangleRegion::CA => self.in_wing_face(2, c, a, q),
            _ => false,
        };
        if rejected {
            return None;
        }

        let len = dd.sqrt();
        let normal = if len > EPSILON { d / len } else { self.normal() };
        Some(SphereManifold { point, normal })
    }

    pub fn ray_cast(&self, input: &RayCastInput) -> Option<RayCastOutput> {
        ray_cast_triangle(self.vertex1, self.vertex2, self.vertex3, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two triangles of the unit quad in the XZ plane, both facing +Y.
    fn left() -> TriangleShape {
        TriangleShape::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
        )
    }

    #[test]
    fn test_face_contact_uses_offset_direction() {
        let t = left();
        let m = t.collide(&Sphere::new(Vec3::new(0.7, 0.05, 0.2), 0.1)).unwrap();
        assert!((m.point - Vec3::new(0.7, 0.0, 0.2)).length() < 1e-6);
        assert!((m.normal - Vec3::Y).length() < 1e-5);
        assert!(t.collide(&Sphere::new(Vec3::new(0.7, 0.2, 0.2), 0.1)).is_none());
    }

    #[test]
    fn test_centre_on_plane_uses_face_normal() {
        let t = left();
        let m = t.collide(&Sphere::new(Vec3::new(0.7, 0.0, 0.2), 0.1)).unwrap();
        assert!((m.normal - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_wing_suppresses_shared_edge_contact() {
        let mut t = left();
        // Edge 1 -> 2 runs from (0,0,0) to (1,0,1); the neighbour's far
        // vertex is (0,0,1).
        let q = Vec3::new(0.3, 0.05, 0.4);
        assert!(t.collide(&Sphere::new(q, 0.1)).is_some());

        t.wings[0] = Some(Vec3::new(0.0, 0.0, 1.0));
        assert!(t.collide(&Sphere::new(q, 0.1)).is_none());

        // Past the neighbour's far edge the edge contact stands.
        let outside = Vec3::new(0.95, 0.03, 1.02);
        assert!(t.collide(&Sphere::new(outside, 0.1)).is_some());
    }

    #[test]
    fn test_ray_cast_normal_faces_origin() {
        let t = left();
        let down = RayCastInput::new(Vec3::new(0.7, 1.0, 0.2), Vec3::new(0.7, -1.0, 0.2));
        let hit = t.ray_cast(&down).unwrap();
        assert!((hit.fraction - 0.5).abs() < 1e-6);
        assert!((hit.normal - Vec3::Y).length() < 1e-5);
    }
}
