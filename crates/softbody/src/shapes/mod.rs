//! World collision shapes.
//!
//! Every shape answers the same narrow-phase question: given a probe sphere,
//! is there a contact, and if so where is the closest point on the shape core
//! and which way does the surface face. Shapes carry a skin `radius` that the
//! query adds to the probe radius.

mod box_shape;
mod capsule;
mod mesh_shape;
mod sdf_shape;
mod sphere;
mod triangle;

pub use box_shape::BoxShape;
pub use capsule::CapsuleShape;
pub use mesh_shape::MeshShape;
pub use sdf_shape::SdfShape;
pub use sphere::SphereShape;
pub use triangle::TriangleShape;

use crate::geometry::{Aabb, Sphere, SphereManifold};

/// Closed set of collision shapes a world fixture can hold.
#[derive(Clone, Debug)]
pub enum Shape {
    Sphere(SphereShape),
    Capsule(CapsuleShape),
    Box(BoxShape),
    Triangle(TriangleShape),
    Mesh(MeshShape),
    Sdf(SdfShape),
}

impl Shape {
    /// Skin radius.
    pub fn radius(&self) -> f32 {
        match self {
            Shape::Sphere(s) => s.radius,
            Shape::Capsule(s) => s.radius,
            Shape::Box(s) => s.radius,
            Shape::Triangle(s) => s.radius,
            Shape::Mesh(s) => s.radius,
            Shape::Sdf(s) => s.radius,
        }
    }

    /// World box including the skin radius.
    pub fn compute_aabb(&self) -> Aabb {
        match self {
            Shape::Sphere(s) => s.compute_aabb(),
            Shape::Capsule(s) => s.compute_aabb(),
            Shape::Box(s) => s.compute_aabb(),
            Shape::Triangle(s) => s.compute_aabb(),
            Shape::Mesh(s) => s.compute_aabb(),
            Shape::Sdf(s) => s.compute_aabb(),
        }
    }

    /// Sphere against shape. `None` when they are further apart than the
    /// sum of radii.
    pub fn collide(&self, sphere: &Sphere) -> Option<SphereManifold> {
        match self {
            Shape::Sphere(s) => s.collide(sphere),
            Shape::Capsule(s) => s.collide(sphere),
            Shape::Box(s) => s.collide(sphere),
            Shape::Triangle(s) => s.collide(sphere),
            Shape::Mesh(s) => s.collide(sphere),
            Shape::Sdf(s) => s.collide(sphere),
        }
    }
}

impl From<SphereShape> for Shape {
    fn from(s: SphereShape) -> Self {
        Shape::Sphere(s)
    }
}

impl From<CapsuleShape> for Shape {
    fn from(s: CapsuleShape) -> Self {
        Shape::Capsule(s)
    }
}

impl From<BoxShape> for Shape {
    fn from(s: BoxShape) -> Self {
        Shape::Box(s)
    }
}

impl From<TriangleShape> for Shape {
    fn from(s: TriangleShape) -> Self {
        Shape::Triangle(s)
    }
}

impl From<MeshShape> for Shape {
    fn from(s: MeshShape) -> Self {
        Shape::Mesh(s)
    }
}

impl From<SdfShape> for Shape {
    fn from(s: SdfShape) -> Self {
        Shape::Sdf(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_radius_and_aabb_dispatch() {
        let shape: Shape = SphereShape::new(Vec3::new(1.0, 0.0, 0.0), 0.5).into();
        assert_eq!(shape.radius(), 0.5);
        let aabb = shape.compute_aabb();
        assert_eq!(aabb.lower, Vec3::new(0.5, -0.5, -0.5));
        assert_eq!(aabb.upper, Vec3::new(1.5, 0.5, 0.5));
    }

    #[test]
    fn test_collide_dispatch_misses_far_sphere() {
        let shape: Shape = CapsuleShape::new(Vec3::ZERO, Vec3::X, 0.1).into();
        assert!(shape.collide(&Sphere::new(Vec3::new(0.5, 5.0, 0.0), 0.1)).is_none());
        assert!(shape.collide(&Sphere::new(Vec3::new(0.5, 0.15, 0.0), 0.1)).is_some());
    }
}
