//! Fixtures attach particles to geometry.
//!
//! Sphere fixtures probe the world for contacts. Triangle and tetrahedron
//! fixtures carry density and define particle mass. World fixtures hold
//! the external collision shapes a body collides against.

use crate::arena::Handle;
use crate::geometry::{Aabb, ProxyId};
use crate::particle::Particle;
use crate::shapes::Shape;
use glam::{Mat3, Vec3};

// =============================================================================
// SPHERE
// =============================================================================

#[derive(Clone, Copy, Debug)]
pub struct SphereFixtureDef {
    pub particle: Handle<Particle>,
    pub radius: f32,
    pub friction: f32,
    pub user_index: Option<u32>,
}

impl SphereFixtureDef {
    pub fn new(particle: Handle<Particle>, radius: f32) -> Self {
        Self {
            particle,
            radius,
            friction: 0.0,
            user_index: None,
        }
    }
}

/// Collision sphere centred on a particle.
#[derive(Clone, Debug)]
pub struct SphereFixture {
    pub(crate) particle: Handle<Particle>,
    pub(crate) radius: f32,
    pub(crate) friction: f32,
    pub(crate) user_index: Option<u32>,
}

impl SphereFixture {
    pub(crate) fn new(def: &SphereFixtureDef) -> Self {
        assert!(def.radius >= 0.0, "radius must be non-negative");
        assert!(def.friction >= 0.0, "friction must be non-negative");
        Self {
            particle: def.particle,
            radius: def.radius,
            friction: def.friction,
            user_index: def.user_index,
        }
    }

    pub fn particle(&self) -> Handle<Particle> {
        self.particle
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn friction(&self) -> f32 {
        self.friction
    }

    pub fn set_friction(&mut self, friction: f32) {
        assert!(friction >= 0.0, "friction must be non-negative");
        self.friction = friction;
    }

    pub fn user_index(&self) -> Option<u32> {
        self.user_index
    }

    pub fn set_user_index(&mut self, user_index: Option<u32>) {
        self.user_index = user_index;
    }

    pub(crate) fn compute_aabb(&self, center: Vec3) -> Aabb {
        Aabb::from_center(center, self.radius)
    }
}

// =============================================================================
// TRIANGLE
// =============================================================================

#[derive(Clone, Copy, Debug)]
pub struct TriangleFixtureDef {
    pub p1: Handle<Particle>,
    pub p2: Handle<Particle>,
    pub p3: Handle<Particle>,
    /// Rest positions.
    pub v1: Vec3,
    pub v2: Vec3,
    pub v3: Vec3,
    /// Mass per unit area (kg/m^2).
    pub density: f32,
    pub radius: f32,
    pub friction: f32,
    pub user_index: Option<u32>,
}

impl TriangleFixtureDef {
    /// Triangle over `particles` at rest in `rest`, with unit density.
    pub fn new(particles: [Handle<Particle>; 3], rest: [Vec3; 3]) -> Self {
        Self {
            p1: particles[0],
            p2: particles[1],
            p3: particles[2],
            v1: rest[0],
            v2: rest[1],
            v3: rest[2],
            density: 1.0,
            radius: 0.0,
            friction: 0.0,
            user_index: None,
        }
    }
}

/// Mass-carrying triangle, also registered in the body's dynamic tree for
/// ray casts.
#[derive(Clone, Debug)]
pub struct TriangleFixture {
    pub(crate) particles: [Handle<Particle>; 3],
    pub(crate) area: f32,
    pub(crate) density: f32,
    pub(crate) radius: f32,
    pub(crate) friction: f32,
    pub(crate) proxy: ProxyId,
    pub(crate) user_index: Option<u32>,
}

/// Area of triangle `v1, v2, v3`.
pub fn triangle_area(v1: Vec3, v2: Vec3, v3: Vec3) -> f32 {
    0.5 * (v2 - v1).cross(v3 - v1).length()
}

impl TriangleFixture {
    /// The proxy is assigned by the body once the fixture has a handle.
    pub(crate) fn new(def: &TriangleFixtureDef) -> Self {
        assert!(def.density >= 0.0, "density must be non-negative");
        assert!(def.radius >= 0.0, "radius must be non-negative");
        assert!(def.friction >= 0.0, "friction must be non-negative");
        let area = triangle_area(def.v1, def.v2, def.v3);
        if area <= 0.0 {
            log::warn!("triangle fixture has zero rest area and contributes no mass");
        }
        Self {
            particles: [def.p1, def.p2, def.p3],
            area,
            density: def.density,
            radius: def.radius,
            friction: def.friction,
            proxy: 0,
            user_index: def.user_index,
        }
    }

    pub fn particles(&self) -> [Handle<Particle>; 3] {
        self.particles
    }

    /// Rest area.
    pub fn area(&self) -> f32 {
        self.area
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn friction(&self) -> f32 {
        self.friction
    }

    pub fn set_friction(&mut self, friction: f32) {
        assert!(friction >= 0.0, "friction must be non-negative");
        self.friction = friction;
    }

    pub fn user_index(&self) -> Option<u32> {
        self.user_index
    }

    pub fn set_user_index(&mut self, user_index: Option<u32>) {
        self.user_index = user_index;
    }

    /// True if the fixture spans exactly these three particles, in any order.
    pub(crate) fn spans(&self, particles: [Handle<Particle>; 3]) -> bool {
        particles.iter().all(|p| self.particles.contains(p))
    }

    pub(crate) fn compute_aabb(&self, x: [Vec3; 3]) -> Aabb {
        Aabb::from_points(&x).extended(self.radius)
    }
}

// =============================================================================
// TETRAHEDRON
// =============================================================================

#[derive(Clone, Copy, Debug)]
pub struct TetrahedronFixtureDef {
    pub p1: Handle<Particle>,
    pub p2: Handle<Particle>,
    pub p3: Handle<Particle>,
    pub p4: Handle<Particle>,
    pub v1: Vec3,
    pub v2: Vec3,
    pub v3: Vec3,
    pub v4: Vec3,
    /// Mass per unit volume (kg/m^3).
    pub density: f32,
    pub user_index: Option<u32>,
}

impl TetrahedronFixtureDef {
    pub fn new(particles: [Handle<Particle>; 4], rest: [Vec3; 4]) -> Self {
        Self {
            p1: particles[0],
            p2: particles[1],
            p3: particles[2],
            p4: particles[3],
            v1: rest[0],
            v2: rest[1],
            v3: rest[2],
            v4: rest[3],
            density: 1.0,
            user_index: None,
        }
    }
}

/// Mass-carrying tetrahedron.
#[derive(Clone, Debug)]
pub struct TetrahedronFixture {
    pub(crate) particles: [Handle<Particle>; 4],
    pub(crate) volume: f32,
    pub(crate) density: f32,
    pub(crate) user_index: Option<u32>,
}

/// Unsigned volume of tetrahedron `v1..v4`.
pub fn tetrahedron_volume(v1: Vec3, v2: Vec3, v3: Vec3, v4: Vec3) -> f32 {
    Mat3::from_cols(v2 - v1, v3 - v1, v4 - v1).determinant().abs() / 6.0
}

impl TetrahedronFixture {
    pub(crate) fn new(def: &TetrahedronFixtureDef) -> Self {
        assert!(def.density >= 0.0, "density must be non-negative");
        let volume = tetrahedron_volume(def.v1, def.v2, def.v3, def.v4);
        if volume <= 0.0 {
            log::warn!("tetrahedron fixture has zero rest volume and contributes no mass");
        }
        Self {
            particles: [def.p1, def.p2, def.p3, def.p4],
            volume,
            density: def.density,
            user_index: def.user_index,
        }
    }

    pub fn particles(&self) -> [Handle<Particle>; 4] {
        self.particles
    }

    /// Rest volume.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn user_index(&self) -> Option<u32> {
        self.user_index
    }

    pub(crate) fn spans(&self, particles: [Handle<Particle>; 4]) -> bool {
        particles.iter().all(|p| self.particles.contains(p))
    }
}

// =============================================================================
// WORLD
// =============================================================================

#[derive(Clone, Debug)]
pub struct WorldFixtureDef {
    pub shape: Shape,
    pub friction: f32,
    pub user_index: Option<u32>,
}

impl WorldFixtureDef {
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self {
            shape: shape.into(),
            friction: 0.0,
            user_index: None,
        }
    }
}

/// External collision shape owned by the body.
#[derive(Clone, Debug)]
pub struct WorldFixture {
    shape: Shape,
    aabb: Aabb,
    friction: f32,
    user_index: Option<u32>,
}

impl WorldFixture {
    pub(crate) fn new(def: &WorldFixtureDef) -> Self {
        assert!(def.friction >= 0.0, "friction must be non-negative");
        Self {
            aabb: def.shape.compute_aabb(),
            shape: def.shape.clone(),
            friction: def.friction,
            user_index: def.user_index,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Replace the shape, e.g. to animate it. Contacts are re-checked on the
    /// next step.
    pub fn set_shape(&mut self, shape: impl Into<Shape>) {
        self.shape = shape.into();
        self.aabb = self.shape.compute_aabb();
    }

    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    pub fn friction(&self) -> f32 {
        self.friction
    }

    pub fn set_friction(&mut self, friction: f32) {
        assert!(friction >= 0.0, "friction must be non-negative");
        self.friction = friction;
    }

    pub fn user_index(&self) -> Option<u32> {
        self.user_index
    }

    pub fn set_user_index(&mut self, user_index: Option<u32>) {
        self.user_index = user_index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::SphereShape;

    #[test]
    fn test_triangle_area() {
        let a = triangle_area(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 3.0));
        assert!((a - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_tetrahedron_volume_ignores_orientation() {
        let v = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z];
        assert!((tetrahedron_volume(v[0], v[1], v[2], v[3]) - 1.0 / 6.0).abs() < 1e-6);
        assert!((tetrahedron_volume(v[0], v[2], v[1], v[3]) - 1.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_world_fixture_tracks_shape_aabb() {
        let mut fixture = WorldFixture::new(&WorldFixtureDef::new(SphereShape::new(Vec3::ZERO, 1.0)));
        assert_eq!(fixture.aabb().upper, Vec3::ONE);
        fixture.set_shape(SphereShape::new(Vec3::X, 1.0));
        assert_eq!(fixture.aabb().upper, Vec3::new(2.0, 1.0, 1.0));
    }
}
