//! Penalty contacts between sphere fixtures and world fixtures.

use crate::arena::Handle;
use crate::fixtures::{SphereFixture, WorldFixture};
use crate::forces::ForceSolverData;
use crate::geometry::{Sphere, SphereManifold};
use crate::math::{outer, perp};
use crate::particle::{Particle, ParticleType};
use crate::settings::BodySettings;
use crate::shapes::Shape;
use glam::{Mat3, Vec2, Vec3};

/// Contact between the sphere fixture of a dynamic particle and a world
/// fixture. Lives while their boxes overlap.
#[derive(Clone, Debug)]
pub struct SphereShapeContact {
    pub(crate) sphere_fixture: Handle<SphereFixture>,
    pub(crate) world_fixture: Handle<WorldFixture>,
    pub(crate) particle: Handle<Particle>,
    /// Normal force magnitude accumulated during the current step.
    pub(crate) normal_force: f32,
    /// First manifold found during the current step, used by friction.
    pub(crate) manifold: SphereManifold,
    /// Set once the narrow phase succeeded during the current step.
    pub(crate) apply_friction: bool,
    pub(crate) friction_impulse: Vec3,
    pub(crate) age: u32,
}

impl SphereShapeContact {
    pub(crate) fn new(
        sphere_fixture: Handle<SphereFixture>,
        world_fixture: Handle<WorldFixture>,
        particle: Handle<Particle>,
    ) -> Self {
        Self {
            sphere_fixture,
            world_fixture,
            particle,
            normal_force: 0.0,
            manifold: SphereManifold::default(),
            apply_friction: false,
            friction_impulse: Vec3::ZERO,
            age: 0,
        }
    }

    pub fn sphere_fixture(&self) -> Handle<SphereFixture> {
        self.sphere_fixture
    }

    pub fn world_fixture(&self) -> Handle<WorldFixture> {
        self.world_fixture
    }

    pub fn particle(&self) -> Handle<Particle> {
        self.particle
    }

    pub fn normal_force(&self) -> f32 {
        self.normal_force
    }

    /// Manifold captured for friction during the last step, if the sphere
    /// touched the shape.
    pub fn manifold(&self) -> Option<SphereManifold> {
        self.apply_friction.then_some(self.manifold)
    }

    /// Tangential impulse applied by the last friction pass.
    pub fn friction_impulse(&self) -> Vec3 {
        self.friction_impulse
    }

    /// Steps this contact has persisted.
    pub fn age(&self) -> u32 {
        self.age
    }

    /// Start a new step for a persisting contact.
    pub(crate) fn update(&mut self) {
        self.normal_force = 0.0;
        self.apply_friction = false;
        self.friction_impulse = Vec3::ZERO;
        self.age += 1;
    }

    /// Normal penalty spring at the trial position of particle `id`.
    pub(crate) fn apply_forces(
        &mut self,
        id: usize,
        radius: f32,
        shape: &Shape,
        settings: &BodySettings,
        data: &mut ForceSolverData,
    ) {
        let x1 = data.x[id];
        let Some(manifold) = shape.collide(&Sphere::new(x1, radius)) else {
            return;
        };
        if !self.apply_friction {
            self.manifold = manifold;
            self.apply_friction = true;
        }

        let n2 = manifold.normal;
        let n1 = -n2;
        let c1 = x1 + radius * n1;
        let c2 = manifold.point + shape.radius() * n2;

        let k = settings.contact_stiffness;
        if k > 0.0 {
            let c = (settings.baumgarte * (c2 - c1).length())
                .min(settings.max_contact_linear_correction);
            let f1 = -k * c * n1;
            let nn = outer(n1, n1);
            let k11 = -k * (nn + c * (Mat3::IDENTITY - nn));

            data.f[id] += f1;
            data.dfdx[(id, id)] += k11;
            self.normal_force += f1.length();
        }

        let kd = settings.contact_damping_stiffness;
        if kd > 0.0 {
            let v1 = data.v[id];
            data.f[id] -= kd * v1.dot(n1) * n1;
            data.dfdv[(id, id)] -= kd * outer(n1, n1);
        }
    }

    /// Coulomb friction on the particle velocity, clamped to
    /// `friction * dt * normal_force`.
    pub(crate) fn apply_friction(&mut self, dt: f32, friction: f32, particle: &mut Particle) {
        if !self.apply_friction || particle.particle_type != ParticleType::Dynamic {
            return;
        }

        let n = self.manifold.normal;
        let t1 = perp(n);
        let t2 = t1.cross(n);

        let inv_mass = particle.inv_mass;
        let tangent_mass = if inv_mass > 0.0 { 1.0 / inv_mass } else { 0.0 };

        let v = particle.velocity;
        let mut impulse = -tangent_mass * Vec2::new(v.dot(t1), v.dot(t2));
        let max_impulse = friction * dt * self.normal_force;
        if impulse.length_squared() > max_impulse * max_impulse {
            impulse = impulse.normalize_or_zero() * max_impulse;
        }

        let p = impulse.x * t1 + impulse.y * t2;
        particle.velocity += inv_mass * p;
        self.friction_impulse = p;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::forces::test_support::Scratch;
    use crate::particle::ParticleDef;
    use crate::shapes::SphereShape;

    fn contact() -> SphereShapeContact {
        let mut particles = Arena::new();
        let p = particles.insert(Particle::new(&ParticleDef::dynamic(Vec3::ZERO)));
        let mut spheres: Arena<SphereFixture> = Arena::new();
        let s = spheres.insert(SphereFixture::new(&crate::fixtures::SphereFixtureDef::new(p, 0.1)));
        let mut worlds: Arena<WorldFixture> = Arena::new();
        let w = worlds.insert(WorldFixture::new(&crate::fixtures::WorldFixtureDef::new(
            SphereShape::new(Vec3::ZERO, 1.0),
        )));
        SphereShapeContact::new(s, w, p)
    }

    #[test]
    fn test_penetration_pushes_out_along_normal() {
        let mut c = contact();
        let shape = Shape::from(SphereShape::new(Vec3::ZERO, 1.0));
        let settings = BodySettings::default();
        let mut s = Scratch::new(vec![Vec3::new(0.0, 1.05, 0.0)], vec![Vec3::ZERO]);
        c.apply_forces(0, 0.1, &shape, &settings, &mut s.data());

        // Penetration 0.05, corrected by the Baumgarte fraction.
        let expected = settings.contact_stiffness * settings.baumgarte * 0.05;
        assert!((s.f[0] - Vec3::new(0.0, expected, 0.0)).length() < 1e-3);
        assert!((c.normal_force() - expected).abs() < 1e-3);
        assert_eq!(c.manifold().map(|m| m.normal), Some(Vec3::Y));
        // Stiffness block is negative along the normal.
        assert!(s.dfdx[(0, 0)].y_axis.y < 0.0);
    }

    #[test]
    fn test_correction_is_capped() {
        let mut c = contact();
        let shape = Shape::from(SphereShape::new(Vec3::ZERO, 1.0));
        let settings = BodySettings {
            baumgarte: 1.0,
            max_contact_linear_correction: 0.01,
            ..BodySettings::default()
        };
        let mut s = Scratch::new(vec![Vec3::new(0.0, 0.5, 0.0)], vec![Vec3::ZERO]);
        c.apply_forces(0, 0.1, &shape, &settings, &mut s.data());
        assert!((s.f[0].y - settings.contact_stiffness * 0.01).abs() < 1e-3);
    }

    #[test]
    fn test_separated_sphere_contributes_nothing() {
        let mut c = contact();
        let shape = Shape::from(SphereShape::new(Vec3::ZERO, 1.0));
        let mut s = Scratch::new(vec![Vec3::new(0.0, 2.0, 0.0)], vec![Vec3::ZERO]);
        c.apply_forces(0, 0.1, &shape, &BodySettings::default(), &mut s.data());
        assert_eq!(s.f[0], Vec3::ZERO);
        assert!(c.manifold().is_none());
    }

    #[test]
    fn test_friction_clamped_by_normal_force() {
        let mut c = contact();
        c.apply_friction = true;
        c.manifold = SphereManifold {
            point: Vec3::ZERO,
            normal: Vec3::Y,
        };
        c.normal_force = 10.0;
        let mut p = Particle::new(&ParticleDef::dynamic(Vec3::ZERO));
        p.velocity = Vec3::new(5.0, 0.0, 0.0);

        let dt = 0.1;
        c.apply_friction(dt, 0.5, &mut p);
        assert!((c.friction_impulse().length() - 0.5).abs() < 1e-5);
        assert!((p.velocity().x - 4.5).abs() < 1e-5);

        // A small tangential velocity is stopped entirely.
        p.velocity = Vec3::new(0.1, -1.0, 0.0);
        c.apply_friction(dt, 0.5, &mut p);
        assert!(p.velocity().x.abs() < 1e-5);
        assert!((p.velocity().y + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_frictionless_leaves_velocity_unchanged() {
        let mut c = contact();
        c.apply_friction = true;
        c.manifold.normal = Vec3::Y;
        c.normal_force = 100.0;
        let mut p = Particle::new(&ParticleDef::dynamic(Vec3::ZERO));
        p.velocity = Vec3::new(3.0, -1.0, 2.0);
        c.apply_friction(1.0 / 60.0, 0.0, &mut p);
        assert_eq!(p.velocity(), Vec3::new(3.0, -1.0, 2.0));
    }

    #[test]
    fn test_update_resets_step_state() {
        let mut c = contact();
        c.apply_friction = true;
        c.normal_force = 3.0;
        c.update();
        assert_eq!(c.normal_force(), 0.0);
        assert!(c.manifold().is_none());
        assert_eq!(c.age(), 1);
    }
}
