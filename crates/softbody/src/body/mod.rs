//! A simulated soft body: particles, the forces between them, the fixtures
//! that give them mass and collision geometry, and the contacts against the
//! world.
//!
//! Each [`Body::step`] runs:
//! 1. contact update (drop contacts whose boxes separated)
//! 2. implicit force solve and friction (skipped when `dt == 0`)
//! 3. triangle proxy synchronisation
//! 4. new contact search

use crate::arena::{Arena, Handle};
use crate::constants::GRAVITY;
use crate::contact::SphereShapeContact;
use crate::fixtures::{SphereFixture, TetrahedronFixture, TriangleFixture, WorldFixture};
use crate::forces::{Force, ForceDef};
use crate::geometry::{DynamicTree, RayCastInput};
use crate::particle::{Particle, ParticleDef, ParticleType};
use crate::settings::BodySettings;
use crate::shapes::TriangleShape;
use glam::Vec3;
use std::collections::HashMap;

mod cloth;
mod contacts;
mod fixtures;
mod solver;

pub use cloth::{Cloth, ClothDef};

use solver::ForceSolver;

/// Diagnostics from one [`Body::step`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Non-linear passes run.
    pub iterations: usize,
    /// Fewest CG iterations taken by a pass.
    pub min_sub_iterations: usize,
    /// Most CG iterations taken by a pass.
    pub max_sub_iterations: usize,
    /// Live contacts after the step.
    pub contact_count: usize,
}

/// Closest triangle fixture hit by a segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyRayCastHit {
    pub fixture: Handle<TriangleFixture>,
    pub point: Vec3,
    pub normal: Vec3,
    pub fraction: f32,
}

pub struct Body {
    pub(crate) particles: Arena<Particle>,
    pub(crate) forces: Arena<Force>,
    pub(crate) sphere_fixtures: Arena<SphereFixture>,
    pub(crate) triangle_fixtures: Arena<TriangleFixture>,
    pub(crate) tetrahedron_fixtures: Arena<TetrahedronFixture>,
    pub(crate) world_fixtures: Arena<WorldFixture>,
    pub(crate) contacts: Arena<SphereShapeContact>,
    /// Contact lookup by fixture pair.
    pub(crate) contact_pairs:
        HashMap<(Handle<SphereFixture>, Handle<WorldFixture>), Handle<SphereShapeContact>>,
    /// Triangle fixture proxies.
    pub(crate) tree: DynamicTree<Handle<TriangleFixture>>,
    gravity: Vec3,
    settings: BodySettings,
}

impl Default for Body {
    fn default() -> Self {
        Self::new()
    }
}

impl Body {
    pub fn new() -> Self {
        Self::with_settings(BodySettings::default())
    }

    /// Panics if `settings` fails [`BodySettings::validate`].
    pub fn with_settings(settings: BodySettings) -> Self {
        if let Err(message) = settings.validate() {
            panic!("invalid body settings: {message}");
        }
        Self {
            particles: Arena::new(),
            forces: Arena::new(),
            sphere_fixtures: Arena::new(),
            triangle_fixtures: Arena::new(),
            tetrahedron_fixtures: Arena::new(),
            world_fixtures: Arena::new(),
            contacts: Arena::new(),
            contact_pairs: HashMap::new(),
            tree: DynamicTree::new(),
            gravity: Vec3::new(0.0, GRAVITY, 0.0),
            settings,
        }
    }

    pub fn settings(&self) -> &BodySettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: BodySettings) {
        if let Err(message) = settings.validate() {
            panic!("invalid body settings: {message}");
        }
        self.settings = settings;
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    // ===== Particles =====

    pub fn create_particle(&mut self, def: &ParticleDef) -> Handle<Particle> {
        self.particles.insert(Particle::new(def))
    }

    /// Destroy a particle together with every force, fixture and contact
    /// that references it.
    pub fn destroy_particle(&mut self, particle: Handle<Particle>) {
        assert!(self.particles.contains(particle), "stale particle handle");

        let forces: Vec<_> = self
            .forces
            .iter()
            .filter(|(_, f)| f.contains(particle))
            .map(|(h, _)| h)
            .collect();
        for handle in forces {
            self.forces.remove(handle);
        }

        let spheres: Vec<_> = self
            .sphere_fixtures
            .iter()
            .filter(|(_, f)| f.particle == particle)
            .map(|(h, _)| h)
            .collect();
        for handle in spheres {
            self.destroy_sphere_fixture(handle);
        }

        let triangles: Vec<_> = self
            .triangle_fixtures
            .iter()
            .filter(|(_, f)| f.particles.contains(&particle))
            .map(|(h, _)| h)
            .collect();
        let tetrahedra: Vec<_> = self
            .tetrahedron_fixtures
            .iter()
            .filter(|(_, f)| f.particles.contains(&particle))
            .map(|(h, _)| h)
            .collect();
        let mass_changed = !triangles.is_empty() || !tetrahedra.is_empty();
        for handle in triangles {
            self.remove_triangle_fixture(handle);
        }
        for handle in tetrahedra {
            self.remove_tetrahedron_fixture(handle);
        }

        self.particles.remove(particle);
        if mass_changed {
            self.reset_mass();
        }
    }

    pub fn particle(&self, particle: Handle<Particle>) -> Option<&Particle> {
        self.particles.get(particle)
    }

    /// Mutable access for velocity, force, impulse and translation updates.
    pub fn particle_mut(&mut self, particle: Handle<Particle>) -> Option<&mut Particle> {
        self.particles.get_mut(particle)
    }

    pub fn particles(&self) -> impl Iterator<Item = (Handle<Particle>, &Particle)> + '_ {
        self.particles.iter()
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Teleport a particle. Discards its pending translation.
    pub fn set_particle_position(&mut self, particle: Handle<Particle>, position: Vec3) {
        let p = &mut self.particles[particle];
        p.position = position;
        p.translation = Vec3::ZERO;

        let touched: Vec<_> = self
            .triangle_fixtures
            .iter()
            .filter(|(_, f)| f.particles.contains(&particle))
            .map(|(h, _)| h)
            .collect();
        for handle in touched {
            self.synchronize_triangle(handle, Vec3::ZERO);
        }
    }

    /// Change the particle type. Contacts of a particle that is no longer
    /// dynamic go away on the next step.
    pub fn set_particle_type(&mut self, particle: Handle<Particle>, particle_type: ParticleType) {
        let p = &mut self.particles[particle];
        if p.particle_type == particle_type {
            return;
        }
        p.particle_type = particle_type;
        p.force = Vec3::ZERO;
        if particle_type == ParticleType::Static {
            p.velocity = Vec3::ZERO;
            p.translation = Vec3::ZERO;
        }
        self.reset_mass();
    }

    // ===== Forces =====

    pub fn create_force(&mut self, def: impl Into<ForceDef>) -> Handle<Force> {
        let def = def.into();
        for p in def.particles() {
            assert!(self.particles.contains(p), "force references a stale particle");
        }
        self.forces.insert(Force::new(&def))
    }

    pub fn destroy_force(&mut self, force: Handle<Force>) {
        assert!(self.forces.remove(force).is_some(), "stale force handle");
    }

    pub fn force(&self, force: Handle<Force>) -> Option<&Force> {
        self.forces.get(force)
    }

    pub fn forces(&self) -> impl Iterator<Item = (Handle<Force>, &Force)> + '_ {
        self.forces.iter()
    }

    // ===== Contacts =====

    pub fn contacts(
        &self,
    ) -> impl Iterator<Item = (Handle<SphereShapeContact>, &SphereShapeContact)> + '_ {
        self.contacts.iter()
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    // ===== Stepping =====

    /// Advance the body by `dt`.
    ///
    /// `force_iterations` bounds the non-linear passes of the implicit solve
    /// and must be at least 1; `force_sub_iterations` bounds the CG
    /// iterations of each pass. `dt == 0` updates contacts without
    /// integrating.
    pub fn step(&mut self, dt: f32, force_iterations: usize, force_sub_iterations: usize) -> StepReport {
        assert!(dt >= 0.0, "time step must be non-negative");
        assert!(force_iterations > 0, "at least one force iteration is required");

        self.update_contacts();

        for (_, force) in self.forces.iter_mut() {
            force.clear_forces();
        }

        let mut report = StepReport::default();
        if dt > 0.0 {
            let mut solver = ForceSolver {
                particles: &mut self.particles,
                forces: &mut self.forces,
                contacts: &mut self.contacts,
                sphere_fixtures: &self.sphere_fixtures,
                world_fixtures: &self.world_fixtures,
                settings: &self.settings,
                gravity: self.gravity,
            };
            report = solver.solve(dt, force_iterations, force_sub_iterations);
        }

        for (_, particle) in self.particles.iter_mut() {
            particle.force = Vec3::ZERO;
            particle.translation = Vec3::ZERO;
        }

        self.synchronize_triangles(dt);
        self.find_new_contacts();

        report.contact_count = self.contacts.len();
        log::trace!(
            "step dt={} iterations={} cg=[{}, {}] contacts={}",
            dt,
            report.iterations,
            report.min_sub_iterations,
            report.max_sub_iterations,
            report.contact_count
        );
        report
    }

    // ===== Queries =====

    /// Kinetic energy `1/2 sum m |v|^2`.
    pub fn energy(&self) -> f32 {
        0.5 * self
            .particles
            .values()
            .map(|p| p.mass * p.velocity.length_squared())
            .sum::<f32>()
    }

    /// Closest triangle fixture crossed by segment `p1 -> p2`.
    pub fn ray_cast_single(&self, p1: Vec3, p2: Vec3) -> Option<BodyRayCastHit> {
        let input = RayCastInput::new(p1, p2);
        let mut best: Option<BodyRayCastHit> = None;
        self.tree.ray_cast(&input, |sub_input, handle| {
            let shape = self.triangle_shape(handle);
            match shape.ray_cast(sub_input) {
                Some(output) => {
                    if best.map_or(true, |b| output.fraction < b.fraction) {
                        best = Some(BodyRayCastHit {
                            fixture: handle,
                            point: p1 + output.fraction * (p2 - p1),
                            normal: output.normal,
                            fraction: output.fraction,
                        });
                    }
                    output.fraction
                }
                None => sub_input.max_fraction,
            }
        });
        best
    }

    /// Triangle fixture at current particle positions.
    pub(crate) fn triangle_shape(&self, fixture: Handle<TriangleFixture>) -> TriangleShape {
        let f = &self.triangle_fixtures[fixture];
        let [x1, x2, x3] = f.particles.map(|p| self.particles[p].position);
        let mut shape = TriangleShape::new(x1, x2, x3);
        shape.radius = f.radius;
        shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forces::SpringForceDef;

    #[test]
    fn test_free_fall_one_step() {
        let mut body = Body::new();
        body.set_gravity(Vec3::new(0.0, -10.0, 0.0));
        let p = body.create_particle(&ParticleDef::dynamic(Vec3::new(0.0, 5.0, 0.0)));
        let report = body.step(1.0 / 60.0, 1, 20);

        let particle = body.particle(p).unwrap();
        assert!((particle.velocity().y + 10.0 / 60.0).abs() < 1e-4);
        assert!((particle.position().y - (5.0 - 10.0 / 3600.0)).abs() < 1e-4);
        assert_eq!(report.iterations, 1);
        assert_eq!(report.contact_count, 0);
    }

    #[test]
    fn test_zero_dt_does_not_integrate() {
        let mut body = Body::new();
        let p = body.create_particle(&ParticleDef {
            velocity: Vec3::X,
            ..ParticleDef::dynamic(Vec3::ZERO)
        });
        body.step(0.0, 1, 10);
        assert_eq!(body.particle(p).unwrap().position(), Vec3::ZERO);
        assert_eq!(body.particle(p).unwrap().velocity(), Vec3::X);
    }

    #[test]
    fn test_static_particle_moves_only_by_translation() {
        let mut body = Body::new();
        let p = body.create_particle(&ParticleDef::default());
        body.particle_mut(p).unwrap().apply_translation(Vec3::new(0.5, 0.0, 0.0));
        body.step(1.0 / 60.0, 2, 20);
        let particle = body.particle(p).unwrap();
        assert!((particle.position() - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-6);
        assert_eq!(particle.velocity(), Vec3::ZERO);
        assert_eq!(particle.translation(), Vec3::ZERO);
    }

    #[test]
    fn test_kinematic_particle_keeps_velocity() {
        let mut body = Body::new();
        let p = body.create_particle(&ParticleDef {
            particle_type: ParticleType::Kinematic,
            velocity: Vec3::new(0.0, 0.0, 2.0),
            ..ParticleDef::default()
        });
        body.step(0.5, 1, 20);
        let particle = body.particle(p).unwrap();
        assert_eq!(particle.velocity(), Vec3::new(0.0, 0.0, 2.0));
        assert!((particle.position().z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_destroy_particle_removes_its_forces() {
        let mut body = Body::new();
        let a = body.create_particle(&ParticleDef::default());
        let b = body.create_particle(&ParticleDef::dynamic(Vec3::X));
        let c = body.create_particle(&ParticleDef::dynamic(Vec3::Y));
        body.create_force(SpringForceDef::new(a, Vec3::ZERO, b, Vec3::X));
        let kept = body.create_force(SpringForceDef::new(b, Vec3::X, c, Vec3::Y));

        body.destroy_particle(a);
        assert_eq!(body.forces().count(), 1);
        assert!(body.force(kept).is_some());
        assert!(body.particle(a).is_none());
    }

    #[test]
    fn test_spring_hangs_and_pulls_back() {
        let mut body = Body::new();
        body.set_gravity(Vec3::ZERO);
        let anchor = body.create_particle(&ParticleDef::default());
        let bob = body.create_particle(&ParticleDef::dynamic(Vec3::new(0.0, -1.0, 0.0)));
        let mut def = SpringForceDef::new(anchor, Vec3::ZERO, bob, Vec3::new(0.0, -1.0, 0.0));
        def.stiffness = 100.0;
        body.create_force(def);

        body.set_particle_position(bob, Vec3::new(0.0, -1.2, 0.0));
        body.step(1.0 / 60.0, 2, 50);
        let v = body.particle(bob).unwrap().velocity();
        assert!(v.y > 0.0, "stretched spring pulls the bob up, got {v:?}");
        assert!(v.x.abs() < 1e-6 && v.z.abs() < 1e-6);
        let action = body.forces().next().unwrap().1.action_forces()[1];
        assert!(action.y > 0.0);
    }

    #[test]
    fn test_energy_of_moving_particle() {
        let mut body = Body::new();
        body.create_particle(&ParticleDef {
            velocity: Vec3::new(3.0, 4.0, 0.0),
            ..ParticleDef::dynamic(Vec3::ZERO)
        });
        body.create_particle(&ParticleDef {
            particle_type: ParticleType::Kinematic,
            velocity: Vec3::X,
            ..ParticleDef::default()
        });
        assert!((body.energy() - 12.5).abs() < 1e-5);
    }

    #[test]
    #[should_panic(expected = "cg tolerance")]
    fn test_with_settings_rejects_bad_tolerance() {
        Body::with_settings(BodySettings {
            cg_tolerance: 1.5,
            ..BodySettings::default()
        });
    }

    #[test]
    #[should_panic(expected = "cg tolerance")]
    fn test_set_settings_rejects_bad_tolerance() {
        let mut body = Body::new();
        body.set_settings(BodySettings {
            cg_tolerance: 0.0,
            ..BodySettings::default()
        });
    }
}
