//! Fixture lifecycle and mass distribution.

use super::Body;
use crate::arena::Handle;
use crate::fixtures::{
    SphereFixture, SphereFixtureDef, TetrahedronFixture, TetrahedronFixtureDef, TriangleFixture,
    TriangleFixtureDef, WorldFixture, WorldFixtureDef,
};
use crate::geometry::Aabb;
use crate::particle::ParticleType;
use glam::Vec3;

impl Body {
    // ===== Sphere fixtures =====

    /// One sphere fixture per particle: creating a second returns the first.
    pub fn create_sphere_fixture(&mut self, def: &SphereFixtureDef) -> Handle<SphereFixture> {
        assert!(self.particles.contains(def.particle), "stale particle handle");
        if let Some((handle, _)) = self
            .sphere_fixtures
            .iter()
            .find(|(_, f)| f.particle == def.particle)
        {
            return handle;
        }
        self.insert_sphere_fixture(def)
    }

    /// Insert without the one-per-particle lookup.
    pub(crate) fn insert_sphere_fixture(&mut self, def: &SphereFixtureDef) -> Handle<SphereFixture> {
        self.sphere_fixtures.insert(SphereFixture::new(def))
    }

    pub fn destroy_sphere_fixture(&mut self, fixture: Handle<SphereFixture>) {
        assert!(self.sphere_fixtures.contains(fixture), "stale sphere fixture handle");
        let contacts: Vec<_> = self
            .contacts
            .iter()
            .filter(|(_, c)| c.sphere_fixture == fixture)
            .map(|(h, _)| h)
            .collect();
        for contact in contacts {
            self.destroy_contact(contact);
        }
        self.sphere_fixtures.remove(fixture);
    }

    pub fn sphere_fixture(&self, fixture: Handle<SphereFixture>) -> Option<&SphereFixture> {
        self.sphere_fixtures.get(fixture)
    }

    pub fn sphere_fixture_mut(&mut self, fixture: Handle<SphereFixture>) -> Option<&mut SphereFixture> {
        self.sphere_fixtures.get_mut(fixture)
    }

    pub fn sphere_fixtures(&self) -> impl Iterator<Item = (Handle<SphereFixture>, &SphereFixture)> + '_ {
        self.sphere_fixtures.iter()
    }

    // ===== Triangle fixtures =====

    /// One triangle fixture per particle triple, in any order.
    pub fn create_triangle_fixture(&mut self, def: &TriangleFixtureDef) -> Handle<TriangleFixture> {
        let particles = [def.p1, def.p2, def.p3];
        for p in particles {
            assert!(self.particles.contains(p), "stale particle handle");
        }
        if let Some((handle, _)) = self
            .triangle_fixtures
            .iter()
            .find(|(_, f)| f.spans(particles))
        {
            return handle;
        }

        let handle = self.insert_triangle_fixture(def);
        self.reset_mass();
        handle
    }

    /// Insert and register the proxy, without the duplicate lookup or the
    /// mass update. Callers run [`Body::reset_mass`] afterwards.
    pub(crate) fn insert_triangle_fixture(&mut self, def: &TriangleFixtureDef) -> Handle<TriangleFixture> {
        let handle = self.triangle_fixtures.insert(TriangleFixture::new(def));
        let aabb = self.triangle_aabb(handle);
        let proxy = self.tree.insert(aabb, handle);
        self.triangle_fixtures[handle].proxy = proxy;
        handle
    }

    pub fn destroy_triangle_fixture(&mut self, fixture: Handle<TriangleFixture>) {
        assert!(self.triangle_fixtures.contains(fixture), "stale triangle fixture handle");
        self.remove_triangle_fixture(fixture);
        self.reset_mass();
    }

    pub fn triangle_fixture(&self, fixture: Handle<TriangleFixture>) -> Option<&TriangleFixture> {
        self.triangle_fixtures.get(fixture)
    }

    pub fn triangle_fixture_mut(
        &mut self,
        fixture: Handle<TriangleFixture>,
    ) -> Option<&mut TriangleFixture> {
        self.triangle_fixtures.get_mut(fixture)
    }

    pub fn triangle_fixtures(
        &self,
    ) -> impl Iterator<Item = (Handle<TriangleFixture>, &TriangleFixture)> + '_ {
        self.triangle_fixtures.iter()
    }

    /// Remove without redistributing mass. The vertices are left massless
    /// so the next [`Body::reset_mass`] recomputes them from scratch.
    pub(crate) fn remove_triangle_fixture(&mut self, fixture: Handle<TriangleFixture>) {
        if let Some(f) = self.triangle_fixtures.remove(fixture) {
            self.tree.remove(f.proxy);
            for p in f.particles {
                if let Some(particle) = self.particles.get_mut(p) {
                    particle.mass = 0.0;
                }
            }
        }
    }

    fn triangle_aabb(&self, fixture: Handle<TriangleFixture>) -> Aabb {
        let f = &self.triangle_fixtures[fixture];
        f.compute_aabb(f.particles.map(|p| self.particles[p].position))
    }

    /// Refit one triangle proxy after its particles moved by about
    /// `displacement`.
    pub(crate) fn synchronize_triangle(&mut self, fixture: Handle<TriangleFixture>, displacement: Vec3) {
        let aabb = self.triangle_aabb(fixture);
        let proxy = self.triangle_fixtures[fixture].proxy;
        self.tree.move_proxy(proxy, aabb, displacement);
    }

    /// Refit every triangle proxy, predicting motion over the next `dt` from
    /// the mean vertex velocity.
    pub(crate) fn synchronize_triangles(&mut self, dt: f32) {
        for handle in self.triangle_fixtures.handles() {
            let particles = self.triangle_fixtures[handle].particles;
            let mean_velocity =
                particles.iter().map(|&p| self.particles[p].velocity).sum::<Vec3>() / 3.0;
            self.synchronize_triangle(handle, dt * mean_velocity);
        }
    }

    // ===== Tetrahedron fixtures =====

    /// One tetrahedron fixture per particle set, in any order.
    pub fn create_tetrahedron_fixture(
        &mut self,
        def: &TetrahedronFixtureDef,
    ) -> Handle<TetrahedronFixture> {
        let particles = [def.p1, def.p2, def.p3, def.p4];
        for p in particles {
            assert!(self.particles.contains(p), "stale particle handle");
        }
        if let Some((handle, _)) = self
            .tetrahedron_fixtures
            .iter()
            .find(|(_, f)| f.spans(particles))
        {
            return handle;
        }

        let handle = self.tetrahedron_fixtures.insert(TetrahedronFixture::new(def));
        self.reset_mass();
        handle
    }

    pub fn destroy_tetrahedron_fixture(&mut self, fixture: Handle<TetrahedronFixture>) {
        assert!(self.tetrahedron_fixtures.contains(fixture), "stale tetrahedron fixture handle");
        self.remove_tetrahedron_fixture(fixture);
        self.reset_mass();
    }

    pub(crate) fn remove_tetrahedron_fixture(&mut self, fixture: Handle<TetrahedronFixture>) {
        if let Some(f) = self.tetrahedron_fixtures.remove(fixture) {
            for p in f.particles {
                if let Some(particle) = self.particles.get_mut(p) {
                    particle.mass = 0.0;
                }
            }
        }
    }

    pub fn tetrahedron_fixture(
        &self,
        fixture: Handle<TetrahedronFixture>,
    ) -> Option<&TetrahedronFixture> {
        self.tetrahedron_fixtures.get(fixture)
    }

    pub fn tetrahedron_fixtures(
        &self,
    ) -> impl Iterator<Item = (Handle<TetrahedronFixture>, &TetrahedronFixture)> + '_ {
        self.tetrahedron_fixtures.iter()
    }

    // ===== World fixtures =====

    pub fn create_world_fixture(&mut self, def: &WorldFixtureDef) -> Handle<WorldFixture> {
        self.world_fixtures.insert(WorldFixture::new(def))
    }

    pub fn destroy_world_fixture(&mut self, fixture: Handle<WorldFixture>) {
        assert!(self.world_fixtures.contains(fixture), "stale world fixture handle");
        let contacts: Vec<_> = self
            .contacts
            .iter()
            .filter(|(_, c)| c.world_fixture == fixture)
            .map(|(h, _)| h)
            .collect();
        for contact in contacts {
            self.destroy_contact(contact);
        }
        self.world_fixtures.remove(fixture);
    }

    pub fn world_fixture(&self, fixture: Handle<WorldFixture>) -> Option<&WorldFixture> {
        self.world_fixtures.get(fixture)
    }

    /// Mutable access, e.g. to move an animated shape.
    pub fn world_fixture_mut(&mut self, fixture: Handle<WorldFixture>) -> Option<&mut WorldFixture> {
        self.world_fixtures.get_mut(fixture)
    }

    pub fn world_fixtures(&self) -> impl Iterator<Item = (Handle<WorldFixture>, &WorldFixture)> + '_ {
        self.world_fixtures.iter()
    }

    // ===== Mass =====

    /// Redistribute mass from the triangle and tetrahedron fixtures.
    ///
    /// Particles covered by a mass fixture start from zero and collect
    /// `density * area / 3` per triangle and `density * volume / 4` per
    /// tetrahedron. Dynamic particles left without mass, including those
    /// whose last mass fixture was destroyed, get unit mass. Static and
    /// kinematic particles always end massless.
    pub fn reset_mass(&mut self) {
        for (_, f) in self.triangle_fixtures.iter() {
            for p in f.particles {
                self.particles[p].mass = 0.0;
            }
        }
        for (_, f) in self.tetrahedron_fixtures.iter() {
            for p in f.particles {
                self.particles[p].mass = 0.0;
            }
        }

        for (_, f) in self.triangle_fixtures.iter() {
            let share = f.density * f.area / 3.0;
            for p in f.particles {
                self.particles[p].mass += share;
            }
        }
        for (_, f) in self.tetrahedron_fixtures.iter() {
            let share = f.density * f.volume / 4.0;
            for p in f.particles {
                self.particles[p].mass += share;
            }
        }

        for (_, p) in self.particles.iter_mut() {
            match p.particle_type {
                ParticleType::Static | ParticleType::Kinematic => {
                    p.mass = 0.0;
                    p.inv_mass = 0.0;
                }
                ParticleType::Dynamic => {
                    if p.mass > 0.0 {
                        p.inv_mass = 1.0 / p.mass;
                    } else {
                        p.mass = 1.0;
                        p.inv_mass = 1.0;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::ParticleDef;
    use crate::shapes::SphereShape;

    fn triangle_body() -> (Body, [Handle<crate::particle::Particle>; 3], [Vec3; 3]) {
        let mut body = Body::new();
        let x = [Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 3.0)];
        let p = x.map(|x| body.create_particle(&ParticleDef::dynamic(x)));
        (body, p, x)
    }

    #[test]
    fn test_triangle_mass_split_in_thirds() {
        let (mut body, p, x) = triangle_body();
        let mut def = TriangleFixtureDef::new(p, x);
        def.density = 2.0;
        body.create_triangle_fixture(&def);
        for h in p {
            let particle = body.particle(h).unwrap();
            assert!((particle.mass() - 2.0).abs() < 1e-5);
            assert!((particle.inv_mass() - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn test_duplicate_triangle_returns_existing() {
        let (mut body, p, x) = triangle_body();
        let a = body.create_triangle_fixture(&TriangleFixtureDef::new(p, x));
        let b = body.create_triangle_fixture(&TriangleFixtureDef::new([p[2], p[0], p[1]], [x[2], x[0], x[1]]));
        assert_eq!(a, b);
        assert_eq!(body.triangle_fixtures().count(), 1);
    }

    #[test]
    fn test_destroy_restores_default_mass() {
        let (mut body, p, x) = triangle_body();
        let mut def = TriangleFixtureDef::new(p, x);
        def.density = 5.0;
        let t = body.create_triangle_fixture(&def);
        assert!((body.particle(p[0]).unwrap().mass() - 5.0).abs() < 1e-5);

        body.destroy_triangle_fixture(t);
        for h in p {
            assert_eq!(body.particle(h).unwrap().mass(), 1.0);
            assert_eq!(body.particle(h).unwrap().inv_mass(), 1.0);
        }
        assert!(body.tree.is_empty());
    }

    #[test]
    fn test_static_particle_in_tetrahedron_stays_massless() {
        let mut body = Body::new();
        let x = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z];
        let p0 = body.create_particle(&ParticleDef::default());
        let rest = x.map(|x| body.create_particle(&ParticleDef::dynamic(x)));
        let p = [p0, rest[1], rest[2], rest[3]];
        let mut def = TetrahedronFixtureDef::new(p, x);
        def.density = 24.0;
        body.create_tetrahedron_fixture(&def);

        assert_eq!(body.particle(p0).unwrap().mass(), 0.0);
        assert_eq!(body.particle(p0).unwrap().inv_mass(), 0.0);
        assert!((body.particle(p[1]).unwrap().mass() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_one_sphere_fixture_per_particle() {
        let mut body = Body::new();
        let p = body.create_particle(&ParticleDef::dynamic(Vec3::ZERO));
        let a = body.create_sphere_fixture(&SphereFixtureDef::new(p, 0.1));
        let b = body.create_sphere_fixture(&SphereFixtureDef::new(p, 0.5));
        assert_eq!(a, b);
        assert_eq!(body.sphere_fixture(a).unwrap().radius(), 0.1);
    }

    #[test]
    fn test_destroy_world_fixture_drops_contacts() {
        let mut body = Body::new();
        let p = body.create_particle(&ParticleDef::dynamic(Vec3::ZERO));
        body.create_sphere_fixture(&SphereFixtureDef::new(p, 0.1));
        let w = body.create_world_fixture(&WorldFixtureDef::new(SphereShape::new(Vec3::ZERO, 1.0)));
        body.step(0.0, 1, 1);
        assert_eq!(body.contact_count(), 1);

        body.destroy_world_fixture(w);
        assert_eq!(body.contact_count(), 0);
        assert!(body.contact_pairs.is_empty());
    }
}
