//! Contact lifecycle: broad phase against world fixtures, persistence and
//! destruction.

use super::Body;
use crate::arena::Handle;
use crate::contact::SphereShapeContact;
use crate::fixtures::{SphereFixture, WorldFixture};
use crate::particle::ParticleType;

impl Body {
    /// Create contacts for new overlapping sphere/world fixture boxes.
    pub(crate) fn find_new_contacts(&mut self) {
        let mut pairs = Vec::new();
        for (sphere_handle, sphere) in self.sphere_fixtures.iter() {
            let particle = &self.particles[sphere.particle];
            if particle.particle_type != ParticleType::Dynamic {
                continue;
            }
            let aabb = sphere.compute_aabb(particle.position);
            for (world_handle, world) in self.world_fixtures.iter() {
                if aabb.overlaps(&world.aabb()) {
                    pairs.push((sphere_handle, world_handle));
                }
            }
        }

        for (sphere_handle, world_handle) in pairs {
            self.add_pair(sphere_handle, world_handle);
        }
    }

    fn add_pair(&mut self, sphere_handle: Handle<SphereFixture>, world_handle: Handle<WorldFixture>) {
        let key = (sphere_handle, world_handle);
        if self.contact_pairs.contains_key(&key) {
            return;
        }
        let particle = self.sphere_fixtures[sphere_handle].particle;
        if self.particles[particle].particle_type != ParticleType::Dynamic {
            return;
        }

        let contact = self
            .contacts
            .insert(SphereShapeContact::new(sphere_handle, world_handle, particle));
        self.contact_pairs.insert(key, contact);
    }

    /// Keep contacts whose boxes still overlap and whose particle is still
    /// dynamic; destroy the rest.
    pub(crate) fn update_contacts(&mut self) {
        // Snapshot so destruction does not disturb the walk.
        for handle in self.contacts.handles() {
            let contact = &self.contacts[handle];
            let particle = &self.particles[contact.particle];
            let sphere = &self.sphere_fixtures[contact.sphere_fixture];
            let world = &self.world_fixtures[contact.world_fixture];

            let keep = particle.particle_type == ParticleType::Dynamic
                && sphere.compute_aabb(particle.position).overlaps(&world.aabb());
            if keep {
                self.contacts[handle].update();
            } else {
                self.destroy_contact(handle);
            }
        }
    }

    pub(crate) fn destroy_contact(&mut self, handle: Handle<SphereShapeContact>) {
        if let Some(contact) = self.contacts.remove(handle) {
            self.contact_pairs
                .remove(&(contact.sphere_fixture, contact.world_fixture));
        }
    }
}
