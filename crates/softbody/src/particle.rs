//! Point masses simulated by a [`Body`](crate::Body).

use crate::forces::ForceSolverData;
use glam::{Mat3, Vec3};

/// How a particle takes part in the solve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ParticleType {
    /// Zero mass. Moves only by explicit translation.
    #[default]
    Static,
    /// Zero mass. Moves with its own velocity; forces do not affect it.
    Kinematic,
    /// Positive mass. Integrated under forces.
    Dynamic,
}

/// Particle creation parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleDef {
    pub particle_type: ParticleType,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Mass-proportional velocity damping coefficient (1/s).
    pub damping: f32,
    pub user_index: Option<u32>,
}

impl Default for ParticleDef {
    fn default() -> Self {
        Self {
            particle_type: ParticleType::Static,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            damping: 0.0,
            user_index: None,
        }
    }
}

impl ParticleDef {
    /// Dynamic particle at rest at `position`.
    pub fn dynamic(position: Vec3) -> Self {
        Self {
            particle_type: ParticleType::Dynamic,
            position,
            ..Self::default()
        }
    }
}

/// A single particle. Created and destroyed through the owning body.
#[derive(Clone, Debug)]
pub struct Particle {
    pub(crate) particle_type: ParticleType,
    pub(crate) position: Vec3,
    pub(crate) velocity: Vec3,
    /// External force applied since the last step.
    pub(crate) force: Vec3,
    /// Prescribed displacement consumed by the next step.
    pub(crate) translation: Vec3,
    pub(crate) mass: f32,
    pub(crate) inv_mass: f32,
    pub(crate) damping: f32,
    /// Row in the solver vectors; only meaningful during a step.
    pub(crate) solver_id: usize,
    pub(crate) user_index: Option<u32>,
}

impl Particle {
    pub(crate) fn new(def: &ParticleDef) -> Self {
        assert!(def.damping >= 0.0, "damping must be non-negative");
        let (mass, inv_mass) = match def.particle_type {
            ParticleType::Dynamic => (1.0, 1.0),
            ParticleType::Static | ParticleType::Kinematic => (0.0, 0.0),
        };
        Self {
            particle_type: def.particle_type,
            position: def.position,
            velocity: if def.particle_type == ParticleType::Static {
                Vec3::ZERO
            } else {
                def.velocity
            },
            force: Vec3::ZERO,
            translation: Vec3::ZERO,
            mass,
            inv_mass,
            damping: def.damping,
            solver_id: 0,
            user_index: def.user_index,
        }
    }

    pub fn particle_type(&self) -> ParticleType {
        self.particle_type
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Ignored for static particles.
    pub fn set_velocity(&mut self, velocity: Vec3) {
        if self.particle_type == ParticleType::Static {
            return;
        }
        self.velocity = velocity;
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    pub fn force(&self) -> Vec3 {
        self.force
    }

    /// Accumulate an external force for the next step. Dynamic only.
    pub fn apply_force(&mut self, force: Vec3) {
        if self.particle_type != ParticleType::Dynamic {
            return;
        }
        self.force += force;
    }

    /// Change velocity immediately by `impulse / mass`. Dynamic only.
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        if self.particle_type != ParticleType::Dynamic {
            return;
        }
        self.velocity += self.inv_mass * impulse;
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    /// Accumulate a displacement applied by the next step.
    pub fn apply_translation(&mut self, translation: Vec3) {
        self.translation += translation;
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    pub fn set_damping(&mut self, damping: f32) {
        assert!(damping >= 0.0, "damping must be non-negative");
        self.damping = damping;
    }

    pub fn user_index(&self) -> Option<u32> {
        self.user_index
    }

    pub fn set_user_index(&mut self, user_index: Option<u32>) {
        self.user_index = user_index;
    }

    /// Mass damping `f = -c m v`.
    pub(crate) fn apply_forces(&self, data: &mut ForceSolverData) {
        if self.particle_type != ParticleType::Dynamic || self.damping <= 0.0 {
            return;
        }
        let i = self.solver_id;
        let c = self.damping * self.mass;
        data.f[i] -= c * data.v[i];
        data.dfdv[(i, i)] -= Mat3::from_diagonal(Vec3::splat(c));
    }
}
