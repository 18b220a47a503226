use super::{add_jacobian, ForceSolverData};
use crate::arena::Handle;
use crate::constants::EPSILON;
use crate::math::outer;
use crate::particle::Particle;
use glam::{Mat3, Vec3};

#[derive(Clone, Copy, Debug)]
pub struct SpringForceDef {
    pub p1: Handle<Particle>,
    pub p2: Handle<Particle>,
    pub rest_length: f32,
    /// Tension stiffness (N/m). Zero disables the elastic term.
    pub stiffness: f32,
    /// Damping along the spring (N·s/m). Zero disables the damping term.
    pub damping_stiffness: f32,
    pub user_index: Option<u32>,
}

impl SpringForceDef {
    /// Spring at rest between positions `x1` and `x2`.
    pub fn new(p1: Handle<Particle>, x1: Vec3, p2: Handle<Particle>, x2: Vec3) -> Self {
        Self {
            p1,
            p2,
            rest_length: x1.distance(x2),
            stiffness: 0.0,
            damping_stiffness: 0.0,
            user_index: None,
        }
    }
}

/// Tension-only spring with damping along the current direction.
#[derive(Clone, Debug)]
pub struct SpringForce {
    pub(crate) particles: [Handle<Particle>; 2],
    pub(crate) rest_length: f32,
    pub(crate) stiffness: f32,
    pub(crate) damping_stiffness: f32,
    pub(crate) action_forces: [Vec3; 2],
    pub(crate) user_index: Option<u32>,
}

impl SpringForce {
    pub(crate) fn new(def: &SpringForceDef) -> Self {
        assert!(def.rest_length >= 0.0, "rest length must be non-negative");
        assert!(def.stiffness >= 0.0, "stiffness must be non-negative");
        assert!(def.damping_stiffness >= 0.0, "damping stiffness must be non-negative");
        Self {
            particles: [def.p1, def.p2],
            rest_length: def.rest_length,
            stiffness: def.stiffness,
            damping_stiffness: def.damping_stiffness,
            action_forces: [Vec3::ZERO; 2],
            user_index: def.user_index,
        }
    }

    pub fn rest_length(&self) -> f32 {
        self.rest_length
    }

    pub fn stiffness(&self) -> f32 {
        self.stiffness
    }

    pub fn damping_stiffness(&self) -> f32 {
        self.damping_stiffness
    }

    pub(crate) fn apply_forces(&mut self, ids: &[usize], data: &mut ForceSolverData) {
        let (i1, i2) = (ids[0], ids[1]);
        let dx = data.x[i1] - data.x[i2];
        let len = dx.length();

        let mut f1 = Vec3::ZERO;
        if len > EPSILON {
            let n = dx / len;
            let nn = outer(n, n);

            if self.stiffness > 0.0 && len > self.rest_length {
                let c = len - self.rest_length;
                f1 -= self.stiffness * c * n;

                let k11 = -self.stiffness
                    * (nn + (1.0 - self.rest_length / len) * (Mat3::IDENTITY - nn));
                add_jacobian(data.dfdx, ids, &[[k11, -k11], [-k11, k11]]);
            }

            if self.damping_stiffness > 0.0 {
                let dv = data.v[i1] - data.v[i2];
                f1 -= self.damping_stiffness * n.dot(dv) * n;

                let kv11 = -self.damping_stiffness * nn;
                add_jacobian(data.dfdv, ids, &[[kv11, -kv11], [-kv11, kv11]]);
            }
        }

        data.f[i1] += f1;
        data.f[i2] -= f1;
        self.action_forces = [f1, -f1];
    }
}
