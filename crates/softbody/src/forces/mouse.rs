use super::{add_jacobian, ForceSolverData};
use crate::arena::Handle;
use crate::constants::EPSILON;
use crate::math::outer;
use crate::particle::Particle;
use glam::{Mat3, Vec3};

/// Drag spring from particle `p1` to the barycentric point
/// `w2 x2 + w3 x3 + w4 x4` of the triangle `p2, p3, p4`.
#[derive(Clone, Copy, Debug)]
pub struct MouseForceDef {
    pub p1: Handle<Particle>,
    pub p2: Handle<Particle>,
    pub p3: Handle<Particle>,
    pub p4: Handle<Particle>,
    pub w2: f32,
    pub w3: f32,
    pub w4: f32,
    pub stiffness: f32,
    pub damping_stiffness: f32,
    pub rest_length: f32,
    pub user_index: Option<u32>,
}

impl MouseForceDef {
    pub fn new(
        p1: Handle<Particle>,
        triangle: [Handle<Particle>; 3],
        weights: [f32; 3],
    ) -> Self {
        Self {
            p1,
            p2: triangle[0],
            p3: triangle[1],
            p4: triangle[2],
            w2: weights[0],
            w3: weights[1],
            w4: weights[2],
            stiffness: 0.0,
            damping_stiffness: 0.0,
            rest_length: 0.0,
            user_index: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MouseForce {
    pub(crate) particles: [Handle<Particle>; 4],
    weights: [f32; 3],
    stiffness: f32,
    damping_stiffness: f32,
    rest_length: f32,
    pub(crate) action_forces: [Vec3; 4],
    pub(crate) user_index: Option<u32>,
}

impl MouseForce {
    pub(crate) fn new(def: &MouseForceDef) -> Self {
        assert!(def.stiffness >= 0.0, "stiffness must be non-negative");
        assert!(def.damping_stiffness >= 0.0, "damping stiffness must be non-negative");
        assert!(def.rest_length >= 0.0, "rest length must be non-negative");
        Self {
            particles: [def.p1, def.p2, def.p3, def.p4],
            weights: [def.w2, def.w3, def.w4],
            stiffness: def.stiffness,
            damping_stiffness: def.damping_stiffness,
            rest_length: def.rest_length,
            action_forces: [Vec3::ZERO; 4],
            user_index: def.user_index,
        }
    }

    /// Barycentric weights on the triangle.
    pub fn weights(&self) -> [f32; 3] {
        self.weights
    }

    pub fn stiffness(&self) -> f32 {
        self.stiffness
    }

    pub fn damping_stiffness(&self) -> f32 {
        self.damping_stiffness
    }

    pub fn rest_length(&self) -> f32 {
        self.rest_length
    }

    pub(crate) fn apply_forces(&mut self, ids: &[usize], data: &mut ForceSolverData) {
        let [w2, w3, w4] = self.weights;
        let a = [1.0, -w2, -w3, -w4];
        let x: [Vec3; 4] = [0, 1, 2, 3].map(|i| data.x[ids[i]]);

        let target = w2 * x[1] + w3 * x[2] + w4 * x[3];
        let dx = x[0] - target;
        let len = dx.length();

        let mut f = [Vec3::ZERO; 4];
        if len > EPSILON {
            let n = dx / len;
            let nn = outer(n, n);

            if self.stiffness > 0.0 && len > self.rest_length {
                let c = len - self.rest_length;
                let k0 = -self.stiffness
                    * (nn + (1.0 - self.rest_length / len) * (Mat3::IDENTITY - nn));

                let mut k = [[Mat3::ZERO; 4]; 4];
                for i in 0..4 {
                    f[i] -= self.stiffness * c * a[i] * n;
                    for j in 0..4 {
                        k[i][j] = a[i] * a[j] * k0;
                    }
                }
                add_jacobian(data.dfdx, ids, &k);
            }

            if self.damping_stiffness > 0.0 {
                let dcdt: f32 = (0..4).map(|j| a[j] * n.dot(data.v[ids[j]])).sum();

                let mut kv = [[Mat3::ZERO; 4]; 4];
                for i in 0..4 {
                    f[i] -= self.damping_stiffness * dcdt * a[i] * n;
                    for j in 0..4 {
                        kv[i][j] = -self.damping_stiffness * a[i] * a[j] * nn;
                    }
                }
                add_jacobian(data.dfdv, ids, &kv);
            }
        }

        for i in 0..4 {
            data.f[ids[i]] += f[i];
        }
        self.action_forces = f;
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{dfdx_error, eval};
    use super::super::{Force, ForceDef};
    use super::*;
    use crate::arena::Arena;

    fn mouse(stiffness: f32, damping: f32) -> Force {
        let mut particles = Arena::new();
        let p = [0; 4].map(|_| particles.insert(Particle::new(&Default::default())));
        let mut def = MouseForceDef::new(p[0], [p[1], p[2], p[3]], [0.2, 0.3, 0.5]);
        def.stiffness = stiffness;
        def.damping_stiffness = damping;
        Force::new(&ForceDef::from(def))
    }

    fn triangle() -> [Vec3; 3] {
        [Vec3::ZERO, Vec3::X, Vec3::NEG_Z]
    }

    #[test]
    fn test_drag_pulls_triangle_toward_cursor() {
        let mut f = mouse(10.0, 0.0);
        let [a, b, c] = triangle();
        let cursor = Vec3::new(0.3, 2.0, -0.5);
        let forces = eval(&mut f, &[cursor, a, b, c], &[Vec3::ZERO; 4]);

        assert!(forces[0].y < 0.0);
        assert!(forces[1].y > 0.0 && forces[2].y > 0.0 && forces[3].y > 0.0);
        // Triangle forces split by weight.
        assert!((forces[3].y / forces[1].y - 2.5).abs() < 1e-4);
        let total: Vec3 = forces.into_iter().sum();
        assert!(total.length() < 1e-4);
    }

    #[test]
    fn test_damping_resists_approach() {
        let mut f = mouse(0.0, 4.0);
        let [a, b, c] = triangle();
        let v = [Vec3::NEG_Y, Vec3::ZERO, Vec3::ZERO, Vec3::ZERO];
        let forces = eval(&mut f, &[Vec3::new(0.3, 1.0, -0.5), a, b, c], &v);
        assert!(forces[0].y > 0.0);
    }

    #[test]
    fn test_jacobian_matches_finite_differences() {
        let mut f = mouse(25.0, 0.0);
        let x = [
            Vec3::new(0.4, 1.3, -0.2),
            Vec3::new(0.0, 0.1, 0.0),
            Vec3::new(1.1, -0.1, 0.1),
            Vec3::new(0.1, 0.0, -0.9),
        ];
        let err = dfdx_error(&mut f, &x);
        assert!(err < 2e-2, "relative error {err}");
    }
}
