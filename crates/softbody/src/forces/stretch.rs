use super::{add_jacobian, rest_uv, ForceSolverData, UvMapping};
use crate::arena::Handle;
use crate::math::outer;
use crate::particle::Particle;
use glam::{Mat3, Vec2, Vec3};

/// Baraff-Witkin stretch over a cloth triangle.
#[derive(Clone, Copy, Debug)]
pub struct StretchForceDef {
    pub p1: Handle<Particle>,
    pub p2: Handle<Particle>,
    pub p3: Handle<Particle>,
    /// Rest `(u, v)` coordinates of the three vertices.
    pub rest_uv: [Vec2; 3],
    pub stretching_stiffness_u: f32,
    pub stretching_stiffness_v: f32,
    pub damping_stiffness_u: f32,
    pub damping_stiffness_v: f32,
    /// Rest stretch along u. 1 keeps the rest length.
    pub b_u: f32,
    /// Rest stretch along v.
    pub b_v: f32,
    pub user_index: Option<u32>,
}

impl StretchForceDef {
    /// Stretch force at rest in the triangle `x1, x2, x3`.
    pub fn new(
        p1: Handle<Particle>,
        p2: Handle<Particle>,
        p3: Handle<Particle>,
        x1: Vec3,
        x2: Vec3,
        x3: Vec3,
    ) -> Self {
        Self {
            p1,
            p2,
            p3,
            rest_uv: rest_uv(x1, x2, x3),
            stretching_stiffness_u: 0.0,
            stretching_stiffness_v: 0.0,
            damping_stiffness_u: 0.0,
            damping_stiffness_v: 0.0,
            b_u: 1.0,
            b_v: 1.0,
            user_index: None,
        }
    }

    /// Recompute the rest parametrisation from rest positions.
    pub fn initialize(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        self.rest_uv = rest_uv(a, b, c);
    }
}

#[derive(Clone, Debug)]
pub struct StretchForce {
    pub(crate) particles: [Handle<Particle>; 3],
    map: UvMapping,
    ks_u: f32,
    ks_v: f32,
    kd_u: f32,
    kd_v: f32,
    b_u: f32,
    b_v: f32,
    pub(crate) action_forces: [Vec3; 3],
    pub(crate) user_index: Option<u32>,
}

impl StretchForce {
    pub(crate) fn new(def: &StretchForceDef) -> Self {
        for k in [
            def.stretching_stiffness_u,
            def.stretching_stiffness_v,
            def.damping_stiffness_u,
            def.damping_stiffness_v,
        ] {
            assert!(k >= 0.0, "stiffness must be non-negative");
        }
        assert!(def.b_u >= 0.0 && def.b_v >= 0.0, "rest stretch must be non-negative");
        Self {
            particles: [def.p1, def.p2, def.p3],
            map: UvMapping::new(&def.rest_uv),
            ks_u: def.stretching_stiffness_u,
            ks_v: def.stretching_stiffness_v,
            kd_u: def.damping_stiffness_u,
            kd_v: def.damping_stiffness_v,
            b_u: def.b_u,
            b_v: def.b_v,
            action_forces: [Vec3::ZERO; 3],
            user_index: def.user_index,
        }
    }

    pub fn stretching_stiffness_u(&self) -> f32 {
        self.ks_u
    }

    pub fn stretching_stiffness_v(&self) -> f32 {
        self.ks_v
    }

    pub fn damping_stiffness_u(&self) -> f32 {
        self.kd_u
    }

    pub fn damping_stiffness_v(&self) -> f32 {
        self.kd_v
    }

    pub fn b_u(&self) -> f32 {
        self.b_u
    }

    pub fn b_v(&self) -> f32 {
        self.b_v
    }

    /// Rest area of the triangle.
    pub fn rest_area(&self) -> f32 {
        self.map.alpha
    }

    pub(crate) fn apply_forces(&mut self, ids: &[usize], data: &mut ForceSolverData) {
        let x = [data.x[ids[0]], data.x[ids[1]], data.x[ids[2]]];
        let v = [data.v[ids[0]], data.v[ids[1]], data.v[ids[2]]];
        let (wu, wv) = self.map.tangents(x[0], x[1], x[2]);

        let mut f = [Vec3::ZERO; 3];
        let axes = [
            (wu, self.map.dwudx, self.ks_u, self.kd_u, self.b_u),
            (wv, self.map.dwvdx, self.ks_v, self.kd_v, self.b_v),
        ];
        for (w, dwdx, ks, kd, b) in axes {
            let len = w.length();
            if len <= 0.0 {
                continue;
            }
            let n = w / len;
            let alpha = self.map.alpha;
            let dcdx = [0, 1, 2].map(|i| alpha * dwdx[i] * n);

            if ks > 0.0 {
                let c = alpha * (len - b);
                for i in 0..3 {
                    f[i] -= ks * c * dcdx[i];
                }

                // Curvature term only when stretched, keeping K negative semi-definite.
                let curvature = if len > b {
                    c * alpha / len * (Mat3::IDENTITY - outer(n, n))
                } else {
                    Mat3::ZERO
                };
                let mut k = [[Mat3::ZERO; 3]; 3];
                for i in 0..3 {
                    for j in 0..3 {
                        k[i][j] = -ks * (outer(dcdx[i], dcdx[j]) + dwdx[i] * dwdx[j] * curvature);
                    }
                }
                add_jacobian(data.dfdx, ids, &k);
            }

            if kd > 0.0 {
                let dcdt: f32 = (0..3).map(|i| dcdx[i].dot(v[i])).sum();
                for i in 0..3 {
                    f[i] -= kd * dcdt * dcdx[i];
                }

                let mut kv = [[Mat3::ZERO; 3]; 3];
                for i in 0..3 {
                    for j in 0..3 {
                        kv[i][j] = -kd * outer(dcdx[i], dcdx[j]);
                    }
                }
                add_jacobian(data.dfdv, ids, &kv);
            }
        }

        for i in 0..3 {
            data.f[ids[i]] += f[i];
        }
        self.action_forces = f;
    }
}
