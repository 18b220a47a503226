use super::{add_jacobian, rest_uv, ForceSolverData, UvMapping};
use crate::arena::Handle;
use crate::math::outer;
use crate::particle::Particle;
use glam::{Mat3, Vec2, Vec3};

/// In-plane shear of a cloth triangle, measured by `w_u · w_v`.
#[derive(Clone, Copy, Debug)]
pub struct ShearForceDef {
    pub p1: Handle<Particle>,
    pub p2: Handle<Particle>,
    pub p3: Handle<Particle>,
    pub rest_uv: [Vec2; 3],
    pub shearing_stiffness: f32,
    pub damping_stiffness: f32,
    pub user_index: Option<u32>,
}

impl ShearForceDef {
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
            shearing_stiffness: 0.0,
            damping_stiffness: 0.0,
            user_index: None,
        }
    }

    pub fn initialize(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        self.rest_uv = rest_uv(a, b, c);
    }
}

#[derive(Clone, Debug)]
pub struct ShearForce {
    pub(crate) particles: [Handle<Particle>; 3],
    map: UvMapping,
    ks: f32,
    kd: f32,
    pub(crate) action_forces: [Vec3; 3],
    pub(crate) user_index: Option<u32>,
}

impl ShearForce {
    pub(crate) fn new(def: &ShearForceDef) -> Self {
        let mut force = Self {
            particles: [def.p1, def.p2, def.p3],
            map: UvMapping::new(&def.rest_uv),
            ks: 0.0,
            kd: 0.0,
            action_forces: [Vec3::ZERO; 3],
            user_index: def.user_index,
        };
        force.set_shearing_stiffness(def.shearing_stiffness);
        force.set_damping_stiffness(def.damping_stiffness);
        force
    }

    pub fn shearing_stiffness(&self) -> f32 {
        self.ks
    }

    pub fn set_shearing_stiffness(&mut self, stiffness: f32) {
        assert!(stiffness >= 0.0, "stiffness must be non-negative");
        self.ks = stiffness;
    }

    pub fn damping_stiffness(&self) -> f32 {
        self.kd
    }

    pub fn set_damping_stiffness(&mut self, damping_stiffness: f32) {
        assert!(damping_stiffness >= 0.0, "damping stiffness must be non-negative");
        self.kd = damping_stiffness;
    }

    pub(crate) fn apply_forces(&mut self, ids: &[usize], data: &mut ForceSolverData) {
        let x = [data.x[ids[0]], data.x[ids[1]], data.x[ids[2]]];
        let v = [data.v[ids[0]], data.v[ids[1]], data.v[ids[2]]];
        let (wu, wv) = self.map.tangents(x[0], x[1], x[2]);
        let alpha = self.map.alpha;
        let (dwudx, dwvdx) = (self.map.dwudx, self.map.dwvdx);

        let dcdx = [0, 1, 2].map(|i| alpha * (dwudx[i] * wv + dwvdx[i] * wu));
        let mut f = [Vec3::ZERO; 3];

        if self.ks > 0.0 {
            let c = alpha * wu.dot(wv);
            for i in 0..3 {
                f[i] -= self.ks * c * dcdx[i];
            }

            let mut k = [[Mat3::ZERO; 3]; 3];
            for i in 0..3 {
                for j in 0..3 {
                    let d2cdxij = alpha * (dwudx[i] * dwvdx[j] + dwudx[j] * dwvdx[i]);
                    k[i][j] = -self.ks
                        * (outer(dcdx[i], dcdx[j]) + Mat3::from_diagonal(Vec3::splat(c * d2cdxij)));
                }
            }
            add_jacobian(data.dfdx, ids, &k);
        }

        if self.kd > 0.0 {
            let dcdt: f32 = (0..3).map(|i| dcdx[i].dot(v[i])).sum();
            for i in 0..3 {
                f[i] -= self.kd * dcdt * dcdx[i];
            }

            let mut kv = [[Mat3::ZERO; 3]; 3];
            for i in 0..3 {
                for j in 0..3 {
                    kv[i][j] = -self.kd * outer(dcdx[i], dcdx[j]);
                }
            }
            add_jacobian(data.dfdv, ids, &kv);
        }

        for i in 0..3 {
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

    const REST: [Vec3; 3] = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -1.0),
    ];

    fn shear(ks: f32, kd: f32) -> Force {
        let mut particles = Arena::new();
        let p = [0; 3].map(|_| particles.insert(Particle::new(&Default::default())));
        let mut def = ShearForceDef::new(p[0], p[1], p[2], REST[0], REST[1], REST[2]);
        def.shearing_stiffness = ks;
        def.damping_stiffness = kd;
        Force::new(&ForceDef::from(def))
    }

    #[test]
    fn test_pure_stretch_has_no_shear() {
        let mut f = shear(100.0, 0.0);
        let x = [REST[0], Vec3::new(1.7, 0.0, 0.0), Vec3::new(0.0, 0.0, -0.6)];
        for force in eval(&mut f, &x, &[Vec3::ZERO; 3]) {
            assert!(force.length() < 1e-4);
        }
    }

    #[test]
    fn test_sheared_triangle_is_restored() {
        let mut f = shear(100.0, 0.0);
        // Slide the top vertex along u.
        let x = [REST[0], REST[1], Vec3::new(0.4, 0.0, -1.0)];
        let forces = eval(&mut f, &x, &[Vec3::ZERO; 3]);
        assert!(forces[2].x < 0.0);
        let total: Vec3 = forces.into_iter().sum();
        assert!(total.length() < 1e-4);
    }

    #[test]
    fn test_damping_only_resists_shear_rate() {
        let mut f = shear(0.0, 10.0);
        // Rigid translation has no shear rate.
        let forces = eval(&mut f, &REST, &[Vec3::new(1.0, 2.0, 3.0); 3]);
        for force in forces {
            assert!(force.length() < 1e-4);
        }
    }

    #[test]
    fn test_jacobian_matches_finite_differences() {
        let mut f = shear(60.0, 0.0);
        let x = [
            Vec3::new(0.0, 0.1, 0.0),
            Vec3::new(1.2, -0.1, 0.3),
            Vec3::new(0.5, 0.2, -0.9),
        ];
        let err = dfdx_error(&mut f, &x);
        assert!(err < 2e-2, "relative error {err}");
    }

    #[test]
    #[should_panic(expected = "stiffness must be non-negative")]
    fn test_negative_stiffness_panics() {
        shear(-1.0, 0.0);
    }
}
