//! Internal forces between particles.
//!
//! Each force evaluates itself at the solver's trial state and accumulates
//! its force vector plus the position and velocity Jacobian blocks into
//! [`ForceSolverData`]. Forces only reference particles; the body owns them.

mod mouse;
mod shear;
mod spring;
mod stretch;

pub use mouse::{MouseForce, MouseForceDef};
pub use shear::{ShearForce, ShearForceDef};
pub use spring::{SpringForce, SpringForceDef};
pub use stretch::{StretchForce, StretchForceDef};

use crate::arena::Handle;
use crate::particle::Particle;
use crate::sparse::{DenseVec3, SparseMat33};
use glam::{Mat3, Vec2, Vec3};

/// Trial state and accumulators for one force evaluation pass, addressed by
/// particle solver index.
pub struct ForceSolverData<'a> {
    pub x: &'a DenseVec3,
    pub v: &'a DenseVec3,
    pub f: &'a mut DenseVec3,
    pub dfdx: &'a mut SparseMat33,
    pub dfdv: &'a mut SparseMat33,
}

/// Add the `N x N` block Jacobian `k` over particles `ids`.
pub(crate) fn add_jacobian<const N: usize>(m: &mut SparseMat33, ids: &[usize], k: &[[Mat3; N]; N]) {
    debug_assert_eq!(ids.len(), N);
    for i in 0..N {
        for j in 0..N {
            m[(ids[i], ids[j])] += k[i][j];
        }
    }
}

/// Rest `(u, v)` coordinates of triangle `a, b, c`: `a` at the origin, `b`
/// on the u axis and `c` above it.
pub fn rest_uv(a: Vec3, b: Vec3, c: Vec3) -> [Vec2; 3] {
    let ab = b - a;
    let ac = c - a;
    let u2 = ab.length();
    assert!(u2 > 0.0, "triangle edge has zero length");
    let twice_area = ab.cross(ac).length();
    assert!(twice_area > 0.0, "triangle has zero area");
    [
        Vec2::ZERO,
        Vec2::new(u2, 0.0),
        Vec2::new(ac.dot(ab / u2), twice_area / u2),
    ]
}

/// Linear map from the rest `(u, v)` plane to world space, shared by the
/// stretch and shear laws.
#[derive(Clone, Copy, Debug)]
pub(crate) struct UvMapping {
    /// Rest area.
    pub alpha: f32,
    du1: f32,
    dv1: f32,
    du2: f32,
    dv2: f32,
    inv_det: f32,
    /// `d w_u / d x_i` for the three vertices.
    pub dwudx: Vec3,
    /// `d w_v / d x_i` for the three vertices.
    pub dwvdx: Vec3,
}

impl UvMapping {
    pub fn new(uv: &[Vec2; 3]) -> Self {
        let du1 = uv[1].x - uv[0].x;
        let dv1 = uv[1].y - uv[0].y;
        let du2 = uv[2].x - uv[0].x;
        let dv2 = uv[2].y - uv[0].y;
        let det = du1 * dv2 - du2 * dv1;
        assert!(det != 0.0, "degenerate (u, v) parametrisation");
        let inv_det = 1.0 / det;
        Self {
            alpha: 0.5 * det.abs(),
            du1,
            dv1,
            du2,
            dv2,
            inv_det,
            dwudx: Vec3::new(inv_det * (dv1 - dv2), inv_det * dv2, -inv_det * dv1),
            dwvdx: Vec3::new(inv_det * (du2 - du1), -inv_det * du2, inv_det * du1),
        }
    }

    /// World-space tangents `(w_u, w_v)` of the deformed triangle.
    pub fn tangents(&self, x1: Vec3, x2: Vec3, x3: Vec3) -> (Vec3, Vec3) {
        let dx1 = x2 - x1;
        let dx2 = x3 - x1;
        let wu = self.inv_det * (self.dv2 * dx1 - self.dv1 * dx2);
        let wv = self.inv_det * (-self.du2 * dx1 + self.du1 * dx2);
        (wu, wv)
    }
}

/// Creation parameters for any force.
#[derive(Clone, Copy, Debug)]
pub enum ForceDef {
    Spring(SpringForceDef),
    Stretch(StretchForceDef),
    Shear(ShearForceDef),
    Mouse(MouseForceDef),
}

impl From<SpringForceDef> for ForceDef {
    fn from(def: SpringForceDef) -> Self {
        ForceDef::Spring(def)
    }
}

impl From<StretchForceDef> for ForceDef {
    fn from(def: StretchForceDef) -> Self {
        ForceDef::Stretch(def)
    }
}

impl From<ShearForceDef> for ForceDef {
    fn from(def: ShearForceDef) -> Self {
        ForceDef::Shear(def)
    }
}

impl From<MouseForceDef> for ForceDef {
    fn from(def: MouseForceDef) -> Self {
        ForceDef::Mouse(def)
    }
}

impl ForceDef {
    /// Particles the force will bind.
    pub fn particles(&self) -> Vec<Handle<Particle>> {
        match self {
            ForceDef::Spring(d) => vec![d.p1, d.p2],
            ForceDef::Stretch(d) => vec![d.p1, d.p2, d.p3],
            ForceDef::Shear(d) => vec![d.p1, d.p2, d.p3],
            ForceDef::Mouse(d) => vec![d.p1, d.p2, d.p3, d.p4],
        }
    }
}

/// A force owned by a body.
#[derive(Clone, Debug)]
pub enum Force {
    Spring(SpringForce),
    Stretch(StretchForce),
    Shear(ShearForce),
    Mouse(MouseForce),
}

impl Force {
    pub(crate) fn new(def: &ForceDef) -> Self {
        match def {
            ForceDef::Spring(d) => Force::Spring(SpringForce::new(d)),
            ForceDef::Stretch(d) => Force::Stretch(StretchForce::new(d)),
            ForceDef::Shear(d) => Force::Shear(ShearForce::new(d)),
            ForceDef::Mouse(d) => Force::Mouse(MouseForce::new(d)),
        }
    }

    /// Bound particles, in definition order.
    pub fn particles(&self) -> &[Handle<Particle>] {
        match self {
            Force::Spring(f) => &f.particles,
            Force::Stretch(f) => &f.particles,
            Force::Shear(f) => &f.particles,
            Force::Mouse(f) => &f.particles,
        }
    }

    pub fn contains(&self, particle: Handle<Particle>) -> bool {
        self.particles().contains(&particle)
    }

    pub fn user_index(&self) -> Option<u32> {
        match self {
            Force::Spring(f) => f.user_index,
            Force::Stretch(f) => f.user_index,
            Force::Shear(f) => f.user_index,
            Force::Mouse(f) => f.user_index,
        }
    }

    /// Force applied to each bound particle during the last step, in the
    /// order of [`Force::particles`].
    pub fn action_forces(&self) -> &[Vec3] {
        match self {
            Force::Spring(f) => &f.action_forces,
            Force::Stretch(f) => &f.action_forces,
            Force::Shear(f) => &f.action_forces,
            Force::Mouse(f) => &f.action_forces,
        }
    }

    pub(crate) fn clear_forces(&mut self) {
        match self {
            Force::Spring(f) => f.action_forces = [Vec3::ZERO; 2],
            Force::Stretch(f) => f.action_forces = [Vec3::ZERO; 3],
            Force::Shear(f) => f.action_forces = [Vec3::ZERO; 3],
            Force::Mouse(f) => f.action_forces = [Vec3::ZERO; 4],
        }
    }

    /// `ids` are the solver indices of [`Force::particles`], in order.
    pub(crate) fn apply_forces(&mut self, ids: &[usize], data: &mut ForceSolverData) {
        match self {
            Force::Spring(f) => f.apply_forces(ids, data),
            Force::Stretch(f) => f.apply_forces(ids, data),
            Force::Shear(f) => f.apply_forces(ids, data),
            Force::Mouse(f) => f.apply_forces(ids, data),
        }
    }
}
