//! Backward-Euler force solver.
//!
//! Solves for the velocity change over one step,
//!
//! ```text
//! (M - h df/dv - h^2 df/dx) dv = h (fe + f + df/dx r) - M (v - v0)
//! ```
//!
//! re-linearising at the new trial state on every pass. `r` is the drift
//! between the trial position and the one implied by the trial velocity,
//! `y` the prescribed particle translations. Rows of static and kinematic
//! particles are constrained to `dv = 0`.

use super::StepReport;
use crate::arena::{Arena, Handle};
use crate::contact::SphereShapeContact;
use crate::fixtures::{SphereFixture, WorldFixture};
use crate::forces::{Force, ForceSolverData};
use crate::math::mix_friction;
use crate::particle::{Particle, ParticleType};
use crate::settings::BodySettings;
use crate::sparse::{solve_cg, DenseVec3, DiagMat33, SparseMat33};
use glam::{Mat3, Vec3};

/// Borrowed view of the body state the solve touches.
pub(super) struct ForceSolver<'a> {
    pub particles: &'a mut Arena<Particle>,
    pub forces: &'a mut Arena<Force>,
    pub contacts: &'a mut Arena<SphereShapeContact>,
    pub sphere_fixtures: &'a Arena<SphereFixture>,
    pub world_fixtures: &'a Arena<WorldFixture>,
    pub settings: &'a BodySettings,
    pub gravity: Vec3,
}

/// Contact with everything `apply_forces` needs resolved up front.
struct ContactRow {
    contact: Handle<SphereShapeContact>,
    id: usize,
    radius: f32,
    world: Handle<WorldFixture>,
}

impl<'a> ForceSolver<'a> {
    pub fn solve(&mut self, dt: f32, force_iterations: usize, force_sub_iterations: usize) -> StepReport {
        let handles = self.particles.handles();
        let n = handles.len();
        if n == 0 {
            return StepReport::default();
        }
        for (i, &h) in handles.iter().enumerate() {
            self.particles[h].solver_id = i;
        }

        let force_rows: Vec<(Handle<Force>, Vec<usize>)> = self
            .forces
            .iter()
            .map(|(h, f)| {
                let ids = f.particles().iter().map(|&p| self.particles[p].solver_id).collect();
                (h, ids)
            })
            .collect();
        let contact_rows: Vec<ContactRow> = self
            .contacts
            .iter()
            .map(|(h, c)| ContactRow {
                contact: h,
                id: self.particles[c.particle].solver_id,
                radius: self.sphere_fixtures[c.sphere_fixture].radius,
                world: c.world_fixture,
            })
            .collect();

        // Diagonal blocks always exist; contacts only touch the diagonal.
        let mut adjacency: Vec<(usize, usize)> = (0..n).map(|i| (i, i)).collect();
        for (_, ids) in &force_rows {
            for &a in ids {
                for &b in ids {
                    adjacency.push((a, b));
                }
            }
        }

        let mut mass = DiagMat33::zeros(n);
        let mut free = vec![false; n];
        let mut x0 = DenseVec3::zeros(n);
        let mut v0 = DenseVec3::zeros(n);
        let mut y = DenseVec3::zeros(n);
        let mut fe = DenseVec3::zeros(n);
        for (i, &h) in handles.iter().enumerate() {
            let p = &self.particles[h];
            x0[i] = p.position;
            v0[i] = p.velocity;
            y[i] = p.translation;
            if p.particle_type == ParticleType::Dynamic {
                mass[i] = Mat3::from_diagonal(Vec3::splat(p.mass));
                fe[i] = p.force + p.mass * self.gravity;
                free[i] = true;
            } else {
                mass[i] = Mat3::IDENTITY;
            }
        }

        let mut x = x0.clone();
        let mut v = v0.clone();
        let mut f = DenseVec3::zeros(n);
        let mut dfdx = SparseMat33::new(n, &adjacency);
        let mut dfdv = SparseMat33::new(n, &adjacency);
        let mut a = SparseMat33::new(n, &adjacency);
        let mut b = DenseVec3::zeros(n);

        let h = dt;
        let mut report = StepReport {
            min_sub_iterations: usize::MAX,
            ..StepReport::default()
        };

        for _ in 0..force_iterations {
            f.set_zero();
            dfdx.set_zero();
            dfdv.set_zero();
            {
                let mut data = ForceSolverData {
                    x: &x,
                    v: &v,
                    f: &mut f,
                    dfdx: &mut dfdx,
                    dfdv: &mut dfdv,
                };
                self.apply_forces(&handles, &force_rows, &contact_rows, &mut data);
            }

            // r = (x0 + y + h v) - x
            let mut r = DenseVec3::zeros(n);
            for i in 0..n {
                r[i] = x0[i] + y[i] + h * v[i] - x[i];
            }
            let dfdx_r = &dfdx * &r;

            for i in 0..n {
                b[i] = if free[i] {
                    h * (fe[i] + f[i] + dfdx_r[i]) - mass[i] * (v[i] - v0[i])
                } else {
                    Vec3::ZERO
                };
            }

            a.set_zero();
            for i in 0..n {
                a[(i, i)] = mass[i];
            }
            {
                let dfdv = &dfdv;
                let dfdx = &dfdx;
                a.for_each_block_mut(|i, j, block| {
                    if free[i] && free[j] {
                        *block -= h * dfdv[(i, j)] + h * h * dfdx[(i, j)];
                    } else if i == j {
                        *block = Mat3::IDENTITY;
                    } else {
                        *block = Mat3::ZERO;
                    }
                });
            }

            let mut dv = DenseVec3::zeros(n);
            let output = solve_cg(&a, &b, &mut dv, force_sub_iterations, self.settings.cg_tolerance);
            if !output.converged {
                log::debug!(
                    "cg stopped at the iteration cap ({}) with error {}",
                    output.iterations,
                    output.error
                );
            }
            report.iterations += 1;
            report.min_sub_iterations = report.min_sub_iterations.min(output.iterations);
            report.max_sub_iterations = report.max_sub_iterations.max(output.iterations);

            v += &dv;
            for i in 0..n {
                x[i] = x0[i] + y[i] + h * v[i];
            }
        }

        for (i, &handle) in handles.iter().enumerate() {
            let p = &mut self.particles[handle];
            p.position = x[i];
            p.velocity = v[i];
        }

        self.apply_friction(dt);
        report
    }

    /// Assemble particle damping, internal forces and contact forces.
    fn apply_forces(
        &mut self,
        handles: &[Handle<Particle>],
        force_rows: &[(Handle<Force>, Vec<usize>)],
        contact_rows: &[ContactRow],
        data: &mut ForceSolverData,
    ) {
        for &h in handles {
            self.particles[h].apply_forces(data);
        }
        for (handle, ids) in force_rows {
            self.forces[*handle].apply_forces(ids, data);
        }
        for row in contact_rows {
            let shape = self.world_fixtures[row.world].shape();
            self.contacts[row.contact].apply_forces(row.id, row.radius, shape, self.settings, data);
        }
    }

    fn apply_friction(&mut self, dt: f32) {
        for (_, contact) in self.contacts.iter_mut() {
            let friction = mix_friction(
                self.sphere_fixtures[contact.sphere_fixture].friction,
                self.world_fixtures[contact.world_fixture].friction(),
            );
            contact.apply_friction(dt, friction, &mut self.particles[contact.particle]);
        }
    }
}
