//! Sparse linear algebra over 3x3 blocks.
//!
//! Every per-particle quantity is a `Vec3` row addressed by the particle's
//! solver index; couplings between particles are `Mat3` blocks.

mod cg;
mod dense_vec3;
mod diag_mat33;
mod sparse_mat33;

pub use cg::{jacobi_preconditioner, solve_cg, CgOutput};
pub use dense_vec3::DenseVec3;
pub use diag_mat33::DiagMat33;
pub use sparse_mat33::SparseMat33;
