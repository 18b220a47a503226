//! Jacobi-preconditioned conjugate gradient for sparse block systems.
//!
//! Follows Shewchuk, "An Introduction to the Conjugate Gradient Method Without
//! the Agonizing Pain": incremental residual updates, with the true residual
//! `b - A x` recomputed every [`CG_RESIDUAL_REFRESH`] iterations to bound drift.

use super::{DenseVec3, DiagMat33, SparseMat33};
use crate::constants::CG_RESIDUAL_REFRESH;
use glam::{Mat3, Vec3};

/// Result of a CG solve. Hitting the iteration cap is not an error.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CgOutput {
    /// Iterations performed.
    pub iterations: usize,
    /// Final preconditioned squared residual `r . M^-1 r`.
    pub error: f32,
    /// Whether the relative tolerance was met.
    pub converged: bool,
}

/// Inverse of the diagonal of each diagonal block of `a`.
///
/// Panics if any diagonal entry is not strictly positive.
pub fn jacobi_preconditioner(a: &SparseMat33) -> DiagMat33 {
    let mut inv = DiagMat33::zeros(a.row_count());
    for i in 0..a.row_count() {
        let block = a[(i, i)];
        let d = Vec3::new(block.x_axis.x, block.y_axis.y, block.z_axis.z);
        assert!(
            d.x > 0.0 && d.y > 0.0 && d.z > 0.0,
            "diagonal block {} is not positive: {:?}",
            i,
            d
        );
        inv[i] = Mat3::from_diagonal(d.recip());
    }
    inv
}

/// Solve `a x = b` in place, starting from the current `x`.
///
/// `tolerance` is relative: iteration stops once
/// `delta <= tolerance^2 * delta_0`.
pub fn solve_cg(
    a: &SparseMat33,
    b: &DenseVec3,
    x: &mut DenseVec3,
    max_iterations: usize,
    tolerance: f32,
) -> CgOutput {
    assert!(
        tolerance > 0.0 && tolerance < 1.0,
        "tolerance must be in (0, 1), got {}",
        tolerance
    );
    assert_eq!(a.row_count(), b.len(), "dimension mismatch");
    assert_eq!(b.len(), x.len(), "dimension mismatch");

    let inv_m = jacobi_preconditioner(a);

    let mut r = b - &(a * &*x);
    let mut d = &inv_m * &r;
    let mut delta_new = r.dot(&d);
    let delta_0 = delta_new;
    let threshold = tolerance * tolerance * delta_0;

    let mut iteration = 0;
    loop {
        if delta_new <= threshold {
            break;
        }
        if iteration == max_iterations {
            break;
        }

        let q = a * &d;
        let alpha = delta_new / d.dot(&q);

        x.add_scaled(alpha, &d);

        if iteration % CG_RESIDUAL_REFRESH == 0 {
            r = b - &(a * &*x);
        } else {
            r.add_scaled(-alpha, &q);
        }

        let s = &inv_m * &r;
        let delta_old = delta_new;
        delta_new = r.dot(&s);

        let beta = delta_new / delta_old;
        d = &s + &(&d * beta);

        iteration += 1;
    }

    CgOutput {
        iterations: iteration,
        error: delta_new,
        converged: delta_new <= threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two particles joined by a spring of stiffness k, each with unit mass:
    /// the familiar `[[m + k, -k], [-k, m + k]]` system.
    fn spring_system(k: f32) -> SparseMat33 {
        let mut a = SparseMat33::new(2, &[(0, 0), (0, 1), (1, 0), (1, 1)]);
        a[(0, 0)] += Mat3::IDENTITY * (1.0 + k);
        a[(1, 1)] += Mat3::IDENTITY * (1.0 + k);
        a[(0, 1)] += Mat3::IDENTITY * -k;
        a[(1, 0)] += Mat3::IDENTITY * -k;
        a
    }

    #[test]
    fn test_spring_system_matches_closed_form() {
        let k = 10.0;
        let a = spring_system(k);
        let b = DenseVec3::from_vec(vec![Vec3::new(1.0, 0.0, 2.0), Vec3::new(0.0, 3.0, 0.0)]);
        let mut x = DenseVec3::zeros(2);
        let out = solve_cg(&a, &b, &mut x, 100, 1e-5);

        // Inverse of [[p, q], [q, p]] is [[p, -q], [-q, p]] / (p^2 - q^2).
        let p = 1.0 + k;
        let q = -k;
        let det = p * p - q * q;
        let expected0 = (b[0] * p - b[1] * q) / det;
        let expected1 = (b[1] * p - b[0] * q) / det;

        assert!(out.converged);
        assert!(out.iterations <= 6, "iterations: {}", out.iterations);
        assert!((x[0] - expected0).length() < 1e-4);
        assert!((x[1] - expected1).length() < 1e-4);
    }

    #[test]
    fn test_zero_rhs_stops_immediately() {
        let a = spring_system(1.0);
        let b = DenseVec3::zeros(2);
        let mut x = DenseVec3::zeros(2);
        let out = solve_cg(&a, &b, &mut x, 10, 1e-3);
        assert_eq!(out.iterations, 0);
        assert!(out.converged);
    }

    #[test]
    fn test_iteration_cap_returns_best_estimate() {
        let a = spring_system(1000.0);
        let b = DenseVec3::from_vec(vec![Vec3::ONE, -Vec3::ONE * 0.5]);
        let mut x = DenseVec3::zeros(2);
        let out = solve_cg(&a, &b, &mut x, 1, 1e-6);
        assert_eq!(out.iterations, 1);
        assert!(x.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_tighter_tolerance_never_needs_fewer_iterations() {
        let mut a = SparseMat33::new(3, &[(0, 0), (1, 1), (2, 2), (0, 1), (1, 0), (1, 2), (2, 1)]);
        a[(0, 0)] += Mat3::from_diagonal(Vec3::new(4.0, 3.0, 5.0));
        a[(1, 1)] += Mat3::from_diagonal(Vec3::new(6.0, 2.0, 4.0));
        a[(2, 2)] += Mat3::from_diagonal(Vec3::new(3.0, 7.0, 2.0));
        a[(0, 1)] += Mat3::IDENTITY * -1.0;
        a[(1, 0)] += Mat3::IDENTITY * -1.0;
        a[(1, 2)] += Mat3::IDENTITY * -0.5;
        a[(2, 1)] += Mat3::IDENTITY * -0.5;
        let b = DenseVec3::from_vec(vec![Vec3::new(1.0, 2.0, 3.0), Vec3::ONE, Vec3::new(-2.0, 0.0, 1.0)]);

        let mut last = 0;
        for tolerance in [0.5, 1e-1, 1e-2, 1e-3, 1e-5] {
            let mut x = DenseVec3::zeros(3);
            let out = solve_cg(&a, &b, &mut x, 100, tolerance);
            assert!(out.iterations >= last);
            last = out.iterations;
        }
    }

    #[test]
    #[should_panic(expected = "not positive")]
    fn test_non_positive_diagonal_panics() {
        let a = SparseMat33::new(1, &[(0, 0)]);
        let b = DenseVec3::from_vec(vec![Vec3::ONE]);
        let mut x = DenseVec3::zeros(1);
        solve_cg(&a, &b, &mut x, 10, 1e-3);
    }
}
