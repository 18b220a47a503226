//! Conjugate gradient on random block systems.

use proptest::prelude::*;
use softbody::sparse::{solve_cg, DenseVec3, SparseMat33};
use softbody::{Mat3, Vec3};

/// Symmetric, strictly diagonally dominant chain with couplings between
/// neighbours and between each row and row 0.
fn chain_system(couplings: &[[f32; 9]], diagonal: &[f32]) -> SparseMat33 {
    let n = diagonal.len();
    let mut adjacency = Vec::new();
    for i in 0..n {
        adjacency.push((i, i));
        if i + 1 < n {
            adjacency.push((i, i + 1));
            adjacency.push((i + 1, i));
        }
        adjacency.push((0, i));
        adjacency.push((i, 0));
    }

    let mut a = SparseMat33::new(n, &adjacency);
    let mut row_sum = vec![0.0f32; n];
    let mut couple = |a: &mut SparseMat33, i: usize, j: usize, c: &[f32; 9]| {
        let block = Mat3::from_cols_array(c);
        a[(i, j)] += block;
        a[(j, i)] += block.transpose();
        let weight: f32 = c.iter().map(|v| v.abs()).sum();
        row_sum[i] += weight;
        row_sum[j] += weight;
    };
    for i in 1..n {
        couple(&mut a, i - 1, i, &couplings[i - 1]);
        if i > 1 {
            couple(&mut a, 0, i, &couplings[i]);
        }
    }
    for i in 0..n {
        a[(i, i)] += Mat3::from_diagonal(Vec3::splat(row_sum[i] + diagonal[i]));
    }
    a
}

fn residual(a: &SparseMat33, b: &DenseVec3, x: &DenseVec3) -> f32 {
    let ax = a * x;
    (0..b.len()).map(|i| (b[i] - ax[i]).length_squared()).sum::<f32>().sqrt()
}

proptest! {
    #[test]
    fn prop_cg_solves_dominant_systems(
        n in 2usize..12,
        couplings in prop::collection::vec(prop::array::uniform9(-1.0f32..1.0), 12),
        diagonal in prop::collection::vec(0.5f32..4.0, 12),
        rhs in prop::collection::vec((-5.0f32..5.0, -5.0f32..5.0, -5.0f32..5.0), 12),
    ) {
        let a = chain_system(&couplings, &diagonal[..n]);
        let b = DenseVec3::from_vec(rhs[..n].iter().map(|&(x, y, z)| Vec3::new(x, y, z)).collect());
        let mut x = DenseVec3::zeros(n);

        let output = solve_cg(&a, &b, &mut x, 200, 1e-4);

        prop_assert!(output.converged, "no convergence after {} iterations", output.iterations);
        let b_norm = b.length_squared().sqrt();
        prop_assert!(residual(&a, &b, &x) <= 1e-2 * b_norm + 1e-5);
    }
}

#[test]
fn test_cg_zero_rhs_needs_no_iterations() {
    let a = chain_system(&[[0.1; 9]; 3], &[1.0; 3]);
    let b = DenseVec3::zeros(3);
    let mut x = DenseVec3::zeros(3);
    let output = solve_cg(&a, &b, &mut x, 10, 1e-4);
    assert!(output.converged);
    assert_eq!(output.iterations, 0);
    assert!(x.iter().all(|v| *v == Vec3::ZERO));
}

#[test]
fn test_cg_respects_iteration_cap() {
    let a = chain_system(&[[0.4; 9]; 8], &[0.5; 8]);
    let b = DenseVec3::from_vec((0..8).map(|i| Vec3::new(i as f32, 1.0, -2.0)).collect());
    let mut x = DenseVec3::zeros(8);
    let output = solve_cg(&a, &b, &mut x, 1, 1e-6);
    assert_eq!(output.iterations, 1);
    assert!(!output.converged);
}
