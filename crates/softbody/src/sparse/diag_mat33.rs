//! Block-diagonal matrix: one 3x3 block per row. Mass and selection operators.

use super::DenseVec3;
use glam::Mat3;
use std::ops::{Index, IndexMut, Mul};

#[derive(Clone, Debug, PartialEq)]
pub struct DiagMat33 {
    blocks: Vec<Mat3>,
}

impl DiagMat33 {
    pub fn zeros(n: usize) -> Self {
        Self {
            blocks: vec![Mat3::ZERO; n],
        }
    }

    pub fn identity(n: usize) -> Self {
        Self {
            blocks: vec![Mat3::IDENTITY; n],
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block-wise inverse. Every block must be invertible.
    pub fn inverse(&self) -> DiagMat33 {
        DiagMat33 {
            blocks: self
                .blocks
                .iter()
                .map(|m| {
                    debug_assert!(m.determinant() != 0.0, "singular diagonal block");
                    m.inverse()
                })
                .collect(),
        }
    }
}

impl Index<usize> for DiagMat33 {
    type Output = Mat3;

    fn index(&self, i: usize) -> &Mat3 {
        &self.blocks[i]
    }
}

impl IndexMut<usize> for DiagMat33 {
    fn index_mut(&mut self, i: usize) -> &mut Mat3 {
        &mut self.blocks[i]
    }
}

impl Mul<&DenseVec3> for &DiagMat33 {
    type Output = DenseVec3;

    fn mul(self, v: &DenseVec3) -> DenseVec3 {
        assert_eq!(self.len(), v.len(), "dimension mismatch");
        DenseVec3::from_vec(
            self.blocks
                .iter()
                .zip(v.iter())
                .map(|(m, x)| *m * *x)
                .collect(),
        )
    }
}
