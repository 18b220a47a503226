//! Square sparse matrix of 3x3 blocks in compressed-row form.
//!
//! The sparsity pattern is fixed at construction from the list of coupled
//! `(row, column)` pairs. Reading or accumulating into a block outside the
//! pattern is a programming error and panics.

use super::DenseVec3;
use glam::Mat3;
use std::ops::{Index, IndexMut, Mul};

#[derive(Clone, Debug)]
pub struct SparseMat33 {
    row_count: usize,
    /// `row_ptr[i]..row_ptr[i + 1]` indexes the blocks of row `i`.
    row_ptr: Vec<usize>,
    /// Column of each block, sorted within a row.
    cols: Vec<usize>,
    values: Vec<Mat3>,
}

impl SparseMat33 {
    /// Allocate storage for every pair in `adjacency` (duplicates are fine).
    ///
    /// The pattern must be symmetric: callers push `(i, j)` and `(j, i)`.
    pub fn new(row_count: usize, adjacency: &[(usize, usize)]) -> Self {
        let mut pairs: Vec<(usize, usize)> = adjacency.to_vec();
        pairs.sort_unstable();
        pairs.dedup();

        let mut row_ptr = vec![0usize; row_count + 1];
        let mut cols = Vec::with_capacity(pairs.len());
        for &(i, j) in &pairs {
            assert!(
                i < row_count && j < row_count,
                "pair ({}, {}) out of range for {} rows",
                i,
                j,
                row_count
            );
            row_ptr[i + 1] += 1;
            cols.push(j);
        }
        for i in 0..row_count {
            row_ptr[i + 1] += row_ptr[i];
        }

        let values = vec![Mat3::ZERO; cols.len()];
        Self {
            row_count,
            row_ptr,
            cols,
            values,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of allocated blocks.
    pub fn block_count(&self) -> usize {
        self.values.len()
    }

    pub fn set_zero(&mut self) {
        self.values.fill(Mat3::ZERO);
    }

    fn find(&self, i: usize, j: usize) -> Option<usize> {
        if i >= self.row_count {
            return None;
        }
        let begin = self.row_ptr[i];
        let end = self.row_ptr[i + 1];
        self.cols[begin..end]
            .binary_search(&j)
            .ok()
            .map(|offset| begin + offset)
    }

    pub fn get(&self, i: usize, j: usize) -> Option<&Mat3> {
        self.find(i, j).map(|k| &self.values[k])
    }

    pub fn get_mut(&mut self, i: usize, j: usize) -> Option<&mut Mat3> {
        self.find(i, j).map(move |k| &mut self.values[k])
    }

    /// Visit every allocated block with its `(row, column)`.
    pub fn for_each_block_mut(&mut self, mut f: impl FnMut(usize, usize, &mut Mat3)) {
        for i in 0..self.row_count {
            for k in self.row_ptr[i]..self.row_ptr[i + 1] {
                f(i, self.cols[k], &mut self.values[k]);
            }
        }
    }
}

impl Index<(usize, usize)> for SparseMat33 {
    type Output = Mat3;

    fn index(&self, (i, j): (usize, usize)) -> &Mat3 {
        match self.find(i, j) {
            Some(k) => &self.values[k],
            None => panic!("block ({}, {}) is not allocated", i, j),
        }
    }
}

impl IndexMut<(usize, usize)> for SparseMat33 {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut Mat3 {
        match self.find(i, j) {
            Some(k) => &mut self.values[k],
            None => panic!("block ({}, {}) is not allocated", i, j),
        }
    }
}

impl Mul<&DenseVec3> for &SparseMat33 {
    type Output = DenseVec3;

    fn mul(self, v: &DenseVec3) -> DenseVec3 {
        assert_eq!(self.row_count, v.len(), "dimension mismatch");
        let mut out = DenseVec3::zeros(self.row_count);
        for i in 0..self.row_count {
            let mut sum = glam::Vec3::ZERO;
            for k in self.row_ptr[i]..self.row_ptr[i + 1] {
                sum += self.values[k] * v[self.cols[k]];
            }
            out[i] = sum;
        }
        out
    }
}
