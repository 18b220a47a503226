//! Dense vector of 3-vectors, one per solver row.

use glam::Vec3;
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Neg, Sub, SubAssign};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DenseVec3 {
    values: Vec<Vec3>,
}

impl DenseVec3 {
    /// `n` zero rows.
    pub fn zeros(n: usize) -> Self {
        Self {
            values: vec![Vec3::ZERO; n],
        }
    }

    pub fn from_vec(values: Vec<Vec3>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn set_zero(&mut self) {
        self.values.fill(Vec3::ZERO);
    }

    pub fn as_slice(&self) -> &[Vec3] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Vec3> {
        self.values.iter()
    }

    pub fn into_vec(self) -> Vec<Vec3> {
        self.values
    }

    /// Sum of row dot products.
    pub fn dot(&self, other: &DenseVec3) -> f32 {
        assert_eq!(self.len(), other.len(), "dimension mismatch");
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a.dot(*b))
            .sum()
    }

    pub fn length_squared(&self) -> f32 {
        self.dot(self)
    }

    /// `self += alpha * other`
    pub fn add_scaled(&mut self, alpha: f32, other: &DenseVec3) {
        assert_eq!(self.len(), other.len(), "dimension mismatch");
        for (a, b) in self.values.iter_mut().zip(&other.values) {
            *a += alpha * *b;
        }
    }
}

impl Index<usize> for DenseVec3 {
    type Output = Vec3;

    fn index(&self, i: usize) -> &Vec3 {
        &self.values[i]
    }
}

impl IndexMut<usize> for DenseVec3 {
    fn index_mut(&mut self, i: usize) -> &mut Vec3 {
        &mut self.values[i]
    }
}

impl Add<&DenseVec3> for &DenseVec3 {
    type Output = DenseVec3;

    fn add(self, rhs: &DenseVec3) -> DenseVec3 {
        assert_eq!(self.len(), rhs.len(), "dimension mismatch");
        DenseVec3::from_vec(
            self.values
                .iter()
                .zip(&rhs.values)
                .map(|(a, b)| *a + *b)
                .collect(),
        )
    }
}

impl Sub<&DenseVec3> for &DenseVec3 {
    type Output = DenseVec3;

    fn sub(self, rhs: &DenseVec3) -> DenseVec3 {
        assert_eq!(self.len(), rhs.len(), "dimension mismatch");
        DenseVec3::from_vec(
            self.values
                .iter()
                .zip(&rhs.values)
                .map(|(a, b)| *a - *b)
                .collect(),
        )
    }
}

impl Mul<f32> for &DenseVec3 {
    type Output = DenseVec3;

    fn mul(self, s: f32) -> DenseVec3 {
        DenseVec3::from_vec(self.values.iter().map(|v| *v * s).collect())
    }
}

impl Neg for &DenseVec3 {
    type Output = DenseVec3;

    fn neg(self) -> DenseVec3 {
        DenseVec3::from_vec(self.values.iter().map(|v| -*v).collect())
    }
}

impl AddAssign<&DenseVec3> for DenseVec3 {
    fn add_assign(&mut self, rhs: &DenseVec3) {
        self.add_scaled(1.0, rhs);
    }
}

impl SubAssign<&DenseVec3> for DenseVec3 {
    fn sub_assign(&mut self, rhs: &DenseVec3) {
        self.add_scaled(-1.0, rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_sums_rows() {
        let a = DenseVec3::from_vec(vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 1.0, 0.0)]);
        let b = DenseVec3::from_vec(vec![Vec3::new(1.0, 1.0, 1.0), Vec3::new(5.0, 2.0, 7.0)]);
        assert_eq!(a.dot(&b), 6.0 + 2.0);
    }

    #[test]
    fn test_add_scaled() {
        let mut a = DenseVec3::zeros(2);
        let b = DenseVec3::from_vec(vec![Vec3::X, Vec3::Y]);
        a.add_scaled(2.0, &b);
        a -= &b;
        assert_eq!(a[0], Vec3::X);
        assert_eq!(a[1], Vec3::Y);
    }
}
