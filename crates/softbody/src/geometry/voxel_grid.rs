//! Regular lattice of scalar samples over a box, with trilinear lookup.
//!
//! Voxels sit on the lattice points: voxel `(i, j, k)` is at
//! `aabb.lower + (i, j, k) * cell_size`, so a grid of `W x H x D` voxels has
//! `(W - 1) x (H - 1) x (D - 1)` cells spanning the box exactly.

use super::Aabb;
use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoxelGrid {
    aabb: Aabb,
    width: usize,
    height: usize,
    depth: usize,
    #[serde(with = "crate::serde_utils::vec3")]
    cell_size: Vec3,
    values: Vec<f32>,
}

impl VoxelGrid {
    /// Zero-filled grid of `width x height x depth` voxels spanning `aabb`.
    pub fn new(aabb: Aabb, width: usize, height: usize, depth: usize) -> Self {
        assert!(
            width >= 2 && height >= 2 && depth >= 2,
            "a voxel grid needs at least 2 voxels per axis, got {}x{}x{}",
            width,
            height,
            depth
        );
        let cells = Vec3::new(
            (width - 1) as f32,
            (height - 1) as f32,
            (depth - 1) as f32,
        );
        Self {
            aabb,
            width,
            height,
            depth,
            cell_size: aabb.dimensions() / cells,
            values: vec![0.0; width * height * depth],
        }
    }

    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn cell_size(&self) -> Vec3 {
        self.cell_size
    }

    pub fn voxel_count(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    #[inline]
    pub fn voxel_index(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.width && j < self.height && k < self.depth);
        i + j * self.width + k * self.width * self.height
    }

    pub fn voxel(&self, i: usize, j: usize, k: usize) -> f32 {
        self.values[self.voxel_index(i, j, k)]
    }

    pub fn set_voxel(&mut self, i: usize, j: usize, k: usize, value: f32) {
        let idx = self.voxel_index(i, j, k);
        self.values[idx] = value;
    }

    /// Replace all samples at once, in linear index order.
    pub fn set_values(&mut self, values: Vec<f32>) {
        assert_eq!(values.len(), self.values.len(), "voxel count mismatch");
        self.values = values;
    }

    pub fn voxel_position(&self, i: usize, j: usize, k: usize) -> Vec3 {
        self.aabb.lower + Vec3::new(i as f32, j as f32, k as f32) * self.cell_size
    }

    /// Cell containing `p`; may be out of range.
    pub fn cell_index(&self, p: Vec3) -> IVec3 {
        ((p - self.aabb.lower) / self.cell_size).floor().as_ivec3()
    }

    fn contains_cell(&self, cell: IVec3) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && cell.z >= 0
            && (cell.x as usize) < self.width - 1
            && (cell.y as usize) < self.height - 1
            && (cell.z as usize) < self.depth - 1
    }

    /// Whether `p` lies in a cell of the grid. Sampling requires this.
    pub fn contains(&self, p: Vec3) -> bool {
        self.contains_cell(self.cell_index(p))
    }

    /// Corner values of a cell, x-major: bit 2 = +x, bit 1 = +y, bit 0 = +z.
    fn cell_voxels(&self, cell: IVec3) -> [f32; 8] {
        let (i, j, k) = (cell.x as usize, cell.y as usize, cell.z as usize);
        [
            self.voxel(i, j, k),
            self.voxel(i, j, k + 1),
            self.voxel(i, j + 1, k),
            self.voxel(i, j + 1, k + 1),
            self.voxel(i + 1, j, k),
            self.voxel(i + 1, j, k + 1),
            self.voxel(i + 1, j + 1, k),
            self.voxel(i + 1, j + 1, k + 1),
        ]
    }

    /// Trilinear blend of cell corners at relative position `rel` in [0,1]^3.
    fn interpolate(rel: Vec3, c: &[f32; 8]) -> f32 {
        let rel = rel.clamp(Vec3::ZERO, Vec3::ONE);
        // x
        let c00 = c[0] + (c[4] - c[0]) * rel.x;
        let c01 = c[1] + (c[5] - c[1]) * rel.x;
        let c10 = c[2] + (c[6] - c[2]) * rel.x;
        let c11 = c[3] + (c[7] - c[3]) * rel.x;
        // y
        let c0 = c00 + (c10 - c00) * rel.y;
        let c1 = c01 + (c11 - c01) * rel.y;
        // z
        c0 + (c1 - c0) * rel.z
    }

    fn locate(&self, p: Vec3) -> (IVec3, Vec3) {
        let cell = self.cell_index(p);
        assert!(self.contains_cell(cell), "point {:?} is outside the voxel grid", p);
        let lower = self.aabb.lower + cell.as_vec3() * self.cell_size;
        let rel = (p - lower) / self.cell_size;
        (cell, rel)
    }

    /// Trilinearly interpolated value at `p`. `p` must be contained.
    pub fn sample(&self, p: Vec3) -> f32 {
        let (cell, rel) = self.locate(p);
        Self::interpolate(rel, &self.cell_voxels(cell))
    }

    /// Spatial gradient of the interpolated field at `p`, from the
    /// difference between opposite cell faces along each axis.
    pub fn sample_gradient(&self, p: Vec3) -> Vec3 {
        let (cell, rel) = self.locate(p);
        let c = self.cell_voxels(cell);
        let gx = Self::interpolate(Vec3::new(1.0, rel.y, rel.z), &c)
            - Self::interpolate(Vec3::new(0.0, rel.y, rel.z), &c);
        let gy = Self::interpolate(Vec3::new(rel.x, 1.0, rel.z), &c)
            - Self::interpolate(Vec3::new(rel.x, 0.0, rel.z), &c);
        let gz = Self::interpolate(Vec3::new(rel.x, rel.y, 1.0), &c)
            - Self::interpolate(Vec3::new(rel.x, rel.y, 0.0), &c);
        Vec3::new(gx, gy, gz) / self.cell_size
    }
}
