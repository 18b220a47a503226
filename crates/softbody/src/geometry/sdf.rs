//! Signed distance field baked from a closed triangle mesh.
//!
//! Building is `O(voxels x triangles)` and is meant to run once; persist the
//! result with [`Sdf::save_json`] and reload it with [`Sdf::load_json`].

use super::{barycentric_triangle, closest_point_on_triangle, Aabb, Mesh, VoxelGrid};
use crate::constants::EPSILON;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sdf {
    grid: VoxelGrid,
}

impl Sdf {
    /// Bake the field of `mesh`.
    ///
    /// The mesh box is grown by `padding`, then split into
    /// `ceil(size / cell_size)` cells per axis (at least one). Distances are
    /// negative inside the mesh.
    pub fn build(mesh: &Mesh, cell_size: Vec3, padding: f32) -> Self {
        assert!(cell_size.cmpgt(Vec3::ZERO).all(), "cell size must be positive");
        assert!(mesh.triangle_count() > 0, "cannot build a distance field without triangles");

        let aabb = mesh.compute_aabb().extended(padding);
        let cells = (aabb.dimensions() / cell_size).ceil().max(Vec3::ONE);
        let width = cells.x as usize + 1;
        let height = cells.y as usize + 1;
        let depth = cells.z as usize + 1;

        let mut grid = VoxelGrid::new(aabb, width, height, depth);
        let far_distance = aabb.volume();

        log::info!(
            "building SDF: {}x{}x{} voxels over {} triangles",
            width,
            height,
            depth,
            mesh.triangle_count()
        );

        let values = compute_distances(mesh, &grid, far_distance);
        grid.set_values(values);

        log::info!("SDF build finished");
        Self { grid }
    }

    pub fn from_voxel_grid(grid: VoxelGrid) -> Self {
        Self { grid }
    }

    pub fn voxel_grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn aabb(&self) -> &Aabb {
        self.grid.aabb()
    }

    /// Whether `p` may be queried.
    pub fn contains(&self, p: Vec3) -> bool {
        self.grid.contains(p)
    }

    /// Signed distance at `p`. Panics if `p` is not contained.
    pub fn distance(&self, p: Vec3) -> f32 {
        self.grid.sample(p)
    }

    /// Outward unit normal at `p`. Panics if `p` is not contained.
    pub fn normal(&self, p: Vec3) -> Vec3 {
        self.grid.sample_gradient(p).normalize_or_zero()
    }

    /// Save the field to a JSON file
    pub fn save_json(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a field from a JSON file
    pub fn load_json(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)?;
        let sdf = serde_json::from_str(&json)?;
        Ok(sdf)
    }
}

/// Distances closer than this along a parity ray are one crossing.
const CROSSING_MERGE_DISTANCE: f32 = 1.0e-4;

/// Barycentric slack so a ray through a shared edge or vertex hits every
/// triangle around it before merging.
const CROSSING_BARYCENTRIC_SLACK: f32 = 1.0e-5;

/// Number of surface crossings along `p1 -> p2`. Hits of triangles sharing
/// the crossed edge or vertex are merged into one.
fn count_crossings(mesh: &Mesh, p1: Vec3, p2: Vec3) -> usize {
    let d = p2 - p1;
    let length = d.length();
    if length == 0.0 {
        return 0;
    }

    let mut distances: Vec<f32> = (0..mesh.triangle_count())
        .filter_map(|i| {
            let [a, b, c] = mesh.triangle_vertices(i);
            segment_triangle_fraction(a, b, c, p1, d).map(|t| t * length)
        })
        .collect();
    distances.sort_by(|a, b| a.total_cmp(b));
    distances.dedup_by(|next, kept| *next - *kept < CROSSING_MERGE_DISTANCE);
    distances.len()
}

/// Fraction at which `p1 + t d`, `t` in `[0, 1]`, crosses triangle `abc`.
fn segment_triangle_fraction(a: Vec3, b: Vec3, c: Vec3, p1: Vec3, d: Vec3) -> Option<f32> {
    let n = (b - a).cross(c - a);
    let area2 = n.length();
    if area2 < EPSILON {
        return None;
    }
    let n = n / area2;

    let den = n.dot(d);
    if den == 0.0 {
        return None;
    }
    let t = n.dot(a - p1) / den;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }

    let w = barycentric_triangle(a, b, c, p1 + t * d);
    let slack = -CROSSING_BARYCENTRIC_SLACK * w[3];
    (w[0] >= slack && w[1] >= slack && w[2] >= slack).then_some(t)
}

/// Parity test toward five fixed far points; inside if three agree.
fn is_point_inside_mesh(mesh: &Mesh, point: Vec3, far_distance: f32) -> bool {
    let is_inside = |far_point: Vec3| count_crossings(mesh, point, far_point) % 2 == 1;

    let f = far_distance;
    let far_points = [
        Vec3::new(f, 0.0, 0.0),
        Vec3::new(0.0, f, 0.0),
        Vec3::new(0.0, 0.0, f),
        Vec3::new(f, 0.0, f),
        Vec3::new(-f, f, 0.0),
    ];

    let mut inside = 0;
    for far_point in far_points {
        if inside >= 3 {
            break;
        }
        if is_inside(far_point) {
            inside += 1;
        }
    }
    inside >= 3
}

fn signed_distance(mesh: &Mesh, point: Vec3, far_distance: f32) -> f32 {
    let mut closest_sq = f32::MAX;
    for i in 0..mesh.triangle_count() {
        let [a, b, c] = mesh.triangle_vertices(i);
        let (q, _) = closest_point_on_triangle(a, b, c, point);
        closest_sq = closest_sq.min(q.distance_squared(point));
    }
    let distance = closest_sq.sqrt();
    if is_point_inside_mesh(mesh, point, far_distance) {
        -distance
    } else {
        distance
    }
}

#[cfg(not(feature = "parallel"))]
fn compute_distances(mesh: &Mesh, grid: &VoxelGrid, far_distance: f32) -> Vec<f32> {
    let total = grid.voxel_count();
    let mut values = vec![0.0; total];
    let mut done = 0usize;
    let mut last_progress = 0.0_f32;

    for k in 0..grid.depth() {
        for j in 0..grid.height() {
            for i in 0..grid.width() {
                let p = grid.voxel_position(i, j, k);
                values[grid.voxel_index(i, j, k)] = signed_distance(mesh, p, far_distance);

                done += 1;
                let progress = 100.0 * done as f32 / total as f32;
                if progress - last_progress >= 1.0 {
                    log::info!("computing distances... {:.0}% - {}/{}", progress, done, total);
                    last_progress = progress;
                }
            }
        }
    }
    values
}

#[cfg(feature = "parallel")]
fn compute_distances(mesh: &Mesh, grid: &VoxelGrid, far_distance: f32) -> Vec<f32> {
    use rayon::prelude::*;

    let (w, h) = (grid.width(), grid.height());
    (0..grid.voxel_count())
        .into_par_iter()
        .map(|index| {
            let i = index % w;
            let j = (index / w) % h;
            let k = index / (w * h);
            signed_distance(mesh, grid.voxel_position(i, j, k), far_distance)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_geometry::box_mesh;

    #[test]
    fn test_grid_dimensions_follow_padding_and_cell_size() {
        let mesh = box_mesh(Vec3::splat(0.5));
        let sdf = Sdf::build(&mesh, Vec3::splat(0.5), 0.5);
        let grid = sdf.voxel_grid();
        // Padded box is 2 wide: 4 cells, 5 voxels per axis.
        assert_eq!((grid.width(), grid.height(), grid.depth()), (5, 5, 5));
        assert_eq!(grid.cell_size(), Vec3::splat(0.5));
    }

    #[test]
    fn test_tiny_mesh_still_gets_two_voxels() {
        let mesh = box_mesh(Vec3::splat(0.01));
        let sdf = Sdf::build(&mesh, Vec3::splat(10.0), 0.0);
        let grid = sdf.voxel_grid();
        assert_eq!((grid.width(), grid.height(), grid.depth()), (2, 2, 2));
    }

    #[test]
    fn test_outside_voxels_are_positive_corner_distance() {
        let mesh = box_mesh(Vec3::splat(0.5));
        let sdf = Sdf::build(&mesh, Vec3::splat(0.5), 0.5);
        // Grid corner (-1,-1,-1) to the box corner (-0.5,-0.5,-0.5).
        let expected = (3.0_f32 * 0.25).sqrt();
        assert!((sdf.voxel_grid().voxel(0, 0, 0) - expected).abs() < 1e-5);
    }

    #[test]
    fn test_crossing_through_shared_edge_counts_once() {
        let mesh = box_mesh(Vec3::splat(0.5));
        // Through the +x face diagonal.
        assert_eq!(count_crossings(&mesh, Vec3::ZERO, Vec3::new(8.0, 0.0, 0.0)), 1);
        // Through the cube edge at x = 0.5, z = 0.5.
        assert_eq!(count_crossings(&mesh, Vec3::ZERO, Vec3::new(8.0, 0.0, 8.0)), 1);
        // In and out again.
        assert_eq!(count_crossings(&mesh, Vec3::new(-2.0, 0.0, 0.0), Vec3::new(8.0, 0.0, 0.0)), 2);
        assert_eq!(count_crossings(&mesh, Vec3::new(2.0, 0.0, 0.0), Vec3::new(8.0, 0.0, 0.0)), 0);
    }

    #[test]
    fn test_cube_centre_is_inside_on_symmetry_axes() {
        let mesh = box_mesh(Vec3::splat(0.5));
        assert!(is_point_inside_mesh(&mesh, Vec3::ZERO, 8.0));
        assert!(!is_point_inside_mesh(&mesh, Vec3::new(0.0, 0.9, 0.0), 8.0));
    }
}
