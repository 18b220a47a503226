//! Collision geometry: primitives, barycentric queries, meshes, trees and
//! signed distance fields.
//!
//! Barycentric convention: weights are left unnormalised. For a segment AB the
//! weights of `Q` are `(QB.AB, -QA.AB, AB.AB)`; for a triangle ABC they are the
//! signed areas `((QB x QC).n, (QC x QA).n, (QA x QB).n, n.n)` with
//! `n = AB x AC`. A weight `<= 0` puts `Q` outside that vertex's half-space.

mod aabb;
mod dynamic_tree;
mod mesh;
mod sdf;
mod static_tree;
mod voxel_grid;

pub use aabb::Aabb;
pub use dynamic_tree::{DynamicTree, ProxyId};
pub use mesh::{Mesh, MeshTriangle};
pub use sdf::Sdf;
pub use static_tree::StaticTree;
pub use voxel_grid::VoxelGrid;

use crate::constants::EPSILON;
use glam::Vec3;

/// Sphere used as the probe in every narrow-phase query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Single contact point between a sphere and a shape.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SphereManifold {
    /// Closest point on the shape core (skin radius not included).
    pub point: Vec3,
    /// Unit normal pointing from the shape toward the sphere.
    pub normal: Vec3,
}

/// Segment `p1 -> p2`, clipped at `max_fraction`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayCastInput {
    pub p1: Vec3,
    pub p2: Vec3,
    pub max_fraction: f32,
}

impl RayCastInput {
    pub fn new(p1: Vec3, p2: Vec3) -> Self {
        Self {
            p1,
            p2,
            max_fraction: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayCastOutput {
    pub fraction: f32,
    /// Faces the ray origin.
    pub normal: Vec3,
}

/// Unnormalised barycentric weights of `q` on segment `ab`.
#[inline]
pub fn barycentric_segment(a: Vec3, b: Vec3, q: Vec3) -> [f32; 3] {
    let ab = b - a;
    let qa = a - q;
    let qb = b - q;
    [qb.dot(ab), -qa.dot(ab), ab.dot(ab)]
}

/// Unnormalised barycentric weights of `q` projected on triangle `abc`.
#[inline]
pub fn barycentric_triangle(a: Vec3, b: Vec3, c: Vec3, q: Vec3) -> [f32; 4] {
    let n = (b - a).cross(c - a);
    let qa = a - q;
    let qb = b - q;
    let qc = c - q;
    [
        qb.cross(qc).dot(n),
        qc.cross(qa).dot(n),
        qa.cross(qb).dot(n),
        n.dot(n),
    ]
}

pub fn closest_point_on_segment(a: Vec3, b: Vec3, q: Vec3) -> Vec3 {
    let w = barycentric_segment(a, b, q);
    if w[1] <= 0.0 {
        return a;
    }
    if w[0] <= 0.0 {
        return b;
    }
    debug_assert!(w[2] > 0.0);
    (w[0] * a + w[1] * b) / w[2]
}

/// Region in which the closest point of a triangle to a query point lies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriangleRegion {
    A,
    B,
    C,
    AB,
    BC,
    CA,
    Face,
}

/// Closest point on triangle `abc` to `q`, walking vertex, edge then face regions.
pub fn closest_point_on_triangle(a: Vec3, b: Vec3, c: Vec3, q: Vec3) -> (Vec3, TriangleRegion) {
    let w_ab = barycentric_segment(a, b, q);
    let w_bc = barycentric_segment(b, c, q);
    let w_ca = barycentric_segment(c, a, q);

    if w_ab[1] <= 0.0 && w_ca[0] <= 0.0 {
        return (a, TriangleRegion::A);
    }
    if w_ab[0] <= 0.0 && w_bc[1] <= 0.0 {
        return (b, TriangleRegion::B);
    }
    if w_bc[0] <= 0.0 && w_ca[1] <= 0.0 {
        return (c, TriangleRegion::C);
    }

    let w_abc = barycentric_triangle(a, b, c, q);

    if w_ab[0] > 0.0 && w_ab[1] > 0.0 && w_abc[3] * w_abc[2] <= 0.0 {
        return ((w_ab[0] * a + w_ab[1] * b) / w_ab[2], TriangleRegion::AB);
    }
    if w_bc[0] > 0.0 && w_bc[1] > 0.0 && w_abc[3] * w_abc[0] <= 0.0 {
        return ((w_bc[0] * b + w_bc[1] * c) / w_bc[2], TriangleRegion::BC);
    }
    if w_ca[0] > 0.0 && w_ca[1] > 0.0 && w_abc[3] * w_abc[1] <= 0.0 {
        return ((w_ca[0] * c + w_ca[1] * a) / w_ca[2], TriangleRegion::CA);
    }

    if w_abc[3] == 0.0 {
        // Degenerate triangle: every edge test failed, fall back to a vertex.
        return (a, TriangleRegion::A);
    }

    (
        (w_abc[0] * a + w_abc[1] * b + w_abc[2] * c) / w_abc[3],
        TriangleRegion::Face,
    )
}

/// Segment against triangle `abc`. Hits on the boundary count.
pub fn ray_cast_triangle(a: Vec3, b: Vec3, c: Vec3, input: &RayCastInput) -> Option<RayCastOutput> {
    let d = input.p2 - input.p1;
    if d.length_squared() < EPSILON * EPSILON {
        return None;
    }

    let n = (b - a).cross(c - a);
    if n.length_squared() < EPSILON * EPSILON {
        return None;
    }
    let n = n.normalize();

    let num = n.dot(a - input.p1);
    let den = n.dot(d);
    if den == 0.0 {
        return None;
    }

    let t = num / den;
    if t < 0.0 || input.max_fraction < t {
        return None;
    }

    let q = input.p1 + t * d;
    let w = barycentric_triangle(a, b, c, q);
    if w[0] >= 0.0 && w[1] >= 0.0 && w[2] >= 0.0 {
        // The ray starts behind the plane when num > 0.
        let normal = if num > 0.0 { -n } else { n };
        return Some(RayCastOutput {
            fraction: t,
            normal,
        });
    }
    None
}
