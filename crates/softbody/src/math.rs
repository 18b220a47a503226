//! Small vector/matrix helpers on top of glam.

use glam::{Mat3, Quat, Vec3};

/// Outer product `a * b^T`.
#[inline]
pub fn outer(a: Vec3, b: Vec3) -> Mat3 {
    Mat3::from_cols(a * b.x, a * b.y, a * b.z)
}

/// A unit vector orthogonal to the unit vector `n`.
#[inline]
pub fn perp(n: Vec3) -> Vec3 {
    // Drop the smallest component so the cross term is well conditioned.
    if n.x.abs() >= 0.577_350_26 {
        Vec3::new(n.y, -n.x, 0.0).normalize()
    } else {
        Vec3::new(0.0, n.z, -n.y).normalize()
    }
}

/// Geometric-mean friction mixing.
#[inline]
pub fn mix_friction(friction1: f32, friction2: f32) -> f32 {
    (friction1 * friction2).sqrt()
}

/// Rigid transform: rotate, then translate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
        }
    }

    /// Local to world.
    #[inline]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.rotation * p + self.translation
    }

    /// World to local.
    #[inline]
    pub fn inverse_transform_point(&self, p: Vec3) -> Vec3 {
        self.rotation.conjugate() * (p - self.translation)
    }

    #[inline]
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        self.rotation * v
    }

    #[inline]
    pub fn inverse_transform_vector(&self, v: Vec3) -> Vec3 {
        self.rotation.conjugate() * v
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
