//! Engine constants.
//!
//! ## Tunables vs. fixed constants
//!
//! Values that a host may want to tweak per body (contact stiffness, Baumgarte factor,
//! CG tolerance) are only the *defaults* here; the live values sit in
//! [`BodySettings`](crate::BodySettings). Everything else is fixed for the engine.

/// Default gravity acceleration (m/s^2) - negative Y direction
pub const GRAVITY: f32 = -9.8;

/// Small length used to reject degenerate directions and triangles.
pub const EPSILON: f32 = f32::EPSILON;

// =============================================================================
// COLLISION
// =============================================================================

/// Collision and constraint tolerance (m). Mesh triangle boxes are grown by this.
pub const LINEAR_SLOP: f32 = 0.005;

/// Fattening applied to every dynamic tree proxy (m).
pub const AABB_EXTENSION: f32 = 0.2;

/// Dynamic tree proxies are predicted this many displacements ahead.
pub const AABB_MULTIPLIER: f32 = 2.0;

// =============================================================================
// CONTACT DEFAULTS - copied into BodySettings::default()
// =============================================================================

/// Normal penalty stiffness (N/m)
pub const CONTACT_STIFFNESS: f32 = 1000.0;

/// Normal damping stiffness (N·s/m). Zero disables the damping term.
pub const CONTACT_DAMPING_STIFFNESS: f32 = 0.0;

/// Fraction of the penetration corrected per step.
pub const BAUMGARTE: f32 = 0.2;

/// Upper bound on the corrected penetration per step (m).
pub const MAX_CONTACT_LINEAR_CORRECTION: f32 = 0.2;

// =============================================================================
// SOLVER DEFAULTS
// =============================================================================

/// Relative residual tolerance for the conjugate gradient solve.
pub const CG_TOLERANCE: f32 = 1.0e-4;

/// The exact residual is recomputed every this many CG iterations.
pub const CG_RESIDUAL_REFRESH: usize = 50;
