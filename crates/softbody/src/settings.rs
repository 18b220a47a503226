//! Per-body solver and contact tunables.

use crate::constants::{
    BAUMGARTE, CG_TOLERANCE, CONTACT_DAMPING_STIFFNESS, CONTACT_STIFFNESS,
    MAX_CONTACT_LINEAR_CORRECTION,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables read by the force solver and the contact layer every step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodySettings {
    /// Normal penalty stiffness of particle-shape contacts (N/m).
    pub contact_stiffness: f32,
    /// Damping along the contact normal (N·s/m). Zero disables the term.
    pub contact_damping_stiffness: f32,
    /// Fraction of the penetration corrected per step.
    pub baumgarte: f32,
    /// Cap on the corrected penetration per step (m).
    pub max_contact_linear_correction: f32,
    /// Relative residual tolerance of the CG solve, in (0, 1).
    pub cg_tolerance: f32,
}

impl Default for BodySettings {
    fn default() -> Self {
        Self {
            contact_stiffness: CONTACT_STIFFNESS,
            contact_damping_stiffness: CONTACT_DAMPING_STIFFNESS,
            baumgarte: BAUMGARTE,
            max_contact_linear_correction: MAX_CONTACT_LINEAR_CORRECTION,
            cg_tolerance: CG_TOLERANCE,
        }
    }
}

impl BodySettings {
    /// Check the ranges the solver relies on.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.cg_tolerance > 0.0 && self.cg_tolerance < 1.0) {
            return Err(format!("cg tolerance must be in (0, 1), got {}", self.cg_tolerance));
        }
        if !(self.contact_stiffness >= 0.0 && self.contact_damping_stiffness >= 0.0) {
            return Err("contact stiffness and damping must be non-negative".to_string());
        }
        if !(self.baumgarte >= 0.0 && self.max_contact_linear_correction >= 0.0) {
            return Err("contact correction terms must be non-negative".to_string());
        }
        Ok(())
    }

    /// Save settings to a JSON file
    pub fn save_json(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load settings from a JSON file. Missing fields take their defaults;
    /// out-of-range values are an error.
    pub fn load_json(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&json)?;
        settings.validate()?;
        Ok(settings)
    }
}
