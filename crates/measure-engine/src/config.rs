//! Engine tunables.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Tolerances and defaults for picking, measuring and sectioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-coordinate distance under which two picked points are the same point.
    pub duplicate_tolerance: f64,
    /// Added to the cross-product norm when normalizing face normals.
    pub normal_epsilon: f64,
    /// Chordal tolerance for tessellating section results.
    pub triangulation_tolerance: f64,
    /// Lower bound on the half-space box extent used for sectioning.
    pub min_half_space_extent: f64,
    /// A plane closer than this to the solid's bounding box faces misses it.
    pub plane_tolerance: f64,
    /// Decimal places in formatted reports.
    pub display_decimals: usize,
    /// Radius of the two-point marker spheres.
    pub marker_radius: f64,
    /// Translation per move command.
    pub move_step: f64,
    /// Rotation per rotate command (degrees).
    pub rotate_step_degrees: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            duplicate_tolerance: 1e-3,
            normal_epsilon: 1e-8,
            triangulation_tolerance: 0.1,
            min_half_space_extent: 1000.0,
            plane_tolerance: 1e-9,
            display_decimals: 2,
            marker_radius: 0.7,
            move_step: 10.0,
            rotate_step_degrees: 15.0,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON object; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json).map_err(|e| EngineError::Config {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the engine misbehave.
    pub fn validate(&self) -> Result<(), EngineError> {
        let positive = [
            ("triangulation_tolerance", self.triangulation_tolerance),
            ("min_half_space_extent", self.min_half_space_extent),
            ("marker_radius", self.marker_radius),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(EngineError::Config {
                    reason: format!("{} must be positive, got {}", name, value),
                });
            }
        }
        let non_negative = [
            ("duplicate_tolerance", self.duplicate_tolerance),
            ("normal_epsilon", self.normal_epsilon),
            ("plane_tolerance", self.plane_tolerance),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EngineError::Config {
                    reason: format!("{} must be non-negative, got {}", name, value),
                });
            }
        }
        Ok(())
    }
}
