//! World-to-screen projection.

use nalgebra::{Isometry3, Perspective3, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Maps a world-space point to screen coordinates (pixels, origin top-left,
/// y down). `None` when the point has no screen position, e.g. it lies behind
/// the viewer.
pub trait ScreenProjector {
    fn project(&self, world: [f64; 3]) -> Option<[f64; 2]>;
}

impl<F> ScreenProjector for F
where
    F: Fn([f64; 3]) -> Option<[f64; 2]>,
{
    fn project(&self, world: [f64; 3]) -> Option<[f64; 2]> {
        self(world)
    }
}

/// A pinhole perspective camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub eye: [f64; 3],
    pub target: [f64; 3],
    pub up: [f64; 3],
    pub fov_y_degrees: f64,
    /// Viewport width and height in pixels.
    pub viewport: [f64; 2],
    pub near: f64,
    pub far: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: [0.0, 0.0, 10.0],
            target: [0.0; 3],
            up: [0.0, 1.0, 0.0],
            fov_y_degrees: 45.0,
            viewport: [800.0, 600.0],
            near: 0.01,
            far: 10_000.0,
        }
    }
}

impl Camera {
    /// Reject cameras that have no well-defined projection.
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |reason: String| Err(EngineError::Camera { reason });
        let finite = self
            .eye
            .iter()
            .chain(&self.target)
            .chain(&self.up)
            .chain(&self.viewport)
            .chain([&self.fov_y_degrees, &self.near, &self.far])
            .all(|v| v.is_finite());
        if !finite {
            return invalid("non-finite value".to_string());
        }
        if !(self.near > 0.0 && self.near < self.far) {
            return invalid(format!("need 0 < near < far, got near {} far {}", self.near, self.far));
        }
        if !(self.fov_y_degrees > 0.0 && self.fov_y_degrees < 180.0) {
            return invalid(format!("field of view {} outside (0, 180)", self.fov_y_degrees));
        }
        if !(self.viewport[0] > 0.0 && self.viewport[1] > 0.0) {
            return invalid(format!("empty viewport {:?}", self.viewport));
        }
        let forward = Vector3::from(self.target) - Vector3::from(self.eye);
        if forward.norm() == 0.0 {
            return invalid("eye and target coincide".to_string());
        }
        if forward.cross(&Vector3::from(self.up)).norm() == 0.0 {
            return invalid("up is parallel to the view direction".to_string());
        }
        Ok(())
    }

    fn view(&self) -> Isometry3<f64> {
        Isometry3::look_at_rh(
            &Point3::from(self.eye),
            &Point3::from(self.target),
            &Vector3::from(self.up),
        )
    }

    fn perspective(&self) -> Perspective3<f64> {
        let [w, h] = self.viewport;
        Perspective3::new(w / h, self.fov_y_degrees.to_radians(), self.near, self.far)
    }
}

impl ScreenProjector for Camera {
    fn project(&self, world: [f64; 3]) -> Option<[f64; 2]> {
        if self.validate().is_err() {
            return None;
        }
        let [w, h] = self.viewport;
        let in_view = self.view().transform_point(&Point3::from(world));
        // The camera looks down -Z in view space.
        if in_view.z > -self.near {
            return None;
        }
        let ndc = self.perspective().project_point(&in_view);
        if !(ndc.x.is_finite() && ndc.y.is_finite()) {
            return None;
        }
        Some([(ndc.x + 1.0) / 2.0 * w, (1.0 - ndc.y) / 2.0 * h])
    }
}
