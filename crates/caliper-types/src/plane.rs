use serde::{Deserialize, Serialize};

/// A principal coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Component index into an `[x, y, z]` array.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(self) -> [f64; 3] {
        let mut v = [0.0; 3];
        v[self.index()] = 1.0;
        v
    }

    /// The two remaining axes, in cyclic order.
    pub fn others(self) -> (Axis, Axis) {
        match self {
            Axis::X => (Axis::Y, Axis::Z),
            Axis::Y => (Axis::Z, Axis::X),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }
}

/// An infinite axis-aligned cutting plane `p[axis] = offset`.
///
/// The plane's outward normal is the positive axis direction. Sectioning keeps
/// the material behind the plane (`p[axis] <= offset`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionPlane {
    pub axis: Axis,
    pub offset: f64,
}

impl SectionPlane {
    pub fn new(axis: Axis, offset: f64) -> Self {
        Self { axis, offset }
    }

    /// Positive on the discarded side, negative on the kept side.
    pub fn signed_distance(&self, p: &[f64; 3]) -> f64 {
        p[self.axis.index()] - self.offset
    }
}
