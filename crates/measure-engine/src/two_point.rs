//! Two-point distance workflow: pick a vertex, pick another, get the distance.

use caliper_types::ModelId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry;

/// Opaque handle to a marker drawn by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerHandle(pub u64);

/// Renderer collaborator that draws transient marker spheres.
pub trait MarkerSink {
    fn add_marker(&mut self, center: [f64; 3], radius: f64) -> MarkerHandle;
    fn remove_marker(&mut self, handle: MarkerHandle);
}

/// What a pick did to the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TwoPointEvent {
    /// First point stored; waiting for the second.
    FirstPoint { index: usize, point: [f64; 3] },
    /// Second point accepted. The session is empty again.
    Distance {
        distance: f64,
        from: [f64; 3],
        to: [f64; 3],
    },
    /// Same vertex, or within tolerance of the stored point. Nothing changed.
    DuplicatePoint,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Picked {
    model: ModelId,
    index: usize,
    point: [f64; 3],
}

/// Holds at most one pending point between picks.
#[derive(Debug, Clone)]
pub struct TwoPointSession {
    first: Option<Picked>,
    markers: Vec<MarkerHandle>,
    tolerance: f64,
    marker_radius: f64,
}

impl TwoPointSession {
    pub fn new(tolerance: f64, marker_radius: f64) -> Self {
        Self {
            first: None,
            markers: Vec::new(),
            tolerance,
            marker_radius,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    /// World point of the pending first pick.
    pub fn pending(&self) -> Option<[f64; 3]> {
        self.first.map(|p| p.point)
    }

    pub fn markers(&self) -> &[MarkerHandle] {
        &self.markers
    }

    /// Offer a picked vertex: owning model, vertex index and world position.
    /// The two points may come from different models.
    pub fn offer(
        &mut self,
        model: ModelId,
        index: usize,
        point: [f64; 3],
        sink: &mut dyn MarkerSink,
    ) -> TwoPointEvent {
        match self.first {
            None => {
                self.markers.push(sink.add_marker(point, self.marker_radius));
                self.first = Some(Picked { model, index, point });
                debug!(index, "first point picked");
                TwoPointEvent::FirstPoint { index, point }
            }
            Some(first) => {
                let same_vertex = first.model == model && first.index == index;
                if same_vertex || self.coincident(&first.point, &point) {
                    debug!(index, "duplicate point rejected");
                    return TwoPointEvent::DuplicatePoint;
                }
                self.markers.push(sink.add_marker(point, self.marker_radius));
                let distance = geometry::distance(&first.point, &point);
                self.reset(sink);
                debug!(distance, "two-point distance");
                TwoPointEvent::Distance {
                    distance,
                    from: first.point,
                    to: point,
                }
            }
        }
    }

    /// Forget any pending point and remove all markers.
    pub fn reset(&mut self, sink: &mut dyn MarkerSink) {
        for handle in self.markers.drain(..) {
            sink.remove_marker(handle);
        }
        self.first = None;
    }

    fn coincident(&self, a: &[f64; 3], b: &[f64; 3]) -> bool {
        (0..3).all(|i| (a[i] - b[i]).abs() <= self.tolerance)
    }
}

/// A sink that records markers without drawing them.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    next: u64,
    pub live: Vec<(MarkerHandle, [f64; 3], f64)>,
}

impl MarkerSink for RecordingSink {
    fn add_marker(&mut self, center: [f64; 3], radius: f64) -> MarkerHandle {
        self.next += 1;
        let handle = MarkerHandle(self.next);
        self.live.push((handle, center, radius));
        handle
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        self.live.retain(|(h, _, _)| *h != handle);
    }
}
