//! Nearest-primitive search in screen space.
//!
//! Every snapshot vertex is moved to world space on each pick; candidates are
//! compared by squared 2D distance to the cursor. A linear scan per pick, no
//! spatial index.

use caliper_types::{MeshSnapshot, PrimitiveKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::geometry;
use crate::projector::ScreenProjector;
use crate::transform::{self, RigidTransform};

/// The primitive under the cursor, with world-space coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PickResult {
    Vertex {
        index: usize,
        position: [f64; 3],
    },
    Edge {
        index: usize,
        vertices: [usize; 2],
        endpoints: [[f64; 3]; 2],
    },
    Face {
        index: usize,
        vertices: Vec<usize>,
        positions: Vec<[f64; 3]>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PickOutcome {
    Found(PickResult),
    NotFound,
}

/// Find the primitive of `kind` nearest to `cursor`.
///
/// Without a projector the first primitive in snapshot order is returned.
/// Candidates the projector cannot place are skipped; ties keep the earliest.
#[instrument(skip_all, fields(kind = ?kind))]
pub fn pick(
    cursor: [f64; 2],
    snapshot: &MeshSnapshot,
    transform: &RigidTransform,
    kind: PrimitiveKind,
    projector: Option<&dyn ScreenProjector>,
) -> PickOutcome {
    let world: Vec<[f64; 3]> = snapshot
        .vertices()
        .iter()
        .map(|p| transform::apply(transform, p))
        .collect();

    let found = match kind {
        PrimitiveKind::Vertex => nearest(world.iter().copied(), cursor, projector).map(|index| {
            PickResult::Vertex {
                index,
                position: world[index],
            }
        }),
        PrimitiveKind::Edge => {
            let midpoints = snapshot
                .edges()
                .iter()
                .map(|&[a, b]| geometry::midpoint(&world[a], &world[b]));
            nearest(midpoints, cursor, projector).map(|index| {
                let [a, b] = snapshot.edges()[index];
                PickResult::Edge {
                    index,
                    vertices: [a, b],
                    endpoints: [world[a], world[b]],
                }
            })
        }
        PrimitiveKind::Face => {
            let centroids = snapshot.faces().iter().map(|face| {
                let points: Vec<[f64; 3]> = face.iter().map(|&i| world[i]).collect();
                geometry::centroid(&points)
            });
            nearest(centroids, cursor, projector).map(|index| {
                let face = &snapshot.faces()[index];
                PickResult::Face {
                    index,
                    vertices: face.clone(),
                    positions: face.iter().map(|&i| world[i]).collect(),
                }
            })
        }
    };

    match found {
        Some(result) => {
            debug!(?result, "picked");
            PickOutcome::Found(result)
        }
        None => PickOutcome::NotFound,
    }
}

/// Index of the candidate whose projection is closest to `cursor`.
fn nearest<I>(candidates: I, cursor: [f64; 2], projector: Option<&dyn ScreenProjector>) -> Option<usize>
where
    I: Iterator<Item = [f64; 3]>,
{
    let mut candidates = candidates.enumerate();
    let Some(projector) = projector else {
        return candidates.next().map(|(i, _)| i);
    };
    let mut best: Option<(usize, f64)> = None;
    for (i, world) in candidates {
        let Some([sx, sy]) = projector.project(world) else {
            continue;
        };
        let d2 = (sx - cursor[0]).powi(2) + (sy - cursor[1]).powi(2);
        if !d2.is_finite() {
            continue;
        }
        if best.map_or(true, |(_, b)| d2 < b) {
            best = Some((i, d2));
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Orthographic view down -Z: screen = world XY.
    fn top_down(p: [f64; 3]) -> Option<[f64; 2]> {
        Some([p[0], p[1]])
    }

    fn square() -> MeshSnapshot {
        MeshSnapshot::new(
            vec![
                [0.0, 0.0, 0.0],
                [10.0, 0.0, 0.0],
                [10.0, 10.0, 0.0],
                [0.0, 10.0, 0.0],
            ],
            vec![vec![0, 1, 2], vec![0, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn nearest_vertex_in_world_space() {
        let snap = square();
        let shift = RigidTransform::translation(100.0, 0.0, 0.0);
        let outcome = pick([109.0, 1.0], &snap, &shift, PrimitiveKind::Vertex, Some(&top_down));
        assert_eq!(
            outcome,
            PickOutcome::Found(PickResult::Vertex {
                index: 1,
                position: [110.0, 0.0, 0.0]
            })
        );
    }

    #[test]
    fn nearest_edge_by_midpoint() {
        let snap = square();
        // Edges: [0,1], [1,2], [2,0], [2,3], [3,0]
        let outcome = pick(
            [5.0, 9.0],
            &snap,
            &RigidTransform::identity(),
            PrimitiveKind::Edge,
            Some(&top_down),
        );
        match outcome {
            PickOutcome::Found(PickResult::Edge { index, vertices, .. }) => {
                assert_eq!(index, 3);
                assert_eq!(vertices, [2, 3]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn edge_ties_keep_first_in_order() {
        let snap = square();
        // Flatten x so midpoints of [1,2], [2,0] and [3,0] all land on (0, 5).
        let flat_x = |p: [f64; 3]| Some([0.0, p[1]]);
        let outcome = pick(
            [0.0, 5.0],
            &snap,
            &RigidTransform::identity(),
            PrimitiveKind::Edge,
            Some(&flat_x),
        );
        assert!(matches!(
            outcome,
            PickOutcome::Found(PickResult::Edge { index: 1, .. })
        ));
    }

    #[test]
    fn nearest_face_by_centroid() {
        let snap = square();
        let outcome = pick(
            [2.0, 8.0],
            &snap,
            &RigidTransform::identity(),
            PrimitiveKind::Face,
            Some(&top_down),
        );
        match outcome {
            PickOutcome::Found(PickResult::Face {
                index, vertices, ..
            }) => {
                assert_eq!(index, 1);
                assert_eq!(vertices, vec![0, 2, 3]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn no_projector_returns_first_primitive() {
        let snap = square();
        let outcome = pick([1e6, 1e6], &snap, &RigidTransform::identity(), PrimitiveKind::Face, None);
        assert!(matches!(
            outcome,
            PickOutcome::Found(PickResult::Face { index: 0, .. })
        ));
    }

    #[test]
    fn unprojectable_candidates_are_skipped() {
        let snap = square();
        // Only vertices with x > 5 are visible.
        let half = |p: [f64; 3]| if p[0] > 5.0 { Some([p[0], p[1]]) } else { None };
        let outcome = pick([0.0, 0.0], &snap, &RigidTransform::identity(), PrimitiveKind::Vertex, Some(&half));
        assert!(matches!(
            outcome,
            PickOutcome::Found(PickResult::Vertex { index: 1, .. })
        ));

        let blind = |_: [f64; 3]| -> Option<[f64; 2]> { None };
        let outcome = pick([0.0, 0.0], &snap, &RigidTransform::identity(), PrimitiveKind::Vertex, Some(&blind));
        assert_eq!(outcome, PickOutcome::NotFound);
    }

    #[test]
    fn empty_snapshot_is_not_found() {
        let outcome = pick(
            [0.0, 0.0],
            &MeshSnapshot::empty(),
            &RigidTransform::identity(),
            PrimitiveKind::Edge,
            None,
        );
        assert_eq!(outcome, PickOutcome::NotFound);
    }
}
