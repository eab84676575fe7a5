//! Derived properties of a picked primitive.
//!
//! Values keep full precision; rounding happens only when a [`Report`] is
//! formatted.
//!
//! [`Report`]: crate::report::Report

use std::collections::HashSet;

use caliper_types::MeshSnapshot;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::geometry;
use crate::picker::PickResult;
use crate::transform::{self, RigidTransform};

/// Length of an edge touching a measured vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeLength {
    pub edge: usize,
    pub other_vertex: usize,
    pub length: f64,
}

/// Area of a face related to the measured primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceArea {
    pub face: usize,
    pub area: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexMeasurement {
    pub index: usize,
    pub position: [f64; 3],
    /// Number of edges containing the vertex.
    pub valence: usize,
    pub incident_edges: Vec<EdgeLength>,
    pub incident_faces: Vec<FaceArea>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeMeasurement {
    pub index: usize,
    pub vertices: [usize; 2],
    pub start: [f64; 3],
    pub end: [f64; 3],
    pub midpoint: [f64; 3],
    /// `end - start`, not normalized.
    pub direction: [f64; 3],
    pub length: f64,
    /// Every face containing both endpoints; more than two in non-manifold meshes.
    pub adjacent_faces: Vec<FaceArea>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceMeasurement {
    pub index: usize,
    pub vertices: Vec<usize>,
    pub positions: Vec<[f64; 3]>,
    pub area: f64,
    pub perimeter: f64,
    pub normal: [f64; 3],
    pub centroid: [f64; 3],
    /// Lengths of the face's edges in winding order, closing edge last.
    pub edge_lengths: Vec<f64>,
    pub min_edge: f64,
    pub max_edge: f64,
    pub average_edge: f64,
    /// `max_edge / min_edge`, or 0 when the shortest edge has zero length.
    pub aspect_ratio: f64,
    /// Faces sharing at least two vertices with this one.
    pub neighbours: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Measurement {
    Vertex(VertexMeasurement),
    Edge(EdgeMeasurement),
    Face(FaceMeasurement),
}

/// Measure a picked primitive of `snapshot` under `transform`.
pub fn measure(
    pick: &PickResult,
    snapshot: &MeshSnapshot,
    transform: &RigidTransform,
    config: &EngineConfig,
) -> Measurement {
    let world = |i: usize| transform::apply(transform, &snapshot.vertices()[i]);
    let face_area = |face: usize| {
        let points: Vec<[f64; 3]> = snapshot.faces()[face].iter().map(|&i| world(i)).collect();
        FaceArea {
            face,
            area: geometry::face_area(&points),
        }
    };

    match pick {
        PickResult::Vertex { index, position } => {
            let index = *index;
            let incident_edges: Vec<EdgeLength> = snapshot
                .edges()
                .iter()
                .enumerate()
                .filter(|(_, e)| e.contains(&index))
                .map(|(edge, &[a, b])| {
                    let other_vertex = if a == index { b } else { a };
                    EdgeLength {
                        edge,
                        other_vertex,
                        length: geometry::distance(position, &world(other_vertex)),
                    }
                })
                .collect();
            let incident_faces = snapshot
                .faces()
                .iter()
                .enumerate()
                .filter(|(_, f)| f.contains(&index))
                .map(|(face, _)| face_area(face))
                .collect();
            Measurement::Vertex(VertexMeasurement {
                index,
                position: *position,
                valence: incident_edges.len(),
                incident_edges,
                incident_faces,
            })
        }
        PickResult::Edge {
            index,
            vertices,
            endpoints,
        } => {
            let [a, b] = *vertices;
            let [start, end] = *endpoints;
            let adjacent_faces = snapshot
                .faces()
                .iter()
                .enumerate()
                .filter(|(_, f)| f.contains(&a) && f.contains(&b))
                .map(|(face, _)| face_area(face))
                .collect();
            Measurement::Edge(EdgeMeasurement {
                index: *index,
                vertices: [a, b],
                start,
                end,
                midpoint: geometry::midpoint(&start, &end),
                direction: geometry::sub(&end, &start),
                length: geometry::distance(&start, &end),
                adjacent_faces,
            })
        }
        PickResult::Face {
            index,
            vertices,
            positions,
        } => Measurement::Face(measure_face(*index, vertices, positions, snapshot, config)),
    }
}

fn measure_face(
    index: usize,
    vertices: &[usize],
    positions: &[[f64; 3]],
    snapshot: &MeshSnapshot,
    config: &EngineConfig,
) -> FaceMeasurement {
    let n = positions.len();
    let edge_lengths: Vec<f64> = if n < 2 {
        Vec::new()
    } else {
        (0..n)
            .map(|i| geometry::distance(&positions[i], &positions[(i + 1) % n]))
            .collect()
    };
    let (min_edge, max_edge, average_edge) = if edge_lengths.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        (
            edge_lengths.iter().copied().fold(f64::INFINITY, f64::min),
            edge_lengths.iter().copied().fold(0.0, f64::max),
            edge_lengths.iter().sum::<f64>() / edge_lengths.len() as f64,
        )
    };
    let aspect_ratio = if min_edge > 0.0 { max_edge / min_edge } else { 0.0 };

    let own: HashSet<usize> = vertices.iter().copied().collect();
    let neighbours = snapshot
        .faces()
        .iter()
        .enumerate()
        .filter(|&(other, face)| {
            other != index && {
                let shared: HashSet<usize> =
                    face.iter().copied().filter(|v| own.contains(v)).collect();
                shared.len() >= 2
            }
        })
        .map(|(other, _)| other)
        .collect();

    FaceMeasurement {
        index,
        vertices: vertices.to_vec(),
        positions: positions.to_vec(),
        area: geometry::face_area(positions),
        perimeter: geometry::perimeter(positions),
        normal: geometry::face_normal(positions, config.normal_epsilon),
        centroid: geometry::centroid(positions),
        edge_lengths,
        min_edge,
        max_edge,
        average_edge,
        aspect_ratio,
        neighbours,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::picker::{pick, PickOutcome};
    use caliper_types::PrimitiveKind;

    fn tetra() -> MeshSnapshot {
        MeshSnapshot::new(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
            ],
            vec![vec![0, 2, 1], vec![0, 1, 3], vec![1, 2, 3], vec![2, 0, 3]],
        )
        .unwrap()
    }

    fn first(snap: &MeshSnapshot, kind: PrimitiveKind) -> PickResult {
        match pick([0.0, 0.0], snap, &RigidTransform::identity(), kind, None) {
            PickOutcome::Found(p) => p,
            PickOutcome::NotFound => panic!("nothing to pick"),
        }
    }

    #[test]
    fn vertex_properties() {
        let snap = tetra();
        let m = measure(
            &first(&snap, PrimitiveKind::Vertex),
            &snap,
            &RigidTransform::identity(),
            &EngineConfig::default(),
        );
        let Measurement::Vertex(v) = m else {
            panic!("expected vertex measurement");
        };
        assert_eq!(v.index, 0);
        assert_eq!(v.valence, 3);
        assert!(v.incident_edges.iter().all(|e| (e.length - 1.0).abs() < 1e-12));
        let faces: Vec<usize> = v.incident_faces.iter().map(|f| f.face).collect();
        assert_eq!(faces, vec![0, 1, 3]);
        assert_relative_eq!(v.incident_faces[0].area, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn edge_properties() {
        let snap = tetra();
        let m = measure(
            &first(&snap, PrimitiveKind::Edge),
            &snap,
            &RigidTransform::identity(),
            &EngineConfig::default(),
        );
        let Measurement::Edge(e) = m else {
            panic!("expected edge measurement");
        };
        // First edge is [0, 2]
        assert_eq!(e.vertices, [0, 2]);
        assert_eq!(e.length, 1.0);
        assert_eq!(e.direction, [0.0, 1.0, 0.0]);
        assert_eq!(e.midpoint, [0.0, 0.5, 0.0]);
        let faces: Vec<usize> = e.adjacent_faces.iter().map(|f| f.face).collect();
        assert_eq!(faces, vec![0, 3]);
    }

    #[test]
    fn slanted_face_properties() {
        let snap = tetra();
        let pick = PickResult::Face {
            index: 2,
            vertices: vec![1, 2, 3],
            positions: vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        };
        let Measurement::Face(f) = measure(&pick, &snap, &RigidTransform::identity(), &EngineConfig::default())
        else {
            panic!("expected face measurement");
        };
        // Equilateral triangle with side sqrt(2)
        assert_relative_eq!(f.area, 3f64.sqrt() / 2.0, epsilon = 1e-12);
        assert_relative_eq!(f.perimeter, 3.0 * 2f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(f.aspect_ratio, 1.0, epsilon = 1e-12);
        let k = 1.0 / 3f64.sqrt();
        for c in f.normal {
            assert_relative_eq!(c, k, epsilon = 1e-7);
        }
        assert_eq!(f.neighbours, vec![0, 1, 3]);
    }

    #[test]
    fn degenerate_face_has_zero_aspect_ratio() {
        let snap = MeshSnapshot::new(vec![[0.0; 3], [0.0; 3], [1.0, 0.0, 0.0]], vec![vec![0, 1, 2]]).unwrap();
        let Measurement::Face(f) = measure(
            &first(&snap, PrimitiveKind::Face),
            &snap,
            &RigidTransform::identity(),
            &EngineConfig::default(),
        ) else {
            panic!("expected face measurement");
        };
        assert_eq!(f.min_edge, 0.0);
        assert_eq!(f.aspect_ratio, 0.0);
        assert_eq!(f.area, 0.0);
    }
}
