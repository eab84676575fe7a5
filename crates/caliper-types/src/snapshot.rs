use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::bounds::Aabb;

/// Errors raised while building a snapshot.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SnapshotError {
    #[error("face {face} references vertex {vertex}, but only {vertex_count} vertices exist")]
    IndexOutOfRange {
        face: usize,
        vertex: usize,
        vertex_count: usize,
    },

    #[error("vertex {index} has a non-finite coordinate")]
    NonFiniteVertex { index: usize },
}

/// Immutable vertex/face/edge arrays of a loaded model, in model space.
///
/// Faces keep their vertex order. Edges are derived once at construction:
/// each face contributes its successive vertex pairs (wrapping last to first),
/// and an undirected pair is stored only on first encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshSnapshot {
    vertices: Vec<[f64; 3]>,
    faces: Vec<Vec<usize>>,
    edges: Vec<[usize; 2]>,
}

/// Summary counts and dimensions of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshInfo {
    pub vertex_count: usize,
    pub face_count: usize,
    pub edge_count: usize,
    /// Bounding box size along X, Y, Z. `None` for an empty mesh.
    pub extents: Option<[f64; 3]>,
}

impl MeshSnapshot {
    pub fn new(vertices: Vec<[f64; 3]>, faces: Vec<Vec<usize>>) -> Result<Self, SnapshotError> {
        for (index, v) in vertices.iter().enumerate() {
            if v.iter().any(|c| !c.is_finite()) {
                return Err(SnapshotError::NonFiniteVertex { index });
            }
        }
        for (face_idx, face) in faces.iter().enumerate() {
            if let Some(&bad) = face.iter().find(|&&vi| vi >= vertices.len()) {
                return Err(SnapshotError::IndexOutOfRange {
                    face: face_idx,
                    vertex: bad,
                    vertex_count: vertices.len(),
                });
            }
        }
        let edges = derive_edges(&faces);
        Ok(Self {
            vertices,
            faces,
            edges,
        })
    }

    /// A snapshot with no geometry at all.
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn vertices(&self) -> &[[f64; 3]] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Vec<usize>] {
        &self.faces
    }

    pub fn edges(&self) -> &[[usize; 2]] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Bounding box of the untransformed vertices.
    pub fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices.iter())
    }

    pub fn info(&self) -> MeshInfo {
        MeshInfo {
            vertex_count: self.vertices.len(),
            face_count: self.faces.len(),
            edge_count: self.edges.len(),
            extents: self.bounding_box().map(|b| b.extents()),
        }
    }
}

fn derive_edges(faces: &[Vec<usize>]) -> Vec<[usize; 2]> {
    let mut seen: HashMap<(usize, usize), usize> = HashMap::new();
    let mut edges = Vec::new();
    for face in faces {
        let n = face.len();
        if n < 2 {
            continue;
        }
        for i in 0..n {
            let a = face[i];
            let b = face[(i + 1) % n];
            if a == b {
                continue;
            }
            let key = (a.min(b), a.max(b));
            if !seen.contains_key(&key) {
                seen.insert(key, edges.len());
                edges.push([a, b]);
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn edges_are_deduplicated() {
        let snap = tetra();
        assert_eq!(snap.edges().len(), 6);
        let mut keys: Vec<_> = snap
            .edges()
            .iter()
            .map(|&[a, b]| (a.min(b), a.max(b)))
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 6);
    }

    #[test]
    fn edges_follow_first_encounter_order() {
        let snap = tetra();
        assert_eq!(snap.edges()[0], [0, 2]);
        assert_eq!(snap.edges()[1], [2, 1]);
        assert_eq!(snap.edges()[2], [1, 0]);
    }

    #[test]
    fn out_of_range_face_rejected() {
        let err = MeshSnapshot::new(vec![[0.0; 3]; 2], vec![vec![0, 1, 2]]).unwrap_err();
        assert_eq!(
            err,
            SnapshotError::IndexOutOfRange {
                face: 0,
                vertex: 2,
                vertex_count: 2
            }
        );
    }

    #[test]
    fn non_finite_vertex_rejected() {
        let err = MeshSnapshot::new(vec![[0.0, f64::NAN, 0.0]], vec![]).unwrap_err();
        assert_eq!(err, SnapshotError::NonFiniteVertex { index: 0 });
    }

    #[test]
    fn info_reports_counts_and_extents() {
        let info = tetra().info();
        assert_eq!(info.vertex_count, 4);
        assert_eq!(info.face_count, 4);
        assert_eq!(info.edge_count, 6);
        assert_eq!(info.extents, Some([1.0, 1.0, 1.0]));
        assert_eq!(MeshSnapshot::empty().info().extents, None);
    }
}
