//! Solid builders on top of truck's sweep and face-attachment API.
//!
//! truck has no built-in box or polyhedron constructor, so boxes are successive
//! sweeps and meshes are stitched face by face from shared edges.

use std::collections::HashMap;

use truck_modeling::builder;
use truck_modeling::geometry::{Curve, Line};
use truck_modeling::topology::{Edge, Shell, Solid, Vertex, Wire};
use truck_modeling::{Point3, Vector3};

use crate::types::KernelError;

/// Create an axis-aligned box solid spanning `min` to `max` via successive
/// translational sweeps.
pub fn make_box(min: [f64; 3], max: [f64; 3]) -> Result<Solid, KernelError> {
    let size = [max[0] - min[0], max[1] - min[1], max[2] - min[2]];
    if size.iter().any(|s| !s.is_finite() || *s <= 0.0) {
        return Err(KernelError::InvalidShape {
            reason: format!("box extents must be positive, got {:?}", size),
        });
    }
    let v = builder::vertex(Point3::new(min[0], min[1], min[2]));
    let edge = builder::tsweep(&v, Vector3::new(size[0], 0.0, 0.0));
    let face = builder::tsweep(&edge, Vector3::new(0.0, size[1], 0.0));
    Ok(builder::tsweep(&face, Vector3::new(0.0, 0.0, size[2])))
}

/// Stitch a closed polyhedral solid from an outward-oriented polygon mesh.
///
/// Every undirected mesh edge becomes one truck edge; faces traversing it in
/// the opposite direction use its inverse so the shell closes.
pub fn solid_from_polygons(
    vertices: &[[f64; 3]],
    faces: &[Vec<usize>],
) -> Result<Solid, KernelError> {
    if faces.is_empty() {
        return Err(KernelError::InvalidShape {
            reason: "mesh has no faces".to_string(),
        });
    }
    let points: Vec<Point3> = vertices
        .iter()
        .map(|p| Point3::new(p[0], p[1], p[2]))
        .collect();
    let truck_vertices: Vec<Vertex> = points.iter().map(|&p| builder::vertex(p)).collect();
    let mut edges: HashMap<(usize, usize), Edge> = HashMap::new();

    let mut shell_faces = Vec::with_capacity(faces.len());
    for (face_idx, face) in faces.iter().enumerate() {
        if face.len() < 3 {
            return Err(KernelError::InvalidShape {
                reason: format!("face {} has fewer than 3 vertices", face_idx),
            });
        }
        let mut wire_edges = Vec::with_capacity(face.len());
        for i in 0..face.len() {
            let a = face[i];
            let b = face[(i + 1) % face.len()];
            if a >= points.len() || b >= points.len() {
                return Err(KernelError::InvalidShape {
                    reason: format!("face {} references a missing vertex", face_idx),
                });
            }
            let key = (a.min(b), a.max(b));
            let edge = edges.entry(key).or_insert_with(|| {
                let (lo, hi) = key;
                Edge::new(
                    &truck_vertices[lo],
                    &truck_vertices[hi],
                    Curve::Line(Line(points[lo], points[hi])),
                )
            });
            if a < b {
                wire_edges.push(edge.clone());
            } else {
                wire_edges.push(edge.inverse());
            }
        }
        let wire = Wire::from_iter(wire_edges);
        let planar = builder::try_attach_plane(&[wire]).map_err(|e| KernelError::InvalidShape {
            reason: format!("face {} is not planar: {}", face_idx, e),
        })?;
        shell_faces.push(planar);
    }

    let shell: Shell = shell_faces.into_iter().collect();
    Solid::try_new(vec![shell]).map_err(|e| KernelError::InvalidShape {
        reason: format!("mesh does not bound a closed solid: {}", e),
    })
}
