//! Tessellation into welded triangle meshes.
//!
//! Wraps truck-meshalgo for B-rep solids and provides the welding builder
//! shared with the polyhedral kernel, so coincident corners of adjacent faces
//! end up as one vertex in the emitted RenderMesh.

use std::collections::HashMap;

use truck_meshalgo::prelude::*;
use truck_meshalgo::tessellation::MeshableShape;

use crate::polygon;
use crate::types::*;

type TruckSolid = truck_modeling::Solid;

/// Positions closer than this are merged when building a mesh.
pub const WELD_QUANTUM: f64 = 1e-9;

/// Grid cell of a position; equal keys are treated as the same vertex.
pub(crate) fn weld_key(p: &[f64; 3]) -> [i64; 3] {
    [
        (p[0] / WELD_QUANTUM).round() as i64,
        (p[1] / WELD_QUANTUM).round() as i64,
        (p[2] / WELD_QUANTUM).round() as i64,
    ]
}

/// Accumulates triangles while welding vertices on a quantized grid.
pub(crate) struct MeshBuilder {
    vertices: Vec<f64>,
    indices: Vec<u32>,
    lookup: HashMap<[i64; 3], u32>,
}

impl MeshBuilder {
    pub(crate) fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    pub(crate) fn vertex(&mut self, p: [f64; 3]) -> u32 {
        let key = weld_key(&p);
        if let Some(&idx) = self.lookup.get(&key) {
            return idx;
        }
        let idx = (self.vertices.len() / 3) as u32;
        self.vertices.extend_from_slice(&p);
        self.lookup.insert(key, idx);
        idx
    }

    /// Add a triangle; collapsed triangles (after welding) are dropped.
    pub(crate) fn triangle(&mut self, a: [f64; 3], b: [f64; 3], c: [f64; 3]) {
        let (ia, ib, ic) = (self.vertex(a), self.vertex(b), self.vertex(c));
        if ia == ib || ib == ic || ia == ic {
            return;
        }
        self.indices.extend_from_slice(&[ia, ib, ic]);
    }

    /// Triangulate a planar polygon loop and add its triangles.
    pub(crate) fn polygon(&mut self, points: &[[f64; 3]]) {
        for [a, b, c] in polygon::triangulate(points) {
            self.triangle(points[a], points[b], points[c]);
        }
    }

    pub(crate) fn finish(self) -> RenderMesh {
        RenderMesh {
            vertices: self.vertices,
            indices: self.indices,
        }
    }
}

/// Tessellate a truck Solid into a welded RenderMesh.
///
/// Each face is meshed as part of the solid; inverted faces have their
/// triangles flipped so the result is consistently outward-facing.
pub fn tessellate_solid(solid: &TruckSolid, tolerance: f64) -> Result<RenderMesh, KernelError> {
    if !(tolerance.is_finite() && tolerance > 0.0) {
        return Err(KernelError::TessellationFailed {
            reason: format!("tolerance must be positive, got {}", tolerance),
        });
    }
    let meshed_solid = solid.triangulation(tolerance);
    let mut builder = MeshBuilder::new();

    for shell in meshed_solid.boundaries().iter() {
        for face in shell.face_iter() {
            let maybe_mesh: Option<PolygonMesh> = face.surface();
            let Some(face_mesh) = maybe_mesh else {
                return Err(KernelError::TessellationFailed {
                    reason: "a face could not be meshed".to_string(),
                });
            };
            let face_mesh = if !face.orientation() {
                let mut m = face_mesh;
                m.invert();
                m
            } else {
                face_mesh
            };
            append_polygon_mesh(&mut builder, &face_mesh);
        }
    }

    let mesh = builder.finish();
    if mesh.is_empty() {
        return Err(KernelError::TessellationFailed {
            reason: "tessellation produced no triangles".to_string(),
        });
    }
    Ok(mesh)
}

fn append_polygon_mesh(builder: &mut MeshBuilder, mesh: &PolygonMesh) {
    let positions = mesh.positions();
    let at = |v: &StandardVertex| {
        let p = positions[v.pos];
        [p[0], p[1], p[2]]
    };
    for tri in mesh.tri_faces() {
        builder.triangle(at(&tri[0]), at(&tri[1]), at(&tri[2]));
    }
    for quad in mesh.quad_faces() {
        builder.triangle(at(&quad[0]), at(&quad[1]), at(&quad[2]));
        builder.triangle(at(&quad[0]), at(&quad[2]), at(&quad[3]));
    }
    for other in mesh.other_faces() {
        let loop_points: Vec<[f64; 3]> = other.iter().map(at).collect();
        builder.polygon(&loop_points);
    }
}
