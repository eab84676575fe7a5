//! PolyKernel: exact kernel for planar polyhedra.
//!
//! Solids are closed sets of outward-facing polygons. Intersection supports a
//! convex second operand, which is all plane sectioning needs: the first solid
//! is clipped against each face plane of the second, and the opening left on
//! each plane is closed with a cap polygon.

use std::collections::HashMap;

use caliper_types::Aabb;
use tracing::{debug, warn};

use crate::polygon::{self, dot, norm, sub};
use crate::tessellation::{weld_key, MeshBuilder};
use crate::traits::Kernel;
use crate::types::*;

/// Relative tolerance for point-on-plane classification.
const PLANE_EPSILON: f64 = 1e-9;

/// A polyhedral solid: outward counter-clockwise polygons.
#[derive(Debug, Clone, Default)]
struct PolySolid {
    faces: Vec<Vec<[f64; 3]>>,
}

impl PolySolid {
    fn scale(&self) -> f64 {
        self.faces
            .iter()
            .flatten()
            .flat_map(|p| p.iter())
            .fold(1.0f64, |m, c| m.max(c.abs()))
    }

    fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(self.faces.iter().flatten())
    }
}

/// A face plane `n · p = d` with unit normal.
#[derive(Debug, Clone, Copy)]
struct Plane {
    normal: [f64; 3],
    d: f64,
}

impl Plane {
    fn from_polygon(points: &[[f64; 3]]) -> Option<Self> {
        let n = polygon::newell_normal(points);
        let len = norm(&n);
        if len < 1e-300 {
            return None;
        }
        let normal = [n[0] / len, n[1] / len, n[2] / len];
        // Average over all vertices for slightly non-planar input.
        let d = points.iter().map(|p| dot(&normal, p)).sum::<f64>() / points.len() as f64;
        Some(Self { normal, d })
    }

    fn distance(&self, p: &[f64; 3]) -> f64 {
        dot(&self.normal, p) - self.d
    }
}

/// Geometry kernel for planar polyhedra, with no external dependencies
/// beyond this crate's polygon math.
pub struct PolyKernel {
    next_handle: u64,
    solids: HashMap<u64, PolySolid>,
}

impl PolyKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            solids: HashMap::new(),
        }
    }

    fn store(&mut self, solid: PolySolid) -> KernelSolidHandle {
        let h = KernelSolidHandle(self.next_handle);
        self.next_handle += 1;
        self.solids.insert(h.id(), solid);
        h
    }

    fn get(&self, handle: &KernelSolidHandle) -> Result<&PolySolid, KernelError> {
        self.solids
            .get(&handle.id())
            .ok_or_else(|| KernelError::SolidNotFound {
                handle: handle.clone(),
            })
    }

    /// Number of live solids.
    pub fn solid_count(&self) -> usize {
        self.solids.len()
    }
}

impl Default for PolyKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for PolyKernel {
    fn solid_from_mesh(
        &mut self,
        vertices: &[[f64; 3]],
        faces: &[Vec<usize>],
    ) -> Result<KernelSolidHandle, KernelError> {
        if faces.is_empty() {
            return Err(KernelError::InvalidShape {
                reason: "mesh has no faces".to_string(),
            });
        }
        let mut polys = Vec::with_capacity(faces.len());
        for (face_idx, face) in faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(KernelError::InvalidShape {
                    reason: format!("face {} has fewer than 3 vertices", face_idx),
                });
            }
            let mut poly = Vec::with_capacity(face.len());
            for &vi in face {
                let p = vertices.get(vi).ok_or_else(|| KernelError::InvalidShape {
                    reason: format!("face {} references missing vertex {}", face_idx, vi),
                })?;
                poly.push(*p);
            }
            polys.push(poly);
        }
        Ok(self.store(PolySolid { faces: polys }))
    }

    fn make_box(&mut self, min: [f64; 3], max: [f64; 3]) -> Result<KernelSolidHandle, KernelError> {
        if (0..3).any(|i| !(max[i] - min[i]).is_finite() || max[i] <= min[i]) {
            return Err(KernelError::InvalidShape {
                reason: format!("box corners {:?} .. {:?} do not span a volume", min, max),
            });
        }
        let [x0, y0, z0] = min;
        let [x1, y1, z1] = max;
        let faces = vec![
            vec![[x0, y0, z0], [x0, y0, z1], [x0, y1, z1], [x0, y1, z0]], // -X
            vec![[x1, y0, z0], [x1, y1, z0], [x1, y1, z1], [x1, y0, z1]], // +X
            vec![[x0, y0, z0], [x1, y0, z0], [x1, y0, z1], [x0, y0, z1]], // -Y
            vec![[x0, y1, z0], [x0, y1, z1], [x1, y1, z1], [x1, y1, z0]], // +Y
            vec![[x0, y0, z0], [x0, y1, z0], [x1, y1, z0], [x1, y0, z0]], // -Z
            vec![[x0, y0, z1], [x1, y0, z1], [x1, y1, z1], [x0, y1, z1]], // +Z
        ];
        Ok(self.store(PolySolid { faces }))
    }

    fn boolean_intersect(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let solid_a = self.get(a)?;
        let solid_b = self.get(b)?;
        let eps = PLANE_EPSILON * solid_a.scale().max(solid_b.scale());
        let planes = convex_planes(solid_b, eps)?;

        let mut faces = solid_a.faces.clone();
        for plane in &planes {
            faces = clip_by_plane(faces, plane, eps);
            if faces.is_empty() {
                break;
            }
        }
        debug!(
            input_faces = solid_a.faces.len(),
            planes = planes.len(),
            output_faces = faces.len(),
            "polyhedral intersection done"
        );
        Ok(self.store(PolySolid { faces }))
    }

    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        tolerance: f64,
    ) -> Result<RenderMesh, KernelError> {
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(KernelError::TessellationFailed {
                reason: format!("tolerance must be positive, got {}", tolerance),
            });
        }
        let poly = self.get(solid)?;
        if poly.faces.is_empty() {
            return Err(KernelError::TessellationFailed {
                reason: "solid has no faces".to_string(),
            });
        }
        // Planar faces are exact; the tolerance never forces refinement.
        let mut builder = MeshBuilder::new();
        for face in &poly.faces {
            builder.polygon(face);
        }
        let mesh = builder.finish();
        if mesh.is_empty() {
            return Err(KernelError::TessellationFailed {
                reason: "every face is degenerate".to_string(),
            });
        }
        Ok(mesh)
    }

    fn bounding_box(&self, solid: &KernelSolidHandle) -> Result<Option<Aabb>, KernelError> {
        Ok(self.get(solid)?.bounding_box())
    }

    fn release(&mut self, solid: &KernelSolidHandle) {
        self.solids.remove(&solid.id());
    }
}

// ── Clipping ────────────────────────────────────────────────────────────────

/// Distinct face planes of a convex solid, or `NotSupported` if it is not convex.
fn convex_planes(solid: &PolySolid, eps: f64) -> Result<Vec<Plane>, KernelError> {
    let mut planes: Vec<Plane> = Vec::new();
    for face in &solid.faces {
        let Some(plane) = Plane::from_polygon(face) else {
            continue;
        };
        let duplicate = planes.iter().any(|p| {
            (p.d - plane.d).abs() <= eps && dot(&p.normal, &plane.normal) > 1.0 - 1e-12
        });
        if !duplicate {
            planes.push(plane);
        }
    }
    for plane in &planes {
        if solid
            .faces
            .iter()
            .flatten()
            .any(|p| plane.distance(p) > eps)
        {
            return Err(KernelError::NotSupported {
                operation: "intersection with a non-convex solid".to_string(),
            });
        }
    }
    Ok(planes)
}

/// Keep the part of a closed polygon set behind `plane` and cap the opening.
fn clip_by_plane(faces: Vec<Vec<[f64; 3]>>, plane: &Plane, eps: f64) -> Vec<Vec<[f64; 3]>> {
    let mut kept = Vec::with_capacity(faces.len());
    for face in faces {
        if let Some(clipped) = clip_polygon(&face, plane, eps) {
            kept.push(clipped);
        }
    }
    let caps = cap_loops(&kept, plane, eps);
    kept.extend(caps);
    kept
}

/// Sutherland–Hodgman clip of one polygon. Vertices within `eps` of the plane
/// count as on it and are kept as they are.
fn clip_polygon(face: &[[f64; 3]], plane: &Plane, eps: f64) -> Option<Vec<[f64; 3]>> {
    let dist: Vec<f64> = face
        .iter()
        .map(|p| {
            let d = plane.distance(p);
            if d.abs() <= eps {
                0.0
            } else {
                d
            }
        })
        .collect();
    if dist.iter().all(|&d| d <= 0.0) {
        return Some(face.to_vec());
    }
    if dist.iter().all(|&d| d >= 0.0) {
        return None;
    }

    let n = face.len();
    let mut out: Vec<[f64; 3]> = Vec::with_capacity(n + 2);
    for i in 0..n {
        let j = (i + 1) % n;
        let (p, q) = (&face[i], &face[j]);
        let (dp, dq) = (dist[i], dist[j]);
        if dp <= 0.0 {
            out.push(*p);
        }
        if (dp < 0.0 && dq > 0.0) || (dp > 0.0 && dq < 0.0) {
            out.push(crossing(p, dp, q, dq));
        }
    }
    out.dedup();
    if out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    if out.len() < 3 || polygon::polygon_area(&out) <= eps * eps {
        return None;
    }
    Some(out)
}

/// Point where segment `p`–`q` meets the plane. Evaluated from the
/// lexicographically smaller endpoint so both faces sharing the edge compute
/// bit-identical points.
fn crossing(p: &[f64; 3], dp: f64, q: &[f64; 3], dq: f64) -> [f64; 3] {
    let (a, da, b, db) = if p.partial_cmp(q) == Some(std::cmp::Ordering::Greater) {
        (q, dq, p, dp)
    } else {
        (p, dp, q, dq)
    };
    let t = da / (da - db);
    let dir = sub(b, a);
    [a[0] + t * dir[0], a[1] + t * dir[1], a[2] + t * dir[2]]
}

/// Close the opening left on `plane` by chaining the open boundary edges that
/// lie on it. Each loop is reversed relative to the faces it borders, which
/// makes the cap face outward along the plane normal.
fn cap_loops(faces: &[Vec<[f64; 3]>], plane: &Plane, eps: f64) -> Vec<Vec<[f64; 3]>> {
    type Key = [i64; 3];
    let mut directed: HashMap<(Key, Key), usize> = HashMap::new();
    let mut points: HashMap<Key, [f64; 3]> = HashMap::new();
    for face in faces {
        for i in 0..face.len() {
            let (p, q) = (face[i], face[(i + 1) % face.len()]);
            let (kp, kq) = (weld_key(&p), weld_key(&q));
            if kp == kq {
                continue;
            }
            points.insert(kp, p);
            points.insert(kq, q);
            *directed.entry((kp, kq)).or_insert(0) += 1;
        }
    }

    // Cap edges run opposite to the open boundary edges.
    let on_plane = |k: &Key| {
        points
            .get(k)
            .map(|p| plane.distance(p).abs() <= eps)
            .unwrap_or(false)
    };
    let mut outgoing: HashMap<Key, Vec<Key>> = HashMap::new();
    let mut open_edges: Vec<(Key, Key)> = directed
        .keys()
        .filter(|(u, v)| !directed.contains_key(&(*v, *u)) && on_plane(u) && on_plane(v))
        .copied()
        .collect();
    open_edges.sort();
    for (u, v) in open_edges {
        outgoing.entry(v).or_default().push(u);
    }

    let mut starts: Vec<Key> = outgoing.keys().copied().collect();
    starts.sort();
    let mut caps = Vec::new();
    for start in starts {
        loop {
            let Some(first) = outgoing.get_mut(&start).and_then(|v| v.pop()) else {
                break;
            };
            let mut loop_keys = vec![start];
            let mut current = first;
            let mut closed = false;
            while loop_keys.len() <= points.len() {
                if current == start {
                    closed = true;
                    break;
                }
                loop_keys.push(current);
                match outgoing.get_mut(&current).and_then(|v| v.pop()) {
                    Some(next) => current = next,
                    None => break,
                }
            }
            if !closed {
                warn!(vertices = loop_keys.len(), "open section boundary, cap skipped");
                continue;
            }
            let cap: Vec<[f64; 3]> = loop_keys.iter().filter_map(|k| points.get(k).copied()).collect();
            if cap.len() >= 3 && polygon::polygon_area(&cap) > eps * eps {
                caps.push(cap);
            }
        }
    }
    caps
}
