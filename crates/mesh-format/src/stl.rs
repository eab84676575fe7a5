//! STL reading and writing, binary and ASCII.
//!
//! STL stores independent triangles with f32 coordinates. Reading welds
//! bit-identical positions back into shared vertices so the snapshot has
//! proper edge connectivity.

use std::collections::HashMap;

use caliper_types::MeshSnapshot;
use solid_kernel::RenderMesh;
use tracing::debug;

use crate::errors::FormatError;

const HEADER_LEN: usize = 80;
const TRIANGLE_LEN: usize = 50;

// ── Writing ─────────────────────────────────────────────────────────────────

/// Export a RenderMesh as a binary STL file.
///
/// Binary STL format:
/// - 80-byte header (arbitrary text)
/// - u32 triangle count (little-endian)
/// - For each triangle: 3×f32 normal + 3×(3×f32 vertex) + u16 attribute = 50 bytes
pub fn write_binary(mesh: &RenderMesh, name: &str) -> Result<Vec<u8>, FormatError> {
    validate(mesh)?;
    let tri_count = mesh.triangle_count();

    let mut buf = Vec::with_capacity(HEADER_LEN + 4 + tri_count * TRIANGLE_LEN);
    let header = format!("binary STL: {}", name);
    let header_bytes = header.as_bytes();
    buf.extend_from_slice(&header_bytes[..header_bytes.len().min(HEADER_LEN)]);
    buf.resize(HEADER_LEN, 0u8);

    buf.extend_from_slice(&(tri_count as u32).to_le_bytes());

    for tri in mesh.triangles() {
        let corners = tri.map(|i| mesh.position(i as usize));
        for c in facet_normal(&corners) {
            buf.extend_from_slice(&(c as f32).to_le_bytes());
        }
        for p in &corners {
            for c in p {
                buf.extend_from_slice(&(*c as f32).to_le_bytes());
            }
        }
        // Attribute byte count (unused)
        buf.extend_from_slice(&0u16.to_le_bytes());
    }

    Ok(buf)
}

/// Export a RenderMesh as an ASCII STL string.
pub fn write_ascii(mesh: &RenderMesh, name: &str) -> Result<String, FormatError> {
    validate(mesh)?;

    let mut out = String::with_capacity(mesh.triangle_count() * 300);
    out.push_str(&format!("solid {}\n", name));
    for tri in mesh.triangles() {
        let corners = tri.map(|i| mesh.position(i as usize));
        let [nx, ny, nz] = facet_normal(&corners);
        out.push_str(&format!("  facet normal {} {} {}\n", nx, ny, nz));
        out.push_str("    outer loop\n");
        for p in &corners {
            out.push_str(&format!("      vertex {} {} {}\n", p[0], p[1], p[2]));
        }
        out.push_str("    endloop\n");
        out.push_str("  endfacet\n");
    }
    out.push_str(&format!("endsolid {}\n", name));
    Ok(out)
}

fn validate(mesh: &RenderMesh) -> Result<(), FormatError> {
    if mesh.triangle_count() == 0 {
        return Err(FormatError::EmptyMesh);
    }
    let vertex_count = mesh.vertex_count();
    if let Some(&idx) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(FormatError::IndexOutOfRange {
            index: idx as usize,
            vertex_count,
        });
    }
    Ok(())
}

/// Unit facet normal from the winding; +Z for degenerate triangles.
fn facet_normal(corners: &[[f64; 3]; 3]) -> [f64; 3] {
    let [v0, v1, v2] = corners;
    let a = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
    let b = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
    let n = [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len > 1e-12 {
        [n[0] / len, n[1] / len, n[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}

// ── Reading ─────────────────────────────────────────────────────────────────

/// Parse STL bytes, auto-detecting binary or ASCII encoding.
pub fn read(bytes: &[u8]) -> Result<MeshSnapshot, FormatError> {
    if looks_binary(bytes) {
        read_binary(bytes)
    } else if starts_with_keyword(bytes, b"solid") {
        let text = std::str::from_utf8(bytes).map_err(|e| FormatError::Malformed {
            reason: format!("ASCII STL is not UTF-8: {}", e),
        })?;
        read_ascii(text)
    } else {
        read_binary(bytes)
    }
}

fn starts_with_keyword(bytes: &[u8], keyword: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    bytes[start..].starts_with(keyword)
}

/// A binary file's size is fully determined by its triangle count. Some
/// exporters start binary headers with "solid", so size wins over the prefix.
fn looks_binary(bytes: &[u8]) -> bool {
    if bytes.len() < HEADER_LEN + 4 {
        return false;
    }
    let count = declared_count(bytes) as usize;
    count
        .checked_mul(TRIANGLE_LEN)
        .and_then(|n| n.checked_add(HEADER_LEN + 4))
        == Some(bytes.len())
}

fn declared_count(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([
        bytes[HEADER_LEN],
        bytes[HEADER_LEN + 1],
        bytes[HEADER_LEN + 2],
        bytes[HEADER_LEN + 3],
    ])
}

/// Parse a binary STL file.
pub fn read_binary(bytes: &[u8]) -> Result<MeshSnapshot, FormatError> {
    if bytes.len() < HEADER_LEN + 4 {
        return Err(FormatError::Malformed {
            reason: format!("{} bytes is shorter than the binary header", bytes.len()),
        });
    }
    let count = declared_count(bytes) as usize;
    let body = &bytes[HEADER_LEN + 4..];
    if body.len() < count * TRIANGLE_LEN {
        return Err(FormatError::Malformed {
            reason: format!(
                "header declares {} triangles but only {} bytes follow",
                count,
                body.len()
            ),
        });
    }

    let mut welder = Welder::default();
    for record in body.chunks_exact(TRIANGLE_LEN).take(count) {
        let mut corners = [[0f32; 3]; 3];
        // Skip the 12-byte stored normal; the winding is authoritative.
        for (k, corner) in corners.iter_mut().enumerate() {
            for (c, value) in corner.iter_mut().enumerate() {
                let at = 12 + k * 12 + c * 4;
                *value = f32::from_le_bytes([
                    record[at],
                    record[at + 1],
                    record[at + 2],
                    record[at + 3],
                ]);
            }
        }
        welder.facet(&corners);
    }
    welder.finish()
}

/// Parse an ASCII STL document. Facets with more than three vertices are kept
/// as polygons.
pub fn read_ascii(text: &str) -> Result<MeshSnapshot, FormatError> {
    let mut welder = Welder::default();
    let mut current: Vec<[f32; 3]> = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("vertex") => {
                let mut p = [0f32; 3];
                for c in p.iter_mut() {
                    let token = tokens.next().ok_or_else(|| FormatError::Malformed {
                        reason: format!("line {}: vertex needs three coordinates", line_no + 1),
                    })?;
                    *c = token.parse().map_err(|_| FormatError::Malformed {
                        reason: format!("line {}: bad coordinate {:?}", line_no + 1, token),
                    })?;
                }
                current.push(p);
            }
            Some("endloop") => {
                if current.len() < 3 {
                    return Err(FormatError::Malformed {
                        reason: format!(
                            "line {}: loop has {} vertices",
                            line_no + 1,
                            current.len()
                        ),
                    });
                }
                welder.facet(&current);
                current.clear();
            }
            _ => {}
        }
    }
    if !current.is_empty() {
        return Err(FormatError::Malformed {
            reason: "unterminated outer loop".to_string(),
        });
    }
    welder.finish()
}

/// Merges bit-identical positions into shared vertex indices.
#[derive(Default)]
struct Welder {
    vertices: Vec<[f64; 3]>,
    faces: Vec<Vec<usize>>,
    lookup: HashMap<[u32; 3], usize>,
}

impl Welder {
    fn facet(&mut self, corners: &[[f32; 3]]) {
        let mut face = Vec::with_capacity(corners.len());
        for p in corners {
            // +0.0 and -0.0 are the same point.
            let key = p.map(|c| if c == 0.0 { 0 } else { c.to_bits() });
            let index = match self.lookup.get(&key) {
                Some(&i) => i,
                None => {
                    self.vertices.push(p.map(f64::from));
                    let i = self.vertices.len() - 1;
                    self.lookup.insert(key, i);
                    i
                }
            };
            face.push(index);
        }
        self.faces.push(face);
    }

    fn finish(self) -> Result<MeshSnapshot, FormatError> {
        if self.faces.is_empty() {
            return Err(FormatError::EmptyMesh);
        }
        debug!(
            vertices = self.vertices.len(),
            faces = self.faces.len(),
            "STL welded"
        );
        Ok(MeshSnapshot::new(self.vertices, self.faces)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> RenderMesh {
        RenderMesh {
            vertices: vec![
                0.0, 0.0, 0.0, // v0
                1.0, 0.0, 0.0, // v1
                1.0, 1.0, 0.0, // v2
                0.0, 1.0, 0.0, // v3
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    #[test]
    fn binary_layout() {
        let stl = write_binary(&quad(), "quad").unwrap();
        // 84 header + 2 * 50 = 184
        assert_eq!(stl.len(), 184);
        assert!(stl.starts_with(b"binary STL: quad"));
        assert_eq!(u32::from_le_bytes([stl[80], stl[81], stl[82], stl[83]]), 2);
        // Normal should be (0, 0, 1): cross product of (1,0,0)×(1,1,0)
        let nz = f32::from_le_bytes([stl[92], stl[93], stl[94], stl[95]]);
        assert!((nz - 1.0).abs() < 1e-6);
    }

    #[test]
    fn empty_mesh_rejected() {
        assert_eq!(
            write_binary(&RenderMesh::default(), "x"),
            Err(FormatError::EmptyMesh)
        );
    }

    #[test]
    fn bad_index_rejected() {
        let mut mesh = quad();
        mesh.indices[5] = 9;
        assert_eq!(
            write_ascii(&mesh, "x"),
            Err(FormatError::IndexOutOfRange {
                index: 9,
                vertex_count: 4
            })
        );
    }

    #[test]
    fn binary_read_welds_shared_corners() {
        let snap = read(&write_binary(&quad(), "quad").unwrap()).unwrap();
        assert_eq!(snap.vertices().len(), 4);
        assert_eq!(snap.faces(), &[vec![0, 1, 2], vec![0, 2, 3]]);
        assert_eq!(snap.edges().len(), 5);
    }

    #[test]
    fn ascii_read_matches_binary() {
        let text = write_ascii(&quad(), "quad").unwrap();
        assert!(text.starts_with("solid quad\n"));
        let from_text = read(text.as_bytes()).unwrap();
        let from_binary = read(&write_binary(&quad(), "quad").unwrap()).unwrap();
        assert_eq!(from_text, from_binary);
    }

    #[test]
    fn binary_header_starting_with_solid_is_still_binary() {
        let mut stl = write_binary(&quad(), "quad").unwrap();
        stl[..5].copy_from_slice(b"solid");
        assert_eq!(read(&stl).unwrap().faces().len(), 2);
    }

    #[test]
    fn truncated_binary_rejected() {
        let stl = write_binary(&quad(), "quad").unwrap();
        assert!(matches!(
            read(&stl[..150]),
            Err(FormatError::Malformed { .. })
        ));
    }

    #[test]
    fn ascii_bad_coordinate_reports_line() {
        let text = "solid t\n facet normal 0 0 1\n outer loop\n vertex 0 0 zero\n";
        match read_ascii(text) {
            Err(FormatError::Malformed { reason }) => assert!(reason.contains("line 4")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
