//! Human-readable measurement reports. The only place values are rounded.

use std::fmt;

use caliper_types::MeshInfo;
use serde::{Deserialize, Serialize};

use crate::calculator::{EdgeMeasurement, FaceMeasurement, Measurement, VertexMeasurement};

/// A titled list of label/value lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    pub lines: Vec<(String, String)>,
}

struct Fmt {
    decimals: usize,
}

impl Fmt {
    fn scalar(&self, v: f64) -> String {
        // Avoid printing "-0.00".
        let s = format!("{:.*}", self.decimals, v);
        if s.starts_with('-') && s[1..].chars().all(|c| c == '0' || c == '.') {
            s[1..].to_string()
        } else {
            s
        }
    }

    fn point(&self, p: &[f64; 3]) -> String {
        format!("({}, {}, {})", self.scalar(p[0]), self.scalar(p[1]), self.scalar(p[2]))
    }

    fn list(&self, values: impl IntoIterator<Item = f64>) -> String {
        values
            .into_iter()
            .map(|v| self.scalar(v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn indices(values: &[usize]) -> String {
    values
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Report {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    fn line(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.lines.push((label.into(), value.into()));
    }

    /// Value of the first line with `label`.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.lines
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn from_measurement(measurement: &Measurement, decimals: usize) -> Self {
        let f = Fmt { decimals };
        match measurement {
            Measurement::Vertex(v) => vertex_report(v, &f),
            Measurement::Edge(e) => edge_report(e, &f),
            Measurement::Face(face) => face_report(face, &f),
        }
    }

    /// Result of a completed two-point measurement.
    pub fn distance(distance: f64, from: &[f64; 3], to: &[f64; 3], decimals: usize) -> Self {
        let f = Fmt { decimals };
        let mut r = Report::new("Distance");
        r.line("Point 1", f.point(from));
        r.line("Point 2", f.point(to));
        r.line("Distance", f.scalar(distance));
        r
    }

    pub fn model_info(name: &str, info: &MeshInfo, decimals: usize) -> Self {
        let f = Fmt { decimals };
        let mut r = Report::new(format!("Model: {}", name));
        r.line("Vertices", info.vertex_count.to_string());
        r.line("Faces", info.face_count.to_string());
        r.line("Edges", info.edge_count.to_string());
        if let Some([x, y, z]) = info.extents {
            r.line("Size X", f.scalar(x));
            r.line("Size Y", f.scalar(y));
            r.line("Size Z", f.scalar(z));
        }
        r
    }
}

fn vertex_report(v: &VertexMeasurement, f: &Fmt) -> Report {
    let mut r = Report::new("Vertex");
    r.line("Position", f.point(&v.position));
    r.line("Index", v.index.to_string());
    r.line("Valence", v.valence.to_string());
    for e in &v.incident_edges {
        r.line(
            format!("Edge {} (to vertex {})", e.edge, e.other_vertex),
            f.scalar(e.length),
        );
    }
    for face in &v.incident_faces {
        r.line(format!("Face {} area", face.face), f.scalar(face.area));
    }
    r
}

fn edge_report(e: &EdgeMeasurement, f: &Fmt) -> Report {
    let mut r = Report::new("Edge");
    r.line("Length", f.scalar(e.length));
    r.line("Start", f.point(&e.start));
    r.line("End", f.point(&e.end));
    r.line("Midpoint", f.point(&e.midpoint));
    r.line("Direction", f.point(&e.direction));
    r.line("Index", e.index.to_string());
    r.line("Vertices", indices(&e.vertices));
    for face in &e.adjacent_faces {
        r.line(format!("Face {} area", face.face), f.scalar(face.area));
    }
    r
}

fn face_report(face: &FaceMeasurement, f: &Fmt) -> Report {
    let mut r = Report::new("Face");
    r.line("Area", f.scalar(face.area));
    r.line("Perimeter", f.scalar(face.perimeter));
    r.line("Normal", f.point(&face.normal));
    r.line("Centroid", f.point(&face.centroid));
    r.line("Index", face.index.to_string());
    r.line("Vertices", indices(&face.vertices));
    for (i, p) in face.vertices.iter().zip(&face.positions) {
        r.line(format!("Vertex {}", i), f.point(p));
    }
    r.line("Edge lengths", f.list(face.edge_lengths.iter().copied()));
    r.line("Min edge", f.scalar(face.min_edge));
    r.line("Max edge", f.scalar(face.max_edge));
    r.line("Average edge", f.scalar(face.average_edge));
    r.line("Aspect ratio", f.scalar(face.aspect_ratio));
    r.line("Neighbours", indices(&face.neighbours));
    r
}

impl fmt::Display for Report {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(out, "{}", self.title)?;
        for (label, value) in &self.lines {
            writeln!(out, "  {}: {}", label, value)?;
        }
        Ok(())
    }
}
