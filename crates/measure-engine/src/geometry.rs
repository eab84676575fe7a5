//! Point and polygon measures. Degenerate input is clamped, never an error.

use solid_kernel::polygon;

pub fn sub(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn norm(a: &[f64; 3]) -> f64 {
    (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt()
}

pub fn distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    norm(&sub(a, b))
}

pub fn midpoint(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0, (a[2] + b[2]) / 2.0]
}

/// Vertex mean. The origin for an empty list.
pub fn centroid(points: &[[f64; 3]]) -> [f64; 3] {
    if points.is_empty() {
        return [0.0; 3];
    }
    let n = points.len() as f64;
    let mut c = [0.0; 3];
    for p in points {
        for i in 0..3 {
            c[i] += p[i];
        }
    }
    [c[0] / n, c[1] / n, c[2] / n]
}

/// Triangle area by Heron's formula. The radicand is clamped at zero so
/// collinear corners give 0 instead of NaN.
pub fn heron_area(a: &[f64; 3], b: &[f64; 3], c: &[f64; 3]) -> f64 {
    let (la, lb, lc) = (distance(b, c), distance(a, c), distance(a, b));
    let s = (la + lb + lc) / 2.0;
    (s * (s - la) * (s - lb) * (s - lc)).max(0.0).sqrt()
}

/// Area of a face: Heron for triangles, Newell for larger polygons, 0 below 3 vertices.
pub fn face_area(points: &[[f64; 3]]) -> f64 {
    match points.len() {
        0..=2 => 0.0,
        3 => heron_area(&points[0], &points[1], &points[2]),
        _ => polygon::polygon_area(points),
    }
}

/// Sum of edge lengths around the face, including the closing edge.
pub fn perimeter(points: &[[f64; 3]]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    (0..points.len())
        .map(|i| distance(&points[i], &points[(i + 1) % points.len()]))
        .sum()
}

/// Normal from the first two edges out of vertex 0, divided by `norm + epsilon`.
/// Zero for faces with fewer than 3 vertices.
pub fn face_normal(points: &[[f64; 3]], epsilon: f64) -> [f64; 3] {
    if points.len() < 3 {
        return [0.0; 3];
    }
    let n = cross(&sub(&points[1], &points[0]), &sub(&points[2], &points[0]));
    let len = norm(&n) + epsilon;
    [n[0] / len, n[1] / len, n[2] / len]
}
