//! Planar polygon math: Newell normals, areas and ear-clipping triangulation.

pub(crate) fn sub(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub(crate) fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn norm(a: &[f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

/// Unnormalized polygon normal by Newell's method.
///
/// Its length is twice the polygon's area, and it points along the side from
/// which the vertices appear counter-clockwise. Robust for non-convex and
/// slightly non-planar loops.
pub fn newell_normal(points: &[[f64; 3]]) -> [f64; 3] {
    let mut n = [0.0; 3];
    let len = points.len();
    for i in 0..len {
        let a = &points[i];
        let b = &points[(i + 1) % len];
        n[0] += (a[1] - b[1]) * (a[2] + b[2]);
        n[1] += (a[2] - b[2]) * (a[0] + b[0]);
        n[2] += (a[0] - b[0]) * (a[1] + b[1]);
    }
    n
}

/// Area of a planar polygon with any number of vertices.
pub fn polygon_area(points: &[[f64; 3]]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    norm(&newell_normal(points)) / 2.0
}

/// Triangulate a simple planar polygon by ear clipping.
///
/// Returns index triples into `points` that keep the polygon's winding.
/// Degenerate input (collinear or zero-area loops) falls back to a fan so
/// every vertex is still referenced.
pub fn triangulate(points: &[[f64; 3]]) -> Vec<[usize; 3]> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }
    if n == 3 {
        return vec![[0, 1, 2]];
    }

    let normal = newell_normal(points);
    let (k, _) = normal
        .iter()
        .enumerate()
        .fold((2, 0.0f64), |(bk, bv), (i, v)| {
            if v.abs() > bv {
                (i, v.abs())
            } else {
                (bk, bv)
            }
        });
    if normal[k].abs() < 1e-300 {
        return fan(n);
    }
    // Drop the dominant axis; choose the remaining pair so that the projected
    // winding agrees with the normal.
    let (u, v) = match k {
        0 => (1, 2),
        1 => (2, 0),
        _ => (0, 1),
    };
    let sign = normal[k].signum();
    let pts2: Vec<[f64; 2]> = points.iter().map(|p| [p[u], p[v]]).collect();

    let scale = pts2
        .iter()
        .flat_map(|p| p.iter())
        .fold(0.0f64, |m, c| m.max(c.abs()))
        .max(1.0);
    let eps = 1e-12 * scale * scale;

    let mut remaining: Vec<usize> = (0..n).collect();
    let mut triangles = Vec::with_capacity(n - 2);

    while remaining.len() > 3 {
        let m = remaining.len();
        let mut clipped = false;
        for i in 0..m {
            let prev = remaining[(i + m - 1) % m];
            let cur = remaining[i];
            let next = remaining[(i + 1) % m];
            let (a, b, c) = (pts2[prev], pts2[cur], pts2[next]);
            if cross2(&a, &b, &c) * sign <= eps {
                continue;
            }
            let blocked = remaining.iter().any(|&j| {
                j != prev
                    && j != cur
                    && j != next
                    && pts2[j] != a
                    && pts2[j] != b
                    && pts2[j] != c
                    && point_in_triangle(&pts2[j], &a, &b, &c, sign)
            });
            if blocked {
                continue;
            }
            triangles.push([prev, cur, next]);
            remaining.remove(i);
            clipped = true;
            break;
        }
        if !clipped {
            // No ear left: the rest is degenerate, close it with a fan.
            for i in 1..remaining.len() - 1 {
                triangles.push([remaining[0], remaining[i], remaining[i + 1]]);
            }
            return triangles;
        }
    }
    triangles.push([remaining[0], remaining[1], remaining[2]]);
    triangles
}

fn fan(n: usize) -> Vec<[usize; 3]> {
    (1..n - 1).map(|i| [0, i, i + 1]).collect()
}

fn cross2(a: &[f64; 2], b: &[f64; 2], c: &[f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

fn point_in_triangle(p: &[f64; 2], a: &[f64; 2], b: &[f64; 2], c: &[f64; 2], sign: f64) -> bool {
    let d1 = cross2(a, b, p) * sign;
    let d2 = cross2(b, c, p) * sign;
    let d3 = cross2(c, a, p) * sign;
    d1 >= 0.0 && d2 >= 0.0 && d3 >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangulated_area(points: &[[f64; 3]]) -> f64 {
        triangulate(points)
            .iter()
            .map(|t| polygon_area(&[points[t[0]], points[t[1]], points[t[2]]]))
            .sum()
    }

    #[test]
    fn square_area_and_normal() {
        let sq = [
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [2.0, 2.0, 0.0],
            [0.0, 2.0, 0.0],
        ];
        assert_relative_eq!(polygon_area(&sq), 4.0);
        let n = newell_normal(&sq);
        assert!(n[2] > 0.0);
        assert_eq!(triangulate(&sq).len(), 2);
    }

    #[test]
    fn concave_polygon_triangulates_to_its_area() {
        // L-shape, area 3, in the YZ plane
        let l = [
            [0.0, 0.0, 0.0],
            [0.0, 2.0, 0.0],
            [0.0, 2.0, 1.0],
            [0.0, 1.0, 1.0],
            [0.0, 1.0, 2.0],
            [0.0, 0.0, 2.0],
        ];
        assert_relative_eq!(polygon_area(&l), 3.0, epsilon = 1e-12);
        let tris = triangulate(&l);
        assert_eq!(tris.len(), 4);
        assert_relative_eq!(triangulated_area(&l), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn triangles_keep_winding() {
        let l = [
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [2.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 2.0, 0.0],
            [0.0, 2.0, 0.0],
        ];
        for t in triangulate(&l) {
            let n = newell_normal(&[l[t[0]], l[t[1]], l[t[2]]]);
            assert!(n[2] > 0.0, "triangle {:?} flipped", t);
        }
    }

    #[test]
    fn degenerate_polygon_falls_back_to_fan() {
        let line = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [3.0, 0.0, 0.0]];
        assert_eq!(triangulate(&line).len(), 2);
        assert_eq!(polygon_area(&line), 0.0);
    }
}
