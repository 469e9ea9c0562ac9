//! Helpers over closed point rings (`&[Point]`, implicitly closed).

use crate::foundation::core::{BezPath, Point, Rect, Vec2};

const EPS: f64 = 1e-9;

/// Shoelace signed area. Positive for counter-clockwise rings in a y-up frame.
pub fn signed_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, p) in ring.iter().enumerate() {
        let q = ring[(i + 1) % ring.len()];
        sum += p.x * q.y - q.x * p.y;
    }
    sum * 0.5
}

/// Axis-aligned bounds, `None` for an empty ring.
pub fn bounding_box(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let mut r = Rect::from_points(*first, *first);
    for p in &points[1..] {
        r = r.union_pt(*p);
    }
    Some(r)
}

/// Area-weighted centroid; falls back to the vertex mean for degenerate rings.
pub fn centroid(ring: &[Point]) -> Option<Point> {
    if ring.is_empty() {
        return None;
    }
    let a = signed_area(ring);
    if a.abs() < EPS {
        let n = ring.len() as f64;
        let sum = ring.iter().fold(Vec2::ZERO, |acc, p| acc + p.to_vec2());
        return Some((sum / n).to_point());
    }
    let (mut cx, mut cy) = (0.0, 0.0);
    for (i, p) in ring.iter().enumerate() {
        let q = ring[(i + 1) % ring.len()];
        let f = p.x * q.y - q.x * p.y;
        cx += (p.x + q.x) * f;
        cy += (p.y + q.y) * f;
    }
    Some(Point::new(cx / (6.0 * a), cy / (6.0 * a)))
}

/// Even-odd point containment (ray casting).
pub fn contains_point(ring: &[Point], p: Point) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (ring[i], ring[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x = (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Even-odd containment over several rings (outer boundaries and holes).
pub fn rings_contain_point(rings: &[Vec<Point>], p: Point) -> bool {
    rings.iter().filter(|r| contains_point(r, p)).count() % 2 == 1
}

/// Even-odd filled area of non-crossing rings: a ring nested inside an odd number of other rings
/// is a hole and subtracts its area.
pub fn even_odd_area(rings: &[Vec<Point>]) -> f64 {
    rings
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let area = signed_area(r).abs();
            let Some(&probe) = r.first() else {
                return 0.0;
            };
            let depth = rings
                .iter()
                .enumerate()
                .filter(|&(j, other)| j != i && contains_point(other, probe))
                .count();
            if depth % 2 == 0 { area } else { -area }
        })
        .sum()
}

/// Distance from `p` to the segment `a..b`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.hypot2();
    if len2 < EPS {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Return `true` if `p` lies within `tolerance` of any edge of the closed ring.
pub fn near_boundary(ring: &[Point], p: Point, tolerance: f64) -> bool {
    (0..ring.len()).any(|i| distance_to_segment(p, ring[i], ring[(i + 1) % ring.len()]) <= tolerance)
}

/// Copy of `points` moved by `delta`.
pub fn translate(points: &[Point], delta: Vec2) -> Vec<Point> {
    points.iter().map(|p| *p + delta).collect()
}

/// Length of the closed boundary.
pub fn perimeter(ring: &[Point]) -> f64 {
    if ring.len() < 2 {
        return 0.0;
    }
    (0..ring.len())
        .map(|i| ring[i].distance(ring[(i + 1) % ring.len()]))
        .sum()
}

/// Regular polygon approximating a circle, counter-clockwise starting at angle zero.
pub fn circle(center: Point, radius: f64, segments: usize) -> Vec<Point> {
    let n = segments.max(3);
    (0..n)
        .map(|i| {
            let a = std::f64::consts::TAU * (i as f64) / (n as f64);
            Point::new(center.x + radius * a.cos(), center.y + radius * a.sin())
        })
        .collect()
}

/// Insert midpoints on the longest edges until the ring has `count` vertices.
///
/// The shape is unchanged; rings already at or above `count` are returned as-is.
pub fn resample(ring: &[Point], count: usize) -> Vec<Point> {
    let mut out = ring.to_vec();
    if out.len() < 2 {
        return out;
    }
    while out.len() < count {
        let n = out.len();
        let mut longest = 0;
        let mut best = -1.0;
        for i in 0..n {
            let d = out[i].distance(out[(i + 1) % n]);
            if d > best + EPS {
                best = d;
                longest = i;
            }
        }
        let mid = out[longest].midpoint(out[(longest + 1) % n]);
        out.insert(longest + 1, mid);
    }
    out
}

/// Drop consecutive duplicates and vertices that do not change direction.
pub fn simplify_collinear(ring: &[Point]) -> Vec<Point> {
    let mut pts: Vec<Point> = Vec::with_capacity(ring.len());
    for p in ring {
        if pts.last().is_none_or(|l| l.distance(*p) > EPS) {
            pts.push(*p);
        }
    }
    while pts.len() > 1 && pts[0].distance(pts[pts.len() - 1]) <= EPS {
        pts.pop();
    }

    let mut changed = true;
    while changed && pts.len() >= 3 {
        changed = false;
        let n = pts.len();
        for i in 0..n {
            let prev = pts[(i + n - 1) % n];
            let cur = pts[i];
            let next = pts[(i + 1) % n];
            let scale = (cur - prev).hypot() * (next - cur).hypot();
            if (cur - prev).cross(next - cur).abs() <= EPS * scale.max(1.0) {
                pts.remove(i);
                changed = true;
                break;
            }
        }
    }
    pts
}

/// Canonical ring form: collinear vertices removed, negative signed area, starting at the
/// vertex with the greatest x (then greatest y).
pub fn normalize(ring: &[Point]) -> Vec<Point> {
    let mut pts = simplify_collinear(ring);
    if pts.len() < 3 {
        return pts;
    }
    if signed_area(&pts) > 0.0 {
        pts.reverse();
    }
    let start = pts
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    pts.rotate_left(start);
    pts
}

/// Closed (or open) bezier path through the points.
pub fn to_bezpath(points: &[Point], closed: bool) -> BezPath {
    let mut path = BezPath::new();
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        path.move_to(*first);
        for p in iter {
            path.line_to(*p);
        }
        if closed {
            path.close_path();
        }
    }
    path
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/ring.rs"]
mod tests;
