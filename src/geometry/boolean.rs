//! Polygon union and difference over even-odd ring sets.
//!
//! Every edge of both operands is split wherever it meets the other operand. Each resulting
//! sub-edge is then classified by its midpoint (inside, outside, or shared with an identical
//! sub-edge of the other operand) and the kept sub-edges are chained back into rings. Output
//! rings are in [`ring::normalize`] form, largest first.

use std::collections::{HashMap, HashSet};

use crate::foundation::core::Point;
use crate::geometry::ring;

const EPS: f64 = 1e-9;
const GRID: f64 = 1e6;

/// Boolean operation to perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BooleanOp {
    /// `a ∪ b`
    Union,
    /// `a − b`
    Difference,
}

/// Union of two ring sets.
pub fn union(a: &[Vec<Point>], b: &[Vec<Point>]) -> Vec<Vec<Point>> {
    apply(BooleanOp::Union, a, b)
}

/// Region of `a` not covered by `b`.
pub fn difference(a: &[Vec<Point>], b: &[Vec<Point>]) -> Vec<Vec<Point>> {
    apply(BooleanOp::Difference, a, b)
}

type Key = (i64, i64);

fn key(p: Point) -> Key {
    ((p.x * GRID).round() as i64, (p.y * GRID).round() as i64)
}

#[derive(Clone, Copy, Debug)]
struct Edge {
    from: Point,
    to: Point,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Inside,
    Outside,
    SharedSame,
    SharedOpposite,
}

/// Run `op` on two even-odd ring sets.
#[tracing::instrument(level = "debug", skip(a, b), fields(a_rings = a.len(), b_rings = b.len()))]
pub fn apply(op: BooleanOp, a: &[Vec<Point>], b: &[Vec<Point>]) -> Vec<Vec<Point>> {
    let a = oriented(a);
    let b = oriented(b);
    if a.is_empty() {
        return match op {
            BooleanOp::Union => finish(b),
            BooleanOp::Difference => Vec::new(),
        };
    }
    if b.is_empty() {
        return finish(a);
    }

    let (a_edges, b_edges) = split_edges(&edges_of(&a), &edges_of(&b));
    let b_keys = edge_keys(&b_edges);
    let a_keys = edge_keys(&a_edges);

    let mut kept: Vec<Edge> = Vec::new();
    for e in &a_edges {
        let side = classify(e, &b, &b_keys);
        let keep = match op {
            BooleanOp::Union => matches!(side, Side::Outside | Side::SharedSame),
            BooleanOp::Difference => matches!(side, Side::Outside | Side::SharedOpposite),
        };
        if keep {
            kept.push(*e);
        }
    }
    for e in &b_edges {
        match (op, classify(e, &a, &a_keys)) {
            (BooleanOp::Union, Side::Outside) => kept.push(*e),
            (BooleanOp::Difference, Side::Inside) => kept.push(Edge {
                from: e.to,
                to: e.from,
            }),
            _ => {}
        }
    }

    finish(chain(kept))
}

/// Clean rings and orient them so outer boundaries are counter-clockwise and holes clockwise.
fn oriented(rings: &[Vec<Point>]) -> Vec<Vec<Point>> {
    let cleaned: Vec<Vec<Point>> = rings
        .iter()
        .map(|r| ring::simplify_collinear(r))
        .filter(|r| r.len() >= 3 && ring::signed_area(r).abs() > EPS)
        .collect();

    cleaned
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let probe = interior_probe(r);
            let depth = cleaned
                .iter()
                .enumerate()
                .filter(|(j, other)| *j != i && ring::contains_point(other, probe))
                .count();
            let want_positive = depth % 2 == 0;
            let mut r = r.clone();
            if (ring::signed_area(&r) > 0.0) != want_positive {
                r.reverse();
            }
            r
        })
        .collect()
}

/// A point just inside `r`, near its first edge.
fn interior_probe(r: &[Point]) -> Point {
    let a = r[0];
    let b = r[1];
    let mid = a.midpoint(b);
    let dir = b - a;
    let normal = kurbo::Vec2::new(-dir.y, dir.x).normalize() * 1e-4;
    let candidate = mid + normal;
    if ring::contains_point(r, candidate) {
        candidate
    } else {
        mid - normal
    }
}

fn edges_of(rings: &[Vec<Point>]) -> Vec<Edge> {
    rings
        .iter()
        .flat_map(|r| {
            (0..r.len()).map(move |i| Edge {
                from: r[i],
                to: r[(i + 1) % r.len()],
            })
        })
        .collect()
}

/// Split both edge lists at every mutual intersection or touch point.
fn split_edges(a: &[Edge], b: &[Edge]) -> (Vec<Edge>, Vec<Edge>) {
    let mut a_cuts: Vec<Vec<(f64, Point)>> = vec![Vec::new(); a.len()];
    let mut b_cuts: Vec<Vec<(f64, Point)>> = vec![Vec::new(); b.len()];

    for (i, ea) in a.iter().enumerate() {
        for (j, eb) in b.iter().enumerate() {
            intersect(ea, eb, &mut a_cuts[i], &mut b_cuts[j]);
        }
    }

    (apply_cuts(a, a_cuts), apply_cuts(b, b_cuts))
}

fn intersect(a: &Edge, b: &Edge, a_cuts: &mut Vec<(f64, Point)>, b_cuts: &mut Vec<(f64, Point)>) {
    let r = a.to - a.from;
    let s = b.to - b.from;
    let denom = r.cross(s);
    let qp = b.from - a.from;
    let scale = r.hypot() * s.hypot();
    if scale < EPS {
        return;
    }

    if denom.abs() <= EPS * scale {
        // parallel: only collinear overlaps matter
        if qp.cross(r).abs() > EPS * r.hypot().max(1.0) {
            return;
        }
        let rr = r.hypot2();
        let ss = s.hypot2();
        for p in [b.from, b.to] {
            let t = (p - a.from).dot(r) / rr;
            if t > EPS && t < 1.0 - EPS {
                a_cuts.push((t, p));
            }
        }
        for p in [a.from, a.to] {
            let u = (p - b.from).dot(s) / ss;
            if u > EPS && u < 1.0 - EPS {
                b_cuts.push((u, p));
            }
        }
        return;
    }

    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    if t < -EPS || t > 1.0 + EPS || u < -EPS || u > 1.0 + EPS {
        return;
    }
    let t_end = t <= EPS || t >= 1.0 - EPS;
    let u_end = u <= EPS || u >= 1.0 - EPS;
    let point = if t <= EPS {
        a.from
    } else if t >= 1.0 - EPS {
        a.to
    } else if u <= EPS {
        b.from
    } else if u >= 1.0 - EPS {
        b.to
    } else {
        a.from + r * t
    };
    if !t_end {
        a_cuts.push((t, point));
    }
    if !u_end {
        b_cuts.push((u, point));
    }
}

fn apply_cuts(edges: &[Edge], cuts: Vec<Vec<(f64, Point)>>) -> Vec<Edge> {
    let mut out = Vec::with_capacity(edges.len());
    for (e, mut c) in edges.iter().zip(cuts) {
        c.sort_by(|x, y| x.0.total_cmp(&y.0));
        let mut prev = e.from;
        for (_, p) in c {
            if key(p) != key(prev) {
                out.push(Edge { from: prev, to: p });
                prev = p;
            }
        }
        if key(prev) != key(e.to) {
            out.push(Edge { from: prev, to: e.to });
        }
    }
    out
}

fn edge_keys(edges: &[Edge]) -> HashSet<(Key, Key)> {
    edges.iter().map(|e| (key(e.from), key(e.to))).collect()
}

fn classify(e: &Edge, other: &[Vec<Point>], other_keys: &HashSet<(Key, Key)>) -> Side {
    let (kf, kt) = (key(e.from), key(e.to));
    if other_keys.contains(&(kf, kt)) {
        return Side::SharedSame;
    }
    if other_keys.contains(&(kt, kf)) {
        return Side::SharedOpposite;
    }
    if ring::rings_contain_point(other, e.from.midpoint(e.to)) {
        Side::Inside
    } else {
        Side::Outside
    }
}

/// Link edges head-to-tail into closed rings.
///
/// At a vertex with several outgoing edges the one turning furthest counter-clockwise is taken,
/// which keeps outer rings that only touch at a point separate.
fn chain(edges: Vec<Edge>) -> Vec<Vec<Point>> {
    let mut outgoing: HashMap<Key, Vec<usize>> = HashMap::new();
    for (i, e) in edges.iter().enumerate() {
        outgoing.entry(key(e.from)).or_default().push(i);
    }
    let mut used = vec![false; edges.len()];
    let mut rings = Vec::new();

    for start in 0..edges.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let start_key = key(edges[start].from);
        let mut ring_pts = vec![edges[start].from];
        let mut current = start;

        loop {
            let e = edges[current];
            let end_key = key(e.to);
            if end_key == start_key {
                break;
            }
            ring_pts.push(e.to);
            let incoming = e.to - e.from;
            let next = outgoing.get(&end_key).and_then(|cands| {
                cands
                    .iter()
                    .copied()
                    .filter(|&c| !used[c])
                    .max_by(|&x, &y| {
                        turn(incoming, edges[x].to - edges[x].from)
                            .total_cmp(&turn(incoming, edges[y].to - edges[y].from))
                    })
            });
            match next {
                Some(n) => {
                    used[n] = true;
                    current = n;
                }
                None => {
                    tracing::debug!("dropping unclosed boolean chain");
                    ring_pts.clear();
                    break;
                }
            }
        }

        if ring_pts.len() >= 3 {
            rings.push(ring_pts);
        }
    }
    rings
}

/// Signed turn angle from `a` to `b`; positive values turn counter-clockwise (y-up).
fn turn(a: kurbo::Vec2, b: kurbo::Vec2) -> f64 {
    a.cross(b).atan2(a.dot(b))
}

fn finish(rings: Vec<Vec<Point>>) -> Vec<Vec<Point>> {
    let mut out: Vec<Vec<Point>> = rings
        .iter()
        .map(|r| ring::normalize(r))
        .filter(|r| r.len() >= 3 && ring::signed_area(r).abs() > EPS)
        .collect();
    out.sort_by(|x, y| {
        ring::signed_area(x)
            .abs()
            .total_cmp(&ring::signed_area(y).abs())
            .reverse()
            .then(x[0].x.total_cmp(&y[0].x).reverse())
            .then(x[0].y.total_cmp(&y[0].y).reverse())
    });
    out
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/boolean.rs"]
mod tests;
