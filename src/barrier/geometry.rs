//! barrier::geometry — validated polygons and planar predicates.
//!
//! Purpose
//! -------
//! Represent the forbidden regions (land) as an immutable set of closed
//! polygons and provide the geometric predicates the router needs:
//! strict point containment, segment/boundary intersection, nearest
//! boundary points, and perimeter walks between two boundary points.
//!
//! Conventions
//! -----------
//! - Polygons are simple closed rings given by their vertices; the closing
//!   edge from the last vertex back to the first is implicit.
//! - Containment uses even-odd ray casting. Points within
//!   [`BOUNDARY_EPS`] of any edge count as *boundary*, and the boundary
//!   counts as outside: only strictly interior points are violations.
//! - Segment/edge intersections are parameterized by `t ∈ [0, 1]` along
//!   the query segment; grazing contacts at the very endpoints are ignored
//!   by the crossing predicate so corrected tracks that hug the boundary
//!   do not re-trigger.

use nalgebra::Vector2;

use crate::barrier::errors::{BarrierError, BarrierResult};

/// Distance band around edges treated as boundary rather than interior.
pub const BOUNDARY_EPS: f64 = 1e-9;

/// An intersection of a query segment with a polygon edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Parameter along the query segment, in `[0, 1]`.
    pub t: f64,
    pub polygon: usize,
    pub edge: usize,
    pub point: Vector2<f64>,
}

/// A single validated barrier polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct BarrierPolygon {
    vertices: Vec<Vector2<f64>>,
}

impl BarrierPolygon {
    /// Validate a vertex ring. The ring is implicitly closed; a repeated
    /// closing vertex is not required.
    pub fn new(vertices: Vec<[f64; 2]>) -> BarrierResult<Self> {
        Self::validated(vertices, 0)
    }

    fn validated(vertices: Vec<[f64; 2]>, index: usize) -> BarrierResult<Self> {
        if vertices.len() < 3 {
            return Err(BarrierError::DegeneratePolygon { index, vertices: vertices.len() });
        }
        for (vertex, v) in vertices.iter().enumerate() {
            if !v[0].is_finite() || !v[1].is_finite() {
                return Err(BarrierError::NonFiniteVertex { polygon: index, vertex });
            }
        }
        Ok(Self { vertices: vertices.into_iter().map(|v| Vector2::new(v[0], v[1])).collect() })
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[Vector2<f64>] {
        &self.vertices
    }

    /// Edge `i`, from vertex `i` to vertex `i + 1` (wrapping).
    pub fn edge(&self, i: usize) -> (Vector2<f64>, Vector2<f64>) {
        let n = self.vertices.len();
        (self.vertices[i % n], self.vertices[(i + 1) % n])
    }

    /// Arithmetic mean of the vertices. Used as the outward reference for
    /// nudge directions; adequate for the convex-ish barrier shapes this
    /// router targets.
    pub fn centroid(&self) -> Vector2<f64> {
        let sum: Vector2<f64> = self.vertices.iter().sum();
        sum / self.vertices.len() as f64
    }

    /// Even-odd ray-cast containment. Boundary points may fall on either
    /// side; combine with [`BarrierPolygon::on_boundary`] for a strict
    /// interior test.
    pub fn contains(&self, p: Vector2<f64>) -> bool {
        let n = self.vertices.len();
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let vi = self.vertices[i];
            let vj = self.vertices[j];
            if (vi.y > p.y) != (vj.y > p.y)
                && p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Whether `p` lies within `eps` of any edge.
    pub fn on_boundary(&self, p: Vector2<f64>, eps: f64) -> bool {
        (0..self.vertices.len()).any(|i| {
            let (a, b) = self.edge(i);
            point_segment_distance(p, a, b) <= eps
        })
    }

    /// Closest point on the polygon boundary to `p`.
    pub fn nearest_boundary_point(&self, p: Vector2<f64>) -> Vector2<f64> {
        let mut best = self.vertices[0];
        let mut best_dist = f64::INFINITY;
        for i in 0..self.vertices.len() {
            let (a, b) = self.edge(i);
            let q = project_on_segment(p, a, b);
            let d = (p - q).norm();
            if d < best_dist {
                best_dist = d;
                best = q;
            }
        }
        best
    }

    /// Vertex path along the perimeter from a point on edge `entry_edge`
    /// to a point on edge `exit_edge`, excluding the entry and exit points
    /// themselves.
    ///
    /// `ascending` walks in vertex-index order (entry edge's end vertex
    /// first); descending walks the other way. When both points share an
    /// edge, one direction is empty.
    pub fn corner_walk(&self, entry_edge: usize, exit_edge: usize, ascending: bool) -> Vec<Vector2<f64>> {
        let n = self.vertices.len();
        let mut corners = Vec::new();
        if ascending {
            if entry_edge == exit_edge {
                return corners;
            }
            let mut v = (entry_edge + 1) % n;
            loop {
                corners.push(self.vertices[v]);
                if v == exit_edge {
                    break;
                }
                v = (v + 1) % n;
            }
        } else {
            if entry_edge == exit_edge {
                return corners;
            }
            let mut v = entry_edge;
            loop {
                corners.push(self.vertices[v]);
                if v == (exit_edge + 1) % n {
                    break;
                }
                v = (v + n - 1) % n;
            }
        }
        corners
    }
}

/// Immutable, shared set of barrier polygons.
///
/// Read-only after construction; safely shareable across concurrent router
/// invocations.
#[derive(Debug, Clone, PartialEq)]
pub struct BarrierGeometry {
    polygons: Vec<BarrierPolygon>,
}

impl BarrierGeometry {
    /// Validate a polygon set from raw vertex rings.
    pub fn new(rings: Vec<Vec<[f64; 2]>>) -> BarrierResult<Self> {
        let polygons = rings
            .into_iter()
            .enumerate()
            .map(|(index, ring)| BarrierPolygon::validated(ring, index))
            .collect::<BarrierResult<Vec<_>>>()?;
        Ok(Self { polygons })
    }

    pub fn polygons(&self) -> &[BarrierPolygon] {
        &self.polygons
    }

    pub fn polygon(&self, index: usize) -> &BarrierPolygon {
        &self.polygons[index]
    }

    /// Index of the polygon strictly containing `p`, if any. Boundary
    /// points count as outside.
    pub fn strictly_inside(&self, p: Vector2<f64>) -> Option<usize> {
        self.polygons
            .iter()
            .position(|poly| poly.contains(p) && !poly.on_boundary(p, BOUNDARY_EPS))
    }

    /// All intersections of segment `a → b` with any polygon edge, sorted
    /// by the parameter along the segment.
    pub fn segment_hits(&self, a: Vector2<f64>, b: Vector2<f64>) -> Vec<Hit> {
        let mut hits = Vec::new();
        for (pi, poly) in self.polygons.iter().enumerate() {
            for ei in 0..poly.len() {
                let (c, d) = poly.edge(ei);
                if let Some((t, point)) = segment_intersection(a, b, c, d) {
                    hits.push(Hit { t, polygon: pi, edge: ei, point });
                }
            }
        }
        hits.sort_by(|x, y| x.t.partial_cmp(&y.t).unwrap_or(std::cmp::Ordering::Equal));
        hits
    }

    /// Whether segment `a → b` transits a boundary away from its
    /// endpoints. Grazing contacts at `t ≈ 0` or `t ≈ 1` are ignored so
    /// boundary-hugging corrected paths are stable.
    pub fn crosses(&self, a: Vector2<f64>, b: Vector2<f64>) -> bool {
        const END_EPS: f64 = 1e-9;
        self.segment_hits(a, b)
            .iter()
            .any(|hit| hit.t > END_EPS && hit.t < 1.0 - END_EPS)
    }

    /// Closest boundary point over all polygons, with its polygon index.
    pub fn nearest_boundary(&self, p: Vector2<f64>) -> Option<(usize, Vector2<f64>)> {
        self.polygons
            .iter()
            .enumerate()
            .map(|(i, poly)| (i, poly.nearest_boundary_point(p)))
            .min_by(|(_, a), (_, b)| {
                (p - a)
                    .norm()
                    .partial_cmp(&(p - b).norm())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}

// ---- Planar primitives ----

/// Distance from `p` to segment `a → b`.
pub fn point_segment_distance(p: Vector2<f64>, a: Vector2<f64>, b: Vector2<f64>) -> f64 {
    (p - project_on_segment(p, a, b)).norm()
}

/// Closest point to `p` on segment `a → b`.
fn project_on_segment(p: Vector2<f64>, a: Vector2<f64>, b: Vector2<f64>) -> Vector2<f64> {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 == 0.0 {
        return a;
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    a + ab * t
}

fn cross2(a: Vector2<f64>, b: Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Proper intersection of segments `a → b` and `c → d`.
///
/// Returns the parameter along `a → b` and the intersection point.
/// Parallel and collinear overlaps return `None`; the boundary band
/// absorbs those grazing cases.
pub fn segment_intersection(
    a: Vector2<f64>,
    b: Vector2<f64>,
    c: Vector2<f64>,
    d: Vector2<f64>,
) -> Option<(f64, Vector2<f64>)> {
    let r = b - a;
    let s = d - c;
    let denom = cross2(r, s);
    if denom.abs() < 1e-15 {
        return None;
    }
    let t = cross2(c - a, s) / denom;
    let u = cross2(c - a, r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some((t, a + r * t))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Polygon validation.
    // - Containment with the boundary band (boundary counts as outside).
    // - Segment/edge intersection and the crossing predicate.
    // - Perimeter corner walks in both directions.
    // -------------------------------------------------------------------------

    fn unit_square() -> BarrierGeometry {
        BarrierGeometry::new(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]]).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Degenerate and non-finite rings are rejected with polygon indices.
    fn validation_rejects_bad_rings() {
        assert!(matches!(
            BarrierGeometry::new(vec![vec![[0.0, 0.0], [1.0, 0.0]]]),
            Err(BarrierError::DegeneratePolygon { index: 0, vertices: 2 })
        ));
        assert!(matches!(
            BarrierGeometry::new(vec![
                vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]],
                vec![[0.0, 0.0], [f64::NAN, 0.0], [1.0, 1.0]],
            ]),
            Err(BarrierError::NonFiniteVertex { polygon: 1, vertex: 1 })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Interior points are strictly inside, exterior points are not, and
    // boundary points count as outside.
    fn containment_honors_the_boundary_band() {
        let geo = unit_square();
        assert!(!geo.polygon(0).is_empty());
        assert_eq!(geo.strictly_inside(Vector2::new(0.5, 0.5)), Some(0));
        assert_eq!(geo.strictly_inside(Vector2::new(2.0, 0.5)), None);
        assert_eq!(geo.strictly_inside(Vector2::new(1.0, 0.5)), None);
        assert_eq!(geo.strictly_inside(Vector2::new(0.0, 0.0)), None);
    }

    #[test]
    // Purpose
    // -------
    // A transiting segment reports two sorted hits; a clear segment none.
    fn segment_hits_are_sorted_and_complete() {
        // Arrange
        let geo = unit_square();

        // Act
        let hits = geo.segment_hits(Vector2::new(-1.0, 0.5), Vector2::new(2.0, 0.5));

        // Assert
        assert_eq!(hits.len(), 2);
        assert!(hits[0].t < hits[1].t);
        assert_relative_eq!(hits[0].point.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(hits[1].point.x, 1.0, epsilon = 1e-12);

        assert!(geo.segment_hits(Vector2::new(-1.0, 2.0), Vector2::new(2.0, 2.0)).is_empty());
    }

    #[test]
    // Purpose
    // -------
    // The crossing predicate fires for transits but not for segments that
    // merely touch the boundary at an endpoint.
    fn crossing_ignores_endpoint_grazing() {
        let geo = unit_square();
        assert!(geo.crosses(Vector2::new(-1.0, 0.5), Vector2::new(2.0, 0.5)));
        // Starts exactly on the left edge and leaves outward.
        assert!(!geo.crosses(Vector2::new(0.0, 0.5), Vector2::new(-1.0, 0.5)));
    }

    #[test]
    // Purpose
    // -------
    // Corner walks enumerate the vertices between two edges in each
    // direction, and share-an-edge walks are empty.
    fn corner_walks_enumerate_perimeter_vertices() {
        let geo = unit_square();
        let poly = geo.polygon(0);

        // Entry on bottom edge (0), exit on top edge (2).
        let up = poly.corner_walk(0, 2, true);
        assert_eq!(up, vec![Vector2::new(1.0, 0.0), Vector2::new(1.0, 1.0)]);

        let down = poly.corner_walk(0, 2, false);
        assert_eq!(down, vec![Vector2::new(0.0, 0.0), Vector2::new(0.0, 1.0)]);

        assert!(poly.corner_walk(1, 1, true).is_empty());
        assert!(poly.corner_walk(1, 1, false).is_empty());
    }

    #[test]
    // Purpose
    // -------
    // Nearest boundary points project onto edges, not just vertices.
    fn nearest_boundary_projects_onto_edges() {
        let geo = unit_square();
        let (poly, q) = geo.nearest_boundary(Vector2::new(0.5, 0.2)).unwrap();
        assert_eq!(poly, 0);
        assert_relative_eq!(q.x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(q.y, 0.0, epsilon = 1e-12);
    }
}
