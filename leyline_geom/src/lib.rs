// Exact integer planar geometry for the Leyline territory engine.
//
// Everything here operates on the horizontal (x, z) plane of the voxel
// world. Link segments and triangle fields are geometric objects whose
// predicates must be exact: a near-parallel enemy link must be classified
// identically on every platform, every time. All tests are therefore
// integer cross-product sign comparisons widened to i128 — no floating
// point, no epsilon thresholds.
//
// This crate is the single geometry kernel used by `leyline_engine`:
// the link validator's crossing test, the triangle detector's field
// polygons, and the coverage rasterizer all draw from here.
//
// **Critical constraint: determinism.** Every predicate must produce
// identical output for identical input regardless of platform, compiler
// version, or optimization level. Do not introduce floating-point
// arithmetic anywhere in this crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A column of the voxel world: an integer position on the (x, z) plane.
///
/// The coordinate system matches the world grid:
/// - X: east  (positive) / west  (negative)
/// - Z: south (positive) / north (negative)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i32,
    pub z: i32,
}

impl GridPoint {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Squared Euclidean distance between two columns.
    ///
    /// Coordinate differences span up to 2^32 - 1, so their squares need
    /// i128 — the sum overflows i64 at the corners of the world.
    pub fn distance_sq(self, other: Self) -> i128 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dz = i64::from(self.z) - i64::from(other.z);
        i128::from(dx) * i128::from(dx) + i128::from(dz) * i128::from(dz)
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// A line segment between two columns — the geometry of a link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub a: GridPoint,
    pub b: GridPoint,
}

impl Segment {
    pub const fn new(a: GridPoint, b: GridPoint) -> Self {
        Self { a, b }
    }
}

/// Which way the path a -> b -> c turns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Clockwise,
    CounterClockwise,
    Collinear,
}

/// Twice the signed area of the triangle (a, b, c).
///
/// Positive for a counter-clockwise turn in the right-handed (x, z)
/// plane. Differences of i32 coordinates fit in i64; their products need
/// i128, which is exact.
fn cross(a: GridPoint, b: GridPoint, c: GridPoint) -> i128 {
    let abx = i64::from(b.x) - i64::from(a.x);
    let abz = i64::from(b.z) - i64::from(a.z);
    let acx = i64::from(c.x) - i64::from(a.x);
    let acz = i64::from(c.z) - i64::from(a.z);
    i128::from(abx) * i128::from(acz) - i128::from(abz) * i128::from(acx)
}

/// Exact orientation of the path a -> b -> c.
pub fn orientation(a: GridPoint, b: GridPoint, c: GridPoint) -> Orientation {
    match cross(a, b, c).signum() {
        1 => Orientation::CounterClockwise,
        -1 => Orientation::Clockwise,
        _ => Orientation::Collinear,
    }
}

/// Test whether two segments properly cross.
///
/// A proper crossing is a single interior intersection point: the
/// endpoints of each segment lie strictly on opposite sides of the other
/// segment's supporting line. Shared endpoints, endpoint-on-interior
/// touches, and collinear overlaps are all *not* crossings — the game
/// permits links that meet at a beacon or run along each other.
pub fn segments_properly_cross(s: Segment, t: Segment) -> bool {
    let d1 = cross(s.a, s.b, t.a).signum();
    let d2 = cross(s.a, s.b, t.b).signum();
    let d3 = cross(t.a, t.b, s.a).signum();
    let d4 = cross(t.a, t.b, s.b).signum();
    d1 * d2 < 0 && d3 * d4 < 0
}

/// A triangle on the column grid — the polygon of a territory field.
///
/// Vertices are stored as given; rasterization normalizes the winding
/// internally, so vertex order does not affect which columns are covered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub v: [GridPoint; 3],
}

impl Triangle {
    pub const fn new(a: GridPoint, b: GridPoint, c: GridPoint) -> Self {
        Self { v: [a, b, c] }
    }

    /// Twice the signed area; zero when the vertices are collinear.
    pub fn signed_area2(&self) -> i128 {
        cross(self.v[0], self.v[1], self.v[2])
    }

    /// A degenerate (collinear or duplicate-vertex) triangle covers
    /// nothing and can never become a field.
    pub fn is_degenerate(&self) -> bool {
        self.signed_area2() == 0
    }

    /// Axis-aligned bounding box as (min corner, max corner), inclusive.
    pub fn bounding_box(&self) -> (GridPoint, GridPoint) {
        let min_x = self.v.iter().map(|p| p.x).min().unwrap_or(0);
        let max_x = self.v.iter().map(|p| p.x).max().unwrap_or(0);
        let min_z = self.v.iter().map(|p| p.z).min().unwrap_or(0);
        let max_z = self.v.iter().map(|p| p.z).max().unwrap_or(0);
        (GridPoint::new(min_x, min_z), GridPoint::new(max_x, max_z))
    }

    /// Vertices in counter-clockwise order (swaps two vertices if the
    /// stored winding is clockwise). Degenerate triangles are returned
    /// as stored.
    fn ccw(&self) -> [GridPoint; 3] {
        if self.signed_area2() < 0 {
            [self.v[0], self.v[2], self.v[1]]
        } else {
            self.v
        }
    }

    /// Test whether this triangle covers a column, with a consistent
    /// boundary rule.
    ///
    /// Interior columns are always covered. A column exactly on an edge
    /// is covered only when that edge's direction (in CCW winding) is
    /// "positive": dz > 0, or dz == 0 with dx < 0. Two adjacent
    /// triangles traverse a shared edge in opposite directions, so each
    /// boundary column belongs to exactly one of them — the top-left
    /// fill rule that keeps coverage counts exact across shared edges.
    pub fn covers(&self, p: GridPoint) -> bool {
        if self.is_degenerate() {
            return false;
        }
        let v = self.ccw();
        for i in 0..3 {
            let a = v[i];
            let b = v[(i + 1) % 3];
            let e = cross(a, b, p);
            if e < 0 {
                return false;
            }
            if e == 0 {
                let dz = i64::from(b.z) - i64::from(a.z);
                let dx = i64::from(b.x) - i64::from(a.x);
                let positive_direction = dz > 0 || (dz == 0 && dx < 0);
                if !positive_direction {
                    return false;
                }
            }
        }
        true
    }

    /// Rasterize: every covered column, scanning the bounding box in
    /// (z, x) order. The scan is bounded by the triangle's own box, not
    /// the world, so cost scales with field size.
    pub fn columns(&self) -> Vec<GridPoint> {
        let mut out = Vec::new();
        if self.is_degenerate() {
            return out;
        }
        let (min, max) = self.bounding_box();
        for z in min.z..=max.z {
            for x in min.x..=max.x {
                let p = GridPoint::new(x, z);
                if self.covers(p) {
                    out.push(p);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_basics() {
        let o = GridPoint::new(0, 0);
        let e = GridPoint::new(10, 0);
        let n = GridPoint::new(10, 10);
        assert_eq!(orientation(o, e, n), Orientation::CounterClockwise);
        assert_eq!(orientation(o, n, e), Orientation::Clockwise);
        assert_eq!(orientation(o, e, GridPoint::new(20, 0)), Orientation::Collinear);
    }

    #[test]
    fn orientation_exact_at_extreme_coordinates() {
        // Products of coordinate differences near i32 extremes overflow
        // i64; the i128 widening must stay exact.
        let a = GridPoint::new(i32::MIN, i32::MIN);
        let b = GridPoint::new(i32::MAX, i32::MAX);
        let c = GridPoint::new(i32::MAX, i32::MAX - 1);
        assert_eq!(orientation(a, b, c), Orientation::Clockwise);
        assert_eq!(orientation(a, c, b), Orientation::CounterClockwise);
    }

    #[test]
    fn distance_sq_exact_at_extreme_spans() {
        let span = i128::from(u32::MAX);
        let a = GridPoint::new(i32::MIN, 0);
        let b = GridPoint::new(i32::MAX, 0);
        assert_eq!(a.distance_sq(b), span * span);
        let c = GridPoint::new(i32::MIN, i32::MIN);
        let d = GridPoint::new(i32::MAX, i32::MAX);
        assert_eq!(c.distance_sq(d), 2 * span * span);
        assert_eq!(d.distance_sq(d), 0);
    }

    #[test]
    fn proper_crossing_detected() {
        let s = Segment::new(GridPoint::new(0, 0), GridPoint::new(10, 10));
        let t = Segment::new(GridPoint::new(0, 10), GridPoint::new(10, 0));
        assert!(segments_properly_cross(s, t));
        assert!(segments_properly_cross(t, s));
    }

    #[test]
    fn shared_endpoint_is_not_a_crossing() {
        let s = Segment::new(GridPoint::new(0, 0), GridPoint::new(10, 0));
        let t = Segment::new(GridPoint::new(10, 0), GridPoint::new(10, 10));
        assert!(!segments_properly_cross(s, t));
    }

    #[test]
    fn endpoint_touching_interior_is_not_a_crossing() {
        // t ends exactly on the interior of s.
        let s = Segment::new(GridPoint::new(0, 0), GridPoint::new(10, 0));
        let t = Segment::new(GridPoint::new(5, 0), GridPoint::new(5, 10));
        assert!(!segments_properly_cross(s, t));
    }

    #[test]
    fn collinear_overlap_is_not_a_crossing() {
        let s = Segment::new(GridPoint::new(0, 0), GridPoint::new(10, 0));
        let t = Segment::new(GridPoint::new(5, 0), GridPoint::new(15, 0));
        assert!(!segments_properly_cross(s, t));
    }

    #[test]
    fn disjoint_segments_do_not_cross() {
        let s = Segment::new(GridPoint::new(0, 0), GridPoint::new(10, 0));
        let t = Segment::new(GridPoint::new(0, 5), GridPoint::new(10, 5));
        assert!(!segments_properly_cross(s, t));
    }

    #[test]
    fn near_parallel_crossing_is_exact() {
        // Segments that cross at a very shallow angle — a float-threshold
        // test would waver here; the sign test must not.
        let s = Segment::new(GridPoint::new(0, 0), GridPoint::new(1_000_000, 1));
        let t = Segment::new(GridPoint::new(0, 1), GridPoint::new(1_000_000, 0));
        assert!(segments_properly_cross(s, t));
    }

    #[test]
    fn triangle_winding_does_not_change_coverage() {
        let a = GridPoint::new(0, 0);
        let b = GridPoint::new(10, 0);
        let c = GridPoint::new(0, 10);
        let ccw = Triangle::new(a, b, c);
        let cw = Triangle::new(a, c, b);
        assert_eq!(ccw.columns(), cw.columns());
    }

    #[test]
    fn degenerate_triangle_covers_nothing() {
        let t = Triangle::new(GridPoint::new(0, 0), GridPoint::new(5, 5), GridPoint::new(10, 10));
        assert!(t.is_degenerate());
        assert!(t.columns().is_empty());
        assert!(!t.covers(GridPoint::new(5, 5)));
    }

    #[test]
    fn right_triangle_column_count() {
        // For the triangle (0,0)-(10,0)-(0,10) the boundary rule keeps
        // the hypotenuse and drops the two axis-aligned edges, leaving
        // the columns with x >= 1, z >= 1, x + z <= 10: 45 in total.
        let t = Triangle::new(GridPoint::new(0, 0), GridPoint::new(10, 0), GridPoint::new(0, 10));
        let cols = t.columns();
        assert_eq!(cols.len(), 45);
        for p in &cols {
            assert!(p.x >= 1 && p.z >= 1 && p.x + p.z <= 10);
        }
    }

    #[test]
    fn shared_edge_belongs_to_exactly_one_triangle() {
        // Two triangles splitting the square (0,0)-(10,10) along its
        // diagonal: every column of the square interior must be covered
        // by exactly one of them.
        let lower = Triangle::new(GridPoint::new(0, 0), GridPoint::new(10, 0), GridPoint::new(10, 10));
        let upper = Triangle::new(GridPoint::new(0, 0), GridPoint::new(10, 10), GridPoint::new(0, 10));
        for z in 1..10 {
            for x in 1..10 {
                let p = GridPoint::new(x, z);
                let count = usize::from(lower.covers(p)) + usize::from(upper.covers(p));
                assert_eq!(count, 1, "column {p} covered {count} times");
            }
        }
    }

    #[test]
    fn covers_agrees_with_columns() {
        let t = Triangle::new(GridPoint::new(-5, -5), GridPoint::new(7, -2), GridPoint::new(1, 9));
        let cols = t.columns();
        let (min, max) = t.bounding_box();
        let mut recount = 0;
        for z in min.z..=max.z {
            for x in min.x..=max.x {
                if t.covers(GridPoint::new(x, z)) {
                    recount += 1;
                }
            }
        }
        assert_eq!(recount, cols.len());
    }

    #[test]
    fn bounding_box_is_tight() {
        let t = Triangle::new(GridPoint::new(-3, 4), GridPoint::new(8, -1), GridPoint::new(2, 12));
        let (min, max) = t.bounding_box();
        assert_eq!(min, GridPoint::new(-3, -1));
        assert_eq!(max, GridPoint::new(8, 12));
    }

    #[test]
    fn grid_point_serialization_roundtrip() {
        let p = GridPoint::new(-17, 42);
        let json = serde_json::to_string(&p).unwrap();
        let restored: GridPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(p, restored);
    }
}
