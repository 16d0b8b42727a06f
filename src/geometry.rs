//! Planar geometry helpers shared by the region builder and tessellation
//!
//! Boolean operations from `geo` always return a `MultiPolygon`, which may
//! contain zero-area rings left over from touching edges. [`Clipped`] is the
//! tagged view of such a result after those slivers have been removed.

use geo::{Area, BooleanOps, Coord, LineString, MultiPolygon, Polygon, Rect};

/// Result of a boolean operation, classified after dropping degenerate parts
#[derive(Debug, Clone, PartialEq)]
pub enum Clipped {
    /// Nothing with positive area is left
    Empty,
    /// Exactly one proper polygon
    Polygon(Polygon<f64>),
    /// Two or more disjoint proper polygons
    MultiPiece(MultiPolygon<f64>),
}

impl Clipped {
    /// Classify a boolean-op result, keeping polygons with area above `min_area`
    pub fn classify(result: MultiPolygon<f64>, min_area: f64) -> Self {
        let mut pieces: Vec<Polygon<f64>> = result
            .into_iter()
            .filter(|p| is_proper_polygon(p, min_area))
            .collect();

        match pieces.len() {
            0 => Clipped::Empty,
            1 => Clipped::Polygon(pieces.remove(0)),
            _ => Clipped::MultiPiece(MultiPolygon::new(pieces)),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Clipped::Empty)
    }

    pub fn into_multi_polygon(self) -> MultiPolygon<f64> {
        match self {
            Clipped::Empty => MultiPolygon::new(vec![]),
            Clipped::Polygon(p) => MultiPolygon::new(vec![p]),
            Clipped::MultiPiece(mp) => mp,
        }
    }
}

/// A ring needs three distinct vertices plus the closing one
fn is_proper_polygon(polygon: &Polygon<f64>, min_area: f64) -> bool {
    polygon.exterior().0.len() >= 4 && polygon.unsigned_area() > min_area
}

/// Union of many polygons
///
/// Folds pairwise; inputs are the handful of land polygons touching one city,
/// so the quadratic worst case does not matter.
pub fn union_all<'a>(polygons: impl IntoIterator<Item = &'a Polygon<f64>>) -> MultiPolygon<f64> {
    polygons
        .into_iter()
        .fold(MultiPolygon::new(vec![]), |acc, polygon| acc.union(polygon))
}

/// Bounding rectangle of a set of points
pub fn bounding_rect_of(points: &[Coord<f64>]) -> Option<Rect<f64>> {
    let first = points.first()?;
    let (mut min, mut max) = (*first, *first);
    for p in &points[1..] {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    Some(Rect::new(min, max))
}

/// Smallest rectangle covering both `a` and `b`
pub fn merge_rects(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        Coord {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        },
    )
}

/// Grow a rectangle by `margin` on every side
pub fn expand_rect(rect: Rect<f64>, margin: f64) -> Rect<f64> {
    Rect::new(
        Coord {
            x: rect.min().x - margin,
            y: rect.min().y - margin,
        },
        Coord {
            x: rect.max().x + margin,
            y: rect.max().y + margin,
        },
    )
}

/// Counter-clockwise corners of a rectangle, not closed
pub fn rect_corners(rect: Rect<f64>) -> Vec<Coord<f64>> {
    let (min, max) = (rect.min(), rect.max());
    vec![
        min,
        Coord { x: max.x, y: min.y },
        max,
        Coord { x: min.x, y: max.y },
    ]
}

/// Clip a convex polygon to the half-plane of points at least as close to
/// `site` as to `other`
///
/// Sutherland-Hodgman against the perpendicular bisector of `site` and
/// `other`. Points exactly on the bisector are kept.
pub fn clip_to_bisector(polygon: &[Coord<f64>], site: Coord<f64>, other: Coord<f64>) -> Vec<Coord<f64>> {
    let normal = other - site;
    let mid = Coord {
        x: (site.x + other.x) / 2.0,
        y: (site.y + other.y) / 2.0,
    };
    // signed distance along `normal`; <= 0 is the site's side
    let side = |p: Coord<f64>| (p.x - mid.x) * normal.x + (p.y - mid.y) * normal.y;

    let mut output = Vec::with_capacity(polygon.len() + 1);
    for i in 0..polygon.len() {
        let s = polygon[i];
        let e = polygon[(i + 1) % polygon.len()];
        let (ds, de) = (side(s), side(e));

        match (ds <= 0.0, de <= 0.0) {
            (true, true) => output.push(e),
            (false, true) => {
                output.push(crossing(s, e, ds, de));
                output.push(e);
            }
            (true, false) => output.push(crossing(s, e, ds, de)),
            (false, false) => {}
        }
    }

    output
}

fn crossing(s: Coord<f64>, e: Coord<f64>, ds: f64, de: f64) -> Coord<f64> {
    let t = ds / (ds - de);
    Coord {
        x: s.x + t * (e.x - s.x),
        y: s.y + t * (e.y - s.y),
    }
}

/// Close an open vertex list into a polygon without holes
pub fn polygon_from_vertices(vertices: Vec<Coord<f64>>) -> Polygon<f64> {
    // LineString -> Polygon closes the ring
    Polygon::new(LineString::new(vertices), vec![])
}
