//! Clipped Voronoi cell construction
//!
//! Every cell starts as a frame rectangle that covers the region and all
//! sites, and is cut down by the perpendicular bisector towards each
//! Delaunay neighbour. Unbounded cells at the hull are thereby closed by the
//! frame, and the result is intersected with the region.

use geo::{BooleanOps, Coord, Intersects, MultiPolygon, Point, Polygon};

use crate::config::ClipPolicy;
use crate::error::{ArtError, Result};
use crate::geometry::{
    bounding_rect_of, clip_to_bisector, expand_rect, merge_rects, polygon_from_vertices,
    rect_corners, Clipped,
};
use crate::region::Region;

use super::delaunay::voronoi_neighbors;

/// Geometry of each site's cell, in input order
///
/// `positions` drive the Voronoi construction (they may be perturbed);
/// `anchors` are the sites' true positions, used to pick the fragment under
/// [`ClipPolicy::KeepSiteFragment`].
pub fn build_cell_geometries(
    region: &Region,
    positions: &[Coord<f64>],
    anchors: &[Coord<f64>],
    policy: ClipPolicy,
    sliver_area: f64,
) -> Result<Vec<MultiPolygon<f64>>> {
    if positions.len() == 1 {
        return Ok(vec![region.polygons().clone()]);
    }

    let neighbors = voronoi_neighbors(positions)?;

    let site_bounds = bounding_rect_of(positions)
        .ok_or_else(|| ArtError::TessellationFailed("no sites to tessellate".to_string()))?;
    let covered = merge_rects(region.bounds(), site_bounds);
    let margin = covered.width().max(covered.height()).max(1.0);
    let frame = rect_corners(expand_rect(covered, margin));

    positions
        .iter()
        .enumerate()
        .map(|(i, &site)| {
            let mut vertices = frame.clone();
            for &j in &neighbors[i] {
                vertices = clip_to_bisector(&vertices, site, positions[j]);
                if vertices.len() < 3 {
                    return Err(ArtError::TessellationFailed(format!(
                        "cell of site {} collapsed while clipping against site {}",
                        i, j
                    )));
                }
            }

            let cell = polygon_from_vertices(vertices);
            let clipped = Clipped::classify(cell.intersection(region.polygons()), sliver_area);
            Ok(apply_policy(clipped, anchors[i], policy))
        })
        .collect()
}

fn apply_policy(clipped: Clipped, anchor: Coord<f64>, policy: ClipPolicy) -> MultiPolygon<f64> {
    match (clipped, policy) {
        (Clipped::MultiPiece(pieces), ClipPolicy::KeepSiteFragment) => {
            MultiPolygon::new(vec![site_fragment(pieces, anchor)])
        }
        (clipped, _) => clipped.into_multi_polygon(),
    }
}

/// The piece holding the site; the largest piece if rounding put the site
/// just outside all of them
fn site_fragment(pieces: MultiPolygon<f64>, anchor: Coord<f64>) -> Polygon<f64> {
    use geo::Area;

    let anchor = Point::from(anchor);
    let mut pieces = pieces.0;
    if let Some(at) = pieces.iter().position(|p| p.intersects(&anchor)) {
        return pieces.swap_remove(at);
    }

    let largest = pieces
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.unsigned_area().total_cmp(&b.unsigned_area()))
        .map(|(i, _)| i)
        .unwrap_or(0);
    pieces.swap_remove(largest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area};

    fn region(polygons: Vec<Polygon<f64>>) -> Region {
        Region::new(MultiPolygon::new(polygons)).unwrap()
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
        ]
    }

    #[test]
    fn test_single_site_gets_whole_region() {
        let region = region(vec![rect(0.0, 0.0, 4.0, 4.0), rect(10.0, 0.0, 12.0, 2.0)]);
        let sites = [Coord { x: 1.0, y: 1.0 }];
        let cells = build_cell_geometries(&region, &sites, &sites, ClipPolicy::UnionFragments, 0.0).unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(&cells[0], region.polygons());
    }

    #[test]
    fn test_two_sites_split_at_bisector() {
        let region = region(vec![rect(-5.0, -5.0, 15.0, 5.0)]);
        let sites = [Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 0.0 }];
        let cells = build_cell_geometries(&region, &sites, &sites, ClipPolicy::UnionFragments, 0.0).unwrap();

        assert!((cells[0].unsigned_area() - 100.0).abs() < 1e-6);
        assert!((cells[1].unsigned_area() - 100.0).abs() < 1e-6);
        assert!(cells[0].0[0].exterior().coords().all(|c| c.x <= 5.0 + 1e-6));
        assert!(cells[1].0[0].exterior().coords().all(|c| c.x >= 5.0 - 1e-6));
    }

    #[test]
    fn test_split_cell_policies() {
        // a U-shaped region: site 0 sits in the left arm, site 1 in the
        // bottom right, so site 0's unclipped cell also covers the right arm's top
        let region = region(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 8.0, y: 10.0),
            (x: 8.0, y: 2.0),
            (x: 2.0, y: 2.0),
            (x: 2.0, y: 10.0),
            (x: 0.0, y: 10.0),
        ]]);
        let sites = [Coord { x: 1.0, y: 9.0 }, Coord { x: 9.0, y: 1.0 }];

        let union = build_cell_geometries(&region, &sites, &sites, ClipPolicy::UnionFragments, 1e-6).unwrap();
        let total: f64 = union.iter().map(|c| c.unsigned_area()).sum();
        assert!((total - region.area()).abs() < 1e-6);

        assert_eq!(union[0].0.len(), 2);

        let keep = build_cell_geometries(&region, &sites, &sites, ClipPolicy::KeepSiteFragment, 1e-6).unwrap();
        for (cell, site) in keep.iter().zip(&sites) {
            assert_eq!(cell.0.len(), 1);
            assert!(cell.intersects(&Point::from(*site)));
        }
    }

    #[test]
    fn test_lone_site_keeps_every_part() {
        let region = region(vec![rect(0.0, 0.0, 4.0, 4.0), rect(6.0, 0.0, 10.0, 4.0)]);
        let sites = [Coord { x: 1.0, y: 1.0 }];

        let keep = build_cell_geometries(&region, &sites, &sites, ClipPolicy::KeepSiteFragment, 1e-6).unwrap();
        assert_eq!(keep.len(), 1);
        assert_eq!(keep[0].0.len(), 2);
        assert!((keep[0].unsigned_area() - region.area()).abs() < 1e-6);
    }

    #[test]
    fn test_collinear_sites_fail() {
        let region = region(vec![rect(0.0, 0.0, 10.0, 10.0)]);
        let sites = [
            Coord { x: 1.0, y: 5.0 },
            Coord { x: 5.0, y: 5.0 },
            Coord { x: 9.0, y: 5.0 },
        ];
        let result = build_cell_geometries(&region, &sites, &sites, ClipPolicy::UnionFragments, 0.0);
        assert!(matches!(result, Err(ArtError::TessellationFailed(_))));
    }
}
