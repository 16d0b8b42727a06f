//! Voronoi neighbours from the Delaunay triangulation
//!
//! Two sites share a Voronoi edge exactly when they share a Delaunay edge, so
//! a site's cell is the intersection of the half-planes towards its Delaunay
//! neighbours only. The triangulation comes from `delaunator`.

use delaunator::{next_halfedge, triangulate, Point};
use geo::Coord;

use crate::error::{ArtError, Result};

/// Neighbour lists, indexed by site; each list is sorted and unique
///
/// # Errors
///
/// Returns `TessellationFailed` when three or more sites produce no
/// triangle, which happens when they are all collinear.
pub fn voronoi_neighbors(positions: &[Coord<f64>]) -> Result<Vec<Vec<usize>>> {
    match positions.len() {
        0 => return Ok(Vec::new()),
        1 => return Ok(vec![Vec::new()]),
        2 => return Ok(vec![vec![1], vec![0]]),
        _ => {}
    }

    let points: Vec<Point> = positions.iter().map(|p| Point { x: p.x, y: p.y }).collect();
    let triangulation = triangulate(&points);

    if triangulation.triangles.is_empty() {
        return Err(ArtError::TessellationFailed(format!(
            "{} sites are collinear, no triangulation exists",
            positions.len()
        )));
    }

    let mut neighbors = vec![Vec::new(); positions.len()];
    for e in 0..triangulation.triangles.len() {
        let a = triangulation.triangles[e];
        let b = triangulation.triangles[next_halfedge(e)];
        neighbors[a].push(b);
        neighbors[b].push(a);
    }

    for (site, list) in neighbors.iter_mut().enumerate() {
        list.sort_unstable();
        list.dedup();
        if list.is_empty() {
            return Err(ArtError::TessellationFailed(format!(
                "site {} is missing from the triangulation",
                site
            )));
        }
    }

    Ok(neighbors)
}
