//! Nearest-site lookups
//!
//! This module is only available with the `spatial-index` feature.

use geo::Coord;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;

/// KD-tree over projected site positions
///
/// The nearest site to a point is the site whose Voronoi cell contains it,
/// so this answers "which cell owns this point" in O(log n) without touching
/// cell geometry.
#[derive(Clone)]
pub struct SiteLocator {
    tree: ImmutableKdTree<f64, usize, 2, 32>,
}

impl SiteLocator {
    /// Build the locator from site positions; item `i` is `positions[i]`
    ///
    /// Returns `None` for an empty slice.
    pub fn new(positions: &[Coord<f64>]) -> Option<Self> {
        if positions.is_empty() {
            return None;
        }

        let points: Vec<[f64; 2]> = positions.iter().map(|p| [p.x, p.y]).collect();

        Some(Self {
            tree: ImmutableKdTree::new_from_slice(&points),
        })
    }

    /// Index of the site nearest to `point`
    pub fn nearest(&self, point: Coord<f64>) -> usize {
        let result = self.tree.nearest_one::<SquaredEuclidean>(&[point.x, point.y]);
        result.item as usize
    }
}
