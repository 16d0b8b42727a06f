//! Tessellation engine
//!
//! Partitions a [`Region`] into one clipped Voronoi [`Cell`] per projected
//! site. Cell shapes come from the Delaunay neighbours of each site (via
//! `delaunator`), are closed by a frame around the region and intersected
//! with the region's polygons.

mod dedup;
mod delaunay;
mod perturb;
mod voronoi;

pub use dedup::{count_duplicates, dedup_sites};
pub use delaunay::voronoi_neighbors;
pub use perturb::perturb;

use std::time::Instant;

use geo::{Area, Coord};
use tracing::{debug, warn};

use crate::cell::Cell;
use crate::config::{ArtworkConfig, ClipPolicy};
use crate::error::{ArtError, Result};
use crate::region::Region;
use crate::site::ProjectedSite;

#[cfg(feature = "spatial-index")]
use crate::spatial::SiteLocator;

/// The cells of one region, in the order of the sites that own them
#[derive(Clone)]
pub struct Tessellation {
    cells: Vec<Cell>,

    /// Nearest-site lookup (requires spatial-index feature)
    #[cfg(feature = "spatial-index")]
    locator: Option<SiteLocator>,
}

impl Tessellation {
    /// A tessellation without cells, produced for zero sites
    pub fn empty() -> Self {
        Self {
            cells: Vec::new(),
            #[cfg(feature = "spatial-index")]
            locator: None,
        }
    }

    fn from_cells(cells: Vec<Cell>) -> Self {
        #[cfg(feature = "spatial-index")]
        let locator = {
            let positions: Vec<Coord<f64>> = cells.iter().map(|c| c.site_position).collect();
            SiteLocator::new(&positions)
        };

        Self {
            cells,
            #[cfg(feature = "spatial-index")]
            locator,
        }
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Summed area of every cell
    pub fn total_area(&self) -> f64 {
        self.cells.iter().map(Cell::area).sum()
    }

    /// The cell whose geometry contains `point`
    ///
    /// Returns `None` outside the region, and for points in a detached piece
    /// dropped under [`ClipPolicy::KeepSiteFragment`].
    #[cfg(feature = "spatial-index")]
    pub fn locate(&self, point: Coord<f64>) -> Option<&Cell> {
        let nearest = self.locator.as_ref()?.nearest(point);
        self.cells.get(nearest).filter(|cell| cell.contains(point))
    }

    /// The cell whose geometry contains `point`
    #[cfg(not(feature = "spatial-index"))]
    pub fn locate(&self, point: Coord<f64>) -> Option<&Cell> {
        self.cells.iter().find(|cell| cell.contains(point))
    }
}

impl std::fmt::Debug for Tessellation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tessellation").field("cells", &self.cells).finish()
    }
}

/// Compute the clipped Voronoi partition of `region`
///
/// Produces exactly one cell per site, in site order. Sites must already be
/// inside the region and free of duplicate coordinates (see
/// [`dedup_sites`]).
///
/// When the construction fails on degenerate input (collinear sites, cells
/// collapsing under rounding), it is retried up to `config.max_retries`
/// times with every site moved by a seeded offset of at most
/// `config.perturbation_epsilon`. The cells keep the sites' true positions.
///
/// # Errors
///
/// - `DegenerateSiteSet` if two sites share a coordinate
/// - `TessellationFailed` if every attempt fails, or the cells do not cover
///   the region within `config.coverage_tolerance`
///
/// # Example
///
/// ```
/// use city_voronoi::*;
/// use geo::{polygon, Coord, MultiPolygon};
///
/// let region = Region::new(MultiPolygon::new(vec![polygon![
///     (x: -5.0, y: -5.0), (x: 15.0, y: -5.0), (x: 15.0, y: 5.0), (x: -5.0, y: 5.0),
/// ]])).unwrap();
/// let red = Color::new(1.0, 0.0, 0.0).unwrap();
/// let green = Color::new(0.0, 1.0, 0.0).unwrap();
/// let sites = vec![
///     ProjectedSite::new(SiteId::from("a"), Coord { x: 0.0, y: 0.0 }, red),
///     ProjectedSite::new(SiteId::from("b"), Coord { x: 10.0, y: 0.0 }, green),
/// ];
///
/// let tessellation = tessellate(&region, &sites, &ArtworkConfig::default()).unwrap();
/// assert_eq!(tessellation.len(), 2);
/// assert_eq!(tessellation.cells()[1].color, green);
/// ```
pub fn tessellate(
    region: &Region,
    sites: &[ProjectedSite],
    config: &ArtworkConfig,
) -> Result<Tessellation> {
    if sites.is_empty() {
        debug!("no sites, empty tessellation");
        return Ok(Tessellation::empty());
    }

    let duplicates = count_duplicates(sites);
    if duplicates > 0 {
        return Err(ArtError::DegenerateSiteSet { duplicates });
    }

    let start = Instant::now();
    let anchors: Vec<Coord<f64>> = sites.iter().map(|s| s.position).collect();

    let mut attempt: u32 = 0;
    let geometries = loop {
        let positions = if attempt == 0 {
            anchors.clone()
        } else {
            perturb(
                &anchors,
                config.perturbation_epsilon,
                config.perturbation_seed,
                attempt,
            )
        };

        let result = voronoi::build_cell_geometries(
            region,
            &positions,
            &anchors,
            config.clip_policy,
            config.sliver_area,
        )
        .and_then(|geometries| {
            check_coverage(region, &geometries, config)?;
            Ok(geometries)
        });

        match result {
            Ok(geometries) => break geometries,
            Err(err) if err.is_retryable() && (attempt as usize) < config.max_retries => {
                attempt += 1;
                warn!(attempt, error = %err, "tessellation failed, retrying with perturbed sites");
            }
            Err(err) => return Err(err),
        }
    };

    let cells: Vec<Cell> = sites
        .iter()
        .zip(geometries)
        .enumerate()
        .map(|(index, (site, geometry))| {
            Cell::new(index, site.id.clone(), site.position, site.color, geometry)
        })
        .collect();

    debug!(
        cells = cells.len(),
        attempts = attempt + 1,
        elapsed = ?start.elapsed(),
        "tessellated region"
    );

    Ok(Tessellation::from_cells(cells))
}

/// Cells must add up to the region; only meaningful when every fragment is kept
fn check_coverage(
    region: &Region,
    geometries: &[geo::MultiPolygon<f64>],
    config: &ArtworkConfig,
) -> Result<()> {
    if config.clip_policy != ClipPolicy::UnionFragments {
        return Ok(());
    }

    let total: f64 = geometries.iter().map(|g| g.unsigned_area()).sum();
    let difference = (total - region.area()).abs();
    if difference > config.coverage_tolerance * region.area() {
        return Err(ArtError::TessellationFailed(format!(
            "cells cover {} of region area {}",
            total,
            region.area()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArtworkConfigBuilder;
    use crate::render::Color;
    use crate::site::SiteId;
    use geo::{polygon, BooleanOps, MultiPolygon};

    fn square_region() -> Region {
        Region::new(MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 100.0, y: 0.0),
            (x: 100.0, y: 100.0),
            (x: 0.0, y: 100.0),
        ]]))
        .unwrap()
    }

    fn site(id: &str, x: f64, y: f64) -> ProjectedSite {
        ProjectedSite::new(
            SiteId::from(id),
            Coord { x, y },
            Color::new(0.5, 0.5, 0.5).unwrap(),
        )
    }

    fn scattered() -> Vec<ProjectedSite> {
        vec![
            site("a", 10.0, 10.0),
            site("b", 80.0, 20.0),
            site("c", 50.0, 50.0),
            site("d", 20.0, 85.0),
            site("e", 90.0, 90.0),
            site("f", 60.0, 75.0),
        ]
    }

    #[test]
    fn test_empty_sites() {
        let tessellation = tessellate(&square_region(), &[], &ArtworkConfig::default()).unwrap();
        assert!(tessellation.is_empty());
        assert!(tessellation.locate(Coord { x: 50.0, y: 50.0 }).is_none());
    }

    #[test]
    fn test_single_site_covers_region() {
        let region = square_region();
        let tessellation = tessellate(&region, &[site("a", 30.0, 30.0)], &ArtworkConfig::default()).unwrap();
        assert_eq!(tessellation.len(), 1);
        assert!((tessellation.total_area() - region.area()).abs() < 1e-6);
    }

    #[test]
    fn test_partition_covers_without_overlap() {
        let region = square_region();
        let sites = scattered();
        let tessellation = tessellate(&region, &sites, &ArtworkConfig::default()).unwrap();

        assert_eq!(tessellation.len(), sites.len());
        assert!((tessellation.total_area() - region.area()).abs() < 1e-4);

        let cells = tessellation.cells();
        for i in 0..cells.len() {
            for j in (i + 1)..cells.len() {
                let overlap = cells[i].geometry.intersection(&cells[j].geometry);
                assert!(overlap.unsigned_area() < 1e-4, "cells {} and {} overlap", i, j);
            }
        }
    }

    #[test]
    fn test_cells_follow_site_order() {
        let sites = scattered();
        let tessellation = tessellate(&square_region(), &sites, &ArtworkConfig::default()).unwrap();
        for (index, (cell, site)) in tessellation.cells().iter().zip(&sites).enumerate() {
            assert_eq!(cell.site_index, index);
            assert_eq!(cell.site_id, site.id);
            assert!(cell.contains(site.position));
        }
    }

    #[test]
    fn test_duplicates_rejected() {
        let sites = vec![site("a", 1.0, 1.0), site("b", 1.0, 1.0), site("c", 5.0, 5.0)];
        let result = tessellate(&square_region(), &sites, &ArtworkConfig::default());
        assert_eq!(result.unwrap_err(), ArtError::DegenerateSiteSet { duplicates: 1 });
    }

    #[test]
    fn test_collinear_sites_recover_by_perturbation() {
        let region = square_region();
        let sites = vec![site("a", 10.0, 50.0), site("b", 50.0, 50.0), site("c", 90.0, 50.0)];
        let tessellation = tessellate(&region, &sites, &ArtworkConfig::default()).unwrap();

        assert_eq!(tessellation.len(), 3);
        assert!((tessellation.total_area() - region.area()).abs() < 1e-4);
        // cells keep the true positions
        assert_eq!(tessellation.cells()[1].site_position, Coord { x: 50.0, y: 50.0 });
    }

    #[test]
    fn test_collinear_sites_without_retries_fail() {
        let config = ArtworkConfigBuilder::new().max_retries(0).unwrap().build().unwrap();
        let sites = vec![site("a", 10.0, 50.0), site("b", 50.0, 50.0), site("c", 90.0, 50.0)];
        let result = tessellate(&square_region(), &sites, &config);
        assert!(matches!(result, Err(ArtError::TessellationFailed(_))));
    }

    #[test]
    fn test_deterministic() {
        let sites = scattered();
        let config = ArtworkConfig::default();
        let a = tessellate(&square_region(), &sites, &config).unwrap();
        let b = tessellate(&square_region(), &sites, &config).unwrap();
        assert_eq!(a.cells(), b.cells());
    }

    #[test]
    fn test_locate() {
        let sites = scattered();
        let tessellation = tessellate(&square_region(), &sites, &ArtworkConfig::default()).unwrap();

        let cell = tessellation.locate(Coord { x: 12.0, y: 8.0 }).unwrap();
        assert_eq!(cell.site_id, SiteId::from("a"));

        assert!(tessellation.locate(Coord { x: 150.0, y: 50.0 }).is_none());
    }
}
