//! Site projection and region filtering

use tracing::warn;

use crate::projection::project;
use crate::region::Region;
use crate::site::{DropReason, ProjectedSite, Site, SiteDiagnostic};

/// Outcome of projecting a city's sites
#[derive(Debug, Clone, Default)]
pub struct ProjectionReport {
    /// Sites inside the region, in input order
    pub kept: Vec<ProjectedSite>,
    /// One record per dropped site
    pub dropped: Vec<SiteDiagnostic>,
}

/// Project sites into the region's plane and drop those outside it
///
/// Sites are projected to Web Mercator; a site is kept when its projected
/// point lies inside the region or on its boundary. A site that cannot be
/// projected is dropped with a diagnostic instead of failing the whole city.
///
/// # Example
///
/// ```
/// use city_voronoi::*;
/// use geo::{polygon, MultiPolygon};
///
/// let region = Region::new(MultiPolygon::new(vec![polygon![
///     (x: -1000.0, y: -1000.0), (x: 1000.0, y: -1000.0),
///     (x: 1000.0, y: 1000.0), (x: -1000.0, y: 1000.0),
/// ]])).unwrap();
/// let red = Color::new(1.0, 0.0, 0.0).unwrap();
/// let sites = vec![
///     Site::new(SiteId::from("in"), GeoCoord::new(0.0, 0.0).unwrap(), red),
///     Site::new(SiteId::from("out"), GeoCoord::new(10.0, 10.0).unwrap(), red),
/// ];
///
/// let report = project_sites(&sites, &region);
/// assert_eq!(report.kept.len(), 1);
/// assert_eq!(report.dropped.len(), 1);
/// ```
pub fn project_sites(sites: &[Site], region: &Region) -> ProjectionReport {
    let mut report = ProjectionReport::default();

    for site in sites {
        let position = match project(site.coord()) {
            Ok(position) => position,
            Err(err) => {
                warn!(site = %site.id(), error = %err, "dropping unprojectable site");
                report
                    .dropped
                    .push(SiteDiagnostic::new(site.id().clone(), DropReason::Invalid(err.to_string())));
                continue;
            }
        };

        if region.contains(position) {
            report
                .kept
                .push(ProjectedSite::new(site.id().clone(), position, site.color()));
        } else {
            warn!(site = %site.id(), "dropping site outside region");
            report
                .dropped
                .push(SiteDiagnostic::new(site.id().clone(), DropReason::OutsideRegion));
        }
    }

    report
}
