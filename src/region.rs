//! Land regions
//!
//! A city's [`Region`] is its administrative boundary reduced to actual land:
//! the boundary intersected with the land-mass polygons that touch it, minus
//! inland water. The land-mass dataset is global and large, so it is held in a
//! [`LandIndex`] (an R-tree over polygon envelopes) that is built once and
//! shared read-only by every city.

use std::time::Instant;

use geo::{Area, BooleanOps, BoundingRect, Coord, Intersects, MultiPolygon, Point, Polygon, Rect};
use rstar::{RTree, RTreeObject, AABB};
use tracing::debug;

use crate::error::{ArtError, Result};
use crate::geometry::{union_all, Clipped};
use crate::projection::{to_web_mercator, Crs};

/// One land polygon with its cached envelope
#[derive(Debug, Clone)]
struct LandPolygon {
    /// Position in the original dataset, keeps query results ordered
    index: usize,
    polygon: Polygon<f64>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for LandPolygon {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn envelope_of(rect: Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

/// Spatially indexed land-mass polygons in Web Mercator
///
/// # Example
///
/// ```
/// use city_voronoi::LandIndex;
/// use geo::polygon;
///
/// let land = LandIndex::new(vec![polygon![
///     (x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0),
/// ]]).unwrap();
/// assert_eq!(land.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct LandIndex {
    tree: RTree<LandPolygon>,
    polygons: Vec<LandPolygon>,
}

impl LandIndex {
    /// Build the index from land polygons already in Web Mercator
    ///
    /// # Errors
    ///
    /// Returns `ReferenceDataUnavailable` if no polygon has a bounding box.
    pub fn new(polygons: Vec<Polygon<f64>>) -> Result<Self> {
        let start = Instant::now();
        let polygons: Vec<LandPolygon> = polygons
            .into_iter()
            .enumerate()
            .filter_map(|(index, polygon)| {
                let envelope = envelope_of(polygon.bounding_rect()?);
                Some(LandPolygon {
                    index,
                    polygon,
                    envelope,
                })
            })
            .collect();

        if polygons.is_empty() {
            return Err(ArtError::ReferenceDataUnavailable(
                "land dataset contains no polygons".to_string(),
            ));
        }

        let tree = RTree::bulk_load(polygons.clone());
        debug!(polygons = polygons.len(), elapsed = ?start.elapsed(), "built land index");

        Ok(Self { tree, polygons })
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Land polygons intersecting `area`, in dataset order
    pub fn query(&self, area: &MultiPolygon<f64>) -> Vec<&Polygon<f64>> {
        let Some(rect) = area.bounding_rect() else {
            return Vec::new();
        };

        let mut hits: Vec<&LandPolygon> = self
            .tree
            .locate_in_envelope_intersecting(&envelope_of(rect))
            .filter(|land| land.polygon.intersects(area))
            .collect();
        hits.sort_by_key(|land| land.index);
        hits.into_iter().map(|land| &land.polygon).collect()
    }

    /// Same result as [`Self::query`] by scanning every polygon
    pub fn query_linear(&self, area: &MultiPolygon<f64>) -> Vec<&Polygon<f64>> {
        self.polygons
            .iter()
            .filter(|land| land.polygon.intersects(area))
            .map(|land| &land.polygon)
            .collect()
    }
}

/// A city's administrative boundary in a known coordinate system
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub geometry: MultiPolygon<f64>,
    pub crs: Crs,
}

impl Boundary {
    pub fn new(geometry: MultiPolygon<f64>, crs: Crs) -> Self {
        Self { geometry, crs }
    }

    /// Boundary from a single polygon
    pub fn from_polygon(polygon: Polygon<f64>, crs: Crs) -> Self {
        Self::new(MultiPolygon::new(vec![polygon]), crs)
    }
}

/// The land-only area of one city, in Web Mercator
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    polygons: MultiPolygon<f64>,
    bounds: Rect<f64>,
    area: f64,
}

impl Region {
    /// Wrap an already clipped multi-polygon
    ///
    /// # Errors
    ///
    /// Returns `RegionUnavailable` if the geometry has no positive area.
    pub fn new(polygons: MultiPolygon<f64>) -> Result<Self> {
        let area = polygons.unsigned_area();
        let bounds = match polygons.bounding_rect() {
            Some(bounds) if area > 0.0 => bounds,
            _ => {
                return Err(ArtError::RegionUnavailable(
                    "region has no land area".to_string(),
                ))
            }
        };

        Ok(Self {
            polygons,
            bounds,
            area,
        })
    }

    #[inline]
    pub fn polygons(&self) -> &MultiPolygon<f64> {
        &self.polygons
    }

    #[inline]
    pub fn bounds(&self) -> Rect<f64> {
        self.bounds
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Whether `point` lies in the region; points on the boundary count as inside
    pub fn contains(&self, point: Coord<f64>) -> bool {
        self.polygons.intersects(&Point::from(point))
    }
}

/// Compute the land region of a city
///
/// `boundary ∩ union(land polygons touching boundary) − water`, keeping only
/// polygon parts with area above `sliver_area`. `water` is given in `water_crs`
/// and may be empty.
///
/// # Errors
///
/// - `RegionUnavailable` if the boundary is empty, cannot be projected, or no
///   land is left after clipping
pub fn build_region(
    boundary: &Boundary,
    land: &LandIndex,
    water: &MultiPolygon<f64>,
    water_crs: Crs,
    sliver_area: f64,
) -> Result<Region> {
    let start = Instant::now();

    if boundary.geometry.0.is_empty() || boundary.geometry.unsigned_area() <= 0.0 {
        return Err(ArtError::RegionUnavailable(
            "boundary geometry is empty".to_string(),
        ));
    }

    let bounds = to_web_mercator(&boundary.geometry, boundary.crs)
        .map_err(|e| ArtError::RegionUnavailable(format!("boundary cannot be projected: {}", e)))?;

    // Step 1: land polygons touching the boundary
    let touching = land.query(&bounds);
    if touching.is_empty() {
        return Err(ArtError::RegionUnavailable(
            "boundary does not touch any land".to_string(),
        ));
    }

    // Step 2-3: merge them and cut away everything outside the boundary
    let land_union = union_all(touching.iter().copied());
    let on_land = land_union.intersection(&bounds);

    // Step 4: remove inland water
    let water = to_web_mercator(water, water_crs)
        .map_err(|e| ArtError::RegionUnavailable(format!("water cannot be projected: {}", e)))?;
    let dry = if water.0.is_empty() {
        on_land
    } else {
        on_land.difference(&water)
    };

    // Step 5: keep proper polygons only
    let polygons = match Clipped::classify(dry, sliver_area) {
        Clipped::Empty => {
            return Err(ArtError::RegionUnavailable(
                "no land left after removing ocean and water".to_string(),
            ))
        }
        clipped => clipped.into_multi_polygon(),
    };

    debug!(
        land_polygons = touching.len(),
        parts = polygons.0.len(),
        elapsed = ?start.elapsed(),
        "built region"
    );

    Region::new(polygons)
}
