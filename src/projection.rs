//! Geodetic to planar projection
//!
//! All planar geometry in the pipeline lives in spherical Web Mercator
//! (EPSG:3857), the coordinate system of the land-polygon dataset.

use std::f64::consts::FRAC_PI_4;

use geo::{Coord, MapCoords, MultiPolygon};

use crate::error::{ArtError, Result};
use crate::site::GeoCoord;

/// Semi-major axis of the WGS84 ellipsoid, used as the sphere radius
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Coordinate reference systems the pipeline accepts for input geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crs {
    /// EPSG:4326, coordinates as (lon, lat) degrees
    Wgs84,
    /// EPSG:3857, coordinates in metres
    WebMercator,
}

/// Project a geodetic coordinate to Web Mercator metres
///
/// # Errors
///
/// Returns `InvalidCoordinate` at the poles, where Web Mercator diverges,
/// and whenever the result is not finite.
///
/// # Example
///
/// ```
/// use city_voronoi::{project, GeoCoord};
///
/// let origin = project(GeoCoord::new(0.0, 0.0).unwrap()).unwrap();
/// assert!(origin.x.abs() < 1e-9 && origin.y.abs() < 1e-9);
/// ```
pub fn project(coord: GeoCoord) -> Result<Coord<f64>> {
    if coord.lat().abs() >= 90.0 {
        return Err(ArtError::InvalidCoordinate {
            lat: coord.lat(),
            lon: coord.lon(),
            reason: "poles are not representable in Web Mercator".to_string(),
        });
    }

    let x = EARTH_RADIUS * coord.lon().to_radians();
    let y = EARTH_RADIUS * (FRAC_PI_4 + coord.lat().to_radians() / 2.0).tan().ln();

    if !x.is_finite() || !y.is_finite() {
        return Err(ArtError::InvalidCoordinate {
            lat: coord.lat(),
            lon: coord.lon(),
            reason: "not representable in Web Mercator".to_string(),
        });
    }

    Ok(Coord { x, y })
}

/// Bring a geometry given in `crs` into Web Mercator
///
/// Geometry in `Crs::Wgs84` is expected in GeoJSON axis order (x = lon,
/// y = lat).
pub fn to_web_mercator(geometry: &MultiPolygon<f64>, crs: Crs) -> Result<MultiPolygon<f64>> {
    match crs {
        Crs::WebMercator => Ok(geometry.clone()),
        Crs::Wgs84 => geometry.try_map_coords(|c| project(GeoCoord::new(c.y, c.x)?)),
    }
}
