//! Site records
//!
//! A [`Site`] is a point of interest with a geodetic coordinate and the
//! representative colour of its panorama. Sites are validated once at
//! construction and are immutable afterwards; a [`ProjectedSite`] is the same
//! record placed in the planar coordinate system of a region.

use std::fmt;

use geo::Coord;

use crate::error::{ArtError, Result};
use crate::render::Color;

/// Stable identifier of a point of interest (the panorama id in practice)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteId(String);

impl SiteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SiteId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A WGS84 latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCoord {
    lat: f64,
    lon: f64,
}

impl GeoCoord {
    /// Create a coordinate, rejecting values outside the geodetic range
    ///
    /// # Errors
    ///
    /// Returns `InvalidCoordinate` for non-finite values, `|lat| > 90` or
    /// `|lon| > 180`.
    ///
    /// # Example
    ///
    /// ```
    /// use city_voronoi::GeoCoord;
    ///
    /// assert!(GeoCoord::new(47.6, -122.3).is_ok());
    /// assert!(GeoCoord::new(91.0, 0.0).is_err());
    /// ```
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        let reason = if !lat.is_finite() || !lon.is_finite() {
            Some("coordinate is not finite")
        } else if lat.abs() > 90.0 {
            Some("latitude outside [-90, 90]")
        } else if lon.abs() > 180.0 {
            Some("longitude outside [-180, 180]")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(ArtError::InvalidCoordinate {
                lat,
                lon,
                reason: reason.to_string(),
            }),
            None => Ok(Self { lat, lon }),
        }
    }

    #[inline]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    #[inline]
    pub fn lon(&self) -> f64 {
        self.lon
    }
}

/// A point of interest with its representative colour
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    id: SiteId,
    name: Option<String>,
    coord: GeoCoord,
    color: Color,
}

impl Site {
    pub fn new(id: SiteId, coord: GeoCoord, color: Color) -> Self {
        Self {
            id,
            name: None,
            coord,
            color,
        }
    }

    /// Attach the human readable name of the point of interest
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    pub fn id(&self) -> &SiteId {
        &self.id
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn coord(&self) -> GeoCoord {
        self.coord
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }
}

/// A site placed in the region's planar coordinate system
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedSite {
    /// Identifier of the originating site
    pub id: SiteId,
    /// Position in projected (Web Mercator) metres
    pub position: Coord<f64>,
    /// Colour carried over from the originating site
    pub color: Color,
}

impl ProjectedSite {
    pub fn new(id: SiteId, position: Coord<f64>, color: Color) -> Self {
        Self { id, position, color }
    }
}

/// Why a site did not make it into the tessellation
#[derive(Debug, Clone, PartialEq)]
pub enum DropReason {
    /// The coordinate or colour failed validation, or could not be projected
    Invalid(String),
    /// The projected coordinate lies outside the land region
    OutsideRegion,
    /// Another site already occupies the same projected coordinate
    Duplicate {
        /// The site that was kept in its place
        kept: SiteId,
    },
}

/// Diagnostic record for a dropped site
#[derive(Debug, Clone, PartialEq)]
pub struct SiteDiagnostic {
    pub site: SiteId,
    pub reason: DropReason,
}

impl SiteDiagnostic {
    pub fn new(site: SiteId, reason: DropReason) -> Self {
        Self { site, reason }
    }
}

impl fmt::Display for SiteDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            DropReason::Invalid(reason) => write!(f, "site {} dropped: {}", self.site, reason),
            DropReason::OutsideRegion => write!(f, "site {} dropped: outside land region", self.site),
            DropReason::Duplicate { kept } => {
                write!(f, "site {} dropped: same coordinate as site {}", self.site, kept)
            }
        }
    }
}
