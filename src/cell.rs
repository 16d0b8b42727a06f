//! Voronoi Cell Structure
//!
//! Represents one clipped polygon of a city's tessellation and the site that
//! owns it.

use geo::{Area, Coord, Intersects, MultiPolygon, Point};

use crate::render::Color;
use crate::site::SiteId;

/// A single clipped Voronoi cell
///
/// Each cell carries:
/// - The index of its site in the tessellation input (the tie-back used by
///   the renderer and by [`crate::Tessellation::locate`])
/// - The owning site's identifier, position and colour
/// - The cell geometry, already clipped to the region
///
/// # Design Notes
///
/// The geometry is a multi-polygon because clipping against a concave or
/// multi-part region can split a cell. Under
/// [`crate::ClipPolicy::KeepSiteFragment`] it holds at most one polygon,
/// except for a lone site: its cell is the whole region, every part included.
/// A site squeezed into a corner may end with an empty geometry; such a cell
/// still exists so the site-to-cell mapping stays one-to-one.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Position of the owning site in the tessellation input
    pub site_index: usize,

    /// Identifier of the owning site
    pub site_id: SiteId,

    /// Projected position of the owning site
    pub site_position: Coord<f64>,

    /// Fill colour, taken from the owning site
    pub color: Color,

    /// Cell polygon(s) in region coordinates
    pub geometry: MultiPolygon<f64>,
}

impl Cell {
    /// Create a new cell
    ///
    /// This is typically called by the tessellation engine, not by user code.
    pub fn new(
        site_index: usize,
        site_id: SiteId,
        site_position: Coord<f64>,
        color: Color,
        geometry: MultiPolygon<f64>,
    ) -> Self {
        Self {
            site_index,
            site_id,
            site_position,
            color,
            geometry,
        }
    }

    /// Area of the clipped geometry
    pub fn area(&self) -> f64 {
        self.geometry.unsigned_area()
    }

    /// Whether clipping left nothing of this cell
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.geometry.0.is_empty()
    }

    /// Number of disjoint pieces
    #[inline]
    pub fn piece_count(&self) -> usize {
        self.geometry.0.len()
    }

    /// Whether `point` is inside the cell or on its edge
    pub fn contains(&self, point: Coord<f64>) -> bool {
        self.geometry.intersects(&Point::from(point))
    }
}
