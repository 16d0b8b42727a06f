//! Render normalizer
//!
//! Maps a tessellation from Web Mercator metres onto a fixed-size canvas and
//! emits it as an SVG document, one filled path per cell.

mod colors;
mod svg;

pub use colors::Color;
pub use svg::{SvgDocument, SvgPath};

use geo::{Coord, Rect};
use glam::{DAffine2, DVec2};
use tracing::debug;

use crate::config::ArtworkConfig;
use crate::error::{ArtError, Result};
use crate::region::Region;
use crate::tessellation::Tessellation;

/// Uniform scale, vertical flip and translation into canvas space
///
/// Mercator `y` grows northwards while SVG `y` grows downwards, so the top
/// left corner of the bounding box lands on the canvas origin and its bottom
/// left corner on `(0, height)`.
///
/// # Example
///
/// ```
/// use city_voronoi::RenderTransform;
/// use geo::{Coord, Rect};
///
/// let bounds = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 200.0, y: 100.0 });
/// let transform = RenderTransform::fit(bounds, 1000.0).unwrap();
///
/// assert_eq!(transform.scale(), 5.0);
/// assert_eq!((transform.width(), transform.height()), (1000.0, 500.0));
/// assert_eq!(transform.apply(Coord { x: 0.0, y: 0.0 }).to_array(), [0.0, 500.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTransform {
    affine: DAffine2,
    scale: f64,
    width: f64,
    height: f64,
}

impl RenderTransform {
    /// Fit `bounds` so its longer side spans `target` units
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if `target` is not finite and positive
    /// - `InvalidInput` if `bounds` has no extent
    pub fn fit(bounds: Rect<f64>, target: f64) -> Result<Self> {
        if !target.is_finite() || target <= 0.0 {
            return Err(ArtError::InvalidConfig(format!(
                "Canvas size must be positive (got {})",
                target
            )));
        }

        let (width, height) = (bounds.width(), bounds.height());
        let extent = width.max(height);
        if !extent.is_finite() || extent <= 0.0 {
            return Err(ArtError::InvalidInput(format!(
                "cannot fit bounds of size {} x {} onto a canvas",
                width, height
            )));
        }

        let scale = target / extent;
        let (min, max) = (bounds.min(), bounds.max());
        let affine = DAffine2::from_translation(DVec2::new(-min.x * scale, max.y * scale))
            * DAffine2::from_scale(DVec2::new(scale, -scale));

        Ok(Self {
            affine,
            scale,
            width: width * scale,
            height: height * scale,
        })
    }

    /// Canvas position of a source point
    #[inline]
    pub fn apply(&self, point: Coord<f64>) -> DVec2 {
        self.affine.transform_point2(DVec2::new(point.x, point.y))
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Canvas width
    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Canvas height
    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }
}

/// Render a tessellation onto a canvas fitted to the region
///
/// Cells are emitted in tessellation order, filled with their site's colour.
/// Cells with empty geometry are skipped. An empty tessellation renders as an
/// empty canvas of the region's dimensions.
pub fn render(region: &Region, tessellation: &Tessellation, config: &ArtworkConfig) -> Result<SvgDocument> {
    let transform = RenderTransform::fit(region.bounds(), config.canvas_size)?;
    let mut document = SvgDocument::new(transform.width(), transform.height(), config.coordinate_precision);

    for cell in tessellation.cells() {
        if cell.is_empty() {
            debug!(site = %cell.site_id, "skipping cell without area");
            continue;
        }

        let rings = cell
            .geometry
            .iter()
            .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
            .map(|ring| {
                let coords = &ring.0;
                // rings are closed; the path's Z closes them again
                let open = match (coords.first(), coords.last()) {
                    (Some(first), Some(last)) if coords.len() > 1 && first == last => &coords[..coords.len() - 1],
                    _ => &coords[..],
                };
                open.iter().map(|&c| transform.apply(c)).collect::<Vec<DVec2>>()
            })
            .filter(|ring| ring.len() >= 3)
            .collect::<Vec<_>>();

        document.push(SvgPath::new(cell.color, rings));
    }

    debug!(
        paths = document.paths().len(),
        width = transform.width(),
        height = transform.height(),
        "rendered tessellation"
    );

    Ok(document)
}
