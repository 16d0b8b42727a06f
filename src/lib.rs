//! Clipped Voronoi artwork of a city's points of interest
//!
//! Each point of interest carries a colour. The crate computes the city's
//! land area (boundary ∩ land − water), projects the points into Web
//! Mercator, partitions the land into one Voronoi cell per point and renders
//! the cells as a filled SVG.
//!
//! # Quick Start
//!
//! ```rust
//! use city_voronoi::*;
//! use geo::polygon;
//!
//! // Land dataset and boundary, both in Web Mercator metres
//! let land = LandIndex::new(vec![polygon![
//!     (x: -5000.0, y: -5000.0), (x: 5000.0, y: -5000.0),
//!     (x: 5000.0, y: 5000.0), (x: -5000.0, y: 5000.0),
//! ]]).unwrap();
//! let boundary = Boundary::from_polygon(polygon![
//!     (x: -2000.0, y: -1000.0), (x: 2000.0, y: -1000.0),
//!     (x: 2000.0, y: 1000.0), (x: -2000.0, y: 1000.0),
//! ], Crs::WebMercator);
//!
//! let red = Color::new(1.0, 0.0, 0.0).unwrap();
//! let blue = Color::new(0.0, 0.0, 1.0).unwrap();
//! let input = CityInput {
//!     key: "demo".to_string(),
//!     boundary,
//!     water: geo::MultiPolygon::new(vec![]),
//!     water_crs: Crs::Wgs84,
//!     sites: vec![
//!         Site::new(SiteId::from("west"), GeoCoord::new(0.0, -0.01).unwrap(), red),
//!         Site::new(SiteId::from("east"), GeoCoord::new(0.0, 0.01).unwrap(), blue),
//!     ],
//!     rejected: Vec::new(),
//! };
//!
//! let artwork = generate_city(&land, &input, &ArtworkConfig::default()).unwrap();
//! assert_eq!(artwork.tessellation.len(), 2);
//! assert!(artwork.document.to_svg_string().contains("#0000ff"));
//! ```
//!
//! # Features
//!
//! - `spatial-index` (default): O(log n) point-to-cell lookups with a KD-tree

pub mod error;
pub mod config;
pub mod site;
pub mod projection;
pub mod geometry;
pub mod region;
pub mod projector;
pub mod cell;
pub mod tessellation;
pub mod render;
pub mod input;
pub mod pipeline;

#[cfg(feature = "spatial-index")]
pub mod spatial;

pub use error::{ArtError, Result};
pub use config::{ArtworkConfig, ArtworkConfigBuilder, ClipPolicy, DuplicatePolicy};
pub use site::{DropReason, GeoCoord, ProjectedSite, Site, SiteDiagnostic, SiteId};
pub use projection::{project, Crs};
pub use geometry::Clipped;
pub use region::{build_region, Boundary, LandIndex, Region};
pub use projector::{project_sites, ProjectionReport};
pub use cell::Cell;
pub use tessellation::{dedup_sites, tessellate, Tessellation};
pub use render::{render, Color, RenderTransform, SvgDocument, SvgPath};
pub use input::DataDir;
pub use pipeline::{
    generate_city, output_path, run_batch, run_city, BatchReport, CityArtwork, CityInput, CityLoader,
    CityOutcome, CitySummary,
};

#[cfg(feature = "spatial-index")]
pub use spatial::SiteLocator;
