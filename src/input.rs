//! Loading cities, geometry and site metadata from a data directory
//!
//! Layout:
//!
//! ```text
//! <root>/cities.json                 { "<key>": { "name": "..." } }
//! <root>/boundaries/<key>.geojson    city boundary, WGS84
//! <root>/water/<key>.geojson         inland water, WGS84 (optional)
//! <root>/metadata/<key>.json         { "<id>": { "name", "lat", "lon", "color": [r, g, b] } }
//! ```
//!
//! The land-mass dataset lives elsewhere and is loaded once with
//! [`load_land_index`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use geo::{Geometry, GeometryCollection, MultiPolygon, Polygon};
use geojson::{quick_collection, GeoJson};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ArtError, Result};
use crate::pipeline::{CityInput, CityLoader};
use crate::projection::Crs;
use crate::region::{Boundary, LandIndex};
use crate::render::Color;
use crate::site::{DropReason, GeoCoord, Site, SiteDiagnostic, SiteId};

/// A city listed in `cities.json`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct City {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct CityEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SiteRecord {
    #[serde(default)]
    name: Option<String>,
    lat: f64,
    lon: f64,
    color: Vec<f64>,
}

/// Every polygon of a GeoJSON document, in document order
///
/// Non-areal members (points, coastlines) are skipped.
pub fn parse_polygons(text: &str) -> Result<Vec<Polygon<f64>>> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|e: geojson::Error| ArtError::InvalidInput(format!("invalid GeoJSON: {}", e)))?;
    let collection: GeometryCollection<f64> = quick_collection(&geojson)
        .map_err(|e| ArtError::InvalidInput(format!("unsupported GeoJSON geometry: {}", e)))?;

    let mut polygons = Vec::new();
    collect_polygons(collection.0, &mut polygons);
    Ok(polygons)
}

fn collect_polygons(geometries: Vec<Geometry<f64>>, out: &mut Vec<Polygon<f64>>) {
    for geometry in geometries {
        match geometry {
            Geometry::Polygon(p) => out.push(p),
            Geometry::MultiPolygon(mp) => out.extend(mp.0),
            Geometry::GeometryCollection(gc) => collect_polygons(gc.0, out),
            _ => {}
        }
    }
}

fn read_polygons(path: &Path) -> std::result::Result<Vec<Polygon<f64>>, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    parse_polygons(&text).map_err(|e| format!("{}: {}", path.display(), e))
}

/// Load the land-mass dataset (polygons in Web Mercator) and index it
///
/// # Errors
///
/// Returns `ReferenceDataUnavailable` if the file is missing, unreadable or
/// holds no polygons.
pub fn load_land_index(path: impl AsRef<Path>) -> Result<LandIndex> {
    let path = path.as_ref();
    let polygons = read_polygons(path).map_err(ArtError::ReferenceDataUnavailable)?;
    debug!(path = %path.display(), polygons = polygons.len(), "loaded land polygons");

    LandIndex::new(polygons)
        .map_err(|e| ArtError::ReferenceDataUnavailable(format!("{}: {}", path.display(), e)))
}

/// Load a city boundary in WGS84
///
/// # Errors
///
/// Returns `RegionUnavailable` if the file is missing, unreadable or has no
/// polygon.
pub fn load_boundary(path: impl AsRef<Path>) -> Result<Boundary> {
    let path = path.as_ref();
    let polygons = read_polygons(path).map_err(ArtError::RegionUnavailable)?;
    if polygons.is_empty() {
        return Err(ArtError::RegionUnavailable(format!(
            "{}: boundary has no polygon",
            path.display()
        )));
    }
    Ok(Boundary::new(MultiPolygon::new(polygons), Crs::Wgs84))
}

/// Load inland water in WGS84; a missing file means no water
pub fn load_water(path: impl AsRef<Path>) -> Result<MultiPolygon<f64>> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = %path.display(), "no water file");
        return Ok(MultiPolygon::new(vec![]));
    }
    let polygons = read_polygons(path).map_err(ArtError::InvalidInput)?;
    Ok(MultiPolygon::new(polygons))
}

/// Parse site metadata
///
/// Entries are returned in identifier order. An entry with a missing field,
/// an out-of-range coordinate or an invalid colour becomes a diagnostic
/// instead of failing the whole file.
///
/// # Example
///
/// ```
/// use city_voronoi::input::parse_sites;
///
/// let (sites, rejected) = parse_sites(r#"{
///     "b": { "name": "Harbour", "lat": 53.54, "lon": 9.98, "color": [0.1, 0.2, 0.3] },
///     "a": { "lat": 53.55, "lon": 10.0, "color": [1.0, 1.0, 1.0] },
///     "c": { "lat": 95.0, "lon": 10.0, "color": [0.0, 0.0, 0.0] }
/// }"#).unwrap();
///
/// assert_eq!(sites.len(), 2);
/// assert_eq!(sites[0].id().as_str(), "a");
/// assert_eq!(rejected.len(), 1);
/// ```
pub fn parse_sites(text: &str) -> Result<(Vec<Site>, Vec<SiteDiagnostic>)> {
    let entries: BTreeMap<String, serde_json::Value> = serde_json::from_str(text)
        .map_err(|e| ArtError::InvalidInput(format!("invalid site metadata: {}", e)))?;

    let mut sites = Vec::with_capacity(entries.len());
    let mut rejected = Vec::new();

    for (id, value) in entries {
        let id = SiteId::new(id);
        match site_from_value(id.clone(), value) {
            Ok(site) => sites.push(site),
            Err(err) => {
                warn!(site = %id, error = %err, "rejecting site metadata");
                rejected.push(SiteDiagnostic::new(id, DropReason::Invalid(err.to_string())));
            }
        }
    }

    Ok((sites, rejected))
}

fn site_from_value(id: SiteId, value: serde_json::Value) -> Result<Site> {
    let record: SiteRecord = serde_json::from_value(value)
        .map_err(|e| ArtError::InvalidInput(format!("malformed record: {}", e)))?;
    let coord = GeoCoord::new(record.lat, record.lon)?;
    let color = Color::from_slice(&record.color)?;

    let site = Site::new(id, coord, color);
    Ok(match record.name {
        Some(name) => site.with_name(name),
        None => site,
    })
}

/// Load site metadata from a file
pub fn load_sites(path: impl AsRef<Path>) -> Result<(Vec<Site>, Vec<SiteDiagnostic>)> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| ArtError::InvalidInput(format!("cannot read {}: {}", path.display(), e)))?;
    parse_sites(&text)
}

/// Parse `cities.json`; cities come back sorted by key
pub fn parse_cities(text: &str) -> Result<Vec<City>> {
    let entries: BTreeMap<String, CityEntry> = serde_json::from_str(text)
        .map_err(|e| ArtError::InvalidInput(format!("invalid city list: {}", e)))?;
    Ok(entries
        .into_iter()
        .map(|(key, entry)| City { key, name: entry.name })
        .collect())
}

/// A data directory in the layout described at module level
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cities(&self) -> Result<Vec<City>> {
        let path = self.root.join("cities.json");
        let text = fs::read_to_string(&path)
            .map_err(|e| ArtError::InvalidInput(format!("cannot read {}: {}", path.display(), e)))?;
        parse_cities(&text)
    }

    pub fn boundary_path(&self, key: &str) -> PathBuf {
        self.root.join("boundaries").join(format!("{}.geojson", key))
    }

    pub fn water_path(&self, key: &str) -> PathBuf {
        self.root.join("water").join(format!("{}.geojson", key))
    }

    pub fn metadata_path(&self, key: &str) -> PathBuf {
        self.root.join("metadata").join(format!("{}.json", key))
    }
}

impl CityLoader for DataDir {
    fn load(&self, key: &str) -> Result<CityInput> {
        let boundary = load_boundary(self.boundary_path(key))?;
        let water = load_water(self.water_path(key))?;
        let (sites, rejected) = load_sites(self.metadata_path(key))?;

        Ok(CityInput {
            key: key.to_string(),
            boundary,
            water,
            water_crs: Crs::Wgs84,
            sites,
            rejected,
        })
    }
}
