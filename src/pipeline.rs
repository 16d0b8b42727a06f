//! Per-city pipeline and batch runner
//!
//! One city goes region → site projection → deduplication → tessellation →
//! rendering → write. A batch runs many cities against one shared, read-only
//! [`LandIndex`]; a failing city is recorded and never stops its siblings.

use std::collections::hash_map::{Entry, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;

use geo::MultiPolygon;
use rayon::prelude::*;
use tracing::{error, info, warn};

use crate::config::ArtworkConfig;
use crate::error::{ArtError, Result};
use crate::projection::Crs;
use crate::projector::project_sites;
use crate::region::{build_region, Boundary, LandIndex, Region};
use crate::render::{render, SvgDocument};
use crate::site::{Site, SiteDiagnostic};
use crate::tessellation::{dedup_sites, tessellate, Tessellation};

/// Everything needed to draw one city
#[derive(Debug, Clone)]
pub struct CityInput {
    /// Key naming the output file
    pub key: String,
    pub boundary: Boundary,
    /// Inland water to cut from the region; may be empty
    pub water: MultiPolygon<f64>,
    pub water_crs: Crs,
    /// Sites in input order
    pub sites: Vec<Site>,
    /// Sites already rejected while loading
    pub rejected: Vec<SiteDiagnostic>,
}

/// Source of city inputs for a batch
///
/// Implemented by [`crate::input::DataDir`] and by any
/// `Fn(&str) -> Result<CityInput>`.
pub trait CityLoader {
    fn load(&self, key: &str) -> Result<CityInput>;
}

impl<F> CityLoader for F
where
    F: Fn(&str) -> Result<CityInput>,
{
    fn load(&self, key: &str) -> Result<CityInput> {
        self(key)
    }
}

/// A rendered city
#[derive(Debug, Clone)]
pub struct CityArtwork {
    pub key: String,
    pub region: Region,
    pub tessellation: Tessellation,
    pub document: SvgDocument,
    /// Every site that did not make it into the tessellation
    pub diagnostics: Vec<SiteDiagnostic>,
}

/// Run the geometry pipeline for one city without touching the filesystem
///
/// Sites sharing a coordinate are collapsed according to
/// `config.duplicate_policy` once the tessellation reports them.
///
/// # Errors
///
/// Any `RegionUnavailable`, `TessellationFailed` or rendering error of this
/// city. Individual bad sites never fail the city; they end up in
/// [`CityArtwork::diagnostics`].
pub fn generate_city(land: &LandIndex, input: &CityInput, config: &ArtworkConfig) -> Result<CityArtwork> {
    let start = Instant::now();
    info!(city = %input.key, sites = input.sites.len(), "generating city");

    let region = build_region(&input.boundary, land, &input.water, input.water_crs, config.sliver_area)?;

    let projection = project_sites(&input.sites, &region);
    let mut diagnostics = input.rejected.clone();
    diagnostics.extend(projection.dropped);

    let tessellation = match tessellate(&region, &projection.kept, config) {
        Err(ArtError::DegenerateSiteSet { duplicates }) => {
            warn!(city = %input.key, duplicates, "deduplicating sites");
            let (sites, dropped) = dedup_sites(projection.kept, config.duplicate_policy);
            diagnostics.extend(dropped);
            tessellate(&region, &sites, config)?
        }
        result => result?,
    };

    let document = render(&region, &tessellation, config)?;

    info!(
        city = %input.key,
        cells = tessellation.len(),
        dropped = diagnostics.len(),
        elapsed = ?start.elapsed(),
        "generated city"
    );

    Ok(CityArtwork {
        key: input.key.clone(),
        region,
        tessellation,
        document,
        diagnostics,
    })
}

/// Replace characters that are not allowed in file names
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect()
}

/// Where a city's document is written
///
/// ```
/// use city_voronoi::output_path;
/// use std::path::Path;
///
/// let path = output_path(Path::new("out"), "São Paulo/SP");
/// assert_eq!(path, Path::new("out").join("São Paulo_SP.svg"));
/// ```
pub fn output_path(output_dir: &Path, key: &str) -> PathBuf {
    output_dir.join(format!("{}.svg", sanitize_key(key)))
}

/// Generate one city and write its document
///
/// Nothing is written unless every stage succeeds.
pub fn run_city(land: &LandIndex, input: &CityInput, config: &ArtworkConfig) -> Result<(CityArtwork, PathBuf)> {
    let artwork = generate_city(land, input, config)?;
    let path = output_path(&config.output_dir, &input.key);
    artwork.document.write_to(&path)?;
    info!(city = %input.key, path = %path.display(), "wrote artwork");
    Ok((artwork, path))
}

/// What a successful city left behind
#[derive(Debug, Clone, PartialEq)]
pub struct CitySummary {
    pub output: PathBuf,
    pub cells: usize,
    pub diagnostics: Vec<SiteDiagnostic>,
}

/// Result of one city in a batch
#[derive(Debug, Clone, PartialEq)]
pub struct CityOutcome {
    pub key: String,
    pub result: Result<CitySummary>,
}

impl CityOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of a batch, in the order the keys were given
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub outcomes: Vec<CityOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ArtError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.key.as_str(), e)))
    }
}

/// Run every city, isolating failures per city
///
/// With `config.workers > 1` cities run on a dedicated thread pool that
/// shares `land`. Each city's load, geometry, render and write errors are
/// captured in its [`CityOutcome`], as is a panic inside the geometry code.
///
/// A key whose output path was already claimed by an earlier key (a repeated
/// key, or two keys that sanitize alike) is not run; it fails with
/// `OutputFailed` naming the earlier key.
pub fn run_batch<L>(land: &LandIndex, keys: &[String], loader: &L, config: &ArtworkConfig) -> BatchReport
where
    L: CityLoader + Sync,
{
    let start = Instant::now();
    let claims = claim_outputs(keys, &config.output_dir);
    let process = |(key, claim): (&String, &Option<String>)| CityOutcome {
        key: key.clone(),
        result: match claim {
            Some(owner) => Err(ArtError::OutputFailed(format!(
                "{} is already written by city {}",
                output_path(&config.output_dir, key).display(),
                owner
            ))),
            None => run_isolated(land, key, loader, config),
        },
    };

    let outcomes: Vec<CityOutcome> = if config.workers > 1 {
        match rayon::ThreadPoolBuilder::new().num_threads(config.workers).build() {
            Ok(pool) => pool.install(|| keys.par_iter().zip(claims.par_iter()).map(process).collect()),
            Err(e) => {
                warn!(error = %e, "cannot start worker pool, processing sequentially");
                keys.iter().zip(claims.iter()).map(process).collect()
            }
        }
    } else {
        keys.iter().zip(claims.iter()).map(process).collect()
    };

    let report = BatchReport { outcomes };
    for (key, err) in report.failures() {
        error!(city = key, error = %err, "city failed");
    }
    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        elapsed = ?start.elapsed(),
        "batch finished"
    );

    report
}

/// For each key, the earlier key that owns the same output path, if any
fn claim_outputs(keys: &[String], output_dir: &Path) -> Vec<Option<String>> {
    let mut owners: HashMap<PathBuf, &str> = HashMap::new();
    keys.iter()
        .map(|key| match owners.entry(output_path(output_dir, key)) {
            Entry::Vacant(slot) => {
                slot.insert(key.as_str());
                None
            }
            Entry::Occupied(slot) => {
                warn!(city = %key, owner = *slot.get(), "output path already claimed, skipping");
                Some(slot.get().to_string())
            }
        })
        .collect()
}

fn run_isolated<L: CityLoader>(land: &LandIndex, key: &str, loader: &L, config: &ArtworkConfig) -> Result<CitySummary> {
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| -> Result<CitySummary> {
        let input = loader.load(key)?;
        let (artwork, output) = run_city(land, &input, config)?;
        Ok(CitySummary {
            output,
            cells: artwork.tessellation.len(),
            diagnostics: artwork.diagnostics,
        })
    }));

    attempt.unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(ArtError::TessellationFailed(format!("geometry engine panicked: {}", message)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Color;
    use crate::site::{DropReason, GeoCoord, SiteId};
    use geo::{polygon, Area};

    fn land() -> LandIndex {
        LandIndex::new(vec![polygon![
            (x: -10_000.0, y: -10_000.0),
            (x: 10_000.0, y: -10_000.0),
            (x: 10_000.0, y: 10_000.0),
            (x: -10_000.0, y: 10_000.0),
        ]])
        .unwrap()
    }

    fn site(id: &str, lat: f64, lon: f64) -> Site {
        Site::new(
            SiteId::from(id),
            GeoCoord::new(lat, lon).unwrap(),
            Color::new(0.2, 0.4, 0.6).unwrap(),
        )
    }

    /// A 4 km square around (0, 0), given in Web Mercator metres
    fn input(key: &str, sites: Vec<Site>) -> CityInput {
        CityInput {
            key: key.to_string(),
            boundary: Boundary::from_polygon(
                polygon![
                    (x: -2_000.0, y: -2_000.0),
                    (x: 2_000.0, y: -2_000.0),
                    (x: 2_000.0, y: 2_000.0),
                    (x: -2_000.0, y: 2_000.0),
                ],
                Crs::WebMercator,
            ),
            water: MultiPolygon::new(vec![]),
            water_crs: Crs::WebMercator,
            sites,
            rejected: Vec::new(),
        }
    }

    fn temp_config(name: &str) -> ArtworkConfig {
        ArtworkConfig {
            output_dir: std::env::temp_dir().join(format!("city_voronoi_pipeline_{}_{}", name, std::process::id())),
            ..ArtworkConfig::default()
        }
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key(r#"a<b>c:d"e/f\g|h?i*j"#), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize_key("Zürich"), "Zürich");
    }

    #[test]
    fn test_generate_city() {
        let sites = vec![
            site("a", 0.005, -0.005),
            site("b", -0.005, 0.005),
            site("c", 0.01, 0.01),
            site("far", 1.0, 1.0),
        ];
        let artwork = generate_city(&land(), &input("town", sites), &ArtworkConfig::default()).unwrap();

        assert_eq!(artwork.tessellation.len(), 3);
        assert_eq!(artwork.diagnostics.len(), 1);
        assert_eq!(artwork.diagnostics[0].reason, DropReason::OutsideRegion);
        assert!((artwork.tessellation.total_area() - artwork.region.area()).abs() < 1e-4 * artwork.region.area());
        assert_eq!(artwork.document.paths().len(), 3);
    }

    #[test]
    fn test_generate_city_recovers_from_duplicates() {
        let sites = vec![site("a", 0.005, 0.005), site("b", 0.005, 0.005), site("c", -0.005, 0.0)];
        let artwork = generate_city(&land(), &input("dup", sites), &ArtworkConfig::default()).unwrap();

        assert_eq!(artwork.tessellation.len(), 2);
        assert_eq!(
            artwork.diagnostics[0].reason,
            DropReason::Duplicate { kept: SiteId::from("a") }
        );
    }

    #[test]
    fn test_run_city_writes_only_on_success() {
        let config = temp_config("run_city");
        let land = land();

        let (artwork, path) = run_city(&land, &input("ok", vec![site("a", 0.0, 0.0)]), &config).unwrap();
        assert_eq!(path, config.output_dir.join("ok.svg"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), artwork.document.to_svg_string());
        assert!((artwork.tessellation.cells()[0].geometry.unsigned_area() - artwork.region.area()).abs() < 1e-6 * artwork.region.area());

        let mut ocean = input("ocean", vec![site("a", 0.0, 0.0)]);
        ocean.boundary = Boundary::from_polygon(
            polygon![
                (x: 50_000.0, y: 50_000.0),
                (x: 51_000.0, y: 50_000.0),
                (x: 51_000.0, y: 51_000.0),
                (x: 50_000.0, y: 51_000.0),
            ],
            Crs::WebMercator,
        );
        assert!(matches!(run_city(&land, &ocean, &config), Err(ArtError::RegionUnavailable(_))));
        assert!(!config.output_dir.join("ocean.svg").exists());

        std::fs::remove_dir_all(&config.output_dir).unwrap();
    }

    #[test]
    fn test_batch_isolates_failures() {
        let land = land();
        let mut config = temp_config("batch");
        config.workers = 2;

        let loader = |key: &str| -> Result<CityInput> {
            match key {
                "missing" => Err(ArtError::RegionUnavailable("no boundary".to_string())),
                "panics" => panic!("boom"),
                _ => Ok(input(key, vec![site("a", 0.0, 0.0), site("b", 0.01, 0.01)])),
            }
        };
        let keys: Vec<String> = ["one", "missing", "panics", "two"].iter().map(|s| s.to_string()).collect();

        let report = run_batch(&land, &keys, &loader, &config);

        let order: Vec<&str> = report.outcomes.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(order, vec!["one", "missing", "panics", "two"]);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 2);
        assert!(config.output_dir.join("one.svg").exists());
        assert!(config.output_dir.join("two.svg").exists());

        std::fs::remove_dir_all(&config.output_dir).unwrap();
    }

    #[test]
    fn test_batch_rejects_colliding_output_paths() {
        let land = land();
        let mut config = temp_config("collide");
        config.workers = 4;

        let loader = |key: &str| -> Result<CityInput> {
            let lon = if key == "a_b" { 0.01 } else { -0.01 };
            Ok(input(key, vec![site("a", 0.0, 0.0), site("b", 0.005, lon)]))
        };
        let keys: Vec<String> = ["a/b", "a_b", "c", "c"].iter().map(|s| s.to_string()).collect();

        for _ in 0..5 {
            let report = run_batch(&land, &keys, &loader, &config);

            let status: Vec<bool> = report.outcomes.iter().map(CityOutcome::is_success).collect();
            assert_eq!(status, vec![true, false, true, false]);
            for (outcome, owner) in report.outcomes.iter().zip(["", "a/b", "", "c"]) {
                if let Err(err) = &outcome.result {
                    assert!(matches!(err, ArtError::OutputFailed(m) if m.contains(owner)));
                }
            }

            let expected = generate_city(&land, &loader("a/b").unwrap(), &config).unwrap();
            let written = std::fs::read_to_string(config.output_dir.join("a_b.svg")).unwrap();
            assert_eq!(written, expected.document.to_svg_string());
            assert!(config.output_dir.join("c.svg").exists());
        }

        std::fs::remove_dir_all(&config.output_dir).unwrap();
    }
}
