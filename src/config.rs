//! Artwork configuration and builder
//!
//! This module provides the knobs of a pipeline run. Every value has a
//! sensible default; the builder validates each setter so a built
//! [`ArtworkConfig`] is always usable.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ArtError, Result};

/// What to do when clipping splits a Voronoi cell into disjoint pieces
///
/// With a concave region (a bay, a river mouth) the unclipped cell of a
/// coastal site can cross water and pick up land on the other side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipPolicy {
    /// Keep every piece; the cells partition the region exactly
    UnionFragments,
    /// Keep only the piece containing the site; detached pieces stay uncoloured
    KeepSiteFragment,
}

impl Default for ClipPolicy {
    fn default() -> Self {
        ClipPolicy::UnionFragments
    }
}

/// How to collapse sites that project onto the same coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Keep the first site in input order
    FirstSeen,
    /// Keep the first site's identity with the mean colour of the group
    AverageColor,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        DuplicatePolicy::FirstSeen
    }
}

/// Configuration of an artwork run
///
/// The same configuration and inputs always produce byte-identical output.
///
/// # Example
///
/// ```rust
/// use city_voronoi::*;
///
/// let config = ArtworkConfigBuilder::new()
///     .canvas_size(2000.0)
///     .unwrap()
///     .clip_policy(ClipPolicy::KeepSiteFragment)
///     .build()
///     .unwrap();
///
/// let json = serde_json::to_string(&config).unwrap();
/// let restored: ArtworkConfig = serde_json::from_str(&json).unwrap();
/// assert_eq!(config, restored);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtworkConfig {
    /// Length of the longer canvas side in output units
    pub canvas_size: f64,

    /// Policy for cells split by the region boundary
    pub clip_policy: ClipPolicy,

    /// Policy for sites sharing a coordinate
    pub duplicate_policy: DuplicatePolicy,

    /// Number of perturbed retries after a failed tessellation
    pub max_retries: usize,

    /// Largest coordinate offset (metres) applied by a perturbed retry
    pub perturbation_epsilon: f64,

    /// Seed of the perturbation sequence
    pub perturbation_seed: u64,

    /// Polygons at or below this area (square metres) are dropped from
    /// boolean-operation results
    pub sliver_area: f64,

    /// Allowed relative difference between the summed cell area and the
    /// region area
    pub coverage_tolerance: f64,

    /// Decimal places written for SVG path coordinates
    pub coordinate_precision: usize,

    /// Cities processed concurrently
    pub workers: usize,

    /// Directory receiving one SVG per city
    pub output_dir: PathBuf,
}

impl ArtworkConfig {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            ArtError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            ArtError::InvalidConfig(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field against the same rules the builder enforces
    pub fn validate(&self) -> Result<()> {
        ArtworkConfigBuilder::new()
            .canvas_size(self.canvas_size)?
            .max_retries(self.max_retries)?
            .perturbation_epsilon(self.perturbation_epsilon)?
            .sliver_area(self.sliver_area)?
            .coverage_tolerance(self.coverage_tolerance)?
            .coordinate_precision(self.coordinate_precision)?
            .workers(self.workers)?;
        Ok(())
    }
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        ArtworkConfigBuilder::new().build_unchecked()
    }
}

/// Builder for [`ArtworkConfig`] with validation
#[derive(Debug, Clone)]
pub struct ArtworkConfigBuilder {
    canvas_size: f64,
    clip_policy: ClipPolicy,
    duplicate_policy: DuplicatePolicy,
    max_retries: usize,
    perturbation_epsilon: f64,
    perturbation_seed: u64,
    sliver_area: f64,
    coverage_tolerance: f64,
    coordinate_precision: usize,
    workers: usize,
    output_dir: PathBuf,
}

impl ArtworkConfigBuilder {
    /// Create a new builder with default values
    ///
    /// Defaults:
    /// - canvas_size: 1000
    /// - clip_policy: UnionFragments
    /// - duplicate_policy: FirstSeen
    /// - max_retries: 3
    /// - perturbation_epsilon: 1 mm
    /// - perturbation_seed: 0
    /// - sliver_area: 1e-6 m²
    /// - coverage_tolerance: 1e-4
    /// - coordinate_precision: 3
    /// - workers: 1
    /// - output_dir: `output`
    pub fn new() -> Self {
        Self {
            canvas_size: 1000.0,
            clip_policy: ClipPolicy::default(),
            duplicate_policy: DuplicatePolicy::default(),
            max_retries: 3,
            perturbation_epsilon: 1e-3,
            perturbation_seed: 0,
            sliver_area: 1e-6,
            coverage_tolerance: 1e-4,
            coordinate_precision: 3,
            workers: 1,
            output_dir: PathBuf::from("output"),
        }
    }

    /// Set the length of the longer canvas side
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` unless the size is finite and positive
    pub fn canvas_size(mut self, size: f64) -> Result<Self> {
        if !size.is_finite() || size <= 0.0 {
            return Err(ArtError::InvalidConfig(format!(
                "Canvas size must be positive (got {})",
                size
            )));
        }
        self.canvas_size = size;
        Ok(self)
    }

    pub fn clip_policy(mut self, policy: ClipPolicy) -> Self {
        self.clip_policy = policy;
        self
    }

    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Set the number of perturbed retries
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if retries > 10
    pub fn max_retries(mut self, retries: usize) -> Result<Self> {
        if retries > 10 {
            return Err(ArtError::InvalidConfig(format!(
                "Retries must be <= 10 (got {})",
                retries
            )));
        }
        self.max_retries = retries;
        Ok(self)
    }

    /// Set the perturbation magnitude in metres
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` unless epsilon is finite and positive
    pub fn perturbation_epsilon(mut self, epsilon: f64) -> Result<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(ArtError::InvalidConfig(format!(
                "Perturbation epsilon must be positive (got {})",
                epsilon
            )));
        }
        self.perturbation_epsilon = epsilon;
        Ok(self)
    }

    pub fn perturbation_seed(mut self, seed: u64) -> Self {
        self.perturbation_seed = seed;
        self
    }

    /// Set the minimum area of kept polygons
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the area is negative or not finite
    pub fn sliver_area(mut self, area: f64) -> Result<Self> {
        if !area.is_finite() || area < 0.0 {
            return Err(ArtError::InvalidConfig(format!(
                "Sliver area must be >= 0 (got {})",
                area
            )));
        }
        self.sliver_area = area;
        Ok(self)
    }

    /// Set the relative area tolerance of the partition check
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` unless the tolerance is in (0, 1)
    pub fn coverage_tolerance(mut self, tolerance: f64) -> Result<Self> {
        if !(tolerance > 0.0 && tolerance < 1.0) {
            return Err(ArtError::InvalidConfig(format!(
                "Coverage tolerance must be in (0, 1) (got {})",
                tolerance
            )));
        }
        self.coverage_tolerance = tolerance;
        Ok(self)
    }

    /// Set the decimal places of SVG coordinates
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if precision > 12
    pub fn coordinate_precision(mut self, precision: usize) -> Result<Self> {
        if precision > 12 {
            return Err(ArtError::InvalidConfig(format!(
                "Coordinate precision must be <= 12 (got {})",
                precision
            )));
        }
        self.coordinate_precision = precision;
        Ok(self)
    }

    /// Set the number of cities processed concurrently
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if workers == 0
    pub fn workers(mut self, workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(ArtError::InvalidConfig(
                "Workers must be >= 1 (got 0)".to_string(),
            ));
        }
        self.workers = workers;
        Ok(self)
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ArtworkConfig> {
        Ok(self.build_unchecked())
    }

    // every setter validates, so the fields are already consistent
    fn build_unchecked(self) -> ArtworkConfig {
        ArtworkConfig {
            canvas_size: self.canvas_size,
            clip_policy: self.clip_policy,
            duplicate_policy: self.duplicate_policy,
            max_retries: self.max_retries,
            perturbation_epsilon: self.perturbation_epsilon,
            perturbation_seed: self.perturbation_seed,
            sliver_area: self.sliver_area,
            coverage_tolerance: self.coverage_tolerance,
            coordinate_precision: self.coordinate_precision,
            workers: self.workers,
            output_dir: self.output_dir,
        }
    }
}

impl Default for ArtworkConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
