//! Error types for the artwork pipeline

use thiserror::Error;

/// Errors that can occur while turning a city into an artwork
///
/// The first five variants follow the pipeline stages: land data, the city
/// region, a single site, the site set as a whole and the Voronoi
/// construction. The rest cover configuration, input files and the final
/// write.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArtError {
    /// The land-mass reference dataset is missing, unreadable or empty
    #[error("reference data unavailable: {0}")]
    ReferenceDataUnavailable(String),

    /// The city boundary is missing, empty or has no land left after clipping
    #[error("region unavailable: {0}")]
    RegionUnavailable(String),

    /// A geodetic coordinate is outside the valid range or cannot be projected
    #[error("invalid coordinate ({lat}, {lon}): {reason}")]
    InvalidCoordinate {
        /// Latitude in degrees
        lat: f64,
        /// Longitude in degrees
        lon: f64,
        /// What is wrong with it
        reason: String,
    },

    /// Two or more sites share the exact same projected coordinate
    #[error("degenerate site set: {duplicates} site(s) share a coordinate with an earlier site")]
    DegenerateSiteSet {
        /// Number of sites that repeat an earlier coordinate
        duplicates: usize,
    },

    /// The Voronoi construction failed for numerically degenerate input
    #[error("tessellation failed: {0}")]
    TessellationFailed(String),

    /// Configuration validation failed
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An input file is malformed
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Writing the output document failed
    #[error("output failed: {0}")]
    OutputFailed(String),
}

impl ArtError {
    /// Whether a perturbed retry of the tessellation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ArtError::TessellationFailed(_))
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ArtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_tessellation_failures_are_retryable() {
        assert!(ArtError::TessellationFailed("collinear".into()).is_retryable());
        assert!(!ArtError::DegenerateSiteSet { duplicates: 2 }.is_retryable());
        assert!(!ArtError::RegionUnavailable("empty".into()).is_retryable());
    }

    #[test]
    fn test_display_includes_coordinate() {
        let err = ArtError::InvalidCoordinate {
            lat: 91.0,
            lon: 0.0,
            reason: "latitude out of range".into(),
        };
        let text = err.to_string();
        assert!(text.contains("91"));
        assert!(text.contains("latitude out of range"));
    }
}
