//! Duplicate-coordinate detection and collapsing

use std::collections::HashMap;

use geo::Coord;
use tracing::warn;

use crate::config::DuplicatePolicy;
use crate::render::Color;
use crate::site::{DropReason, ProjectedSite, SiteDiagnostic};

/// Bit pattern of a coordinate, with -0.0 folded into 0.0
fn coord_key(c: Coord<f64>) -> (u64, u64) {
    let norm = |v: f64| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() };
    (norm(c.x), norm(c.y))
}

/// Number of sites that repeat the exact coordinate of an earlier site
pub fn count_duplicates(sites: &[ProjectedSite]) -> usize {
    let mut seen = HashMap::with_capacity(sites.len());
    sites
        .iter()
        .filter(|s| seen.insert(coord_key(s.position), ()).is_some())
        .count()
}

/// Collapse sites sharing a coordinate into one
///
/// The first site of each group keeps its place in the order. Its colour is
/// kept as is (`FirstSeen`) or replaced by the group mean (`AverageColor`).
/// Every other member of the group is reported as a diagnostic.
pub fn dedup_sites(
    sites: Vec<ProjectedSite>,
    policy: DuplicatePolicy,
) -> (Vec<ProjectedSite>, Vec<SiteDiagnostic>) {
    let mut first_at: HashMap<(u64, u64), usize> = HashMap::with_capacity(sites.len());
    let mut groups: Vec<Vec<Color>> = Vec::with_capacity(sites.len());
    let mut kept: Vec<ProjectedSite> = Vec::with_capacity(sites.len());
    let mut dropped = Vec::new();

    for site in sites {
        let key = coord_key(site.position);
        match first_at.get(&key) {
            Some(&slot) => {
                warn!(site = %site.id, kept = %kept[slot].id, "collapsing duplicate site");
                groups[slot].push(site.color);
                dropped.push(SiteDiagnostic::new(
                    site.id,
                    DropReason::Duplicate {
                        kept: kept[slot].id.clone(),
                    },
                ));
            }
            None => {
                first_at.insert(key, kept.len());
                groups.push(vec![site.color]);
                kept.push(site);
            }
        }
    }

    if policy == DuplicatePolicy::AverageColor {
        for (site, colors) in kept.iter_mut().zip(&groups) {
            if colors.len() > 1 {
                if let Some(mean) = Color::average(colors) {
                    site.color = mean;
                }
            }
        }
    }

    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::SiteId;

    fn site(id: &str, x: f64, y: f64, color: [f64; 3]) -> ProjectedSite {
        ProjectedSite::new(
            SiteId::from(id),
            Coord { x, y },
            Color::from_slice(&color).unwrap(),
        )
    }

    #[test]
    fn test_count_duplicates() {
        let sites = vec![
            site("a", 1.0, 1.0, [0.0; 3]),
            site("b", 1.0, 1.0, [0.0; 3]),
            site("c", 2.0, 1.0, [0.0; 3]),
            site("d", 1.0, 1.0, [0.0; 3]),
        ];
        assert_eq!(count_duplicates(&sites), 2);
        assert_eq!(count_duplicates(&sites[2..]), 0);
    }

    #[test]
    fn test_negative_zero_is_a_duplicate() {
        let sites = vec![site("a", 0.0, 1.0, [0.0; 3]), site("b", -0.0, 1.0, [0.0; 3])];
        assert_eq!(count_duplicates(&sites), 1);
    }

    #[test]
    fn test_dedup_first_seen() {
        let sites = vec![
            site("a", 1.0, 1.0, [1.0, 0.0, 0.0]),
            site("b", 5.0, 5.0, [0.0, 1.0, 0.0]),
            site("c", 1.0, 1.0, [0.0, 0.0, 1.0]),
        ];
        let (kept, dropped) = dedup_sites(sites, DuplicatePolicy::FirstSeen);

        let ids: Vec<&str> = kept.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(kept[0].color.to_hex(), "#ff0000");
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].site.as_str(), "c");
        assert_eq!(
            dropped[0].reason,
            DropReason::Duplicate {
                kept: SiteId::from("a")
            }
        );
    }

    #[test]
    fn test_dedup_average_color() {
        let sites = vec![
            site("a", 1.0, 1.0, [1.0, 0.0, 0.0]),
            site("c", 1.0, 1.0, [0.0, 0.0, 1.0]),
        ];
        let (kept, dropped) = dedup_sites(sites, DuplicatePolicy::AverageColor);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id.as_str(), "a");
        assert_eq!(kept[0].color.channels(), [0.5, 0.0, 0.5]);
        assert_eq!(dropped.len(), 1);
    }
}
