//! Deterministic site jitter for retrying a failed tessellation
//!
//! Collinear or numerically awkward site sets make the triangulation fail.
//! Moving every site by a tiny seeded offset breaks the degeneracy while
//! keeping runs reproducible: the same seed and attempt always yield the
//! same offsets.

use geo::Coord;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Offset each position by a uniform amount in `[-epsilon, epsilon]` per axis
///
/// Attempt `n` draws from a generator seeded with `seed + n`, so successive
/// retries try different configurations.
pub fn perturb(positions: &[Coord<f64>], epsilon: f64, seed: u64, attempt: u32) -> Vec<Coord<f64>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(attempt as u64));

    positions
        .iter()
        .map(|p| Coord {
            x: p.x + rng.gen_range(-epsilon..=epsilon),
            y: p.y + rng.gen_range(-epsilon..=epsilon),
        })
        .collect()
}
