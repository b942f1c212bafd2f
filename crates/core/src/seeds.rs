//! Batch seed allocation.
//!
//! Providers whose parameter set includes a `seed` field get one
//! distinct seed per generation in a batch, so that the N outputs of a
//! single prompt are deterministically reproducible but never
//! identical. Providers without a seed concept get `None` throughout.

use std::collections::HashSet;

use rand::Rng;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Parameter field that marks a provider as seed-capable.
pub const SEED_FIELD: &str = "seed";

/// Floor of the candidate range. Collisions are effectively impossible
/// at any permitted batch size, but uniqueness is enforced regardless.
const MIN_SEED_RANGE: i64 = 1 << 32;

/// The candidate range is never smaller than this multiple of `n`.
const RANGE_PER_SEED: i64 = 10;

/// Consecutive rejected samples tolerated before the range widens.
const MAX_REJECTS: u32 = 16;

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

/// Whether the provider parameter object carries a seed-capable field.
pub fn params_use_seed(params: &Value) -> bool {
    params
        .as_object()
        .is_some_and(|obj| obj.contains_key(SEED_FIELD))
}

/// Produce `n` pairwise-distinct seeds.
///
/// Rejection-samples from `0..range` where `range` starts at
/// `max(MIN_SEED_RANGE, RANGE_PER_SEED * n)`. After [`MAX_REJECTS`]
/// consecutive collisions the range doubles, so termination is
/// guaranteed for any `n >= 1` without unbounded retry.
pub fn generate_unique_seeds(n: usize) -> Vec<i64> {
    let mut range = MIN_SEED_RANGE.max((n as i64).saturating_mul(RANGE_PER_SEED));
    let mut rng = rand::rng();
    let mut chosen: HashSet<i64> = HashSet::with_capacity(n);
    let mut seeds = Vec::with_capacity(n);
    let mut rejects = 0u32;

    while seeds.len() < n {
        let candidate = rng.random_range(0..range);
        if chosen.insert(candidate) {
            seeds.push(candidate);
            rejects = 0;
        } else {
            rejects += 1;
            if rejects >= MAX_REJECTS {
                range = range.saturating_mul(2);
                rejects = 0;
            }
        }
    }

    seeds
}

/// Allocate the per-generation seed column values for a batch of `n`.
///
/// Seeded mode yields `n` distinct `Some(seed)` values; unseeded mode
/// yields `n` `None`s. Pure and infallible for any `n >= 1`.
pub fn allocate_seeds(n: usize, seeded: bool) -> Vec<Option<i64>> {
    if seeded {
        generate_unique_seeds(n).into_iter().map(Some).collect()
    } else {
        vec![None; n]
    }
}
