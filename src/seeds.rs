/*!
Per-step randomness for Markov chains.

Every transition step consumes exactly one `u64` seed, and no seed may be
reused within a chain. Seeds are derived from a single master seed, either
pre-split into a vector ([`split_seeds`]) or drawn incrementally from a
[`SeedStream`] when the step count is not known up front.
*/

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Pre-splits `master` into `n` per-step seeds.
///
/// Deterministic: the same master seed always yields the same sequence.
/// Distinct master seeds (e.g. `master + chain_index` for parallel chains)
/// yield disjoint streams.
pub fn split_seeds(master: u64, n: usize) -> Vec<u64> {
    SeedStream::new(master).take(n).collect()
}

/// An endless iterator of per-step seeds derived from one master seed.
#[derive(Debug, Clone)]
pub struct SeedStream {
    rng: SmallRng,
}

impl SeedStream {
    pub fn new(master: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(master),
        }
    }
}

impl Iterator for SeedStream {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        Some(self.rng.gen())
    }
}
