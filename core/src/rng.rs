//! The project's single PRNG type.
//!
//! `libchinese-core` has no RNG dependency of its own; this crate pulls in
//! `rand` with an explicit, seedable generator (mirroring how
//! `krukah-robopoker` depends on `rand` with `small_rng` rather than
//! reaching for thread-local randomness) so that "PRNG state is owned by
//! the sampler" (Concurrency & Resource Model) is literally true: every
//! sampler holds its own `Rng`, seeded from `--randseed`.

use rand::rngs::SmallRng;
use rand::{Rng as _, SeedableRng};

#[derive(Debug, Clone)]
pub struct Rng(SmallRng);

impl Rng {
    pub fn from_seed(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }

    /// Uniform draw in `[0, 1)`.
    pub fn uniform01(&mut self) -> f64 {
        self.0.random::<f64>()
    }

    /// Uniform draw in `[0, bound)`. Used throughout the restaurant/adaptor
    /// seat/unseat operations, which are specified as draws over a weighted
    /// total.
    pub fn uniform(&mut self, bound: f64) -> f64 {
        self.uniform01() * bound
    }

    /// Uniform integer draw in `[0, bound)`.
    pub fn uniform_usize(&mut self, bound: usize) -> usize {
        self.0.random_range(0..bound)
    }

    pub fn bool(&mut self) -> bool {
        self.0.random::<bool>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_in_range() {
        let mut rng = Rng::from_seed(7);
        for _ in 0..1000 {
            let x = rng.uniform(5.0);
            assert!((0.0..5.0).contains(&x));
        }
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = Rng::from_seed(1);
        let mut b = Rng::from_seed(1);
        for _ in 0..10 {
            assert_eq!(a.uniform01(), b.uniform01());
        }
    }
}
