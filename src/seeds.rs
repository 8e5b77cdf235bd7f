//! Per-particle random fractions.
//!
//! Every particle gets an integer seed when it is emitted. Parameters sampled
//! with [`Parameter::sample_seeded`](crate::parameter::Parameter::sample_seeded)
//! look the seed up in a [`ParticleSeeds`] table, so a particle keeps the same
//! random blend for its whole lifetime while neighbours differ.
//!
//! # Example
//!
//! ```
//! use particle_params::seeds::ParticleSeeds;
//!
//! let seeds = ParticleSeeds::new(42);
//! assert_eq!(seeds.fraction(7), seeds.fraction(7));
//! assert!((0.0..1.0).contains(&seeds.fraction(7)));
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Number of entries in the default table, and the seed range handed out by
/// [`ParticleSeeds::random_seed`].
pub const DEFAULT_SEED_COUNT: usize = 4096;

/// Fixed table of uniform fractions in `[0, 1)` indexed by particle seed.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleSeeds {
    fractions: Vec<f32>,
}

impl ParticleSeeds {
    /// Table of [`DEFAULT_SEED_COUNT`] fractions generated from `seed`.
    pub fn new(seed: u64) -> Self {
        Self::with_len(seed, DEFAULT_SEED_COUNT)
    }

    /// Table of `len` fractions generated from `seed`. `len` is at least 1.
    pub fn with_len(seed: u64, len: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let fractions = (0..len.max(1)).map(|_| rng.gen::<f32>()).collect();
        Self { fractions }
    }

    /// Build a table from explicit fractions, clamped into `[0, 1]`.
    ///
    /// An empty list yields a single `0.0` entry.
    pub fn from_fractions(fractions: impl IntoIterator<Item = f32>) -> Self {
        let mut fractions: Vec<f32> = fractions.into_iter().map(|f| f.clamp(0.0, 1.0)).collect();
        if fractions.is_empty() {
            fractions.push(0.0);
        }
        Self { fractions }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fractions.len()
    }

    /// Always false; a table holds at least one entry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fractions.is_empty()
    }

    /// Fraction for `seed`, wrapping around the table.
    #[inline]
    pub fn fraction(&self, seed: u32) -> f32 {
        self.fractions[seed as usize % self.fractions.len()]
    }

    /// A fresh seed in `0..len()` for a newly emitted particle.
    pub fn random_seed<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(0..self.fractions.len()) as u32
    }
}

impl Default for ParticleSeeds {
    fn default() -> Self {
        Self::new(0)
    }
}
