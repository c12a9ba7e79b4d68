//! Seeded simulation RNG
//!
//! The world owns exactly one of these; hosts never draw from it directly.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// PCG32 wrapper that remembers its seed so a run can be replayed
#[derive(Debug, Clone)]
pub struct SimRng {
    seed: u64,
    rng: Pcg32,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restart the stream from a (possibly new) seed
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
    }

    /// Uniform float in [0, 1)
    pub fn unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// True with probability `p` (clamped to [0, 1])
    pub fn chance(&mut self, p: f64) -> bool {
        if p <= 0.0 {
            return false;
        }
        self.unit() < p.min(1.0)
    }

    /// Uniform float in [lo, hi); returns `lo` for an empty range
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        self.rng.random_range(lo..hi)
    }

    /// Pick an index with probability proportional to its weight.
    ///
    /// Negative weights count as zero. Returns `None` if nothing has weight.
    pub fn weighted_index(&mut self, weights: impl IntoIterator<Item = f64> + Clone) -> Option<usize> {
        let total: f64 = weights.clone().into_iter().map(|w| w.max(0.0)).sum();
        if total <= 0.0 {
            return None;
        }
        let mut roll = self.unit() * total;
        let mut last = None;
        for (i, w) in weights.into_iter().enumerate() {
            let w = w.max(0.0);
            if w <= 0.0 {
                continue;
            }
            if roll < w {
                return Some(i);
            }
            roll -= w;
            last = Some(i);
        }
        // Float slack at the top end of the roll
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = SimRng::new(42);
        let mut b = SimRng::new(42);
        for _ in 0..32 {
            assert_eq!(a.unit().to_bits(), b.unit().to_bits());
        }
    }

    #[test]
    fn test_reseed_restarts_stream() {
        let mut a = SimRng::new(7);
        let first = a.unit();
        a.unit();
        a.reseed(7);
        assert_eq!(a.unit().to_bits(), first.to_bits());
    }

    #[test]
    fn test_weighted_index_skips_zero_weights() {
        let mut rng = SimRng::new(1);
        for _ in 0..200 {
            let idx = rng.weighted_index([0.0, 1.0, 0.0]).unwrap();
            assert_eq!(idx, 1);
        }
        assert_eq!(rng.weighted_index([0.0, 0.0]), None);
    }

    #[test]
    fn test_weighted_index_distribution_roughly_matches() {
        let mut rng = SimRng::new(99);
        let mut counts = [0u32; 2];
        for _ in 0..10_000 {
            counts[rng.weighted_index([3.0, 1.0]).unwrap()] += 1;
        }
        let ratio = counts[0] as f64 / 10_000.0;
        assert!((ratio - 0.75).abs() < 0.03, "ratio {ratio}");
    }

    #[test]
    fn test_chance_edges() {
        let mut rng = SimRng::new(3);
        assert!(!rng.chance(0.0));
        assert!(rng.chance(1.0));
        assert_eq!(rng.range(5.0, 5.0), 5.0);
    }
}
