//! Deterministic PRNG.
//!
//! A thin wrapper around [`rand::rngs::StdRng`] seeded from a `u64`, used
//! for every tie-break in the Chord Selector and Voice-Leading Solver. Draws
//! happen in a fixed, documented traversal order (slot-major, then
//! voice-major within a slot) so that two runs given the same
//! `(bytes, instruments)` consume the stream identically and therefore
//! produce byte-identical output, matching the `StdRng::seed_from_u64`
//! pattern used elsewhere in this corpus for reproducible generation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded, deterministic source of tie-breaking randomness.
pub struct Prng {
    rng: StdRng,
}

impl Prng {
    pub fn from_seed(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Re-seed for the one allowed refinement pass: `seed XOR 0x9E3779B9`.
    pub fn reseed_for_refinement(seed: u64) -> Self {
        Self::from_seed(seed ^ crate::config::REFINEMENT_RESEED_XOR)
    }

    /// Pick the index of the maximum value in `weights`, breaking ties by
    /// drawing from the PRNG among the tied candidates.
    pub fn argmax_tie_break(&mut self, weights: &[u32]) -> usize {
        let max = *weights.iter().max().unwrap_or(&0);
        let candidates: Vec<usize> = weights
            .iter()
            .enumerate()
            .filter(|(_, &w)| w == max)
            .map(|(i, _)| i)
            .collect();
        self.choose_index(candidates.len()).map(|i| candidates[i]).unwrap_or(0)
    }

    /// Pick the index of the minimum value in `scores`, breaking ties by PRNG.
    pub fn argmin_tie_break(&mut self, scores: &[i32]) -> usize {
        let min = *scores.iter().min().unwrap_or(&0);
        let candidates: Vec<usize> = scores
            .iter()
            .enumerate()
            .filter(|(_, &s)| s == min)
            .map(|(i, _)| i)
            .collect();
        self.choose_index(candidates.len()).map(|i| candidates[i]).unwrap_or(0)
    }

    fn choose_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else if len == 1 {
            Some(0)
        } else {
            Some(self.rng.gen_range(0..len))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Prng::from_seed(42);
        let mut b = Prng::from_seed(42);
        let weights = [3, 3, 1, 3];
        assert_eq!(a.argmax_tie_break(&weights), b.argmax_tie_break(&weights));
    }

    #[test]
    fn argmax_picks_among_true_maxima() {
        let mut p = Prng::from_seed(7);
        let weights = [1, 5, 2, 5];
        let idx = p.argmax_tie_break(&weights);
        assert!(idx == 1 || idx == 3);
    }

    #[test]
    fn reseed_differs_from_original() {
        let seed = 123u64;
        let mut original = Prng::from_seed(seed);
        let mut refined = Prng::reseed_for_refinement(seed);
        let weights = [1; 32];
        // Drawing indices from a uniform field of equal weights should
        // eventually diverge between independently seeded streams.
        let a: Vec<usize> = (0..8).map(|_| original.choose_index(32).unwrap()).collect();
        let b: Vec<usize> = (0..8).map(|_| refined.choose_index(32).unwrap()).collect();
        assert_ne!(a, b);
    }
}
