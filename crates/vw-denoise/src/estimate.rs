//! Noise level estimation
//!
//! Batch estimation is the median absolute deviation of the finest detail
//! coefficients. The streaming estimator keeps a ring of the most recent
//! detail samples and recomputes per block: MAD from the full ring,
//! Adaptive as an exponentially smoothed per-block MAD.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use vw_core::Sample;

/// MAD-to-sigma factor for Gaussian noise
const MAD_SCALE: f64 = 0.6745;

/// Smoothing weight the adaptive estimator gives its previous value
const ADAPTIVE_SMOOTHING: f64 = 0.9;

/// Noise estimation method for the streaming denoiser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoiseEstimation {
    /// Recompute MAD over the full ring window each block
    Mad,
    /// Exponentially smoothed per-block MAD
    Adaptive,
}

impl Default for NoiseEstimation {
    fn default() -> Self {
        Self::Mad
    }
}

/// `median(|values|) / 0.6745`, 0.0 for an empty slice
pub fn mad_sigma(values: &[Sample]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut magnitudes: Vec<f64> = values.iter().map(|v| v.abs()).collect();
    magnitudes.sort_unstable_by(|a, b| a.partial_cmp(b).expect("samples must be finite"));
    let mid = magnitudes.len() / 2;
    let median = if magnitudes.len() % 2 == 1 {
        magnitudes[mid]
    } else {
        0.5 * (magnitudes[mid - 1] + magnitudes[mid])
    };
    median / MAD_SCALE
}

/// Online noise estimator over a ring of recent detail samples
#[derive(Debug, Clone)]
pub struct NoiseEstimator {
    method: NoiseEstimation,
    window: VecDeque<Sample>,
    capacity: usize,
    sigma: f64,
    primed: bool,
}

impl NoiseEstimator {
    pub fn new(method: NoiseEstimation, window_size: usize) -> Self {
        debug_assert!(window_size > 0);
        Self {
            method,
            window: VecDeque::with_capacity(window_size),
            capacity: window_size,
            sigma: 0.0,
            primed: false,
        }
    }

    /// Fold one block of detail coefficients into the estimate
    pub fn update(&mut self, detail: &[Sample]) -> f64 {
        for &d in detail {
            if self.window.len() == self.capacity {
                self.window.pop_front();
            }
            self.window.push_back(d);
        }

        self.sigma = match self.method {
            NoiseEstimation::Mad => {
                let (a, b) = self.window.as_slices();
                if b.is_empty() {
                    mad_sigma(a)
                } else {
                    let ring: Vec<Sample> = self.window.iter().copied().collect();
                    mad_sigma(&ring)
                }
            }
            NoiseEstimation::Adaptive => {
                let block_sigma = mad_sigma(detail);
                if self.primed {
                    ADAPTIVE_SMOOTHING * self.sigma + (1.0 - ADAPTIVE_SMOOTHING) * block_sigma
                } else {
                    block_sigma
                }
            }
        };
        self.primed = true;
        self.sigma
    }

    /// Last computed estimate
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Samples currently held in the ring
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Forget all history
    pub fn reset(&mut self) {
        self.window.clear();
        self.sigma = 0.0;
        self.primed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mad_sigma_odd() {
        // |values| sorted: [1, 2, 3]; median 2
        assert_relative_eq!(mad_sigma(&[-2.0, 1.0, 3.0]), 2.0 / 0.6745, epsilon = 1e-12);
    }

    #[test]
    fn test_mad_sigma_even() {
        // |values| sorted: [1, 2, 3, 4]; median 2.5
        assert_relative_eq!(
            mad_sigma(&[4.0, -1.0, 2.0, -3.0]),
            2.5 / 0.6745,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_mad_sigma_degenerate() {
        assert_eq!(mad_sigma(&[]), 0.0);
        assert_eq!(mad_sigma(&[0.0; 8]), 0.0);
    }

    #[test]
    fn test_ring_window_is_bounded() {
        let mut est = NoiseEstimator::new(NoiseEstimation::Mad, 16);
        est.update(&[1.0; 10]);
        assert_eq!(est.window_len(), 10);
        est.update(&[2.0; 10]);
        assert_eq!(est.window_len(), 16);
    }

    #[test]
    fn test_mad_uses_full_ring() {
        let mut est = NoiseEstimator::new(NoiseEstimation::Mad, 8);
        est.update(&[1.0; 8]);
        // Ring now half 1.0, half 3.0: median is 2.0.
        let sigma = est.update(&[3.0; 4]);
        assert_relative_eq!(sigma, 2.0 / 0.6745, epsilon = 1e-12);
    }

    #[test]
    fn test_adaptive_smooths_between_blocks() {
        let mut est = NoiseEstimator::new(NoiseEstimation::Adaptive, 64);
        let first = est.update(&[1.0; 16]);
        assert_relative_eq!(first, 1.0 / 0.6745, epsilon = 1e-12);

        let second = est.update(&[3.0; 16]);
        let expected = 0.9 * (1.0 / 0.6745) + 0.1 * (3.0 / 0.6745);
        assert_relative_eq!(second, expected, epsilon = 1e-12);
        // Smoothed estimate lags the raw per-block value.
        assert!(second < 3.0 / 0.6745);
    }

    #[test]
    fn test_reset() {
        let mut est = NoiseEstimator::new(NoiseEstimation::Mad, 8);
        est.update(&[5.0; 8]);
        est.reset();
        assert_eq!(est.window_len(), 0);
        assert_eq!(est.sigma(), 0.0);
    }
}
