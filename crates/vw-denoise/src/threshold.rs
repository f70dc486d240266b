//! Threshold selection and shrinkage
//!
//! Three selection rules over detail coefficients: the universal threshold,
//! the Donoho-Johnstone minimax table, and a closed-form SURE minimizer.
//! Shrinkage is soft or hard, applied in place.

use serde::{Deserialize, Serialize};
use vw_core::Sample;

/// Rule for choosing the shrinkage parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdMethod {
    /// `sigma * sqrt(2 ln N)`
    Universal,
    /// Minimizer of Stein's unbiased risk estimate
    Sure,
    /// Minimax-optimal factor, interpolated in log2 N
    Minimax,
}

impl Default for ThresholdMethod {
    fn default() -> Self {
        Self::Universal
    }
}

/// Shrinkage nonlinearity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdType {
    /// `sign(d) * max(|d| - tau, 0)`
    Soft,
    /// `d` if `|d| > tau` else 0
    Hard,
}

impl Default for ThresholdType {
    fn default() -> Self {
        Self::Soft
    }
}

/// Universal threshold `sigma * sqrt(2 ln N)`
pub fn universal_threshold(sigma: f64, n: usize) -> f64 {
    if n < 2 {
        return 0.0;
    }
    sigma * (2.0 * (n as f64).ln()).sqrt()
}

/// Minimax factors at power-of-two lengths (Donoho & Johnstone);
/// lengths of 32 or fewer take no shrinkage
const MINIMAX_TABLE: &[(f64, f64)] = &[
    (6.0, 1.4910),  // N = 64
    (7.0, 1.6739),  // N = 128
    (8.0, 1.8568),  // N = 256
    (9.0, 2.0397),  // N = 512
    (10.0, 2.2226), // N = 1024
    (11.0, 2.4055), // N = 2048
    (12.0, 2.5884), // N = 4096
    (13.0, 2.7713), // N = 8192
    (14.0, 2.9542), // N = 16384
    (15.0, 3.1371), // N = 32768
    (16.0, 3.3200), // N = 65536
];

/// Minimax threshold, linearly interpolated in log2 N
pub fn minimax_threshold(sigma: f64, n: usize) -> f64 {
    if n <= 32 {
        return 0.0;
    }
    let log_n = (n as f64).log2();
    let (first, last) = (MINIMAX_TABLE[0], MINIMAX_TABLE[MINIMAX_TABLE.len() - 1]);

    let factor = if log_n <= first.0 {
        first.1
    } else if log_n >= last.0 {
        // Extend with the table's terminal slope
        let prev = MINIMAX_TABLE[MINIMAX_TABLE.len() - 2];
        let slope = (last.1 - prev.1) / (last.0 - prev.0);
        last.1 + slope * (log_n - last.0)
    } else {
        let mut factor = last.1;
        for pair in MINIMAX_TABLE.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            if log_n <= x1 {
                factor = y0 + (y1 - y0) * (log_n - x0) / (x1 - x0);
                break;
            }
        }
        factor
    };
    sigma * factor
}

/// SURE threshold: the |d| value minimizing
/// `N - 2 * #{|d| <= tau} + sum_i min(d_i^2, tau^2)`
/// over sigma-standardized coefficients
pub fn sure_threshold(sigma: f64, detail: &[Sample]) -> f64 {
    let n = detail.len();
    if n == 0 || sigma <= 0.0 {
        return 0.0;
    }

    // Sorted squared standardized magnitudes; one sweep evaluates the risk
    // at every candidate via the running prefix sum.
    let mut squared: Vec<f64> = detail.iter().map(|&d| (d / sigma) * (d / sigma)).collect();
    squared.sort_unstable_by(|a, b| a.partial_cmp(b).expect("coefficients must be finite"));

    let nf = n as f64;
    let mut best_risk = f64::INFINITY;
    let mut best_sq = 0.0;
    let mut prefix = 0.0;
    for (k, &sq) in squared.iter().enumerate() {
        prefix += sq;
        let kept = (n - k - 1) as f64;
        let risk = nf - 2.0 * (k + 1) as f64 + prefix + kept * sq;
        if risk < best_risk {
            best_risk = risk;
            best_sq = sq;
        }
    }
    sigma * best_sq.sqrt()
}

/// Pick a threshold for one level of detail coefficients
pub fn select_threshold(
    method: ThresholdMethod,
    sigma: f64,
    n: usize,
    detail: &[Sample],
) -> f64 {
    match method {
        ThresholdMethod::Universal => universal_threshold(sigma, n),
        ThresholdMethod::Minimax => minimax_threshold(sigma, n),
        ThresholdMethod::Sure => sure_threshold(sigma, detail),
    }
}

/// Apply shrinkage in place
pub fn apply_threshold(coeffs: &mut [Sample], tau: f64, kind: ThresholdType) {
    if tau <= 0.0 {
        return;
    }
    match kind {
        ThresholdType::Soft => {
            for c in coeffs.iter_mut() {
                let magnitude = c.abs() - tau;
                *c = if magnitude > 0.0 {
                    c.signum() * magnitude
                } else {
                    0.0
                };
            }
        }
        ThresholdType::Hard => {
            for c in coeffs.iter_mut() {
                if c.abs() <= tau {
                    *c = 0.0;
                }
            }
        }
    }
}
