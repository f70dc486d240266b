//! Multi-level MODWT decomposition and reconstruction
//!
//! Cascades the single-level transform on the running approximation with
//! upsampled filters per level. Reconstruction walks the levels in reverse,
//! summing the two synthesis contributions per stage.

use std::sync::Arc;

use vw_core::{BoundaryMode, Sample, TransformError, TransformResult, rotate_left};

use crate::convolution;
use crate::filters::FilterCache;
use crate::modwt::add_assign;
use crate::wavelet::{Wavelet, WaveletKind};

/// Maximum safe decomposition depth for a signal of length `n` and filter
/// length `filter_len`: the largest J with `(L-1)·(2^J - 1) <= n`, minimum 1
pub fn max_level(n: usize, filter_len: usize) -> usize {
    debug_assert!(filter_len >= 2);
    let span = filter_len - 1;
    let mut j = 1;
    loop {
        let next = j + 1;
        let Some(pow) = 1usize.checked_shl(next as u32) else {
            break;
        };
        match span.checked_mul(pow - 1) {
            Some(need) if need <= n => j = next,
            _ => break,
        }
    }
    j
}

/// Immutable multi-level MODWT coefficients
///
/// `details[0]` is level 1; every sequence has the signal's length.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiLevelModwtResult {
    details: Vec<Vec<Sample>>,
    approx: Vec<Sample>,
}

impl MultiLevelModwtResult {
    /// Decomposition depth J
    pub fn levels(&self) -> usize {
        self.details.len()
    }

    /// Signal length N
    pub fn signal_len(&self) -> usize {
        self.approx.len()
    }

    /// Detail coefficients for a 1-based level
    pub fn detail(&self, level: usize) -> &[Sample] {
        assert!(level >= 1 && level <= self.details.len(), "level out of range");
        &self.details[level - 1]
    }

    /// Final approximation at level J
    pub fn approx(&self) -> &[Sample] {
        &self.approx
    }

    /// Energies: approximation first, then details level 1..=J
    pub fn energy_per_level(&self) -> Vec<Sample> {
        let mut energies = Vec::with_capacity(self.details.len() + 1);
        energies.push(vw_core::energy(&self.approx));
        for detail in &self.details {
            energies.push(vw_core::energy(detail));
        }
        energies
    }

    /// Convert into the mutable form used by owners that threshold in place
    pub fn into_mutable(self) -> MutableMultiLevelModwtResult {
        MutableMultiLevelModwtResult {
            details: self.details,
            approx: self.approx,
        }
    }
}

/// Multi-level coefficients permitting in-place detail modification
///
/// Only reachable by consuming an immutable result; used by the denoising
/// paths that own their coefficients.
#[derive(Debug, Clone)]
pub struct MutableMultiLevelModwtResult {
    details: Vec<Vec<Sample>>,
    approx: Vec<Sample>,
}

impl MutableMultiLevelModwtResult {
    pub fn levels(&self) -> usize {
        self.details.len()
    }

    pub fn signal_len(&self) -> usize {
        self.approx.len()
    }

    /// Mutable detail coefficients for a 1-based level
    pub fn detail_mut(&mut self, level: usize) -> &mut [Sample] {
        assert!(level >= 1 && level <= self.details.len(), "level out of range");
        &mut self.details[level - 1]
    }

    pub fn detail(&self, level: usize) -> &[Sample] {
        assert!(level >= 1 && level <= self.details.len(), "level out of range");
        &self.details[level - 1]
    }

    pub fn approx(&self) -> &[Sample] {
        &self.approx
    }

    /// Freeze back into the immutable form
    pub fn freeze(self) -> MultiLevelModwtResult {
        MultiLevelModwtResult {
            details: self.details,
            approx: self.approx,
        }
    }
}

/// Multi-level MODWT transform
///
/// Holds a lazily filled per-level filter table; cloning shares it.
#[derive(Clone)]
pub struct MultiLevelModwt {
    boundary: BoundaryMode,
    cache: Arc<FilterCache>,
}

impl MultiLevelModwt {
    pub fn new(wavelet: Wavelet, boundary: BoundaryMode) -> TransformResult<Self> {
        if !wavelet.supports_modwt() {
            return Err(TransformError::UnsupportedWavelet {
                name: wavelet.name().to_string(),
            });
        }
        Ok(Self {
            boundary,
            cache: Arc::new(FilterCache::new(wavelet)),
        })
    }

    pub fn wavelet(&self) -> &Wavelet {
        self.cache.wavelet()
    }

    pub fn boundary(&self) -> BoundaryMode {
        self.boundary
    }

    fn validate(&self, n: usize, levels: usize) -> TransformResult<()> {
        if n == 0 {
            return Err(TransformError::EmptySignal);
        }
        let l = self.wavelet().filter_len();
        if n < l {
            return Err(TransformError::SignalTooShort { n, filter_len: l });
        }
        let max = max_level(n, l);
        if levels == 0 || levels > max {
            return Err(TransformError::LevelOutOfRange {
                requested: levels,
                max,
            });
        }
        Ok(())
    }

    /// Decompose `x` down to `levels`
    pub fn forward(&self, x: &[Sample], levels: usize) -> TransformResult<MultiLevelModwtResult> {
        self.validate(x.len(), levels)?;
        let n = x.len();

        let mut approx = x.to_vec();
        let mut details = Vec::with_capacity(levels);
        let mut next = vec![0.0; n];

        for level in 1..=levels {
            let bank = self.cache.level(level);
            let mut detail = vec![0.0; n];
            convolution::analyze(&approx, &bank.h0, &mut next, self.boundary);
            convolution::analyze(&approx, &bank.h1, &mut detail, self.boundary);
            std::mem::swap(&mut approx, &mut next);
            details.push(detail);
        }

        Ok(MultiLevelModwtResult { details, approx })
    }

    /// Reconstruct the signal from a decomposition
    pub fn inverse(&self, result: &MultiLevelModwtResult) -> TransformResult<Vec<Sample>> {
        let n = result.signal_len();
        self.validate(n, result.levels())?;
        for d in &result.details {
            if d.len() != n {
                return Err(TransformError::LengthMismatch {
                    expected: n,
                    got: d.len(),
                });
            }
        }

        let biorthogonal = self.wavelet().kind() == WaveletKind::Biorthogonal;
        let mut approx = result.approx.clone();
        let mut scratch = vec![0.0; n];
        let mut low = vec![0.0; n];

        for level in (1..=result.levels()).rev() {
            let bank = self.cache.level(level);
            let detail = &result.details[level - 1];
            if biorthogonal {
                convolution::analyze(&approx, &bank.g0, &mut low, self.boundary);
                convolution::analyze(detail, &bank.g1, &mut scratch, self.boundary);
                add_assign(&mut low, &scratch);
                if self.boundary == BoundaryMode::Periodic {
                    low = rotate_left(&low, bank.delay);
                }
            } else {
                convolution::synthesize(&approx, &bank.h0, &mut low, self.boundary);
                convolution::synthesize(detail, &bank.h1, &mut scratch, self.boundary);
                add_assign(&mut low, &scratch);
            }
            std::mem::swap(&mut approx, &mut low);
        }

        Ok(approx)
    }
}
