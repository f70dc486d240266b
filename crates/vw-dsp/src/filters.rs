//! MODWT filter scaling and upsampling
//!
//! Level-1 MODWT filters are the wavelet's filters scaled by 1/sqrt(2). The
//! level-j cascade stage convolves the running approximation with the level-1
//! filter upsampled by 2^(j-1) (2^(j-1)-1 zeros between taps), so the
//! effective filter against the original signal carries the 2^(-j/2) scale.
//! Per-level banks are computed lazily and shared under a single-writer,
//! many-readers guard.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::wavelet::{Wavelet, WaveletKind};

const FRAC_1_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Scale every tap by a constant
pub fn scale_filter(filter: &[f64], factor: f64) -> Vec<f64> {
    filter.iter().map(|&x| x * factor).collect()
}

/// Insert `2^(level-1) - 1` zeros between taps
///
/// Level 1 returns the filter unchanged. The upsampled length is
/// `(L - 1) * 2^(level-1) + 1`.
pub fn upsample_filter(filter: &[f64], level: usize) -> Vec<f64> {
    debug_assert!(level >= 1);
    let stride = 1usize << (level - 1);
    if stride == 1 {
        return filter.to_vec();
    }
    let l = filter.len();
    let mut out = vec![0.0; (l - 1) * stride + 1];
    for (i, &tap) in filter.iter().enumerate() {
        out[i * stride] = tap;
    }
    out
}

/// Level-1 scaled filter: `f / sqrt(2)`
pub fn modwt_scale(filter: &[f64]) -> Vec<f64> {
    scale_filter(filter, FRAC_1_SQRT_2)
}

/// Cascade-stage filter for a given level: scaled then upsampled
pub fn modwt_level_filter(filter: &[f64], level: usize) -> Vec<f64> {
    upsample_filter(&modwt_scale(filter), level)
}

/// All four stage filters for one decomposition level, plus the cyclic
/// synthesis delay at that level
#[derive(Debug)]
pub struct LevelFilterBank {
    /// Analysis low-pass
    pub h0: Arc<[f64]>,
    /// Analysis high-pass
    pub h1: Arc<[f64]>,
    /// Synthesis low-pass
    pub g0: Arc<[f64]>,
    /// Synthesis high-pass
    pub g1: Arc<[f64]>,
    /// Cyclic delay compensated after this stage's synthesis (biorthogonal
    /// Periodic only; 0 for orthogonal wavelets)
    pub delay: usize,
}

/// Lazily computed per-level filter table for one wavelet
///
/// Shared by the multi-level transform and the denoiser; banks are built at
/// most once per level.
pub struct FilterCache {
    wavelet: Wavelet,
    banks: RwLock<Vec<Option<Arc<LevelFilterBank>>>>,
}

impl FilterCache {
    pub fn new(wavelet: Wavelet) -> Self {
        Self {
            wavelet,
            banks: RwLock::new(Vec::new()),
        }
    }

    pub fn wavelet(&self) -> &Wavelet {
        &self.wavelet
    }

    /// Bank for a 1-based decomposition level
    pub fn level(&self, level: usize) -> Arc<LevelFilterBank> {
        debug_assert!(level >= 1);
        {
            let banks = self.banks.read();
            if let Some(Some(bank)) = banks.get(level - 1) {
                return Arc::clone(bank);
            }
        }

        let mut banks = self.banks.write();
        if banks.len() < level {
            banks.resize_with(level, || None);
        }
        if let Some(bank) = &banks[level - 1] {
            return Arc::clone(bank);
        }

        let bank = Arc::new(self.build_level(level));
        banks[level - 1] = Some(Arc::clone(&bank));
        log::debug!(
            "computed level-{level} filter bank for '{}' ({} taps)",
            self.wavelet.name(),
            bank.h0.len()
        );
        bank
    }

    fn build_level(&self, level: usize) -> LevelFilterBank {
        let w = &self.wavelet;
        let delay = if w.kind() == WaveletKind::Biorthogonal {
            w.group_delay() << (level - 1)
        } else {
            0
        };
        LevelFilterBank {
            h0: modwt_level_filter(w.h0(), level).into(),
            h1: modwt_level_filter(w.h1(), level).into(),
            g0: modwt_level_filter(w.g0(), level).into(),
            g1: modwt_level_filter(w.g1(), level).into(),
            delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavelet::get_wavelet;
    use approx::assert_relative_eq;

    #[test]
    fn test_upsample_level1_is_identity() {
        let f = vec![1.0, 2.0, 3.0];
        assert_eq!(upsample_filter(&f, 1), f);
    }

    #[test]
    fn test_upsample_level3() {
        let f = vec![1.0, 2.0];
        let up = upsample_filter(&f, 3);
        assert_eq!(up, vec![1.0, 0.0, 0.0, 0.0, 2.0]);
        assert_eq!(up.len(), (f.len() - 1) * 4 + 1);
    }

    #[test]
    fn test_scale_preserves_shape() {
        let f = vec![2.0, -4.0];
        assert_eq!(modwt_scale(&f), vec![std::f64::consts::SQRT_2, -2.0 * std::f64::consts::SQRT_2]);
    }

    #[test]
    fn test_cache_returns_shared_banks() {
        let cache = FilterCache::new(get_wavelet("db4").unwrap());
        let a = cache.level(3);
        let b = cache.level(3);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.h0.len(), 7 * 4 + 1);
    }

    #[test]
    fn test_level_filter_energy_halves_per_level() {
        // Upsampling preserves energy; the 1/sqrt(2) scale halves it once.
        let w = get_wavelet("db2").unwrap();
        for level in 1..=4 {
            let f = modwt_level_filter(w.h0(), level);
            let energy: f64 = f.iter().map(|x| x * x).sum();
            assert_relative_eq!(energy, 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_biorthogonal_delay_scales_with_level() {
        let cache = FilterCache::new(get_wavelet("bior1_3").unwrap());
        assert_eq!(cache.level(1).delay, 5);
        assert_eq!(cache.level(2).delay, 10);
        assert_eq!(cache.level(3).delay, 20);
    }
}
