//! Single-level MODWT transform
//!
//! Orchestrates forward/inverse on one signal: validates inputs, scales the
//! level-1 filters, runs the convolution kernels, and packages the result.
//! The transform is a value type with no mutable state; concurrent callers
//! may share one instance across threads.

use std::sync::Arc;

use vw_core::{BoundaryMode, BufferPool, Sample, TransformError, TransformResult, rotate_left};

use crate::convolution;
use crate::filters::modwt_scale;
use crate::wavelet::{Wavelet, WaveletKind};

/// Single-level MODWT coefficients
///
/// Both sequences have the signal's length; internal storage is never
/// exposed mutably.
#[derive(Debug, Clone, PartialEq)]
pub struct ModwtResult {
    approx: Vec<Sample>,
    detail: Vec<Sample>,
}

impl ModwtResult {
    /// Assemble a result from coefficient vectors of equal length
    pub fn new(approx: Vec<Sample>, detail: Vec<Sample>) -> TransformResult<Self> {
        if approx.len() != detail.len() {
            return Err(TransformError::LengthMismatch {
                expected: approx.len(),
                got: detail.len(),
            });
        }
        Ok(Self { approx, detail })
    }

    /// Approximation coefficients (read-only view)
    pub fn approx(&self) -> &[Sample] {
        &self.approx
    }

    /// Detail coefficients (read-only view)
    pub fn detail(&self) -> &[Sample] {
        &self.detail
    }

    /// Signal length N
    pub fn len(&self) -> usize {
        self.approx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.approx.is_empty()
    }

    /// (approximation energy, detail energy)
    pub fn energy(&self) -> (Sample, Sample) {
        (vw_core::energy(&self.approx), vw_core::energy(&self.detail))
    }

    /// Consume into the coefficient vectors
    pub fn into_parts(self) -> (Vec<Sample>, Vec<Sample>) {
        (self.approx, self.detail)
    }
}

/// Single-level MODWT transform for one wavelet and boundary mode
#[derive(Debug, Clone)]
pub struct Modwt {
    wavelet: Wavelet,
    boundary: BoundaryMode,
    h0: Arc<[f64]>,
    h1: Arc<[f64]>,
    g0: Arc<[f64]>,
    g1: Arc<[f64]>,
}

impl Modwt {
    /// Create a transform; continuous wavelets are rejected
    pub fn new(wavelet: Wavelet, boundary: BoundaryMode) -> TransformResult<Self> {
        if !wavelet.supports_modwt() {
            return Err(TransformError::UnsupportedWavelet {
                name: wavelet.name().to_string(),
            });
        }
        let h0: Arc<[f64]> = modwt_scale(wavelet.h0()).into();
        let h1: Arc<[f64]> = modwt_scale(wavelet.h1()).into();
        let g0: Arc<[f64]> = modwt_scale(wavelet.g0()).into();
        let g1: Arc<[f64]> = modwt_scale(wavelet.g1()).into();
        Ok(Self {
            wavelet,
            boundary,
            h0,
            h1,
            g0,
            g1,
        })
    }

    pub fn wavelet(&self) -> &Wavelet {
        &self.wavelet
    }

    pub fn boundary(&self) -> BoundaryMode {
        self.boundary
    }

    /// Scaled level-1 analysis filters
    pub(crate) fn analysis_filters(&self) -> (&Arc<[f64]>, &Arc<[f64]>) {
        (&self.h0, &self.h1)
    }

    /// Scaled level-1 synthesis filters
    pub(crate) fn synthesis_filters(&self) -> (&Arc<[f64]>, &Arc<[f64]>) {
        (&self.g0, &self.g1)
    }

    pub(crate) fn validate_len(&self, n: usize) -> TransformResult<()> {
        if n == 0 {
            return Err(TransformError::EmptySignal);
        }
        let l = self.wavelet.filter_len();
        if n < l {
            return Err(TransformError::SignalTooShort { n, filter_len: l });
        }
        Ok(())
    }

    /// Forward transform: two kernel passes over the signal
    pub fn forward(&self, x: &[Sample]) -> TransformResult<ModwtResult> {
        self.validate_len(x.len())?;
        let n = x.len();
        let mut approx = vec![0.0; n];
        let mut detail = vec![0.0; n];
        convolution::analyze(x, &self.h0, &mut approx, self.boundary);
        convolution::analyze(x, &self.h1, &mut detail, self.boundary);
        Ok(ModwtResult { approx, detail })
    }

    /// Inverse transform
    ///
    /// Orthogonal wavelets synthesize by correlation with the analysis
    /// filters (zero delay). Biorthogonal wavelets synthesize by circular
    /// convolution with the reconstruction filters, then compensate the
    /// filter bank's group delay with a cyclic advance (Periodic mode only;
    /// ZeroPadding leaves edge artifacts uncompensated).
    pub fn inverse(&self, result: &ModwtResult) -> TransformResult<Vec<Sample>> {
        self.inverse_impl(result, None)
    }

    /// Inverse transform drawing scratch buffers from a pool
    pub fn inverse_with_pool(
        &self,
        result: &ModwtResult,
        pool: &BufferPool,
    ) -> TransformResult<Vec<Sample>> {
        self.inverse_impl(result, Some(pool))
    }

    fn inverse_impl(
        &self,
        result: &ModwtResult,
        pool: Option<&BufferPool>,
    ) -> TransformResult<Vec<Sample>> {
        self.validate_len(result.len())?;
        let n = result.len();

        let mut out = vec![0.0; n];
        let mut scratch = match pool {
            Some(pool) => pool.acquire(n),
            None => vec![0.0; n],
        };

        match self.wavelet.kind() {
            WaveletKind::Orthogonal => {
                convolution::synthesize(&result.approx, &self.h0, &mut out, self.boundary);
                convolution::synthesize(&result.detail, &self.h1, &mut scratch, self.boundary);
                add_assign(&mut out, &scratch);
            }
            WaveletKind::Biorthogonal => {
                convolution::analyze(&result.approx, &self.g0, &mut out, self.boundary);
                convolution::analyze(&result.detail, &self.g1, &mut scratch, self.boundary);
                add_assign(&mut out, &scratch);
                if self.boundary == BoundaryMode::Periodic {
                    out = rotate_left(&out, self.wavelet.group_delay());
                }
            }
            // Rejected in new()
            WaveletKind::Continuous => unreachable!(),
        }

        if let Some(pool) = pool {
            pool.release(scratch);
        }
        Ok(out)
    }
}

pub(crate) fn add_assign(dst: &mut [Sample], src: &[Sample]) {
    debug_assert_eq!(dst.len(), src.len());
    for (d, s) in dst.iter_mut().zip(src) {
        *d += s;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavelet::{get_wavelet, orthogonal_wavelets};
    use approx::assert_relative_eq;

    fn roundtrip_error(w: &Wavelet, mode: BoundaryMode, x: &[Sample]) -> f64 {
        let t = Modwt::new(w.clone(), mode).unwrap();
        let coeffs = t.forward(x).unwrap();
        let rec = t.inverse(&coeffs).unwrap();
        x.iter()
            .zip(&rec)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_haar_forward_n7() {
        let w = get_wavelet("haar").unwrap();
        let t = Modwt::new(w, BoundaryMode::Periodic).unwrap();
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let r = t.forward(&x).unwrap();
        assert_eq!(r.approx().len(), 7);
        assert_eq!(r.detail().len(), 7);
        // Level-1 MODWT Haar taps are 1/2: approx[1] = (x[1] + x[0]) / 2
        assert_relative_eq!(r.approx()[1], 1.5, epsilon = 1e-14);
        assert_relative_eq!(r.detail()[1], 0.5, epsilon = 1e-14);
        // t = 0 wraps to the last sample
        assert_relative_eq!(r.approx()[0], 4.0, epsilon = 1e-14);
        assert_relative_eq!(r.detail()[0], -3.0, epsilon = 1e-14);
    }

    #[test]
    fn test_haar_roundtrip_n7() {
        let w = get_wavelet("haar").unwrap();
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        assert!(roundtrip_error(&w, BoundaryMode::Periodic, &x) <= 1e-14);
    }

    #[test]
    fn test_orthogonal_periodic_roundtrip_all() {
        let x: Vec<Sample> = (0..200)
            .map(|i| (i as f64 * 0.17).sin() * (1.0 + 0.01 * i as f64))
            .collect();
        for w in orthogonal_wavelets() {
            let err = roundtrip_error(&w, BoundaryMode::Periodic, &x);
            let bound = 10.0 * f64::EPSILON * vw_core::max_abs(&x);
            assert!(
                err <= bound,
                "wavelet {} error {err} exceeds {bound}",
                w.name()
            );
        }
    }

    #[test]
    fn test_biorthogonal_periodic_roundtrip() {
        let x: Vec<Sample> = (0..128).map(|i| (i as f64 * 0.23).cos()).collect();
        for name in ["bior1_3", "bior1_5"] {
            let w = get_wavelet(name).unwrap();
            let err = roundtrip_error(&w, BoundaryMode::Periodic, &x);
            assert!(err <= 1e-12, "wavelet {name} error {err}");
        }
    }

    #[test]
    fn test_biorthogonal_constant_exact() {
        let w = get_wavelet("bior1_3").unwrap();
        let x = vec![3.0; 16];
        let t = Modwt::new(w, BoundaryMode::Periodic).unwrap();
        let r = t.forward(&x).unwrap();
        let rec = t.inverse(&r).unwrap();
        for &v in &rec {
            assert_relative_eq!(v, 3.0, epsilon = 1e-13);
        }
    }

    #[test]
    fn test_validation_errors() {
        let w = get_wavelet("db4").unwrap();
        let t = Modwt::new(w, BoundaryMode::Periodic).unwrap();
        assert!(matches!(t.forward(&[]), Err(TransformError::EmptySignal)));
        assert!(matches!(
            t.forward(&[1.0, 2.0, 3.0]),
            Err(TransformError::SignalTooShort { n: 3, filter_len: 8 })
        ));

        let morlet = get_wavelet("morlet").unwrap();
        assert!(matches!(
            Modwt::new(morlet, BoundaryMode::Periodic),
            Err(TransformError::UnsupportedWavelet { .. })
        ));
    }

    #[test]
    fn test_result_shape_mismatch_rejected() {
        assert!(ModwtResult::new(vec![0.0; 4], vec![0.0; 5]).is_err());
    }

    #[test]
    fn test_inverse_with_pool_matches_plain() {
        let w = get_wavelet("sym4").unwrap();
        let t = Modwt::new(w, BoundaryMode::Periodic).unwrap();
        let x: Vec<Sample> = (0..96).map(|i| (i as f64 * 0.31).sin()).collect();
        let r = t.forward(&x).unwrap();

        let pool = BufferPool::new();
        let plain = t.inverse(&r).unwrap();
        let pooled = t.inverse_with_pool(&r, &pool).unwrap();
        assert_eq!(plain, pooled);
        assert_eq!(pool.stats().held_buffers, 1);
    }

    #[test]
    fn test_zero_padding_interior_matches_periodic() {
        // Away from the edges the two boundary modes read the same samples.
        let w = get_wavelet("db2").unwrap();
        let x: Vec<Sample> = (0..64).map(|i| (i as f64 * 0.4).sin()).collect();
        let p = Modwt::new(w.clone(), BoundaryMode::Periodic)
            .unwrap()
            .forward(&x)
            .unwrap();
        let z = Modwt::new(w, BoundaryMode::ZeroPadding)
            .unwrap()
            .forward(&x)
            .unwrap();
        for t in 3..64 {
            assert_relative_eq!(p.approx()[t], z.approx()[t], epsilon = 1e-14);
            assert_relative_eq!(p.detail()[t], z.detail()[t], epsilon = 1e-14);
        }
    }
}
