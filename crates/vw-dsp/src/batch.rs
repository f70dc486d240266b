//! Batch MODWT over a structure-of-arrays layout
//!
//! B equal-length signals are interleaved so that logical element `(b, t)`
//! sits at linear index `t * B + b`. Each filter tap is then broadcast
//! across a contiguous B-wide row, which the lane kernels consume directly.
//! Small batches delegate to the sequential transform.

use rayon::prelude::*;
use vw_core::{BoundaryMode, Sample, TransformError, TransformResult, rotate_left};

use crate::modwt::{Modwt, ModwtResult};
use crate::simd::{SimdLevel, simd_level};
use crate::wavelet::WaveletKind;

/// Minimum batch width for the SoA kernel
pub const BATCH_MIN_SIGNALS: usize = 4;

/// Minimum signal length for the SoA kernel
pub const BATCH_MIN_LEN: usize = 64;

/// Minimum SoA element count before rows are processed in parallel
const PAR_MIN_ELEMS: usize = 1 << 16;

/// B signals interleaved in SoA order
#[derive(Debug, Clone)]
pub struct SoaBlock {
    data: Vec<Sample>,
    signals: usize,
    len: usize,
}

impl SoaBlock {
    /// Interleave `signals.len()` equal-length signals
    pub fn pack(signals: &[Vec<Sample>]) -> Self {
        let b = signals.len();
        let n = signals.first().map_or(0, Vec::len);
        debug_assert!(signals.iter().all(|s| s.len() == n));
        let mut data = vec![0.0; b * n];
        for (idx, signal) in signals.iter().enumerate() {
            for (t, &v) in signal.iter().enumerate() {
                data[t * b + idx] = v;
            }
        }
        Self {
            data,
            signals: b,
            len: n,
        }
    }

    /// Zero-filled block of the given dimensions
    pub fn zeroed(signals: usize, len: usize) -> Self {
        Self {
            data: vec![0.0; signals * len],
            signals,
            len,
        }
    }

    /// Batch width B
    pub fn signals(&self) -> usize {
        self.signals
    }

    /// Signal length N
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    fn row(&self, t: usize) -> &[Sample] {
        &self.data[t * self.signals..(t + 1) * self.signals]
    }

    /// De-interleave back into B owned signals
    pub fn unpack(&self) -> Vec<Vec<Sample>> {
        let mut out = vec![vec![0.0; self.len]; self.signals];
        for t in 0..self.len {
            let row = self.row(t);
            for (idx, target) in out.iter_mut().enumerate() {
                target[t] = row[idx];
            }
        }
        out
    }
}

/// `dst[i] += src[i] * c` across a SoA row
#[inline]
fn row_axpy(dst: &mut [Sample], src: &[Sample], c: Sample) {
    debug_assert_eq!(dst.len(), src.len());

    #[cfg(target_arch = "x86_64")]
    {
        match simd_level() {
            SimdLevel::Avx2 => return unsafe { x86_impl::row_axpy_avx2(dst, src, c) },
            SimdLevel::Sse42 => return unsafe { x86_impl::row_axpy_sse42(dst, src, c) },
            _ => {}
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        if simd_level() == SimdLevel::Neon {
            return unsafe { arm_impl::row_axpy_neon(dst, src, c) };
        }
    }

    for (d, s) in dst.iter_mut().zip(src) {
        *d += s * c;
    }
}

/// One output row of the batch analysis: `out_row = sum_k f[k] * row(t - k)`
#[inline]
fn analyze_row(input: &SoaBlock, f: &[Sample], mode: BoundaryMode, t: usize, out_row: &mut [Sample]) {
    let n = input.len;
    out_row.fill(0.0);
    for (k, &fk) in f.iter().enumerate() {
        let idx = match mode {
            BoundaryMode::Periodic => {
                if t >= k {
                    t - k
                } else {
                    n + t - k
                }
            }
            BoundaryMode::ZeroPadding => {
                if t >= k {
                    t - k
                } else {
                    continue;
                }
            }
        };
        row_axpy(out_row, input.row(idx), fk);
    }
}

/// One output row of the batch synthesis sum:
/// `out_row = sum_k f0[k] * a(t + k) + f1[k] * d(t + k)` (orthogonal, correlation)
#[inline]
fn synthesize_pair_row(
    approx: &SoaBlock,
    detail: &SoaBlock,
    f0: &[Sample],
    f1: &[Sample],
    mode: BoundaryMode,
    t: usize,
    out_row: &mut [Sample],
) {
    let n = approx.len;
    out_row.fill(0.0);
    for k in 0..f0.len() {
        let mut idx = t + k;
        if idx >= n {
            match mode {
                BoundaryMode::Periodic => idx -= n,
                BoundaryMode::ZeroPadding => continue,
            }
        }
        row_axpy(out_row, approx.row(idx), f0[k]);
        row_axpy(out_row, detail.row(idx), f1[k]);
    }
}

/// Convolution variant of the synthesis sum (biorthogonal path)
#[inline]
fn analyze_pair_row(
    approx: &SoaBlock,
    detail: &SoaBlock,
    f0: &[Sample],
    f1: &[Sample],
    mode: BoundaryMode,
    t: usize,
    out_row: &mut [Sample],
) {
    let n = approx.len;
    out_row.fill(0.0);
    for k in 0..f0.len() {
        let idx = if t >= k {
            t - k
        } else {
            match mode {
                BoundaryMode::Periodic => n + t - k,
                BoundaryMode::ZeroPadding => continue,
            }
        };
        row_axpy(out_row, approx.row(idx), f0[k]);
        row_axpy(out_row, detail.row(idx), f1[k]);
    }
}

fn for_each_row<F>(out: &mut SoaBlock, body: F)
where
    F: Fn(usize, &mut [Sample]) + Sync + Send,
{
    let b = out.signals;
    if out.data.len() >= PAR_MIN_ELEMS {
        out.data
            .par_chunks_mut(b)
            .enumerate()
            .for_each(|(t, row)| body(t, row));
    } else {
        for (t, row) in out.data.chunks_mut(b).enumerate() {
            body(t, row);
        }
    }
}

/// Batch circular convolution over all rows
pub(crate) fn analyze_soa(input: &SoaBlock, f: &[Sample], out: &mut SoaBlock, mode: BoundaryMode) {
    debug_assert_eq!(input.signals, out.signals);
    debug_assert_eq!(input.len, out.len);
    for_each_row(out, |t, row| analyze_row(input, f, mode, t, row));
}

impl Modwt {
    /// Forward transform of B equal-length signals
    ///
    /// Packs into SoA and runs the batch kernel when B and N are large
    /// enough; otherwise runs B sequential forwards. Results agree with the
    /// sequential path to within summation-order differences.
    pub fn forward_batch(&self, signals: &[Vec<Sample>]) -> TransformResult<Vec<ModwtResult>> {
        let Some(first) = signals.first() else {
            return Ok(Vec::new());
        };
        let n = first.len();
        for (index, s) in signals.iter().enumerate() {
            if s.len() != n {
                return Err(TransformError::MismatchedBatch {
                    index,
                    expected: n,
                    got: s.len(),
                });
            }
        }
        self.validate_len(n)?;

        let b = signals.len();
        if b < BATCH_MIN_SIGNALS || n < BATCH_MIN_LEN {
            log::debug!("batch of {b}x{n} below SoA thresholds, running sequentially");
            return signals.iter().map(|s| self.forward(s)).collect();
        }

        let (h0, h1) = self.analysis_filters();
        let input = SoaBlock::pack(signals);
        let mut approx = SoaBlock::zeroed(b, n);
        let mut detail = SoaBlock::zeroed(b, n);
        analyze_soa(&input, h0, &mut approx, self.boundary());
        analyze_soa(&input, h1, &mut detail, self.boundary());

        approx
            .unpack()
            .into_iter()
            .zip(detail.unpack())
            .map(|(a, d)| ModwtResult::new(a, d))
            .collect()
    }

    /// Inverse transform of B single-level results
    pub fn inverse_batch(&self, results: &[ModwtResult]) -> TransformResult<Vec<Vec<Sample>>> {
        let Some(first) = results.first() else {
            return Ok(Vec::new());
        };
        let n = first.len();
        for (index, r) in results.iter().enumerate() {
            if r.len() != n {
                return Err(TransformError::MismatchedBatch {
                    index,
                    expected: n,
                    got: r.len(),
                });
            }
        }
        self.validate_len(n)?;

        let b = results.len();
        if b < BATCH_MIN_SIGNALS || n < BATCH_MIN_LEN {
            return results.iter().map(|r| self.inverse(r)).collect();
        }

        let approxes: Vec<Vec<Sample>> = results.iter().map(|r| r.approx().to_vec()).collect();
        let details: Vec<Vec<Sample>> = results.iter().map(|r| r.detail().to_vec()).collect();
        let approx = SoaBlock::pack(&approxes);
        let detail = SoaBlock::pack(&details);
        let mut out = SoaBlock::zeroed(b, n);

        let mode = self.boundary();
        match self.wavelet().kind() {
            WaveletKind::Orthogonal => {
                let (h0, h1) = self.analysis_filters();
                let (f0, f1) = (h0.clone(), h1.clone());
                for_each_row(&mut out, |t, row| {
                    synthesize_pair_row(&approx, &detail, &f0, &f1, mode, t, row)
                });
                Ok(out.unpack())
            }
            WaveletKind::Biorthogonal => {
                let (g0, g1) = self.synthesis_filters();
                let (f0, f1) = (g0.clone(), g1.clone());
                for_each_row(&mut out, |t, row| {
                    analyze_pair_row(&approx, &detail, &f0, &f1, mode, t, row)
                });
                let delay = self.wavelet().group_delay();
                let mut signals = out.unpack();
                if mode == BoundaryMode::Periodic && delay > 0 {
                    for s in &mut signals {
                        *s = rotate_left(s, delay);
                    }
                }
                Ok(signals)
            }
            WaveletKind::Continuous => unreachable!(),
        }
    }
}

// ============ x86_64 SIMD Implementations ============

#[cfg(target_arch = "x86_64")]
mod x86_impl {
    use super::Sample;
    use std::arch::x86_64::*;

    #[target_feature(enable = "avx2", enable = "fma")]
    pub unsafe fn row_axpy_avx2(dst: &mut [Sample], src: &[Sample], c: Sample) {
        unsafe {
            let cv = _mm256_set1_pd(c);
            let len = dst.len();
            let simd_len = len - (len % 4);
            let dp = dst.as_mut_ptr();
            let sp = src.as_ptr();

            for i in (0..simd_len).step_by(4) {
                let d = _mm256_loadu_pd(dp.add(i));
                let s = _mm256_loadu_pd(sp.add(i));
                _mm256_storeu_pd(dp.add(i), _mm256_fmadd_pd(s, cv, d));
            }

            for i in simd_len..len {
                dst[i] += src[i] * c;
            }
        }
    }

    #[target_feature(enable = "sse4.2")]
    pub unsafe fn row_axpy_sse42(dst: &mut [Sample], src: &[Sample], c: Sample) {
        unsafe {
            let cv = _mm_set1_pd(c);
            let len = dst.len();
            let simd_len = len - (len % 2);
            let dp = dst.as_mut_ptr();
            let sp = src.as_ptr();

            for i in (0..simd_len).step_by(2) {
                let d = _mm_loadu_pd(dp.add(i));
                let s = _mm_loadu_pd(sp.add(i));
                _mm_storeu_pd(dp.add(i), _mm_add_pd(d, _mm_mul_pd(s, cv)));
            }

            for i in simd_len..len {
                dst[i] += src[i] * c;
            }
        }
    }
}

// ============ ARM NEON Implementations ============

#[cfg(target_arch = "aarch64")]
mod arm_impl {
    use super::Sample;
    use std::arch::aarch64::*;

    pub unsafe fn row_axpy_neon(dst: &mut [Sample], src: &[Sample], c: Sample) {
        unsafe {
            let cv = vdupq_n_f64(c);
            let len = dst.len();
            let simd_len = len - (len % 2);
            let dp = dst.as_mut_ptr();
            let sp = src.as_ptr();

            for i in (0..simd_len).step_by(2) {
                let d = vld1q_f64(dp.add(i));
                let s = vld1q_f64(sp.add(i));
                vst1q_f64(dp.add(i), vfmaq_f64(d, s, cv));
            }

            for i in simd_len..len {
                dst[i] += src[i] * c;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavelet::get_wavelet;
    use approx::assert_relative_eq;

    fn sinusoids(b: usize, n: usize) -> Vec<Vec<Sample>> {
        (0..b)
            .map(|s| {
                (0..n)
                    .map(|t| (2.0 * std::f64::consts::PI * t as f64 / (10.0 + s as f64)).sin())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_soa_pack_unpack_roundtrip() {
        let signals = sinusoids(5, 33);
        let block = SoaBlock::pack(&signals);
        assert_eq!(block.signals(), 5);
        assert_eq!(block.len(), 33);
        assert_eq!(block.unpack(), signals);
    }

    #[test]
    fn test_soa_layout_is_row_major_in_time() {
        let signals = vec![vec![1.0, 2.0], vec![10.0, 20.0], vec![100.0, 200.0]];
        let block = SoaBlock::pack(&signals);
        assert_eq!(block.row(0), &[1.0, 10.0, 100.0]);
        assert_eq!(block.row(1), &[2.0, 20.0, 200.0]);
    }

    #[test]
    fn test_batch_matches_sequential_large() {
        let signals = sinusoids(8, 128);
        for mode in [BoundaryMode::Periodic, BoundaryMode::ZeroPadding] {
            let t = Modwt::new(get_wavelet("db2").unwrap(), mode).unwrap();
            let batch = t.forward_batch(&signals).unwrap();
            assert_eq!(batch.len(), 8);
            for (r, s) in batch.iter().zip(&signals) {
                let seq = t.forward(s).unwrap();
                for (a, b) in r.approx().iter().zip(seq.approx()) {
                    assert_relative_eq!(a, b, epsilon = 1e-12);
                }
                for (a, b) in r.detail().iter().zip(seq.detail()) {
                    assert_relative_eq!(a, b, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_small_batch_delegates_to_sequential() {
        let signals = sinusoids(2, 128);
        let t = Modwt::new(get_wavelet("haar").unwrap(), BoundaryMode::Periodic).unwrap();
        let batch = t.forward_batch(&signals).unwrap();
        for (r, s) in batch.iter().zip(&signals) {
            assert_eq!(r, &t.forward(s).unwrap());
        }
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let mut signals = sinusoids(4, 64);
        signals[2].push(0.0);
        let t = Modwt::new(get_wavelet("haar").unwrap(), BoundaryMode::Periodic).unwrap();
        assert!(matches!(
            t.forward_batch(&signals),
            Err(TransformError::MismatchedBatch { index: 2, expected: 64, got: 65 })
        ));
    }

    #[test]
    fn test_empty_batch() {
        let t = Modwt::new(get_wavelet("haar").unwrap(), BoundaryMode::Periodic).unwrap();
        assert!(t.forward_batch(&[]).unwrap().is_empty());
        assert!(t.inverse_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_batch_roundtrip_orthogonal() {
        let signals = sinusoids(6, 96);
        let t = Modwt::new(get_wavelet("db4").unwrap(), BoundaryMode::Periodic).unwrap();
        let batch = t.forward_batch(&signals).unwrap();
        let rec = t.inverse_batch(&batch).unwrap();
        for (orig, r) in signals.iter().zip(&rec) {
            for (a, b) in orig.iter().zip(r) {
                assert_relative_eq!(a, b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_batch_roundtrip_biorthogonal() {
        let signals = sinusoids(5, 80);
        let t = Modwt::new(get_wavelet("bior1_3").unwrap(), BoundaryMode::Periodic).unwrap();
        let batch = t.forward_batch(&signals).unwrap();
        let rec = t.inverse_batch(&batch).unwrap();
        for (orig, r) in signals.iter().zip(&rec) {
            for (a, b) in orig.iter().zip(r) {
                assert_relative_eq!(a, b, epsilon = 1e-11);
            }
        }
    }
}
