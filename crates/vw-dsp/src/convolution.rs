//! MODWT convolution kernels
//!
//! Stride-1 circular convolution (analysis) and correlation (synthesis) with
//! Periodic or ZeroPadding boundary reads. Output length equals input length;
//! there is no decimation.
//!
//! Kernel families:
//! - Scalar reference kernels (correctness baseline, small-N path)
//! - Vector kernels: the interior region reads contiguous slices and runs
//!   V lanes of output per iteration; the wrap regions run scalar
//! - Specialized unrolled kernels for Haar (L=2) and DB4 (L=8)
//!
//! Contract for every kernel: `out.len() == x.len() == N`, `f.len() == L`,
//! `L <= N`; `out` is completely overwritten and nothing outside the
//! declared lengths is read.

use vw_core::{BoundaryMode, Sample};

use crate::simd::{SimdLevel, simd_level};

/// Minimum signal length for the vector and specialized kernels
pub const VECTOR_MIN_LEN: usize = 64;

/// Which kernel family the selection policy picks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelKind {
    Scalar,
    SpecializedHaar,
    SpecializedDb4,
    Vector,
}

/// Deterministic, signal-size-based kernel selection
pub fn selected_kernel(n: usize, filter_len: usize) -> KernelKind {
    if n < VECTOR_MIN_LEN || simd_level() == SimdLevel::Scalar {
        KernelKind::Scalar
    } else if filter_len == 2 {
        KernelKind::SpecializedHaar
    } else if filter_len == 8 {
        KernelKind::SpecializedDb4
    } else {
        KernelKind::Vector
    }
}

// ============ Analysis (circular convolution) ============

/// `out[t] = sum_k f[k] * x[(t - k) mod N]`, boundary reads per `mode`
pub fn analyze(x: &[Sample], f: &[Sample], out: &mut [Sample], mode: BoundaryMode) {
    debug_assert_eq!(out.len(), x.len());
    debug_assert!(f.len() >= 2 && f.len() <= x.len());
    match selected_kernel(x.len(), f.len()) {
        KernelKind::Scalar => analyze_scalar(x, f, out, mode),
        KernelKind::SpecializedHaar => analyze_haar(x, f, out, mode),
        KernelKind::SpecializedDb4 => analyze_db4(x, f, out, mode),
        KernelKind::Vector => analyze_vector(x, f, out, mode),
    }
}

/// Scalar reference analysis kernel
pub fn analyze_scalar(x: &[Sample], f: &[Sample], out: &mut [Sample], mode: BoundaryMode) {
    let n = x.len();
    match mode {
        BoundaryMode::Periodic => {
            for t in 0..n {
                let mut acc = 0.0;
                for (k, &fk) in f.iter().enumerate() {
                    let idx = if t >= k { t - k } else { n + t - k };
                    acc += fk * x[idx];
                }
                out[t] = acc;
            }
        }
        BoundaryMode::ZeroPadding => {
            for t in 0..n {
                let kmax = (t + 1).min(f.len());
                let mut acc = 0.0;
                for k in 0..kmax {
                    acc += f[k] * x[t - k];
                }
                out[t] = acc;
            }
        }
    }
}

/// Scalar analysis over the head region `t in [0, head)` where reads wrap
fn analyze_head_scalar(x: &[Sample], f: &[Sample], out: &mut [Sample], head: usize, mode: BoundaryMode) {
    let n = x.len();
    match mode {
        BoundaryMode::Periodic => {
            for t in 0..head {
                let mut acc = 0.0;
                for (k, &fk) in f.iter().enumerate() {
                    let idx = if t >= k { t - k } else { n + t - k };
                    acc += fk * x[idx];
                }
                out[t] = acc;
            }
        }
        BoundaryMode::ZeroPadding => {
            for t in 0..head {
                let mut acc = 0.0;
                for k in 0..=t.min(f.len() - 1) {
                    acc += f[k] * x[t - k];
                }
                out[t] = acc;
            }
        }
    }
}

/// Interior analysis without boundary reads, scalar fallback
fn analyze_interior_scalar(x: &[Sample], f: &[Sample], out: &mut [Sample], start: usize) {
    let n = x.len();
    for t in start..n {
        let mut acc = 0.0;
        for (k, &fk) in f.iter().enumerate() {
            acc += fk * x[t - k];
        }
        out[t] = acc;
    }
}

/// General vector analysis: scalar head, vectorized interior
fn analyze_vector(x: &[Sample], f: &[Sample], out: &mut [Sample], mode: BoundaryMode) {
    let head = f.len() - 1;
    analyze_head_scalar(x, f, out, head, mode);

    #[cfg(target_arch = "x86_64")]
    {
        match simd_level() {
            SimdLevel::Avx2 => return unsafe { x86_impl::analyze_interior_avx2(x, f, out, head) },
            SimdLevel::Sse42 => return unsafe { x86_impl::analyze_interior_sse42(x, f, out, head) },
            _ => {}
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        if simd_level() == SimdLevel::Neon {
            return unsafe { arm_impl::analyze_interior_neon(x, f, out, head) };
        }
    }

    analyze_interior_scalar(x, f, out, head);
}

/// Unrolled Haar analysis (L = 2)
fn analyze_haar(x: &[Sample], f: &[Sample], out: &mut [Sample], mode: BoundaryMode) {
    debug_assert_eq!(f.len(), 2);
    let n = x.len();
    let (f0, f1) = (f[0], f[1]);
    out[0] = match mode {
        BoundaryMode::Periodic => f0 * x[0] + f1 * x[n - 1],
        BoundaryMode::ZeroPadding => f0 * x[0],
    };
    for t in 1..n {
        out[t] = f0 * x[t] + f1 * x[t - 1];
    }
}

/// Unrolled DB4 analysis (L = 8)
fn analyze_db4(x: &[Sample], f: &[Sample], out: &mut [Sample], mode: BoundaryMode) {
    debug_assert_eq!(f.len(), 8);
    let n = x.len();
    analyze_head_scalar(x, f, out, 7, mode);
    let (f0, f1, f2, f3) = (f[0], f[1], f[2], f[3]);
    let (f4, f5, f6, f7) = (f[4], f[5], f[6], f[7]);
    for t in 7..n {
        out[t] = f0 * x[t]
            + f1 * x[t - 1]
            + f2 * x[t - 2]
            + f3 * x[t - 3]
            + f4 * x[t - 4]
            + f5 * x[t - 5]
            + f6 * x[t - 6]
            + f7 * x[t - 7];
    }
}

// ============ Synthesis (circular correlation) ============

/// `out[t] = sum_k f[k] * x[(t + k) mod N]`, boundary reads per `mode`
pub fn synthesize(x: &[Sample], f: &[Sample], out: &mut [Sample], mode: BoundaryMode) {
    debug_assert_eq!(out.len(), x.len());
    debug_assert!(f.len() >= 2 && f.len() <= x.len());
    match selected_kernel(x.len(), f.len()) {
        KernelKind::Scalar => synthesize_scalar(x, f, out, mode),
        KernelKind::SpecializedHaar => synthesize_haar(x, f, out, mode),
        KernelKind::SpecializedDb4 => synthesize_db4(x, f, out, mode),
        KernelKind::Vector => synthesize_vector(x, f, out, mode),
    }
}

/// Scalar reference synthesis kernel
pub fn synthesize_scalar(x: &[Sample], f: &[Sample], out: &mut [Sample], mode: BoundaryMode) {
    let n = x.len();
    match mode {
        BoundaryMode::Periodic => {
            for t in 0..n {
                let mut acc = 0.0;
                for (k, &fk) in f.iter().enumerate() {
                    let mut idx = t + k;
                    if idx >= n {
                        idx -= n;
                    }
                    acc += fk * x[idx];
                }
                out[t] = acc;
            }
        }
        BoundaryMode::ZeroPadding => {
            for t in 0..n {
                let kmax = (n - t).min(f.len());
                let mut acc = 0.0;
                for k in 0..kmax {
                    acc += f[k] * x[t + k];
                }
                out[t] = acc;
            }
        }
    }
}

/// Scalar synthesis over the tail region `t in [tail, n)` where reads wrap
fn synthesize_tail_scalar(x: &[Sample], f: &[Sample], out: &mut [Sample], tail: usize, mode: BoundaryMode) {
    let n = x.len();
    match mode {
        BoundaryMode::Periodic => {
            for t in tail..n {
                let mut acc = 0.0;
                for (k, &fk) in f.iter().enumerate() {
                    let mut idx = t + k;
                    if idx >= n {
                        idx -= n;
                    }
                    acc += fk * x[idx];
                }
                out[t] = acc;
            }
        }
        BoundaryMode::ZeroPadding => {
            for t in tail..n {
                let kmax = (n - t).min(f.len());
                let mut acc = 0.0;
                for k in 0..kmax {
                    acc += f[k] * x[t + k];
                }
                out[t] = acc;
            }
        }
    }
}

/// Interior synthesis without boundary reads, scalar fallback
fn synthesize_interior_scalar(x: &[Sample], f: &[Sample], out: &mut [Sample], end: usize) {
    for t in 0..end {
        let mut acc = 0.0;
        for (k, &fk) in f.iter().enumerate() {
            acc += fk * x[t + k];
        }
        out[t] = acc;
    }
}

/// General vector synthesis: vectorized interior, scalar tail
fn synthesize_vector(x: &[Sample], f: &[Sample], out: &mut [Sample], mode: BoundaryMode) {
    let n = x.len();
    let end = n - (f.len() - 1);
    synthesize_tail_scalar(x, f, out, end, mode);

    #[cfg(target_arch = "x86_64")]
    {
        match simd_level() {
            SimdLevel::Avx2 => return unsafe { x86_impl::synthesize_interior_avx2(x, f, out, end) },
            SimdLevel::Sse42 => return unsafe { x86_impl::synthesize_interior_sse42(x, f, out, end) },
            _ => {}
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        if simd_level() == SimdLevel::Neon {
            return unsafe { arm_impl::synthesize_interior_neon(x, f, out, end) };
        }
    }

    synthesize_interior_scalar(x, f, out, end);
}

/// Unrolled Haar synthesis (L = 2)
fn synthesize_haar(x: &[Sample], f: &[Sample], out: &mut [Sample], mode: BoundaryMode) {
    debug_assert_eq!(f.len(), 2);
    let n = x.len();
    let (f0, f1) = (f[0], f[1]);
    for t in 0..n - 1 {
        out[t] = f0 * x[t] + f1 * x[t + 1];
    }
    out[n - 1] = match mode {
        BoundaryMode::Periodic => f0 * x[n - 1] + f1 * x[0],
        BoundaryMode::ZeroPadding => f0 * x[n - 1],
    };
}

/// Unrolled DB4 synthesis (L = 8)
fn synthesize_db4(x: &[Sample], f: &[Sample], out: &mut [Sample], mode: BoundaryMode) {
    debug_assert_eq!(f.len(), 8);
    let n = x.len();
    let end = n - 7;
    synthesize_tail_scalar(x, f, out, end, mode);
    let (f0, f1, f2, f3) = (f[0], f[1], f[2], f[3]);
    let (f4, f5, f6, f7) = (f[4], f[5], f[6], f[7]);
    for t in 0..end {
        out[t] = f0 * x[t]
            + f1 * x[t + 1]
            + f2 * x[t + 2]
            + f3 * x[t + 3]
            + f4 * x[t + 4]
            + f5 * x[t + 5]
            + f6 * x[t + 6]
            + f7 * x[t + 7];
    }
}

// ============ x86_64 SIMD Implementations ============

#[cfg(target_arch = "x86_64")]
mod x86_impl {
    use super::Sample;
    use std::arch::x86_64::*;

    #[target_feature(enable = "avx2", enable = "fma")]
    pub unsafe fn analyze_interior_avx2(x: &[Sample], f: &[Sample], out: &mut [Sample], start: usize) {
        unsafe {
            let n = x.len();
            let xp = x.as_ptr();
            let op = out.as_mut_ptr();
            let mut t = start;
            while t + 4 <= n {
                let mut acc = _mm256_setzero_pd();
                for (k, &fk) in f.iter().enumerate() {
                    let fv = _mm256_set1_pd(fk);
                    let xv = _mm256_loadu_pd(xp.add(t - k));
                    acc = _mm256_fmadd_pd(fv, xv, acc);
                }
                _mm256_storeu_pd(op.add(t), acc);
                t += 4;
            }
            // Scalar remainder - t..n is always within bounds
            for tt in t..n {
                let mut acc = 0.0;
                for (k, &fk) in f.iter().enumerate() {
                    acc += fk * x[tt - k];
                }
                out[tt] = acc;
            }
        }
    }

    #[target_feature(enable = "sse4.2")]
    pub unsafe fn analyze_interior_sse42(x: &[Sample], f: &[Sample], out: &mut [Sample], start: usize) {
        unsafe {
            let n = x.len();
            let xp = x.as_ptr();
            let op = out.as_mut_ptr();
            let mut t = start;
            while t + 2 <= n {
                let mut acc = _mm_setzero_pd();
                for (k, &fk) in f.iter().enumerate() {
                    let fv = _mm_set1_pd(fk);
                    let xv = _mm_loadu_pd(xp.add(t - k));
                    acc = _mm_add_pd(acc, _mm_mul_pd(fv, xv));
                }
                _mm_storeu_pd(op.add(t), acc);
                t += 2;
            }
            for tt in t..n {
                let mut acc = 0.0;
                for (k, &fk) in f.iter().enumerate() {
                    acc += fk * x[tt - k];
                }
                out[tt] = acc;
            }
        }
    }

    #[target_feature(enable = "avx2", enable = "fma")]
    pub unsafe fn synthesize_interior_avx2(x: &[Sample], f: &[Sample], out: &mut [Sample], end: usize) {
        unsafe {
            let xp = x.as_ptr();
            let op = out.as_mut_ptr();
            let mut t = 0;
            while t + 4 <= end {
                let mut acc = _mm256_setzero_pd();
                for (k, &fk) in f.iter().enumerate() {
                    let fv = _mm256_set1_pd(fk);
                    let xv = _mm256_loadu_pd(xp.add(t + k));
                    acc = _mm256_fmadd_pd(fv, xv, acc);
                }
                _mm256_storeu_pd(op.add(t), acc);
                t += 4;
            }
            for tt in t..end {
                let mut acc = 0.0;
                for (k, &fk) in f.iter().enumerate() {
                    acc += fk * x[tt + k];
                }
                out[tt] = acc;
            }
        }
    }

    #[target_feature(enable = "sse4.2")]
    pub unsafe fn synthesize_interior_sse42(x: &[Sample], f: &[Sample], out: &mut [Sample], end: usize) {
        unsafe {
            let xp = x.as_ptr();
            let op = out.as_mut_ptr();
            let mut t = 0;
            while t + 2 <= end {
                let mut acc = _mm_setzero_pd();
                for (k, &fk) in f.iter().enumerate() {
                    let fv = _mm_set1_pd(fk);
                    let xv = _mm_loadu_pd(xp.add(t + k));
                    acc = _mm_add_pd(acc, _mm_mul_pd(fv, xv));
                }
                _mm_storeu_pd(op.add(t), acc);
                t += 2;
            }
            for tt in t..end {
                let mut acc = 0.0;
                for (k, &fk) in f.iter().enumerate() {
                    acc += fk * x[tt + k];
                }
                out[tt] = acc;
            }
        }
    }
}

// ============ ARM NEON Implementations ============

#[cfg(target_arch = "aarch64")]
mod arm_impl {
    use super::Sample;
    use std::arch::aarch64::*;

    pub unsafe fn analyze_interior_neon(x: &[Sample], f: &[Sample], out: &mut [Sample], start: usize) {
        unsafe {
            let n = x.len();
            let xp = x.as_ptr();
            let op = out.as_mut_ptr();
            let mut t = start;
            while t + 2 <= n {
                let mut acc = vdupq_n_f64(0.0);
                for (k, &fk) in f.iter().enumerate() {
                    let fv = vdupq_n_f64(fk);
                    let xv = vld1q_f64(xp.add(t - k));
                    acc = vfmaq_f64(acc, fv, xv);
                }
                vst1q_f64(op.add(t), acc);
                t += 2;
            }
            for tt in t..n {
                let mut acc = 0.0;
                for (k, &fk) in f.iter().enumerate() {
                    acc += fk * x[tt - k];
                }
                out[tt] = acc;
            }
        }
    }

    pub unsafe fn synthesize_interior_neon(x: &[Sample], f: &[Sample], out: &mut [Sample], end: usize) {
        unsafe {
            let xp = x.as_ptr();
            let op = out.as_mut_ptr();
            let mut t = 0;
            while t + 2 <= end {
                let mut acc = vdupq_n_f64(0.0);
                for (k, &fk) in f.iter().enumerate() {
                    let fv = vdupq_n_f64(fk);
                    let xv = vld1q_f64(xp.add(t + k));
                    acc = vfmaq_f64(acc, fv, xv);
                }
                vst1q_f64(op.add(t), acc);
                t += 2;
            }
            for tt in t..end {
                let mut acc = 0.0;
                for (k, &fk) in f.iter().enumerate() {
                    acc += fk * x[tt + k];
                }
                out[tt] = acc;
            }
        }
    }
}

// ============ Tests ============
