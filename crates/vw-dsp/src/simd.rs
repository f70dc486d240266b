//! Runtime SIMD detection for the convolution kernels
//!
//! Detection happens once at startup and is cached; kernel dispatch reads
//! the cached level. Supports AVX2, SSE4.2, and NEON (ARM) with a scalar
//! fallback everywhere.

use std::sync::OnceLock;

use serde::Serialize;

/// Detected SIMD capability level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum SimdLevel {
    /// No SIMD, scalar fallback
    Scalar = 0,
    /// SSE4.2 (128-bit, 2 f64s)
    Sse42 = 1,
    /// AVX2 + FMA (256-bit, 4 f64s)
    Avx2 = 2,
    /// ARM NEON (128-bit, 2 f64s)
    Neon = 3,
}

impl SimdLevel {
    /// SIMD width in f64 lanes
    pub const fn width(self) -> usize {
        match self {
            SimdLevel::Scalar => 1,
            SimdLevel::Sse42 | SimdLevel::Neon => 2,
            SimdLevel::Avx2 => 4,
        }
    }

    /// Human-readable name
    pub const fn name(self) -> &'static str {
        match self {
            SimdLevel::Scalar => "Scalar",
            SimdLevel::Sse42 => "SSE4.2",
            SimdLevel::Avx2 => "AVX2",
            SimdLevel::Neon => "NEON",
        }
    }
}

/// Global SIMD level detection (computed once)
static DETECTED_SIMD_LEVEL: OnceLock<SimdLevel> = OnceLock::new();

/// Detect the best available SIMD level
pub fn detect_simd_level() -> SimdLevel {
    *DETECTED_SIMD_LEVEL.get_or_init(|| {
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
                return SimdLevel::Avx2;
            }
            if is_x86_feature_detected!("sse4.2") {
                return SimdLevel::Sse42;
            }
            SimdLevel::Scalar
        }

        #[cfg(target_arch = "aarch64")]
        {
            // NEON is always available on aarch64
            SimdLevel::Neon
        }

        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            SimdLevel::Scalar
        }
    })
}

/// Get the current SIMD level (cached)
#[inline]
pub fn simd_level() -> SimdLevel {
    detect_simd_level()
}

/// Snapshot of the platform capabilities and kernel thresholds
///
/// Captured at construction time for diagnostics; serializable so hosts can
/// log or report it.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceInfo {
    /// Detected SIMD level name
    pub simd_level: &'static str,
    /// Preferred f64 lane count
    pub lanes: usize,
    /// Minimum signal length for the vector kernels
    pub vector_threshold: usize,
    /// Minimum batch width for the SoA kernel
    pub batch_min_signals: usize,
    /// Minimum signal length for the SoA kernel
    pub batch_min_len: usize,
}

impl PerformanceInfo {
    /// Capture the current platform snapshot
    pub fn capture() -> Self {
        let level = detect_simd_level();
        Self {
            simd_level: level.name(),
            lanes: level.width(),
            vector_threshold: crate::convolution::VECTOR_MIN_LEN,
            batch_min_signals: crate::batch::BATCH_MIN_SIGNALS,
            batch_min_len: crate::batch::BATCH_MIN_LEN,
        }
    }
}
